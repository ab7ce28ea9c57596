//! Move notation.
//!
//! Supported tokens, each optionally followed by `'`, `2` or `2'`:
//! - `R L U D F B`: outer face turns
//! - `3R`: only the third layer from R
//! - `Rw`, `3Rw`: R together with the layers below it (half the cube, or the
//!   given count)
//! - `r`: the inner layers from depth 2 to the middle
//! - `M E S`: every inner slice; `M[0,2]` only the listed slice indices
//! - `x y z`: whole cube rotations

use std::{fmt::Display, str::FromStr};

use itertools::Itertools;
use thiserror::Error;

use crate::{
    cube::CubeError,
    geometry::{Axis, FaceName, SliceName},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlgParseError {
    #[error("Unknown move `{0}`")]
    UnknownMove(String),
    #[error("Invalid turn suffix in `{0}`")]
    BadSuffix(String),
    #[error("Invalid layer count in `{0}`")]
    BadLayerCount(String),
    #[error("Invalid slice index list in `{0}`")]
    BadSliceIndices(String),
}

/// Which layers a face move turns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Layers {
    /// Just the face.
    Outer,
    /// The single layer at this depth, 1 being the face.
    Depth(usize),
    /// The face and the layers below it, down to the given depth or to the
    /// middle of the cube.
    Wide(Option<usize>),
    /// Depth 2 down to the middle of the cube.
    Inner,
}

impl Layers {
    /// The depths this resolves to on a cube of `size` layers.
    ///
    /// # Errors
    ///
    /// Fails if an explicit depth does not exist on the cube.
    pub fn depths(&self, size: usize) -> Result<Vec<usize>, CubeError> {
        let check = |depth: usize| {
            if depth == 0 || depth > size {
                Err(CubeError::LayerOutOfRange { depth, size })
            } else {
                Ok(depth)
            }
        };
        Ok(match *self {
            Layers::Outer => vec![1],
            Layers::Depth(depth) => vec![check(depth)?],
            Layers::Wide(Some(depth)) => (1..=check(depth)?).collect(),
            Layers::Wide(None) => (1..=size / 2).collect(),
            Layers::Inner => (2..=size / 2).collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SliceIndices {
    All,
    Some(Vec<usize>),
}

impl SliceIndices {
    #[must_use]
    pub fn resolve(&self, size: usize) -> Vec<usize> {
        match self {
            SliceIndices::All => (0..size.saturating_sub(2)).collect(),
            SliceIndices::Some(indices) => indices.clone(),
        }
    }
}

/// A single move. `turns` is the number of clockwise quarter turns, in
/// `1..=3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Move {
    Face {
        face: FaceName,
        layers: Layers,
        turns: u8,
    },
    Slice {
        slice: SliceName,
        indices: SliceIndices,
        turns: u8,
    },
    Rotation {
        axis: Axis,
        turns: u8,
    },
}

fn normalize_turns(quarter_turns: i64) -> u8 {
    u8::try_from(quarter_turns.rem_euclid(4)).unwrap_or(0)
}

impl Move {
    /// An outer face turn. Returns `None` for a multiple of four turns.
    #[must_use]
    pub fn face(face: FaceName, quarter_turns: i64) -> Option<Self> {
        Self::face_layers(face, Layers::Outer, quarter_turns)
    }

    #[must_use]
    pub fn face_layers(face: FaceName, layers: Layers, quarter_turns: i64) -> Option<Self> {
        let turns = normalize_turns(quarter_turns);
        (turns != 0).then_some(Move::Face {
            face,
            layers,
            turns,
        })
    }

    #[must_use]
    pub fn slice(slice: SliceName, indices: Vec<usize>, quarter_turns: i64) -> Option<Self> {
        let turns = normalize_turns(quarter_turns);
        (turns != 0 && !indices.is_empty()).then_some(Move::Slice {
            slice,
            indices: SliceIndices::Some(indices),
            turns,
        })
    }

    #[must_use]
    pub fn rotation(axis: Axis, quarter_turns: i64) -> Option<Self> {
        let turns = normalize_turns(quarter_turns);
        (turns != 0).then_some(Move::Rotation { axis, turns })
    }

    #[must_use]
    pub fn turns(&self) -> u8 {
        match self {
            Move::Face { turns, .. } | Move::Slice { turns, .. } | Move::Rotation { turns, .. } => {
                *turns
            }
        }
    }

    fn with_turns(&self, turns: u8) -> Self {
        let mut mv = self.clone();
        match &mut mv {
            Move::Face { turns: t, .. }
            | Move::Slice { turns: t, .. }
            | Move::Rotation { turns: t, .. } => *t = turns,
        }
        mv
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        self.with_turns(4 - self.turns())
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::Face { face, layers, .. } => match layers {
                Layers::Outer => write!(f, "{face}")?,
                Layers::Depth(depth) => write!(f, "{depth}{face}")?,
                Layers::Wide(None) => write!(f, "{face}w")?,
                Layers::Wide(Some(depth)) => write!(f, "{depth}{face}w")?,
                Layers::Inner => write!(f, "{}", face.to_string().to_lowercase())?,
            },
            Move::Slice { slice, indices, .. } => match indices {
                SliceIndices::All => write!(f, "{slice}")?,
                SliceIndices::Some(indices) => write!(f, "{slice}[{}]", indices.iter().join(","))?,
            },
            Move::Rotation { axis, .. } => match axis {
                Axis::X => write!(f, "x")?,
                Axis::Y => write!(f, "y")?,
                Axis::Z => write!(f, "z")?,
            },
        }
        match self.turns() {
            2 => write!(f, "2"),
            3 => write!(f, "'"),
            _ => Ok(()),
        }
    }
}

impl FromStr for Move {
    type Err = AlgParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (body, turns) = if let Some(body) = token.strip_suffix("2'") {
            (body, 2)
        } else if let Some(body) = token.strip_suffix('2') {
            (body, 2)
        } else if let Some(body) = token.strip_suffix('\'') {
            (body, 3)
        } else {
            (token, 1)
        };
        if body.is_empty() || body.ends_with('\'') {
            return Err(AlgParseError::BadSuffix(token.to_owned()));
        }

        match body {
            "x" => return Ok(Move::Rotation { axis: Axis::X, turns }),
            "y" => return Ok(Move::Rotation { axis: Axis::Y, turns }),
            "z" => return Ok(Move::Rotation { axis: Axis::Z, turns }),
            _ => {}
        }

        if let Some(slice) = body.get(..1).and_then(|s| s.parse::<SliceName>().ok()) {
            let rest = &body[1..];
            let indices = if rest.is_empty() {
                SliceIndices::All
            } else {
                let list = rest
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_suffix(']'))
                    .ok_or_else(|| AlgParseError::BadSliceIndices(token.to_owned()))?;
                SliceIndices::Some(
                    list.split(',')
                        .map(|i| i.trim().parse::<usize>())
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|_| AlgParseError::BadSliceIndices(token.to_owned()))?,
                )
            };
            return Ok(Move::Slice {
                slice,
                indices,
                turns,
            });
        }

        let digits_end = body
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| AlgParseError::UnknownMove(token.to_owned()))?;
        let depth = if digits_end == 0 {
            None
        } else {
            Some(
                body[..digits_end]
                    .parse::<usize>()
                    .map_err(|_| AlgParseError::BadLayerCount(token.to_owned()))?,
            )
        };
        let rest = &body[digits_end..];
        let (letter, wide) = match rest.strip_suffix('w') {
            Some(letter) => (letter, true),
            None => (rest, false),
        };
        let inner = letter.chars().all(|c| c.is_ascii_lowercase());
        let face = letter
            .to_uppercase()
            .parse::<FaceName>()
            .map_err(|_| AlgParseError::UnknownMove(token.to_owned()))?;

        let layers = match (depth, wide, inner) {
            (None, false, false) => Layers::Outer,
            (None, false, true) => Layers::Inner,
            (Some(depth), false, false) => Layers::Depth(depth),
            (depth, true, false) => Layers::Wide(depth),
            _ => return Err(AlgParseError::BadLayerCount(token.to_owned())),
        };
        if matches!(layers, Layers::Depth(0) | Layers::Wide(Some(0))) {
            return Err(AlgParseError::BadLayerCount(token.to_owned()));
        }
        Ok(Move::Face {
            face,
            layers,
            turns,
        })
    }
}

/// A sequence of moves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Alg(Vec<Move>);

impl Alg {
    #[must_use]
    pub fn new(moves: Vec<Move>) -> Self {
        Alg(moves)
    }

    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, mv: Move) {
        self.0.push(mv);
    }

    /// Appends a move if it is not a no-op, as produced by the [`Move`]
    /// constructors.
    pub fn push_opt(&mut self, mv: Option<Move>) {
        self.0.extend(mv);
    }

    pub fn extend(&mut self, other: &Alg) {
        self.0.extend(other.0.iter().cloned());
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        Alg(self.0.iter().rev().map(Move::inverse).collect())
    }

    /// `setup body setup'`
    #[must_use]
    pub fn conjugate(setup: &Alg, body: &Alg) -> Self {
        let mut out = setup.clone();
        out.extend(body);
        out.extend(&setup.inverse());
        out
    }

    /// `a b a' b'`
    #[must_use]
    pub fn commutator(a: &Alg, b: &Alg) -> Self {
        let mut out = a.clone();
        out.extend(b);
        out.extend(&a.inverse());
        out.extend(&b.inverse());
        out
    }

    /// Rewrites every move with `f`, which may expand it into several moves.
    #[must_use]
    pub fn flat_map(&self, f: impl Fn(&Move) -> Vec<Move>) -> Self {
        Alg(self.0.iter().flat_map(f).collect())
    }
}

impl FromStr for Alg {
    type Err = AlgParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace()
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(Alg)
    }
}

impl Display for Alg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(" "))
    }
}

impl FromIterator<Move> for Alg {
    fn from_iter<T: IntoIterator<Item = Move>>(iter: T) -> Self {
        Alg(iter.into_iter().collect())
    }
}

impl IntoIterator for Alg {
    type Item = Move;
    type IntoIter = std::vec::IntoIter<Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Alg {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_token_kind() {
        let alg: Alg = "R U' F2 3Rw 2L' r Uw2 M E[0,2]' S x y' z2"
            .parse()
            .unwrap();
        assert_eq!(alg.len(), 13);
        assert_eq!(
            alg.moves()[3],
            Move::Face {
                face: FaceName::R,
                layers: Layers::Wide(Some(3)),
                turns: 1
            }
        );
        assert_eq!(
            alg.moves()[8],
            Move::Slice {
                slice: SliceName::E,
                indices: SliceIndices::Some(vec![0, 2]),
                turns: 3
            }
        );
        assert_eq!(alg.to_string(), "R U' F2 3Rw 2L' r Uw2 M E[0,2]' S x y' z2");
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["Q", "R''", "3r", "0R", "M[", "M[a]", "'", "w"] {
            assert!(bad.parse::<Move>().is_err(), "{bad}");
        }
    }

    #[test]
    fn inverse_reverses_and_inverts() {
        let alg: Alg = "R U2 F'".parse().unwrap();
        assert_eq!(alg.inverse().to_string(), "F U2 R'");
        assert_eq!(
            Alg::commutator(&"R".parse().unwrap(), &"U".parse().unwrap()).to_string(),
            "R U R' U'"
        );
    }

    #[test]
    fn layers_resolve_against_size() {
        assert_eq!(Layers::Wide(None).depths(6).unwrap(), vec![1, 2, 3]);
        assert_eq!(Layers::Inner.depths(7).unwrap(), vec![2, 3]);
        assert!(Layers::Depth(5).depths(4).is_err());
        assert_eq!(SliceIndices::All.resolve(5), vec![0, 1, 2]);
    }
}
