use std::{fmt::Display, sync::OnceLock};

use fxhash::FxHashMap;
use itertools::Itertools;
use thiserror::Error;

use crate::{
    alg::{Alg, Move},
    geometry::{Axis, Color, EdgePosition, EdgeSlot, FaceName, GeometryError, Point, SliceName},
    walking::{CubeWalkingInfo, walking_info_unit},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CubeError {
    #[error("A cube needs at least 2 layers, got {0}")]
    SizeTooSmall(usize),
    #[error("Expected {expected} stickers, found {found}")]
    WrongStickerCount { expected: usize, found: usize },
    #[error("Colour {color} appears {count} times instead of {expected}")]
    WrongColorCount {
        color: Color,
        count: usize,
        expected: usize,
    },
    #[error("Layer depth {depth} does not exist on a cube of size {size}")]
    LayerOutOfRange { depth: usize, size: usize },
    #[error("Slice index {index} does not exist on a cube of size {size}")]
    SliceOutOfRange { index: usize, size: usize },
    #[error("The corners are twisted into an unreachable state")]
    TwistedCorners,
    #[error("A single edge is flipped, which no sequence of moves can produce")]
    FlippedEdge,
    #[error("The pieces are in an unreachable permutation")]
    UnreachablePermutation,
}

/// Identifies a physical sticker: the index it had on the solved cube.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StickerId(pub u32);

/// A label attached to a sticker that follows it through moves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Marker(pub u32);

/// An N×N×N cube stored as six `n` by `n` grids of colours, face-major in the
/// order of [`FaceName::ALL`], each grid row-major in its LTR frame.
#[derive(Debug, Clone)]
pub struct Cube {
    size: usize,
    colors: Vec<Color>,
    ids: Vec<StickerId>,
    markers: FxHashMap<StickerId, Marker>,
    walking: [OnceLock<CubeWalkingInfo>; 3],
}

impl Cube {
    /// A solved cube in the standard colour scheme.
    ///
    /// # Errors
    ///
    /// Fails if `size` is smaller than 2.
    pub fn new(size: usize) -> Result<Self, CubeError> {
        if size < 2 {
            return Err(CubeError::SizeTooSmall(size));
        }
        let colors = FaceName::ALL
            .into_iter()
            .flat_map(|face| std::iter::repeat_n(Color::of_face(face), size * size))
            .collect();
        Ok(Self::with_colors(size, colors))
    }

    /// A cube with the given stickers, laid out as described on [`Cube`].
    ///
    /// # Errors
    ///
    /// Fails if the sticker count is wrong or some colour does not appear
    /// exactly `size * size` times.
    pub fn from_colors(size: usize, colors: Vec<Color>) -> Result<Self, CubeError> {
        if size < 2 {
            return Err(CubeError::SizeTooSmall(size));
        }
        let expected = 6 * size * size;
        if colors.len() != expected {
            return Err(CubeError::WrongStickerCount {
                expected,
                found: colors.len(),
            });
        }
        let counts = colors.iter().counts();
        for color in Color::ALL {
            let count = counts.get(&color).copied().unwrap_or(0);
            if count != size * size {
                return Err(CubeError::WrongColorCount {
                    color,
                    count,
                    expected: size * size,
                });
            }
        }
        Ok(Self::with_colors(size, colors))
    }

    fn with_colors(size: usize, colors: Vec<Color>) -> Self {
        let ids = (0..colors.len())
            .map(|i| StickerId(u32::try_from(i).unwrap_or(u32::MAX)))
            .collect();
        Cube {
            size,
            colors,
            ids,
            markers: FxHashMap::default(),
            walking: Default::default(),
        }
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Width of a face's center grid.
    #[must_use]
    pub fn n_center(&self) -> usize {
        self.size.saturating_sub(2)
    }

    #[must_use]
    pub fn is_even(&self) -> bool {
        self.size % 2 == 0
    }

    #[must_use]
    pub fn index(&self, face: FaceName, p: Point) -> usize {
        (face.index() * self.size + p.row) * self.size + p.col
    }

    #[must_use]
    pub fn color(&self, face: FaceName, p: Point) -> Color {
        self.colors[self.index(face, p)]
    }

    /// The colour of a center cell, `p` given in center grid coordinates.
    #[must_use]
    pub fn center(&self, face: FaceName, p: Point) -> Color {
        self.color(face, Point::new(p.row + 1, p.col + 1))
    }

    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    #[must_use]
    pub fn face_colors(&self, face: FaceName) -> &[Color] {
        let len = self.size * self.size;
        &self.colors[face.index() * len..(face.index() + 1) * len]
    }

    #[must_use]
    pub fn sticker_ids(&self) -> &[StickerId] {
        &self.ids
    }

    #[must_use]
    pub fn sticker_id(&self, face: FaceName, p: Point) -> StickerId {
        self.ids[self.index(face, p)]
    }

    /// Attaches `marker` to the sticker currently at `p` on `face`.
    pub fn mark(&mut self, face: FaceName, p: Point, marker: Marker) {
        let id = self.sticker_id(face, p);
        self.markers.insert(id, marker);
    }

    /// Where the sticker carrying `marker` is now.
    #[must_use]
    pub fn find_marker(&self, marker: Marker) -> Option<(FaceName, Point)> {
        let position = self
            .ids
            .iter()
            .position(|id| self.markers.get(id) == Some(&marker))?;
        Some(self.location(position))
    }

    pub fn clear_markers(&mut self) {
        self.markers.clear();
    }

    fn location(&self, index: usize) -> (FaceName, Point) {
        let len = self.size * self.size;
        let face = FaceName::ALL[index / len];
        let rest = index % len;
        (face, Point::new(rest / self.size, rest % self.size))
    }

    /// The walk around `slice` for this cube's center grids. Computed on first
    /// use and kept for the lifetime of this cube.
    ///
    /// # Errors
    ///
    /// Fails if the slice walks could not be built.
    pub fn walking_info(&self, slice: SliceName) -> Result<&CubeWalkingInfo, GeometryError> {
        let cell = &self.walking[slice.index()];
        if let Some(info) = cell.get() {
            return Ok(info);
        }
        let info = CubeWalkingInfo::new(walking_info_unit(slice)?, self.n_center());
        Ok(cell.get_or_init(|| info))
    }

    /// Rotates every layer perpendicular to `axis` whose coordinate is listed
    /// in `layers` by `quarter_turns` clockwise, seen from the positive end of
    /// the axis. Layer coordinates run from 0 at the negative face.
    fn rotate_layers(&mut self, axis: Axis, layers: &[usize], quarter_turns: i64) {
        let turns = quarter_turns.rem_euclid(4);
        if turns == 0 || layers.is_empty() {
            return;
        }
        let mut selected = vec![false; self.size];
        for &layer in layers {
            selected[layer] = true;
        }

        let n = self.size;
        let mut colors = self.colors.clone();
        let mut ids = self.ids.clone();
        for src in 0..self.colors.len() {
            let (face, p) = self.location(src);
            let (mut position, mut normal) = sticker_location(n, face, p);
            if !selected[layer_of(n, position[axis.index()])] {
                continue;
            }
            for _ in 0..turns {
                position = rotate_vector(position, axis);
                normal = rotate_vector(normal, axis);
            }
            let (face, p) = sticker_at(n, position, normal);
            let dst = self.index(face, p);
            colors[dst] = self.colors[src];
            ids[dst] = self.ids[src];
        }
        self.colors = colors;
        self.ids = ids;
    }

    /// Turns the layers of `face` at the given depths, depth 1 being the face
    /// itself, `quarter_turns` clockwise as seen from that face.
    ///
    /// # Errors
    ///
    /// Fails if a depth is 0 or larger than the cube.
    pub fn turn_face(
        &mut self,
        face: FaceName,
        depths: &[usize],
        quarter_turns: i64,
    ) -> Result<(), CubeError> {
        let (axis, positive) = face.axis();
        let layers = depths
            .iter()
            .map(|&depth| {
                if depth == 0 || depth > self.size {
                    Err(CubeError::LayerOutOfRange {
                        depth,
                        size: self.size,
                    })
                } else if positive {
                    Ok(self.size - depth)
                } else {
                    Ok(depth - 1)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        let turns = if positive {
            quarter_turns
        } else {
            -quarter_turns
        };
        self.rotate_layers(axis, &layers, turns);
        Ok(())
    }

    /// Turns inner slices, following the clockwise turn of the slice's
    /// reference face.
    ///
    /// # Errors
    ///
    /// Fails if an index is not below `size - 2`.
    pub fn turn_slice(
        &mut self,
        slice: SliceName,
        indices: &[usize],
        quarter_turns: i64,
    ) -> Result<(), CubeError> {
        if let Some(&index) = indices.iter().find(|&&index| index >= self.n_center()) {
            return Err(CubeError::SliceOutOfRange {
                index,
                size: self.size,
            });
        }
        let depths = indices.iter().map(|index| index + 2).collect_vec();
        self.turn_face(slice.reference_face(), &depths, quarter_turns)
    }

    /// Turns the whole cube about `axis`, like `x`, `y` and `z`.
    pub fn rotate(&mut self, axis: Axis, quarter_turns: i64) {
        let layers = (0..self.size).collect_vec();
        self.rotate_layers(axis, &layers, quarter_turns);
    }

    /// # Errors
    ///
    /// Fails if the move names layers this cube does not have.
    pub fn apply_move(&mut self, mv: &Move) -> Result<(), CubeError> {
        let turns = i64::from(mv.turns());
        match mv {
            Move::Face { face, layers, .. } => {
                let depths = layers.depths(self.size)?;
                self.turn_face(*face, &depths, turns)
            }
            Move::Slice { slice, indices, .. } => {
                let indices = indices.resolve(self.size);
                self.turn_slice(*slice, &indices, turns)
            }
            Move::Rotation { axis, .. } => {
                self.rotate(*axis, turns);
                Ok(())
            }
        }
    }

    /// # Errors
    ///
    /// Fails on the first move naming layers this cube does not have; the
    /// moves before it stay applied.
    pub fn apply_alg(&mut self, alg: &Alg) -> Result<(), CubeError> {
        alg.iter().try_for_each(|mv| self.apply_move(mv))
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        FaceName::ALL
            .into_iter()
            .all(|face| self.face_colors(face).iter().all_equal())
    }

    /// Whether every center cell of `face` has one colour.
    #[must_use]
    pub fn is_center_uniform(&self, face: FaceName) -> bool {
        let n = self.n_center();
        (0..n)
            .cartesian_product(0..n)
            .map(|(row, col)| self.center(face, Point::new(row, col)))
            .all_equal()
    }

    /// The two stickers of wing `i` of `edge`, counted from the low end of the
    /// first face's coordinate along the edge.
    #[must_use]
    pub fn wing(&self, edge: EdgeSlot, i: usize) -> (Color, Color) {
        let (first, second) = edge.faces();
        let (e1, e2) = edge.edges();
        let a1 = i + 1;
        let a2 = if first.low_neighbor(e1) == second.low_neighbor(e2) {
            a1
        } else {
            self.size - 1 - a1
        };
        (
            self.color(first, along_edge(self.size, e1, a1)),
            self.color(second, along_edge(self.size, e2, a2)),
        )
    }

    /// Whether every wing of `edge` shows the same colour pair.
    #[must_use]
    pub fn is_edge_paired(&self, edge: EdgeSlot) -> bool {
        (0..self.n_center()).map(|i| self.wing(edge, i)).all_equal()
    }

    #[must_use]
    pub fn unpaired_edges(&self) -> Vec<EdgeSlot> {
        EdgeSlot::ALL
            .into_iter()
            .filter(|&edge| !self.is_edge_paired(edge))
            .collect()
    }

    /// Whether the cube looks like a 3×3: uniform centers and paired edges.
    #[must_use]
    pub fn is_reduced(&self) -> bool {
        FaceName::ALL
            .into_iter()
            .all(|face| self.is_center_uniform(face))
            && self.unpaired_edges().is_empty()
    }

    /// The 3×3 cube formed by the corners, one representative wing per edge
    /// and one representative center cell per face. Only meaningful once the
    /// cube is reduced.
    #[must_use]
    pub fn projection_3x3(&self) -> Cube {
        let n = self.size;
        let middle = if n % 2 == 1 { n / 2 } else { 1 };
        let coords = [0, middle, n - 1];
        let colors = FaceName::ALL
            .into_iter()
            .flat_map(|face| {
                coords
                    .into_iter()
                    .cartesian_product(coords)
                    .map(move |(row, col)| self.color(face, Point::new(row, col)))
            })
            .collect();
        Self::with_colors(3, colors)
    }
}

impl Display for Cube {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for face in FaceName::ALL {
            writeln!(f, "{face}:")?;
            for row in (0..self.size).rev() {
                let line = (0..self.size)
                    .map(|col| self.color(face, Point::new(row, col)).letter())
                    .join(" ");
                writeln!(f, "  {line}")?;
            }
        }
        Ok(())
    }
}

/// The cell on the outer ring along `edge`, `along` cells from the low end.
fn along_edge(n: usize, edge: EdgePosition, along: usize) -> Point {
    match edge {
        EdgePosition::Top => Point::new(n - 1, along),
        EdgePosition::Bottom => Point::new(0, along),
        EdgePosition::Left => Point::new(along, 0),
        EdgePosition::Right => Point::new(along, n - 1),
    }
}

/// Position of a sticker's cubie and the sticker's outward normal. Positions
/// are doubled and centered so that every coordinate is an integer in
/// `-(n - 1)..=(n - 1)` and rotations are exact.
pub(crate) fn sticker_location(n: usize, face: FaceName, p: Point) -> ([i64; 3], [i64; 3]) {
    let m = n - 1;
    let (r, c) = (p.row, p.col);
    let (position, normal) = match face {
        FaceName::F => ([c, r, m], [0, 0, 1]),
        FaceName::B => ([m - c, r, 0], [0, 0, -1]),
        FaceName::R => ([m, r, m - c], [1, 0, 0]),
        FaceName::L => ([0, r, c], [-1, 0, 0]),
        FaceName::U => ([c, m, m - r], [0, 1, 0]),
        FaceName::D => ([c, 0, r], [0, -1, 0]),
    };
    let m = to_i64(m);
    (position.map(|x| 2 * to_i64(x) - m), normal)
}

fn sticker_at(n: usize, position: [i64; 3], normal: [i64; 3]) -> (FaceName, Point) {
    let m = n - 1;
    let [x, y, z] = position.map(|v| layer_of(n, v));
    match normal {
        [0, 0, 1] => (FaceName::F, Point::new(y, x)),
        [0, 0, -1] => (FaceName::B, Point::new(y, m - x)),
        [1, 0, 0] => (FaceName::R, Point::new(y, m - z)),
        [-1, 0, 0] => (FaceName::L, Point::new(y, z)),
        [0, 1, 0] => (FaceName::U, Point::new(m - z, x)),
        _ => (FaceName::D, Point::new(z, x)),
    }
}

/// Undoes the doubling and centering of [`sticker_location`].
fn layer_of(n: usize, coordinate: i64) -> usize {
    usize::try_from((coordinate + to_i64(n - 1)) / 2).unwrap_or(0)
}

fn to_i64(x: usize) -> i64 {
    i64::try_from(x).unwrap_or(i64::MAX)
}

/// One clockwise quarter turn about the positive end of `axis`.
pub(crate) fn rotate_vector([x, y, z]: [i64; 3], axis: Axis) -> [i64; 3] {
    match axis {
        Axis::X => [x, z, -y],
        Axis::Y => [-z, y, x],
        Axis::Z => [y, -x, z],
    }
}
