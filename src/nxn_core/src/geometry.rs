use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("Faces {0} and {1} are opposite and do not share an edge")]
    OppositeFaces(FaceName, FaceName),
    #[error("Face {0} was compared against itself")]
    SameFace(FaceName),
    #[error("Face {face} is not cut by the {slice} slice")]
    NotOnSlice { face: FaceName, slice: SliceName },
    #[error("No slice passes through both {0} and {1}")]
    NoSharedSlice(FaceName, FaceName),
    #[error("Distance {distance} is out of range for a face of width {n}")]
    DistanceOutOfRange { distance: usize, n: usize },
    #[error("Blocks {block} and {order_by} do not share a kernel")]
    KernelMismatch { block: String, order_by: String },
    #[error("Invalid face name `{0}`")]
    InvalidFaceName(String),
    #[error("Invalid slice name `{0}`")]
    InvalidSliceName(String),
}

/// The six faces of the cube, named by the usual Singmaster letters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FaceName {
    F,
    B,
    L,
    R,
    U,
    D,
}

impl FaceName {
    pub const ALL: [Self; 6] = {
        use FaceName::*;
        let v = [F, B, L, R, U, D];

        let mut i = 0;
        while i < v.len() {
            assert!(i == v[i] as usize);
            i += 1;
        }

        v
    };

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn opposite(self) -> Self {
        use FaceName::*;
        match self {
            F => B,
            B => F,
            L => R,
            R => L,
            U => D,
            D => U,
        }
    }

    /// The face lying across `edge` when this face is viewed in its own LTR
    /// frame.
    #[must_use]
    pub const fn neighbor(self, edge: EdgePosition) -> Self {
        use EdgePosition::*;
        use FaceName::*;
        let [top, bottom, left, right] = match self {
            F => [U, D, L, R],
            B => [U, D, R, L],
            R => [U, D, F, B],
            L => [U, D, B, F],
            U => [B, F, L, R],
            D => [F, B, L, R],
        };
        match edge {
            Top => top,
            Bottom => bottom,
            Left => left,
            Right => right,
        }
    }

    /// Which of this face's edges borders `other`.
    ///
    /// # Errors
    ///
    /// Fails if `other` is this face or its opposite.
    pub fn edge_to(self, other: FaceName) -> Result<EdgePosition, GeometryError> {
        if self == other {
            return Err(GeometryError::SameFace(self));
        }
        self.shared_edge(other)
            .ok_or(GeometryError::OppositeFaces(self, other))
    }

    /// [`FaceName::edge_to`] for constant contexts. `None` for this face and
    /// its opposite.
    #[must_use]
    pub const fn shared_edge(self, other: FaceName) -> Option<EdgePosition> {
        let mut i = 0;
        while i < EdgePosition::ALL.len() {
            let edge = EdgePosition::ALL[i];
            if self.neighbor(edge) as usize == other as usize {
                return Some(edge);
            }
            i += 1;
        }
        None
    }

    /// The axis the face is perpendicular to, and whether its outward normal
    /// points along the positive direction of that axis.
    #[must_use]
    pub const fn axis(self) -> (Axis, bool) {
        use FaceName::*;
        match self {
            R => (Axis::X, true),
            L => (Axis::X, false),
            U => (Axis::Y, true),
            D => (Axis::Y, false),
            F => (Axis::Z, true),
            B => (Axis::Z, false),
        }
    }

    /// The neighbour that sits at the low end of the coordinate running along
    /// `edge`. Two faces see the wings of their shared edge in the same order
    /// exactly when their low-end neighbours agree.
    #[must_use]
    pub const fn low_neighbor(self, edge: EdgePosition) -> Self {
        match edge {
            EdgePosition::Top | EdgePosition::Bottom => self.neighbor(EdgePosition::Left),
            EdgePosition::Left | EdgePosition::Right => self.neighbor(EdgePosition::Bottom),
        }
    }
}

impl FromStr for FaceName {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "F" => Ok(FaceName::F),
            "B" => Ok(FaceName::B),
            "L" => Ok(FaceName::L),
            "R" => Ok(FaceName::R),
            "U" => Ok(FaceName::U),
            "D" => Ok(FaceName::D),
            _ => Err(GeometryError::InvalidFaceName(s.to_owned())),
        }
    }
}

impl Display for FaceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EdgePosition {
    Top,
    Bottom,
    Left,
    Right,
}

impl EdgePosition {
    pub const ALL: [Self; 4] = [Self::Top, Self::Bottom, Self::Left, Self::Right];

    /// Edges in clockwise order starting from the top.
    pub const CLOCKWISE: [Self; 4] = [Self::Top, Self::Right, Self::Bottom, Self::Left];

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    #[must_use]
    pub const fn is_horizontal(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// An inner cut of the cube parallel to a pair of opposite faces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SliceName {
    M,
    E,
    S,
}

impl SliceName {
    pub const ALL: [Self; 3] = [Self::M, Self::E, Self::S];

    /// Slice index 0 is the inner layer adjacent to this face, and a positive
    /// slice turn follows this face's clockwise turn.
    #[must_use]
    pub const fn reference_face(self) -> FaceName {
        match self {
            Self::M => FaceName::L,
            Self::E => FaceName::D,
            Self::S => FaceName::F,
        }
    }

    #[must_use]
    pub const fn axis(self) -> Axis {
        self.reference_face().axis().0
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the slice cuts through `face`.
    #[must_use]
    pub fn cuts(self, face: FaceName) -> bool {
        face.axis().0 != self.axis()
    }

    /// The first slice cutting both faces.
    ///
    /// # Errors
    ///
    /// Fails if the faces are identical.
    pub fn between(a: FaceName, b: FaceName) -> Result<Self, GeometryError> {
        if a == b {
            return Err(GeometryError::SameFace(a));
        }
        Self::ALL
            .into_iter()
            .find(|slice| slice.cuts(a) && slice.cuts(b))
            .ok_or(GeometryError::NoSharedSlice(a, b))
    }
}

impl FromStr for SliceName {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "M" => Ok(Self::M),
            "E" => Ok(Self::E),
            "S" => Ok(Self::S),
            _ => Err(GeometryError::InvalidSliceName(s.to_owned())),
        }
    }
}

impl Display for SliceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A cell on a face in its LTR frame: row 0 is the bottom, col 0 the left.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point {
    pub row: usize,
    pub col: usize,
}

impl Point {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Point { row, col }
    }

    /// Rotates the point 90 degrees clockwise on an `n` by `n` grid.
    #[must_use]
    pub const fn rotate_cw(self, n: usize) -> Self {
        Point {
            row: n - 1 - self.col,
            col: self.row,
        }
    }

    #[must_use]
    pub const fn rotate_ccw(self, n: usize) -> Self {
        Point {
            row: self.col,
            col: n - 1 - self.row,
        }
    }

    /// Rotates clockwise `k` times. `k` is taken modulo 4.
    #[must_use]
    pub const fn rotate_cw_n(self, n: usize, k: usize) -> Self {
        match k % 4 {
            0 => self,
            1 => self.rotate_cw(n),
            2 => Point {
                row: n - 1 - self.row,
                col: n - 1 - self.col,
            },
            _ => self.rotate_ccw(n),
        }
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    Green,
    Blue,
    Orange,
    Red,
    White,
    Yellow,
}

impl Color {
    pub const ALL: [Self; 6] = [
        Self::Green,
        Self::Blue,
        Self::Orange,
        Self::Red,
        Self::White,
        Self::Yellow,
    ];

    /// The colour a face carries on a solved cube in the standard scheme.
    #[must_use]
    pub const fn of_face(face: FaceName) -> Self {
        Self::ALL[face.index()]
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Green => 'G',
            Self::Blue => 'B',
            Self::Orange => 'O',
            Self::Red => 'R',
            Self::White => 'W',
            Self::Yellow => 'Y',
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One of the twelve edges of the cube, named by its two faces. The order of
/// the faces matters: wings are reported as `(colour on first, colour on
/// second)`.
///
/// Each slot also records which edge of each face it runs along, so a slot
/// can only name two adjacent faces.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EdgeSlot {
    first: FaceName,
    second: FaceName,
    edges: (EdgePosition, EdgePosition),
}

impl EdgeSlot {
    pub const ALL: [Self; 12] = {
        use FaceName::*;
        [
            Self::known(F, U),
            Self::known(F, D),
            Self::known(F, L),
            Self::known(F, R),
            Self::known(B, U),
            Self::known(B, D),
            Self::known(B, L),
            Self::known(B, R),
            Self::known(U, L),
            Self::known(U, R),
            Self::known(D, L),
            Self::known(D, R),
        ]
    };

    pub const FL: Self = Self::known(FaceName::F, FaceName::L);
    pub const FR: Self = Self::known(FaceName::F, FaceName::R);
    pub const FU: Self = Self::known(FaceName::F, FaceName::U);
    pub const UR: Self = Self::known(FaceName::U, FaceName::R);

    /// Only used for the constants above, where a pair of faces that do not
    /// touch stops the build.
    const fn known(first: FaceName, second: FaceName) -> Self {
        let (Some(e1), Some(e2)) = (first.shared_edge(second), second.shared_edge(first)) else {
            panic!("edge slot faces must be adjacent");
        };
        EdgeSlot {
            first,
            second,
            edges: (e1, e2),
        }
    }

    /// # Errors
    ///
    /// Fails if the faces are equal or opposite.
    pub fn new(first: FaceName, second: FaceName) -> Result<Self, GeometryError> {
        Ok(EdgeSlot {
            first,
            second,
            edges: (first.edge_to(second)?, second.edge_to(first)?),
        })
    }

    #[must_use]
    pub const fn faces(self) -> (FaceName, FaceName) {
        (self.first, self.second)
    }

    /// The edge of the first face and the edge of the second face that meet
    /// at this slot.
    #[must_use]
    pub const fn edges(self) -> (EdgePosition, EdgePosition) {
        self.edges
    }

    #[must_use]
    pub fn contains(self, face: FaceName) -> bool {
        self.first == face || self.second == face
    }

    /// Whether both slots name the same physical edge.
    #[must_use]
    pub fn same_edge(self, other: EdgeSlot) -> bool {
        other.contains(self.first) && other.contains(self.second)
    }
}

impl Display for EdgeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.first, self.second)
    }
}

/// A full row or column on a face.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OrthogonalLine {
    Row(usize),
    Col(usize),
}

impl OrthogonalLine {
    /// The cells of the line on an `n` by `n` grid, in increasing order of the
    /// free coordinate.
    pub fn points(self, n: usize) -> impl Iterator<Item = Point> {
        (0..n).map(move |i| match self {
            OrthogonalLine::Row(row) => Point::new(row, i),
            OrthogonalLine::Col(col) => Point::new(i, col),
        })
    }
}

/// Finds the line on `face` that runs parallel to the edge shared with
/// `base_face`, `distance` cells away from it.
///
/// # Errors
///
/// Fails if the two faces are the same or opposite, or if `distance` does not
/// fit on a grid of width `n`.
pub fn get_orthogonal_index_by_distance_from_face(
    face: FaceName,
    base_face: FaceName,
    distance: usize,
    n: usize,
) -> Result<OrthogonalLine, GeometryError> {
    let edge = face.edge_to(base_face)?;
    if distance >= n {
        return Err(GeometryError::DistanceOutOfRange { distance, n });
    }
    Ok(match edge {
        EdgePosition::Top => OrthogonalLine::Row(n - 1 - distance),
        EdgePosition::Bottom => OrthogonalLine::Row(distance),
        EdgePosition::Left => OrthogonalLine::Col(distance),
        EdgePosition::Right => OrthogonalLine::Col(n - 1 - distance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbors_are_symmetric() {
        for face in FaceName::ALL {
            for edge in EdgePosition::ALL {
                let other = face.neighbor(edge);
                assert_ne!(other, face);
                assert_ne!(other, face.opposite());
                assert_eq!(other.neighbor(other.edge_to(face).unwrap()), face);
            }
        }
    }

    #[test]
    fn edge_slots_only_join_adjacent_faces() {
        use FaceName::*;
        for slot in EdgeSlot::ALL {
            let (first, second) = slot.faces();
            assert_eq!(EdgeSlot::new(first, second), Ok(slot));
            let (e1, e2) = slot.edges();
            assert_eq!(first.neighbor(e1), second);
            assert_eq!(second.neighbor(e2), first);
        }
        assert_eq!(EdgeSlot::new(U, D), Err(GeometryError::OppositeFaces(U, D)));
        assert_eq!(EdgeSlot::new(F, F), Err(GeometryError::SameFace(F)));
        assert_eq!(F.shared_edge(B), None);
    }

    #[test]
    fn orthogonal_index_rejects_opposite_and_same_faces() {
        for face in FaceName::ALL {
            for d in 0..5 {
                assert_eq!(
                    get_orthogonal_index_by_distance_from_face(face, face.opposite(), d, 5),
                    Err(GeometryError::OppositeFaces(face, face.opposite()))
                );
                assert_eq!(
                    get_orthogonal_index_by_distance_from_face(face, face, d, 5),
                    Err(GeometryError::SameFace(face))
                );
            }
        }
    }

    #[test]
    fn orthogonal_index_counts_from_the_shared_edge() {
        use FaceName::*;
        assert_eq!(
            get_orthogonal_index_by_distance_from_face(F, U, 0, 4),
            Ok(OrthogonalLine::Row(3))
        );
        assert_eq!(
            get_orthogonal_index_by_distance_from_face(F, D, 1, 4),
            Ok(OrthogonalLine::Row(1))
        );
        assert_eq!(
            get_orthogonal_index_by_distance_from_face(R, B, 1, 4),
            Ok(OrthogonalLine::Col(2))
        );
        assert!(get_orthogonal_index_by_distance_from_face(R, B, 4, 4).is_err());
    }

    #[test]
    fn rotations_compose() {
        let n = 5;
        let p = Point::new(1, 3);
        assert_eq!(p.rotate_cw(n).rotate_ccw(n), p);
        assert_eq!(p.rotate_cw_n(n, 4), p);
        assert_eq!(p.rotate_cw_n(n, 2), p.rotate_cw(n).rotate_cw(n));
        assert_eq!(p.rotate_cw_n(n, 3), p.rotate_ccw(n));
    }

    #[test]
    fn slices_connect_adjacent_and_opposite_faces() {
        use FaceName::*;
        assert_eq!(SliceName::between(U, F), Ok(SliceName::M));
        assert_eq!(SliceName::between(U, D), Ok(SliceName::M));
        assert_eq!(SliceName::between(F, R), Ok(SliceName::E));
        assert_eq!(SliceName::between(L, R), Ok(SliceName::E));
        assert_eq!(SliceName::between(U, R), Ok(SliceName::S));
        assert!(SliceName::between(U, U).is_err());
    }
}
