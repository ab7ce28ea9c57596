//! Traversal of the four faces a slice cuts through.
//!
//! The topology part ([`WalkingInfoUnit`]) does not depend on the cube size
//! and is computed once per slice. Binding it to a concrete slice count gives
//! a [`CubeWalkingInfo`], which each [`crate::cube::Cube`] caches for itself.

use std::sync::LazyLock;

use log::trace;

use crate::geometry::{
    EdgePosition, FaceName, GeometryError, Point, SliceName,
    get_orthogonal_index_by_distance_from_face,
};

/// How one face of a slice cycle is entered and oriented.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FaceWalkingInfoUnit {
    pub face: FaceName,
    /// The edge through which the walk enters this face.
    pub edge: EdgePosition,
    /// Whether slice indices run against this face's own coordinate along
    /// the entry edge.
    pub inverted: bool,
}

impl FaceWalkingInfoUnit {
    /// Maps a cell of an `n` by `n` grid to `(slice index, slot)`, where the
    /// slot counts cells inward from the entry edge.
    #[must_use]
    pub const fn to_slice(&self, n: usize, p: Point) -> (usize, usize) {
        let (slot, along) = match self.edge {
            EdgePosition::Top => (n - 1 - p.row, p.col),
            EdgePosition::Bottom => (p.row, p.col),
            EdgePosition::Left => (p.col, p.row),
            EdgePosition::Right => (n - 1 - p.col, p.row),
        };
        let index = if self.inverted { n - 1 - along } else { along };
        (index, slot)
    }

    #[must_use]
    pub const fn from_slice(&self, n: usize, index: usize, slot: usize) -> Point {
        let along = if self.inverted { n - 1 - index } else { index };
        match self.edge {
            EdgePosition::Top => Point::new(n - 1 - slot, along),
            EdgePosition::Bottom => Point::new(slot, along),
            EdgePosition::Left => Point::new(along, slot),
            EdgePosition::Right => Point::new(along, n - 1 - slot),
        }
    }
}

/// The size independent walk around one slice. A positive quarter turn of the
/// slice carries `(faces[k], index, slot)` onto `(faces[k + 1], index, slot)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkingInfoUnit {
    pub slice: SliceName,
    pub faces: [FaceWalkingInfoUnit; 4],
}

impl WalkingInfoUnit {
    /// The record for `face`, if the slice passes through it.
    #[must_use]
    pub fn get(&self, face: FaceName) -> Option<&FaceWalkingInfoUnit> {
        self.faces.iter().find(|info| info.face == face)
    }

    /// The face visited right after `face`.
    #[must_use]
    pub fn successor(&self, face: FaceName) -> Option<FaceName> {
        let position = self.faces.iter().position(|info| info.face == face)?;
        Some(self.faces[(position + 1) % 4].face)
    }
}

/// Walks the four faces around `slice`, starting from position `start` of the
/// cycle formed by the reference face's neighbours in clockwise order.
///
/// The result describes the same physical traversal for every `start`; only
/// the position of the first face in `faces` changes.
///
/// # Errors
///
/// Fails if two faces met along the walk do not share an edge, which would
/// mean the neighbour table is wrong.
pub fn create_walking_info_unit(
    slice: SliceName,
    start: usize,
) -> Result<WalkingInfoUnit, GeometryError> {
    let reference = slice.reference_face();
    let cycle = EdgePosition::CLOCKWISE.map(|edge| reference.neighbor(edge));

    let mut face = cycle[start % 4];
    let mut entry = face.edge_to(cycle[(start + 3) % 4])?;
    let mut faces = [FaceWalkingInfoUnit {
        face,
        edge: entry,
        inverted: false,
    }; 4];
    for info in &mut faces {
        *info = FaceWalkingInfoUnit {
            face,
            edge: entry,
            inverted: face.low_neighbor(entry) != reference,
        };
        let next = face.neighbor(entry.opposite());
        entry = next.edge_to(face)?;
        face = next;
    }

    trace!("Walked slice {slice} from offset {start}: {faces:?}");
    Ok(WalkingInfoUnit { slice, faces })
}

static UNITS: LazyLock<Result<[WalkingInfoUnit; 3], GeometryError>> = LazyLock::new(|| {
    let [m, e, s] = SliceName::ALL.map(|slice| create_walking_info_unit(slice, 0));
    Ok([m?, e?, s?])
});

/// The cached walk for `slice`, computed from a fixed starting face.
///
/// # Errors
///
/// Fails if the walks could not be built.
pub fn walking_info_unit(slice: SliceName) -> Result<&'static WalkingInfoUnit, GeometryError> {
    UNITS
        .as_ref()
        .map(|units| &units[slice.index()])
        .map_err(Clone::clone)
}

/// Recomputes the walk from a random starting face. Any result must agree
/// with [`walking_info_unit`]; this exists so tests can shake out
/// start-dependent mistakes.
///
/// # Errors
///
/// Fails like [`create_walking_info_unit`].
pub fn walking_info_unit_randomized(
    slice: SliceName,
    rng: &mut fastrand::Rng,
) -> Result<WalkingInfoUnit, GeometryError> {
    create_walking_info_unit(slice, rng.usize(0..4))
}

/// One face of a slice walk bound to a concrete slice count.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FaceWalkingInfo {
    pub face: FaceName,
    pub edge: EdgePosition,
    pub inverted: bool,
    /// Where the slice anchor `(index 0, slot 0)` lands on this face.
    pub reference_point: Point,
}

impl FaceWalkingInfo {
    /// A cube without inner slices has no center grid; its walk is laid out
    /// on a single cell so the anchor still exists.
    fn new(unit: &FaceWalkingInfoUnit, n_slices: usize) -> Self {
        FaceWalkingInfo {
            face: unit.face,
            edge: unit.edge,
            inverted: unit.inverted,
            reference_point: unit.from_slice(n_slices.max(1), 0, 0),
        }
    }

    fn unit(&self) -> FaceWalkingInfoUnit {
        FaceWalkingInfoUnit {
            face: self.face,
            edge: self.edge,
            inverted: self.inverted,
        }
    }
}

/// The clockwise rotation carrying one face's center frame onto another's.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Transform {
    pub n: usize,
    pub n_rotations: usize,
}

impl Transform {
    #[must_use]
    pub const fn apply(self, p: Point) -> Point {
        p.rotate_cw_n(self.n, self.n_rotations)
    }

    #[must_use]
    pub const fn inverse(self) -> Self {
        Transform {
            n: self.n,
            n_rotations: (4 - self.n_rotations) % 4,
        }
    }
}

/// The walk around a slice for a cube with `n_slices` inner layers, in the
/// coordinates of the faces' center grids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeWalkingInfo {
    pub slice: SliceName,
    pub n_slices: usize,
    pub face_infos: [FaceWalkingInfo; 4],
}

impl CubeWalkingInfo {
    #[must_use]
    pub fn new(unit: &WalkingInfoUnit, n_slices: usize) -> Self {
        CubeWalkingInfo {
            slice: unit.slice,
            n_slices,
            face_infos: unit.faces.map(|face| FaceWalkingInfo::new(&face, n_slices)),
        }
    }

    fn position(&self, face: FaceName) -> Result<usize, GeometryError> {
        self.face_infos
            .iter()
            .position(|info| info.face == face)
            .ok_or(GeometryError::NotOnSlice {
                face,
                slice: self.slice,
            })
    }

    /// # Errors
    ///
    /// Fails if the slice does not cut `face`.
    pub fn get(&self, face: FaceName) -> Result<&FaceWalkingInfo, GeometryError> {
        Ok(&self.face_infos[self.position(face)?])
    }

    /// `(slice index, slot)` of a center cell of `face`.
    ///
    /// # Errors
    ///
    /// Fails if the slice does not cut `face`.
    pub fn to_slice(&self, face: FaceName, p: Point) -> Result<(usize, usize), GeometryError> {
        Ok(self.get(face)?.unit().to_slice(self.n_slices, p))
    }

    /// # Errors
    ///
    /// Fails if the slice does not cut `face`.
    pub fn from_slice(
        &self,
        face: FaceName,
        index: usize,
        slot: usize,
    ) -> Result<Point, GeometryError> {
        Ok(self.get(face)?.unit().from_slice(self.n_slices, index, slot))
    }

    /// How many positive slice quarter turns carry `source` onto `target`.
    ///
    /// # Errors
    ///
    /// Fails if the slice does not cut both faces.
    pub fn quarter_turns_between(
        &self,
        source: FaceName,
        target: FaceName,
    ) -> Result<usize, GeometryError> {
        Ok((self.position(target)? + 4 - self.position(source)?) % 4)
    }

    /// The cell on `target` that shares slice index and slot with `p` on
    /// `source`.
    ///
    /// # Errors
    ///
    /// Fails if the slice does not cut both faces.
    pub fn translate(
        &self,
        source: FaceName,
        target: FaceName,
        p: Point,
    ) -> Result<Point, GeometryError> {
        let (index, slot) = self.to_slice(source, p)?;
        self.from_slice(target, index, slot)
    }

    /// The rotation between the two faces' frames, found by matching their
    /// reference points. It agrees with [`CubeWalkingInfo::translate`] on
    /// every cell.
    ///
    /// # Errors
    ///
    /// Fails if the slice does not cut both faces.
    pub fn get_transform(
        &self,
        source: FaceName,
        target: FaceName,
    ) -> Result<Transform, GeometryError> {
        let from = self.get(source)?.reference_point;
        let to = self.get(target)?.reference_point;
        let n_rotations = (0..4)
            .find(|&k| from.rotate_cw_n(self.n_slices.max(1), k) == to)
            .ok_or(GeometryError::NoSharedSlice(source, target))?;
        Ok(Transform {
            n: self.n_slices,
            n_rotations,
        })
    }
}

/// The center cells of `face` on the line `distance` cells in from the edge
/// shared with `base_face`, in center grid coordinates.
///
/// # Errors
///
/// Fails if the faces are not adjacent, or if `distance` is not smaller than
/// `n_center`.
pub fn iterate_orthogonal_face_center_pieces(
    face: FaceName,
    base_face: FaceName,
    distance: usize,
    n_center: usize,
) -> Result<impl Iterator<Item = Point>, GeometryError> {
    Ok(get_orthogonal_index_by_distance_from_face(face, base_face, distance, n_center)?
        .points(n_center))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_have_four_distinct_faces() {
        for slice in SliceName::ALL {
            let unit = walking_info_unit(slice).unwrap();
            for info in &unit.faces {
                assert!(slice.cuts(info.face));
                assert_eq!(unit.faces.iter().filter(|i| i.face == info.face).count(), 1);
            }
        }
    }

    #[test]
    fn walk_matches_known_cycles() {
        use EdgePosition::*;
        use FaceName::*;

        let m = walking_info_unit(SliceName::M).unwrap();
        assert_eq!(m.faces.map(|info| info.face), [U, F, D, B]);
        assert_eq!(m.get(B).map(|i| (i.edge, i.inverted)), Some((Bottom, true)));
        assert_eq!(m.get(U).map(|i| (i.edge, i.inverted)), Some((Top, false)));

        let e = walking_info_unit(SliceName::E).unwrap();
        assert_eq!(e.faces.map(|info| info.face), [F, R, B, L]);
        assert!(e.faces.iter().all(|i| i.edge == Left && !i.inverted));

        let s = walking_info_unit(SliceName::S).unwrap();
        assert_eq!(s.faces.map(|info| info.face), [U, R, D, L]);
        assert_eq!(s.get(D).map(|i| (i.edge, i.inverted)), Some((Right, true)));
    }

    #[test]
    fn to_and_from_slice_are_inverse() {
        let n = 5;
        for slice in SliceName::ALL {
            for info in &walking_info_unit(slice).unwrap().faces {
                for row in 0..n {
                    for col in 0..n {
                        let p = Point::new(row, col);
                        let (index, slot) = info.to_slice(n, p);
                        assert_eq!(info.from_slice(n, index, slot), p);
                    }
                }
            }
        }
    }

    #[test]
    fn orthogonal_center_pieces_follow_the_edge() {
        let row: Vec<_> = iterate_orthogonal_face_center_pieces(FaceName::F, FaceName::D, 1, 3)
            .unwrap()
            .collect();
        assert_eq!(row, vec![Point::new(1, 0), Point::new(1, 1), Point::new(1, 2)]);
        assert!(iterate_orthogonal_face_center_pieces(FaceName::F, FaceName::B, 0, 3).is_err());
    }
}
