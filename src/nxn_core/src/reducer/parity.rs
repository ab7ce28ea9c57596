//! Sequences fixing the two parities of a reduced even cube, and single wing
//! orbit flips for partially paired dedges.

use std::sync::LazyLock;

use crate::{
    alg::{Alg, AlgParseError, Layers, Move},
    config::ParityAlgorithm,
    cube::CubeError,
    geometry::{FaceName, SliceName},
    solver::{Invariant, SolveError},
};

static OLL_STANDARD: LazyLock<Result<Alg, AlgParseError>> =
    LazyLock::new(|| "r2 B2 U2 l U2 r' U2 r U2 F2 r F2 l' B2 r2".parse());

static OLL_ADVANCED: LazyLock<Result<Alg, AlgParseError>> =
    LazyLock::new(|| "r' U2 l F2 l' F2 r2 U2 r U2 r' U2 F2 r2 F2".parse());

static PLL: LazyLock<Result<Alg, AlgParseError>> =
    LazyLock::new(|| "r2 U2 r2 Uw2 r2 Uw2".parse());

/// Flips the wings of the UF dedge at the given depths, leaving every other
/// edge where it is. Only centers in the same colour group move.
///
/// [`ParityAlgorithm::Standard`] plays its inner layers as `M` slices,
/// [`ParityAlgorithm::Advanced`] as single `R`/`L` layers.
///
/// # Errors
///
/// Fails if a depth is not in `2..=size / 2`.
pub fn edge_flip(
    algorithm: ParityAlgorithm,
    size: usize,
    depths: &[usize],
) -> Result<Alg, SolveError> {
    if let Some(&depth) = depths.iter().find(|&&d| d < 2 || d > size / 2) {
        return Err(CubeError::LayerOutOfRange { depth, size }.into());
    }
    let template = match algorithm {
        ParityAlgorithm::Standard => Invariant::built("OLL parity sequence", &OLL_STANDARD)?,
        ParityAlgorithm::Advanced => Invariant::built("OLL parity sequence", &OLL_ADVANCED)?,
    };
    Ok(template.flat_map(|mv| match *mv {
        Move::Face {
            face: face @ (FaceName::R | FaceName::L),
            layers: Layers::Inner,
            turns,
        } => inner_layers(algorithm, face, size, depths, i64::from(turns)),
        _ => vec![mv.clone()],
    }))
}

fn inner_layers(
    algorithm: ParityAlgorithm,
    face: FaceName,
    size: usize,
    depths: &[usize],
    turns: i64,
) -> Vec<Move> {
    match algorithm {
        // M turns with L, and slice index i sits at L depth i + 2.
        ParityAlgorithm::Standard => {
            let (indices, turns) = if face == FaceName::R {
                (depths.iter().map(|d| size - d - 1).collect(), -turns)
            } else {
                (depths.iter().map(|d| d - 2).collect(), turns)
            };
            Move::slice(SliceName::M, indices, turns).into_iter().collect()
        }
        ParityAlgorithm::Advanced => depths
            .iter()
            .filter_map(|&d| Move::face_layers(face, Layers::Depth(d), turns))
            .collect(),
    }
}

/// Swaps the UF and UB dedges of an even cube, keeping it reduced.
///
/// # Errors
///
/// Fails only if the built-in sequence does not parse.
pub fn dedge_swap() -> Result<Alg, SolveError> {
    Ok(Invariant::built("PLL parity sequence", &PLL)?.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cube::Cube, geometry::EdgeSlot};

    fn flipped_wings(cube: &Cube) -> Vec<(EdgeSlot, usize)> {
        EdgeSlot::ALL
            .into_iter()
            .flat_map(|edge| (0..cube.n_center()).map(move |i| (edge, i)))
            .filter(|&(edge, i)| {
                let solved = Cube::new(cube.size()).unwrap();
                cube.wing(edge, i) != solved.wing(edge, i)
            })
            .collect()
    }

    #[test]
    fn full_flip_keeps_the_cube_reduced() {
        for algorithm in [ParityAlgorithm::Standard, ParityAlgorithm::Advanced] {
            for size in [4, 6] {
                let mut cube = Cube::new(size).unwrap();
                let depths = (2..=size / 2).collect::<Vec<_>>();
                cube.apply_alg(&edge_flip(algorithm, size, &depths).unwrap())
                    .unwrap();
                assert!(cube.is_reduced(), "{algorithm:?} on {size}");
                let flipped = flipped_wings(&cube);
                assert_eq!(flipped.len(), size - 2);
                assert!(flipped.iter().all(|(edge, _)| edge.same_edge(EdgeSlot::FU)));
            }
        }
    }

    #[test]
    fn single_orbit_flip_touches_two_wings() {
        for algorithm in [ParityAlgorithm::Standard, ParityAlgorithm::Advanced] {
            let mut cube = Cube::new(6).unwrap();
            cube.apply_alg(&edge_flip(algorithm, 6, &[2]).unwrap())
                .unwrap();
            let flipped = flipped_wings(&cube);
            assert_eq!(flipped.len(), 2, "{algorithm:?}");
            assert!(FaceName::ALL.into_iter().all(|f| cube.is_center_uniform(f)));
        }
    }

    #[test]
    fn rejects_outer_and_deep_layers() {
        assert!(edge_flip(ParityAlgorithm::Standard, 6, &[1]).is_err());
        assert!(edge_flip(ParityAlgorithm::Standard, 6, &[4]).is_err());
    }

    #[test]
    fn dedge_swap_keeps_the_cube_reduced() {
        let mut cube = Cube::new(4).unwrap();
        cube.apply_alg(&dedge_swap().unwrap()).unwrap();
        assert!(cube.is_reduced());
        assert!(!cube.is_solved());
    }
}
