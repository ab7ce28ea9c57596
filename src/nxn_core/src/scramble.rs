//! Reproducible random scrambles.

use itertools::Itertools;

use crate::{
    alg::{Alg, Layers, Move},
    cube::{Cube, CubeError},
    geometry::FaceName,
};

pub use fastrand::Rng;

/// `len` random single layer turns. Every layer of the cube can be turned,
/// and no two consecutive moves turn the same face.
#[must_use]
pub fn random_scramble(size: usize, len: usize, rng: &mut fastrand::Rng) -> Alg {
    let moves = FaceName::ALL
        .into_iter()
        .cartesian_product(1..=(size / 2).max(1))
        .collect_vec();
    let mut out = Alg::default();
    let mut last = None;
    while out.len() < len {
        let (face, depth) = moves[rng.usize(..moves.len())];
        if last == Some(face) {
            continue;
        }
        let layers = if depth == 1 {
            Layers::Outer
        } else {
            Layers::Depth(depth)
        };
        out.push_opt(Move::face_layers(face, layers, rng.i64(1..=3)));
        last = Some(face);
    }
    out
}

impl Cube {
    /// A solved cube of `size` scrambled with `len` moves drawn from `seed`,
    /// together with the scramble.
    ///
    /// # Errors
    ///
    /// Fails if `size` is too small for a cube.
    pub fn scrambled(size: usize, seed: u64, len: usize) -> Result<(Cube, Alg), CubeError> {
        let mut cube = Cube::new(size)?;
        let scramble = random_scramble(size, len, &mut fastrand::Rng::with_seed(seed));
        cube.apply_alg(&scramble)?;
        Ok((cube, scramble))
    }
}
