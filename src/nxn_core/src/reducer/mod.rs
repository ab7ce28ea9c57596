//! Reduction of an N×N×N cube to a 3×3: uniform centers, paired edges.

mod centers;
mod edges;
pub mod parity;

use log::{debug, info};

use crate::{
    config::SolverConfig,
    cube::{Cube, CubeError},
    operator::Operator,
    solver::{Invariant, SolveError},
    start, success,
};

pub use centers::CenterSolver;
pub use edges::EdgeSolver;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct ReductionResults {
    /// The last dedge had to be fixed one wing orbit at a time.
    pub partial_edge_parity_detected: bool,
}

pub trait Reducer {
    /// Makes every center uniform and pairs every edge.
    ///
    /// # Errors
    ///
    /// Fails if the cube cannot be reduced, or if the reducer breaks one of
    /// its own invariants.
    fn reduce(&mut self, op: &mut Operator, debug: bool)
    -> Result<ReductionResults, SolveError>;

    /// Flips one whole dedge of a reduced cube.
    ///
    /// # Errors
    ///
    /// Fails on cubes where a single flipped dedge is unreachable.
    fn fix_edge_parity(&mut self, op: &mut Operator) -> Result<(), SolveError>;

    /// Swaps two dedges of a reduced cube without disturbing anything else.
    ///
    /// # Errors
    ///
    /// Fails on cubes where a lone dedge swap is unreachable.
    fn fix_corner_parity(&mut self, op: &mut Operator) -> Result<(), SolveError>;

    fn is_reduced(&self, cube: &Cube) -> bool {
        cube.is_reduced()
    }
}

/// Reduces by solving the centers face by face with slice commutators, then
/// pairing edges in the FL/FR slots.
#[derive(Debug, Clone, Default)]
pub struct NxnReducer {
    config: SolverConfig,
}

impl NxnReducer {
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        NxnReducer { config }
    }
}

impl Reducer for NxnReducer {
    fn reduce(
        &mut self,
        op: &mut Operator,
        debug: bool,
    ) -> Result<ReductionResults, SolveError> {
        let mut results = ReductionResults::default();
        if op.cube().size() <= 3 {
            return Ok(results);
        }
        if self.is_reduced(op.cube()) {
            debug!("Cube is already reduced");
            return Ok(results);
        }

        info!(start!("Reducing a {}x{} cube"), op.cube().size(), op.cube().size());
        let start_moves = op.move_count();
        CenterSolver::new(&self.config).solve(op, debug)?;
        results.partial_edge_parity_detected =
            EdgeSolver::new(self.config.parity_algorithm).solve(op, debug)?;

        if !self.is_reduced(op.cube()) {
            return Err(Invariant::NotReduced.into());
        }
        info!(
            success!("Reduced in {} moves"),
            op.move_count() - start_moves
        );
        Ok(results)
    }

    fn fix_edge_parity(&mut self, op: &mut Operator) -> Result<(), SolveError> {
        let size = op.cube().size();
        if !op.cube().is_even() {
            return Err(CubeError::FlippedEdge.into());
        }
        let depths = (2..=size / 2).collect::<Vec<_>>();
        let alg = parity::edge_flip(self.config.parity_algorithm, size, &depths)?;
        debug!("Flipping the UF dedge with {alg}");
        op.play(&alg, false, None)?;
        Ok(())
    }

    fn fix_corner_parity(&mut self, op: &mut Operator) -> Result<(), SolveError> {
        if !op.cube().is_even() {
            return Err(CubeError::UnreachablePermutation.into());
        }
        debug!("Swapping the UF and UB dedges");
        op.play(&parity::dedge_swap()?, false, None)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alg::Alg;

    fn scrambled(size: usize, alg: &str) -> Operator {
        let mut cube = Cube::new(size).unwrap();
        cube.apply_alg(&alg.parse::<Alg>().unwrap()).unwrap();
        Operator::new(cube)
    }

    #[test]
    fn reduces_small_scrambles() {
        for (size, alg) in [
            (4, "Rw U2 Fw' r D 3L2 Bw u' R2 f"),
            (5, "Rw U2 3Fw' r D Lw2 B u' R2 f 3Rw' d2"),
        ] {
            let mut op = scrambled(size, alg);
            NxnReducer::default().reduce(&mut op, true).unwrap();
            assert!(op.cube().is_reduced(), "{size}: {alg}");
        }
    }

    #[test]
    fn three_by_three_is_left_alone() {
        let mut op = scrambled(3, "R U F");
        NxnReducer::default().reduce(&mut op, false).unwrap();
        assert_eq!(op.move_count(), 0);
    }

    #[test]
    fn parity_fixes_refuse_odd_cubes() {
        let mut op = Operator::new(Cube::new(5).unwrap());
        let mut reducer = NxnReducer::default();
        assert!(matches!(
            reducer.fix_edge_parity(&mut op),
            Err(SolveError::InvalidCube(CubeError::FlippedEdge))
        ));
        assert!(matches!(
            reducer.fix_corner_parity(&mut op),
            Err(SolveError::InvalidCube(CubeError::UnreachablePermutation))
        ));
    }
}
