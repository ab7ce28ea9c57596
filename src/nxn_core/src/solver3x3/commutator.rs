use log::{Level, debug, log};

use crate::{
    cube::{Cube, CubeError},
    operator::Operator,
    reducer::parity,
    solver::{Invariant, ParityKind, SolveError, SolveOutcome},
    solver3x3::{
        Solver3x3, Stage3x3,
        tables::{analyze, tables},
    },
    start, success,
};

/// Solves the 3×3 view of a reduced cube by placing pieces with 3-cycles and
/// orienting them in pairs, each a conjugated base algorithm.
///
/// Only outer layer turns and `E` are played, so the solution is valid on the
/// full cube for any size.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommutatorSolver;

impl CommutatorSolver {
    #[must_use]
    pub fn new() -> Self {
        CommutatorSolver
    }
}

impl Solver3x3 for CommutatorSolver {
    fn solve_3x3(
        &mut self,
        op: &mut Operator,
        debug: bool,
        stage: Stage3x3,
    ) -> Result<SolveOutcome, SolveError> {
        let projection = op.cube().projection_3x3();
        let analysis = analyze(&projection)?;
        if analysis.twist != 0 {
            return Err(CubeError::TwistedCorners.into());
        }
        if analysis.flip % 2 == 1 {
            return Ok(SolveOutcome::ParityDetected(ParityKind::EdgeParity));
        }
        if analysis.corner_parity != analysis.edge_parity {
            if !op.cube().is_even() {
                return Err(CubeError::UnreachablePermutation.into());
            }
            debug!("Swapping the UF and UB dedges before reporting the corner swap");
            op.play(&parity::dedge_swap()?, false, None)?;
            return Ok(SolveOutcome::ParityDetected(ParityKind::CornerSwap));
        }

        // Query mode runs with animation off and stays out of the progress log.
        let level = if op.animation() {
            Level::Info
        } else {
            Level::Debug
        };
        log!(level, start!("Solving the 3x3 view ({})"), analysis.status());
        let solution = tables()?.solve(&analysis, stage)?;
        debug!("3x3 solution: {solution}");
        if debug && stage == Stage3x3::Full {
            let mut check = projection;
            check.apply_alg(&solution)?;
            if !check.is_solved() {
                return Err(Invariant::SolverDisagrees.into());
            }
        }
        op.play(&solution, false, None)?;
        log!(level, success!("Solved the 3x3 view in {} moves"), solution.len());
        Ok(SolveOutcome::Solved)
    }

    fn detect_edge_parity(&self, cube: &Cube) -> Option<bool> {
        analyze(&cube.projection_3x3())
            .ok()
            .map(|analysis| analysis.flip % 2 == 1)
    }

    fn detect_corner_parity(&self, cube: &Cube) -> Option<bool> {
        analyze(&cube.projection_3x3())
            .ok()
            .map(|analysis| analysis.flip % 2 == 0 && analysis.corner_parity != analysis.edge_parity)
    }
}
