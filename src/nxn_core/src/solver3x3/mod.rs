//! Solving the reduced cube as a 3×3.
//!
//! Any strategy implementing [`Solver3x3`] can finish a reduced cube. The
//! crate ships [`CommutatorSolver`], which also serves as the reference used
//! to detect parity for strategies that cannot detect it themselves.

mod commutator;
mod tables;

use std::fmt::Display;

pub use commutator::CommutatorSolver;

use crate::{
    cube::Cube,
    operator::Operator,
    solver::{SolveError, SolveOutcome},
};

/// How much of the 3×3 solve to perform.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Stage3x3 {
    /// Put every corner and edge in its slot, ignoring orientation.
    Permutation,
    #[default]
    Full,
}

/// Progress of the 3×3 view of a cube.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Status3x3 {
    pub corners_placed: usize,
    pub corners_solved: usize,
    pub edges_placed: usize,
    pub edges_solved: usize,
    pub edge_parity: bool,
    pub corner_swap: bool,
}

impl Display for Status3x3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "corners {}/8 placed, {}/8 solved; edges {}/12 placed, {}/12 solved",
            self.corners_placed, self.corners_solved, self.edges_placed, self.edges_solved
        )?;
        if self.edge_parity {
            write!(f, "; edge parity")?;
        }
        if self.corner_swap {
            write!(f, "; corner swap")?;
        }
        Ok(())
    }
}

pub trait Solver3x3 {
    /// Solves the 3×3 view of the reduced cube held by `op`.
    ///
    /// Edge parity is reported before any move is played. A corner swap is
    /// fixed first and then reported, so the caller only records it and asks
    /// again.
    ///
    /// # Errors
    ///
    /// Fails if the cube is not a legal 3×3 once parity is accounted for, or
    /// if the solver breaks one of its own invariants.
    fn solve_3x3(
        &mut self,
        op: &mut Operator,
        debug: bool,
        stage: Stage3x3,
    ) -> Result<SolveOutcome, SolveError>;

    /// Whether a dedge is flipped. `None` means the solver cannot tell.
    fn detect_edge_parity(&self, _cube: &Cube) -> Option<bool> {
        None
    }

    /// Whether the corner and edge permutations disagree. `None` means the
    /// solver cannot tell.
    fn detect_corner_parity(&self, _cube: &Cube) -> Option<bool> {
        None
    }

    /// # Errors
    ///
    /// Fails if the stickers do not describe a 3×3.
    fn status_3x3(&self, cube: &Cube) -> Result<Status3x3, SolveError> {
        Ok(tables::analyze(&cube.projection_3x3())?.status())
    }
}

/// Hides the parity detectors of the wrapped solver, for strategies that have
/// none of their own.
pub struct WithoutDetectors<S>(pub S);

impl<S: Solver3x3> Solver3x3 for WithoutDetectors<S> {
    fn solve_3x3(
        &mut self,
        op: &mut Operator,
        debug: bool,
        stage: Stage3x3,
    ) -> Result<SolveOutcome, SolveError> {
        self.0.solve_3x3(op, debug, stage)
    }

    fn status_3x3(&self, cube: &Cube) -> Result<Status3x3, SolveError> {
        self.0.status_3x3(cube)
    }
}
