//! Reduction and parity state machine.
//!
//! ```text
//! NotReduced -> Reduced -> ParityCheck -> Solving3x3 -> Solved
//!                  ^                        |    ^
//!                  +-- FixEdgeParity <------+    | (edge parity)
//!                                           +----+ (corner swap, already fixed)
//! ```

use std::fmt::Display;

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    config::SolverConfig,
    cube::CubeError,
    geometry::{Color, FaceName, GeometryError, Point},
    operator::Operator,
    reducer::{NxnReducer, Reducer},
    solver3x3::{CommutatorSolver, Solver3x3, Stage3x3},
    start, success, working,
};

/// Conditions that mean the solver itself is wrong, never the input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Invariant {
    #[error("a commutator left {found} at {face} {point} instead of {expected}")]
    CommutatorMisplaced {
        face: FaceName,
        point: Point,
        expected: Color,
        found: Color,
    },
    #[error("a commutator sent a sticker to the wrong place on {face}")]
    StickerLost { face: FaceName },
    #[error("no center commutator makes progress on {face} row {row}")]
    CentersStuck { face: FaceName, row: usize },
    #[error("center solving disturbed the already solved face {0}")]
    CentersDisturbed(FaceName),
    #[error("wing {wing} of the working edge could not be paired")]
    WingUnpaired { wing: usize },
    #[error("edge pairing stopped making progress with {0} edges left")]
    EdgesStuck(usize),
    #[error("the cube is not reduced after reduction")]
    NotReduced,
    #[error("{0} was reported twice in one solve")]
    RepeatedParity(ParityKind),
    #[error("the 3×3 solver gave up after {0} attempts")]
    AttemptsExhausted(usize),
    #[error("the 3×3 solver finished but the cube is not solved")]
    SolverDisagrees,
    #[error("the 3×3 commutator search did not converge while {0}")]
    NoConvergence(&'static str),
    #[error("the built-in {table} could not be built: {reason}")]
    TableUnbuilt { table: &'static str, reason: String },
}

impl Invariant {
    /// Borrows a table built on first use. A table that failed to build is
    /// reported rather than rebuilt.
    pub(crate) fn built<T, E: Display>(
        table: &'static str,
        built: &'static Result<T, E>,
    ) -> Result<&'static T, Invariant> {
        built.as_ref().map_err(|err| Invariant::TableUnbuilt {
            table,
            reason: err.to_string(),
        })
    }
}

#[derive(Error, Debug)]
pub enum SolveError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("Invalid cube: {0}")]
    InvalidCube(#[from] CubeError),
    #[error("Internal invariant violated: {0}")]
    InternalInvariant(#[from] Invariant),
    #[error("Cubes with {0} layers cannot be solved by reduction")]
    UnsupportedSize(usize),
}

/// The parity situations a 3×3 solver can report on a reduced cube.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ParityKind {
    /// A single dedge is flipped (OLL parity).
    EdgeParity,
    /// Two corners, or two dedges, are swapped (PLL parity).
    CornerSwap,
}

impl ParityKind {
    const fn index(self) -> usize {
        self as usize
    }
}

impl Display for ParityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParityKind::EdgeParity => write!(f, "edge parity"),
            ParityKind::CornerSwap => write!(f, "corner swap"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved,
    /// The solver stopped on parity. Edge parity is reported before any move
    /// is played. A corner swap is fixed by the solver before it reports it,
    /// so the next attempt starts from a cube without it.
    ParityDetected(ParityKind),
}

/// How far [`Solver::solve`] goes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum SolveStep {
    /// Stop once the cube is reduced.
    Reduce,
    /// Stop once every 3×3 piece is in its slot, leaving orientation.
    Permute3x3,
    #[default]
    Full,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SolverResults {
    pub was_corner_swap: bool,
    pub was_even_edge_parity: bool,
    pub was_partial_edge_parity: bool,
    pub move_count: usize,
}

impl SolverResults {
    #[must_use]
    pub fn has_parity(&self) -> bool {
        self.was_corner_swap || self.was_even_edge_parity || self.was_partial_edge_parity
    }

    #[must_use]
    pub fn parity_summary(&self) -> String {
        let kinds: Vec<&str> = [
            (self.was_even_edge_parity, "edge parity"),
            (self.was_corner_swap, "corner swap"),
            (self.was_partial_edge_parity, "partial edge parity"),
        ]
        .into_iter()
        .filter_map(|(seen, name)| seen.then_some(name))
        .collect();
        if kinds.is_empty() {
            "no parity".to_owned()
        } else {
            kinds.join(", ")
        }
    }
}

/// Drives a [`Reducer`] and a [`Solver3x3`] to a solved cube.
pub struct Solver<R = NxnReducer, S = CommutatorSolver> {
    reducer: R,
    solver3x3: S,
    reference: CommutatorSolver,
    config: SolverConfig,
}

impl Solver {
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Solver::with_parts(
            config.clone(),
            NxnReducer::new(config),
            CommutatorSolver::new(),
        )
    }
}

impl Default for Solver {
    fn default() -> Self {
        Solver::new(SolverConfig::default())
    }
}

impl<R: Reducer, S: Solver3x3> Solver<R, S> {
    #[must_use]
    pub fn with_parts(config: SolverConfig, reducer: R, solver3x3: S) -> Self {
        Solver {
            reducer,
            solver3x3,
            reference: CommutatorSolver::new(),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves the cube held by `op`.
    ///
    /// `debug` turns on extra invariant checks. `animation` overrides the
    /// operator's animation setting for the duration of the solve.
    ///
    /// # Errors
    ///
    /// Geometry and internal invariant errors are returned as they occur and
    /// leave the cube wherever the failing step stopped. An
    /// [`SolveError::InvalidCube`] means the input cannot be solved.
    pub fn solve(
        &mut self,
        op: &mut Operator,
        debug: bool,
        animation: Option<bool>,
        step: SolveStep,
    ) -> Result<SolverResults, SolveError> {
        let mut results = SolverResults::default();
        if op.cube().is_solved() {
            debug!("Cube is already solved");
            return Ok(results);
        }
        let size = op.cube().size();
        if size < 3 {
            return Err(SolveError::UnsupportedSize(size));
        }

        let mut op = op.with_animation(animation);
        let start_moves = op.move_count();
        info!(start!("Solving a {}x{} cube"), size, size);

        let reduction = self.reducer.reduce(&mut op, debug)?;
        results.was_partial_edge_parity = reduction.partial_edge_parity_detected;
        if step == SolveStep::Reduce {
            results.move_count = op.move_count() - start_moves;
            info!(success!("Reduced in {} moves"), results.move_count);
            return Ok(results);
        }

        if size % 2 == 0 {
            self.fix_detected_parity(&mut op, debug, &mut results)?;
        }

        let stage = match step {
            SolveStep::Permute3x3 => Stage3x3::Permutation,
            _ => Stage3x3::Full,
        };
        let max_attempts = self.config.max_solve_attempts;
        let mut seen = [0_usize; 2];
        let mut finished = false;
        for attempt in 1..=max_attempts {
            debug!(working!("3x3 solve attempt {}"), attempt);
            match self.solver3x3.solve_3x3(&mut op, debug, stage)? {
                SolveOutcome::Solved => {
                    finished = true;
                    break;
                }
                SolveOutcome::ParityDetected(kind) => {
                    seen[kind.index()] += 1;
                    if seen[kind.index()] > 1 {
                        return Err(Invariant::RepeatedParity(kind).into());
                    }
                    warn!("{kind} detected during the 3x3 solve");
                    match kind {
                        ParityKind::EdgeParity => {
                            self.fix_parity(&mut op, debug, kind, &mut results)?;
                        }
                        ParityKind::CornerSwap => results.was_corner_swap = true,
                    }
                }
            }
        }
        if !finished {
            return Err(Invariant::AttemptsExhausted(max_attempts).into());
        }
        if stage == Stage3x3::Full && !op.cube().is_solved() {
            return Err(Invariant::SolverDisagrees.into());
        }

        results.move_count = op.move_count() - start_moves;
        info!(
            success!("Solved in {} moves ({})"),
            results.move_count,
            results.parity_summary()
        );
        Ok(results)
    }

    /// Finds and fixes parity before the 3×3 solver starts, so solvers that
    /// cannot recover from parity mid-solve never see it. Here a corner swap
    /// is fixed by the reducer, since no solver has touched it yet.
    fn fix_detected_parity(
        &mut self,
        op: &mut Operator,
        debug: bool,
        results: &mut SolverResults,
    ) -> Result<(), SolveError> {
        for kind in [ParityKind::EdgeParity, ParityKind::CornerSwap] {
            if self.detect(op, kind)? {
                info!("Found {} before the 3x3 solve", kind);
                self.fix_parity(op, debug, kind, results)?;
            }
        }
        Ok(())
    }

    fn fix_parity(
        &mut self,
        op: &mut Operator,
        debug: bool,
        kind: ParityKind,
        results: &mut SolverResults,
    ) -> Result<(), SolveError> {
        match kind {
            ParityKind::EdgeParity => {
                results.was_even_edge_parity = true;
                self.reducer.fix_edge_parity(op)?;
                // The fix turns inner layers, so reduce again before solving.
                let reduction = self.reducer.reduce(op, debug)?;
                results.was_partial_edge_parity |= reduction.partial_edge_parity_detected;
            }
            ParityKind::CornerSwap => {
                results.was_corner_swap = true;
                self.reducer.fix_corner_parity(op)?;
            }
        }
        Ok(())
    }

    /// Asks the 3×3 solver first, and falls back to running the reference
    /// solver in query mode when it cannot tell.
    fn detect(&mut self, op: &mut Operator, kind: ParityKind) -> Result<bool, SolveError> {
        let answer = match kind {
            ParityKind::EdgeParity => self.solver3x3.detect_edge_parity(op.cube()),
            ParityKind::CornerSwap => self.solver3x3.detect_corner_parity(op.cube()),
        };
        if let Some(answer) = answer {
            return Ok(answer);
        }

        debug!("Detecting {kind} with the reference solver");
        let mut query = op.save_history();
        let outcome = self.reference.solve_3x3(&mut query, false, Stage3x3::Full)?;
        Ok(outcome == SolveOutcome::ParityDetected(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parity_summary_lists_seen_kinds() {
        let mut results = SolverResults::default();
        assert!(!results.has_parity());
        assert_eq!(results.parity_summary(), "no parity");
        results.was_even_edge_parity = true;
        results.was_partial_edge_parity = true;
        assert!(results.has_parity());
        assert_eq!(
            results.parity_summary(),
            "edge parity, partial edge parity"
        );
    }
}
