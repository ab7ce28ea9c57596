use std::{cell::Cell, rc::Rc};

use log::info;
use nxn_core::{
    Alg, Cube, Operator, ParityAlgorithm, SolveError, SolveStep, Solver, SolverConfig,
    SolverResults,
    cube::CubeError,
    geometry::{FaceName, Point},
    reducer::{NxnReducer, ReductionResults, Reducer, parity},
    solver::{Invariant, ParityKind, SolveOutcome},
    solver3x3::{CommutatorSolver, Solver3x3, Stage3x3, WithoutDetectors},
};

/// Solves with the commutator solver but claims to see no parity up front, so
/// parity only surfaces from inside the 3×3 solve.
struct Blind(CommutatorSolver);

impl Solver3x3 for Blind {
    fn solve_3x3(
        &mut self,
        op: &mut Operator,
        debug: bool,
        stage: Stage3x3,
    ) -> Result<SolveOutcome, SolveError> {
        self.0.solve_3x3(op, debug, stage)
    }

    fn detect_edge_parity(&self, _cube: &Cube) -> Option<bool> {
        Some(false)
    }

    fn detect_corner_parity(&self, _cube: &Cube) -> Option<bool> {
        Some(false)
    }
}

/// Gives the same answer on every attempt without playing a move.
struct Stuck(SolveOutcome);

impl Solver3x3 for Stuck {
    fn solve_3x3(
        &mut self,
        _op: &mut Operator,
        _debug: bool,
        _stage: Stage3x3,
    ) -> Result<SolveOutcome, SolveError> {
        Ok(self.0)
    }

    fn detect_edge_parity(&self, _cube: &Cube) -> Option<bool> {
        Some(false)
    }

    fn detect_corner_parity(&self, _cube: &Cube) -> Option<bool> {
        Some(false)
    }
}

struct CountingReducer {
    inner: NxnReducer,
    reductions: Rc<Cell<usize>>,
}

impl Reducer for CountingReducer {
    fn reduce(&mut self, op: &mut Operator, debug: bool) -> Result<ReductionResults, SolveError> {
        self.reductions.set(self.reductions.get() + 1);
        self.inner.reduce(op, debug)
    }

    fn fix_edge_parity(&mut self, op: &mut Operator) -> Result<(), SolveError> {
        self.inner.fix_edge_parity(op)
    }

    fn fix_corner_parity(&mut self, op: &mut Operator) -> Result<(), SolveError> {
        self.inner.fix_corner_parity(op)
    }
}

/// Solves `cube` with a blind 3×3 solver. Returns the results and how often
/// the cube was reduced.
fn solve_blind(cube: Cube) -> (SolverResults, usize) {
    let reductions = Rc::new(Cell::new(0));
    let reducer = CountingReducer {
        inner: NxnReducer::default(),
        reductions: Rc::clone(&reductions),
    };
    let mut op = Operator::new(cube);
    let mut solver = Solver::with_parts(
        SolverConfig::default(),
        reducer,
        Blind(CommutatorSolver::new()),
    );
    let results = solver
        .solve(&mut op, true, Some(false), SolveStep::Full)
        .unwrap();
    assert!(op.cube().is_solved(), "{}", op.cube());
    (results, reductions.get())
}

fn three_by_three(alg: &str) -> Operator {
    let mut cube = Cube::new(3).unwrap();
    cube.apply_alg(&alg.parse().unwrap()).unwrap();
    Operator::new(cube)
}

fn solve(cube: Cube, config: SolverConfig) -> (Operator, SolverResults) {
    let mut op = Operator::new(cube);
    let results = Solver::new(config)
        .solve(&mut op, true, Some(false), SolveStep::Full)
        .unwrap();
    assert!(op.cube().is_solved(), "{}", op.cube());
    (op, results)
}

#[test_log::test]
fn solved_cube_is_left_alone() {
    for size in 2..=6 {
        let mut op = Operator::new(Cube::new(size).unwrap());
        let results = Solver::default()
            .solve(&mut op, false, None, SolveStep::Full)
            .unwrap();
        assert_eq!(results, SolverResults::default());
        assert_eq!(op.move_count(), 0);
    }
}

#[test_log::test]
fn solves_every_size_from_three_to_seven() {
    for size in 3..=7 {
        for seed in 0..4 {
            let (cube, scramble) = Cube::scrambled(size, seed, 60).unwrap();
            let (op, results) = solve(cube, SolverConfig::default());
            info!(
                "{size}x{size} seed {seed}: {} moves, {} ({scramble})",
                op.move_count(),
                results.parity_summary()
            );
            assert_eq!(results.move_count, op.move_count());
            if size % 2 == 1 {
                assert!(!results.was_even_edge_parity && !results.was_corner_swap);
            }
        }
    }
}

#[test_log::test]
fn injected_edge_parity_is_fixed() {
    let mut cube = Cube::new(4).unwrap();
    cube.apply_alg(&parity::edge_flip(ParityAlgorithm::Standard, 4, &[2]).unwrap())
        .unwrap();
    cube.apply_alg(&"R U F' L2 D B' R2 U'".parse().unwrap())
        .unwrap();
    let (_, results) = solve(cube, SolverConfig::default());
    assert!(results.was_even_edge_parity);
    assert!(!results.was_partial_edge_parity);
}

#[test_log::test]
fn injected_dedge_swap_is_fixed() {
    let mut cube = Cube::new(6).unwrap();
    cube.apply_alg(&parity::dedge_swap().unwrap()).unwrap();
    cube.apply_alg(&"F2 L' D R U2 B".parse().unwrap()).unwrap();
    let (_, results) = solve(cube, SolverConfig::default());
    assert!(results.was_corner_swap);
    assert!(!results.was_even_edge_parity);
}

#[test_log::test]
fn advanced_parity_algorithm_solves_even_cubes() {
    let config = SolverConfig {
        parity_algorithm: ParityAlgorithm::Advanced,
        ..SolverConfig::default()
    };
    for size in [4, 6] {
        for seed in 0..3 {
            let (cube, _) = Cube::scrambled(size, seed + 100, 60).unwrap();
            solve(cube, config.clone());
        }
    }
}

#[test_log::test]
fn query_mode_detection_matches_built_in_detectors() {
    for seed in 0..6 {
        let (cube, _) = Cube::scrambled(4, seed, 60).unwrap();

        let mut op = Operator::new(cube.clone());
        let with = Solver::default()
            .solve(&mut op, false, None, SolveStep::Full)
            .unwrap();

        let config = SolverConfig::default();
        let mut op = Operator::new(cube);
        let without = Solver::with_parts(
            config.clone(),
            NxnReducer::new(config),
            WithoutDetectors(CommutatorSolver::new()),
        )
        .solve(&mut op, false, None, SolveStep::Full)
        .unwrap();

        assert!(op.cube().is_solved());
        assert_eq!(with, without);
    }
}

#[test_log::test]
fn reduce_step_stops_after_reduction() {
    let (cube, _) = Cube::scrambled(5, 3, 60).unwrap();
    let mut op = Operator::new(cube);
    Solver::default()
        .solve(&mut op, false, None, SolveStep::Reduce)
        .unwrap();
    assert!(op.cube().is_reduced());
}

#[test_log::test]
fn permute_step_places_every_piece() {
    let (cube, _) = Cube::scrambled(4, 8, 60).unwrap();
    let mut op = Operator::new(cube);
    Solver::default()
        .solve(&mut op, false, None, SolveStep::Permute3x3)
        .unwrap();
    let status = CommutatorSolver::new().status_3x3(op.cube()).unwrap();
    assert_eq!(status.corners_placed, 8);
    assert_eq!(status.edges_placed, 12);
    assert!(!status.edge_parity && !status.corner_swap);
}

#[test_log::test]
fn two_by_two_is_unsupported() {
    let mut cube = Cube::new(2).unwrap();
    cube.apply_alg(&"R U".parse::<Alg>().unwrap()).unwrap();
    let mut op = Operator::new(cube);
    assert!(matches!(
        Solver::default().solve(&mut op, false, None, SolveStep::Full),
        Err(SolveError::UnsupportedSize(2))
    ));
}

#[test_log::test]
fn twisted_corner_is_an_invalid_cube() {
    let solved = Cube::new(3).unwrap();
    let corner = [
        solved.index(FaceName::F, Point::new(2, 2)),
        solved.index(FaceName::R, Point::new(2, 0)),
        solved.index(FaceName::U, Point::new(0, 2)),
    ];
    let mut colors = solved.colors().to_vec();
    let first = colors[corner[0]];
    colors[corner[0]] = colors[corner[1]];
    colors[corner[1]] = colors[corner[2]];
    colors[corner[2]] = first;

    let mut op = Operator::new(Cube::from_colors(3, colors).unwrap());
    assert!(matches!(
        Solver::default().solve(&mut op, false, None, SolveStep::Full),
        Err(SolveError::InvalidCube(CubeError::TwistedCorners))
    ));
}

#[test_log::test]
fn edge_parity_found_mid_solve_is_fixed_then_reduced_again() {
    let mut cube = Cube::new(4).unwrap();
    cube.apply_alg(&parity::edge_flip(ParityAlgorithm::Standard, 4, &[2]).unwrap())
        .unwrap();
    cube.apply_alg(&"R U F' L2 D B' R2 U'".parse().unwrap())
        .unwrap();
    let (results, reductions) = solve_blind(cube);
    assert!(results.was_even_edge_parity);
    assert_eq!(reductions, 2);
}

#[test_log::test]
fn corner_swap_found_mid_solve_is_left_to_the_3x3_solver() {
    let mut cube = Cube::new(4).unwrap();
    cube.apply_alg(&parity::dedge_swap().unwrap()).unwrap();
    cube.apply_alg(&"F2 L' D R U2 B".parse().unwrap()).unwrap();
    let (results, reductions) = solve_blind(cube);
    assert!(results.was_corner_swap);
    assert!(!results.was_even_edge_parity);
    assert_eq!(reductions, 1);
}

#[test_log::test]
fn parity_reported_twice_is_an_invariant_error() {
    let mut op = three_by_three("R U");
    let result = Solver::with_parts(
        SolverConfig::default(),
        NxnReducer::default(),
        Stuck(SolveOutcome::ParityDetected(ParityKind::CornerSwap)),
    )
    .solve(&mut op, false, None, SolveStep::Full);
    assert!(matches!(
        result,
        Err(SolveError::InternalInvariant(Invariant::RepeatedParity(
            ParityKind::CornerSwap
        )))
    ));
}

#[test_log::test]
fn zero_attempts_are_exhausted_at_once() {
    let config = SolverConfig {
        max_solve_attempts: 0,
        ..SolverConfig::default()
    };
    let mut op = three_by_three("R U");
    assert!(matches!(
        Solver::new(config).solve(&mut op, false, None, SolveStep::Full),
        Err(SolveError::InternalInvariant(Invariant::AttemptsExhausted(0)))
    ));
    assert_eq!(op.move_count(), 0);
}

#[test_log::test]
fn solver_claiming_success_on_an_unsolved_cube_is_caught() {
    let mut op = three_by_three("R U");
    let result = Solver::with_parts(
        SolverConfig::default(),
        NxnReducer::default(),
        Stuck(SolveOutcome::Solved),
    )
    .solve(&mut op, false, None, SolveStep::Full);
    assert!(matches!(
        result,
        Err(SolveError::InternalInvariant(Invariant::SolverDisagrees))
    ));
}
