//! Center reduction with slice commutators.
//!
//! Faces are solved one at a time, row by row. Each commutator
//! `[S(I), T S(I2) T']` moves a run of target-coloured cells from a source
//! face into a row of the target face, where `S` turns the slices through the
//! run and `T` is a quarter turn of the target face chosen so the rotated run
//! lies on slices disjoint from `I`. Faces solved earlier are never used as
//! sources and never disturbed.

use std::sync::LazyLock;

use itertools::Itertools;
use log::{debug, info, trace};

use crate::{
    alg::{Alg, Move},
    block::Block,
    config::SolverConfig,
    cube::{Cube, CubeError, Marker},
    geometry::{Axis, Color, EdgePosition, FaceName, GeometryError, Point, SliceName},
    operator::Operator,
    solver::{Invariant, SolveError},
    start, success, working,
    walking::iterate_orthogonal_face_center_pieces,
};

const FACE_ORDER: [FaceName; 6] = [
    FaceName::U,
    FaceName::D,
    FaceName::F,
    FaceName::B,
    FaceName::L,
    FaceName::R,
];

/// The 24 orientations of the standard colour scheme, as center colours
/// indexed by face. Each of the six faces is brought up, then spun.
static SCHEMES: LazyLock<Result<Vec<[Color; 6]>, CubeError>> = LazyLock::new(|| {
    [(Axis::X, 0), (Axis::X, 1), (Axis::X, 2), (Axis::X, 3), (Axis::Z, 1), (Axis::Z, 3)]
        .into_iter()
        .cartesian_product(0..4)
        .map(|((axis, turns), spins)| {
            let mut cube = Cube::new(3)?;
            cube.rotate(axis, turns);
            cube.rotate(Axis::Y, spins);
            Ok(FaceName::ALL.map(|face| cube.center(face, Point::new(0, 0))))
        })
        .collect()
});

/// The colour each face's centers must end up with. Odd cubes read it off
/// the fixed middle centers; even cubes take the orientation of the standard
/// scheme that already matches the most center cells.
///
/// # Errors
///
/// Fails only if the scheme table could not be built.
pub fn target_colors(cube: &Cube) -> Result<[Color; 6], Invariant> {
    let n = cube.n_center();
    if n % 2 == 1 {
        let middle = Point::new(n / 2, n / 2);
        return Ok(FaceName::ALL.map(|face| cube.center(face, middle)));
    }
    let schemes = Invariant::built("colour scheme table", &SCHEMES)?;
    let mut best = FaceName::ALL.map(Color::of_face);
    let mut best_score = None;
    for scheme in schemes {
        let score = FaceName::ALL
            .into_iter()
            .cartesian_product((0..n).cartesian_product(0..n))
            .filter(|&(face, (row, col))| {
                cube.center(face, Point::new(row, col)) == scheme[face.index()]
            })
            .count();
        if best_score.is_none_or(|best| score > best) {
            best = *scheme;
            best_score = Some(score);
        }
    }
    Ok(best)
}

/// A commutator moving `source_block` on `source` onto `block` on `target`.
/// `sources[i]` is the cell whose sticker lands on `cells[i]`.
struct Plan {
    target: FaceName,
    source: FaceName,
    setup: i64,
    block: Block,
    source_block: Block,
    cells: Vec<Point>,
    sources: Vec<Point>,
    slice: SliceName,
    indices: Vec<usize>,
    rotated_indices: Vec<usize>,
    slice_turns: i64,
    face_turns: i64,
}

impl Plan {
    fn alg(&self, preserve_cage: bool) -> Alg {
        let slice = |indices: &[usize], q| {
            Alg::new(Move::slice(self.slice, indices.to_vec(), q).into_iter().collect())
        };
        let face = |face, q| Alg::new(Move::face(face, q).into_iter().collect());

        let setup = face(self.source, self.setup);
        let mut alg = setup.clone();
        alg.extend(&Alg::commutator(
            &slice(&self.indices, self.slice_turns),
            &Alg::conjugate(
                &face(self.target, self.face_turns),
                &slice(&self.rotated_indices, self.slice_turns),
            ),
        ));
        if preserve_cage {
            alg.extend(&setup.inverse());
        }
        alg
    }
}

pub struct CenterSolver {
    preserve_cage: bool,
    verify_commutators: bool,
}

impl CenterSolver {
    #[must_use]
    pub fn new(config: &SolverConfig) -> Self {
        CenterSolver {
            preserve_cage: config.preserve_cage,
            verify_commutators: config.verify_commutators,
        }
    }

    /// Makes every face's centers uniform.
    ///
    /// # Errors
    ///
    /// Fails if a row cannot be completed or a commutator does not do what it
    /// was planned to do.
    pub fn solve(&self, op: &mut Operator, debug: bool) -> Result<(), SolveError> {
        let m = op.cube().n_center();
        if m == 0 {
            return Ok(());
        }
        let colors = target_colors(op.cube())?;
        let verify = debug || self.verify_commutators;
        info!(start!("Solving centers"));
        let start_moves = op.move_count();

        let mut solved = Vec::new();
        for target in FACE_ORDER {
            let color = colors[target.index()];
            for row in 0..m {
                loop {
                    let missing = iterate_orthogonal_face_center_pieces(
                        target,
                        target.neighbor(EdgePosition::Bottom),
                        row,
                        m,
                    )?
                    .filter(|&p| op.cube().center(target, p) != color)
                    .map(|p| p.col)
                    .collect_vec();
                    if missing.is_empty() {
                        break;
                    }
                    if !self.place_run(op, target, color, row, &missing, &solved, verify)? {
                        return Err(Invariant::CentersStuck { face: target, row }.into());
                    }
                }
            }
            solved.push(target);

            if debug {
                let disturbed = solved.iter().find(|&&face| {
                    let n = op.cube().n_center();
                    (0..n)
                        .cartesian_product(0..n)
                        .any(|(r, c)| op.cube().center(face, Point::new(r, c)) != colors[face.index()])
                });
                if let Some(&face) = disturbed {
                    return Err(Invariant::CentersDisturbed(face).into());
                }
            }
            debug!(working!("Centers of {} done"), target);
        }

        info!(
            success!("Solved centers in {} moves"),
            op.move_count() - start_moves
        );
        Ok(())
    }

    /// Moves the longest run it can find into `row` of `target`. Returns
    /// `false` if no source face offers one.
    #[allow(clippy::too_many_arguments)]
    fn place_run(
        &self,
        op: &mut Operator,
        target: FaceName,
        color: Color,
        row: usize,
        missing: &[usize],
        solved: &[FaceName],
        verify: bool,
    ) -> Result<bool, SolveError> {
        let m = op.cube().n_center();
        for source in FaceName::ALL {
            if source == target || solved.contains(&source) {
                continue;
            }
            for setup in 0..4 {
                for &c0 in missing {
                    let Some(mut best) = plan(op.cube(), target, source, setup, color, row, c0, c0)?
                    else {
                        continue;
                    };
                    for c1 in c0 + 1..m {
                        match plan(op.cube(), target, source, setup, color, row, c0, c1)? {
                            Some(longer) => best = longer,
                            None => break,
                        }
                    }
                    self.execute(op, &best, color, verify)?;
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn execute(
        &self,
        op: &mut Operator,
        plan: &Plan,
        color: Color,
        verify: bool,
    ) -> Result<(), SolveError> {
        trace!(
            "Moving {} on {} into {} on {}",
            plan.source_block, plan.source, plan.block, plan.target
        );
        if op.animation() {
            op.annotation()
                .annotate(plan.target, &plan.cells, "center commutator");
        }
        if verify {
            for (k, source) in plan.sources.iter().enumerate() {
                let marker = Marker(u32::try_from(k).unwrap_or(u32::MAX));
                op.cube_mut()
                    .mark(plan.source, Point::new(source.row + 1, source.col + 1), marker);
            }
        }

        op.play(&plan.alg(self.preserve_cage), false, None)?;

        if verify {
            for (k, cell) in plan.cells.iter().enumerate() {
                let marker = Marker(u32::try_from(k).unwrap_or(u32::MAX));
                let landed = op.cube().find_marker(marker);
                if landed != Some((plan.target, Point::new(cell.row + 1, cell.col + 1))) {
                    op.cube_mut().clear_markers();
                    return Err(Invariant::StickerLost { face: plan.target }.into());
                }
            }
            op.cube_mut().clear_markers();
        }
        for &cell in &plan.cells {
            let found = op.cube().center(plan.target, cell);
            if found != color {
                return Err(Invariant::CommutatorMisplaced {
                    face: plan.target,
                    point: cell,
                    expected: color,
                    found,
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Plans a commutator for the cells `c0..=c1` of `row` on `target`, taking
/// them from `source` after turning it `setup` quarter turns. `None` if a
/// target cell is already solved, a source cell has the wrong colour, or
/// neither quarter turn of `target` separates the slices.
#[allow(clippy::too_many_arguments)]
fn plan(
    cube: &Cube,
    target: FaceName,
    source: FaceName,
    setup: i64,
    color: Color,
    row: usize,
    c0: usize,
    c1: usize,
) -> Result<Option<Plan>, GeometryError> {
    let m = cube.n_center();
    let block = Block::new(Point::new(row, c0), Point::new(row, c1));
    let cells = block.points(m);
    if cells.iter().any(|&p| cube.center(target, p) == color) {
        return Ok(None);
    }

    // The slices carry the target frame onto the source frame, and the setup
    // turn is undone on top of that.
    let slice = SliceName::between(target, source)?;
    let walking = cube.walking_info(slice)?;
    let transform = walking.get_transform(target, source)?;
    let undo_setup = usize::try_from((4 - setup).rem_euclid(4)).unwrap_or(0);
    let source_block = block.rotate_preserve_original(m, transform.n_rotations + undo_setup);
    let sources = source_block.points_by(m, block)?;
    if sources.iter().any(|&s| cube.center(source, s) != color) {
        return Ok(None);
    }

    let slice_indices = |points: &mut dyn Iterator<Item = Point>| {
        points
            .map(|p| walking.to_slice(target, p).map(|(index, _)| index))
            .collect::<Result<Vec<_>, _>>()
            .map(|indices| indices.into_iter().sorted().dedup().collect_vec())
    };
    let indices = slice_indices(&mut cells.iter().copied())?;
    let slice_turns = i64::try_from(walking.quarter_turns_between(source, target)?).unwrap_or(0);
    for (face_turns, rotate) in [
        (1, Point::rotate_cw as fn(Point, usize) -> Point),
        (-1, Point::rotate_ccw),
    ] {
        let rotated_indices = slice_indices(&mut cells.iter().map(|&p| rotate(p, m)))?;
        if rotated_indices.iter().all(|i| !indices.contains(i)) {
            return Ok(Some(Plan {
                target,
                source,
                setup,
                block,
                source_block,
                cells,
                sources,
                slice,
                indices,
                rotated_indices,
                slice_turns,
                face_turns,
            }));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemes_are_distinct() {
        let schemes = SCHEMES.as_ref().unwrap();
        assert_eq!(schemes.len(), 24);
        assert!(schemes.iter().all_unique());
        assert_eq!(schemes[0], FaceName::ALL.map(Color::of_face));
    }

    #[test]
    fn even_targets_follow_rotations() {
        let mut cube = Cube::new(4).unwrap();
        cube.rotate(Axis::X, 1);
        let colors = target_colors(&cube).unwrap();
        for face in FaceName::ALL {
            assert_eq!(colors[face.index()], cube.center(face, Point::new(0, 0)));
        }
    }

    #[test]
    fn solves_centers_of_scrambled_cubes() {
        for (size, seed, preserve_cage) in [(4, 3, false), (5, 4, true), (7, 5, false)] {
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut cube = Cube::new(size).unwrap();
            cube.apply_alg(&crate::scramble::random_scramble(size, 50, &mut rng))
                .unwrap();
            let mut op = Operator::new(cube);
            let config = SolverConfig {
                preserve_cage,
                verify_commutators: true,
                ..SolverConfig::default()
            };
            CenterSolver::new(&config).solve(&mut op, true).unwrap();
            assert!(
                FaceName::ALL
                    .into_iter()
                    .all(|face| op.cube().is_center_uniform(face)),
                "{size}"
            );
        }
    }

    #[test]
    fn planned_commutators_fill_their_cells() {
        let mut cube = Cube::new(5).unwrap();
        cube.apply_alg(&"Rw U r' F2 3Bw d".parse().unwrap()).unwrap();
        let color = Color::of_face(FaceName::U);
        let mut planned = 0;
        for source in [FaceName::F, FaceName::B, FaceName::L, FaceName::R, FaceName::D] {
            for setup in 0..4 {
                for c in 0..3 {
                    let Some(plan) = plan(&cube, FaceName::U, source, setup, color, 1, c, c).unwrap()
                    else {
                        continue;
                    };
                    planned += 1;
                    let mut after = cube.clone();
                    after.apply_alg(&plan.alg(false)).unwrap();
                    for &cell in &plan.cells {
                        assert_eq!(after.center(FaceName::U, cell), color, "{source} {setup}");
                    }
                }
            }
        }
        assert!(planned > 0);
    }
}
