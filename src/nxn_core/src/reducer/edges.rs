use std::sync::LazyLock;

use fxhash::FxHashMap;
use log::{debug, info};

use crate::{
    alg::{Alg, AlgParseError, Move},
    config::ParityAlgorithm,
    cube::Cube,
    geometry::{Color, EdgeSlot, FaceName, SliceName},
    operator::Operator,
    reducer::parity,
    solver::{Invariant, SolveError},
    start, success, working,
};

type EdgeTable = Result<FxHashMap<EdgeSlot, Alg>, AlgParseError>;

/// Keyed like [`EdgeSlot::ALL`]: FU FD FL FR BU BD BL BR UL UR DL DR.
fn table(algs: [Option<&str>; 12]) -> EdgeTable {
    EdgeSlot::ALL
        .into_iter()
        .zip(algs)
        .filter_map(|(edge, alg)| Some(alg?.parse().map(|alg| (edge, alg))))
        .collect()
}

/// Outer turns bringing an edge to FR without touching FL.
static SETUP_TO_FR: LazyLock<EdgeTable> = LazyLock::new(|| {
    table([
        Some("U' R'"),
        Some("D R"),
        None,
        Some(""),
        Some("U R'"),
        Some("D' R"),
        Some("B2 R2"),
        Some("R2"),
        Some("U2 R'"),
        Some("R'"),
        Some("D2 R"),
        Some("R"),
    ])
});

static ROT_TO_FL: LazyLock<EdgeTable> = LazyLock::new(|| {
    table([
        Some("z'"),
        Some("z"),
        Some(""),
        Some("y"),
        Some("x' z'"),
        Some("x z"),
        Some("x2"),
        Some("y2"),
        Some("x'"),
        Some("x y2"),
        Some("x"),
        Some("x y"),
    ])
});

static ROT_TO_UF: LazyLock<EdgeTable> = LazyLock::new(|| {
    table([
        Some(""),
        Some("x"),
        Some("z"),
        Some("z'"),
        Some("x'"),
        Some("x2"),
        Some("x' y'"),
        Some("x' y"),
        Some("y'"),
        Some("y"),
        Some("x z"),
        Some("x z'"),
    ])
});

/// Flips the FR edge in place, disturbing only the U and F layers' outer
/// pieces.
static FLIP: LazyLock<Result<Alg, AlgParseError>> =
    LazyLock::new(|| "R U R' F R' F' R".parse());

fn flip() -> Result<&'static Alg, SolveError> {
    Ok(Invariant::built("wing flip", &FLIP)?)
}

fn is_pair(wing: (Color, Color), (c1, c2): (Color, Color)) -> bool {
    wing == (c1, c2) || wing == (c2, c1)
}

/// Whether inserting wing `i` from FR pairs it with FL, possibly after a flip.
fn fits(cube: &Cube, i: usize, j: usize, (c1, c2): (Color, Color)) -> bool {
    cube.wing(EdgeSlot::FR, j) == (c1, c2) || cube.wing(EdgeSlot::FR, i) == (c2, c1)
}

/// Pairs edges by holding the working edge at FL and swapping wings in from
/// FR with inner `E` slice turns.
pub struct EdgeSolver {
    parity_algorithm: ParityAlgorithm,
}

impl EdgeSolver {
    #[must_use]
    pub fn new(parity_algorithm: ParityAlgorithm) -> Self {
        EdgeSolver { parity_algorithm }
    }

    /// Pairs every edge of a cube with uniform centers. Returns whether the
    /// last edge needed single orbit flips.
    ///
    /// # Errors
    ///
    /// Fails if an edge cannot be paired, which means the pairing strategy is
    /// wrong.
    pub fn solve(&self, op: &mut Operator, debug: bool) -> Result<bool, SolveError> {
        let n = op.cube().size();
        let m = n - 2;
        let reference = if n % 2 == 1 { m / 2 } else { 0 };
        let initial = op.cube().unpaired_edges().len();
        if initial == 0 {
            return Ok(false);
        }
        info!(start!("Pairing {} edges"), initial);

        for _ in 0..EdgeSlot::ALL.len() {
            let unpaired = op.cube().unpaired_edges();
            if unpaired.len() <= 1 {
                break;
            }
            play(op, lookup(&ROT_TO_FL, unpaired[0])?)?;
            self.pair_working_edge(op, m, reference)?;

            let left = op.cube().unpaired_edges().len();
            if left >= unpaired.len() {
                return Err(Invariant::EdgesStuck(left).into());
            }
            debug!(working!("{} edges left to pair"), left);
        }

        let left = op.cube().unpaired_edges();
        let partial = match left[..] {
            [] => false,
            [last] => self.fix_last_edge(op, last, m, reference)?,
            _ => return Err(Invariant::EdgesStuck(left.len()).into()),
        };
        if debug && !op.cube().unpaired_edges().is_empty() {
            return Err(Invariant::EdgesStuck(op.cube().unpaired_edges().len()).into());
        }
        info!(success!("Paired every edge"));
        Ok(partial)
    }

    fn pair_working_edge(
        &self,
        op: &mut Operator,
        m: usize,
        reference: usize,
    ) -> Result<(), SolveError> {
        let target = op.cube().wing(EdgeSlot::FL, reference);
        let (c1, c2) = target;
        for i in 0..m {
            if op.cube().wing(EdgeSlot::FL, i) == target {
                continue;
            }
            let j = m - 1 - i;
            for _ in 0..8 {
                let cube = op.cube();
                if fits(cube, i, j, target) {
                    if cube.wing(EdgeSlot::FR, j) != target {
                        play(op, flip()?)?;
                    }
                    swap_wings(op, i)?;
                    break;
                }

                // FL holds the wing at the mirrored level: send it out first.
                if cube.wing(EdgeSlot::FL, j) == (c2, c1) {
                    if cube.is_edge_paired(EdgeSlot::FR) {
                        let other = EdgeSlot::ALL
                            .into_iter()
                            .find(|&edge| {
                                edge != EdgeSlot::FL
                                    && edge != EdgeSlot::FR
                                    && !cube.is_edge_paired(edge)
                            })
                            .ok_or(Invariant::WingUnpaired { wing: i })?;
                        play(op, lookup(&SETUP_TO_FR, other)?)?;
                    }
                    swap_wings(op, j)?;
                    continue;
                }

                let mut candidates = EdgeSlot::ALL
                    .into_iter()
                    .filter(|&edge| {
                        edge != EdgeSlot::FL
                            && edge != EdgeSlot::FR
                            && [i, j].iter().any(|&level| is_pair(cube.wing(edge, level), target))
                    })
                    .collect::<Vec<_>>();
                if candidates.len() > 1 {
                    candidates.retain(|&edge| edge != EdgeSlot::UR);
                }
                if let Some(&candidate) = candidates.first() {
                    play(op, lookup(&SETUP_TO_FR, candidate)?)?;
                    if !fits(op.cube(), i, j, target) {
                        // Wrong way round: park it on UR and bring the
                        // other one.
                        play(op, &Alg::new(Move::face(FaceName::R, 1).into_iter().collect()))?;
                    }
                    continue;
                }

                swap_wings(op, j)?;
            }
            if op.cube().wing(EdgeSlot::FL, i) != target {
                return Err(Invariant::WingUnpaired { wing: i }.into());
            }
        }
        Ok(())
    }

    /// With eleven edges paired, the last one can only have whole wing orbits
    /// flipped. Flips them back one at a time.
    fn fix_last_edge(
        &self,
        op: &mut Operator,
        last: EdgeSlot,
        m: usize,
        reference: usize,
    ) -> Result<bool, SolveError> {
        play(op, lookup(&ROT_TO_UF, last)?)?;
        let n = op.cube().size();
        let target = op.cube().wing(EdgeSlot::FU, reference);
        let mut partial = false;
        for i in 0..m / 2 {
            if op.cube().wing(EdgeSlot::FU, i) == target {
                continue;
            }
            debug!("Flipping wing orbit {} of the last edge", i);
            partial = true;
            let alg = parity::edge_flip(self.parity_algorithm, n, &[i + 2])?;
            play(op, &alg)?;
        }
        if !op.cube().is_edge_paired(EdgeSlot::FU) {
            return Err(Invariant::WingUnpaired { wing: reference }.into());
        }
        Ok(partial)
    }
}

fn lookup(table: &'static EdgeTable, edge: EdgeSlot) -> Result<&'static Alg, SolveError> {
    Invariant::built("edge setup table", table)?
        .get(&edge)
        .ok_or_else(|| Invariant::NoConvergence("looking up an edge setup").into())
}

fn play(op: &mut Operator, alg: &Alg) -> Result<(), SolveError> {
    op.play(alg, false, None)?;
    Ok(())
}

/// `E[level] FLIP E[level]'`: trades wing `level` of FL with the FR wing on
/// the mirrored level.
fn swap_wings(op: &mut Operator, level: usize) -> Result<(), SolveError> {
    let slice = |q| Move::slice(SliceName::E, vec![level], q);
    let mut alg = Alg::default();
    alg.push_opt(slice(1));
    alg.extend(flip()?);
    alg.push_opt(slice(-1));
    play(op, &alg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::SolverConfig, reducer::CenterSolver};

    #[test]
    fn setups_reach_fr() {
        for (&edge, alg) in SETUP_TO_FR.as_ref().unwrap() {
            let mut cube = Cube::new(3).unwrap();
            let before = cube.wing(edge, 0);
            cube.apply_alg(alg).unwrap();
            let after = cube.wing(EdgeSlot::FR, 0);
            assert!(is_pair(after, before), "{edge}");
        }
    }

    #[test]
    fn rotations_reach_their_slots() {
        for (table, slot) in [(&*ROT_TO_FL, EdgeSlot::FL), (&*ROT_TO_UF, EdgeSlot::FU)] {
            for (&edge, alg) in table.as_ref().unwrap() {
                let mut cube = Cube::new(3).unwrap();
                let before = cube.wing(edge, 0);
                cube.apply_alg(alg).unwrap();
                assert!(is_pair(cube.wing(slot, 0), before), "{edge} -> {slot}");
            }
        }
    }

    #[test]
    fn pairs_edges_once_centers_are_solved() {
        for (size, seed) in [(4, 1), (5, 2), (6, 3)] {
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut cube = Cube::new(size).unwrap();
            cube.apply_alg(&crate::scramble::random_scramble(size, 40, &mut rng))
                .unwrap();
            let mut op = Operator::new(cube);
            CenterSolver::new(&SolverConfig::default())
                .solve(&mut op, true)
                .unwrap();
            EdgeSolver::new(ParityAlgorithm::Standard)
                .solve(&mut op, true)
                .unwrap();
            assert!(op.cube().is_reduced(), "{size}");
        }
    }
}
