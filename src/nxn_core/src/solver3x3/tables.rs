//! 54-sticker model of the 3×3 and the commutator lookup tables built on it.
//!
//! Stickers are indexed as on a size 3 [`Cube`]. A permutation `p` maps each
//! position to the position its sticker came from: applying `p` to `state`
//! gives `state[p[i]]` at `i`.

use std::sync::LazyLock;

use fxhash::FxHashMap;
use itertools::Itertools;
use log::debug;

use crate::{
    alg::{Alg, Move},
    cube::{Cube, CubeError, sticker_location},
    geometry::{FaceName, Point},
    solver::{Invariant, SolveError},
    solver3x3::{Stage3x3, Status3x3},
};

pub(crate) const STICKERS: usize = 54;
const CORNERS: usize = 8;
const SETUP_DEPTH: usize = 4;

pub(crate) type Perm = [u8; STICKERS];
pub(crate) type State = [FaceName; STICKERS];

#[allow(clippy::cast_possible_truncation)]
const IDENTITY: Perm = {
    let mut p = [0; STICKERS];
    let mut i = 0;
    while i < STICKERS {
        p[i] = i as u8;
        i += 1;
    }
    p
};

const EDGE_CYCLE: &str = "R2 U R U R' U' R' U' R' U R'";
const CORNER_CYCLE: &str = "R' F R' B2 R F' R' B2 R2";
const EDGE_FLIP: &str = "R U R' F R' F' R E R' F R F' R U' R' E'";
const CORNER_TWIST: &str = "R' D' R D R' D' R D U D' R' D R D' R' D R U'";

fn compose(p: &Perm, q: &Perm) -> Perm {
    q.map(|i| p[usize::from(i)])
}

fn invert(p: &Perm) -> Perm {
    let mut out = IDENTITY;
    for (i, &src) in p.iter().enumerate() {
        out[usize::from(src)] = IDENTITY[i];
    }
    out
}

fn apply(state: &State, p: &Perm) -> State {
    p.map(|i| state[usize::from(i)])
}

fn perm_of(alg: &Alg) -> Result<Perm, CubeError> {
    let mut cube = Cube::new(3)?;
    cube.apply_alg(alg)?;
    let mut out = IDENTITY;
    for (slot, id) in out.iter_mut().zip(cube.sticker_ids()) {
        *slot = u8::try_from(id.0).unwrap_or(u8::MAX);
    }
    Ok(out)
}

/// The face a sticker position belongs to.
fn face_of(sticker: usize) -> FaceName {
    FaceName::ALL[sticker / 9]
}

fn rank(face: FaceName) -> usize {
    match face {
        FaceName::U | FaceName::D => 0,
        FaceName::F | FaceName::B => 1,
        FaceName::L | FaceName::R => 2,
    }
}

fn mask<'a>(faces: impl IntoIterator<Item = &'a FaceName>) -> u8 {
    faces.into_iter().fold(0, |acc, face| acc | (1 << face.index()))
}

/// Corner and edge slots of the 3×3. Corners come first, their stickers in
/// clockwise order starting from the U or D sticker; edges start from the U
/// or D sticker, else the F or B one.
pub(crate) struct Slots {
    stickers: Vec<Vec<u8>>,
    slot_of: [Option<usize>; STICKERS],
    by_faces: FxHashMap<u8, usize>,
}

impl Slots {
    fn new() -> Self {
        let mut groups: FxHashMap<[i64; 3], Vec<u8>> = FxHashMap::default();
        let mut corner_keys = Vec::new();
        let mut edge_keys = Vec::new();
        for (index, (face, row, col)) in FaceName::ALL
            .into_iter()
            .cartesian_product(0..3)
            .cartesian_product(0..3)
            .map(|((face, row), col)| (face, row, col))
            .enumerate()
        {
            let (position, _) = sticker_location(3, face, Point::new(row, col));
            let group = groups.entry(position).or_default();
            group.push(u8::try_from(index).unwrap_or(u8::MAX));
            match group.len() {
                2 => edge_keys.push(position),
                3 => {
                    edge_keys.retain(|key| *key != position);
                    corner_keys.push(position);
                }
                _ => {}
            }
        }

        let mut stickers = Vec::new();
        for key in corner_keys {
            let [a, b, c] = groups[&key][..] else {
                continue;
            };
            let normal = |s: u8| {
                let s = usize::from(s);
                sticker_location(3, face_of(s), Point::new((s % 9) / 3, s % 3)).1
            };
            let [na, nb] = [normal(a), normal(b)];
            let cross = [
                na[1] * nb[2] - na[2] * nb[1],
                na[2] * nb[0] - na[0] * nb[2],
                na[0] * nb[1] - na[1] * nb[0],
            ];
            let dot: i64 = cross.iter().zip(key).map(|(x, y)| x * y).sum();
            let clockwise = if dot > 0 { [a, b, c] } else { [a, c, b] };
            stickers.push(primary_first(&clockwise));
        }
        for key in edge_keys {
            stickers.push(primary_first(&groups[&key]));
        }

        let mut slot_of = [None; STICKERS];
        let mut by_faces = FxHashMap::default();
        for (slot, members) in stickers.iter().enumerate() {
            for &s in members {
                slot_of[usize::from(s)] = Some(slot);
            }
            by_faces.insert(
                mask(&members.iter().map(|&s| face_of(usize::from(s))).collect_vec()),
                slot,
            );
        }
        Slots {
            stickers,
            slot_of,
            by_faces,
        }
    }

    fn corners(&self) -> std::ops::Range<usize> {
        0..CORNERS
    }

    fn edges(&self) -> std::ops::Range<usize> {
        CORNERS..self.stickers.len()
    }

    fn slot_of(&self, sticker: u8) -> usize {
        self.slot_of[usize::from(sticker)].unwrap_or(usize::MAX)
    }

    fn faces_in(&self, slot: usize, state: &State) -> u8 {
        mask(self.stickers[slot].iter().map(|&s| &state[usize::from(s)]))
    }

    fn home_faces(&self, slot: usize) -> u8 {
        mask(&self.stickers[slot].iter().map(|&s| face_of(usize::from(s))).collect_vec())
    }

    fn placed(&self, slot: usize, state: &State) -> bool {
        self.faces_in(slot, state) == self.home_faces(slot)
    }

    fn solved(&self, slot: usize, state: &State) -> bool {
        self.stickers[slot]
            .iter()
            .all(|&s| state[usize::from(s)] == face_of(usize::from(s)))
    }

    /// The position the sticker at `sticker` belongs in.
    fn home_sticker(&self, sticker: u8, state: &State) -> Option<u8> {
        let slot = self.slot_of(sticker);
        let home = *self.by_faces.get(&self.faces_in(slot, state))?;
        let face = state[usize::from(sticker)];
        self.stickers[home]
            .iter()
            .copied()
            .find(|&s| face_of(usize::from(s)) == face)
    }
}

fn primary_first(stickers: &[u8]) -> Vec<u8> {
    let start = stickers
        .iter()
        .position_min_by_key(|&&s| rank(face_of(usize::from(s))))
        .unwrap_or(0);
    stickers[start..]
        .iter()
        .chain(&stickers[..start])
        .copied()
        .collect()
}

/// The cube reduced to faces: every sticker replaced by the face whose
/// center shares its colour.
pub(crate) struct Analysis {
    pub state: State,
    pub twist: usize,
    pub flip: usize,
    pub corner_parity: bool,
    pub edge_parity: bool,
}

impl Analysis {
    pub fn status(&self) -> Status3x3 {
        let slots = &*SLOTS;
        let count = |range: std::ops::Range<usize>, f: &dyn Fn(usize) -> bool| {
            range.filter(|&slot| f(slot)).count()
        };
        Status3x3 {
            corners_placed: count(slots.corners(), &|s| slots.placed(s, &self.state)),
            corners_solved: count(slots.corners(), &|s| slots.solved(s, &self.state)),
            edges_placed: count(slots.edges(), &|s| slots.placed(s, &self.state)),
            edges_solved: count(slots.edges(), &|s| slots.solved(s, &self.state)),
            edge_parity: self.flip % 2 == 1,
            corner_swap: self.corner_parity != self.edge_parity,
        }
    }
}

fn permutation_parity(perm: &[usize]) -> bool {
    let mut seen = vec![false; perm.len()];
    let mut parity = false;
    for start in 0..perm.len() {
        let mut i = start;
        let mut len = 0;
        while !seen[i] {
            seen[i] = true;
            i = perm[i];
            len += 1;
        }
        if len > 0 && len % 2 == 0 {
            parity = !parity;
        }
    }
    parity
}

/// Reads the orientation and permutation invariants of a size 3 cube.
///
/// # Errors
///
/// Fails if the stickers do not form the pieces of a 3×3.
pub(crate) fn analyze(cube: &Cube) -> Result<Analysis, CubeError> {
    let centers = FaceName::ALL.map(|face| cube.color(face, Point::new(1, 1)));
    if !centers.iter().all_unique() {
        return Err(CubeError::UnreachablePermutation);
    }
    let mut state = [FaceName::F; STICKERS];
    for (i, color) in cube.colors().iter().enumerate() {
        let face = centers
            .iter()
            .position(|c| c == color)
            .ok_or(CubeError::UnreachablePermutation)?;
        state[i] = FaceName::ALL[face];
    }

    let slots = &*SLOTS;
    let mut homes = Vec::with_capacity(slots.stickers.len());
    let mut orientation = [0, 0];
    for slot in 0..slots.stickers.len() {
        let home = slots
            .by_faces
            .get(&slots.faces_in(slot, &state))
            .copied()
            .filter(|&home| slots.stickers[home].len() == slots.stickers[slot].len())
            .ok_or(CubeError::UnreachablePermutation)?;
        let offset = slots.stickers[slot]
            .iter()
            .position(|&s| rank(state[usize::from(s)]) == 0)
            .or_else(|| {
                slots.stickers[slot]
                    .iter()
                    .position(|&s| rank(state[usize::from(s)]) == 1)
            })
            .ok_or(CubeError::UnreachablePermutation)?;
        orientation[usize::from(slot >= CORNERS)] += offset;
        homes.push(home);
    }
    if !homes.iter().all_unique() {
        return Err(CubeError::UnreachablePermutation);
    }

    let corner_perm = homes[..CORNERS].to_vec();
    let edge_perm = homes[CORNERS..].iter().map(|h| h - CORNERS).collect_vec();
    Ok(Analysis {
        state,
        twist: orientation[0] % 3,
        flip: orientation[1] % 2,
        corner_parity: permutation_parity(&corner_perm),
        edge_parity: permutation_parity(&edge_perm),
    })
}

#[derive(Clone, Copy)]
struct SetupNode {
    parent: u32,
    generator: u8,
    last: Option<FaceName>,
}

/// Cycles its base algorithm's stickers along `(from, to)` keys: for each key
/// the setups that send the sticker at `from` to `to`, with the position the
/// third sticker of the cycle comes from.
struct CycleTable {
    base: Alg,
    base_perm: Perm,
    entries: FxHashMap<(u8, u8), Vec<(u32, u8)>>,
}

/// For each ordered pair of slots, a setup making the base algorithm act on
/// exactly those two slots.
struct PairTable {
    base: Alg,
    base_perm: Perm,
    entries: FxHashMap<(usize, usize), u32>,
}

static SLOTS: LazyLock<Slots> = LazyLock::new(Slots::new);

pub(crate) struct Tables {
    generators: Vec<(Move, Perm)>,
    setups: Vec<SetupNode>,
    setup_perms: Vec<Perm>,
    edge_cycles: CycleTable,
    corner_cycles: CycleTable,
    flips: PairTable,
    twists: PairTable,
}

static TABLES: LazyLock<Result<Tables, SolveError>> = LazyLock::new(Tables::generate);

/// The commutator tables, built on first use.
pub(crate) fn tables() -> Result<&'static Tables, Invariant> {
    Invariant::built("3x3 commutator tables", &TABLES)
}

impl Tables {
    fn generate() -> Result<Self, SolveError> {
        let generators = FaceName::ALL
            .into_iter()
            .cartesian_product(1..=3)
            .filter_map(|(face, turns)| Move::face(face, turns))
            .map(|mv| Ok((mv.clone(), perm_of(&Alg::new(vec![mv]))?)))
            .collect::<Result<Vec<_>, CubeError>>()?;

        let mut setups = vec![SetupNode {
            parent: 0,
            generator: 0,
            last: None,
        }];
        let mut setup_perms = vec![IDENTITY];
        let mut frontier = vec![0_usize];
        for _ in 0..SETUP_DEPTH {
            let mut next = Vec::new();
            for &node in &frontier {
                let last = setups[node].last;
                for (generator, (mv, perm)) in generators.iter().enumerate() {
                    let Move::Face { face, .. } = mv else {
                        continue;
                    };
                    if let Some(last) = last
                        && (*face == last || (face.opposite() == last && *face < last))
                    {
                        continue;
                    }
                    next.push(setups.len());
                    setup_perms.push(compose(&setup_perms[node], perm));
                    setups.push(SetupNode {
                        parent: u32::try_from(node).unwrap_or(u32::MAX),
                        generator: u8::try_from(generator).unwrap_or(u8::MAX),
                        last: Some(*face),
                    });
                }
            }
            frontier = next;
        }
        debug!("Generated {} commutator setups", setups.len());

        let mut tables = Tables {
            edge_cycles: CycleTable::new(EDGE_CYCLE.parse().map_err(|_| parse_failure())?)?,
            corner_cycles: CycleTable::new(CORNER_CYCLE.parse().map_err(|_| parse_failure())?)?,
            flips: PairTable::new(EDGE_FLIP.parse().map_err(|_| parse_failure())?)?,
            twists: PairTable::new(CORNER_TWIST.parse().map_err(|_| parse_failure())?)?,
            generators,
            setups,
            setup_perms,
        };
        tables.index();
        Ok(tables)
    }

    fn index(&mut self) {
        let slots = &*SLOTS;
        for table in [&mut self.edge_cycles, &mut self.corner_cycles] {
            let moved = (0..STICKERS)
                .filter(|&i| usize::from(table.base_perm[i]) != i)
                .collect_vec();
            for (setup, ps) in self.setup_perms.iter().enumerate() {
                let setup = u32::try_from(setup).unwrap_or(u32::MAX);
                for &dst in &moved {
                    let src = usize::from(table.base_perm[dst]);
                    let third = usize::from(table.base_perm[src]);
                    table
                        .entries
                        .entry((ps[src], ps[dst]))
                        .or_default()
                        .push((setup, ps[third]));
                }
            }
        }

        for table in [&mut self.flips, &mut self.twists] {
            let moved_slots = (0..STICKERS)
                .filter(|&i| usize::from(table.base_perm[i]) != i)
                .map(|i| slots.slot_of[i].unwrap_or(usize::MAX))
                .unique()
                .collect_vec();
            let [a, b] = moved_slots[..] else {
                continue;
            };
            let (a, b) = (slots.stickers[a][0], slots.stickers[b][0]);
            for (setup, ps) in self.setup_perms.iter().enumerate() {
                let key = (
                    slots.slot_of(ps[usize::from(a)]),
                    slots.slot_of(ps[usize::from(b)]),
                );
                table
                    .entries
                    .entry(key)
                    .or_insert(u32::try_from(setup).unwrap_or(u32::MAX));
            }
        }
    }

    fn setup_alg(&self, setup: u32) -> Alg {
        let mut moves = Vec::new();
        let mut node = setup as usize;
        while node != 0 {
            let SetupNode {
                parent, generator, ..
            } = self.setups[node];
            moves.push(self.generators[usize::from(generator)].0.clone());
            node = parent as usize;
        }
        moves.reverse();
        Alg::new(moves)
    }

    /// The conjugate `setup base setup'` and its permutation.
    fn conjugate(&self, setup: u32, base: &Alg, base_perm: &Perm) -> (Alg, Perm) {
        let ps = &self.setup_perms[setup as usize];
        let perm = compose(&compose(ps, base_perm), &invert(ps));
        (Alg::conjugate(&self.setup_alg(setup), base), perm)
    }

    /// Solves a parity-free 3×3 state with commutators.
    pub fn solve(&self, analysis: &Analysis, stage: Stage3x3) -> Result<Alg, SolveError> {
        let slots = &*SLOTS;
        let mut state = analysis.state;
        let mut out = Alg::default();

        if analysis.corner_parity {
            // Both permutations are odd; a quarter turn makes them even.
            let mv = Alg::new(Move::face(FaceName::U, 1).into_iter().collect());
            state = apply(&state, &perm_of(&mv)?);
            out.extend(&mv);
        }

        for (table, range, what) in [
            (&self.corner_cycles, slots.corners(), "placing corners"),
            (&self.edge_cycles, slots.edges(), "placing edges"),
        ] {
            let mut converged = false;
            for _ in 0..40 {
                let bad = range
                    .clone()
                    .filter(|&slot| !slots.placed(slot, &state))
                    .collect_vec();
                let Some(&first) = bad.first() else {
                    converged = true;
                    break;
                };
                let p = slots.stickers[first][0];
                let q = slots
                    .home_sticker(p, &state)
                    .ok_or(Invariant::NoConvergence(what))?;
                let candidates = table
                    .entries
                    .get(&(p, q))
                    .ok_or(Invariant::NoConvergence(what))?;
                // Prefer a third slot that also needs placing.
                let setup = candidates
                    .iter()
                    .find(|&&(_, r)| {
                        let r = slots.slot_of(r);
                        bad.contains(&r) && r != first && r != slots.slot_of(q)
                    })
                    .or_else(|| candidates.first())
                    .ok_or(Invariant::NoConvergence(what))?
                    .0;
                let (alg, perm) = self.conjugate(setup, &table.base, &table.base_perm);
                state = apply(&state, &perm);
                out.extend(&alg);
                if !slots.placed(slots.slot_of(q), &state) {
                    return Err(Invariant::NoConvergence(what).into());
                }
            }
            if !converged {
                return Err(Invariant::NoConvergence(what).into());
            }
        }

        if stage == Stage3x3::Permutation {
            return Ok(out);
        }

        for (table, range, what) in [
            (&self.flips, slots.edges(), "flipping edges"),
            (&self.twists, slots.corners(), "twisting corners"),
        ] {
            let mut converged = false;
            for _ in 0..20 {
                let bad = range
                    .clone()
                    .filter(|&slot| !slots.solved(slot, &state))
                    .collect_vec();
                let [x, y, ..] = bad[..] else {
                    converged = bad.is_empty();
                    break;
                };
                let mut fixed = false;
                for key in [(x, y), (y, x)] {
                    let Some(&setup) = table.entries.get(&key) else {
                        continue;
                    };
                    let (alg, perm) = self.conjugate(setup, &table.base, &table.base_perm);
                    let next = apply(&state, &perm);
                    if slots.solved(x, &next) {
                        state = next;
                        out.extend(&alg);
                        fixed = true;
                        break;
                    }
                }
                if !fixed {
                    return Err(Invariant::NoConvergence(what).into());
                }
            }
            if !converged {
                return Err(Invariant::NoConvergence(what).into());
            }
        }

        if (0..STICKERS).any(|i| state[i] != face_of(i)) {
            return Err(Invariant::NoConvergence("finishing").into());
        }
        Ok(out)
    }
}

fn parse_failure() -> SolveError {
    Invariant::NoConvergence("parsing the base algorithms").into()
}

impl CycleTable {
    fn new(base: Alg) -> Result<Self, SolveError> {
        Ok(CycleTable {
            base_perm: perm_of(&base)?,
            base,
            entries: FxHashMap::default(),
        })
    }
}

impl PairTable {
    fn new(base: Alg) -> Result<Self, SolveError> {
        Ok(PairTable {
            base_perm: perm_of(&base)?,
            base,
            entries: FxHashMap::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_cover_every_non_center_sticker() {
        let slots = &*SLOTS;
        assert_eq!(slots.corners().len(), 8);
        assert_eq!(slots.edges().len(), 12);
        let covered = slots.slot_of.iter().filter(|s| s.is_some()).count();
        assert_eq!(covered, STICKERS - 6);
    }

    #[test]
    fn base_algorithms_touch_what_they_should() {
        let moved = |alg: &str| {
            let perm = perm_of(&alg.parse().unwrap()).unwrap();
            (0..STICKERS)
                .filter(|&i| usize::from(perm[i]) != i)
                .map(|i| SLOTS.slot_of[i].unwrap())
                .unique()
                .count()
        };
        assert_eq!(moved(EDGE_CYCLE), 3);
        assert_eq!(moved(CORNER_CYCLE), 3);
        assert_eq!(moved(EDGE_FLIP), 2);
        assert_eq!(moved(CORNER_TWIST), 2);
    }

    #[test]
    fn solved_cube_has_no_parity() {
        let analysis = analyze(&Cube::new(3).unwrap()).unwrap();
        assert_eq!(analysis.twist, 0);
        assert_eq!(analysis.flip, 0);
        assert!(!analysis.corner_parity);
        assert!(!analysis.edge_parity);
    }

    #[test]
    fn quarter_turn_is_odd_on_both_orbits() {
        let mut cube = Cube::new(3).unwrap();
        cube.apply_alg(&"U".parse().unwrap()).unwrap();
        let analysis = analyze(&cube).unwrap();
        assert!(analysis.corner_parity);
        assert!(analysis.edge_parity);
        assert_eq!(analysis.twist, 0);
    }

    #[test]
    fn random_states_solve() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..20 {
            let mut cube = Cube::new(3).unwrap();
            let scramble = crate::scramble::random_scramble(3, 30, &mut rng);
            cube.apply_alg(&scramble).unwrap();
            let analysis = analyze(&cube).unwrap();
            let solution = tables().unwrap().solve(&analysis, Stage3x3::Full).unwrap();
            cube.apply_alg(&solution).unwrap();
            assert!(cube.is_solved(), "{scramble}");
        }
    }
}
