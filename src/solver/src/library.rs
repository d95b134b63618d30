//! The generated pattern-case table and its conjugation machinery.
//!
//! The 3-layer stage and the pairing fallback both work by applying a
//! *case*: a short commutator whose net effect is a pure 3-cycle of three
//! pieces of one orbit (corners, paired edges, or single wings) leaving the
//! rest of that orbit untouched. Cases are not transcribed from published
//! algorithm sheets; they are synthesized once at startup from geometric
//! commutator candidates and kept only when a replay through the move
//! engine confirms the pure net effect. Applying a case to arbitrary
//! target pieces is a conjugation `S C S'` where the setup `S` is found by
//! a breadth-first search that tracks just the three target pieces, so the
//! search space is tiny and the search always terminates.
//!
//! Orientation bookkeeping is additive: a piece with orientation `o` in
//! its slot ends a move with orientation `o + d` where `d` depends only on
//! the move and the slot. All deltas are measured by replaying on the
//! solved state, which keeps them consistent with the orientation the
//! state views report.

use crate::{SolveError, StageBudget};
use fxhash::{FxHashMap, FxHashSet};
use kilominx_core::moves::{Layer, sequence_inverse};
use kilominx_core::topology::{CORNER_SLOTS, EDGE_SLOTS, WING_SLOTS, topology};
use kilominx_core::{Face, KilominxState, Move};
use log::error;
use std::collections::VecDeque;
use std::sync::LazyLock;

/// Occupancy of the 30 edge slots in a fully paired state: `home[e]` is the
/// home edge of the pair sitting in `e`, `flip[e]` is 1 when the pair sits
/// with its forward wing on the backward side. `None` if any edge is split
/// or shows an impossible pair.
pub(crate) fn edge_occupancy(
    state: &KilominxState,
) -> Option<([u8; EDGE_SLOTS], [u8; EDGE_SLOTS])> {
    let topo = topology();
    let wings = state.wing_view()?;
    let mut home = [0; EDGE_SLOTS];
    let mut flip = [0; EDGE_SLOTS];
    for (slot, edge) in topo.edges().iter().enumerate() {
        let forward_home = wings.perm[edge.wings[0]] as usize;
        let backward_home = wings.perm[edge.wings[1]] as usize;
        let home_edge = topo.edge_of_wing(forward_home);
        if topo.edge_of_wing(backward_home) != home_edge {
            return None;
        }
        home[slot] = home_edge as u8;
        flip[slot] = u8::from(forward_home != topo.edges()[home_edge].wings[0]);
    }
    Some((home, flip))
}

/// One case: a fixed move sequence whose net effect cycles the content of
/// `slots[0] -> slots[1] -> slots[2] -> slots[0]` within one orbit and
/// fixes every other piece of that orbit. `deltas[i]` is the orientation
/// change a piece picks up on the `slots[i] -> slots[i + 1]` leg.
struct CycleCase {
    moves: Vec<Move>,
    slots: [u8; 3],
    deltas: [u8; 3],
}

/// The cases and search tables of one piece orbit. Positions are encoded
/// as `slot * modulus + orientation`, which stays below 64 for all three
/// orbits, so a tracked triple packs into 18 bits.
struct OrbitCases {
    modulus: u8,
    pool: Vec<Move>,
    /// Per pool move, the encoded-position transition table.
    trans: Vec<[u32; 64]>,
    cases: Vec<CycleCase>,
}

const CODE_SPACE: usize = 1 << 18;

fn pack(c0: u32, c1: u32, c2: u32) -> u32 {
    c0 | (c1 << 6) | (c2 << 12)
}

impl OrbitCases {
    /// Find a move sequence cycling the content of `slots[0] -> slots[1]
    /// -> slots[2] -> slots[0]`, giving the three moved pieces the
    /// orientation changes `nets`, and fixing every other piece of this
    /// orbit. `nets` must sum to zero modulo the orbit's orientation count.
    ///
    /// The search runs breadth-first over the positions of just the three
    /// target pieces until they line up with some case's slots (in any
    /// cyclic rotation) with the setup twists that case needs; the answer
    /// is then the setup, the case, and the setup undone.
    fn realize(
        &self,
        slots: [usize; 3],
        nets: [u8; 3],
        budget: &mut StageBudget<'_>,
    ) -> Result<Vec<Move>, SolveError> {
        let m = u32::from(self.modulus);
        debug_assert!((u32::from(nets[0]) + u32::from(nets[1]) + u32::from(nets[2])) % m == 0);
        debug_assert!(slots[0] != slots[1] && slots[1] != slots[2] && slots[0] != slots[2]);

        let mut goals: FxHashMap<u32, usize> = FxHashMap::default();
        for (case_index, case) in self.cases.iter().enumerate() {
            for rot in 0..3 {
                let d0 = u32::from(case.deltas[rot]);
                let d1 = u32::from(case.deltas[(rot + 1) % 3]);
                let s1 = (d0 + m - u32::from(nets[0])) % m;
                let s2 = (s1 + d1 + m - u32::from(nets[1])) % m;
                let code = pack(
                    u32::from(case.slots[rot]) * m,
                    u32::from(case.slots[(rot + 1) % 3]) * m + s1,
                    u32::from(case.slots[(rot + 2) % 3]) * m + s2,
                );
                goals.entry(code).or_insert(case_index);
            }
        }

        let start = pack(
            slots[0] as u32 * m,
            slots[1] as u32 * m,
            slots[2] as u32 * m,
        );
        let finish = |setup: Vec<Move>, case: &CycleCase| {
            let mut out = setup.clone();
            out.extend_from_slice(&case.moves);
            out.extend(sequence_inverse(&setup));
            out
        };
        if let Some(&case_index) = goals.get(&start) {
            return Ok(finish(Vec::new(), &self.cases[case_index]));
        }

        let mut parent = vec![u32::MAX; CODE_SPACE];
        parent[start as usize] = u32::MAX - 1;
        let mut queue = VecDeque::new();
        queue.push_back(start);
        while let Some(code) = queue.pop_front() {
            budget.tick()?;
            for (move_index, table) in self.trans.iter().enumerate() {
                let next = pack(
                    table[(code & 63) as usize],
                    table[((code >> 6) & 63) as usize],
                    table[((code >> 12) & 63) as usize],
                );
                if parent[next as usize] != u32::MAX {
                    continue;
                }
                parent[next as usize] = (code << 7) | move_index as u32;
                if let Some(&case_index) = goals.get(&next) {
                    let mut setup = Vec::new();
                    let mut at = next;
                    while at != start {
                        let step = parent[at as usize];
                        setup.push(self.pool[(step & 127) as usize]);
                        at = step >> 7;
                    }
                    setup.reverse();
                    return Ok(finish(setup, &self.cases[case_index]));
                }
                queue.push_back(next);
            }
        }
        error!("no setup reaches any pattern case for slots {slots:?}");
        Err(SolveError::SolveVerificationFailed)
    }
}

/// The full case table, one orbit each for corners, paired edges, and
/// single wings, built once per process.
pub(crate) struct CaseTable {
    corner: OrbitCases,
    edge: OrbitCases,
    wing: OrbitCases,
}

static CASES: LazyLock<CaseTable> = LazyLock::new(CaseTable::build);

pub(crate) fn cases() -> &'static CaseTable {
    &CASES
}

impl CaseTable {
    /// Cycle three corners, twisting the moved pieces by `twists`
    /// (clockwise thirds, summing to 0 mod 3). Other corners are untouched,
    /// and edges come back exactly where they were: the stored cases fix
    /// them and the setup is undone move for move.
    pub(crate) fn realize_corner_cycle(
        &self,
        slots: [usize; 3],
        twists: [u8; 3],
        budget: &mut StageBudget<'_>,
    ) -> Result<Vec<Move>, SolveError> {
        self.corner.realize(slots, twists, budget)
    }

    /// Cycle three paired edges, flipping the moved pairs by `flips`
    /// (summing to 0 mod 2), fixing all corners and all other edges.
    pub(crate) fn realize_edge_cycle(
        &self,
        slots: [usize; 3],
        flips: [u8; 3],
        budget: &mut StageBudget<'_>,
    ) -> Result<Vec<Move>, SolveError> {
        self.edge.realize(slots, flips, budget)
    }

    /// Cycle the content of three wing slots, fixing every other wing.
    /// Corners and centers are fair game; this exists for the pairing
    /// stage, which runs before any corner is placed.
    pub(crate) fn realize_wing_cycle(
        &self,
        slots: [usize; 3],
        budget: &mut StageBudget<'_>,
    ) -> Result<Vec<Move>, SolveError> {
        self.wing.realize(slots, [0, 0, 0], budget)
    }

    fn build() -> CaseTable {
        let outer_pool: Vec<Move> = Move::all().filter(|mv| mv.layer() == Layer::Outer).collect();
        let full_pool: Vec<Move> = Move::all().collect();

        let corner = OrbitCases {
            modulus: 3,
            trans: corner_transitions(&outer_pool),
            cases: collect_cases(corner_candidates(), pure_corner_cycle),
            pool: outer_pool.clone(),
        };
        let edge = OrbitCases {
            modulus: 2,
            trans: edge_transitions(&outer_pool),
            cases: collect_cases(edge_candidates(), pure_edge_cycle),
            pool: outer_pool,
        };
        let wing = OrbitCases {
            modulus: 1,
            trans: wing_transitions(&full_pool),
            cases: collect_cases(wing_candidates(), pure_wing_cycle),
            pool: full_pool,
        };
        assert!(!corner.cases.is_empty(), "no pure corner cycle found");
        assert!(!edge.cases.is_empty(), "no pure edge cycle found");
        assert!(!wing.cases.is_empty(), "no pure wing cycle found");
        CaseTable {
            corner,
            edge,
            wing,
        }
    }
}

fn collect_cases(
    candidates: Vec<Vec<Move>>,
    classify: fn(&[Move]) -> Option<([u8; 3], [u8; 3])>,
) -> Vec<CycleCase> {
    let mut seen: FxHashSet<([u8; 3], [u8; 3])> = FxHashSet::default();
    let mut cases = Vec::new();
    for moves in candidates {
        if let Some((slots, deltas)) = classify(&moves)
            && seen.insert((slots, deltas))
        {
            cases.push(CycleCase {
                moves,
                slots,
                deltas,
            });
        }
    }
    cases
}

fn commutator(p: &[Move], q: &[Move]) -> Vec<Move> {
    let mut out = p.to_vec();
    out.extend_from_slice(q);
    out.extend(sequence_inverse(p));
    out.extend(sequence_inverse(q));
    out
}

/// Corner candidates. Around a face X with neighbor ring `n0..n4`, one
/// click of X carries the strip it shares with `n_i` onto the strip it
/// shares with `n_(i+1)`; for the non-adjacent pair `A = n_i`,
/// `B = n_(i+2)` the conjugate `x a x'` then overlaps B's orbit in exactly
/// one piece, the corner between X, `n_(i+1)` and B, so the commutator
/// with a B twist is a pure corner 3-cycle.
fn corner_candidates() -> Vec<Vec<Move>> {
    let mut out = Vec::new();
    for x_face in Face::ALL {
        let ring = x_face.neighbors();
        for s in 0..5 {
            for (x_clicks, b_offset) in [(1, 2), (4, 3)] {
                let a_face = ring[s];
                let b_face = ring[(s + b_offset) % 5];
                let x = Move::new(x_face, Layer::Outer, x_clicks);
                for a_clicks in 1..=4 {
                    let p = [x, Move::new(a_face, Layer::Outer, a_clicks), x.inverse()];
                    for b_clicks in 1..=4 {
                        let b = Move::new(b_face, Layer::Outer, b_clicks);
                        out.push(commutator(&p, &[b]));
                    }
                }
            }
        }
    }
    out
}

/// Edge candidates. For adjacent faces A and B, the conjugate
/// `x2 x1 a x1' x2'` — with `x1` and `x2` the third faces at the two ends
/// of the A–B edge, each clicked away from B — strips both shared corners
/// out of B's orbit and leaves the shared edge as the only overlap, so the
/// commutator with a B twist cycles three edges and nothing else. Both
/// click directions are enumerated; replay keeps only the ones that work.
fn edge_candidates() -> Vec<Vec<Move>> {
    let topo = topology();
    let mut out = Vec::new();
    for b_face in Face::ALL {
        for &a_face in b_face.neighbors() {
            let mut thirds: Vec<Face> = topo
                .corners()
                .iter()
                .filter(|slot| slot.faces.contains(&a_face) && slot.faces.contains(&b_face))
                .map(|slot| {
                    *slot
                        .faces
                        .iter()
                        .find(|&&f| f != a_face && f != b_face)
                        .expect("a vertex has three distinct faces")
                })
                .collect();
            thirds.sort_unstable();
            let [x1_face, x2_face] = [thirds[0], thirds[1]];
            for x1_clicks in [1, 4] {
                for x2_clicks in [1, 4] {
                    let x1 = Move::new(x1_face, Layer::Outer, x1_clicks);
                    let x2 = Move::new(x2_face, Layer::Outer, x2_clicks);
                    for a_clicks in 1..=4 {
                        let p = [
                            x2,
                            x1,
                            Move::new(a_face, Layer::Outer, a_clicks),
                            x1.inverse(),
                            x2.inverse(),
                        ];
                        for b_clicks in 1..=4 {
                            let b = Move::new(b_face, Layer::Outer, b_clicks);
                            out.push(commutator(&p, &[b]));
                        }
                    }
                }
            }
        }
    }
    out
}

/// Wing candidates. A slice under S carries five wings, none of them on a
/// face B that S does not touch; conjugating the slice by a click of a
/// face X adjacent to both S and B can push exactly one of those wings
/// into B's orbit, making the commutator with a B twist a 3-cycle of
/// wings. Corners caught up in it are irrelevant here.
fn wing_candidates() -> Vec<Vec<Move>> {
    let mut out = Vec::new();
    for s_face in Face::ALL {
        for b_face in Face::ALL {
            if b_face == s_face || s_face.is_adjacent(b_face) {
                continue;
            }
            for &x_face in s_face.neighbors() {
                if !x_face.is_adjacent(b_face) {
                    continue;
                }
                for x_clicks in 1..=4 {
                    let x = Move::new(x_face, Layer::Outer, x_clicks);
                    for s_clicks in 1..=4 {
                        let p = [x, Move::new(s_face, Layer::Slice, s_clicks), x.inverse()];
                        for b_clicks in 1..=4 {
                            let b = Move::new(b_face, Layer::Outer, b_clicks);
                            out.push(commutator(&p, &[b]));
                        }
                    }
                }
            }
        }
    }
    out
}

/// Extract a 3-cycle `a -> b -> c -> a` from `perm[dest] = source`, with
/// the smallest moved slot first. `None` unless the moved slots are
/// exactly `moved` and form one cycle.
fn extract_cycle(perm: &[u8], moved: &[usize]) -> Option<[u8; 3]> {
    if moved.len() != 3 {
        return None;
    }
    let a = moved[0];
    let dest = |src: usize| perm.iter().position(|&home| home as usize == src);
    let b = dest(a)?;
    let c = dest(b)?;
    if b == a || c == a || c == b || dest(c)? != a {
        return None;
    }
    Some([a as u8, b as u8, c as u8])
}

fn pure_corner_cycle(moves: &[Move]) -> Option<([u8; 3], [u8; 3])> {
    let turned = KilominxState::solved().after(moves);
    let corners = turned.corner_view()?;
    let (edge_home, edge_flip) = edge_occupancy(&turned)?;
    if (0..EDGE_SLOTS).any(|e| edge_home[e] as usize != e || edge_flip[e] != 0) {
        return None;
    }
    let moved: Vec<usize> = (0..CORNER_SLOTS)
        .filter(|&s| corners.perm[s] as usize != s || corners.ori[s] != 0)
        .collect();
    if moved.iter().any(|&s| corners.perm[s] as usize == s) {
        return None;
    }
    let slots = extract_cycle(&corners.perm, &moved)?;
    let deltas = [
        corners.ori[slots[1] as usize],
        corners.ori[slots[2] as usize],
        corners.ori[slots[0] as usize],
    ];
    Some((slots, deltas))
}

fn pure_edge_cycle(moves: &[Move]) -> Option<([u8; 3], [u8; 3])> {
    let turned = KilominxState::solved().after(moves);
    let corners = turned.corner_view()?;
    if (0..CORNER_SLOTS).any(|s| corners.perm[s] as usize != s || corners.ori[s] != 0) {
        return None;
    }
    let (home, flip) = edge_occupancy(&turned)?;
    let moved: Vec<usize> = (0..EDGE_SLOTS)
        .filter(|&e| home[e] as usize != e || flip[e] != 0)
        .collect();
    if moved.iter().any(|&e| home[e] as usize == e) {
        return None;
    }
    let slots = extract_cycle(&home, &moved)?;
    let deltas = [
        flip[slots[1] as usize],
        flip[slots[2] as usize],
        flip[slots[0] as usize],
    ];
    Some((slots, deltas))
}

fn pure_wing_cycle(moves: &[Move]) -> Option<([u8; 3], [u8; 3])> {
    let turned = KilominxState::solved().after(moves);
    let wings = turned.wing_view()?;
    let moved: Vec<usize> = (0..WING_SLOTS)
        .filter(|&w| wings.perm[w] as usize != w)
        .collect();
    let slots = extract_cycle(&wings.perm, &moved)?;
    Some((slots, [0, 0, 0]))
}

fn corner_transitions(pool: &[Move]) -> Vec<[u32; 64]> {
    pool.iter()
        .map(|&mv| {
            let view = KilominxState::solved()
                .apply(mv)
                .corner_view()
                .expect("moves keep corner pieces intact");
            let mut table: [u32; 64] = std::array::from_fn(|i| i as u32);
            for dest in 0..CORNER_SLOTS {
                let src = view.perm[dest] as usize;
                let delta = u32::from(view.ori[dest]);
                for ori in 0..3 {
                    table[src * 3 + ori as usize] = dest as u32 * 3 + (ori + delta) % 3;
                }
            }
            table
        })
        .collect()
}

fn edge_transitions(pool: &[Move]) -> Vec<[u32; 64]> {
    pool.iter()
        .map(|&mv| {
            let (home, flip) = edge_occupancy(&KilominxState::solved().apply(mv))
                .expect("outer moves keep edges paired");
            let mut table: [u32; 64] = std::array::from_fn(|i| i as u32);
            for dest in 0..EDGE_SLOTS {
                let src = home[dest] as usize;
                let delta = u32::from(flip[dest]);
                for ori in 0..2 {
                    table[src * 2 + ori as usize] = dest as u32 * 2 + (ori + delta) % 2;
                }
            }
            table
        })
        .collect()
}

fn wing_transitions(pool: &[Move]) -> Vec<[u32; 64]> {
    pool.iter()
        .map(|&mv| {
            let view = KilominxState::solved()
                .apply(mv)
                .wing_view()
                .expect("moves keep wing pieces intact");
            let mut table: [u32; 64] = std::array::from_fn(|i| i as u32);
            for dest in 0..WING_SLOTS {
                table[view.perm[dest] as usize] = dest as u32;
            }
            table
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{cases, edge_occupancy, pure_corner_cycle, pure_edge_cycle, pure_wing_cycle};
    use crate::{SolverConfig, Stage, StageBudget};
    use kilominx_core::KilominxState;
    use kilominx_core::moves::parse_sequence;
    use kilominx_core::topology::{CORNER_SLOTS, EDGE_SLOTS, WING_SLOTS};

    #[test]
    fn table_contains_cases_for_every_orbit() {
        let table = cases();
        assert!(!table.corner.cases.is_empty());
        assert!(!table.edge.cases.is_empty());
        assert!(!table.wing.cases.is_empty());
        for case in &table.corner.cases {
            assert_eq!(
                pure_corner_cycle(&case.moves),
                Some((case.slots, case.deltas))
            );
        }
        for case in &table.edge.cases {
            assert_eq!(pure_edge_cycle(&case.moves), Some((case.slots, case.deltas)));
        }
        for case in &table.wing.cases {
            assert_eq!(pure_wing_cycle(&case.moves), Some((case.slots, case.deltas)));
        }
    }

    #[test]
    fn realized_corner_cycle_moves_exactly_three_corners() {
        let config = SolverConfig::default();
        let mut budget = StageBudget::new(&config, Stage::Reduction);
        let moves = cases()
            .realize_corner_cycle([0, 7, 13], [1, 2, 0], &mut budget)
            .unwrap();
        let turned = KilominxState::solved().after(&moves);
        let corners = turned.corner_view().unwrap();
        for slot in 0..CORNER_SLOTS {
            let touched = [0, 7, 13].contains(&slot);
            assert_eq!(corners.perm[slot] as usize != slot, touched, "slot {slot}");
        }
        // Content of 0 lands in 7 twisted once, of 7 in 13 twisted twice.
        assert_eq!(corners.perm[7], 0);
        assert_eq!(corners.ori[7], 1);
        assert_eq!(corners.perm[13], 7);
        assert_eq!(corners.ori[13], 2);
        assert_eq!(corners.perm[0], 13);
        assert_eq!(corners.ori[0], 0);
        // Pairing survives an outer-only sequence.
        let (home, flip) = edge_occupancy(&turned).unwrap();
        assert!((0..EDGE_SLOTS).all(|e| home[e] as usize == e && flip[e] == 0));
    }

    #[test]
    fn realized_edge_cycle_fixes_corners() {
        let config = SolverConfig::default();
        let mut budget = StageBudget::new(&config, Stage::Reduction);
        let moves = cases()
            .realize_edge_cycle([2, 11, 29], [1, 1, 0], &mut budget)
            .unwrap();
        let turned = KilominxState::solved().after(&moves);
        let corners = turned.corner_view().unwrap();
        assert!((0..CORNER_SLOTS).all(|s| corners.perm[s] as usize == s && corners.ori[s] == 0));
        let (home, flip) = edge_occupancy(&turned).unwrap();
        assert_eq!(home[11], 2);
        assert_eq!(flip[11], 1);
        assert_eq!(home[29], 11);
        assert_eq!(flip[29], 1);
        assert_eq!(home[2], 29);
        assert_eq!(flip[2], 0);
        for e in (0..EDGE_SLOTS).filter(|e| ![2, 11, 29].contains(e)) {
            assert_eq!(home[e] as usize, e);
            assert_eq!(flip[e], 0);
        }
    }

    #[test]
    fn realized_wing_cycle_fixes_every_other_wing() {
        let config = SolverConfig::default();
        let mut budget = StageBudget::new(&config, Stage::EdgePairing);
        let moves = cases().realize_wing_cycle([5, 17, 40], &mut budget).unwrap();
        let turned = KilominxState::solved().after(&moves);
        let wings = turned.wing_view().unwrap();
        assert_eq!(wings.perm[17], 5);
        assert_eq!(wings.perm[40], 17);
        assert_eq!(wings.perm[5], 40);
        for w in (0..WING_SLOTS).filter(|w| ![5, 17, 40].contains(w)) {
            assert_eq!(wings.perm[w] as usize, w, "wing {w}");
        }
    }

    #[test]
    fn occupancy_reports_unpaired_states() {
        let sliced = KilominxState::solved().after(&parse_sequence("Us").unwrap());
        assert!(edge_occupancy(&sliced).is_none());
    }
}
