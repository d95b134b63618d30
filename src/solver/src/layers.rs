//! Stage C: the 3-layer reduction solve.
//!
//! With every edge paired the puzzle behaves like a megaminx, so this
//! stage only ever issues outer twists. Pieces are solved layer by layer
//! starting from a fixed base face: the base star (its five edges), the
//! base corners, the two belts of the middle faces, and finally the last
//! layer around the opposite face. Each target piece is solved by a
//! shallow iterative-deepening insert search first and, when no short
//! insert exists, by a pattern case from the generated table conjugated
//! onto the target, with the orientation of the placed piece folded into
//! the conjugation. Every applied sequence is replayed on a scratch copy
//! and checked against the pieces already solved before it is committed,
//! so a bad sequence surfaces as an internal error instead of corrupting
//! the solve.
//!
//! A solved piece is never given up: helpers for cycles and twist or flip
//! repairs are drawn from the pieces not yet processed, which the group's
//! parity invariants guarantee to exist whenever a repair is needed.

use crate::library::{cases, edge_occupancy};
use crate::{SolveError, SolverConfig, StageBudget};
use kilominx_core::moves::Layer;
use kilominx_core::state::CornerView;
use kilominx_core::topology::{CORNER_SLOTS, EDGE_SLOTS, topology};
use kilominx_core::{Face, KilominxState, Move};
use log::error;

const INSERT_DEPTH: usize = 2;

/// Base face of the layer order. Its star is solved first; the face
/// opposite it becomes the last layer.
const BASE: Face = Face::D;

fn antipode(face: Face) -> Face {
    // The opposite face is the one whose neighborhood is disjoint from
    // `face`'s: every other non-neighbor touches the first ring.
    Face::ALL
        .into_iter()
        .find(|&g| {
            g != face
                && !g.is_adjacent(face)
                && g.neighbors().iter().all(|&n| !face.is_adjacent(n))
        })
        .expect("every dodecahedron face has an opposite face")
}

/// The twelve faces from the base layer up to the last layer.
fn face_order() -> [Face; 12] {
    let top = antipode(BASE);
    let mut order = [BASE; 12];
    let mut at = 0;
    let mut push = |order: &mut [Face; 12], face: Face| {
        if !order[..at].contains(&face) {
            order[at] = face;
            at += 1;
        }
    };
    push(&mut order, BASE);
    for &n in BASE.neighbors() {
        push(&mut order, n);
    }
    for &n in top.neighbors() {
        push(&mut order, n);
    }
    push(&mut order, top);
    assert_eq!(at, 12);
    order
}

fn corner_solved(state: &KilominxState, slot: usize) -> bool {
    let corner = &topology().corners()[slot];
    (0..3).all(|j| state.color_at(corner.stickers[j]) == state.face_color(corner.faces[j]))
}

fn edge_solved(state: &KilominxState, edge: usize) -> bool {
    let topo = topology();
    topo.edges()[edge].wings.iter().all(|&w| {
        let wing = &topo.wings()[w];
        state.color_at(wing.outer) == state.face_color(wing.faces.0)
            && state.color_at(wing.inner) == state.face_color(wing.faces.1)
    })
}

struct Reduction {
    state: KilominxState,
    moves: Vec<Move>,
    corner_done: [bool; CORNER_SLOTS],
    edge_done: [bool; EDGE_SLOTS],
    pool: Vec<Move>,
    insert_depth: usize,
}

pub(crate) fn solve_reduced(
    state: &KilominxState,
    config: &SolverConfig,
    budget: &mut StageBudget<'_>,
) -> Result<(KilominxState, Vec<Move>), SolveError> {
    let mut reduction = Reduction {
        state: *state,
        moves: Vec::new(),
        corner_done: std::array::from_fn(|slot| corner_solved(state, slot)),
        edge_done: std::array::from_fn(|edge| edge_solved(state, edge)),
        pool: Move::all().filter(|mv| mv.layer() == Layer::Outer).collect(),
        insert_depth: config.max_search_depth.min(INSERT_DEPTH),
    };

    let topo = topology();
    for face in face_order() {
        for edge in 0..EDGE_SLOTS {
            let slot = &topo.edges()[edge];
            if (slot.faces.0 == face || slot.faces.1 == face) && !reduction.edge_done[edge] {
                reduction.solve_edge(edge, budget)?;
            }
        }
        for corner in 0..CORNER_SLOTS {
            if topo.corners()[corner].faces.contains(&face) && !reduction.corner_done[corner] {
                reduction.solve_corner(corner, budget)?;
            }
        }
    }
    debug_assert!(reduction.state.is_solved());
    Ok((reduction.state, reduction.moves))
}

impl Reduction {
    fn preserved(&self, state: &KilominxState) -> bool {
        (0..CORNER_SLOTS).all(|s| !self.corner_done[s] || corner_solved(state, s))
            && (0..EDGE_SLOTS).all(|e| !self.edge_done[e] || edge_solved(state, e))
    }

    /// Replay `moves` on a scratch copy and commit only if the target
    /// condition holds and no solved piece was lost.
    fn commit(
        &mut self,
        moves: Vec<Move>,
        target_holds: impl Fn(&KilominxState) -> bool,
    ) -> Result<(), SolveError> {
        let next = self.state.after(&moves);
        if !target_holds(&next) || !self.preserved(&next) {
            error!("pattern application broke an established piece");
            return Err(SolveError::SolveVerificationFailed);
        }
        self.state = next;
        self.moves.extend(moves);
        Ok(())
    }

    fn corner_view(&self) -> Result<CornerView, SolveError> {
        self.state.corner_view().ok_or_else(|| {
            error!("corner pieces lost their identity mid-reduction");
            SolveError::SolveVerificationFailed
        })
    }

    fn edge_view(&self) -> Result<([u8; EDGE_SLOTS], [u8; EDGE_SLOTS]), SolveError> {
        edge_occupancy(&self.state).ok_or_else(|| {
            error!("an edge came unpaired mid-reduction");
            SolveError::SolveVerificationFailed
        })
    }

    /// Iterative-deepening search for a short insert: a sequence that
    /// establishes `goal` without breaking any solved piece. Most
    /// first-layer and belt pieces go in this way.
    fn insert(
        &self,
        goal: &dyn Fn(&KilominxState) -> bool,
        budget: &mut StageBudget<'_>,
    ) -> Result<Option<Vec<Move>>, SolveError> {
        for depth in 1..=self.insert_depth {
            let mut path = Vec::with_capacity(depth);
            if self.insert_dfs(&self.state, depth, goal, &mut path, budget)? {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    fn insert_dfs(
        &self,
        state: &KilominxState,
        depth_left: usize,
        goal: &dyn Fn(&KilominxState) -> bool,
        path: &mut Vec<Move>,
        budget: &mut StageBudget<'_>,
    ) -> Result<bool, SolveError> {
        for &mv in &self.pool {
            if let Some(&last) = path.last()
                && last.face() == mv.face()
            {
                continue;
            }
            budget.tick()?;
            let next = state.apply(mv);
            path.push(mv);
            let found = if goal(&next) && self.preserved(&next) {
                true
            } else if depth_left > 1 {
                self.insert_dfs(&next, depth_left - 1, goal, path, budget)?
            } else {
                false
            };
            if found {
                return Ok(true);
            }
            path.pop();
        }
        Ok(false)
    }

    /// Lowest-index unprocessed corner slot outside `avoid`. The group
    /// invariants keep one available whenever a repair asks for it.
    fn spare_corner(&self, avoid: [usize; 2]) -> usize {
        (0..CORNER_SLOTS)
            .find(|&s| !self.corner_done[s] && !avoid.contains(&s))
            .expect("corner parity leaves a spare slot")
    }

    fn spare_edge(&self, avoid: [usize; 2]) -> usize {
        (0..EDGE_SLOTS)
            .find(|&e| !self.edge_done[e] && !avoid.contains(&e))
            .expect("edge parity leaves a spare slot")
    }

    fn solve_corner(
        &mut self,
        target: usize,
        budget: &mut StageBudget<'_>,
    ) -> Result<(), SolveError> {
        if !corner_solved(&self.state, target) {
            if let Some(moves) = self.insert(&|s| corner_solved(s, target), budget)? {
                self.commit(moves, |s| corner_solved(s, target))?;
            } else {
                let view = self.corner_view()?;
                let moves = if view.perm[target] as usize == target {
                    // Twisted in place: cycle the piece out through an
                    // unprocessed slot and back with the counter-twist.
                    // The third slot is restored exactly, so any slot
                    // serves; the net effect twists only the helper.
                    let twist = view.ori[target];
                    let helper = self.spare_corner([target, target]);
                    let third = (0..CORNER_SLOTS)
                        .find(|&s| s != target && s != helper)
                        .expect("three corner slots always exist");
                    let mut moves =
                        cases().realize_corner_cycle([target, helper, third], [0, 0, 0], budget)?;
                    moves.extend(cases().realize_corner_cycle(
                        [helper, target, third],
                        [(3 - twist) % 3, 0, twist],
                        budget,
                    )?);
                    moves
                } else {
                    let from = view
                        .perm
                        .iter()
                        .position(|&home| home as usize == target)
                        .expect("every corner piece occupies a slot");
                    let twist = view.ori[from];
                    let third = self.spare_corner([target, from]);
                    cases().realize_corner_cycle(
                        [from, target, third],
                        [(3 - twist) % 3, 0, twist],
                        budget,
                    )?
                };
                self.commit(moves, |s| corner_solved(s, target))?;
            }
        }
        self.corner_done[target] = true;
        Ok(())
    }

    fn solve_edge(&mut self, target: usize, budget: &mut StageBudget<'_>) -> Result<(), SolveError> {
        if !edge_solved(&self.state, target) {
            if let Some(moves) = self.insert(&|s| edge_solved(s, target), budget)? {
                self.commit(moves, |s| edge_solved(s, target))?;
            } else {
                let (home, flip) = self.edge_view()?;
                let moves = if home[target] as usize == target {
                    // Flipped in place: same out-and-back shape as the
                    // corner twist, with the reflip on the return leg.
                    let helper = self.spare_edge([target, target]);
                    let third = (0..EDGE_SLOTS)
                        .find(|&e| e != target && e != helper)
                        .expect("three edge slots always exist");
                    let mut moves =
                        cases().realize_edge_cycle([target, helper, third], [0, 0, 0], budget)?;
                    moves.extend(cases().realize_edge_cycle(
                        [helper, target, third],
                        [1, 0, 1],
                        budget,
                    )?);
                    moves
                } else {
                    let from = home
                        .iter()
                        .position(|&h| h as usize == target)
                        .expect("every edge pair occupies a slot");
                    let turn = flip[from];
                    let third = self.spare_edge([target, from]);
                    cases().realize_edge_cycle([from, target, third], [turn, 0, turn], budget)?
                };
                self.commit(moves, |s| edge_solved(s, target))?;
            }
        }
        self.edge_done[target] = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{antipode, face_order, solve_reduced};
    use crate::{SolverConfig, Stage, StageBudget};
    use kilominx_core::moves::parse_sequence;
    use kilominx_core::{Face, KilominxState};

    #[test]
    fn antipodes_pair_up() {
        for face in Face::ALL {
            let opposite = antipode(face);
            assert_ne!(face, opposite);
            assert_eq!(antipode(opposite), face);
        }
    }

    #[test]
    fn face_order_covers_the_puzzle_base_first() {
        let order = face_order();
        assert_eq!(order[0], Face::D);
        assert_eq!(order[11], antipode(Face::D));
        let mut seen = order.to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn already_solved_state_needs_no_moves() {
        let config = SolverConfig::default();
        let mut budget = StageBudget::new(&config, Stage::Reduction);
        let (state, moves) = solve_reduced(&KilominxState::solved(), &config, &mut budget).unwrap();
        assert!(moves.is_empty());
        assert!(state.is_solved());
    }

    #[test_log::test]
    fn solves_a_face_turn_scramble() {
        let config = SolverConfig::default();
        let mut budget = StageBudget::new(&config, Stage::Reduction);
        let scrambled =
            KilominxState::solved().after(&parse_sequence("F U2 R' BL BD2' UR L2 B'").unwrap());
        let (state, moves) = solve_reduced(&scrambled, &config, &mut budget).unwrap();
        assert!(state.is_solved());
        assert_eq!(scrambled.after(&moves), state);
    }
}
