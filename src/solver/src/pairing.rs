//! Stage B: edge pairing.
//!
//! Each of the 30 edges is paired when its two wing slots hold sibling
//! pieces. Unpaired edges are processed greedily in a priority order
//! recomputed after every success (edges with more already-matching sides
//! first, ties by index). Per target the stage first tries the canned
//! patterns — single slice twists, then slice–twist–slice′ conjugates over
//! the faces around the target — then a bounded-depth breadth-first search
//! over the moves around the target, and finally a wing 3-cycle from the
//! pattern-case table that carries the missing sibling straight into the
//! target, routed entirely through unpaired edges. Every accepted fix
//! keeps previously paired edges paired, so the paired count only grows
//! and the greedy loop terminates.
//!
//! Slice moves can leave all edges paired while the induced 3-layer edge
//! permutation is odd, which face twists alone can never solve. The stage
//! ends by checking that parity and, when odd, swapping the contents of
//! two edge slots with a pair of wing 3-cycles, which flips the parity
//! without unpairing anything.

use crate::library::cases;
use crate::{SolveError, SolverConfig, StageBudget};
use fxhash::FxHashSet;
use itertools::Itertools;
use kilominx_core::moves::Layer;
use kilominx_core::state::permutation_is_even;
use kilominx_core::topology::{EDGE_SLOTS, WING_SLOTS, topology};
use kilominx_core::{KilominxState, Move};
use log::{debug, error};
use std::cmp::Reverse;
use std::collections::VecDeque;

/// Per-target expansion cap of the breadth-first tier. The wing-cycle
/// fallback picks up anything deeper, so this stays small enough that the
/// visited set never grows past a few megabytes.
const PAIRING_BFS_NODES: usize = 20_000;

fn matching_sides(state: &KilominxState, edge: usize) -> usize {
    let topo = topology();
    let slot = &topo.edges()[edge];
    let forward = &topo.wings()[slot.wings[0]];
    let backward = &topo.wings()[slot.wings[1]];
    usize::from(state.color_at(forward.outer) == state.color_at(backward.inner))
        + usize::from(state.color_at(backward.outer) == state.color_at(forward.inner))
}

fn paired_set(state: &KilominxState) -> [bool; EDGE_SLOTS] {
    let mut set = [false; EDGE_SLOTS];
    for (edge, entry) in set.iter_mut().enumerate() {
        *entry = state.edge_paired(edge);
    }
    set
}

fn fix_ok(state: &KilominxState, target: usize, required: &[bool; EDGE_SLOTS]) -> bool {
    state.edge_paired(target)
        && required
            .iter()
            .enumerate()
            .all(|(edge, &need)| !need || state.edge_paired(edge))
}

/// The restricted move set for one target: outer twists of the faces
/// touching the target slots and the slots currently holding the target's
/// pieces, plus the slices carrying any of those wings.
fn relevant_moves(state: &KilominxState, target: usize) -> (Vec<Move>, Vec<Move>) {
    let topo = topology();
    let view = state
        .wing_view()
        .expect("solver states keep wing pieces intact");
    let slot = &topo.edges()[target];
    let mut faces = vec![slot.faces.0, slot.faces.1];
    let mut axes = Vec::new();
    for &home_wing in &slot.wings {
        axes.push(topo.slice_axis_of_wing(home_wing));
        let current = view
            .perm
            .iter()
            .position(|&home| home as usize == home_wing)
            .expect("wing permutation covers every piece");
        let holder = &topo.wings()[current];
        faces.push(holder.faces.0);
        faces.push(holder.faces.1);
        axes.push(topo.slice_axis_of_wing(current));
    }
    let outer = faces
        .into_iter()
        .sorted()
        .dedup()
        .flat_map(|face| (1..=4).map(move |clicks| Move::new(face, Layer::Outer, clicks)))
        .collect();
    let slices = axes
        .into_iter()
        .sorted()
        .dedup()
        .flat_map(|axis| (1..=4).map(move |clicks| Move::new(axis, Layer::Slice, clicks)))
        .collect();
    (outer, slices)
}

/// Shortest-known-pattern pass: single slices, then slice–twist–slice′
/// conjugates, in a fixed order.
fn canned_fix(
    state: &KilominxState,
    target: usize,
    required: &[bool; EDGE_SLOTS],
    budget: &mut StageBudget<'_>,
) -> Result<Option<Vec<Move>>, SolveError> {
    let (outer, slices) = relevant_moves(state, target);
    for &slice in &slices {
        budget.tick()?;
        if fix_ok(&state.apply(slice), target, required) {
            return Ok(Some(vec![slice]));
        }
    }
    for &slice in &slices {
        for &twist in &outer {
            budget.tick()?;
            let sequence = vec![slice, twist, slice.inverse()];
            if fix_ok(&state.after(&sequence), target, required) {
                return Ok(Some(sequence));
            }
        }
    }
    Ok(None)
}

/// Bounded-depth breadth-first fallback over the moves around the target,
/// capped by the configured depth and a fixed expansion count.
fn bfs_fix(
    state: &KilominxState,
    target: usize,
    required: &[bool; EDGE_SLOTS],
    config: &SolverConfig,
    budget: &mut StageBudget<'_>,
) -> Result<Option<Vec<Move>>, SolveError> {
    let (outer, slices) = relevant_moves(state, target);
    let pool: Vec<Move> = slices.into_iter().chain(outer).collect();
    let mut visited: FxHashSet<KilominxState> = FxHashSet::default();
    visited.insert(*state);
    let mut queue: VecDeque<(KilominxState, Vec<Move>)> = VecDeque::new();
    queue.push_back((*state, Vec::new()));
    let mut expanded = 0usize;
    while let Some((at, path)) = queue.pop_front() {
        if path.len() >= config.max_search_depth {
            continue;
        }
        for &mv in &pool {
            // Two twists of the same face and layer in a row always merge.
            if let Some(&last) = path.last()
                && last.face() == mv.face()
                && last.layer() == mv.layer()
            {
                continue;
            }
            budget.tick()?;
            expanded += 1;
            if expanded > PAIRING_BFS_NODES {
                return Ok(None);
            }
            let next = at.apply(mv);
            let mut next_path = path.clone();
            next_path.push(mv);
            if fix_ok(&next, target, required) {
                return Ok(Some(next_path));
            }
            if visited.insert(next) {
                queue.push_back((next, next_path));
            }
        }
    }
    Ok(None)
}

/// The wing 3-cycle that pairs `target` directly: carry the sibling of the
/// wing kept in place into the target's other slot, spilling the displaced
/// wing into another unpaired edge. All three touched slots sit in
/// unpaired edges, so nothing already paired is at risk.
fn sibling_cycle_slots(state: &KilominxState, target: usize) -> Result<[usize; 3], SolveError> {
    let topo = topology();
    let Some(view) = state.wing_view() else {
        error!("wing pieces lost their identity while pairing");
        return Err(SolveError::SolveVerificationFailed);
    };
    let slot = &topo.edges()[target];
    let kept_home = view.perm[slot.wings[0]] as usize;
    let home_edge = topo.edge_of_wing(kept_home);
    let sibling = topo.edges()[home_edge]
        .wings
        .iter()
        .copied()
        .find(|&w| w != kept_home)
        .expect("an edge has two wings");
    let sibling_at = view
        .perm
        .iter()
        .position(|&home| home as usize == sibling)
        .expect("wing permutation covers every piece");
    let spill = (0..WING_SLOTS)
        .find(|&w| {
            let edge = topo.edge_of_wing(w);
            edge != target && !state.edge_paired(edge) && w != sibling_at
        })
        .expect("an unpaired edge never comes alone");
    Ok([sibling_at, slot.wings[1], spill])
}

/// Swap the contents of two edge slots, both wings at once, as a pair of
/// wing 3-cycles. Pairing is restored by the end of the pair; the induced
/// edge permutation gains one transposition.
fn edge_swap(
    first: usize,
    second: usize,
    budget: &mut StageBudget<'_>,
) -> Result<Vec<Move>, SolveError> {
    let topo = topology();
    let [p0, p1] = topo.edges()[first].wings;
    let [q0, q1] = topo.edges()[second].wings;
    let mut moves = cases().realize_wing_cycle([p0, p1, q1], budget)?;
    moves.extend(cases().realize_wing_cycle([p0, p1, q0], budget)?);
    Ok(moves)
}

pub(crate) fn pair_edges(
    state: &KilominxState,
    config: &SolverConfig,
    budget: &mut StageBudget<'_>,
) -> Result<(KilominxState, Vec<Move>), SolveError> {
    let mut state = *state;
    let mut moves = Vec::new();
    loop {
        let required = paired_set(&state);
        let unpaired: Vec<usize> = (0..EDGE_SLOTS).filter(|&e| !required[e]).collect();
        if unpaired.is_empty() {
            break;
        }
        let ordered: Vec<usize> = unpaired
            .into_iter()
            .sorted_by_key(|&edge| (Reverse(matching_sides(&state, edge)), edge))
            .collect();
        let mut fix = None;
        for &target in &ordered {
            if let Some(sequence) = canned_fix(&state, target, &required, budget)? {
                fix = Some(sequence);
                break;
            }
            if let Some(sequence) = bfs_fix(&state, target, &required, config, budget)? {
                fix = Some(sequence);
                break;
            }
        }
        let sequence = match fix {
            Some(sequence) => sequence,
            None => {
                let target = ordered[0];
                let slots = sibling_cycle_slots(&state, target)?;
                cases().realize_wing_cycle(slots, budget)?
            }
        };
        let next = state.after(&sequence);
        let paired_before = required.iter().filter(|&&p| p).count();
        let paired_after = (0..EDGE_SLOTS).filter(|&e| next.edge_paired(e)).count();
        if paired_after <= paired_before
            || required
                .iter()
                .enumerate()
                .any(|(edge, &need)| need && !next.edge_paired(edge))
        {
            error!("a pairing fix lost ground");
            return Err(SolveError::SolveVerificationFailed);
        }
        state = next;
        moves.extend_from_slice(&sequence);
    }

    let Some(edge_perm) = state.paired_edge_view() else {
        error!("pairing loop left an edge split");
        return Err(SolveError::SolveVerificationFailed);
    };
    if !permutation_is_even(&edge_perm) {
        debug!("paired edge permutation is odd, swapping two edges");
        let swap = edge_swap(0, 1, budget)?;
        state = state.after(&swap);
        moves.extend_from_slice(&swap);
        let even = state
            .paired_edge_view()
            .is_some_and(|perm| permutation_is_even(&perm));
        if !even {
            error!("edge swap failed to mend the permutation parity");
            return Err(SolveError::SolveVerificationFailed);
        }
    }
    Ok((state, moves))
}

#[cfg(test)]
mod tests {
    use super::{edge_swap, pair_edges};
    use crate::{SolverConfig, Stage, StageBudget};
    use kilominx_core::KilominxState;
    use kilominx_core::moves::parse_sequence;
    use kilominx_core::state::permutation_is_even;
    use kilominx_core::topology::EDGE_SLOTS;

    fn paired_with_even_parity(state: &KilominxState) -> bool {
        state
            .paired_edge_view()
            .is_some_and(|perm| permutation_is_even(&perm))
    }

    #[test]
    fn face_only_scrambles_are_already_paired() {
        let config = SolverConfig::default();
        let scrambled =
            KilominxState::solved().after(&parse_sequence("F U2 R' BL BD2' UR L2").unwrap());
        let mut budget = StageBudget::new(&config, Stage::EdgePairing);
        let (paired, moves) = pair_edges(&scrambled, &config, &mut budget).unwrap();
        assert!(moves.is_empty());
        assert!(paired_with_even_parity(&paired));
    }

    #[test]
    fn single_slice_scramble_pairs_back() {
        let config = SolverConfig::default();
        let scrambled = KilominxState::solved().after(&parse_sequence("Us").unwrap());
        let mut budget = StageBudget::new(&config, Stage::EdgePairing);
        let (paired, _moves) = pair_edges(&scrambled, &config, &mut budget).unwrap();
        assert!(paired_with_even_parity(&paired));
    }

    #[test_log::test]
    fn mixed_scramble_pairs_back() {
        let config = SolverConfig::default();
        let scrambled =
            KilominxState::solved().after(&parse_sequence("F Us R' Bs2 U L2'").unwrap());
        let mut budget = StageBudget::new(&config, Stage::EdgePairing);
        let (paired, _moves) = pair_edges(&scrambled, &config, &mut budget).unwrap();
        assert!(paired_with_even_parity(&paired));
    }

    #[test_log::test]
    fn slice_heavy_scramble_pairs_back() {
        let config = SolverConfig::default();
        let scrambled = KilominxState::solved()
            .after(&parse_sequence("Fs Us2 R Bs' L2 Ds BU' URs2' B Ls").unwrap());
        let mut budget = StageBudget::new(&config, Stage::EdgePairing);
        let (paired, _moves) = pair_edges(&scrambled, &config, &mut budget).unwrap();
        assert!(paired_with_even_parity(&paired));
    }

    #[test]
    fn edge_swap_transposes_without_unpairing() {
        let config = SolverConfig::default();
        let mut budget = StageBudget::new(&config, Stage::EdgePairing);
        let swap = edge_swap(0, 1, &mut budget).unwrap();
        let swapped = KilominxState::solved().after(&swap);
        let perm = swapped.paired_edge_view().expect("still fully paired");
        assert_eq!(perm[0], 1);
        assert_eq!(perm[1], 0);
        for edge in 2..EDGE_SLOTS {
            assert_eq!(perm[edge] as usize, edge);
        }
        assert!(!permutation_is_even(&perm));
    }
}
