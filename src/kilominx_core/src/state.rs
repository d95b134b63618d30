//! The full puzzle configuration and its piece-level views.
//!
//! A [`KilominxState`] is the 240-entry facelet color array. Moves apply
//! through the precomputed topology tables and always produce a fresh value
//! from the caller's perspective; the solver keeps its own working copies.
//! Piece-level bookkeeping (which corner sits where, with which twist) is
//! derived from the colors on demand rather than tracked redundantly.

use crate::faces::{ColorLabel, Face};
use crate::moves::Move;
use crate::topology::{
    CORNER_SLOTS, EDGE_SLOTS, FACE_COUNT, FACELET_COUNT, FACELETS_PER_FACE, PETAL_RING,
    WING_SLOTS, facelet, topology,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KilominxState {
    facelets: [ColorLabel; FACELET_COUNT],
}

/// Corner occupancy derived from facelet colors: `perm[slot]` is the home
/// slot of the piece currently in `slot`, `ori[slot]` its clockwise twist
/// relative to home (0..3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CornerView {
    pub perm: [u8; CORNER_SLOTS],
    pub ori: [u8; CORNER_SLOTS],
}

/// Wing occupancy: `perm[slot]` is the home slot of the wing in `slot`.
/// Wings carry no orientation of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WingView {
    pub perm: [u8; WING_SLOTS],
}

impl KilominxState {
    /// The canonical solved state (face `i` uniformly colored with color
    /// `i`).
    #[must_use]
    pub fn solved() -> KilominxState {
        KilominxState {
            facelets: *topology().solved_colors(),
        }
    }

    /// Wrap a raw facelet array without any validity checking. The
    /// validator is the gate for external input; this exists for the solver
    /// and for constructing fixtures.
    #[must_use]
    pub fn from_facelets(facelets: [ColorLabel; FACELET_COUNT]) -> KilominxState {
        KilominxState { facelets }
    }

    #[must_use]
    pub fn facelets(&self) -> &[ColorLabel; FACELET_COUNT] {
        &self.facelets
    }

    #[must_use]
    pub fn color_at(&self, index: usize) -> ColorLabel {
        self.facelets[index]
    }

    /// The face's color as defined by its center block (petals are pinned,
    /// so any petal works as the reference).
    #[must_use]
    pub fn face_color(&self, face: Face) -> ColorLabel {
        self.facelets[facelet(face, PETAL_RING)]
    }

    /// Map from color to the face whose center carries it, provided every
    /// center block is uniform and no two faces share a center color.
    #[must_use]
    pub fn home_face_map(&self) -> Option<[Face; 12]> {
        let mut map = [None; 12];
        for face in Face::ALL {
            let color = self.face_color(face);
            for petal in 1..FACELETS_PER_FACE - PETAL_RING {
                if self.facelets[facelet(face, PETAL_RING + petal)] != color {
                    return None;
                }
            }
            if map[color.index()].is_some() {
                return None;
            }
            map[color.index()] = Some(face);
        }
        Some(map.map(|f| f.expect("12 unique centers cover all 12 colors")))
    }

    /// Solved means every face is monochromatic in a color no other face
    /// shows.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        let mut seen = [false; 12];
        for face in Face::ALL {
            let color = self.face_color(face);
            if seen[color.index()] {
                return false;
            }
            seen[color.index()] = true;
            for local in 0..FACELETS_PER_FACE {
                if self.facelets[facelet(face, local)] != color {
                    return false;
                }
            }
        }
        true
    }

    /// Apply a move, returning the twisted state.
    #[must_use]
    pub fn apply(&self, mv: Move) -> KilominxState {
        let mut out = *self;
        out.apply_in_place(mv);
        out
    }

    /// Apply a move to this state. The permutation tables are in
    /// destination form, so this works off a snapshot of the current
    /// colors.
    pub fn apply_in_place(&mut self, mv: Move) {
        let table = topology().move_table(mv);
        let before = self.facelets;
        for (i, &dest) in table.iter().enumerate() {
            self.facelets[dest as usize] = before[i];
        }
    }

    /// Apply a whole sequence left to right.
    #[must_use]
    pub fn after(&self, moves: &[Move]) -> KilominxState {
        let mut out = *self;
        for &mv in moves {
            out.apply_in_place(mv);
        }
        out
    }

    /// Whether both wings of an edge hold sibling pieces, i.e. the edge
    /// behaves as a single 3-layer edge piece.
    #[must_use]
    pub fn edge_paired(&self, edge: usize) -> bool {
        let topo = topology();
        let slot = &topo.edges()[edge];
        let forward = &topo.wings()[slot.wings[0]];
        let backward = &topo.wings()[slot.wings[1]];
        self.facelets[forward.outer] == self.facelets[backward.inner]
            && self.facelets[backward.outer] == self.facelets[forward.inner]
    }

    /// Derive corner occupancy. `None` when some corner shows a color
    /// combination no solved-state piece has (including mirrored triples),
    /// or when centers do not define a face mapping.
    #[must_use]
    pub fn corner_view(&self) -> Option<CornerView> {
        let topo = topology();
        let homes = self.home_face_map()?;
        let mut perm = [0; CORNER_SLOTS];
        let mut ori = [0; CORNER_SLOTS];
        for (slot_index, slot) in topo.corners().iter().enumerate() {
            let observed = slot
                .stickers
                .map(|sticker| homes[self.facelets[sticker].index()]);
            let home_index = topo.corner_slot_by_faces(observed)?;
            let home = &topo.corners()[home_index];
            let rotation =
                (0..3).find(|&r| (0..3).all(|j| observed[j] == home.faces[(j + r) % 3]))?;
            perm[slot_index] = home_index as u8;
            ori[slot_index] = rotation as u8;
        }
        Some(CornerView { perm, ori })
    }

    /// Derive wing occupancy. `None` when some wing shows a color pair of
    /// non-adjacent faces, or when centers do not define a face mapping.
    #[must_use]
    pub fn wing_view(&self) -> Option<WingView> {
        let topo = topology();
        let homes = self.home_face_map()?;
        let mut perm = [0; WING_SLOTS];
        for (slot_index, slot) in topo.wings().iter().enumerate() {
            let outer_home = homes[self.facelets[slot.outer].index()];
            let inner_home = homes[self.facelets[slot.inner].index()];
            let home_index = topo.wing_slot_by_faces(outer_home, inner_home)?;
            perm[slot_index] = home_index as u8;
        }
        Some(WingView { perm })
    }

    /// Derive the 3-layer edge permutation of a fully paired state:
    /// `perm[edge]` is the home edge of the pair sitting in `edge`. `None`
    /// if any edge is unpaired or shows an impossible pair.
    #[must_use]
    pub fn paired_edge_view(&self) -> Option<[u8; EDGE_SLOTS]> {
        let topo = topology();
        let homes = self.home_face_map()?;
        let mut perm = [0; EDGE_SLOTS];
        for (edge_index, slot) in topo.edges().iter().enumerate() {
            if !self.edge_paired(edge_index) {
                return None;
            }
            let forward = &topo.wings()[slot.wings[0]];
            let outer_home = homes[self.facelets[forward.outer].index()];
            let inner_home = homes[self.facelets[forward.inner].index()];
            let wing_home = topo.wing_slot_by_faces(outer_home, inner_home)?;
            perm[edge_index] = topo.edge_of_wing(wing_home) as u8;
        }
        Some(perm)
    }
}

/// Whether a permutation (given as `perm[slot] = occupant`) is even.
#[must_use]
pub fn permutation_is_even(perm: &[u8]) -> bool {
    let mut seen = vec![false; perm.len()];
    let mut transpositions = 0;
    for start in 0..perm.len() {
        if seen[start] {
            continue;
        }
        let mut length = 0;
        let mut at = start;
        while !seen[at] {
            seen[at] = true;
            at = perm[at] as usize;
            length += 1;
        }
        transpositions += length - 1;
    }
    transpositions % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::{KilominxState, permutation_is_even};
    use crate::moves::{Move, parse_sequence, sequence_inverse};

    #[test]
    fn solved_state_is_solved_and_identity() {
        let state = KilominxState::solved();
        assert!(state.is_solved());
        let corners = state.corner_view().unwrap();
        let wings = state.wing_view().unwrap();
        for (slot, &home) in corners.perm.iter().enumerate() {
            assert_eq!(slot, home as usize);
        }
        assert!(corners.ori.iter().all(|&o| o == 0));
        for (slot, &home) in wings.perm.iter().enumerate() {
            assert_eq!(slot, home as usize);
        }
    }

    #[test]
    fn every_move_round_trips_through_its_inverse() {
        let scrambled = KilominxState::solved().after(&parse_sequence("F U R2 Bs' L").unwrap());
        for mv in Move::all() {
            let back = scrambled.apply(mv).apply(mv.inverse());
            assert_eq!(back, scrambled, "move {mv}");
        }
    }

    #[test]
    fn five_clicks_are_the_identity() {
        let state = KilominxState::solved();
        for mv in Move::all().filter(|mv| mv.clicks() == 1) {
            let mut turned = state;
            for _ in 0..5 {
                turned.apply_in_place(mv);
            }
            assert_eq!(turned, state, "move {mv}");
        }
    }

    #[test]
    fn moves_keep_states_reachable() {
        // Piece views stay defined and the group invariants hold along an
        // arbitrary generator walk.
        let mut state = KilominxState::solved();
        for mv in parse_sequence("F U R2 Bs' L BD2 Us BR' D2' UL Fs2 B").unwrap() {
            state.apply_in_place(mv);
            let corners = state.corner_view().expect("corner pieces intact");
            let wings = state.wing_view().expect("wing pieces intact");
            assert!(permutation_is_even(&corners.perm));
            assert!(permutation_is_even(&wings.perm));
            assert_eq!(corners.ori.iter().map(|&o| u32::from(o)).sum::<u32>() % 3, 0);
        }
    }

    #[test]
    fn face_moves_preserve_pairing_and_slices_break_it() {
        let state = KilominxState::solved().after(&parse_sequence("F U2 R' BL BD2'").unwrap());
        assert!((0..30).all(|edge| state.edge_paired(edge)));

        let sliced = state.apply("Us".parse().unwrap());
        assert!((0..30).any(|edge| !sliced.edge_paired(edge)));
    }

    #[test]
    fn sequences_undo_through_their_inverse() {
        let moves = parse_sequence("F U R2 Bs' L BD2 Us").unwrap();
        let state = KilominxState::solved().after(&moves);
        let back = state.after(&sequence_inverse(&moves));
        assert_eq!(back, KilominxState::solved());
    }
}
