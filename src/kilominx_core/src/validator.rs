//! Solvability checking for candidate facelet-color assignments.
//!
//! The checks run in a fixed order — color counts, center blocks, piece
//! combinations, reachability parities — and report the first violation
//! with enough detail for a caller to highlight the offending stickers.
//! The validator never repairs a state; on success the caller gets a typed
//! [`KilominxState`] the solver will accept.

use crate::faces::{ColorLabel, Face};
use crate::state::{KilominxState, permutation_is_even};
use crate::topology::{
    CORNER_SLOTS, FACELET_COUNT, FACELETS_PER_COLOR, FACELETS_PER_FACE, PETAL_RING, WING_SLOTS,
    facelet, topology,
};
use std::fmt;
use thiserror::Error;

/// The parity that makes a structurally sound sticker arrangement
/// unreachable by legal moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParityViolation {
    CornerPermutationOdd,
    WingPermutationOdd,
    /// Sum of corner twists modulo 3; nonzero is the classic single
    /// twisted corner.
    CornerOrientationSum(u8),
}

impl fmt::Display for ParityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParityViolation::CornerPermutationOdd => f.write_str("corner permutation is odd"),
            ParityViolation::WingPermutationOdd => f.write_str("wing permutation is odd"),
            ParityViolation::CornerOrientationSum(sum) => {
                write!(f, "corner twists sum to {sum} (mod 3), expected 0")
            }
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "wrong color counts {counts:?}: each of the 12 colors must appear exactly {FACELETS_PER_COLOR} times"
    )]
    ColorCountMismatch { counts: Vec<(ColorLabel, usize)> },
    #[error("faces {faces:?} share the center color {color}")]
    DuplicateCenterColor { color: ColorLabel, faces: Vec<Face> },
    #[error(
        "facelets {facelets:?} show colors {colors:?}, which is not a piece any solved puzzle has"
    )]
    ImpossiblePieceColorCombination {
        facelets: Vec<usize>,
        colors: Vec<ColorLabel>,
    },
    #[error("state cannot be reached by any move sequence: {parity}")]
    UnreachableState { parity: ParityViolation },
}

fn impossible(facelets: Vec<usize>, labels: &[ColorLabel; FACELET_COUNT]) -> ValidationError {
    let colors = facelets.iter().map(|&i| labels[i]).collect();
    ValidationError::ImpossiblePieceColorCombination { facelets, colors }
}

/// Validate a full facelet-color assignment and promote it to a typed
/// state.
///
/// # Errors
///
/// The first failing check, per the order documented on this module.
pub fn validate(labels: &[ColorLabel; FACELET_COUNT]) -> Result<KilominxState, ValidationError> {
    let topo = topology();

    // 1. Every color exactly 20 times.
    let mut counts = [0usize; 12];
    for &label in labels {
        counts[label.index()] += 1;
    }
    let offenders: Vec<(ColorLabel, usize)> = counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count != FACELETS_PER_COLOR)
        .map(|(i, &count)| (ColorLabel::from_index(i), count))
        .collect();
    if !offenders.is_empty() {
        return Err(ValidationError::ColorCountMismatch { counts: offenders });
    }

    // 2. Center blocks: uniform per face (petals are pinned, so a mixed
    // block is itself an impossible piece), then unique across faces.
    // Centers define the color-to-face mapping everything below uses.
    let mut face_of_color: [Option<Face>; 12] = [None; 12];
    for face in Face::ALL {
        let petals: Vec<usize> = (0..FACELETS_PER_FACE - PETAL_RING)
            .map(|p| facelet(face, PETAL_RING + p))
            .collect();
        let color = labels[petals[0]];
        if petals.iter().any(|&p| labels[p] != color) {
            return Err(impossible(petals, labels));
        }
        if let Some(other) = face_of_color[color.index()] {
            return Err(ValidationError::DuplicateCenterColor {
                color,
                faces: vec![other, face],
            });
        }
        face_of_color[color.index()] = Some(face);
    }
    let homes = face_of_color.map(|f| f.expect("12 unique centers cover all 12 colors"));

    // 3. Every corner and wing must be a piece that exists on a solved
    // puzzle, each exactly once. A color triple in mirrored cyclic order is
    // just as impossible as a non-adjacent one.
    let mut corner_perm = [0u8; CORNER_SLOTS];
    let mut corner_ori = [0u8; CORNER_SLOTS];
    let mut corner_seen = [false; CORNER_SLOTS];
    for (slot_index, slot) in topo.corners().iter().enumerate() {
        let observed = slot.stickers.map(|s| homes[labels[s].index()]);
        let Some(home_index) = topo.corner_slot_by_faces(observed) else {
            return Err(impossible(slot.stickers.to_vec(), labels));
        };
        let home = &topo.corners()[home_index];
        let Some(rotation) =
            (0..3).find(|&r| (0..3).all(|j| observed[j] == home.faces[(j + r) % 3]))
        else {
            return Err(impossible(slot.stickers.to_vec(), labels));
        };
        if corner_seen[home_index] {
            return Err(impossible(slot.stickers.to_vec(), labels));
        }
        corner_seen[home_index] = true;
        corner_perm[slot_index] = home_index as u8;
        corner_ori[slot_index] = rotation as u8;
    }

    let mut wing_perm = [0u8; WING_SLOTS];
    let mut wing_seen = [false; WING_SLOTS];
    for (slot_index, slot) in topo.wings().iter().enumerate() {
        let outer_home = homes[labels[slot.outer].index()];
        let inner_home = homes[labels[slot.inner].index()];
        let Some(home_index) = topo.wing_slot_by_faces(outer_home, inner_home) else {
            return Err(impossible(vec![slot.outer, slot.inner], labels));
        };
        if wing_seen[home_index] {
            return Err(impossible(vec![slot.outer, slot.inner], labels));
        }
        wing_seen[home_index] = true;
        wing_perm[slot_index] = home_index as u8;
    }

    // 4. Group reachability: every generator is a product of 5-cycles, so
    // both permutations must be even, and face twists cancel corner twists
    // modulo 3.
    if !permutation_is_even(&corner_perm) {
        return Err(ValidationError::UnreachableState {
            parity: ParityViolation::CornerPermutationOdd,
        });
    }
    if !permutation_is_even(&wing_perm) {
        return Err(ValidationError::UnreachableState {
            parity: ParityViolation::WingPermutationOdd,
        });
    }
    let twist_sum = corner_ori.iter().map(|&o| u32::from(o)).sum::<u32>() % 3;
    if twist_sum != 0 {
        return Err(ValidationError::UnreachableState {
            parity: ParityViolation::CornerOrientationSum(twist_sum as u8),
        });
    }

    Ok(KilominxState::from_facelets(*labels))
}

#[cfg(test)]
mod tests {
    use super::{ParityViolation, ValidationError, validate};
    use crate::faces::{ColorLabel, Face};
    use crate::moves::parse_sequence;
    use crate::state::KilominxState;
    use crate::topology::{OUTER_WING_RING, PETAL_RING, facelet, topology};

    fn solved_labels() -> [ColorLabel; 240] {
        *KilominxState::solved().facelets()
    }

    #[test]
    fn accepts_solved_and_scrambled_states() {
        assert!(validate(&solved_labels()).is_ok());
        let scrambled =
            KilominxState::solved().after(&parse_sequence("F U R2 Bs' L BD2 Us BR'").unwrap());
        assert!(validate(scrambled.facelets()).is_ok());
    }

    #[test]
    fn rejects_wrong_color_counts() {
        let mut labels = solved_labels();
        labels[facelet(Face::F, 0)] = ColorLabel::Gray;
        let err = validate(&labels).unwrap_err();
        let ValidationError::ColorCountMismatch { counts } = err else {
            panic!("expected color count mismatch, got {err:?}");
        };
        assert!(counts.contains(&(ColorLabel::White, 19)));
        assert!(counts.contains(&(ColorLabel::Gray, 21)));
    }

    #[test]
    fn rejects_duplicate_center_colors() {
        let mut labels = solved_labels();
        // Recolor F's center block to U's color, and balance the counts by
        // recoloring U's outer wing ring to F's color.
        let f_color = labels[facelet(Face::F, PETAL_RING)];
        let u_color = labels[facelet(Face::U, PETAL_RING)];
        for p in 0..5 {
            labels[facelet(Face::F, PETAL_RING + p)] = u_color;
            labels[facelet(Face::U, OUTER_WING_RING + p)] = f_color;
        }
        let err = validate(&labels).unwrap_err();
        let ValidationError::DuplicateCenterColor { color, faces } = err else {
            panic!("expected duplicate center, got {err:?}");
        };
        assert_eq!(color, u_color);
        assert_eq!(faces, vec![Face::F, Face::U]);
    }

    #[test]
    fn rejects_mixed_center_block() {
        let mut labels = solved_labels();
        // Swap one F petal with one B petal: counts stay balanced but both
        // center blocks stop being uniform.
        let f_petal = facelet(Face::F, PETAL_RING);
        let b_petal = facelet(Face::B, PETAL_RING);
        labels.swap(f_petal, b_petal);
        let err = validate(&labels).unwrap_err();
        assert!(
            matches!(err, ValidationError::ImpossiblePieceColorCombination { .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn rejects_invented_corner_piece() {
        let mut labels = solved_labels();
        // Swap a corner sticker of the (F, R, U) vertex with one on B. The
        // resulting {B, R, U} triple is no vertex of the dodecahedron.
        let topo = topology();
        let frus = topo.corner_slot_by_faces([Face::F, Face::R, Face::U]).unwrap();
        let fru_on_f = topo.corners()[frus]
            .stickers
            .iter()
            .copied()
            .find(|&s| s / 20 == Face::F.index())
            .unwrap();
        labels.swap(fru_on_f, facelet(Face::B, 0));
        let err = validate(&labels).unwrap_err();
        assert!(
            matches!(err, ValidationError::ImpossiblePieceColorCombination { .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn rejects_single_twisted_corner() {
        let mut labels = solved_labels();
        let topo = topology();
        let slot = &topo.corners()[topo
            .corner_slot_by_faces([Face::F, Face::R, Face::U])
            .unwrap()];
        // Rotate the three stickers of one corner in place: still a real
        // piece, but the twist sum breaks.
        let held = labels[slot.stickers[0]];
        labels[slot.stickers[0]] = labels[slot.stickers[2]];
        labels[slot.stickers[2]] = labels[slot.stickers[1]];
        labels[slot.stickers[1]] = held;
        let err = validate(&labels).unwrap_err();
        let ValidationError::UnreachableState { parity } = err else {
            panic!("expected unreachable state, got {err:?}");
        };
        assert!(matches!(parity, ParityViolation::CornerOrientationSum(_)));
    }

    #[test]
    fn rejects_two_swapped_wings() {
        let mut labels = solved_labels();
        let topo = topology();
        // Exchange the wings of (F, R) and (F, U): both slots still show
        // real pieces, but a lone transposition is odd.
        let fr = &topo.wings()[topo.wing_slot_by_faces(Face::F, Face::R).unwrap()];
        let fu = &topo.wings()[topo.wing_slot_by_faces(Face::F, Face::U).unwrap()];
        labels.swap(fr.inner, fu.inner);
        let err = validate(&labels).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnreachableState {
                parity: ParityViolation::WingPermutationOdd,
            }
        );
    }

    #[test]
    fn rejects_two_swapped_corners() {
        let mut labels = solved_labels();
        let topo = topology();
        let a = &topo.corners()[topo
            .corner_slot_by_faces([Face::F, Face::R, Face::U])
            .unwrap()];
        let b = &topo.corners()[topo
            .corner_slot_by_faces([Face::F, Face::U, Face::L])
            .unwrap()];
        // Write each piece's colors into the other slot in matching cyclic
        // order, so both pieces stay legal and untwisted.
        let a_colors = a.stickers.map(|s| labels[s]);
        let b_colors = b.stickers.map(|s| labels[s]);
        for j in 0..3 {
            labels[a.stickers[j]] = b_colors[j];
            labels[b.stickers[j]] = a_colors[j];
        }
        let err = validate(&labels).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnreachableState {
                parity: ParityViolation::CornerPermutationOdd,
            }
        );
    }
}
