//! Stage A: center alignment.
//!
//! Centers are color-fixed before the solver ever runs (the validator
//! requires uniform, unique center blocks), so this stage is a local
//! per-face search: for each face it reads the 5-petal center block in
//! each of the five candidate rotations and seats the first reading under
//! which the block is uniform. A candidate rotation relabels the face's
//! own petal ring and nothing else — petals never leave their face, so
//! the search cannot move a sticker of any other face and faces do not
//! interact. Relabeling a block is not a twist, so the stage contributes
//! no moves to the solution; on validated input the zero rotation already
//! reads uniform. A block no rotation can make uniform is an internal
//! invariant violation.

use crate::{SolveError, StageBudget};
use kilominx_core::topology::{FACELETS_PER_FACE, PETAL_RING, facelet};
use kilominx_core::{ColorLabel, Face, KilominxState, Move};
use log::error;

const PETALS: usize = FACELETS_PER_FACE - PETAL_RING;

/// The face's center block read with its ring rotated by `clicks`: entry
/// `p` is the color that would sit at petal position `p` after seating.
fn rotated_block(state: &KilominxState, face: Face, clicks: usize) -> [ColorLabel; PETALS] {
    std::array::from_fn(|p| state.color_at(facelet(face, PETAL_RING + (p + clicks) % PETALS)))
}

fn block_uniform(block: &[ColorLabel; PETALS]) -> bool {
    block.iter().all(|&color| color == block[0])
}

/// Write a block onto the face's petal ring, touching no other facelet.
fn seat_block(state: &KilominxState, face: Face, block: [ColorLabel; PETALS]) -> KilominxState {
    let mut labels = *state.facelets();
    for (p, color) in block.into_iter().enumerate() {
        labels[facelet(face, PETAL_RING + p)] = color;
    }
    KilominxState::from_facelets(labels)
}

pub(crate) fn align_centers(
    state: &KilominxState,
    budget: &mut StageBudget<'_>,
) -> Result<(KilominxState, Vec<Move>), SolveError> {
    let mut state = *state;
    for face in Face::ALL {
        let mut aligned = false;
        for clicks in 0..PETALS {
            budget.tick()?;
            let block = rotated_block(&state, face, clicks);
            if block_uniform(&block) {
                if clicks != 0 {
                    state = seat_block(&state, face, block);
                }
                aligned = true;
                break;
            }
        }
        if !aligned {
            error!("center block of {face} cannot be aligned by any rotation");
            return Err(SolveError::SolveVerificationFailed);
        }
    }
    Ok((state, Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::{align_centers, rotated_block, seat_block};
    use crate::{SolveError, SolverConfig, Stage, StageBudget};
    use kilominx_core::moves::parse_sequence;
    use kilominx_core::topology::{FACELET_COUNT, PETAL_RING, facelet};
    use kilominx_core::{ColorLabel, Face, KilominxState};

    #[test]
    fn validated_states_need_no_center_moves() {
        let config = SolverConfig::default();
        let scrambled = KilominxState::solved().after(&parse_sequence("F U R2 Bs' L").unwrap());
        let mut budget = StageBudget::new(&config, Stage::Centers);
        let (aligned, moves) = align_centers(&scrambled, &mut budget).unwrap();
        assert!(moves.is_empty());
        assert_eq!(aligned, scrambled);
    }

    #[test]
    fn seating_a_block_touches_only_its_petal_ring() {
        // Five distinct petal colors make every rotation distinguishable.
        let mut labels = *KilominxState::solved().facelets();
        for p in 0..5 {
            labels[facelet(Face::R, PETAL_RING + p)] = ColorLabel::from_index(p);
        }
        let synthetic = KilominxState::from_facelets(labels);
        let rotated = rotated_block(&synthetic, Face::R, 2);
        assert_ne!(rotated, rotated_block(&synthetic, Face::R, 0));
        assert_eq!(
            rotated_block(&synthetic, Face::R, 5),
            rotated_block(&synthetic, Face::R, 0)
        );
        let seated = seat_block(&synthetic, Face::R, rotated);
        assert_eq!(
            seated.color_at(facelet(Face::R, PETAL_RING)),
            ColorLabel::from_index(2)
        );
        let ring = facelet(Face::R, PETAL_RING)..facelet(Face::R, PETAL_RING) + 5;
        for i in (0..FACELET_COUNT).filter(|i| !ring.contains(i)) {
            assert_eq!(seated.color_at(i), synthetic.color_at(i), "facelet {i}");
        }
    }

    #[test]
    fn synthetic_blocks_align_in_place_or_are_rejected() {
        let config = SolverConfig::default();

        // Swapping two faces' center colors wholesale bypasses the
        // validator, yet every block still reads uniform in each of its
        // rotations: aligning must succeed without disturbing a single
        // facelet of any face and without emitting moves.
        let mut labels = *KilominxState::solved().facelets();
        for p in 0..5 {
            let f = facelet(Face::F, PETAL_RING + p);
            let b = facelet(Face::B, PETAL_RING + p);
            labels.swap(f, b);
        }
        let synthetic = KilominxState::from_facelets(labels);
        let mut budget = StageBudget::new(&config, Stage::Centers);
        let (aligned, moves) = align_centers(&synthetic, &mut budget).unwrap();
        assert!(moves.is_empty());
        assert_eq!(aligned, synthetic);

        // A stray petal color reads non-uniform in all five rotations:
        // the search walks the full candidate set and reports the broken
        // invariant rather than repairing it.
        let mut labels = *KilominxState::solved().facelets();
        labels[facelet(Face::F, PETAL_RING + 3)] = ColorLabel::Green;
        let broken = KilominxState::from_facelets(labels);
        let mut budget = StageBudget::new(&config, Stage::Centers);
        assert_eq!(
            align_centers(&broken, &mut budget),
            Err(SolveError::SolveVerificationFailed)
        );
    }
}
