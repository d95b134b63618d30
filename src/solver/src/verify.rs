//! Stage D: replay verification.
//!
//! The concatenated, simplified solution is replayed against the original
//! input through the move engine. A mismatch means a solver bug: it is
//! logged with full detail and surfaced to the caller as a generic
//! failure, never silently ignored.

use crate::{CancelToken, SolveError};
use kilominx_core::moves::format_sequence;
use kilominx_core::{KilominxState, Move};
use log::error;

pub(crate) fn verify_solution(
    input: &KilominxState,
    moves: &[Move],
    cancel: &CancelToken,
) -> Result<(), SolveError> {
    if cancel.is_cancelled() {
        return Err(SolveError::Cancelled);
    }
    let replayed = input.after(moves);
    if replayed.is_solved() {
        return Ok(());
    }
    error!(
        "solution verification failed: replaying {} moves ({}) did not reach the solved state; \
         input facelets {:?}",
        moves.len(),
        format_sequence(moves),
        input.facelets()
    );
    Err(SolveError::SolveVerificationFailed)
}
