//! The staged reduction solver for the Master Kilominx.
//!
//! Solving runs as a fixed pipeline of pure stages, each taking the current
//! state and returning the state plus the move subsequence it emitted:
//! center alignment, edge pairing, 3-layer reduction, and a final replay
//! verification. Later stages rely on the invariant the stage before them
//! established, so the stages never interleave. All search is bounded by a
//! per-stage wall-clock and node budget and checks the caller's
//! cancellation token at every node; given the same input and budget the
//! solver is fully deterministic.

use kilominx_core::moves::MoveToken;
use kilominx_core::{KilominxState, Move};
use log::{debug, info};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

mod budget;
mod centers;
mod layers;
mod library;
mod pairing;
mod verify;

pub use budget::CancelToken;
pub(crate) use budget::StageBudget;

#[macro_export]
macro_rules! start {
    ($msg:expr) => {
        concat!("⏳ ", $msg)
    };
}

#[macro_export]
macro_rules! working {
    ($msg:expr) => {
        concat!("🛠  ", $msg)
    };
}

#[macro_export]
macro_rules! success {
    ($msg:expr) => {
        concat!("✅ ", $msg)
    };
}

/// The four solver stages, used in progress logs and timeout reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Centers,
    EdgePairing,
    Reduction,
    Verification,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Centers => "center orientation",
            Stage::EdgePairing => "edge pairing",
            Stage::Reduction => "3-layer reduction",
            Stage::Verification => "verification",
        })
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SolveError {
    /// The named stage spent its node or wall-clock budget without
    /// establishing its invariant. Retrying with a larger budget is
    /// reasonable.
    #[error("the {stage} stage exhausted its search budget")]
    SolverTimeout { stage: Stage },
    #[error("solve cancelled")]
    Cancelled,
    /// The replayed solution did not reach the solved state. This is an
    /// internal invariant violation; details are logged, the message stays
    /// generic.
    #[error("could not find a solution")]
    SolveVerificationFailed,
}

/// Solver budgets and the cancellation handle.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Wall-clock cap per stage, in milliseconds.
    pub max_stage_time_ms: u64,
    /// Depth cap for the bounded searches (edge pairing fallback and
    /// 3-layer insert search).
    pub max_search_depth: usize,
    /// Node cap per stage.
    pub max_search_nodes: u64,
    pub cancel: CancelToken,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            max_stage_time_ms: 30_000,
            max_search_depth: 6,
            max_search_nodes: 50_000_000,
            cancel: CancelToken::new(),
        }
    }
}

impl SolverConfig {
    pub(crate) fn max_stage_time(&self) -> Duration {
        Duration::from_millis(self.max_stage_time_ms)
    }
}

/// A complete, verified solution: the simplified move sequence plus where
/// each stage's contribution ends within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    moves: Vec<Move>,
    stage_ends: [usize; 4],
}

impl Solution {
    #[must_use]
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    #[must_use]
    pub fn tokens(&self) -> Vec<MoveToken> {
        self.moves.iter().map(|mv| mv.token()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The subsequence a stage contributed, after simplification.
    #[must_use]
    pub fn stage_moves(&self, stage: Stage) -> &[Move] {
        let (from, to) = match stage {
            Stage::Centers => (0, self.stage_ends[0]),
            Stage::EdgePairing => (self.stage_ends[0], self.stage_ends[1]),
            Stage::Reduction => (self.stage_ends[1], self.stage_ends[2]),
            Stage::Verification => (self.stage_ends[2], self.stage_ends[3]),
        };
        &self.moves[from..to]
    }
}

/// Concatenate the stage subsequences while cancelling redundant adjacent
/// moves, keeping track of where each stage's contribution ends. A
/// cancellation that reaches back across a stage boundary pulls that
/// boundary in with it.
fn simplify_staged(stages: &[Vec<Move>; 3]) -> (Vec<Move>, [usize; 4]) {
    let mut out: Vec<Move> = Vec::new();
    let mut ends = [0usize; 4];
    for (stage_index, stage_moves) in stages.iter().enumerate() {
        for &mv in stage_moves {
            match out.last() {
                Some(&last) if last.face() == mv.face() && last.layer() == mv.layer() => {
                    let clicks = (last.clicks() + mv.clicks()) % 5;
                    out.pop();
                    if clicks != 0 {
                        out.push(Move::new(mv.face(), mv.layer(), clicks));
                    }
                }
                _ => out.push(mv),
            }
            for end in ends.iter_mut().take(stage_index) {
                *end = (*end).min(out.len());
            }
        }
        ends[stage_index] = out.len();
    }
    ends[3] = out.len();
    (out, ends)
}

/// Solve a validated state.
///
/// Returns either a complete move sequence whose replay has been checked to
/// reach the solved state, or an error; never a partial solution.
///
/// # Errors
///
/// See [`SolveError`]. Validation problems cannot occur here: the input is
/// a typed state the validator (or the move engine) produced.
pub fn solve(input: &KilominxState, config: &SolverConfig) -> Result<Solution, SolveError> {
    let solve_start = Instant::now();
    info!(start!("Solving Master Kilominx state"));

    let stage_start = Instant::now();
    let mut budget = StageBudget::new(config, Stage::Centers);
    let (state, center_moves) = centers::align_centers(input, &mut budget)?;
    debug!(
        working!("centers aligned in {:.3}s ({} moves)"),
        stage_start.elapsed().as_secs_f64(),
        center_moves.len()
    );

    let stage_start = Instant::now();
    let mut budget = StageBudget::new(config, Stage::EdgePairing);
    let (state, pairing_moves) = pairing::pair_edges(&state, config, &mut budget)?;
    debug!(
        working!("edges paired in {:.3}s ({} moves)"),
        stage_start.elapsed().as_secs_f64(),
        pairing_moves.len()
    );

    let stage_start = Instant::now();
    let mut budget = StageBudget::new(config, Stage::Reduction);
    let (state, reduction_moves) = layers::solve_reduced(&state, config, &mut budget)?;
    debug!(
        working!("3-layer reduction solved in {:.3}s ({} moves)"),
        stage_start.elapsed().as_secs_f64(),
        reduction_moves.len()
    );
    debug_assert!(state.is_solved());

    let (moves, stage_ends) = simplify_staged(&[center_moves, pairing_moves, reduction_moves]);
    // Stage D replays the simplified sequence against the original input.
    verify::verify_solution(input, &moves, &config.cancel)?;

    info!(
        success!("solution of {} moves found in {:.3}s"),
        moves.len(),
        solve_start.elapsed().as_secs_f64()
    );
    Ok(Solution { moves, stage_ends })
}
