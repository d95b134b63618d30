//! Search budgets and cooperative cancellation.

use crate::{SolveError, SolverConfig, Stage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Caller-supplied cancellation handle. Cloning shares the flag; the solver
/// checks it at every search-node boundary and returns
/// [`SolveError::Cancelled`] promptly once it is set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> CancelToken {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Wall-clock and node-count budget for one stage. Wall clock is only
/// sampled every few hundred nodes; the node counter and the cancel flag
/// are exact.
pub(crate) struct StageBudget<'a> {
    stage: Stage,
    cancel: &'a CancelToken,
    deadline: Instant,
    nodes_left: u64,
    ticks_until_clock_check: u32,
}

const CLOCK_CHECK_INTERVAL: u32 = 256;

impl<'a> StageBudget<'a> {
    pub(crate) fn new(config: &'a SolverConfig, stage: Stage) -> StageBudget<'a> {
        StageBudget {
            stage,
            cancel: &config.cancel,
            deadline: Instant::now() + config.max_stage_time(),
            nodes_left: config.max_search_nodes,
            ticks_until_clock_check: CLOCK_CHECK_INTERVAL,
        }
    }

    /// Account for one search node.
    ///
    /// # Errors
    ///
    /// [`SolveError::Cancelled`] once the token is set,
    /// [`SolveError::SolverTimeout`] once the stage's node or time budget
    /// is spent.
    pub(crate) fn tick(&mut self) -> Result<(), SolveError> {
        if self.cancel.is_cancelled() {
            return Err(SolveError::Cancelled);
        }
        if self.nodes_left == 0 {
            return Err(SolveError::SolverTimeout { stage: self.stage });
        }
        self.nodes_left -= 1;
        self.ticks_until_clock_check -= 1;
        if self.ticks_until_clock_check == 0 {
            self.ticks_until_clock_check = CLOCK_CHECK_INTERVAL;
            if Instant::now() >= self.deadline {
                return Err(SolveError::SolverTimeout { stage: self.stage });
            }
        }
        Ok(())
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }
}
