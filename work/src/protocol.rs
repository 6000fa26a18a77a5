//! Messages exchanged between the coordinator and its lanes.
//!
//! Every update and every reply carries the [`RoundId`] it belongs to, so a
//! reply that arrives after its round was settled can be recognised and
//! dropped.

use std::fmt;

use nanpow_kernel::{CalculateArgs, KernelError, KernelModule};
use nanpow_types::{HashWords, SeedPair, WorkNonce};

use crate::partition::Block;

/// Identity of a lane within its pool, `0..lanes`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LaneId(pub usize);

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lane {}", self.0)
    }
}

/// Monotonic round counter, starting at 1 for a pool's first round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoundId(pub u64);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round {}", self.0)
    }
}

/// Coordinator → lane.
#[derive(Debug)]
pub enum LaneRequest {
    Init { module: KernelModule },
    Update(UpdateRequest),
}

/// One block of one round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpdateRequest {
    pub round: RoundId,
    pub difficulty: u32,
    pub seeds: SeedPair,
    pub words: HashWords,
    pub block: Block,
}

impl UpdateRequest {
    pub fn calculate_args(&self) -> CalculateArgs {
        CalculateArgs::new(
            self.block.offset_x,
            self.block.offset_y,
            self.block.size,
            self.difficulty,
            self.seeds,
            self.words,
        )
    }
}

/// Lane → coordinator.
#[derive(Debug)]
pub enum LaneResponse {
    InitDone {
        lane: LaneId,
    },
    InitFailed {
        lane: LaneId,
        error: KernelError,
    },
    UpdateDone {
        lane: LaneId,
        round: RoundId,
        outcome: LaneOutcome,
    },
}

/// What a lane made of its block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaneOutcome {
    Found(WorkNonce),
    NotFound,
    /// The round was already settled when the update was dequeued.
    Cancelled,
    /// The kernel trapped or panicked, here or on an earlier update. The
    /// lane exits once its queue is drained.
    Failed(String),
}
