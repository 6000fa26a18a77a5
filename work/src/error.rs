use thiserror::Error;

use nanpow_kernel::KernelError;
use nanpow_types::InputError;

use crate::protocol::LaneId;

#[derive(Debug, Error)]
pub enum WorkError {
    #[error("kernel load failed: {0}")]
    Load(#[from] KernelError),

    #[error("invalid input: {0}")]
    Input(#[from] InputError),

    #[error("{lane} failed to initialise: {reason}")]
    LaneInit { lane: LaneId, reason: String },

    #[error("could not spawn {lane}: {reason}")]
    Spawn { lane: LaneId, reason: String },

    #[error("lane pool closed")]
    PoolClosed,

    #[error("config error: {0}")]
    Config(String),
}
