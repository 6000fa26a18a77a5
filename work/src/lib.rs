//! Anti-spam proof-of-work search.
//!
//! A [`WorkPool`] keeps a fixed set of lanes, each holding a private kernel
//! instance, and searches for a nonce in rounds. Every round draws fresh
//! seeds and gives each lane one disjoint block of the candidate grid. The
//! first lane to find a qualifying candidate settles the round.
//!
//! ```no_run
//! # async fn demo() -> Result<(), nanpow_work::WorkError> {
//! use nanpow_work::{WorkConfig, WorkPool};
//!
//! let pool = WorkPool::new(&WorkConfig::default())?;
//! let nonce = pool.compute_proof_of_work(&[0x42; 32], 0xFFFF_0000).await?;
//! println!("{nonce}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod global;
pub mod lane;
pub mod partition;
pub mod pool;
pub mod protocol;
pub mod seed;
pub mod spawner;
pub mod transform;

pub use config::WorkConfig;
pub use coordinator::WorkPool;
pub use error::WorkError;
pub use global::{compute_proof_of_work, global};
pub use lane::{CancelWatermark, LaneBody};
pub use partition::{Block, Grid, MAX_LANES};
pub use pool::LanePool;
pub use protocol::{LaneId, LaneOutcome, LaneRequest, LaneResponse, RoundId, UpdateRequest};
pub use seed::{OsSeedSource, SeedSource};
pub use spawner::{BlockingTaskSpawner, LaneSpawner, SpawnerKind, ThreadSpawner};
pub use transform::derive_nonce;

pub use nanpow_kernel::{validate_work, work_value, KernelModule, KernelSource};
pub use nanpow_types::{BlockHash, SeedPair, WorkNonce};
