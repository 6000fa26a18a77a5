//! Lane execution contexts.
//!
//! The pool never creates threads itself. It hands a [`LaneBody`] to a
//! [`LaneSpawner`], which decides where the body's message loop runs. Both
//! implementations here give the pool the same contract: the loop runs until
//! its request channel closes.

use std::sync::Arc;
use std::thread;

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;

use crate::lane::LaneBody;
use crate::WorkError;

pub trait LaneSpawner: Send + Sync {
    fn name(&self) -> &'static str;

    fn spawn(&self, body: LaneBody) -> Result<(), WorkError>;
}

/// One dedicated, named OS thread per lane.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl LaneSpawner for ThreadSpawner {
    fn name(&self) -> &'static str {
        "thread"
    }

    fn spawn(&self, body: LaneBody) -> Result<(), WorkError> {
        let lane = body.lane();
        thread::Builder::new()
            .name(format!("nanpow-lane-{}", lane.0))
            .spawn(move || body.run())
            .map(|_| ())
            .map_err(|e| WorkError::Spawn {
                lane,
                reason: e.to_string(),
            })
    }
}

/// Lanes run as tokio blocking tasks on the runtime that was current when
/// the spawner was created (or, failing that, when a lane is spawned).
///
/// The runtime waits for blocking tasks on shutdown, so the pool that owns
/// these lanes must be dropped before the runtime is.
#[derive(Debug, Default, Clone)]
pub struct BlockingTaskSpawner {
    handle: Option<Handle>,
}

impl BlockingTaskSpawner {
    pub fn new() -> Self {
        Self {
            handle: Handle::try_current().ok(),
        }
    }

    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

impl LaneSpawner for BlockingTaskSpawner {
    fn name(&self) -> &'static str {
        "blocking"
    }

    fn spawn(&self, body: LaneBody) -> Result<(), WorkError> {
        let lane = body.lane();
        let handle = match &self.handle {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|e| WorkError::Spawn {
                lane,
                reason: e.to_string(),
            })?,
        };
        handle.spawn_blocking(move || body.run());
        Ok(())
    }
}

/// Which [`LaneSpawner`] a configured pool uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpawnerKind {
    #[default]
    Thread,
    Blocking,
}

impl SpawnerKind {
    pub fn build(self) -> Arc<dyn LaneSpawner> {
        match self {
            SpawnerKind::Thread => Arc::new(ThreadSpawner),
            SpawnerKind::Blocking => Arc::new(BlockingTaskSpawner::new()),
        }
    }
}

impl std::str::FromStr for SpawnerKind {
    type Err = WorkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "thread" => Ok(SpawnerKind::Thread),
            "blocking" => Ok(SpawnerKind::Blocking),
            other => Err(WorkError::Config(format!(
                "unknown spawner `{other}`, expected `thread` or `blocking`"
            ))),
        }
    }
}
