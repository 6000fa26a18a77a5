//! The round coordinator.
//!
//! A [`WorkPool`] owns one lazily started [`LanePool`] and drives it through
//! rounds: fresh seeds, one block per lane, then wait. The first lane to
//! report a nonce settles the round; if every lane comes back empty the next
//! round starts straight away with new seeds.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use nanpow_kernel::KernelSource;
use nanpow_types::{BlockHash, HashWords, WorkNonce};

use crate::config::WorkConfig;
use crate::lane::CancelWatermark;
use crate::partition::Grid;
use crate::pool::{LanePool, PoolState};
use crate::protocol::{LaneId, LaneOutcome, LaneResponse, RoundId, UpdateRequest};
use crate::seed::{OsSeedSource, SeedSource};
use crate::spawner::LaneSpawner;
use crate::WorkError;

/// How a round ended.
#[derive(Debug)]
enum RoundOutcome {
    Found(WorkNonce),
    Exhausted,
    TimedOut,
}

/// Settles its round on drop, including when the caller abandons the call
/// mid-round. Lanes then skip whatever is still queued for it.
struct RoundGuard<'a> {
    watermark: &'a CancelWatermark,
    round: RoundId,
}

impl Drop for RoundGuard<'_> {
    fn drop(&mut self) {
        self.watermark.cancel_through(self.round);
    }
}

/// A proof-of-work context: lane pool, kernel and round state.
///
/// Build one and share it by reference. Concurrent calls queue behind each
/// other; only one round runs at a time.
pub struct WorkPool {
    grid: Grid,
    kernel: KernelSource,
    spawner: Arc<dyn LaneSpawner>,
    seeds: Arc<dyn SeedSource>,
    round_timeout: Option<Duration>,
    watermark: Arc<CancelWatermark>,
    next_round: AtomicU64,
    pool: OnceCell<LanePool>,
}

impl WorkPool {
    pub fn new(config: &WorkConfig) -> Result<Self, WorkError> {
        config.validate()?;
        Ok(Self {
            grid: Grid::for_lanes(config.lanes)?,
            kernel: config.kernel_source(),
            spawner: config.spawner.build(),
            seeds: Arc::new(OsSeedSource),
            round_timeout: config.round_timeout(),
            watermark: Arc::new(CancelWatermark::new()),
            next_round: AtomicU64::new(0),
            pool: OnceCell::new(),
        })
    }

    /// Replace the kernel. Only effective before the pool has started.
    pub fn with_kernel(mut self, kernel: impl Into<KernelSource>) -> Self {
        self.kernel = kernel.into();
        self
    }

    pub fn with_spawner(mut self, spawner: Arc<dyn LaneSpawner>) -> Self {
        self.spawner = spawner;
        self
    }

    pub fn with_seed_source(mut self, seeds: Arc<dyn SeedSource>) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn with_round_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.round_timeout = timeout;
        self
    }

    pub fn lanes(&self) -> usize {
        self.grid.lanes()
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn is_ready(&self) -> bool {
        self.pool.initialized()
    }

    /// Number of rounds dispatched over the lifetime of this context.
    pub fn rounds_started(&self) -> u64 {
        self.next_round.load(Ordering::Acquire)
    }

    /// Load the kernel and start every lane, once.
    ///
    /// Concurrent callers share a single start-up. On failure nothing is
    /// stored and a later call tries again from scratch.
    pub async fn ensure_ready(&self) -> Result<&LanePool, WorkError> {
        self.pool
            .get_or_try_init(|| async {
                let module = self.kernel.load()?;
                debug!(kernel = module.name(), lanes = self.lanes(), "kernel loaded");
                LanePool::start(
                    module,
                    self.lanes(),
                    Arc::clone(&self.spawner),
                    Arc::clone(&self.watermark),
                )
                .await
            })
            .await
    }

    /// Search for a nonce whose work value over `hash` beats `difficulty`.
    ///
    /// Runs rounds until one succeeds; there is no round limit. Wrap the
    /// future in [`tokio::time::timeout`] for a deadline.
    pub async fn compute_proof_of_work(
        &self,
        hash: &[u8],
        difficulty: u32,
    ) -> Result<WorkNonce, WorkError> {
        let hash = BlockHash::from_slice(hash)?;
        let pool = self.ensure_ready().await?;
        let mut state = pool.lock().await;
        let words = hash.kernel_words();

        loop {
            pool.replace_dead_lanes(&mut state).await?;

            let round = RoundId(self.next_round.fetch_add(1, Ordering::AcqRel) + 1);
            let _settle = RoundGuard {
                watermark: &self.watermark,
                round,
            };
            let dispatched = self.dispatch_round(pool, &mut state, round, difficulty, words);

            match self.await_round(&mut state, round, dispatched).await? {
                RoundOutcome::Found(nonce) => {
                    info!(%hash, %round, %nonce, "proof of work found");
                    return Ok(nonce);
                }
                RoundOutcome::Exhausted => debug!(%round, "round exhausted"),
                RoundOutcome::TimedOut => warn!(%round, "round timed out"),
            }
        }
    }

    /// Hand one block to every lane; returns how many lanes took theirs.
    fn dispatch_round(
        &self,
        pool: &LanePool,
        state: &mut PoolState,
        round: RoundId,
        difficulty: u32,
        words: HashWords,
    ) -> usize {
        let seeds = self.seeds.next_pair();
        debug!(%round, ?seeds, difficulty, "dispatching round");

        let mut dispatched = 0;
        for (index, block) in self.grid.blocks().into_iter().enumerate() {
            let update = UpdateRequest {
                round,
                difficulty,
                seeds,
                words,
                block,
            };
            if pool.dispatch(state, LaneId(index), update) {
                dispatched += 1;
            }
        }
        dispatched
    }

    async fn await_round(
        &self,
        state: &mut PoolState,
        round: RoundId,
        mut pending: usize,
    ) -> Result<RoundOutcome, WorkError> {
        let deadline = self.round_timeout.map(|timeout| Instant::now() + timeout);

        while pending > 0 {
            let response = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, state.recv()).await {
                    Ok(response) => response?,
                    Err(_) => return Ok(RoundOutcome::TimedOut),
                },
                None => state.recv().await?,
            };

            let (lane, response_round, outcome) = match response {
                LaneResponse::UpdateDone {
                    lane,
                    round,
                    outcome,
                } => (lane, round, outcome),
                other => {
                    trace!(?other, "unexpected init response dropped");
                    continue;
                }
            };

            if let LaneOutcome::Failed(message) = &outcome {
                warn!(%lane, round = %response_round, %message, "lane failed");
                state.mark_failed(lane);
            }
            if response_round != round {
                trace!(%lane, stale = %response_round, current = %round, "stale response dropped");
                continue;
            }

            match outcome {
                LaneOutcome::Found(nonce) => return Ok(RoundOutcome::Found(nonce)),
                LaneOutcome::NotFound | LaneOutcome::Cancelled | LaneOutcome::Failed(_) => {
                    pending -= 1;
                }
            }
        }

        Ok(RoundOutcome::Exhausted)
    }
}

impl std::fmt::Debug for WorkPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkPool")
            .field("grid", &self.grid)
            .field("kernel", &self.kernel)
            .field("spawner", &self.spawner.name())
            .field("round_timeout", &self.round_timeout)
            .field("ready", &self.is_ready())
            .finish()
    }
}
