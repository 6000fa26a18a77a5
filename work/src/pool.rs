//! The lane pool: N persistent lanes sharing one response channel.
//!
//! Lanes are created once and reused for every round. The pool state sits
//! behind an async mutex so that only one round is in flight at a time; the
//! coordinator holds the lock for the whole of a call.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, trace, warn};

use nanpow_kernel::KernelModule;

use crate::lane::{CancelWatermark, LaneBody};
use crate::protocol::{LaneId, LaneOutcome, LaneRequest, LaneResponse, UpdateRequest};
use crate::spawner::LaneSpawner;
use crate::WorkError;

/// Request side of one live lane.
struct LaneHandle {
    requests: UnboundedSender<LaneRequest>,
    /// Set when the lane reported `Failed` or refused a send; its loop has
    /// exited or is draining.
    failed: bool,
}

impl LaneHandle {
    fn is_dead(&self) -> bool {
        self.failed || self.requests.is_closed()
    }
}

/// Mutable pool state, reachable only through [`LanePool::lock`].
pub struct PoolState {
    lanes: Vec<LaneHandle>,
    responses: UnboundedReceiver<LaneResponse>,
}

impl PoolState {
    /// Wait for the next lane response.
    pub async fn recv(&mut self) -> Result<LaneResponse, WorkError> {
        self.responses.recv().await.ok_or(WorkError::PoolClosed)
    }

    /// Record a lane failure so the lane is replaced before the next round.
    pub fn mark_failed(&mut self, lane: LaneId) {
        if let Some(handle) = self.lanes.get_mut(lane.0) {
            handle.failed = true;
        }
    }
}

pub struct LanePool {
    module: KernelModule,
    spawner: Arc<dyn LaneSpawner>,
    watermark: Arc<CancelWatermark>,
    responses_tx: UnboundedSender<LaneResponse>,
    state: Mutex<PoolState>,
}

impl LanePool {
    /// Spawn `lanes` lanes, initialise each with `module`, and wait until
    /// every one has reported ready.
    ///
    /// Nothing is kept on failure: the partially built lanes are shut down
    /// when their request channels drop with the returned error.
    pub async fn start(
        module: KernelModule,
        lanes: usize,
        spawner: Arc<dyn LaneSpawner>,
        watermark: Arc<CancelWatermark>,
    ) -> Result<Self, WorkError> {
        let (responses_tx, responses) = unbounded_channel();
        let mut pool = Self {
            module,
            spawner,
            watermark,
            responses_tx,
            state: Mutex::new(PoolState {
                lanes: Vec::with_capacity(lanes),
                responses,
            }),
        };

        let state = pool.state.get_mut();
        for index in 0..lanes {
            let handle = spawn_lane(
                LaneId(index),
                &pool.module,
                pool.spawner.as_ref(),
                &pool.responses_tx,
                &pool.watermark,
            )?;
            state.lanes.push(handle);
        }
        await_init(state, lanes).await?;

        info!(
            lanes,
            kernel = pool.module.name(),
            spawner = pool.spawner.name(),
            "lane pool ready"
        );
        Ok(pool)
    }

    /// Take exclusive use of the lanes for one call.
    pub async fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().await
    }

    /// Respawn every lane whose loop has exited, under the same [`LaneId`].
    pub async fn replace_dead_lanes(&self, state: &mut PoolState) -> Result<(), WorkError> {
        // Waiting on a replacement can surface failures of other lanes, so
        // rescan until a pass finds nothing.
        while let Some(index) = state.lanes.iter().position(LaneHandle::is_dead) {
            self.replace(state, LaneId(index)).await?;
        }
        Ok(())
    }

    /// Queue one block for a lane. Returns `false` when the lane has already
    /// shut its queue; it is then marked failed and gets no part of the round.
    ///
    /// Replacement waits for the next round so that responses of the round
    /// being dispatched are never consumed here.
    pub fn dispatch(&self, state: &mut PoolState, lane: LaneId, update: UpdateRequest) -> bool {
        let round = update.round;
        match state.lanes[lane.0].requests.send(LaneRequest::Update(update)) {
            Ok(()) => true,
            Err(_) => {
                warn!(%lane, %round, "lane closed before dispatch");
                state.mark_failed(lane);
                false
            }
        }
    }

    async fn replace(&self, state: &mut PoolState, lane: LaneId) -> Result<(), WorkError> {
        warn!(%lane, "replacing dead lane");
        let handle = spawn_lane(
            lane,
            &self.module,
            self.spawner.as_ref(),
            &self.responses_tx,
            &self.watermark,
        )?;
        // Dropping the old sender ends the old loop if it is still draining.
        state.lanes[lane.0] = handle;
        await_init(state, 1).await
    }
}

impl fmt::Debug for LanePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanePool")
            .field("kernel", &self.module.name())
            .field("spawner", &self.spawner.name())
            .finish()
    }
}

fn spawn_lane(
    lane: LaneId,
    module: &KernelModule,
    spawner: &dyn LaneSpawner,
    responses: &UnboundedSender<LaneResponse>,
    watermark: &Arc<CancelWatermark>,
) -> Result<LaneHandle, WorkError> {
    let (requests, requests_rx) = unbounded_channel();
    requests
        .send(LaneRequest::Init {
            module: module.clone(),
        })
        .map_err(|_| WorkError::PoolClosed)?;

    let body = LaneBody::new(lane, requests_rx, responses.clone(), Arc::clone(watermark));
    spawner.spawn(body)?;
    debug!(%lane, spawner = spawner.name(), "lane spawned");

    Ok(LaneHandle {
        requests,
        failed: false,
    })
}

/// Wait for `expected` `InitDone` replies. Update replies still queued from
/// earlier rounds are stale by now and dropped.
async fn await_init(state: &mut PoolState, expected: usize) -> Result<(), WorkError> {
    let mut ready = 0;
    while ready < expected {
        match state.recv().await? {
            LaneResponse::InitDone { lane } => {
                trace!(%lane, "lane initialised");
                ready += 1;
            }
            LaneResponse::InitFailed { lane, error } => {
                return Err(WorkError::LaneInit {
                    lane,
                    reason: error.to_string(),
                });
            }
            LaneResponse::UpdateDone {
                lane,
                round,
                outcome,
            } => {
                trace!(%lane, %round, "stale response dropped during init");
                if matches!(outcome, LaneOutcome::Failed(_)) {
                    state.mark_failed(lane);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use nanpow_kernel::{CalculateArgs, Kernel, KernelError, KernelFactory, BLOCK_SIZE};
    use nanpow_types::{BlockHash, SeedPair};

    use crate::partition::Block;
    use crate::protocol::RoundId;
    use crate::spawner::ThreadSpawner;

    /// Finds `0x0101_0304` in the first block and nothing elsewhere.
    struct FirstBlockKernel;

    impl Kernel for FirstBlockKernel {
        fn calculate(&mut self, args: &CalculateArgs) -> Result<u32, KernelError> {
            Ok(if args.block_offset_x == 0 && args.block_offset_y == 0 {
                0x0101_0304
            } else {
                0
            })
        }
    }

    struct FirstBlockFactory;

    impl KernelFactory for FirstBlockFactory {
        fn name(&self) -> &str {
            "first-block"
        }

        fn instantiate(&self) -> Result<Box<dyn Kernel>, KernelError> {
            Ok(Box::new(FirstBlockKernel))
        }
    }

    fn update(round: u64, offset_x: u32) -> UpdateRequest {
        UpdateRequest {
            round: RoundId(round),
            difficulty: 0,
            seeds: SeedPair::new([0x11, 0x22, 0x33, 0x44], [0xAA, 0xBB, 0xCC, 0xDD]),
            words: BlockHash::ZERO.kernel_words(),
            block: Block {
                offset_x,
                offset_y: 0,
                size: BLOCK_SIZE,
            },
        }
    }

    async fn two_lane_pool() -> LanePool {
        LanePool::start(
            KernelModule::from_factory(FirstBlockFactory),
            2,
            Arc::new(ThreadSpawner),
            Arc::new(CancelWatermark::new()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn closed_lane_is_skipped_without_losing_replies() {
        let pool = two_lane_pool().await;
        let mut state = pool.lock().await;

        assert!(pool.dispatch(&mut state, LaneId(0), update(1, 0)));
        // Let lane 0 answer before lane 1 turns out to be gone.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let (closed, _) = unbounded_channel();
        state.lanes[1].requests = closed;
        assert!(!pool.dispatch(&mut state, LaneId(1), update(1, BLOCK_SIZE)));

        let response = tokio::time::timeout(Duration::from_secs(5), state.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            response,
            LaneResponse::UpdateDone {
                lane: LaneId(0),
                round: RoundId(1),
                outcome: LaneOutcome::Found(_),
            }
        ));

        assert!(state.lanes[1].is_dead());
        pool.replace_dead_lanes(&mut state).await.unwrap();
        assert!(!state.lanes[1].is_dead());
        assert!(pool.dispatch(&mut state, LaneId(1), update(2, BLOCK_SIZE)));
        let response = state.recv().await.unwrap();
        assert!(matches!(
            response,
            LaneResponse::UpdateDone {
                lane: LaneId(1),
                round: RoundId(2),
                outcome: LaneOutcome::NotFound,
            }
        ));
    }

    #[tokio::test]
    async fn debug_names_kernel_and_spawner() {
        let pool = two_lane_pool().await;
        let text = format!("{pool:?}");
        assert!(text.contains("first-block"), "{text}");
        assert!(text.contains("thread"), "{text}");
    }
}
