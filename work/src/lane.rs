//! The lane entry point: one private kernel and a message loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace, warn};

use nanpow_kernel::{Kernel, KernelError};

use crate::protocol::{LaneId, LaneOutcome, LaneRequest, LaneResponse, RoundId, UpdateRequest};
use crate::transform::derive_nonce;

/// Highest round that has been settled. Lanes skip queued updates at or
/// below it instead of running the kernel for nothing.
#[derive(Debug, Default)]
pub struct CancelWatermark(AtomicU64);

impl CancelWatermark {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_through(&self, round: RoundId) {
        self.0.fetch_max(round.0, Ordering::AcqRel);
    }

    pub fn is_cancelled(&self, round: RoundId) -> bool {
        round.0 <= self.0.load(Ordering::Acquire)
    }
}

/// Everything a lane needs to run, handed to a
/// [`LaneSpawner`](crate::spawner::LaneSpawner) to execute.
pub struct LaneBody {
    lane: LaneId,
    requests: UnboundedReceiver<LaneRequest>,
    responses: UnboundedSender<LaneResponse>,
    watermark: Arc<CancelWatermark>,
}

impl LaneBody {
    pub fn new(
        lane: LaneId,
        requests: UnboundedReceiver<LaneRequest>,
        responses: UnboundedSender<LaneResponse>,
        watermark: Arc<CancelWatermark>,
    ) -> Self {
        Self {
            lane,
            requests,
            responses,
            watermark,
        }
    }

    pub fn lane(&self) -> LaneId {
        self.lane
    }

    /// Run the message loop until the request channel closes, the response
    /// channel closes, or the kernel fails.
    ///
    /// After a failure the lane closes its request channel, answers every
    /// update still queued with `Failed`, and exits. Nothing sent to it is
    /// left without a reply.
    ///
    /// Blocks the calling thread; must not run on an async worker thread.
    pub fn run(mut self) {
        let lane = self.lane;
        let mut kernel: Option<Box<dyn Kernel>> = None;
        debug!(%lane, "lane started");

        while let Some(request) = self.requests.blocking_recv() {
            match request {
                LaneRequest::Init { module } => {
                    match catch_kernel_panic(|| module.instantiate()) {
                        Ok(instance) => {
                            kernel = Some(instance);
                            if !self.reply(LaneResponse::InitDone { lane }) {
                                break;
                            }
                        }
                        Err(error) => {
                            warn!(%lane, %error, "kernel instantiation failed");
                            self.reply(LaneResponse::InitFailed { lane, error });
                            break;
                        }
                    }
                }
                LaneRequest::Update(update) => {
                    let outcome = match kernel.as_deref_mut() {
                        None => LaneOutcome::Failed("update received before init".to_string()),
                        Some(_) if self.watermark.is_cancelled(update.round) => {
                            LaneOutcome::Cancelled
                        }
                        Some(instance) => search(instance, &update),
                    };
                    trace!(%lane, round = %update.round, ?outcome, "block searched");
                    let failed = matches!(outcome, LaneOutcome::Failed(_));
                    let delivered = self.reply(LaneResponse::UpdateDone {
                        lane,
                        round: update.round,
                        outcome,
                    });
                    if !delivered {
                        break;
                    }
                    if failed {
                        self.drain_after_failure();
                        break;
                    }
                }
            }
        }

        debug!(%lane, "lane stopped");
    }

    fn drain_after_failure(&mut self) {
        let lane = self.lane;
        self.requests.close();
        while let Ok(request) = self.requests.try_recv() {
            if let LaneRequest::Update(update) = request {
                let delivered = self.reply(LaneResponse::UpdateDone {
                    lane,
                    round: update.round,
                    outcome: LaneOutcome::Failed("lane stopped after a kernel failure".to_string()),
                });
                if !delivered {
                    return;
                }
            }
        }
    }

    fn reply(&self, response: LaneResponse) -> bool {
        self.responses.send(response).is_ok()
    }
}

fn search(kernel: &mut dyn Kernel, update: &UpdateRequest) -> LaneOutcome {
    let args = update.calculate_args();
    match catch_kernel_panic(|| kernel.calculate(&args)) {
        Ok(0) => LaneOutcome::NotFound,
        Ok(word) => LaneOutcome::Found(derive_nonce(word, update.seeds)),
        Err(error) => LaneOutcome::Failed(error.to_string()),
    }
}

fn catch_kernel_panic<T>(f: impl FnOnce() -> Result<T, KernelError>) -> Result<T, KernelError> {
    panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(KernelError::Trap(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("kernel panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("kernel panicked: {s}")
    } else {
        "kernel panicked".to_string()
    }
}
