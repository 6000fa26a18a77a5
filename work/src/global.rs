//! Process-wide default context.

use std::sync::OnceLock;

use nanpow_types::WorkNonce;

use crate::config::WorkConfig;
use crate::coordinator::WorkPool;
use crate::WorkError;

static GLOBAL_POOL: OnceLock<WorkPool> = OnceLock::new();

/// The default [`WorkPool`]: 16 lanes on dedicated threads running the
/// built-in kernel. Built on first use; lanes start on the first call.
pub fn global() -> &'static WorkPool {
    GLOBAL_POOL.get_or_init(|| {
        let config = WorkConfig::default();
        // The default configuration always describes a valid grid.
        match WorkPool::new(&config) {
            Ok(pool) => pool,
            Err(e) => unreachable!("default work config rejected: {e}"),
        }
    })
}

/// [`WorkPool::compute_proof_of_work`] on the [`global`] pool.
pub async fn compute_proof_of_work(hash: &[u8], difficulty: u32) -> Result<WorkNonce, WorkError> {
    global().compute_proof_of_work(hash, difficulty).await
}
