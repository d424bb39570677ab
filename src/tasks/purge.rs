//! Remote Purge Task
//!
//! Background task that periodically sweeps expired entries out of the
//! in-process remote store. Reads already ignore expired entries; the sweep
//! only reclaims their memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::remote::MemoryRemote;

/// Spawns a background task that periodically purges expired remote entries.
///
/// Returns the task's JoinHandle so it can be aborted during graceful shutdown.
///
/// # Example
/// ```ignore
/// let remote = Arc::new(MemoryRemote::new());
/// let purge_handle = spawn_remote_purge_task(remote.clone(), 1);
/// // Later, during shutdown:
/// purge_handle.abort();
/// ```
pub fn spawn_remote_purge_task(remote: Arc<MemoryRemote>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting remote purge task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = remote.purge_expired();
            if removed > 0 {
                info!("Remote purge: removed {} expired entries", removed);
            } else {
                debug!("Remote purge: no expired entries found");
            }
        }
    })
}
