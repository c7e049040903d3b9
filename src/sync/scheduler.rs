use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::orchestrator::SyncOrchestrator;

/// Spawns the periodic sync loop. The first tick fires immediately, which
/// doubles as the startup sync; after that the loop runs once per interval
/// until the token is cancelled.
pub fn start_sync_scheduler(
    orchestrator: Arc<SyncOrchestrator>,
    interval_seconds: u64,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Sync scheduler stopped");
                    break;
                }
                _ = interval.tick() => {
                    orchestrator.clone().sync_all(cancel.child_token()).await;
                }
            }
        }
    })
}
