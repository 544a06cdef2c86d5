//! Consumer Task
//!
//! Runs the consumer loop on its own task until the shared token is cancelled.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::ingest::{Consumer, ConsumerError, MessageSource};

/// Spawns the consumer loop over `source`.
///
/// The returned handle resolves once the loop has stopped: after
/// cancellation, or after a fetch failure, which also cancels `cancel` so the
/// rest of the process shuts down with it.
pub fn spawn_consumer_task<S>(
    consumer: Consumer,
    mut source: S,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    S: MessageSource + 'static,
{
    tokio::spawn(async move {
        match consumer.run(&mut source, &cancel).await {
            Err(ConsumerError::Cancelled) | Ok(()) => info!("Consumer stopped"),
            Err(err) => {
                error!(error = %err, "Consumer stopped on fetch failure");
                cancel.cancel();
            }
        }
    })
}
