use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;

use crate::AnalyticsError;
use crate::event::TrackingEvent;
use crate::forward::ForwardEvents;

/// Flush policy for the background forwarder.
#[derive(Debug, Clone, Copy)]
pub struct BatchConfig {
    /// Flush once this many events are buffered.
    pub max_size: usize,
    /// Flush a non-empty buffer after this long regardless of size.
    pub max_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Queues accepted events and forwards them in batches from a
/// background task. Enqueueing never blocks the request path.
pub struct EventBatcher {
    tx: UnboundedSender<TrackingEvent>,
    handle: JoinHandle<()>,
}

impl EventBatcher {
    /// Starts the background flush task.
    #[must_use]
    pub fn spawn(forwarder: Arc<dyn ForwardEvents>, config: BatchConfig) -> Self {
        let (tx, mut rx) = unbounded_channel::<TrackingEvent>();

        let handle = tokio::spawn(async move {
            let mut buffer: Vec<TrackingEvent> = Vec::with_capacity(config.max_size);
            // Armed when the buffer becomes non-empty; not reset by
            // later arrivals, so a steady trickle still flushes.
            let mut deadline = tokio::time::Instant::now();
            loop {
                let received = if buffer.is_empty() {
                    rx.recv().await
                } else {
                    tokio::select! {
                        received = rx.recv() => received,
                        () = tokio::time::sleep_until(deadline) => {
                            Self::flush(&*forwarder, &mut buffer).await;
                            continue;
                        }
                    }
                };

                match received {
                    Some(event) => {
                        if buffer.is_empty() {
                            deadline = tokio::time::Instant::now() + config.max_delay;
                        }
                        buffer.push(event);
                        if buffer.len() >= config.max_size {
                            Self::flush(&*forwarder, &mut buffer).await;
                        }
                    }
                    None => {
                        Self::flush(&*forwarder, &mut buffer).await;
                        break;
                    }
                }
            }
        });

        Self { tx, handle }
    }

    async fn flush(forwarder: &dyn ForwardEvents, buffer: &mut Vec<TrackingEvent>) {
        if buffer.is_empty() {
            return;
        }
        let batch = std::mem::take(buffer);
        log::debug!("Forwarding batch of {} events", batch.len());
        forwarder.forward(&batch).await;
    }

    /// Hands an event to the background task.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::PipelineClosed`] if the batcher has
    /// been shut down.
    pub fn enqueue(&self, event: TrackingEvent) -> Result<(), AnalyticsError> {
        self.tx
            .send(event)
            .map_err(|_| AnalyticsError::PipelineClosed)
    }

    /// Flushes whatever is buffered and stops the background task.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            log::error!("Batch task terminated abnormally: {e}");
        }
    }
}
