use std::time::Duration;

use async_channel::Sender;
use fleet_core::UpdateMessage;
use futures::{Stream, StreamExt};
use snafu::ResultExt;
use tokio_util::sync::CancellationToken;
use tracing::{Level, event, instrument};

use crate::{
    decoder::decode,
    error::{
        Result,
        error::{SendSnafu, StreamClosedSnafu},
    },
    models::RawEvent,
};

const YIELD_EVERY_N_EVENTS: u64 = 256;

pub struct Consumer {
    commit_interval: Duration,
}

impl Consumer {
    pub fn new(commit_interval: Duration) -> Consumer {
        Consumer { commit_interval }
    }

    /// Decodes the events of `source` and sends everything that arrived within one commit
    /// interval as a single [UpdateMessage].
    ///
    /// Buffered events are always flushed before returning. Cancellation ends the loop
    /// with `Ok`, a source that runs dry is reported as [crate::error::Error::StreamClosed].
    pub async fn run(
        &self,
        mut source: impl Stream<Item = RawEvent> + Unpin,
        sender: Sender<UpdateMessage>,
        cancellation: CancellationToken,
    ) -> Result<()> {
        // Grows to the largest number of events seen within a single commit interval.
        let mut buffer = Vec::new();
        let mut received_events: u64 = 0;

        let mut interval = tokio::time::interval(self.commit_interval);

        loop {
            // The tick is polled before the source so a source that is always ready
            // still gets committed once per interval.
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => {
                    process_events(buffer.drain(..), &sender).await?;
                    event!(Level::INFO, "event consumer cancelled");
                    return Ok(());
                }
                _ = interval.tick() => {
                    if !buffer.is_empty() {
                        process_events(buffer.drain(..), &sender).await?;
                    }
                }
                received = source.next() => {
                    match received {
                        Some(received) => {
                            buffer.push(received);
                            received_events += 1;
                            // Lets the timer driver run while the source never returns pending.
                            if received_events.is_multiple_of(YIELD_EVERY_N_EVENTS) {
                                tokio::task::yield_now().await;
                            }
                        }
                        None => {
                            process_events(buffer.drain(..), &sender).await?;
                            return StreamClosedSnafu.fail();
                        }
                    }
                }
            }
        }
    }
}

#[instrument(skip_all, fields(app.num_events, app.num_updates, app.failed_batches))]
async fn process_events<T>(events: T, sender: &Sender<UpdateMessage>) -> Result<()>
where
    T: IntoIterator<Item = RawEvent>,
{
    let mut message = UpdateMessage::default();
    let mut num_events = 0;
    let mut failed_batches = 0;

    for raw in events {
        num_events += 1;
        match decode(&raw.name, &raw.data) {
            Ok(decoded) => {
                if !decoded.batch.is_empty() || decoded.skipped > 0 {
                    message.batches.push(decoded);
                }
            }
            Err(e) => {
                failed_batches += 1;
                event!(Level::ERROR, "failed to decode '{}' event: {e:?}", raw.name);
            }
        }
    }

    let span = tracing::Span::current();
    span.record("app.num_events", num_events);
    span.record("app.num_updates", message.num_updates());
    span.record("app.failed_batches", failed_batches);

    if message.batches.is_empty() {
        return Ok(());
    }

    // Can only fail if the store has stopped consuming.
    sender.send(message).await.context(SendSnafu)?;

    Ok(())
}
