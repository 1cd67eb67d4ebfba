use std::sync::Arc;

use analytics_core::errors::Result;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::activity::ActivityNotification;
use crate::event::map_activity;
use crate::signature::SignatureVerifier;
use crate::sink::EventSink;

/// Outcome of relaying one notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub emitted: usize,
    pub failed: usize,
}

/// Verifies, decodes and forwards activity notifications.
#[derive(Clone)]
pub struct Relay {
    verifier: SignatureVerifier,
    sink: Arc<dyn EventSink>,
}

impl Relay {
    pub fn new(verifier: SignatureVerifier, sink: Arc<dyn EventSink>) -> Self {
        Self { verifier, sink }
    }

    /// Relays a raw notification body.
    ///
    /// Nothing is decoded or emitted unless the signature matches. Sink
    /// failures are logged per event and do not stop the rest of the batch.
    pub async fn relay(&self, body: &[u8], signature: Option<&str>) -> Result<RelayReport> {
        if let Err(err) = self.verifier.verify(body, signature) {
            warn!("rejected webhook with invalid signature");
            return Err(err);
        }

        let notification = ActivityNotification::decode(body)?;
        let metadata = notification.metadata();
        let events: Vec<_> = notification
            .records()
            .iter()
            .map(|record| map_activity(record, &metadata))
            .collect();

        debug!(
            notification = %metadata.notification_id,
            records = events.len(),
            "relaying activity"
        );

        let outcomes = join_all(events.iter().map(|event| self.sink.capture(event))).await;

        let mut report = RelayReport::default();
        for (event, outcome) in events.iter().zip(outcomes) {
            match outcome {
                Ok(()) => report.emitted += 1,
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        transaction = %event.transaction_hash,
                        error = %err,
                        "failed to emit verification event"
                    );
                }
            }
        }

        info!(
            notification = %metadata.notification_id,
            emitted = report.emitted,
            failed = report.failed,
            "webhook relayed"
        );
        Ok(report)
    }
}
