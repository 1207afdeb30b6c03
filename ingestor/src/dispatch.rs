use crate::clock::TimestampAssigner;
use crate::db::Store;
use crate::decode::decode;
use crate::metrics::{DECODE_FAILURES_TOTAL, MESSAGES_TOTAL, STORED_READINGS_TOTAL};
use tracing::{debug, error, info, warn};

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Persisted under the given row id.
    Stored(i64),
    /// Payload could not be decoded; nothing was written.
    Rejected,
    /// Decoded, but the insert failed; nothing was written.
    Failed,
}

/// Per-message handler wiring decode, timestamping and the store together.
///
/// Holds its collaborators explicitly so the transport only needs a clone.
#[derive(Clone)]
pub struct Dispatcher {
    store: Store,
    assigner: TimestampAssigner,
}

impl Dispatcher {
    pub fn new(store: Store, assigner: TimestampAssigner) -> Self {
        Self { store, assigner }
    }

    pub fn on_connect(&self) {
        info!("Connected to MQTT broker");
    }

    pub fn on_connection_lost(&self, reason: &dyn std::fmt::Display) {
        warn!("Connection to MQTT broker lost: {}", reason);
    }

    /// Handle one delivered message. Never returns an error to the transport.
    pub async fn on_message(&self, topic: &str, payload: &[u8]) -> Outcome {
        MESSAGES_TOTAL.inc();
        debug!(
            "Received message on topic {}: {}",
            topic,
            String::from_utf8_lossy(payload)
        );

        let reading = match decode(payload) {
            Ok(reading) => reading,
            Err(e) => {
                DECODE_FAILURES_TOTAL.inc();
                warn!("Dropping message from topic {}: {}", topic, e);
                return Outcome::Rejected;
            }
        };

        let stored = reading.stamp(self.assigner.assign());
        match self.store.insert(&stored).await {
            Ok(id) => {
                STORED_READINGS_TOTAL.inc();
                debug!(
                    "Stored reading {} from {} (temperature={}, humidity={}, pressure={})",
                    id, stored.device_id, stored.temperature, stored.humidity, stored.pressure
                );
                Outcome::Stored(id)
            }
            Err(e) => {
                error!(
                    "Dropping reading from device {} on topic {}: {}",
                    stored.device_id, topic, e
                );
                Outcome::Failed
            }
        }
    }
}
