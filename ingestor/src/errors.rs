use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    #[error("Payload decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Storage setup error: {0}")]
    StorageSetup(#[source] sqlx::Error),

    #[error("Storage write error for device {device_id}: {source}")]
    StorageWrite {
        device_id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Storage read error: {0}")]
    StorageRead(#[source] sqlx::Error),

    #[error("Failed to load template {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Render error: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
