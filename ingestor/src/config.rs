use anyhow::{bail, Context, Result};
use rumqttc::QoS;
use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub db_max_connections: u32,
    /// How long a write waits on SQLite's lock before giving up.
    pub db_busy_timeout: Duration,
    pub http_addr: String,
    pub template_path: PathBuf,
    /// Rows embedded in the dashboard page; `None` embeds all of them.
    pub dashboard_limit: Option<u32>,
    /// `None` when the transport is disabled.
    pub mqtt: Option<MqttConfig>,
}

#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub broker: String,
    pub port: u16,
    pub client_id: String,
    pub credentials: Option<(String, String)>,
    pub topic: String,
    pub qos: QoS,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let mqtt_enabled = parse_bool(&optional("MQTT_ENABLED", "false"))
            .context("MQTT_ENABLED must be true or false")?;

        let mqtt = if mqtt_enabled {
            let credentials = match (lookup("MQTT_USERNAME"), lookup("MQTT_PASSWORD")) {
                (Some(user), Some(pass)) => Some((user, pass)),
                (None, None) => None,
                _ => bail!("MQTT_USERNAME and MQTT_PASSWORD must be set together"),
            };
            let qos: u8 = optional("MQTT_QOS", "1")
                .parse()
                .context("MQTT_QOS must be 0, 1 or 2")?;

            Some(MqttConfig {
                broker: optional("MQTT_BROKER", "localhost"),
                port: optional("MQTT_PORT", "1883")
                    .parse()
                    .context("MQTT_PORT must be a valid port number")?,
                client_id: lookup("MQTT_CLIENT_ID")
                    .unwrap_or_else(|| format!("brokerding-{}", uuid::Uuid::new_v4())),
                credentials,
                topic: optional("MQTT_TOPIC", "hello"),
                qos: parse_qos(qos)?,
            })
        } else {
            None
        };

        let dashboard_limit = match lookup("DASHBOARD_LIMIT") {
            Some(raw) => Some(
                raw.parse()
                    .context("DASHBOARD_LIMIT must be a positive integer")?,
            ),
            None => None,
        };

        Ok(Self {
            database_path: PathBuf::from(optional("DATABASE_PATH", "sensor_data.db")),
            db_max_connections: optional("DB_MAX_CONNECTIONS", "4")
                .parse()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            db_busy_timeout: Duration::from_millis(
                optional("DB_BUSY_TIMEOUT_MS", "250")
                    .parse()
                    .context("DB_BUSY_TIMEOUT_MS must be an integer number of milliseconds")?,
            ),
            http_addr: optional("HTTP_ADDR", "0.0.0.0:8080"),
            template_path: PathBuf::from(optional("TEMPLATE_PATH", "templates/index.html")),
            dashboard_limit,
            mqtt,
        })
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("not a boolean: {other:?}"),
    }
}

fn parse_qos(raw: u8) -> Result<QoS> {
    match raw {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => bail!("MQTT_QOS must be 0, 1 or 2, got {other}"),
    }
}
