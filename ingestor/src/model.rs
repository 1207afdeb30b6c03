use serde::{Deserialize, Deserializer, Serialize};

/// One sensor sample as published by a device.
///
/// Every field is optional on the wire; missing or `null` fields decode to
/// zero (or an empty device id). A device-supplied `timestamp` is ignored like
/// any other unknown key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reading {
    #[serde(rename = "mac", deserialize_with = "null_as_default")]
    pub device_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub accel_x: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub accel_y: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub accel_z: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub gyro_x: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub gyro_y: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub gyro_z: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub temperature: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub humidity: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pressure: f64,
}

// `null` decodes the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Reading {
    /// Attach the server receipt time and narrow to the persisted columns.
    ///
    /// Accelerometer and gyroscope components are dropped here.
    pub fn stamp(self, timestamp: String) -> StoredReading {
        StoredReading {
            device_id: self.device_id,
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            timestamp,
        }
    }
}

/// The subset of a [`Reading`] kept in `sensor_data`, also the dashboard JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredReading {
    #[sqlx(rename = "deviceid")]
    pub device_id: String,
    #[sqlx(rename = "temp")]
    pub temperature: f64,
    #[sqlx(rename = "hum")]
    pub humidity: f64,
    #[sqlx(rename = "press")]
    pub pressure: f64,
    pub timestamp: String,
}
