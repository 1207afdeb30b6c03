use rand::Rng;
use serde::Serialize;

/// Message body in the shape devices publish.
#[derive(Debug, Clone, Serialize)]
pub struct SensorPayload {
    pub mac: String,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

impl SensorPayload {
    pub fn random(rng: &mut impl Rng, mac: String) -> Self {
        Self {
            mac,
            accel_x: rng.gen_range(-0.5..0.5),
            accel_y: rng.gen_range(-0.5..0.5),
            accel_z: rng.gen_range(9.6..10.0),
            gyro_x: rng.gen_range(-2.0..2.0),
            gyro_y: rng.gen_range(-2.0..2.0),
            gyro_z: rng.gen_range(-2.0..2.0),
            temperature: rng.gen_range(15.0..35.0),
            humidity: rng.gen_range(30.0..80.0),
            pressure: rng.gen_range(990.0..1030.0),
        }
    }
}

/// MAC-style id for the n-th simulated device.
pub fn device_mac(index: u64) -> String {
    let bytes = index.to_be_bytes();
    format!(
        "AA:BB:CC:{:02X}:{:02X}:{:02X}",
        bytes[5], bytes[6], bytes[7]
    )
}

/// Payload that the ingestor must reject.
pub fn malformed(rng: &mut impl Rng) -> Vec<u8> {
    match rng.gen_range(0..3) {
        0 => b"not json".to_vec(),
        1 => br#"{"mac":"AA:BB:CC","temperature":"#.to_vec(),
        _ => br#"{"mac":"AA:BB:CC","temperature":"warm"}"#.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_mac_formats_low_bytes() {
        assert_eq!(device_mac(0), "AA:BB:CC:00:00:00");
        assert_eq!(device_mac(0x01_02_0A), "AA:BB:CC:01:02:0A");
    }

    #[test]
    fn random_payload_uses_wire_field_names() {
        let mut rng = rand::thread_rng();
        let payload = SensorPayload::random(&mut rng, device_mac(7));
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["mac"], "AA:BB:CC:00:00:07");
        for key in ["accel_x", "gyro_z", "temperature", "humidity", "pressure"] {
            assert!(value[key].is_f64(), "missing {}", key);
        }
    }

    #[test]
    fn malformed_payloads_do_not_parse_as_payload_shape() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let bytes = malformed(&mut rng);
            let parsed: Result<serde_json::Map<String, serde_json::Value>, _> =
                serde_json::from_slice(&bytes);
            let typed_ok = parsed
                .map(|m| m.get("temperature").map_or(true, |t| t.is_number()))
                .unwrap_or(false);
            assert!(!typed_ok);
        }
    }
}
