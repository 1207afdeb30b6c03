use crate::errors::Result;
use crate::model::Reading;

/// Decode a raw message payload into a [`Reading`].
///
/// Only syntax and field types are checked. Values are not range-checked and
/// the device id is not looked up anywhere.
pub fn decode(payload: &[u8]) -> Result<Reading> {
    Ok(serde_json::from_slice::<Reading>(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    #[test]
    fn test_decode_full_payload() {
        let payload = br#"{"mac":"AA:BB:CC","accel_x":0.1,"accel_y":-0.2,"accel_z":9.8,
            "gyro_x":1.0,"gyro_y":2.0,"gyro_z":3.0,
            "temperature":21.5,"humidity":40.0,"pressure":1013.2}"#;

        let reading = decode(payload).unwrap();
        assert_eq!(reading.device_id, "AA:BB:CC");
        assert_eq!(reading.accel_z, 9.8);
        assert_eq!(reading.gyro_y, 2.0);
        assert_eq!(reading.temperature, 21.5);
        assert_eq!(reading.humidity, 40.0);
        assert_eq!(reading.pressure, 1013.2);
    }

    #[test]
    fn test_missing_humidity_defaults_to_zero() {
        let payload = br#"{"mac":"AA:BB:CC","temperature":21.5,"pressure":1013.2}"#;

        let reading = decode(payload).unwrap();
        assert_eq!(reading.humidity, 0.0);
        assert_eq!(reading.temperature, 21.5);
        assert_eq!(reading.pressure, 1013.2);
        assert_eq!(reading.device_id, "AA:BB:CC");
        assert_eq!(reading.accel_x, 0.0);
    }

    #[test]
    fn test_null_fields_default_to_zero() {
        let payload = br#"{"mac":"AA:BB:CC","temperature":21.5,"humidity":null,"pressure":1013.2,"gyro_x":null}"#;

        let reading = decode(payload).unwrap();
        assert_eq!(reading.humidity, 0.0);
        assert_eq!(reading.gyro_x, 0.0);
        assert_eq!(reading.temperature, 21.5);
        assert_eq!(reading.pressure, 1013.2);
        assert_eq!(reading.device_id, "AA:BB:CC");
    }

    #[test]
    fn test_null_device_id_is_empty() {
        let reading = decode(br#"{"mac":null,"temperature":3.0}"#).unwrap();
        assert_eq!(reading.device_id, "");
        assert_eq!(reading.temperature, 3.0);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let payload = br#"{"mac":"x","temperature":1.5,"firmware":"1.2.3","timestamp":"1999-01-01T00:00:00Z"}"#;

        let reading = decode(payload).unwrap();
        assert_eq!(reading.device_id, "x");
        assert_eq!(reading.temperature, 1.5);
    }

    #[test]
    fn test_empty_object_is_all_defaults() {
        assert_eq!(decode(b"{}").unwrap(), Reading::default());
    }

    #[test]
    fn test_out_of_range_values_accepted() {
        let reading = decode(br#"{"mac":"x","humidity":250.0,"temperature":-400}"#).unwrap();
        assert_eq!(reading.humidity, 250.0);
        assert_eq!(reading.temperature, -400.0);
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(decode(b"invalid json"), Err(Error::Decode(_))));
        assert!(matches!(decode(b""), Err(Error::Decode(_))));
        assert!(matches!(decode(b"{\"mac\":"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_wrong_field_type_rejected() {
        assert!(matches!(
            decode(br#"{"mac":"x","temperature":"warm"}"#),
            Err(Error::Decode(_))
        ));
    }
}
