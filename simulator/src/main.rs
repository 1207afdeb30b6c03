mod payload;

use clap::Parser;
use payload::{device_mac, malformed, SensorPayload};
use rand::Rng;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use std::time::Duration;
use tracing::{error, info, warn};

// The publish interval is computed in whole microseconds.
const MAX_RATE: u64 = 1_000_000;

/// Publishes simulated sensor readings to an MQTT broker.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(long, env = "MQTT_BROKER", default_value = "localhost")]
    broker: String,

    #[arg(long, env = "MQTT_PORT", default_value_t = 1883)]
    port: u16,

    #[arg(long, env = "MQTT_TOPIC", default_value = "hello")]
    topic: String,

    #[arg(long, env = "MQTT_USERNAME", requires = "password")]
    username: Option<String>,

    #[arg(long, env = "MQTT_PASSWORD", requires = "username")]
    password: Option<String>,

    /// Messages per second, 1..=1000000.
    #[arg(
        long,
        env = "RATE",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..=MAX_RATE)
    )]
    rate: u64,

    #[arg(long, env = "DEVICES", default_value_t = 5)]
    devices: u64,

    /// Share of messages sent as undecodable payloads, 0.0..=1.0.
    #[arg(long, env = "MALFORMED_RATIO", default_value_t = 0.0)]
    malformed_ratio: f64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    if !(0.0..=1.0).contains(&args.malformed_ratio) {
        error!("--malformed-ratio must be within 0.0..=1.0");
        std::process::exit(2);
    }
    let rate = args.rate;
    let devices = args.devices.max(1);

    info!(
        "Broker: {}:{}, Topic: {}, Rate: {} msg/s, Devices: {}",
        args.broker, args.port, args.topic, rate, devices
    );

    let client_id = format!("brokerding-sim-{}", uuid::Uuid::new_v4());
    let mut mqtt_options = MqttOptions::new(client_id, &args.broker, args.port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    mqtt_options.set_clean_session(true);
    if let (Some(username), Some(password)) = (&args.username, &args.password) {
        mqtt_options.set_credentials(username, password);
    }

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 1000);

    // Spawn eventloop handler
    tokio::spawn(async move {
        loop {
            if let Err(e) = eventloop.poll().await {
                error!("MQTT eventloop error: {}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    });

    let mut rng = rand::thread_rng();
    let mut ticker = tokio::time::interval(Duration::from_micros(1_000_000 / rate));
    let mut counter = 0u64;

    loop {
        ticker.tick().await;

        let body = if rng.gen_bool(args.malformed_ratio) {
            malformed(&mut rng)
        } else {
            let reading = SensorPayload::random(&mut rng, device_mac(counter % devices));
            match serde_json::to_vec(&reading) {
                Ok(body) => body,
                Err(e) => {
                    error!("Failed to serialize reading: {}", e);
                    continue;
                }
            }
        };

        match client
            .publish(&args.topic, QoS::AtLeastOnce, false, body)
            .await
        {
            Ok(()) => counter += 1,
            Err(e) => warn!("Failed to publish: {}", e),
        }

        if counter > 0 && counter % 1000 == 0 {
            info!("Published {} messages", counter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_outside_range_rejected() {
        assert!(Args::try_parse_from(["brokerding-sim", "--rate", "0"]).is_err());
        assert!(Args::try_parse_from(["brokerding-sim", "--rate", "2000000"]).is_err());
        let args = Args::try_parse_from(["brokerding-sim", "--rate", "1000000"]).unwrap();
        assert_eq!(args.rate, MAX_RATE);
    }

    #[test]
    fn credentials_must_be_paired() {
        assert!(Args::try_parse_from(["brokerding-sim", "--username", "emqx"]).is_err());
    }
}
