use crate::config::MqttConfig;
use crate::dispatch::Dispatcher;
use crate::errors::Result;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet};
use std::time::Duration;
use tracing::{debug, error, info};

/// Drive the MQTT connection and hand every publish to the dispatcher.
///
/// rumqttc reconnects on the next poll after an error; the subscription is
/// renewed on every ConnAck so a fresh session still receives messages.
pub async fn run_mqtt(config: MqttConfig, dispatcher: Dispatcher) {
    info!(
        "Connecting to MQTT broker at {}:{} as {}",
        config.broker, config.port, config.client_id
    );

    let mut mqtt_options = MqttOptions::new(&config.client_id, &config.broker, config.port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    mqtt_options.set_clean_session(true);
    if let Some((username, password)) = &config.credentials {
        mqtt_options.set_credentials(username, password);
    }

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                dispatcher.on_connect();
                if let Err(e) = subscribe(&client, &config) {
                    error!("Error subscribing to topic {}: {}", config.topic, e);
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                dispatcher.on_message(&publish.topic, &publish.payload).await;
            }
            Ok(other) => {
                debug!("MQTT event: {:?}", other);
            }
            Err(e) => {
                dispatcher.on_connection_lost(&e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

fn subscribe(client: &AsyncClient, config: &MqttConfig) -> Result<()> {
    // try_subscribe: the request queue is drained by the poll loop we are in.
    client.try_subscribe(&config.topic, config.qos)?;
    info!("Subscribed to {} with {:?}", config.topic, config.qos);
    Ok(())
}
