// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use incubator_dashboard_model::{IncubatorData, TelemetryPayload};
use rumqttc::{Client, Connection, Event, MqttOptions, Outgoing, Packet, Publish, QoS};

use crate::error::Error;
use crate::telemetry::source::TelemetrySource;
use crate::{BrokerConfig, ValueStore};

/// Subscription to the incubator topic, driven by a background thread.
///
/// The thread runs until the broker closes the connection, the connection
/// fails or the link is dropped. There is no reconnect: once the thread
/// stops the snapshot stays at `connected == false`.
pub struct MqttLink {
    client: Client,
    broker: String,
    store: ValueStore<IncubatorData>,
    stopping: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl MqttLink {
    const REQUEST_CAPACITY: usize = 10;

    pub fn connect(config: &BrokerConfig) -> Result<Self, Error> {
        let client_id = config.client_id();
        let broker = format!("{}:{}", config.host, config.port);

        let mut options = MqttOptions::new(client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));

        let (client, connection) = Client::new(options, Self::REQUEST_CAPACITY);

        // Queued until the connection is up.
        client.subscribe(config.topic.clone(), QoS::AtLeastOnce)?;

        let store = ValueStore::default();
        let stopping = Arc::new(AtomicBool::new(false));
        let handler = EventHandler {
            topic: config.topic.clone(),
            store: store.clone(),
            stopping: stopping.clone(),
        };

        let worker = std::thread::Builder::new()
            .name("mqtt".into())
            .spawn(move || handler.run(connection))
            .map_err(Error::Spawn)?;

        log::info!("Connecting to {broker} as {client_id}, topic {}", config.topic);

        Ok(Self {
            client,
            broker,
            store,
            stopping,
            worker: Some(worker),
        })
    }
}

impl TelemetrySource for MqttLink {
    fn poll(&mut self) -> Option<IncubatorData> {
        self.store.take_fresh()
    }

    fn describe(&self) -> String {
        format!("MQTT broker {}", self.broker)
    }
}

impl Drop for MqttLink {
    fn drop(&mut self) {
        self.stopping.store(true, Ordering::Relaxed);

        if let Err(e) = self.client.try_disconnect() {
            log::debug!("Disconnect request not delivered: {e}");
        }

        // A thread still stuck in a TCP connect is left behind instead of
        // blocking the UI on shutdown.
        if let Some(worker) = self.worker.take() {
            if worker.is_finished() {
                let _ = worker.join();
            }
        }

        log::info!("Disconnected from {}", self.broker);
    }
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Stop,
}

/// Owns the connection side of the link and folds events into the store.
struct EventHandler {
    topic: String,
    store: ValueStore<IncubatorData>,
    stopping: Arc<AtomicBool>,
}

impl EventHandler {
    fn run(self, mut connection: Connection) {
        for notification in connection.iter() {
            let flow = match notification {
                Ok(event) => self.handle(&event),
                Err(e) => {
                    self.connection_lost(&e);
                    Flow::Stop
                }
            };

            if flow == Flow::Stop {
                break;
            }
        }

        log::debug!("MQTT connection thread finished");
    }

    fn handle(&self, event: &Event) -> Flow {
        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                log::info!("Connected to broker ({:?})", ack.code);
                self.store.update(|data| data.with_connected(true));
                Flow::Continue
            }
            Event::Incoming(Packet::SubAck(_)) => {
                log::info!("Subscribed to {}", self.topic);
                Flow::Continue
            }
            Event::Incoming(Packet::Publish(publish)) => {
                self.on_publish(publish);
                Flow::Continue
            }
            Event::Incoming(Packet::Disconnect) => {
                log::warn!("Broker closed the connection");
                self.store.update(|data| data.with_connected(false));
                Flow::Stop
            }
            Event::Outgoing(Outgoing::Disconnect) => {
                self.store.update(|data| data.with_connected(false));
                Flow::Stop
            }
            _ => Flow::Continue,
        }
    }

    fn on_publish(&self, publish: &Publish) {
        if publish.topic != self.topic {
            log::debug!("Ignoring message on {}", publish.topic);
            return;
        }

        log::debug!("Message received: {}", String::from_utf8_lossy(&publish.payload));

        match TelemetryPayload::from_slice(&publish.payload) {
            Ok(payload) => {
                self.store.update(|data| payload.apply(data));
                log::debug!(
                    "Data updated - temp: {}°C, humidity: {}%, day: {}, remaining: {}",
                    payload.temperature,
                    payload.humidity,
                    payload.current_day,
                    payload.days_remaining
                );
            }
            Err(e) => log::warn!("Dropping telemetry message: {e}"),
        }
    }

    fn connection_lost(&self, reason: &dyn std::fmt::Display) {
        if self.stopping.load(Ordering::Relaxed) {
            log::debug!("Connection closed on shutdown: {reason}");
        } else {
            log::error!("MQTT connection error: {reason}");
        }

        self.store.update(|data| data.with_connected(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rumqttc::{ConnAck, ConnectReturnCode};

    const TOPIC: &str = "projeto_chocadeira/dados";

    fn handler() -> EventHandler {
        EventHandler {
            topic: TOPIC.into(),
            store: ValueStore::default(),
            stopping: Arc::new(AtomicBool::new(false)),
        }
    }

    fn publish(topic: &str, payload: &str) -> Event {
        Event::Incoming(Packet::Publish(Publish::new(
            topic,
            QoS::AtLeastOnce,
            payload.as_bytes().to_vec(),
        )))
    }

    #[test]
    fn connack_marks_connected() {
        let handler = handler();
        let ack = Event::Incoming(Packet::ConnAck(ConnAck::new(ConnectReturnCode::Success, false)));

        assert_eq!(handler.handle(&ack), Flow::Continue);
        assert_eq!(handler.store.take_fresh().map(|d| d.connected), Some(true));
    }

    #[test]
    fn publish_updates_snapshot() {
        let handler = handler();
        let event = publish(TOPIC, r#"{"temp": 37.8, "humi": 60.5, "aq": 0, "um": 1, "dia": 12, "resta": 9}"#);

        assert_eq!(handler.handle(&event), Flow::Continue);

        let data = handler.store.take_fresh().unwrap();
        assert!(data.connected);
        assert!(data.humidifier_on);
        assert_eq!(data.temperature, 37.8);
        assert_eq!(data.total_days(), 21);
    }

    #[test]
    fn bad_payload_keeps_previous_snapshot() {
        let handler = handler();
        handler.handle(&publish(TOPIC, r#"{"temp": 37.8}"#));
        handler.store.take_fresh();

        handler.handle(&publish(TOPIC, "not json"));

        assert_eq!(handler.store.take_fresh(), None);
        assert_eq!(handler.store.snapshot().temperature, 37.8);
    }

    #[test]
    fn other_topics_are_ignored() {
        let handler = handler();
        handler.handle(&publish("somewhere/else", r#"{"temp": 20.0}"#));

        assert_eq!(handler.store.take_fresh(), None);
    }

    #[test]
    fn disconnect_stops_and_marks_disconnected() {
        let handler = handler();
        handler.store.update(|d| d.with_connected(true));

        assert_eq!(handler.handle(&Event::Incoming(Packet::Disconnect)), Flow::Stop);
        assert!(!handler.store.snapshot().connected);
    }

    #[test]
    fn outgoing_disconnect_stops() {
        let handler = handler();
        handler.store.update(|d| d.with_connected(true));

        assert_eq!(handler.handle(&Event::Outgoing(Outgoing::Disconnect)), Flow::Stop);
        assert!(!handler.store.take_fresh().unwrap().connected);
    }

    #[test]
    fn error_after_shutdown_request_marks_disconnected() {
        let handler = handler();
        handler.store.update(|d| d.with_connected(true));
        handler.stopping.store(true, Ordering::Relaxed);

        handler.connection_lost(&"connection closed by peer");

        assert!(!handler.store.snapshot().connected);
    }

    #[test]
    fn connection_error_marks_disconnected() {
        let handler = handler();
        handler.store.update(|d| d.with_connected(true));

        handler.connection_lost(&"connection refused");

        assert!(!handler.store.take_fresh().unwrap().connected);
    }
}
