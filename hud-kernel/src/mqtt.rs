use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, warn};

use crate::config::MqttConf;
use crate::engine::Input;
use crate::envelope::decode_bytes;
use crate::health::HealthTracker;

/// Decodes one transport payload and queues it for the engine.
/// Returns false when the payload was ignored or the engine is gone.
pub async fn forward_payload(payload: &[u8], inputs: &mpsc::Sender<Input>, health: &HealthTracker) -> bool {
    let Some(command) = decode_bytes(payload) else {
        health.record_ignored();
        return false;
    };
    if inputs.send(Input::Command(command)).await.is_err() {
        warn!("[mqtt] engine stopped, dropping message");
        return false;
    }
    true
}

pub fn spawn_mqtt_listener(conf: MqttConf, inputs: mpsc::Sender<Input>, health: HealthTracker) -> JoinHandle<()> {
    task::spawn(async move {
        let mut opts = MqttOptions::new("hud-kernel", &conf.host, conf.port);
        opts.set_keep_alive(Duration::from_secs(15));
        let (client, mut eventloop) = AsyncClient::new(opts, 10);
        health.mark_mqtt_connecting();
        info!("[mqtt] connecting to {}:{} for {}", conf.host, conf.port, conf.topic);

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    health.mark_mqtt_connected();
                    // Subscriptions do not survive a clean-session reconnect.
                    if let Err(e) = client.subscribe(&conf.topic, QoS::AtLeastOnce).await {
                        warn!("[mqtt] subscribe failed: {e:?}");
                        return;
                    }
                }
                Ok(Event::Incoming(Incoming::Publish(p))) if p.topic == conf.topic => {
                    if !forward_payload(&p.payload, &inputs, &health).await && inputs.is_closed() {
                        info!("[mqtt] engine gone, listener exiting");
                        return;
                    }
                }
                Ok(Event::Incoming(Incoming::Publish(p))) => debug!("[mqtt] ignoring topic {}", p.topic),
                Ok(_) => {}
                Err(e) => {
                    warn!("[mqtt] connection error: {e:?}");
                    health.increment_reconnects();
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    })
}
