// Where velocity commands go once computed
//
// The bridge only needs "publish this vector" and "publish this health". Zenoh is
// the production transport; the channel sink lets another task (or a test) observe
// every emission in order.

use std::future::Future;

use tokio::sync::mpsc;
use tracing::info;
use zenoh::Session;
use zenoh::pubsub::Publisher;

use crate::error::{BridgeError, Result};
use crate::messages::{BridgeHealth, Twist};

/// Motion command sink
pub trait MotionSink: Send {
    /// Publish the current velocity vector
    fn publish_velocity(&mut self, twist: &Twist) -> impl Future<Output = Result<()>> + Send;

    /// Publish a link health change
    fn publish_health(&mut self, health: BridgeHealth) -> impl Future<Output = Result<()>> + Send;
}

/// Publishes JSON-encoded messages on zenoh topics
pub struct ZenohSink {
    velocity: Publisher<'static>,
    health: Publisher<'static>,
}

impl ZenohSink {
    pub async fn declare(
        session: &Session,
        velocity_topic: &str,
        health_topic: &str,
    ) -> Result<Self> {
        let velocity = session
            .declare_publisher(velocity_topic.to_owned())
            .await
            .map_err(|e| BridgeError::Publish(e.to_string()))?;
        let health = session
            .declare_publisher(health_topic.to_owned())
            .await
            .map_err(|e| BridgeError::Publish(e.to_string()))?;

        info!("Publishing to: {}, {}", velocity_topic, health_topic);
        Ok(Self { velocity, health })
    }
}

impl MotionSink for ZenohSink {
    async fn publish_velocity(&mut self, twist: &Twist) -> Result<()> {
        let json =
            serde_json::to_string(twist).map_err(|e| BridgeError::Publish(e.to_string()))?;
        self.velocity
            .put(json)
            .await
            .map_err(|e| BridgeError::Publish(e.to_string()))
    }

    async fn publish_health(&mut self, health: BridgeHealth) -> Result<()> {
        let json =
            serde_json::to_string(&health).map_err(|e| BridgeError::Publish(e.to_string()))?;
        self.health
            .put(json)
            .await
            .map_err(|e| BridgeError::Publish(e.to_string()))
    }
}

/// Everything a sink was asked to publish
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Emission {
    Velocity(Twist),
    Health(BridgeHealth),
}

/// Forwards emissions into an unbounded channel
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Emission>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Emission>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, emission: Emission) -> Result<()> {
        self.tx
            .send(emission)
            .map_err(|_| BridgeError::Publish("receiver dropped".to_string()))
    }
}

impl MotionSink for ChannelSink {
    async fn publish_velocity(&mut self, twist: &Twist) -> Result<()> {
        self.send(Emission::Velocity(*twist))
    }

    async fn publish_health(&mut self, health: BridgeHealth) -> Result<()> {
        self.send(Emission::Health(health))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Vector3;

    #[tokio::test]
    async fn test_channel_sink_preserves_order() {
        let (mut sink, mut rx) = ChannelSink::new();
        let moving = Twist {
            linear: Vector3::new(1.0, 0.0, 0.0),
            angular: Vector3::default(),
        };

        sink.publish_health(BridgeHealth::Ok).await.unwrap();
        sink.publish_velocity(&moving).await.unwrap();
        sink.publish_velocity(&Twist::stop()).await.unwrap();

        assert_eq!(rx.recv().await, Some(Emission::Health(BridgeHealth::Ok)));
        assert_eq!(rx.recv().await, Some(Emission::Velocity(moving)));
        assert_eq!(rx.recv().await, Some(Emission::Velocity(Twist::stop())));
    }

    #[tokio::test]
    async fn test_channel_sink_reports_dropped_receiver() {
        let (mut sink, rx) = ChannelSink::new();
        drop(rx);
        assert!(matches!(
            sink.publish_velocity(&Twist::stop()).await,
            Err(BridgeError::Publish(_))
        ));
    }
}
