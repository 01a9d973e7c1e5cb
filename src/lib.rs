// TCP teleop bridge: fixed-size command frames in, velocity commands out

pub mod bridge;
pub mod config;
pub mod error;
pub mod mapping;
pub mod messages;
pub mod protocol;
pub mod sink;
pub mod state;
pub mod watchdog;

pub use bridge::{Bridge, SessionEnd};
pub use error::BridgeError;
pub use messages::{BridgeHealth, Twist, Vector3};
pub use protocol::CommandFrame;
pub use sink::{ChannelSink, Emission, MotionSink, ZenohSink};
