// Message types published by the bridge

use serde::{Deserialize, Serialize};

/// Three-component vector, laid out like geometry_msgs/Vector3
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

// Velocity command bridge -> platform
// Default is the stop vector, which is what gets sent whenever there is no valid command
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Twist {
    pub linear: Vector3,
    pub angular: Vector3,
}

impl Twist {
    /// The all-zero vector
    pub fn stop() -> Self {
        Self::default()
    }

    pub fn is_stop(&self) -> bool {
        *self == Self::stop()
    }
}

/// Link health published by the bridge
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BridgeHealth {
    /// No client connected
    Disconnected,
    /// Client connected and frames arriving in time
    Ok,
    /// Watchdog fired, robot stopped
    CmdStale,
}
