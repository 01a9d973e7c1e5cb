// Motion state owned by the connection task

use crate::mapping;
use crate::messages::Twist;
use crate::protocol::{CommandFrame, STOP_SYMBOL};

/// Last accepted command and the velocity it produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub symbol: u8,
    pub turn_rate: f64,
    pub speed_scale: f64,
    pub velocity: Twist,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            symbol: STOP_SYMBOL,
            turn_rate: 0.0,
            speed_scale: 0.0,
            velocity: Twist::stop(),
        }
    }
}

impl MotionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a decoded frame and recompute the velocity
    ///
    /// A stop frame only clears the turn rate; the speed from earlier frames is kept.
    pub fn apply(&mut self, frame: &CommandFrame) -> Twist {
        self.symbol = frame.symbol;
        self.turn_rate = frame.turn_rate;
        if !frame.is_stop() {
            self.speed_scale = frame.speed_scale;
        }
        self.recompute()
    }

    /// Drop to the stop symbol, keeping the last magnitudes
    pub fn force_stop(&mut self) -> Twist {
        self.symbol = STOP_SYMBOL;
        self.recompute()
    }

    fn recompute(&mut self) -> Twist {
        self.velocity = mapping::to_twist(self.symbol, self.speed_scale, self.turn_rate);
        self.velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Vector3;

    #[test]
    fn test_starts_stopped() {
        let state = MotionState::new();
        assert_eq!(state.symbol, STOP_SYMBOL);
        assert!(state.velocity.is_stop());
    }

    #[test]
    fn test_apply_then_force_stop() {
        let mut state = MotionState::new();
        let twist = state.apply(&CommandFrame::new(b'u', 1.0, 0.5));
        assert_eq!(twist.linear, Vector3::new(0.5, 0.0, 0.0));
        assert_eq!(twist.angular.z, 1.0);
        assert_eq!(state.velocity, twist);

        let twist = state.force_stop();
        assert!(twist.is_stop());
        assert_eq!(state.symbol, STOP_SYMBOL);
        assert_eq!(state.speed_scale, 0.5);
    }

    #[test]
    fn test_stop_frame_keeps_previous_speed() {
        let mut state = MotionState::new();
        state.apply(&CommandFrame::decode(b"u1.000s0.500").unwrap());

        let twist = state.apply(&CommandFrame::decode(b"k1.500s0.750").unwrap());
        assert!(twist.is_stop());
        assert_eq!(state.symbol, STOP_SYMBOL);
        assert_eq!(state.turn_rate, 0.0);
        assert_eq!(state.speed_scale, 0.5);

        // The next moving frame brings its own speed again
        state.apply(&CommandFrame::decode(b"i0.000s0.750").unwrap());
        assert_eq!(state.speed_scale, 0.75);
    }

    #[test]
    fn test_same_frame_same_velocity() {
        let mut state = MotionState::new();
        let frame = CommandFrame::decode(b"U0.000s1.250").unwrap();
        let first = state.apply(&frame);
        for _ in 0..5 {
            assert_eq!(state.apply(&frame), first);
        }
    }
}
