// Symbol -> velocity mapping
// Each movement symbol selects a direction intent (x, y, z, angular) which is then
// scaled by the frame's speed and turn magnitudes.

use crate::messages::{Twist, Vector3};
use crate::protocol::INTERRUPT_SYMBOL;

/// Direction intent for one symbol
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intent {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub angular: f64,
}

const fn intent(x: f64, y: f64, z: f64, angular: f64) -> Intent {
    Intent { x, y, z, angular }
}

/// Movement bindings, laid out like the classic teleop keyboard:
///
/// ```text
///    u    i    o          U    I    O
///    j    k    l          J    K    L
///    m    ,    .          M    <    >
/// ```
///
/// Lowercase drives and turns, uppercase strafes (holonomic), `t`/`b` move up/down.
pub const MOVE_BINDINGS: [(u8, Intent); 20] = [
    (b'i', intent(1.0, 0.0, 0.0, 0.0)),
    (b'o', intent(1.0, 0.0, 0.0, -1.0)),
    (b'j', intent(0.0, 0.0, 0.0, 1.0)),
    (b'l', intent(0.0, 0.0, 0.0, -1.0)),
    (b'u', intent(1.0, 0.0, 0.0, 1.0)),
    (b',', intent(-1.0, 0.0, 0.0, 0.0)),
    (b'.', intent(-1.0, 0.0, 0.0, 1.0)),
    (b'm', intent(-1.0, 0.0, 0.0, -1.0)),
    (b'O', intent(1.0, -1.0, 0.0, 0.0)),
    (b'I', intent(1.0, 0.0, 0.0, 0.0)),
    (b'J', intent(0.0, 1.0, 0.0, 0.0)),
    (b'L', intent(0.0, -1.0, 0.0, 0.0)),
    (b'U', intent(1.0, 1.0, 0.0, 0.0)),
    (b'<', intent(-1.0, 0.0, 0.0, 0.0)),
    (b'>', intent(-1.0, -1.0, 0.0, 0.0)),
    (b'M', intent(-1.0, 1.0, 0.0, 0.0)),
    (b't', intent(0.0, 0.0, 1.0, 0.0)),
    (b'b', intent(0.0, 0.0, -1.0, 0.0)),
    (b'k', intent(0.0, 0.0, 0.0, 0.0)),
    (b'K', intent(0.0, 0.0, 0.0, 0.0)),
];

/// Look up the intent bound to a symbol
pub fn lookup(symbol: u8) -> Option<Intent> {
    MOVE_BINDINGS
        .iter()
        .find(|(bound, _)| *bound == symbol)
        .map(|&(_, intent)| intent)
}

/// Convert a command into a velocity vector
///
/// Unbound symbols always produce the stop vector, whatever the magnitudes.
pub fn to_twist(symbol: u8, speed_scale: f64, turn_rate: f64) -> Twist {
    let Some(intent) = lookup(symbol) else {
        return Twist::stop();
    };

    Twist {
        linear: Vector3::new(
            intent.x * speed_scale,
            intent.y * speed_scale,
            intent.z * speed_scale,
        ),
        angular: Vector3::new(0.0, 0.0, intent.angular * turn_rate),
    }
}

/// True when the symbol falls through to the unbound branch and is the interrupt byte
pub fn is_interrupt(symbol: u8) -> bool {
    lookup(symbol).is_none() && symbol == INTERRUPT_SYMBOL
}
