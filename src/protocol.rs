// Teleop wire protocol
//
// Every command is a fixed 12-byte ASCII frame:
// [symbol, turn_int, '.', turn_d1, turn_d2, turn_d3, 's', speed_int, '.', speed_d1, speed_d2, speed_d3]
// e.g. b"i0.000s0.500" = move forward at half speed, no turn.
//
// Separators are positional only and never checked.

/// Size of one frame on the wire
pub const FRAME_LEN: usize = 12;

/// Canonical stop symbol
pub const STOP_SYMBOL: u8 = b'k';

/// Ctrl-C, terminates the bridge when received as a frame symbol
pub const INTERRUPT_SYMBOL: u8 = 0x03;

/// Byte offsets of the two numeric fields
const TURN_OFFSET: usize = 1;
const SPEED_OFFSET: usize = 7;

/// Largest magnitude a field can carry (one integer digit, three decimals)
const MAX_MAGNITUDE: f64 = 9.999;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Malformed frame: got {len} of {} bytes", FRAME_LEN)]
    MalformedFrame { len: usize },
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// One decoded command
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandFrame {
    pub symbol: u8,
    pub turn_rate: f64,
    pub speed_scale: f64,
}

impl CommandFrame {
    pub fn new(symbol: u8, turn_rate: f64, speed_scale: f64) -> Self {
        Self {
            symbol,
            turn_rate,
            speed_scale,
        }
    }

    /// Decode the bytes returned by a single read
    ///
    /// Anything other than exactly [`FRAME_LEN`] bytes is rejected; there is no
    /// reassembly of partial frames. Digits are not validated, so non-digit bytes
    /// produce meaningless magnitudes rather than an error.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() != FRAME_LEN {
            return Err(ProtocolError::MalformedFrame { len: buf.len() });
        }

        let symbol = buf[0];
        let speed_scale = decode_field(&buf[SPEED_OFFSET..SPEED_OFFSET + 5]);

        // A stop frame never carries a turn rate
        let turn_rate = if symbol == STOP_SYMBOL {
            0.0
        } else {
            decode_field(&buf[TURN_OFFSET..TURN_OFFSET + 5])
        };

        Ok(Self {
            symbol,
            turn_rate,
            speed_scale,
        })
    }

    /// Encode to wire format, clamping magnitudes to 0.000..=9.999
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        buf[0] = self.symbol;
        encode_field(self.turn_rate, &mut buf[TURN_OFFSET..TURN_OFFSET + 5]);
        buf[6] = b's';
        encode_field(self.speed_scale, &mut buf[SPEED_OFFSET..SPEED_OFFSET + 5]);
        buf
    }

    pub fn is_stop(&self) -> bool {
        self.symbol == STOP_SYMBOL
    }
}

/// Numeric value of one ASCII digit, garbage in, garbage out
fn digit(byte: u8) -> i32 {
    byte as i32 - b'0' as i32
}

/// Decode a `D.DDD` field (the byte at index 1 is the separator)
fn decode_field(field: &[u8]) -> f64 {
    let thousandths =
        digit(field[0]) * 1000 + digit(field[2]) * 100 + digit(field[3]) * 10 + digit(field[4]);
    thousandths as f64 / 1000.0
}

fn encode_field(value: f64, out: &mut [u8]) {
    let thousandths = (value.clamp(0.0, MAX_MAGNITUDE) * 1000.0).round() as u32;
    out[0] = b'0' + (thousandths / 1000) as u8;
    out[1] = b'.';
    out[2] = b'0' + (thousandths / 100 % 10) as u8;
    out[3] = b'0' + (thousandths / 10 % 10) as u8;
    out[4] = b'0' + (thousandths % 10) as u8;
}
