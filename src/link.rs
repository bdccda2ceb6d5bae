// Host link adapter.
//
// The classifier host (a Raspberry Pi) speaks bare ASCII integers over a
// serial byte stream: one integer per command in, one acknowledgment integer
// per completed disposal out. No framing byte, no checksum, no length prefix;
// the only defense is draining stray bytes after each acknowledgment.

use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, warn};

use crate::messages::TrashCategory;

/// Backstop read timeout. Reads are only issued when bytes are already
/// waiting, so this never paces the control loop.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LinkError>;

/// One serial connection to the classifier host.
pub struct HostLink {
    port: Box<dyn SerialPort>,
    grace: Duration,
}

impl HostLink {
    pub fn open(port_name: &str, baud: u32, grace: Duration) -> Result<Self> {
        let port = serialport::new(port_name, baud)
            .timeout(READ_TIMEOUT)
            .open()?;
        Ok(Self { port, grace })
    }

    /// Non-blocking poll for one host command. Returns the idle category
    /// when no bytes are waiting; otherwise parses one integer and maps it,
    /// coercing anything unrecognized to idle.
    pub fn receive_command(&mut self) -> Result<TrashCategory> {
        let waiting = self.port.bytes_to_read()? as usize;
        if waiting == 0 {
            return Ok(TrashCategory::None);
        }
        let mut buf = vec![0u8; waiting];
        self.port.read_exact(&mut buf)?;
        let value = parse_wire_integer(&buf);
        let category = value.map_or(TrashCategory::None, TrashCategory::from_wire);
        debug!(?category, raw = ?value, "host command");
        Ok(category)
    }

    /// Write one acknowledgment integer, then hold for the grace window and
    /// discard whatever arrived during it, resynchronizing the stream
    /// against stray host chatter.
    pub fn send_completion(&mut self, code: i32) -> Result<()> {
        self.port.write_all(format!("{code}\n").as_bytes())?;
        self.port.flush()?;
        std::thread::sleep(self.grace);
        let stray = self.port.bytes_to_read()? as usize;
        if stray > 0 {
            let mut sink = vec![0u8; stray];
            self.port.read_exact(&mut sink)?;
            warn!(bytes = stray, "drained stray host bytes after acknowledgment");
        }
        debug!(code, "completion sent");
        Ok(())
    }
}

/// Parse the first ASCII integer in `bytes`: leading non-numeric bytes are
/// skipped, one optional `-` is honored, digits accumulate until the first
/// non-digit. `None` when no digits are present.
fn parse_wire_integer(bytes: &[u8]) -> Option<i32> {
    let mut idx = bytes
        .iter()
        .position(|b| b.is_ascii_digit() || *b == b'-')?;
    let negative = bytes[idx] == b'-';
    if negative {
        idx += 1;
    }
    let mut value: i64 = 0;
    let mut any_digit = false;
    for &b in &bytes[idx..] {
        if !b.is_ascii_digit() {
            break;
        }
        any_digit = true;
        // Clamp instead of overflowing on absurd input; anything this large
        // is out of the recognized set regardless
        value = (value * 10 + i64::from(b - b'0')).min(i64::from(i32::MAX));
    }
    if !any_digit {
        return None;
    }
    if negative {
        value = -value;
    }
    Some(value as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_integers() {
        assert_eq!(parse_wire_integer(b"3"), Some(3));
        assert_eq!(parse_wire_integer(b"42\n"), Some(42));
        assert_eq!(parse_wire_integer(b"  9\r\n"), Some(9));
        assert_eq!(parse_wire_integer(b"-1"), Some(-1));
        assert_eq!(parse_wire_integer(b"0"), Some(0));
    }

    #[test]
    fn test_parse_stops_at_first_non_digit() {
        assert_eq!(parse_wire_integer(b"12-3"), Some(12));
        assert_eq!(parse_wire_integer(b"3 9"), Some(3));
    }

    #[test]
    fn test_parse_rejects_empty_and_non_numeric() {
        assert_eq!(parse_wire_integer(b""), None);
        assert_eq!(parse_wire_integer(b"\r\n"), None);
        assert_eq!(parse_wire_integer(b"ok"), None);
        assert_eq!(parse_wire_integer(b"-"), None);
    }

    #[test]
    fn test_parse_clamps_absurd_input() {
        assert_eq!(parse_wire_integer(b"99999999999999"), Some(i32::MAX));
    }
}
