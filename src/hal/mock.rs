// Scripted IO for unit tests.
//
// Analog channels replay queued samples; once a channel's script runs out it
// reads in-band, so the blocking sensor-wait loops always terminate under
// test. Digital writes are recorded in order for assertions, and delays only
// advance a virtual clock.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use super::{AnalogChannel, DigitalLine, Level, SorterIo};

/// Fallback sample once a script is exhausted (inside the 400..550 band).
pub const MAGNET_SAMPLE: u16 = 470;
/// A sample outside the magnet band.
pub const CLEAR_SAMPLE: u16 = 300;

pub struct MockIo {
    clock: Duration,
    scripts: HashMap<AnalogChannel, VecDeque<u16>>,
    pub writes: Vec<(DigitalLine, Level)>,
    levels: HashMap<DigitalLine, Level>,
}

impl MockIo {
    pub fn new() -> Self {
        Self {
            clock: Duration::ZERO,
            scripts: HashMap::new(),
            writes: Vec::new(),
            levels: HashMap::new(),
        }
    }

    /// Queue samples for a channel, consumed one per poll.
    pub fn script(&mut self, channel: AnalogChannel, samples: &[u16]) {
        self.scripts.entry(channel).or_default().extend(samples);
    }

    /// Current level of a line (low until first written).
    pub fn level(&self, line: DigitalLine) -> Level {
        self.levels.get(&line).copied().unwrap_or(Level::Low)
    }

    /// All levels ever written to a line, in order.
    pub fn writes_to(&self, line: DigitalLine) -> Vec<Level> {
        self.writes
            .iter()
            .filter(|(l, _)| *l == line)
            .map(|(_, level)| *level)
            .collect()
    }

    /// True if the two lines were ever high at the same instant, replaying
    /// the write log from power-on.
    pub fn ever_both_high(&self, a: DigitalLine, b: DigitalLine) -> bool {
        let mut a_high = false;
        let mut b_high = false;
        for &(line, level) in &self.writes {
            if line == a {
                a_high = level == Level::High;
            } else if line == b {
                b_high = level == Level::High;
            }
            if a_high && b_high {
                return true;
            }
        }
        false
    }
}

impl SorterIo for MockIo {
    fn read_analog(&mut self, channel: AnalogChannel) -> u16 {
        self.clock += Duration::from_millis(1);
        self.scripts
            .get_mut(&channel)
            .and_then(VecDeque::pop_front)
            .unwrap_or(MAGNET_SAMPLE)
    }

    fn write_digital(&mut self, line: DigitalLine, level: Level) {
        self.writes.push((line, level));
        self.levels.insert(line, level);
    }

    fn delay(&mut self, duration: Duration) {
        self.clock += duration;
    }

    fn uptime(&mut self) -> Duration {
        self.clock
    }
}
