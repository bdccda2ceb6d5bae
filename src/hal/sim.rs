// Simulated sorting rig.
//
// A toy kinematic model of the mechanism: each motor advances while exactly
// one of its direction lines is high, rest-position magnets sit every 90
// degrees, and time is virtual, so a full disposal runs in microseconds of
// wall clock. Backs the bench demo and the runtime-level tests; a real board
// implements `SorterIo` against actual pins instead.

use std::time::Duration;

use super::{AnalogChannel, DigitalLine, Level, SorterIo};
use crate::config::{
    CROSS_CLOCK_LINE, CROSS_COUNTER_LINE, CROSS_HALL, DISK_CLOCK_LINE, DISK_COUNTER_LINE,
    DISK_HALL, PADDLE_LINE,
};

/// Degrees of travel per millisecond of drive.
const DEG_PER_MS: f32 = 0.06;
/// Angular spacing between rest-position magnets.
const MAGNET_SPACING_DEG: f32 = 90.0;
/// Half-width of the arc over which a hall sensor reads in-band.
const ZONE_HALF_WIDTH_DEG: f32 = 6.0;
/// Sample reported inside / outside a magnet zone.
const MAGNET_SAMPLE: u16 = 470;
const CLEAR_SAMPLE: u16 = 300;
/// Virtual time consumed by one analog poll.
const POLL_TICK: Duration = Duration::from_millis(1);

#[derive(Debug, Default)]
struct SimMotor {
    clock_high: bool,
    counter_high: bool,
    position_deg: f32,
}

impl SimMotor {
    fn advance(&mut self, ms: f32) {
        let step = match (self.clock_high, self.counter_high) {
            (true, false) => DEG_PER_MS * ms,
            (false, true) => -(DEG_PER_MS * ms),
            _ => return,
        };
        self.position_deg = (self.position_deg + step).rem_euclid(360.0);
    }

    fn in_magnet_zone(&self) -> bool {
        let offset = self.position_deg.rem_euclid(MAGNET_SPACING_DEG);
        offset <= ZONE_HALF_WIDTH_DEG || offset >= MAGNET_SPACING_DEG - ZONE_HALF_WIDTH_DEG
    }
}

#[derive(Debug, Default)]
pub struct SimRig {
    clock: Duration,
    disk: SimMotor,
    cross: SimMotor,
    paddle_high: bool,
    interlock_violation: bool,
}

impl SimRig {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if any motor ever had both direction lines high at once.
    pub fn interlock_violated(&self) -> bool {
        self.interlock_violation
    }

    pub fn paddle_active(&self) -> bool {
        self.paddle_high
    }

    pub fn disk_position_deg(&self) -> f32 {
        self.disk.position_deg
    }

    pub fn cross_position_deg(&self) -> f32 {
        self.cross.position_deg
    }

    fn advance_clock(&mut self, duration: Duration) {
        let ms = duration.as_secs_f32() * 1000.0;
        self.disk.advance(ms);
        self.cross.advance(ms);
        self.clock += duration;
    }

    fn check_interlock(&mut self) {
        if (self.disk.clock_high && self.disk.counter_high)
            || (self.cross.clock_high && self.cross.counter_high)
        {
            self.interlock_violation = true;
        }
    }
}

impl SorterIo for SimRig {
    fn read_analog(&mut self, channel: AnalogChannel) -> u16 {
        self.advance_clock(POLL_TICK);
        let in_zone = if channel == DISK_HALL {
            self.disk.in_magnet_zone()
        } else if channel == CROSS_HALL {
            self.cross.in_magnet_zone()
        } else {
            false
        };
        if in_zone { MAGNET_SAMPLE } else { CLEAR_SAMPLE }
    }

    fn write_digital(&mut self, line: DigitalLine, level: Level) {
        let high = level == Level::High;
        if line == DISK_CLOCK_LINE {
            self.disk.clock_high = high;
        } else if line == DISK_COUNTER_LINE {
            self.disk.counter_high = high;
        } else if line == CROSS_CLOCK_LINE {
            self.cross.clock_high = high;
        } else if line == CROSS_COUNTER_LINE {
            self.cross.counter_high = high;
        } else if line == PADDLE_LINE {
            self.paddle_high = high;
        }
        self.check_interlock();
    }

    fn delay(&mut self, duration: Duration) {
        self.advance_clock(duration);
    }

    fn uptime(&mut self) -> Duration {
        self.clock
    }
}
