// Paddle duty-cycle controller.
//
// The input-chute paddle runs on its own two-phase timer, decoupled from the
// disposal sequencer: a short agitation burst, a long rest, repeated while
// power is on. Both update methods are cheap and idempotent; the control loop
// calls them every tick whether or not a disposal is in progress.

use std::time::Duration;

use crate::config::{PADDLE_LINE, SorterConfig};
use crate::hal::{Level, SorterIo};

pub struct PaddleController {
    power: bool,
    going: bool,
    last_phase_change: Duration,
    going_interval: Duration,
    rest_interval: Duration,
}

impl PaddleController {
    /// Starts powered and agitating, the mechanism's power-on state.
    pub fn new(config: &SorterConfig) -> Self {
        Self {
            power: true,
            going: true,
            last_phase_change: Duration::ZERO,
            going_interval: config.paddle_going_interval(),
            rest_interval: config.paddle_rest_interval(),
        }
    }

    pub fn power(&self) -> bool {
        self.power
    }

    /// External enable. The phase timer keeps running either way.
    pub fn set_power(&mut self, on: bool) {
        self.power = on;
    }

    pub fn agitating(&self) -> bool {
        self.going
    }

    /// Flip the agitate/rest phase once the active phase's interval elapses.
    pub fn update_phase(&mut self, now: Duration) {
        let interval = if self.going {
            self.going_interval
        } else {
            self.rest_interval
        };
        if now.saturating_sub(self.last_phase_change) >= interval {
            self.last_phase_change = now;
            self.going = !self.going;
        }
    }

    /// Drive the paddle line: active iff powered and in the agitate phase.
    pub fn apply<IO: SorterIo>(&self, io: &mut IO) {
        let level = if self.power && self.going {
            Level::High
        } else {
            Level::Low
        };
        io.write_digital(PADDLE_LINE, level);
    }
}
