// Motion driver: hall gate, output driver, and the blocking rotation
// primitives everything else is composed from.
//
// All primitives are synchronous and block the caller for the whole motion.
// The sensor-wait loops have no timeout: a failed hall sensor or a jammed
// mechanism hangs the control loop. That is a documented liveness assumption
// on working hardware, not a fault this layer handles.

use std::time::Duration;

use tracing::debug;

use super::motor::{ALL_MOTORS, MotorBank, MotorId, RotationDirection};
use crate::config::SorterConfig;
use crate::hal::{Level, SorterIo};

/// Tuned motion timing, assembled from the runtime config.
#[derive(Debug, Clone, Copy)]
pub struct MotionTuning {
    /// Drive time that moves the mechanism off a just-detected magnet before
    /// hall polling resumes. The sensor is sampled, not latched, so polling
    /// immediately would re-detect the magnet the mechanism still rests on.
    pub guard_interval: Duration,
    /// Deceleration wait before an offset pulse.
    pub settle_interval: Duration,
    /// Brief dwell between the out and back steps of a routine.
    pub step_pause: Duration,
    pub disk_offset_pulse: Duration,
    pub cross_offset_pulse: Duration,
    /// Exclusive analog band inside which a magnet reads as present.
    pub hall_band: (u16, u16),
}

impl MotionTuning {
    pub fn from_config(config: &SorterConfig) -> Self {
        Self {
            guard_interval: config.guard_interval(),
            settle_interval: config.settle_interval(),
            step_pause: config.step_pause(),
            disk_offset_pulse: config.disk_offset_pulse(),
            cross_offset_pulse: config.cross_offset_pulse(),
            hall_band: (config.hall_threshold_low, config.hall_threshold_high),
        }
    }
}

/// Owns the board IO and drives the two sensored motors.
pub struct MotionDriver<IO: SorterIo> {
    io: IO,
    motors: MotorBank,
    tuning: MotionTuning,
}

impl<IO: SorterIo> MotionDriver<IO> {
    pub fn new(io: IO, motors: MotorBank, tuning: MotionTuning) -> Self {
        Self { io, motors, tuning }
    }

    pub fn tuning(&self) -> &MotionTuning {
        &self.tuning
    }

    /// The tuned offset-correction pulse width for a motor.
    pub fn offset_pulse(&self, id: MotorId) -> Duration {
        match id {
            MotorId::Disk => self.tuning.disk_offset_pulse,
            MotorId::Cross => self.tuning.cross_offset_pulse,
        }
    }

    pub fn io(&self) -> &IO {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }

    /// One raw sample through the hall gate: a magnet reads as present iff
    /// the sample lies strictly inside the band. No hysteresis, no averaging.
    pub fn magnet_present(&mut self, id: MotorId) -> bool {
        let hall = self.motors.motor(id).hall;
        let sample = self.io.read_analog(hall);
        let (low, high) = self.tuning.hall_band;
        sample > low && sample < high
    }

    /// Assert the line matching `direction` and clear its complement. The
    /// complement drops first so the two lines are never high together.
    pub fn drive(&mut self, id: MotorId, direction: RotationDirection) {
        let motor = *self.motors.motor(id);
        self.io
            .write_digital(motor.line_for(direction.opposite()), Level::Low);
        self.io.write_digital(motor.line_for(direction), Level::High);
    }

    /// Drop both direction lines of every listed motor.
    pub fn halt(&mut self, ids: &[MotorId]) {
        for &id in ids {
            let motor = *self.motors.motor(id);
            self.io.write_digital(motor.clock_line, Level::Low);
            self.io.write_digital(motor.counter_line, Level::Low);
        }
    }

    /// Rotate one motor through `steps` magnet-detection events.
    ///
    /// Each step drives off the current rest position for the guard interval,
    /// then polls the hall gate in a tight loop, re-asserting drive on every
    /// iteration, until the next magnet is seen, and halts. The guard runs
    /// before every step including the first, because the mechanism may
    /// already be resting on a magnet.
    pub fn rotate(&mut self, id: MotorId, direction: RotationDirection, steps: u8) {
        debug!(?id, ?direction, steps, "rotate");
        for _ in 0..steps {
            self.drive(id, direction);
            self.io.delay(self.tuning.guard_interval);
            while !self.magnet_present(id) {
                self.drive(id, direction);
            }
            self.halt(&[id]);
        }
    }

    /// Rotate both motors at once, each stopping on its own sensor.
    ///
    /// The first motor whose magnet is seen halts on the spot and stays
    /// halted (it must not drift while waiting); the partner keeps being
    /// driven and polled until its own magnet is seen. The disk is checked
    /// before the cross on each pass so simultaneous detections resolve
    /// deterministically; nothing else depends on that order.
    pub fn rotate_synchronized(
        &mut self,
        disk_direction: RotationDirection,
        cross_direction: RotationDirection,
    ) {
        debug!(?disk_direction, ?cross_direction, "rotate synchronized");
        self.drive(MotorId::Disk, disk_direction);
        self.drive(MotorId::Cross, cross_direction);
        self.io.delay(self.tuning.guard_interval);
        loop {
            self.drive(MotorId::Disk, disk_direction);
            self.drive(MotorId::Cross, cross_direction);
            if self.magnet_present(MotorId::Disk) {
                self.halt(&[MotorId::Disk]);
                while !self.magnet_present(MotorId::Cross) {
                    self.drive(MotorId::Cross, cross_direction);
                }
                break;
            }
            if self.magnet_present(MotorId::Cross) {
                self.halt(&[MotorId::Cross]);
                while !self.magnet_present(MotorId::Disk) {
                    self.drive(MotorId::Disk, disk_direction);
                }
                break;
            }
        }
        self.halt(&ALL_MOTORS);
    }

    /// Cancel mechanical overrun after a halt: wait for the mechanism to
    /// settle, pulse `direction` for `pulse`, halt again.
    ///
    /// `direction` must be the direction of the rotation just completed for
    /// this motor.
    pub fn correct_offset(&mut self, id: MotorId, direction: RotationDirection, pulse: Duration) {
        debug!(?id, ?direction, ?pulse, "correct offset");
        self.io.delay(self.tuning.settle_interval);
        self.drive(id, direction);
        self.io.delay(pulse);
        self.halt(&[id]);
    }

    /// Dwell without touching any line.
    pub fn dwell(&mut self, duration: Duration) {
        self.io.delay(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        CROSS_CLOCK_LINE, CROSS_COUNTER_LINE, CROSS_HALL, DISK_CLOCK_LINE, DISK_COUNTER_LINE,
        DISK_HALL,
    };
    use crate::hal::mock::{CLEAR_SAMPLE, MAGNET_SAMPLE, MockIo};

    fn test_driver() -> MotionDriver<MockIo> {
        let tuning = MotionTuning {
            guard_interval: Duration::from_millis(5),
            settle_interval: Duration::from_millis(2),
            step_pause: Duration::from_millis(1),
            disk_offset_pulse: Duration::from_millis(3),
            cross_offset_pulse: Duration::from_millis(4),
            hall_band: (400, 550),
        };
        MotionDriver::new(MockIo::new(), MotorBank::standard(), tuning)
    }

    #[test]
    fn test_hall_band_is_exclusive_at_both_ends() {
        let mut driver = test_driver();
        driver
            .io_mut()
            .script(DISK_HALL, &[400, 550, 401, 549, 470, 300, 1023]);
        assert!(!driver.magnet_present(MotorId::Disk));
        assert!(!driver.magnet_present(MotorId::Disk));
        assert!(driver.magnet_present(MotorId::Disk));
        assert!(driver.magnet_present(MotorId::Disk));
        assert!(driver.magnet_present(MotorId::Disk));
        assert!(!driver.magnet_present(MotorId::Disk));
        assert!(!driver.magnet_present(MotorId::Disk));
    }

    #[test]
    fn test_drive_never_raises_both_lines() {
        let mut driver = test_driver();
        driver.drive(MotorId::Disk, RotationDirection::Clockwise);
        driver.drive(MotorId::Disk, RotationDirection::CounterClockwise);
        driver.drive(MotorId::Disk, RotationDirection::Clockwise);
        driver.halt(&[MotorId::Disk]);
        let io = driver.io();
        assert!(!io.ever_both_high(DISK_CLOCK_LINE, DISK_COUNTER_LINE));
        assert_eq!(io.level(DISK_CLOCK_LINE), Level::Low);
        assert_eq!(io.level(DISK_COUNTER_LINE), Level::Low);
    }

    #[test]
    fn test_halt_accepts_any_subset() {
        let mut driver = test_driver();
        driver.drive(MotorId::Disk, RotationDirection::Clockwise);
        driver.drive(MotorId::Cross, RotationDirection::Clockwise);
        driver.halt(&[]);
        assert_eq!(driver.io().level(DISK_CLOCK_LINE), Level::High);
        driver.halt(&[MotorId::Cross]);
        assert_eq!(driver.io().level(CROSS_CLOCK_LINE), Level::Low);
        assert_eq!(driver.io().level(DISK_CLOCK_LINE), Level::High);
        driver.halt(&[MotorId::Disk, MotorId::Cross]);
        assert_eq!(driver.io().level(DISK_CLOCK_LINE), Level::Low);
    }

    #[test]
    fn test_rotate_runs_one_detection_cycle_per_step() {
        let mut driver = test_driver();
        // Two clear polls then a detection, twice over
        driver.io_mut().script(
            CROSS_HALL,
            &[
                CLEAR_SAMPLE,
                CLEAR_SAMPLE,
                MAGNET_SAMPLE,
                CLEAR_SAMPLE,
                MAGNET_SAMPLE,
            ],
        );
        driver.rotate(MotorId::Cross, RotationDirection::Clockwise, 2);

        let io = driver.io();
        // The clock line goes high at each drive and drops exactly once per
        // step, at that step's halt
        let writes = io.writes_to(CROSS_CLOCK_LINE);
        let halts = writes
            .windows(2)
            .filter(|pair| pair[0] == Level::High && pair[1] == Level::Low)
            .count();
        assert_eq!(halts, 2);
        assert_eq!(io.level(CROSS_CLOCK_LINE), Level::Low);
        assert_eq!(io.level(CROSS_COUNTER_LINE), Level::Low);
        // The disk was never touched
        assert!(io.writes_to(DISK_CLOCK_LINE).is_empty());
        assert!(io.writes_to(DISK_COUNTER_LINE).is_empty());
    }

    #[test]
    fn test_rotate_zero_steps_is_a_no_op() {
        let mut driver = test_driver();
        driver.rotate(MotorId::Disk, RotationDirection::Clockwise, 0);
        assert!(driver.io().writes.is_empty());
    }

    #[test]
    fn test_synchronized_first_detection_halts_only_that_motor() {
        let mut driver = test_driver();
        // Disk fires on the first poll; the cross needs three more
        driver.io_mut().script(DISK_HALL, &[MAGNET_SAMPLE]);
        driver.io_mut().script(
            CROSS_HALL,
            &[CLEAR_SAMPLE, CLEAR_SAMPLE, CLEAR_SAMPLE, MAGNET_SAMPLE],
        );
        driver.rotate_synchronized(
            RotationDirection::Clockwise,
            RotationDirection::CounterClockwise,
        );

        let io = driver.io();
        // After the disk's halt its drive line is never re-asserted
        let disk_writes = io.writes_to(DISK_CLOCK_LINE);
        let first_low = disk_writes
            .iter()
            .position(|level| *level == Level::Low)
            .unwrap();
        assert!(
            disk_writes[first_low..]
                .iter()
                .all(|level| *level == Level::Low)
        );
        // The cross kept being driven after the disk stopped: more assert
        // events on its line than polls it had consumed before the disk fired
        let cross_asserts = io
            .writes_to(CROSS_COUNTER_LINE)
            .iter()
            .filter(|level| **level == Level::High)
            .count();
        assert!(cross_asserts >= 4);
        // Both motors end halted
        assert_eq!(io.level(DISK_CLOCK_LINE), Level::Low);
        assert_eq!(io.level(DISK_COUNTER_LINE), Level::Low);
        assert_eq!(io.level(CROSS_CLOCK_LINE), Level::Low);
        assert_eq!(io.level(CROSS_COUNTER_LINE), Level::Low);
        assert!(!io.ever_both_high(CROSS_CLOCK_LINE, CROSS_COUNTER_LINE));
    }

    #[test]
    fn test_synchronized_cross_first() {
        let mut driver = test_driver();
        driver
            .io_mut()
            .script(DISK_HALL, &[CLEAR_SAMPLE, CLEAR_SAMPLE, MAGNET_SAMPLE]);
        driver.io_mut().script(CROSS_HALL, &[MAGNET_SAMPLE]);
        driver.rotate_synchronized(
            RotationDirection::CounterClockwise,
            RotationDirection::Clockwise,
        );

        let io = driver.io();
        let cross_writes = io.writes_to(CROSS_CLOCK_LINE);
        let first_low = cross_writes
            .iter()
            .position(|level| *level == Level::Low)
            .unwrap();
        assert!(
            cross_writes[first_low..]
                .iter()
                .all(|level| *level == Level::Low)
        );
        assert_eq!(io.level(DISK_COUNTER_LINE), Level::Low);
    }

    #[test]
    fn test_correct_offset_settles_pulses_and_halts() {
        let mut driver = test_driver();
        let before = driver.io_mut().uptime();
        driver.correct_offset(
            MotorId::Cross,
            RotationDirection::Clockwise,
            Duration::from_millis(4),
        );
        let elapsed = driver.io_mut().uptime() - before;
        // settle (2ms) + pulse (4ms), no polling
        assert_eq!(elapsed, Duration::from_millis(6));
        let writes = driver.io().writes_to(CROSS_CLOCK_LINE);
        assert_eq!(writes, vec![Level::High, Level::Low]);
        assert_eq!(driver.io().level(CROSS_COUNTER_LINE), Level::Low);
    }
}
