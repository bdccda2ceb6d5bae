// Trash disposal sequencer.
//
// Owns the cross-invocation state of the machine: which category is pending,
// whether a staged paper item is waiting for a partner, and whether a
// disposal is in flight. Routines compose the motion-driver primitives and
// block until the mechanism is back at rest. Not reentrant; the busy flag is
// the mutual exclusion.

use tracing::{debug, info};

use super::driver::MotionDriver;
use super::motor::{MotorId, RotationDirection};
use crate::hal::SorterIo;
use crate::messages::TrashCategory;

pub struct Sequencer {
    category: TrashCategory,
    paper_pending: bool,
    busy: bool,
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            category: TrashCategory::None,
            paper_pending: false,
            busy: false,
        }
    }

    pub fn busy(&self) -> bool {
        self.busy
    }

    /// True while one paper item sits in the staging position waiting for a
    /// second before both are ejected together.
    pub fn paper_pending(&self) -> bool {
        self.paper_pending
    }

    pub fn category(&self) -> TrashCategory {
        self.category
    }

    /// Feed one received category in. While a disposal is in flight the
    /// command is discarded, not queued; the host re-sends after seeing the
    /// completion acknowledgment. Returns true when a disposal was accepted.
    pub fn accept(&mut self, category: TrashCategory) -> bool {
        if self.busy {
            if category != TrashCategory::None {
                debug!(?category, "busy, discarding command");
            }
            return false;
        }
        match category {
            TrashCategory::None => false,
            TrashCategory::Incoming => {
                // Arrival signaled but not yet classified; hold until the
                // host supersedes it with a real category.
                self.category = TrashCategory::Incoming;
                false
            }
            _ => {
                info!(?category, "disposal accepted");
                self.category = category;
                self.busy = true;
                true
            }
        }
    }

    /// Run the disposal routine for the accepted category. Blocks for the
    /// whole mechanical sequence and resets the category to idle. The busy
    /// flag stays set until the completion acknowledgment goes out.
    pub fn dispose<IO: SorterIo>(&mut self, driver: &mut MotionDriver<IO>) -> TrashCategory {
        let category = self.category;
        match category {
            TrashCategory::Metal => {
                bin_and_return(driver, MotorId::Disk, RotationDirection::CounterClockwise)
            }
            TrashCategory::Plastic => {
                bin_and_return(driver, MotorId::Cross, RotationDirection::Clockwise)
            }
            TrashCategory::Paper => self.dispose_paper(driver),
            TrashCategory::Unsorted => dispose_unsorted(driver),
            TrashCategory::None | TrashCategory::Incoming => {}
        }
        self.category = TrashCategory::None;
        category
    }

    /// Completion acknowledged; the sequencer may accept commands again.
    pub fn clear_busy(&mut self) {
        self.busy = false;
    }

    /// Paper batches two items into one ejection motion: the first call
    /// parks the item in the staging position, the second carries both to
    /// the bin and brings the mechanism home.
    fn dispose_paper<IO: SorterIo>(&mut self, driver: &mut MotionDriver<IO>) {
        use RotationDirection::{Clockwise, CounterClockwise};
        let cross_pulse = driver.offset_pulse(MotorId::Cross);
        let disk_pulse = driver.offset_pulse(MotorId::Disk);
        if self.paper_pending {
            driver.rotate_synchronized(Clockwise, CounterClockwise);
            driver.correct_offset(MotorId::Disk, Clockwise, disk_pulse);
            // One further cross step ejects both items
            driver.rotate(MotorId::Cross, CounterClockwise, 1);
            let pause = driver.tuning().step_pause;
            driver.dwell(pause);
            driver.rotate(MotorId::Cross, Clockwise, 1);
            driver.rotate_synchronized(CounterClockwise, Clockwise);
            driver.correct_offset(MotorId::Cross, Clockwise, cross_pulse);
            driver.correct_offset(MotorId::Disk, CounterClockwise, disk_pulse);
            self.paper_pending = false;
        } else {
            driver.rotate(MotorId::Cross, CounterClockwise, 1);
            driver.correct_offset(MotorId::Cross, CounterClockwise, cross_pulse);
            self.paper_pending = true;
        }
    }
}

/// Shared metal/plastic routine: one step toward the bin, a brief dwell, one
/// step back, then offset-correct the return.
fn bin_and_return<IO: SorterIo>(
    driver: &mut MotionDriver<IO>,
    motor: MotorId,
    outward: RotationDirection,
) {
    let pulse = driver.offset_pulse(motor);
    let pause = driver.tuning().step_pause;
    driver.rotate(motor, outward, 1);
    driver.dwell(pause);
    driver.rotate(motor, outward.opposite(), 1);
    driver.correct_offset(motor, outward.opposite(), pulse);
}

/// Composite routine for failed or mixed classifications: both motors out,
/// an extra disk excursion, both motors home. Leaves the paper staging state
/// alone.
fn dispose_unsorted<IO: SorterIo>(driver: &mut MotionDriver<IO>) {
    use RotationDirection::{Clockwise, CounterClockwise};
    let cross_pulse = driver.offset_pulse(MotorId::Cross);
    let disk_pulse = driver.offset_pulse(MotorId::Disk);
    let pause = driver.tuning().step_pause;
    driver.rotate_synchronized(Clockwise, CounterClockwise);
    driver.correct_offset(MotorId::Cross, CounterClockwise, cross_pulse);
    driver.rotate(MotorId::Disk, Clockwise, 1);
    driver.dwell(pause);
    driver.rotate(MotorId::Disk, CounterClockwise, 1);
    driver.rotate_synchronized(CounterClockwise, Clockwise);
    driver.correct_offset(MotorId::Cross, Clockwise, cross_pulse);
    driver.correct_offset(MotorId::Disk, CounterClockwise, disk_pulse);
}
