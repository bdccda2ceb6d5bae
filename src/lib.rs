// Motion runtime for a serial-commanded waste-sorting mechanism.
//
// The crate is split the way the device is: `motion` turns hall-sensor
// detections into completed rotations and disposal sequences, `paddle` runs
// the input-chute agitator on its own duty-cycle timer, `link` speaks the
// classifier host's bare-integer serial protocol, and `runtime` ties them
// together in one blocking control loop. `hal` is the seam to real pins:
// board integrations implement `SorterIo`; everything above it runs (and is
// tested) on the host.

pub mod config;
pub mod hal;
pub mod link;
pub mod messages;
pub mod motion;
pub mod paddle;
pub mod runtime;
