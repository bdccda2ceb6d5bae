// Motion engine for the sorting mechanism
//
// Provides:
// - Motor identities and their line/sensor wiring
// - Blocking rotation primitives with hall-sensor stop conditions
// - The per-category disposal sequencer

pub mod driver;
pub mod motor;
pub mod sequencer;

pub use driver::{MotionDriver, MotionTuning};
pub use motor::{ALL_MOTORS, Motor, MotorBank, MotorId, RotationDirection};
pub use sequencer::Sequencer;
