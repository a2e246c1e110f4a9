// Motor control module for Kinco servo drives
//
// Provides:
// - RPM to drive-internal DEC unit conversion
// - Kinco CANopen-style serial write protocol implementation
// - Command sequencing and a high-level single-drive driver API

mod driver;
pub mod kinco;
pub mod sequence;
pub mod units;

pub use driver::{DEFAULT_NODE_ID, MotorDriver};
pub use kinco::{Frame, KincoBus, KincoError, NodeId};
pub use sequence::{CommandSequence, Drive};
pub use units::{DEFAULT_ENCODER_RESOLUTION, rpm_to_dec};
