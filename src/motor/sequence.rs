// Command sequencing for Kinco drives.
//
// One logical motor command expands to a fixed, ordered group of frames.
// The drive applies each write as it arrives, so the order within a group
// is load-bearing: mode select, then parameter, then controlword.

use super::kinco::{
    CONTROLWORD_ENABLE_OPERATION, CONTROLWORD_SHUTDOWN, Frame, KincoError, NodeId, Object,
    OperatingMode, Result,
};
use super::units::{DEFAULT_ENCODER_RESOLUTION, rpm_to_dec_with_resolution};

/// Ordered, immutable group of frames realizing one logical command.
///
/// The whole group must reach the drive in construction order; a truncated
/// prefix leaves the device in an intermediate state (e.g. enabled with a
/// stale velocity). A failed transmission is repaired by re-sending the
/// entire sequence, never a suffix.
#[derive(Debug, Clone)]
pub struct CommandSequence {
    frames: Vec<Frame>,
}

impl CommandSequence {
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl<'a> IntoIterator for &'a CommandSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// One drive on the bus: its address plus the encoder mounted on the motor
#[derive(Debug, Clone, Copy)]
pub struct Drive {
    node: NodeId,
    resolution: u32,
}

impl Drive {
    pub fn new(node: NodeId) -> Self {
        Self::with_resolution(node, DEFAULT_ENCODER_RESOLUTION)
    }

    /// Create with a custom encoder resolution (counts per revolution)
    pub fn with_resolution(node: NodeId, resolution: u32) -> Self {
        Self { node, resolution }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Build the frames that set the motor speed.
    ///
    /// Selects profile velocity mode, writes the target velocity, then
    /// enables operation via the controlword. Negative speeds reverse the
    /// direction of rotation.
    pub fn set_speed(&self, rpm: i32) -> Result<CommandSequence> {
        let dec = self.dec_for(rpm)?;
        Ok(CommandSequence {
            frames: vec![
                Frame::write_u8(
                    self.node,
                    Object::OperatingMode,
                    OperatingMode::ProfileVelocity as u8,
                )?,
                Frame::write_i32(self.node, Object::TargetVelocity, dec)?,
                Frame::write_u16(
                    self.node,
                    Object::Controlword,
                    CONTROLWORD_ENABLE_OPERATION,
                )?,
            ],
        })
    }

    /// Build the frames that ramp the motor to zero and drop the enable
    /// state. A later `set_speed` re-enables operation.
    pub fn stop(&self) -> Result<CommandSequence> {
        Ok(CommandSequence {
            frames: vec![
                Frame::write_i32(self.node, Object::TargetVelocity, 0)?,
                Frame::write_u16(self.node, Object::Controlword, CONTROLWORD_SHUTDOWN)?,
            ],
        })
    }

    fn dec_for(&self, rpm: i32) -> Result<i32> {
        let dec = rpm_to_dec_with_resolution(rpm, self.resolution);
        i32::try_from(dec).map_err(|_| KincoError::FieldOverflow {
            field: "target velocity",
            value: dec,
            bits: 32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::kinco::OpCode;

    fn drive() -> Drive {
        Drive::new(NodeId::new(1).unwrap())
    }

    #[test]
    fn test_set_speed_sequence_shape() {
        let seq = drive().set_speed(100).unwrap();
        assert_eq!(seq.len(), 3);

        let ops: Vec<u8> = seq.frames().iter().map(|f| f.op_code() as u8).collect();
        assert_eq!(ops, [0x2F, 0x23, 0x2B]);
        assert!(seq.frames().iter().all(|f| f.node().get() == 1));
    }

    #[test]
    fn test_set_speed_step_contents() {
        let seq = drive().set_speed(100).unwrap();
        let frames = seq.frames();

        assert_eq!(frames[0].index(), 0x6060);
        assert_eq!(frames[0].value(), 0x03);

        // 100 rpm at 10000 counts/rev: 100 * 512 * 10000 / 1875 = 273066
        assert_eq!(frames[1].index(), 0x60FF);
        assert_eq!(frames[1].value(), 273_066);

        assert_eq!(frames[2].index(), 0x6040);
        assert_eq!(frames[2].value(), 0x0F);
    }

    #[test]
    fn test_set_speed_respects_resolution() {
        let node = NodeId::new(1).unwrap();
        let seq = Drive::with_resolution(node, 1875).set_speed(10).unwrap();
        assert_eq!(seq.frames()[1].value(), 10 * 512);
    }

    #[test]
    fn test_negative_speed_is_signed() {
        let seq = drive().set_speed(-100).unwrap();
        assert_eq!(seq.frames()[1].value(), -273_066);
    }

    #[test]
    fn test_stop_sequence_shape() {
        let seq = drive().stop().unwrap();
        assert_eq!(seq.len(), 2);

        let ops: Vec<OpCode> = seq.frames().iter().map(|f| f.op_code()).collect();
        assert_eq!(ops, [OpCode::WriteU32, OpCode::WriteU16]);
        assert_eq!(seq.frames()[0].value(), 0);
        assert_eq!(seq.frames()[1].value(), CONTROLWORD_SHUTDOWN as i32);
    }

    #[test]
    fn test_speed_overflowing_dec_is_rejected() {
        match drive().set_speed(i32::MAX) {
            Err(KincoError::FieldOverflow { field, .. }) => {
                assert_eq!(field, "target velocity");
            }
            other => panic!("expected FieldOverflow, got {:?}", other),
        }
    }
}
