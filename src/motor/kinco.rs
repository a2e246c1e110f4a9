// Kinco servo drive serial protocol implementation
//
// The drive accepts CANopen SDO expedited-download requests sent raw over
// its RS-232 port, one fixed 10-byte frame per object write:
// [ID, OpCode, Index lo, Index hi, SubIndex, Value (4 bytes LE), Checksum]

use serialport::{self, SerialPort};
use std::io::Write;
use std::thread::sleep;
use std::time::Duration;
use tracing::debug;

use super::sequence::CommandSequence;

/// Default serial configuration for Kinco drives
pub const DEFAULT_BAUDRATE: u32 = 38_400;
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

/// Pause between consecutive frames of one sequence, so each write has
/// taken effect on the drive before the next one arrives
pub const DEFAULT_FRAME_GAP_MS: u64 = 10;

/// Wire size of every frame
pub const FRAME_LEN: usize = 10;

/// Write op codes (expedited download, selected by payload width)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    WriteU8 = 0x2F,
    WriteU16 = 0x2B,
    WriteU32 = 0x23,
}

impl OpCode {
    fn from_raw(raw: u8) -> Option<OpCode> {
        match raw {
            0x2F => Some(OpCode::WriteU8),
            0x2B => Some(OpCode::WriteU16),
            0x23 => Some(OpCode::WriteU32),
            _ => None,
        }
    }

    /// Logical payload width in bits
    fn bits(self) -> u8 {
        match self {
            OpCode::WriteU8 => 8,
            OpCode::WriteU16 => 16,
            OpCode::WriteU32 => 32,
        }
    }

    /// Whether a value fits the payload width, signed or unsigned
    fn value_fits(self, value: i64) -> bool {
        match self {
            OpCode::WriteU8 => (i8::MIN as i64..=u8::MAX as i64).contains(&value),
            OpCode::WriteU16 => (i16::MIN as i64..=u16::MAX as i64).contains(&value),
            OpCode::WriteU32 => (i32::MIN as i64..=u32::MAX as i64).contains(&value),
        }
    }
}

/// Object-dictionary entries used by the command sequencer
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Object {
    Controlword = 0x6040,    // u16, drives the enable state machine
    OperatingMode = 0x6060,  // u8
    TargetVelocity = 0x60FF, // i32, DEC units
}

impl Object {
    pub fn index(self) -> u16 {
        self as u16
    }

    /// All objects written here live at sub-index 0
    pub fn sub_index(self) -> u8 {
        0
    }

    /// The write op code matching this object's declared width
    pub fn op_code(self) -> OpCode {
        match self {
            Object::Controlword => OpCode::WriteU16,
            Object::OperatingMode => OpCode::WriteU8,
            Object::TargetVelocity => OpCode::WriteU32,
        }
    }
}

/// Operating modes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    ProfilePosition = 0x01,
    ProfileVelocity = 0x03,
    Homing = 0x06,
}

/// Controlword values
pub const CONTROLWORD_ENABLE_OPERATION: u16 = 0x0F;
pub const CONTROLWORD_SHUTDOWN: u16 = 0x06;

/// Error types for Kinco drive communication
#[derive(Debug, thiserror::Error)]
pub enum KincoError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{field} value {value} does not fit in {bits} bits")]
    FieldOverflow {
        field: &'static str,
        value: i64,
        bits: u8,
    },

    #[error("op code 0x{op_code:02X} cannot write object 0x{index:04X} sub-index {sub_index}")]
    InvalidOperationMapping {
        op_code: u8,
        index: u16,
        sub_index: u8,
    },
}

pub type Result<T> = std::result::Result<T, KincoError>;

/// Drive address on the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(u8);

impl NodeId {
    /// Validate a bus address against its single-byte wire field
    pub fn new(raw: u16) -> Result<NodeId> {
        u8::try_from(raw)
            .map(NodeId)
            .map_err(|_| KincoError::FieldOverflow {
                field: "node_id",
                value: raw as i64,
                bits: 8,
            })
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for NodeId {
    fn from(raw: u8) -> Self {
        NodeId(raw)
    }
}

/// One 10-byte write request to a drive's object dictionary.
///
/// The value travels in a fixed 4-byte field regardless of the op code's
/// logical width; its bit-level contract is `i32::to_le_bytes` (two's
/// complement, little-endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    node: NodeId,
    op_code: OpCode,
    index: u16,
    sub_index: u8,
    value: i32,
}

impl Frame {
    /// Single-byte write to an object declared as u8
    pub fn write_u8(node: NodeId, object: Object, value: u8) -> Result<Frame> {
        Self::for_object(node, object, OpCode::WriteU8, value as i32)
    }

    /// Two-byte write to an object declared as u16
    pub fn write_u16(node: NodeId, object: Object, value: u16) -> Result<Frame> {
        Self::for_object(node, object, OpCode::WriteU16, value as i32)
    }

    /// Four-byte write to an object declared as i32
    pub fn write_i32(node: NodeId, object: Object, value: i32) -> Result<Frame> {
        Self::for_object(node, object, OpCode::WriteU32, value)
    }

    fn for_object(node: NodeId, object: Object, op_code: OpCode, value: i32) -> Result<Frame> {
        if object.op_code() != op_code {
            return Err(KincoError::InvalidOperationMapping {
                op_code: op_code as u8,
                index: object.index(),
                sub_index: object.sub_index(),
            });
        }
        Ok(Frame {
            node,
            op_code,
            index: object.index(),
            sub_index: object.sub_index(),
            value,
        })
    }

    /// Build a frame from raw field values, validating every width.
    ///
    /// Unknown op codes are a hard error, as is a value outside the op
    /// code's payload range (signed or unsigned interpretation). Nothing is
    /// ever truncated to fit.
    pub fn from_raw(
        node_id: u16,
        op_code: u8,
        index: u16,
        sub_index: u8,
        value: i64,
    ) -> Result<Frame> {
        let node = NodeId::new(node_id)?;
        let op = OpCode::from_raw(op_code).ok_or(KincoError::InvalidOperationMapping {
            op_code,
            index,
            sub_index,
        })?;
        if !op.value_fits(value) {
            return Err(KincoError::FieldOverflow {
                field: "value",
                value,
                bits: op.bits(),
            });
        }
        Ok(Frame {
            node,
            op_code: op,
            index,
            sub_index,
            value: value as i32,
        })
    }

    /// Encode the frame, checksum included. Pure and deterministic.
    pub fn to_bytes(&self) -> [u8; FRAME_LEN] {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = self.node.get();
        bytes[1] = self.op_code as u8;
        bytes[2..4].copy_from_slice(&self.index.to_le_bytes());
        bytes[4] = self.sub_index;
        bytes[5..9].copy_from_slice(&self.value.to_le_bytes());
        bytes[9] = checksum(&bytes[..FRAME_LEN - 1]);
        bytes
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn op_code(&self) -> OpCode {
        self.op_code
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn sub_index(&self) -> u8 {
        self.sub_index
    }

    pub fn value(&self) -> i32 {
        self.value
    }
}

/// The byte that makes the whole frame sum to zero mod 256
fn checksum(data: &[u8]) -> u8 {
    let sum: u32 = data.iter().map(|&b| b as u32).sum();
    (sum as u8).wrapping_neg()
}

/// Kinco drive bus - writes command frames to the serial port
pub struct KincoBus {
    port: Box<dyn SerialPort>,
    frame_gap: Duration,
}

impl KincoBus {
    /// Open a new connection to the drive bus
    pub fn open(port_name: &str) -> Result<Self> {
        Self::open_with_baudrate(port_name, DEFAULT_BAUDRATE)
    }

    /// Open with custom baudrate
    pub fn open_with_baudrate(port_name: &str, baudrate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baudrate)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()?;

        Ok(Self {
            port,
            frame_gap: Duration::from_millis(DEFAULT_FRAME_GAP_MS),
        })
    }

    fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        let bytes = frame.to_bytes();
        debug!(
            "TX node {} object 0x{:04X}: {:02X?}",
            frame.node().get(),
            frame.index(),
            bytes
        );
        self.port.write_all(&bytes)?;
        self.port.flush()?;
        Ok(())
    }

    /// Transmit a whole sequence in construction order.
    ///
    /// Later frames assume the earlier ones have taken effect on the drive,
    /// so writes are separated by a short gap and never reordered. On error
    /// the remainder is not sent; the caller must re-issue the entire
    /// sequence from the first frame, never resume from the middle.
    pub fn send(&mut self, sequence: &CommandSequence) -> Result<()> {
        for (i, frame) in sequence.frames().iter().enumerate() {
            if i > 0 {
                sleep(self.frame_gap);
            }
            self.send_frame(frame)?;
        }
        Ok(())
    }
}
