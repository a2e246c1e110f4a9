// High-level driver for one Kinco servo drive on a serial bus.
//
// Couples the command sequencer with the serial transport to provide a
// simple set-speed/stop API against an open port.

use tracing::info;

use super::kinco::{KincoBus, NodeId, Result};
use super::sequence::Drive;
use super::units::DEFAULT_ENCODER_RESOLUTION;

/// Drive address as shipped from the factory
pub const DEFAULT_NODE_ID: u8 = 1;

pub struct MotorDriver {
    bus: KincoBus,
    drive: Drive,
}

impl MotorDriver {
    /// Open the serial port and address one drive on it
    pub fn new(port: &str, node: NodeId) -> Result<Self> {
        Self::with_options(
            port,
            super::kinco::DEFAULT_BAUDRATE,
            node,
            DEFAULT_ENCODER_RESOLUTION,
        )
    }

    /// Open with custom baudrate and encoder resolution
    pub fn with_options(
        port: &str,
        baudrate: u32,
        node: NodeId,
        resolution: u32,
    ) -> Result<Self> {
        info!("Opening drive bus on {} at {} Bd", port, baudrate);
        let bus = KincoBus::open_with_baudrate(port, baudrate)?;
        Ok(Self {
            bus,
            drive: Drive::with_resolution(node, resolution),
        })
    }

    /// Command a new motor speed.
    ///
    /// Builds the full mode/velocity/enable sequence and transmits it in
    /// order. On failure the whole command must be re-issued; the drive may
    /// be left mid-transition and nothing is read back to find out.
    pub fn set_speed(&mut self, rpm: i32) -> Result<()> {
        info!("Setting node {} speed to {} rpm", self.node().get(), rpm);
        let sequence = self.drive.set_speed(rpm)?;
        self.bus.send(&sequence)
    }

    /// Ramp the motor to zero and disable operation
    pub fn stop(&mut self) -> Result<()> {
        info!("Stopping node {}", self.node().get());
        let sequence = self.drive.stop()?;
        self.bus.send(&sequence)
    }

    pub fn node(&self) -> NodeId {
        self.drive.node()
    }
}
