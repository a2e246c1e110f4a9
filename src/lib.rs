//! Serial command encoding and transport for Kinco servo drives.
//!
//! The drive speaks a compact CANopen-SDO-style write protocol over its
//! RS-232 port: every object write is one fixed 10-byte frame with an
//! additive checksum, and every logical motor command is an ordered group
//! of such frames.

pub mod config;
pub mod motor;
