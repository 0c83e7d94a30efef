//! Readout Core - Register codecs and register access for the readout processor
//!
//! This crate provides the building blocks shared by the readout crates:
//! - Codecs for values split across registers (frame counter, MAC, IPv4)
//! - Register map and register access traits
//! - Default register names of the readout firmware
//! - An in-memory bench device with the reference register layout

pub mod bench;
pub mod codec;
pub mod error;
pub mod names;
pub mod register;

pub use bench::{reference_map, BusWrite, RegisterBank, UDP_CORE_COUNT};
pub use codec::{
    decode_counter48, decode_ip, decode_mac, encode_ip, encode_ip_text, encode_mac,
    host_is_big_endian, parse_ip, MacAddress,
};
pub use error::{DeviceIoError, FormatError, IoDirection, ResolveError};
pub use register::{BitField, MemoryMap, RegisterAccess, RegisterMap, RegisterRef};
