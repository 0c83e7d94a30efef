//! Error types shared by the readout crates

use std::fmt;
use thiserror::Error;

/// Text supplied for a register value could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid MAC address {0:?}: expected six colon-separated hex octets")]
    InvalidMac(String),
    #[error("Invalid IPv4 address {0:?}")]
    InvalidIp(String),
}

/// A register or bit-field could not be found in the register map
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Register {name} not found in the register map{}", in_block(.block))]
    RegisterNotFound { name: String, block: Option<String> },
    #[error("Register {register} has no field named {field}")]
    FieldNotFound { register: String, field: String },
}

fn in_block(block: &Option<String>) -> String {
    block
        .as_ref()
        .map(|b| format!(" (block {})", b))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDirection {
    Read,
    Write,
}

impl fmt::Display for IoDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoDirection::Read => f.write_str("read"),
            IoDirection::Write => f.write_str("write"),
        }
    }
}

/// A register round-trip to the device failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Register {direction} of {register} failed: {reason}")]
pub struct DeviceIoError {
    pub register: String,
    pub direction: IoDirection,
    pub reason: String,
}

impl DeviceIoError {
    pub fn read(register: &str, reason: impl Into<String>) -> Self {
        Self {
            register: register.to_string(),
            direction: IoDirection::Read,
            reason: reason.into(),
        }
    }

    pub fn write(register: &str, reason: impl Into<String>) -> Self {
        Self {
            register: register.to_string(),
            direction: IoDirection::Write,
            reason: reason.into(),
        }
    }
}
