use readout_core::{DeviceIoError, FormatError, ResolveError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadoutError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    DeviceIo(#[from] DeviceIoError),
    #[error("No UDP core {0}")]
    NoSuchCore(usize),
    #[error("Invalid path: {0}")]
    UnknownPath(String),
    #[error("Path {0} is read-only")]
    ReadOnly(String),
    #[error("Path {0} is write-only")]
    WriteOnly(String),
    #[error("Invalid value for {path}: {reason}")]
    InvalidValue { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ReadoutError>;
