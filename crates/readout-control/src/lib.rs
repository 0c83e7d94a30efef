//! Readout Control - Monitoring, recovery and endpoint configuration
//!
//! This crate drives the readout processor through its registers:
//! - Link health from the aurora and CMAC status signals
//! - The ordered reset / reactivate sequence
//! - Source/destination IP and MAC of the two UDP output cores
//! - Key-path access to all of the above

pub mod controller;
pub mod endpoint;
pub mod error;
pub mod health;
pub mod names;
pub mod reset;
pub mod tree;

pub use controller::ReadoutController;
pub use endpoint::{EndpointField, UdpEndpoint};
pub use error::{ReadoutError, Result};
pub use health::{HealthMonitor, LinkStatus, AURORA_GOOD};
pub use names::RegisterNames;
pub use reset::{ResetSequencer, SequenceOutcome, SequenceStep};
pub use tree::{ControlRegister, TreePath};
