//! Readout reset sequence
//!
//! `reset` clears the acquisition enables, then pulses each reset domain
//! high then low, one domain at a time in a fixed order. `reactivate` sets
//! the acquisition enables again. Both are best-effort: a failed register
//! write stops the sequence, gets logged, and is reported in the returned
//! [`SequenceOutcome`] rather than as an error. Whether the link came back
//! has to be checked through the health monitor.

use readout_core::{BitField, DeviceIoError, RegisterAccess, RegisterMap, RegisterRef};
use std::fmt;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::names::RegisterNames;

/// Acquisition enable bits, cleared by reset and set by reactivate
pub const ENABLE_BITS: [&str; 2] = ["acquire", "manual_trig"];

/// Reset domains in the order they are pulsed
pub const RESET_DOMAINS: [&str; 5] = [
    "data_path_reset",
    "aurora_reset",
    "cmac_0_reset",
    "cmac_1_reset",
    "cmac_2_reset",
];

/// One register write within a sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceStep {
    Disable(String),
    Assert(String),
    Release(String),
    Enable(String),
}

impl fmt::Display for SequenceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceStep::Disable(bit) => write!(f, "clear {}", bit),
            SequenceStep::Assert(bit) => write!(f, "assert {}", bit),
            SequenceStep::Release(bit) => write!(f, "release {}", bit),
            SequenceStep::Enable(bit) => write!(f, "set {}", bit),
        }
    }
}

/// Result of a best-effort sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// Every write went through
    Completed,
    /// The sequence stopped at `step`; earlier writes were applied
    AttemptedWithWarnings {
        step: SequenceStep,
        error: DeviceIoError,
    },
}

impl SequenceOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SequenceOutcome::Completed)
    }
}

/// Reset plan resolved once from the register map
#[derive(Debug, Clone)]
pub struct ResetSequencer {
    control: RegisterRef,
    enables: Vec<BitField>,
    resets: RegisterRef,
    domains: Vec<BitField>,
}

impl ResetSequencer {
    pub fn resolve(map: &impl RegisterMap, names: &RegisterNames) -> Result<Self> {
        let control = map.resolve(None, &names.acq_control)?;
        let resets = map.resolve(None, &names.clock_resets)?;

        let enables = ENABLE_BITS
            .iter()
            .map(|name| control.field(name))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let domains = RESET_DOMAINS
            .iter()
            .map(|name| resets.field(name))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            control,
            enables,
            resets,
            domains,
        })
    }

    pub fn control_register(&self) -> &RegisterRef {
        &self.control
    }

    pub fn reset_register(&self) -> &RegisterRef {
        &self.resets
    }

    pub fn reset_domains(&self) -> &[BitField] {
        &self.domains
    }

    /// Stop acquisition and pulse every reset domain
    pub fn reset(&self, bus: &mut impl RegisterAccess) -> SequenceOutcome {
        debug!("Readout manual trigger and acquire OFF");
        match self.run_reset(bus) {
            Ok(()) => {
                info!(domains = self.domains.len(), "Readout reset sequence complete");
                SequenceOutcome::Completed
            }
            Err((step, err)) => {
                error!(step = %step, error = %err, "Reset failed");
                SequenceOutcome::AttemptedWithWarnings { step, error: err }
            }
        }
    }

    /// Turn acquire and manual trigger back on
    pub fn reactivate(&self, bus: &mut impl RegisterAccess) -> SequenceOutcome {
        debug!("Readout manual trigger and acquire ON");
        let result = self.enables.iter().try_for_each(|bit| {
            bus.write_bit(true, &self.control, bit)
                .map_err(|e| (SequenceStep::Enable(bit.name.clone()), e))
        });
        match result {
            Ok(()) => SequenceOutcome::Completed,
            Err((step, err)) => {
                error!(step = %step, error = %err, "Setup after reset failed");
                SequenceOutcome::AttemptedWithWarnings { step, error: err }
            }
        }
    }

    fn run_reset(
        &self,
        bus: &mut impl RegisterAccess,
    ) -> std::result::Result<(), (SequenceStep, DeviceIoError)> {
        for bit in &self.enables {
            bus.write_bit(false, &self.control, bit)
                .map_err(|e| (SequenceStep::Disable(bit.name.clone()), e))?;
        }

        for bit in &self.domains {
            bus.write_bit(true, &self.resets, bit)
                .map_err(|e| (SequenceStep::Assert(bit.name.clone()), e))?;
            bus.write_bit(false, &self.resets, bit)
                .map_err(|e| (SequenceStep::Release(bit.name.clone()), e))?;
        }

        Ok(())
    }
}
