//! Hosting adapter around the readout controller

use readout_control::{ReadoutController, ReadoutError};
use readout_core::RegisterAccess;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};

/// Error returned to the host for any failed get/set
#[derive(Error, Debug)]
#[error("Readout processor error")]
pub struct AdapterError(#[from] pub ReadoutError);

/// Adapter lifecycle: initialize, get/set by path, cleanup
pub struct ReadoutAdapter<A> {
    controller: ReadoutController<A>,
}

impl<A: RegisterAccess> ReadoutAdapter<A> {
    pub fn new(controller: ReadoutController<A>) -> Self {
        Self { controller }
    }

    /// Called once the host has created all of its adapters
    pub fn initialize(&mut self, adapters: &[&str]) {
        debug!(adapters = ?adapters, "Adapters initialized");
    }

    pub fn get(&self, path: &str) -> Result<Value, AdapterError> {
        self.controller.get(path).map_err(|e| {
            error!(path = %path, error = %e, "Get failed");
            AdapterError(e)
        })
    }

    pub fn set(&mut self, path: &str, value: &Value) -> Result<(), AdapterError> {
        self.controller.set(path, value).map_err(|e| {
            error!(path = %path, error = %e, "Set failed");
            AdapterError(e)
        })
    }

    pub fn cleanup(&mut self) {
        info!("Cleaning up readout processor controller");
    }

    pub fn controller(&self) -> &ReadoutController<A> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ReadoutController<A> {
        &mut self.controller
    }
}
