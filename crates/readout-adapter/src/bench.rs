//! Bench device setup from configuration

use readout_core::{RegisterBank, RegisterMap, ResolveError};
use std::collections::BTreeMap;
use tracing::debug;

/// Create a bench device with the configured register presets applied.
/// Keys are `name` or `block/name`.
pub fn bench_device(
    map: &impl RegisterMap,
    presets: &BTreeMap<String, u32>,
) -> Result<RegisterBank, ResolveError> {
    let mut bank = RegisterBank::new();
    for (key, value) in presets {
        let register = match key.split_once('/') {
            Some((block, name)) => map.resolve(Some(block), name)?,
            None => map.resolve(None, key)?,
        };
        debug!(register = %key, value, "Preset register");
        bank.poke(&register, *value);
    }
    Ok(bank)
}
