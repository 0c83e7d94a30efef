//! Readout link health
//!
//! The link is healthy when both aurora status registers read the all-lanes
//! value and both CMAC lane-up bits are set. Nothing is cached: every query
//! goes to the device.

use readout_core::{BitField, DeviceIoError, RegisterAccess, RegisterMap, RegisterRef};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::names::RegisterNames;

/// Aurora lane/channel value when every lane is up. Anything else means a
/// degraded or absent link.
pub const AURORA_GOOD: u32 = 0xFFFFF;

pub const CMAC_0_LANE_UP: &str = "cmac_0_lane_up";
pub const CMAC_1_LANE_UP: &str = "cmac_1_lane_up";

/// Per-signal breakdown of one health query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStatus {
    pub aurora_lane: bool,
    pub aurora_channel: bool,
    pub cmac_0: bool,
    pub cmac_1: bool,
}

impl LinkStatus {
    pub fn is_healthy(&self) -> bool {
        self.aurora_lane && self.aurora_channel && self.cmac_0 && self.cmac_1
    }
}

/// Resolved handles for the four health signals
#[derive(Debug, Clone)]
pub struct HealthMonitor {
    aurora_lane: RegisterRef,
    aurora_channel: RegisterRef,
    cmac_status: RegisterRef,
    cmac_0: BitField,
    cmac_1: BitField,
}

impl HealthMonitor {
    pub fn resolve(map: &impl RegisterMap, names: &RegisterNames) -> Result<Self> {
        let cmac_status = map.resolve(None, &names.cmac_status)?;
        Ok(Self {
            aurora_lane: map.resolve(None, &names.aurora_lane)?,
            aurora_channel: map.resolve(None, &names.aurora_channel)?,
            cmac_0: cmac_status.field(CMAC_0_LANE_UP)?,
            cmac_1: cmac_status.field(CMAC_1_LANE_UP)?,
            cmac_status,
        })
    }

    pub fn aurora_lane_up(
        &self,
        bus: &impl RegisterAccess,
    ) -> std::result::Result<bool, DeviceIoError> {
        Ok(bus.read(&self.aurora_lane)? == AURORA_GOOD)
    }

    pub fn aurora_channel_up(
        &self,
        bus: &impl RegisterAccess,
    ) -> std::result::Result<bool, DeviceIoError> {
        Ok(bus.read(&self.aurora_channel)? == AURORA_GOOD)
    }

    /// Read all four signals
    pub fn link_status(&self, bus: &impl RegisterAccess) -> Result<LinkStatus> {
        Ok(LinkStatus {
            aurora_lane: self.aurora_lane_up(bus)?,
            aurora_channel: self.aurora_channel_up(bus)?,
            cmac_0: bus.read_bit(&self.cmac_status, &self.cmac_0)?,
            cmac_1: bus.read_bit(&self.cmac_status, &self.cmac_1)?,
        })
    }

    /// Whether the readout link is currently operating correctly
    pub fn is_running(&self, bus: &impl RegisterAccess) -> Result<bool> {
        Ok(self.link_status(bus)?.is_healthy())
    }

    pub fn cmac_status(&self) -> &RegisterRef {
        &self.cmac_status
    }

    /// The lane-up bits exposed for inspection
    pub fn cmac_fields(&self) -> [&BitField; 2] {
        [&self.cmac_0, &self.cmac_1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readout_core::names;
    use readout_core::{reference_map, RegisterBank};

    fn healthy_bank(map: &impl RegisterMap) -> RegisterBank {
        let mut bank = RegisterBank::new();
        bank.poke(&map.resolve(None, names::AURORA_LANE).unwrap(), AURORA_GOOD);
        bank.poke(&map.resolve(None, names::AURORA_CHANNEL).unwrap(), AURORA_GOOD);
        bank.poke(&map.resolve(None, names::CMAC_STATUS).unwrap(), 0b011);
        bank
    }

    #[test]
    fn test_healthy_link() {
        let map = reference_map();
        let monitor = HealthMonitor::resolve(&map, &RegisterNames::default()).unwrap();
        let bank = healthy_bank(&map);
        assert!(monitor.is_running(&bank).unwrap());
    }

    #[test]
    fn test_any_single_failure_is_unhealthy() {
        let map = reference_map();
        let monitor = HealthMonitor::resolve(&map, &RegisterNames::default()).unwrap();
        let lane = map.resolve(None, names::AURORA_LANE).unwrap();
        let chan = map.resolve(None, names::AURORA_CHANNEL).unwrap();
        let cmac = map.resolve(None, names::CMAC_STATUS).unwrap();

        let breakages: [(&RegisterRef, u32); 5] = [
            (&lane, 0xFFFFE),
            (&lane, 0),
            (&chan, 0x1FFFFF),
            (&cmac, 0b010),
            (&cmac, 0b001),
        ];
        for (reg, value) in breakages {
            let mut bank = healthy_bank(&map);
            bank.poke(reg, value);
            assert!(
                !monitor.is_running(&bank).unwrap(),
                "{} = {:#x} reported healthy",
                reg.name,
                value
            );
        }
    }

    #[test]
    fn test_status_is_not_sticky() {
        let map = reference_map();
        let monitor = HealthMonitor::resolve(&map, &RegisterNames::default()).unwrap();
        let cmac = map.resolve(None, names::CMAC_STATUS).unwrap();
        let mut bank = healthy_bank(&map);

        bank.poke(&cmac, 0);
        let status = monitor.link_status(&bank).unwrap();
        assert!(status.aurora_lane && status.aurora_channel);
        assert!(!status.cmac_0 && !status.cmac_1);

        bank.poke(&cmac, 0b011);
        assert!(monitor.is_running(&bank).unwrap());
    }

    #[test]
    fn test_read_failure_surfaces() {
        let map = reference_map();
        let monitor = HealthMonitor::resolve(&map, &RegisterNames::default()).unwrap();
        let mut bank = healthy_bank(&map);
        bank.fail_reads_of(names::AURORA_CHANNEL);
        assert!(monitor.is_running(&bank).is_err());
        assert!(monitor.aurora_lane_up(&bank).unwrap());
    }

    #[test]
    fn test_missing_lane_up_field() {
        let mut map = readout_core::MemoryMap::new();
        map.insert(RegisterRef::new(names::AURORA_LANE, 0))
            .insert(RegisterRef::new(names::AURORA_CHANNEL, 4))
            .insert(RegisterRef::new(names::CMAC_STATUS, 8));
        assert!(HealthMonitor::resolve(&map, &RegisterNames::default()).is_err());
    }
}
