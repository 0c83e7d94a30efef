//! Readout processor controller
//!
//! Resolves every register it needs once at construction and owns the
//! register accessor for its whole lifetime. Construction fails if any
//! required register or field is missing from the map.

use readout_core::{
    decode_counter48, BitField, RegisterAccess, RegisterMap, RegisterRef, UDP_CORE_COUNT,
};
use tracing::{debug, error, info};

use crate::endpoint::{EndpointField, UdpEndpoint};
use crate::error::{ReadoutError, Result};
use crate::health::{HealthMonitor, LinkStatus};
use crate::names::RegisterNames;
use crate::reset::{ResetSequencer, SequenceOutcome};

/// The 48-bit frame counter registers
#[derive(Debug, Clone)]
struct FrameCounter {
    upper: RegisterRef,
    lower: RegisterRef,
}

/// Monitors, resets and configures one readout device
pub struct ReadoutController<A> {
    bus: A,
    health: HealthMonitor,
    sequencer: ResetSequencer,
    frame_counter: FrameCounter,
    endpoints: Vec<UdpEndpoint>,
}

impl<A: RegisterAccess> ReadoutController<A> {
    pub fn new(map: &impl RegisterMap, bus: A, names: &RegisterNames) -> Result<Self> {
        let controller = Self::resolve(map, bus, names).map_err(|e| {
            error!(
                error = %e,
                "One of the required registers could not be found in the register map"
            );
            e
        })?;
        info!(
            udp_cores = controller.endpoints.len(),
            "Readout controller ready"
        );
        Ok(controller)
    }

    fn resolve(map: &impl RegisterMap, bus: A, names: &RegisterNames) -> Result<Self> {
        let frame_counter = FrameCounter {
            upper: map.resolve(None, &names.frame_num_upper)?,
            lower: map.resolve(None, &names.frame_num_lower)?,
        };
        let endpoints = (0..UDP_CORE_COUNT)
            .map(|core| UdpEndpoint::resolve(map, names, core))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            bus,
            health: HealthMonitor::resolve(map, names)?,
            sequencer: ResetSequencer::resolve(map, names)?,
            frame_counter,
            endpoints,
        })
    }

    /// Whether the readout link is currently healthy
    pub fn is_running(&self) -> Result<bool> {
        self.health.is_running(&self.bus)
    }

    pub fn link_status(&self) -> Result<LinkStatus> {
        self.health.link_status(&self.bus)
    }

    pub fn aurora_lane_up(&self) -> Result<bool> {
        Ok(self.health.aurora_lane_up(&self.bus)?)
    }

    pub fn aurora_channel_up(&self) -> Result<bool> {
        Ok(self.health.aurora_channel_up(&self.bus)?)
    }

    /// Current value of the 48-bit frame counter
    pub fn frame_number(&self) -> Result<u64> {
        let upper = self.bus.read(&self.frame_counter.upper)?;
        let lower = self.bus.read(&self.frame_counter.lower)?;
        Ok(decode_counter48(upper, lower))
    }

    /// Stop acquisition and reset every clock domain. Never fails; check
    /// [`ReadoutController::is_running`] afterwards.
    pub fn reset(&mut self) -> SequenceOutcome {
        self.sequencer.reset(&mut self.bus)
    }

    /// Restart acquisition after a reset
    pub fn reactivate(&mut self) -> SequenceOutcome {
        self.sequencer.reactivate(&mut self.bus)
    }

    pub fn endpoint(&self, core: usize) -> Result<&UdpEndpoint> {
        self.endpoints.get(core).ok_or(ReadoutError::NoSuchCore(core))
    }

    pub fn endpoints(&self) -> &[UdpEndpoint] {
        &self.endpoints
    }

    pub fn get_endpoint_field(&self, core: usize, field: EndpointField) -> Result<String> {
        self.endpoint(core)?.get_field(&self.bus, field)
    }

    pub fn set_endpoint_field(
        &mut self,
        core: usize,
        field: EndpointField,
        text: &str,
    ) -> Result<()> {
        let endpoint = self
            .endpoints
            .get(core)
            .ok_or(ReadoutError::NoSuchCore(core))?;
        endpoint.set_field(&mut self.bus, field, text)
    }

    /// Read one field of a control register
    pub fn read_field(&self, register: &RegisterRef, field: &BitField) -> Result<u32> {
        Ok(self.bus.read_field(register, field)?)
    }

    /// Write one field of a control register
    pub fn write_field(
        &mut self,
        register: &RegisterRef,
        field: &BitField,
        value: u32,
    ) -> Result<()> {
        debug!(register = %register.name, field = %field.name, value, "Writing field");
        Ok(self.bus.write_field(register, field, value)?)
    }

    pub fn health(&self) -> &HealthMonitor {
        &self.health
    }

    pub fn sequencer(&self) -> &ResetSequencer {
        &self.sequencer
    }

    pub fn bus(&self) -> &A {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut A {
        &mut self.bus
    }

    pub fn into_bus(self) -> A {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::AURORA_GOOD;
    use readout_core::names;
    use readout_core::{reference_map, MemoryMap, RegisterBank};

    fn controller() -> (MemoryMap, ReadoutController<RegisterBank>) {
        let map = reference_map();
        let ctrl = ReadoutController::new(&map, RegisterBank::new(), &RegisterNames::default())
            .unwrap();
        (map, ctrl)
    }

    #[test]
    fn test_frame_number() {
        let (map, mut ctrl) = controller();
        let upper = map.resolve(None, names::FRAME_NUMBER_UPPER).unwrap();
        let lower = map.resolve(None, names::FRAME_NUMBER_LOWER).unwrap();
        ctrl.bus_mut().poke(&upper, 0x0001);
        ctrl.bus_mut().poke(&lower, 0x0000_0002);
        assert_eq!(ctrl.frame_number().unwrap(), 0x1_0000_0002);
    }

    #[test]
    fn test_frame_number_read_failure() {
        let (_, mut ctrl) = controller();
        ctrl.bus_mut().fail_reads_of(names::FRAME_NUMBER_LOWER);
        match ctrl.frame_number() {
            Err(ReadoutError::DeviceIo(io)) => assert_eq!(io.register, names::FRAME_NUMBER_LOWER),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_reset_then_recover() {
        let (map, mut ctrl) = controller();
        assert!(!ctrl.is_running().unwrap());

        assert!(ctrl.reset().is_completed());
        // The device brings the link up on its own after the pulse
        let bank = ctrl.bus_mut();
        bank.poke(&map.resolve(None, names::AURORA_LANE).unwrap(), AURORA_GOOD);
        bank.poke(&map.resolve(None, names::AURORA_CHANNEL).unwrap(), AURORA_GOOD);
        bank.poke(&map.resolve(None, names::CMAC_STATUS).unwrap(), 0b11);
        assert!(ctrl.reactivate().is_completed());

        assert!(ctrl.is_running().unwrap());
        let control = map.resolve(None, names::ACQ_CONTROL).unwrap();
        assert_eq!(ctrl.bus().peek(&control) & 0b11, 0b11);
    }

    #[test]
    fn test_endpoint_access() {
        let (_, mut ctrl) = controller();
        ctrl.set_endpoint_field(1, EndpointField::SrcMac, "00:0A:35:00:01:22")
            .unwrap();
        assert_eq!(
            ctrl.get_endpoint_field(1, EndpointField::SrcMac).unwrap(),
            "00:0A:35:00:01:22"
        );
        assert_eq!(
            ctrl.get_endpoint_field(0, EndpointField::SrcMac).unwrap(),
            "00:00:00:00:00:00"
        );
        assert_eq!(
            ctrl.get_endpoint_field(2, EndpointField::SrcMac),
            Err(ReadoutError::NoSuchCore(2))
        );
    }

    #[test]
    fn test_construction_fails_on_missing_register() {
        let mut map = MemoryMap::new();
        map.insert(RegisterRef::new(names::AURORA_LANE, 0));
        let result = ReadoutController::new(&map, RegisterBank::new(), &RegisterNames::default());
        assert!(matches!(result, Err(ReadoutError::Resolve(_))));
    }

    #[test]
    fn test_renamed_register() {
        let map = reference_map();
        let register_names = RegisterNames {
            cmac_status: "cmac_status_v2".to_string(),
            ..RegisterNames::default()
        };
        assert!(ReadoutController::new(&map, RegisterBank::new(), &register_names).is_err());
    }
}
