//! UDP output endpoint configuration
//!
//! Each UDP core has a source/destination IP register and a pair of
//! registers for each of the source/destination MAC addresses. Values go
//! in and out as text: dotted-quad IPs and colon-separated hex MACs.

use readout_core::{
    decode_ip, decode_mac, encode_ip_text, encode_mac, RegisterAccess, RegisterMap, RegisterRef,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::{ReadoutError, Result};
use crate::names::RegisterNames;

/// The configurable fields of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointField {
    SrcIp,
    DestIp,
    SrcMac,
    DestMac,
}

impl EndpointField {
    pub const ALL: [EndpointField; 4] = [
        EndpointField::DestIp,
        EndpointField::SrcIp,
        EndpointField::SrcMac,
        EndpointField::DestMac,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointField::SrcIp => "src_ip",
            EndpointField::DestIp => "dest_ip",
            EndpointField::SrcMac => "src_mac",
            EndpointField::DestMac => "dest_mac",
        }
    }
}

impl fmt::Display for EndpointField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndpointField {
    type Err = ReadoutError;

    fn from_str(s: &str) -> Result<Self> {
        EndpointField::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| ReadoutError::UnknownPath(s.to_string()))
    }
}

/// Upper/lower register pair holding one MAC address
#[derive(Debug, Clone)]
struct MacRegisters {
    upper: RegisterRef,
    lower: RegisterRef,
}

impl MacRegisters {
    fn resolve(map: &impl RegisterMap, block: &str, upper: &str, lower: &str) -> Result<Self> {
        Ok(Self {
            upper: map.resolve(Some(block), upper)?,
            lower: map.resolve(Some(block), lower)?,
        })
    }
}

/// Registers of one UDP output core
#[derive(Debug, Clone)]
pub struct UdpEndpoint {
    core: usize,
    src_ip: RegisterRef,
    dest_ip: RegisterRef,
    src_mac: MacRegisters,
    dest_mac: MacRegisters,
}

impl UdpEndpoint {
    pub fn resolve(
        map: &impl RegisterMap,
        register_names: &RegisterNames,
        core: usize,
    ) -> Result<Self> {
        let block = register_names.udp_block(core);
        Ok(Self {
            core,
            src_ip: map.resolve(Some(&block), &register_names.udp_src_ip)?,
            dest_ip: map.resolve(Some(&block), &register_names.udp_dst_ip)?,
            src_mac: MacRegisters::resolve(
                map,
                &block,
                &register_names.udp_src_mac_upper,
                &register_names.udp_src_mac_lower,
            )?,
            dest_mac: MacRegisters::resolve(
                map,
                &block,
                &register_names.udp_dst_mac_upper,
                &register_names.udp_dst_mac_lower,
            )?,
        })
    }

    pub fn core(&self) -> usize {
        self.core
    }

    /// Read a field and return its canonical text
    pub fn get_field(&self, bus: &impl RegisterAccess, field: EndpointField) -> Result<String> {
        let text = match field {
            EndpointField::SrcIp => decode_ip(bus.read(&self.src_ip)?).to_string(),
            EndpointField::DestIp => decode_ip(bus.read(&self.dest_ip)?).to_string(),
            EndpointField::SrcMac => read_mac(bus, &self.src_mac)?,
            EndpointField::DestMac => read_mac(bus, &self.dest_mac)?,
        };
        Ok(text)
    }

    /// Parse `text` and write it to the field's registers. Invalid text is
    /// rejected before anything is written.
    pub fn set_field(
        &self,
        bus: &mut impl RegisterAccess,
        field: EndpointField,
        text: &str,
    ) -> Result<()> {
        debug!(core = self.core, field = %field, value = %text, "Setting endpoint field");
        match field {
            EndpointField::SrcIp => bus.write(&self.src_ip, encode_ip_text(text)?)?,
            EndpointField::DestIp => bus.write(&self.dest_ip, encode_ip_text(text)?)?,
            EndpointField::SrcMac => write_mac(bus, &self.src_mac, text)?,
            EndpointField::DestMac => write_mac(bus, &self.dest_mac, text)?,
        }
        Ok(())
    }

    /// All four fields, in display order
    pub fn snapshot(&self, bus: &impl RegisterAccess) -> Result<Vec<(EndpointField, String)>> {
        EndpointField::ALL
            .into_iter()
            .map(|field| self.get_field(bus, field).map(|text| (field, text)))
            .collect()
    }
}

fn read_mac(bus: &impl RegisterAccess, regs: &MacRegisters) -> Result<String> {
    let upper = bus.read(&regs.upper)?;
    let lower = bus.read(&regs.lower)?;
    Ok(decode_mac(upper, lower).to_string())
}

// The two halves are not written atomically. If the second write fails the
// address is left half-updated and is not rolled back.
fn write_mac(bus: &mut impl RegisterAccess, regs: &MacRegisters, text: &str) -> Result<()> {
    let (upper, lower) = encode_mac(text)?;
    bus.write(&regs.upper, upper)?;
    if let Err(err) = bus.write(&regs.lower, lower) {
        warn!(
            register = %regs.lower.name,
            error = %err,
            "MAC address half-written: upper word updated, lower word failed"
        );
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use readout_core::names;
    use readout_core::{reference_map, FormatError, MemoryMap, RegisterBank};

    fn endpoint(core: usize) -> (MemoryMap, UdpEndpoint) {
        let map = reference_map();
        let ep = UdpEndpoint::resolve(&map, &RegisterNames::default(), core).unwrap();
        (map, ep)
    }

    fn reg(map: &MemoryMap, core: usize, name: &str) -> RegisterRef {
        map.resolve(Some(&format!("udp_core_0_{}", core)), name).unwrap()
    }

    #[test]
    fn test_field_names() {
        for field in EndpointField::ALL {
            assert_eq!(field.as_str().parse::<EndpointField>().unwrap(), field);
        }
        assert!("mac".parse::<EndpointField>().is_err());
    }

    #[test]
    fn test_get_src_mac() {
        let (map, ep) = endpoint(0);
        let mut bank = RegisterBank::new();
        bank.poke(&reg(&map, 0, names::UDP_SRC_MAC_UPPER), 0x0102);
        bank.poke(&reg(&map, 0, names::UDP_SRC_MAC_LOWER), 0x0304_0506);
        assert_eq!(
            ep.get_field(&bank, EndpointField::SrcMac).unwrap(),
            "01:02:03:04:05:06"
        );
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_set_dest_ip_writes_swapped_bytes() {
        let (map, ep) = endpoint(0);
        let mut bank = RegisterBank::new();
        ep.set_field(&mut bank, EndpointField::DestIp, "192.168.0.1").unwrap();
        assert_eq!(bank.peek(&reg(&map, 0, names::UDP_DST_IP)), 0x0100_A8C0);
    }

    #[test]
    fn test_set_then_get() {
        let (_, ep) = endpoint(1);
        let mut bank = RegisterBank::new();
        ep.set_field(&mut bank, EndpointField::SrcIp, "10.0.0.2").unwrap();
        ep.set_field(&mut bank, EndpointField::DestMac, "a0:b1:c2:d3:e4:f5").unwrap();
        assert_eq!(ep.get_field(&bank, EndpointField::SrcIp).unwrap(), "10.0.0.2");
        assert_eq!(
            ep.get_field(&bank, EndpointField::DestMac).unwrap(),
            "A0:B1:C2:D3:E4:F5"
        );
    }

    #[test]
    fn test_cores_are_independent() {
        let map = reference_map();
        let register_names = RegisterNames::default();
        let core_0 = UdpEndpoint::resolve(&map, &register_names, 0).unwrap();
        let core_1 = UdpEndpoint::resolve(&map, &register_names, 1).unwrap();
        let mut bank = RegisterBank::new();

        core_0.set_field(&mut bank, EndpointField::SrcMac, "11:22:33:44:55:66").unwrap();
        assert_eq!(
            core_1.get_field(&bank, EndpointField::SrcMac).unwrap(),
            "00:00:00:00:00:00"
        );
        assert_eq!(core_1.core(), 1);
    }

    #[test]
    fn test_invalid_text_writes_nothing() {
        let (_, ep) = endpoint(0);
        let mut bank = RegisterBank::new();
        let err = ep.set_field(&mut bank, EndpointField::SrcMac, "AA:BB:CC").unwrap_err();
        assert!(matches!(err, ReadoutError::Format(FormatError::InvalidMac(_))));
        let err = ep.set_field(&mut bank, EndpointField::DestIp, "300.1.1.1").unwrap_err();
        assert!(matches!(err, ReadoutError::Format(FormatError::InvalidIp(_))));
        assert!(bank.journal().is_empty());
    }

    #[test]
    fn test_mac_partial_write() {
        let (map, ep) = endpoint(0);
        let mut bank = RegisterBank::new();
        bank.fail_writes_after(1);
        let err = ep
            .set_field(&mut bank, EndpointField::DestMac, "AA:BB:CC:DD:EE:FF")
            .unwrap_err();
        assert!(matches!(err, ReadoutError::DeviceIo(_)));
        // Upper word landed, lower did not
        assert_eq!(bank.peek(&reg(&map, 0, names::UDP_DST_MAC_UPPER)), 0xAABB);
        assert_eq!(bank.peek(&reg(&map, 0, names::UDP_DST_MAC_LOWER)), 0);
    }

    #[test]
    fn test_read_failure_surfaces() {
        let (_, ep) = endpoint(0);
        let mut bank = RegisterBank::new();
        bank.fail_reads_of(names::UDP_SRC_MAC_LOWER);
        let err = ep.get_field(&bank, EndpointField::SrcMac).unwrap_err();
        match err {
            ReadoutError::DeviceIo(io) => assert_eq!(io.register, names::UDP_SRC_MAC_LOWER),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(ep.snapshot(&bank).is_err());
        assert_eq!(ep.get_field(&bank, EndpointField::SrcIp).unwrap(), "0.0.0.0");
    }

    #[test]
    fn test_snapshot_order() {
        let (_, ep) = endpoint(0);
        let bank = RegisterBank::new();
        let fields: Vec<EndpointField> = ep
            .snapshot(&bank)
            .unwrap()
            .into_iter()
            .map(|(f, _)| f)
            .collect();
        assert_eq!(fields, EndpointField::ALL.to_vec());
    }

    #[test]
    fn test_missing_core() {
        let map = reference_map();
        let err = UdpEndpoint::resolve(&map, &RegisterNames::default(), 2).unwrap_err();
        assert!(matches!(err, ReadoutError::Resolve(_)));
    }

    #[test]
    fn test_renamed_udp_register() {
        let mut map = reference_map();
        map.insert_in(
            "udp_core_0_0",
            RegisterRef::new("udp_core_control_dst_ip_addr_v2", 0x1018),
        );
        let register_names = RegisterNames {
            udp_dst_ip: "udp_core_control_dst_ip_addr_v2".to_string(),
            ..RegisterNames::default()
        };
        let ep = UdpEndpoint::resolve(&map, &register_names, 0).unwrap();
        let mut bank = RegisterBank::new();
        ep.set_field(&mut bank, EndpointField::DestIp, "10.0.0.9").unwrap();
        assert_eq!(
            bank.journal()[0].register(),
            "udp_core_control_dst_ip_addr_v2"
        );
        // Core 1 has no register by that name
        assert!(UdpEndpoint::resolve(&map, &register_names, 1).is_err());
    }
}
