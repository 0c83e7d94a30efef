//! Conversions between raw register words and the values they carry
//!
//! The readout firmware splits several logical values across registers:
//! - the 48-bit frame counter lives in an upper and a lower 32-bit word
//! - MAC addresses live in an upper (16 bits used) and a lower 32-bit word
//! - IPv4 addresses are stored in host byte order, not network order

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::FormatError;

/// Combine the two halves of the 48-bit frame counter
pub fn decode_counter48(upper: u32, lower: u32) -> u64 {
    u64::from(lower) | (u64::from(upper) << 32)
}

/// A 48-bit Ethernet MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Split into the (upper, lower) register words
    pub fn to_words(&self) -> (u32, u32) {
        let [o0, o1, o2, o3, o4, o5] = self.0;
        let upper = (u32::from(o0) << 8) | u32::from(o1);
        let lower = (u32::from(o2) << 24)
            | (u32::from(o3) << 16)
            | (u32::from(o4) << 8)
            | u32::from(o5);
        (upper, lower)
    }

    /// Rebuild from the (upper, lower) register words. Bits of `upper`
    /// above the low 16 are not part of the address and are dropped.
    pub fn from_words(upper: u32, lower: u32) -> Self {
        let v = decode_counter48(upper, lower);
        Self([
            (v >> 40) as u8,
            (v >> 32) as u8,
            (v >> 24) as u8,
            (v >> 16) as u8,
            (v >> 8) as u8,
            v as u8,
        ])
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a, b, c, d, e, g
        )
    }
}

impl FromStr for MacAddress {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FormatError::InvalidMac(s.to_string());

        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(invalid)?;
            // from_str_radix tolerates a leading sign, so check digits first
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self(octets))
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

impl TryFrom<String> for MacAddress {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Decode the MAC register pair. `Display` gives the canonical text form.
pub fn decode_mac(upper: u32, lower: u32) -> MacAddress {
    MacAddress::from_words(upper, lower)
}

/// Parse colon-separated MAC text into the (upper, lower) register words
pub fn encode_mac(text: &str) -> Result<(u32, u32), FormatError> {
    Ok(text.parse::<MacAddress>()?.to_words())
}

/// Whether the host running this process stores words big-endian
pub const fn host_is_big_endian() -> bool {
    cfg!(target_endian = "big")
}

/// Decode an IP register. The register holds the address octets in the
/// host's native byte order.
pub fn decode_ip(raw: u32) -> Ipv4Addr {
    Ipv4Addr::from(raw.to_ne_bytes())
}

/// Encode an address for an IP register.
///
/// The octets are taken in network order and reversed unless the host is
/// big-endian. Skipping the swap configures a different address without
/// any error from the device.
pub fn encode_ip(addr: Ipv4Addr, host_is_big_endian: bool) -> u32 {
    let mut bytes = addr.octets();
    if !host_is_big_endian {
        bytes.reverse();
    }
    u32::from_be_bytes(bytes)
}

/// Parse dotted-quad text and encode it for this host
pub fn encode_ip_text(text: &str) -> Result<u32, FormatError> {
    let addr = parse_ip(text)?;
    Ok(encode_ip(addr, host_is_big_endian()))
}

/// Parse dotted-quad text
pub fn parse_ip(text: &str) -> Result<Ipv4Addr, FormatError> {
    text.parse::<Ipv4Addr>()
        .map_err(|_| FormatError::InvalidIp(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter48() {
        assert_eq!(decode_counter48(0, 0), 0);
        assert_eq!(decode_counter48(0, 0xFFFF_FFFF), 0xFFFF_FFFF);
        assert_eq!(decode_counter48(1, 0), 1 << 32);
        assert_eq!(decode_counter48(0xFFFF, 0x1234_5678), 0xFFFF_1234_5678);
    }

    #[test]
    fn test_decode_mac() {
        assert_eq!(decode_mac(0x0102, 0x0304_0506).to_string(), "01:02:03:04:05:06");
        assert_eq!(decode_mac(0xAABB, 0xCCDD_EEFF).to_string(), "AA:BB:CC:DD:EE:FF");
        // Only the low 16 bits of the upper word belong to the address
        assert_eq!(decode_mac(0xDEAD_0102, 0x0304_0506).octets(), [1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_encode_mac() {
        assert_eq!(
            encode_mac("AA:BB:CC:DD:EE:FF").unwrap(),
            (0xAABB, 0xCCDD_EEFF)
        );
        assert_eq!(encode_mac("01:02:03:04:05:06").unwrap(), (0x0102, 0x0304_0506));
    }

    #[test]
    fn test_mac_round_trip_normalizes_case() {
        for text in ["aa:bb:cc:dd:ee:ff", "00:0a:35:00:01:22", "F0:0D:ba:be:00:01"] {
            let (upper, lower) = encode_mac(text).unwrap();
            assert_eq!(decode_mac(upper, lower).to_string(), text.to_uppercase());
        }
    }

    #[test]
    fn test_encode_mac_rejects_bad_text() {
        for text in [
            "AA:BB:CC",
            "GG:00:00:00:00:00",
            "AA-BB-CC-DD-EE-FF",
            "AA:BB:CC:DD:EE:FF:00",
            "100:00:00:00:00:00",
            "+A:00:00:00:00:00",
            "AA:BB:CC:DD:EE:",
            " a:b:c:d:e:f ",
            "",
        ] {
            assert!(
                matches!(encode_mac(text), Err(FormatError::InvalidMac(_))),
                "accepted {:?}",
                text
            );
        }
    }

    #[test]
    fn test_mac_serde_as_text() {
        let mac: MacAddress = "00:0a:35:00:01:22".parse().unwrap();
        let text: String = mac.into();
        assert_eq!(text, "00:0A:35:00:01:22");
        assert!(MacAddress::try_from("nope".to_string()).is_err());
    }

    #[test]
    fn test_encode_ip_byte_order() {
        let addr = Ipv4Addr::new(192, 168, 0, 1);
        assert_eq!(encode_ip(addr, false), 0x0100_A8C0);
        assert_eq!(encode_ip(addr, true), 0xC0A8_0001);
    }

    #[test]
    fn test_ip_round_trip() {
        for addr in [
            Ipv4Addr::new(192, 168, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
            Ipv4Addr::new(255, 255, 255, 255),
            Ipv4Addr::new(0, 0, 0, 0),
        ] {
            assert_eq!(decode_ip(encode_ip(addr, host_is_big_endian())), addr);
        }
    }

    #[cfg(target_endian = "little")]
    #[test]
    fn test_decode_ip_little_endian_host() {
        assert_eq!(decode_ip(0x0100_A8C0), Ipv4Addr::new(192, 168, 0, 1));
        assert_eq!(encode_ip_text("192.168.0.1").unwrap(), 0x0100_A8C0);
    }

    #[test]
    fn test_parse_ip_rejects_bad_text() {
        for text in [
            "256.0.0.1",
            "192.168.0",
            "localhost",
            "1.2.3.4.5",
            " 10.0.0.1",
            "",
        ] {
            assert!(matches!(parse_ip(text), Err(FormatError::InvalidIp(_))));
        }
    }
}
