//! Symbolic names of the registers the controller resolves

use readout_core::names;
use serde::{Deserialize, Serialize};

/// Register names looked up in the register map at construction.
/// Defaults match the HEXITEC-MHz readout firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterNames {
    #[serde(default = "default_aurora_lane")]
    pub aurora_lane: String,
    #[serde(default = "default_aurora_channel")]
    pub aurora_channel: String,
    /// Acquisition control register (acquire / manual trigger bits)
    #[serde(default = "default_acq_control")]
    pub acq_control: String,
    /// Per-domain reset register
    #[serde(default = "default_clock_resets")]
    pub clock_resets: String,
    #[serde(default = "default_frame_num_upper")]
    pub frame_num_upper: String,
    #[serde(default = "default_frame_num_lower")]
    pub frame_num_lower: String,
    #[serde(default = "default_cmac_status")]
    pub cmac_status: String,
    /// Block prefix of the UDP cores; core `n` is the block `<prefix><n>`
    #[serde(default = "default_udp_block_prefix")]
    pub udp_block_prefix: String,
    /// Registers inside each UDP core block
    #[serde(default = "default_udp_src_mac_upper")]
    pub udp_src_mac_upper: String,
    #[serde(default = "default_udp_src_mac_lower")]
    pub udp_src_mac_lower: String,
    #[serde(default = "default_udp_dst_mac_upper")]
    pub udp_dst_mac_upper: String,
    #[serde(default = "default_udp_dst_mac_lower")]
    pub udp_dst_mac_lower: String,
    #[serde(default = "default_udp_src_ip")]
    pub udp_src_ip: String,
    #[serde(default = "default_udp_dst_ip")]
    pub udp_dst_ip: String,
}

impl Default for RegisterNames {
    fn default() -> Self {
        Self {
            aurora_lane: default_aurora_lane(),
            aurora_channel: default_aurora_channel(),
            acq_control: default_acq_control(),
            clock_resets: default_clock_resets(),
            frame_num_upper: default_frame_num_upper(),
            frame_num_lower: default_frame_num_lower(),
            cmac_status: default_cmac_status(),
            udp_block_prefix: default_udp_block_prefix(),
            udp_src_mac_upper: default_udp_src_mac_upper(),
            udp_src_mac_lower: default_udp_src_mac_lower(),
            udp_dst_mac_upper: default_udp_dst_mac_upper(),
            udp_dst_mac_lower: default_udp_dst_mac_lower(),
            udp_src_ip: default_udp_src_ip(),
            udp_dst_ip: default_udp_dst_ip(),
        }
    }
}

impl RegisterNames {
    pub fn udp_block(&self, core: usize) -> String {
        format!("{}{}", self.udp_block_prefix, core)
    }
}

fn default_aurora_lane() -> String {
    names::AURORA_LANE.to_string()
}

fn default_aurora_channel() -> String {
    names::AURORA_CHANNEL.to_string()
}

fn default_acq_control() -> String {
    names::ACQ_CONTROL.to_string()
}

fn default_clock_resets() -> String {
    names::CLOCK_RESETS.to_string()
}

fn default_frame_num_upper() -> String {
    names::FRAME_NUMBER_UPPER.to_string()
}

fn default_frame_num_lower() -> String {
    names::FRAME_NUMBER_LOWER.to_string()
}

fn default_cmac_status() -> String {
    names::CMAC_STATUS.to_string()
}

fn default_udp_block_prefix() -> String {
    names::UDP_BLOCK_PREFIX.to_string()
}

fn default_udp_src_mac_upper() -> String {
    names::UDP_SRC_MAC_UPPER.to_string()
}

fn default_udp_src_mac_lower() -> String {
    names::UDP_SRC_MAC_LOWER.to_string()
}

fn default_udp_dst_mac_upper() -> String {
    names::UDP_DST_MAC_UPPER.to_string()
}

fn default_udp_dst_mac_lower() -> String {
    names::UDP_DST_MAC_LOWER.to_string()
}

fn default_udp_src_ip() -> String {
    names::UDP_SRC_IP.to_string()
}

fn default_udp_dst_ip() -> String {
    names::UDP_DST_IP.to_string()
}
