//! Register names of the HEXITEC-MHz readout firmware

pub const AURORA_LANE: &str = "aurora_lane_up";
pub const AURORA_CHANNEL: &str = "aurora_chan_up";
pub const ACQ_CONTROL: &str = "hexitec_mhz_front_end_hexitec_hist_frame_generator_acq_ctrl";
pub const CLOCK_RESETS: &str = "domain_resets";
pub const FRAME_NUMBER_UPPER: &str =
    "hexitec_mhz_front_end_hexitec_hist_frame_generator_frame_number_upper";
pub const FRAME_NUMBER_LOWER: &str =
    "hexitec_mhz_front_end_hexitec_hist_frame_generator_frame_number_lower";
pub const CMAC_STATUS: &str = "cmac_status";

/// UDP cores live in blocks named `udp_core_0_<core>`
pub const UDP_BLOCK_PREFIX: &str = "udp_core_0_";
pub const UDP_SRC_MAC_UPPER: &str = "udp_core_control_src_mac_addr_upper";
pub const UDP_SRC_MAC_LOWER: &str = "udp_core_control_src_mac_addr_lower";
pub const UDP_DST_MAC_UPPER: &str = "udp_core_control_dst_mac_addr_upper";
pub const UDP_DST_MAC_LOWER: &str = "udp_core_control_dst_mac_addr_lower";
pub const UDP_SRC_IP: &str = "udp_core_control_src_ip_addr";
pub const UDP_DST_IP: &str = "udp_core_control_dst_ip_addr";
