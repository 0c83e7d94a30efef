//! Key-path access to the controller
//!
//! External callers address values with slash-separated paths such as
//! `status/is_running` or `udp/core_0/dest_ip`. Paths are parsed into a
//! [`TreePath`] and dispatched by match, so every path has its getter and
//! setter wired in one place.

use readout_core::{BitField, RegisterAccess, RegisterRef};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::controller::ReadoutController;
use crate::endpoint::EndpointField;
use crate::error::{ReadoutError, Result};
use crate::reset::RESET_DOMAINS;

/// Which control register a field path refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlRegister {
    /// `status/clock_resets/<field>`, limited to the reset domains
    ClockResets,
    /// `status/acq_control/<field>`, every field of the register
    AcqControl,
    /// `status/cmac/<field>`, the two lane-up bits, read-only
    Cmac,
}

impl ControlRegister {
    fn as_str(&self) -> &'static str {
        match self {
            ControlRegister::ClockResets => "clock_resets",
            ControlRegister::AcqControl => "acq_control",
            ControlRegister::Cmac => "cmac",
        }
    }
}

/// A parsed tree path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreePath {
    /// The whole tree
    Root,
    IsRunning,
    Reset,
    Reactivate,
    FrameNumber,
    AuroraLane,
    AuroraChannel,
    Field {
        register: ControlRegister,
        field: String,
    },
    Udp {
        core: usize,
        field: EndpointField,
    },
}

impl FromStr for TreePath {
    type Err = ReadoutError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || ReadoutError::UnknownPath(s.to_string());
        let parts: Vec<&str> = s
            .trim_matches('/')
            .split('/')
            .filter(|p| !p.is_empty())
            .collect();

        let path = match parts.as_slice() {
            [] => TreePath::Root,
            ["status", "is_running"] => TreePath::IsRunning,
            ["status", "reset"] => TreePath::Reset,
            ["status", "reactivate"] => TreePath::Reactivate,
            ["status", "frame_number"] => TreePath::FrameNumber,
            ["status", "aurora", "lane"] => TreePath::AuroraLane,
            ["status", "aurora", "channel"] => TreePath::AuroraChannel,
            ["status", "clock_resets", field] => TreePath::Field {
                register: ControlRegister::ClockResets,
                field: field.to_string(),
            },
            ["status", "acq_control", field] => TreePath::Field {
                register: ControlRegister::AcqControl,
                field: field.to_string(),
            },
            ["status", "cmac", field] => TreePath::Field {
                register: ControlRegister::Cmac,
                field: field.to_string(),
            },
            ["udp", core, field] => {
                let core = core
                    .strip_prefix("core_")
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(unknown)?;
                let field = field.parse().map_err(|_| unknown())?;
                TreePath::Udp { core, field }
            }
            _ => return Err(unknown()),
        };
        Ok(path)
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreePath::Root => Ok(()),
            TreePath::IsRunning => f.write_str("status/is_running"),
            TreePath::Reset => f.write_str("status/reset"),
            TreePath::Reactivate => f.write_str("status/reactivate"),
            TreePath::FrameNumber => f.write_str("status/frame_number"),
            TreePath::AuroraLane => f.write_str("status/aurora/lane"),
            TreePath::AuroraChannel => f.write_str("status/aurora/channel"),
            TreePath::Field { register, field } => {
                write!(f, "status/{}/{}", register.as_str(), field)
            }
            TreePath::Udp { core, field } => write!(f, "udp/core_{}/{}", core, field),
        }
    }
}

impl<A: RegisterAccess> ReadoutController<A> {
    /// Read the value at `path`
    pub fn get(&self, path: &str) -> Result<Value> {
        let parsed: TreePath = path.parse()?;
        match &parsed {
            TreePath::Root => self.tree_snapshot(),
            TreePath::IsRunning => Ok(Value::Bool(self.is_running()?)),
            TreePath::Reset | TreePath::Reactivate => {
                Err(ReadoutError::WriteOnly(parsed.to_string()))
            }
            TreePath::FrameNumber => Ok(json!(self.frame_number()?)),
            TreePath::AuroraLane => Ok(Value::Bool(self.aurora_lane_up()?)),
            TreePath::AuroraChannel => Ok(Value::Bool(self.aurora_channel_up()?)),
            TreePath::Field { register, field } => {
                let (reg, bit) = self.control_field(*register, field, &parsed)?;
                let value = self.read_field(&reg, &bit)?;
                Ok(field_value(*register, value))
            }
            TreePath::Udp { core, field } => {
                Ok(Value::String(self.get_endpoint_field(*core, *field)?))
            }
        }
    }

    /// Write `value` at `path`
    pub fn set(&mut self, path: &str, value: &Value) -> Result<()> {
        let parsed: TreePath = path.parse()?;
        match &parsed {
            TreePath::Reset => {
                self.reset();
                Ok(())
            }
            TreePath::Reactivate => {
                self.reactivate();
                Ok(())
            }
            TreePath::Root
            | TreePath::IsRunning
            | TreePath::FrameNumber
            | TreePath::AuroraLane
            | TreePath::AuroraChannel
            | TreePath::Field {
                register: ControlRegister::Cmac,
                ..
            } => Err(ReadoutError::ReadOnly(parsed.to_string())),
            TreePath::Field { register, field } => {
                let (reg, bit) = self.control_field(*register, field, &parsed)?;
                let raw = field_input(value).ok_or_else(|| ReadoutError::InvalidValue {
                    path: parsed.to_string(),
                    reason: format!("expected an integer or boolean, got {}", value),
                })?;
                if u64::from(raw) > u64::from(bit.mask() >> bit.offset) {
                    return Err(ReadoutError::InvalidValue {
                        path: parsed.to_string(),
                        reason: format!("{} does not fit in {} bit(s)", raw, bit.width),
                    });
                }
                self.write_field(&reg, &bit, raw)
            }
            TreePath::Udp { core, field } => {
                let text = value.as_str().ok_or_else(|| ReadoutError::InvalidValue {
                    path: parsed.to_string(),
                    reason: format!("expected a string, got {}", value),
                })?;
                self.set_endpoint_field(*core, *field, text)
            }
        }
    }

    fn control_field(
        &self,
        register: ControlRegister,
        field: &str,
        path: &TreePath,
    ) -> Result<(RegisterRef, BitField)> {
        let unknown = || ReadoutError::UnknownPath(path.to_string());
        let reg = match register {
            ControlRegister::ClockResets => {
                if !RESET_DOMAINS.contains(&field) {
                    return Err(unknown());
                }
                self.sequencer().reset_register()
            }
            ControlRegister::AcqControl => self.sequencer().control_register(),
            ControlRegister::Cmac => {
                if !self.health().cmac_fields().iter().any(|f| f.name == field) {
                    return Err(unknown());
                }
                self.health().cmac_status()
            }
        };
        let bit = reg.field(field).map_err(|_| unknown())?;
        Ok((reg.clone(), bit))
    }

    /// Every readable value, nested by path
    pub fn tree_snapshot(&self) -> Result<Value> {
        let control = self.sequencer().control_register();
        let resets = self.sequencer().reset_register();
        let cmac = self.health().cmac_status();

        let mut clock_resets = Map::new();
        for bit in self.sequencer().reset_domains() {
            clock_resets.insert(bit.name.clone(), json!(self.read_field(resets, bit)?));
        }
        let mut acq_control = Map::new();
        for bit in &control.fields {
            acq_control.insert(bit.name.clone(), json!(self.read_field(control, bit)?));
        }
        let mut cmac_bits = Map::new();
        for bit in self.health().cmac_fields() {
            cmac_bits.insert(bit.name.clone(), json!(self.read_field(cmac, bit)? != 0));
        }

        let mut udp = Map::new();
        for endpoint in self.endpoints() {
            let mut fields = Map::new();
            for (field, text) in endpoint.snapshot(self.bus())? {
                fields.insert(field.to_string(), Value::String(text));
            }
            udp.insert(format!("core_{}", endpoint.core()), Value::Object(fields));
        }

        Ok(json!({
            "status": {
                "is_running": self.is_running()?,
                "frame_number": self.frame_number()?,
                "aurora": {
                    "lane": self.aurora_lane_up()?,
                    "channel": self.aurora_channel_up()?,
                },
                "clock_resets": clock_resets,
                "acq_control": acq_control,
                "cmac": cmac_bits,
            },
            "udp": udp,
        }))
    }
}

fn field_value(register: ControlRegister, value: u32) -> Value {
    match register {
        ControlRegister::Cmac => Value::Bool(value != 0),
        _ => json!(value),
    }
}

fn field_input(value: &Value) -> Option<u32> {
    match value {
        Value::Bool(b) => Some(u32::from(*b)),
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        _ => None,
    }
}
