//! In-memory bench device
//!
//! [`RegisterBank`] stands in for the physical register bus. It stores one
//! word per register address, keeps a journal of every write, and can be
//! told to fail reads or writes so recovery paths can be exercised.

use std::collections::{HashMap, HashSet};
use tracing::trace;

use crate::error::DeviceIoError;
use crate::names;
use crate::register::{BitField, MemoryMap, RegisterAccess, RegisterRef};

/// One write observed on the bench bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusWrite {
    /// Whole-register write
    Register { register: String, value: u32 },
    /// Field write (recorded once, not as the underlying read-modify-write)
    Field {
        register: String,
        field: String,
        value: u32,
    },
}

impl BusWrite {
    pub fn register(&self) -> &str {
        match self {
            BusWrite::Register { register, .. } | BusWrite::Field { register, .. } => register,
        }
    }
}

/// Register storage with a write journal and fault injection
#[derive(Debug, Default)]
pub struct RegisterBank {
    words: HashMap<u32, u32>,
    journal: Vec<BusWrite>,
    failing_reads: HashSet<String>,
    /// Remaining writes before every further write fails
    write_budget: Option<usize>,
}

impl RegisterBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register without going through the bus (no journal entry)
    pub fn poke(&mut self, register: &RegisterRef, value: u32) {
        self.words.insert(register.address, value);
    }

    /// Set a field without going through the bus (no journal entry)
    pub fn poke_field(&mut self, register: &RegisterRef, field: &BitField, value: u32) {
        let word = self.peek(register);
        self.poke(register, field.insert(word, value));
    }

    /// Current register contents; unwritten registers read as zero
    pub fn peek(&self, register: &RegisterRef) -> u32 {
        self.words.get(&register.address).copied().unwrap_or(0)
    }

    pub fn journal(&self) -> &[BusWrite] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Make every read of the named register fail
    pub fn fail_reads_of(&mut self, register: &str) {
        self.failing_reads.insert(register.to_string());
    }

    /// Allow `count` more writes, then fail all subsequent ones
    pub fn fail_writes_after(&mut self, count: usize) {
        self.write_budget = Some(count);
    }

    /// Remove all injected faults
    pub fn heal(&mut self) {
        self.failing_reads.clear();
        self.write_budget = None;
    }

    fn take_write(&mut self, register: &str) -> Result<(), DeviceIoError> {
        match self.write_budget.as_mut() {
            Some(0) => Err(DeviceIoError::write(register, "bus write rejected")),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl RegisterAccess for RegisterBank {
    fn read(&self, register: &RegisterRef) -> Result<u32, DeviceIoError> {
        if self.failing_reads.contains(&register.name) {
            return Err(DeviceIoError::read(&register.name, "bus read timed out"));
        }
        let value = self.peek(register);
        trace!(register = %register.name, address = register.address, value, "read");
        Ok(value)
    }

    fn write(&mut self, register: &RegisterRef, value: u32) -> Result<(), DeviceIoError> {
        self.take_write(&register.name)?;
        trace!(register = %register.name, address = register.address, value, "write");
        self.words.insert(register.address, value);
        self.journal.push(BusWrite::Register {
            register: register.name.clone(),
            value,
        });
        Ok(())
    }

    fn write_field(
        &mut self,
        register: &RegisterRef,
        field: &BitField,
        value: u32,
    ) -> Result<(), DeviceIoError> {
        let word = self.read(register)?;
        self.take_write(&register.name)?;
        trace!(register = %register.name, field = %field.name, value, "write field");
        self.words.insert(register.address, field.insert(word, value));
        self.journal.push(BusWrite::Field {
            register: register.name.clone(),
            field: field.name.clone(),
            value,
        });
        Ok(())
    }
}

/// Number of UDP output cores on the readout board
pub const UDP_CORE_COUNT: usize = 2;

/// Build the reference register layout of the readout firmware: the
/// monitoring/control registers plus two UDP output cores.
pub fn reference_map() -> MemoryMap {
    let mut map = MemoryMap::new();

    map.insert(RegisterRef::new(names::AURORA_LANE, 0x0000))
        .insert(RegisterRef::new(names::AURORA_CHANNEL, 0x0004))
        .insert(
            RegisterRef::new(names::ACQ_CONTROL, 0x0010)
                .with_field(BitField::flag("acquire", 0))
                .with_field(BitField::flag("manual_trig", 1))
                .with_field(BitField::flag("test_pattern", 2))
                .with_field(BitField::new("frame_divider", 8, 8)),
        )
        .insert(
            RegisterRef::new(names::CLOCK_RESETS, 0x0020)
                .with_field(BitField::flag("data_path_reset", 0))
                .with_field(BitField::flag("aurora_reset", 1))
                .with_field(BitField::flag("cmac_0_reset", 2))
                .with_field(BitField::flag("cmac_1_reset", 3))
                .with_field(BitField::flag("cmac_2_reset", 4))
                .with_field(BitField::flag("histogram_reset", 5)),
        )
        .insert(RegisterRef::new(names::FRAME_NUMBER_UPPER, 0x0030))
        .insert(RegisterRef::new(names::FRAME_NUMBER_LOWER, 0x0034))
        .insert(
            RegisterRef::new(names::CMAC_STATUS, 0x0040)
                .with_field(BitField::flag("cmac_0_lane_up", 0))
                .with_field(BitField::flag("cmac_1_lane_up", 1))
                .with_field(BitField::flag("cmac_2_lane_up", 2)),
        );

    for core in 0..UDP_CORE_COUNT {
        let block = format!("{}{}", names::UDP_BLOCK_PREFIX, core);
        let base = 0x1000 + 0x100 * core as u32;
        map.insert_in(&block, RegisterRef::new(names::UDP_SRC_MAC_UPPER, base))
            .insert_in(&block, RegisterRef::new(names::UDP_SRC_MAC_LOWER, base + 0x04))
            .insert_in(&block, RegisterRef::new(names::UDP_DST_MAC_UPPER, base + 0x08))
            .insert_in(&block, RegisterRef::new(names::UDP_DST_MAC_LOWER, base + 0x0C))
            .insert_in(&block, RegisterRef::new(names::UDP_SRC_IP, base + 0x10))
            .insert_in(&block, RegisterRef::new(names::UDP_DST_IP, base + 0x14));
    }

    map
}
