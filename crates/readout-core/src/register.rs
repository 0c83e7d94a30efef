//! Register map and register access interfaces
//!
//! The readout logic never talks to hardware directly. It resolves
//! [`RegisterRef`] handles from a [`RegisterMap`] once, then performs all
//! I/O through a [`RegisterAccess`] implementation.

use serde::{Deserialize, Serialize};

use crate::error::{DeviceIoError, ResolveError};

/// A named sub-range of bits within a register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitField {
    pub name: String,
    /// Position of the least significant bit
    pub offset: u8,
    /// Number of bits, 1..=32
    pub width: u8,
}

impl BitField {
    pub fn new(name: &str, offset: u8, width: u8) -> Self {
        Self {
            name: name.to_string(),
            offset,
            width,
        }
    }

    /// A single-bit flag
    pub fn flag(name: &str, offset: u8) -> Self {
        Self::new(name, offset, 1)
    }

    /// Mask of the field in register position
    pub fn mask(&self) -> u32 {
        let bits = if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        };
        bits << self.offset
    }

    /// Extract this field from a register word
    pub fn extract(&self, word: u32) -> u32 {
        (word & self.mask()) >> self.offset
    }

    /// Replace this field inside a register word
    pub fn insert(&self, word: u32, value: u32) -> u32 {
        (word & !self.mask()) | ((value << self.offset) & self.mask())
    }
}

/// Handle to one physical register and its named bit-fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRef {
    pub name: String,
    pub address: u32,
    #[serde(default)]
    pub fields: Vec<BitField>,
}

impl RegisterRef {
    pub fn new(name: &str, address: u32) -> Self {
        Self {
            name: name.to_string(),
            address,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: BitField) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a bit-field by name
    pub fn field(&self, name: &str) -> Result<BitField, ResolveError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .cloned()
            .ok_or_else(|| ResolveError::FieldNotFound {
                register: self.name.clone(),
                field: name.to_string(),
            })
    }
}

/// Symbolic lookup of registers
pub trait RegisterMap {
    /// Find a register by name. With a block, only that block is searched;
    /// without one, the first match anywhere in the map is returned.
    fn lookup(&self, block: Option<&str>, name: &str) -> Option<&RegisterRef>;

    /// Like [`RegisterMap::lookup`] but a miss is an error
    fn resolve(&self, block: Option<&str>, name: &str) -> Result<RegisterRef, ResolveError> {
        self.lookup(block, name)
            .cloned()
            .ok_or_else(|| ResolveError::RegisterNotFound {
                name: name.to_string(),
                block: block.map(str::to_string),
            })
    }
}

/// Register map held in memory, grouped into optional named blocks
#[derive(Debug, Clone, Default)]
pub struct MemoryMap {
    entries: Vec<(Option<String>, RegisterRef)>,
}

impl MemoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a register outside any block
    pub fn insert(&mut self, register: RegisterRef) -> &mut Self {
        self.entries.push((None, register));
        self
    }

    /// Add a register to a named block
    pub fn insert_in(&mut self, block: &str, register: RegisterRef) -> &mut Self {
        self.entries.push((Some(block.to_string()), register));
        self
    }

    pub fn registers(&self) -> impl Iterator<Item = &RegisterRef> {
        self.entries.iter().map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RegisterMap for MemoryMap {
    fn lookup(&self, block: Option<&str>, name: &str) -> Option<&RegisterRef> {
        self.entries
            .iter()
            .filter(|(b, _)| block.is_none() || b.as_deref() == block)
            .map(|(_, r)| r)
            .find(|r| r.name == name)
    }
}

/// Blocking register I/O against a device
///
/// Writes take `&mut self`: interleaved multi-register sequences from
/// different writers are not safe on the register bus, so a shared
/// accessor has to be serialized by its owner.
pub trait RegisterAccess {
    fn read(&self, register: &RegisterRef) -> Result<u32, DeviceIoError>;

    fn write(&mut self, register: &RegisterRef, value: u32) -> Result<(), DeviceIoError>;

    fn read_field(&self, register: &RegisterRef, field: &BitField) -> Result<u32, DeviceIoError> {
        Ok(field.extract(self.read(register)?))
    }

    /// Read-modify-write of one field
    fn write_field(
        &mut self,
        register: &RegisterRef,
        field: &BitField,
        value: u32,
    ) -> Result<(), DeviceIoError> {
        let word = self.read(register)?;
        self.write(register, field.insert(word, value))
    }

    fn read_bit(&self, register: &RegisterRef, field: &BitField) -> Result<bool, DeviceIoError> {
        Ok(self.read_field(register, field)? != 0)
    }

    fn write_bit(
        &mut self,
        value: bool,
        register: &RegisterRef,
        field: &BitField,
    ) -> Result<(), DeviceIoError> {
        self.write_field(register, field, u32::from(value))
    }
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &mut T {
    fn read(&self, register: &RegisterRef) -> Result<u32, DeviceIoError> {
        (**self).read(register)
    }

    fn write(&mut self, register: &RegisterRef, value: u32) -> Result<(), DeviceIoError> {
        (**self).write(register, value)
    }

    fn read_field(&self, register: &RegisterRef, field: &BitField) -> Result<u32, DeviceIoError> {
        (**self).read_field(register, field)
    }

    fn write_field(
        &mut self,
        register: &RegisterRef,
        field: &BitField,
        value: u32,
    ) -> Result<(), DeviceIoError> {
        (**self).write_field(register, field, value)
    }
}
