//! Packs operations into 12-bit instruction words.
//!
//! Fields are appended most significant first. Layouts (MSB -> LSB):
//!
//! ```text
//! LOAD/STORE  0000 / 0001  reg(3) reg(3) wide(1) 0(1)
//! MOVE        0010         to(3) from(3) transform(2)
//! JUMP        001100       type(3) target(3)
//! STACK       0011010      type(2) reg(3)
//! RETURN      00110110     arguments(4)
//! IO          00110111     direction(1) reg(3)
//! COMBINE     01           type(4) target(3) source(3)
//! LOADI       1            target(3) immediate(8)
//! ```
use std::error::Error;
use std::fmt;

use super::ast::*;

/// Every instruction word is exactly this many bits.
pub const INSTRUCTION_WIDTH: u32 = 12;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum EncodeError {
    /// A field would push the word past `INSTRUCTION_WIDTH`.
    TooManyBits { bits: u32, width: u32 },
    /// A field value does not fit its width.
    FieldOverflow { value: u16, width: u32 },
    /// The word was finished with fewer than `INSTRUCTION_WIDTH` bits.
    Incomplete { bits: u32 },
    /// A label reference was never resolved.
    Unresolved(String),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncodeError::TooManyBits { bits, width } => write!(
                f,
                "a {}-bit field does not fit after {} of {} bits",
                width, bits, INSTRUCTION_WIDTH
            ),
            EncodeError::FieldOverflow { value, width } => {
                write!(f, "value {} won't fit into {} bits", value, width)
            }
            EncodeError::Incomplete { bits } => {
                write!(f, "instruction has {} bits, {} expected", bits, INSTRUCTION_WIDTH)
            }
            EncodeError::Unresolved(label) => {
                write!(f, "symbol '{}' is unresolved and can't be encoded", label)
            }
        }
    }
}

impl Error for EncodeError {}

#[derive(Default, Debug)]
pub struct InstructionBuilder {
    value: u16,
    bits: u32,
}

impl InstructionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an unsigned `width`-bit field.
    pub fn field(&mut self, width: u32, value: u16) -> Result<&mut Self, EncodeError> {
        if self.bits + width > INSTRUCTION_WIDTH {
            return Err(EncodeError::TooManyBits { bits: self.bits, width });
        }
        if u32::from(value) >= 1 << width {
            return Err(EncodeError::FieldOverflow { value, width });
        }
        self.value = (self.value << width) | value;
        self.bits += width;
        Ok(self)
    }

    /// Appends a register ordinal. Narrower fields keep the top bits.
    pub fn register(&mut self, register: Register, width: u32) -> Result<&mut Self, EncodeError> {
        let ordinal = register.ordinal() >> 3u32.saturating_sub(width);
        self.field(width, ordinal)
    }

    pub fn flag(&mut self, set: bool) -> Result<&mut Self, EncodeError> {
        self.field(1, set as u16)
    }

    pub fn finish(&self) -> Result<u16, EncodeError> {
        if self.bits != INSTRUCTION_WIDTH {
            return Err(EncodeError::Incomplete { bits: self.bits });
        }
        Ok(self.value)
    }

    pub fn clear(&mut self) {
        self.value = 0;
        self.bits = 0;
    }
}

impl Operation {
    /// Writes this operation's fields into `builder`.
    pub fn encode(&self, b: &mut InstructionBuilder) -> Result<(), EncodeError> {
        use Operation::*;
        match self {
            Load { register, memory, wide } => {
                b.field(4, 0b0000)?.register(*register, 3)?.register(*memory, 3)?.flag(*wide)?.field(1, 0)?;
            }
            Store { register, memory, wide } => {
                b.field(4, 0b0001)?.register(*register, 3)?.register(*memory, 3)?.flag(*wide)?.field(1, 0)?;
            }
            Move { to, from, transform } => {
                b.field(4, 0b0010)?.register(*to, 3)?.register(*from, 3)?.field(2, *transform as u16)?;
            }
            Jump { target, kind } => {
                b.field(6, 0b00_1100)?.field(3, *kind as u16)?.register(*target, 3)?;
            }
            Stack { register, kind } => {
                b.field(7, 0b001_1010)?.field(2, *kind as u16)?.register(*register, 3)?;
            }
            Return { arguments } => {
                b.field(8, 0b0011_0110)?.field(4, u16::from(*arguments))?;
            }
            Io { register, direction } => {
                b.field(8, 0b0011_0111)?.field(1, *direction as u16)?.register(*register, 3)?;
            }
            Combine { target, source, kind } => {
                b.field(2, 0b01)?.field(4, *kind as u16)?.register(*target, 3)?.register(*source, 3)?;
            }
            LoadImmediate { target, value } => {
                b.field(1, 0b1)?.register(*target, 3)?.field(8, u16::from(*value))?;
            }
            SymbolicLoadImmediate { label, .. } => return Err(EncodeError::Unresolved(label.clone())),
        }
        Ok(())
    }

    /// Assembles the operation to its 12-bit machine word.
    pub fn assemble(&self) -> Result<u16, EncodeError> {
        let mut builder = InstructionBuilder::new();
        self.encode(&mut builder)?;
        builder.finish()
    }
}

/// Reverses `Operation::assemble`. Only used as a test oracle.
#[cfg(test)]
pub fn decode(word: u16) -> Option<Operation> {
    let bits = |shift: u16, width: u16| (word >> shift) & ((1 << width) - 1);
    let reg = |shift: u16| Register::from_ordinal(bits(shift, 3));

    if word >> INSTRUCTION_WIDTH != 0 {
        return None;
    }
    if bits(11, 1) == 1 {
        return Some(Operation::LoadImmediate { target: reg(8)?, value: bits(0, 8) as u8 });
    }
    if bits(10, 2) == 0b01 {
        return Some(Operation::Combine {
            target: reg(3)?,
            source: reg(0)?,
            kind: *CombineKind::ALL.get(usize::from(bits(6, 4)))?,
        });
    }
    match bits(8, 4) {
        op @ 0b0000 | op @ 0b0001 => {
            if bits(0, 1) != 0 {
                return None;
            }
            let (register, memory, wide) = (reg(5)?, reg(2)?, bits(1, 1) == 1);
            return Some(if op == 0 {
                Operation::Load { register, memory, wide }
            } else {
                Operation::Store { register, memory, wide }
            });
        }
        0b0010 => {
            let transform = match bits(0, 2) {
                0 => Transform::None,
                1 => Transform::Invert,
                2 => Transform::Negate,
                _ => return None,
            };
            return Some(Operation::Move { to: reg(5)?, from: reg(2)?, transform });
        }
        _ => {}
    }
    if bits(6, 6) == 0b00_1100 {
        return Some(Operation::Jump { target: reg(0)?, kind: JumpKind::ALL[usize::from(bits(3, 3))] });
    }
    if bits(5, 7) == 0b001_1010 {
        let kind = match bits(3, 2) {
            0 => StackKind::Push,
            1 => StackKind::Pop,
            2 => StackKind::Init,
            _ => return None,
        };
        return Some(Operation::Stack { register: reg(0)?, kind });
    }
    match bits(4, 8) {
        0b0011_0110 => Some(Operation::Return { arguments: bits(0, 4) as u8 }),
        0b0011_0111 => {
            let direction = if bits(3, 1) == 0 { Direction::In } else { Direction::Out };
            Some(Operation::Io { register: reg(0)?, direction })
        }
        _ => None,
    }
}
