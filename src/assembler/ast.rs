//! This AST describes a parsed Blocksembly assembly file.
//!
//! Execution begins with the first instruction in the file.
//! Comments are prefixed with a hash (#) and are single-line only.
//! Whitespace, including newlines, only separates tokens. Operands may
//! optionally be separated by commas.
//!
//! Supported Instructions (`*` marks a wide-capable register operand):
//!
//! ```nasm
//! LOAD8   RT RS*   # RT <= 8-bit memory at RS
//! LOAD16  RT RS*   # RT <= 16-bit memory at RS
//! STORE8  RS RT    # 8-bit memory at RT <= RS
//! STORE16 RS RT    # 16-bit memory at RT <= RS
//! MOVE    RT RS    # RT <= RS
//! MOVE    RT ~RS   # RT <= bitwise complement of RS
//! MOVE    RT -RS   # RT <= negated RS
//! JUMP    R        # short jump to R
//! JUMP LONG R      # long jump to R
//! JUMP IF Z R      # conditions: Z, S, C, O, SZ
//! CALL    R
//! PUSH    R
//! POP     R
//! STACK_INIT R
//! RETURN  N        # N bytes of arguments, 0-15
//! IN      R
//! OUT     R
//! ADD RT RS*       # also SUB AND OR XOR ADC SBB SHL SHR SRS CMP
//! LOADI   R VALUE  # 8-bit immediate, -128 to 255
//! LOADI   R label  # the instruction index of `label`
//! ```
//!
//! Example source file:
//!
//! ```nasm
//! start:  LOADI R0 0x10
//!         LOADI RG2 loop   # labels may be used before they are declared
//! loop:   ADD R0S R1
//!         JUMP IF Z R1O
//! ```

use std::fmt;

/// The eight general purpose registers. The discriminant is the 3-bit
/// field value. The even ("S") registers may also be addressed wide.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum Register {
    R0S,
    R0O,
    R1S,
    R1O,
    R2S,
    R2O,
    R3S,
    R3O,
}

impl Register {
    /// Every register, in ordinal order.
    pub const ALL: [Register; 8] = [
        Register::R0S,
        Register::R0O,
        Register::R1S,
        Register::R1O,
        Register::R2S,
        Register::R2O,
        Register::R3S,
        Register::R3O,
    ];

    pub fn ordinal(self) -> u16 {
        self as u16
    }

    pub fn from_ordinal(ordinal: u16) -> Option<Register> {
        Register::ALL.get(usize::from(ordinal)).copied()
    }

    pub fn name(self) -> &'static str {
        use Register::*;
        match self {
            R0S => "R0S",
            R0O => "R0O",
            R1S => "R1S",
            R1O => "R1O",
            R2S => "R2S",
            R2O => "R2O",
            R3S => "R3S",
            R3O => "R3O",
        }
    }

    /// The `RGn` alias, numbered by ordinal.
    pub fn alias(self) -> &'static str {
        ["RG0", "RG1", "RG2", "RG3", "RG4", "RG5", "RG6", "RG7"][self as usize]
    }

    /// The name used when the register pair is addressed as one wide register.
    pub fn wide_name(self) -> Option<&'static str> {
        use Register::*;
        match self {
            R0S => Some("R0"),
            R1S => Some("R1"),
            R2S => Some("R2"),
            R3S => Some("R3"),
            _ => None,
        }
    }

    /// Every name which refers to this register.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name())
            .chain(std::iter::once(self.alias()))
            .chain(self.wide_name())
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Transform {
    None = 0,
    Invert = 1,
    Negate = 2,
}

impl Transform {
    pub fn symbol(self) -> &'static str {
        match self {
            Transform::None => "",
            Transform::Invert => "~",
            Transform::Negate => "-",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum JumpKind {
    Long = 0,
    Short = 1,
    Zero = 2,
    Sign = 3,
    Carry = 4,
    Overflow = 5,
    SignZero = 6,
    Call = 7,
}

impl JumpKind {
    pub const ALL: [JumpKind; 8] = [
        JumpKind::Long,
        JumpKind::Short,
        JumpKind::Zero,
        JumpKind::Sign,
        JumpKind::Carry,
        JumpKind::Overflow,
        JumpKind::SignZero,
        JumpKind::Call,
    ];

    /// The flag name used after `JUMP IF`.
    pub fn condition(self) -> Option<&'static str> {
        use JumpKind::*;
        match self {
            Zero => Some("Z"),
            Sign => Some("S"),
            Carry => Some("C"),
            Overflow => Some("O"),
            SignZero => Some("SZ"),
            Long | Short | Call => None,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StackKind {
    Push = 0,
    Pop = 1,
    Init = 2,
}

impl StackKind {
    pub fn mnemonic(self) -> &'static str {
        match self {
            StackKind::Push => "PUSH",
            StackKind::Pop => "POP",
            StackKind::Init => "STACK_INIT",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Direction {
    In = 0,
    Out = 1,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CombineKind {
    Add = 0,
    Sub = 1,
    And = 2,
    Or = 3,
    Xor = 4,
    AddWithCarry = 5,
    SubWithBorrow = 6,
    ShiftLeft = 7,
    ShiftRight = 8,
    ShiftRightSignFill = 9,
    Compare = 10,
}

impl CombineKind {
    pub const ALL: [CombineKind; 11] = [
        CombineKind::Add,
        CombineKind::Sub,
        CombineKind::And,
        CombineKind::Or,
        CombineKind::Xor,
        CombineKind::AddWithCarry,
        CombineKind::SubWithBorrow,
        CombineKind::ShiftLeft,
        CombineKind::ShiftRight,
        CombineKind::ShiftRightSignFill,
        CombineKind::Compare,
    ];

    pub fn mnemonic(self) -> &'static str {
        use CombineKind::*;
        match self {
            Add => "ADD",
            Sub => "SUB",
            And => "AND",
            Or => "OR",
            Xor => "XOR",
            AddWithCarry => "ADC",
            SubWithBorrow => "SBB",
            ShiftLeft => "SHL",
            ShiftRight => "SHR",
            ShiftRightSignFill => "SRS",
            Compare => "CMP",
        }
    }
}

/// One machine instruction. `SymbolicLoadImmediate` only exists between
/// parsing and symbol resolution.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operation {
    Load { register: Register, memory: Register, wide: bool },
    Store { register: Register, memory: Register, wide: bool },
    Move { to: Register, from: Register, transform: Transform },
    Jump { target: Register, kind: JumpKind },
    Stack { register: Register, kind: StackKind },
    Return { arguments: u8 },
    Io { register: Register, direction: Direction },
    Combine { target: Register, source: Register, kind: CombineKind },
    LoadImmediate { target: Register, value: u8 },
    SymbolicLoadImmediate { target: Register, label: String },
}

/// Disassembles to the same form the parser accepts.
impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Operation::*;
        let width = |wide: &bool| if *wide { 16 } else { 8 };
        match self {
            Load { register, memory, wide } => write!(f, "LOAD{} {}, {}", width(wide), register, memory),
            Store { register, memory, wide } => write!(f, "STORE{} {}, {}", width(wide), register, memory),
            Move { to, from, transform } => write!(f, "MOVE {}, {}{}", to, transform.symbol(), from),
            Jump { target, kind } => match kind {
                JumpKind::Long => write!(f, "JUMP LONG {}", target),
                JumpKind::Short => write!(f, "JUMP {}", target),
                JumpKind::Call => write!(f, "CALL {}", target),
                _ => write!(f, "JUMP IF {} {}", kind.condition().unwrap_or_default(), target),
            },
            Stack { register, kind } => write!(f, "{} {}", kind.mnemonic(), register),
            Return { arguments } => write!(f, "RETURN {}", arguments),
            Io { register, direction: Direction::In } => write!(f, "IN {}", register),
            Io { register, direction: Direction::Out } => write!(f, "OUT {}", register),
            Combine { target, source, kind } => write!(f, "{} {}, {}", kind.mnemonic(), target, source),
            LoadImmediate { target, value } => write!(f, "LOADI {}, {}", target, value),
            SymbolicLoadImmediate { target, label } => write!(f, "LOADI {}, {}", target, label),
        }
    }
}

/// An operation together with the source offset it was parsed from.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Command {
    pub operation: Operation,
    pub offset: usize,
}
