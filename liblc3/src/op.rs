use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use strum_macros::{Display, EnumIter};
use thiserror::Error;

use crate::word::{Word, WordExt};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodeError {
    #[error("register index {0} out of range")]
    RegisterOutOfRange(u16),
}

/// The 4-bit machine opcodes, valued as they appear in bits 15..12.
#[allow(clippy::upper_case_acronyms)]
#[derive(FromPrimitive, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    BR = 0x0,
    ADD = 0x1,
    LD = 0x2,
    ST = 0x3,
    JSR = 0x4,
    AND = 0x5,
    LDR = 0x6,
    STR = 0x7,
    RTI = 0x8,
    NOT = 0x9,
    LDI = 0xA,
    STI = 0xB,
    JMP = 0xC,
    RESERVED = 0xD,
    LEA = 0xE,
    TRAP = 0xF,
}

impl Opcode {
    pub fn from_word(word: Word) -> Self {
        // Every 4-bit value is an opcode, so this can't miss
        FromPrimitive::from_u16(word.field(12, 4)).unwrap_or(Opcode::RESERVED)
    }

    fn bits(self) -> Word {
        (self as Word) << 12
    }
}

#[derive(FromPrimitive, Display, EnumIter, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
}

impl Register {
    pub fn from_index(index: u16) -> Result<Self, EncodeError> {
        FromPrimitive::from_u16(index).ok_or(EncodeError::RegisterOutOfRange(index))
    }

    fn from_field(word: Word, low: u8) -> Self {
        FromPrimitive::from_u16(word.field(low, 3)).unwrap_or(Register::R0)
    }

    pub fn index(self) -> u16 {
        self as u16
    }
}

/// N/Z/P branch condition mask, held in the low three bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Condition(u8);

impl Condition {
    pub const P: Condition = Condition(1 << 0);
    pub const Z: Condition = Condition(1 << 1);
    pub const N: Condition = Condition(1 << 2);
    pub const NONE: Condition = Condition(0);

    pub fn from_bits(bits: u8) -> Self {
        Condition(bits & 0b111)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn mnemonic(self) -> &'static str {
        match self.0 {
            0b111 => "BRnzp",
            0b110 => "BRnz",
            0b101 => "BRnp",
            0b011 => "BRzp",
            0b100 => "BRn",
            0b010 => "BRz",
            0b001 => "BRp",
            _ => "BR",
        }
    }
}

impl std::ops::BitOr for Condition {
    type Output = Condition;

    fn bitor(self, rhs: Self) -> Self::Output {
        Condition(self.0 | rhs.0)
    }
}

/// Second source of ADD and AND: bit 5 picks between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Register(Register),
    Immediate(i16),
}

/// A decoded machine instruction. PC offsets and immediates are kept
/// sign-extended; `encode` truncates them to their field width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Br {
        condition: Condition,
        offset: i16,
    },
    Add {
        dr: Register,
        sr1: Register,
        src: Source,
    },
    Ld {
        dr: Register,
        offset: i16,
    },
    St {
        sr: Register,
        offset: i16,
    },
    Jsr {
        offset: i16,
    },
    Jsrr {
        base: Register,
    },
    And {
        dr: Register,
        sr1: Register,
        src: Source,
    },
    Ldr {
        dr: Register,
        base: Register,
        offset: i16,
    },
    Str {
        sr: Register,
        base: Register,
        offset: i16,
    },
    Rti,
    Not {
        dr: Register,
        sr: Register,
    },
    Ldi {
        dr: Register,
        offset: i16,
    },
    Sti {
        sr: Register,
        offset: i16,
    },
    Jmp {
        base: Register,
    },
    Lea {
        dr: Register,
        offset: i16,
    },
    Trap {
        vector: u8,
    },
}

fn reg(r: Register, low: u8) -> Word {
    r.index() << low
}

fn off(offset: i16, width: u8) -> Word {
    (offset as Word) & crate::word::mask(width)
}

fn src(src: Source) -> Word {
    match src {
        Source::Register(r) => r.index(),
        Source::Immediate(imm) => (1 << 5) | off(imm, 5),
    }
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Br { .. } => Opcode::BR,
            Instruction::Add { .. } => Opcode::ADD,
            Instruction::Ld { .. } => Opcode::LD,
            Instruction::St { .. } => Opcode::ST,
            Instruction::Jsr { .. } | Instruction::Jsrr { .. } => Opcode::JSR,
            Instruction::And { .. } => Opcode::AND,
            Instruction::Ldr { .. } => Opcode::LDR,
            Instruction::Str { .. } => Opcode::STR,
            Instruction::Rti => Opcode::RTI,
            Instruction::Not { .. } => Opcode::NOT,
            Instruction::Ldi { .. } => Opcode::LDI,
            Instruction::Sti { .. } => Opcode::STI,
            Instruction::Jmp { .. } => Opcode::JMP,
            Instruction::Lea { .. } => Opcode::LEA,
            Instruction::Trap { .. } => Opcode::TRAP,
        }
    }

    pub fn encode(&self) -> Word {
        let fields = match *self {
            Instruction::Br { condition, offset } => {
                ((condition.bits() as Word) << 9) | off(offset, 9)
            }
            Instruction::Add { dr, sr1, src: s } | Instruction::And { dr, sr1, src: s } => {
                reg(dr, 9) | reg(sr1, 6) | src(s)
            }
            Instruction::Ld { dr: r, offset }
            | Instruction::Ldi { dr: r, offset }
            | Instruction::Lea { dr: r, offset }
            | Instruction::St { sr: r, offset }
            | Instruction::Sti { sr: r, offset } => reg(r, 9) | off(offset, 9),
            Instruction::Jsr { offset } => (1 << 11) | off(offset, 11),
            Instruction::Jsrr { base } | Instruction::Jmp { base } => reg(base, 6),
            Instruction::Ldr {
                dr: r,
                base,
                offset,
            }
            | Instruction::Str {
                sr: r,
                base,
                offset,
            } => reg(r, 9) | reg(base, 6) | off(offset, 6),
            Instruction::Rti => 0,
            Instruction::Not { dr, sr } => reg(dr, 9) | reg(sr, 6) | 0x3F,
            Instruction::Trap { vector } => vector as Word,
        };

        self.opcode().bits() | fields
    }

    /// Decode a machine word. Returns `None` for the reserved opcode.
    pub fn decode(word: Word) -> Option<Self> {
        let r9 = Register::from_field(word, 9);
        let r6 = Register::from_field(word, 6);
        let source = || {
            if word.bit(5) {
                Source::Immediate(word.sext(5))
            } else {
                Source::Register(Register::from_field(word, 0))
            }
        };

        Some(match Opcode::from_word(word) {
            Opcode::BR => Instruction::Br {
                condition: Condition::from_bits(word.field(9, 3) as u8),
                offset: word.sext(9),
            },
            Opcode::ADD => Instruction::Add {
                dr: r9,
                sr1: r6,
                src: source(),
            },
            Opcode::LD => Instruction::Ld {
                dr: r9,
                offset: word.sext(9),
            },
            Opcode::ST => Instruction::St {
                sr: r9,
                offset: word.sext(9),
            },
            Opcode::JSR => {
                if word.bit(11) {
                    Instruction::Jsr {
                        offset: word.sext(11),
                    }
                } else {
                    Instruction::Jsrr { base: r6 }
                }
            }
            Opcode::AND => Instruction::And {
                dr: r9,
                sr1: r6,
                src: source(),
            },
            Opcode::LDR => Instruction::Ldr {
                dr: r9,
                base: r6,
                offset: word.sext(6),
            },
            Opcode::STR => Instruction::Str {
                sr: r9,
                base: r6,
                offset: word.sext(6),
            },
            Opcode::RTI => Instruction::Rti,
            Opcode::NOT => Instruction::Not { dr: r9, sr: r6 },
            Opcode::LDI => Instruction::Ldi {
                dr: r9,
                offset: word.sext(9),
            },
            Opcode::STI => Instruction::Sti {
                sr: r9,
                offset: word.sext(9),
            },
            Opcode::JMP => Instruction::Jmp { base: r6 },
            Opcode::RESERVED => return None,
            Opcode::LEA => Instruction::Lea {
                dr: r9,
                offset: word.sext(9),
            },
            Opcode::TRAP => Instruction::Trap {
                vector: word.field(0, 8) as u8,
            },
        })
    }
}

impl From<Instruction> for Word {
    fn from(inst: Instruction) -> Self {
        inst.encode()
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Register(r) => write!(f, "{}", r),
            Source::Immediate(imm) => write!(f, "#{}", imm),
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Br { condition, offset } => {
                write!(f, "{} #{}", condition.mnemonic(), offset)
            }
            Instruction::Add { dr, sr1, src } => write!(f, "ADD {}, {}, {}", dr, sr1, src),
            Instruction::And { dr, sr1, src } => write!(f, "AND {}, {}, {}", dr, sr1, src),
            Instruction::Ld { dr, offset } => write!(f, "LD {}, #{}", dr, offset),
            Instruction::Ldi { dr, offset } => write!(f, "LDI {}, #{}", dr, offset),
            Instruction::Lea { dr, offset } => write!(f, "LEA {}, #{}", dr, offset),
            Instruction::St { sr, offset } => write!(f, "ST {}, #{}", sr, offset),
            Instruction::Sti { sr, offset } => write!(f, "STI {}, #{}", sr, offset),
            Instruction::Jsr { offset } => write!(f, "JSR #{}", offset),
            Instruction::Jsrr { base } => write!(f, "JSRR {}", base),
            Instruction::Ldr { dr, base, offset } => {
                write!(f, "LDR {}, {}, #{}", dr, base, offset)
            }
            Instruction::Str { sr, base, offset } => {
                write!(f, "STR {}, {}, #{}", sr, base, offset)
            }
            Instruction::Rti => write!(f, "RTI"),
            Instruction::Not { dr, sr } => write!(f, "NOT {}, {}", dr, sr),
            Instruction::Jmp { base: Register::R7 } => write!(f, "RET"),
            Instruction::Jmp { base } => write!(f, "JMP {}", base),
            Instruction::Trap { vector } => write!(f, "TRAP x{:02X}", vector),
        }
    }
}
