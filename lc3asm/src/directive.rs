use std::{fmt::Display, str::FromStr};

use liblc3::op::{Condition, Opcode};
use strum_macros::EnumString;

use crate::{error::AsmError, tokenizer::Tokens};

/// Every reserved word the assembler recognizes, spelled as in source.
#[allow(clippy::upper_case_acronyms, non_camel_case_types)]
#[derive(Debug, EnumString, Clone, Copy, PartialEq, Eq)]
pub enum Mnemonic {
    BR,
    BRn,
    BRz,
    BRp,
    BRnz,
    BRnp,
    BRzp,
    BRnzp,
    ADD,
    AND,
    LD,
    LDI,
    LDR,
    LEA,
    NOT,
    RTI,
    ST,
    STI,
    STR,
    TRAP,
    JMP,
    RET,
    JSR,
    JSRR,
    #[strum(serialize = ".ORIG")]
    ORIG,
    #[strum(serialize = ".END")]
    END,
    #[strum(serialize = ".BLKW")]
    BLKW,
    #[strum(serialize = ".FILL")]
    FILL,
    #[strum(serialize = ".STRINGZ")]
    STRINGZ,
}

pub fn is_keyword(token: &str) -> bool {
    Mnemonic::from_str(token).is_ok()
}

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assembler {
    ORIG,
    END,
    BLKW,
    FILL,
    STRINGZ,
}

/// JSR/JSRR share an opcode; bit 11 picks the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Register = 0,
    Offset = 1,
}

/// JMP/RET share an opcode; RET is JMP through R7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    Register = 0,
    Return = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Assembler(Assembler),
    Br(Condition),
    Jsr(Link),
    Jmp(Jump),
    /// Instructions with a single spelling and no auxiliary fields.
    Op(Opcode),
}

impl From<Mnemonic> for Directive {
    fn from(mnemonic: Mnemonic) -> Self {
        match mnemonic {
            Mnemonic::BR => Self::Br(Condition::NONE),
            Mnemonic::BRn => Self::Br(Condition::N),
            Mnemonic::BRz => Self::Br(Condition::Z),
            Mnemonic::BRp => Self::Br(Condition::P),
            Mnemonic::BRnz => Self::Br(Condition::N | Condition::Z),
            Mnemonic::BRnp => Self::Br(Condition::N | Condition::P),
            Mnemonic::BRzp => Self::Br(Condition::Z | Condition::P),
            Mnemonic::BRnzp => Self::Br(Condition::N | Condition::Z | Condition::P),

            Mnemonic::ADD => Self::Op(Opcode::ADD),
            Mnemonic::AND => Self::Op(Opcode::AND),
            Mnemonic::LD => Self::Op(Opcode::LD),
            Mnemonic::LDI => Self::Op(Opcode::LDI),
            Mnemonic::LDR => Self::Op(Opcode::LDR),
            Mnemonic::LEA => Self::Op(Opcode::LEA),
            Mnemonic::NOT => Self::Op(Opcode::NOT),
            Mnemonic::RTI => Self::Op(Opcode::RTI),
            Mnemonic::ST => Self::Op(Opcode::ST),
            Mnemonic::STI => Self::Op(Opcode::STI),
            Mnemonic::STR => Self::Op(Opcode::STR),
            Mnemonic::TRAP => Self::Op(Opcode::TRAP),

            Mnemonic::JMP => Self::Jmp(Jump::Register),
            Mnemonic::RET => Self::Jmp(Jump::Return),
            Mnemonic::JSR => Self::Jsr(Link::Offset),
            Mnemonic::JSRR => Self::Jsr(Link::Register),

            Mnemonic::ORIG => Self::Assembler(Assembler::ORIG),
            Mnemonic::END => Self::Assembler(Assembler::END),
            Mnemonic::BLKW => Self::Assembler(Assembler::BLKW),
            Mnemonic::FILL => Self::Assembler(Assembler::FILL),
            Mnemonic::STRINGZ => Self::Assembler(Assembler::STRINGZ),
        }
    }
}

impl Directive {
    pub fn from_str(s: &str) -> Option<Self> {
        Mnemonic::from_str(s).ok().map(Self::from)
    }

    /// The opcode keyword is the first token, or the second when the first
    /// is a label.
    pub fn classify(tks: &Tokens) -> Result<Self, AsmError> {
        tks.get(0)
            .and_then(Self::from_str)
            .or_else(|| tks.get(1).and_then(Self::from_str))
            .ok_or_else(|| AsmError::UnknownOpcode(tks.tokens.join(" ")))
    }

    /// Machine opcode for real instructions, `None` for pseudo-ops.
    pub fn opcode(&self) -> Option<Opcode> {
        match self {
            Directive::Assembler(_) => None,
            Directive::Br(_) => Some(Opcode::BR),
            Directive::Jsr(_) => Some(Opcode::JSR),
            Directive::Jmp(_) => Some(Opcode::JMP),
            Directive::Op(op) => Some(*op),
        }
    }
}

impl Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Directive::Assembler(Assembler::ORIG) => ".ORIG",
            Directive::Assembler(Assembler::END) => ".END",
            Directive::Assembler(Assembler::BLKW) => ".BLKW",
            Directive::Assembler(Assembler::FILL) => ".FILL",
            Directive::Assembler(Assembler::STRINGZ) => ".STRINGZ",
            Directive::Br(condition) => condition.mnemonic(),
            Directive::Jsr(Link::Offset) => "JSR",
            Directive::Jsr(Link::Register) => "JSRR",
            Directive::Jmp(Jump::Register) => "JMP",
            Directive::Jmp(Jump::Return) => "RET",
            Directive::Op(op) => return write!(f, "{}", op),
        };
        f.write_str(s)
    }
}
