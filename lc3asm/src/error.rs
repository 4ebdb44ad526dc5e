use std::{fmt::Display, io, path::PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AsmError {
    #[error("could not open file <{}>", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("did not find opcode token on line, tokens <{0}>")]
    UnknownOpcode(String),

    #[error("malformed {mnemonic} operation: {reason}")]
    MalformedOperation { mnemonic: String, reason: String },

    #[error("duplicate insertion attempted on symbol <{symbol}> address <0x{address:04X}>")]
    DuplicateSymbol { symbol: String, address: u16 },

    #[error("undefined symbol <{0}>")]
    UndefinedSymbol(String),

    #[error("could not determine opcode type <{0}>")]
    InvalidOpcode(String),

    #[error("program of {0} words does not fit in a 16-bit section")]
    ImageTooLarge(usize),

    #[error("{0}")]
    Diagnostics(Diagnostics),

    #[error("I/O error")]
    Io(#[from] io::Error),
}

impl AsmError {
    pub fn malformed(mnemonic: impl Display, reason: impl Into<String>) -> Self {
        AsmError::MalformedOperation {
            mnemonic: mnemonic.to_string(),
            reason: reason.into(),
        }
    }
}

/// An error pinned to the source line it came from.
#[derive(Debug)]
pub struct Diagnostic {
    pub line_no: usize,
    pub text: String,
    pub error: AsmError,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {:05}: {} <{}>",
            self.line_no,
            self.error,
            self.text.trim()
        )
    }
}

/// Every per-line error a pass ran into before giving up.
#[derive(Debug, Default)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub fn push(&mut self, line_no: usize, text: &str, error: AsmError) {
        self.0.push(Diagnostic {
            line_no,
            text: text.to_owned(),
            error,
        });
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, AsmError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(AsmError::Diagnostics(self))
        }
    }
}

impl Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plural = if self.len() == 1 { "" } else { "s" };
        write!(f, "{} error{}", self.len(), plural)?;
        for diagnostic in self.iter() {
            write!(f, "\n  {}", diagnostic)?;
        }
        Ok(())
    }
}
