use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use liblc3::Word;
use log::info;

use crate::{error::AsmError, operation::OperationList};

/// The one section written to disk: start address, then every word of
/// content in address order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub start: u16,
    pub words: Vec<Word>,
}

impl Image {
    pub fn from_operations(operations: &OperationList) -> Result<Self, AsmError> {
        let start = operations.first().map(|op| op.address).unwrap_or(0);
        let words = operations
            .iter()
            .flat_map(|op| op.words())
            .collect::<Vec<_>>();
        if words.len() > u16::MAX as usize {
            return Err(AsmError::ImageTooLarge(words.len()));
        }
        Ok(Self { start, words })
    }

    pub fn size(&self) -> u16 {
        self.words.len() as u16
    }

    pub fn header(&self) -> [Word; 2] {
        [self.start, self.size()]
    }

    /// Header followed by the body, as written.
    pub fn to_words(&self) -> Vec<Word> {
        self.header()
            .into_iter()
            .chain(self.words.iter().copied())
            .collect()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_words()
            .into_iter()
            .flat_map(|word| word.to_le_bytes())
            .collect()
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), AsmError> {
        out.write_all(&self.to_bytes())?;
        Ok(())
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<(), AsmError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| AsmError::File {
            path: path.to_owned(),
            source,
        })?;
        let mut out = BufWriter::new(file);
        self.write_to(&mut out)?;
        out.flush()?;
        info!(
            "wrote {} words at x{:04X} to {}",
            self.size(),
            self.start,
            path.display()
        );
        Ok(())
    }
}
