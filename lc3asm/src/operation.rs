use liblc3::Word;

use crate::{
    constants::MAX_OPERANDS,
    directive::{Assembler, Directive},
    error::AsmError,
    operand::Operand,
};

/// One source line after pass one. `inst` holds the encoded word once pass
/// two has run; multi-word pseudo-ops only keep their first word here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub line: String,
    pub line_no: usize,
    pub label: Option<String>,
    pub directive: Directive,
    pub operands: Vec<Operand>,
    pub address: u16,
    pub size: u16,
    pub inst: Word,
}

impl Operation {
    pub fn new(line: &str, line_no: usize, label: Option<&str>, directive: Directive) -> Self {
        Self {
            line: line.to_owned(),
            line_no,
            label: label.map(str::to_owned),
            directive,
            operands: Vec::with_capacity(MAX_OPERANDS),
            address: 0,
            size: 0,
            inst: 0,
        }
    }

    pub fn push_operand(&mut self, operand: Operand) -> Result<(), AsmError> {
        if self.operands.len() == MAX_OPERANDS {
            return Err(AsmError::malformed(
                self.directive,
                format!("at most {} operands allowed", MAX_OPERANDS),
            ));
        }
        self.operands.push(operand);
        Ok(())
    }

    pub fn operand(&self, position: usize) -> Option<&Operand> {
        self.operands.get(position)
    }

    /// Words this record contributes to the image, in address order.
    pub fn words(&self) -> Vec<Word> {
        match self.directive {
            Directive::Assembler(Assembler::ORIG | Assembler::END) => Vec::new(),
            Directive::Assembler(Assembler::BLKW) => vec![0; self.size as usize],
            Directive::Assembler(Assembler::STRINGZ) => match self.operand(0) {
                // Pass one rejects characters wider than a word.
                Some(Operand::String { text, .. }) => text
                    .chars()
                    .map(|c| c as u32 as Word)
                    .chain(std::iter::once(0))
                    .collect(),
                _ => vec![self.inst],
            },
            _ => vec![self.inst],
        }
    }
}

/// Operations in source order plus the running word total.
#[derive(Debug, Clone, Default)]
pub struct OperationList {
    operations: Vec<Operation>,
    size: usize,
}

impl OperationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operation: Operation) {
        self.size += operation.size as usize;
        self.operations.push(operation);
    }

    /// Total words across every record.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn first(&self) -> Option<&Operation> {
        self.operations.first()
    }

    pub fn get(&self, index: usize) -> Option<&Operation> {
        self.operations.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Operation> {
        self.operations.iter_mut()
    }
}

impl<'a> IntoIterator for &'a OperationList {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::Result;
    use liblc3::op::Opcode;

    #[test]
    fn operand_limit() -> Result<()> {
        let mut op = Operation::new("ADD R1, R1, R2, R3", 1, None, Directive::Op(Opcode::ADD));
        op.push_operand(Operand::classify("R1"))?;
        op.push_operand(Operand::classify("R1"))?;
        op.push_operand(Operand::classify("R2"))?;
        let err = op.push_operand(Operand::classify("R3")).unwrap_err();
        assert!(matches!(err, AsmError::MalformedOperation { .. }));
        assert_eq!(op.operands.len(), 3);
        Ok(())
    }

    #[test]
    fn words() -> Result<()> {
        let mut blkw = Operation::new("N .BLKW 3", 1, Some("N"), Directive::Assembler(Assembler::BLKW));
        blkw.size = 3;
        assert_eq!(blkw.words(), vec![0, 0, 0]);

        let mut s = Operation::new(
            ".STRINGZ \"AB\"",
            2,
            None,
            Directive::Assembler(Assembler::STRINGZ),
        );
        s.push_operand(Operand::classify("\"AB\""))?;
        s.size = 3;
        s.inst = 0x41;
        assert_eq!(s.words(), vec![0x41, 0x42, 0x00]);

        let end = Operation::new(".END", 3, None, Directive::Assembler(Assembler::END));
        assert!(end.words().is_empty());

        let mut add = Operation::new("ADD R1, R1, R2", 4, None, Directive::Op(Opcode::ADD));
        add.size = 1;
        add.inst = 0x1242;
        assert_eq!(add.words(), vec![0x1242]);
        Ok(())
    }

    #[test]
    fn running_size() {
        let mut list = OperationList::new();
        assert!(list.is_empty());
        let mut blkw = Operation::new(".BLKW 5", 1, None, Directive::Assembler(Assembler::BLKW));
        blkw.size = 5;
        list.push(blkw);
        let mut fill = Operation::new(".FILL 6", 2, None, Directive::Assembler(Assembler::FILL));
        fill.size = 1;
        list.push(fill);
        list.push(Operation::new(".END", 3, None, Directive::Assembler(Assembler::END)));
        assert_eq!(list.len(), 3);
        assert_eq!(list.size(), 6);
        assert_eq!(list.first().map(|op| op.line_no), Some(1));
        assert_eq!(list.iter().map(|op| op.words().len()).sum::<usize>(), 6);
    }
}
