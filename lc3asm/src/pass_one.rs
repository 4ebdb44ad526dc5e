use std::io::BufRead;

use log::{debug, info, warn};

use crate::{
    directive::{is_keyword, Assembler, Directive},
    error::{AsmError, Diagnostics},
    operand::Operand,
    operation::{Operation, OperationList},
    symbols::SymbolTable,
    tokenizer::{Tokenizer, Tokens},
};

pub struct FirstPass {
    location: u16,
    origin: Option<u16>,
    ended: bool,
    symbols: SymbolTable,
    operations: OperationList,
}

pub struct PassOne {
    pub operations: OperationList,
    pub symbols: SymbolTable,
    /// Location counter after the last line.
    pub location: u16,
}

impl FirstPass {
    fn new(table_size: usize) -> Self {
        Self {
            location: 0,
            origin: None,
            ended: false,
            symbols: SymbolTable::new(table_size),
            operations: OperationList::new(),
        }
    }

    /// Assign addresses and collect labels. Bad lines are reported together
    /// once the whole source has been read; read failures stop at once.
    pub fn parse_lines<R: BufRead>(
        tokenizer: Tokenizer<R>,
        table_size: usize,
    ) -> Result<PassOne, AsmError> {
        let mut pass = Self::new(table_size);
        let mut diagnostics = Diagnostics::default();

        for tks in tokenizer {
            let tks = tks?;
            if let Err(e) = pass.parse_line(&tks) {
                diagnostics.push(tks.line_no, &tks.line, e);
            }
        }

        info!(
            "pass one: {} operations, {} words, {} symbols",
            pass.operations.len(),
            pass.operations.size(),
            pass.symbols.len()
        );

        diagnostics.into_result(PassOne {
            operations: pass.operations,
            symbols: pass.symbols,
            location: pass.location,
        })
    }

    fn parse_line(&mut self, tks: &Tokens) -> Result<(), AsmError> {
        let directive = Directive::classify(tks)?;
        if self.ended {
            warn!("line {}: <{}> follows .END", tks.line_no, tks.line.trim());
        }

        let label = tks.get(0).filter(|token| !is_keyword(token));
        let first_operand = if label.is_some() { 2 } else { 1 };

        match directive {
            Directive::Assembler(Assembler::ORIG) => {
                let origin = match Operand::at(tks, first_operand) {
                    Some(Operand::Numeric(value)) => value,
                    Some(other) => {
                        return Err(AsmError::malformed(
                            directive,
                            format!("origin must be numeric, found {} <{}>", other.kind(), other),
                        ))
                    }
                    None => return Err(AsmError::malformed(directive, "missing origin address")),
                };
                if let Some(first) = self.origin {
                    warn!(
                        "line {}: second .ORIG x{:04X} is not written as its own section (first was x{:04X})",
                        tks.line_no, origin, first
                    );
                } else {
                    self.origin = Some(origin);
                }
                self.location = origin;
            }
            Directive::Assembler(Assembler::END) => self.ended = true,
            _ => (),
        }

        if let Some(label) = label {
            self.symbols.insert(label, self.location)?;
        }

        let mut operation = Operation::new(&tks.line, tks.line_no, label, directive);
        operation.address = self.location;
        for position in first_operand..tks.len() {
            if let Some(operand) = Operand::at(tks, position) {
                operation.push_operand(operand)?;
            }
        }

        operation.size = Self::size(&mut operation)?;
        debug!(
            "{:05} x{:04X} +{:<3} {}",
            operation.line_no, operation.address, operation.size, operation.directive
        );

        self.location = self.location.wrapping_add(operation.size);
        self.operations.push(operation);
        Ok(())
    }

    fn size(operation: &mut Operation) -> Result<u16, AsmError> {
        let directive = operation.directive;
        Ok(match directive {
            Directive::Assembler(Assembler::ORIG | Assembler::END) => 0,
            Directive::Assembler(Assembler::BLKW) => match operation.operands.first() {
                Some(Operand::Numeric(count)) => *count,
                Some(other) => {
                    return Err(AsmError::malformed(
                        directive,
                        format!("block size must be numeric, found {} <{}>", other.kind(), other),
                    ))
                }
                None => return Err(AsmError::malformed(directive, "missing block size")),
            },
            Directive::Assembler(Assembler::STRINGZ) => match operation.operands.first_mut() {
                Some(Operand::String { text, value }) => {
                    if let Some(c) = text.chars().find(|c| u16::try_from(*c as u32).is_err()) {
                        return Err(AsmError::malformed(
                            directive,
                            format!("character U+{:X} does not fit in a word", c as u32),
                        ));
                    }
                    let size = *value;
                    *value = text.chars().next().map(|c| c as u32 as u16).unwrap_or(0);
                    size
                }
                Some(other) => {
                    return Err(AsmError::malformed(
                        directive,
                        format!("expected a quoted string, found {} <{}>", other.kind(), other),
                    ))
                }
                None => return Err(AsmError::malformed(directive, "missing string")),
            },
            _ => 1,
        })
    }
}
