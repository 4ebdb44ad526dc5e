use liblc3::{
    op::{Condition, Instruction, Opcode, Register, Source},
    word::{fits_signed, fits_unsigned, format_word},
    Word,
};
use log::{debug, info, warn};

use crate::{
    directive::{Assembler, Directive, Jump, Link},
    error::{AsmError, Diagnostics},
    operand::Operand,
    operation::{Operation, OperationList},
    symbols::SymbolTable,
};

/// Replace every symbol operand with its PC-relative offset.
fn resolve(operation: &mut Operation, symbols: &SymbolTable) -> Result<(), AsmError> {
    let pc = operation.address.wrapping_add(1);
    for operand in operation.operands.iter_mut() {
        if let Operand::Symbol { name, offset } = operand {
            let address = symbols
                .lookup(name)
                .ok_or_else(|| AsmError::UndefinedSymbol(name.clone()))?;
            *offset = Some(address.wrapping_sub(pc));
        }
    }
    Ok(())
}

struct Encoder<'a> {
    operation: &'a Operation,
}

impl<'a> Encoder<'a> {
    fn expect_operands(&self, count: usize) -> Result<(), AsmError> {
        let found = self.operation.operands.len();
        if found != count {
            return Err(AsmError::malformed(
                self.operation.directive,
                format!(
                    "expected {} operand{}, found {}",
                    count,
                    if count == 1 { "" } else { "s" },
                    found
                ),
            ));
        }
        Ok(())
    }

    fn operand(&self, position: usize) -> Result<&'a Operand, AsmError> {
        self.operation.operand(position).ok_or_else(|| {
            AsmError::malformed(
                self.operation.directive,
                format!("missing operand {}", position + 1),
            )
        })
    }

    fn register(&self, position: usize) -> Result<Register, AsmError> {
        let operand = self.operand(position)?;
        operand.register().ok_or_else(|| {
            AsmError::malformed(
                self.operation.directive,
                format!(
                    "operand {} must be a register, found {} <{}>",
                    position + 1,
                    operand.kind(),
                    operand
                ),
            )
        })
    }

    fn value(&self, position: usize) -> Result<Word, AsmError> {
        let operand = self.operand(position)?;
        match operand {
            Operand::Register(_) => Err(AsmError::malformed(
                self.operation.directive,
                format!("operand {} can't be a register <{}>", position + 1, operand),
            )),
            _ => Ok(operand.value()),
        }
    }

    /// Signed field of `width` bits; values that don't fit are truncated.
    fn signed(&self, position: usize, width: u8) -> Result<i16, AsmError> {
        let value = self.value(position)?;
        if !fits_signed(value, width) {
            warn!(
                "line {}: {} does not fit in {} bits, truncating",
                self.operation.line_no, value as i16, width
            );
        }
        Ok(value as i16)
    }

    fn source(&self, position: usize) -> Result<Source, AsmError> {
        Ok(match self.operand(position)? {
            Operand::Register(r) => Source::Register(*r),
            _ => Source::Immediate(self.signed(position, 5)?),
        })
    }

    fn trap_vector(&self) -> Result<u8, AsmError> {
        let value = self.value(0)?;
        if !fits_unsigned(value, 8) {
            warn!(
                "line {}: trap vector x{:04X} does not fit in 8 bits, truncating",
                self.operation.line_no, value
            );
        }
        Ok(value as u8)
    }

    fn instruction(&self, opcode: Opcode) -> Result<Instruction, AsmError> {
        Ok(match opcode {
            Opcode::ADD | Opcode::AND => {
                self.expect_operands(3)?;
                let (dr, sr1, src) = (self.register(0)?, self.register(1)?, self.source(2)?);
                if opcode == Opcode::ADD {
                    Instruction::Add { dr, sr1, src }
                } else {
                    Instruction::And { dr, sr1, src }
                }
            }
            Opcode::LD | Opcode::LDI | Opcode::LEA | Opcode::ST | Opcode::STI => {
                self.expect_operands(2)?;
                let (r, offset) = (self.register(0)?, self.signed(1, 9)?);
                match opcode {
                    Opcode::LD => Instruction::Ld { dr: r, offset },
                    Opcode::LDI => Instruction::Ldi { dr: r, offset },
                    Opcode::LEA => Instruction::Lea { dr: r, offset },
                    Opcode::ST => Instruction::St { sr: r, offset },
                    _ => Instruction::Sti { sr: r, offset },
                }
            }
            Opcode::LDR | Opcode::STR => {
                self.expect_operands(3)?;
                let (r, base, offset) = (self.register(0)?, self.register(1)?, self.signed(2, 6)?);
                if opcode == Opcode::LDR {
                    Instruction::Ldr { dr: r, base, offset }
                } else {
                    Instruction::Str { sr: r, base, offset }
                }
            }
            Opcode::NOT => {
                self.expect_operands(2)?;
                Instruction::Not {
                    dr: self.register(0)?,
                    sr: self.register(1)?,
                }
            }
            Opcode::RTI => {
                self.expect_operands(0)?;
                Instruction::Rti
            }
            Opcode::TRAP => {
                self.expect_operands(1)?;
                Instruction::Trap {
                    vector: self.trap_vector()?,
                }
            }
            // These have their own directive kinds
            Opcode::BR | Opcode::JSR | Opcode::JMP | Opcode::RESERVED => {
                return Err(AsmError::InvalidOpcode(opcode.to_string()))
            }
        })
    }

    fn branch(&self, condition: Condition) -> Result<Instruction, AsmError> {
        self.expect_operands(1)?;
        Ok(Instruction::Br {
            condition,
            offset: self.signed(0, 9)?,
        })
    }

    fn subroutine(&self, link: Link) -> Result<Instruction, AsmError> {
        self.expect_operands(1)?;
        Ok(match link {
            Link::Offset => Instruction::Jsr {
                offset: self.signed(0, 11)?,
            },
            Link::Register => Instruction::Jsrr {
                base: self.register(0)?,
            },
        })
    }

    fn jump(&self, jump: Jump) -> Result<Instruction, AsmError> {
        Ok(match jump {
            Jump::Register => {
                self.expect_operands(1)?;
                Instruction::Jmp {
                    base: self.register(0)?,
                }
            }
            Jump::Return => {
                self.expect_operands(0)?;
                Instruction::Jmp { base: Register::R7 }
            }
        })
    }

    /// The single word kept on the record; `None` for directives that only
    /// shape the layout.
    fn encode(&self) -> Result<Option<Word>, AsmError> {
        let instruction = match self.operation.directive {
            Directive::Assembler(Assembler::ORIG | Assembler::END | Assembler::BLKW) => {
                return Ok(None)
            }
            Directive::Assembler(Assembler::FILL | Assembler::STRINGZ) => {
                self.expect_operands(1)?;
                return Ok(Some(self.value(0)?));
            }
            Directive::Br(condition) => self.branch(condition)?,
            Directive::Jsr(link) => self.subroutine(link)?,
            Directive::Jmp(jump) => self.jump(jump)?,
            Directive::Op(opcode) => self.instruction(opcode)?,
        };
        Ok(Some(instruction.into()))
    }
}

/// Resolve symbols and encode every record in place.
pub fn pass_two(operations: &mut OperationList, symbols: &SymbolTable) -> Result<(), AsmError> {
    let mut diagnostics = Diagnostics::default();

    for operation in operations.iter_mut() {
        let encoded = resolve(operation, symbols).and_then(|_| {
            Encoder {
                operation: &*operation,
            }
            .encode()
        });
        match encoded {
            Ok(inst) => {
                operation.inst = inst.unwrap_or(0);
                if let Some(inst) = inst {
                    debug!(
                        "{:05} x{:04X}: {}",
                        operation.line_no,
                        operation.address,
                        format_word(inst)
                    );
                }
            }
            Err(e) => diagnostics.push(operation.line_no, &operation.line, e),
        }
    }

    info!("pass two: {} diagnostics", diagnostics.len());
    diagnostics.into_result(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{pass_one::FirstPass, tokenizer::Tokenizer};
    use anyhow::Result;

    fn assemble(program: &str) -> Result<OperationList, AsmError> {
        let mut pass = FirstPass::parse_lines(Tokenizer::from_text(program), 0)?;
        pass_two(&mut pass.operations, &pass.symbols)?;
        Ok(pass.operations)
    }

    fn words(program: &str) -> Result<Vec<Word>> {
        Ok(assemble(program)?
            .iter()
            .filter(|op| op.size > 0)
            .map(|op| op.inst)
            .collect())
    }

    fn one(line: &str) -> Result<Word> {
        let words = words(&format!(".ORIG x3000\n{}\n.END", line))?;
        Ok(words[0])
    }

    #[test]
    fn add_register() -> Result<()> {
        assert_eq!(one("ADD R1,R1,R2")?, 0x1242);
        assert_eq!(one("ADD R1, R1, #-1")?, 0x127F);
        assert_eq!(one("AND R3, R3, #0")?, 0x56E0);
        Ok(())
    }

    #[test]
    fn branch_back() -> Result<()> {
        let ops = assemble(".ORIG x3000\nLOOP ADD R0,R0,#1\nBRp LOOP\n.END")?;
        let br = ops.get(2).expect("branch");
        assert_eq!(br.address, 0x3001);
        assert_eq!(br.operands[0].value(), 0xFFFE);
        assert_eq!(br.inst & 0x1FF, 0x1FE);
        assert_eq!(br.inst, 0x03FE);
        Ok(())
    }

    #[test]
    fn forward_reference() -> Result<()> {
        let words = words(".ORIG x3050\nLD R1, SIX\nTRAP x25\nSIX .FILL 0x0006\n.END")?;
        assert_eq!(words, vec![0x2201, 0xF025, 0x0006]);
        Ok(())
    }

    #[test]
    fn every_shape() -> Result<()> {
        assert_eq!(one("BR #0")?, 0x0000);
        assert_eq!(one("BRnzp #3")?, 0x0E03);
        assert_eq!(one("LD R2, #5")?, 0x2405);
        assert_eq!(one("ST R3, #9")?, 0x3609);
        assert_eq!(one("JSR #13")?, 0x480D);
        assert_eq!(one("JSRR R5")?, 0x4140);
        assert_eq!(one("LDR R2, R6, #-1")?, 0x65BF);
        assert_eq!(one("STR R2, R6, #2")?, 0x7582);
        assert_eq!(one("RTI")?, 0x8000);
        assert_eq!(one("NOT R3, R2")?, 0x96BF);
        assert_eq!(one("LDI R1, #13")?, 0xA20D);
        assert_eq!(one("STI R1, #12")?, 0xB20C);
        assert_eq!(one("JMP R4")?, 0xC100);
        assert_eq!(one("RET")?, 0xC1C0);
        assert_eq!(one("LEA R0, #17")?, 0xE011);
        assert_eq!(one("TRAP x25")?, 0xF025);
        assert_eq!(one(".FILL xBEEF")?, 0xBEEF);
        Ok(())
    }

    #[test]
    fn stringz_keeps_first_char() -> Result<()> {
        let ops = assemble(".ORIG x4000\n.STRINGZ \"AB\"\n.END")?;
        let s = ops.get(1).expect("stringz");
        assert_eq!(s.address, 0x4000);
        assert_eq!(s.size, 3);
        assert_eq!(s.inst, 0x41);
        assert_eq!(s.words(), vec![0x41, 0x42, 0x00]);
        Ok(())
    }

    #[test]
    fn layout_only_directives() -> Result<()> {
        let ops = assemble(".ORIG x3000\nB .BLKW 2\n.END")?;
        assert!(ops.iter().all(|op| op.inst == 0));
        Ok(())
    }

    #[test]
    fn truncates_wide_fields() -> Result<()> {
        // 300 doesn't fit 9 bits: 0x12C & 0x1FF
        assert_eq!(one("LD R0, #300")?, 0x212C);
        // 16 doesn't fit imm5 and wraps to -16
        assert_eq!(one("ADD R0, R0, #16")?, 0x1030);
        assert_eq!(one("TRAP x125")?, 0xF025);
        Ok(())
    }

    fn diagnostics(program: &str) -> Vec<(usize, AsmError)> {
        match assemble(program) {
            Err(AsmError::Diagnostics(d)) => d.0.into_iter().map(|d| (d.line_no, d.error)).collect(),
            Err(other) => panic!("unexpected {:?}", other),
            Ok(_) => panic!("expected diagnostics"),
        }
    }

    #[test]
    fn undefined_symbol() {
        let found = diagnostics(".ORIG x3000\nBRz NOWHERE\nLD R0, ALSO\n.END");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].0, 2);
        assert!(matches!(found[0].1, AsmError::UndefinedSymbol(ref s) if s == "NOWHERE"));
        assert!(matches!(found[1].1, AsmError::UndefinedSymbol(ref s) if s == "ALSO"));
    }

    #[test]
    fn arity() {
        let found = diagnostics(".ORIG x3000\nADD R1, R1\nRET R7\nNOT R1\nTRAP\n.FILL\nRTI R0\n.END");
        let lines = found.iter().map(|(line, _)| *line).collect::<Vec<_>>();
        assert_eq!(lines, vec![2, 3, 4, 5, 6, 7]);
        assert!(found
            .iter()
            .all(|(_, e)| matches!(e, AsmError::MalformedOperation { .. })));
        assert_eq!(
            found[0].1.to_string(),
            "malformed ADD operation: expected 3 operands, found 2"
        );
    }

    #[test]
    fn register_fields() {
        let found = diagnostics(".ORIG x3000\nADD #1, R1, R2\nJMP LOOP\nLOOP LDR R1, #2, #3\nTRAP R1\n.END");
        assert_eq!(found.len(), 4);
        assert_eq!(
            found[0].1.to_string(),
            "malformed ADD operation: operand 1 must be a register, found numeric <x0001>"
        );
        assert!(found[1].1.to_string().contains("must be a register, found symbol <LOOP>"));
        assert!(found[3].1.to_string().contains("can't be a register"));
    }
}
