use std::{fmt::Display, path::Path};

use liblc3::op::Instruction;

use crate::{
    image::Image,
    operation::{Operation, OperationList},
};

/// Source-order listing of every record with its address and words.
pub struct Listing<'a> {
    operations: &'a OperationList,
}

impl<'a> Listing<'a> {
    pub fn new(operations: &'a OperationList) -> Self {
        Self { operations }
    }
}

fn operands(operation: &Operation) -> String {
    operation
        .operands
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn row(
    f: &mut std::fmt::Formatter<'_>,
    label: &str,
    opcode: &str,
    operands: &str,
    address: u16,
    word: u16,
) -> std::fmt::Result {
    write!(
        f,
        "{:<20}{:<10}{:<40} {:04X}: {:04X} {:016b}",
        label, opcode, operands, address, word, word
    )
}

impl<'a> Display for Listing<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:<20}{:<10}{:<40} {:<4}  {:<4} {}",
            "LABEL", "OPCODE", "OPERANDS", "ADDR", "INST", "BINARY"
        )?;
        writeln!(f, "{}", "-".repeat(99))?;

        for operation in self.operations {
            let label = operation.label.as_deref().unwrap_or("");
            let opcode = operation.directive.to_string();
            let operands = operands(operation);
            let words = operation.words();

            let Some((first, rest)) = words.split_first() else {
                writeln!(
                    f,
                    "{:<20}{:<10}{:<40} {:04X}:",
                    label, opcode, operands, operation.address
                )?;
                continue;
            };

            row(f, label, &opcode, &operands, operation.address, *first)?;
            if operation.directive.opcode().is_some() {
                if let Some(inst) = Instruction::decode(*first) {
                    write!(f, "  ; {}", inst)?;
                }
            }
            writeln!(f)?;

            for (i, word) in rest.iter().enumerate() {
                let address = operation.address.wrapping_add(i as u16 + 1);
                row(f, ".", "", "", address, *word)?;
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// What was written where.
pub struct Summary<'a> {
    pub output: &'a Path,
    pub image: &'a Image,
}

impl<'a> Display for Summary<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:.<20}{}", "output file", self.output.display())?;
        writeln!(
            f,
            "{:.<20}{} ({} header + {} content)",
            "words written",
            self.image.header().len() + self.image.words.len(),
            self.image.header().len(),
            self.image.words.len()
        )?;
        writeln!(
            f,
            "{:.<20}x{:04X}, {} words",
            "section",
            self.image.start,
            self.image.size()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{pass_one::FirstPass, pass_two::pass_two, tokenizer::Tokenizer};
    use anyhow::Result;

    fn assemble(program: &str) -> Result<OperationList> {
        let mut pass = FirstPass::parse_lines(Tokenizer::from_text(program), 0)?;
        pass_two(&mut pass.operations, &pass.symbols)?;
        Ok(pass.operations)
    }

    #[test]
    fn listing_rows() -> Result<()> {
        let ops = assemble(".ORIG x3000\nLOOP ADD R1, R1, #-1\nBRp LOOP\nS .STRINGZ \"Hi\"\n.END")?;
        let text = Listing::new(&ops).to_string();
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 2 + 5 + 2);
        assert!(lines[0].starts_with("LABEL               OPCODE    OPERANDS"));
        assert_eq!(lines[2].trim_end(), format!("{:<20}{:<10}{:<40} 3000:", "", ".ORIG", "x3000"));
        assert_eq!(
            lines[3],
            format!(
                "{:<20}{:<10}{:<40} 3000: 127F 0001001001111111  ; ADD R1, R1, #-1",
                "LOOP", "ADD", "R1, R1, xFFFF"
            )
        );
        assert!(lines[4].ends_with("3001: 03FE 0000001111111110  ; BRp #-2"));
        assert!(lines[5].starts_with("S                   .STRINGZ  \"Hi\""));
        assert!(lines[5].ends_with("3002: 0048 0000000001001000"));
        assert!(lines[6].starts_with('.'));
        assert!(lines[6].ends_with("3003: 0069 0000000001101001"));
        assert!(lines[7].ends_with("3004: 0000 0000000000000000"));
        assert!(lines[8].contains(".END"));
        Ok(())
    }

    #[test]
    fn summary() {
        let image = Image {
            start: 0x3050,
            words: vec![0; 27],
        };
        let summary = Summary {
            output: Path::new("mult.lc3"),
            image: &image,
        };
        assert_eq!(
            summary.to_string(),
            "output file.........mult.lc3\n\
             words written.......29 (2 header + 27 content)\n\
             section.............x3050, 27 words\n"
        );
    }
}
