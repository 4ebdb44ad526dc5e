use std::fmt::Display;

use liblc3::op::Register;

use crate::{
    constants::{decimal_regex, hex_regex, register_regex, QUOTE},
    tokenizer::Tokens,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    /// Literal truncated to 16 bits, two's complement for negatives.
    Numeric(u16),
    /// Decoded payload without quotes. `value` starts out as the storage
    /// size including the terminator; pass one swaps in the first character.
    String { text: String, value: u16 },
    /// `offset` is filled in by pass two.
    Symbol { name: String, offset: Option<u16> },
}

fn fold_digits(digits: &str, radix: u32) -> u16 {
    digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0u16, |acc, d| {
            acc.wrapping_mul(radix as u16).wrapping_add(d as u16)
        })
}

fn unescape(body: &str) -> String {
    let mut text = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('t') => text.push('\t'),
            Some('0') => text.push('\0'),
            Some('\\') => text.push('\\'),
            Some(other) => {
                text.push('\\');
                text.push(other);
            }
            None => text.push('\\'),
        }
    }
    text
}

impl Operand {
    /// Order matters: a token like `R1` is a register before it could be
    /// anything else, and whatever matches nothing is a symbol.
    pub fn classify(token: &str) -> Self {
        if let Some(caps) = register_regex().captures(token) {
            let index = fold_digits(&caps["index"], 10);
            if let Ok(register) = Register::from_index(index) {
                return Operand::Register(register);
            }
        }

        if let Some(body) = token.strip_prefix(QUOTE) {
            let body = body.strip_suffix(QUOTE).unwrap_or(body);
            return Operand::string(unescape(body));
        }

        if let Some(caps) = hex_regex().captures(token) {
            return Operand::Numeric(fold_digits(&caps["digits"], 16));
        }

        if let Some(caps) = decimal_regex().captures(token) {
            let value = match (caps.name("signed"), caps.name("plain")) {
                (Some(signed), _) => match signed.as_str().strip_prefix('-') {
                    Some(digits) => fold_digits(digits, 10).wrapping_neg(),
                    None => fold_digits(signed.as_str(), 10),
                },
                (None, Some(plain)) => fold_digits(plain.as_str(), 10),
                (None, None) => 0,
            };
            return Operand::Numeric(value);
        }

        Operand::Symbol {
            name: token.to_owned(),
            offset: None,
        }
    }

    /// Operand at token `position` of a line, if there is one.
    pub fn at(tks: &Tokens, position: usize) -> Option<Self> {
        tks.get(position).map(Self::classify)
    }

    pub fn string(text: String) -> Self {
        let value = (text.chars().count() + 1) as u16;
        Operand::String { text, value }
    }

    pub fn value(&self) -> u16 {
        match self {
            Operand::Register(r) => r.index(),
            Operand::Numeric(value) => *value,
            Operand::String { value, .. } => *value,
            Operand::Symbol { offset, .. } => offset.unwrap_or(0),
        }
    }

    pub fn register(&self) -> Option<Register> {
        match self {
            Operand::Register(r) => Some(*r),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Operand::Register(_) => "register",
            Operand::Numeric(_) => "numeric",
            Operand::String { .. } => "string",
            Operand::Symbol { .. } => "symbol",
        }
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "{}", r),
            Operand::Numeric(value) => write!(f, "x{:04X}", value),
            Operand::String { text, .. } => write!(f, "\"{}\"", text.escape_default()),
            Operand::Symbol { name, .. } => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registers() {
        assert_eq!(Operand::classify("R0"), Operand::Register(Register::R0));
        assert_eq!(Operand::classify("R7"), Operand::Register(Register::R7));
        // Only the leading register name counts
        assert_eq!(Operand::classify("R3X"), Operand::Register(Register::R3));
        assert!(matches!(Operand::classify("R8"), Operand::Symbol { .. }));
        assert!(matches!(Operand::classify("RESULT"), Operand::Symbol { .. }));
        assert!(matches!(Operand::classify("r1"), Operand::Symbol { .. }));
    }

    #[test]
    fn hex() {
        assert_eq!(Operand::classify("0x3050"), Operand::Numeric(0x3050));
        assert_eq!(Operand::classify("0X3050"), Operand::Numeric(0x3050));
        assert_eq!(Operand::classify("x3000"), Operand::Numeric(0x3000));
        assert_eq!(Operand::classify("xFFFF"), Operand::Numeric(0xFFFF));
        assert_eq!(Operand::classify("Xab"), Operand::Numeric(0xAB));
        assert_eq!(Operand::classify("x12345"), Operand::Numeric(0x2345));
        assert!(matches!(Operand::classify("XFER"), Operand::Symbol { .. }));
        assert!(matches!(Operand::classify("x"), Operand::Symbol { .. }));
    }

    #[test]
    fn decimal() {
        assert_eq!(Operand::classify("#0"), Operand::Numeric(0));
        assert_eq!(Operand::classify("#15"), Operand::Numeric(15));
        assert_eq!(Operand::classify("#-1"), Operand::Numeric(0xFFFF));
        assert_eq!(Operand::classify("#-16"), Operand::Numeric(0xFFF0));
        assert_eq!(Operand::classify("5"), Operand::Numeric(5));
        assert_eq!(Operand::classify("65536"), Operand::Numeric(0));
        assert_eq!(Operand::classify("#65535"), Operand::Numeric(0xFFFF));
        assert!(matches!(Operand::classify("#"), Operand::Symbol { .. }));
        assert!(matches!(Operand::classify("#-"), Operand::Symbol { .. }));
    }

    #[test]
    fn strings() {
        let op = Operand::classify("\"Error Message\"");
        assert_eq!(
            op,
            Operand::String {
                text: "Error Message".into(),
                value: 14
            }
        );
        assert_eq!(op.value(), 14);

        assert_eq!(Operand::classify("\"\"").value(), 1);
        // Unterminated strings keep everything after the quote
        assert_eq!(
            Operand::classify("\"open"),
            Operand::String {
                text: "open".into(),
                value: 5
            }
        );
    }

    #[test]
    fn escapes() {
        assert_eq!(
            Operand::classify(r#""a\nb\t\\\0""#),
            Operand::String {
                text: "a\nb\t\\\0".into(),
                value: 7
            }
        );
        assert_eq!(
            Operand::classify(r#""\q""#),
            Operand::String {
                text: "\\q".into(),
                value: 3
            }
        );
    }

    #[test]
    fn symbols() {
        let op = Operand::classify("AGAIN");
        assert_eq!(
            op,
            Operand::Symbol {
                name: "AGAIN".into(),
                offset: None
            }
        );
        assert_eq!(op.value(), 0);
        assert_eq!(op.kind(), "symbol");
        assert_eq!(op.to_string(), "AGAIN");
    }

    #[test]
    fn positions() {
        let tks = Tokens {
            line: "LOOP LDR R1, R2, #-1".into(),
            line_no: 3,
            tokens: crate::tokenizer::split_line("LOOP LDR R1, R2, #-1"),
        };
        assert_eq!(Operand::at(&tks, 2), Some(Operand::Register(Register::R1)));
        assert_eq!(Operand::at(&tks, 4), Some(Operand::Numeric(0xFFFF)));
        assert_eq!(Operand::at(&tks, 5), None);
    }

    #[test]
    fn display() {
        assert_eq!(Operand::classify("R2").to_string(), "R2");
        assert_eq!(Operand::classify("#-1").to_string(), "xFFFF");
        assert_eq!(Operand::classify(r#""Hi\n""#).to_string(), r#""Hi\n""#);
    }
}
