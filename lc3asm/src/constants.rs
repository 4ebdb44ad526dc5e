use once_cell::sync::OnceCell;
use regex::Regex;

/// Prime bucket count used when no table size is requested.
pub const DEFAULT_TABLE_SIZE: usize = 5011;
pub const MAX_OPERANDS: usize = 3;

pub const DELIMITERS: &[char] = &[' ', '\t', ',', '\r', '\n'];
pub const COMMENT: char = ';';
pub const QUOTE: char = '"';

pub static REGISTER_REGEX: OnceCell<Regex> = OnceCell::new();
pub static HEX_REGEX: OnceCell<Regex> = OnceCell::new();
pub static DECIMAL_REGEX: OnceCell<Regex> = OnceCell::new();

static REGISTER_PATTERN: &str = r"^R(?P<index>[0-7])";
static HEX_PATTERN: &str = r"^(?:0[xX]|[xX])(?P<digits>[0-9A-Fa-f]+)$";
static DECIMAL_PATTERN: &str = r"^(?:#(?P<signed>-?[0-9]+)|(?P<plain>[0-9]+))$";

pub fn register_regex() -> &'static Regex {
    REGISTER_REGEX.get_or_init(|| Regex::new(REGISTER_PATTERN).expect("Invalid register regex"))
}

pub fn hex_regex() -> &'static Regex {
    HEX_REGEX.get_or_init(|| Regex::new(HEX_PATTERN).expect("Invalid hex regex"))
}

pub fn decimal_regex() -> &'static Regex {
    DECIMAL_REGEX.get_or_init(|| Regex::new(DECIMAL_PATTERN).expect("Invalid decimal regex"))
}
