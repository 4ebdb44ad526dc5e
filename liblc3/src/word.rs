pub type Word = u16;

pub trait WordExt {
    /// Unsigned value of the `width` bits starting at bit `low`.
    fn field(&self, low: u8, width: u8) -> u16;
    /// Sign extend the low `width` bits.
    fn sext(&self, width: u8) -> i16;
    fn bit(&self, n: u8) -> bool;
}

impl WordExt for Word {
    fn field(&self, low: u8, width: u8) -> u16 {
        (*self >> low) & mask(width)
    }

    fn sext(&self, width: u8) -> i16 {
        let value = *self & mask(width);
        let sign = 1 << (width - 1);
        if value & sign > 0 {
            (value | !mask(width)) as i16
        } else {
            value as i16
        }
    }

    fn bit(&self, n: u8) -> bool {
        (*self >> n) & 1 > 0
    }
}

pub fn mask(width: u8) -> u16 {
    if width >= 16 {
        0xFFFF
    } else {
        (1 << width) - 1
    }
}

/// Whether a two's-complement 16-bit value survives truncation to a
/// `width`-bit signed field.
pub fn fits_signed(value: u16, width: u8) -> bool {
    let v = value as i16 as i32;
    let half = 1i32 << (width - 1);
    -half <= v && v < half
}

pub fn fits_unsigned(value: u16, width: u8) -> bool {
    value & !mask(width) == 0
}

pub fn format_word(word: Word) -> String {
    format!("{:04X} {:016b}", word, word)
}
