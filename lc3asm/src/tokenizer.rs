use std::{
    fs::File,
    io::{BufRead, BufReader, Split},
    path::Path,
};

use crate::{
    constants::{COMMENT, DELIMITERS, QUOTE},
    error::AsmError,
};

/// One source line that has something on it besides a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    pub line: String,
    pub line_no: usize,
    pub tokens: Vec<String>,
}

impl Tokens {
    pub fn get(&self, position: usize) -> Option<&str> {
        self.tokens.get(position).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Scan position within a single line. Quoted text is one token, up to and
/// including the closing quote, or to the end of the line if there isn't one.
pub struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    pub fn next_token(&mut self) -> Option<&'a str> {
        let rest = self.rest.trim_start_matches(DELIMITERS);
        if rest.is_empty() || rest.starts_with(COMMENT) {
            self.rest = "";
            return None;
        }

        let end = if let Some(body) = rest.strip_prefix(QUOTE) {
            body.find(QUOTE).map(|i| i + 2).unwrap_or(rest.len())
        } else {
            rest.find(|c: char| DELIMITERS.contains(&c) || c == COMMENT)
                .unwrap_or(rest.len())
        };

        let (token, rest) = rest.split_at(end);
        self.rest = rest;
        Some(token)
    }
}

impl<'a> Iterator for Cursor<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

pub fn split_line(line: &str) -> Vec<String> {
    Cursor::new(line).map(str::to_owned).collect()
}

/// Line-oriented tokenizer over an assembly source. Blank and comment-only
/// lines are skipped, but still counted for line numbers. Bytes that aren't
/// UTF-8 are replaced rather than rejected.
pub struct Tokenizer<R> {
    lines: Split<R>,
    line_no: usize,
}

impl Tokenizer<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AsmError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| AsmError::File {
            path: path.to_owned(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<'a> Tokenizer<&'a [u8]> {
    pub fn from_text(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.split(b'\n'),
            line_no: 0,
        }
    }

    /// Physical line number of the last line read.
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    pub fn next_line(&mut self) -> Result<Option<Tokens>, AsmError> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            let line = String::from_utf8_lossy(&line);

            let tokens = split_line(&line);
            if tokens.is_empty() {
                continue;
            }

            return Ok(Some(Tokens {
                line: line.trim_end().to_owned(),
                line_no: self.line_no,
                tokens,
            }));
        }

        Ok(None)
    }
}

impl<R: BufRead> Iterator for Tokenizer<R> {
    type Item = Result<Tokens, AsmError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}
