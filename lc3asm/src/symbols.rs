use std::fmt::Display;

use crate::{constants::DEFAULT_TABLE_SIZE, error::AsmError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub address: u16,
}

/// Open hashing: one chain per bucket, newest entry first.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    buckets: Vec<Vec<Symbol>>,
    len: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_SIZE)
    }
}

impl SymbolTable {
    /// A `size` of 0 picks the default bucket count.
    pub fn new(size: usize) -> Self {
        let size = if size == 0 { DEFAULT_TABLE_SIZE } else { size };
        Self {
            buckets: vec![Vec::new(); size],
            len: 0,
        }
    }

    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn hash(&self, name: &str) -> usize {
        let h = name
            .bytes()
            .fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32));
        h as usize % self.size()
    }

    pub fn insert(&mut self, name: &str, address: u16) -> Result<(), AsmError> {
        if let Some(existing) = self.lookup(name) {
            return Err(AsmError::DuplicateSymbol {
                symbol: name.to_owned(),
                address: existing,
            });
        }

        let index = self.hash(name);
        // Chains are kept newest-last in storage and walked in reverse
        self.buckets[index].push(Symbol {
            name: name.to_owned(),
            address,
        });
        self.len += 1;
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<u16> {
        self.chain(self.hash(name))
            .find(|symbol| symbol.name == name)
            .map(|symbol| symbol.address)
    }

    /// Entries of one bucket, most recently inserted first.
    pub fn chain(&self, index: usize) -> impl Iterator<Item = &Symbol> {
        self.buckets
            .get(index)
            .into_iter()
            .flat_map(|chain| chain.iter().rev())
    }

    /// Every entry with its bucket index, in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Symbol)> {
        (0..self.size()).flat_map(move |index| self.chain(index).map(move |sym| (index, sym)))
    }
}

impl Display for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:<19}{} {}", "Symbol", "ADDRESS", "(indx)")?;
        writeln!(f, "{}", "-".repeat(34))?;
        for (index, symbol) in self.iter() {
            writeln!(
                f,
                "{:.<20}0x{:04X} ({:04})",
                symbol.name, symbol.address, index
            )?;
        }
        Ok(())
    }
}
