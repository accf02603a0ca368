use std::fmt;

use crate::bit_vec::BitVec;
use crate::weights::{FrequencyTable, ALPHABET_SIZE};

/// Symbol → code word, indexed by symbol value.
#[derive(Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: [Option<BitVec>; ALPHABET_SIZE],
}

impl Default for CodeTable {
    fn default() -> Self {
        CodeTable {
            codes: [None; ALPHABET_SIZE],
        }
    }
}

impl CodeTable {
    pub(crate) fn insert(&mut self, symbol: u8, code: BitVec) {
        self.codes[symbol as usize] = Some(code);
    }

    pub fn get(&self, symbol: u8) -> Option<&BitVec> {
        self.codes.get(symbol as usize).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, &BitVec)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(s, code)| code.as_ref().map(|c| (s as u8, c)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_len(&self) -> usize {
        self.iter().map(|(_, c)| c.len()).max().unwrap_or(0)
    }

    /// Payload size in bits of a stream with the given symbol counts.
    /// Symbols without a code contribute nothing.
    pub fn encoded_bits(&self, frequencies: &FrequencyTable) -> u64 {
        frequencies
            .iter()
            .filter_map(|(s, n)| self.get(s).map(|c| n * c.len() as u64))
            .sum()
    }

    /// True when no code word is a prefix of another.
    pub fn is_prefix_free(&self) -> bool {
        let codes: Vec<&BitVec> = self.iter().map(|(_, c)| c).collect();
        codes.iter().enumerate().all(|(i, a)| {
            codes
                .iter()
                .enumerate()
                .all(|(j, b)| i == j || !a.is_prefix_of(b))
        })
    }
}

impl fmt::Debug for CodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(s, c)| (char::from(s), c)))
            .finish()
    }
}

/// One line per symbol: `'<char>' (<value>) <bits>`.
impl fmt::Display for CodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (symbol, code) in self.iter() {
            writeln!(
                f,
                "{:>6} ({:>3}) {}",
                format!("{:?}", char::from(symbol)),
                symbol,
                code
            )?;
        }
        Ok(())
    }
}
