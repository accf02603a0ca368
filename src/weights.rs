//! Symbol frequency table and its on-disk weight-file form.
//!
//! A weight file holds one line per symbol that occurs in the source:
//! the raw symbol byte, a `:`, the decimal count, and a `\n`. Since the
//! symbol is a single raw byte, lines for `:` and `\n` themselves are
//! unambiguous (`::4\n`, `\n:2\n`).

use std::fmt;
use std::io::{Read, Write};

use tracing::{debug, warn};

use crate::error::{HuffmanError, Result};

/// Number of codepoints in the symbol alphabet (7-bit ASCII).
pub const ALPHABET_SIZE: usize = 128;

const COUNT_CHUNK: usize = 8 * 1024;

#[derive(Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; ALPHABET_SIZE],
}

impl Default for FrequencyTable {
    fn default() -> Self {
        FrequencyTable {
            counts: [0; ALPHABET_SIZE],
        }
    }
}

impl fmt::Debug for FrequencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(s, c)| (char::from(s), c)))
            .finish()
    }
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut table = FrequencyTable::new();
        table.add_bytes(bytes, 0)?;
        Ok(table)
    }

    /// Counts every symbol produced by `reader` in fixed-size chunks.
    pub fn count_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut table = FrequencyTable::new();
        let mut buf = vec![0u8; COUNT_CHUNK];
        let mut offset = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            table.add_bytes(&buf[..n], offset)?;
            offset += n as u64;
        }
        debug!(
            bytes = offset,
            distinct = table.distinct(),
            "counted symbol occurrences"
        );
        Ok(table)
    }

    fn add_bytes(&mut self, bytes: &[u8], base_offset: u64) -> Result<()> {
        for (i, &byte) in bytes.iter().enumerate() {
            let slot = self
                .counts
                .get_mut(byte as usize)
                .ok_or(HuffmanError::SymbolOutOfRange {
                    byte,
                    offset: base_offset + i as u64,
                })?;
            *slot += 1;
        }
        Ok(())
    }

    /// Panics if `symbol` is outside the alphabet.
    pub fn set(&mut self, symbol: u8, count: u64) {
        self.counts[symbol as usize] = count;
    }

    pub fn get(&self, symbol: u8) -> u64 {
        self.counts.get(symbol as usize).copied().unwrap_or(0)
    }

    /// Symbols with a nonzero count, in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(s, &c)| (s as u8, c))
    }

    pub fn distinct(&self) -> usize {
        self.iter().count()
    }

    /// Sum of all counts, or `None` if it does not fit in a u64.
    pub fn total(&self) -> Option<u64> {
        self.counts
            .iter()
            .try_fold(0u64, |acc, &c| acc.checked_add(c))
    }

    pub fn is_empty(&self) -> bool {
        self.distinct() == 0
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for (symbol, count) in self.iter() {
            writer.write_all(&[symbol, b':'])?;
            writeln!(writer, "{}", count)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (symbol, count) in self.iter() {
            bytes.push(symbol);
            bytes.push(b':');
            bytes.extend_from_slice(count.to_string().as_bytes());
            bytes.push(b'\n');
        }
        bytes
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::parse(&data)
    }

    /// Parses weight-file contents. Every line must be exactly
    /// `<symbol>:<digits>\n`; anything else is rejected.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut table = FrequencyTable::new();
        let mut seen = [false; ALPHABET_SIZE];
        let mut pos = 0;
        let mut line = 1;
        let mut total = 0u64;

        while pos < data.len() {
            let symbol = data[pos];
            if symbol as usize >= ALPHABET_SIZE {
                return Err(HuffmanError::weight_file(
                    line,
                    format!("symbol 0x{:02x} outside the 7-bit alphabet", symbol),
                ));
            }
            pos += 1;

            if data.get(pos) != Some(&b':') {
                return Err(HuffmanError::weight_file(line, "expected ':' after symbol"));
            }
            pos += 1;

            let digits = data[pos..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            if digits == 0 {
                return Err(HuffmanError::weight_file(line, "expected decimal count"));
            }
            let count = data[pos..pos + digits]
                .iter()
                .try_fold(0u64, |acc, &d| {
                    acc.checked_mul(10)?.checked_add(u64::from(d - b'0'))
                })
                .ok_or_else(|| HuffmanError::weight_file(line, "count overflows u64"))?;
            pos += digits;

            if data.get(pos) != Some(&b'\n') {
                return Err(HuffmanError::weight_file(line, "count not followed by newline"));
            }
            pos += 1;

            if std::mem::replace(&mut seen[symbol as usize], true) {
                return Err(HuffmanError::weight_file(
                    line,
                    format!("duplicate entry for symbol 0x{:02x}", symbol),
                ));
            }
            total = total
                .checked_add(count)
                .ok_or_else(|| HuffmanError::weight_file(line, "total weight overflows u64"))?;
            if count == 0 {
                warn!(line, symbol, "zero weight in weight file, symbol ignored");
            }
            table.set(symbol, count);
            line += 1;
        }

        Ok(table)
    }
}
