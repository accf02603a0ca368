//! Packs code words into bytes.
//!
//! Output is the concatenation of MSB-first code words, followed by a
//! trailer byte giving the number of valid bits (1-8) in the byte before
//! it. When the payload ends byte-aligned the trailer is `8`; an empty
//! payload is the single byte `8`.

use std::io::{self, Read, Write};

use tracing::debug;

use crate::bit_vec::BitVec;
use crate::code_table::CodeTable;
use crate::error::{HuffmanError, Result};

/// Value of the trailer byte when the last data byte is fully used.
pub const ALIGNED_TRAILER: u8 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub symbols: u64,
    pub payload_bits: u64,
    /// Everything written, trailer included.
    pub bytes_written: u64,
    pub trailer: u8,
}

/// Accumulates bits and hands full bytes to the inner writer.
pub struct BitWriter<W: Write> {
    inner: W,
    acc: u8,
    pending: u8,
    out: Vec<u8>,
    flush_at: usize,
    payload_bits: u64,
    bytes_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W, buffer_size: usize) -> Self {
        let flush_at = buffer_size.max(1);
        BitWriter {
            inner,
            acc: 0,
            pending: 0,
            out: Vec::with_capacity(flush_at),
            flush_at,
            payload_bits: 0,
            bytes_written: 0,
        }
    }

    /// Bits currently held in the partial byte, 0-7.
    pub fn pending_bits(&self) -> u8 {
        self.pending
    }

    pub fn write_code(&mut self, code: &BitVec) -> io::Result<()> {
        let mut remaining = code.len();
        for &octet in code.as_bytes() {
            let take = remaining.min(8);
            self.push_bits(octet, take as u8)?;
            remaining -= take;
        }
        self.payload_bits += code.len() as u64;
        Ok(())
    }

    /// Appends the top `n` bits of `octet`. The low `8 - n` bits must be zero.
    fn push_bits(&mut self, octet: u8, n: u8) -> io::Result<()> {
        self.acc |= octet >> self.pending;
        let total = self.pending + n;
        if total >= 8 {
            self.out.push(self.acc);
            self.acc = (u16::from(octet) << (8 - self.pending)) as u8;
            self.pending = total - 8;
            if self.out.len() >= self.flush_at {
                self.drain()?;
            }
        } else {
            self.pending = total;
        }
        Ok(())
    }

    fn drain(&mut self) -> io::Result<()> {
        self.inner.write_all(&self.out)?;
        self.bytes_written += self.out.len() as u64;
        self.out.clear();
        Ok(())
    }

    /// Emits the padded last byte and the trailer, then flushes.
    pub fn finish(mut self) -> io::Result<(W, u64, u8)> {
        let trailer = if self.pending > 0 {
            self.out.push(self.acc);
            self.pending
        } else {
            ALIGNED_TRAILER
        };
        self.out.push(trailer);
        self.drain()?;
        self.inner.flush()?;
        Ok((self.inner, self.bytes_written, trailer))
    }
}

/// Encodes every symbol from `reader` into `writer`.
pub fn encode<R: Read, W: Write>(
    table: &CodeTable,
    mut reader: R,
    writer: W,
    read_chunk: usize,
    write_buffer: usize,
) -> Result<EncodeStats> {
    let mut bits = BitWriter::new(writer, write_buffer);
    let mut buf = vec![0u8; read_chunk.max(1)];
    let mut symbols = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        for &symbol in &buf[..n] {
            let code = table
                .get(symbol)
                .ok_or(HuffmanError::SymbolNotInTable(symbol))?;
            bits.write_code(code)?;
        }
        symbols += n as u64;
    }

    let payload_bits = bits.payload_bits;
    let (_, bytes_written, trailer) = bits.finish()?;
    debug!(symbols, payload_bits, bytes_written, trailer, "encoded stream");
    Ok(EncodeStats {
        symbols,
        payload_bits,
        bytes_written,
        trailer,
    })
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::hufftree::HuffmanTree;

    fn pack(input: &[u8]) -> (Vec<u8>, EncodeStats) {
        let table = HuffmanTree::from_bytes(input).unwrap().generate_table();
        let mut out = Vec::new();
        let stats = encode(&table, Cursor::new(input), &mut out, 3, 2).unwrap();
        (out, stats)
    }

    #[test]
    fn empty_input_is_just_the_trailer() {
        let (out, stats) = pack(b"");
        assert_eq!(out, vec![8]);
        assert_eq!(stats.bytes_written, 1);
        assert_eq!(stats.symbols, 0);
    }

    #[test]
    fn byte_aligned_payload_gets_trailer_8() {
        // b=0 c=10 a=11: 11 11 0 0 10
        let (out, stats) = pack(b"aabbc");
        assert_eq!(out, vec![0b1111_0010, 8]);
        assert_eq!(stats.payload_bits, 8);
        assert_eq!(stats.trailer, 8);
    }

    #[test]
    fn partial_last_byte_is_zero_padded() {
        // b=0 a=1: 1 1 0
        let (out, stats) = pack(b"aab");
        assert_eq!(out, vec![0b1100_0000, 3]);
        assert_eq!(stats.trailer, 3);
    }

    #[test]
    fn single_symbol_uses_one_bit() {
        let (out, _) = pack(b"aaa");
        assert_eq!(out, vec![0b1110_0000, 3]);

        let (out, _) = pack(b"aaaaaaaaa");
        assert_eq!(out, vec![0xFF, 0b1000_0000, 1]);
    }

    #[test]
    fn codes_straddle_byte_boundaries() {
        let input = b"abcabcabcdd";
        let table = HuffmanTree::from_bytes(input).unwrap().generate_table();
        let (out, stats) = pack(input);

        let expected_bits: String = input
            .iter()
            .map(|&s| table.get(s).unwrap().to_string())
            .collect();
        let packed_bits: String = out[..out.len() - 1]
            .iter()
            .map(|b| format!("{:08b}", b))
            .collect();
        assert_eq!(stats.payload_bits as usize, expected_bits.len());
        assert!(packed_bits.starts_with(&expected_bits));
        assert!(packed_bits[expected_bits.len()..].chars().all(|c| c == '0'));
        assert_eq!(
            *out.last().unwrap() as usize,
            match expected_bits.len() % 8 {
                0 => 8,
                r => r,
            }
        );
    }

    #[test]
    fn long_codes_pack_across_several_octets() {
        let mut bits = BitWriter::new(Vec::new(), 64);
        let code: BitVec = [true; 13].iter().collect();
        bits.write_code(&code).unwrap();
        assert_eq!(bits.pending_bits(), 5);
        bits.write_code(&code).unwrap();
        assert_eq!(bits.pending_bits(), 2);
        let (out, written, trailer) = bits.finish().unwrap();
        assert_eq!(out, vec![0xFF, 0xFF, 0xFF, 0b1100_0000, 2]);
        assert_eq!(written, 5);
        assert_eq!(trailer, 2);
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let table = HuffmanTree::from_bytes(b"ab").unwrap().generate_table();
        let err = encode(&table, Cursor::new(b"abc"), Vec::new(), 16, 16).unwrap_err();
        assert!(matches!(err, HuffmanError::SymbolNotInTable(b'c')));
    }
}
