//! Unpacks a trailer-terminated bitstream by walking the code tree.
//!
//! The stream is read through two alternating buffers. A chunk is only
//! decoded once the following read has shown whether it holds the end of
//! the stream: the byte before the trailer may carry fewer than 8 valid
//! bits, and it may be the last byte of one chunk with the trailer alone
//! in the next.

use std::io::{self, Read, Write};
use std::mem;

use tracing::debug;

use crate::encoder::ALIGNED_TRAILER;
use crate::error::{HuffmanError, Result};
use crate::hufftree::{HuffNode, HuffmanTree};

/// Smallest lookahead buffer that can hold a data byte and the trailer.
pub const MIN_CHUNK: usize = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub bytes_read: u64,
    pub symbols: u64,
    pub trailer: u8,
}

/// Tree position that carries over from one input byte to the next.
struct TreeWalker<'t> {
    root: &'t HuffNode,
    cursor: &'t HuffNode,
    filler: Option<u8>,
}

impl<'t> TreeWalker<'t> {
    fn new(root: &'t HuffNode, filler: Option<u8>) -> Self {
        TreeWalker {
            root,
            cursor: root,
            filler,
        }
    }

    /// Walks the top `valid_bits` bits of `byte`, pushing every completed
    /// symbol onto `out`.
    fn feed(&mut self, byte: u8, valid_bits: u8, out: &mut Vec<u8>) -> Result<()> {
        for i in 0..valid_bits {
            let bit = byte & (0x80 >> i) != 0;
            let node: &'t HuffNode = self.cursor;
            let next: &'t HuffNode = match node {
                HuffNode::Fork { left, right, .. } => {
                    if bit {
                        &**right
                    } else {
                        &**left
                    }
                }
                HuffNode::Leaf { .. } => return Err(HuffmanError::UnexpectedCode),
            };
            self.cursor = match *next {
                HuffNode::Leaf { byte: symbol, .. } => {
                    if self.filler == Some(symbol) {
                        return Err(HuffmanError::UnexpectedCode);
                    }
                    out.push(symbol);
                    self.root
                }
                HuffNode::Fork { .. } => next,
            };
        }
        Ok(())
    }

    fn at_boundary(&self) -> bool {
        std::ptr::eq(self.cursor, self.root)
    }
}

/// Fills `buf` as far as the reader allows; a short count means end of input.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

pub struct Decoder<'t> {
    tree: &'t HuffmanTree,
    chunk: usize,
}

impl<'t> Decoder<'t> {
    pub fn new(tree: &'t HuffmanTree, chunk: usize) -> Result<Self> {
        if chunk < MIN_CHUNK {
            return Err(HuffmanError::InvalidConfig(format!(
                "decode chunk must be at least {} bytes, got {}",
                MIN_CHUNK, chunk
            )));
        }
        Ok(Decoder { tree, chunk })
    }

    pub fn decode<R: Read, W: Write>(&self, mut reader: R, mut writer: W) -> Result<DecodeStats> {
        let mut front = vec![0u8; self.chunk];
        let mut back = vec![0u8; self.chunk];
        let mut out = Vec::with_capacity(self.chunk * 8);
        let mut stats = DecodeStats::default();

        let mut front_len = fill(&mut reader, &mut front)?;
        if front_len == 0 {
            return Err(HuffmanError::MissingTrailer);
        }
        stats.bytes_read += front_len as u64;

        let root = match self.tree.root() {
            Some(root) => root,
            None => {
                // Nothing was encoded; only a lone aligned trailer is valid.
                return if front_len == 1 && front[0] == ALIGNED_TRAILER {
                    writer.flush()?;
                    stats.trailer = ALIGNED_TRAILER;
                    Ok(stats)
                } else {
                    Err(HuffmanError::UnexpectedCode)
                };
            }
        };
        let mut walker = TreeWalker::new(root, self.tree.filler());

        loop {
            let back_len = if front_len < self.chunk {
                0
            } else {
                fill(&mut reader, &mut back)?
            };
            stats.bytes_read += back_len as u64;

            let (data, trailer) = match back_len {
                0 => {
                    let (trailer, data) = front[..front_len]
                        .split_last()
                        .ok_or(HuffmanError::MissingTrailer)?;
                    (data, *trailer)
                }
                1 => (&front[..front_len], back[0]),
                _ => {
                    for &byte in &front[..front_len] {
                        walker.feed(byte, 8, &mut out)?;
                    }
                    writer.write_all(&out)?;
                    stats.symbols += out.len() as u64;
                    out.clear();
                    mem::swap(&mut front, &mut back);
                    front_len = back_len;
                    continue;
                }
            };

            if !(1..=ALIGNED_TRAILER).contains(&trailer) {
                return Err(HuffmanError::InvalidTrailer(trailer));
            }
            match data.split_last() {
                Some((&last, body)) => {
                    for &byte in body {
                        walker.feed(byte, 8, &mut out)?;
                    }
                    walker.feed(last, trailer, &mut out)?;
                }
                None if trailer == ALIGNED_TRAILER => {}
                None => return Err(HuffmanError::InvalidTrailer(trailer)),
            }
            writer.write_all(&out)?;
            stats.symbols += out.len() as u64;
            stats.trailer = trailer;
            break;
        }

        if !walker.at_boundary() {
            return Err(HuffmanError::TruncatedCode);
        }
        writer.flush()?;
        debug!(
            bytes_read = stats.bytes_read,
            symbols = stats.symbols,
            trailer = stats.trailer,
            "decoded stream"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use super::*;
    use crate::encoder::encode;

    fn pack(input: &[u8]) -> (HuffmanTree, Vec<u8>) {
        let tree = HuffmanTree::from_bytes(input).unwrap();
        let mut out = Vec::new();
        encode(&tree.generate_table(), Cursor::new(input), &mut out, 64, 64).unwrap();
        (tree, out)
    }

    fn unpack(tree: &HuffmanTree, packed: &[u8], chunk: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        Decoder::new(tree, chunk)?.decode(Cursor::new(packed), &mut out)?;
        Ok(out)
    }

    #[test]
    fn round_trips_at_every_chunk_boundary() {
        let input = b"the quick brown fox jumps over the lazy dog\n\t0123456789";
        let (tree, packed) = pack(input);
        for chunk in MIN_CHUNK..=packed.len() + 2 {
            assert_eq!(unpack(&tree, &packed, chunk).unwrap(), input, "chunk {chunk}");
        }
    }

    #[test]
    fn trailer_alone_in_second_chunk() {
        // 4 data bytes + trailer with chunk 4: the last read returns one byte
        let input = b"aabbcaabbcaabbcaabbc";
        let (tree, packed) = pack(input);
        assert_eq!(packed.len(), 5);
        assert_eq!(unpack(&tree, &packed, 4).unwrap(), input);
    }

    #[test]
    fn empty_stream_is_lone_aligned_trailer() {
        let (tree, packed) = pack(b"");
        assert_eq!(packed, vec![8]);
        assert_eq!(unpack(&tree, &packed, 4).unwrap(), b"");
        assert!(matches!(
            unpack(&tree, &[3], 4),
            Err(HuffmanError::UnexpectedCode)
        ));
        assert!(matches!(
            unpack(&tree, &[0x12, 8], 4),
            Err(HuffmanError::UnexpectedCode)
        ));
    }

    #[test]
    fn aligned_trailer_without_data_decodes_to_nothing() {
        let tree = HuffmanTree::from_bytes(b"aab").unwrap();
        assert_eq!(unpack(&tree, &[8], 4).unwrap(), b"");
        assert!(matches!(
            unpack(&tree, &[5], 4),
            Err(HuffmanError::InvalidTrailer(5))
        ));
    }

    #[test]
    fn missing_trailer() {
        let tree = HuffmanTree::from_bytes(b"aab").unwrap();
        assert!(matches!(
            unpack(&tree, &[], 4),
            Err(HuffmanError::MissingTrailer)
        ));
    }

    #[test]
    fn out_of_range_trailer() {
        let tree = HuffmanTree::from_bytes(b"aab").unwrap();
        for bad in [0u8, 9, 255] {
            assert!(matches!(
                unpack(&tree, &[0xC0, bad], 4),
                Err(HuffmanError::InvalidTrailer(b)) if b == bad
            ));
        }
    }

    #[test]
    fn truncated_mid_code() {
        // b=0 c=10 a=11; a single `1` stops inside the tree
        let tree = HuffmanTree::from_bytes(b"aabbc").unwrap();
        assert!(matches!(
            unpack(&tree, &[0b1000_0000, 1], 4),
            Err(HuffmanError::TruncatedCode)
        ));
        assert_eq!(unpack(&tree, &[0b1011_0000, 4], 4).unwrap(), b"ca");
    }

    #[test]
    fn filler_code_is_corruption() {
        // a=1, filler b=0
        let tree = HuffmanTree::from_bytes(b"aaa").unwrap();
        assert_eq!(unpack(&tree, &[0b1110_0000, 3], 2).unwrap(), b"aaa");
        assert!(matches!(
            unpack(&tree, &[0b1010_0000, 3], 2),
            Err(HuffmanError::UnexpectedCode)
        ));
    }

    #[test]
    fn padding_bits_are_ignored() {
        // a=1 b=0 with trailer 3: padding ones must not decode as 'a'
        let tree = HuffmanTree::from_bytes(b"aab").unwrap();
        assert_eq!(unpack(&tree, &[0b1101_1111, 3], 8).unwrap(), b"aab");
    }

    #[test]
    fn rejects_tiny_chunk() {
        let tree = HuffmanTree::default();
        assert!(matches!(
            Decoder::new(&tree, 1),
            Err(HuffmanError::InvalidConfig(_))
        ));
    }
}
