//! # ascii_huffman
//!
//! Static Huffman compression for 7-bit ASCII streams. Encoding writes two
//! files: a human-readable weight table and the packed bitstream. Decoding
//! rebuilds the same code tree from the weight table and unpacks the stream.
//!
//! ## Quick Start
//!
//! ```rust
//! use ascii_huffman::HuffmanCodec;
//!
//! let (weights, packed) = HuffmanCodec::encode_bytes(b"abracadabra")?;
//! assert_eq!(weights, b"a:5\nb:2\nc:1\nd:1\nr:2\n");
//!
//! let restored = HuffmanCodec::decode_bytes(&weights, &packed)?;
//! assert_eq!(restored, b"abracadabra");
//! # Ok::<(), ascii_huffman::HuffmanError>(())
//! ```
//!
//! File-level operations:
//!
//! ```rust,no_run
//! use ascii_huffman::{decode_file, encode_file, CodecConfig};
//! use std::path::Path;
//!
//! let config = CodecConfig::default();
//! encode_file(Path::new("input.txt"), Path::new("input.w"), Path::new("input.huff"), config)?;
//! decode_file(Path::new("input.huff"), Path::new("input.w"), Path::new("output.txt"), config)?;
//! # Ok::<(), ascii_huffman::HuffmanError>(())
//! ```

pub mod code_table;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod huffman_codec;
pub mod hufftree;
pub mod weights;

mod bit_vec;
mod min_heap;

pub use bit_vec::BitVec;
pub use code_table::CodeTable;
pub use error::{HuffmanError, Result};
pub use huffman_codec::{decode_file, encode_file, CodecConfig, HuffmanCodec};
pub use hufftree::{HuffNode, HuffmanTree};
pub use min_heap::{HeapErr, MinHeap};
pub use weights::{FrequencyTable, ALPHABET_SIZE};
