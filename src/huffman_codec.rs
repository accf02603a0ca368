use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{info, info_span, warn};

use crate::code_table::CodeTable;
use crate::decoder::{DecodeStats, Decoder, MIN_CHUNK};
use crate::encoder::{self, EncodeStats};
use crate::error::{FileRole, HuffmanError, Result};
use crate::hufftree::HuffmanTree;
use crate::weights::FrequencyTable;

/// Buffer sizes used by the streaming passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecConfig {
    /// Read size for the encoder's input pass.
    pub read_chunk: usize,
    /// Size of each of the decoder's two lookahead buffers.
    pub decode_chunk: usize,
    /// Bytes the encoder collects before writing them out.
    pub write_buffer: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            read_chunk: 8 * 1024,
            decode_chunk: 4 * 1024,
            write_buffer: 8 * 1024,
        }
    }
}

impl CodecConfig {
    pub fn with_decode_chunk(mut self, decode_chunk: usize) -> Self {
        self.decode_chunk = decode_chunk;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.read_chunk == 0 || self.write_buffer == 0 {
            return Err(HuffmanError::InvalidConfig(
                "buffer sizes must be nonzero".to_string(),
            ));
        }
        if self.decode_chunk < MIN_CHUNK {
            return Err(HuffmanError::InvalidConfig(format!(
                "decode chunk must be at least {} bytes, got {}",
                MIN_CHUNK, self.decode_chunk
            )));
        }
        Ok(())
    }
}

/// A code tree together with the code table derived from it.
#[derive(Debug, Clone)]
pub struct HuffmanCodec {
    frequencies: FrequencyTable,
    tree: HuffmanTree,
    encode_table: CodeTable,
    config: CodecConfig,
}

impl HuffmanCodec {
    pub fn new(frequencies: FrequencyTable, config: CodecConfig) -> Result<Self> {
        config.validate()?;
        let tree = HuffmanTree::from_frequencies(&frequencies)?;
        let encode_table = tree.generate_table();
        Ok(HuffmanCodec {
            frequencies,
            tree,
            encode_table,
            config,
        })
    }

    pub fn from_weight_file(path: &Path, config: CodecConfig) -> Result<Self> {
        let file = open(path)?;
        Self::new(FrequencyTable::read_from(BufReader::new(file))?, config)
    }

    pub fn frequencies(&self) -> &FrequencyTable {
        &self.frequencies
    }

    pub fn tree(&self) -> &HuffmanTree {
        &self.tree
    }

    pub fn code_table(&self) -> &CodeTable {
        &self.encode_table
    }

    pub fn encode<R: Read, W: Write>(&self, reader: R, writer: W) -> Result<EncodeStats> {
        encoder::encode(
            &self.encode_table,
            reader,
            writer,
            self.config.read_chunk,
            self.config.write_buffer,
        )
    }

    pub fn decode<R: Read, W: Write>(&self, reader: R, writer: W) -> Result<DecodeStats> {
        Decoder::new(&self.tree, self.config.decode_chunk)?.decode(reader, writer)
    }

    /// In-memory encode; returns the weight file and the packed stream.
    pub fn encode_bytes(data: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let codec = HuffmanCodec::new(FrequencyTable::from_bytes(data)?, CodecConfig::default())?;
        let mut packed = Vec::new();
        codec.encode(data, &mut packed)?;
        Ok((codec.frequencies.serialize(), packed))
    }

    /// In-memory decode from weight-file contents and a packed stream.
    pub fn decode_bytes(weights: &[u8], packed: &[u8]) -> Result<Vec<u8>> {
        let codec = HuffmanCodec::new(FrequencyTable::parse(weights)?, CodecConfig::default())?;
        let mut out = Vec::new();
        codec.decode(packed, &mut out)?;
        Ok(out)
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| HuffmanError::File {
        path: path.to_path_buf(),
        role: FileRole::Input,
        source,
    })
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| HuffmanError::File {
        path: path.to_path_buf(),
        role: FileRole::Output,
        source,
    })
}

/// Compresses `input` into `output` and records the symbol weights in
/// `weights`. Both output files are rewritten from scratch.
pub fn encode_file(
    input: &Path,
    weights: &Path,
    output: &Path,
    config: CodecConfig,
) -> Result<HuffmanCodec> {
    let _span = info_span!("encode", input = %input.display()).entered();
    config.validate()?;

    let frequencies = FrequencyTable::count_from(open(input)?)?;
    let codec = HuffmanCodec::new(frequencies, config)?;

    let mut weight_file = BufWriter::new(create(weights)?);
    codec.frequencies.write_to(&mut weight_file)?;

    let out = BufWriter::new(create(output)?);
    let stats = codec.encode(open(input)?, out)?;

    let ratio = if stats.symbols == 0 {
        0.0
    } else {
        stats.bytes_written as f64 / stats.symbols as f64
    };
    info!(
        symbols = stats.symbols,
        distinct = codec.encode_table.len(),
        predicted_bits = codec.encode_table.encoded_bits(&codec.frequencies),
        payload_bits = stats.payload_bits,
        bytes_written = stats.bytes_written,
        ratio = %format!("{:.3}", ratio),
        "encoded"
    );
    Ok(codec)
}

/// Restores the original bytes of `input` into `output`, rebuilding the
/// code tree from `weights`. A failed decode leaves no output file behind.
pub fn decode_file(
    input: &Path,
    weights: &Path,
    output: &Path,
    config: CodecConfig,
) -> Result<HuffmanCodec> {
    let _span = info_span!("decode", input = %input.display()).entered();
    let codec = HuffmanCodec::from_weight_file(weights, config)?;

    let packed = open(input)?;
    let out = BufWriter::new(create(output)?);
    let stats = match codec.decode(packed, out) {
        Ok(stats) => stats,
        Err(err) => {
            if let Err(rm) = fs::remove_file(output) {
                warn!(output = %output.display(), error = %rm, "could not remove partial output");
            }
            return Err(err);
        }
    };

    info!(
        bytes_read = stats.bytes_read,
        symbols = stats.symbols,
        trailer = stats.trailer,
        "decoded"
    );
    Ok(codec)
}
