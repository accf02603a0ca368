use std::fmt;

use tracing::debug;

use crate::bit_vec::BitVec;
use crate::code_table::CodeTable;
use crate::error::{HuffmanError, Result};
use crate::min_heap::MinHeap;
use crate::weights::{FrequencyTable, ALPHABET_SIZE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        weight: u64,
        byte: u8,
    },
    Fork {
        weight: u64,
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub fn new(b: u8, w: u64) -> Self {
        HuffNode::Leaf { weight: w, byte: b }
    }

    pub fn weight(&self) -> u64 {
        match self {
            HuffNode::Leaf { weight, .. } => *weight,
            HuffNode::Fork { weight, .. } => *weight,
        }
    }

    /// Joins two trees; `a` becomes the left (0) branch.
    pub fn merge(a: Self, b: Self) -> Result<Self> {
        let weight = a
            .weight()
            .checked_add(b.weight())
            .ok_or(HuffmanError::WeightOverflow)?;
        Ok(HuffNode::Fork {
            weight,
            left: Box::new(a),
            right: Box::new(b),
        })
    }

    fn generate_table(&self, code_table: &mut CodeTable, path: BitVec) {
        match self {
            HuffNode::Leaf { byte, .. } => {
                code_table.insert(*byte, path);
            }
            HuffNode::Fork { weight, left, right } => {
                if *weight == 0 {
                    return;
                }
                left.generate_table(code_table, path.with_bit(false));
                right.generate_table(code_table, path.with_bit(true));
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            HuffNode::Leaf { .. } => 0,
            HuffNode::Fork { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, depth: usize, label: &str) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            HuffNode::Leaf { byte, weight } => writeln!(
                f,
                "{}{}-> Leaf: {:?} ({}) [weight: {}]",
                indent,
                label,
                char::from(*byte),
                byte,
                weight
            ),
            HuffNode::Fork { weight, left, right } => {
                writeln!(f, "{}{}-> Fork [weight: {}]", indent, label, weight)?;
                left.fmt_node(f, depth + 1, "L")?;
                right.fmt_node(f, depth + 1, "R")
            }
        }
    }
}

/// Static code tree rebuilt identically from the same frequency table.
///
/// Leaves enter the queue in ascending symbol order and equal weights
/// leave it first-in first-out, so two builds over one table always
/// perform the same merges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HuffmanTree {
    root: Option<HuffNode>,
    filler: Option<u8>,
}

impl HuffmanTree {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        HuffmanTree::from_frequencies(&FrequencyTable::from_bytes(bytes)?)
    }

    pub fn from_frequencies(frequencies: &FrequencyTable) -> Result<Self> {
        let mut heap = MinHeap::with_capacity(ALPHABET_SIZE);
        for (byte, weight) in frequencies.iter() {
            heap.insert(HuffNode::new(byte, weight), weight)?;
        }

        let mut filler = None;
        match heap.heap_size() {
            0 => {
                debug!("no symbols, code tree is empty");
                return Ok(HuffmanTree::default());
            }
            1 => {
                // A lone symbol would get a zero-length code. Give it a
                // sibling so it encodes to one bit.
                let (only, _) = frequencies.iter().next().unwrap_or_default();
                let sibling = ((only as usize + 1) % ALPHABET_SIZE) as u8;
                heap.insert(HuffNode::new(sibling, 1), 1)?;
                filler = Some(sibling);
                debug!(symbol = only, filler = sibling, "single-symbol alphabet");
            }
            _ => {}
        }

        let tree = HuffmanTree::build_from_heap(heap, filler)?;
        debug!(
            leaves = frequencies.distinct(),
            depth = tree.depth(),
            weight = tree.weight(),
            "built code tree"
        );
        Ok(tree)
    }

    fn build_from_heap(mut heap: MinHeap<HuffNode>, filler: Option<u8>) -> Result<Self> {
        while heap.heap_size() > 1 {
            let (x, _) = heap.extract_min()?;
            let (y, _) = heap.extract_min()?;

            let z = HuffNode::merge(x, y)?;
            let weight = z.weight();
            heap.insert(z, weight)?;
        }
        let (root, _) = heap.extract_min()?;

        Ok(HuffmanTree {
            root: Some(root),
            filler,
        })
    }

    pub fn root(&self) -> Option<&HuffNode> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The synthetic sibling added for a single-symbol alphabet. It has a
    /// code but never appears in a stream produced by the encoder.
    pub fn filler(&self) -> Option<u8> {
        self.filler
    }

    pub fn weight(&self) -> u64 {
        self.root.as_ref().map_or(0, HuffNode::weight)
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, HuffNode::depth)
    }

    /// Codes are root-to-leaf paths, left = 0 and right = 1.
    pub fn generate_table(&self) -> CodeTable {
        let mut table = CodeTable::default();
        if let Some(root) = &self.root {
            root.generate_table(&mut table, BitVec::new());
        }
        table
    }

    pub fn print_structure(&self) {
        println!("Huffman Tree Structure:");
        print!("{}", self);
    }
}

impl fmt::Display for HuffmanTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => root.fmt_node(f, 0, "root"),
            None => writeln!(f, "(empty)"),
        }
    }
}
