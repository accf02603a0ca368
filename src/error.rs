//! Error types shared by every stage of the codec.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::min_heap::HeapErr;

pub type Result<T> = std::result::Result<T, HuffmanError>;

/// Which side of a file operation failed, used to pick an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Input,
    Output,
}

impl FileRole {
    fn verb(self) -> &'static str {
        match self {
            FileRole::Input => "open",
            FileRole::Output => "create",
        }
    }
}

#[derive(Debug, Error)]
pub enum HuffmanError {
    #[error("can't {} file {}: {source}", role.verb(), path.display())]
    File {
        path: PathBuf,
        role: FileRole,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("priority queue: {0}")]
    Heap(#[from] HeapErr),

    #[error("byte 0x{byte:02x} at offset {offset} is outside the 7-bit alphabet")]
    SymbolOutOfRange { byte: u8, offset: u64 },

    #[error("symbol 0x{0:02x} has no code; input changed between passes?")]
    SymbolNotInTable(u8),

    #[error("invalid weight specification on line {line}: {reason}")]
    WeightFile { line: usize, reason: String },

    #[error("total symbol weight overflows u64")]
    WeightOverflow,

    #[error("packed stream is empty, trailer byte missing")]
    MissingTrailer,

    #[error("invalid trailer byte {0}")]
    InvalidTrailer(u8),

    #[error("packed stream ends in the middle of a code")]
    TruncatedCode,

    #[error("encountered unexpected code during decoding")]
    UnexpectedCode,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HuffmanError {
    pub(crate) fn weight_file(line: usize, reason: impl Into<String>) -> Self {
        HuffmanError::WeightFile {
            line,
            reason: reason.into(),
        }
    }

    /// Process exit status for this error, following sysexits(3).
    pub fn exit_code(&self) -> i32 {
        match self {
            HuffmanError::File {
                role: FileRole::Input,
                ..
            } => 66,
            HuffmanError::File {
                role: FileRole::Output,
                ..
            } => 73,
            HuffmanError::Io(_) => 74,
            HuffmanError::Heap(_) => 70,
            HuffmanError::InvalidConfig(_) => 78,
            HuffmanError::SymbolOutOfRange { .. }
            | HuffmanError::SymbolNotInTable(_)
            | HuffmanError::WeightFile { .. }
            | HuffmanError::WeightOverflow
            | HuffmanError::MissingTrailer
            | HuffmanError::InvalidTrailer(_)
            | HuffmanError::TruncatedCode
            | HuffmanError::UnexpectedCode => 65,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        let open = HuffmanError::File {
            path: PathBuf::from("missing.txt"),
            role: FileRole::Input,
            source: io::Error::new(io::ErrorKind::NotFound, "nope"),
        };
        assert_eq!(open.exit_code(), 66);
        assert_eq!(HuffmanError::TruncatedCode.exit_code(), 65);
        assert_eq!(HuffmanError::weight_file(3, "expected ':'").exit_code(), 65);
        assert_eq!(HuffmanError::Heap(HeapErr::HeapUnderflow).exit_code(), 70);
    }

    #[test]
    fn file_error_names_the_failed_operation() {
        let open = HuffmanError::File {
            path: PathBuf::from("in.txt"),
            role: FileRole::Input,
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(open.to_string(), "can't open file in.txt: not found");

        let create = HuffmanError::File {
            path: PathBuf::from("out/x.huff"),
            role: FileRole::Output,
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(create.to_string(), "can't create file out/x.huff: denied");
        assert_eq!(create.exit_code(), 73);
    }

    #[test]
    fn weight_file_error_names_the_line() {
        let err = HuffmanError::weight_file(7, "missing newline");
        assert_eq!(
            err.to_string(),
            "invalid weight specification on line 7: missing newline"
        );
    }
}
