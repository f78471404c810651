//! Encoding syntax trees to bytes and decoding bytes back to source text.

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
#[macro_use]
extern crate log;

use bean_shared::NodeKind;

use derive_more::Display;

/// Byte-level utilities shared by the encoder and the decoder.
pub mod bytes;

/// Bidirectional map between node kinds and their byte codes.
pub mod kind;

/// The three-tier literal table.
pub mod literals;

/// Textual forms of numbers.
pub mod number;

pub mod vocabulary;
pub use vocabulary::Vocabulary;

mod statistics;
pub use statistics::{Bytes, Instances, Statistics};

/// Tree to bytes.
pub mod encode;

/// Bytes to tokens to text.
pub mod decode;
pub use decode::{Decoded, Escape, Token};

mod codec;
pub use codec::Codec;

/// The deepest nesting of nodes, counted from a top-level statement, that
/// the encoder writes and the decoder reads.
///
/// Both walks recurse once per level, so the limit has to fit the default
/// stack of a spawned thread.
pub const MAX_NESTING: usize = 256;

/// An encode-side error caused by a tree that the format cannot express.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum SchemaError {
    #[display(fmt = "node kind {} is not in the vocabulary", _0)]
    UnregisteredKind(NodeKind),

    /// A literal that would need to be pooled, but cannot be stored in the
    /// 7-bit literal region.
    #[display(fmt = "literal {:?} contains characters that cannot be encoded", _0)]
    UnrepresentableLiteral(String),

    #[display(fmt = "number {} has no literal form", _0)]
    NonFiniteNumber(f64),

    #[display(fmt = "malformed {}: {}", kind, reason)]
    Malformed { kind: NodeKind, reason: &'static str },

    #[display(fmt = "{} nested more than {} levels deep", _0, MAX_NESTING)]
    TooDeep(NodeKind),
}
impl std::error::Error for SchemaError {}

#[derive(Clone, Debug, Display, PartialEq)]
pub enum EncodeError {
    #[display(fmt = "encoded {} program-specific literals, only 32512 supported", _0)]
    Capacity(usize),

    #[display(fmt = "{}", _0)]
    Schema(SchemaError),
}
impl std::error::Error for EncodeError {}
impl From<SchemaError> for EncodeError {
    fn from(err: SchemaError) -> Self {
        EncodeError::Schema(err)
    }
}

/// A decode-side error caused by bytes that are not a valid encoding.
///
/// Offsets are absolute positions in the input.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum FormatError {
    #[display(fmt = "unexpected end of input at offset {}", offset)]
    Truncated { offset: usize },

    #[display(fmt = "unknown node kind code {} at offset {}", code, offset)]
    BadKind { offset: usize, code: u8 },

    #[display(fmt = "expected a node at offset {}", offset)]
    MissingNode { offset: usize },

    #[display(fmt = "expected the end of a node at offset {}", offset)]
    ExpectedEnd { offset: usize },

    #[display(fmt = "invalid flags {:#04x} at offset {}", byte, offset)]
    BadFlags { offset: usize, byte: u8 },

    #[display(fmt = "unknown operator code {} at offset {}", code, offset)]
    BadOperator { offset: usize, code: u8 },

    #[display(fmt = "global literal index {} is out of range", _0)]
    BadGlobalIndex(u8),

    #[display(fmt = "predefined identifier index {} is out of range", _0)]
    BadIdentifierIndex(u8),

    #[display(fmt = "literal index {} is out of range", _0)]
    BadLiteralIndex(usize),

    #[display(fmt = "invalid literal byte at offset {}", offset)]
    BadLiteralByte { offset: usize },

    #[display(fmt = "nodes nested too deeply at offset {}", offset)]
    TooDeep { offset: usize },
}
impl std::error::Error for FormatError {}

#[derive(Clone, Debug, Display, PartialEq)]
pub enum DecodeError {
    #[display(fmt = "decoded {} program-specific literals, only 32512 supported", _0)]
    Capacity(usize),

    #[display(fmt = "{}", _0)]
    Format(FormatError),
}
impl std::error::Error for DecodeError {}
impl From<FormatError> for DecodeError {
    fn from(err: FormatError) -> Self {
        DecodeError::Format(err)
    }
}

/// An error in a vocabulary, detected while building a `Codec`.
#[derive(Debug, Display)]
pub enum VocabularyError {
    #[display(fmt = "could not parse vocabulary: {}", _0)]
    Json(serde_json::Error),

    #[display(fmt = "could not read vocabulary: {}", _0)]
    Io(std::io::Error),

    #[display(fmt = "{} globals, at most 128 supported", _0)]
    TooManyGlobals(usize),

    #[display(fmt = "{} predefined identifiers, at most 256 supported", _0)]
    TooManyIdentifiers(usize),

    #[display(fmt = "{} node kinds, at most 96 supported", _0)]
    TooManyKinds(usize),

    #[display(fmt = "unknown node kind {:?}", _0)]
    UnknownKind(String),

    #[display(fmt = "node kind {:?} appears twice", _0)]
    DuplicateKind(String),
}
impl std::error::Error for VocabularyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            VocabularyError::Json(ref err) => Some(err),
            VocabularyError::Io(ref err) => Some(err),
            _ => None,
        }
    }
}
impl From<serde_json::Error> for VocabularyError {
    fn from(err: serde_json::Error) -> Self {
        VocabularyError::Json(err)
    }
}
impl From<std::io::Error> for VocabularyError {
    fn from(err: std::io::Error) -> Self {
        VocabularyError::Io(err)
    }
}
