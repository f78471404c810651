//! A compact binary encoding for JavaScript syntax trees.
//!
//! # The format
//!
//! A program is written as a pre-order walk of its tree, one tag byte per
//! node, followed by the strings that the program uses and that no built-in
//! table already holds. Decoding gives back equivalent source text, without
//! the whitespace and comments of the input.
//!
//! Specifications of the format are cut in three layers:
//!
//! - the AST (see module `shared`);
//! - the lookup tables (see `io::kind`, `io::literals` and `io::vocabulary`);
//! - the bytes (see `io::encode`, `io::decode` and `io::bytes`).
//!
//! ```
//! let bytes = bean::encode_json_str(r#"{
//!     "type": "Program",
//!     "body": [{
//!         "type": "ExpressionStatement",
//!         "expression": { "type": "Identifier", "name": "x" }
//!     }]
//! }"#).unwrap();
//! assert_eq!(bean::decode(&bytes).unwrap(), "x;");
//! ```

#[macro_use]
extern crate log;

use derive_more::{Display, From};

use std::sync::OnceLock;

pub mod shared {
    pub use bean_shared::*;
}

pub mod io {
    pub use bean_io::*;
}

/// Reading parser output into an AST.
pub mod source;

pub use bean_io::{Codec, DecodeError, EncodeError, Statistics, Vocabulary};
pub use bean_shared::{FromJSON, FromJSONError, Node, NodeKind, Program};

#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "could not parse JSON: {}", _0)]
    Json(serde_json::Error),

    #[display(fmt = "could not import tree: {}", _0)]
    Import(FromJSONError),

    #[display(fmt = "could not encode: {}", _0)]
    Encode(EncodeError),

    #[display(fmt = "could not decode: {}", _0)]
    Decode(DecodeError),
}
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Json(ref err) => Some(err),
            Error::Import(ref err) => Some(err),
            Error::Encode(ref err) => Some(err),
            Error::Decode(ref err) => Some(err),
        }
    }
}

/// The codec of the built-in vocabulary, built on first use.
pub fn codec() -> &'static Codec {
    static CODEC: OnceLock<Codec> = OnceLock::new();
    CODEC.get_or_init(|| {
        debug!(target: "bean", "Building the default codec");
        Codec::new(&Vocabulary::default()).expect("The built-in vocabulary is valid")
    })
}

/// Encode a program with the built-in vocabulary.
pub fn encode(program: &Program) -> Result<Vec<u8>, EncodeError> {
    codec().encode(program)
}

/// Decode a stream encoded with the built-in vocabulary.
pub fn decode(bytes: &[u8]) -> Result<String, DecodeError> {
    codec().decode(bytes)
}

/// Encode the JSON output of a Babel parse, either a `File` or a `Program`.
pub fn encode_json_str(json: &str) -> Result<Vec<u8>, Error> {
    use source::SourceParser;
    let program = source::BabelJson.parse_str(json)?;
    Ok(encode(&program)?)
}
