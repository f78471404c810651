//! Source-level operations.
//!
//! Parsing JavaScript is left to an external parser. This module reads what
//! the parser writes out.

use bean_shared::{FromJSON, Program};

use serde_json::Value as JSON;

use std::fmt::Debug;

/// A source that can produce an AST from text.
pub trait SourceParser {
    type Error: Debug;

    /// Parse a string.
    fn parse_str(&self, source: &str) -> Result<Program, Self::Error>;
}

/// The JSON text of a Babel (or babylon) parse, i.e. what
/// `JSON.stringify(babylon.parse(source))` writes.
#[derive(Clone, Copy, Debug, Default)]
pub struct BabelJson;
impl BabelJson {
    /// Import an already parsed JSON tree.
    pub fn parse_value(&self, json: &JSON) -> Result<Program, crate::Error> {
        let program = Program::import(json)?;
        debug!(target: "bean_source", "Imported {} top-level statements", program.body.len());
        Ok(program)
    }
}
impl SourceParser for BabelJson {
    type Error = crate::Error;

    fn parse_str(&self, source: &str) -> Result<Program, Self::Error> {
        let json: JSON = serde_json::from_str(source)?;
        self.parse_value(&json)
    }
}
