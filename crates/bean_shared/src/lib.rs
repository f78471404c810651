//! Data structures shared by the encoder, the decoder and the importer.

#[macro_use]
extern crate log;

pub mod ast;
pub use ast::{Node, NodeKind, Program};

mod json_conversion;
pub use json_conversion::*;
