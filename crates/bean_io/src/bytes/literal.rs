//! The literal region.
//!
//! Each literal is stored as its 7-bit characters, with the continuation bit
//! set on every character but the last. The empty literal is a single
//! `LIST_END` byte.

use crate::bytes::{CONTINUATION, KIND_MASK, LIST_END};
use crate::literals::MAX_LITERALS;
use crate::{DecodeError, FormatError};

/// Whether a string may be stored in the literal region.
pub fn is_representable(literal: &str) -> bool {
    literal.bytes().all(|byte| byte != 0 && byte.is_ascii())
}

/// Append the literal region for `pool` to `out`.
///
/// Every literal must satisfy `is_representable`.
pub fn write_literals<S: AsRef<str>>(out: &mut Vec<u8>, pool: &[S]) -> usize {
    let start = out.len();
    for literal in pool {
        let literal = literal.as_ref().as_bytes();
        match literal.split_last() {
            None => out.push(LIST_END),
            Some((last, init)) => {
                out.extend(init.iter().map(|byte| byte | CONTINUATION));
                out.push(*last);
            }
        }
    }
    out.len() - start
}

/// Read a literal region, starting at absolute offset `offset`.
pub fn read_literals(region: &[u8], offset: usize) -> Result<Vec<String>, DecodeError> {
    let mut literals = vec![];
    let mut current = String::new();
    let mut started = false;
    for (i, &byte) in region.iter().enumerate() {
        match byte & KIND_MASK {
            // The empty literal.
            0 if byte == LIST_END && !started => {}
            // A NUL character is never stored.
            0 => return Err(FormatError::BadLiteralByte { offset: offset + i }.into()),
            c => current.push(c as char),
        }
        started = true;
        if byte & CONTINUATION == 0 {
            if literals.len() == MAX_LITERALS {
                return Err(DecodeError::Capacity(MAX_LITERALS + 1));
            }
            literals.push(std::mem::replace(&mut current, String::new()));
            started = false;
        }
    }
    if started {
        return Err(FormatError::Truncated {
            offset: offset + region.len(),
        }
        .into());
    }
    debug!(target: "bean_literals", "Read {} literals", literals.len());
    Ok(literals)
}
