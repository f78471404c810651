//! Interning of strings into literal codes.
//!
//! A string is looked up, in order, among
//! 1. the globals (one byte, `0x00..0x80`);
//! 2. the predefined identifiers (`0x80`, then the index);
//! 3. the program-specific pool (`0x81 + index / 256`, then `index % 256`).
//!
//! Only the pool is stored in the stream, in the literal region.

use crate::bytes::literal::is_representable;
use crate::{EncodeError, SchemaError, VocabularyError};

use std::collections::HashMap;

use smallvec::SmallVec;

/// The largest number of program-specific literals in a stream.
pub const MAX_LITERALS: usize = 0x7F00;

pub const MAX_GLOBALS: usize = 0x80;

pub const MAX_IDENTIFIERS: usize = 0x100;

const PREDEFINED_ESCAPE: u8 = 0x80;

const POOLED_ESCAPE: u8 = 0x81;

/// The code of an interned string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LiteralCode {
    Global(u8),
    Predefined(u8),
    Pooled(u16),
}
impl LiteralCode {
    pub fn bytes(self) -> SmallVec<[u8; 2]> {
        let mut bytes = SmallVec::new();
        match self {
            LiteralCode::Global(index) => bytes.push(index),
            LiteralCode::Predefined(index) => {
                bytes.push(PREDEFINED_ESCAPE);
                bytes.push(index);
            }
            LiteralCode::Pooled(index) => {
                bytes.push(POOLED_ESCAPE + (index / 0x100) as u8);
                bytes.push((index % 0x100) as u8);
            }
        }
        bytes
    }

    /// Whether the first byte of a code is followed by an index byte.
    pub fn has_index_byte(first: u8) -> bool {
        first >= PREDEFINED_ESCAPE
    }

    /// Rebuild a code from its first byte and, if `has_index_byte`, its
    /// index byte.
    pub fn from_bytes(first: u8, index: u8) -> Self {
        match first {
            PREDEFINED_ESCAPE => LiteralCode::Predefined(index),
            first if first >= POOLED_ESCAPE => {
                LiteralCode::Pooled((first - POOLED_ESCAPE) as u16 * 0x100 + index as u16)
            }
            first => LiteralCode::Global(first),
        }
    }
}

/// The read-only tiers of the literal table.
#[derive(Clone, Debug)]
pub struct Dictionary {
    globals: Vec<String>,
    identifiers: Vec<String>,
    global_index: HashMap<String, u8>,
    identifier_index: HashMap<String, u8>,
}
impl Dictionary {
    pub fn new(globals: &[String], identifiers: &[String]) -> Result<Self, VocabularyError> {
        if globals.len() > MAX_GLOBALS {
            return Err(VocabularyError::TooManyGlobals(globals.len()));
        }
        if identifiers.len() > MAX_IDENTIFIERS {
            return Err(VocabularyError::TooManyIdentifiers(identifiers.len()));
        }
        Ok(Dictionary {
            global_index: Self::index(globals),
            identifier_index: Self::index(identifiers),
            globals: globals.to_vec(),
            identifiers: identifiers.to_vec(),
        })
    }

    /// The first occurrence of a duplicate string wins.
    fn index(table: &[String]) -> HashMap<String, u8> {
        let mut index = HashMap::with_capacity(table.len());
        for (i, value) in table.iter().enumerate() {
            index.entry(value.clone()).or_insert(i as u8);
        }
        index
    }

    pub fn global(&self, index: u8) -> Option<&str> {
        self.globals.get(index as usize).map(String::as_str)
    }

    pub fn identifier(&self, index: u8) -> Option<&str> {
        self.identifiers.get(index as usize).map(String::as_str)
    }

    /// Look up a string in the read-only tiers.
    pub fn lookup(&self, value: &str) -> Option<LiteralCode> {
        if let Some(&index) = self.global_index.get(value) {
            return Some(LiteralCode::Global(index));
        }
        self.identifier_index
            .get(value)
            .map(|&index| LiteralCode::Predefined(index))
    }
}

/// The literal table of a single encode call.
pub struct LiteralTable<'a> {
    dictionary: &'a Dictionary,
    pool: Vec<String>,
    pool_index: HashMap<String, u16>,
}
impl<'a> LiteralTable<'a> {
    pub fn new(dictionary: &'a Dictionary) -> Self {
        LiteralTable {
            dictionary,
            pool: vec![],
            pool_index: HashMap::new(),
        }
    }

    pub fn intern(&mut self, value: &str) -> Result<LiteralCode, EncodeError> {
        if let Some(code) = self.dictionary.lookup(value) {
            return Ok(code);
        }
        if let Some(&index) = self.pool_index.get(value) {
            return Ok(LiteralCode::Pooled(index));
        }
        if !is_representable(value) {
            return Err(SchemaError::UnrepresentableLiteral(value.to_string()).into());
        }
        if self.pool.len() == MAX_LITERALS {
            return Err(EncodeError::Capacity(MAX_LITERALS + 1));
        }
        let index = self.pool.len() as u16;
        trace!(target: "bean_literals", "Pooling {:?} as {}", value, index);
        self.pool.push(value.to_string());
        self.pool_index.insert(value.to_string(), index);
        Ok(LiteralCode::Pooled(index))
    }

    pub fn resolve(&self, code: LiteralCode) -> Option<&str> {
        match code {
            LiteralCode::Global(index) => self.dictionary.global(index),
            LiteralCode::Predefined(index) => self.dictionary.identifier(index),
            LiteralCode::Pooled(index) => self.pool.get(index as usize).map(String::as_str),
        }
    }

    /// The program-specific literals, in first-use order.
    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    pub fn into_pool(self) -> Vec<String> {
        self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dictionary() -> Dictionary {
        let globals = vec!["".to_string(), "length".to_string()];
        let identifiers = vec!["push".to_string(), "length".to_string()];
        Dictionary::new(&globals, &identifiers).expect("Could not build dictionary")
    }

    #[test]
    fn test_lookup_order() {
        let dictionary = dictionary();
        let mut table = LiteralTable::new(&dictionary);
        assert_eq!(table.intern("length"), Ok(LiteralCode::Global(1)));
        assert_eq!(table.intern(""), Ok(LiteralCode::Global(0)));
        assert_eq!(table.intern("push"), Ok(LiteralCode::Predefined(0)));
        assert_eq!(table.intern("foo"), Ok(LiteralCode::Pooled(0)));
        assert_eq!(table.intern("bar"), Ok(LiteralCode::Pooled(1)));
        assert_eq!(table.intern("foo"), Ok(LiteralCode::Pooled(0)));
        assert_eq!(table.pool(), &["foo".to_string(), "bar".to_string()]);

        assert_eq!(table.resolve(LiteralCode::Predefined(0)), Some("push"));
        assert_eq!(table.resolve(LiteralCode::Pooled(1)), Some("bar"));
        assert_eq!(table.resolve(LiteralCode::Pooled(2)), None);
        assert_eq!(table.resolve(LiteralCode::Global(2)), None);
    }

    #[test]
    fn test_code_bytes() {
        assert_eq!(&LiteralCode::Global(5).bytes()[..], &[0x05]);
        assert_eq!(&LiteralCode::Predefined(7).bytes()[..], &[0x80, 0x07]);
        assert_eq!(&LiteralCode::Pooled(0).bytes()[..], &[0x81, 0x00]);
        assert_eq!(&LiteralCode::Pooled(0x1234).bytes()[..], &[0x93, 0x34]);
        assert_eq!(
            &LiteralCode::Pooled((MAX_LITERALS - 1) as u16).bytes()[..],
            &[0xFF, 0xFF]
        );

        assert!(!LiteralCode::has_index_byte(0x7F));
        assert!(LiteralCode::has_index_byte(0x80));
        assert_eq!(LiteralCode::from_bytes(0x05, 0), LiteralCode::Global(5));
        assert_eq!(LiteralCode::from_bytes(0x80, 7), LiteralCode::Predefined(7));
        assert_eq!(LiteralCode::from_bytes(0x93, 0x34), LiteralCode::Pooled(0x1234));
    }

    #[test]
    fn test_capacity() {
        let dictionary = dictionary();
        let mut table = LiteralTable::new(&dictionary);
        for i in 0..MAX_LITERALS {
            assert_eq!(
                table.intern(&format!("literal{}", i)),
                Ok(LiteralCode::Pooled(i as u16))
            );
        }
        // Known literals are still fine.
        assert_eq!(table.intern("literal0"), Ok(LiteralCode::Pooled(0)));
        assert_eq!(table.intern("push"), Ok(LiteralCode::Predefined(0)));
        assert_eq!(
            table.intern("one too many"),
            Err(EncodeError::Capacity(MAX_LITERALS + 1))
        );
    }

    #[test]
    fn test_unrepresentable() {
        let dictionary = dictionary();
        let mut table = LiteralTable::new(&dictionary);
        assert_matches!(
            table.intern("\u{2603}"),
            Err(EncodeError::Schema(SchemaError::UnrepresentableLiteral(_)))
        );
        assert!(table.pool().is_empty());
    }

    #[test]
    fn test_bad_dictionary() {
        let globals: Vec<String> = (0..129).map(|i| i.to_string()).collect();
        assert_matches!(
            Dictionary::new(&globals, &[]),
            Err(VocabularyError::TooManyGlobals(129))
        );
        let identifiers: Vec<String> = (0..257).map(|i| i.to_string()).collect();
        assert_matches!(
            Dictionary::new(&[], &identifiers),
            Err(VocabularyError::TooManyIdentifiers(257))
        );
    }
}
