//! Byte-level conventions of the format.
//!
//! The same two byte values are reused with several meanings across the
//! format. Each meaning gets its own name here, so that call sites say which
//! one they mean.

/// Writing and reading the literal region.
pub mod literal;

/// Set on a tag byte when more items follow at the same position.
pub const CONTINUATION: u8 = 0x80;

/// The bits of a tag byte holding the node-kind code.
pub const KIND_MASK: u8 = 0x7F;

/// Closes an empty list, or an absent slot that ends its node.
pub const LIST_END: u8 = 0x00;

/// Stands for an absent slot when more slots follow, or for an array hole.
pub const HOLE: u8 = 0x80;

/// Set on every flag byte and operator byte, so that they never read as
/// `LIST_END`.
pub const FLAGS_PRESENT: u8 = 0x80;

/// The bits of an operator byte holding the operator code.
pub const OPERATOR_MASK: u8 = 0x1F;

/// The bit of a unary or update operator byte marking a prefix operator.
pub const PREFIX: u8 = 1 << 6;

/// Node-kind codes start here. Codes below are never node kinds.
pub const FIRST_KIND_CODE: u8 = 32;

/// Whether an item is followed by siblings at the same position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    More,
    Last,
}
impl Position {
    /// `Last` for the final item of a sequence of `len` items.
    pub fn of(index: usize, len: usize) -> Self {
        Self::last_if(index + 1 == len)
    }

    pub fn last_if(last: bool) -> Self {
        if last {
            Position::Last
        } else {
            Position::More
        }
    }

    /// Combine a node-kind code into a tag byte.
    pub fn tag(self, code: u8) -> u8 {
        match self {
            Position::More => CONTINUATION | code,
            Position::Last => code,
        }
    }

    /// The position encoded in a tag byte (or sentinel).
    pub fn of_byte(byte: u8) -> Self {
        Self::last_if(byte & CONTINUATION == 0)
    }
}

/// A byte standing in for an absent node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sentinel {
    /// Nothing follows in this node.
    End,
    /// More slots follow in this node.
    Hole,
}
impl Sentinel {
    /// `Hole` if more slots follow, `End` otherwise.
    pub fn at(position: Position) -> Self {
        match position {
            Position::More => Sentinel::Hole,
            Position::Last => Sentinel::End,
        }
    }

    pub fn byte(self) -> u8 {
        match self {
            Sentinel::End => LIST_END,
            Sentinel::Hole => HOLE,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            LIST_END => Some(Sentinel::End),
            HOLE => Some(Sentinel::Hole),
            _ => None,
        }
    }
}

/// Pack a set of booleans into a flag byte.
///
/// Each pair is `(bit, value)`.
pub fn flags_byte(bits: &[(u8, bool)]) -> u8 {
    bits.iter()
        .filter(|&&(_, set)| set)
        .fold(FLAGS_PRESENT, |byte, &(bit, _)| byte | (1 << bit))
}

/// Test a single bit of a flag byte.
pub fn flag(byte: u8, bit: u8) -> bool {
    (byte >> bit) & 1 == 1
}

#[test]
fn test_tag_bytes() {
    assert_eq!(Position::More.tag(32), 0xA0);
    assert_eq!(Position::Last.tag(32), 0x20);
    assert_eq!(Position::of_byte(0xA0), Position::More);
    assert_eq!(Position::of_byte(0x20), Position::Last);
    assert_eq!(Position::of(0, 2), Position::More);
    assert_eq!(Position::of(1, 2), Position::Last);

    // Sentinels carry a continuation bit like any tag byte.
    assert_eq!(Position::of_byte(HOLE), Position::More);
    assert_eq!(Position::of_byte(LIST_END), Position::Last);
    assert_eq!(Sentinel::at(Position::More).byte(), HOLE);
    assert_eq!(Sentinel::at(Position::Last).byte(), LIST_END);
    assert_eq!(Sentinel::from_byte(0x81), None);
}

#[test]
fn test_flags_byte() {
    assert_eq!(flags_byte(&[]), 0x80);
    assert_eq!(flags_byte(&[(1, true), (0, false)]), 0x82);
    assert_eq!(flags_byte(&[(3, true), (2, true)]), 0x8C);
    assert!(flag(0x8C, 3));
    assert!(!flag(0x8C, 0));
}
