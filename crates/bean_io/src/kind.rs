use crate::bytes::{FIRST_KIND_CODE, KIND_MASK};
use crate::VocabularyError;

use bean_shared::NodeKind;

use std::collections::HashMap;

use vec_map::VecMap;

/// The most node kinds that fit in a tag byte.
pub const MAX_KINDS: usize = (KIND_MASK - FIRST_KIND_CODE) as usize + 1;

/// Node kinds and their byte codes, in both directions.
///
/// The kind at position `i` of the vocabulary has code `i + 32`.
#[derive(Clone, Debug)]
pub struct KindRegistry {
    codes: HashMap<NodeKind, u8>,
    kinds: VecMap<NodeKind>,
}
impl KindRegistry {
    pub fn new<S: AsRef<str>>(names: &[S]) -> Result<Self, VocabularyError> {
        if names.len() > MAX_KINDS {
            return Err(VocabularyError::TooManyKinds(names.len()));
        }
        let mut codes = HashMap::with_capacity(names.len());
        let mut kinds = VecMap::with_capacity(names.len() + FIRST_KIND_CODE as usize);
        for (position, name) in names.iter().enumerate() {
            let name = name.as_ref();
            let kind = NodeKind::from_name(name)
                .ok_or_else(|| VocabularyError::UnknownKind(name.to_string()))?;
            let code = FIRST_KIND_CODE + position as u8;
            if codes.insert(kind, code).is_some() {
                return Err(VocabularyError::DuplicateKind(name.to_string()));
            }
            kinds.insert(code as usize, kind);
        }
        Ok(KindRegistry { codes, kinds })
    }

    pub fn code_of(&self, kind: NodeKind) -> Option<u8> {
        self.codes.get(&kind).cloned()
    }

    /// The kind of a code, ignoring the continuation bit.
    pub fn kind_of(&self, code: u8) -> Option<NodeKind> {
        self.kinds.get((code & KIND_MASK) as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }
}
