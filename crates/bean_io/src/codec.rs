use crate::decode::{Decoded, Decoder};
use crate::encode::Encoder;
use crate::kind::KindRegistry;
use crate::literals::Dictionary;
use crate::{DecodeError, EncodeError, Statistics, Vocabulary, VocabularyError};

use bean_shared::{NodeKind, Program};

use itertools::Itertools;

/// The read-only tables of the format, shared by any number of encode and
/// decode calls, possibly on several threads.
#[derive(Clone, Debug)]
pub struct Codec {
    registry: KindRegistry,
    dictionary: Dictionary,
}
impl Codec {
    /// Validate a vocabulary and build its lookup tables.
    pub fn new(vocabulary: &Vocabulary) -> Result<Self, VocabularyError> {
        let registry = KindRegistry::new(&vocabulary.kinds)?;
        let dictionary = Dictionary::new(&vocabulary.globals, &vocabulary.identifiers)?;
        debug!(
            target: "bean_vocabulary",
            "Codec with {} kinds, {} globals, {} identifiers",
            registry.len(),
            vocabulary.globals.len(),
            vocabulary.identifiers.len()
        );
        if registry.len() < NodeKind::ALL.len() {
            debug!(
                target: "bean_vocabulary",
                "Kinds that cannot be encoded: {}",
                NodeKind::ALL
                    .iter()
                    .filter(|kind| registry.code_of(**kind).is_none())
                    .join(", ")
            );
        }
        Ok(Codec {
            registry,
            dictionary,
        })
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn encode(&self, program: &Program) -> Result<Vec<u8>, EncodeError> {
        self.encode_with_statistics(program).map(|(bytes, _)| bytes)
    }

    pub fn encode_with_statistics(&self, program: &Program) -> Result<(Vec<u8>, Statistics), EncodeError> {
        Encoder::new(&self.registry, &self.dictionary).encode(program)
    }

    /// Decode a stream to source text.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        self.decode_tokens(bytes)?.to_source()
    }

    /// Decode a stream, without joining the tokens.
    pub fn decode_tokens(&self, bytes: &[u8]) -> Result<Decoded, DecodeError> {
        Decoder::new(&self.registry, &self.dictionary, bytes).decode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FormatError, SchemaError};
    use bean_shared::ast::*;

    #[test]
    fn test_codec_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Codec>();
    }

    #[test]
    fn test_codec_roundtrip() {
        let _ = env_logger::try_init();
        let codec = Codec::new(&Vocabulary::default()).expect("Could not build codec");
        let program = Program::new(vec![Node::statement(Node::CallExpression {
            callee: Box::new(Node::identifier("alert")),
            arguments: vec![Node::string("hi"), Node::number(1000.)],
        })]);
        let (bytes, statistics) = codec
            .encode_with_statistics(&program)
            .expect("Could not encode");
        assert_eq!(statistics.total_bytes(), bytes.len().into());
        assert_eq!(codec.decode(&bytes), Ok("alert(\"hi\",1e3);".to_string()));
    }

    #[test]
    fn test_vocabulary_validation() {
        let mut vocabulary = Vocabulary::default();
        vocabulary.kinds.push("Identifier".to_string());
        assert_matches!(
            Codec::new(&vocabulary),
            Err(VocabularyError::DuplicateKind(ref name)) if name == "Identifier"
        );

        let mut vocabulary = Vocabulary::default();
        vocabulary.globals.push("one more".to_string());
        assert_matches!(
            Codec::new(&vocabulary),
            Err(VocabularyError::TooManyGlobals(129))
        );

        let vocabulary = Vocabulary {
            kinds: vec!["Identifier".to_string(), "Frobnicate".to_string()],
            ..Vocabulary::default()
        };
        assert_matches!(
            Codec::new(&vocabulary),
            Err(VocabularyError::UnknownKind(_))
        );
    }

    #[test]
    fn test_unregistered_kind() {
        let vocabulary = Vocabulary {
            kinds: vec!["ExpressionStatement".to_string(), "Identifier".to_string()],
            ..Vocabulary::default()
        };
        let codec = Codec::new(&vocabulary).expect("Could not build codec");
        let program = Program::new(vec![Node::statement(Node::ThisExpression)]);
        assert_matches!(
            codec.encode(&program),
            Err(EncodeError::Schema(SchemaError::UnregisteredKind(NodeKind::ThisExpression)))
        );

        // In this vocabulary, code 34 is free.
        assert_matches!(
            codec.decode(&[32, 34]),
            Err(DecodeError::Format(FormatError::BadKind { offset: 1, code: 34 }))
        );
    }
}
