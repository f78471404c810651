//! The lookup tables shared by every encoder and decoder.
//!
//! A vocabulary is three ordered lists. Positions in these lists are part
//! of the format, so a stream may only be decoded with the vocabulary used
//! to encode it.

use crate::VocabularyError;

use bean_shared::NodeKind;

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Strings with a one-byte code. At most 128.
const GLOBALS: &[&str] = &[
    "",
    "0",
    "1",
    "2",
    "3",
    "4",
    "5",
    "6",
    "7",
    "8",
    "9",
    "10",
    "a",
    "b",
    "c",
    "d",
    "e",
    "f",
    "g",
    "h",
    "i",
    "j",
    "k",
    "l",
    "m",
    "n",
    "o",
    "p",
    "q",
    "r",
    "s",
    "t",
    "u",
    "v",
    "w",
    "x",
    "y",
    "z",
    "_",
    "$",
    "async",
    "await",
    "let",
    "of",
    "get",
    "set",
    "static",
    "constructor",
    "new",
    "target",
    "arguments",
    "eval",
    "undefined",
    "NaN",
    "Infinity",
    "Object",
    "Array",
    "String",
    "Number",
    "Boolean",
    "Symbol",
    "Function",
    "Math",
    "JSON",
    "Date",
    "RegExp",
    "Error",
    "TypeError",
    "Promise",
    "Map",
    "Set",
    "console",
    "window",
    "document",
    "self",
    "length",
    "prototype",
    "__proto__",
    "push",
    "pop",
    "shift",
    "slice",
    "splice",
    "concat",
    "join",
    "indexOf",
    "map",
    "filter",
    "reduce",
    "forEach",
    "keys",
    "call",
    "apply",
    "bind",
    "then",
    "catch",
    "resolve",
    "reject",
    "log",
    "toString",
    "valueOf",
    "hasOwnProperty",
    "value",
    "name",
    "key",
    "type",
    "data",
    "index",
    "result",
    "error",
    "options",
    "callback",
    "use strict",
    "object",
    "function",
    "string",
    "number",
    "boolean",
    "symbol",
    " ",
    "\n",
    ",",
    ".",
    "-",
    "/",
    "id",
    "next",
    "done",
];

/// Identifier names with a two-byte code. At most 256.
const IDENTIFIERS: &[&str] = &[
    "abs", "add", "addEventListener", "all", "alert", "append", "appendChild",
    "assign", "atob", "attributes", "body", "btoa", "buffer", "byteLength",
    "cancelAnimationFrame", "ceil", "charAt", "charCodeAt", "children", "classList",
    "className", "clear", "clearInterval", "clearTimeout", "clientX", "clientY",
    "cloneNode", "code", "codePointAt", "config", "contains", "context",
    "create", "createElement", "createTextNode", "ctx", "currentTarget",
    "dataset", "default", "defineProperty", "delete", "detail", "dispatchEvent",
    "element", "endsWith", "entries", "err", "event", "every", "exec", "exp",
    "exports", "fill", "find", "findIndex", "firstChild", "floor", "focus",
    "freeze", "from", "fromCharCode", "getAttribute", "getElementById",
    "getElementsByTagName", "getItem", "getOwnPropertyNames",
    "getPrototypeOf", "getTime", "has", "head", "height", "href", "includes",
    "innerHTML", "input", "isArray", "isNaN", "item", "items", "iterator",
    "lastIndexOf", "left", "list", "localStorage", "location", "match", "max",
    "message", "method", "min", "module", "node", "nodeType", "now", "null",
    "obj", "offset", "onload", "opts", "output", "parent", "parentNode",
    "parse", "parseFloat", "parseInt", "path", "performance", "pow",
    "preventDefault", "process", "props", "querySelector",
    "querySelectorAll", "random", "raw", "readyState", "removeAttribute",
    "removeChild", "removeEventListener", "replace", "require", "requestAnimationFrame",
    "res", "response", "ret", "return", "reverse", "right", "round",
    "search", "setAttribute", "setInterval", "setItem", "setTimeout", "size",
    "some", "sort", "source", "split", "sqrt", "src", "start", "startsWith",
    "state", "status", "stopPropagation", "stringify", "style", "substr",
    "substring", "super", "tagName", "test", "text", "textContent", "this",
    "throw", "time", "toFixed", "toLowerCase", "toUpperCase", "top", "trim",
    "true", "false", "url", "val", "values", "width", "write", "xhr",
];

/// The lookup tables of a `Codec`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Node-kind names. The kind at position `i` has code `i + 32`.
    pub kinds: Vec<String>,

    /// Strings with a one-byte literal code.
    pub globals: Vec<String>,

    /// Strings with a two-byte literal code, looked up after `globals`.
    pub identifiers: Vec<String>,
}
impl Default for Vocabulary {
    fn default() -> Self {
        Vocabulary {
            kinds: NodeKind::ALL
                .iter()
                .map(|kind| kind.name().to_string())
                .collect(),
            globals: GLOBALS.iter().map(|s| s.to_string()).collect(),
            identifiers: IDENTIFIERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
impl Vocabulary {
    /// Load a vocabulary from JSON, e.g.
    /// `{ "kinds": [...], "globals": [...], "identifiers": [...] }`.
    ///
    /// Missing tables default to the built-in ones.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, VocabularyError> {
        let vocabulary = serde_json::from_reader(reader)?;
        Ok(vocabulary)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, VocabularyError> {
        debug!(target: "bean_vocabulary", "Loading vocabulary from {:?}", path.as_ref());
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use tempdir::TempDir;

    #[test]
    fn test_default_sizes() {
        let vocabulary = Vocabulary::default();
        assert_eq!(vocabulary.kinds.len(), 67);
        assert_eq!(vocabulary.kinds[0], "Identifier");
        assert_eq!(vocabulary.kinds[66], "MetaProperty");
        assert!(vocabulary.globals.len() <= 128);
        assert!(vocabulary.identifiers.len() <= 256);
        assert_eq!(vocabulary.globals[0], "");

        // Predefined identifiers are never reached if they are also globals.
        for identifier in &vocabulary.identifiers {
            assert!(
                !vocabulary.globals.contains(identifier),
                "{} is both a global and a predefined identifier",
                identifier
            );
        }
    }

    #[test]
    fn test_from_path() {
        let _ = env_logger::try_init();
        let dir = TempDir::new("test_vocabulary").expect("Could not create temporary directory");
        let path = dir.path().join("vocabulary.json");
        {
            let mut file = std::fs::File::create(&path).expect("Could not create file");
            file.write_all(br#"{ "globals": ["foo", "bar"], "identifiers": [] }"#)
                .expect("Could not write file");
        }

        let vocabulary = Vocabulary::from_path(&path).expect("Could not load vocabulary");
        assert_eq!(vocabulary.globals, vec!["foo", "bar"]);
        assert!(vocabulary.identifiers.is_empty());
        assert_eq!(vocabulary.kinds, Vocabulary::default().kinds);
    }

    #[test]
    fn test_from_reader_errors() {
        assert_matches!(
            Vocabulary::from_reader(&b"{ \"globals\": 3 }"[..]),
            Err(VocabularyError::Json(_))
        );
        assert_matches!(
            Vocabulary::from_path("/this/path/does/not/exist.json"),
            Err(VocabularyError::Io(_))
        );
    }

    #[test]
    fn test_serialize_roundtrip() {
        let vocabulary = Vocabulary::default();
        let json = serde_json::to_string(&vocabulary).expect("Could not serialize");
        let reloaded = Vocabulary::from_reader(json.as_bytes()).expect("Could not reload");
        assert_eq!(vocabulary, reloaded);
    }
}
