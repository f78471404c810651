//! Importing trees produced by an external parser.
//!
//! The parser of record is Babel (formerly babylon), which emits ESTree
//! extended with `StringLiteral`, `NumericLiteral`, `ObjectProperty`, etc.
//! Older babylon node names (`RestProperty`, `SpreadProperty`,
//! `ForAwaitStatement`) are accepted as well.

use crate::ast::*;

use serde_json::Value as JSON;

type Object = serde_json::Map<String, JSON>;

#[derive(Debug)]
pub struct FromJSONError {
    pub expected: String,
    pub got: String,
}
impl FromJSONError {
    fn new(expected: &str, got: &JSON) -> Self {
        FromJSONError {
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }
}
impl std::fmt::Display for FromJSONError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        write!(formatter, "expected {}, got {}", self.expected, self.got)
    }
}
impl std::error::Error for FromJSONError {}

/// A data structure that may be imported from JSON.
pub trait FromJSON: Sized {
    fn import(json: &JSON) -> Result<Self, FromJSONError>;
}
impl FromJSON for bool {
    fn import(value: &JSON) -> Result<Self, FromJSONError> {
        value
            .as_bool()
            .ok_or_else(|| FromJSONError::new("Boolean", value))
    }
}
impl FromJSON for f64 {
    fn import(value: &JSON) -> Result<Self, FromJSONError> {
        value
            .as_f64()
            .ok_or_else(|| FromJSONError::new("Number", value))
    }
}
impl FromJSON for String {
    fn import(value: &JSON) -> Result<Self, FromJSONError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| FromJSONError::new("String", value))
    }
}
impl<T> FromJSON for Vec<T>
where
    T: FromJSON,
{
    fn import(value: &JSON) -> Result<Self, FromJSONError> {
        match *value {
            JSON::Array(ref array) => {
                let mut result = Vec::with_capacity(array.len());
                for item in array {
                    result.push(T::import(item)?);
                }
                Ok(result)
            }
            _ => Err(FromJSONError::new("Array", value)),
        }
    }
}
impl<T> FromJSON for Option<T>
where
    T: FromJSON,
{
    fn import(value: &JSON) -> Result<Self, FromJSONError> {
        if value.is_null() {
            return Ok(None);
        }
        T::import(value).map(Some)
    }
}
impl<T> FromJSON for Box<T>
where
    T: FromJSON,
{
    fn import(value: &JSON) -> Result<Self, FromJSONError> {
        T::import(value).map(Box::new)
    }
}

/// Read a field, treating a missing field as `null`.
fn field<T: FromJSON>(object: &Object, name: &str) -> Result<T, FromJSONError> {
    T::import(object.get(name).unwrap_or(&JSON::Null))
}

/// Read a boolean field, treating a missing or `null` field as `false`.
fn flag(object: &Object, name: &str) -> Result<bool, FromJSONError> {
    Ok(field::<Option<bool>>(object, name)?.unwrap_or(false))
}

/// Read a field holding the source text of a token.
fn token<T>(
    object: &Object,
    name: &str,
    expected: &str,
    from_str: fn(&str) -> Option<T>,
) -> Result<T, FromJSONError> {
    let value = object.get(name).unwrap_or(&JSON::Null);
    value
        .as_str()
        .and_then(from_str)
        .ok_or_else(|| FromJSONError::new(expected, value))
}

/// Read a statement list, turning directives (e.g. `"use strict"`) into
/// the string statements they were in the source.
///
/// Babel gives a directive as its source text between the quotes, escapes
/// included.
fn statements(object: &Object) -> Result<Vec<Node>, FromJSONError> {
    let mut result = vec![];
    if let Some(&JSON::Array(ref directives)) = object.get("directives") {
        for directive in directives {
            let value = directive
                .get("value")
                .and_then(|literal| literal.get("value"))
                .unwrap_or(&JSON::Null);
            let value = cook(&String::import(value)?)
                .ok_or_else(|| FromJSONError::new("Directive with valid escapes", value))?;
            result.push(Node::statement(Node::StringLiteral { value }));
        }
    }
    result.extend(field::<Vec<Node>>(object, "body")?);
    Ok(result)
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

/// The value of a string literal whose text between the quotes is `raw`, or
/// `None` if `raw` contains an invalid escape.
fn cook(raw: &str) -> Option<String> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        let escaped = chars.next()?;
        match escaped {
            'n' => result.push('\n'),
            'r' => result.push('\r'),
            't' => result.push('\t'),
            'b' => result.push('\u{8}'),
            'f' => result.push('\u{c}'),
            'v' => result.push('\u{b}'),
            // Line continuations.
            '\n' | '\u{2028}' | '\u{2029}' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            'x' => result.push(char::from_u32(hex_digits(&mut chars, 2)?)?),
            'u' => result.push(unicode_escape(&mut chars)?),
            // Legacy octal escapes, up to `\377`.
            '0'..='7' => {
                let mut code = escaped.to_digit(8)?;
                while let Some(digit) = chars.peek().and_then(|c| c.to_digit(8)) {
                    if code * 8 + digit > 0xFF {
                        break;
                    }
                    code = code * 8 + digit;
                    chars.next();
                }
                result.push(char::from_u32(code)?);
            }
            other => result.push(other),
        }
    }
    Some(result)
}

fn hex_digits(chars: &mut Chars, count: usize) -> Option<u32> {
    let mut code = 0;
    for _ in 0..count {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    Some(code)
}

/// The character of a `\u` escape, with the `u` already read. A surrogate
/// pair spelled as two escapes gives one character.
fn unicode_escape(chars: &mut Chars) -> Option<char> {
    if chars.peek() == Some(&'{') {
        chars.next();
        let mut code = hex_digits(chars, 1)?;
        loop {
            match chars.next()? {
                '}' => return char::from_u32(code),
                c => code = code * 16 + c.to_digit(16)?,
            }
            if code > 0x10FFFF {
                return None;
            }
        }
    }
    let code = hex_digits(chars, 4)?;
    if (0xD800..0xDC00).contains(&code) {
        let mut ahead = chars.clone();
        if ahead.next() == Some('\\') && ahead.next() == Some('u') {
            if let Some(low) = hex_digits(&mut ahead, 4).filter(|low| (0xDC00..0xE000).contains(low)) {
                *chars = ahead;
                return char::from_u32(0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00));
            }
        }
    }
    char::from_u32(code)
}

impl FromJSON for Program {
    fn import(value: &JSON) -> Result<Self, FromJSONError> {
        let object = value
            .as_object()
            .ok_or_else(|| FromJSONError::new("Program", value))?;
        match object.get("type").and_then(JSON::as_str) {
            Some("File") => field(object, "program"),
            Some("Program") => Ok(Program {
                body: statements(object)?,
            }),
            _ => Err(FromJSONError::new("File or Program", value)),
        }
    }
}

impl FromJSON for Node {
    fn import(value: &JSON) -> Result<Self, FromJSONError> {
        let object = value
            .as_object()
            .ok_or_else(|| FromJSONError::new("Node", value))?;
        let kind = object
            .get("type")
            .and_then(JSON::as_str)
            .ok_or_else(|| FromJSONError::new("Node with a type", value))?;
        trace!(target: "json_conversion", "Importing {}", kind);

        let node = match kind {
            "Identifier" => Node::Identifier {
                name: field(object, "name")?,
            },
            "RegExpLiteral" => Node::RegExpLiteral {
                pattern: field(object, "pattern")?,
                flags: token(object, "flags", "flags among gimuy", RegExpFlags::from_str)?,
            },
            "NullLiteral" => Node::NullLiteral,
            "StringLiteral" => Node::StringLiteral {
                value: field(object, "value")?,
            },
            "BooleanLiteral" => Node::BooleanLiteral {
                value: field(object, "value")?,
            },
            "NumericLiteral" => Node::NumericLiteral {
                value: field(object, "value")?,
                raw: match object.get("extra") {
                    Some(&JSON::Object(ref extra)) => field(extra, "raw")?,
                    _ => None,
                },
            },
            "ExpressionStatement" => Node::ExpressionStatement {
                expression: field(object, "expression")?,
            },
            "BlockStatement" => Node::BlockStatement {
                body: statements(object)?,
            },
            "EmptyStatement" => Node::EmptyStatement,
            "DebuggerStatement" => Node::DebuggerStatement,
            "WithStatement" => Node::WithStatement {
                object: field(object, "object")?,
                body: field(object, "body")?,
            },
            "ReturnStatement" => Node::ReturnStatement {
                argument: field(object, "argument")?,
            },
            "LabeledStatement" => Node::LabeledStatement {
                label: field(object, "label")?,
                body: field(object, "body")?,
            },
            "BreakStatement" => Node::BreakStatement {
                label: field(object, "label")?,
            },
            "ContinueStatement" => Node::ContinueStatement {
                label: field(object, "label")?,
            },
            "IfStatement" => Node::IfStatement {
                test: field(object, "test")?,
                consequent: field(object, "consequent")?,
                alternate: field(object, "alternate")?,
            },
            "SwitchStatement" => Node::SwitchStatement {
                discriminant: field(object, "discriminant")?,
                cases: field(object, "cases")?,
            },
            "SwitchCase" => Node::SwitchCase {
                test: field(object, "test")?,
                consequent: field(object, "consequent")?,
            },
            "ThrowStatement" => Node::ThrowStatement {
                argument: field(object, "argument")?,
            },
            "TryStatement" => Node::TryStatement {
                block: field(object, "block")?,
                handler: field(object, "handler")?,
                finalizer: field(object, "finalizer")?,
            },
            "CatchClause" => Node::CatchClause {
                param: field(object, "param")?,
                body: field(object, "body")?,
            },
            "WhileStatement" => Node::WhileStatement {
                test: field(object, "test")?,
                body: field(object, "body")?,
            },
            "DoWhileStatement" => Node::DoWhileStatement {
                body: field(object, "body")?,
                test: field(object, "test")?,
            },
            "ForStatement" => Node::ForStatement {
                init: field(object, "init")?,
                test: field(object, "test")?,
                update: field(object, "update")?,
                body: field(object, "body")?,
            },
            "ForInStatement" => Node::ForInStatement {
                left: field(object, "left")?,
                right: field(object, "right")?,
                body: field(object, "body")?,
            },
            "ForOfStatement" if flag(object, "await")? => Node::ForAwaitStatement {
                left: field(object, "left")?,
                right: field(object, "right")?,
                body: field(object, "body")?,
            },
            "ForOfStatement" => Node::ForOfStatement {
                left: field(object, "left")?,
                right: field(object, "right")?,
                body: field(object, "body")?,
            },
            "ForAwaitStatement" => Node::ForAwaitStatement {
                left: field(object, "left")?,
                right: field(object, "right")?,
                body: field(object, "body")?,
            },
            "FunctionDeclaration" => Node::FunctionDeclaration {
                id: field(object, "id")?,
                params: field(object, "params")?,
                body: field(object, "body")?,
                generator: flag(object, "generator")?,
                is_async: flag(object, "async")?,
            },
            "VariableDeclaration" => Node::VariableDeclaration {
                kind: token(object, "kind", "var, let or const", VariableKind::from_str)?,
                declarations: field(object, "declarations")?,
            },
            "VariableDeclarator" => Node::VariableDeclarator {
                id: field(object, "id")?,
                init: field(object, "init")?,
            },
            "Super" => Node::Super,
            "ThisExpression" => Node::ThisExpression,
            "ArrowFunctionExpression" => Node::ArrowFunctionExpression {
                params: field(object, "params")?,
                body: field(object, "body")?,
                is_async: flag(object, "async")?,
            },
            "YieldExpression" => Node::YieldExpression {
                argument: field(object, "argument")?,
                delegate: flag(object, "delegate")?,
            },
            "AwaitExpression" => Node::AwaitExpression {
                argument: field(object, "argument")?,
            },
            "ArrayExpression" => Node::ArrayExpression {
                elements: field(object, "elements")?,
            },
            "ObjectExpression" => Node::ObjectExpression {
                properties: field(object, "properties")?,
            },
            "ObjectProperty" => Node::ObjectProperty {
                key: field(object, "key")?,
                value: field(object, "value")?,
                computed: flag(object, "computed")?,
                shorthand: flag(object, "shorthand")?,
            },
            "ObjectMethod" => Node::ObjectMethod {
                kind: token(object, "kind", "get, set or method", MethodKind::from_str)?,
                key: field(object, "key")?,
                params: field(object, "params")?,
                body: field(object, "body")?,
                computed: flag(object, "computed")?,
                generator: flag(object, "generator")?,
                is_async: flag(object, "async")?,
            },
            "RestProperty" => Node::RestProperty {
                argument: field(object, "argument")?,
            },
            "SpreadProperty" => Node::SpreadProperty {
                argument: field(object, "argument")?,
            },
            "FunctionExpression" => Node::FunctionExpression {
                id: field(object, "id")?,
                params: field(object, "params")?,
                body: field(object, "body")?,
                generator: flag(object, "generator")?,
                is_async: flag(object, "async")?,
            },
            "UnaryExpression" => Node::UnaryExpression {
                operator: token(object, "operator", "unary operator", UnaryOperator::from_str)?,
                prefix: flag(object, "prefix")?,
                argument: field(object, "argument")?,
            },
            "UpdateExpression" => Node::UpdateExpression {
                operator: token(object, "operator", "update operator", UpdateOperator::from_str)?,
                prefix: flag(object, "prefix")?,
                argument: field(object, "argument")?,
            },
            "BinaryExpression" => Node::BinaryExpression {
                operator: token(object, "operator", "binary operator", BinaryOperator::from_str)?,
                left: field(object, "left")?,
                right: field(object, "right")?,
            },
            "AssignmentExpression" => Node::AssignmentExpression {
                operator: token(
                    object,
                    "operator",
                    "assignment operator",
                    AssignmentOperator::from_str,
                )?,
                left: field(object, "left")?,
                right: field(object, "right")?,
            },
            "LogicalExpression" => Node::LogicalExpression {
                operator: token(object, "operator", "logical operator", LogicalOperator::from_str)?,
                left: field(object, "left")?,
                right: field(object, "right")?,
            },
            "SpreadElement" => Node::SpreadElement {
                argument: field(object, "argument")?,
            },
            "MemberExpression" => Node::MemberExpression {
                object: field(object, "object")?,
                property: field(object, "property")?,
                computed: flag(object, "computed")?,
            },
            "BindExpression" => Node::BindExpression {
                object: field(object, "object")?,
                callee: field(object, "callee")?,
            },
            "ConditionalExpression" => Node::ConditionalExpression {
                test: field(object, "test")?,
                consequent: field(object, "consequent")?,
                alternate: field(object, "alternate")?,
            },
            "CallExpression" => Node::CallExpression {
                callee: field(object, "callee")?,
                arguments: field(object, "arguments")?,
            },
            "NewExpression" => Node::NewExpression {
                callee: field(object, "callee")?,
                arguments: field(object, "arguments")?,
            },
            "SequenceExpression" => Node::SequenceExpression {
                expressions: field(object, "expressions")?,
            },
            "TemplateLiteral" => Node::TemplateLiteral {
                quasis: field(object, "quasis")?,
                expressions: field(object, "expressions")?,
            },
            "TaggedTemplateExpression" => Node::TaggedTemplateExpression {
                tag: field(object, "tag")?,
                quasi: field(object, "quasi")?,
            },
            "TemplateElement" => {
                let value = object
                    .get("value")
                    .and_then(JSON::as_object)
                    .ok_or_else(|| FromJSONError::new("TemplateElement value", value))?;
                // `cooked` is `null` for an invalid escape in a tagged
                // template. Such an element keeps its raw text as its value,
                // so it reads back as an escaped backslash.
                let cooked = match field::<Option<String>>(value, "cooked")? {
                    Some(cooked) => cooked,
                    None => field(value, "raw")?,
                };
                Node::TemplateElement { value: cooked }
            }
            "ObjectPattern" => Node::ObjectPattern {
                properties: field(object, "properties")?,
            },
            "ArrayPattern" => Node::ArrayPattern {
                elements: field(object, "elements")?,
            },
            "RestElement" => Node::RestElement {
                argument: field(object, "argument")?,
            },
            "AssignmentPattern" => Node::AssignmentPattern {
                left: field(object, "left")?,
                right: field(object, "right")?,
            },
            "ClassBody" => Node::ClassBody {
                body: field(object, "body")?,
            },
            "ClassMethod" => Node::ClassMethod {
                kind: token(
                    object,
                    "kind",
                    "get, set, method or constructor",
                    MethodKind::from_str,
                )?,
                key: field(object, "key")?,
                params: field(object, "params")?,
                body: field(object, "body")?,
                computed: flag(object, "computed")?,
                is_static: flag(object, "static")?,
                generator: flag(object, "generator")?,
                is_async: flag(object, "async")?,
            },
            "ClassProperty" => Node::ClassProperty {
                key: field(object, "key")?,
                value: field(object, "value")?,
                computed: flag(object, "computed")?,
                is_static: flag(object, "static")?,
            },
            "ClassDeclaration" => Node::ClassDeclaration {
                id: field(object, "id")?,
                super_class: field(object, "superClass")?,
                body: field(object, "body")?,
            },
            "ClassExpression" => Node::ClassExpression {
                id: field(object, "id")?,
                super_class: field(object, "superClass")?,
                body: field(object, "body")?,
            },
            "MetaProperty" => Node::MetaProperty {
                meta: field(object, "meta")?,
                property: field(object, "property")?,
            },
            // Only produced with `createParenthesizedExpressions`.
            "ParenthesizedExpression" => return field(object, "expression"),
            _ => {
                return Err(FromJSONError {
                    expected: "a supported node type".to_string(),
                    got: kind.to_string(),
                })
            }
        };
        Ok(node)
    }
}
