//! Decoding a stream back to source text.
//!
//! Decoding happens in two phases. The first phase walks the node region
//! and produces tokens. References to program-specific literals cannot be
//! resolved yet, since the literals are stored after the last node, so they
//! are kept as `Token::Pooled`. The second phase reads the literal region.
//! `Decoded::to_source` then joins everything.
//!
//! The text produced is not the input text: whitespace and comments
//! are lost, and every compound expression is parenthesized.

use crate::bytes::literal::read_literals;
use crate::bytes::{
    flag, Position, Sentinel, CONTINUATION, FLAGS_PRESENT, KIND_MASK, LIST_END, OPERATOR_MASK,
    PREFIX,
};
use crate::kind::KindRegistry;
use crate::literals::{Dictionary, LiteralCode};
use crate::{DecodeError, FormatError, MAX_NESTING};

use bean_shared::ast::*;

use std::borrow::Cow;

/// How a literal is written in source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Escape {
    /// Identifiers and numbers.
    Verbatim,

    /// The contents of a double-quoted string.
    String,

    /// The contents of a template element.
    Template,

    /// The pattern of a regular expression.
    RegExp,
}
impl Escape {
    pub fn apply(self, literal: &str) -> Cow<str> {
        let needs_escape = |c: char| match self {
            Escape::Verbatim => false,
            Escape::String => c == '"' || c == '\\' || c == '\n' || c == '\r',
            Escape::Template => c == '`' || c == '\\' || c == '$' || c == '\n' || c == '\r',
            Escape::RegExp => c == '/',
        };
        if !literal.chars().any(needs_escape) {
            return Cow::Borrowed(literal);
        }
        let mut result = String::with_capacity(literal.len() + 8);
        let mut chars = literal.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\n' => result.push_str("\\n"),
                '\r' => result.push_str("\\r"),
                '$' if self == Escape::Template && chars.peek() == Some(&'{') => {
                    result.push_str("\\$")
                }
                c if c != '$' && needs_escape(c) => {
                    result.push('\\');
                    result.push(c);
                }
                c => result.push(c),
            }
        }
        Cow::Owned(result)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// Punctuation, keywords and literals of the vocabulary.
    Text(Cow<'a, str>),

    /// A program-specific literal, resolved once the literal region is read.
    Pooled { index: usize, escape: Escape },
}

/// The result of decoding a stream.
#[derive(Clone, Debug)]
pub struct Decoded<'a> {
    pub tokens: Vec<Token<'a>>,
    pub literals: Vec<String>,
}
impl<'a> Decoded<'a> {
    /// Join the tokens into source text.
    pub fn to_source(&self) -> Result<String, DecodeError> {
        let mut source = String::new();
        for token in &self.tokens {
            match *token {
                Token::Text(ref text) => source.push_str(text),
                Token::Pooled { index, escape } => {
                    let literal = self
                        .literals
                        .get(index)
                        .ok_or(FormatError::BadLiteralIndex(index))?;
                    source.push_str(&escape.apply(literal));
                }
            }
        }
        Ok(source)
    }
}

/// A decoder for a single stream.
pub struct Decoder<'a, 'b> {
    registry: &'a KindRegistry,
    dictionary: &'a Dictionary,
    bytes: &'b [u8],
    offset: usize,
    depth: usize,
    tokens: Vec<Token<'a>>,
}
impl<'a, 'b> Decoder<'a, 'b> {
    pub fn new(registry: &'a KindRegistry, dictionary: &'a Dictionary, bytes: &'b [u8]) -> Self {
        Decoder {
            registry,
            dictionary,
            bytes,
            offset: 0,
            depth: 0,
            tokens: Vec::new(),
        }
    }

    /// Decode the stream, consuming the decoder.
    pub fn decode(mut self) -> Result<Decoded<'a>, DecodeError> {
        self.list(None)?;
        debug!(target: "bean_decode", "Node region: {} bytes, {} tokens", self.offset, self.tokens.len());
        let literals = read_literals(&self.bytes[self.offset..], self.offset)?;
        Ok(Decoded {
            tokens: self.tokens,
            literals,
        })
    }

    // Reading bytes.

    fn peek_byte(&self) -> Result<u8, DecodeError> {
        self.bytes.get(self.offset).cloned().ok_or_else(|| {
            FormatError::Truncated {
                offset: self.offset,
            }
            .into()
        })
    }

    fn next_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = self.peek_byte()?;
        self.offset += 1;
        Ok(byte)
    }

    /// Whether the next item closes the current node.
    fn next_is_last(&self) -> Result<bool, DecodeError> {
        Ok(Position::of_byte(self.peek_byte()?) == Position::Last)
    }

    /// The kind of the next node, if the next byte is a tag byte.
    fn peek_kind(&self) -> Result<Option<NodeKind>, DecodeError> {
        Ok(self.registry.kind_of(self.peek_byte()?))
    }

    /// Consume a sentinel, if the next byte is one.
    fn sentinel(&mut self) -> Result<Option<Position>, DecodeError> {
        let byte = self.peek_byte()?;
        match Sentinel::from_byte(byte) {
            Some(_) => {
                self.offset += 1;
                Ok(Some(Position::of_byte(byte)))
            }
            None => Ok(None),
        }
    }

    fn flags(&mut self) -> Result<u8, DecodeError> {
        let offset = self.offset;
        let byte = self.next_byte()?;
        if byte & FLAGS_PRESENT == 0 {
            return Err(FormatError::BadFlags { offset, byte }.into());
        }
        Ok(byte)
    }

    /// Read an operator byte, returning the operator and its prefix bit.
    fn operator<T>(&mut self, from_code: fn(u8) -> Option<T>) -> Result<(T, bool), DecodeError> {
        let offset = self.offset;
        let byte = self.flags()?;
        let code = byte & OPERATOR_MASK;
        let operator = from_code(code).ok_or(FormatError::BadOperator { offset, code })?;
        Ok((operator, byte & PREFIX != 0))
    }

    // Producing tokens.

    fn text(&mut self, text: &'static str) {
        self.tokens.push(Token::Text(Cow::Borrowed(text)));
    }

    fn literal(&mut self, escape: Escape) -> Result<(), DecodeError> {
        let first = self.next_byte()?;
        let index = if LiteralCode::has_index_byte(first) {
            self.next_byte()?
        } else {
            0
        };
        let dictionary = self.dictionary;
        let token = match LiteralCode::from_bytes(first, index) {
            LiteralCode::Global(index) => {
                let literal = dictionary
                    .global(index)
                    .ok_or(FormatError::BadGlobalIndex(index))?;
                Token::Text(escape.apply(literal))
            }
            LiteralCode::Predefined(index) => {
                let literal = dictionary
                    .identifier(index)
                    .ok_or(FormatError::BadIdentifierIndex(index))?;
                Token::Text(escape.apply(literal))
            }
            LiteralCode::Pooled(index) => Token::Pooled {
                index: index as usize,
                escape,
            },
        };
        self.tokens.push(token);
        Ok(())
    }

    // Walking the tree.

    /// Decode a node, returning its position.
    fn node(&mut self, parent: Option<NodeKind>) -> Result<Position, DecodeError> {
        let offset = self.offset;
        let tag = self.next_byte()?;
        if tag & KIND_MASK == 0 {
            return Err(FormatError::MissingNode { offset }.into());
        }
        let kind = self.registry.kind_of(tag).ok_or(FormatError::BadKind {
            offset,
            code: tag & KIND_MASK,
        })?;
        if self.depth == MAX_NESTING {
            return Err(FormatError::TooDeep { offset }.into());
        }
        trace!(target: "bean_decode", "{} at {} in {:?}", kind, offset, parent);
        self.depth += 1;
        self.dispatch(kind)?;
        self.depth -= 1;
        Ok(Position::of_byte(tag))
    }

    /// Decode a node or consume a sentinel standing in for it.
    fn slot(&mut self, parent: NodeKind) -> Result<Position, DecodeError> {
        match self.sentinel()? {
            Some(position) => Ok(position),
            None => self.node(Some(parent)),
        }
    }

    /// Decode a list ending with its last item, or `LIST_END` if empty.
    fn list(&mut self, separator: Option<&'static str>) -> Result<(), DecodeError> {
        if self.peek_byte()? == LIST_END {
            self.offset += 1;
            return Ok(());
        }
        self.items(None, separator)
    }

    /// Decode items up to and including the last one.
    fn items(&mut self, parent: Option<NodeKind>, separator: Option<&'static str>) -> Result<(), DecodeError> {
        while self.node(parent)? == Position::More {
            if let Some(separator) = separator {
                self.text(separator);
            }
        }
        Ok(())
    }

    /// Decode parentheses around parameters, i.e. all the items followed by
    /// more slots.
    fn params(&mut self, parent: NodeKind) -> Result<(), DecodeError> {
        self.text("(");
        let mut first = true;
        while !self.next_is_last()? {
            if !first {
                self.text(",");
            }
            first = false;
            self.node(Some(parent))?;
        }
        self.text(")");
        Ok(())
    }

    /// Decode array elements, which may include holes.
    fn elements(&mut self, parent: NodeKind) -> Result<(), DecodeError> {
        self.text("[");
        let mut first = true;
        let mut trailing_hole = false;
        loop {
            let offset = self.offset;
            let byte = self.peek_byte()?;
            if byte == LIST_END {
                self.offset += 1;
                break;
            }
            if !first {
                self.text(",");
            }
            first = false;
            trailing_hole = byte == CONTINUATION;
            if trailing_hole {
                self.offset += 1;
                continue;
            }
            if self.node(Some(parent))? == Position::Last {
                return Err(FormatError::ExpectedEnd { offset }.into());
            }
        }
        if trailing_hole {
            self.text(",");
        }
        self.text("]");
        Ok(())
    }

    /// Decode the head of a `for` loop, where declarations have no `;`.
    fn head(&mut self, parent: NodeKind) -> Result<Position, DecodeError> {
        let declaration = self.peek_kind()? == Some(NodeKind::VariableDeclaration);
        let position = self.node(Some(parent))?;
        if declaration {
            self.tokens.pop();
        }
        Ok(position)
    }

    /// Decode a node, in parentheses if `wrap` holds for its kind.
    fn wrapped_if(&mut self, parent: NodeKind, wrap: fn(NodeKind) -> bool) -> Result<Position, DecodeError> {
        let wrapped = self.peek_kind()?.map(wrap).unwrap_or(false);
        if wrapped {
            self.text("(");
        }
        let position = self.node(Some(parent))?;
        if wrapped {
            self.text(")");
        }
        Ok(position)
    }

    /// Decode an optional argument, preceded by `prefix` if present.
    fn argument(&mut self, parent: NodeKind, prefix: &'static str) -> Result<(), DecodeError> {
        if self.sentinel()?.is_none() {
            self.text(prefix);
            self.node(Some(parent))?;
        }
        Ok(())
    }

    /// Decode a property key, in brackets if computed.
    fn key(&mut self, parent: NodeKind, computed: bool) -> Result<Position, DecodeError> {
        if computed {
            self.text("[");
        }
        let position = self.node(Some(parent))?;
        if computed {
            self.text("]");
        }
        Ok(position)
    }

    /// Decode the flags, key, parameters and body of a method.
    #[inline(never)]
    fn method(&mut self, parent: NodeKind) -> Result<(), DecodeError> {
        let offset = self.offset;
        let flags = self.flags()?;
        let method_kind = MethodKind::from_code((flags >> 5) & 3)
            .ok_or(FormatError::BadFlags { offset, byte: flags })?;
        if flag(flags, 4) {
            self.text("static ");
        }
        match method_kind {
            MethodKind::Get => self.text("get "),
            MethodKind::Set => self.text("set "),
            MethodKind::Method | MethodKind::Constructor => {}
        }
        if flag(flags, 0) {
            self.text("async ");
        }
        if flag(flags, 1) {
            self.text("*");
        }
        self.key(parent, flag(flags, 2))?;
        self.params(parent)?;
        self.node(Some(parent))?;
        Ok(())
    }

    /// Decode the flags, name, parameters and body of a function.
    #[inline(never)]
    fn function(&mut self, parent: NodeKind) -> Result<(), DecodeError> {
        let flags = self.flags()?;
        if flag(flags, 0) {
            self.text("async ");
        }
        self.text("function");
        if flag(flags, 1) {
            self.text("*");
        }
        if parent == NodeKind::FunctionDeclaration {
            self.text(" ");
            self.node(Some(parent))?;
        } else {
            self.argument(parent, " ")?;
        }
        self.params(parent)?;
        self.node(Some(parent))?;
        Ok(())
    }

    /// Decode the name, superclass and body of a class.
    #[inline(never)]
    fn class(&mut self, parent: NodeKind) -> Result<(), DecodeError> {
        self.text("class");
        if parent == NodeKind::ClassDeclaration {
            self.text(" ");
            self.node(Some(parent))?;
        } else {
            self.argument(parent, " ")?;
        }
        if !self.next_is_last()? {
            self.text(" extends ");
            self.node(Some(parent))?;
        }
        self.node(Some(parent))?;
        Ok(())
    }

    /// Whether the statement starting at token `start` must be wrapped in
    /// parentheses so as not to read as a declaration or a block.
    fn needs_parentheses(&self, start: usize) -> bool {
        let first = self.tokens[start..].iter().find(|token| match **token {
            Token::Text(ref text) => !text.is_empty(),
            Token::Pooled { .. } => true,
        });
        match first {
            Some(&Token::Text(ref text)) => match text.trim_end() {
                "{" | "function" | "class" | "async" | "let" => true,
                _ => false,
            },
            _ => false,
        }
    }

    // A level of nesting costs the frames of `node`, `dispatch` and at most
    // two helpers below. Arms of `dispatch` stay a single call.

    #[inline(never)]
    fn dispatch(&mut self, kind: NodeKind) -> Result<(), DecodeError> {
        match kind {
            NodeKind::Identifier | NodeKind::NumericLiteral => self.literal(Escape::Verbatim),
            NodeKind::RegExpLiteral => self.regexp(),
            NodeKind::NullLiteral => self.keyword("null"),
            NodeKind::StringLiteral => self.string(),
            NodeKind::BooleanLiteral => self.boolean(),
            NodeKind::ExpressionStatement => self.expression_statement(),
            NodeKind::BlockStatement | NodeKind::ClassBody => self.delimited("{", None, "}"),
            NodeKind::EmptyStatement => self.keyword(";"),
            NodeKind::DebuggerStatement => self.keyword("debugger;"),
            NodeKind::WithStatement => self.infix(kind, "with(", ")", ""),
            NodeKind::ReturnStatement => self.jump(kind, "return"),
            NodeKind::LabeledStatement => self.infix(kind, "", ":", ""),
            NodeKind::BreakStatement => self.jump(kind, "break"),
            NodeKind::ContinueStatement => self.jump(kind, "continue"),
            NodeKind::IfStatement => self.if_statement(),
            NodeKind::SwitchStatement => self.switch_statement(),
            NodeKind::SwitchCase => self.switch_case(),
            NodeKind::ThrowStatement => self.enclosed(kind, "throw ", ";"),
            NodeKind::TryStatement => self.try_statement(),
            NodeKind::CatchClause => self.catch_clause(),
            NodeKind::WhileStatement => self.infix(kind, "while(", ")", ""),
            NodeKind::DoWhileStatement => self.infix(kind, "do ", "while(", ");"),
            NodeKind::ForStatement => self.for_statement(),
            NodeKind::ForInStatement | NodeKind::ForOfStatement | NodeKind::ForAwaitStatement => {
                self.for_in_statement(kind)
            }
            NodeKind::FunctionDeclaration | NodeKind::FunctionExpression => self.function(kind),
            NodeKind::VariableDeclaration => self.variable_declaration(),
            NodeKind::VariableDeclarator => self.variable_declarator(),
            NodeKind::Super => self.keyword("super"),
            NodeKind::ThisExpression => self.keyword("this"),
            NodeKind::ArrowFunctionExpression => self.arrow(),
            NodeKind::YieldExpression => self.yield_expression(),
            NodeKind::AwaitExpression => self.enclosed(kind, "(await ", ")"),
            NodeKind::ArrayExpression | NodeKind::ArrayPattern => self.elements(kind),
            NodeKind::ObjectExpression | NodeKind::ObjectPattern => {
                self.delimited("{", Some(","), "}")
            }
            NodeKind::ObjectProperty => self.object_property(),
            NodeKind::ObjectMethod | NodeKind::ClassMethod => self.method(kind),
            NodeKind::RestProperty
            | NodeKind::SpreadProperty
            | NodeKind::SpreadElement
            | NodeKind::RestElement => self.enclosed(kind, "...", ""),
            NodeKind::UnaryExpression => self.unary(),
            NodeKind::UpdateExpression => self.update(),
            NodeKind::BinaryExpression => self.binary(),
            NodeKind::AssignmentExpression => self.assignment(),
            NodeKind::LogicalExpression => self.logical(),
            NodeKind::MemberExpression => self.member(),
            NodeKind::BindExpression => self.bind(),
            NodeKind::ConditionalExpression => self.conditional(),
            NodeKind::CallExpression | NodeKind::NewExpression => self.call(kind),
            NodeKind::SequenceExpression => self.delimited("(", Some(","), ")"),
            NodeKind::TemplateLiteral => self.template(),
            NodeKind::TaggedTemplateExpression => self.infix(kind, "", "", ""),
            NodeKind::TemplateElement => self.literal(Escape::Template),
            NodeKind::AssignmentPattern => self.infix(kind, "", "=", ""),
            NodeKind::ClassProperty => self.class_property(),
            NodeKind::ClassDeclaration | NodeKind::ClassExpression => self.class(kind),
            NodeKind::MetaProperty => self.infix(kind, "", ".", ""),
        }
    }

    // Shapes shared by several kinds.

    fn affix(&mut self, text: &'static str) {
        if !text.is_empty() {
            self.text(text);
        }
    }

    fn keyword(&mut self, text: &'static str) -> Result<(), DecodeError> {
        self.text(text);
        Ok(())
    }

    /// `open`, a list, `close`.
    #[inline(never)]
    fn delimited(
        &mut self,
        open: &'static str,
        separator: Option<&'static str>,
        close: &'static str,
    ) -> Result<(), DecodeError> {
        self.text(open);
        self.list(separator)?;
        self.text(close);
        Ok(())
    }

    /// `open`, a node, `close`.
    #[inline(never)]
    fn enclosed(&mut self, kind: NodeKind, open: &'static str, close: &'static str) -> Result<(), DecodeError> {
        self.text(open);
        self.node(Some(kind))?;
        self.affix(close);
        Ok(())
    }

    /// `open`, a node, `middle`, a node, `close`.
    #[inline(never)]
    fn infix(
        &mut self,
        kind: NodeKind,
        open: &'static str,
        middle: &'static str,
        close: &'static str,
    ) -> Result<(), DecodeError> {
        self.affix(open);
        self.node(Some(kind))?;
        self.affix(middle);
        self.node(Some(kind))?;
        self.affix(close);
        Ok(())
    }

    /// `return`, `break` or `continue`, with an optional argument.
    #[inline(never)]
    fn jump(&mut self, kind: NodeKind, keyword: &'static str) -> Result<(), DecodeError> {
        self.text(keyword);
        self.argument(kind, " ")?;
        self.text(";");
        Ok(())
    }

    // Literals.

    fn regexp(&mut self) -> Result<(), DecodeError> {
        let offset = self.offset;
        let flags = self.flags()?;
        if flags & !(FLAGS_PRESENT | 0x1F) != 0 {
            return Err(FormatError::BadFlags { offset, byte: flags }.into());
        }
        self.text("/");
        self.literal(Escape::RegExp)?;
        self.text("/");
        for &(bit, text) in &[(0, "g"), (1, "i"), (2, "m"), (3, "u"), (4, "y")] {
            if flag(flags, bit) {
                self.text(text);
            }
        }
        Ok(())
    }

    fn string(&mut self) -> Result<(), DecodeError> {
        self.text("\"");
        self.literal(Escape::String)?;
        self.text("\"");
        Ok(())
    }

    fn boolean(&mut self) -> Result<(), DecodeError> {
        let offset = self.offset;
        match self.next_byte()? {
            0 => self.text("false"),
            1 => self.text("true"),
            byte => return Err(FormatError::BadFlags { offset, byte }.into()),
        }
        Ok(())
    }

    // Statements.

    #[inline(never)]
    fn expression_statement(&mut self) -> Result<(), DecodeError> {
        let start = self.tokens.len();
        self.text("");
        self.node(Some(NodeKind::ExpressionStatement))?;
        if self.needs_parentheses(start) {
            self.tokens[start] = Token::Text(Cow::Borrowed("("));
            self.text(")");
        }
        self.text(";");
        Ok(())
    }

    #[inline(never)]
    fn if_statement(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::IfStatement);
        self.text("if(");
        self.node(parent)?;
        self.text(")");
        let has_alternate = !self.next_is_last()?;
        // A nested `if` without `else` would otherwise capture ours.
        let braces = has_alternate
            && match self.peek_kind()? {
                Some(NodeKind::IfStatement)
                | Some(NodeKind::WhileStatement)
                | Some(NodeKind::ForStatement)
                | Some(NodeKind::ForInStatement)
                | Some(NodeKind::ForOfStatement)
                | Some(NodeKind::ForAwaitStatement)
                | Some(NodeKind::WithStatement)
                | Some(NodeKind::LabeledStatement) => true,
                _ => false,
            };
        if braces {
            self.text("{");
        }
        self.node(parent)?;
        if braces {
            self.text("}");
        }
        if has_alternate {
            self.text("else ");
            self.node(parent)?;
        }
        Ok(())
    }

    #[inline(never)]
    fn switch_statement(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::SwitchStatement);
        self.text("switch(");
        let position = self.node(parent)?;
        self.text("){");
        if position == Position::More {
            self.items(parent, None)?;
        }
        self.text("}");
        Ok(())
    }

    #[inline(never)]
    fn switch_case(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::SwitchCase);
        let position = match self.sentinel()? {
            Some(position) => {
                self.text("default:");
                position
            }
            None => {
                self.text("case ");
                let position = self.node(parent)?;
                self.text(":");
                position
            }
        };
        if position == Position::More {
            self.items(parent, None)?;
        }
        Ok(())
    }

    #[inline(never)]
    fn try_statement(&mut self) -> Result<(), DecodeError> {
        let kind = NodeKind::TryStatement;
        self.text("try");
        self.node(Some(kind))?;
        if self.slot(kind)? == Position::More {
            self.text("finally");
            self.node(Some(kind))?;
        }
        Ok(())
    }

    #[inline(never)]
    fn catch_clause(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::CatchClause);
        self.text("catch");
        if self.sentinel()?.is_none() {
            self.text("(");
            self.node(parent)?;
            self.text(")");
        }
        self.node(parent)?;
        Ok(())
    }

    #[inline(never)]
    fn for_statement(&mut self) -> Result<(), DecodeError> {
        let kind = NodeKind::ForStatement;
        self.text("for(");
        if self.sentinel()?.is_none() {
            self.head(kind)?;
        }
        self.text(";");
        self.slot(kind)?;
        self.text(";");
        self.slot(kind)?;
        self.text(")");
        self.node(Some(kind))?;
        Ok(())
    }

    #[inline(never)]
    fn for_in_statement(&mut self, kind: NodeKind) -> Result<(), DecodeError> {
        self.text(if kind == NodeKind::ForAwaitStatement {
            "for await("
        } else {
            "for("
        });
        self.head(kind)?;
        self.text(if kind == NodeKind::ForInStatement {
            " in "
        } else {
            " of "
        });
        self.node(Some(kind))?;
        self.text(")");
        self.node(Some(kind))?;
        Ok(())
    }

    #[inline(never)]
    fn variable_declaration(&mut self) -> Result<(), DecodeError> {
        let offset = self.offset;
        let flags = self.flags()?;
        let declaration_kind = match flags & !FLAGS_PRESENT {
            0b001 => VariableKind::Var,
            0b010 => VariableKind::Let,
            0b100 => VariableKind::Const,
            _ => return Err(FormatError::BadFlags { offset, byte: flags }.into()),
        };
        self.text(declaration_kind.as_str());
        self.text(" ");
        self.list(Some(","))?;
        self.text(";");
        Ok(())
    }

    #[inline(never)]
    fn variable_declarator(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::VariableDeclarator);
        if self.node(parent)? == Position::More {
            self.text("=");
            self.node(parent)?;
        }
        Ok(())
    }

    // Expressions.

    #[inline(never)]
    fn arrow(&mut self) -> Result<(), DecodeError> {
        let kind = NodeKind::ArrowFunctionExpression;
        let flags = self.flags()?;
        self.text("(");
        if flag(flags, 0) {
            self.text("async");
        }
        self.params(kind)?;
        self.text("=>");
        self.wrapped_if(kind, |kind| kind == NodeKind::ObjectExpression)?;
        self.text(")");
        Ok(())
    }

    #[inline(never)]
    fn yield_expression(&mut self) -> Result<(), DecodeError> {
        let offset = self.offset;
        let byte = self.next_byte()?;
        if byte & !(CONTINUATION | 1) != 0 {
            return Err(FormatError::BadFlags { offset, byte }.into());
        }
        self.text("(yield");
        if flag(byte, 0) {
            self.text("*");
        }
        if byte & CONTINUATION != 0 {
            self.text(" ");
            self.node(Some(NodeKind::YieldExpression))?;
        }
        self.text(")");
        Ok(())
    }

    #[inline(never)]
    fn object_property(&mut self) -> Result<(), DecodeError> {
        let kind = NodeKind::ObjectProperty;
        let flags = self.flags()?;
        if !flag(flags, 3) {
            self.key(kind, flag(flags, 2))?;
            self.text(":");
        }
        self.node(Some(kind))?;
        Ok(())
    }

    #[inline(never)]
    fn unary(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::UnaryExpression);
        let (operator, prefix) = self.operator(UnaryOperator::from_code)?;
        let word = operator.as_str().chars().all(char::is_alphabetic);
        self.text("(");
        if prefix {
            self.text(operator.as_str());
            if word {
                self.text(" ");
            }
            self.node(parent)?;
        } else {
            self.node(parent)?;
            if word {
                self.text(" ");
            }
            self.text(operator.as_str());
        }
        self.text(")");
        Ok(())
    }

    #[inline(never)]
    fn update(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::UpdateExpression);
        let (operator, prefix) = self.operator(UpdateOperator::from_code)?;
        self.text("(");
        if prefix {
            self.text(operator.as_str());
            self.node(parent)?;
        } else {
            self.node(parent)?;
            self.text(operator.as_str());
        }
        self.text(")");
        Ok(())
    }

    #[inline(never)]
    fn binary(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::BinaryExpression);
        self.text("(");
        self.node(parent)?;
        let (operator, _) = self.operator(BinaryOperator::from_code)?;
        // `/` is spaced so that it never reads as a comment.
        let spaced = match operator {
            BinaryOperator::In | BinaryOperator::Instanceof | BinaryOperator::Div => true,
            _ => false,
        };
        if spaced {
            self.text(" ");
        }
        self.text(operator.as_str());
        if spaced {
            self.text(" ");
        }
        self.node(parent)?;
        self.text(")");
        Ok(())
    }

    #[inline(never)]
    fn assignment(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::AssignmentExpression);
        self.text("(");
        self.node(parent)?;
        let (operator, _) = self.operator(AssignmentOperator::from_code)?;
        self.text(operator.as_str());
        self.node(parent)?;
        self.text(")");
        Ok(())
    }

    #[inline(never)]
    fn logical(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::LogicalExpression);
        self.text("(");
        self.node(parent)?;
        let (operator, _) = self.operator(LogicalOperator::from_code)?;
        self.text(operator.as_str());
        self.node(parent)?;
        self.text(")");
        Ok(())
    }

    #[inline(never)]
    fn member(&mut self) -> Result<(), DecodeError> {
        let kind = NodeKind::MemberExpression;
        let flags = self.flags()?;
        self.wrapped_if(kind, |kind| kind == NodeKind::NumericLiteral)?;
        if flag(flags, 2) {
            self.text("[");
            self.node(Some(kind))?;
            self.text("]");
        } else {
            self.text(".");
            self.node(Some(kind))?;
        }
        Ok(())
    }

    #[inline(never)]
    fn bind(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::BindExpression);
        if !self.next_is_last()? {
            self.node(parent)?;
        }
        self.text("::");
        self.node(parent)?;
        Ok(())
    }

    #[inline(never)]
    fn conditional(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::ConditionalExpression);
        self.text("(");
        self.node(parent)?;
        self.text("?");
        self.node(parent)?;
        self.text(":");
        self.node(parent)?;
        self.text(")");
        Ok(())
    }

    #[inline(never)]
    fn call(&mut self, kind: NodeKind) -> Result<(), DecodeError> {
        let position = if kind == NodeKind::NewExpression {
            self.text("new ");
            self.wrapped_if(kind, |kind| match kind {
                NodeKind::Identifier | NodeKind::ThisExpression | NodeKind::Super => false,
                _ => true,
            })?
        } else {
            self.node(Some(kind))?
        };
        self.text("(");
        if position == Position::More {
            self.items(Some(kind), Some(","))?;
        }
        self.text(")");
        Ok(())
    }

    #[inline(never)]
    fn template(&mut self) -> Result<(), DecodeError> {
        let parent = Some(NodeKind::TemplateLiteral);
        self.text("`");
        while self.node(parent)? == Position::More {
            self.text("${");
            self.node(parent)?;
            self.text("}");
        }
        self.text("`");
        Ok(())
    }

    #[inline(never)]
    fn class_property(&mut self) -> Result<(), DecodeError> {
        let kind = NodeKind::ClassProperty;
        let flags = self.flags()?;
        if flag(flags, 4) {
            self.text("static ");
        }
        if self.key(kind, flag(flags, 2))? == Position::More {
            self.text("=");
            self.node(Some(kind))?;
        }
        self.text(";");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literals::MAX_LITERALS;
    use crate::Vocabulary;

    struct Tables {
        registry: KindRegistry,
        dictionary: Dictionary,
    }
    impl Tables {
        fn new() -> Self {
            let vocabulary = Vocabulary::default();
            Tables {
                registry: KindRegistry::new(&vocabulary.kinds).expect("Could not build registry"),
                dictionary: Dictionary::new(&vocabulary.globals, &vocabulary.identifiers)
                    .expect("Could not build dictionary"),
            }
        }
        fn code(&self, kind: NodeKind) -> u8 {
            self.registry.code_of(kind).expect("Unregistered kind")
        }
        fn global(&self, value: &str) -> u8 {
            match self.dictionary.lookup(value) {
                Some(LiteralCode::Global(index)) => index,
                other => panic!("{:?} is not a global: {:?}", value, other),
            }
        }
        fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
            Decoder::new(&self.registry, &self.dictionary, bytes)
                .decode()?
                .to_source()
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(Escape::Verbatim.apply("a\"b"), "a\"b");
        assert_eq!(Escape::String.apply("plain"), Cow::Borrowed("plain"));
        assert_eq!(Escape::String.apply("say \"hi\"\\\r\n"), "say \\\"hi\\\"\\\\\\r\\n");
        assert_eq!(Escape::String.apply("`${x}`"), "`${x}`");
        assert_eq!(Escape::Template.apply("`${x}` costs $5"), "\\`\\${x}\\` costs $5");
        assert_eq!(Escape::Template.apply("a\\b\nc"), "a\\\\b\\nc");
        assert_eq!(Escape::RegExp.apply("a/b[/]"), "a\\/b[\\/]");
    }

    #[test]
    fn test_decode_by_hand() {
        let _ = env_logger::try_init();
        let tables = Tables::new();

        // if (x) {}
        let bytes = vec![
            tables.code(NodeKind::IfStatement),
            0x80 | tables.code(NodeKind::Identifier),
            tables.global("x"),
            tables.code(NodeKind::BlockStatement),
            LIST_END,
        ];
        assert_eq!(tables.decode(&bytes), Ok("if(x){}".to_string()));

        // A pooled string, then the literal region.
        let bytes = vec![
            tables.code(NodeKind::ExpressionStatement),
            tables.code(NodeKind::StringLiteral),
            0x81,
            0x00,
            b'"' | 0x80,
            b'q',
        ];
        assert_eq!(tables.decode(&bytes), Ok("\"\\\"q\";".to_string()));

        // An empty program.
        assert_eq!(tables.decode(&[LIST_END]), Ok(String::new()));
    }

    #[test]
    fn test_tokens() {
        let tables = Tables::new();
        let bytes = vec![
            tables.code(NodeKind::ExpressionStatement),
            tables.code(NodeKind::Identifier),
            0x81,
            0x00,
            b'f' | 0x80,
            b'n',
        ];
        let decoded = Decoder::new(&tables.registry, &tables.dictionary, &bytes)
            .decode()
            .expect("Could not decode");
        assert_eq!(
            decoded.tokens,
            vec![
                Token::Text(Cow::Borrowed("")),
                Token::Pooled {
                    index: 0,
                    escape: Escape::Verbatim,
                },
                Token::Text(Cow::Borrowed(";")),
            ]
        );
        assert_eq!(decoded.literals, vec!["fn".to_string()]);
        assert_eq!(decoded.to_source(), Ok("fn;".to_string()));
    }

    #[test]
    fn test_bad_kind() {
        let tables = Tables::new();
        assert_eq!(
            tables.decode(&[0x7F]),
            Err(DecodeError::Format(FormatError::BadKind {
                offset: 0,
                code: 0x7F
            }))
        );
        assert_eq!(
            tables.decode(&[0x80 | 99]),
            Err(DecodeError::Format(FormatError::BadKind { offset: 0, code: 99 }))
        );
        assert_eq!(
            tables.decode(&[0x1F]),
            Err(DecodeError::Format(FormatError::BadKind {
                offset: 0,
                code: 0x1F
            }))
        );
    }

    #[test]
    fn test_truncated() {
        let tables = Tables::new();
        assert_eq!(
            tables.decode(&[]),
            Err(DecodeError::Format(FormatError::Truncated { offset: 0 }))
        );
        assert_eq!(
            tables.decode(&[tables.code(NodeKind::ExpressionStatement)]),
            Err(DecodeError::Format(FormatError::Truncated { offset: 1 }))
        );
        // A pooled literal code missing its index byte.
        assert_eq!(
            tables.decode(&[
                tables.code(NodeKind::ExpressionStatement),
                tables.code(NodeKind::Identifier),
                0x81,
            ]),
            Err(DecodeError::Format(FormatError::Truncated { offset: 3 }))
        );
    }

    #[test]
    fn test_missing_node() {
        let tables = Tables::new();
        assert_eq!(
            tables.decode(&[tables.code(NodeKind::ExpressionStatement), LIST_END]),
            Err(DecodeError::Format(FormatError::MissingNode { offset: 1 }))
        );
    }

    #[test]
    fn test_bad_indices() {
        let tables = Tables::new();
        assert_eq!(
            tables.decode(&[
                tables.code(NodeKind::ExpressionStatement),
                tables.code(NodeKind::Identifier),
                0x80,
                0xFF,
            ]),
            Err(DecodeError::Format(FormatError::BadIdentifierIndex(0xFF)))
        );

        // The literal region holds a single literal.
        let bytes = [
            tables.code(NodeKind::ExpressionStatement),
            tables.code(NodeKind::Identifier),
            0x81,
            0x05,
            b'a',
        ];
        let decoded = Decoder::new(&tables.registry, &tables.dictionary, &bytes)
            .decode()
            .expect("The node region is well-formed");
        assert_eq!(
            decoded.to_source(),
            Err(DecodeError::Format(FormatError::BadLiteralIndex(5)))
        );

        let dictionary = Dictionary::new(&["x".to_string()], &[]).expect("Could not build dictionary");
        let bytes = [
            tables.code(NodeKind::ExpressionStatement),
            tables.code(NodeKind::Identifier),
            0x01,
        ];
        assert_matches!(
            Decoder::new(&tables.registry, &dictionary, &bytes).decode(),
            Err(DecodeError::Format(FormatError::BadGlobalIndex(1)))
        );
    }

    #[test]
    fn test_bad_flags_and_operators() {
        let tables = Tables::new();
        let declaration = tables.code(NodeKind::VariableDeclaration);
        assert_eq!(
            tables.decode(&[declaration, 0x01]),
            Err(DecodeError::Format(FormatError::BadFlags {
                offset: 1,
                byte: 0x01
            }))
        );
        assert_eq!(
            tables.decode(&[declaration, 0x83]),
            Err(DecodeError::Format(FormatError::BadFlags {
                offset: 1,
                byte: 0x83
            }))
        );
        assert_eq!(
            tables.decode(&[
                tables.code(NodeKind::ExpressionStatement),
                tables.code(NodeKind::BinaryExpression),
                0x80 | tables.code(NodeKind::Identifier),
                tables.global("a"),
                0x80 | 22,
            ]),
            Err(DecodeError::Format(FormatError::BadOperator { offset: 4, code: 22 }))
        );
    }

    #[test]
    fn test_unterminated_array() {
        let tables = Tables::new();
        assert_eq!(
            tables.decode(&[
                tables.code(NodeKind::ExpressionStatement),
                tables.code(NodeKind::ArrayExpression),
                tables.code(NodeKind::Identifier),
                tables.global("a"),
            ]),
            Err(DecodeError::Format(FormatError::ExpectedEnd { offset: 2 }))
        );
    }

    #[test]
    fn test_too_deep() {
        let tables = Tables::new();
        // A statement, `awaits` await expressions, then an identifier.
        let nested = |awaits: usize| {
            let mut bytes = vec![tables.code(NodeKind::ExpressionStatement)];
            bytes.extend(std::iter::repeat(tables.code(NodeKind::AwaitExpression)).take(awaits));
            bytes.push(tables.code(NodeKind::Identifier));
            bytes.push(tables.global("a"));
            bytes
        };

        let awaits = MAX_NESTING - 2;
        assert_eq!(
            tables.decode(&nested(awaits)),
            Ok(format!("{}a{};", "(await ".repeat(awaits), ")".repeat(awaits)))
        );
        assert_eq!(
            tables.decode(&nested(MAX_NESTING - 1)),
            Err(DecodeError::Format(FormatError::TooDeep {
                offset: MAX_NESTING
            }))
        );

        // Deeper input fails at the same offset.
        assert_eq!(
            tables.decode(&nested(64 * MAX_NESTING)),
            Err(DecodeError::Format(FormatError::TooDeep {
                offset: MAX_NESTING
            }))
        );
    }

    #[test]
    fn test_literal_capacity() {
        let tables = Tables::new();
        let mut bytes = vec![LIST_END];
        bytes.extend(std::iter::repeat(b'a').take(MAX_LITERALS));
        let decoded = Decoder::new(&tables.registry, &tables.dictionary, &bytes)
            .decode()
            .expect("Could not decode");
        assert_eq!(decoded.literals.len(), MAX_LITERALS);

        bytes.push(b'b');
        assert_eq!(
            Decoder::new(&tables.registry, &tables.dictionary, &bytes)
                .decode()
                .map(|decoded| decoded.literals.len()),
            Err(DecodeError::Capacity(MAX_LITERALS + 1))
        );
    }
}
