//! Encoding a tree.
//!
//! The tree is written in pre-order. Every node starts with a tag byte,
//! whose continuation bit is set by the parent, depending on whether more
//! items follow the node in the parent's layout. The program-specific
//! literals follow the last node.

use crate::bytes::literal::write_literals;
use crate::bytes::{flags_byte, Position, Sentinel, FLAGS_PRESENT, HOLE, LIST_END, PREFIX};
use crate::kind::KindRegistry;
use crate::literals::{Dictionary, LiteralCode, LiteralTable};
use crate::number;
use crate::{EncodeError, SchemaError, Statistics, MAX_NESTING};

use bean_shared::ast::*;

/// An encoder for a single program.
pub struct Encoder<'a> {
    registry: &'a KindRegistry,
    literals: LiteralTable<'a>,
    out: Vec<u8>,
    depth: usize,
    statistics: Statistics,
}
impl<'a> Encoder<'a> {
    pub fn new(registry: &'a KindRegistry, dictionary: &'a Dictionary) -> Self {
        Encoder {
            registry,
            literals: LiteralTable::new(dictionary),
            out: Vec::new(),
            depth: 0,
            statistics: Statistics::default(),
        }
    }

    /// Encode a program, consuming the encoder.
    pub fn encode(mut self, program: &Program) -> Result<(Vec<u8>, Statistics), EncodeError> {
        self.list(&program.body)?;
        self.statistics.node_bytes = self.out.len().into();
        debug!(target: "bean_encode", "Node region: {} bytes", self.out.len());

        let pool = self.literals.into_pool();
        let literal_bytes = write_literals(&mut self.out, &pool);
        self.statistics.literal_bytes = literal_bytes.into();
        self.statistics.pooled_literals = pool.len().into();
        debug!(target: "bean_encode", "Literal region: {} literals in {} bytes", pool.len(), literal_bytes);

        Ok((self.out, self.statistics))
    }

    fn byte(&mut self, byte: u8) {
        self.out.push(byte);
    }

    fn sentinel(&mut self, sentinel: Sentinel) {
        self.out.push(sentinel.byte());
    }

    fn literal(&mut self, value: &str) -> Result<(), EncodeError> {
        let code = self.literals.intern(value)?;
        match code {
            LiteralCode::Global(_) => self.statistics.global_references += 1usize.into(),
            LiteralCode::Predefined(_) => self.statistics.predefined_references += 1usize.into(),
            LiteralCode::Pooled(_) => self.statistics.pooled_references += 1usize.into(),
        }
        self.out.extend_from_slice(&code.bytes());
        Ok(())
    }

    /// A list whose end is marked by the continuation bit of its last item,
    /// or by `LIST_END` if empty.
    fn list(&mut self, nodes: &[Node]) -> Result<(), EncodeError> {
        if nodes.is_empty() {
            self.byte(LIST_END);
            return Ok(());
        }
        self.items(nodes)
    }

    /// Items whose last one closes the node. Writes nothing if empty.
    fn items(&mut self, nodes: &[Node]) -> Result<(), EncodeError> {
        for (i, node) in nodes.iter().enumerate() {
            self.node(node, Position::of(i, nodes.len()))?;
        }
        Ok(())
    }

    /// Items that are always followed by more slots, e.g. parameters.
    fn params(&mut self, nodes: &[Node]) -> Result<(), EncodeError> {
        for node in nodes {
            self.node(node, Position::More)?;
        }
        Ok(())
    }

    fn optional(&mut self, node: Option<&Node>, position: Position) -> Result<(), EncodeError> {
        match node {
            Some(node) => self.node(node, position),
            None => {
                self.sentinel(Sentinel::at(position));
                Ok(())
            }
        }
    }

    /// `[a, , b]` needs holes, and a final hole is not the end of the list,
    /// so array elements are never last and the list always ends with
    /// `LIST_END`.
    fn elements(&mut self, elements: &[Option<Node>]) -> Result<(), EncodeError> {
        for element in elements {
            match *element {
                Some(ref node) => self.node(node, Position::More)?,
                None => self.byte(HOLE),
            }
        }
        self.byte(LIST_END);
        Ok(())
    }

    fn operator(&mut self, code: u8, prefix: bool) {
        let prefix = if prefix { PREFIX } else { 0 };
        self.byte(FLAGS_PRESENT | prefix | code);
    }

    fn node(&mut self, node: &Node, position: Position) -> Result<(), EncodeError> {
        let kind = node.kind();
        let code = self
            .registry
            .code_of(kind)
            .ok_or(SchemaError::UnregisteredKind(kind))?;
        if self.depth == MAX_NESTING {
            return Err(SchemaError::TooDeep(kind).into());
        }
        trace!(target: "bean_encode", "{} at {} ({:?})", kind, self.out.len(), position);
        self.byte(position.tag(code));
        self.statistics.nodes += 1usize.into();

        self.depth += 1;
        self.children(node)?;
        self.depth -= 1;
        Ok(())
    }

    // A level of nesting costs the frames of `node`, `children` and at most
    // one helper below. Arms of `children` stay a single call.

    #[inline(never)]
    fn children(&mut self, node: &Node) -> Result<(), EncodeError> {
        use crate::bytes::Position::*;
        match *node {
            Node::Identifier { ref name } => self.literal(name),
            Node::RegExpLiteral {
                ref pattern,
                ref flags,
            } => self.regexp(pattern, flags),
            Node::NullLiteral
            | Node::EmptyStatement
            | Node::DebuggerStatement
            | Node::Super
            | Node::ThisExpression => Ok(()),
            Node::StringLiteral { ref value } | Node::TemplateElement { ref value } => {
                self.literal(value)
            }
            Node::BooleanLiteral { value } => {
                self.byte(value as u8);
                Ok(())
            }
            Node::NumericLiteral { value, ref raw } => self.number(value, raw.as_deref()),
            Node::ExpressionStatement {
                expression: ref child,
            }
            | Node::ThrowStatement { argument: ref child }
            | Node::AwaitExpression { argument: ref child }
            | Node::RestProperty { argument: ref child }
            | Node::SpreadProperty { argument: ref child }
            | Node::SpreadElement { argument: ref child }
            | Node::RestElement { argument: ref child } => self.node(child, Last),
            Node::BlockStatement { ref body } | Node::ClassBody { ref body } => self.list(body),
            Node::ObjectExpression { ref properties } | Node::ObjectPattern { ref properties } => {
                self.list(properties)
            }
            Node::SequenceExpression { ref expressions } => self.list(expressions),
            Node::WithStatement {
                object: ref first,
                body: ref second,
            }
            | Node::WhileStatement {
                test: ref first,
                body: ref second,
            }
            | Node::DoWhileStatement {
                body: ref first,
                test: ref second,
            }
            | Node::LabeledStatement {
                label: ref first,
                body: ref second,
            }
            | Node::AssignmentPattern {
                left: ref first,
                right: ref second,
            }
            | Node::MetaProperty {
                meta: ref first,
                property: ref second,
            } => self.pair(first, second),
            Node::ReturnStatement { ref argument } => self.optional(argument.as_deref(), Last),
            Node::BreakStatement { ref label } | Node::ContinueStatement { ref label } => {
                self.optional(label.as_deref(), Last)
            }
            Node::IfStatement {
                ref test,
                ref consequent,
                ref alternate,
            } => self.then(Some(&**test), consequent, alternate.as_deref()),
            Node::VariableDeclarator { ref id, ref init } => self.then(None, id, init.as_deref()),
            Node::SwitchStatement {
                ref discriminant,
                ref cases,
            } => self.head_and_items(Some(&**discriminant), cases),
            Node::SwitchCase {
                ref test,
                ref consequent,
            } => self.head_and_items(test.as_deref(), consequent),
            Node::TryStatement {
                ref block,
                ref handler,
                ref finalizer,
            } => self.try_statement(block, handler.as_deref(), finalizer.as_deref()),
            Node::CatchClause {
                ref param,
                ref body,
            } => self.named(param.as_deref(), None, body),
            Node::ForStatement {
                ref init,
                ref test,
                ref update,
                ref body,
            } => self.for_statement(init.as_deref(), test.as_deref(), update.as_deref(), body),
            Node::ForInStatement {
                ref left,
                ref right,
                ref body,
            }
            | Node::ForOfStatement {
                ref left,
                ref right,
                ref body,
            }
            | Node::ForAwaitStatement {
                ref left,
                ref right,
                ref body,
            }
            | Node::ConditionalExpression {
                test: ref left,
                consequent: ref right,
                alternate: ref body,
            } => self.triple(left, right, body),
            Node::FunctionDeclaration {
                ref id,
                ref params,
                ref body,
                generator,
                is_async,
            } => self.callable(
                flags_byte(&[(1, generator), (0, is_async)]),
                Some(Some(&**id)),
                params,
                body,
            ),
            Node::FunctionExpression {
                ref id,
                ref params,
                ref body,
                generator,
                is_async,
            } => self.callable(
                flags_byte(&[(1, generator), (0, is_async)]),
                Some(id.as_deref()),
                params,
                body,
            ),
            Node::ArrowFunctionExpression {
                ref params,
                ref body,
                is_async,
            } => self.callable(flags_byte(&[(0, is_async)]), None, params, body),
            Node::ObjectMethod {
                kind: method_kind,
                ref key,
                ref params,
                ref body,
                computed,
                generator,
                is_async,
            } => self.callable(
                flags_byte(&[(2, computed), (1, generator), (0, is_async)]) | method_kind.code() << 5,
                Some(Some(&**key)),
                params,
                body,
            ),
            Node::ClassMethod {
                kind: method_kind,
                ref key,
                ref params,
                ref body,
                computed,
                is_static,
                generator,
                is_async,
            } => self.callable(
                flags_byte(&[(4, is_static), (2, computed), (1, generator), (0, is_async)])
                    | method_kind.code() << 5,
                Some(Some(&**key)),
                params,
                body,
            ),
            Node::VariableDeclaration {
                kind: declaration_kind,
                ref declarations,
            } => {
                self.byte(FLAGS_PRESENT | (1 << declaration_kind.code()));
                self.list(declarations)
            }
            Node::YieldExpression {
                ref argument,
                delegate,
            } => self.yield_expression(argument.as_deref(), delegate),
            Node::ArrayExpression { ref elements } | Node::ArrayPattern { ref elements } => {
                self.elements(elements)
            }
            Node::ObjectProperty {
                ref key,
                ref value,
                computed,
                shorthand,
            } => {
                self.byte(flags_byte(&[(3, shorthand), (2, computed)]));
                self.after(if shorthand { None } else { Some(&**key) }, value)
            }
            Node::ClassProperty {
                ref key,
                ref value,
                computed,
                is_static,
            } => {
                self.byte(flags_byte(&[(4, is_static), (2, computed)]));
                self.then(None, key, value.as_deref())
            }
            Node::UnaryExpression {
                operator,
                prefix,
                ref argument,
            } => {
                self.operator(operator.code(), prefix);
                self.node(argument, Last)
            }
            Node::UpdateExpression {
                operator,
                prefix,
                ref argument,
            } => {
                self.operator(operator.code(), prefix);
                self.node(argument, Last)
            }
            Node::BinaryExpression {
                operator,
                ref left,
                ref right,
            } => self.binary(operator.code(), left, right),
            Node::AssignmentExpression {
                operator,
                ref left,
                ref right,
            } => self.binary(operator.code(), left, right),
            Node::LogicalExpression {
                operator,
                ref left,
                ref right,
            } => self.binary(operator.code(), left, right),
            Node::MemberExpression {
                ref object,
                ref property,
                computed,
            } => {
                self.byte(flags_byte(&[(2, computed)]));
                self.pair(object, property)
            }
            Node::BindExpression {
                ref object,
                ref callee,
            } => self.after(object.as_deref(), callee),
            Node::CallExpression {
                ref callee,
                ref arguments,
            }
            | Node::NewExpression {
                ref callee,
                ref arguments,
            } => self.head_and_items(Some(&**callee), arguments),
            Node::TemplateLiteral {
                ref quasis,
                ref expressions,
            } => self.template(quasis, expressions),
            Node::TaggedTemplateExpression { ref tag, ref quasi } => {
                if quasi.kind() != NodeKind::TemplateLiteral {
                    return Err(malformed(
                        NodeKind::TaggedTemplateExpression,
                        "quasi is not a template literal",
                    ));
                }
                self.pair(tag, quasi)
            }
            Node::ClassDeclaration {
                ref id,
                ref super_class,
                ref body,
            } => self.named(Some(&**id), super_class.as_deref(), body),
            Node::ClassExpression {
                ref id,
                ref super_class,
                ref body,
            } => self.named(id.as_deref(), super_class.as_deref(), body),
        }
    }

    fn number(&mut self, value: f64, raw: Option<&str>) -> Result<(), EncodeError> {
        let literal = number::literal(value, raw)?;
        self.literal(&literal)
    }

    fn regexp(&mut self, pattern: &str, flags: &RegExpFlags) -> Result<(), EncodeError> {
        self.byte(flags_byte(&[
            (0, flags.global),
            (1, flags.ignore_case),
            (2, flags.multiline),
            (3, flags.unicode),
            (4, flags.sticky),
        ]));
        self.literal(&unescape_slashes(pattern))
    }

    #[inline(never)]
    fn pair(&mut self, first: &Node, last: &Node) -> Result<(), EncodeError> {
        self.node(first, Position::More)?;
        self.node(last, Position::Last)
    }

    #[inline(never)]
    fn triple(&mut self, first: &Node, second: &Node, last: &Node) -> Result<(), EncodeError> {
        self.node(first, Position::More)?;
        self.node(second, Position::More)?;
        self.node(last, Position::Last)
    }

    /// A node that closes the parent unless an optional node follows it.
    #[inline(never)]
    fn then(&mut self, first: Option<&Node>, middle: &Node, last: Option<&Node>) -> Result<(), EncodeError> {
        if let Some(first) = first {
            self.node(first, Position::More)?;
        }
        self.node(middle, Position::last_if(last.is_none()))?;
        match last {
            Some(last) => self.node(last, Position::Last),
            None => Ok(()),
        }
    }

    /// A node that is left out entirely when absent, then the last node.
    #[inline(never)]
    fn after(&mut self, first: Option<&Node>, last: &Node) -> Result<(), EncodeError> {
        if let Some(first) = first {
            self.node(first, Position::More)?;
        }
        self.node(last, Position::Last)
    }

    /// An optional name, an optional middle node, then the last node, as in
    /// classes and catch clauses.
    #[inline(never)]
    fn named(&mut self, name: Option<&Node>, middle: Option<&Node>, last: &Node) -> Result<(), EncodeError> {
        self.optional(name, Position::More)?;
        self.after(middle, last)
    }

    /// A slot closing the parent when no items follow, then the items.
    #[inline(never)]
    fn head_and_items(&mut self, head: Option<&Node>, items: &[Node]) -> Result<(), EncodeError> {
        self.optional(head, Position::last_if(items.is_empty()))?;
        self.items(items)
    }

    /// Flags, then an optional name slot (functions and methods have one,
    /// arrows don't), parameters and body.
    #[inline(never)]
    fn callable(
        &mut self,
        flags: u8,
        name: Option<Option<&Node>>,
        params: &[Node],
        body: &Node,
    ) -> Result<(), EncodeError> {
        self.byte(flags);
        if let Some(name) = name {
            self.optional(name, Position::More)?;
        }
        self.params(params)?;
        self.node(body, Position::Last)
    }

    #[inline(never)]
    fn binary(&mut self, code: u8, left: &Node, right: &Node) -> Result<(), EncodeError> {
        self.node(left, Position::More)?;
        self.operator(code, false);
        self.node(right, Position::Last)
    }

    #[inline(never)]
    fn try_statement(
        &mut self,
        block: &Node,
        handler: Option<&Node>,
        finalizer: Option<&Node>,
    ) -> Result<(), EncodeError> {
        if handler.is_none() && finalizer.is_none() {
            return Err(malformed(NodeKind::TryStatement, "neither handler nor finalizer"));
        }
        self.node(block, Position::More)?;
        self.optional(handler, Position::last_if(finalizer.is_none()))?;
        match finalizer {
            Some(finalizer) => self.node(finalizer, Position::Last),
            None => Ok(()),
        }
    }

    #[inline(never)]
    fn for_statement(
        &mut self,
        init: Option<&Node>,
        test: Option<&Node>,
        update: Option<&Node>,
        body: &Node,
    ) -> Result<(), EncodeError> {
        self.optional(init, Position::More)?;
        self.optional(test, Position::More)?;
        self.optional(update, Position::More)?;
        self.node(body, Position::Last)
    }

    #[inline(never)]
    fn yield_expression(&mut self, argument: Option<&Node>, delegate: bool) -> Result<(), EncodeError> {
        let present = if argument.is_some() { FLAGS_PRESENT } else { 0 };
        self.byte(present | delegate as u8);
        match argument {
            Some(argument) => self.node(argument, Position::Last),
            None => Ok(()),
        }
    }

    #[inline(never)]
    fn template(&mut self, quasis: &[Node], expressions: &[Node]) -> Result<(), EncodeError> {
        if quasis.len() != expressions.len() + 1 {
            return Err(malformed(
                NodeKind::TemplateLiteral,
                "expected one more quasi than expressions",
            ));
        }
        for (i, quasi) in quasis.iter().enumerate() {
            self.node(quasi, Position::of(i, quasis.len()))?;
            if let Some(expression) = expressions.get(i) {
                self.node(expression, Position::More)?;
            }
        }
        Ok(())
    }
}

fn malformed(kind: NodeKind, reason: &'static str) -> EncodeError {
    SchemaError::Malformed { kind, reason }.into()
}

/// Turn `\/` into `/`, leaving other escapes alone.
fn unescape_slashes(pattern: &str) -> String {
    let mut result = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('/') => result.push('/'),
            Some(next) => {
                result.push('\\');
                result.push(next);
            }
            None => result.push('\\'),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
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
        fn encode(&self, body: Vec<Node>) -> Result<(Vec<u8>, Statistics), EncodeError> {
            Encoder::new(&self.registry, &self.dictionary).encode(&Program::new(body))
        }
    }

    #[test]
    fn test_empty_program() {
        let tables = Tables::new();
        let (bytes, _) = tables.encode(vec![]).expect("Could not encode");
        assert_eq!(bytes, vec![LIST_END]);
    }

    #[test]
    fn test_empty_block_vs_absent_slot() {
        let _ = env_logger::try_init();
        let tables = Tables::new();
        let x = tables.global("x");

        // if (x) {}
        let (bytes, _) = tables
            .encode(vec![Node::IfStatement {
                test: Box::new(Node::identifier("x")),
                consequent: Box::new(Node::block(vec![])),
                alternate: None,
            }])
            .expect("Could not encode");
        assert_eq!(
            bytes,
            vec![
                tables.code(NodeKind::IfStatement),
                0x80 | tables.code(NodeKind::Identifier),
                x,
                tables.code(NodeKind::BlockStatement),
                LIST_END,
            ]
        );

        // if (x) {} else ;
        let (bytes, _) = tables
            .encode(vec![Node::IfStatement {
                test: Box::new(Node::identifier("x")),
                consequent: Box::new(Node::block(vec![])),
                alternate: Some(Box::new(Node::EmptyStatement)),
            }])
            .expect("Could not encode");
        assert_eq!(
            bytes,
            vec![
                tables.code(NodeKind::IfStatement),
                0x80 | tables.code(NodeKind::Identifier),
                x,
                0x80 | tables.code(NodeKind::BlockStatement),
                LIST_END,
                tables.code(NodeKind::EmptyStatement),
            ]
        );

        // function f() { return; }
        let (bytes, _) = tables
            .encode(vec![Node::FunctionDeclaration {
                id: Box::new(Node::identifier("f")),
                params: vec![],
                body: Box::new(Node::block(vec![Node::ReturnStatement { argument: None }])),
                generator: false,
                is_async: false,
            }])
            .expect("Could not encode");
        assert_eq!(
            bytes,
            vec![
                tables.code(NodeKind::FunctionDeclaration),
                0x80,
                0x80 | tables.code(NodeKind::Identifier),
                tables.global("f"),
                tables.code(NodeKind::BlockStatement),
                tables.code(NodeKind::ReturnStatement),
                LIST_END,
            ]
        );
    }

    #[test]
    fn test_regexp() {
        let tables = Tables::new();
        let flags = RegExpFlags::from_str("mig").expect("Valid flags");
        let (bytes, statistics) = tables
            .encode(vec![Node::statement(Node::RegExpLiteral {
                pattern: "q\\/r".to_string(),
                flags,
            })])
            .expect("Could not encode");
        assert_eq!(
            bytes,
            vec![
                tables.code(NodeKind::ExpressionStatement),
                tables.code(NodeKind::RegExpLiteral),
                0x87,
                0x81,
                0x00,
                b'q' | 0x80,
                b'/' | 0x80,
                b'r',
            ]
        );
        assert_eq!(statistics.node_bytes, 5usize.into());
        assert_eq!(statistics.literal_bytes, 3usize.into());
    }

    #[test]
    fn test_unescape_slashes() {
        assert_eq!(unescape_slashes("a\\/b"), "a/b");
        assert_eq!(unescape_slashes("a\\\\\\/b"), "a\\\\/b");
        assert_eq!(unescape_slashes("\\d+\\."), "\\d+\\.");
        assert_eq!(unescape_slashes("[/]"), "[/]");
    }

    #[test]
    fn test_holes() {
        let tables = Tables::new();
        // [, a, ,]
        let (bytes, _) = tables
            .encode(vec![Node::statement(Node::ArrayExpression {
                elements: vec![None, Some(Node::identifier("a")), None],
            })])
            .expect("Could not encode");
        assert_eq!(
            bytes,
            vec![
                tables.code(NodeKind::ExpressionStatement),
                tables.code(NodeKind::ArrayExpression),
                HOLE,
                0x80 | tables.code(NodeKind::Identifier),
                tables.global("a"),
                HOLE,
                LIST_END,
            ]
        );
    }

    #[test]
    fn test_operators() {
        let tables = Tables::new();
        // a ** -b
        let (bytes, _) = tables
            .encode(vec![Node::statement(Node::BinaryExpression {
                operator: BinaryOperator::Pow,
                left: Box::new(Node::identifier("a")),
                right: Box::new(Node::UnaryExpression {
                    operator: UnaryOperator::Minus,
                    prefix: true,
                    argument: Box::new(Node::identifier("b")),
                }),
            })])
            .expect("Could not encode");
        assert_eq!(
            bytes,
            vec![
                tables.code(NodeKind::ExpressionStatement),
                tables.code(NodeKind::BinaryExpression),
                0x80 | tables.code(NodeKind::Identifier),
                tables.global("a"),
                0x80 | 21,
                tables.code(NodeKind::UnaryExpression),
                0x80 | 0x40,
                tables.code(NodeKind::Identifier),
                tables.global("b"),
            ]
        );
    }

    #[test]
    fn test_optional_slots() {
        let tables = Tables::new();
        // for (;;) {}
        let (bytes, _) = tables
            .encode(vec![Node::ForStatement {
                init: None,
                test: None,
                update: None,
                body: Box::new(Node::block(vec![])),
            }])
            .expect("Could not encode");
        assert_eq!(
            bytes,
            vec![
                tables.code(NodeKind::ForStatement),
                HOLE,
                HOLE,
                HOLE,
                tables.code(NodeKind::BlockStatement),
                LIST_END,
            ]
        );

        // switch (a) { default: }
        let (bytes, _) = tables
            .encode(vec![Node::SwitchStatement {
                discriminant: Box::new(Node::identifier("a")),
                cases: vec![Node::SwitchCase {
                    test: None,
                    consequent: vec![],
                }],
            }])
            .expect("Could not encode");
        assert_eq!(
            bytes,
            vec![
                tables.code(NodeKind::SwitchStatement),
                0x80 | tables.code(NodeKind::Identifier),
                tables.global("a"),
                tables.code(NodeKind::SwitchCase),
                LIST_END,
            ]
        );
    }

    #[test]
    fn test_interning_determinism() {
        let tables = Tables::new();
        let body = vec![
            Node::statement(Node::string("hello world")),
            Node::statement(Node::string("hello world")),
            Node::statement(Node::identifier("length")),
            Node::statement(Node::identifier("querySelector")),
        ];
        let (bytes, statistics) = tables.encode(body).expect("Could not encode");
        assert_eq!(bytes[2..4], [0x81, 0x00]);
        assert_eq!(bytes[6..8], [0x81, 0x00]);
        assert_eq!(statistics.pooled_literals, 1usize.into());
        assert_eq!(statistics.pooled_references, 2usize.into());
        assert_eq!(statistics.global_references, 1usize.into());
        assert_eq!(statistics.predefined_references, 1usize.into());
        assert_eq!(statistics.nodes, 8usize.into());
        assert_eq!(statistics.literal_bytes, "hello world".len().into());
    }

    #[test]
    fn test_too_deep() {
        let tables = Tables::new();
        // `a+a+...+a`, parsed as `((a+a)+a)+...`.
        let chain = |terms: usize| {
            let mut node = Node::identifier("a");
            for _ in 1..terms {
                node = Node::BinaryExpression {
                    operator: BinaryOperator::Plus,
                    left: Box::new(node),
                    right: Box::new(Node::identifier("a")),
                };
            }
            vec![Node::statement(node)]
        };

        // The statement, the operators and the leftmost `a`.
        let (bytes, statistics) = tables.encode(chain(MAX_NESTING - 1)).expect("Could not encode");
        assert_eq!(statistics.nodes, (2 * MAX_NESTING - 2).into());
        assert_eq!(bytes.len(), 1 + (MAX_NESTING - 2) * 2 + MAX_NESTING * 2 - 2);

        assert_eq!(
            tables.encode(chain(MAX_NESTING)),
            Err(EncodeError::Schema(SchemaError::TooDeep(NodeKind::Identifier)))
        );
    }

    #[test]
    fn test_schema_errors() {
        let tables = Tables::new();
        assert_matches!(
            tables.encode(vec![Node::TryStatement {
                block: Box::new(Node::block(vec![])),
                handler: None,
                finalizer: None,
            }]),
            Err(EncodeError::Schema(SchemaError::Malformed {
                kind: NodeKind::TryStatement,
                ..
            }))
        );
        assert_matches!(
            tables.encode(vec![Node::statement(Node::TemplateLiteral {
                quasis: vec![],
                expressions: vec![],
            })]),
            Err(EncodeError::Schema(SchemaError::Malformed {
                kind: NodeKind::TemplateLiteral,
                ..
            }))
        );
        assert_matches!(
            tables.encode(vec![Node::statement(Node::number(std::f64::NAN))]),
            Err(EncodeError::Schema(SchemaError::NonFiniteNumber(_)))
        );
        assert_matches!(
            tables.encode(vec![Node::statement(Node::string("\u{1F600}"))]),
            Err(EncodeError::Schema(SchemaError::UnrepresentableLiteral(_)))
        );

        let vocabulary = Vocabulary::default();
        let registry = KindRegistry::new(&["ExpressionStatement", "Identifier"])
            .expect("Could not build registry");
        let dictionary = Dictionary::new(&vocabulary.globals, &vocabulary.identifiers)
            .expect("Could not build dictionary");
        assert_eq!(
            Encoder::new(&registry, &dictionary)
                .encode(&Program::new(vec![Node::statement(Node::ThisExpression)])),
            Err(EncodeError::Schema(SchemaError::UnregisteredKind(
                NodeKind::ThisExpression
            )))
        );
    }
}
