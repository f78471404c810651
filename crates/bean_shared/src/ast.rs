//! The syntax tree consumed by the encoder.
//!
//! The tree mirrors the Babel flavour of ESTree, restricted to the node kinds
//! the binary format knows how to represent. Every slot holds a `Node`, the
//! format itself does not distinguish statements from expressions or
//! patterns, so neither does this data structure.

/// Declare `NodeKind` along with its name table.
///
/// The order of declaration is also the order of the default node-kind
/// vocabulary.
macro_rules! node_kinds {
    ( $( $kind: ident ),* $(,)* ) => {
        /// The tag of a `Node`, without its contents.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $( $kind, )*
        }
        impl NodeKind {
            /// All kinds, in default vocabulary order.
            pub const ALL: &'static [NodeKind] = &[ $( NodeKind::$kind, )* ];

            pub fn name(self) -> &'static str {
                match self {
                    $( NodeKind::$kind => stringify!($kind), )*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                Self::ALL.iter().find(|kind| kind.name() == name).cloned()
            }
        }
    }
}

node_kinds! {
    Identifier,
    RegExpLiteral,
    NullLiteral,
    StringLiteral,
    BooleanLiteral,
    NumericLiteral,
    ExpressionStatement,
    BlockStatement,
    EmptyStatement,
    DebuggerStatement,
    WithStatement,
    ReturnStatement,
    LabeledStatement,
    BreakStatement,
    ContinueStatement,
    IfStatement,
    SwitchStatement,
    SwitchCase,
    ThrowStatement,
    TryStatement,
    CatchClause,
    WhileStatement,
    DoWhileStatement,
    ForStatement,
    ForInStatement,
    ForOfStatement,
    ForAwaitStatement,
    FunctionDeclaration,
    VariableDeclaration,
    VariableDeclarator,
    Super,
    ThisExpression,
    ArrowFunctionExpression,
    YieldExpression,
    AwaitExpression,
    ArrayExpression,
    ObjectExpression,
    ObjectProperty,
    ObjectMethod,
    RestProperty,
    SpreadProperty,
    FunctionExpression,
    UnaryExpression,
    UpdateExpression,
    BinaryExpression,
    AssignmentExpression,
    LogicalExpression,
    SpreadElement,
    MemberExpression,
    BindExpression,
    ConditionalExpression,
    CallExpression,
    NewExpression,
    SequenceExpression,
    TemplateLiteral,
    TaggedTemplateExpression,
    TemplateElement,
    ObjectPattern,
    ArrayPattern,
    RestElement,
    AssignmentPattern,
    ClassBody,
    ClassMethod,
    ClassProperty,
    ClassDeclaration,
    ClassExpression,
    MetaProperty,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        self.name().fmt(formatter)
    }
}

/// Declare a small enumeration of source tokens.
///
/// The position of each variant in the declaration is its wire code, so
/// variants must never be reordered.
macro_rules! token_enum {
    (
        $(#[$outer:meta])*
        pub enum $name: ident {
            $( $variant: ident => $text: literal ),* $(,)*
        }
    ) => {
        $(#[$outer])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )*
        }
        impl $name {
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )* ];

            /// The source text of this token.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )*
                }
            }

            pub fn from_str(text: &str) -> Option<Self> {
                match text {
                    $( $text => Some($name::$variant), )*
                    _ => None,
                }
            }

            pub fn code(self) -> u8 {
                self as u8
            }

            pub fn from_code(code: u8) -> Option<Self> {
                Self::ALL.get(code as usize).cloned()
            }
        }
        impl std::fmt::Display for $name {
            fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
                self.as_str().fmt(formatter)
            }
        }
    }
}

token_enum! {
    pub enum VariableKind {
        Var => "var",
        Let => "let",
        Const => "const",
    }
}

token_enum! {
    /// The flavour of a method in an object literal or class body.
    pub enum MethodKind {
        Get => "get",
        Set => "set",
        Method => "method",
        Constructor => "constructor",
    }
}

token_enum! {
    pub enum UnaryOperator {
        Minus => "-",
        Plus => "+",
        Not => "!",
        BitNot => "~",
        Typeof => "typeof",
        Void => "void",
        Delete => "delete",
    }
}

token_enum! {
    pub enum UpdateOperator {
        Increment => "++",
        Decrement => "--",
    }
}

token_enum! {
    pub enum BinaryOperator {
        Eq => "==",
        NotEq => "!=",
        StrictEq => "===",
        StrictNotEq => "!==",
        Lt => "<",
        LtEq => "<=",
        Gt => ">",
        GtEq => ">=",
        LShift => "<<",
        RShift => ">>",
        URShift => ">>>",
        Plus => "+",
        Minus => "-",
        Times => "*",
        Div => "/",
        Mod => "%",
        BitOr => "|",
        BitXor => "^",
        BitAnd => "&",
        In => "in",
        Instanceof => "instanceof",
        Pow => "**",
    }
}

token_enum! {
    pub enum AssignmentOperator {
        Assign => "=",
        PlusAssign => "+=",
        MinusAssign => "-=",
        TimesAssign => "*=",
        DivAssign => "/=",
        ModAssign => "%=",
        LShiftAssign => "<<=",
        RShiftAssign => ">>=",
        URShiftAssign => ">>>=",
        BitOrAssign => "|=",
        BitXorAssign => "^=",
        BitAndAssign => "&=",
    }
}

token_enum! {
    pub enum LogicalOperator {
        Or => "||",
        And => "&&",
    }
}

/// The flags of a regular expression literal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RegExpFlags {
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub unicode: bool,
    pub sticky: bool,
}
impl RegExpFlags {
    /// Parse flags as written after a regular expression literal.
    ///
    /// Returns `None` for flags outside of `gimuy` and for repeated flags.
    pub fn from_str(text: &str) -> Option<Self> {
        let mut flags = RegExpFlags::default();
        for c in text.chars() {
            let flag = match c {
                'g' => &mut flags.global,
                'i' => &mut flags.ignore_case,
                'm' => &mut flags.multiline,
                'u' => &mut flags.unicode,
                'y' => &mut flags.sticky,
                _ => return None,
            };
            if *flag {
                return None;
            }
            *flag = true;
        }
        Some(flags)
    }
}

/// Flags are displayed in canonical order, e.g. `gim`.
impl std::fmt::Display for RegExpFlags {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        for &(set, c) in &[
            (self.global, 'g'),
            (self.ignore_case, 'i'),
            (self.multiline, 'm'),
            (self.unicode, 'u'),
            (self.sticky, 'y'),
        ] {
            if set {
                write!(formatter, "{}", c)?;
            }
        }
        Ok(())
    }
}

/// The root of a tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub body: Vec<Node>,
}
impl Program {
    pub fn new(body: Vec<Node>) -> Self {
        Program { body }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Identifier {
        name: String,
    },
    RegExpLiteral {
        pattern: String,
        flags: RegExpFlags,
    },
    NullLiteral,
    StringLiteral {
        value: String,
    },
    BooleanLiteral {
        value: bool,
    },
    NumericLiteral {
        value: f64,
        /// The source spelling, if known.
        raw: Option<String>,
    },
    ExpressionStatement {
        expression: Box<Node>,
    },
    BlockStatement {
        body: Vec<Node>,
    },
    EmptyStatement,
    DebuggerStatement,
    WithStatement {
        object: Box<Node>,
        body: Box<Node>,
    },
    ReturnStatement {
        argument: Option<Box<Node>>,
    },
    LabeledStatement {
        label: Box<Node>,
        body: Box<Node>,
    },
    BreakStatement {
        label: Option<Box<Node>>,
    },
    ContinueStatement {
        label: Option<Box<Node>>,
    },
    IfStatement {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Option<Box<Node>>,
    },
    SwitchStatement {
        discriminant: Box<Node>,
        cases: Vec<Node>,
    },
    SwitchCase {
        /// `None` for `default:`.
        test: Option<Box<Node>>,
        consequent: Vec<Node>,
    },
    ThrowStatement {
        argument: Box<Node>,
    },
    TryStatement {
        block: Box<Node>,
        handler: Option<Box<Node>>,
        finalizer: Option<Box<Node>>,
    },
    CatchClause {
        param: Option<Box<Node>>,
        body: Box<Node>,
    },
    WhileStatement {
        test: Box<Node>,
        body: Box<Node>,
    },
    DoWhileStatement {
        body: Box<Node>,
        test: Box<Node>,
    },
    ForStatement {
        init: Option<Box<Node>>,
        test: Option<Box<Node>>,
        update: Option<Box<Node>>,
        body: Box<Node>,
    },
    ForInStatement {
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
    },
    ForOfStatement {
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
    },
    ForAwaitStatement {
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
    },
    FunctionDeclaration {
        id: Box<Node>,
        params: Vec<Node>,
        body: Box<Node>,
        generator: bool,
        is_async: bool,
    },
    VariableDeclaration {
        kind: VariableKind,
        declarations: Vec<Node>,
    },
    VariableDeclarator {
        id: Box<Node>,
        init: Option<Box<Node>>,
    },
    Super,
    ThisExpression,
    ArrowFunctionExpression {
        params: Vec<Node>,
        /// Either a `BlockStatement` or an expression.
        body: Box<Node>,
        is_async: bool,
    },
    YieldExpression {
        argument: Option<Box<Node>>,
        delegate: bool,
    },
    AwaitExpression {
        argument: Box<Node>,
    },
    ArrayExpression {
        /// `None` for holes, as in `[, a]`.
        elements: Vec<Option<Node>>,
    },
    ObjectExpression {
        properties: Vec<Node>,
    },
    ObjectProperty {
        key: Box<Node>,
        value: Box<Node>,
        computed: bool,
        shorthand: bool,
    },
    ObjectMethod {
        kind: MethodKind,
        key: Box<Node>,
        params: Vec<Node>,
        body: Box<Node>,
        computed: bool,
        generator: bool,
        is_async: bool,
    },
    RestProperty {
        argument: Box<Node>,
    },
    SpreadProperty {
        argument: Box<Node>,
    },
    FunctionExpression {
        id: Option<Box<Node>>,
        params: Vec<Node>,
        body: Box<Node>,
        generator: bool,
        is_async: bool,
    },
    UnaryExpression {
        operator: UnaryOperator,
        prefix: bool,
        argument: Box<Node>,
    },
    UpdateExpression {
        operator: UpdateOperator,
        prefix: bool,
        argument: Box<Node>,
    },
    BinaryExpression {
        operator: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    AssignmentExpression {
        operator: AssignmentOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    LogicalExpression {
        operator: LogicalOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    SpreadElement {
        argument: Box<Node>,
    },
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
    },
    BindExpression {
        object: Option<Box<Node>>,
        callee: Box<Node>,
    },
    ConditionalExpression {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    CallExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    NewExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    SequenceExpression {
        expressions: Vec<Node>,
    },
    TemplateLiteral {
        /// Always one more quasi than expressions.
        quasis: Vec<Node>,
        expressions: Vec<Node>,
    },
    TaggedTemplateExpression {
        tag: Box<Node>,
        quasi: Box<Node>,
    },
    TemplateElement {
        /// The cooked (unescaped) value.
        value: String,
    },
    ObjectPattern {
        properties: Vec<Node>,
    },
    ArrayPattern {
        elements: Vec<Option<Node>>,
    },
    RestElement {
        argument: Box<Node>,
    },
    AssignmentPattern {
        left: Box<Node>,
        right: Box<Node>,
    },
    ClassBody {
        body: Vec<Node>,
    },
    ClassMethod {
        kind: MethodKind,
        key: Box<Node>,
        params: Vec<Node>,
        body: Box<Node>,
        computed: bool,
        is_static: bool,
        generator: bool,
        is_async: bool,
    },
    ClassProperty {
        key: Box<Node>,
        value: Option<Box<Node>>,
        computed: bool,
        is_static: bool,
    },
    ClassDeclaration {
        id: Box<Node>,
        super_class: Option<Box<Node>>,
        body: Box<Node>,
    },
    ClassExpression {
        id: Option<Box<Node>>,
        super_class: Option<Box<Node>>,
        body: Box<Node>,
    },
    MetaProperty {
        meta: Box<Node>,
        property: Box<Node>,
    },
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        use self::Node::*;
        match *self {
            Identifier { .. } => NodeKind::Identifier,
            RegExpLiteral { .. } => NodeKind::RegExpLiteral,
            NullLiteral => NodeKind::NullLiteral,
            StringLiteral { .. } => NodeKind::StringLiteral,
            BooleanLiteral { .. } => NodeKind::BooleanLiteral,
            NumericLiteral { .. } => NodeKind::NumericLiteral,
            ExpressionStatement { .. } => NodeKind::ExpressionStatement,
            BlockStatement { .. } => NodeKind::BlockStatement,
            EmptyStatement => NodeKind::EmptyStatement,
            DebuggerStatement => NodeKind::DebuggerStatement,
            WithStatement { .. } => NodeKind::WithStatement,
            ReturnStatement { .. } => NodeKind::ReturnStatement,
            LabeledStatement { .. } => NodeKind::LabeledStatement,
            BreakStatement { .. } => NodeKind::BreakStatement,
            ContinueStatement { .. } => NodeKind::ContinueStatement,
            IfStatement { .. } => NodeKind::IfStatement,
            SwitchStatement { .. } => NodeKind::SwitchStatement,
            SwitchCase { .. } => NodeKind::SwitchCase,
            ThrowStatement { .. } => NodeKind::ThrowStatement,
            TryStatement { .. } => NodeKind::TryStatement,
            CatchClause { .. } => NodeKind::CatchClause,
            WhileStatement { .. } => NodeKind::WhileStatement,
            DoWhileStatement { .. } => NodeKind::DoWhileStatement,
            ForStatement { .. } => NodeKind::ForStatement,
            ForInStatement { .. } => NodeKind::ForInStatement,
            ForOfStatement { .. } => NodeKind::ForOfStatement,
            ForAwaitStatement { .. } => NodeKind::ForAwaitStatement,
            FunctionDeclaration { .. } => NodeKind::FunctionDeclaration,
            VariableDeclaration { .. } => NodeKind::VariableDeclaration,
            VariableDeclarator { .. } => NodeKind::VariableDeclarator,
            Super => NodeKind::Super,
            ThisExpression => NodeKind::ThisExpression,
            ArrowFunctionExpression { .. } => NodeKind::ArrowFunctionExpression,
            YieldExpression { .. } => NodeKind::YieldExpression,
            AwaitExpression { .. } => NodeKind::AwaitExpression,
            ArrayExpression { .. } => NodeKind::ArrayExpression,
            ObjectExpression { .. } => NodeKind::ObjectExpression,
            ObjectProperty { .. } => NodeKind::ObjectProperty,
            ObjectMethod { .. } => NodeKind::ObjectMethod,
            RestProperty { .. } => NodeKind::RestProperty,
            SpreadProperty { .. } => NodeKind::SpreadProperty,
            FunctionExpression { .. } => NodeKind::FunctionExpression,
            UnaryExpression { .. } => NodeKind::UnaryExpression,
            UpdateExpression { .. } => NodeKind::UpdateExpression,
            BinaryExpression { .. } => NodeKind::BinaryExpression,
            AssignmentExpression { .. } => NodeKind::AssignmentExpression,
            LogicalExpression { .. } => NodeKind::LogicalExpression,
            SpreadElement { .. } => NodeKind::SpreadElement,
            MemberExpression { .. } => NodeKind::MemberExpression,
            BindExpression { .. } => NodeKind::BindExpression,
            ConditionalExpression { .. } => NodeKind::ConditionalExpression,
            CallExpression { .. } => NodeKind::CallExpression,
            NewExpression { .. } => NodeKind::NewExpression,
            SequenceExpression { .. } => NodeKind::SequenceExpression,
            TemplateLiteral { .. } => NodeKind::TemplateLiteral,
            TaggedTemplateExpression { .. } => NodeKind::TaggedTemplateExpression,
            TemplateElement { .. } => NodeKind::TemplateElement,
            ObjectPattern { .. } => NodeKind::ObjectPattern,
            ArrayPattern { .. } => NodeKind::ArrayPattern,
            RestElement { .. } => NodeKind::RestElement,
            AssignmentPattern { .. } => NodeKind::AssignmentPattern,
            ClassBody { .. } => NodeKind::ClassBody,
            ClassMethod { .. } => NodeKind::ClassMethod,
            ClassProperty { .. } => NodeKind::ClassProperty,
            ClassDeclaration { .. } => NodeKind::ClassDeclaration,
            ClassExpression { .. } => NodeKind::ClassExpression,
            MetaProperty { .. } => NodeKind::MetaProperty,
        }
    }

    // Shorthands for building trees by hand.

    pub fn identifier(name: &str) -> Node {
        Node::Identifier {
            name: name.to_string(),
        }
    }

    pub fn string(value: &str) -> Node {
        Node::StringLiteral {
            value: value.to_string(),
        }
    }

    pub fn number(value: f64) -> Node {
        Node::NumericLiteral { value, raw: None }
    }

    pub fn statement(expression: Node) -> Node {
        Node::ExpressionStatement {
            expression: Box::new(expression),
        }
    }

    pub fn block(body: Vec<Node>) -> Node {
        Node::BlockStatement { body }
    }
}

#[test]
fn test_kind_names() {
    for kind in NodeKind::ALL {
        assert_eq!(NodeKind::from_name(kind.name()), Some(*kind));
    }
    assert_eq!(NodeKind::ALL.len(), 67);
    assert_eq!(NodeKind::from_name("Program"), None);
}

#[test]
fn test_token_enum_codes() {
    assert_eq!(BinaryOperator::from_str("**"), Some(BinaryOperator::Pow));
    assert_eq!(BinaryOperator::Pow.code(), 21);
    assert_eq!(BinaryOperator::from_code(21), Some(BinaryOperator::Pow));
    assert_eq!(BinaryOperator::from_code(22), None);
    assert_eq!(AssignmentOperator::from_code(8), Some(AssignmentOperator::URShiftAssign));
    assert_eq!(MethodKind::Constructor.code(), 3);
    assert_eq!(VariableKind::from_str("let"), Some(VariableKind::Let));
    assert_eq!(UnaryOperator::Delete.as_str(), "delete");
    assert_eq!(LogicalOperator::from_str("??"), None);
}

#[test]
fn test_regexp_flags() {
    let flags = RegExpFlags::from_str("mig").expect("Valid flags");
    assert!(flags.global && flags.ignore_case && flags.multiline);
    assert!(!flags.unicode && !flags.sticky);
    assert_eq!(flags.to_string(), "gim");

    assert_eq!(RegExpFlags::from_str(""), Some(RegExpFlags::default()));
    assert_eq!(RegExpFlags::from_str("gg"), None);
    assert_eq!(RegExpFlags::from_str("s"), None);
}
