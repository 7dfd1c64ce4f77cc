//! Syntax tree of the high-level language.
//!
//! ```text
//! var counter : u8 = 0;
//!
//! fun step : u8 (by : u8) {
//!     counter = counter + by;
//!     if (counter > 10) {
//!         reset();
//!     } else {
//!         log(counter);
//!     }
//! }
//! ```
//!
//! Every node records the source offsets it was parsed from.

/// Half-open range of source offsets.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Self {
        Span { begin, end }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Identifier {
    pub span: Span,
    pub name: String,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ValueType {
    U8,
    S8,
    U16,
    S16,
    Bool,
}

impl ValueType {
    pub const ALL: [ValueType; 5] = [ValueType::U8, ValueType::S8, ValueType::U16, ValueType::S16, ValueType::Bool];

    pub fn name(self) -> &'static str {
        match self {
            ValueType::U8 => "u8",
            ValueType::S8 => "s8",
            ValueType::U16 => "u16",
            ValueType::S16 => "s16",
            ValueType::Bool => "bool",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TypeNode {
    pub span: Span,
    pub value_type: ValueType,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Program {
    pub span: Span,
    pub items: Vec<TopLevel>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TopLevel {
    Variable(VariableDeclaration),
    Function(FunctionDeclaration),
}

/// `var name : type = value;`, or `val` for a constant.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VariableDeclaration {
    pub span: Span,
    pub mutable: bool,
    pub name: Identifier,
    pub value_type: TypeNode,
    pub initial_value: Option<Expression>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Parameter {
    pub name: Identifier,
    pub value_type: TypeNode,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FunctionDeclaration {
    pub span: Span,
    pub name: Identifier,
    pub return_type: Option<TypeNode>,
    pub parameters: Vec<Parameter>,
    pub body: Block,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Block {
    pub span: Span,
    pub statements: Vec<Statement>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Statement {
    Variable(VariableDeclaration),
    Assignment {
        span: Span,
        target: Identifier,
        value: Expression,
    },
    If {
        span: Span,
        condition: Expression,
        body: Block,
        /// Either another `If` or a `Block`.
        otherwise: Option<Box<Statement>>,
    },
    While {
        span: Span,
        condition: Expression,
        body: Block,
    },
    Call {
        span: Span,
        call: FunctionCall,
    },
    Block(Block),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FunctionCall {
    pub span: Span,
    pub name: Identifier,
    pub arguments: Vec<Expression>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Complement,
}

impl UnaryOperator {
    pub const ALL: [UnaryOperator; 3] = [UnaryOperator::Plus, UnaryOperator::Minus, UnaryOperator::Complement];

    pub fn text(self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Complement => "~",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BinaryOperator {
    Plus,
    Minus,
    BoolOr,
    BoolAnd,
    Or,
    And,
    Xor,
    ShiftLeft,
    SignedShiftRight,
    ShiftRight,
    GreaterEquals,
    Greater,
    LesserEquals,
    Lesser,
    Equals,
}

impl BinaryOperator {
    /// Match order. Longer operators come before their prefixes.
    pub const ALL: [BinaryOperator; 15] = [
        BinaryOperator::Plus,
        BinaryOperator::Minus,
        BinaryOperator::BoolOr,
        BinaryOperator::BoolAnd,
        BinaryOperator::Or,
        BinaryOperator::And,
        BinaryOperator::Xor,
        BinaryOperator::ShiftLeft,
        BinaryOperator::SignedShiftRight,
        BinaryOperator::ShiftRight,
        BinaryOperator::GreaterEquals,
        BinaryOperator::Greater,
        BinaryOperator::LesserEquals,
        BinaryOperator::Lesser,
        BinaryOperator::Equals,
    ];

    pub fn text(self) -> &'static str {
        use BinaryOperator::*;
        match self {
            Plus => "+",
            Minus => "-",
            BoolOr => "||",
            BoolAnd => "&&",
            Or => "|",
            And => "&",
            Xor => "^",
            ShiftLeft => "<<",
            SignedShiftRight => ">>>",
            ShiftRight => ">>",
            GreaterEquals => ">=",
            Greater => ">",
            LesserEquals => "<=",
            Lesser => "<",
            Equals => "==",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Expression {
    Literal {
        span: Span,
        value: i64,
    },
    Boolean {
        span: Span,
        value: bool,
    },
    Unary {
        span: Span,
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    /// Binary expressions nest to the right and have no precedence.
    Binary {
        span: Span,
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    Paren {
        span: Span,
        inner: Box<Expression>,
    },
    Call(FunctionCall),
    Field(Identifier),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal { span, .. }
            | Expression::Boolean { span, .. }
            | Expression::Unary { span, .. }
            | Expression::Binary { span, .. }
            | Expression::Paren { span, .. } => *span,
            Expression::Call(call) => call.span,
            Expression::Field(identifier) => identifier.span,
        }
    }
}
