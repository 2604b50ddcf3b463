//! Syntactic expression tree produced by the grammar
//!
//! This is the "host syntax" the analyser walks: it mirrors the source text
//! one-to-one and carries spans for diagnostics. Nothing here is evaluated.

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Literal constant as written in the source
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Literal::None => write!(f, "None"),
            Literal::Bool(true) => write!(f, "True"),
            Literal::Bool(false) => write!(f, "False"),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{}", crate::value::format_float(*x)),
            Literal::Str(s) => write!(f, "{}", crate::value::quote_str(s)),
        }
    }
}

/// Unary operators recognised by the grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    /// `-x`
    Neg,
    /// `+x`
    Pos,
}

/// Binary operators recognised by the grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

/// One argument inside a call's parentheses
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Spanned<Expr>),
    Keyword {
        name: Spanned<String>,
        value: Spanned<Expr>,
    },
}

/// Expression forms of the grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `func(args...)`
    Call {
        func: Box<Spanned<Expr>>,
        args: Vec<Argument>,
    },
    /// A bare identifier
    Name(String),
    /// `value.attr`
    Attribute {
        value: Box<Spanned<Expr>>,
        attr: Spanned<String>,
    },
    /// `[a, b]`
    List(Vec<Spanned<Expr>>),
    /// `(a, b)`
    Tuple(Vec<Spanned<Expr>>),
    Constant(Literal),
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Spanned<Expr>>,
    },
    BinOp {
        op: BinaryOperator,
        left: Box<Spanned<Expr>>,
        right: Box<Spanned<Expr>>,
    },
}
