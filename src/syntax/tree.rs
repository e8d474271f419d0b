//! Syntax tree of a Perlang compilation unit.
//!
//! Expressions carry an [`ExprId`] that is unique within a [`crate::sem::Session`], so
//! bindings recorded for one unit never collide with those of another. Every expression and
//! every declaration owns a [`TypeReference`] which the semantic passes fill in place.
use super::tokenizer::Position;
use crate::sem::{Type, TypeReference};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(usize);

impl ExprId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Allocates expression ids. One generator is shared by every unit parsed in a session.
#[derive(Debug, Default)]
pub struct ExprIdGenerator {
    next: usize,
}

impl ExprIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> ExprId {
        let id = ExprId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// A name as it appears in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub name: String,
    pub position: Position,
}

impl Identifier {
    pub fn new<S: Into<String>>(name: S, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Written type annotation: `int`, `string[]`, `Circle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpecifier {
    pub name: String,
    pub is_array: bool,
    pub position: Position,
}

impl fmt::Display for TypeSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "{}[]", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[derive(Debug)]
pub struct Expr {
    id: ExprId,
    pub kind: ExprKind,
    pub position: Position,
    type_ref: TypeReference,
}

impl Expr {
    pub fn new(id: ExprId, kind: ExprKind, position: Position) -> Self {
        Self {
            id,
            kind,
            position,
            type_ref: TypeReference::inferred(),
        }
    }

    pub fn id(&self) -> ExprId {
        self.id
    }

    pub fn type_ref(&self) -> &TypeReference {
        &self.type_ref
    }

    /// The resolved type, or [`Type::Unresolved`] before (or after a failed) type resolution.
    pub fn r#type(&self) -> Type {
        self.type_ref.r#type()
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(Literal::Null))
    }

    pub fn literal(&self) -> Option<&Literal> {
        if let ExprKind::Literal(literal) = &self.kind {
            Some(literal)
        } else {
            None
        }
    }

    /// Returns the identifier if this is a plain variable reference.
    pub fn identifier(&self) -> Option<&Identifier> {
        if let ExprKind::Identifier(id) = &self.kind {
            Some(id)
        } else {
            None
        }
    }
}

#[derive(Debug)]
pub enum ExprKind {
    Identifier(Identifier),
    Get {
        object: Box<Expr>,
        name: Identifier,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Binary {
        operator: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Logical {
        operator: LogicalOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    UnaryPrefix {
        operator: UnaryOperator,
        operand: Box<Expr>,
    },
    UnaryPostfix {
        operator: PostfixOperator,
        operand: Box<Expr>,
    },
    Index {
        indexee: Box<Expr>,
        argument: Box<Expr>,
    },
    Grouping(Box<Expr>),
    Literal(Literal),
    New {
        class_name: Identifier,
        arguments: Vec<Expr>,
    },
    Collection(Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i128),
    Float(f64),
    String(String),
    Char(char),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    ShiftLeft,
    ShiftRight,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    AddAssign,
    SubtractAssign,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Less
                | BinaryOperator::LessEqual
                | BinaryOperator::Greater
                | BinaryOperator::GreaterEqual
        )
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOperator::Equal | BinaryOperator::NotEqual)
    }

    pub fn is_compound_assignment(&self) -> bool {
        matches!(
            self,
            BinaryOperator::AddAssign | BinaryOperator::SubtractAssign
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lexeme = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "**",
            BinaryOperator::ShiftLeft => "<<",
            BinaryOperator::ShiftRight => ">>",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::AddAssign => "+=",
            BinaryOperator::SubtractAssign => "-=",
        };
        write!(f, "{}", lexeme)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalOperator::And => write!(f, "&&"),
            LogicalOperator::Or => write!(f, "||"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixOperator {
    Increment,
    Decrement,
}

impl fmt::Display for PostfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostfixOperator::Increment => write!(f, "++"),
            PostfixOperator::Decrement => write!(f, "--"),
        }
    }
}

#[derive(Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub position: Position,
}

impl Stmt {
    pub fn new(kind: StmtKind, position: Position) -> Self {
        Self { kind, position }
    }
}

#[derive(Debug)]
pub enum StmtKind {
    Block(Vec<Stmt>),
    Class(Class),
    Expression(Expr),
    Function(Function),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    Print(Expr),
    Return(Option<Expr>),
    Var(Var),
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    Enum(Enum),
}

#[derive(Debug)]
pub struct Var {
    pub name: Identifier,
    pub type_ref: TypeReference,
    pub initializer: Option<Expr>,
}

#[derive(Debug)]
pub struct Parameter {
    pub name: Identifier,
    pub type_ref: TypeReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Unspecified,
    Public,
    Private,
}

#[derive(Debug)]
pub struct Function {
    pub name: Identifier,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeReference,
    pub body: Vec<Stmt>,
    pub visibility: Visibility,
    pub is_constructor: bool,
}

#[derive(Debug)]
pub struct Field {
    pub name: Identifier,
    pub type_ref: TypeReference,
    pub initializer: Option<Expr>,
    pub visibility: Visibility,
    pub is_mutable: bool,
}

#[derive(Debug)]
pub struct Class {
    pub name: Identifier,
    pub visibility: Visibility,
    pub fields: Vec<Field>,
    /// Methods and constructors in declaration order.
    pub methods: Vec<Function>,
}

impl Class {
    pub fn constructors(&self) -> impl Iterator<Item = &Function> {
        self.methods.iter().filter(|m| m.is_constructor)
    }
}

#[derive(Debug)]
pub struct Enum {
    pub name: Identifier,
    pub members: Vec<EnumMember>,
    /// Integer type wide enough for every member value; set by type resolution.
    pub underlying_type: TypeReference,
}

#[derive(Debug)]
pub struct EnumMember {
    pub name: Identifier,
    pub initializer: Option<Expr>,
    pub value: Option<i128>,
}
