//! Frontend statements carried by control-flow graph nodes and conditional edges.
//!
//! The engine treats statements as opaque: it only reads their [`ProgramPoint`] and
//! passes them through to a [`Semantics`][crate::semantics::Semantics].

use std::fmt;

use num_bigint::BigInt;

use crate::expressions::{DataType, Literal, VariableIdentifier};

/// Source location `(line, column)` of a statement or of an edge condition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramPoint {
    pub line: u32,
    pub column: u32,
}

impl ProgramPoint {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for ProgramPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Built-in operation invoked by a [`StatementKind::Call`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Neg,
    Not,
    Add,
    Sub,
    Mult,
    Div,
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    And,
    Or,
    /// Writes its single argument to the program's output.
    Print,
    /// Any other function; the default semantics has no transfer function for it.
    Named(String),
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Neg => "neg",
            Operator::Not => "not",
            Operator::Add => "add",
            Operator::Sub => "sub",
            Operator::Mult => "mult",
            Operator::Div => "div",
            Operator::Eq => "eq",
            Operator::NotEq => "noteq",
            Operator::Lt => "lt",
            Operator::LtE => "lte",
            Operator::Gt => "gt",
            Operator::GtE => "gte",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Print => "print",
            Operator::Named(name) => name,
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Literal(Literal),
    Variable(VariableIdentifier),
    /// `input()` of the given type.
    Input(DataType),
    ListDisplay(Vec<Statement>),
    Subscription {
        target: Box<Statement>,
        key: Box<Statement>,
    },
    Call {
        operator: Operator,
        arguments: Vec<Statement>,
    },
    Assignment {
        left: Box<Statement>,
        right: Box<Statement>,
    },
}

/// A statement at a program point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    pub pp: ProgramPoint,
    pub kind: StatementKind,
}

impl Statement {
    pub fn new(pp: ProgramPoint, kind: StatementKind) -> Self {
        Self { pp, kind }
    }

    pub fn literal(pp: ProgramPoint, literal: Literal) -> Self {
        Self::new(pp, StatementKind::Literal(literal))
    }

    /// Integer literal
    pub fn int(pp: ProgramPoint, value: impl Into<BigInt>) -> Self {
        Self::literal(pp, Literal::int(value))
    }

    pub fn variable(pp: ProgramPoint, variable: VariableIdentifier) -> Self {
        Self::new(pp, StatementKind::Variable(variable))
    }

    pub fn input(pp: ProgramPoint, typ: DataType) -> Self {
        Self::new(pp, StatementKind::Input(typ))
    }

    pub fn list(pp: ProgramPoint, items: Vec<Statement>) -> Self {
        Self::new(pp, StatementKind::ListDisplay(items))
    }

    pub fn subscription(pp: ProgramPoint, target: Statement, key: Statement) -> Self {
        Self::new(
            pp,
            StatementKind::Subscription {
                target: Box::new(target),
                key: Box::new(key),
            },
        )
    }

    pub fn call(pp: ProgramPoint, operator: Operator, arguments: Vec<Statement>) -> Self {
        Self::new(pp, StatementKind::Call { operator, arguments })
    }

    /// Binary call: `operator(left, right)`
    pub fn binary(pp: ProgramPoint, left: Statement, operator: Operator, right: Statement) -> Self {
        Self::call(pp, operator, vec![left, right])
    }

    pub fn print(pp: ProgramPoint, argument: Statement) -> Self {
        Self::call(pp, Operator::Print, vec![argument])
    }

    pub fn assign(pp: ProgramPoint, left: Statement, right: Statement) -> Self {
        Self::new(
            pp,
            StatementKind::Assignment {
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StatementKind::Literal(literal) => write!(f, "{}", literal),
            StatementKind::Variable(variable) => write!(f, "{}", variable),
            StatementKind::Input(_) => write!(f, "input()"),
            StatementKind::ListDisplay(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            StatementKind::Subscription { target, key } => write!(f, "{}[{}]", target, key),
            StatementKind::Call { operator, arguments } => {
                write!(f, "{}(", operator)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ")")
            }
            StatementKind::Assignment { left, right } => write!(f, "{} = {}", left, right),
        }
    }
}
