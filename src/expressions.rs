//! Abstract expressions.
//!
//! These are the values a [`State`][crate::state::State] keeps in its result register
//! and receives in its primitives. They are a closed sum type: every domain matches
//! on them exhaustively and answers unsupported shapes with an explicit error.

use std::fmt;

use num_bigint::BigInt;

/// Type of a program variable or input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Integer,
    Boolean,
    String,
    List(Box<DataType>),
}

impl DataType {
    pub fn list_of(element: DataType) -> Self {
        DataType::List(Box::new(element))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => write!(f, "int"),
            DataType::Boolean => write!(f, "bool"),
            DataType::String => write!(f, "str"),
            DataType::List(element) => write!(f, "List[{}]", element),
        }
    }
}

/// A typed program variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableIdentifier {
    name: String,
    typ: DataType,
}

impl VariableIdentifier {
    pub fn new(typ: DataType, name: impl Into<String>) -> Self {
        Self { name: name.into(), typ }
    }

    /// Integer variable.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(DataType::Integer, name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn typ(&self) -> &DataType {
        &self.typ
    }
}

impl fmt::Display for VariableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Literal {
    Int(BigInt),
    Bool(bool),
    Str(String),
}

impl Literal {
    pub fn int(value: impl Into<BigInt>) -> Self {
        Literal::Int(value.into())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Bool(true) => write!(f, "True"),
            Literal::Bool(false) => write!(f, "False"),
            Literal::Str(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnaryOperator {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArithmeticOperator {
    Add,
    Sub,
    Mult,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

impl ComparisonOperator {
    /// The operator that holds exactly when `self` does not: `<` becomes `>=`.
    pub fn negate(self) -> Self {
        match self {
            ComparisonOperator::Eq => ComparisonOperator::NotEq,
            ComparisonOperator::NotEq => ComparisonOperator::Eq,
            ComparisonOperator::Lt => ComparisonOperator::GtE,
            ComparisonOperator::LtE => ComparisonOperator::Gt,
            ComparisonOperator::Gt => ComparisonOperator::LtE,
            ComparisonOperator::GtE => ComparisonOperator::Lt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BooleanOperator {
    And,
    Or,
}

impl BooleanOperator {
    /// De Morgan dual.
    pub fn dual(self) -> Self {
        match self {
            BooleanOperator::And => BooleanOperator::Or,
            BooleanOperator::Or => BooleanOperator::And,
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOperator::Neg => write!(f, "-"),
            UnaryOperator::Not => write!(f, "not "),
        }
    }
}

impl fmt::Display for ArithmeticOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArithmeticOperator::Add => "+",
            ArithmeticOperator::Sub => "-",
            ArithmeticOperator::Mult => "*",
            ArithmeticOperator::Div => "/",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComparisonOperator::Eq => "==",
            ComparisonOperator::NotEq => "!=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::LtE => "<=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::GtE => ">=",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for BooleanOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BooleanOperator::And => write!(f, "and"),
            BooleanOperator::Or => write!(f, "or"),
        }
    }
}

/// Abstract expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Expression {
    Literal(Literal),
    Variable(VariableIdentifier),
    /// Value read from the program's input.
    Input(DataType),
    /// List display: `[e1, e2, ...]`
    ListDisplay(Vec<Expression>),
    /// Subscription: `target[key]`
    Subscription {
        target: Box<Expression>,
        key: Box<Expression>,
    },
    Unary {
        operator: UnaryOperator,
        expression: Box<Expression>,
    },
    Arithmetic {
        left: Box<Expression>,
        operator: ArithmeticOperator,
        right: Box<Expression>,
    },
    Comparison {
        left: Box<Expression>,
        operator: ComparisonOperator,
        right: Box<Expression>,
    },
    Boolean {
        left: Box<Expression>,
        operator: BooleanOperator,
        right: Box<Expression>,
    },
}

impl Expression {
    /// Integer literal
    pub fn int(value: impl Into<BigInt>) -> Self {
        Expression::Literal(Literal::int(value))
    }

    /// Boolean literal
    pub fn bool(value: bool) -> Self {
        Expression::Literal(Literal::Bool(value))
    }

    /// Variable reference
    pub fn var(variable: VariableIdentifier) -> Self {
        Expression::Variable(variable)
    }

    pub fn unary(operator: UnaryOperator, expression: Expression) -> Self {
        Expression::Unary {
            operator,
            expression: Box::new(expression),
        }
    }

    pub fn arithmetic(left: Expression, operator: ArithmeticOperator, right: Expression) -> Self {
        Expression::Arithmetic {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn comparison(left: Expression, operator: ComparisonOperator, right: Expression) -> Self {
        Expression::Comparison {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn boolean(left: Expression, operator: BooleanOperator, right: Expression) -> Self {
        Expression::Boolean {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn subscription(target: Expression, key: Expression) -> Self {
        Expression::Subscription {
            target: Box::new(target),
            key: Box::new(key),
        }
    }

    /// Addition: self + other
    pub fn add(self, other: Self) -> Self {
        Expression::arithmetic(self, ArithmeticOperator::Add, other)
    }

    /// Subtraction: self - other
    pub fn sub(self, other: Self) -> Self {
        Expression::arithmetic(self, ArithmeticOperator::Sub, other)
    }

    /// Multiplication: self * other
    pub fn mult(self, other: Self) -> Self {
        Expression::arithmetic(self, ArithmeticOperator::Mult, other)
    }

    /// Negation: -self
    pub fn neg(self) -> Self {
        Expression::unary(UnaryOperator::Neg, self)
    }

    /// Logical negation: not self
    pub fn not(self) -> Self {
        Expression::unary(UnaryOperator::Not, self)
    }

    /// Less than: self < other
    pub fn lt(self, other: Self) -> Self {
        Expression::comparison(self, ComparisonOperator::Lt, other)
    }

    /// Less or equal: self <= other
    pub fn le(self, other: Self) -> Self {
        Expression::comparison(self, ComparisonOperator::LtE, other)
    }

    /// Greater than: self > other
    pub fn gt(self, other: Self) -> Self {
        Expression::comparison(self, ComparisonOperator::Gt, other)
    }

    /// Greater or equal: self >= other
    pub fn ge(self, other: Self) -> Self {
        Expression::comparison(self, ComparisonOperator::GtE, other)
    }

    /// Equality: self == other
    pub fn eq(self, other: Self) -> Self {
        Expression::comparison(self, ComparisonOperator::Eq, other)
    }

    /// Conjunction: self and other
    pub fn and(self, other: Self) -> Self {
        Expression::boolean(self, BooleanOperator::And, other)
    }

    /// Disjunction: self or other
    pub fn or(self, other: Self) -> Self {
        Expression::boolean(self, BooleanOperator::Or, other)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(literal) => write!(f, "{}", literal),
            Expression::Variable(variable) => write!(f, "{}", variable),
            Expression::Input(typ) => write!(f, "input({})", typ),
            Expression::ListDisplay(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Expression::Subscription { target, key } => write!(f, "{}[{}]", target, key),
            Expression::Unary { operator, expression } => write!(f, "{}({})", operator, expression),
            Expression::Arithmetic { left, operator, right } => write!(f, "({} {} {})", left, operator, right),
            Expression::Comparison { left, operator, right } => write!(f, "({} {} {})", left, operator, right),
            Expression::Boolean { left, operator, right } => write!(f, "({} {} {})", left, operator, right),
        }
    }
}
