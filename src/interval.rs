//! Interval abstract domain.
//!
//! An [`Interval`] `[lower, upper]` over extended integers `{-∞} ∪ ℤ ∪ {+∞}` stands
//! for every integer between its bounds. An interval with `lower > upper` is empty,
//! and the empty interval is the domain's ⊥. Finite bounds are arbitrary precision,
//! so interval arithmetic never overflows.
//!
//! [`IntervalLattice`] lifts intervals to the [`Lattice`] contract, and
//! [`IntervalLattice::evaluate`] folds variable-free expressions into intervals.

use std::cmp::{max, min};
use std::fmt;

use num_bigint::BigInt;

use crate::error::{AnalysisError, Result};
use crate::expressions::{
    ArithmeticOperator, BooleanOperator, ComparisonOperator, Expression, Literal, UnaryOperator,
    VariableIdentifier,
};
use crate::lattice::Lattice;

/// Bound of an interval: -∞, an integer, or +∞.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExtendedInt {
    NegInf,
    Finite(BigInt),
    PosInf,
}

impl ExtendedInt {
    pub fn zero() -> Self {
        ExtendedInt::Finite(BigInt::from(0))
    }

    pub fn as_finite(&self) -> Option<&BigInt> {
        match self {
            ExtendedInt::Finite(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, ExtendedInt::Finite(n) if *n == BigInt::from(0))
    }

    /// Sum of two bounds; `None` for `-∞ + +∞`.
    pub fn checked_add(&self, other: &ExtendedInt) -> Option<ExtendedInt> {
        match (self, other) {
            (ExtendedInt::Finite(a), ExtendedInt::Finite(b)) => Some(ExtendedInt::Finite(a + b)),
            (ExtendedInt::NegInf, ExtendedInt::PosInf) | (ExtendedInt::PosInf, ExtendedInt::NegInf) => None,
            (ExtendedInt::NegInf, _) | (_, ExtendedInt::NegInf) => Some(ExtendedInt::NegInf),
            (ExtendedInt::PosInf, _) | (_, ExtendedInt::PosInf) => Some(ExtendedInt::PosInf),
        }
    }

    /// Difference of two bounds; `None` for `∞ - ∞`.
    pub fn checked_sub(&self, other: &ExtendedInt) -> Option<ExtendedInt> {
        self.checked_add(&other.neg())
    }

    /// Product of two bounds, with `0 · ±∞ = 0`.
    pub fn mul(&self, other: &ExtendedInt) -> ExtendedInt {
        match (self, other) {
            (ExtendedInt::Finite(a), ExtendedInt::Finite(b)) => ExtendedInt::Finite(a * b),
            _ if self.is_zero() || other.is_zero() => ExtendedInt::zero(),
            _ => {
                let negative = (*self < ExtendedInt::zero()) != (*other < ExtendedInt::zero());
                if negative {
                    ExtendedInt::NegInf
                } else {
                    ExtendedInt::PosInf
                }
            }
        }
    }

    pub fn neg(&self) -> ExtendedInt {
        match self {
            ExtendedInt::NegInf => ExtendedInt::PosInf,
            ExtendedInt::Finite(n) => ExtendedInt::Finite(-n),
            ExtendedInt::PosInf => ExtendedInt::NegInf,
        }
    }
}

impl From<i32> for ExtendedInt {
    fn from(value: i32) -> Self {
        ExtendedInt::Finite(BigInt::from(value))
    }
}

impl From<i64> for ExtendedInt {
    fn from(value: i64) -> Self {
        ExtendedInt::Finite(BigInt::from(value))
    }
}

impl From<BigInt> for ExtendedInt {
    fn from(value: BigInt) -> Self {
        ExtendedInt::Finite(value)
    }
}

impl fmt::Display for ExtendedInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtendedInt::NegInf => write!(f, "-∞"),
            ExtendedInt::Finite(n) => write!(f, "{}", n),
            ExtendedInt::PosInf => write!(f, "+∞"),
        }
    }
}

/// Closed interval `[lower, upper]`.
///
/// Bounds are inclusive for finite values only: `[-∞, -∞]` and `[+∞, +∞]` hold no
/// integer and are empty. Every empty interval is normalized to the canonical
/// `[+∞, -∞]`, so structural equality coincides with equality of the denoted sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    lower: ExtendedInt,
    upper: ExtendedInt,
}

impl Interval {
    pub fn new(lower: impl Into<ExtendedInt>, upper: impl Into<ExtendedInt>) -> Self {
        let mut interval = Self {
            lower: lower.into(),
            upper: upper.into(),
        };
        interval.normalize();
        interval
    }

    pub fn constant(value: impl Into<BigInt>) -> Self {
        let value = ExtendedInt::Finite(value.into());
        Self {
            lower: value.clone(),
            upper: value,
        }
    }

    pub fn top() -> Self {
        Self {
            lower: ExtendedInt::NegInf,
            upper: ExtendedInt::PosInf,
        }
    }

    pub fn empty() -> Self {
        Self {
            lower: ExtendedInt::PosInf,
            upper: ExtendedInt::NegInf,
        }
    }

    /// The truth values `[0, 1]`.
    pub fn boolean() -> Self {
        Self::new(0, 1)
    }

    pub fn lower(&self) -> &ExtendedInt {
        &self.lower
    }

    pub fn upper(&self) -> &ExtendedInt {
        &self.upper
    }

    pub fn is_empty(&self) -> bool {
        self.lower > self.upper || self.lower == ExtendedInt::PosInf || self.upper == ExtendedInt::NegInf
    }

    pub fn is_top(&self) -> bool {
        self.lower == ExtendedInt::NegInf && self.upper == ExtendedInt::PosInf
    }

    pub fn contains(&self, value: &BigInt) -> bool {
        let value = ExtendedInt::Finite(value.clone());
        self.lower <= value && value <= self.upper
    }

    /// The single value of a point interval.
    pub fn as_constant(&self) -> Option<&BigInt> {
        let lower = self.lower.as_finite()?;
        (Some(lower) == self.upper.as_finite()).then_some(lower)
    }

    fn normalize(&mut self) {
        if self.is_empty() {
            *self = Self::empty();
        }
    }

    fn set(&mut self, lower: ExtendedInt, upper: ExtendedInt) -> &mut Self {
        self.lower = lower;
        self.upper = upper;
        self.normalize();
        self
    }

    /// `[l1 + l2, u1 + u2]`
    pub fn add(&mut self, other: &Interval) -> &mut Self {
        if self.is_empty() || other.is_empty() {
            return self.set(ExtendedInt::PosInf, ExtendedInt::NegInf);
        }
        let lower = self.lower.checked_add(&other.lower).unwrap_or(ExtendedInt::NegInf);
        let upper = self.upper.checked_add(&other.upper).unwrap_or(ExtendedInt::PosInf);
        self.set(lower, upper)
    }

    /// `[l1 - u2, u1 - l2]`
    pub fn sub(&mut self, other: &Interval) -> &mut Self {
        if self.is_empty() || other.is_empty() {
            return self.set(ExtendedInt::PosInf, ExtendedInt::NegInf);
        }
        let lower = self.lower.checked_sub(&other.upper).unwrap_or(ExtendedInt::NegInf);
        let upper = self.upper.checked_sub(&other.lower).unwrap_or(ExtendedInt::PosInf);
        self.set(lower, upper)
    }

    /// Minimum and maximum of the four corner products.
    pub fn mult(&mut self, other: &Interval) -> &mut Self {
        if self.is_empty() || other.is_empty() {
            return self.set(ExtendedInt::PosInf, ExtendedInt::NegInf);
        }
        let corners = [
            self.lower.mul(&other.lower),
            self.lower.mul(&other.upper),
            self.upper.mul(&other.lower),
            self.upper.mul(&other.upper),
        ];
        let lower = corners.iter().min().cloned().unwrap_or(ExtendedInt::NegInf);
        let upper = corners.iter().max().cloned().unwrap_or(ExtendedInt::PosInf);
        self.set(lower, upper)
    }

    /// `[-u, -l]`
    pub fn negate(&mut self) -> &mut Self {
        if self.is_empty() {
            return self;
        }
        let lower = self.upper.neg();
        let upper = self.lower.neg();
        self.set(lower, upper)
    }

    fn check_comparable(&self, other: &Interval) -> Result<()> {
        for interval in [self, other] {
            if interval.is_empty() {
                return Err(AnalysisError::EmptyInterval(interval.to_string()));
            }
        }
        Ok(())
    }

    /// Every value of `self` is smaller than every value of `other`.
    pub fn lt(&self, other: &Interval) -> Result<bool> {
        self.check_comparable(other)?;
        Ok(self.upper < other.lower)
    }

    /// Every value of `self` is smaller than or equal to every value of `other`.
    pub fn le(&self, other: &Interval) -> Result<bool> {
        self.check_comparable(other)?;
        Ok(self.upper <= other.lower)
    }

    /// Every value of `self` is greater than every value of `other`.
    pub fn gt(&self, other: &Interval) -> Result<bool> {
        other.lt(self)
    }

    /// Every value of `self` is greater than or equal to every value of `other`.
    pub fn ge(&self, other: &Interval) -> Result<bool> {
        other.le(self)
    }

    /// Convex hull.
    pub fn hull(&mut self, other: &Interval) -> &mut Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            *self = other.clone();
            return self;
        }
        let lower = min(&self.lower, &other.lower).clone();
        let upper = max(&self.upper, &other.upper).clone();
        self.set(lower, upper)
    }

    /// Intersection; empty when the intervals are disjoint.
    pub fn intersect(&mut self, other: &Interval) -> &mut Self {
        let lower = max(&self.lower, &other.lower).clone();
        let upper = min(&self.upper, &other.upper).clone();
        self.set(lower, upper)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "⊥")
        } else {
            write!(f, "[{}, {}]", self.lower, self.upper)
        }
    }
}

/// Interval lattice: ⊥ is the empty interval, ⊤ is `[-∞, +∞]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntervalLattice {
    interval: Interval,
}

impl IntervalLattice {
    pub fn new(lower: impl Into<ExtendedInt>, upper: impl Into<ExtendedInt>) -> Self {
        Self {
            interval: Interval::new(lower, upper),
        }
    }

    pub fn constant(value: impl Into<BigInt>) -> Self {
        Interval::constant(value).into()
    }

    /// `[value, +∞]`
    pub fn at_least(value: impl Into<ExtendedInt>) -> Self {
        Self::new(value, ExtendedInt::PosInf)
    }

    /// `[-∞, value]`
    pub fn at_most(value: impl Into<ExtendedInt>) -> Self {
        Self::new(ExtendedInt::NegInf, value)
    }

    pub fn top_element() -> Self {
        Interval::top().into()
    }

    pub fn bottom_element() -> Self {
        Interval::empty().into()
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    /// Fold a variable-free expression into an interval.
    ///
    /// Inputs and subscriptions are ⊤, division is ⊤, and list displays are the
    /// join of their items. A variable identifier is an error.
    pub fn evaluate(expression: &Expression) -> Result<IntervalLattice> {
        evaluate_in(expression, &Constants).map(IntervalLattice::from)
    }
}

impl From<Interval> for IntervalLattice {
    fn from(interval: Interval) -> Self {
        Self { interval }
    }
}

impl fmt::Display for IntervalLattice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.interval)
    }
}

impl Lattice for IntervalLattice {
    fn bottom(&mut self) -> &mut Self {
        self.interval = Interval::empty();
        self
    }

    fn top(&mut self) -> &mut Self {
        self.interval = Interval::top();
        self
    }

    fn is_bottom(&self) -> bool {
        self.interval.is_empty()
    }

    fn is_top(&self) -> bool {
        self.interval.is_top()
    }

    fn less_equal_kernel(&self, other: &Self) -> bool {
        other.interval.lower <= self.interval.lower && self.interval.upper <= other.interval.upper
    }

    fn join_kernel(&mut self, other: &Self) -> &mut Self {
        self.interval.hull(&other.interval);
        self
    }

    fn meet_kernel(&mut self, other: &Self) -> &mut Self {
        self.interval.intersect(&other.interval);
        self
    }

    fn widening_kernel(&mut self, other: &Self) -> &mut Self {
        let lower = if other.interval.lower < self.interval.lower {
            ExtendedInt::NegInf
        } else {
            self.interval.lower.clone()
        };
        let upper = if other.interval.upper > self.interval.upper {
            ExtendedInt::PosInf
        } else {
            self.interval.upper.clone()
        };
        self.interval.set(lower, upper);
        self
    }
}

/// Where [`evaluate_in`] reads variables and subscriptions from.
pub(crate) trait Environment {
    fn variable(&self, variable: &VariableIdentifier) -> Result<Interval>;

    /// Value of `target[key]`, given the value of `target`.
    fn subscription(&self, target: &Interval) -> Interval;
}

/// Environment of constant folding: no variables, unknown indices.
struct Constants;

impl Environment for Constants {
    fn variable(&self, variable: &VariableIdentifier) -> Result<Interval> {
        Err(AnalysisError::FreeVariable(variable.name().to_string()))
    }

    fn subscription(&self, _target: &Interval) -> Interval {
        Interval::top()
    }
}

pub(crate) fn evaluate_literal(literal: &Literal) -> Interval {
    match literal {
        Literal::Int(n) => Interval::constant(n.clone()),
        Literal::Bool(true) => Interval::constant(1),
        Literal::Bool(false) => Interval::constant(0),
        Literal::Str(_) => Interval::top(),
    }
}

/// Evaluate `expression` bottom-up, reading leaves from `env`.
pub(crate) fn evaluate_in<E: Environment>(expression: &Expression, env: &E) -> Result<Interval> {
    let value = match expression {
        Expression::Literal(literal) => evaluate_literal(literal),
        Expression::Variable(variable) => env.variable(variable)?,
        Expression::Input(_) => Interval::top(),
        Expression::ListDisplay(items) => {
            let mut value = Interval::empty();
            for item in items {
                value.hull(&evaluate_in(item, env)?);
            }
            value
        }
        Expression::Subscription { target, key } => {
            let target = evaluate_in(target, env)?;
            let key = evaluate_in(key, env)?;
            if target.is_empty() || key.is_empty() {
                Interval::empty()
            } else {
                env.subscription(&target)
            }
        }
        Expression::Unary { operator, expression } => {
            let mut value = evaluate_in(expression, env)?;
            match operator {
                UnaryOperator::Neg => {
                    value.negate();
                    value
                }
                UnaryOperator::Not => negate_truth(&value),
            }
        }
        Expression::Arithmetic { left, operator, right } => {
            let mut value = evaluate_in(left, env)?;
            let right = evaluate_in(right, env)?;
            match operator {
                ArithmeticOperator::Add => {
                    value.add(&right);
                }
                ArithmeticOperator::Sub => {
                    value.sub(&right);
                }
                ArithmeticOperator::Mult => {
                    value.mult(&right);
                }
                ArithmeticOperator::Div => {
                    if !value.is_empty() && !right.is_empty() {
                        value = Interval::top();
                    } else {
                        value = Interval::empty();
                    }
                }
            }
            value
        }
        Expression::Comparison { left, operator, right } => {
            let left = evaluate_in(left, env)?;
            let right = evaluate_in(right, env)?;
            compare(&left, *operator, &right)?
        }
        Expression::Boolean { left, operator, right } => {
            let left = evaluate_in(left, env)?;
            let right = evaluate_in(right, env)?;
            connect(&left, *operator, &right)
        }
    };
    Ok(value)
}

fn truth(value: bool) -> Interval {
    Interval::constant(if value { 1 } else { 0 })
}

fn is_false(value: &Interval) -> bool {
    value.as_constant().is_some_and(|n| *n == BigInt::from(0))
}

/// A value is definitely true when it cannot be 0.
fn is_true(value: &Interval) -> bool {
    !value.is_empty() && !value.contains(&BigInt::from(0))
}

fn negate_truth(value: &Interval) -> Interval {
    if value.is_empty() {
        Interval::empty()
    } else if is_true(value) {
        truth(false)
    } else if is_false(value) {
        truth(true)
    } else {
        Interval::boolean()
    }
}

fn compare(left: &Interval, operator: ComparisonOperator, right: &Interval) -> Result<Interval> {
    if left.is_empty() || right.is_empty() {
        return Ok(Interval::empty());
    }
    let (holds, fails) = match operator {
        ComparisonOperator::Lt => (left.lt(right)?, left.ge(right)?),
        ComparisonOperator::LtE => (left.le(right)?, left.gt(right)?),
        ComparisonOperator::Gt => (left.gt(right)?, left.le(right)?),
        ComparisonOperator::GtE => (left.ge(right)?, left.lt(right)?),
        ComparisonOperator::Eq | ComparisonOperator::NotEq => {
            let same = left.as_constant().is_some() && left == right;
            let mut common = left.clone();
            common.intersect(right);
            let disjoint = common.is_empty();
            if operator == ComparisonOperator::Eq {
                (same, disjoint)
            } else {
                (disjoint, same)
            }
        }
    };
    Ok(if holds {
        truth(true)
    } else if fails {
        truth(false)
    } else {
        Interval::boolean()
    })
}

fn connect(left: &Interval, operator: BooleanOperator, right: &Interval) -> Interval {
    if left.is_empty() || right.is_empty() {
        return Interval::empty();
    }
    match operator {
        BooleanOperator::And if is_false(left) || is_false(right) => truth(false),
        BooleanOperator::And if is_true(left) && is_true(right) => truth(true),
        BooleanOperator::Or if is_true(left) || is_true(right) => truth(true),
        BooleanOperator::Or if is_false(left) && is_false(right) => truth(false),
        _ => Interval::boolean(),
    }
}
