//! Interval analysis state: one interval per program variable.
//!
//! Conditions are refined rather than just evaluated: `assume(x < 10)` shrinks the
//! interval of `x`. Every condition is first rewritten into a negation-free formula
//! over atoms `e ≤ 0`, then each atom pushes the target `[-∞, 0]` down the
//! expression tree, inverting `+`, `-` and unary `-` on the way.

use std::collections::HashSet;
use std::fmt;

use log::trace;

use crate::error::{AnalysisError, Result};
use crate::expressions::{
    ArithmeticOperator, BooleanOperator, ComparisonOperator, DataType, Expression, Literal, UnaryOperator,
    VariableIdentifier,
};
use crate::interval::{evaluate_in, evaluate_literal, Environment, ExtendedInt, Interval, IntervalLattice};
use crate::lattice::{Bottomed, Lattice};
use crate::state::State;
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalState {
    store: Bottomed<Store<IntervalLattice>>,
    result: HashSet<Expression>,
}

impl IntervalState {
    /// Create a state where every variable is unconstrained.
    pub fn new(variables: impl IntoIterator<Item = VariableIdentifier>) -> Self {
        Self {
            store: Bottomed::new(Store::new(variables, |_| IntervalLattice::top_element())),
            result: HashSet::new(),
        }
    }

    pub fn store(&self) -> &Store<IntervalLattice> {
        self.store.inner()
    }

    pub fn store_mut(&mut self) -> &mut Store<IntervalLattice> {
        self.store.inner_mut()
    }

    /// Interval of `variable`, if it is one of the state's variables.
    pub fn get(&self, variable: &VariableIdentifier) -> Option<&Interval> {
        self.store().get(variable).map(IntervalLattice::interval)
    }

    /// Builder-style override of a single variable.
    pub fn with(mut self, variable: &VariableIdentifier, value: IntervalLattice) -> Self {
        self.store_mut().set(variable, value);
        self
    }

    /// Evaluate `expression` against the current store.
    pub fn evaluate(&self, expression: &Expression) -> Result<Interval> {
        evaluate_in(expression, &StoreEnvironment(self.store()))
    }

    fn target_variable<'e>(&self, left: &'e Expression) -> Result<&'e VariableIdentifier> {
        match left {
            Expression::Variable(variable) if self.store().contains(variable) => Ok(variable),
            Expression::Variable(variable) => Err(AnalysisError::UnknownVariable(variable.name().to_string())),
            _ => Err(AnalysisError::Unsupported(format!("assignment to `{}`", left))),
        }
    }
}

impl Lattice for IntervalState {
    fn bottom(&mut self) -> &mut Self {
        self.store.bottom();
        self
    }

    fn top(&mut self) -> &mut Self {
        self.store.top();
        self
    }

    fn is_bottom(&self) -> bool {
        self.store.is_bottom()
    }

    fn is_top(&self) -> bool {
        self.store.is_top()
    }

    fn less_equal_kernel(&self, other: &Self) -> bool {
        self.store.less_equal(&other.store)
    }

    fn join_kernel(&mut self, other: &Self) -> &mut Self {
        self.store.join(&other.store);
        self
    }

    fn meet_kernel(&mut self, other: &Self) -> &mut Self {
        self.store.meet(&other.store);
        self
    }

    fn widening_kernel(&mut self, other: &Self) -> &mut Self {
        self.store.widening(&other.store);
        self
    }
}

impl State for IntervalState {
    fn result(&self) -> &HashSet<Expression> {
        &self.result
    }

    fn result_mut(&mut self) -> &mut HashSet<Expression> {
        &mut self.result
    }

    fn access_variable_kernel(&self, variable: &VariableIdentifier) -> HashSet<Expression> {
        HashSet::from([Expression::Variable(variable.clone())])
    }

    fn evaluate_literal_kernel(&self, literal: &Literal) -> HashSet<Expression> {
        HashSet::from([Expression::Literal(literal.clone())])
    }

    fn assign_kernel(&mut self, left: &Expression, right: &Expression) -> Result<()> {
        let variable = self.target_variable(left)?.clone();
        let mut value = self.evaluate(right)?;
        if is_empty_list(right) {
            // An empty list has no element summary, but it is still a value.
            value = Interval::top();
        }
        trace!("{} := {} ~> {}", variable, right, value);
        self.store_mut().set(&variable, value.into());
        Ok(())
    }

    fn assume_kernel(&mut self, condition: &Expression) -> Result<()> {
        let formula = normalize(condition, false);
        trace!("assume {} as {:?}", condition, formula);
        formula.apply(&mut self.store)
    }

    fn output_kernel(&mut self, _output: &Expression) -> Result<()> {
        Ok(())
    }

    fn substitute_kernel(&mut self, left: &Expression, right: &Expression) -> Result<()> {
        let variable = self.target_variable(left)?.clone();
        let target = self
            .get(&variable)
            .cloned()
            .unwrap_or_else(Interval::top);
        self.store_mut().set(&variable, IntervalLattice::top_element());
        if !is_empty_list(right) {
            refine(&mut self.store, right, &target)?;
        }
        trace!("{} <- {} ~> {}", variable, right, self);
        Ok(())
    }
}

impl fmt::Display for IntervalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom() {
            write!(f, "⊥")
        } else {
            write!(f, "{}", self.store())
        }
    }
}

fn is_empty_list(expression: &Expression) -> bool {
    matches!(expression, Expression::ListDisplay(items) if items.is_empty())
}

/// Variables read their store element; a list variable holds its element summary.
struct StoreEnvironment<'a>(&'a Store<IntervalLattice>);

impl Environment for StoreEnvironment<'_> {
    fn variable(&self, variable: &VariableIdentifier) -> Result<Interval> {
        self.0
            .get(variable)
            .map(|value| value.interval().clone())
            .ok_or_else(|| AnalysisError::UnknownVariable(variable.name().to_string()))
    }

    fn subscription(&self, target: &Interval) -> Interval {
        target.clone()
    }
}

/// Negation-free condition over atoms `e ≤ 0`.
#[derive(Debug)]
enum Formula {
    Atom(Expression),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    /// Nothing to refine.
    Opaque,
}

impl Formula {
    fn apply(&self, store: &mut Bottomed<Store<IntervalLattice>>) -> Result<()> {
        match self {
            Formula::Atom(expression) => refine(store, expression, &Interval::new(ExtendedInt::NegInf, 0)),
            Formula::And(left, right) => {
                left.apply(store)?;
                right.apply(store)
            }
            Formula::Or(left, right) => {
                let mut other = store.clone();
                left.apply(store)?;
                right.apply(&mut other)?;
                store.join(&other);
                Ok(())
            }
            Formula::Opaque => Ok(()),
        }
    }
}

fn atom(left: &Expression, right: &Expression, strict: bool) -> Formula {
    let difference = left.clone().sub(right.clone());
    if strict {
        Formula::Atom(difference.add(Expression::int(1)))
    } else {
        Formula::Atom(difference)
    }
}

/// Rewrite `condition` (or its negation, if `negated`) into a [`Formula`].
fn normalize(condition: &Expression, negated: bool) -> Formula {
    match condition {
        Expression::Comparison { left, operator, right } => {
            let operator = if negated { operator.negate() } else { *operator };
            match operator {
                ComparisonOperator::Lt => atom(left, right, true),
                ComparisonOperator::LtE => atom(left, right, false),
                ComparisonOperator::Gt => atom(right, left, true),
                ComparisonOperator::GtE => atom(right, left, false),
                ComparisonOperator::Eq => Formula::And(
                    Box::new(atom(left, right, false)),
                    Box::new(atom(right, left, false)),
                ),
                ComparisonOperator::NotEq => Formula::Or(
                    Box::new(atom(left, right, true)),
                    Box::new(atom(right, left, true)),
                ),
            }
        }
        Expression::Boolean { left, operator, right } => {
            let operator = if negated { operator.dual() } else { *operator };
            let left = Box::new(normalize(left, negated));
            let right = Box::new(normalize(right, negated));
            match operator {
                BooleanOperator::And => Formula::And(left, right),
                BooleanOperator::Or => Formula::Or(left, right),
            }
        }
        Expression::Unary {
            operator: UnaryOperator::Not,
            expression,
        } => normalize(expression, !negated),
        Expression::Variable(variable) if *variable.typ() == DataType::Boolean => truth_atom(condition, negated),
        Expression::Literal(Literal::Bool(_)) => truth_atom(condition, negated),
        _ => Formula::Opaque,
    }
}

/// `v` as `1 - v ≤ 0`, and `not v` as `v ≤ 0`.
fn truth_atom(value: &Expression, negated: bool) -> Formula {
    if negated {
        Formula::Atom(value.clone())
    } else {
        Formula::Atom(Expression::int(1).sub(value.clone()))
    }
}

/// Shrink the store so that `expression` can only evaluate inside `target`.
///
/// The store becomes ⊥ when that is impossible, even if it has no variables to shrink.
fn refine(store: &mut Bottomed<Store<IntervalLattice>>, expression: &Expression, target: &Interval) -> Result<()> {
    if store.is_bottom() {
        return Ok(());
    }
    if target.is_empty() {
        store.bottom();
        return Ok(());
    }

    match expression {
        Expression::Variable(variable) => {
            let mut value = StoreEnvironment(store.inner()).variable(variable)?;
            value.intersect(target);
            store.inner_mut().set(variable, value.into());
        }
        Expression::Unary {
            operator: UnaryOperator::Neg,
            expression,
        } => {
            let mut negated = target.clone();
            negated.negate();
            refine(store, expression, &negated)?;
        }
        Expression::Arithmetic {
            left,
            operator: operator @ (ArithmeticOperator::Add | ArithmeticOperator::Sub),
            right,
        } => {
            let env = StoreEnvironment(store.inner());
            let left_value = evaluate_in(left, &env)?;
            let right_value = evaluate_in(right, &env)?;

            let mut left_target = target.clone();
            let mut right_target;
            if *operator == ArithmeticOperator::Add {
                // l + r ∈ t  ⟹  l ∈ t - r, r ∈ t - l
                left_target.sub(&right_value);
                right_target = target.clone();
                right_target.sub(&left_value);
            } else {
                // l - r ∈ t  ⟹  l ∈ t + r, r ∈ l - t
                left_target.add(&right_value);
                right_target = left_value;
                right_target.sub(target);
            }
            refine(store, left, &left_target)?;
            refine(store, right, &right_target)?;
        }
        Expression::Literal(literal) => {
            let mut value = evaluate_literal(literal);
            value.intersect(target);
            if value.is_empty() {
                store.bottom();
            }
        }
        _ => {
            let mut value = evaluate_in(expression, &StoreEnvironment(store.inner()))?;
            value.intersect(target);
            if value.is_empty() {
                store.bottom();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;

    fn x() -> VariableIdentifier {
        VariableIdentifier::int("x")
    }

    fn y() -> VariableIdentifier {
        VariableIdentifier::int("y")
    }

    fn b() -> VariableIdentifier {
        VariableIdentifier::new(DataType::Boolean, "b")
    }

    fn state() -> IntervalState {
        IntervalState::new([x(), y(), b()]).with(&b(), IntervalLattice::new(0, 1))
    }

    fn var(v: VariableIdentifier) -> Expression {
        Expression::var(v)
    }

    fn assume(state: &mut IntervalState, condition: Expression) {
        state.assume(&HashSet::from([condition])).unwrap();
    }

    #[test]
    fn test_new_state_is_top() {
        let state = IntervalState::new([x(), y()]);
        assert!(state.is_top());
        assert!(!state.is_bottom());
    }

    #[test]
    fn test_state_without_variables_can_be_bottom() {
        let mut state = IntervalState::new(Vec::new());
        state.bottom();
        assert!(state.is_bottom());
        assert_eq!(state.to_string(), "⊥");
    }

    #[test]
    fn test_assign_evaluates_in_store() {
        let mut state = state().with(&y(), IntervalLattice::new(2, 3));
        state.assign_kernel(&var(x()), &var(y()).mult(Expression::int(2)).add(Expression::int(1))).unwrap();
        assert_eq!(state.get(&x()), Some(&Interval::new(5, 7)));
    }

    #[test]
    fn test_assign_unknown_variable_fails() {
        let mut state = state();
        let z = VariableIdentifier::int("z");
        assert_eq!(
            state.assign_kernel(&var(z.clone()), &Expression::int(1)),
            Err(AnalysisError::UnknownVariable("z".to_string()))
        );
        assert_eq!(
            state.assign_kernel(&var(x()), &var(z)),
            Err(AnalysisError::UnknownVariable("z".to_string()))
        );
    }

    #[test]
    fn test_assign_empty_list_is_not_bottom() {
        let list = VariableIdentifier::new(DataType::list_of(DataType::Integer), "xs");
        let mut state = IntervalState::new([list.clone()]);
        state.assign_kernel(&var(list.clone()), &Expression::ListDisplay(vec![])).unwrap();
        assert!(!state.is_bottom());
        assert_eq!(state.get(&list), Some(&Interval::top()));
    }

    #[test]
    fn test_subscription_reads_list_summary() {
        let list = VariableIdentifier::new(DataType::list_of(DataType::Integer), "xs");
        let mut state = IntervalState::new([list.clone(), x()]);
        let display = Expression::ListDisplay(vec![Expression::int(1), Expression::int(4)]);
        state.assign_kernel(&var(list.clone()), &display).unwrap();
        state
            .assign_kernel(&var(x()), &Expression::subscription(var(list), Expression::int(0)))
            .unwrap();
        assert_eq!(state.get(&x()), Some(&Interval::new(1, 4)));
    }

    #[test]
    fn test_assume_comparisons() {
        let mut s = state();
        assume(&mut s, var(x()).lt(Expression::int(10)));
        assert_eq!(s.get(&x()), Some(&Interval::new(ExtendedInt::NegInf, 9)));

        let mut s = state();
        assume(&mut s, var(x()).ge(Expression::int(3)));
        assert_eq!(s.get(&x()), Some(&Interval::new(3, ExtendedInt::PosInf)));

        let mut s = state();
        assume(&mut s, var(x()).eq(Expression::int(7)));
        assert_eq!(s.get(&x()), Some(&Interval::constant(7)));
    }

    #[test]
    fn test_assume_relates_two_variables() {
        let mut s = state().with(&y(), IntervalLattice::new(0, 5));
        assume(&mut s, var(x()).le(var(y())));
        assert_eq!(s.get(&x()), Some(&Interval::new(ExtendedInt::NegInf, 5)));
        assert_eq!(s.get(&y()), Some(&Interval::new(0, 5)));
    }

    #[test]
    fn test_assume_negation() {
        let mut s = state();
        assume(&mut s, var(x()).lt(Expression::int(10)).not());
        assert_eq!(s.get(&x()), Some(&Interval::new(10, ExtendedInt::PosInf)));
    }

    #[test]
    fn test_assume_de_morgan() {
        let mut s = state();
        // not (x < 0 or x > 5)  ==  x >= 0 and x <= 5
        assume(&mut s, var(x()).lt(Expression::int(0)).or(var(x()).gt(Expression::int(5))).not());
        assert_eq!(s.get(&x()), Some(&Interval::new(0, 5)));
    }

    #[test]
    fn test_assume_disjunction_joins() {
        let mut s = state().with(&x(), IntervalLattice::new(0, 100));
        assume(&mut s, var(x()).lt(Expression::int(3)).or(var(x()).gt(Expression::int(90))));
        assert_eq!(s.get(&x()), Some(&Interval::new(0, 100)));

        let mut s = state().with(&x(), IntervalLattice::new(0, 100));
        assume(&mut s, var(x()).lt(Expression::int(3)).or(var(x()).lt(Expression::int(-5))));
        assert_eq!(s.get(&x()), Some(&Interval::new(0, 2)));
    }

    #[test]
    fn test_assume_not_equal() {
        let mut s = state().with(&x(), IntervalLattice::new(0, 0));
        assume(&mut s, Expression::comparison(var(x()), ComparisonOperator::NotEq, Expression::int(0)));
        assert!(s.is_bottom());
    }

    #[test]
    fn test_assume_contradiction_is_bottom() {
        let mut s = state().with(&x(), IntervalLattice::new(0, 5));
        assume(&mut s, var(x()).gt(Expression::int(5)));
        assert!(s.is_bottom());

        let mut s = state();
        assume(&mut s, Expression::int(3).lt(Expression::int(2)));
        assert!(s.is_bottom());

        let mut s = state();
        assume(&mut s, Expression::bool(false));
        assert!(s.is_bottom());
    }

    #[test]
    fn test_assume_boolean_variable() {
        let mut s = state();
        assume(&mut s, var(b()));
        assert_eq!(s.get(&b()), Some(&Interval::constant(1)));

        let mut s = state();
        assume(&mut s, var(b()).not());
        assert_eq!(s.get(&b()), Some(&Interval::constant(0)));
    }

    #[test]
    fn test_assume_through_negation() {
        let mut s = state();
        assume(&mut s, var(x()).neg().le(Expression::int(-4)));
        assert_eq!(s.get(&x()), Some(&Interval::new(4, ExtendedInt::PosInf)));
    }

    #[test]
    fn test_contradiction_without_variables_is_bottom() {
        let mut s = IntervalState::new(Vec::new());
        assume(&mut s, Expression::bool(false));
        assert!(s.is_bottom());

        let mut s = IntervalState::new(Vec::new());
        assume(&mut s, Expression::int(3).lt(Expression::int(2)));
        assert!(s.is_bottom());

        let mut s = IntervalState::new(Vec::new());
        assume(&mut s, Expression::int(2).lt(Expression::int(3)));
        assert!(!s.is_bottom());
    }

    #[test]
    fn test_substitute_without_other_variables_is_bottom() {
        let mut s = IntervalState::new([y()]).with(&y(), IntervalLattice::new(0, 5));
        s.substitute_kernel(&var(y()), &Expression::int(9)).unwrap();
        assert!(s.is_bottom());
        assert_eq!(s.to_string(), "⊥");
    }

    #[test]
    fn test_opaque_condition_keeps_state() {
        let mut s = state();
        let before = s.clone();
        assume(&mut s, var(x()));
        assert_eq!(s, before);
    }

    #[test]
    fn test_substitute_bounds_the_source() {
        let mut s = state().with(&y(), IntervalLattice::at_most(5));
        s.substitute_kernel(&var(y()), &var(x()).add(Expression::int(1))).unwrap();
        assert_eq!(s.get(&x()), Some(&Interval::new(ExtendedInt::NegInf, 4)));
        assert_eq!(s.get(&y()), Some(&Interval::top()));
    }

    #[test]
    fn test_substitute_unsatisfiable_is_bottom() {
        let mut s = state().with(&y(), IntervalLattice::new(0, 5));
        s.substitute_kernel(&var(y()), &Expression::int(9)).unwrap();
        assert!(s.is_bottom());
    }

    #[test]
    fn test_substitute_non_variable_is_unsupported() {
        let mut s = state();
        let err = s.substitute_kernel(&Expression::int(1), &Expression::int(2)).unwrap_err();
        assert!(matches!(err, AnalysisError::Unsupported(_)));
    }

    #[test]
    fn test_display() {
        let s = IntervalState::new([x(), y()]).with(&x(), IntervalLattice::new(0, 3));
        assert_eq!(s.to_string(), "x -> [0, 3], y -> [-∞, +∞]");
    }
}
