//! Abstract semantics of statements.
//!
//! Evaluating a statement leaves its candidate expressions in the state's result
//! register. Composite statements combine the candidates of their parts by cartesian
//! product, so every reading a frontend can offer survives to the consumer.

use std::collections::HashSet;

use log::trace;

use crate::error::{AnalysisError, Result};
use crate::expressions::{ArithmeticOperator, BooleanOperator, ComparisonOperator, Expression, UnaryOperator};
use crate::state::State;
use crate::statements::{Operator, Statement, StatementKind};

/// Transfer functions of statements over the state `S`.
///
/// Only [`Semantics::assignment_semantics`] differs between analysis directions; the
/// rest of the dispatch is shared.
pub trait Semantics<S: State> {
    /// Effect of `left = right`, given the candidates of both sides.
    fn assignment_semantics(&self, left: &HashSet<Expression>, right: &HashSet<Expression>, state: &mut S)
        -> Result<()>;

    /// Interpret `statement` in `state`.
    fn semantics(&self, statement: &Statement, state: &mut S) -> Result<()> {
        trace!("{} | {}", statement.pp, statement);
        match &statement.kind {
            StatementKind::Literal(literal) => {
                state.evaluate_literal(literal);
            }
            StatementKind::Variable(variable) => {
                state.access_variable(variable);
            }
            StatementKind::Input(typ) => {
                state.set_result(HashSet::from([Expression::Input(typ.clone())]));
            }
            StatementKind::ListDisplay(items) => {
                let mut displays: Vec<Vec<Expression>> = vec![Vec::new()];
                for item in items {
                    let candidates = self.evaluate(item, state)?;
                    displays = displays
                        .iter()
                        .flat_map(|prefix| {
                            candidates.iter().map(move |candidate| {
                                let mut display = prefix.clone();
                                display.push(candidate.clone());
                                display
                            })
                        })
                        .collect();
                }
                state.set_result(displays.into_iter().map(Expression::ListDisplay).collect());
            }
            StatementKind::Subscription { target, key } => {
                let targets = self.evaluate(target, state)?;
                let keys = self.evaluate(key, state)?;
                state.set_result(product(&targets, &keys, Expression::subscription));
            }
            StatementKind::Call { operator, arguments } => {
                self.call_semantics(operator, arguments, state)?;
            }
            StatementKind::Assignment { left, right } => {
                let left = self.evaluate(left, state)?;
                let right = self.evaluate(right, state)?;
                self.assignment_semantics(&left, &right, state)?;
            }
        }
        Ok(())
    }

    /// Interpret `statement` and move its candidates out of the result register.
    ///
    /// A statement that leaves no candidate (such as a `print`) cannot be used as a value.
    fn evaluate(&self, statement: &Statement, state: &mut S) -> Result<HashSet<Expression>> {
        self.semantics(statement, state)?;
        let candidates = state.take_result();
        if candidates.is_empty() {
            return Err(AnalysisError::Unsupported(format!("`{}` used as a value", statement)));
        }
        Ok(candidates)
    }

    fn call_semantics(&self, operator: &Operator, arguments: &[Statement], state: &mut S) -> Result<()> {
        if let Operator::Named(name) = operator {
            return Err(AnalysisError::Unsupported(format!("call to `{}`", name)));
        }

        let expected = match operator {
            Operator::Neg | Operator::Not | Operator::Print => 1,
            _ => 2,
        };
        if arguments.len() != expected {
            return Err(AnalysisError::Unsupported(format!(
                "`{}` with {} arguments, expected {}",
                operator,
                arguments.len(),
                expected
            )));
        }

        match operator {
            Operator::Print => {
                let output = self.evaluate(&arguments[0], state)?;
                state.output(&output)?;
            }
            Operator::Neg | Operator::Not => {
                let unary = if *operator == Operator::Neg {
                    UnaryOperator::Neg
                } else {
                    UnaryOperator::Not
                };
                let operands = self.evaluate(&arguments[0], state)?;
                let result = operands
                    .into_iter()
                    .map(|operand| Expression::unary(unary, operand))
                    .collect();
                state.set_result(result);
            }
            _ => {
                let build = binary_constructor(operator)
                    .ok_or_else(|| AnalysisError::Unsupported(format!("operator `{}`", operator)))?;
                let left = self.evaluate(&arguments[0], state)?;
                let right = self.evaluate(&arguments[1], state)?;
                state.set_result(product(&left, &right, build));
            }
        }
        Ok(())
    }
}

fn product<F>(left: &HashSet<Expression>, right: &HashSet<Expression>, build: F) -> HashSet<Expression>
where
    F: Fn(Expression, Expression) -> Expression,
{
    left.iter()
        .flat_map(|l| right.iter().map(move |r| (l, r)))
        .map(|(l, r)| build(l.clone(), r.clone()))
        .collect()
}

fn binary_constructor(operator: &Operator) -> Option<fn(Expression, Expression) -> Expression> {
    let build: fn(Expression, Expression) -> Expression = match operator {
        Operator::Add => |l, r| Expression::arithmetic(l, ArithmeticOperator::Add, r),
        Operator::Sub => |l, r| Expression::arithmetic(l, ArithmeticOperator::Sub, r),
        Operator::Mult => |l, r| Expression::arithmetic(l, ArithmeticOperator::Mult, r),
        Operator::Div => |l, r| Expression::arithmetic(l, ArithmeticOperator::Div, r),
        Operator::Eq => |l, r| Expression::comparison(l, ComparisonOperator::Eq, r),
        Operator::NotEq => |l, r| Expression::comparison(l, ComparisonOperator::NotEq, r),
        Operator::Lt => |l, r| Expression::comparison(l, ComparisonOperator::Lt, r),
        Operator::LtE => |l, r| Expression::comparison(l, ComparisonOperator::LtE, r),
        Operator::Gt => |l, r| Expression::comparison(l, ComparisonOperator::Gt, r),
        Operator::GtE => |l, r| Expression::comparison(l, ComparisonOperator::GtE, r),
        Operator::And => |l, r| Expression::boolean(l, BooleanOperator::And, r),
        Operator::Or => |l, r| Expression::boolean(l, BooleanOperator::Or, r),
        Operator::Neg | Operator::Not | Operator::Print | Operator::Named(_) => return None,
    };
    Some(build)
}

/// Forward semantics: assignments overwrite their target.
#[derive(Debug, Default, Clone, Copy)]
pub struct ForwardSemantics;

impl<S: State> Semantics<S> for ForwardSemantics {
    fn assignment_semantics(
        &self,
        left: &HashSet<Expression>,
        right: &HashSet<Expression>,
        state: &mut S,
    ) -> Result<()> {
        state.assign_variable(left, right)?;
        Ok(())
    }
}

/// Backward semantics: assignments substitute their target.
#[derive(Debug, Default, Clone, Copy)]
pub struct BackwardSemantics;

impl<S: State> Semantics<S> for BackwardSemantics {
    fn assignment_semantics(
        &self,
        left: &HashSet<Expression>,
        right: &HashSet<Expression>,
        state: &mut S,
    ) -> Result<()> {
        state.substitute_variable(left, right)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::expressions::{DataType, VariableIdentifier};
    use crate::interval::{ExtendedInt, Interval, IntervalLattice};
    use crate::interval_domain::IntervalState;
    use crate::lattice::Lattice;
    use crate::statements::ProgramPoint;

    fn pp() -> ProgramPoint {
        ProgramPoint::new(1, 0)
    }

    fn x() -> VariableIdentifier {
        VariableIdentifier::int("x")
    }

    fn xs() -> VariableIdentifier {
        VariableIdentifier::new(DataType::list_of(DataType::Integer), "xs")
    }

    fn state() -> IntervalState {
        IntervalState::new([x(), xs()])
    }

    fn var_x() -> Statement {
        Statement::variable(pp(), x())
    }

    #[test]
    fn test_leaves() {
        let mut state = state();
        ForwardSemantics.semantics(&Statement::int(pp(), 4), &mut state).unwrap();
        assert_eq!(state.result(), &HashSet::from([Expression::int(4)]));

        ForwardSemantics.semantics(&var_x(), &mut state).unwrap();
        assert_eq!(state.result(), &HashSet::from([Expression::var(x())]));

        ForwardSemantics
            .semantics(&Statement::input(pp(), DataType::Integer), &mut state)
            .unwrap();
        assert_eq!(state.result(), &HashSet::from([Expression::Input(DataType::Integer)]));
    }

    #[test]
    fn test_binary_call_builds_expression() {
        let mut state = state();
        let stmt = Statement::binary(pp(), var_x(), Operator::Lt, Statement::int(pp(), 10));
        ForwardSemantics.semantics(&stmt, &mut state).unwrap();
        assert_eq!(
            state.result(),
            &HashSet::from([Expression::var(x()).lt(Expression::int(10))])
        );
    }

    #[test]
    fn test_unary_call() {
        let mut state = state();
        let stmt = Statement::call(pp(), Operator::Neg, vec![var_x()]);
        ForwardSemantics.semantics(&stmt, &mut state).unwrap();
        assert_eq!(state.result(), &HashSet::from([Expression::var(x()).neg()]));
    }

    #[test]
    fn test_list_display_and_subscription() {
        let mut state = state();
        let list = Statement::list(pp(), vec![Statement::int(pp(), 1), var_x()]);
        let stmt = Statement::subscription(pp(), list, Statement::int(pp(), 0));
        ForwardSemantics.semantics(&stmt, &mut state).unwrap();

        let display = Expression::ListDisplay(vec![Expression::int(1), Expression::var(x())]);
        assert_eq!(
            state.result(),
            &HashSet::from([Expression::subscription(display, Expression::int(0))])
        );
    }

    #[test]
    fn test_empty_list_display() {
        let mut state = state();
        ForwardSemantics
            .semantics(&Statement::list(pp(), vec![]), &mut state)
            .unwrap();
        assert_eq!(state.result(), &HashSet::from([Expression::ListDisplay(vec![])]));
    }

    #[test]
    fn test_named_call_is_unsupported() {
        let mut state = state();
        let stmt = Statement::call(pp(), Operator::Named("len".to_string()), vec![var_x()]);
        let err = ForwardSemantics.semantics(&stmt, &mut state).unwrap_err();
        assert_eq!(err, AnalysisError::Unsupported("call to `len`".to_string()));
    }

    #[test]
    fn test_wrong_arity_is_unsupported() {
        let mut state = state();
        let stmt = Statement::call(pp(), Operator::Add, vec![var_x()]);
        let err = ForwardSemantics.semantics(&stmt, &mut state).unwrap_err();
        assert!(matches!(err, AnalysisError::Unsupported(_)));
    }

    #[test]
    fn test_print_keeps_store_and_clears_result() {
        let mut state = state();
        let before = state.clone();
        ForwardSemantics
            .semantics(&Statement::print(pp(), var_x()), &mut state)
            .unwrap();
        assert!(state.result().is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_statement_without_value_is_unsupported() {
        let y = VariableIdentifier::int("y");
        let mut state = IntervalState::new([x(), y.clone()]);
        let stmt = Statement::assign(pp(), Statement::variable(pp(), y), Statement::print(pp(), var_x()));
        let err = ForwardSemantics.semantics(&stmt, &mut state).unwrap_err();
        assert_eq!(err, AnalysisError::Unsupported("`print(x)` used as a value".to_string()));

        let nested = Statement::binary(pp(), Statement::print(pp(), var_x()), Operator::Add, Statement::int(pp(), 1));
        let err = BackwardSemantics.semantics(&nested, &mut state).unwrap_err();
        assert!(matches!(err, AnalysisError::Unsupported(_)));
    }

    #[test]
    fn test_forward_assignment() {
        let mut state = state();
        let stmt = Statement::assign(
            pp(),
            var_x(),
            Statement::binary(pp(), Statement::int(pp(), 2), Operator::Mult, Statement::int(pp(), 3)),
        );
        ForwardSemantics.semantics(&stmt, &mut state).unwrap();
        assert_eq!(state.get(&x()), Some(&Interval::constant(6)));
        assert!(state.result().is_empty());
    }

    #[test]
    fn test_backward_assignment() {
        let mut state = state().with(&x(), IntervalLattice::at_least(10));
        let stmt = Statement::assign(
            pp(),
            var_x(),
            Statement::binary(pp(), var_x(), Operator::Sub, Statement::int(pp(), 1)),
        );
        BackwardSemantics.semantics(&stmt, &mut state).unwrap();
        assert_eq!(state.get(&x()), Some(&Interval::new(11, ExtendedInt::PosInf)));
    }

    #[test]
    fn test_assignment_in_bottom_state() {
        let mut state = state();
        state.bottom();
        let stmt = Statement::assign(pp(), var_x(), Statement::int(pp(), 1));
        ForwardSemantics.semantics(&stmt, &mut state).unwrap();
        assert!(state.is_bottom());
    }
}
