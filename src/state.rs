//! Abstract program state: a lattice element that abstract statements can act upon.
//!
//! Every effect comes in two parts: a *kernel* the concrete domain implements for a
//! single expression (or a single left/right pair), and a provided wrapper the
//! semantics calls with a *set* of candidate expressions. A frontend may offer
//! several equivalent readings of the same construct; the wrapper applies the kernel
//! to a copy of the state for every reading and joins all copies, so the effect holds
//! under at least one of them.

use std::collections::HashSet;

use crate::cfg::EdgeKind;
use crate::error::Result;
use crate::expressions::{Expression, Literal, VariableIdentifier};
use crate::lattice::Lattice;
use crate::statements::ProgramPoint;

pub trait State: Lattice {
    /// Candidate expressions produced by the last evaluated sub-expression.
    fn result(&self) -> &HashSet<Expression>;

    fn result_mut(&mut self) -> &mut HashSet<Expression>;

    fn access_variable_kernel(&self, variable: &VariableIdentifier) -> HashSet<Expression>;

    fn evaluate_literal_kernel(&self, literal: &Literal) -> HashSet<Expression>;

    /// Assign `right` to `left`; a `left` that is not a variable is unsupported.
    fn assign_kernel(&mut self, left: &Expression, right: &Expression) -> Result<()>;

    fn assume_kernel(&mut self, condition: &Expression) -> Result<()>;

    fn output_kernel(&mut self, output: &Expression) -> Result<()>;

    /// Backward dual of [`State::assign_kernel`]: replace `left` by `right`.
    fn substitute_kernel(&mut self, left: &Expression, right: &Expression) -> Result<()>;

    fn set_result(&mut self, result: HashSet<Expression>) -> &mut Self {
        *self.result_mut() = result;
        self
    }

    /// Move the result register out, leaving it empty.
    fn take_result(&mut self) -> HashSet<Expression> {
        std::mem::take(self.result_mut())
    }

    fn access_variable(&mut self, variable: &VariableIdentifier) -> &mut Self {
        let result = self.access_variable_kernel(variable);
        self.set_result(result)
    }

    fn evaluate_literal(&mut self, literal: &Literal) -> &mut Self {
        let result = self.evaluate_literal_kernel(literal);
        self.set_result(result)
    }

    fn assign_variable(&mut self, left: &HashSet<Expression>, right: &HashSet<Expression>) -> Result<&mut Self> {
        let pairs = left.iter().flat_map(|l| right.iter().map(move |r| (l, r)));
        join_copies(self, pairs, |state, (l, r)| state.assign_kernel(l, r))?;
        Ok(self)
    }

    fn assume(&mut self, condition: &HashSet<Expression>) -> Result<&mut Self> {
        join_copies(self, condition.iter(), |state, c| state.assume_kernel(c))?;
        Ok(self)
    }

    fn substitute_variable(&mut self, left: &HashSet<Expression>, right: &HashSet<Expression>) -> Result<&mut Self> {
        let pairs = left.iter().flat_map(|l| right.iter().map(move |r| (l, r)));
        join_copies(self, pairs, |state, (l, r)| state.substitute_kernel(l, r))?;
        Ok(self)
    }

    fn output(&mut self, output: &HashSet<Expression>) -> Result<&mut Self> {
        join_copies(self, output.iter(), |state, o| state.output_kernel(o))?;
        Ok(self)
    }

    /// Assume the current result, then clear it.
    ///
    /// Used on conditional edges, where the value of the condition doubles as the
    /// condition itself.
    fn filter(&mut self) -> Result<&mut Self> {
        let condition = self.take_result();
        self.assume(&condition)
    }

    fn enter_if(&mut self) -> &mut Self {
        self
    }

    fn exit_if(&mut self) -> &mut Self {
        self
    }

    fn enter_loop(&mut self) -> &mut Self {
        self
    }

    fn exit_loop(&mut self) -> &mut Self {
        self
    }

    /// Called right before the statement (or the condition of an edge of `kind`) at `pp`
    /// is interpreted.
    fn next(&mut self, _pp: ProgramPoint, _kind: Option<EdgeKind>) {}
}

/// Replace `state` by the join of copies of it, one per candidate, each with `kernel` applied.
///
/// An unreachable state stays unreachable. The result register is cleared afterwards.
fn join_copies<S, T, I, F>(state: &mut S, candidates: I, mut kernel: F) -> Result<()>
where
    S: State,
    I: IntoIterator<Item = T>,
    F: FnMut(&mut S, T) -> Result<()>,
{
    if state.is_bottom() {
        state.result_mut().clear();
        return Ok(());
    }

    let mut joined = state.clone();
    joined.bottom();
    for candidate in candidates {
        let mut copy = state.clone();
        kernel(&mut copy, candidate)?;
        joined.join(&copy);
    }

    *state = joined;
    state.result_mut().clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::error::AnalysisError;
    use crate::interval::IntervalLattice;
    use crate::interval_domain::IntervalState;

    fn x() -> VariableIdentifier {
        VariableIdentifier::int("x")
    }

    fn set(expressions: impl IntoIterator<Item = Expression>) -> HashSet<Expression> {
        expressions.into_iter().collect()
    }

    #[test]
    fn test_access_variable_sets_result() {
        let mut state = IntervalState::new([x()]);
        state.access_variable(&x());
        assert_eq!(state.result(), &set([Expression::var(x())]));
    }

    #[test]
    fn test_assignment_joins_all_readings() {
        let mut state = IntervalState::new([x()]);
        let left = set([Expression::var(x())]);
        let right = set([Expression::int(1), Expression::int(5)]);
        state.assign_variable(&left, &right).unwrap();

        assert_eq!(state.store().get(&x()), Some(&IntervalLattice::new(1, 5)));
        assert!(state.result().is_empty());
    }

    #[test]
    fn test_assignment_to_non_variable_is_unsupported() {
        let mut state = IntervalState::new([x()]);
        let left = set([Expression::int(3)]);
        let right = set([Expression::int(1)]);
        let err = state.assign_variable(&left, &right).unwrap_err();
        assert!(matches!(err, AnalysisError::Unsupported(_)));
    }

    #[test]
    fn test_filter_assumes_result_and_clears_it() {
        let mut state = IntervalState::new([x()]);
        state.set_result(set([Expression::var(x()).lt(Expression::int(3))]));
        state.filter().unwrap();

        assert!(state.result().is_empty());
        assert_eq!(state.store().get(&x()), Some(&IntervalLattice::at_most(2)));
    }

    #[test]
    fn test_assume_disjoint_readings_joins() {
        let mut state = IntervalState::new([x()]);
        let condition = set([
            Expression::var(x()).le(Expression::int(0)),
            Expression::var(x()).ge(Expression::int(10)),
        ]);
        state.assume(&condition).unwrap();
        // The hull of (-∞, 0] and [10, +∞) is the whole line again.
        assert!(state.is_top());
    }

    #[test]
    fn test_bottom_stays_bottom() {
        let mut state = IntervalState::new([x()]);
        state.bottom();
        let left = set([Expression::var(x())]);
        let right = set([Expression::int(1)]);
        state.assign_variable(&left, &right).unwrap();
        assert!(state.is_bottom());
    }

    #[test]
    fn test_no_candidates_is_bottom() {
        let mut state = IntervalState::new([x()]);
        state.assume(&HashSet::new()).unwrap();
        assert!(state.is_bottom());
    }

    #[test]
    fn test_scope_hooks_are_no_ops() {
        let mut state = IntervalState::new([x()]);
        let before = state.clone();
        state.enter_if().exit_if().enter_loop().exit_loop();
        state.next(ProgramPoint::new(1, 1), Some(EdgeKind::IfIn));
        assert_eq!(state, before);
    }
}
