//! Pointwise lifting of a lattice to a fixed set of variables.

use std::collections::BTreeMap;
use std::fmt;

use crate::expressions::VariableIdentifier;
use crate::lattice::Lattice;

/// Mapping from every variable of a fixed set to a lattice element.
///
/// The store is ⊥ as soon as *any* variable is ⊥ (no concrete environment can
/// have an impossible value), but ⊤ only when *all* variables are ⊤.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Store<L> {
    store: BTreeMap<VariableIdentifier, L>,
}

impl<L: Lattice> Store<L> {
    /// Create a store over `variables`, with initial elements built by `factory`.
    pub fn new<I, F>(variables: I, mut factory: F) -> Self
    where
        I: IntoIterator<Item = VariableIdentifier>,
        F: FnMut(&VariableIdentifier) -> L,
    {
        let store = variables
            .into_iter()
            .map(|variable| {
                let element = factory(&variable);
                (variable, element)
            })
            .collect();
        Self { store }
    }

    pub fn variables(&self) -> impl Iterator<Item = &VariableIdentifier> {
        self.store.keys()
    }

    pub fn contains(&self, variable: &VariableIdentifier) -> bool {
        self.store.contains_key(variable)
    }

    pub fn get(&self, variable: &VariableIdentifier) -> Option<&L> {
        self.store.get(variable)
    }

    pub fn get_mut(&mut self, variable: &VariableIdentifier) -> Option<&mut L> {
        self.store.get_mut(variable)
    }

    /// Overwrite the element of `variable`.
    ///
    /// # Panics
    ///
    /// Panics if `variable` is not one of the store's variables.
    pub fn set(&mut self, variable: &VariableIdentifier, element: L) {
        match self.store.get_mut(variable) {
            Some(slot) => *slot = element,
            None => panic!("Variable `{}` is not in the store", variable),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VariableIdentifier, &L)> {
        self.store.iter()
    }

    fn check_compatible(&self, other: &Self) {
        assert!(
            self.store.keys().eq(other.store.keys()),
            "Stores over different variables: {:?} vs {:?}",
            self.store.keys().collect::<Vec<_>>(),
            other.store.keys().collect::<Vec<_>>()
        );
    }

    fn pointwise<F>(&mut self, other: &Self, mut op: F) -> &mut Self
    where
        F: FnMut(&mut L, &L),
    {
        self.check_compatible(other);
        for ((_, mine), (_, theirs)) in self.store.iter_mut().zip(other.store.iter()) {
            op(mine, theirs);
        }
        self
    }
}

impl<L: Lattice> Lattice for Store<L> {
    fn bottom(&mut self) -> &mut Self {
        for element in self.store.values_mut() {
            element.bottom();
        }
        self
    }

    fn top(&mut self) -> &mut Self {
        for element in self.store.values_mut() {
            element.top();
        }
        self
    }

    fn is_bottom(&self) -> bool {
        self.store.values().any(|element| element.is_bottom())
    }

    fn is_top(&self) -> bool {
        self.store.values().all(|element| element.is_top())
    }

    fn less_equal_kernel(&self, other: &Self) -> bool {
        self.check_compatible(other);
        self.store
            .values()
            .zip(other.store.values())
            .all(|(mine, theirs)| mine.less_equal(theirs))
    }

    fn join_kernel(&mut self, other: &Self) -> &mut Self {
        self.pointwise(other, |mine, theirs| {
            mine.join(theirs);
        })
    }

    fn meet_kernel(&mut self, other: &Self) -> &mut Self {
        self.pointwise(other, |mine, theirs| {
            mine.meet(theirs);
        })
    }

    fn widening_kernel(&mut self, other: &Self) -> &mut Self {
        self.pointwise(other, |mine, theirs| {
            mine.widening(theirs);
        })
    }
}

impl<L: Lattice + fmt::Display> fmt::Display for Store<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (variable, element)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{} -> {}", variable, element)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use test_log::test;

    use super::*;
    use crate::interval::IntervalLattice;
    use crate::lattice::tests::check_lattice_laws;

    fn x() -> VariableIdentifier {
        VariableIdentifier::int("x")
    }

    fn y() -> VariableIdentifier {
        VariableIdentifier::int("y")
    }

    fn store(vx: IntervalLattice, vy: IntervalLattice) -> Store<IntervalLattice> {
        let mut store = Store::new([x(), y()], |_| IntervalLattice::top_element());
        store.set(&x(), vx);
        store.set(&y(), vy);
        store
    }

    #[test]
    fn test_factory_initializes_every_variable() {
        let store = Store::new([y(), x()], |v| {
            if v.name() == "x" {
                IntervalLattice::constant(1)
            } else {
                IntervalLattice::top_element()
            }
        });
        assert_eq!(store.get(&x()), Some(&IntervalLattice::constant(1)));
        assert_eq!(store.get(&y()), Some(&IntervalLattice::top_element()));
        assert_eq!(store.get(&VariableIdentifier::int("z")), None);
        let names: Vec<_> = store.variables().map(|v| v.name()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_bottom_is_any_top_is_all() {
        let s = store(IntervalLattice::bottom_element(), IntervalLattice::top_element());
        assert!(s.is_bottom());
        assert!(!s.is_top());

        let s = store(IntervalLattice::new(0, 1), IntervalLattice::top_element());
        assert!(!s.is_bottom());
        assert!(!s.is_top());

        let s = store(IntervalLattice::top_element(), IntervalLattice::top_element());
        assert!(s.is_top());
    }

    #[test]
    fn test_pointwise_join() {
        let mut a = store(IntervalLattice::new(0, 1), IntervalLattice::new(5, 5));
        a.join(&store(IntervalLattice::new(3, 4), IntervalLattice::new(-1, 0)));
        assert_eq!(a, store(IntervalLattice::new(0, 4), IntervalLattice::new(-1, 5)));
    }

    #[test]
    fn test_pointwise_meet_can_reach_bottom() {
        let mut a = store(IntervalLattice::new(0, 1), IntervalLattice::new(0, 10));
        a.meet(&store(IntervalLattice::new(3, 4), IntervalLattice::new(5, 20)));
        assert!(a.is_bottom());
        assert_eq!(a.get(&y()), Some(&IntervalLattice::new(5, 10)));
    }

    #[test]
    fn test_join_with_bottom_store() {
        let mut a = store(IntervalLattice::bottom_element(), IntervalLattice::new(0, 0));
        let b = store(IntervalLattice::new(1, 2), IntervalLattice::new(3, 3));
        a.join(&b);
        assert_eq!(a, b);
    }

    #[test]
    fn test_display() {
        let s = store(IntervalLattice::new(0, 1), IntervalLattice::bottom_element());
        assert_eq!(s.to_string(), "x -> [0, 1], y -> ⊥");
    }

    #[test]
    fn test_iter_is_sorted_by_name() {
        let s = Store::new([y(), x()], |_| IntervalLattice::top_element());
        let names: Vec<_> = s.iter().map(|(variable, _)| variable.name()).collect();
        assert_eq!(names, ["x", "y"]);
    }

    #[test]
    #[should_panic(expected = "not in the store")]
    fn test_set_unknown_variable_panics() {
        let mut s = store(IntervalLattice::new(0, 1), IntervalLattice::new(0, 1));
        s.set(&VariableIdentifier::int("z"), IntervalLattice::top_element());
    }

    #[test]
    #[should_panic(expected = "different variables")]
    fn test_incompatible_stores_panic() {
        let mut a = store(IntervalLattice::new(0, 1), IntervalLattice::new(0, 1));
        let b = Store::new([x()], |_| IntervalLattice::new(2, 3));
        a.join(&b);
    }

    #[test]
    fn test_lattice_laws_on_samples() {
        check_lattice_laws(&[
            store(IntervalLattice::bottom_element(), IntervalLattice::new(0, 0)),
            store(IntervalLattice::top_element(), IntervalLattice::top_element()),
            store(IntervalLattice::new(0, 5), IntervalLattice::at_least(1)),
            store(IntervalLattice::new(3, 9), IntervalLattice::at_most(0)),
            store(IntervalLattice::constant(4), IntervalLattice::new(-2, 2)),
        ]);
    }

    fn element() -> impl Strategy<Value = IntervalLattice> {
        prop_oneof![
            1 => Just(IntervalLattice::bottom_element()),
            1 => Just(IntervalLattice::top_element()),
            4 => (-10i64..10, 0i64..10).prop_map(|(l, w)| IntervalLattice::new(l, l + w)),
        ]
    }

    prop_compose! {
        fn two_variables()(vx in element(), vy in element()) -> Store<IntervalLattice> {
            store(vx, vy)
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_join_is_upper_bound(a in two_variables(), b in two_variables()) {
            let mut joined = a.clone();
            joined.join(&b);
            prop_assert!(a.less_equal(&joined));
            prop_assert!(b.less_equal(&joined));
        }

        #[test]
        fn prop_meet_is_lower_bound(a in two_variables(), b in two_variables()) {
            let mut met = a.clone();
            met.meet(&b);
            prop_assert!(met.less_equal(&a));
            prop_assert!(met.less_equal(&b));
        }

        #[test]
        fn prop_widening_is_upper_bound(a in two_variables(), b in two_variables()) {
            let mut widened = a.clone();
            widened.widening(&b);
            prop_assert!(a.less_equal(&widened));
            prop_assert!(b.less_equal(&widened));
        }

        #[test]
        fn prop_join_commutes(a in two_variables(), b in two_variables()) {
            let mut ab = a.clone();
            ab.join(&b);
            let mut ba = b.clone();
            ba.join(&a);
            prop_assert!(ab.equivalent(&ba));
        }
    }
}
