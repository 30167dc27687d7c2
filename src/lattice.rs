//! Lattice contract shared by every abstract domain.
//!
//! All operations **mutate the receiver and return it**. A caller that still needs
//! the value from before the operation must `clone()` it first; no operation
//! allocates a copy behind the caller's back.
//!
//! The provided methods ([`Lattice::less_equal`], [`Lattice::join`],
//! [`Lattice::meet`], [`Lattice::widening`]) settle every case involving bottom or
//! top, and only call the domain kernels with two operands that are neither.

use std::fmt::Debug;

/// Lattice with bottom (⊥), top (⊤), join (⊔), meet (⊓) and widening (∇).
///
/// # Laws
///
/// - `⊑` is a partial order with ⊥ minimal and ⊤ maximal
/// - `a ⊑ a ⊔ b`, `b ⊑ a ⊔ b`, `a ⊓ b ⊑ a`, `a ⊓ b ⊑ b`
/// - `a ⊑ a ∇ b`, `b ⊑ a ∇ b`, and every widening chain stabilizes
///
/// Combining two elements of incompatible shape (for example stores over different
/// variable sets) is a programming error and panics.
pub trait Lattice: Clone + Debug {
    /// Turn `self` into ⊥.
    fn bottom(&mut self) -> &mut Self;

    /// Turn `self` into ⊤.
    fn top(&mut self) -> &mut Self;

    fn is_bottom(&self) -> bool;

    fn is_top(&self) -> bool;

    /// Partial order on two elements that are neither ⊥ nor ⊤.
    fn less_equal_kernel(&self, other: &Self) -> bool;

    /// Least upper bound of two elements that are neither ⊥ nor ⊤.
    fn join_kernel(&mut self, other: &Self) -> &mut Self;

    /// Greatest lower bound of two elements that are neither ⊥ nor ⊤.
    fn meet_kernel(&mut self, other: &Self) -> &mut Self;

    /// Widening of two elements that are neither ⊥ nor ⊤.
    ///
    /// There is no default: falling back to join would not force termination.
    fn widening_kernel(&mut self, other: &Self) -> &mut Self;

    /// Overwrite `self` with a copy of `other`.
    fn replace(&mut self, other: &Self) -> &mut Self {
        self.clone_from(other);
        self
    }

    /// Partial order: `self ⊑ other`.
    fn less_equal(&self, other: &Self) -> bool {
        if self.is_bottom() || other.is_top() {
            true
        } else if other.is_bottom() || self.is_top() {
            false
        } else {
            self.less_equal_kernel(other)
        }
    }

    /// Order-theoretic equality: `self ⊑ other ∧ other ⊑ self`.
    fn equivalent(&self, other: &Self) -> bool {
        self.less_equal(other) && other.less_equal(self)
    }

    /// Join: `self := self ⊔ other`.
    fn join(&mut self, other: &Self) -> &mut Self {
        if self.is_bottom() || other.is_top() {
            self.replace(other)
        } else if other.is_bottom() || self.is_top() {
            self
        } else {
            self.join_kernel(other)
        }
    }

    /// Meet: `self := self ⊓ other`.
    fn meet(&mut self, other: &Self) -> &mut Self {
        if self.is_top() || other.is_bottom() {
            self.replace(other)
        } else if other.is_top() || self.is_bottom() {
            self
        } else {
            self.meet_kernel(other)
        }
    }

    /// Widening: `self := self ∇ other`, where `self` is the previous iterate.
    fn widening(&mut self, other: &Self) -> &mut Self {
        if self.is_bottom() || other.is_top() {
            self.replace(other)
        } else if other.is_bottom() || self.is_top() {
            self
        } else {
            self.widening_kernel(other)
        }
    }

    /// Join every element into `self`.
    fn big_join<'a, I>(&mut self, elements: I) -> &mut Self
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a,
    {
        for element in elements {
            self.join(element);
        }
        self
    }
}

/// Adds an explicit ⊥ to any lattice.
///
/// The wrapper keeps an "is bottom" flag next to the inner element. A flagged
/// element is neutral for join and widening and absorbing for meet; the inner value
/// is kept untouched underneath the flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bottomed<L> {
    inner: L,
    bottom: bool,
}

impl<L: Lattice> Bottomed<L> {
    pub fn new(inner: L) -> Self {
        Self { inner, bottom: false }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut L {
        &mut self.inner
    }
}

impl<L: Lattice> Lattice for Bottomed<L> {
    fn bottom(&mut self) -> &mut Self {
        self.bottom = true;
        self
    }

    fn top(&mut self) -> &mut Self {
        self.bottom = false;
        self.inner.top();
        self
    }

    fn is_bottom(&self) -> bool {
        self.bottom || self.inner.is_bottom()
    }

    fn is_top(&self) -> bool {
        !self.bottom && self.inner.is_top()
    }

    fn less_equal_kernel(&self, other: &Self) -> bool {
        self.inner.less_equal(&other.inner)
    }

    fn join_kernel(&mut self, other: &Self) -> &mut Self {
        self.inner.join(&other.inner);
        self
    }

    fn meet_kernel(&mut self, other: &Self) -> &mut Self {
        self.inner.meet(&other.inner);
        self
    }

    fn widening_kernel(&mut self, other: &Self) -> &mut Self {
        self.inner.widening(&other.inner);
        self
    }
}
