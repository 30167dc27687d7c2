//! # absint-rs: Abstract Interpretation over Control-Flow Graphs
//!
//! **`absint-rs`** computes sound over-approximations of what a program can do at
//! every point, without running it. An analysis is made of three parts:
//!
//! - an abstract domain, i.e. a [`Lattice`][crate::lattice::Lattice] that is also a
//!   [`State`][crate::state::State] abstract statements can act upon;
//! - a [`Semantics`][crate::semantics::Semantics] mapping statements to state effects;
//! - an [`Interpreter`][crate::engine::Interpreter] iterating over a
//!   [`ControlFlowGraph`][crate::cfg::ControlFlowGraph] until nothing changes anymore,
//!   widening at loop headers so that it always gets there.
//!
//! ## Quick Start
//!
//! ```rust
//! use absint_rs::cfg::{ControlFlowGraph, Edge, EdgeKind, Node};
//! use absint_rs::engine::analyze;
//! use absint_rs::expressions::VariableIdentifier;
//! use absint_rs::interval::{ExtendedInt, Interval};
//! use absint_rs::interval_domain::IntervalState;
//! use absint_rs::semantics::ForwardSemantics;
//! use absint_rs::statements::{Operator, ProgramPoint, Statement};
//!
//! // x = 0; while x < 10 { x = x + 1 }
//! let x = VariableIdentifier::int("x");
//! let pp = |line| ProgramPoint::new(line, 0);
//! let var = |line| Statement::variable(pp(line), x.clone());
//!
//! let mut cfg = ControlFlowGraph::new(0);
//! cfg.add_node(Node::basic(0, vec![Statement::assign(pp(1), var(1), Statement::int(pp(1), 0))]));
//! cfg.add_node(Node::loop_header(1));
//! cfg.add_node(Node::basic(2, vec![Statement::assign(
//!     pp(3),
//!     var(3),
//!     Statement::binary(pp(3), var(3), Operator::Add, Statement::int(pp(3), 1)),
//! )]));
//! let condition = Statement::binary(pp(2), var(2), Operator::Lt, Statement::int(pp(2), 10));
//! cfg.add_edge(Edge::unconditional(0, 1, EdgeKind::Default));
//! cfg.add_edge(Edge::conditional(1, 2, EdgeKind::LoopIn, condition));
//! cfg.add_edge(Edge::unconditional(2, 1, EdgeKind::Default));
//!
//! let result = analyze(&cfg, &ForwardSemantics, 1, IntervalState::new([x.clone()])).unwrap();
//!
//! // The loop header is widened to [0, +∞], the body is refined by the condition.
//! let header = &result.get_node_result(1).unwrap()[0];
//! assert_eq!(header.get(&x), Some(&Interval::new(0, ExtendedInt::PosInf)));
//! let body = result.get_result_after(pp(3)).unwrap();
//! assert_eq!(body.get(&x), Some(&Interval::new(1, 10)));
//! ```
//!
//! ## Core Components
//!
//! - **[`lattice`]**: The lattice contract and the [`Bottomed`][crate::lattice::Bottomed] wrapper.
//! - **[`store`]**, **[`state`]**: Variable stores and the abstract state contract.
//! - **[`interval`]**, **[`interval_domain`]**: The interval domain and its state.
//! - **[`engine`]**: Forward and backward worklist interpreters.
//! - **[`result`]**: Results indexed by node, program point and edge.

pub mod cfg;
pub mod engine;
pub mod error;
pub mod expressions;
pub mod interval;
pub mod interval_domain;
pub mod lattice;
pub mod result;
pub mod semantics;
pub mod state;
pub mod statements;
pub mod store;

pub use crate::error::{AnalysisError, Result};
