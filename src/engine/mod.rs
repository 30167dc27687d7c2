//! Worklist fixpoint interpreters over control-flow graphs.
//!
//! Both directions share the same loop: dequeue a node, recompute its boundary
//! state from its neighbours, widen at loop headers once they have been processed
//! more than [`InterpreterConfig::widening_threshold`] times, stop if the boundary
//! state did not grow, and otherwise re-run the node's statements and enqueue the
//! nodes that depend on it.

mod backward;
mod forward;

pub use self::backward::BackwardInterpreter;
pub use self::forward::ForwardInterpreter;

use log::trace;

use crate::cfg::{ControlFlowGraph, Edge, EdgeKind};
use crate::error::{AnalysisError, Result};
use crate::result::AnalysisResult;
use crate::semantics::Semantics;
use crate::state::State;

/// Configuration of an interpreter.
///
/// # Examples
///
/// ```
/// use absint_rs::engine::InterpreterConfig;
///
/// let config = InterpreterConfig::default().with_widening_threshold(1);
/// assert_eq!(config.widening_threshold, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Number of times a loop header is processed before widening kicks in (default: 3)
    pub widening_threshold: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self { widening_threshold: 3 }
    }
}

impl InterpreterConfig {
    pub fn with_widening_threshold(mut self, widening_threshold: usize) -> Self {
        self.widening_threshold = widening_threshold;
        self
    }
}

/// An analysis direction over a fixed CFG.
pub trait Interpreter<'a, S: State> {
    /// Run the analysis to a fixpoint, starting from `initial` at the seed node.
    fn analyze(&self, initial: S) -> Result<AnalysisResult<'a, S>>;
}

/// Forward analysis of `cfg` with the given widening threshold.
pub fn analyze<'a, S, M>(
    cfg: &'a ControlFlowGraph,
    semantics: &M,
    widening_threshold: usize,
    initial: S,
) -> Result<AnalysisResult<'a, S>>
where
    S: State,
    M: Semantics<S>,
{
    let config = InterpreterConfig::default().with_widening_threshold(widening_threshold);
    ForwardInterpreter::new(cfg, semantics, config).analyze(initial)
}

/// Bottom element of the same shape as `like`.
fn bottom_like<S: State>(like: &S) -> S {
    let mut bottom = like.clone();
    bottom.bottom();
    bottom
}

/// Assume the condition of a conditional edge, recording the states around it.
///
/// Unconditional edges leave `state` untouched. A condition without any candidate
/// value is unsupported.
fn assume_edge<'a, S, M>(semantics: &M, edge: &Edge, state: &mut S, result: &mut AnalysisResult<'a, S>) -> Result<()>
where
    S: State,
    M: Semantics<S> + ?Sized,
{
    if let Some(condition) = edge.condition() {
        trace!("Assuming {} on {}", condition, edge);
        state.next(condition.pp, Some(edge.kind()));
        let before = state.clone();
        semantics.semantics(condition, state)?;
        if state.result().is_empty() {
            return Err(AnalysisError::Unsupported(format!("condition `{}` without a value", condition)));
        }
        state.filter()?;
        result.set_edge_result(edge, before, state.clone());
    }
    Ok(())
}

/// Scope transition for traversing an edge of `kind` along its direction.
fn enter_edge<S: State>(state: &mut S, kind: EdgeKind) {
    match kind {
        EdgeKind::Default => {}
        EdgeKind::IfIn => {
            state.enter_if();
        }
        EdgeKind::IfOut => {
            state.exit_if();
        }
        EdgeKind::LoopIn => {
            state.enter_loop();
        }
        EdgeKind::LoopOut => {
            state.exit_loop();
        }
    }
}

/// Scope transition for traversing an edge of `kind` against its direction.
fn enter_edge_reversed<S: State>(state: &mut S, kind: EdgeKind) {
    match kind {
        EdgeKind::Default => {}
        EdgeKind::IfOut => {
            state.enter_if();
        }
        EdgeKind::IfIn => {
            state.exit_if();
        }
        EdgeKind::LoopOut => {
            state.enter_loop();
        }
        EdgeKind::LoopIn => {
            state.exit_loop();
        }
    }
}
