//! Errors raised while running an analysis.

use thiserror::Error;

/// Everything that can abort an analysis.
///
/// None of these are recovered inside the engine: the first error returned by a
/// [`Semantics`][crate::semantics::Semantics] or [`State`][crate::state::State]
/// operation aborts the whole [`analyze`][crate::engine::Interpreter::analyze] call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// A statement or expression shape the semantics or the domain has no transfer function for.
    #[error("unsupported construct: {0}")]
    Unsupported(String),

    /// The control-flow graph violates a structural precondition.
    #[error("malformed control-flow graph: {0}")]
    MalformedCfg(String),

    /// A variable outside the fixed variable set of a store.
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    /// A variable identifier reached the constant evaluator.
    #[error("free variable `{0}` in a constant expression")]
    FreeVariable(String),

    /// Ordering comparison involving an empty interval.
    #[error("cannot compare empty interval {0}")]
    EmptyInterval(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
