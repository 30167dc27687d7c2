use std::collections::{HashMap, VecDeque};

use log::{debug, info};

use super::{assume_edge, bottom_like, enter_edge, Interpreter, InterpreterConfig};
use crate::cfg::{ControlFlowGraph, NodeId};
use crate::error::{AnalysisError, Result};
use crate::lattice::Lattice;
use crate::result::AnalysisResult;
use crate::semantics::Semantics;
use crate::state::State;

/// Forward worklist interpreter, seeded with the CFG's in-node.
///
/// # Examples
///
/// ```
/// use absint_rs::cfg::{ControlFlowGraph, Node};
/// use absint_rs::engine::{ForwardInterpreter, Interpreter, InterpreterConfig};
/// use absint_rs::expressions::VariableIdentifier;
/// use absint_rs::interval::Interval;
/// use absint_rs::interval_domain::IntervalState;
/// use absint_rs::semantics::ForwardSemantics;
/// use absint_rs::statements::{ProgramPoint, Statement};
///
/// let x = VariableIdentifier::int("x");
/// let pp = ProgramPoint::new(1, 0);
/// let mut cfg = ControlFlowGraph::new(0);
/// cfg.add_node(Node::basic(
///     0,
///     vec![Statement::assign(pp, Statement::variable(pp, x.clone()), Statement::int(pp, 42))],
/// ));
///
/// let interpreter = ForwardInterpreter::new(&cfg, &ForwardSemantics, InterpreterConfig::default());
/// let result = interpreter.analyze(IntervalState::new([x.clone()])).unwrap();
/// assert_eq!(result.get_result_after(pp).unwrap().get(&x), Some(&Interval::constant(42)));
/// ```
#[derive(Debug)]
pub struct ForwardInterpreter<'a, 's, M> {
    cfg: &'a ControlFlowGraph,
    semantics: &'s M,
    config: InterpreterConfig,
}

impl<'a, 's, M> ForwardInterpreter<'a, 's, M> {
    pub fn new(cfg: &'a ControlFlowGraph, semantics: &'s M, config: InterpreterConfig) -> Self {
        Self { cfg, semantics, config }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }
}

impl<'a, S, M> Interpreter<'a, S> for ForwardInterpreter<'a, '_, M>
where
    S: State,
    M: Semantics<S>,
{
    fn analyze(&self, initial: S) -> Result<AnalysisResult<'a, S>> {
        self.cfg.validate()?;

        let mut result: AnalysisResult<'a, S> = AnalysisResult::new(self.cfg);
        let mut iterations: HashMap<NodeId, usize> = HashMap::new();
        let mut worklist = VecDeque::from([self.cfg.in_node()]);
        let mut visits = 0;

        while let Some(id) = worklist.pop_front() {
            let node = self
                .cfg
                .node(id)
                .ok_or_else(|| AnalysisError::MalformedCfg(format!("node n{} does not exist", id)))?;
            let count = iterations.get(&id).copied().unwrap_or(0);
            debug!("Visiting n{} (processed {} times)", id, count);

            let previous = result.get_node_result(id).and_then(|states| states.first()).cloned();

            let mut entry = if id == self.cfg.in_node() {
                initial.clone()
            } else {
                let mut entry = bottom_like(&initial);
                for edge in self.cfg.in_edges(id) {
                    let mut predecessor = match result.get_node_result(edge.source()).and_then(|s| s.last()) {
                        Some(state) => state.clone(),
                        None => bottom_like(&initial),
                    };
                    assume_edge(self.semantics, edge, &mut predecessor, &mut result)?;
                    enter_edge(&mut predecessor, edge.kind());
                    entry.join(&predecessor);
                }
                entry
            };

            if let Some(previous) = &previous {
                if node.is_loop() && count > self.config.widening_threshold {
                    debug!("Widening at n{} after {} iterations", id, count);
                    let mut widened = previous.clone();
                    widened.widening(&entry);
                    entry = widened;
                }
                if entry.less_equal(previous) {
                    debug!("n{} is stable", id);
                    continue;
                }
            }

            let mut current = entry.clone();
            let mut states = Vec::with_capacity(node.statements().len() + 1);
            states.push(entry);
            for statement in node.statements() {
                current.next(statement.pp, None);
                self.semantics.semantics(statement, &mut current)?;
                states.push(current.clone());
            }
            result.set_node_result(id, states);

            *iterations.entry(id).or_insert(0) += 1;
            visits += 1;
            worklist.extend(self.cfg.successors(id));
        }

        info!("Forward analysis reached a fixpoint after {} node visits", visits);
        Ok(result)
    }
}
