use std::collections::{HashMap, VecDeque};

use log::{debug, info};

use super::{assume_edge, bottom_like, enter_edge_reversed, Interpreter, InterpreterConfig};
use crate::cfg::{ControlFlowGraph, NodeId};
use crate::error::{AnalysisError, Result};
use crate::lattice::Lattice;
use crate::result::AnalysisResult;
use crate::semantics::Semantics;
use crate::state::State;

/// Backward worklist interpreter, seeded with the CFG's out-node.
///
/// States flow against the edges: the exit state of a node joins the first states of
/// its successors, and statements run in reverse. The stored state lists still follow
/// program order, so `get_result_before(pp)` is the precondition of the statement at
/// `pp` and `get_result_after(pp)` its postcondition.
#[derive(Debug)]
pub struct BackwardInterpreter<'a, 's, M> {
    cfg: &'a ControlFlowGraph,
    semantics: &'s M,
    config: InterpreterConfig,
}

impl<'a, 's, M> BackwardInterpreter<'a, 's, M> {
    pub fn new(cfg: &'a ControlFlowGraph, semantics: &'s M, config: InterpreterConfig) -> Self {
        Self { cfg, semantics, config }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }
}

impl<'a, S, M> Interpreter<'a, S> for BackwardInterpreter<'a, '_, M>
where
    S: State,
    M: Semantics<S>,
{
    fn analyze(&self, initial: S) -> Result<AnalysisResult<'a, S>> {
        self.cfg.validate()?;
        let out_node = self
            .cfg
            .out_node()
            .ok_or_else(|| AnalysisError::MalformedCfg("backward analysis needs an out-node".to_string()))?;

        let mut result: AnalysisResult<'a, S> = AnalysisResult::new(self.cfg);
        let mut iterations: HashMap<NodeId, usize> = HashMap::new();
        let mut worklist = VecDeque::from([out_node]);
        let mut visits = 0;

        while let Some(id) = worklist.pop_front() {
            let node = self
                .cfg
                .node(id)
                .ok_or_else(|| AnalysisError::MalformedCfg(format!("node n{} does not exist", id)))?;
            let count = iterations.get(&id).copied().unwrap_or(0);
            debug!("Visiting n{} backward (processed {} times)", id, count);

            let previous = result.get_node_result(id).and_then(|states| states.last()).cloned();

            let mut exit = if id == out_node {
                initial.clone()
            } else {
                let mut exit = bottom_like(&initial);
                for edge in self.cfg.out_edges(id) {
                    let mut successor = match result.get_node_result(edge.target()).and_then(|s| s.first()) {
                        Some(state) => state.clone(),
                        None => bottom_like(&initial),
                    };
                    enter_edge_reversed(&mut successor, edge.kind());
                    assume_edge(self.semantics, edge, &mut successor, &mut result)?;
                    exit.join(&successor);
                }
                exit
            };

            if let Some(previous) = &previous {
                if node.is_loop() && count > self.config.widening_threshold {
                    debug!("Widening at n{} after {} iterations", id, count);
                    let mut widened = previous.clone();
                    widened.widening(&exit);
                    exit = widened;
                }
                if exit.less_equal(previous) {
                    debug!("n{} is stable", id);
                    continue;
                }
            }

            let mut current = exit.clone();
            let mut states = VecDeque::with_capacity(node.statements().len() + 1);
            states.push_front(exit);
            for statement in node.statements().iter().rev() {
                current.next(statement.pp, None);
                self.semantics.semantics(statement, &mut current)?;
                states.push_front(current.clone());
            }
            result.set_node_result(id, states.into());

            *iterations.entry(id).or_insert(0) += 1;
            visits += 1;
            worklist.extend(self.cfg.predecessors(id));
        }

        info!("Backward analysis reached a fixpoint after {} node visits", visits);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::cfg::{Edge, EdgeKind, Node};
    use crate::expressions::VariableIdentifier;
    use crate::interval::{ExtendedInt, Interval, IntervalLattice};
    use crate::interval_domain::IntervalState;
    use crate::semantics::BackwardSemantics;
    use crate::statements::{Operator, ProgramPoint, Statement};

    fn x() -> VariableIdentifier {
        VariableIdentifier::int("x")
    }

    fn y() -> VariableIdentifier {
        VariableIdentifier::int("y")
    }

    fn pp(line: u32) -> ProgramPoint {
        ProgramPoint::new(line, 0)
    }

    fn var(line: u32, v: VariableIdentifier) -> Statement {
        Statement::variable(pp(line), v)
    }

    /// `y = x + 1; assume(y <= 5)`
    fn guarded_increment() -> ControlFlowGraph {
        let mut cfg = ControlFlowGraph::new(0).with_out_node(1);
        cfg.add_node(Node::basic(
            0,
            vec![Statement::assign(
                pp(1),
                var(1, y()),
                Statement::binary(pp(1), var(1, x()), Operator::Add, Statement::int(pp(1), 1)),
            )],
        ));
        cfg.add_node(Node::basic(1, vec![]));
        let condition = Statement::binary(pp(2), var(2, y()), Operator::LtE, Statement::int(pp(2), 5));
        cfg.add_edge(Edge::conditional(0, 1, EdgeKind::IfIn, condition));
        cfg
    }

    #[test]
    fn test_precondition_of_guarded_increment() {
        let cfg = guarded_increment();
        let result = BackwardInterpreter::new(&cfg, &BackwardSemantics, InterpreterConfig::default())
            .analyze(IntervalState::new([x(), y()]))
            .unwrap();

        let pre = result.get_result_before(pp(1)).unwrap();
        assert_eq!(pre.get(&x()), Some(&Interval::new(ExtendedInt::NegInf, 4)));

        let post = result.get_result_after(pp(1)).unwrap();
        assert_eq!(post.get(&y()), Some(&Interval::new(ExtendedInt::NegInf, 5)));
    }

    #[test]
    fn test_states_keep_program_order() {
        let mut cfg = ControlFlowGraph::new(0).with_out_node(0);
        cfg.add_node(Node::basic(
            0,
            vec![
                Statement::assign(pp(1), var(1, y()), var(1, x())),
                Statement::assign(pp(2), var(2, x()), Statement::int(pp(2), 3)),
            ],
        ));
        let initial = IntervalState::new([x(), y()]).with(&y(), IntervalLattice::new(0, 1));
        let result = BackwardInterpreter::new(&cfg, &BackwardSemantics, InterpreterConfig::default())
            .analyze(initial.clone())
            .unwrap();

        let states = result.get_node_result(0).unwrap();
        assert_eq!(states.len(), 3);
        assert_eq!(states[2], initial);
        // x = 3 is reached with any x, and y = x then requires x within y's range.
        assert_eq!(states[1].get(&x()), Some(&Interval::top()));
        assert_eq!(states[0].get(&x()), Some(&Interval::new(0, 1)));
    }

    #[test]
    fn test_out_node_is_required() {
        let mut cfg = ControlFlowGraph::new(0);
        cfg.add_node(Node::basic(0, vec![]));
        let err = BackwardInterpreter::new(&cfg, &BackwardSemantics, InterpreterConfig::default())
            .analyze(IntervalState::new([x()]))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::MalformedCfg(_)));
    }

    #[test]
    fn test_backward_loop_terminates() {
        // while x < 10 { x = x + 1 }, analyzed from the exit with x >= 10.
        let mut cfg = ControlFlowGraph::new(0).with_out_node(2);
        cfg.add_node(Node::loop_header(0));
        cfg.add_node(Node::basic(
            1,
            vec![Statement::assign(
                pp(2),
                var(2, x()),
                Statement::binary(pp(2), var(2, x()), Operator::Add, Statement::int(pp(2), 1)),
            )],
        ));
        cfg.add_node(Node::basic(2, vec![]));
        let lt = || Statement::binary(pp(1), var(1, x()), Operator::Lt, Statement::int(pp(1), 10));
        cfg.add_edge(Edge::conditional(0, 1, EdgeKind::LoopIn, lt()));
        cfg.add_edge(Edge::unconditional(1, 0, EdgeKind::Default));
        let not_lt = Statement::call(pp(1), Operator::Not, vec![lt()]);
        cfg.add_edge(Edge::conditional(0, 2, EdgeKind::LoopOut, not_lt));

        let config = InterpreterConfig::default().with_widening_threshold(1);
        let result = BackwardInterpreter::new(&cfg, &BackwardSemantics, config)
            .analyze(IntervalState::new([x()]))
            .unwrap();
        assert!(result.is_visited(0));
        assert!(result.is_visited(1));
    }
}
