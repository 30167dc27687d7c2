//! Per-node and per-program-point index of analysis results.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::cfg::{ControlFlowGraph, Edge, EdgeKind, NodeId};
use crate::statements::ProgramPoint;

/// States computed by an interpreter, indexed by node and by program point.
///
/// A node with `k` statements holds `k + 1` states: `states[i]` is the state right
/// before statement `i`, and `states[i + 1]` the state right after it. A loop header
/// holds a single state.
///
/// Conditional edges are indexed by the program point of their condition and their
/// kind, then by their endpoints: the two branches of an `if` usually share both the
/// condition's program point and the `IfIn` kind.
///
/// Every lookup returns `None` for a location the interpreter never reached.
#[derive(Debug, Clone)]
pub struct AnalysisResult<'a, S> {
    cfg: &'a ControlFlowGraph,
    nodes: BTreeMap<NodeId, Vec<S>>,
    statements: HashMap<ProgramPoint, (NodeId, usize)>,
    edges: HashMap<(ProgramPoint, EdgeKind), BTreeMap<(NodeId, NodeId), (S, S)>>,
}

impl<'a, S> AnalysisResult<'a, S> {
    pub fn new(cfg: &'a ControlFlowGraph) -> Self {
        Self {
            cfg,
            nodes: BTreeMap::new(),
            statements: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    pub fn cfg(&self) -> &'a ControlFlowGraph {
        self.cfg
    }

    /// Overwrite the states of `node`.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not in the CFG, or if `states` does not hold exactly one
    /// more state than the node has statements.
    pub fn set_node_result(&mut self, node: NodeId, states: Vec<S>) {
        let statements = match self.cfg.node(node) {
            Some(n) => n.statements(),
            None => panic!("Node {} is not in the CFG", node),
        };
        assert_eq!(
            states.len(),
            statements.len() + 1,
            "Node {} has {} statements but {} states were given",
            node,
            statements.len(),
            states.len()
        );
        for (i, statement) in statements.iter().enumerate() {
            self.statements.insert(statement.pp, (node, i));
        }
        self.nodes.insert(node, states);
    }

    /// Record the states around the assumption of the condition of `edge`.
    ///
    /// # Panics
    ///
    /// Panics if `edge` is unconditional.
    pub fn set_edge_result(&mut self, edge: &Edge, before: S, after: S) {
        let condition = match edge.condition() {
            Some(condition) => condition,
            None => panic!("Edge {} has no condition", edge),
        };
        self.edges
            .entry((condition.pp, edge.kind()))
            .or_default()
            .insert((edge.source(), edge.target()), (before, after));
    }

    pub fn get_node_result(&self, node: NodeId) -> Option<&[S]> {
        self.nodes.get(&node).map(Vec::as_slice)
    }

    /// State right before the statement at `pp`.
    pub fn get_result_before(&self, pp: ProgramPoint) -> Option<&S> {
        let &(node, i) = self.statements.get(&pp)?;
        self.nodes.get(&node)?.get(i)
    }

    /// State right after the statement at `pp`.
    pub fn get_result_after(&self, pp: ProgramPoint) -> Option<&S> {
        let &(node, i) = self.statements.get(&pp)?;
        self.nodes.get(&node)?.get(i + 1)
    }

    fn edge_states(&self, edge: &Edge) -> Option<&(S, S)> {
        let pp = edge.condition()?.pp;
        self.edges.get(&(pp, edge.kind()))?.get(&(edge.source(), edge.target()))
    }

    /// State reaching the condition of `edge`, before it is assumed.
    pub fn get_edge_result_before(&self, edge: &Edge) -> Option<&S> {
        self.edge_states(edge).map(|(before, _)| before)
    }

    /// State leaving `edge` once its condition is assumed.
    pub fn get_edge_result_after(&self, edge: &Edge) -> Option<&S> {
        self.edge_states(edge).map(|(_, after)| after)
    }

    /// States around every reached edge of `kind` whose condition is at `pp`, as
    /// `(source, target, before, after)` in endpoint order.
    pub fn get_edge_results(
        &self,
        pp: ProgramPoint,
        kind: EdgeKind,
    ) -> impl Iterator<Item = (NodeId, NodeId, &S, &S)> + '_ {
        self.edges
            .get(&(pp, kind))
            .into_iter()
            .flatten()
            .map(|(&(source, target), (before, after))| (source, target, before, after))
    }

    /// Visited nodes, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn is_visited(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }
}

impl<S: fmt::Display> fmt::Display for AnalysisResult<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (&id, states) in &self.nodes {
            writeln!(f, "n{}:", id)?;
            let statements = self.cfg.node(id).map(|n| n.statements()).unwrap_or_default();
            for (i, state) in states.iter().enumerate() {
                writeln!(f, "    {{ {} }}", state)?;
                if let Some(statement) = statements.get(i) {
                    writeln!(f, "  {}: {}", statement.pp, statement)?;
                }
            }
        }
        Ok(())
    }
}
