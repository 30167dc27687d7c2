//! Control-flow graph consumed by the interpreters.
//!
//! Nodes are either basic blocks (a straight-line list of statements) or loop
//! headers (no statements). Edges carry a [`EdgeKind`] telling the interpreter which
//! scope hook to run, and conditional edges additionally carry the condition that
//! holds when the edge is taken.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{AnalysisError, Result};
use crate::statements::Statement;

/// Unique identifier of a CFG node.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Basic block: statements executed in order.
    Basic { id: NodeId, statements: Vec<Statement> },
    /// Loop header: the join point where widening is applied.
    Loop { id: NodeId },
}

impl Node {
    pub fn basic(id: NodeId, statements: Vec<Statement>) -> Self {
        Node::Basic { id, statements }
    }

    pub fn loop_header(id: NodeId) -> Self {
        Node::Loop { id }
    }

    pub fn id(&self) -> NodeId {
        match self {
            Node::Basic { id, .. } | Node::Loop { id } => *id,
        }
    }

    /// Statements of the node; loop headers have none.
    pub fn statements(&self) -> &[Statement] {
        match self {
            Node::Basic { statements, .. } => statements,
            Node::Loop { .. } => &[],
        }
    }

    pub fn is_loop(&self) -> bool {
        matches!(self, Node::Loop { .. })
    }
}

/// Which scope an edge enters or leaves.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EdgeKind {
    Default,
    IfIn,
    IfOut,
    LoopIn,
    LoopOut,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EdgeKind::Default => "default",
            EdgeKind::IfIn => "if-in",
            EdgeKind::IfOut => "if-out",
            EdgeKind::LoopIn => "loop-in",
            EdgeKind::LoopOut => "loop-out",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edge {
    Unconditional {
        source: NodeId,
        target: NodeId,
        kind: EdgeKind,
    },
    /// Taken only when `condition` holds.
    Conditional {
        source: NodeId,
        target: NodeId,
        kind: EdgeKind,
        condition: Statement,
    },
}

impl Edge {
    pub fn unconditional(source: NodeId, target: NodeId, kind: EdgeKind) -> Self {
        Edge::Unconditional { source, target, kind }
    }

    pub fn conditional(source: NodeId, target: NodeId, kind: EdgeKind, condition: Statement) -> Self {
        Edge::Conditional {
            source,
            target,
            kind,
            condition,
        }
    }

    pub fn source(&self) -> NodeId {
        match self {
            Edge::Unconditional { source, .. } | Edge::Conditional { source, .. } => *source,
        }
    }

    pub fn target(&self) -> NodeId {
        match self {
            Edge::Unconditional { target, .. } | Edge::Conditional { target, .. } => *target,
        }
    }

    pub fn kind(&self) -> EdgeKind {
        match self {
            Edge::Unconditional { kind, .. } | Edge::Conditional { kind, .. } => *kind,
        }
    }

    pub fn condition(&self) -> Option<&Statement> {
        match self {
            Edge::Unconditional { .. } => None,
            Edge::Conditional { condition, .. } => Some(condition),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Unconditional { source, target, kind } => write!(f, "n{} -> n{} [{}]", source, target, kind),
            Edge::Conditional {
                source,
                target,
                kind,
                condition,
            } => write!(f, "n{} -> n{} [{}] if {}", source, target, kind, condition),
        }
    }
}

/// Control-flow graph with a unique entry (in-node) and an optional exit (out-node).
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    in_edges: HashMap<NodeId, Vec<usize>>,
    out_edges: HashMap<NodeId, Vec<usize>>,
    in_node: NodeId,
    out_node: Option<NodeId>,
}

impl ControlFlowGraph {
    /// Create an empty CFG whose entry will be `in_node`.
    pub fn new(in_node: NodeId) -> Self {
        Self {
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            in_edges: HashMap::new(),
            out_edges: HashMap::new(),
            in_node,
            out_node: None,
        }
    }

    /// Declare the exit node, required by backward analyses.
    pub fn with_out_node(mut self, out_node: NodeId) -> Self {
        self.out_node = Some(out_node);
        self
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id(), node);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        let index = self.edges.len();
        self.out_edges.entry(edge.source()).or_default().push(index);
        self.in_edges.entry(edge.target()).or_default().push(index);
        self.edges.push(edge);
    }

    pub fn in_node(&self) -> NodeId {
        self.in_node
    }

    pub fn out_node(&self) -> Option<NodeId> {
        self.out_node
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// All nodes, by increasing id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edges ending in `id`, in insertion order.
    pub fn in_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.in_edges
            .get(&id)
            .into_iter()
            .flatten()
            .map(move |&index| &self.edges[index])
    }

    /// Edges leaving `id`, in insertion order.
    pub fn out_edges(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.out_edges
            .get(&id)
            .into_iter()
            .flatten()
            .map(move |&index| &self.edges[index])
    }

    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.out_edges(id).map(|edge| edge.target()).collect()
    }

    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        self.in_edges(id).map(|edge| edge.source()).collect()
    }

    /// Check the structural preconditions of the interpreters.
    ///
    /// - the in-node and the out-node (if declared) exist
    /// - every edge connects existing nodes
    /// - `IfIn` and `LoopIn` edges are conditional, `IfOut` edges are not
    /// - every node other than the in-node has a predecessor
    pub fn validate(&self) -> Result<()> {
        if !self.nodes.contains_key(&self.in_node) {
            return Err(AnalysisError::MalformedCfg(format!("in-node n{} does not exist", self.in_node)));
        }
        if let Some(out_node) = self.out_node {
            if !self.nodes.contains_key(&out_node) {
                return Err(AnalysisError::MalformedCfg(format!("out-node n{} does not exist", out_node)));
            }
        }

        for edge in &self.edges {
            for endpoint in [edge.source(), edge.target()] {
                if !self.nodes.contains_key(&endpoint) {
                    return Err(AnalysisError::MalformedCfg(format!(
                        "edge {} refers to missing node n{}",
                        edge, endpoint
                    )));
                }
            }
            let shape_ok = match (edge.kind(), edge) {
                (EdgeKind::IfIn | EdgeKind::LoopIn, Edge::Unconditional { .. }) => false,
                (EdgeKind::IfOut, Edge::Conditional { .. }) => false,
                _ => true,
            };
            if !shape_ok {
                return Err(AnalysisError::MalformedCfg(format!(
                    "edge {} has a kind that does not match its shape",
                    edge
                )));
            }
        }

        for &id in self.nodes.keys() {
            if id != self.in_node && self.in_edges(id).next().is_none() {
                return Err(AnalysisError::MalformedCfg(format!("node n{} has no predecessors", id)));
            }
        }

        Ok(())
    }
}

impl fmt::Display for ControlFlowGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CFG (in: n{}):", self.in_node)?;
        for node in self.nodes.values() {
            match node {
                Node::Basic { id, statements } => {
                    writeln!(f, "n{}:", id)?;
                    for statement in statements {
                        writeln!(f, "  {}", statement)?;
                    }
                }
                Node::Loop { id } => writeln!(f, "n{}: loop", id)?,
            }
        }
        for edge in &self.edges {
            writeln!(f, "{}", edge)?;
        }
        Ok(())
    }
}
