//! In-memory host graph
//!
//! [`RecordingGraph`] stands in for Web Audio on hosts without one (native
//! builds, tests). It keeps the edge set and an ordered log of every
//! connect/disconnect call, and enforces the same rules Web Audio does:
//! nodes from different graphs cannot be connected, and removing a route
//! that does not exist is an error.

use crate::error::{PipelineError, Result};
use crate::graph::{AudioNode, NodeHandle, ProcessingContext};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Identifier of a node within one [`RecordingGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Creation index within the graph
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// Graph operation, in the order it was performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphOp {
    Connect { from: NodeId, to: NodeId },
    Disconnect { from: NodeId, to: NodeId },
}

#[derive(Debug, Default)]
struct GraphState {
    labels: Vec<String>,
    edges: Vec<(NodeId, NodeId)>,
    operations: Vec<GraphOp>,
    refused: HashSet<NodeId>,
}

/// In-memory audio graph that records its wiring
#[derive(Debug, Clone, Default)]
pub struct RecordingGraph {
    state: Rc<RefCell<GraphState>>,
}

impl RecordingGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node in this graph
    pub fn create_node(&self, label: impl Into<String>) -> Rc<RecordingNode> {
        let mut state = self.state.borrow_mut();
        let id = NodeId(state.labels.len());
        state.labels.push(label.into());

        Rc::new(RecordingNode {
            id,
            graph: self.clone(),
        })
    }

    /// Make every future connection into `node` fail
    pub fn refuse_connections_to(&self, node: NodeId) {
        self.state.borrow_mut().refused.insert(node);
    }

    /// Accept connections into `node` again
    pub fn allow_connections_to(&self, node: NodeId) {
        self.state.borrow_mut().refused.remove(&node);
    }

    /// Check if audio is routed directly from `from` into `to`
    pub fn is_connected(&self, from: NodeId, to: NodeId) -> bool {
        self.state.borrow().edges.contains(&(from, to))
    }

    /// Direct outputs of `node`, in connection order
    pub fn outgoing(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .borrow()
            .edges
            .iter()
            .filter(|(from, _)| *from == node)
            .map(|(_, to)| *to)
            .collect()
    }

    /// Follow the chain starting at `start`
    ///
    /// Stops at a node with no outputs, a node that fans out to more than
    /// one output, or a node already visited.
    pub fn walk_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut path = vec![start];
        let mut current = start;

        loop {
            let outgoing = self.outgoing(current);
            let [next] = outgoing.as_slice() else {
                return path;
            };
            if path.contains(next) {
                return path;
            }
            path.push(*next);
            current = *next;
        }
    }

    /// Labels along [`RecordingGraph::walk_from`]
    pub fn walk_labels(&self, start: NodeId) -> Vec<String> {
        self.walk_from(start)
            .into_iter()
            .filter_map(|id| self.label_of(id))
            .collect()
    }

    /// Label the node was created with
    pub fn label_of(&self, node: NodeId) -> Option<String> {
        self.state.borrow().labels.get(node.0).cloned()
    }

    /// Every connect/disconnect performed so far
    pub fn operations(&self) -> Vec<GraphOp> {
        self.state.borrow().operations.clone()
    }

    /// Forget the operation log, keeping the edges
    pub fn clear_operations(&self) {
        self.state.borrow_mut().operations.clear();
    }

    /// Number of live routes
    pub fn edge_count(&self) -> usize {
        self.state.borrow().edges.len()
    }

    fn same_graph(&self, other: &RecordingGraph) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    fn connect(&self, from: NodeId, to: NodeId) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.refused.contains(&to) {
            return Err(PipelineError::graph(format!(
                "connection into '{}' refused",
                state.labels[to.0]
            )));
        }

        // Web Audio ignores repeated connections between the same pair
        if !state.edges.contains(&(from, to)) {
            state.edges.push((from, to));
        }
        state.operations.push(GraphOp::Connect { from, to });
        trace!(%from, %to, "connect");
        Ok(())
    }

    fn disconnect(&self, from: NodeId, to: NodeId) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let Some(position) = state.edges.iter().position(|edge| *edge == (from, to)) else {
            return Err(PipelineError::graph(format!(
                "'{}' is not connected to '{}'",
                state.labels[from.0], state.labels[to.0]
            )));
        };

        state.edges.remove(position);
        state.operations.push(GraphOp::Disconnect { from, to });
        trace!(%from, %to, "disconnect");
        Ok(())
    }
}

/// Node in a [`RecordingGraph`]
#[derive(Debug)]
pub struct RecordingNode {
    id: NodeId,
    graph: RecordingGraph,
}

impl RecordingNode {
    /// Node identifier
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Label the node was created with
    pub fn label(&self) -> String {
        self.graph.label_of(self.id).unwrap_or_default()
    }

    fn peer<'a>(&self, other: &'a dyn AudioNode) -> Result<&'a RecordingNode> {
        let other = other
            .as_any()
            .downcast_ref::<RecordingNode>()
            .ok_or_else(|| PipelineError::graph("node does not belong to a recording graph"))?;

        if !self.graph.same_graph(&other.graph) {
            return Err(PipelineError::graph(format!(
                "'{}' and '{}' belong to different graphs",
                self.label(),
                other.label()
            )));
        }
        Ok(other)
    }
}

impl AudioNode for RecordingNode {
    fn connect(&self, destination: &dyn AudioNode) -> Result<()> {
        let destination = self.peer(destination)?;
        self.graph.connect(self.id, destination.id)
    }

    fn disconnect(&self, destination: &dyn AudioNode) -> Result<()> {
        let destination = self.peer(destination)?;
        self.graph.disconnect(self.id, destination.id)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Processing context over a [`RecordingGraph`]
#[derive(Debug)]
pub struct RecordingContext {
    graph: RecordingGraph,
    destination: Rc<RecordingNode>,
    running: Cell<bool>,
    resumes: Cell<u32>,
}

impl RecordingContext {
    /// Create a running context with a fresh destination node
    pub fn new(graph: &RecordingGraph) -> Self {
        Self {
            graph: graph.clone(),
            destination: graph.create_node("destination"),
            running: Cell::new(true),
            resumes: Cell::new(0),
        }
    }

    /// Create a context that starts suspended, as after a blocked auto-play
    pub fn suspended(graph: &RecordingGraph) -> Self {
        let context = Self::new(graph);
        context.running.set(false);
        context
    }

    /// Graph the context belongs to
    pub fn graph(&self) -> &RecordingGraph {
        &self.graph
    }

    /// Typed destination node
    pub fn destination_node(&self) -> &Rc<RecordingNode> {
        &self.destination
    }

    /// Stop producing audio
    pub fn suspend(&self) {
        self.running.set(false);
    }

    /// Number of times `resume` was called
    pub fn resume_count(&self) -> u32 {
        self.resumes.get()
    }
}

impl ProcessingContext for RecordingContext {
    fn destination(&self) -> NodeHandle {
        self.destination.clone()
    }

    fn is_running(&self) -> bool {
        self.running.get()
    }

    fn resume(&self) -> Result<()> {
        self.resumes.set(self.resumes.get() + 1);
        self.running.set(true);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_records_edge_and_operation() {
        let graph = RecordingGraph::new();
        let source = graph.create_node("source");
        let gain = graph.create_node("gain");

        source.connect(&*gain).unwrap();

        assert!(graph.is_connected(source.id(), gain.id()));
        assert_eq!(
            graph.operations(),
            vec![GraphOp::Connect {
                from: source.id(),
                to: gain.id()
            }]
        );
    }

    #[test]
    fn repeated_connect_keeps_single_edge() {
        let graph = RecordingGraph::new();
        let a = graph.create_node("a");
        let b = graph.create_node("b");

        a.connect(&*b).unwrap();
        a.connect(&*b).unwrap();

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.operations().len(), 2);
    }

    #[test]
    fn disconnect_missing_edge_fails() {
        let graph = RecordingGraph::new();
        let a = graph.create_node("a");
        let b = graph.create_node("b");

        let err = a.disconnect(&*b).unwrap_err();
        assert!(matches!(err, PipelineError::Graph(_)));
        assert!(graph.operations().is_empty());
    }

    #[test]
    fn nodes_from_different_graphs_cannot_connect() {
        let left = RecordingGraph::new();
        let right = RecordingGraph::new();
        let a = left.create_node("a");
        let b = right.create_node("b");

        assert!(a.connect(&*b).is_err());
        assert_eq!(left.edge_count(), 0);
    }

    #[test]
    fn refused_connections_fail_until_allowed() {
        let graph = RecordingGraph::new();
        let a = graph.create_node("a");
        let b = graph.create_node("b");

        graph.refuse_connections_to(b.id());
        assert!(a.connect(&*b).is_err());

        graph.allow_connections_to(b.id());
        assert!(a.connect(&*b).is_ok());
    }

    #[test]
    fn walk_follows_single_outputs() {
        let graph = RecordingGraph::new();
        let source = graph.create_node("source");
        let eq = graph.create_node("eq");
        let destination = graph.create_node("destination");

        source.connect(&*eq).unwrap();
        eq.connect(&*destination).unwrap();

        assert_eq!(
            graph.walk_labels(source.id()),
            vec!["source", "eq", "destination"]
        );
        assert_eq!(graph.outgoing(destination.id()), Vec::new());
    }

    #[test]
    fn walk_stops_at_cycle() {
        let graph = RecordingGraph::new();
        let a = graph.create_node("a");
        let b = graph.create_node("b");

        a.connect(&*b).unwrap();
        b.connect(&*a).unwrap();

        assert_eq!(graph.walk_from(a.id()), vec![a.id(), b.id()]);
    }

    #[test]
    fn context_resume_counts() {
        let graph = RecordingGraph::new();
        let context = RecordingContext::suspended(&graph);
        assert!(!context.is_running());

        context.resume().unwrap();
        assert!(context.is_running());
        assert_eq!(context.resume_count(), 1);
        assert_eq!(
            graph.label_of(context.destination_node().id()).as_deref(),
            Some("destination")
        );
    }
}
