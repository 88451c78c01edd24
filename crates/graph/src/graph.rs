//! The graph data model: nodes keyed by id, plus directed field-to-field
//! edges.
//!
//! Nodes live in a `BTreeMap` so serialized JSON has deterministic key
//! ordering. Mutation helpers enforce the structural invariants (unique
//! node ids, no duplicate edges, endpoints must exist); [`Graph::validate`]
//! checks the whole-graph invariants (acyclicity, connectivity) before
//! hand-off.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::node::Node;

/// Errors from graph assembly and validation.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// No model selected in the parameter snapshot. Fatal precondition:
    /// the caller must not submit a request in this state.
    #[error("no model selected in generation parameters")]
    NoModel,

    /// A snapshot field failed validation.
    #[error("invalid generation parameters: {0}")]
    InvalidParams(#[from] igen_core::error::CoreError),

    /// A node with this id already exists in the graph.
    #[error("duplicate node id '{0}'")]
    DuplicateNode(String),

    /// An identical edge already exists in the graph.
    #[error("duplicate edge {0}")]
    DuplicateEdge(String),

    /// An edge endpoint references a node id not present in the graph.
    #[error("edge references unknown node '{0}'")]
    UnknownNode(String),

    /// The graph contains a dependency cycle.
    #[error("graph contains a cycle involving node '{0}'")]
    Cycle(String),

    /// A node participates in no edge and can never execute.
    #[error("node '{0}' is not connected to the graph")]
    DisconnectedNode(String),
}

/// One end of an edge: a node id plus the named output/input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeEndpoint {
    pub node_id: String,
    pub field: String,
}

/// A directed data dependency: `source` node's output field feeds the
/// `destination` node's input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: EdgeEndpoint,
    pub destination: EdgeEndpoint,
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.source.node_id, self.source.field, self.destination.node_id, self.destination.field
        )
    }
}

/// A directed acyclic graph of processing nodes, handed to the engine
/// for execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub id: String,
    pub nodes: BTreeMap<String, Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    /// Create an empty graph with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nodes: BTreeMap::new(),
            edges: Vec::new(),
        }
    }

    /// Insert a node. Node ids must be unique within the graph.
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        let id = node.id().to_string();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Insert an edge. Both endpoints must already exist and the exact
    /// edge must not already be present.
    pub fn add_edge(
        &mut self,
        source_id: &str,
        source_field: &str,
        dest_id: &str,
        dest_field: &str,
    ) -> Result<(), GraphError> {
        if !self.nodes.contains_key(source_id) {
            return Err(GraphError::UnknownNode(source_id.to_string()));
        }
        if !self.nodes.contains_key(dest_id) {
            return Err(GraphError::UnknownNode(dest_id.to_string()));
        }
        let edge = Edge {
            source: EdgeEndpoint {
                node_id: source_id.to_string(),
                field: source_field.to_string(),
            },
            destination: EdgeEndpoint {
                node_id: dest_id.to_string(),
                field: dest_field.to_string(),
            },
        };
        if self.edges.contains(&edge) {
            return Err(GraphError::DuplicateEdge(edge.to_string()));
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a node mutably by id.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Set a node's intermediate flag.
    pub fn set_intermediate(&mut self, id: &str, is_intermediate: bool) -> Result<(), GraphError> {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.set_intermediate(is_intermediate);
                Ok(())
            }
            None => Err(GraphError::UnknownNode(id.to_string())),
        }
    }

    /// Edges originating at `(source_id, field)`.
    pub fn edges_from(&self, source_id: &str, field: &str) -> Vec<Edge> {
        self.edges
            .iter()
            .filter(|e| e.source.node_id == source_id && e.source.field == field)
            .cloned()
            .collect()
    }

    /// Edges terminating at `(dest_id, field)`.
    pub fn edges_into(&self, dest_id: &str, field: &str) -> Vec<Edge> {
        self.edges
            .iter()
            .filter(|e| e.destination.node_id == dest_id && e.destination.field == field)
            .cloned()
            .collect()
    }

    /// Retarget the source of every edge currently originating at
    /// `old_id` on one of `fields`, so it originates at `new_id`
    /// instead. Returns the number of edges redirected.
    pub fn redirect_sources(&mut self, old_id: &str, new_id: &str, fields: &[&str]) -> usize {
        let mut redirected = 0;
        for edge in &mut self.edges {
            if edge.source.node_id == old_id && fields.contains(&edge.source.field.as_str()) {
                edge.source.node_id = new_id.to_string();
                redirected += 1;
            }
        }
        redirected
    }

    /// Remove and return every edge originating at `(source_id, field)`.
    /// Used when a step splices new nodes into an existing path.
    pub fn remove_edges_from(&mut self, source_id: &str, field: &str) -> Vec<Edge> {
        let (removed, kept) = self
            .edges
            .drain(..)
            .partition(|e| e.source.node_id == source_id && e.source.field == field);
        self.edges = kept;
        removed
    }

    /// Remove and return every edge terminating at `(dest_id, field)`.
    pub fn remove_edges_into(&mut self, dest_id: &str, field: &str) -> Vec<Edge> {
        let (removed, kept) = self
            .edges
            .drain(..)
            .partition(|e| e.destination.node_id == dest_id && e.destination.field == field);
        self.edges = kept;
        removed
    }

    /// Check the whole-graph invariants.
    ///
    /// - every edge endpoint names an existing node
    /// - no duplicate edges
    /// - the graph is acyclic
    /// - every node participates in at least one edge (single-node
    ///   graphs are exempt)
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut seen = BTreeSet::new();
        for edge in &self.edges {
            if !self.nodes.contains_key(&edge.source.node_id) {
                return Err(GraphError::UnknownNode(edge.source.node_id.clone()));
            }
            if !self.nodes.contains_key(&edge.destination.node_id) {
                return Err(GraphError::UnknownNode(edge.destination.node_id.clone()));
            }
            if !seen.insert(edge.to_string()) {
                return Err(GraphError::DuplicateEdge(edge.to_string()));
            }
        }

        self.check_acyclic()?;

        if self.nodes.len() > 1 {
            let mut connected: BTreeSet<&str> = BTreeSet::new();
            for edge in &self.edges {
                connected.insert(edge.source.node_id.as_str());
                connected.insert(edge.destination.node_id.as_str());
            }
            for id in self.nodes.keys() {
                if !connected.contains(id.as_str()) {
                    return Err(GraphError::DisconnectedNode(id.clone()));
                }
            }
        }

        Ok(())
    }

    /// Kahn's algorithm: repeatedly strip zero-in-degree nodes; anything
    /// left over sits on a cycle.
    fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut in_degree: BTreeMap<&str, usize> =
            self.nodes.keys().map(|id| (id.as_str(), 0)).collect();
        for edge in &self.edges {
            if let Some(count) = in_degree.get_mut(edge.destination.node_id.as_str()) {
                *count += 1;
            }
        }

        let mut queue: VecDeque<&str> = in_degree
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut processed = 0;
        while let Some(id) = queue.pop_front() {
            processed += 1;
            for edge in &self.edges {
                if edge.source.node_id == id {
                    if let Some(count) = in_degree.get_mut(edge.destination.node_id.as_str()) {
                        *count -= 1;
                        if *count == 0 {
                            queue.push_back(edge.destination.node_id.as_str());
                        }
                    }
                }
            }
        }

        if processed < self.nodes.len() {
            let stuck = in_degree
                .iter()
                .find(|(_, &count)| count > 0)
                .map(|(&id, _)| id.to_string())
                .unwrap_or_default();
            return Err(GraphError::Cycle(stuck));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    use crate::node::{CollectNode, ImageNsfwNode, ImageWatermarkNode};

    // Collect/post-process nodes have the smallest shapes, so tests use
    // them as generic stand-ins.
    fn stub(id: &str) -> Node {
        Node::Collect(CollectNode {
            id: id.to_string(),
            is_intermediate: true,
        })
    }

    fn graph_with(ids: &[&str]) -> Graph {
        let mut graph = Graph::new("test_graph");
        for id in ids {
            graph.add_node(stub(id)).unwrap();
        }
        graph
    }

    // -- Node insertion -----------------------------------------------------

    #[test]
    fn duplicate_node_id_rejected() {
        let mut graph = graph_with(&["a"]);
        assert_matches!(
            graph.add_node(stub("a")),
            Err(GraphError::DuplicateNode(id)) if id == "a"
        );
    }

    // -- Edge insertion -----------------------------------------------------

    #[test]
    fn edge_requires_existing_endpoints() {
        let mut graph = graph_with(&["a"]);
        assert_matches!(
            graph.add_edge("a", "out", "missing", "in"),
            Err(GraphError::UnknownNode(id)) if id == "missing"
        );
        assert_matches!(
            graph.add_edge("missing", "out", "a", "in"),
            Err(GraphError::UnknownNode(id)) if id == "missing"
        );
    }

    #[test]
    fn duplicate_edge_rejected() {
        let mut graph = graph_with(&["a", "b"]);
        graph.add_edge("a", "out", "b", "in").unwrap();
        assert_matches!(
            graph.add_edge("a", "out", "b", "in"),
            Err(GraphError::DuplicateEdge(_))
        );
    }

    #[test]
    fn parallel_edges_on_different_fields_allowed() {
        let mut graph = graph_with(&["a", "b"]);
        graph.add_edge("a", "unet", "b", "unet").unwrap();
        graph.add_edge("a", "clip", "b", "clip").unwrap();
        assert_eq!(graph.edges.len(), 2);
    }

    // -- Queries and rewiring -----------------------------------------------

    #[test]
    fn edges_from_and_into_filter_by_field() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.add_edge("a", "unet", "b", "unet").unwrap();
        graph.add_edge("a", "clip", "c", "clip").unwrap();

        assert_eq!(graph.edges_from("a", "unet").len(), 1);
        assert_eq!(graph.edges_from("a", "vae").len(), 0);
        assert_eq!(graph.edges_into("c", "clip").len(), 1);
        assert_eq!(graph.edges_into("b", "clip").len(), 0);
    }

    #[test]
    fn redirect_sources_moves_only_named_fields() {
        let mut graph = graph_with(&["a", "b", "c", "s"]);
        graph.add_edge("a", "unet", "b", "unet").unwrap();
        graph.add_edge("a", "clip", "c", "clip").unwrap();

        let moved = graph.redirect_sources("a", "s", &["unet", "vae"]);
        assert_eq!(moved, 1);
        assert_eq!(graph.edges_from("s", "unet").len(), 1);
        assert_eq!(graph.edges_from("a", "unet").len(), 0);
        // clip untouched
        assert_eq!(graph.edges_from("a", "clip").len(), 1);
    }

    #[test]
    fn remove_edges_returns_removed_set() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.add_edge("a", "unet", "b", "unet").unwrap();
        graph.add_edge("a", "unet", "c", "unet").unwrap();
        graph.add_edge("a", "clip", "b", "clip").unwrap();

        let removed = graph.remove_edges_from("a", "unet");
        assert_eq!(removed.len(), 2);
        assert_eq!(graph.edges.len(), 1);
    }

    // -- Validation ---------------------------------------------------------

    #[test]
    fn valid_chain_passes() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.add_edge("a", "out", "b", "in").unwrap();
        graph.add_edge("b", "out", "c", "in").unwrap();
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn dangling_edge_detected() {
        let mut graph = graph_with(&["a", "b"]);
        graph.add_edge("a", "out", "b", "in").unwrap();
        // Break the invariant behind the helper's back.
        graph.edges[0].destination.node_id = "ghost".to_string();
        assert_matches!(
            graph.validate(),
            Err(GraphError::UnknownNode(id)) if id == "ghost"
        );
    }

    #[test]
    fn cycle_detected() {
        let mut graph = graph_with(&["a", "b", "c"]);
        graph.add_edge("a", "out", "b", "in").unwrap();
        graph.add_edge("b", "out", "c", "in").unwrap();
        graph.add_edge("c", "out", "a", "in").unwrap();
        assert_matches!(graph.validate(), Err(GraphError::Cycle(_)));
    }

    #[test]
    fn disconnected_node_detected() {
        let mut graph = graph_with(&["a", "b", "island"]);
        graph.add_edge("a", "out", "b", "in").unwrap();
        assert_matches!(
            graph.validate(),
            Err(GraphError::DisconnectedNode(id)) if id == "island"
        );
    }

    #[test]
    fn single_node_graph_is_valid() {
        let graph = graph_with(&["only"]);
        assert!(graph.validate().is_ok());
    }

    // -- Serialization ------------------------------------------------------

    #[test]
    fn edge_serializes_wire_shape() {
        let mut graph = Graph::new("test_graph");
        graph.add_node(Node::ImageNsfw(ImageNsfwNode {
            id: "n".to_string(),
            is_intermediate: true,
        })).unwrap();
        graph.add_node(Node::ImageWatermark(ImageWatermarkNode {
            id: "w".to_string(),
            is_intermediate: false,
        })).unwrap();
        graph.add_edge("n", "image", "w", "image").unwrap();

        let json = serde_json::to_value(&graph).unwrap();
        let edge = &json["edges"][0];
        assert_eq!(edge["source"]["node_id"], "n");
        assert_eq!(edge["source"]["field"], "image");
        assert_eq!(edge["destination"]["node_id"], "w");
        assert_eq!(edge["destination"]["field"], "image");
    }
}
