//! Graph interchange / export types.
//!
//! This module provides a **serde-friendly** representation of trade and
//! influence graphs for the stages around the analysis (loaders, reporting,
//! graph databases) rather than for the algorithms themselves.
//!
//! - nodes have an `id` and named scalar `attributes`
//! - edges have `source`, `target` and `weight`
//!
//! Partition results serialize directly; see [`PartitionResult::to_json`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::algo::center_periphery::PartitionResult;
use crate::algo::elasticity::InfluenceGraph;
use crate::country::Country;
use crate::graph::TradeGraph;
use crate::{Error, Result};

/// A node in an interchange graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique node identifier.
    pub id: String,
    /// Named scalar attributes (`propension`, `ingreso`, ...).
    #[serde(default)]
    pub attributes: BTreeMap<String, f64>,
}

impl GraphNode {
    /// Create a node without attributes.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute to the node.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// An edge in an interchange graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source node ID.
    pub source: String,
    /// Target node ID.
    pub target: String,
    /// Edge weight (import flow, share or elasticity).
    pub weight: f64,
}

impl GraphEdge {
    /// Create a new graph edge.
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, weight: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }
}

/// A complete graph document ready for export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Nodes, in graph order.
    pub nodes: Vec<GraphNode>,
    /// Edges.
    pub edges: Vec<GraphEdge>,
    /// Document metadata.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl GraphDocument {
    /// Create an empty graph document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add metadata to the graph document.
    #[must_use]
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Snapshot a trade graph.
    #[must_use]
    pub fn from_trade_graph(graph: &TradeGraph) -> Self {
        Self {
            nodes: graph
                .countries()
                .map(|c| GraphNode {
                    id: c.id.clone(),
                    attributes: c.attributes.clone(),
                })
                .collect(),
            edges: graph
                .edges()
                .map(|(s, t, w)| GraphEdge::new(s, t, w))
                .collect(),
            metadata: HashMap::new(),
        }
    }

    /// Snapshot an influence graph (tagged `kind = "influence"`).
    #[must_use]
    pub fn from_influence_graph(graph: &InfluenceGraph) -> Self {
        Self::from_trade_graph(graph.as_graph()).with_metadata("kind", "influence")
    }

    /// Rebuild a trade graph.
    ///
    /// Node order follows the document. Edges must reference declared nodes.
    pub fn to_trade_graph(&self) -> Result<TradeGraph> {
        let mut graph = TradeGraph::with_capacity(self.nodes.len(), self.edges.len());
        for node in &self.nodes {
            if graph.contains(&node.id) {
                return Err(Error::DuplicateNode(node.id.clone()));
            }
            graph.upsert_country(Country {
                id: node.id.clone(),
                attributes: node.attributes.clone(),
            });
        }
        for edge in &self.edges {
            for id in [&edge.source, &edge.target] {
                if !graph.contains(id) {
                    return Err(Error::UnknownNode(id.clone()));
                }
            }
            graph.add_flow(&edge.source, &edge.target, edge.weight);
        }
        Ok(graph)
    }

    /// Rebuild an influence graph.
    pub fn to_influence_graph(&self) -> Result<InfluenceGraph> {
        Ok(InfluenceGraph::from_graph(self.to_trade_graph()?))
    }

    /// Get node count.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get edge count.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check if graph is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Export to NetworkX-compatible JSON format.
    ///
    /// This format can be loaded directly with:
    /// ```python
    /// import networkx as nx
    /// import json
    /// with open('graph.json') as f:
    ///     data = json.load(f)
    /// G = nx.node_link_graph(data)
    /// ```
    pub fn to_networkx_json(&self) -> Result<String> {
        #[derive(Serialize)]
        struct NetworkXGraph<'a> {
            directed: bool,
            multigraph: bool,
            graph: &'a HashMap<String, serde_json::Value>,
            nodes: Vec<NetworkXNode<'a>>,
            links: Vec<NetworkXLink<'a>>,
        }

        #[derive(Serialize)]
        struct NetworkXNode<'a> {
            id: &'a str,
            #[serde(flatten)]
            attributes: &'a BTreeMap<String, f64>,
        }

        #[derive(Serialize)]
        struct NetworkXLink<'a> {
            source: &'a str,
            target: &'a str,
            weight: f64,
        }

        let graph = NetworkXGraph {
            directed: true,
            multigraph: false,
            graph: &self.metadata,
            nodes: self
                .nodes
                .iter()
                .map(|n| NetworkXNode {
                    id: &n.id,
                    attributes: &n.attributes,
                })
                .collect(),
            links: self
                .edges
                .iter()
                .map(|e| NetworkXLink {
                    source: &e.source,
                    target: &e.target,
                    weight: e.weight,
                })
                .collect(),
        };

        Ok(serde_json::to_string_pretty(&graph)?)
    }
}

impl PartitionResult {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
