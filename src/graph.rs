//! Trade network implementation using petgraph.

use crate::country::{Country, INCOME, PROPENSITY};
use crate::order::{NodeOrder, NodeVector};
use crate::{Error, Result};
use nalgebra::{DMatrix, DVector};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// A directed, weighted trade network with attributed nodes.
///
/// An edge `A -> B` with weight `w` reads "A imports `w` from B". After
/// [`normalize`](TradeGraph::normalize), `w` is the share of A's total imports
/// coming from B.
///
/// Node order is insertion order and is preserved by every derived graph.
///
/// # Example
///
/// ```rust
/// use cpnet::TradeGraph;
///
/// let mut g = TradeGraph::new();
/// g.add_flow("ARG", "BRA", 30.0);
/// g.add_flow("ARG", "CHL", 10.0);
///
/// let shares = g.normalize();
/// assert_eq!(shares.weight("ARG", "BRA"), Some(0.75));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TradeGraph {
    /// The underlying directed graph.
    graph: DiGraph<Country, f64>,

    /// Map from node id to node index.
    node_index: HashMap<String, NodeIndex>,
}

impl TradeGraph {
    /// Create an empty trade graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a trade graph with estimated capacity.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, edges),
            node_index: HashMap::with_capacity(nodes),
        }
    }

    /// Add a node if it does not exist yet. Returns `true` if it was added.
    pub fn add_node(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.node_index.contains_key(&id) {
            return false;
        }
        self.insert_country(Country::new(id));
        true
    }

    /// Add (or replace) a node together with its attributes.
    pub fn upsert_country(&mut self, country: Country) {
        if let Some(&idx) = self.node_index.get(&country.id) {
            self.graph[idx] = country;
        } else {
            self.insert_country(country);
        }
    }

    fn insert_country(&mut self, country: Country) -> NodeIndex {
        let id = country.id.clone();
        let idx = self.graph.add_node(country);
        self.node_index.insert(id, idx);
        idx
    }

    fn get_or_create(&mut self, id: &str) -> NodeIndex {
        match self.node_index.get(id) {
            Some(&idx) => idx,
            None => self.insert_country(Country::new(id)),
        }
    }

    /// Record an import flow: `importer` buys `value` from `exporter`.
    ///
    /// Missing nodes are created. Repeated flows between the same pair
    /// accumulate on a single edge.
    pub fn add_flow(&mut self, importer: &str, exporter: &str, value: f64) {
        let from = self.get_or_create(importer);
        let to = self.get_or_create(exporter);
        match self.graph.find_edge(from, to) {
            Some(edge) => self.graph[edge] += value,
            None => {
                self.graph.add_edge(from, to, value);
            }
        }
    }

    /// Set the weight of `from -> to`, replacing any previous value.
    pub fn set_weight(&mut self, from: &str, to: &str, weight: f64) {
        let from = self.get_or_create(from);
        let to = self.get_or_create(to);
        self.graph.update_edge(from, to, weight);
    }

    /// Weight of `from -> to`, if the edge exists.
    pub fn weight(&self, from: &str, to: &str) -> Option<f64> {
        let from = *self.node_index.get(from)?;
        let to = *self.node_index.get(to)?;
        self.graph.find_edge(from, to).map(|e| self.graph[e])
    }

    /// Total outgoing weight of a node (its total imports before normalization).
    pub fn out_weight(&self, id: &str) -> Option<f64> {
        let idx = *self.node_index.get(id)?;
        Some(self.row_total(idx))
    }

    fn row_total(&self, idx: NodeIndex) -> f64 {
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| *e.weight())
            .sum()
    }

    /// Row-normalize outgoing weights into import shares.
    ///
    /// Returns a new graph; `self` is not modified. A node with zero total
    /// outgoing weight keeps its edges with all-zero shares.
    pub fn normalize(&self) -> TradeGraph {
        let mut normalized = self.clone();
        let mut zero_rows = 0usize;
        for idx in self.graph.node_indices() {
            let total = self.row_total(idx);
            let usable = total != 0.0 && total.is_finite();
            if !usable {
                zero_rows += 1;
            }
            let edges: Vec<_> = self
                .graph
                .edges_directed(idx, Direction::Outgoing)
                .map(|e| e.id())
                .collect();
            for edge in edges {
                normalized.graph[edge] = if usable {
                    self.graph[edge] / total
                } else {
                    0.0
                };
            }
        }
        if zero_rows > 0 {
            warn!(zero_rows, "normalization found nodes without imports; their shares are zero");
        }
        normalized
    }

    /// Diagonal matrix of a named attribute, in node order.
    pub fn attribute_matrix(&self, name: &str) -> Result<DMatrix<f64>> {
        let values = self.attribute_values(name)?;
        Ok(DMatrix::from_diagonal(&values))
    }

    /// A named attribute as a vector over [`node_order`](Self::node_order).
    pub fn attribute_vector(&self, name: &str) -> Result<NodeVector> {
        let values = self.attribute_values(name)?;
        NodeVector::new(self.node_order(), values)
    }

    fn attribute_values(&self, name: &str) -> Result<DVector<f64>> {
        let values = self
            .graph
            .node_weights()
            .map(|c| {
                c.attribute(name).ok_or_else(|| Error::MissingAttribute {
                    node: c.id.clone(),
                    attribute: name.to_string(),
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(DVector::from_vec(values))
    }

    /// Import propensity vector (attribute `propension`).
    pub fn propensities(&self) -> Result<NodeVector> {
        self.attribute_vector(PROPENSITY)
    }

    /// Income vector (attribute `ingreso`).
    pub fn incomes(&self) -> Result<NodeVector> {
        self.attribute_vector(INCOME)
    }

    /// Bulk-assign a named attribute. Ids not in the graph are ignored.
    pub fn set_node_attribute(&mut self, values: &HashMap<String, f64>, name: &str) {
        for (id, &value) in values {
            if let Some(&idx) = self.node_index.get(id) {
                self.graph[idx].attributes.insert(name.to_string(), value);
            }
        }
    }

    /// Set a single attribute. Returns `false` if the node does not exist.
    pub fn set_attribute(&mut self, id: &str, name: &str, value: f64) -> bool {
        match self.node_index.get(id) {
            Some(&idx) => {
                self.graph[idx].attributes.insert(name.to_string(), value);
                true
            }
            None => false,
        }
    }

    /// Read a single attribute.
    pub fn node_attribute(&self, id: &str, name: &str) -> Option<f64> {
        self.country(id)?.attribute(name)
    }

    /// All present values of a named attribute.
    pub fn node_attributes(&self, name: &str) -> HashMap<String, f64> {
        self.graph
            .node_weights()
            .filter_map(|c| c.attribute(name).map(|v| (c.id.clone(), v)))
            .collect()
    }

    /// Get a node by id.
    pub fn country(&self, id: &str) -> Option<&Country> {
        self.node_index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Whether a node exists.
    pub fn contains(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    /// Dense adjacency matrix in node order (row = source).
    pub fn adjacency_matrix(&self) -> DMatrix<f64> {
        let n = self.graph.node_count();
        let mut m = DMatrix::zeros(n, n);
        for edge in self.graph.edge_references() {
            m[(edge.source().index(), edge.target().index())] += *edge.weight();
        }
        m
    }

    /// Stable node order (insertion order).
    pub fn node_order(&self) -> NodeOrder {
        NodeOrder::new(self.graph.node_weights().map(|c| c.id.clone()))
    }

    /// Iterate over nodes in order.
    pub fn countries(&self) -> impl Iterator<Item = &Country> {
        self.graph.node_weights()
    }

    /// Iterate over `(from, to, weight)` edges.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].id.as_str(),
                self.graph[e.target()].id.as_str(),
                *e.weight(),
            )
        })
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// A copy without the given nodes (and their edges).
    ///
    /// Surviving nodes keep their relative order. Unknown ids are ignored.
    pub fn without_nodes<S: AsRef<str>>(&self, removed: &[S]) -> TradeGraph {
        let removed: HashSet<&str> = removed.iter().map(|s| s.as_ref()).collect();
        let mut out = TradeGraph::with_capacity(self.node_count(), self.edge_count());
        let mut remap = HashMap::with_capacity(self.node_count());
        for idx in self.graph.node_indices() {
            let country = &self.graph[idx];
            if !removed.contains(country.id.as_str()) {
                remap.insert(idx, out.insert_country(country.clone()));
            }
        }
        for edge in self.graph.edge_references() {
            if let (Some(&s), Some(&t)) = (remap.get(&edge.source()), remap.get(&edge.target())) {
                out.graph.add_edge(s, t, *edge.weight());
            }
        }
        out
    }

    /// Build a graph from a dense matrix, dropping zero entries.
    ///
    /// `order` names the rows/columns; node attributes start empty.
    pub(crate) fn from_matrix(order: &NodeOrder, matrix: &DMatrix<f64>) -> TradeGraph {
        let n = order.len();
        let mut out = TradeGraph::with_capacity(n, n * n);
        let indices: Vec<NodeIndex> = order
            .iter()
            .map(|id| out.insert_country(Country::new(id)))
            .collect();
        for (i, &from) in indices.iter().enumerate() {
            for (j, &to) in indices.iter().enumerate() {
                let w = matrix[(i, j)];
                if w != 0.0 {
                    out.graph.add_edge(from, to, w);
                }
            }
        }
        out
    }

    /// Get the underlying petgraph for advanced operations.
    pub fn as_petgraph(&self) -> &DiGraph<Country, f64> {
        &self.graph
    }
}
