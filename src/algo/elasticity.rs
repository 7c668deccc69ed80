//! Income-elasticity matrix and the influence graph derived from it.
//!
//! # Definition
//!
//! With `M` the import-coefficient matrix (a normalized [`TradeGraph`]),
//! `P` the diagonal of import propensities and `Y` the diagonal of incomes:
//!
//! ```text
//! E = Y · P · M · (I − P·M)⁻¹ · Y⁻¹
//! ```
//!
//! `E[i][j]` measures how an income shock at `j` reaches `i` once every
//! indirect trade linkage has been followed; the `(I − P·M)⁻¹` factor is the
//! trade analogue of a Leontief inverse.
//!
//! # Singularity
//!
//! `(I − P·M)` is only invertible when import leakage keeps the multiplier
//! bounded. When every node imports and every propensity is 1, `P·M` is row
//! stochastic and `(I − P·M)·1 = 0`. The engine estimates the condition number
//! from the singular values and refuses to produce a matrix past
//! [`ElasticityConfig::threshold`].

use crate::country::{INCOME, PROPENSITY};
use crate::graph::TradeGraph;
use crate::order::{NodeOrder, NodeVector};
use crate::{Error, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for [`ElasticityEngine`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElasticityConfig {
    /// Largest accepted condition number of `(I − P·M)`.
    ///
    /// `None` uses the usual rank tolerance of double-precision solvers,
    /// `1 / (n · f64::EPSILON)` for an `n`-node system.
    pub max_condition_number: Option<f64>,
}

impl ElasticityConfig {
    /// Effective threshold for an `n`-node system.
    #[allow(clippy::cast_precision_loss)]
    pub fn threshold(&self, n: usize) -> f64 {
        self.max_condition_number
            .unwrap_or_else(|| 1.0 / (n.max(1) as f64 * f64::EPSILON))
    }
}

/// Dense elasticity matrix indexed by a [`NodeOrder`].
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticityMatrix {
    order: NodeOrder,
    matrix: DMatrix<f64>,
}

impl ElasticityMatrix {
    /// Pair a square matrix with the order naming its rows and columns.
    pub fn new(order: NodeOrder, matrix: DMatrix<f64>) -> Result<Self> {
        let n = order.len();
        if matrix.nrows() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: matrix.nrows(),
            });
        }
        if matrix.ncols() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: matrix.ncols(),
            });
        }
        Ok(Self { order, matrix })
    }

    /// Node order of rows and columns.
    pub fn order(&self) -> &NodeOrder {
        &self.order
    }

    /// The raw matrix.
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True for a 0×0 matrix.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entry `E[from][to]`.
    pub fn get(&self, from: &str, to: &str) -> Option<f64> {
        let i = self.order.index_of(from)?;
        let j = self.order.index_of(to)?;
        Some(self.matrix[(i, j)])
    }
}

/// Directed graph whose edge weights are elasticity-matrix entries.
///
/// Same node set and order as the trade graph it came from, with
/// `propension` and `ingreso` copied across unchanged.
#[derive(Debug, Clone)]
pub struct InfluenceGraph {
    graph: TradeGraph,
}

impl InfluenceGraph {
    /// Build from an elasticity matrix, taking node attributes from `source`.
    ///
    /// Zero entries produce no edge.
    pub fn from_matrix(elasticity: &ElasticityMatrix, source: &TradeGraph) -> Self {
        let mut graph = TradeGraph::from_matrix(elasticity.order(), elasticity.as_matrix());
        for name in [PROPENSITY, INCOME] {
            graph.set_node_attribute(&source.node_attributes(name), name);
        }
        Self { graph }
    }

    /// Wrap a graph whose weights already are elasticities (e.g. loaded from disk).
    pub fn from_graph(graph: TradeGraph) -> Self {
        Self { graph }
    }

    /// Reassemble the dense elasticity matrix.
    pub fn elasticity_matrix(&self) -> ElasticityMatrix {
        ElasticityMatrix {
            order: self.graph.node_order(),
            matrix: self.graph.adjacency_matrix(),
        }
    }

    /// The influence graph restricted to the surviving nodes.
    pub fn without_nodes<S: AsRef<str>>(&self, removed: &[S]) -> InfluenceGraph {
        Self {
            graph: self.graph.without_nodes(removed),
        }
    }

    /// Elasticity of `from -> to` (0 when there is no edge between known nodes).
    pub fn weight(&self, from: &str, to: &str) -> Option<f64> {
        if !self.graph.contains(from) || !self.graph.contains(to) {
            return None;
        }
        Some(self.graph.weight(from, to).unwrap_or(0.0))
    }

    /// Import propensities in node order.
    pub fn propensities(&self) -> Result<NodeVector> {
        self.graph.propensities()
    }

    /// Incomes in node order.
    pub fn incomes(&self) -> Result<NodeVector> {
        self.graph.incomes()
    }

    /// Node order.
    pub fn node_order(&self) -> NodeOrder {
        self.graph.node_order()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// The underlying attributed graph.
    pub fn as_graph(&self) -> &TradeGraph {
        &self.graph
    }

    /// Give up the wrapper.
    pub fn into_graph(self) -> TradeGraph {
        self.graph
    }
}

/// Computes elasticity matrices from normalized trade graphs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElasticityEngine {
    config: ElasticityConfig,
}

impl ElasticityEngine {
    /// Create an engine.
    pub fn new(config: ElasticityConfig) -> Self {
        Self { config }
    }

    /// Engine configuration.
    pub fn config(&self) -> &ElasticityConfig {
        &self.config
    }

    /// Compute the elasticity matrix only.
    ///
    /// `graph` must already be normalized; every node must carry
    /// `propension` and `ingreso`, and income must be nonzero.
    pub fn elasticity_matrix(&self, graph: &TradeGraph) -> Result<ElasticityMatrix> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyGraph);
        }
        let order = graph.node_order();
        let propensity = graph.propensities()?;
        let income = graph.incomes()?;
        validate(&propensity, PROPENSITY, |p| p.is_finite())?;
        validate(&income, INCOME, |y| y.is_finite() && y != 0.0)?;

        let p = propensity.values();
        let y = income.values();
        let m = graph.adjacency_matrix();

        // P·M scales row i by p_i.
        let pm = DMatrix::from_fn(n, n, |i, j| p[i] * m[(i, j)]);
        let system = DMatrix::<f64>::identity(n, n) - &pm;

        let condition_number = condition_number(&system);
        debug!(nodes = n, condition_number, "elasticity system assembled");
        if !(condition_number <= self.config.threshold(n)) {
            return Err(Error::SingularElasticityMatrix { condition_number });
        }
        let inverse = system
            .try_inverse()
            .ok_or(Error::SingularElasticityMatrix { condition_number })?;
        if inverse.iter().any(|v| !v.is_finite()) {
            return Err(Error::SingularElasticityMatrix { condition_number });
        }

        // Y·(P·M·inv)·Y⁻¹ scales row i by y_i and column j by 1/y_j.
        let core = &pm * &inverse;
        let matrix = DMatrix::from_fn(n, n, |i, j| y[i] * core[(i, j)] / y[j]);

        ElasticityMatrix::new(order, matrix)
    }

    /// Compute the elasticity matrix and its influence graph.
    pub fn compute(&self, graph: &TradeGraph) -> Result<(ElasticityMatrix, InfluenceGraph)> {
        let elasticity = self.elasticity_matrix(graph)?;
        let influence = InfluenceGraph::from_matrix(&elasticity, graph);
        Ok((elasticity, influence))
    }
}

fn validate(values: &NodeVector, attribute: &str, ok: impl Fn(f64) -> bool) -> Result<()> {
    match values.iter().find(|&(_, v)| !ok(v)) {
        Some((node, value)) => Err(Error::InvalidAttribute {
            node: node.to_string(),
            attribute: attribute.to_string(),
            value,
        }),
        None => Ok(()),
    }
}

/// Ratio of extreme singular values (infinite when the smallest is zero).
fn condition_number(matrix: &DMatrix<f64>) -> f64 {
    if matrix.iter().any(|v| !v.is_finite()) {
        return f64::INFINITY;
    }
    let singular = matrix.clone().svd(false, false).singular_values;
    let max = singular.iter().copied().fold(0.0_f64, f64::max);
    let min = singular.iter().copied().fold(f64::INFINITY, f64::min);
    if min == 0.0 {
        f64::INFINITY
    } else {
        max / min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A imports evenly from B and C; B and C import only from A.
    fn triangle() -> TradeGraph {
        let mut g = TradeGraph::new();
        g.add_flow("A", "B", 0.5);
        g.add_flow("A", "C", 0.5);
        g.add_flow("B", "A", 1.0);
        g.add_flow("C", "A", 1.0);
        for id in ["A", "B", "C"] {
            g.set_attribute(id, PROPENSITY, 0.2);
        }
        g.set_attribute("A", INCOME, 100.0);
        g.set_attribute("B", INCOME, 50.0);
        g.set_attribute("C", INCOME, 50.0);
        g
    }

    #[test]
    fn test_elasticity_triangle_values() {
        let engine = ElasticityEngine::default();
        let e = engine.elasticity_matrix(&triangle()).unwrap();

        let expected = [
            [1.0 / 24.0, 5.0 / 24.0, 5.0 / 24.0],
            [5.0 / 48.0, 1.0 / 48.0, 1.0 / 48.0],
            [5.0 / 48.0, 1.0 / 48.0, 1.0 / 48.0],
        ];
        for (i, row) in expected.iter().enumerate() {
            for (j, want) in row.iter().enumerate() {
                let got = e.as_matrix()[(i, j)];
                assert!((got - want).abs() < 1e-12, "E[{i}][{j}] = {got}, want {want}");
            }
        }
        assert_eq!(e.get("A", "B"), Some(e.as_matrix()[(0, 1)]));
    }

    #[test]
    fn test_singular_when_no_leakage() {
        let mut g = triangle();
        for id in ["A", "B", "C"] {
            g.set_attribute(id, PROPENSITY, 1.0);
        }
        let err = ElasticityEngine::default().elasticity_matrix(&g).unwrap_err();
        assert!(matches!(err, Error::SingularElasticityMatrix { .. }), "{err:?}");
    }

    #[test]
    fn test_strict_threshold_rejects_well_posed_system() {
        let engine = ElasticityEngine::new(ElasticityConfig {
            max_condition_number: Some(1.0),
        });
        let err = engine.elasticity_matrix(&triangle()).unwrap_err();
        match err {
            Error::SingularElasticityMatrix { condition_number } => {
                assert!(condition_number > 1.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_income() {
        let mut g = triangle();
        g.add_node("D");
        g.set_attribute("D", PROPENSITY, 0.1);
        let err = ElasticityEngine::default().compute(&g).unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { ref node, .. } if node == "D"));
    }

    #[test]
    fn test_zero_income_rejected() {
        let mut g = triangle();
        g.set_attribute("B", INCOME, 0.0);
        let err = ElasticityEngine::default().compute(&g).unwrap_err();
        assert!(matches!(err, Error::InvalidAttribute { ref node, .. } if node == "B"));
    }

    #[test]
    fn test_empty_graph() {
        let err = ElasticityEngine::default()
            .compute(&TradeGraph::new())
            .unwrap_err();
        assert!(matches!(err, Error::EmptyGraph));
    }

    #[test]
    fn test_influence_graph_matches_matrix() {
        let g = triangle();
        let (e, influence) = ElasticityEngine::default().compute(&g).unwrap();

        assert_eq!(influence.node_order(), g.node_order());
        assert_eq!(influence.elasticity_matrix(), e);
        assert_eq!(influence.weight("B", "A"), e.get("B", "A"));
        assert_eq!(influence.weight("B", "ZZ"), None);
        for id in ["A", "B", "C"] {
            for name in [PROPENSITY, INCOME] {
                assert_eq!(
                    influence.as_graph().node_attribute(id, name).map(f64::to_bits),
                    g.node_attribute(id, name).map(f64::to_bits)
                );
            }
        }
    }

    #[test]
    fn test_isolated_node_has_zero_row() {
        let mut g = triangle();
        g.add_node("D");
        g.set_attribute("D", PROPENSITY, 0.3);
        g.set_attribute("D", INCOME, 10.0);
        let e = ElasticityEngine::default().elasticity_matrix(&g).unwrap();
        assert!(e.as_matrix().row(3).iter().all(|&v| v == 0.0));
    }
}
