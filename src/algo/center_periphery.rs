//! Recursive center-periphery partitioning.
//!
//! # Algorithm
//!
//! 1. Rank the nodes by the influence each one exerts on the rest of the
//!    network, `gg(w_{n}, w_{rest})`, descending. Ties keep node order.
//! 2. While more than two nodes remain, grow a candidate center one ranked
//!    node at a time (never taking the last one, so the periphery is never
//!    empty) and score each prefix with the power balance against the
//!    complementary periphery.
//! 3. The best prefix wins the level. Only a strictly larger balance replaces
//!    the current best, so ties keep the smaller center.
//! 4. Remove the winners and repeat on the residual network.
//!
//! The search is greedy: it only explores prefixes of one ranking, not every
//! subset, and by default ranks once on the full network
//! ([`RankingPolicy::Initial`]).
//!
//! # Residual networks
//!
//! [`CenterPeripheryFinder::from_influence`] restricts the full elasticity
//! matrix to the surviving nodes at every level.
//! [`CenterPeripheryFinder::from_trade`] instead re-runs the
//! [`ElasticityEngine`] on the residual trade network, so a singular residual
//! system aborts the run.

use crate::algo::elasticity::{ElasticityEngine, ElasticityMatrix, InfluenceGraph};
use crate::algo::influence::InfluenceCalculator;
use crate::algo::participation::ParticipationCalculator;
use crate::algo::power_balance::PowerBalanceCalculator;
use crate::graph::TradeGraph;
use crate::order::{NodeOrder, NodeVector};
use crate::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info, trace, warn};

/// When to rank nodes by their influence on the rest of the network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPolicy {
    /// Rank once on the full network; later levels only drop the winners.
    #[default]
    Initial,
    /// Re-rank on the residual network at the start of every level.
    PerLevel,
}

/// Configuration for [`CenterPeripheryFinder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    /// Ranking policy.
    pub ranking: RankingPolicy,
    /// Score a level's candidate centers on the rayon pool.
    ///
    /// Results are merged in candidate order, so the outcome is identical
    /// to the sequential search.
    pub parallel: bool,
}

/// Best center found at one recursion depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionLevel {
    /// Recursion depth, starting at 0.
    pub level: usize,
    /// Power balance of the center over the periphery of that level.
    pub power_balance: f64,
    /// Center nodes, in ranking order.
    pub nodes: Vec<String>,
}

/// Ordered nested centers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionResult {
    /// Levels, outermost center first.
    pub levels: Vec<PartitionLevel>,
    /// Nodes left when the search stopped (at most two).
    pub remaining: Vec<String>,
}

impl PartitionResult {
    /// Number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// True if no level was found.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Iterate over levels.
    pub fn iter(&self) -> impl Iterator<Item = &PartitionLevel> {
        self.levels.iter()
    }

    /// Level at which a node joined a center, `None` if it never did.
    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.levels
            .iter()
            .find(|l| l.nodes.iter().any(|n| n == id))
            .map(|l| l.level)
    }

    /// Total number of nodes assigned to some center.
    pub fn assigned(&self) -> usize {
        self.levels.iter().map(|l| l.nodes.len()).sum()
    }
}

/// Working network the finder shrinks level by level.
#[derive(Debug, Clone)]
enum Residual {
    Influence(InfluenceGraph),
    Trade {
        graph: TradeGraph,
        engine: ElasticityEngine,
    },
}

impl Residual {
    fn node_count(&self) -> usize {
        match self {
            Residual::Influence(g) => g.node_count(),
            Residual::Trade { graph, .. } => graph.node_count(),
        }
    }

    fn node_order(&self) -> NodeOrder {
        match self {
            Residual::Influence(g) => g.node_order(),
            Residual::Trade { graph, .. } => graph.node_order(),
        }
    }

    fn without_nodes(&self, removed: &[String]) -> Residual {
        match self {
            Residual::Influence(g) => Residual::Influence(g.without_nodes(removed)),
            Residual::Trade { graph, engine } => Residual::Trade {
                graph: graph.without_nodes(removed),
                engine: *engine,
            },
        }
    }

    fn snapshot(&self) -> Result<LevelSnapshot> {
        let (elasticity, propensity, participation) = match self {
            Residual::Influence(g) => (
                g.elasticity_matrix(),
                g.propensities()?,
                ParticipationCalculator::from_influence(g)?,
            ),
            Residual::Trade { graph, engine } => (
                engine.elasticity_matrix(graph)?,
                graph.propensities()?,
                ParticipationCalculator::from_graph(graph)?,
            ),
        };
        Ok(LevelSnapshot {
            elasticity,
            propensity,
            participation,
        })
    }
}

/// Everything a level needs, derived fresh from the residual network.
#[derive(Debug)]
struct LevelSnapshot {
    elasticity: ElasticityMatrix,
    propensity: NodeVector,
    participation: ParticipationCalculator,
}

impl LevelSnapshot {
    /// Nodes sorted by influence on the rest of the network, descending.
    fn rank(&self) -> Result<Vec<String>> {
        let influence = InfluenceCalculator::new(&self.elasticity);
        let mut scores = Vec::with_capacity(self.elasticity.len());
        for id in self.elasticity.order().iter() {
            let node = self.participation.participation(&[id])?;
            let rest = self.participation.complement(&[id])?;
            let score = finite("influence", &[id], influence.group_to_group(&node, &rest)?)?;
            scores.push((id.to_string(), score));
        }
        // sort_by is stable: ties keep node order
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        Ok(scores.into_iter().map(|(id, _)| id).collect())
    }

    fn evaluate(&self, center: &[String]) -> Result<f64> {
        let calc = PowerBalanceCalculator::new(&self.elasticity, &self.propensity)?;
        let c = self.participation.participation(center)?;
        let p = self.participation.complement(center)?;
        finite("power balance", center, calc.power_balance(&c, &p)?)
    }
}

fn finite<S: AsRef<str>>(quantity: &'static str, group: &[S], value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::NonFiniteScore {
            quantity,
            group: group.iter().map(|s| s.as_ref().to_string()).collect(),
            value,
        })
    }
}

/// Winning prefix of a level.
#[derive(Debug, Clone, Copy)]
struct Best {
    /// Index of the last node of the prefix.
    index: usize,
    balance: f64,
}

/// Recursive greedy center-periphery search.
///
/// # Example
///
/// ```rust
/// use cpnet::{CenterPeripheryFinder, ElasticityEngine, FinderConfig, TradeGraph};
/// use cpnet::country::{INCOME, PROPENSITY};
///
/// let mut g = TradeGraph::new();
/// g.add_flow("A", "B", 0.5);
/// g.add_flow("A", "C", 0.5);
/// g.add_flow("B", "A", 1.0);
/// g.add_flow("C", "A", 1.0);
/// for (id, income) in [("A", 100.0), ("B", 50.0), ("C", 50.0)] {
///     g.set_attribute(id, PROPENSITY, 0.2);
///     g.set_attribute(id, INCOME, income);
/// }
///
/// let (_, influence) = ElasticityEngine::default().compute(&g.normalize()).unwrap();
/// let result = CenterPeripheryFinder::from_influence(influence, FinderConfig::default())
///     .find()
///     .unwrap();
///
/// assert_eq!(result.len(), 1);
/// assert_eq!(result.levels[0].nodes, vec!["A", "B"]);
/// ```
#[derive(Debug, Clone)]
pub struct CenterPeripheryFinder {
    residual: Residual,
    config: FinderConfig,
}

impl CenterPeripheryFinder {
    /// Search an influence graph, restricting its matrix at each level.
    pub fn from_influence(influence: InfluenceGraph, config: FinderConfig) -> Self {
        Self {
            residual: Residual::Influence(influence),
            config,
        }
    }

    /// Search a normalized trade graph, recomputing elasticities at each level.
    pub fn from_trade(graph: &TradeGraph, engine: ElasticityEngine, config: FinderConfig) -> Self {
        Self {
            residual: Residual::Trade {
                graph: graph.clone(),
                engine,
            },
            config,
        }
    }

    /// Finder configuration.
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Run the search.
    ///
    /// Any error (singular residual system, degenerate group, NaN or infinite
    /// score) aborts the whole run; no partial result is returned.
    pub fn find(&self) -> Result<PartitionResult> {
        let total = self.residual.node_count();
        let mut residual = self.residual.clone();
        let mut ranking: Vec<String> = Vec::new();
        let mut levels = Vec::new();

        while residual.node_count() > 2 {
            let level = levels.len();
            let snapshot = residual.snapshot()?;
            if level == 0 || self.config.ranking == RankingPolicy::PerLevel {
                ranking = snapshot.rank()?;
            }
            debug!(level, nodes = ranking.len(), "searching level");

            let best = self.best_prefix(&snapshot, &ranking)?;
            if best.balance <= 0.0 {
                warn!(
                    level,
                    balance = best.balance,
                    "no center with positive power balance; keeping the best candidate"
                );
            }
            let nodes: Vec<String> = ranking.drain(..=best.index).collect();
            debug!(level, balance = best.balance, center = ?nodes, "level resolved");

            residual = residual.without_nodes(&nodes);
            levels.push(PartitionLevel {
                level,
                power_balance: best.balance,
                nodes,
            });
        }

        let remaining = residual.node_order().ids().to_vec();
        info!(
            nodes = total,
            levels = levels.len(),
            remaining = remaining.len(),
            "center-periphery search finished"
        );
        Ok(PartitionResult { levels, remaining })
    }

    /// Best prefix of `ranking` (its last node is never part of a center).
    fn best_prefix(&self, snapshot: &LevelSnapshot, ranking: &[String]) -> Result<Best> {
        let candidates = ranking.len().saturating_sub(1);
        let balances: Vec<f64> = if self.config.parallel {
            (0..candidates)
                .into_par_iter()
                .map(|i| snapshot.evaluate(&ranking[..=i]))
                .collect::<Result<Vec<f64>>>()?
        } else {
            (0..candidates)
                .map(|i| snapshot.evaluate(&ranking[..=i]))
                .collect::<Result<Vec<f64>>>()?
        };

        let mut best: Option<Best> = None;
        for (index, balance) in balances.into_iter().enumerate() {
            trace!(size = index + 1, balance, "candidate center");
            match best {
                Some(b) if balance <= b.balance => {}
                _ => best = Some(Best { index, balance }),
            }
        }
        // candidates >= 2 whenever more than two nodes remain
        best.ok_or(Error::EmptyGroup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::{INCOME, PROPENSITY};

    fn triangle() -> TradeGraph {
        let mut g = TradeGraph::new();
        g.add_flow("A", "B", 0.5);
        g.add_flow("A", "C", 0.5);
        g.add_flow("B", "A", 1.0);
        g.add_flow("C", "A", 1.0);
        for (id, income) in [("A", 100.0), ("B", 50.0), ("C", 50.0)] {
            g.set_attribute(id, PROPENSITY, 0.2);
            g.set_attribute(id, INCOME, income);
        }
        g
    }

    /// Two hubs trading with each other and a ring of small satellites.
    fn hub_network() -> TradeGraph {
        let mut g = TradeGraph::new();
        g.add_flow("US", "CN", 40.0);
        g.add_flow("CN", "US", 35.0);
        let satellites = ["MX", "CA", "VN", "KR", "CL"];
        for (i, s) in satellites.iter().enumerate() {
            g.add_flow("US", s, 5.0 + i as f64);
            g.add_flow("CN", s, 4.0 + i as f64);
            g.add_flow(s, "US", 20.0);
            g.add_flow(s, "CN", 15.0);
            g.add_flow(s, satellites[(i + 1) % satellites.len()], 2.0);
        }
        let incomes = [
            ("US", 250.0),
            ("CN", 180.0),
            ("MX", 14.0),
            ("CA", 20.0),
            ("VN", 4.0),
            ("KR", 17.0),
            ("CL", 3.0),
        ];
        for (id, y) in incomes {
            g.set_attribute(id, INCOME, y);
            g.set_attribute(id, PROPENSITY, if y > 100.0 { 0.15 } else { 0.35 });
        }
        g.normalize()
    }

    /// Elasticities where every level-0 candidate center loses power to its
    /// periphery.
    ///
    /// Ranking is `B, A, D, C`; the candidate balances rise from
    /// `-5146/20349` through `-187097/1304072` to `-5585/42714`.
    #[rustfmt::skip]
    fn dominated_network() -> InfluenceGraph {
        let ids = ["A", "B", "C", "D"];
        let e = [
            [0.1, 0.4, 0.2, 0.1],
            [0.4, 0.0, 0.4, 0.2],
            [0.0, 0.2, 0.4, 0.2],
            [0.1, 0.2, 0.1, 0.4],
        ];
        let mut g = TradeGraph::new();
        for id in ids {
            g.add_node(id);
        }
        for (i, from) in ids.iter().enumerate() {
            for (j, to) in ids.iter().enumerate() {
                if e[i][j] != 0.0 {
                    g.set_weight(from, to, e[i][j]);
                }
            }
        }
        let attributes = [
            ("A", 0.5, 100.0),
            ("B", 0.5, 40.0),
            ("C", 0.3, 40.0),
            ("D", 0.2, 70.0),
        ];
        for (id, p, y) in attributes {
            g.set_attribute(id, PROPENSITY, p);
            g.set_attribute(id, INCOME, y);
        }
        InfluenceGraph::from_graph(g)
    }

    fn influence_of(g: &TradeGraph) -> InfluenceGraph {
        ElasticityEngine::default().compute(g).unwrap().1
    }

    #[test]
    fn test_triangle_single_level() {
        let finder = CenterPeripheryFinder::from_influence(
            influence_of(&triangle()),
            FinderConfig::default(),
        );
        let result = finder.find().unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.levels[0].level, 0);
        assert_eq!(result.levels[0].nodes, vec!["A", "B"]);
        assert!((result.levels[0].power_balance - 709.0 / 5760.0).abs() < 1e-12);
        assert_eq!(result.remaining, vec!["C"]);
        assert_eq!(result.level_of("B"), Some(0));
        assert_eq!(result.level_of("C"), None);
    }

    #[test]
    fn test_ranking_ties_keep_node_order() {
        let snapshot = Residual::Influence(influence_of(&triangle()))
            .snapshot()
            .unwrap();
        assert_eq!(snapshot.rank().unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_two_nodes_yield_no_levels() {
        let g = triangle().without_nodes(&["C"]);
        let result = CenterPeripheryFinder::from_trade(
            &g,
            ElasticityEngine::default(),
            FinderConfig::default(),
        )
        .find()
        .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.remaining, vec!["A", "B"]);
    }

    #[test]
    fn test_every_node_accounted_for() {
        let g = hub_network();
        let result =
            CenterPeripheryFinder::from_influence(influence_of(&g), FinderConfig::default())
                .find()
                .unwrap();

        assert!(!result.is_empty());
        assert!(result.remaining.len() <= 2);
        assert_eq!(result.assigned() + result.remaining.len(), g.node_count());
        for (i, level) in result.iter().enumerate() {
            assert_eq!(level.level, i);
            assert!(!level.nodes.is_empty());
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let g = hub_network();
        let influence = influence_of(&g);
        let sequential =
            CenterPeripheryFinder::from_influence(influence.clone(), FinderConfig::default())
                .find()
                .unwrap();
        let parallel = CenterPeripheryFinder::from_influence(
            influence,
            FinderConfig {
                parallel: true,
                ..Default::default()
            },
        )
        .find()
        .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_trade_residual_first_level_matches_influence_residual() {
        let g = hub_network();
        let by_influence =
            CenterPeripheryFinder::from_influence(influence_of(&g), FinderConfig::default())
                .find()
                .unwrap();
        let by_trade = CenterPeripheryFinder::from_trade(
            &g,
            ElasticityEngine::default(),
            FinderConfig::default(),
        )
        .find()
        .unwrap();

        // both start from the same full elasticity matrix
        assert_eq!(by_influence.levels[0].nodes, by_trade.levels[0].nodes);
        assert!(
            (by_influence.levels[0].power_balance - by_trade.levels[0].power_balance).abs() < 1e-9
        );
        assert_eq!(by_trade.assigned() + by_trade.remaining.len(), g.node_count());
    }

    #[test]
    fn test_per_level_ranking_terminates() {
        let g = hub_network();
        let result = CenterPeripheryFinder::from_influence(
            influence_of(&g),
            FinderConfig {
                ranking: RankingPolicy::PerLevel,
                ..Default::default()
            },
        )
        .find()
        .unwrap();
        assert_eq!(result.assigned() + result.remaining.len(), g.node_count());
    }

    #[test]
    fn test_singular_residual_aborts() {
        let mut g = triangle();
        for id in ["A", "B", "C"] {
            g.set_attribute(id, PROPENSITY, 1.0);
        }
        let err = CenterPeripheryFinder::from_trade(
            &g,
            ElasticityEngine::default(),
            FinderConfig::default(),
        )
        .find()
        .unwrap_err();
        assert!(matches!(err, Error::SingularElasticityMatrix { .. }));
    }

    #[test]
    fn test_non_positive_level_keeps_best_loser() {
        let snapshot = Residual::Influence(dominated_network()).snapshot().unwrap();
        let ranking = snapshot.rank().unwrap();
        assert_eq!(ranking, vec!["B", "A", "D", "C"]);

        let balances: Vec<f64> = (1..ranking.len())
            .map(|k| snapshot.evaluate(&ranking[..k]).unwrap())
            .collect();
        let expected = [
            -5146.0 / 20349.0,
            -187097.0 / 1304072.0,
            -5585.0 / 42714.0,
        ];
        for (got, want) in balances.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12, "balance {got}, want {want}");
        }
        assert!(balances.iter().all(|&b| b < 0.0));

        // the first candidate seeds the best; later, larger negatives replace it
        for parallel in [false, true] {
            let config = FinderConfig {
                parallel,
                ..Default::default()
            };
            let result = CenterPeripheryFinder::from_influence(dominated_network(), config)
                .find()
                .unwrap();
            assert_eq!(result.len(), 1);
            assert_eq!(result.levels[0].nodes, vec!["B", "A", "D"]);
            assert!((result.levels[0].power_balance - expected[2]).abs() < 1e-12);
            assert_eq!(result.remaining, vec!["C"]);
        }
    }

    #[test]
    fn test_nan_elasticity_aborts_ranking() {
        let mut g = triangle();
        g.set_weight("C", "A", f64::NAN);
        let err = CenterPeripheryFinder::from_influence(
            InfluenceGraph::from_graph(g),
            FinderConfig::default(),
        )
        .find()
        .unwrap_err();
        assert!(
            matches!(err, Error::NonFiniteScore { quantity: "influence", .. }),
            "got {err:?}"
        );
    }

    #[test]
    fn test_overflowing_balance_aborts() {
        // finite rankings, but feedback times influence overflows
        let mut g = triangle();
        for (from, to, w) in [
            ("A", "A", 1e200),
            ("A", "B", 5e199),
            ("A", "C", 5e199),
            ("B", "A", 1e200),
            ("B", "B", 1e200),
            ("C", "A", 1e200),
            ("C", "C", 1e200),
        ] {
            g.set_weight(from, to, w);
        }
        let err = CenterPeripheryFinder::from_influence(
            InfluenceGraph::from_graph(g),
            FinderConfig::default(),
        )
        .find()
        .unwrap_err();
        assert!(
            matches!(err, Error::NonFiniteScore { quantity: "power balance", .. }),
            "got {err:?}"
        );
    }
}
