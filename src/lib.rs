//! Center-periphery detection on income-elasticity trade networks.
//!
//! This crate finds nested "centers" in an international trade network:
//! groups of countries that exert more structural influence on the rest
//! of the network than they receive from it.
//!
//! - [`TradeGraph`] - Directed import network with per-country attributes
//! - [`ElasticityEngine`] - Income-elasticity matrix and [`InfluenceGraph`]
//! - [`ParticipationCalculator`] - Income-share vectors of node groups
//! - [`InfluenceCalculator`] - Node and group influence
//! - [`RelativeFeedbackCalculator`] - Self-influence against a homogeneous baseline
//! - [`PowerBalanceCalculator`] - Signed dominance of a center over its periphery
//! - [`CenterPeripheryFinder`] - Nested centers by greedy prefix search
//!
//! # Example
//!
//! ```rust
//! use cpnet::country::{INCOME, PROPENSITY};
//! use cpnet::{analyze, AnalysisConfig, TradeGraph};
//!
//! // Absolute import flows: importer -> exporter.
//! let mut g = TradeGraph::new();
//! g.add_flow("A", "B", 30.0);
//! g.add_flow("A", "C", 30.0);
//! g.add_flow("B", "A", 12.0);
//! g.add_flow("C", "A", 7.0);
//! for (id, income) in [("A", 100.0), ("B", 50.0), ("C", 50.0)] {
//!     g.set_attribute(id, PROPENSITY, 0.2);
//!     g.set_attribute(id, INCOME, income);
//! }
//!
//! let analysis = analyze(&g, &AnalysisConfig::default())?;
//! assert_eq!(analysis.partition.levels[0].nodes, vec!["A", "B"]);
//! assert_eq!(analysis.partition.remaining, vec!["C"]);
//! # Ok::<(), cpnet::Error>(())
//! ```
//!
//! # Logging
//!
//! Progress is reported through `tracing`: one `info` event per level,
//! `debug` for matrix conditioning and rankings, `trace` per candidate.
//! Install any subscriber to see them.

pub mod algo;
pub mod country;
mod error;
pub mod exchange;
mod graph;
pub mod order;
pub mod pipeline;

pub use algo::center_periphery::{
    CenterPeripheryFinder, FinderConfig, PartitionLevel, PartitionResult, RankingPolicy,
};
pub use algo::elasticity::{ElasticityConfig, ElasticityEngine, ElasticityMatrix, InfluenceGraph};
pub use algo::feedback::RelativeFeedbackCalculator;
pub use algo::influence::InfluenceCalculator;
pub use algo::participation::{ParticipationCalculator, ParticipationVector};
pub use algo::power_balance::{PowerBalance, PowerBalanceCalculator};
pub use country::Country;
pub use error::{Error, Result};
pub use exchange::{GraphDocument, GraphEdge, GraphNode};
pub use graph::TradeGraph;
pub use order::{NodeOrder, NodeVector};
pub use pipeline::{analyze, Analysis, AnalysisConfig, ResidualMode};

// Re-export the graph and linear-algebra backends
pub use nalgebra;
pub use petgraph;
