//! End-to-end analysis: raw flows to nested centers.

use crate::algo::center_periphery::{CenterPeripheryFinder, FinderConfig, PartitionResult};
use crate::algo::elasticity::{
    ElasticityConfig, ElasticityEngine, ElasticityMatrix, InfluenceGraph,
};
use crate::graph::TradeGraph;
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// How the finder derives each level's residual network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResidualMode {
    /// Restrict the full elasticity matrix to the surviving nodes.
    #[default]
    Influence,
    /// Recompute elasticities on the residual trade network.
    Recompute,
}

/// Configuration for [`analyze`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Elasticity engine settings.
    pub elasticity: ElasticityConfig,
    /// Finder settings.
    pub finder: FinderConfig,
    /// Residual network strategy.
    pub residual: ResidualMode,
}

/// Output of [`analyze`].
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Elasticity matrix of the full network.
    pub elasticity: ElasticityMatrix,
    /// Influence graph of the full network.
    pub influence: InfluenceGraph,
    /// Nested centers.
    pub partition: PartitionResult,
}

/// Normalize `raw`, compute its elasticities and partition it.
///
/// `raw` holds absolute import flows; every node needs `propension` and
/// `ingreso`.
pub fn analyze(raw: &TradeGraph, config: &AnalysisConfig) -> Result<Analysis> {
    let normalized = raw.normalize();
    let engine = ElasticityEngine::new(config.elasticity);
    let (elasticity, influence) = engine.compute(&normalized)?;

    let finder = match config.residual {
        ResidualMode::Influence => {
            CenterPeripheryFinder::from_influence(influence.clone(), config.finder)
        }
        ResidualMode::Recompute => {
            CenterPeripheryFinder::from_trade(&normalized, engine, config.finder)
        }
    };
    let partition = finder.find()?;
    info!(
        nodes = normalized.node_count(),
        edges = normalized.edge_count(),
        levels = partition.len(),
        "analysis complete"
    );

    Ok(Analysis {
        elasticity,
        influence,
        partition,
    })
}
