//! Trade influence between nodes and groups.
//!
//! All three operations are linear in the participation vectors:
//!
//! ```text
//! node → group    E  · w
//! group → node    Eᵗ · w
//! group → group   w_aᵗ · E · w_b
//! ```
//!
//! `group_to_group(w_a, w_b)` equals `w_a · node_to_group(w_b)`; the
//! property tests check the three against each other.

use crate::algo::elasticity::ElasticityMatrix;
use crate::algo::participation::ParticipationVector;
use crate::order::NodeVector;
use crate::Result;

/// Applies an elasticity matrix to participation vectors.
#[derive(Debug, Clone, Copy)]
pub struct InfluenceCalculator<'a> {
    elasticity: &'a ElasticityMatrix,
}

impl<'a> InfluenceCalculator<'a> {
    /// Borrow an elasticity matrix.
    pub fn new(elasticity: &'a ElasticityMatrix) -> Self {
        Self { elasticity }
    }

    /// The matrix being applied.
    pub fn elasticity(&self) -> &'a ElasticityMatrix {
        self.elasticity
    }

    /// Influence each node exerts on the group weighted by `w`.
    pub fn node_to_group(&self, w: &ParticipationVector) -> Result<NodeVector> {
        self.elasticity.order().ensure_compatible(w.order())?;
        let values = self.elasticity.as_matrix() * w.as_vector().values();
        NodeVector::new(self.elasticity.order().clone(), values)
    }

    /// Influence the group weighted by `w` exerts on each node.
    pub fn group_to_node(&self, w: &ParticipationVector) -> Result<NodeVector> {
        self.elasticity.order().ensure_compatible(w.order())?;
        let values = self.elasticity.as_matrix().tr_mul(w.as_vector().values());
        NodeVector::new(self.elasticity.order().clone(), values)
    }

    /// Directional influence of group `a` on group `b`.
    pub fn group_to_group(&self, a: &ParticipationVector, b: &ParticipationVector) -> Result<f64> {
        let order = self.elasticity.order();
        order.ensure_compatible(a.order())?;
        order.ensure_compatible(b.order())?;
        let eb = self.elasticity.as_matrix() * b.as_vector().values();
        Ok(a.as_vector().values().dot(&eb))
    }
}
