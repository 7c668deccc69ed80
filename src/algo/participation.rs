//! Income-share (participation) vectors.
//!
//! A group's participation vector gives each member its share of the group's
//! total income and every other node of the universe a zero.

use crate::algo::elasticity::InfluenceGraph;
use crate::graph::TradeGraph;
use crate::order::{NodeOrder, NodeVector};
use crate::{Error, Result};
use nalgebra::DVector;

/// Participation vector of a group over a node universe.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipationVector {
    shares: NodeVector,
    members: usize,
}

impl ParticipationVector {
    /// Shares in node order.
    pub fn as_vector(&self) -> &NodeVector {
        &self.shares
    }

    /// Node order of the universe.
    pub fn order(&self) -> &NodeOrder {
        self.shares.order()
    }

    /// Share of a node (0 for non-members, `None` outside the universe).
    pub fn get(&self, id: &str) -> Option<f64> {
        self.shares.get(id)
    }

    /// Number of group members.
    pub fn group_size(&self) -> usize {
        self.members
    }

    /// Members in universe order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.shares.iter().filter(|&(_, w)| w != 0.0).map(|(id, _)| id)
    }
}

/// Builds participation vectors from the `ingreso` attribute of a universe.
#[derive(Debug, Clone)]
pub struct ParticipationCalculator {
    income: NodeVector,
}

impl ParticipationCalculator {
    /// Use an income vector directly; its order is the universe.
    pub fn new(income: NodeVector) -> Self {
        Self { income }
    }

    /// Read incomes from a trade graph.
    pub fn from_graph(graph: &TradeGraph) -> Result<Self> {
        Ok(Self::new(graph.incomes()?))
    }

    /// Read incomes from an influence graph.
    pub fn from_influence(graph: &InfluenceGraph) -> Result<Self> {
        Ok(Self::new(graph.incomes()?))
    }

    /// The universe.
    pub fn order(&self) -> &NodeOrder {
        self.income.order()
    }

    /// Participation vector of `group`.
    ///
    /// Repeated ids count once. Fails with [`Error::EmptyGroup`] when the
    /// group is empty or its income sums to zero, and with
    /// [`Error::UnknownNode`] for ids outside the universe.
    pub fn participation<S: AsRef<str>>(&self, group: &[S]) -> Result<ParticipationVector> {
        let order = self.income.order();
        let mut mask = vec![false; order.len()];
        for id in group {
            let id = id.as_ref();
            let i = order
                .index_of(id)
                .ok_or_else(|| Error::UnknownNode(id.to_string()))?;
            mask[i] = true;
        }
        self.shares_for(&mask)
    }

    /// Participation vector of every node not in `group`.
    pub fn complement<S: AsRef<str>>(&self, group: &[S]) -> Result<ParticipationVector> {
        let order = self.income.order();
        let mut mask = vec![true; order.len()];
        for id in group {
            let id = id.as_ref();
            let i = order
                .index_of(id)
                .ok_or_else(|| Error::UnknownNode(id.to_string()))?;
            mask[i] = false;
        }
        self.shares_for(&mask)
    }

    fn shares_for(&self, mask: &[bool]) -> Result<ParticipationVector> {
        let income = self.income.values();
        let total: f64 = income
            .iter()
            .zip(mask)
            .filter(|&(_, &member)| member)
            .map(|(y, _)| *y)
            .sum();
        if total == 0.0 || !total.is_finite() {
            return Err(Error::EmptyGroup);
        }
        let shares = DVector::from_iterator(
            income.len(),
            income
                .iter()
                .zip(mask)
                .map(|(y, &member)| if member { y / total } else { 0.0 }),
        );
        let members = shares.iter().filter(|&&w| w != 0.0).count();
        Ok(ParticipationVector {
            shares: NodeVector::new(self.income.order().clone(), shares)?,
            members,
        })
    }
}
