//! Stable node ordering shared by matrices and vectors.
//!
//! Every dense structure in this crate is indexed by position. A [`NodeOrder`]
//! maps positions back to node ids; two structures can only be combined when
//! they were built over the same order.

use crate::{Error, Result};
use nalgebra::DVector;
use std::collections::HashMap;
use std::sync::Arc;

/// Ordered, shareable list of node ids.
///
/// Cloning is cheap (reference counted).
#[derive(Debug, Clone)]
pub struct NodeOrder {
    ids: Arc<[String]>,
    index: Arc<HashMap<String, usize>>,
}

impl NodeOrder {
    /// Build an order from ids. Later duplicates are ignored.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        let mut index = HashMap::new();
        for id in ids {
            let id = id.into();
            if index.contains_key(&id) {
                continue;
            }
            index.insert(id.clone(), list.len());
            list.push(id);
        }
        Self {
            ids: list.into(),
            index: Arc::new(index),
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True if there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Position of a node.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Id at a position.
    pub fn id(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    /// Ids in order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Iterate ids in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Same ids in the same order.
    pub fn is_compatible(&self, other: &NodeOrder) -> bool {
        Arc::ptr_eq(&self.ids, &other.ids) || self.ids == other.ids
    }

    /// Fail with [`Error::DimensionMismatch`] unless `other` is compatible.
    pub fn ensure_compatible(&self, other: &NodeOrder) -> Result<()> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.len(),
                found: other.len(),
            })
        }
    }
}

impl PartialEq for NodeOrder {
    fn eq(&self, other: &Self) -> bool {
        self.is_compatible(other)
    }
}

/// Dense per-node values over a [`NodeOrder`].
#[derive(Debug, Clone, PartialEq)]
pub struct NodeVector {
    order: NodeOrder,
    values: DVector<f64>,
}

impl NodeVector {
    /// Pair an order with values of the same length.
    pub fn new(order: NodeOrder, values: DVector<f64>) -> Result<Self> {
        if order.len() != values.len() {
            return Err(Error::DimensionMismatch {
                expected: order.len(),
                found: values.len(),
            });
        }
        Ok(Self { order, values })
    }

    /// All-zero vector.
    pub fn zeros(order: NodeOrder) -> Self {
        let values = DVector::zeros(order.len());
        Self { order, values }
    }

    /// Node order.
    pub fn order(&self) -> &NodeOrder {
        &self.order
    }

    /// Raw values in node order.
    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value for a node.
    pub fn get(&self, id: &str) -> Option<f64> {
        self.order.index_of(id).map(|i| self.values[i])
    }

    /// Sum of all entries.
    pub fn sum(&self) -> f64 {
        self.values.sum()
    }

    /// Dot product; both vectors must share the order.
    pub fn dot(&self, other: &NodeVector) -> Result<f64> {
        self.order.ensure_compatible(&other.order)?;
        Ok(self.values.dot(&other.values))
    }

    /// Iterate `(id, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.order.iter().zip(self.values.iter().copied())
    }

    /// Copy into a map keyed by node id.
    pub fn to_map(&self) -> HashMap<String, f64> {
        self.iter().map(|(id, v)| (id.to_string(), v)).collect()
    }
}
