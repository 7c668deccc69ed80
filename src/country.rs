//! Country (node) type for trade networks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute holding a node's average import propensity, expected in `[0, 1)`.
pub const PROPENSITY: &str = "propension";

/// Attribute holding a node's absolute income, expected `> 0`.
pub const INCOME: &str = "ingreso";

/// A country (node) in a trade network.
///
/// Carries a unique identifier and any number of named scalar attributes.
/// Matrix construction needs [`PROPENSITY`] and [`INCOME`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    /// Unique identifier (ISO code, region name, ...).
    pub id: String,

    /// Named scalar attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, f64>,
}

impl Country {
    /// Create a country with no attributes.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Set an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Read an attribute.
    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }

    /// Import propensity, if set.
    pub fn propensity(&self) -> Option<f64> {
        self.attribute(PROPENSITY)
    }

    /// Income, if set.
    pub fn income(&self) -> Option<f64> {
        self.attribute(INCOME)
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
