//! Algorithms for center-periphery analysis.
//!
//! The pipeline runs bottom-up:
//!
//! - **Elasticity**: income-elasticity matrix of a trade network ([`elasticity`])
//! - **Participation**: income-share vectors of node groups ([`participation`])
//! - **Influence**: node/group influence via the elasticity matrix ([`influence`])
//! - **Feedback**: relative self-influence of a group ([`feedback`])
//! - **Power balance**: signed dominance of one group over another ([`power_balance`])
//! - **Center-periphery**: nested centers by greedy prefix search ([`center_periphery`])
//!
//! # Overview
//!
//! | Quantity | Formula | Complexity |
//! |----------|---------|------------|
//! | Elasticity | Y·P·M·(I − P·M)⁻¹·Y⁻¹ | O(N³) |
//! | Node → group | E·w | O(N²) |
//! | Group → node | Eᵀ·w | O(N²) |
//! | Group → group | wₐᵀ·E·w_b | O(N²) |
//! | Relative feedback | gg(w, w) / baseline | O(N²) |
//! | Partition | greedy prefix search | O(N⁴) |

/// Income-elasticity matrix and influence graph.
pub mod elasticity;

/// Participation (income-share) vectors.
pub mod participation;

/// Node and group influence.
pub mod influence;

/// Relative feedback against a homogeneous baseline.
pub mod feedback;

/// Power balance between two groups.
pub mod power_balance;

/// Nested center detection.
pub mod center_periphery;
