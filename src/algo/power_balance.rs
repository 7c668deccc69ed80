//! Power balance between a center and its periphery.
//!
//! ```text
//! balance = fb(c) · gg(c, p) − fb(p) · gg(p, c)
//! ```
//!
//! Each direction of influence is scaled by the relative feedback of the
//! group exerting it. Positive values mean the center extracts net
//! structural power from the periphery.

use crate::algo::elasticity::ElasticityMatrix;
use crate::algo::feedback::RelativeFeedbackCalculator;
use crate::algo::participation::ParticipationVector;
use crate::order::NodeVector;
use crate::Result;
use serde::{Deserialize, Serialize};

/// The terms of a power balance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerBalance {
    /// Relative feedback of the center.
    pub center_feedback: f64,
    /// Relative feedback of the periphery.
    pub periphery_feedback: f64,
    /// Influence of the center on the periphery.
    pub center_on_periphery: f64,
    /// Influence of the periphery on the center.
    pub periphery_on_center: f64,
    /// Signed balance.
    pub balance: f64,
}

/// Computes power balances over one universe.
#[derive(Debug, Clone, Copy)]
pub struct PowerBalanceCalculator<'a> {
    feedback: RelativeFeedbackCalculator<'a>,
}

impl<'a> PowerBalanceCalculator<'a> {
    /// Borrow the universe's elasticity matrix and propensity vector.
    pub fn new(elasticity: &'a ElasticityMatrix, propensity: &'a NodeVector) -> Result<Self> {
        Ok(Self {
            feedback: RelativeFeedbackCalculator::new(elasticity, propensity)?,
        })
    }

    /// Signed power balance of `center` over `periphery`.
    pub fn power_balance(
        &self,
        center: &ParticipationVector,
        periphery: &ParticipationVector,
    ) -> Result<f64> {
        Ok(self.breakdown(center, periphery)?.balance)
    }

    /// Power balance with its individual terms.
    pub fn breakdown(
        &self,
        center: &ParticipationVector,
        periphery: &ParticipationVector,
    ) -> Result<PowerBalance> {
        let influence = self.feedback.influence();
        let center_feedback = self.feedback.relative_feedback(center)?;
        let periphery_feedback = self.feedback.relative_feedback(periphery)?;
        let center_on_periphery = influence.group_to_group(center, periphery)?;
        let periphery_on_center = influence.group_to_group(periphery, center)?;
        Ok(PowerBalance {
            center_feedback,
            periphery_feedback,
            center_on_periphery,
            periphery_on_center,
            balance: center_feedback * center_on_periphery
                - periphery_feedback * periphery_on_center,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::participation::ParticipationCalculator;
    use crate::order::NodeOrder;
    use nalgebra::{DMatrix, DVector};

    #[test]
    #[rustfmt::skip]
    fn test_breakdown_three_nodes() {
        let order = NodeOrder::new(["A", "B", "C"]);
        let e = ElasticityMatrix::new(
            order.clone(),
            DMatrix::from_row_slice(
                3,
                3,
                &[
                    1.0 / 24.0, 5.0 / 24.0, 5.0 / 24.0,
                    5.0 / 48.0, 1.0 / 48.0, 1.0 / 48.0,
                    5.0 / 48.0, 1.0 / 48.0, 1.0 / 48.0,
                ],
            ),
        )
        .unwrap();
        let p = NodeVector::new(order.clone(), DVector::from_element(3, 0.2)).unwrap();
        let pc = ParticipationCalculator::new(
            NodeVector::new(order, DVector::from_vec(vec![100.0, 50.0, 50.0])).unwrap(),
        );
        let calc = PowerBalanceCalculator::new(&e, &p).unwrap();

        let center = pc.participation(&["A", "B"]).unwrap();
        let periphery = pc.participation(&["C"]).unwrap();
        let b = calc.breakdown(&center, &periphery).unwrap();

        assert!((b.center_feedback - 39.0 / 40.0).abs() < 1e-12);
        assert!((b.periphery_feedback - 0.25).abs() < 1e-12);
        assert!((b.center_on_periphery - 7.0 / 48.0).abs() < 1e-12);
        assert!((b.periphery_on_center - 11.0 / 144.0).abs() < 1e-12);
        assert!((b.balance - 709.0 / 5760.0).abs() < 1e-12);

        // antisymmetric under swapping roles
        let swapped = calc.power_balance(&periphery, &center).unwrap();
        assert!((swapped + b.balance).abs() < 1e-12);
    }
}
