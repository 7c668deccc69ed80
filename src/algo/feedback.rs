//! Relative trade feedback of a group.
//!
//! A group's absolute feedback is its influence on itself,
//! `gg(w, w) = wᵗ · E · w`. On its own it grows with group size and with the
//! propensities of the members, so it is compared against the feedback the
//! same group would have in a homogeneous network:
//!
//! ```text
//! baseline = k · (wᵗ · D_p · w) / (N · (1 − mean(p)))
//! ```
//!
//! with `k` the number of members and `N` the universe size. The ratio
//! `gg(w, w) / baseline` is dimensionless and comparable across groups.

use crate::algo::elasticity::ElasticityMatrix;
use crate::algo::influence::InfluenceCalculator;
use crate::algo::participation::ParticipationVector;
use crate::order::NodeVector;
use crate::{Error, Result};

/// Computes relative feedback over one universe.
#[derive(Debug, Clone, Copy)]
pub struct RelativeFeedbackCalculator<'a> {
    influence: InfluenceCalculator<'a>,
    propensity: &'a NodeVector,
}

impl<'a> RelativeFeedbackCalculator<'a> {
    /// Borrow the universe's elasticity matrix and propensity vector.
    pub fn new(elasticity: &'a ElasticityMatrix, propensity: &'a NodeVector) -> Result<Self> {
        elasticity.order().ensure_compatible(propensity.order())?;
        Ok(Self {
            influence: InfluenceCalculator::new(elasticity),
            propensity,
        })
    }

    /// Self-influence of the group.
    pub fn absolute_feedback(&self, w: &ParticipationVector) -> Result<f64> {
        self.influence.group_to_group(w, w)
    }

    /// Feedback of an equally sized group in a homogeneous network.
    #[allow(clippy::cast_precision_loss)]
    pub fn homogeneous_baseline(&self, w: &ParticipationVector) -> Result<f64> {
        self.propensity.order().ensure_compatible(w.order())?;
        let p = self.propensity.values();
        let n = p.len();
        if n == 0 {
            return Err(Error::DegenerateBaseline { baseline: 0.0 });
        }
        let k = w.group_size() as f64;
        let weighted: f64 = w
            .as_vector()
            .values()
            .iter()
            .zip(p.iter())
            .map(|(wi, pi)| wi * pi * wi)
            .sum();
        let mean = p.mean();
        Ok(k * weighted / (n as f64 * (1.0 - mean)))
    }

    /// `absolute_feedback / homogeneous_baseline`.
    ///
    /// Fails with [`Error::DegenerateBaseline`] when the baseline is zero or
    /// not finite (empty group, zero propensities, mean propensity of 1).
    pub fn relative_feedback(&self, w: &ParticipationVector) -> Result<f64> {
        let baseline = self.homogeneous_baseline(w)?;
        if baseline == 0.0 || !baseline.is_finite() {
            return Err(Error::DegenerateBaseline { baseline });
        }
        Ok(self.absolute_feedback(w)? / baseline)
    }

    /// The influence calculator in use.
    pub fn influence(&self) -> &InfluenceCalculator<'a> {
        &self.influence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::participation::ParticipationCalculator;
    use crate::order::NodeOrder;
    use nalgebra::{DMatrix, DVector};

    #[rustfmt::skip]
    fn universe(p: Vec<f64>) -> (ElasticityMatrix, NodeVector, ParticipationCalculator) {
        let order = NodeOrder::new(["A", "B", "C"]);
        let e = DMatrix::from_row_slice(
            3,
            3,
            &[
                1.0 / 24.0, 5.0 / 24.0, 5.0 / 24.0,
                5.0 / 48.0, 1.0 / 48.0, 1.0 / 48.0,
                5.0 / 48.0, 1.0 / 48.0, 1.0 / 48.0,
            ],
        );
        let income = DVector::from_vec(vec![100.0, 50.0, 50.0]);
        (
            ElasticityMatrix::new(order.clone(), e).unwrap(),
            NodeVector::new(order.clone(), DVector::from_vec(p)).unwrap(),
            ParticipationCalculator::new(NodeVector::new(order, income).unwrap()),
        )
    }

    #[test]
    fn test_relative_feedback_values() {
        let (e, p, pc) = universe(vec![0.2, 0.2, 0.2]);
        let calc = RelativeFeedbackCalculator::new(&e, &p).unwrap();

        // singleton A: gg = 1/24, baseline = 1 * 0.2 / (3 * 0.8) = 1/12
        let a = pc.participation(&["A"]).unwrap();
        assert!((calc.absolute_feedback(&a).unwrap() - 1.0 / 24.0).abs() < 1e-12);
        assert!((calc.homogeneous_baseline(&a).unwrap() - 1.0 / 12.0).abs() < 1e-12);
        assert!((calc.relative_feedback(&a).unwrap() - 0.5).abs() < 1e-12);

        let ab = pc.participation(&["A", "B"]).unwrap();
        assert!((calc.relative_feedback(&ab).unwrap() - 39.0 / 40.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_when_mean_propensity_is_one() {
        let (e, p, pc) = universe(vec![1.0, 1.0, 1.0]);
        let calc = RelativeFeedbackCalculator::new(&e, &p).unwrap();
        let a = pc.participation(&["A"]).unwrap();
        assert!(matches!(
            calc.relative_feedback(&a),
            Err(Error::DegenerateBaseline { .. })
        ));
    }

    #[test]
    fn test_degenerate_when_group_propensity_is_zero() {
        let (e, p, pc) = universe(vec![0.0, 0.3, 0.3]);
        let calc = RelativeFeedbackCalculator::new(&e, &p).unwrap();
        let a = pc.participation(&["A"]).unwrap();
        match calc.relative_feedback(&a) {
            Err(Error::DegenerateBaseline { baseline }) => assert_eq!(baseline, 0.0),
            other => panic!("expected DegenerateBaseline, got {other:?}"),
        }
    }
}
