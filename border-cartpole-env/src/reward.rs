//! Reward shaped by the deviation from a reference state.
use crate::{CartPoleError, CartPoleState};
use serde::{Deserialize, Serialize};

/// How per-component deviations are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviationNorm {
    /// `sum_i w_i * d_i^2`.
    Quadratic,

    /// `sum_i w_i * |d_i|`.
    Absolute,
}

impl Default for DeviationNorm {
    fn default() -> Self {
        Self::Quadratic
    }
}

/// Configuration of [`RewardModel`].
///
/// Components are ordered as `[x, x_dot, theta, theta_dot]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Target state.
    pub reference: [f64; 4],

    /// Non-negative weight of each component. A zero weight leaves the component untracked.
    pub weights: [f64; 4],

    /// Deviations are divided by these values before weighting.
    ///
    /// If `None`, `[x_threshold, 1, theta_threshold, 1]` of the environment is used.
    pub scales: Option<[f64; 4]>,

    /// Reward at the reference state. Defaults to the sum of the weights.
    pub max_reward: Option<f64>,

    /// Combination of the component deviations.
    pub norm: DeviationNorm,

    /// Subtracted from the reward of the step ending an episode by failure.
    ///
    /// Defaults to 0. The classic shaped variant of this task subtracted the
    /// maximum episode duration on the ending step instead, so reward curves
    /// ported from it need `failure_penalty(max_steps as f64)`.
    pub failure_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            reference: [0.0; 4],
            weights: [1.0, 0.0, 1.0, 0.0],
            scales: None,
            max_reward: None,
            norm: DeviationNorm::Quadratic,
            failure_penalty: 0.0,
        }
    }
}

impl RewardConfig {
    /// Sets the reference state.
    pub fn reference(mut self, reference: CartPoleState) -> Self {
        self.reference = reference.to_array();
        self
    }

    /// Sets the weights.
    pub fn weights(mut self, weights: [f64; 4]) -> Self {
        self.weights = weights;
        self
    }

    /// Sets the normalisation scales.
    pub fn scales(mut self, scales: [f64; 4]) -> Self {
        self.scales = Some(scales);
        self
    }

    /// Sets the reward at the reference state.
    pub fn max_reward(mut self, v: f64) -> Self {
        self.max_reward = Some(v);
        self
    }

    /// Sets the deviation norm.
    pub fn norm(mut self, norm: DeviationNorm) -> Self {
        self.norm = norm;
        self
    }

    /// Sets the failure penalty.
    pub fn failure_penalty(mut self, v: f64) -> Self {
        self.failure_penalty = v;
        self
    }
}

/// Computes `max_reward - deviation(state, reference)`.
///
/// The reward is continuous in the state, equals `max_reward` at the
/// reference and strictly decreases as the magnitude of the deviation of
/// any component with a positive weight grows.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardModel {
    reference: [f64; 4],
    weights: [f64; 4],
    scales: [f64; 4],
    max_reward: f64,
    norm: DeviationNorm,
    failure_penalty: f64,
}

impl RewardModel {
    /// Builds the model, taking default scales from the thresholds of the environment.
    pub fn build(
        config: &RewardConfig,
        x_threshold: f64,
        theta_threshold_radians: f64,
    ) -> Result<Self, CartPoleError> {
        let invalid = |msg: String| Err(CartPoleError::InvalidConfiguration(msg));

        if config.weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return invalid(format!(
                "reward weights must be finite and non-negative, got {:?}",
                config.weights
            ));
        }
        if !config.weights.iter().any(|w| *w > 0.0) {
            return invalid("at least one reward weight must be positive".to_string());
        }
        if config.reference.iter().any(|v| !v.is_finite()) {
            return invalid(format!(
                "reference state must be finite, got {:?}",
                config.reference
            ));
        }
        let scales = config
            .scales
            .unwrap_or([x_threshold, 1.0, theta_threshold_radians, 1.0]);
        if scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return invalid(format!(
                "reward scales must be finite and positive, got {:?}",
                scales
            ));
        }
        let max_reward = config
            .max_reward
            .unwrap_or_else(|| config.weights.iter().sum());
        if !max_reward.is_finite() || !config.failure_penalty.is_finite() {
            return invalid("max_reward and failure_penalty must be finite".to_string());
        }

        Ok(Self {
            reference: config.reference,
            weights: config.weights,
            scales,
            max_reward,
            norm: config.norm,
            failure_penalty: config.failure_penalty,
        })
    }

    /// Reward at the reference state.
    pub fn max_reward(&self) -> f64 {
        self.max_reward
    }

    /// Penalty of the step ending an episode by failure.
    pub fn failure_penalty(&self) -> f64 {
        self.failure_penalty
    }

    /// The reference state.
    pub fn reference(&self) -> CartPoleState {
        self.reference.into()
    }

    /// Weighted, normalised distance between `state` and the reference.
    ///
    /// Components of weight zero are ignored, whatever their value.
    pub fn deviation(&self, state: &CartPoleState) -> f64 {
        state
            .to_array()
            .iter()
            .zip(self.reference.iter())
            .zip(self.weights.iter().zip(self.scales.iter()))
            .filter(|(_, (w, _))| **w != 0.0)
            .map(|((s, r), (w, scale))| {
                let d = (s - r) / scale;
                match self.norm {
                    DeviationNorm::Quadratic => w * d * d,
                    DeviationNorm::Absolute => w * d.abs(),
                }
            })
            .sum()
    }

    /// Reward of being in `state`.
    pub fn reward(&self, state: &CartPoleState) -> f64 {
        self.max_reward - self.deviation(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X_THRESHOLD: f64 = 2.4;
    const THETA_THRESHOLD: f64 = std::f64::consts::FRAC_PI_4;

    fn model(config: &RewardConfig) -> RewardModel {
        RewardModel::build(config, X_THRESHOLD, THETA_THRESHOLD).unwrap()
    }

    #[test]
    fn test_unweighted_components_are_ignored() {
        let m = model(&RewardConfig::default());
        let state = CartPoleState::new(0.0, f64::INFINITY, 0.0, f64::NEG_INFINITY);
        assert_eq!(m.reward(&state), 2.0);

        let state = CartPoleState::new(0.0, f64::NAN, 0.0, 0.0);
        assert_eq!(m.reward(&state), 2.0);
    }

    #[test]
    fn test_maximum_at_reference() {
        let m = model(&RewardConfig::default());
        assert_eq!(m.max_reward(), 2.0);
        assert_eq!(m.reward(&CartPoleState::default()), 2.0);

        let reference = CartPoleState::new(0.5, 0.0, 0.1, 0.0);
        let m = model(&RewardConfig::default().reference(reference).max_reward(1.0));
        assert_eq!(m.reward(&reference), 1.0);
    }

    #[test]
    fn test_strictly_decreasing_in_deviation() {
        for norm in [DeviationNorm::Quadratic, DeviationNorm::Absolute] {
            let m = model(&RewardConfig::default().norm(norm));
            for (component, step) in [(0usize, 0.1), (2, 0.02)] {
                let mut prev = m.reward(&CartPoleState::default());
                for i in 1..30 {
                    for sign in [1.0, -1.0] {
                        let mut s = [0.0; 4];
                        s[component] = sign * step * i as f64;
                        let r = m.reward(&s.into());
                        assert!(r < prev, "{:?} {:?}", norm, s);
                    }
                    let mut s = [0.0; 4];
                    s[component] = step * i as f64;
                    prev = m.reward(&s.into());
                }
            }
        }
    }

    #[test]
    fn test_unit_deviation_at_envelope_edge() {
        let m = model(&RewardConfig::default());
        let edge = CartPoleState::new(X_THRESHOLD, 0.0, 0.0, 0.0);
        assert!((m.deviation(&edge) - 1.0).abs() < 1e-12);
        let edge = CartPoleState::new(0.0, 0.0, -THETA_THRESHOLD, 0.0);
        assert!((m.reward(&edge) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_untracked_components() {
        let m = model(&RewardConfig::default());
        let moving = CartPoleState::new(0.0, 3.0, 0.0, -2.0);
        assert_eq!(m.reward(&moving), m.max_reward());
    }

    #[test]
    fn test_invalid_config() {
        let build = |c: RewardConfig| RewardModel::build(&c, X_THRESHOLD, THETA_THRESHOLD);
        assert!(build(RewardConfig::default().weights([-1.0, 0.0, 1.0, 0.0])).is_err());
        assert!(build(RewardConfig::default().weights([0.0; 4])).is_err());
        assert!(build(RewardConfig::default().scales([1.0, 0.0, 1.0, 1.0])).is_err());
        assert!(matches!(
            build(RewardConfig::default().max_reward(f64::INFINITY)),
            Err(CartPoleError::InvalidConfiguration(_))
        ));
    }
}
