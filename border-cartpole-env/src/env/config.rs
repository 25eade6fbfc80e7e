//! Configuration of [`CartPoleEnv`](super::CartPoleEnv).
use super::TerminationCause;
use crate::{
    degrees_to_radians, CartPoleActFilter, CartPoleError, CartPoleState, PhysicsConfig,
    RenderConfig, RewardConfig,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    f64::consts::PI,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Pole angle (degrees) beyond which the classic cart-pole fails.
pub const BASELINE_THETA_THRESHOLD_DEGREES: f64 = 12.0;

/// Configurations of [`CartPoleEnv`](super::CartPoleEnv).
///
/// `C` is the configuration of the action filter of the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "C: Deserialize<'de> + Default"))]
pub struct CartPoleEnvConfig<C> {
    pub(super) physics: PhysicsConfig,
    pub(super) theta_threshold_radians: f64,
    pub(super) x_threshold: f64,
    pub(super) max_steps: usize,
    pub(super) initial_noise: f64,
    pub(super) reward: RewardConfig,
    pub(super) render: RenderConfig,
    pub(super) act_filter_config: C,
}

impl<C: Default> Default for CartPoleEnvConfig<C> {
    fn default() -> Self {
        Self {
            physics: PhysicsConfig::default(),
            theta_threshold_radians: degrees_to_radians(45.0),
            x_threshold: 2.4,
            max_steps: 200,
            initial_noise: 0.05,
            reward: RewardConfig::default(),
            render: RenderConfig::default(),
            act_filter_config: C::default(),
        }
    }
}

impl<C> CartPoleEnvConfig<C> {
    /// Sets the physical constants.
    pub fn physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    /// Sets the pole angle (radians) beyond which an episode fails.
    pub fn theta_threshold_radians(mut self, v: f64) -> Self {
        self.theta_threshold_radians = v;
        self
    }

    /// Sets the pole angle (degrees) beyond which an episode fails.
    pub fn theta_threshold_degrees(self, v: f64) -> Self {
        self.theta_threshold_radians(degrees_to_radians(v))
    }

    /// Sets the half length of the track.
    pub fn x_threshold(mut self, v: f64) -> Self {
        self.x_threshold = v;
        self
    }

    /// Sets the default duration of episodes.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the half-width of the uniform distribution of initial states.
    pub fn initial_noise(mut self, v: f64) -> Self {
        self.initial_noise = v;
        self
    }

    /// Sets the reward configuration.
    pub fn reward(mut self, reward: RewardConfig) -> Self {
        self.reward = reward;
        self
    }

    /// Sets the render configuration.
    pub fn render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    /// Sets the configuration of the action filter.
    pub fn act_filter_config(mut self, config: C) -> Self {
        self.act_filter_config = config;
        self
    }

    /// Physical constants.
    pub fn get_physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    /// Pole angle (radians) beyond which an episode fails.
    pub fn get_theta_threshold_radians(&self) -> f64 {
        self.theta_threshold_radians
    }

    /// Half length of the track.
    pub fn get_x_threshold(&self) -> f64 {
        self.x_threshold
    }

    /// Default duration of episodes.
    pub fn get_max_steps(&self) -> usize {
        self.max_steps
    }

    /// Render configuration.
    pub fn get_render(&self) -> &RenderConfig {
        &self.render
    }

    /// Reward configuration.
    pub fn get_reward(&self) -> &RewardConfig {
        &self.reward
    }

    /// Checks every field except the configuration of the action filter.
    pub fn validate(&self) -> Result<(), CartPoleError> {
        let invalid = |msg: String| Err(CartPoleError::InvalidConfiguration(msg));

        self.physics.validate()?;
        self.render.validate()?;

        let baseline = degrees_to_radians(BASELINE_THETA_THRESHOLD_DEGREES);
        let theta = self.theta_threshold_radians;
        if !theta.is_finite() || theta <= baseline || theta > PI {
            return invalid(format!(
                "theta threshold must be in ({}, pi] radians, got {}",
                baseline, theta
            ));
        }
        if !self.x_threshold.is_finite() || self.x_threshold <= 0.0 {
            return invalid(format!(
                "x threshold must be positive and finite, got {}",
                self.x_threshold
            ));
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be positive".to_string());
        }
        if !self.initial_noise.is_finite() || self.initial_noise < 0.0 {
            return invalid(format!(
                "initial noise must be non-negative and finite, got {}",
                self.initial_noise
            ));
        }
        Ok(())
    }

    /// Returns why an episode in `state` after `step_count` steps ends, if it does.
    ///
    /// A non-finite state is checked first, then angle, then position, then duration.
    pub fn termination_cause(
        &self,
        state: &CartPoleState,
        step_count: usize,
        max_steps: usize,
    ) -> Option<TerminationCause> {
        if !state.is_finite() {
            Some(TerminationCause::Diverged)
        } else if state.theta.abs() > self.theta_threshold_radians {
            Some(TerminationCause::PoleAngle)
        } else if state.x.abs() > self.x_threshold {
            Some(TerminationCause::CartPosition)
        } else if step_count >= max_steps {
            Some(TerminationCause::MaxSteps)
        } else {
            None
        }
    }
}

impl<C> CartPoleEnvConfig<C>
where
    C: Serialize + for<'de> Deserialize<'de> + Default,
{
    /// Constructs [`CartPoleEnvConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CartPoleEnvConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Configuration of an environment with action filter `AF`.
pub type CartPoleEnvConfigOf<AF> = CartPoleEnvConfig<<AF as CartPoleActFilter>::Config>;
