//! Actions of [`CartPoleEnv`](crate::CartPoleEnv) and their decoding into forces.
//!
//! The environment is parameterised by a [`CartPoleActFilter`], which turns
//! an action into the horizontal force applied to the cart. Two filters are
//! provided: [`DiscreteActFilter`] (push left, no force, push right) and
//! [`ContinuousActFilter`] (an unbounded signed force).
use crate::CartPoleError;
use border_core::{
    record::{Record, RecordValue},
    Act,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Decodes actions of type [`Self::Act`] into forces (N).
pub trait CartPoleActFilter {
    /// Action accepted by the filter.
    type Act: Act;

    /// Configuration of the filter.
    type Config: Clone + Default + Serialize + DeserializeOwned;

    /// Constructs the filter given a configuration.
    fn build(config: &Self::Config) -> Result<Self, CartPoleError>
    where
        Self: Sized;

    /// Converts an action into a force.
    ///
    /// Invalid actions fail with [`CartPoleError::InvalidAction`]; they are never clamped.
    fn decode(&mut self, act: &Self::Act) -> Result<(f64, Record), CartPoleError>;
}

/// Discrete action, an index into `{push left, no force, push right}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartPoleDiscreteAct {
    /// Index of the action.
    pub act: i64,
}

impl CartPoleDiscreteAct {
    /// Pushes the cart towards negative `x`.
    pub const PUSH_LEFT: Self = Self { act: 0 };

    /// Applies no force.
    pub const NO_FORCE: Self = Self { act: 1 };

    /// Pushes the cart towards positive `x`.
    pub const PUSH_RIGHT: Self = Self { act: 2 };

    /// The number of valid actions.
    pub const N_ACTIONS: usize = 3;

    /// Constructs an action from its index.
    pub fn new(act: i64) -> Self {
        Self { act }
    }
}

impl Act for CartPoleDiscreteAct {
    fn len(&self) -> usize {
        1
    }
}

impl From<i64> for CartPoleDiscreteAct {
    fn from(act: i64) -> Self {
        Self { act }
    }
}

impl From<u8> for CartPoleDiscreteAct {
    fn from(act: u8) -> Self {
        Self { act: act as i64 }
    }
}

/// Configuration of [`DiscreteActFilter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscreteActFilterConfig {
    /// Magnitude of the push (N).
    pub force_mag: f64,
}

impl Default for DiscreteActFilterConfig {
    fn default() -> Self {
        Self { force_mag: 10.0 }
    }
}

impl DiscreteActFilterConfig {
    /// Sets the magnitude of the push.
    pub fn force_mag(mut self, v: f64) -> Self {
        self.force_mag = v;
        self
    }
}

/// Maps [`CartPoleDiscreteAct`] to `{-F, 0, +F}`.
#[derive(Debug, Clone)]
pub struct DiscreteActFilter {
    force_mag: f64,
}

impl CartPoleActFilter for DiscreteActFilter {
    type Act = CartPoleDiscreteAct;
    type Config = DiscreteActFilterConfig;

    fn build(config: &Self::Config) -> Result<Self, CartPoleError> {
        if !config.force_mag.is_finite() || config.force_mag <= 0.0 {
            return Err(CartPoleError::InvalidConfiguration(format!(
                "force_mag must be positive and finite, got {}",
                config.force_mag
            )));
        }
        Ok(Self {
            force_mag: config.force_mag,
        })
    }

    fn decode(&mut self, act: &Self::Act) -> Result<(f64, Record), CartPoleError> {
        let force = match act.act {
            0 => -self.force_mag,
            1 => 0.0,
            2 => self.force_mag,
            ix => {
                return Err(CartPoleError::InvalidAction(format!(
                    "discrete action index must be in 0..{}, got {}",
                    CartPoleDiscreteAct::N_ACTIONS,
                    ix
                )))
            }
        };
        let record = Record::from_slice(&[("act", RecordValue::Scalar(act.act as f32))]);
        Ok((force, record))
    }
}

/// Continuous action, the signed force applied to the cart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartPoleContinuousAct {
    /// Force (N). Positive values push the cart towards positive `x`.
    pub force: f64,
}

impl CartPoleContinuousAct {
    /// Constructs an action.
    pub fn new(force: f64) -> Self {
        Self { force }
    }
}

impl Act for CartPoleContinuousAct {
    fn len(&self) -> usize {
        1
    }
}

impl From<f64> for CartPoleContinuousAct {
    fn from(force: f64) -> Self {
        Self { force }
    }
}

impl From<f32> for CartPoleContinuousAct {
    fn from(force: f32) -> Self {
        Self {
            force: force as f64,
        }
    }
}

/// Configuration of [`ContinuousActFilter`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContinuousActFilterConfig;

/// Passes the force through without clamping.
#[derive(Debug, Clone, Default)]
pub struct ContinuousActFilter;

impl CartPoleActFilter for ContinuousActFilter {
    type Act = CartPoleContinuousAct;
    type Config = ContinuousActFilterConfig;

    fn build(_config: &Self::Config) -> Result<Self, CartPoleError> {
        Ok(Self)
    }

    fn decode(&mut self, act: &Self::Act) -> Result<(f64, Record), CartPoleError> {
        if !act.force.is_finite() {
            return Err(CartPoleError::InvalidAction(format!(
                "force must be finite, got {}",
                act.force
            )));
        }
        Ok((act.force, Record::from_scalar("act", act.force as f32)))
    }
}
