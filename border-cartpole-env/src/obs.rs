use crate::CartPoleState;
use border_core::Obs;

/// State-vector observation of [`CartPoleEnv`](crate::CartPoleEnv).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartPoleObs {
    /// The state after the last reset or step.
    pub state: CartPoleState,
}

impl CartPoleObs {
    /// Returns `[x, x_dot, theta, theta_dot]` in single precision.
    pub fn to_vec(&self) -> Vec<f32> {
        self.state.to_array().iter().map(|v| *v as f32).collect()
    }
}

impl From<CartPoleState> for CartPoleObs {
    fn from(state: CartPoleState) -> Self {
        Self { state }
    }
}

impl Obs for CartPoleObs {
    fn len(&self) -> usize {
        1
    }
}
