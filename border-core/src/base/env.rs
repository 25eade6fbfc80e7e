//! Environment.
use super::{Act, Info, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// Every operation fails explicitly rather than silently fixing its input:
/// invalid configurations, actions and calls outside of an episode are
/// reported as errors to the caller.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Information in the [self::Step] object.
    type Info: Info;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Performes an environment step.
    ///
    /// Fails if no episode is running, i.e., before the first reset or after
    /// the episode has ended.
    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;

    /// Starts a new episode and returns the initial observation.
    fn reset(&mut self) -> Result<Self::Obs>;

    /// Performes an environment step and resets the environment if the episode ends.
    ///
    /// The initial observation of the new episode is stored in [`Step::init_obs`].
    fn step_with_reset(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized,
    {
        let (mut step, record) = self.step(a)?;
        if step.is_done() {
            step.init_obs = Some(self.reset()?);
        }
        Ok((step, record))
    }

    /// Resets the environment with a given index.
    ///
    /// The index is used as the random seed of the new episode, which makes
    /// evaluation runs reproducible. This method is called in
    /// [`DefaultEvaluator`](crate::DefaultEvaluator).
    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs>;
}
