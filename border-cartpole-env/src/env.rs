//! Episode state machine of the cart-pole system.
mod config;
use crate::{
    degrees_to_radians, extract, integrate, CartPoleActFilter, CartPoleError, CartPoleObs,
    CartPoleState, ColorMode, ContinuousActFilter, DiscreteActFilter, DownScale, PixelArray,
    RenderMode, RewardModel, Scene, Viewer,
};
use anyhow::Result;
use border_core::{
    record::{Record, RecordValue},
    Env, Info, Step,
};
pub use config::{CartPoleEnvConfig, CartPoleEnvConfigOf, BASELINE_THETA_THRESHOLD_DEGREES};
use log::{debug, info, trace, warn};
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Status of the current episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeStatus {
    /// No episode has been started.
    Uninitialized,

    /// An episode is running and accepts steps.
    Running,

    /// The episode has ended. A reset is required before the next step.
    Terminated,
}

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    /// The pole left the angle envelope.
    PoleAngle,

    /// The cart left the track.
    CartPosition,

    /// The episode reached its duration. This is a success.
    MaxSteps,

    /// The state became infinite or NaN, e.g. under an overflowing force.
    Diverged,
}

impl TerminationCause {
    /// Returns `true` if the episode ended by leaving the success envelope.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::MaxSteps)
    }

    /// Name of the cause used in step records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PoleAngle => "pole_angle",
            Self::CartPosition => "cart_position",
            Self::MaxSteps => "max_steps",
            Self::Diverged => "diverged",
        }
    }
}

/// Diagnostic information of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartPoleInfo {
    /// The number of steps taken in the episode, including this one.
    pub step_count: usize,

    /// Set on the step that ends the episode.
    pub termination: Option<TerminationCause>,
}

impl CartPoleInfo {
    /// Returns `true` if the episode ended by reaching its duration.
    pub fn is_success(&self) -> bool {
        self.termination == Some(TerminationCause::MaxSteps)
    }
}

impl Info for CartPoleInfo {}

/// Per-episode overrides of the configuration, applied by [`CartPoleEnv::reset_with`].
///
/// Overrides hold for one episode only.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResetOptions {
    /// Initial pole angle in degrees, within `[-180, 180]`.
    pub initial_angle: Option<f64>,

    /// Duration of the episode.
    pub max_steps: Option<usize>,
}

impl ResetOptions {
    /// Sets the initial pole angle in degrees.
    pub fn initial_angle(mut self, degrees: f64) -> Self {
        self.initial_angle = Some(degrees);
        self
    }

    /// Sets the duration of the episode.
    pub fn max_steps(mut self, v: usize) -> Self {
        self.max_steps = Some(v);
        self
    }

    fn validate(&self) -> Result<(), CartPoleError> {
        if let Some(angle) = self.initial_angle {
            if !angle.is_finite() || !(-180.0..=180.0).contains(&angle) {
                return Err(CartPoleError::InvalidConfiguration(format!(
                    "initial angle must be within [-180, 180] degrees, got {}",
                    angle
                )));
            }
        }
        if self.max_steps == Some(0) {
            return Err(CartPoleError::InvalidConfiguration(
                "max_steps must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cart-pole environment.
///
/// Actions are decoded into forces by the action filter `AF`. See
/// [`CartPoleDiscreteEnv`] and [`CartPoleContinuousEnv`].
///
/// Leaving the angle or position envelope ends the episode with
/// [`Step::is_terminated`] set; reaching the duration ends it with
/// [`Step::is_truncated`] set. In both cases [`Step::is_done`] is `true` and
/// the cause is reported in [`CartPoleInfo`].
pub struct CartPoleEnv<AF: CartPoleActFilter> {
    config: CartPoleEnvConfig<AF::Config>,
    act_filter: AF,
    reward_model: RewardModel,
    scene: Scene,
    rng: SmallRng,

    // Current episode
    state: Option<CartPoleState>,
    status: EpisodeStatus,
    step_count: usize,
    max_steps: usize,

    // Acquired on the first render, released by close()
    viewer: Option<Viewer>,
}

/// Cart-pole environment with discrete actions.
pub type CartPoleDiscreteEnv = CartPoleEnv<DiscreteActFilter>;

/// Cart-pole environment with continuous actions.
pub type CartPoleContinuousEnv = CartPoleEnv<ContinuousActFilter>;

impl<AF: CartPoleActFilter> CartPoleEnv<AF> {
    /// Constructs an environment. No episode is running until the first reset.
    pub fn new(config: &CartPoleEnvConfig<AF::Config>, seed: u64) -> Result<Self, CartPoleError> {
        config.validate()?;
        let act_filter = AF::build(&config.act_filter_config)?;
        let reward_model = RewardModel::build(
            &config.reward,
            config.x_threshold,
            config.theta_threshold_radians,
        )?;
        let scene = Scene::new(&config.render, config.x_threshold, config.physics.length);
        info!(
            "Build cart-pole environment (seed = {}, theta threshold = {:.4} rad, x threshold = {})",
            seed, config.theta_threshold_radians, config.x_threshold
        );

        Ok(Self {
            config: config.clone(),
            act_filter,
            reward_model,
            scene,
            rng: SmallRng::seed_from_u64(seed),
            state: None,
            status: EpisodeStatus::Uninitialized,
            step_count: 0,
            max_steps: config.max_steps,
            viewer: None,
        })
    }

    /// Starts a new episode from any status.
    ///
    /// Every state component is drawn uniformly from
    /// `[-initial_noise, initial_noise]`. If `options.initial_angle` is given,
    /// it replaces the pole angle after conversion to radians. Invalid options
    /// fail without touching the current episode.
    pub fn reset_with(&mut self, options: &ResetOptions) -> Result<CartPoleObs, CartPoleError> {
        options.validate()?;

        let noise = self.config.initial_noise;
        let mut sample = || self.rng.gen_range(-noise..=noise);
        let mut state = CartPoleState::new(sample(), sample(), sample(), sample());
        if let Some(angle) = options.initial_angle {
            state.theta = degrees_to_radians(angle);
        }

        self.state = Some(state);
        self.status = EpisodeStatus::Running;
        self.step_count = 0;
        self.max_steps = options.max_steps.unwrap_or(self.config.max_steps);
        info!(
            "Reset episode (theta = {:.4} rad, max_steps = {})",
            state.theta, self.max_steps
        );

        Ok(state.into())
    }

    fn step_episode(&mut self, act: &AF::Act) -> Result<(Step<Self>, Record), CartPoleError> {
        let state = match (self.status, self.state) {
            (EpisodeStatus::Running, Some(state)) => state,
            (status, _) => {
                warn!("Step attempted while the episode is {:?}", status);
                return Err(CartPoleError::InvalidEpisodeState {
                    operation: "step",
                    status,
                });
            }
        };

        // Invalid actions leave the episode untouched
        let (force, mut record) = self.act_filter.decode(act)?;

        let next = integrate(&self.config.physics, &state, force, self.config.physics.tau);
        self.state = Some(next);
        self.step_count += 1;

        let termination = self
            .config
            .termination_cause(&next, self.step_count, self.max_steps);
        let mut reward = self.reward_model.reward(&next);
        if !reward.is_finite() {
            // Only reachable by a diverged step
            reward = 0.0;
        }
        if let Some(cause) = termination {
            if cause.is_failure() {
                reward -= self.reward_model.failure_penalty();
            }
            self.status = EpisodeStatus::Terminated;
            debug!(
                "Episode ended by {} after {} steps",
                cause.as_str(),
                self.step_count
            );
        }
        trace!(
            "step = {}, force = {}, state = {:?}, reward = {}",
            self.step_count,
            force,
            next,
            reward
        );

        record.merge_inplace(Record::from_slice(&[
            ("x", RecordValue::Scalar(next.x as f32)),
            ("x_dot", RecordValue::Scalar(next.x_dot as f32)),
            ("theta", RecordValue::Scalar(next.theta as f32)),
            ("theta_dot", RecordValue::Scalar(next.theta_dot as f32)),
            ("force", RecordValue::Scalar(force as f32)),
            ("step_count", RecordValue::Scalar(self.step_count as f32)),
        ]));
        if let Some(cause) = termination {
            record.insert("termination", RecordValue::String(cause.as_str().to_string()));
            let success = if cause.is_failure() { 0.0 } else { 1.0 };
            record.insert("success", RecordValue::Scalar(success));
        }

        let info = CartPoleInfo {
            step_count: self.step_count,
            termination,
        };
        let is_terminated = termination.map_or(false, |c| c.is_failure());
        let is_truncated = termination == Some(TerminationCause::MaxSteps);
        let step = Step::new(
            next.into(),
            act.clone(),
            reward as f32,
            is_terminated,
            is_truncated,
            info,
        );

        Ok((step, record))
    }

    /// Draws the current state and, for [`RenderMode::RgbArray`], returns it as a pixel array.
    ///
    /// If `show_window` is `true`, the frame is also shown in a window. The
    /// drawing surface is acquired on the first call and kept until
    /// [`close`](Self::close); it is replaced when `show_window` changes.
    pub fn render(
        &mut self,
        mode: RenderMode,
        color: ColorMode,
        show_window: bool,
    ) -> Result<Option<PixelArray>, CartPoleError> {
        self.render_scaled(mode, color, show_window, None)
    }

    /// Same as [`render`](Self::render), down-scaling the returned array if `scale` is given.
    pub fn render_scaled(
        &mut self,
        mode: RenderMode,
        color: ColorMode,
        show_window: bool,
        scale: Option<DownScale>,
    ) -> Result<Option<PixelArray>, CartPoleError> {
        let state = match self.state {
            Some(state) => state,
            None => {
                return Err(CartPoleError::InvalidEpisodeState {
                    operation: "render",
                    status: self.status,
                })
            }
        };

        let viewer = match self.viewer.take() {
            Some(viewer) if viewer.is_visible() == show_window => viewer,
            previous => {
                let config = self.config.render.clone().visible(show_window);
                match Viewer::new(&config) {
                    Ok(viewer) => viewer,
                    Err(e) => {
                        self.viewer = previous;
                        return Err(e);
                    }
                }
            }
        };
        let viewer = self.viewer.insert(viewer);
        viewer.draw(&self.scene, &state);
        if let Err(e) = viewer.show() {
            // The window is gone, release the rest of the viewer with it
            self.viewer = None;
            return Err(e);
        }

        match mode {
            RenderMode::Human => Ok(None),
            RenderMode::RgbArray => extract(
                viewer.surface(),
                color,
                self.config.render.binary_threshold,
                scale,
            )
            .map(Some),
        }
    }

    /// Releases the drawing surface and the window, if any.
    ///
    /// The episode is not affected. A later render acquires a new surface.
    pub fn close(&mut self) {
        if self.viewer.take().is_some() {
            info!("Close viewer");
        }
    }

    /// Returns `true` while a drawing surface is held.
    pub fn has_viewer(&self) -> bool {
        self.viewer.is_some()
    }

    /// The current state, `None` before the first reset.
    pub fn state(&self) -> Option<CartPoleState> {
        self.state
    }

    /// Status of the current episode.
    pub fn status(&self) -> EpisodeStatus {
        self.status
    }

    /// The number of steps taken in the current episode.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Duration of the current episode.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// The configuration the environment was built with.
    pub fn config(&self) -> &CartPoleEnvConfig<AF::Config> {
        &self.config
    }

    /// The reward model.
    pub fn reward_model(&self) -> &RewardModel {
        &self.reward_model
    }

    /// Projection used for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

impl<AF: CartPoleActFilter> Env for CartPoleEnv<AF> {
    type Config = CartPoleEnvConfig<AF::Config>;
    type Obs = CartPoleObs;
    type Act = AF::Act;
    type Info = CartPoleInfo;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        Ok(Self::new(config, seed as u64)?)
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        Ok(self.step_episode(a)?)
    }

    fn reset(&mut self) -> Result<Self::Obs> {
        Ok(self.reset_with(&ResetOptions::default())?)
    }

    fn reset_with_index(&mut self, ix: usize) -> Result<Self::Obs> {
        self.rng = SmallRng::seed_from_u64(ix as u64);
        self.reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        CartPoleContinuousAct, CartPoleDiscreteAct, ContinuousActFilterConfig,
        DiscreteActFilterConfig, RewardConfig,
    };

    fn discrete_env() -> CartPoleDiscreteEnv {
        CartPoleDiscreteEnv::new(&CartPoleEnvConfig::default(), 42).unwrap()
    }

    #[test]
    fn test_initial_state_is_small() {
        let mut env = discrete_env();
        assert_eq!(env.status(), EpisodeStatus::Uninitialized);
        assert_eq!(env.state(), None);

        for _ in 0..20 {
            let obs = env.reset_with(&ResetOptions::default()).unwrap();
            assert!(obs.state.to_array().iter().all(|v| v.abs() <= 0.05));
            assert_eq!(env.status(), EpisodeStatus::Running);
            assert_eq!(env.step_count(), 0);
            assert_eq!(env.max_steps(), 200);
        }
    }

    #[test]
    fn test_overrides_do_not_persist() {
        let mut env = discrete_env();
        env.reset_with(&ResetOptions::default().max_steps(3)).unwrap();
        assert_eq!(env.max_steps(), 3);
        env.reset_with(&ResetOptions::default()).unwrap();
        assert_eq!(env.max_steps(), 200);
    }

    #[test]
    fn test_invalid_reset_keeps_episode() {
        let mut env = discrete_env();
        env.reset_with(&ResetOptions::default()).unwrap();
        env.step(&CartPoleDiscreteAct::NO_FORCE).unwrap();
        let state = env.state();

        for options in [
            ResetOptions::default().initial_angle(180.5),
            ResetOptions::default().initial_angle(f64::NAN),
            ResetOptions::default().max_steps(0),
        ] {
            assert!(matches!(
                env.reset_with(&options),
                Err(CartPoleError::InvalidConfiguration(_))
            ));
        }
        assert_eq!(env.state(), state);
        assert_eq!(env.step_count(), 1);
        assert_eq!(env.status(), EpisodeStatus::Running);
    }

    #[test]
    fn test_invalid_action_keeps_episode() {
        let mut env = CartPoleContinuousEnv::new(&CartPoleEnvConfig::default(), 0).unwrap();
        env.reset_with(&ResetOptions::default()).unwrap();
        let state = env.state();

        let err = env.step_episode(&CartPoleContinuousAct::new(f64::NAN)).err();
        assert!(matches!(err, Some(CartPoleError::InvalidAction(_))));
        assert_eq!(env.state(), state);
        assert_eq!(env.step_count(), 0);
    }

    #[test]
    fn test_failure_penalty() {
        let reward = RewardConfig::default().failure_penalty(10.0);
        let config = CartPoleEnvConfig::<DiscreteActFilterConfig>::default().reward(reward);
        let mut env = CartPoleDiscreteEnv::new(&config, 0).unwrap();

        // Beyond the envelope from the start, the first step fails
        env.reset_with(&ResetOptions::default().initial_angle(60.0))
            .unwrap();
        let (step, record) = env.step_episode(&CartPoleDiscreteAct::NO_FORCE).unwrap();
        let next = env.state().unwrap();
        let expected = env.reward_model().reward(&next) - 10.0;
        assert!(step.is_terminated && !step.is_truncated);
        assert_eq!(step.reward, expected as f32);
        assert_eq!(record.get_string("termination").unwrap(), "pole_angle");
        assert_eq!(record.get_scalar("success").unwrap(), 0.0);

        // Reaching the duration is not penalised
        env.reset_with(&ResetOptions::default().initial_angle(0.0).max_steps(1))
            .unwrap();
        let (step, record) = env.step_episode(&CartPoleDiscreteAct::NO_FORCE).unwrap();
        let next = env.state().unwrap();
        assert!(step.is_truncated && !step.is_terminated);
        assert_eq!(step.reward, env.reward_model().reward(&next) as f32);
        assert_eq!(record.get_scalar("success").unwrap(), 1.0);
        assert!(step.info.is_success());
    }

    #[test]
    fn test_overflowing_force_ends_episode() {
        let reward = RewardConfig::default().failure_penalty(10.0);
        let config = CartPoleEnvConfig::<ContinuousActFilterConfig>::default().reward(reward);
        let mut env = CartPoleContinuousEnv::new(&config, 0).unwrap();
        env.reset_with(&ResetOptions::default().initial_angle(0.0))
            .unwrap();

        let act = CartPoleContinuousAct::new(f64::MAX);
        let (step, record) = env.step_episode(&act).unwrap();
        assert!(step.is_terminated && !step.is_truncated);
        assert_eq!(step.info.termination, Some(TerminationCause::Diverged));
        assert!(step.reward.is_finite());
        assert_eq!(record.get_string("termination").unwrap(), "diverged");
        assert_eq!(record.get_scalar("success").unwrap(), 0.0);
        assert_eq!(env.status(), EpisodeStatus::Terminated);
        assert!(env.step_episode(&CartPoleContinuousAct::new(0.0)).is_err());

        // Non-finite components with non-zero weight
        for force in [1e300, -f64::MAX] {
            env.reset_with(&ResetOptions::default().initial_angle(0.0))
                .unwrap();
            let mut done = false;
            while !done {
                let (step, _) = env.step_episode(&CartPoleContinuousAct::new(force)).unwrap();
                assert!(step.reward.is_finite());
                done = step.is_done();
            }
        }
    }

    #[test]
    fn test_step_record() {
        let mut env = discrete_env();
        env.reset_with(&ResetOptions::default()).unwrap();
        let (step, record) = env.step(&CartPoleDiscreteAct::PUSH_RIGHT).unwrap();

        assert_eq!(record.get_scalar("force").unwrap(), 10.0);
        assert_eq!(record.get_scalar("act").unwrap(), 2.0);
        assert_eq!(record.get_scalar("step_count").unwrap(), 1.0);
        assert_eq!(record.get_scalar("x").unwrap(), step.obs.state.x as f32);
        assert!(!record.contains_key("termination"));
        assert_eq!(step.info.step_count, 1);
        assert_eq!(step.info.termination, None);
    }

    #[test]
    fn test_reset_with_index_is_reproducible() {
        let mut env1 = discrete_env();
        let mut env2 = CartPoleDiscreteEnv::new(&CartPoleEnvConfig::default(), 7).unwrap();

        let obs1 = env1.reset_with_index(3).unwrap();
        let obs2 = env2.reset_with_index(3).unwrap();
        assert_eq!(obs1, obs2);
        assert_ne!(obs1, env1.reset_with_index(4).unwrap());
    }

    #[test]
    fn test_termination_cause_names() {
        assert!(TerminationCause::PoleAngle.is_failure());
        assert!(TerminationCause::CartPosition.is_failure());
        assert!(!TerminationCause::MaxSteps.is_failure());
        assert!(TerminationCause::Diverged.is_failure());
        assert_eq!(TerminationCause::Diverged.as_str(), "diverged");
        assert_eq!(TerminationCause::CartPosition.as_str(), "cart_position");
    }
}
