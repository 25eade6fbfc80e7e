#![warn(missing_docs)]
//! Cart-pole environment with pixel observations for [`Border`](https://crates.io/crates/border).
//!
//! A cart moves along a horizontal track with a pole hinged on top.
//! Compared to the classic task, the pole may lean up to 45 degrees before an
//! episode fails, episodes can start from a given pole angle and have a
//! given duration, and the reward decreases smoothly with the deviation from
//! a reference state.
//!
//! ## Actions
//!
//! [`CartPoleEnv`] is parameterised by a [`CartPoleActFilter`], which decodes
//! actions into the force applied to the cart:
//!
//! * [`CartPoleDiscreteEnv`] takes [`CartPoleDiscreteAct`], one of push
//!   left, no force and push right.
//! * [`CartPoleContinuousEnv`] takes [`CartPoleContinuousAct`], an unbounded
//!   signed force.
//!
//! ## Episodes
//!
//! An episode ends when the pole angle or the cart position leaves its
//! envelope ([`Step::is_terminated`](border_core::Step)) or when the episode
//! reaches its duration ([`Step::is_truncated`](border_core::Step)). The
//! cause is reported in [`CartPoleInfo`]. Stepping outside of a running
//! episode fails with [`CartPoleError::InvalidEpisodeState`].
//!
//! ## Pixel observations
//!
//! [`CartPoleEnv::render`] draws the scene on an offscreen surface and
//! returns it as an RGB, grayscale or binary [`PixelArray`] of shape
//! `(height, width, channels)`. [`down_scale`] reduces the resolution of such
//! arrays. Frames are shown in a window only with the `window` feature.
//!
//! ```no_run
//! use anyhow::Result;
//! use border_cartpole_env::{
//!     CartPoleDiscreteAct, CartPoleDiscreteEnv, CartPoleEnvConfig, ColorMode, DownScale,
//!     RenderMode, ResetOptions,
//! };
//! use border_core::Env as _;
//!
//! fn main() -> Result<()> {
//!     let config = CartPoleEnvConfig::default().max_steps(100);
//!     let mut env = CartPoleDiscreteEnv::build(&config, 42)?;
//!
//!     env.reset_with(&ResetOptions::default().initial_angle(20.0))?;
//!     loop {
//!         let (step, _) = env.step(&CartPoleDiscreteAct::NO_FORCE)?;
//!         let pixels = env.render_scaled(
//!             RenderMode::RgbArray,
//!             ColorMode::Binary,
//!             false,
//!             Some(DownScale::Factor(4)),
//!         )?;
//!         assert_eq!(pixels.map(|p| p.dim()), Some((100, 150, 1)));
//!         if step.is_done() {
//!             println!("{:?}", step.info.termination);
//!             break;
//!         }
//!     }
//!     env.close();
//!
//!     Ok(())
//! }
//! ```
mod act;
mod env;
mod error;
mod extract;
mod obs;
mod physics;
mod render;
mod reward;
pub use act::{
    CartPoleActFilter, CartPoleContinuousAct, CartPoleDiscreteAct, ContinuousActFilter,
    ContinuousActFilterConfig, DiscreteActFilter, DiscreteActFilterConfig,
};
pub use env::{
    CartPoleContinuousEnv, CartPoleDiscreteEnv, CartPoleEnv, CartPoleEnvConfig,
    CartPoleEnvConfigOf, CartPoleInfo, EpisodeStatus, ResetOptions, TerminationCause,
    BASELINE_THETA_THRESHOLD_DEGREES,
};
pub use error::CartPoleError;
pub use extract::{
    down_scale, down_scale_normalized, extract, image_to_array, to_binary, to_grayscale,
    ColorMode, DownScale, PixelArray,
};
pub use obs::CartPoleObs;
pub use physics::{
    degrees_to_radians, integrate, wrap_angle, CartPoleState, Integrator, PhysicsConfig,
};
pub use render::{CartPoleWindow, RenderConfig, RenderMode, Scene, Surface, Viewer};
pub use reward::{DeviationNorm, RewardConfig, RewardModel};
