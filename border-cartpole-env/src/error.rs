//! Errors of the cart-pole environment.
use crate::EpisodeStatus;
use thiserror::Error;

/// Errors of the cart-pole environment.
///
/// Leaving the success envelope during an episode is not an error; it ends
/// the episode and is reported through [`CartPoleInfo`](crate::CartPoleInfo).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CartPoleError {
    /// A configuration value or a reset option is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An operation was called in a state of the episode that does not allow it.
    #[error("Cannot {operation} while the episode is {status:?}")]
    InvalidEpisodeState {
        /// The rejected operation.
        operation: &'static str,

        /// The status of the episode at the time of the call.
        status: EpisodeStatus,
    },

    /// An action could not be decoded into a force.
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// A down-scaling request yields a degenerate image.
    #[error("Invalid scale: {0}")]
    InvalidScale(String),

    /// The drawing surface could not be acquired or released.
    #[error("Render resource error: {0}")]
    RenderResourceError(String),
}
