#![warn(missing_docs)]
//! Core abstractions shared by the environments of the library.
//!
//! An environment ([`Env`]) emits observations ([`Obs`]), consumes actions ([`Act`])
//! and reports each interaction step as a [`Step`] together with a
//! [`Record`](record::Record) of diagnostic values. A [`Policy`] maps
//! observations to actions and is evaluated with an [`Evaluator`].
pub mod error;
pub mod record;
pub mod util;

mod base;
pub use base::{Act, Configurable, Env, Info, Obs, Policy, Step};

mod evaluator;
pub use evaluator::{DefaultEvaluator, Evaluator};
