//! Core functionalities.
mod env;
mod policy;
mod step;
pub use env::Env;
pub use policy::{Configurable, Policy};
use std::fmt::Debug;
pub use step::{Info, Step};

/// An observation of an environment.
///
/// Vectorized environments are not supported, thus [Obs]`::len()`
/// returns 1 for every observation in the library.
pub trait Obs: Clone + Debug {
    /// Returns the number of observations in the object.
    fn len(&self) -> usize;
}

/// An action of an environment.
pub trait Act: Clone + Debug {
    /// Returns the number of actions in the object.
    fn len(&self) -> usize;
}
