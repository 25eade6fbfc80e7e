//! Policy.
use super::Env;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::{fs::File, io::BufReader, path::Path};

/// A controller acting on an environment.
///
/// Maps an observation to the action applied in the next step, e.g. a state
/// feedback law or a random policy.
pub trait Policy<E: Env> {
    /// Sample an action given an observation.
    fn sample(&mut self, obs: &E::Obs) -> E::Act;
}

/// An object built from a configuration, typically a [`Policy`] whose
/// parameters are kept in a YAML file.
pub trait Configurable<E: Env> {
    /// Configuration.
    type Config: Clone + DeserializeOwned;

    /// Builds the object, failing if `config` holds invalid parameters.
    fn build(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Builds the object with the configuration in the YAML file at `path`.
    ///
    /// Fails if the file cannot be read or parsed, or if [`build`](Self::build)
    /// rejects the configuration.
    fn build_from_path(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized,
    {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open configuration {}", path.display()))?;
        let config = serde_yaml::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse configuration {}", path.display()))?;
        Self::build(config)
    }
}
