//! Error types for host startup and registration.

use std::{error::Error, io};

use thiserror::Error;

use crate::stage::Stage;

/// Errors raised while launching the engine.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The engine was already launched from another stage.
    #[error("engine already launched (current stage: {0})")]
    AlreadyLaunched(Stage),
    /// The launcher thread could not be spawned.
    #[error("failed to spawn launcher thread: {0}")]
    Spawn(#[from] io::Error),
    /// The native libraries are missing or damaged.
    #[error("native libraries are corrupted: {0}")]
    CorruptedLibraries(String),
    /// The engine reported a failure while loading or running.
    #[error("engine failed: {0}")]
    Engine(#[source] Box<dyn Error + Send + Sync>),
    /// A plugin or package could not be registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors raised while registering plugins.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A plugin of the same type is already registered.
    #[error("plugin '{0}' was registered more than once")]
    DuplicatePlugin(&'static str),
}

/// Errors raised while parsing configuration.
#[cfg(feature = "serde")]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document is malformed.
    #[error("invalid host configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
