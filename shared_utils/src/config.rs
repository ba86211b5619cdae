//! TOML configuration loading.
//!
//! Config structs live next to the code that consumes them; this module only
//! knows how to turn a file or string into any `DeserializeOwned` type.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::env::MissingEnvVarError;

/// Errors related to application configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable required by the application is not set.
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVarError),

    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config text is not valid TOML for the target type.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parses a TOML string into `T`.
pub fn load_toml_str<T: DeserializeOwned>(s: &str) -> Result<T, ConfigError> {
    Ok(toml::from_str(s)?)
}

/// Reads and parses a TOML file into `T`.
pub fn load_toml_path<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    load_toml_str(&s)
}
