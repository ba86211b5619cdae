//! Small cross-crate helpers: environment access, TOML config loading and
//! logging setup.

pub mod config;
pub mod env;
pub mod logging;
