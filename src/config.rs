use std::path::PathBuf;

use thiserror::Error;

use crate::apis::gizmo::GizmoConfig;

pub const ENV_GIZMO_USERNAME: &str = "GIZMO_USERNAME";
pub const ENV_GIZMO_PASSWORD: &str = "GIZMO_PASSWORD";
pub const ENV_GIZMO_URL: &str = "GIZMO_URL";
pub const ENV_GOOGLE_CREDENTIALS_FILE: &str = "GOOGLE_CREDENTIALS_FILE";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("env {0} is not set")]
    MissingEnv(&'static str),
}

/// Settings that must be provided through the environment.
#[derive(Debug, Clone)]
pub struct ExporterEnv {
    pub gizmo: GizmoConfig,
    pub google_credentials_file: PathBuf,
}

impl ExporterEnv {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the settings through `lookup`. Unset and empty variables are both
    /// treated as missing; the first missing one is reported.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| {
            lookup(name).filter(|value| !value.is_empty()).ok_or(ConfigError::MissingEnv(name))
        };

        let username = require(ENV_GIZMO_USERNAME)?;
        let password = require(ENV_GIZMO_PASSWORD)?;
        let url = require(ENV_GIZMO_URL)?;
        let google_credentials_file = require(ENV_GOOGLE_CREDENTIALS_FILE)?;

        Ok(Self {
            gizmo: GizmoConfig { username, password, url },
            google_credentials_file: PathBuf::from(google_credentials_file),
        })
    }
}
