//! Engine configuration.
//!
//! Loaded from defaults, the environment, or a TOML file. Every source is
//! validated the same way.

use crate::error::{ConfigError, LiveQueryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Environment variable selecting the service authorization mode.
pub const SERVICE_AUTHORIZATION_ENV: &str = "LIVEQUERY_SERVICE_AUTHORIZATION";

/// How a contact gains access to a service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAuthorization {
    /// Contacts of the service's host may also see the service.
    #[default]
    Loose,
    /// Only contacts of the service itself may see it.
    Strict,
}

impl ServiceAuthorization {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAuthorization::Loose => "loose",
            ServiceAuthorization::Strict => "strict",
        }
    }
}

impl fmt::Display for ServiceAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceAuthorization {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "loose" => Ok(ServiceAuthorization::Loose),
            "strict" => Ok(ServiceAuthorization::Strict),
            _ => Err(ConfigError::InvalidValue {
                field: "service_authorization".to_string(),
                value: s.to_string(),
                reason: "expected one of: loose, strict".to_string(),
            }),
        }
    }
}

/// Engine-wide settings consumed by table wiring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EngineConfig {
    pub service_authorization: ServiceAuthorization,
}

impl EngineConfig {
    /// Load from environment variables, falling back to defaults for unset
    /// variables. A set but unrecognized value is an error.
    pub fn from_env() -> LiveQueryResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Used by [`EngineConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> LiveQueryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let service_authorization = match lookup(SERVICE_AUTHORIZATION_ENV) {
            Some(raw) => raw.parse()?,
            None => defaults.service_authorization,
        };
        Ok(Self {
            service_authorization,
        })
    }

    /// Load from a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> LiveQueryResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> LiveQueryResult<Self> {
        let config: EngineConfig = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        Ok(config)
    }
}
