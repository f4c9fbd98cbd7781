//! Client configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `SUBMANAGER_*` environment variables. The CLI applies its own flags last.

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::Deserialize;

use crate::errors::SubManagerError;
use crate::structs::client::DEFAULT_API_URL;

pub const DEFAULT_BUDGET: f64 = 4000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub token_path: PathBuf,
    pub debug: bool,
    /// Yearly budget the overview compares spending against.
    pub budget: f64,
}

/// Shape of the TOML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    api_url: Option<String>,
    token_path: Option<PathBuf>,
    debug: Option<bool>,
    budget: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_path: default_token_path(),
            debug: false,
            budget: DEFAULT_BUDGET,
        }
    }
}

impl Config {
    /// Loads the configuration from `path` (when given) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, SubManagerError> {
        let mut config = Config::default();

        if let Some(path) = path {
            let content = fs::read_to_string(path).map_err(|err| {
                SubManagerError::Config(format!("cannot read {}: {}", path.display(), err))
            })?;
            config.merge_toml(&content)?;
        }

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn merge_toml(&mut self, content: &str) -> Result<(), SubManagerError> {
        let file: FileConfig =
            toml::from_str(content).map_err(|err| SubManagerError::Config(err.to_string()))?;

        if let Some(api_url) = file.api_url {
            self.api_url = api_url;
        }
        if let Some(token_path) = file.token_path {
            self.token_path = token_path;
        }
        if let Some(debug) = file.debug {
            self.debug = debug;
        }
        if let Some(budget) = file.budget {
            self.budget = budget;
        }
        Ok(())
    }

    /// Applies `SUBMANAGER_API_URL`, `SUBMANAGER_TOKEN_PATH` and `SUBMANAGER_DEBUG`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(api_url) = var("SUBMANAGER_API_URL") {
            self.api_url = api_url;
        }
        if let Some(token_path) = var("SUBMANAGER_TOKEN_PATH") {
            self.token_path = PathBuf::from(token_path);
        }
        if let Some(debug) = var("SUBMANAGER_DEBUG") {
            self.debug = matches!(debug.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    pub fn validate(&self) -> Result<(), SubManagerError> {
        Url::parse(&self.api_url)
            .map_err(|_| SubManagerError::InvalidBaseUrl(self.api_url.clone()))?;

        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(SubManagerError::Config(format!(
                "budget must be a non-negative number, got {}",
                self.budget
            )));
        }
        Ok(())
    }
}

/// `$HOME/.submanager/cookie`, or `.submanager/cookie` when there is no home directory.
fn default_token_path() -> PathBuf {
    let base = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_default();
    base.join(".submanager").join("cookie")
}
