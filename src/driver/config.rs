//! Checker configuration (`fbc.toml`).
//!
//! ```toml
//! [check]
//! permissive_casts = true
//! static_fields = true
//! suppress = ["initialization.invalid.cast"]
//!
//! [log]
//! level = "warn"
//! format = "text"
//! ```
//!
//! A missing file means all defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::core::semck::CheckOptions;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckerConfig {
    #[serde(default)]
    pub check: CheckSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckSection {
    #[serde(default = "default_true")]
    pub permissive_casts: bool,
    #[serde(default = "default_true")]
    pub static_fields: bool,
    /// Diagnostic keys to drop from reports.
    #[serde(default)]
    pub suppress: Vec<String>,
}

impl Default for CheckSection {
    fn default() -> Self {
        Self {
            permissive_casts: true,
            static_fields: true,
            suppress: Vec::new(),
        }
    }
}

const fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Error)]
#[error("{}{message}", location(.path))]
pub struct ConfigError {
    pub path: Option<PathBuf>,
    pub message: String,
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!("{}: ", p.display()))
        .unwrap_or_default()
}

impl CheckerConfig {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }

    pub fn options(&self) -> CheckOptions {
        CheckOptions {
            permissive_casts: self.check.permissive_casts,
            static_fields: self.check.static_fields,
        }
    }

    pub fn is_suppressed(&self, key: &str) -> bool {
        self.check.suppress.iter().any(|k| k == key)
    }
}

#[cfg(test)]
#[path = "../tests/driver/t_config.rs"]
mod tests;
