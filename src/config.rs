//! `config.toml` loading.
//!
//! The file lives in the platform config directory unless `--config` names
//! another one. Every key is optional; command-line flags win over the file.

use directories::ProjectDirs;
use serde::Deserialize;
use sheetlex_engine::tokenizer::TokenizerOptions;
use std::path::{Path, PathBuf};
use thiserror::Error;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Refusing to read {}: file too large ({size} bytes, max {max})", .path.display())]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Keep whitespace runs as WHITESPACE tokens.
    pub preserve_whitespace: bool,
    /// Nesting limit for parentheses, functions and arrays.
    pub max_depth: Option<usize>,
    /// Default log filter when `RUST_LOG` is unset, e.g. `"info"` or `"sheetlex=debug"`.
    pub log_level: Option<String>,
}

impl Config {
    pub fn tokenizer_options(&self) -> TokenizerOptions {
        let defaults = TokenizerOptions::default();
        TokenizerOptions {
            preserve_whitespace: self.preserve_whitespace,
            max_depth: self.max_depth.unwrap_or(defaults.max_depth),
        }
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "sheetlex")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

/// Load the config file. An explicit path must exist; the default one may not.
pub fn load_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match explicit {
        Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
        Some(path) => path.to_path_buf(),
        None => match user_config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(Config::default()),
        },
    };
    read_config(&path)
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let read_err = |source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    };
    let meta = std::fs::metadata(path).map_err(read_err)?;
    if meta.len() > MAX_CONFIG_FILE_BYTES {
        return Err(ConfigError::TooLarge {
            path: path.to_path_buf(),
            size: meta.len(),
            max: MAX_CONFIG_FILE_BYTES,
        });
    }
    let content = std::fs::read_to_string(path).map_err(read_err)?;
    parse_config(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}
