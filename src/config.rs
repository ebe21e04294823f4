use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::storage::STORAGE_KEY;

pub const DEFAULT_CONFIG_PATH: &str = "./config/appsettings.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    #[serde(rename = "trace")]
    Trace,
    #[serde(rename = "debug")]
    Debug,
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "warn")]
    Warn,
    #[serde(rename = "error")]
    Error,
}

impl LogLevel {
    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    // directory holding <storage_key>.json
    pub storage_dir: PathBuf,
    pub storage_key: String,
    // where `export` writes when no directory is given
    pub export_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: LogLevel,
    // by KB, roll a log file once it grows past this size
    pub log_rotate_size_kb: u64,
    // rolled files kept per log
    pub log_rotate_count: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            storage_dir: PathBuf::from("./data"),
            storage_key: String::from(STORAGE_KEY),
            export_dir: PathBuf::from("."),
            log_dir: PathBuf::from("logs"),
            log_level: LogLevel::Info,
            log_rotate_size_kb: 10,
            log_rotate_count: 30,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    /// Loads `./config/appsettings.json`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn new() -> Self {
        Config::from_file(DEFAULT_CONFIG_PATH).unwrap_or_default()
    }

    pub fn from_file<P: AsRef<Path>>(filename: P) -> Result<Self, ConfigError> {
        let path = filename.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
