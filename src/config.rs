use crate::engine::MatchingConfig;
use eyre::{Result, WrapErr, eyre};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Database,
    File,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    #[default]
    Database,
    Csv,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub url: Option<String>,
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub kind: HistoryKind,
    pub path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub matching: MatchingConfig,
    pub history: HistoryConfig,
}

impl Config {
    pub fn load(file_name: &Path) -> Result<Config> {
        let content = fs::read_to_string(file_name).wrap_err("cannot load configuration file")?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Config> {
        toml::from_str(content).wrap_err("cannot parse configuration file")
    }

    /// Database url from `source.url`, falling back to `DATABASE_URL`.
    pub fn database_url(&self) -> Result<String> {
        self.source
            .url
            .clone()
            .or_else(|| env::var("DATABASE_URL").ok())
            .ok_or_else(|| eyre!("no database url in source.url or DATABASE_URL"))
    }

    pub fn dataset_path(&self) -> Result<&Path> {
        self.source
            .path
            .as_deref()
            .ok_or_else(|| eyre!("source.path is required for a file source"))
    }

    pub fn history_path(&self) -> Result<&Path> {
        self.history
            .path
            .as_deref()
            .ok_or_else(|| eyre!("history.path is required for a csv history"))
    }
}
