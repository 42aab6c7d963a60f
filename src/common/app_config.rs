// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

static CONFIG: OnceLock<BasaltConfig> = OnceLock::new();

fn default_log_level() -> String {
    "info".to_string()
}

fn default_refresh_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize)]
pub struct BasaltConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub models: ModelsConfig,
}

#[derive(Debug, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ModelsConfig {
    /// Refresh period for the background reload thread. Zero disables the
    /// thread entirely.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// When true, a failed initial load aborts startup instead of logging.
    #[serde(default)]
    pub throw_on_load_error: bool,
    #[serde(default)]
    pub entries: Vec<ModelEntry>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            refresh_secs: default_refresh_secs(),
            throw_on_load_error: false,
            entries: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ModelEntry {
    pub name: String,
    pub path: String,
}

pub fn init_from_path(path: impl AsRef<Path>) -> Result<&'static BasaltConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let cfg = load_from_file(path.as_ref())?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn init_from_env_or_default() -> Result<&'static BasaltConfig> {
    if let Some(cfg) = CONFIG.get() {
        return Ok(cfg);
    }
    let path = config_path_from_env_or_default()?;
    let cfg = load_from_file(&path)?;
    let _ = CONFIG.set(cfg);
    Ok(CONFIG.get().expect("CONFIG set"))
}

pub fn config() -> Result<&'static BasaltConfig> {
    init_from_env_or_default()
}

fn config_path_from_env_or_default() -> Result<PathBuf> {
    if let Ok(p) = std::env::var("BASALT_CONFIG") {
        if !p.trim().is_empty() {
            return Ok(PathBuf::from(p));
        }
    }

    let candidate = PathBuf::from("basalt.toml");
    if candidate.is_file() {
        return Ok(candidate);
    }
    Err(anyhow!(
        "config file not found: set BASALT_CONFIG or place basalt.toml in the working directory"
    ))
}

pub fn load_from_file(path: &Path) -> Result<BasaltConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parse config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_full_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[log]
level = "debug"

[models]
refresh_secs = 5
throw_on_load_error = true

[[models.entries]]
name = "scorer"
path = "/models/scorer.bin"
"#
        )
        .unwrap();

        let cfg = load_from_file(file.path()).unwrap();
        assert_eq!(cfg.log.level, "debug");
        assert_eq!(cfg.models.refresh_secs, 5);
        assert!(cfg.models.throw_on_load_error);
        assert_eq!(cfg.models.entries.len(), 1);
        assert_eq!(cfg.models.entries[0].name, "scorer");
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "").unwrap();
        let cfg = load_from_file(file.path()).unwrap();
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.models.refresh_secs, 300);
        assert!(!cfg.models.throw_on_load_error);
        assert!(cfg.models.entries.is_empty());
    }
}
