//! TOML configuration for backup runs.
//!
//! Every field is optional in the file; missing sections fall back to the
//! shipped defaults. The default rule set includes everything, then excludes
//! bundled archives and the volatile directories a long-running server keeps
//! rewriting (logs, caches, downloaded libraries).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::{RuleAction, RuleSpec};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deflate level, 0-9; out-of-range values fall back to 9 with a warning
    pub compression_level: i32,
    /// Ordered rule list, last match wins
    pub rules: Vec<RuleSpec>,
    pub retention: RetentionConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Archives older than this are deleted by `prune` and after `watch` runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Seconds between periodic backups
    pub interval_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compression_level: 9,
            rules: default_rules(),
            retention: RetentionConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_seconds: Some(86_400),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 1_800,
        }
    }
}

fn default_rules() -> Vec<RuleSpec> {
    vec![
        RuleSpec::new(".*", RuleAction::Include),
        RuleSpec::new(r".*\.jar", RuleAction::Exclude),
        RuleSpec::new(r".*\.zip", RuleAction::Exclude),
        RuleSpec::new(r"logs(/.*)?", RuleAction::Exclude),
        RuleSpec::new(r"cache(/.*)?", RuleAction::Exclude),
        RuleSpec::new(r"versions?(/.*)?", RuleAction::Exclude),
        RuleSpec::new(r"libraries(/.*)?", RuleAction::Exclude),
    ]
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
