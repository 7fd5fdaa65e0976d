//! Configuration loading
//!
//! Priority (highest to lowest):
//! 1. Environment variables prefixed `CALC_` (e.g. `CALC_PROMPT`)
//! 2. Config file: `--config <path>`, else `calc.toml` in the working directory
//! 3. Default values

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "CALC_";
const DEFAULT_CONFIG_FILE: &str = "calc.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CalcConfig {
    /// REPL prompt
    pub prompt: String,
    /// Persist history here when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_file: Option<PathBuf>,
    pub max_history: usize,
    /// Colored output
    pub color: bool,
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Print the welcome banner on REPL start
    pub banner: bool,
}

impl Default for CalcConfig {
    fn default() -> Self {
        Self {
            prompt: "> ".to_string(),
            history_file: None,
            max_history: 1000,
            color: true,
            log_level: "warn".to_string(),
            banner: true,
        }
    }
}

/// Load configuration from defaults, config file and environment
pub fn load(path: Option<&Path>) -> Result<CalcConfig> {
    load_with_prefix(path, ENV_PREFIX)
}

fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<CalcConfig> {
    let mut figment = Figment::from(Serialized::defaults(CalcConfig::default()));

    match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            figment = merge_file(figment, path)?;
        },
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                figment = merge_file(figment, default)?;
            }
        },
    }

    figment
        .merge(Env::prefixed(env_prefix))
        .extract()
        .context("Failed to load configuration")
}

/// Merge a config file, format chosen by extension
fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .context("Config file must have an extension")?;

    let figment = match extension {
        "toml" => figment.merge(Toml::file(path)),
        "yaml" | "yml" => figment.merge(Yaml::file(path)),
        "json" => figment.merge(Json::file(path)),
        _ => bail!("Unsupported config file format: {}", extension),
    };
    Ok(figment)
}
