/// Config file loading and creation for the btrate CLI.
///
/// Config lives at ~/.config/btrate/config.toml.
/// All fields are optional; CLI args override config values.
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Default, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BtrateConfig {
    pub winner_col: Option<String>,
    pub loser_col: Option<String>,
    pub prior_variance: Option<f64>,
    pub tolerance: Option<f64>,
    pub max_iterations: Option<usize>,
    pub confidence_level: Option<f64>,
}

const DEFAULT_CONFIG_TEMPLATE: &str = "\
# btrate configuration
# All values here can be overridden by CLI flags.

# CSV column holding the winner / loser of each match.
# With --no-header these may be zero-based column indices, e.g. \"0\".
# winner_col = \"winner\"
# loser_col = \"loser\"

# Variance of the N(0, tau^2) prior on every rating
# prior_variance = 100.0

# Convergence tolerance on the largest rating change (and log-posterior change)
# tolerance = 1e-6

# Solver iteration cap
# max_iterations = 100

# Credible interval coverage, strictly between 0 and 1
# confidence_level = 0.95
";

/// Returns the default config path: ~/.config/btrate/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("btrate").join("config.toml"))
}

/// Load config from a file path. Returns default (all None) if file doesn't exist.
pub fn load_config(path: &Path) -> Result<BtrateConfig> {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BtrateConfig::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read config at {}", path.display())),
    }
}

/// Create the default config file at `path`. Errors if it already exists.
pub fn create_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Config file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write config to {}", path.display()))
}
