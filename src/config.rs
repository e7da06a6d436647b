use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Environment variable naming an alternative user config file.
pub const CONFIG_ENV_VAR: &str = "PIPESH_CONFIG";

/// Errors raised while reading a user configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("config parse error in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub expansion: ExpansionConfig,
    #[serde(default)]
    pub operators: OperatorConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct PromptConfig {
    #[serde(default)]
    pub primary: String,
    #[serde(default)]
    pub continuation: String,
    #[serde(default)]
    pub farewell: String,
}

/// Which word expansions run before tokenizing and parsing.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionConfig {
    #[serde(default)]
    pub tilde: bool,
    #[serde(default)]
    pub variables: bool,
    /// `false` is the equivalent of `set -f`.
    #[serde(default)]
    pub pathnames: bool,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            tilde: true,
            variables: true,
            pathnames: true,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy)]
pub struct OperatorConfig {
    /// Leave operator characters inside quotes alone when spacing.
    #[serde(default)]
    pub quote_aware: bool,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct StatusConfig {
    #[serde(default)]
    pub report: StatusReport,
}

/// When to print the pipeline's exit status after it finishes.
#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusReport {
    Never,
    #[default]
    Failure,
    Always,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub path: String,
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    prompt: PromptOverlay,
    #[serde(default)]
    expansion: ExpansionOverlay,
    #[serde(default)]
    operators: OperatorOverlay,
    #[serde(default)]
    status: StatusOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct PromptOverlay {
    primary: Option<String>,
    continuation: Option<String>,
    farewell: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ExpansionOverlay {
    tilde: Option<bool>,
    variables: Option<bool>,
    pathnames: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct OperatorOverlay {
    quote_aware: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct StatusOverlay {
    report: Option<StatusReport>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    level: Option<String>,
    path: Option<String>,
}

// ── Merge logic ──

fn merge_scalar<T>(base: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *base = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the user overlay from `$PIPESH_CONFIG` or
    ///    `~/.config/pipesh/config.toml` (if it exists)
    ///
    /// Scalars in the overlay override defaults; omitted keys are untouched.
    /// A malformed overlay is reported and ignored.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        let Some(path) = Self::overlay_path() else {
            return config;
        };
        if !path.exists() {
            return config;
        }
        match Self::read_overlay(&path) {
            Ok(overlay) => config.apply_overlay(overlay),
            Err(e) => eprintln!("pipesh: {e}"),
        }
        config
    }

    /// Load defaults merged with the overlay at `path`, failing on any error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default_config();
        config.apply_overlay(Self::read_overlay(path)?);
        Ok(config)
    }

    fn overlay_path() -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(explicit));
        }
        let home = std::env::var_os("HOME")?;
        Some(Path::new(&home).join(".config/pipesh/config.toml"))
    }

    fn read_overlay(path: &Path) -> Result<ConfigOverlay, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        let p = overlay.prompt;
        merge_scalar(&mut self.prompt.primary, p.primary);
        merge_scalar(&mut self.prompt.continuation, p.continuation);
        merge_scalar(&mut self.prompt.farewell, p.farewell);

        let e = overlay.expansion;
        merge_scalar(&mut self.expansion.tilde, e.tilde);
        merge_scalar(&mut self.expansion.variables, e.variables);
        merge_scalar(&mut self.expansion.pathnames, e.pathnames);

        merge_scalar(&mut self.operators.quote_aware, overlay.operators.quote_aware);
        merge_scalar(&mut self.status.report, overlay.status.report);

        let l = overlay.logging;
        merge_scalar(&mut self.logging.level, l.level);
        merge_scalar(&mut self.logging.path, l.path);
    }

    /// Render the merged configuration as TOML (for `--dump-config`).
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}
