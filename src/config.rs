// Configuration file handling.
//
// Settings come from an optional `dashboard.toml`; command-line flags win
// over anything set there.

use crate::cli::Args;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

/// Where the transactions come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// Character encoding label, e.g. `ISO-8859-1` or `utf-8`.
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            encoding: default_encoding(),
        }
    }
}

fn default_path() -> PathBuf {
    PathBuf::from("superstore.csv")
}

fn default_encoding() -> String {
    "ISO-8859-1".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_title")]
    pub title: String,

    /// Length of the product rankings.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Write `dashboard.html` next to the JSON description.
    #[serde(default = "default_html")]
    pub html: bool,

    /// Rows shown per table in the console preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            top_n: default_top_n(),
            output_dir: default_output_dir(),
            html: default_html(),
            preview_rows: default_preview_rows(),
        }
    }
}

fn default_title() -> String {
    "GlobalMart Profitability Dashboard".to_string()
}

fn default_top_n() -> usize {
    10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dashboard_out")
}

fn default_html() -> bool {
    true
}

fn default_preview_rows() -> usize {
    5
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &content)
    }

    fn from_toml(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Explicit `--config` must exist; the default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(input) = &args.input {
            self.data.path = input.clone();
        }
        if let Some(encoding) = &args.encoding {
            self.data.encoding = encoding.clone();
        }
        if let Some(dir) = &args.output_dir {
            self.report.output_dir = dir.clone();
        }
        if let Some(n) = args.top_n {
            self.report.top_n = n;
        }
        if let Some(rows) = args.preview_rows {
            self.report.preview_rows = rows;
        }
        if args.no_html {
            self.report.html = false;
        }
    }

    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn defaults_match_original_dashboard() {
        let config = Config::default();
        assert_eq!(config.data.path, PathBuf::from("superstore.csv"));
        assert_eq!(config.data.encoding, "ISO-8859-1");
        assert_eq!(config.report.top_n, 10);
        assert_eq!(config.report.title, "GlobalMart Profitability Dashboard");
        assert!(config.report.html);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let config = Config::from_toml(
            Path::new("dashboard.toml"),
            "[report]\ntop_n = 5\nhtml = false\n",
        )
        .unwrap();
        assert_eq!(config.report.top_n, 5);
        assert!(!config.report.html);
        assert_eq!(config.report.preview_rows, 5);
        assert_eq!(config.data.encoding, "ISO-8859-1");
    }

    #[test]
    fn invalid_toml_names_the_file() {
        let err = Config::from_toml(Path::new("broken.toml"), "[report\n").unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn default_toml_round_trips() {
        let parsed = Config::from_toml(Path::new("x.toml"), &Config::default_toml()).unwrap();
        assert_eq!(parsed.report.output_dir, PathBuf::from("dashboard_out"));
        assert_eq!(parsed.data.path, PathBuf::from("superstore.csv"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load(Some(missing.as_path())),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn cli_flags_override_file_values() {
        let mut config = Config::default();
        let args = Args::parse_from([
            "retail_dashboard",
            "--input",
            "data/orders.csv",
            "--encoding",
            "utf-8",
            "--top-n",
            "3",
            "--no-html",
        ]);
        config.merge_with_args(&args);
        assert_eq!(config.data.path, PathBuf::from("data/orders.csv"));
        assert_eq!(config.data.encoding, "utf-8");
        assert_eq!(config.report.top_n, 3);
        assert!(!config.report.html);
        assert_eq!(config.report.output_dir, PathBuf::from("dashboard_out"));
    }
}
