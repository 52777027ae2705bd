// Error taxonomy for the pipeline.
//
// Load-time failures are fatal and always carry the offending file path so
// the operator can tell which input was rejected and why.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} is not valid {encoding} (byte offset {offset})", path.display())]
    Encoding {
        path: PathBuf,
        encoding: &'static str,
        offset: usize,
    },

    #[error("unsupported encoding {name:?} for {}", path.display())]
    UnsupportedEncoding { path: PathBuf, name: String },

    #[error("{} is missing required column(s): {}", path.display(), missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    #[error(
        "{}, line {line}, column {column:?}: cannot parse {value:?} ({reason})",
        path.display()
    )]
    Parse {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum AggregateError {
    #[error("profit margin is undefined when total sales is zero")]
    DivisionByZero,

    #[error("measure {0} is not part of this table")]
    UnknownMeasure(&'static str),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
