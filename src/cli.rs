// Command-line interface argument parsing.

use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

/// Retail profitability dashboard
///
/// Loads a transaction export (superstore.csv by default), computes sales
/// and profit aggregates and writes chart descriptions plus an HTML page
/// that renders them.
///
/// Examples:
///   retail_dashboard
///   retail_dashboard --input data/superstore.csv --output-dir out
///   retail_dashboard --encoding utf-8 --top-n 5 --no-html
///   retail_dashboard --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Transactions CSV file
    #[arg(short, long, value_name = "FILE", env = "DASHBOARD_INPUT")]
    pub input: Option<PathBuf>,

    /// Character encoding of the input (ISO-8859-1, utf-8)
    #[arg(short, long, value_name = "NAME")]
    pub encoding: Option<String>,

    /// Directory for the generated CSV, JSON and HTML files
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for dashboard.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of products in each ranking
    #[arg(long, value_name = "COUNT")]
    pub top_n: Option<usize>,

    /// Rows shown per table in the console preview
    #[arg(long, value_name = "COUNT")]
    pub preview_rows: Option<usize>,

    /// Skip writing dashboard.html
    #[arg(long)]
    pub no_html: bool,

    /// Enable verbose logging output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Write a default dashboard.toml and exit
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_leaves_everything_to_config() {
        let args = Args::parse_from(["retail_dashboard"]);
        assert!(args.encoding.is_none());
        assert!(args.top_n.is_none());
        assert!(!args.no_html);
        assert_eq!(args.log_level(), Level::INFO);
    }

    #[test]
    fn verbosity_flags_pick_the_level() {
        assert_eq!(Args::parse_from(["x", "-v"]).log_level(), Level::DEBUG);
        assert_eq!(Args::parse_from(["x", "-q"]).log_level(), Level::WARN);
        assert!(Args::try_parse_from(["x", "-v", "-q"]).is_err());
    }

    #[test]
    fn top_n_must_be_a_number() {
        assert!(Args::try_parse_from(["x", "--top-n", "ten"]).is_err());
    }
}
