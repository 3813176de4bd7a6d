use std::path::PathBuf;

use clap::Parser;
use clap::ValueHint;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Metrics to resolve
    ///
    /// Each selector is a family name, optionally followed by label constraints.
    /// Example: validator_balance{pubkey="0x8a1f"}
    #[arg(required = true, value_hint=ValueHint::Other)]
    pub selectors: Vec<String>,

    /// Metrics URL to read from
    ///
    /// Fetched once with a single GET; only a 200 response is accepted. Not used when --file is given.
    #[arg(short, long, env="PROM_ENDPOINT", value_hint=ValueHint::Url, default_value="http://localhost:8080/metrics")]
    pub endpoint: String,

    /// Override the port of --endpoint
    ///
    /// Replaces the port in the endpoint URL, e.g. 8081 turns http://localhost:8080/metrics into http://localhost:8081/metrics.
    #[arg(short, long, env="PROM_PORT", value_hint=ValueHint::Other)]
    pub port: Option<u16>,

    /// Exposition file to read instead of scraping
    ///
    /// A snapshot of an endpoint's output saved in the Prometheus text format.
    #[arg(short, long, env="PROM_FILE", value_hint=ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Print values truncated to integers
    #[arg(short, long)]
    pub truncate: bool,

    /// Set the logging level
    ///
    /// Set the logging level to use for diagnostics
    #[arg(short, long, env="LOG_LEVEL", value_hint=ValueHint::Other, default_value="INFO")]
    pub loglevel: log::LevelFilter,

    /// Write logs to this file instead of stderr
    #[arg(long, env="LOG_FILE", value_hint=ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["promextract", "up"]).unwrap();
        assert_eq!(cli.selectors, vec!["up".to_string()]);
        assert_eq!(cli.endpoint, "http://localhost:8080/metrics");
        assert_eq!(cli.loglevel, log::LevelFilter::Info);
        assert!(cli.file.is_none());
        assert!(!cli.truncate);
    }

    #[test]
    fn selectors_required() {
        assert!(Cli::try_parse_from(["promextract"]).is_err());
    }

    #[test]
    fn file_and_flags() {
        let cli = Cli::try_parse_from([
            "promextract",
            "-f",
            "metrics.prom",
            "-t",
            "-l",
            "debug",
            "go_goroutines",
            r#"validator_balance{pubkey="0x8a1f"}"#,
        ])
        .unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("metrics.prom")));
        assert!(cli.truncate);
        assert_eq!(cli.loglevel, log::LevelFilter::Debug);
        assert_eq!(cli.selectors.len(), 2);
    }
}
