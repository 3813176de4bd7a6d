use std::path::Path;

use anyhow::Context;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::append::Append;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}";

/// Build the log4rs configuration for the application.
///
/// Logs go to `log_file` when given, otherwise to stderr so stdout only
/// carries resolved values.
pub fn app_config(log_file: Option<&Path>, level: LevelFilter) -> anyhow::Result<Config> {
    let appender: Box<dyn Append> = match log_file {
        Some(path) => Box::new(
            FileAppender::builder()
                .encoder(Box::new(PatternEncoder::new(PATTERN)))
                .build(path)
                .with_context(|| format!("unable to open log file {}", path.display()))?,
        ),
        None => Box::new(
            ConsoleAppender::builder()
                .target(Target::Stderr)
                .encoder(Box::new(PatternEncoder::new(PATTERN)))
                .build(),
        ),
    };

    let config = Config::builder()
        .appender(Appender::builder().build("main", appender))
        .build(Root::builder().appender("main").build(level))
        .map_err(|e| anyhow::anyhow!("invalid logging configuration: {e}"))?;
    Ok(config)
}
