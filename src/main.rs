use crate::logging::app_config;
use anyhow::Context;
use clap::Parser;
use cli::Cli;
use promextract::prom::{parse_selector, Extractor, FamilyToKey};
use regex::Regex;

mod cli;
mod logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // initialize the logger
    log4rs::init_config(app_config(cli.log_file.as_deref(), cli.loglevel)?)?;

    let mappings = cli
        .selectors
        .iter()
        .map(String::as_str)
        .map(to_mapping)
        .collect::<anyhow::Result<Vec<_>>>()?;

    let extractor = match &cli.file {
        Some(path) => {
            log::info!("Reading metrics from file: {}", path.display());
            Extractor::from_file(path)
                .with_context(|| format!("unable to load metrics from {}", path.display()))?
        }
        None => {
            let endpoint = with_port(&cli.endpoint, cli.port)?;
            log::info!("Reading metrics from endpoint: {}", endpoint);
            Extractor::from_url(&endpoint)
                .with_context(|| format!("unable to load metrics from {endpoint}"))?
        }
    };

    for line in render(&extractor, &mappings, cli.truncate) {
        println!("{line}");
    }
    Ok(())
}

fn to_mapping(selector: &str) -> anyhow::Result<FamilyToKey> {
    let (family, labels) =
        parse_selector(selector).with_context(|| format!("invalid selector {selector}"))?;
    Ok(FamilyToKey::new(family, labels, selector.trim()))
}

fn with_port(endpoint: &str, port: Option<u16>) -> anyhow::Result<String> {
    let Some(port) = port else {
        return Ok(endpoint.to_string());
    };
    let regex = Regex::new(":(\\d{2,5})/")?;
    Ok(regex
        .replace(endpoint, format!(":{port}/", port = port))
        .to_string())
}

/// One `<selector> <value>` line per mapping, `-` marking absent values.
fn render(extractor: &Extractor, mappings: &[FamilyToKey], truncate: bool) -> Vec<String> {
    if truncate {
        return mappings
            .iter()
            .map(|m| {
                let value = extractor
                    .resolve_int64(&m.family, &m.labels)
                    .map_or_else(|| "-".to_string(), |v| v.to_string());
                format!("{} {}", m.key, value)
            })
            .collect();
    }

    let slots = extractor.resolve_all(mappings);
    mappings
        .iter()
        .map(|m| match slots.get(&m.key) {
            Some(v) => format!("{} {}", m.key, v),
            None => format!("{} -", m.key),
        })
        .collect()
}
