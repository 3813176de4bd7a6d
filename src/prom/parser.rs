//! Decoder for the Prometheus text exposition format.
//!
//! <https://github.com/prometheus/docs/blob/main/content/docs/instrumenting/exposition_formats.md>
//!
//! Lines are folded into [`MetricFamily`] values keyed by name. The first
//! malformed line aborts decoding; callers get the line number with the cause.

use std::collections::{HashMap, HashSet};

use super::model::{Label, LabelMatchSpec, MetricFamily, MetricType, Sample, Snapshot};

/// Errors that can occur while parsing a single line of exposition text
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown metric type: {0}")]
    UnknownMetricType(String),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
    #[error("missing value")]
    MissingValue,
    #[error("missing metric name")]
    MissingName,
    #[error("invalid metric name: {0}")]
    InvalidName(String),
    #[error("invalid label: {0}")]
    InvalidLabel(String),
    #[error("duplicate label name: {0}")]
    DuplicateLabel(String),
    #[error("second TYPE line for metric {0}, or TYPE reported after samples")]
    DuplicateType(String),
    #[error("second HELP line for metric {0}")]
    DuplicateHelp(String),
}

/// A [`ParseError`] tagged with the 1-based line it occurred on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("malformed exposition text at line {line}")]
pub struct LineError {
    pub line: usize,
    #[source]
    pub source: ParseError,
}

#[derive(Debug, Default)]
pub struct Parser {
    families: HashMap<String, MetricFamily>,
    typed: HashSet<String>,
    /// Sample names of histogram and summary series mapped to their family.
    aliases: HashMap<String, String>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a complete exposition document into a [`Snapshot`].
    ///
    /// Families that only had HELP or TYPE lines and no samples are dropped.
    pub fn parse_text(mut self, text: &str) -> Result<Snapshot, LineError> {
        for (index, line) in text.lines().enumerate() {
            self.parse_line(line).map_err(|source| LineError {
                line: index + 1,
                source,
            })?;
        }

        self.families.retain(|_, family| !family.samples.is_empty());
        Ok(Snapshot::from(self.families))
    }

    fn parse_line(&mut self, line: &str) -> Result<(), ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        if let Some(comment) = line.strip_prefix('#') {
            return self.parse_comment(comment.trim_start());
        }

        let (name, sample) = parse_sample_line(line)?;
        let family_name = match self.aliases.get(&name) {
            Some(base) if !self.typed.contains(&name) => base.clone(),
            _ => name,
        };
        self.family_mut(&family_name).samples.push(sample);
        Ok(())
    }

    fn parse_comment(&mut self, comment: &str) -> Result<(), ParseError> {
        let Some((keyword, rest)) = comment.split_once(char::is_whitespace) else {
            return Ok(());
        };

        match keyword {
            "TYPE" => self.parse_type(rest),
            "HELP" => self.parse_help(rest),
            _ => Ok(()),
        }
    }

    fn parse_type(&mut self, rest: &str) -> Result<(), ParseError> {
        let mut parts = rest.split_whitespace();
        let name = parts.next().ok_or_else(|| {
            ParseError::InvalidFormat("missing metric name in TYPE line".to_string())
        })?;
        let metric_type: MetricType = parts
            .next()
            .ok_or_else(|| {
                ParseError::InvalidFormat("missing metric type in TYPE line".to_string())
            })?
            .parse()?;
        validate_metric_name(name)?;

        let seen_samples = self
            .families
            .get(name)
            .is_some_and(|family| !family.samples.is_empty());
        if seen_samples || !self.typed.insert(name.to_string()) {
            return Err(ParseError::DuplicateType(name.to_string()));
        }

        let suffixes: &[&str] = match metric_type {
            MetricType::Histogram => &["_bucket", "_sum", "_count"],
            MetricType::Summary => &["_sum", "_count"],
            _ => &[],
        };
        for suffix in suffixes {
            self.aliases.insert(format!("{name}{suffix}"), name.to_string());
        }

        self.family_mut(name).metric_type = metric_type;
        Ok(())
    }

    fn parse_help(&mut self, rest: &str) -> Result<(), ParseError> {
        let rest = rest.trim_start();
        let (name, text) = rest
            .split_once(char::is_whitespace)
            .unwrap_or((rest, ""));
        if name.is_empty() {
            return Err(ParseError::InvalidFormat(
                "missing metric name in HELP line".to_string(),
            ));
        }
        validate_metric_name(name)?;

        let family = self.family_mut(name);
        if family.help.is_some() {
            return Err(ParseError::DuplicateHelp(name.to_string()));
        }
        family.help = Some(unescape_help(text.trim())?);
        Ok(())
    }

    fn family_mut(&mut self, name: &str) -> &mut MetricFamily {
        self.families
            .entry(name.to_string())
            .or_insert_with(|| MetricFamily::new(name, MetricType::Untyped, Vec::new()))
    }
}

/// Parse a `family{name="value",...}` selector into a family name and label
/// constraints. The label block is optional.
pub fn parse_selector(input: &str) -> Result<(String, LabelMatchSpec), ParseError> {
    let (name, labels, rest) = parse_name_and_labels(input.trim())?;
    if !rest.trim().is_empty() {
        return Err(ParseError::InvalidFormat(format!(
            "unexpected input after selector: {}",
            rest.trim()
        )));
    }
    Ok((name, LabelMatchSpec::new(labels)))
}

fn parse_sample_line(line: &str) -> Result<(String, Sample), ParseError> {
    let (name, labels, rest) = parse_name_and_labels(line)?;
    let (value, timestamp) = parse_value_and_timestamp(rest)?;
    Ok((
        name,
        Sample {
            labels,
            value,
            timestamp,
        },
    ))
}

/// Splits `name{labels}` off the front of `input`, returning the remainder.
fn parse_name_and_labels(input: &str) -> Result<(String, Vec<Label>, &str), ParseError> {
    let input = input.trim_start();
    let name_end = input
        .find(|c: char| c == '{' || c.is_whitespace())
        .unwrap_or(input.len());
    let name = &input[..name_end];
    if name.is_empty() {
        return Err(ParseError::MissingName);
    }
    validate_metric_name(name)?;

    let rest = input[name_end..].trim_start();
    match rest.strip_prefix('{') {
        Some(block) => {
            let (labels, rest) = parse_labels(block)?;
            Ok((name.to_string(), labels, rest))
        }
        None => Ok((name.to_string(), Vec::new(), rest)),
    }
}

fn parse_labels(block: &str) -> Result<(Vec<Label>, &str), ParseError> {
    let mut labels: Vec<Label> = Vec::new();
    let mut rest = block;

    loop {
        rest = rest.trim_start();
        if let Some(after) = rest.strip_prefix('}') {
            return Ok((labels, after));
        }

        let (name, after_name) = rest
            .split_once('=')
            .ok_or_else(|| ParseError::InvalidLabel(format!("label missing '=': {rest}")))?;
        let name = name.trim();
        validate_label_name(name)?;
        if labels.iter().any(|label| label.name == name) {
            return Err(ParseError::DuplicateLabel(name.to_string()));
        }

        let (value, after_value) = parse_label_value(after_name.trim_start())?;
        labels.push(Label::new(name, value));

        rest = after_value.trim_start();
        if let Some(after) = rest.strip_prefix(',') {
            rest = after;
        } else if !rest.starts_with('}') {
            return Err(ParseError::InvalidLabel(
                "expected ',' or '}' after label value".to_string(),
            ));
        }
    }
}

fn validate_metric_name(name: &str) -> Result<(), ParseError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_' || first == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
    if valid {
        Ok(())
    } else {
        Err(ParseError::InvalidName(name.to_string()))
    }
}

/// Carries the metric name inside label sets; never valid in the exposition.
const METRIC_NAME_LABEL: &str = "__name__";

fn validate_label_name(name: &str) -> Result<(), ParseError> {
    if name.is_empty() {
        return Err(ParseError::InvalidLabel("empty label name".to_string()));
    }
    if name == METRIC_NAME_LABEL {
        return Err(ParseError::InvalidLabel(format!(
            "label name {METRIC_NAME_LABEL} is reserved"
        )));
    }

    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ParseError::InvalidLabel(format!("invalid label name: {name}")))
    }
}

/// Reads a quoted label value from the front of `input`, returning the
/// unescaped value and whatever follows the closing quote.
fn parse_label_value(input: &str) -> Result<(String, &str), ParseError> {
    let inner = input
        .strip_prefix('"')
        .ok_or_else(|| ParseError::InvalidLabel("label value must be quoted".to_string()))?;

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.char_indices();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '"' => return Ok((value, &inner[idx + 1..])),
            '\\' => match chars.next() {
                Some((_, '\\')) => value.push('\\'),
                Some((_, '"')) => value.push('"'),
                Some((_, 'n')) => value.push('\n'),
                Some((_, c)) => {
                    return Err(ParseError::InvalidLabel(format!(
                        "invalid escape sequence: \\{c}"
                    )));
                }
                None => {
                    return Err(ParseError::InvalidLabel(
                        "backslash at end of label value".to_string(),
                    ));
                }
            },
            c => value.push(c),
        }
    }

    Err(ParseError::InvalidLabel(
        "unterminated label value".to_string(),
    ))
}

fn parse_value_and_timestamp(input: &str) -> Result<(f64, Option<i64>), ParseError> {
    let mut parts = input.split_whitespace();

    let value_part = parts.next().ok_or(ParseError::MissingValue)?;
    let value = match value_part {
        "NaN" => f64::NAN,
        "+Inf" => f64::INFINITY,
        "-Inf" => f64::NEG_INFINITY,
        _ => value_part
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidValue(value_part.to_string()))?,
    };

    let timestamp = match parts.next() {
        Some(ts) => Some(
            ts.parse::<i64>()
                .map_err(|_| ParseError::InvalidFormat(format!("invalid timestamp: {ts}")))?,
        ),
        None => None,
    };

    if let Some(extra) = parts.next() {
        return Err(ParseError::InvalidFormat(format!(
            "unexpected token after timestamp: {extra}"
        )));
    }

    Ok((value, timestamp))
}

/// HELP text only knows the `\\` and `\n` escapes.
fn unescape_help(text: &str) -> Result<String, ParseError> {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                return Err(ParseError::InvalidFormat(format!(
                    "invalid escape sequence in HELP text: \\{other}"
                )));
            }
            None => {
                return Err(ParseError::InvalidFormat(
                    "backslash at end of HELP text".to_string(),
                ));
            }
        }
    }
    Ok(result)
}
