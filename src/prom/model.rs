use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::parser::ParseError;

/// Declared type of a metric family, taken from its `# TYPE` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
    Summary,
    Untyped,
}

impl MetricType {
    /// Only counters and gauges carry a resolvable scalar value.
    pub fn is_scalar(self) -> bool {
        matches!(self, MetricType::Counter | MetricType::Gauge)
    }
}

impl FromStr for MetricType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(Self::Counter),
            "gauge" => Ok(Self::Gauge),
            "histogram" => Ok(Self::Histogram),
            "summary" => Ok(Self::Summary),
            "untyped" => Ok(Self::Untyped),
            _ => Err(ParseError::UnknownMetricType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Label {
        Label {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One measured instance within a family.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: Vec<Label>,
    pub value: f64,
    /// Milliseconds since the Unix epoch, when the exposition carried one.
    pub timestamp: Option<i64>,
}

impl Sample {
    pub fn new(labels: Vec<Label>, value: f64) -> Sample {
        Sample {
            labels,
            value,
            timestamp: None,
        }
    }

    pub fn get_label(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|label| label.name == name)
            .map(|label| label.value.as_str())
    }

    /// The scalar value of this sample when read as part of a family of the
    /// given type.
    pub fn value_for(&self, metric_type: MetricType) -> Option<f64> {
        if metric_type.is_scalar() {
            Some(self.value)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub metric_type: MetricType,
    pub help: Option<String>,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn new(name: impl Into<String>, metric_type: MetricType, samples: Vec<Sample>) -> Self {
        MetricFamily {
            name: name.into(),
            metric_type,
            help: None,
            samples,
        }
    }
}

/// All metric families captured by one read of an endpoint or file.
///
/// A snapshot has no mutation API: it is assembled once by the loader (or via
/// [`FromIterator`]) and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    families: HashMap<String, MetricFamily>,
}

impl Snapshot {
    pub fn get(&self, family: &str) -> Option<&MetricFamily> {
        self.families.get(family)
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

impl From<HashMap<String, MetricFamily>> for Snapshot {
    fn from(families: HashMap<String, MetricFamily>) -> Self {
        Snapshot { families }
    }
}

impl FromIterator<MetricFamily> for Snapshot {
    fn from_iter<I: IntoIterator<Item = MetricFamily>>(iter: I) -> Self {
        let families = iter
            .into_iter()
            .map(|family| (family.name.clone(), family))
            .collect();
        Snapshot { families }
    }
}

/// Label constraints a sample must satisfy to be read.
///
/// Every pair must be present on the sample with the exact same name and
/// value. The empty spec matches any sample.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMatchSpec {
    pairs: Vec<Label>,
}

impl LabelMatchSpec {
    pub fn any() -> Self {
        LabelMatchSpec::default()
    }

    pub fn new(pairs: Vec<Label>) -> Self {
        LabelMatchSpec { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[Label] {
        &self.pairs
    }

    pub fn matches(&self, sample: &Sample) -> bool {
        self.pairs
            .iter()
            .all(|wanted| sample.labels.iter().any(|label| label == wanted))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelMatchSpec {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        LabelMatchSpec {
            pairs: iter
                .into_iter()
                .map(|(name, value)| Label::new(name, value))
                .collect(),
        }
    }
}

impl fmt::Display for LabelMatchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pairs.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (i, label) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            let escaped = label
                .value
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('\n', "\\n");
            write!(f, "{}=\"{}\"", label.name, escaped)?;
        }
        f.write_str("}")
    }
}

/// Maps a family and label selection to a named output slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyToKey {
    pub family: String,
    pub labels: LabelMatchSpec,
    pub key: String,
}

impl FamilyToKey {
    pub fn new(family: impl Into<String>, labels: LabelMatchSpec, key: impl Into<String>) -> Self {
        FamilyToKey {
            family: family.into(),
            labels,
            key: key.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spec_matches_anything() {
        let spec = LabelMatchSpec::any();
        assert!(spec.matches(&Sample::new(vec![], 1.0)));
        assert!(spec.matches(&Sample::new(vec![Label::new("a", "b")], 1.0)));
    }

    #[test]
    fn spec_requires_every_pair() {
        let sample = Sample::new(
            vec![Label::new("job", "validator"), Label::new("instance", "1")],
            1.0,
        );
        let partial: LabelMatchSpec = [("job", "validator")].into_iter().collect();
        let full: LabelMatchSpec = [("instance", "1"), ("job", "validator")]
            .into_iter()
            .collect();
        let extra: LabelMatchSpec = [("job", "validator"), ("zone", "a")]
            .into_iter()
            .collect();

        assert!(partial.matches(&sample));
        assert!(full.matches(&sample));
        assert!(!extra.matches(&sample));
    }

    #[test]
    fn matching_is_exact() {
        let sample = Sample::new(vec![Label::new("Job", "X")], 1.0);
        let lower: LabelMatchSpec = [("job", "X")].into_iter().collect();
        let value_case: LabelMatchSpec = [("Job", "x")].into_iter().collect();
        assert!(!lower.matches(&sample));
        assert!(!value_case.matches(&sample));
    }

    #[test]
    fn only_counters_and_gauges_have_values() {
        let sample = Sample::new(vec![], 4.0);
        assert_eq!(sample.value_for(MetricType::Counter), Some(4.0));
        assert_eq!(sample.value_for(MetricType::Gauge), Some(4.0));
        assert_eq!(sample.value_for(MetricType::Histogram), None);
        assert_eq!(sample.value_for(MetricType::Summary), None);
        assert_eq!(sample.value_for(MetricType::Untyped), None);
    }

    #[test]
    fn spec_display_escapes_values() {
        let spec: LabelMatchSpec = [("path", "a\"b"), ("job", "x")].into_iter().collect();
        assert_eq!(spec.to_string(), r#"{path="a\"b",job="x"}"#);
        assert_eq!(LabelMatchSpec::any().to_string(), "");
    }
}
