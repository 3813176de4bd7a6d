use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::loader::{Error, Loader};
use super::model::{FamilyToKey, LabelMatchSpec, Snapshot};
use super::reporter::{LogReporter, Reporter};

/// Read-only view resolving scalar values out of a [`Snapshot`].
#[derive(Debug, Clone)]
pub struct Extractor {
    snapshot: Snapshot,
    reporter: Arc<dyn Reporter>,
}

impl Extractor {
    pub fn new(snapshot: Snapshot) -> Self {
        Extractor::with_reporter(snapshot, Arc::new(LogReporter))
    }

    pub fn with_reporter(snapshot: Snapshot, reporter: Arc<dyn Reporter>) -> Self {
        Extractor { snapshot, reporter }
    }

    /// Scrape `url` with a default [`Loader`].
    pub fn from_url(url: &str) -> Result<Self, Error> {
        Loader::default().fetch(url)
    }

    /// Decode the exposition file at `path` with a default [`Loader`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        Loader::default().open(path)
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn resolve_float(&self, family: &str, labels: &LabelMatchSpec) -> Option<f64> {
        self.extract_float(family, labels)
    }

    /// Like [`Extractor::resolve_float`], truncated toward zero.
    ///
    /// Values outside the `i64` range saturate and `NaN` becomes 0.
    #[allow(clippy::cast_possible_truncation)]
    pub fn resolve_int64(&self, family: &str, labels: &LabelMatchSpec) -> Option<i64> {
        self.extract_float(family, labels).map(|v| v as i64)
    }

    /// Resolve `mapping` and store the value under `mapping.key`.
    ///
    /// `slots` is left untouched when there is no value.
    pub fn resolve_into(&self, mapping: &FamilyToKey, slots: &mut HashMap<String, f64>) {
        if let Some(v) = self.extract_float(&mapping.family, &mapping.labels) {
            slots.insert(mapping.key.clone(), v);
        }
    }

    /// Apply [`Extractor::resolve_into`] for every mapping.
    pub fn resolve_all(&self, mappings: &[FamilyToKey]) -> HashMap<String, f64> {
        let mut slots = HashMap::with_capacity(mappings.len());
        for mapping in mappings {
            self.resolve_into(mapping, &mut slots);
        }
        slots
    }

    pub fn float(&self, family: &str) -> Option<f64> {
        self.resolve_float(family, &LabelMatchSpec::any())
    }

    pub fn int64(&self, family: &str) -> Option<i64> {
        self.resolve_int64(family, &LabelMatchSpec::any())
    }

    // Every sample of the family has to satisfy `labels`. A single mismatch
    // voids the family even if earlier samples matched; otherwise the last
    // sample's value wins.
    fn extract_float(&self, family: &str, labels: &LabelMatchSpec) -> Option<f64> {
        let Some(metric_family) = self.snapshot.get(family) else {
            self.reporter.family_missing(family);
            return None;
        };

        let mut value = None;
        for sample in &metric_family.samples {
            let v = sample.value_for(metric_family.metric_type);

            if !labels.matches(sample) {
                return None;
            }

            value = v;
        }

        value
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use super::*;
    use crate::prom::model::{Label, MetricFamily, MetricType, Sample};
    use crate::prom::parser::Parser;
    use crate::prom::reporter::testing::RecordingReporter;
    use crate::prom::reporter::NullReporter;
    use crate::prom::test_data;

    fn extractor(text: &str) -> Extractor {
        Extractor::new(Parser::new().parse_text(text).unwrap())
    }

    fn spec(pairs: &[(&str, &str)]) -> LabelMatchSpec {
        pairs.iter().copied().collect()
    }

    #[test]
    fn single_gauge_matches_its_label() {
        let e = extractor(test_data::GAUGE_ONE_LABEL);
        assert_eq!(e.resolve_float("foo", &spec(&[("job", "x")])), Some(3.5));
        assert_eq!(e.resolve_float("foo", &spec(&[("job", "y")])), None);
    }

    #[test]
    fn empty_spec_takes_last_sample() {
        let e = extractor(test_data::COUNTER_TWO_INSTANCES);
        assert_eq!(e.resolve_float("bar", &LabelMatchSpec::any()), Some(20.0));
        assert_eq!(e.float("bar"), Some(20.0));
    }

    #[test]
    fn one_mismatch_voids_family() {
        let e = extractor(test_data::COUNTER_TWO_INSTANCES);
        assert_eq!(e.resolve_float("bar", &spec(&[("inst", "1")])), None);
        assert_eq!(e.resolve_float("bar", &spec(&[("inst", "2")])), None);
    }

    #[test]
    fn shared_labels_match_every_sample() {
        let e = extractor(
            r#"
# TYPE peers gauge
peers{state="connected",node="a"} 4
peers{state="connected",node="b"} 7
"#,
        );
        assert_eq!(
            e.resolve_float("peers", &spec(&[("state", "connected")])),
            Some(7.0)
        );
    }

    #[test]
    fn samples_with_different_label_sets() {
        let e = extractor(
            r#"
# TYPE mixed gauge
mixed{a="1"} 1
mixed{a="1",b="2"} 2
mixed 3
"#,
        );
        assert_eq!(e.float("mixed"), Some(3.0));
        assert_eq!(e.resolve_float("mixed", &spec(&[("a", "1")])), None);
    }

    #[test]
    fn missing_family_has_no_value() {
        let e = extractor(test_data::VALIDATOR);
        assert_eq!(e.float("not_there"), None);
        assert_eq!(e.resolve_float("not_there", &spec(&[("a", "b")])), None);
        assert_eq!(e.int64("not_there"), None);
    }

    #[test]
    fn non_scalar_families_have_no_value() {
        let e = extractor(test_data::HISTOGRAM);
        assert_eq!(e.float("request_duration_seconds"), None);
        assert_eq!(e.float("rpc_latency"), None);

        let e = extractor(test_data::VALIDATOR);
        assert_eq!(e.float("beacon_head_slot"), None);
    }

    #[test]
    fn int64_truncates_toward_zero() {
        let snapshot: Snapshot = [
            MetricFamily::new("pos", MetricType::Gauge, vec![Sample::new(vec![], 2.9)]),
            MetricFamily::new("neg", MetricType::Gauge, vec![Sample::new(vec![], -2.9)]),
            MetricFamily::new("big", MetricType::Gauge, vec![Sample::new(vec![], 1e300)]),
        ]
        .into_iter()
        .collect();
        let e = Extractor::new(snapshot);

        assert_eq!(e.int64("pos"), Some(2));
        assert_eq!(e.int64("neg"), Some(-2));
        assert_eq!(e.int64("big"), Some(i64::MAX));
    }

    #[test]
    fn validator_values() {
        let e = extractor(test_data::VALIDATOR);
        assert_eq!(e.int64("go_goroutines"), Some(87));
        assert_eq!(e.int64("process_resident_memory_bytes"), Some(281_391_104));
        assert_eq!(e.float("process_cpu_seconds_total"), Some(1842.37));
        assert_eq!(
            e.resolve_int64("validator_statuses", &spec(&[("pubkey", "0x8a1f")])),
            Some(3)
        );
        // two validators, one pubkey: the other sample voids the family
        assert_eq!(
            e.resolve_float("validator_balance", &spec(&[("pubkey", "0x8a1f")])),
            None
        );
    }

    #[test]
    fn resolve_into_only_writes_found_values() {
        let e = extractor(test_data::VALIDATOR);
        let mut slots = HashMap::new();
        slots.insert("untouched".to_string(), 1.0);

        e.resolve_into(
            &FamilyToKey::new("go_goroutines", LabelMatchSpec::any(), "goroutines"),
            &mut slots,
        );
        e.resolve_into(
            &FamilyToKey::new("nope", LabelMatchSpec::any(), "nope"),
            &mut slots,
        );
        e.resolve_into(
            &FamilyToKey::new("validator_balance", spec(&[("pubkey", "0x93c2")]), "balance"),
            &mut slots,
        );

        assert_eq!(slots.len(), 2);
        assert_eq!(slots.get("goroutines"), Some(&87.0));
        assert_eq!(slots.get("untouched"), Some(&1.0));
        assert!(!slots.contains_key("nope"));
        assert!(!slots.contains_key("balance"));
    }

    #[test]
    fn resolve_all_collects_found_slots() {
        let e = extractor(test_data::VALIDATOR);
        let slots = e.resolve_all(&[
            FamilyToKey::new("process_cpu_seconds_total", LabelMatchSpec::any(), "cpu"),
            FamilyToKey::new(
                "validator_statuses",
                spec(&[("pubkey", "0x8a1f")]),
                "status",
            ),
            FamilyToKey::new("missing", LabelMatchSpec::any(), "missing"),
        ]);

        assert_eq!(slots.len(), 2);
        assert_eq!(slots["cpu"], 1842.37);
        assert_eq!(slots["status"], 3.0);
    }

    #[test]
    fn missing_family_is_reported() {
        let reporter = Arc::new(RecordingReporter::default());
        let e = Extractor::with_reporter(
            Parser::new().parse_text(test_data::VALIDATOR).unwrap(),
            reporter.clone(),
        );

        assert_eq!(e.float("go_goroutines"), Some(87.0));
        assert_eq!(e.float("ghost"), None);
        assert_eq!(reporter.events(), vec!["missing ghost".to_string()]);
    }

    #[test]
    fn snapshot_is_exposed_read_only() {
        let e = Extractor::with_reporter(
            Parser::new()
                .parse_text(test_data::COUNTER_TWO_INSTANCES)
                .unwrap(),
            Arc::new(NullReporter),
        );

        assert_eq!(e.snapshot().len(), 1);
        let bar = e.snapshot().get("bar").unwrap();
        assert_eq!(bar.metric_type, MetricType::Counter);
        assert_eq!(bar.samples.len(), 2);
        assert_eq!(e.float("absent"), None);
    }

    #[test]
    fn extractor_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Extractor>();
    }

    fn family_strategy() -> impl Strategy<Value = (MetricType, Vec<(String, f64)>)> {
        (
            prop_oneof![Just(MetricType::Counter), Just(MetricType::Gauge)],
            prop::collection::vec(("[a-c]", -1e6f64..1e6f64), 1..8),
        )
    }

    fn build(metric_type: MetricType, samples: &[(String, f64)]) -> Extractor {
        let samples = samples
            .iter()
            .map(|(inst, v)| Sample::new(vec![Label::new("inst", inst.clone())], *v))
            .collect();
        Extractor::new(
            [MetricFamily::new("fam", metric_type, samples)]
                .into_iter()
                .collect(),
        )
    }

    proptest! {
        #[test]
        fn prop_empty_spec_is_last_sample((metric_type, samples) in family_strategy()) {
            let e = build(metric_type, &samples);
            prop_assert_eq!(e.float("fam"), samples.last().map(|(_, v)| *v));
        }

        #[test]
        fn prop_any_mismatch_voids(
            (metric_type, samples) in family_strategy(),
            wanted in "[a-c]",
        ) {
            let e = build(metric_type, &samples);
            let all_match = samples.iter().all(|(inst, _)| *inst == wanted);
            let expected = if all_match { samples.last().map(|(_, v)| *v) } else { None };
            prop_assert_eq!(e.resolve_float("fam", &spec(&[("inst", wanted.as_str())])), expected);
        }

        #[test]
        fn prop_int64_follows_float(
            (metric_type, samples) in family_strategy(),
            wanted in "[a-c]",
        ) {
            let e = build(metric_type, &samples);
            let labels = spec(&[("inst", wanted.as_str())]);
            prop_assert_eq!(
                e.resolve_int64("fam", &labels),
                e.resolve_float("fam", &labels).map(f64::trunc).map(|v| v as i64)
            );
        }
    }
}
