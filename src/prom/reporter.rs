use std::fmt::Debug;

use super::loader::Error;

/// Receives the notable events of loading and resolution.
///
/// Extractors and loaders hold one of these instead of writing to a global
/// logger, so embedders can route events wherever they like.
pub trait Reporter: Debug + Send + Sync {
    /// A resolution asked for a family the snapshot does not contain.
    fn family_missing(&self, _family: &str) {}

    /// Loading from `source` (a URL or a path) failed.
    fn load_failed(&self, _source: &str, _error: &Error) {}
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn family_missing(&self, family: &str) {
        log::trace!("could not find metric family {family}");
    }

    fn load_failed(&self, source: &str, error: &Error) {
        log::error!("loading metrics from {source} failed: {error}");
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {}
