//! Resolve scalar values out of Prometheus text expositions.
//!
//! An [`Extractor`](prom::Extractor) is built from an HTTP endpoint, a file or
//! any reader, and answers "the value of family F whose samples carry labels
//! L" without ever treating absence as an error.

pub mod prom;
