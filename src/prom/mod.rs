mod model;
pub use self::model::FamilyToKey;
pub use self::model::Label;
pub use self::model::LabelMatchSpec;
pub use self::model::MetricFamily;
pub use self::model::MetricType;
pub use self::model::Sample;
pub use self::model::Snapshot;
pub(crate) mod parser;
pub use self::parser::parse_selector;
pub use self::parser::LineError;
pub use self::parser::ParseError;
pub use self::parser::Parser;

mod extractor;
pub use self::extractor::Extractor;

mod loader;
pub use self::loader::Error;
pub use self::loader::Loader;

mod reporter;
pub use self::reporter::LogReporter;
pub use self::reporter::NullReporter;
pub use self::reporter::Reporter;

mod test_data;
