//! Small string parsers used by the extraction pipeline

pub mod duration;
pub mod version_tag;

pub use duration::{time_str_to_minutes, MalformedDurationError};
pub use version_tag::{normalize_version_label, validate_version_tag};
