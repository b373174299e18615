//! Conversion of user supplied paths into library keys.

mod normalized_path;

pub use normalized_path::{NormalizeError, NormalizedPath, lexical_absolute};
