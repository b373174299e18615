mod pattern_matcher;

pub use pattern_matcher::{GlobMatcher, PatternError, PatternMatcher};
