//! Cacheability of request paths.

use crate::config::schema::DEFAULT_BYPASS_PREFIXES;

/// Case-sensitive prefix matcher for paths that are never cached.
#[derive(Debug, Clone)]
pub struct PathClassifier {
    prefixes: Vec<String>,
}

impl PathClassifier {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_non_cacheable(&self, path: &str) -> bool {
        self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }
}

impl Default for PathClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_BYPASS_PREFIXES.iter().copied())
    }
}
