//! Category keyword filtering
//!
//! Companies are kept or dropped based on their free-text category labels.
//! The keyword lists live in the `[filter]` section of the configuration so
//! every consumer shares one source of truth.
//!
//! Verdict rules, in order:
//! 1. any category contains an exception keyword -> keep
//! 2. any category contains any exclusion keyword -> drop
//! 3. otherwise -> keep

use crate::config::FilterConfig;

/// Decides whether a company's categories pass the keyword rules
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    exclude_keywords: Vec<String>,
    exception_keywords: Vec<String>,
}

impl CategoryFilter {
    /// Builds a filter from the configured keyword lists
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            exclude_keywords: config.exclude_keywords.clone(),
            exception_keywords: config.exception_keywords.clone(),
        }
    }

    /// Returns true if a company with these categories should be kept
    ///
    /// Matching is substring containment against each category label.
    /// An exception keyword always wins over exclusion keywords.
    pub fn keeps(&self, categories: &[String]) -> bool {
        let has_exception = categories.iter().any(|cat| {
            self.exception_keywords
                .iter()
                .any(|kw| cat.contains(kw.as_str()))
        });

        if has_exception {
            return true;
        }

        let has_exclusion = categories.iter().any(|cat| {
            self.exclude_keywords
                .iter()
                .any(|kw| cat.contains(kw.as_str()))
        });

        !has_exclusion
    }
}
