//! Keyword-rule document classifier.
//!
//! Classification is a two-level first-match: categories are tried in the
//! caller-supplied order, and within a category its patterns are tried in
//! registration order. The first pattern that matches anywhere in the
//! lowercased text decides the category. There is no scoring or ranking.

use regex::Regex;
use thiserror::Error;

/// The ten predefined category labels. Each doubles as the destination
/// subdirectory name, so every label must be a legal path segment.
pub const PREDEFINED_CATEGORIES: [&str; 10] = [
    "Theses & Dissertations",
    "Coursework & Term Papers",
    "Certificates & Diplomas",
    "Tests & Quizzes",
    "Answer Keys & Solutions",
    "Presentations",
    "Formal Documents & Correspondence",
    "Books & Textbooks",
    "Learning Materials & Study Guides",
    "Reports",
];

#[derive(Debug, Error)]
pub enum CategorizeError {
    #[error("invalid keyword pattern {pattern:?} for category {category:?}: {reason}")]
    InvalidPattern {
        category: String,
        pattern: String,
        reason: String,
    },
}

/// One category and its ordered, pre-compiled keyword patterns.
///
/// Patterns are matched against text that has already been lowercased, so
/// they should be written in lowercase.
#[derive(Debug)]
pub struct KeywordRule {
    category: String,
    patterns: Vec<Regex>,
}

impl KeywordRule {
    pub fn new(category: impl Into<String>, patterns: &[&str]) -> Result<Self, CategorizeError> {
        let category = category.into();
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let regex = Regex::new(pattern).map_err(|e| CategorizeError::InvalidPattern {
                category: category.clone(),
                pattern: (*pattern).to_string(),
                reason: e.to_string(),
            })?;
            compiled.push(regex);
        }
        Ok(Self {
            category,
            patterns: compiled,
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

/// Classifier over an immutable keyword table, injected at construction
/// so tests can supply their own rule sets.
#[derive(Debug)]
pub struct Categorizer {
    rules: Vec<KeywordRule>,
}

impl Categorizer {
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        Self { rules }
    }

    /// The built-in keyword table covering the ten predefined categories.
    pub fn with_default_rules() -> Self {
        let table: [(&str, &[&str]); 10] = [
            ("Theses & Dissertations", &["thesis", "dissertation"]),
            (
                "Coursework & Term Papers",
                &["coursework", "term paper", "assignment", "essay"],
            ),
            (
                "Certificates & Diplomas",
                &["certificate", "diploma", "certification", "degree"],
            ),
            (
                "Tests & Quizzes",
                &["test", "quiz", "exam", "midterm", "final exam"],
            ),
            (
                "Answer Keys & Solutions",
                &["answer key", "solution", "solutions manual"],
            ),
            (
                "Presentations",
                &["presentation", "slides", "powerpoint", "keynote"],
            ),
            (
                "Formal Documents & Correspondence",
                &[
                    "letter",
                    "memo",
                    "memorandum",
                    "contract",
                    "agreement",
                    "official document",
                ],
            ),
            ("Books & Textbooks", &["book", "textbook", "manual", "e-book"]),
            (
                "Learning Materials & Study Guides",
                &[
                    "study guide",
                    "notes",
                    "handout",
                    "worksheet",
                    "learning material",
                ],
            ),
            ("Reports", &["report", "summary", "analysis", "findings"]),
        ];

        let rules = table
            .iter()
            .map(|(category, patterns)| {
                KeywordRule::new(*category, patterns).expect("built-in patterns are valid")
            })
            .collect();

        Self::new(rules)
    }

    /// Classify `text` against `allowed_categories`, in that order.
    ///
    /// Returns `None` for empty or whitespace-only text. Category names
    /// without a registered rule are silently skipped.
    pub fn categorize(&self, text: &str, allowed_categories: &[&str]) -> Option<&str> {
        if text.trim().is_empty() {
            return None;
        }

        let lowered = text.to_lowercase();

        for name in allowed_categories {
            let Some(rule) = self.rules.iter().find(|r| r.category == *name) else {
                continue;
            };
            for pattern in &rule.patterns {
                if pattern.is_match(&lowered) {
                    return Some(rule.category.as_str());
                }
            }
        }

        None
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::with_default_rules()
    }
}
