//! SQL guard - lexical policy checks on raw SQL text
//!
//! Works on any SQL string, whoever produced it:
//! - read-only mode: a single SELECT with no data-changing verbs
//! - write mode: a single INSERT/UPDATE/DELETE/ALTER/CREATE, never
//!   DROP/TRUNCATE/GRANT/REVOKE, and UPDATE/DELETE only with a WHERE clause
//! - LIMIT injection for read queries
//!
//! Keywords are matched as whole words: maximal runs of alphanumerics and `_`.
//! Comments and string literals are not understood, so a keyword inside a
//! literal is still a hit.

use thiserror::Error;

/// Verbs that may not appear anywhere in a read-only statement
pub const READONLY_FORBIDDEN: &[&str] = &[
    "insert", "update", "delete", "drop", "truncate", "alter", "create", "grant", "revoke",
];

/// Verbs refused in write mode whatever the statement shape
pub const WRITE_FORBIDDEN: &[&str] = &["drop", "truncate", "grant", "revoke"];

/// Allowed leading verbs in write mode
pub const WRITE_VERBS: &[&str] = &["update", "insert", "delete", "alter", "create"];

pub const DEFAULT_LIMIT: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardViolation {
    #[error("Empty SQL")]
    EmptyInput,

    #[error("Multiple statements are not allowed")]
    MultiStatement,

    #[error("Forbidden keyword detected: {keyword}")]
    ForbiddenKeyword { keyword: String },

    #[error("Only SELECT queries are allowed, got statement starting with '{leading}'")]
    NotReadOnly { leading: String },

    #[error("Only INSERT/UPDATE/DELETE/ALTER/CREATE are allowed in write mode, got '{leading}'")]
    UnsupportedWriteShape { leading: String },

    #[error("{verb} must include WHERE")]
    MissingWhereClause { verb: String },
}

#[derive(Debug, Clone)]
pub struct SqlGuard {
    default_limit: u32,
}

impl Default for SqlGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlGuard {
    pub fn new() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
        }
    }

    pub fn with_default_limit(mut self, limit: u32) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn check_readonly(&self, sql: &str) -> Result<(), GuardViolation> {
        let normalized = sql.trim().to_lowercase();

        if !normalized.starts_with("select") {
            return Err(GuardViolation::NotReadOnly {
                leading: leading_word(&normalized),
            });
        }

        if let Some(keyword) = first_keyword(&normalized, READONLY_FORBIDDEN) {
            return Err(GuardViolation::ForbiddenKeyword { keyword });
        }

        if has_inner_semicolon(&normalized) {
            return Err(GuardViolation::MultiStatement);
        }

        Ok(())
    }

    pub fn check_write(&self, sql: &str) -> Result<(), GuardViolation> {
        let normalized = sql.trim().to_lowercase();

        if normalized.is_empty() {
            return Err(GuardViolation::EmptyInput);
        }

        if has_inner_semicolon(&normalized) {
            return Err(GuardViolation::MultiStatement);
        }

        if let Some(keyword) = first_keyword(&normalized, WRITE_FORBIDDEN) {
            return Err(GuardViolation::ForbiddenKeyword { keyword });
        }

        let Some(verb) = WRITE_VERBS.iter().find(|verb| normalized.starts_with(*verb)) else {
            return Err(GuardViolation::UnsupportedWriteShape {
                leading: leading_word(&normalized),
            });
        };

        if matches!(*verb, "update" | "delete") && !contains_word(&normalized, "where") {
            return Err(GuardViolation::MissingWhereClause {
                verb: verb.to_uppercase(),
            });
        }

        Ok(())
    }

    /// Append `LIMIT <default>` unless the statement already has a LIMIT
    pub fn enforce_limit(&self, sql: &str) -> String {
        enforce_limit(sql, self.default_limit)
    }
}

pub fn enforce_limit(sql: &str, limit: u32) -> String {
    let trimmed = sql.trim();
    if has_limit(trimmed) {
        return trimmed.to_string();
    }
    format!("{} LIMIT {};", trimmed.trim_end_matches(';'), limit)
}

/// Whether `limit` appears as a whole word, in any case
pub fn has_limit(sql: &str) -> bool {
    contains_word(&sql.to_lowercase(), "limit")
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
}

fn contains_word(text: &str, keyword: &str) -> bool {
    words(text).any(|word| word == keyword)
}

/// First keyword from `keywords` (in list order) present as a word in `text`
fn first_keyword(text: &str, keywords: &[&str]) -> Option<String> {
    keywords
        .iter()
        .find(|keyword| contains_word(text, keyword))
        .map(|keyword| keyword.to_string())
}

/// A semicolon anywhere but the last character
fn has_inner_semicolon(text: &str) -> bool {
    text.strip_suffix(';').unwrap_or(text).contains(';')
}

fn leading_word(text: &str) -> String {
    words(text).next().unwrap_or("").to_string()
}
