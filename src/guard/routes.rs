//! Protected path prefixes and the role each one requires.

use crate::session::Role;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteRule {
    pub prefix: String,
    pub role: Role,
}

impl RouteRule {
    #[must_use]
    pub fn new(prefix: impl Into<String>, role: Role) -> Self {
        Self {
            prefix: prefix.into(),
            role,
        }
    }

    /// The path is the prefix itself or lies below it (`prefix/...`).
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        path.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteTableError {
    #[error("route prefix must start with '/' and must not end with '/': {0}")]
    InvalidPrefix(String),
    #[error("route prefixes overlap: {0} and {1}")]
    Overlap(String, String),
}

/// Ordered, disjoint prefix rules. A path matches at most one rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// # Errors
    /// Rejects malformed prefixes and prefixes that overlap.
    pub fn new(rules: Vec<RouteRule>) -> Result<Self, RouteTableError> {
        for rule in &rules {
            if !rule.prefix.starts_with('/') || rule.prefix.len() < 2 || rule.prefix.ends_with('/')
            {
                return Err(RouteTableError::InvalidPrefix(rule.prefix.clone()));
            }
        }
        for (index, rule) in rules.iter().enumerate() {
            for other in &rules[index + 1..] {
                if rule.matches(&other.prefix) || other.matches(&rule.prefix) {
                    return Err(RouteTableError::Overlap(
                        rule.prefix.clone(),
                        other.prefix.clone(),
                    ));
                }
            }
        }
        Ok(Self { rules })
    }

    /// First rule covering `path`.
    #[must_use]
    pub fn matching(&self, path: &str) -> Option<&RouteRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    #[must_use]
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}

impl Default for RouteTable {
    /// Each role guards its own dashboard root.
    fn default() -> Self {
        Self {
            rules: Role::ALL
                .into_iter()
                .map(|role| RouteRule::new(role.home_path(), role))
                .collect(),
        }
    }
}
