//! Interception Rules
//!
//! A rule pairs a URL matcher with the bundled asset served in place of the
//! network response. Rules are evaluated in registration order and the first
//! match wins.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Result;

/// Substring the default rule looks for in request URLs
pub const DEFAULT_MATCHER: &str = "logo.gif";
/// Asset served by the default rule
pub const DEFAULT_ASSET_PATH: &str = "images/error.png";
pub const DEFAULT_MIME_TYPE: &str = "image/png";
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Single substitution rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptRule {
    /// Case-sensitive substring searched for in the request URL
    pub matcher: String,
    /// Content type of the substituted response
    pub mime_type: String,
    /// Text encoding reported with the substituted response
    pub encoding: String,
    /// Asset path, relative to the asset store root
    pub asset_path: String,
}

impl InterceptRule {
    pub fn new(
        matcher: impl Into<String>,
        mime_type: impl Into<String>,
        encoding: impl Into<String>,
        asset_path: impl Into<String>,
    ) -> Self {
        Self {
            matcher: matcher.into(),
            mime_type: mime_type.into(),
            encoding: encoding.into(),
            asset_path: asset_path.into(),
        }
    }

    /// Check if this rule applies to the given URL.
    ///
    /// Matching is plain substring containment and is case-sensitive:
    /// `LOGO.GIF` does not match a `logo.gif` rule.
    pub fn matches(&self, url: &str) -> bool {
        url.contains(&self.matcher)
    }
}

impl Default for InterceptRule {
    fn default() -> Self {
        Self::new(
            DEFAULT_MATCHER,
            DEFAULT_MIME_TYPE,
            DEFAULT_ENCODING,
            DEFAULT_ASSET_PATH,
        )
    }
}

/// Ordered, immutable collection of rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<InterceptRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<InterceptRule>) -> Self {
        Self { rules }
    }

    /// A rule set with no rules; every request passes through.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Load rules from a JSON array on disk.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let rules: Vec<InterceptRule> = serde_json::from_str(raw)?;
        Ok(Self::new(rules))
    }

    /// Return the first rule, in registration order, whose matcher occurs in `url`.
    pub fn classify(&self, url: &str) -> Option<&InterceptRule> {
        self.rules.iter().find(|rule| rule.matches(url))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterceptRule> {
        self.rules.iter()
    }
}

impl Default for RuleSet {
    /// The single `logo.gif` -> `images/error.png` rule.
    fn default() -> Self {
        Self::new(vec![InterceptRule::default()])
    }
}
