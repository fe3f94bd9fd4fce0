//! Glob-subset pattern compilation
//!
//! Operator patterns are comma-separated alternatives where `*` matches any
//! sequence of characters. Matching is whole-name anchored: `mongo:*` matches
//! `mongo:connection` but not `mongo` alone, and never a substring.

use eyre::{Context, Result};
use regex::Regex;

/// Compiled match predicate over channel names.
#[derive(Debug, Clone)]
pub struct Matcher {
    regex: Regex,
}

impl Matcher {
    /// Compile an operator pattern such as `"mongo:*,redis:*"`.
    ///
    /// All regex metacharacters in the raw pattern are escaped first so that
    /// literal characters in channel names are never interpreted as regex.
    /// The two glob constructs are then reintroduced: each `*` becomes a
    /// non-greedy any-sequence and each `,` becomes alternation. The whole
    /// expression is anchored, so a name must fully satisfy one alternative.
    pub fn compile(pattern: &str) -> Result<Self> {
        let escaped = regex::escape(pattern);
        let expr = format!("^({})$", escaped.replace("\\*", ".*?").replace(',', "|"));
        let regex = Regex::new(&expr).with_context(|| format!("invalid debug pattern {:?}", pattern))?;
        Ok(Self { regex })
    }

    /// Whether `name` fully matches at least one alternative of the pattern.
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}
