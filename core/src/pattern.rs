//! Glob-style package name matching.
//!
//! Patterns support two wildcards: `*` matches any run of characters
//! (including none) and `?` matches exactly one character. Every other
//! character is literal. Matching is anchored over the whole name and
//! case-insensitive.
//!
//! # Examples
//!
//! ```
//! use script_merge_core::matches;
//!
//! assert!(matches("Foo/Bar", &["foo/*"]));
//! assert!(!matches("foobar", &["foo/*"]));
//! assert!(matches("acme/tool-1", &["acme/tool-?"]));
//! assert!(!matches("anything", &[] as &[&str]));
//! ```

use regex::{Regex, RegexBuilder};

/// A single compiled pattern.
#[derive(Debug, Clone)]
enum Matcher {
    Regex(Regex),
    /// Used only if the translated pattern cannot be compiled.
    Literal(String),
}

impl Matcher {
    fn compile(pattern: &str) -> Self {
        let source = glob_to_regex(pattern);
        match RegexBuilder::new(&source)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
        {
            Ok(regex) => Self::Regex(regex),
            Err(err) => {
                tracing::debug!(pattern, error = %err, "Falling back to literal pattern match");
                Self::Literal(pattern.to_lowercase())
            }
        }
    }

    fn is_match(&self, name: &str) -> bool {
        match self {
            Self::Regex(regex) => regex.is_match(name),
            Self::Literal(lowered) => name.to_lowercase() == *lowered,
        }
    }
}

/// A precompiled list of glob patterns.
///
/// Build once from configuration and reuse for every package.
///
/// # Examples
///
/// ```
/// use script_merge_core::PatternSet;
///
/// let deny = PatternSet::new(["acme/*", "legacy/??"]);
/// assert!(deny.is_match("ACME/tool"));
/// assert!(deny.is_match("legacy/ab"));
/// assert!(!deny.is_match("legacy/abc"));
/// assert_eq!(deny.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<String>,
    matchers: Vec<Matcher>,
}

impl PatternSet {
    /// Compiles every pattern in `patterns`.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        let matchers = patterns.iter().map(|p| Matcher::compile(p)).collect();
        Self { patterns, matchers }
    }

    /// Returns `true` if `name` matches any pattern in the set.
    pub fn is_match(&self, name: &str) -> bool {
        self.matchers.iter().any(|m| m.is_match(name))
    }

    /// The source patterns, in configuration order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Number of patterns in the set.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if the set has no patterns and so matches nothing.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Returns `true` if `name` matches any of `patterns`.
///
/// Compiles the patterns on every call; use [`PatternSet`] when matching many
/// names against the same list.
pub fn matches<S: AsRef<str>>(name: &str, patterns: &[S]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    PatternSet::new(patterns).is_match(name)
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("^(?:");
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    out.push_str(")$");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_is_anchored() {
        assert!(matches("foo/bar", &["foo/*"]));
        assert!(matches("foo/", &["foo/*"]));
        assert!(!matches("foobar", &["foo/*"]));
        assert!(!matches("x-foo/bar", &["foo/*"]));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert!(matches("Foo/Bar", &["foo/*"]));
        assert!(matches("foo/bar", &["FOO/BAR"]));
    }

    #[test]
    fn test_question_mark_matches_exactly_one_char() {
        assert!(matches("pkg-a", &["pkg-?"]));
        assert!(!matches("pkg-", &["pkg-?"]));
        assert!(!matches("pkg-ab", &["pkg-?"]));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches("a.b", &["a.b"]));
        assert!(!matches("axb", &["a.b"]));
        assert!(matches("a+b(c)", &["a+b(c)"]));
        assert!(matches("[x]|^y$", &["[x]|^y$"]));
        assert!(!matches("x", &["[x]"]));
    }

    #[test]
    fn test_any_pattern_in_list_matches() {
        let patterns = ["first/*", "second/*"];
        assert!(matches("second/tool", &patterns));
        assert!(!matches("third/tool", &patterns));
    }

    #[test]
    fn test_empty_pattern_list_never_matches() {
        let none: [&str; 0] = [];
        assert!(!matches("", &none));
        assert!(!matches("foo/bar", &none));
        assert!(PatternSet::default().is_empty());
        assert!(!PatternSet::default().is_match("foo"));
    }

    #[test]
    fn test_glob_translation() {
        assert_eq!(glob_to_regex("a*b?"), "^(?:a.*b.)$");
        assert_eq!(glob_to_regex("a.b"), r"^(?:a\.b)$");
    }
}
