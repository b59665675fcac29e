//! Script name grammar.

use std::sync::LazyLock;

use regex::Regex;

static SCRIPT_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:-]*$").expect("static regex must compile")
});

/// Returns `true` if `name` is an acceptable script name.
///
/// A name starts with an ASCII letter or digit, followed by letters, digits,
/// `_`, `.`, `:` or `-`. Checked after prefixing, so `tools:lint` is valid.
///
/// # Examples
///
/// ```
/// use script_merge_core::is_valid_name;
///
/// assert!(is_valid_name("lint"));
/// assert!(is_valid_name("acme:test.unit"));
/// assert!(!is_valid_name(":lint"));
/// assert!(!is_valid_name("has space"));
/// ```
pub fn is_valid_name(name: &str) -> bool {
    SCRIPT_NAME.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["a", "9", "build", "test:unit", "a_b.c-d:e", "X1"] {
            assert!(is_valid_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        for name in [
            "",
            "-lint",
            "_lint",
            ".lint",
            "lint!",
            "li nt",
            "lint\n",
            "caf\u{e9}",
            "a/b",
        ] {
            assert!(!is_valid_name(name), "{name:?} should be invalid");
        }
    }
}
