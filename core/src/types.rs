//! Type definitions shared by the collector, merge engine, and orchestrator.
//!
//! The types are designed for serialization with [`serde`] so that merge
//! results and provenance can be written as JSON or YAML by callers.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Key under which both the root manager config and per-package opt-in config
/// live inside a package's `extra` metadata block.
pub const EXTRA_KEY: &str = "script-merge";

/// Priority assigned to package contributions that do not declare one.
pub const DEFAULT_PRIORITY: i64 = 100;

/// Priority recorded for scripts owned by the root project.
///
/// It is the lowest possible value, so root entries always sort before any
/// package contribution.
pub const ROOT_PRIORITY: i64 = i64::MIN;

/// Owner label recorded in [`Provenance`] for root-owned scripts.
pub const ROOT_OWNER: &str = "__root__";

/// A validated script definition.
///
/// Either a single command or an ordered list of commands run one after
/// another. Neither form is ever empty, and no element is the empty string.
///
/// # Examples
///
/// ```
/// use script_merge_core::ScriptValue;
///
/// let single = ScriptValue::Single("phpunit".into());
/// assert_eq!(single.to_steps(), vec!["phpunit".to_string()]);
///
/// let steps = ScriptValue::Steps(vec!["phpcs".into(), "phpstan".into()]);
/// assert_eq!(steps.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScriptValue {
    /// One command.
    Single(String),
    /// Several commands, in order.
    Steps(Vec<String>),
}

impl ScriptValue {
    /// Returns the commands as an owned sequence, wrapping a single command.
    pub fn to_steps(&self) -> Vec<String> {
        match self {
            Self::Single(cmd) => vec![cmd.clone()],
            Self::Steps(steps) => steps.clone(),
        }
    }

    /// Number of commands in this script.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Steps(steps) => steps.len(),
        }
    }

    /// Always `false` for values built through the normalizer.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(cmd) => f.write_str(cmd),
            Self::Steps(steps) => write!(f, "[{}]", steps.join(", ")),
        }
    }
}

/// Insertion-ordered mapping of script name to script value.
pub type ScriptTable = IndexMap<String, ScriptValue>;

/// Rule applied when a contribution targets a script name that is already
/// taken.
///
/// # Examples
///
/// ```
/// use script_merge_core::CollisionPolicy;
///
/// let policy: CollisionPolicy = "replace-nonroot".parse().unwrap();
/// assert_eq!(policy, CollisionPolicy::ReplaceNonRoot);
/// assert_eq!(CollisionPolicy::default(), CollisionPolicy::KeepRoot);
/// assert_eq!(CollisionPolicy::Chain.to_string(), "chain");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// The first registered owner keeps the name (the default).
    #[default]
    KeepRoot,
    /// Append the incoming commands after the existing ones.
    Chain,
    /// A package with a strictly lower priority number replaces another
    /// package's entry. Root entries are never replaced.
    #[serde(rename = "replace-nonroot")]
    ReplaceNonRoot,
}

impl CollisionPolicy {
    /// The configuration spelling of this policy.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeepRoot => "keep-root",
            Self::Chain => "chain",
            Self::ReplaceNonRoot => "replace-nonroot",
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown collision policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collision policy: {0}")]
pub struct UnknownPolicy(pub String);

impl FromStr for CollisionPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "keep-root" => Ok(Self::KeepRoot),
            "chain" => Ok(Self::Chain),
            "replace-nonroot" => Ok(Self::ReplaceNonRoot),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

/// An installed package as exposed by package discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Package name, e.g. `vendor/tool`.
    pub name: String,
    /// Free-form metadata block; opt-in config lives under [`EXTRA_KEY`].
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl Package {
    /// Creates a package with the given name and `extra` block.
    pub fn new(name: impl Into<String>, extra: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            extra,
        }
    }
}

/// A pending script contribution, produced by the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Final script name, prefix applied and validated.
    pub name: String,
    /// Normalized script value.
    pub value: ScriptValue,
    /// Contributing package.
    pub package: String,
    /// Sort priority; lower is processed first.
    pub priority: i64,
    /// Policy applied when the name is already taken.
    pub policy: CollisionPolicy,
}

/// Record of who currently owns a script name.
///
/// # Examples
///
/// ```
/// use script_merge_core::{Provenance, ROOT_PRIORITY};
///
/// let root = Provenance::root();
/// assert!(root.is_root);
/// assert_eq!(root.priority, ROOT_PRIORITY);
///
/// let pkg = Provenance::package("acme/tools", 10);
/// assert!(!pkg.is_root);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Owning package, or [`ROOT_OWNER`] for the root project.
    pub owner: String,
    /// Priority of the owning contribution.
    pub priority: i64,
    /// Whether the root project owns the script.
    pub is_root: bool,
}

impl Provenance {
    /// Provenance of a script defined by the root project.
    pub fn root() -> Self {
        Self {
            owner: ROOT_OWNER.to_string(),
            priority: ROOT_PRIORITY,
            is_root: true,
        }
    }

    /// Provenance of a script contributed by a package.
    pub fn package(owner: impl Into<String>, priority: i64) -> Self {
        Self {
            owner: owner.into(),
            priority,
            is_root: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_roundtrips_through_serde() {
        for policy in [
            CollisionPolicy::KeepRoot,
            CollisionPolicy::Chain,
            CollisionPolicy::ReplaceNonRoot,
        ] {
            let json = serde_json::to_string(&policy).unwrap();
            assert_eq!(json, format!("\"{policy}\""));
            let back: CollisionPolicy = serde_json::from_str(&json).unwrap();
            assert_eq!(back, policy);
        }
    }

    #[test]
    fn test_policy_from_str_rejects_unknown() {
        assert_eq!(
            "overwrite".parse::<CollisionPolicy>(),
            Err(UnknownPolicy("overwrite".to_string()))
        );
        assert_eq!(" chain ".parse::<CollisionPolicy>(), Ok(CollisionPolicy::Chain));
    }

    #[test]
    fn test_script_value_serializes_untagged() {
        let single = ScriptValue::Single("phpunit".into());
        assert_eq!(serde_json::to_string(&single).unwrap(), "\"phpunit\"");

        let steps = ScriptValue::Steps(vec!["a".into(), "b".into()]);
        assert_eq!(serde_json::to_string(&steps).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_script_value_display() {
        assert_eq!(ScriptValue::Single("make".into()).to_string(), "make");
        assert_eq!(
            ScriptValue::Steps(vec!["a".into(), "b".into()]).to_string(),
            "[a, b]"
        );
    }
}
