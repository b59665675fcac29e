//! Typed configuration built from loosely-typed `extra` metadata.
//!
//! Both the root project and each contributing package carry their settings
//! under [`EXTRA_KEY`](crate::EXTRA_KEY) in their `extra` block. The parsers
//! here never fail: absent or malformed keys fall back to documented defaults
//! so that bad configuration can only ever omit scripts, never abort a merge.
//!
//! # Example root configuration
//!
//! ```json
//! {
//!   "extra": {
//!     "script-merge": {
//!       "allow": ["acme/*", "tools/linter"],
//!       "deny": "acme/legacy-*",
//!       "default-collision": "chain",
//!       "prefixes": { "tools/linter": "lint" },
//!       "delimiter": ":",
//!       "verbose": true
//!     }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{CollisionPolicy, DEFAULT_PRIORITY, EXTRA_KEY};

/// Allow-list used when the root project does not configure one.
pub const DEFAULT_ALLOW_PATTERN: &str = "shared-scripts/*";

/// Separator placed between a prefix and a script name by default.
pub const DEFAULT_DELIMITER: &str = ":";

/// Root-level settings controlling which packages may contribute and how.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use script_merge_core::{CollisionPolicy, ManagerConfig};
///
/// let config = ManagerConfig::from_extra(&json!({
///     "script-merge": { "deny": "acme/old", "default-collision": "chain" }
/// }));
/// assert_eq!(config.allow, vec!["shared-scripts/*".to_string()]);
/// assert_eq!(config.deny, vec!["acme/old".to_string()]);
/// assert_eq!(config.default_collision, CollisionPolicy::Chain);
/// assert!(!config.verbose);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Package name patterns allowed to contribute.
    pub allow: Vec<String>,
    /// Package name patterns never allowed to contribute. Wins over `allow`.
    pub deny: Vec<String>,
    /// Policy for packages that do not pick one.
    pub default_collision: CollisionPolicy,
    /// Per-package prefix overrides, keyed by package name.
    pub prefixes: IndexMap<String, String>,
    /// Separator between prefix and script name.
    pub delimiter: String,
    /// Emit diagnostic lines.
    pub verbose: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            allow: vec![DEFAULT_ALLOW_PATTERN.to_string()],
            deny: Vec::new(),
            default_collision: CollisionPolicy::KeepRoot,
            prefixes: IndexMap::new(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            verbose: false,
        }
    }
}

impl ManagerConfig {
    /// Reads the manager block from a root project's `extra` metadata.
    pub fn from_extra(extra: &Value) -> Self {
        extra
            .get(EXTRA_KEY)
            .map(Self::from_value)
            .unwrap_or_default()
    }

    /// Builds the config from the manager block itself.
    ///
    /// A block that is not an object yields the defaults.
    pub fn from_value(block: &Value) -> Self {
        let mut config = Self::default();
        let Some(block) = block.as_object() else {
            return config;
        };

        if let Some(allow) = block.get("allow").and_then(string_list) {
            config.allow = allow;
        }
        if let Some(deny) = block.get("deny").and_then(string_list) {
            config.deny = deny;
        }
        if let Some(policy) = block.get("default-collision").and_then(policy_value) {
            config.default_collision = policy;
        }
        if let Some(prefixes) = block.get("prefixes").and_then(Value::as_object) {
            config.prefixes = prefixes
                .iter()
                .filter_map(|(pkg, prefix)| Some((pkg.clone(), prefix.as_str()?.to_string())))
                .collect();
        }
        if let Some(delimiter) = block.get("delimiter").and_then(non_empty_str) {
            config.delimiter = delimiter.to_string();
        }
        if let Some(verbose) = block.get("verbose").and_then(Value::as_bool) {
            config.verbose = verbose;
        }

        config
    }

    /// Prefix override configured for `package`, if any.
    pub fn prefix_for(&self, package: &str) -> Option<&str> {
        self.prefixes.get(package).map(String::as_str)
    }
}

/// Per-package opt-in settings.
///
/// Present only when the package declares a block under
/// [`EXTRA_KEY`](crate::EXTRA_KEY); the block's presence is the opt-in.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use script_merge_core::PackageConfig;
///
/// let config = PackageConfig::from_extra(&json!({
///     "script-merge": { "scripts": { "lint": "phpcs" }, "priority": 20 }
/// }))
/// .unwrap();
/// assert!(config.enabled);
/// assert_eq!(config.priority, 20);
/// assert_eq!(config.scripts.len(), 1);
///
/// assert!(PackageConfig::from_extra(&json!({})).is_none());
/// assert!(PackageConfig::from_extra(&json!({ "script-merge": true })).is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PackageConfig {
    /// `true` when the flag is absent; a non-boolean flag counts as `false`.
    pub enabled: bool,
    /// Raw script entries in declaration order; empty when absent or malformed.
    pub scripts: Map<String, Value>,
    /// Self-declared prefix.
    pub prefix: String,
    /// Delimiter override.
    pub delimiter: Option<String>,
    /// Sort priority; lower is processed first.
    pub priority: i64,
    /// Collision policy override.
    pub collision: Option<CollisionPolicy>,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scripts: Map::new(),
            prefix: String::new(),
            delimiter: None,
            priority: DEFAULT_PRIORITY,
            collision: None,
        }
    }
}

impl PackageConfig {
    /// Reads the opt-in block from a package's `extra` metadata.
    ///
    /// Returns `None` when the block is absent or not an object.
    pub fn from_extra(extra: &Value) -> Option<Self> {
        let block = extra.get(EXTRA_KEY)?.as_object()?;
        let mut config = Self::default();

        config.enabled = match block.get("enabled") {
            None => true,
            Some(Value::Bool(enabled)) => *enabled,
            // Malformed flag: skip the package.
            Some(_) => false,
        };
        if let Some(scripts) = block.get("scripts").and_then(Value::as_object) {
            config.scripts = scripts.clone();
        }
        if let Some(prefix) = block.get("prefix").and_then(Value::as_str) {
            config.prefix = prefix.to_string();
        }
        config.delimiter = block
            .get("delimiter")
            .and_then(non_empty_str)
            .map(str::to_string);
        if let Some(priority) = block.get("priority").and_then(Value::as_i64) {
            config.priority = priority;
        }
        config.collision = block.get("collision").and_then(policy_value);

        Some(config)
    }

    /// Policy for this package: its own override, else the manager default.
    pub fn effective_policy(&self, manager: &ManagerConfig) -> CollisionPolicy {
        self.collision.unwrap_or(manager.default_collision)
    }

    /// Prefix for this package: a manager override wins over the package's
    /// own prefix.
    pub fn effective_prefix<'a>(&'a self, package: &str, manager: &'a ManagerConfig) -> &'a str {
        manager.prefix_for(package).unwrap_or(&self.prefix)
    }

    /// Delimiter for this package: its own override, else the manager's.
    pub fn effective_delimiter<'a>(&'a self, manager: &'a ManagerConfig) -> &'a str {
        self.delimiter.as_deref().unwrap_or(&manager.delimiter)
    }
}

/// Accepts a single string or a list; non-string list elements are ignored.
fn string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::String(s) => Some(vec![s.clone()]),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
        ),
        _ => None,
    }
}

fn policy_value(value: &Value) -> Option<CollisionPolicy> {
    value.as_str()?.parse().ok()
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}
