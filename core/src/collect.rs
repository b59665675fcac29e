//! Candidate collection from installed packages.
//!
//! [`collect`] walks the package list, applies allow/deny filtering, reads
//! each package's opt-in block, prefixes and validates every script entry,
//! and returns the surviving contributions as [`Candidate`]s. Anything
//! skipped along the way is reported as a [`Rejection`] rather than an error.

use thiserror::Error;
use tracing::debug;

use crate::{
    Candidate, ManagerConfig, Package, PackageConfig, PatternSet, is_valid_name, normalize,
};

/// Why a package or a single script entry was left out of the merge.
///
/// The `Display` impl is the diagnostic line shown in verbose mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Package name matched a deny pattern.
    #[error("package {package} is denied")]
    Denied { package: String },
    /// Package name matched no allow pattern.
    #[error("package {package} is not allowed")]
    NotAllowed { package: String },
    /// Script name (after prefixing) does not satisfy the name grammar.
    #[error("package {package}: invalid script name {name:?}")]
    InvalidName { package: String, name: String },
    /// Script value is empty or of the wrong shape.
    #[error("package {package}: invalid value for script {name:?}")]
    InvalidValue { package: String, name: String },
}

impl Rejection {
    /// Package the rejection applies to.
    pub fn package(&self) -> &str {
        match self {
            Self::Denied { package }
            | Self::NotAllowed { package }
            | Self::InvalidName { package, .. }
            | Self::InvalidValue { package, .. } => package,
        }
    }
}

/// Output of [`collect`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    /// Accepted contributions, in package then declaration order.
    pub candidates: Vec<Candidate>,
    /// Skipped packages and entries, in encounter order.
    pub rejections: Vec<Rejection>,
}

/// Joins `prefix`, `delimiter` and `name`.
///
/// A prefix that is empty after trimming leaves the name unchanged.
///
/// # Examples
///
/// ```
/// use script_merge_core::apply_prefix;
///
/// assert_eq!(apply_prefix("lint", "acme", ":"), "acme:lint");
/// assert_eq!(apply_prefix("lint", "  ", ":"), "lint");
/// assert_eq!(apply_prefix("lint", " acme ", "."), "acme.lint");
/// ```
pub fn apply_prefix(name: &str, prefix: &str, delimiter: &str) -> String {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}{delimiter}{name}")
    }
}

/// Gathers candidate scripts from every eligible package.
///
/// The package named `root_name` is never a contributor. Deny patterns win
/// over allow patterns. Packages without an opt-in block, with an `enabled`
/// flag that is anything but `true`, or with no scripts are skipped silently.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use script_merge_core::{ManagerConfig, Package, collect};
///
/// let packages = vec![
///     Package::new("shared-scripts/lint", json!({
///         "script-merge": { "scripts": { "lint": "phpcs", "bad name": "x" } }
///     })),
///     Package::new("other/pkg", json!({})),
/// ];
/// let collection = collect("my/app", &packages, &ManagerConfig::default());
/// assert_eq!(collection.candidates.len(), 1);
/// assert_eq!(collection.candidates[0].name, "lint");
/// assert_eq!(collection.rejections.len(), 2);
/// ```
pub fn collect(root_name: &str, packages: &[Package], config: &ManagerConfig) -> Collection {
    let allow = PatternSet::new(&config.allow);
    let deny = PatternSet::new(&config.deny);
    let mut collection = Collection::default();

    for package in packages {
        let name = package.name.as_str();
        if name == root_name {
            continue;
        }

        if deny.is_match(name) {
            debug!(package = name, "Package denied");
            collection.rejections.push(Rejection::Denied {
                package: name.to_string(),
            });
            continue;
        }
        if !allow.is_match(name) {
            debug!(package = name, "Package not in allow list");
            collection.rejections.push(Rejection::NotAllowed {
                package: name.to_string(),
            });
            continue;
        }

        let Some(package_config) = PackageConfig::from_extra(&package.extra) else {
            continue;
        };
        if !package_config.enabled {
            debug!(package = name, "Package disabled script contribution");
            continue;
        }
        if package_config.scripts.is_empty() {
            continue;
        }

        collect_package(name, &package_config, config, &mut collection);
    }

    collection
}

fn collect_package(
    package: &str,
    package_config: &PackageConfig,
    config: &ManagerConfig,
    collection: &mut Collection,
) {
    let prefix = package_config.effective_prefix(package, config);
    let delimiter = package_config.effective_delimiter(config);
    let policy = package_config.effective_policy(config);

    for (raw_name, raw_value) in &package_config.scripts {
        let name = apply_prefix(raw_name, prefix, delimiter);

        if !is_valid_name(&name) {
            debug!(package, script = %name, "Dropping script with invalid name");
            collection.rejections.push(Rejection::InvalidName {
                package: package.to_string(),
                name,
            });
            continue;
        }

        let Some(value) = normalize(raw_value) else {
            debug!(package, script = %name, "Dropping script with invalid value");
            collection.rejections.push(Rejection::InvalidValue {
                package: package.to_string(),
                name,
            });
            continue;
        };

        collection.candidates.push(Candidate {
            name,
            value,
            package: package.to_string(),
            priority: package_config.priority,
            policy,
        });
    }
}
