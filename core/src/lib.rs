//! Merge engine for package-contributed project scripts.
//!
//! Installed packages can advertise reusable scripts (`lint`, `build`,
//! `test`, ...) in their `extra` metadata. This crate decides which of those
//! contributions end up in the root project's script table:
//!
//! - [`matches`] / [`PatternSet`]: anchored, case-insensitive glob matching
//!   over package names for allow/deny filtering.
//! - [`normalize`]: turns a raw JSON script definition into a
//!   [`ScriptValue`], or rejects it.
//! - [`is_valid_name`]: the script name grammar.
//! - [`collect`]: filtering, opt-in config, prefixing and validation; yields
//!   [`Candidate`]s and [`Rejection`]s.
//! - [`merge`]: deterministic fold with [`CollisionPolicy`] handling and
//!   [`Provenance`] tracking.
//! - [`Orchestrator`]: runs the whole pass once against a [`RootProject`]
//!   and a [`PackageRepository`].
//!
//! Nothing here fails on malformed input: the worst outcome of bad
//! configuration is a script left out of the table.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use script_merge_core::*;
//!
//! let config = ManagerConfig::from_extra(&json!({
//!     "script-merge": { "allow": "acme/*", "deny": "acme/legacy" }
//! }));
//! let packages = vec![
//!     Package::new("acme/qa", json!({
//!         "script-merge": { "prefix": "qa", "scripts": { "lint": ["phpcs", "phpstan"] } }
//!     })),
//!     Package::new("acme/legacy", json!({
//!         "script-merge": { "scripts": { "lint": "old-lint" } }
//!     })),
//! ];
//!
//! let collection = collect("my/app", &packages, &config);
//! let outcome = merge(&ScriptTable::new(), collection.candidates);
//!
//! assert_eq!(
//!     outcome.scripts["qa:lint"],
//!     ScriptValue::Steps(vec!["phpcs".into(), "phpstan".into()])
//! );
//! assert_eq!(outcome.provenance["qa:lint"].owner, "acme/qa");
//! assert!(matches!(collection.rejections[0], Rejection::Denied { .. }));
//! ```

mod collect;
mod config;
mod merge;
mod name;
mod orchestrator;
mod pattern;
mod types;
mod value;

pub use collect::{Collection, Rejection, apply_prefix, collect};
pub use config::{DEFAULT_ALLOW_PATTERN, DEFAULT_DELIMITER, ManagerConfig, PackageConfig};
pub use merge::{Decision, MergeOutcome, Resolution, chain, merge, merge_with_reserved};
pub use name::is_valid_name;
pub use orchestrator::{
    LineSink, MergeReport, Orchestrator, PackageRepository, RootProject, TracingSink,
    TriggerEvent, plan,
};
pub use pattern::{PatternSet, matches};
pub use types::*;
pub use value::normalize;
