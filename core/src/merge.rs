//! Deterministic script merging with collision policies.
//!
//! [`merge`] folds package [`Candidate`]s into the root project's script
//! table. Candidates are processed in `(priority, package, name)` order, so
//! the result does not depend on the order packages were discovered in.
//! Every script name ends up with exactly one [`Provenance`] record, and
//! every processed candidate leaves a [`Decision`] explaining what happened
//! to it.
//!
//! # Example
//!
//! ```
//! use script_merge_core::*;
//!
//! let mut root = ScriptTable::new();
//! root.insert("test".into(), ScriptValue::Single("phpunit".into()));
//!
//! let candidates = vec![Candidate {
//!     name: "test".into(),
//!     value: ScriptValue::Single("extra-check".into()),
//!     package: "acme/qa".into(),
//!     priority: 100,
//!     policy: CollisionPolicy::Chain,
//! }];
//!
//! let outcome = merge(&root, candidates);
//! assert_eq!(
//!     outcome.scripts["test"],
//!     ScriptValue::Steps(vec!["phpunit".into(), "extra-check".into()])
//! );
//! assert!(outcome.provenance["test"].is_root);
//! ```

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Candidate, CollisionPolicy, Provenance, ScriptTable, ScriptValue};

/// What the merge did with one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Resolution {
    /// The name was free; the candidate now owns it.
    Inserted,
    /// Commands were appended to a root-owned script.
    ChainedOntoRoot,
    /// Commands were appended to a script owned by `owner`.
    ChainedOntoPackage { owner: String },
    /// The candidate took over a script from `previous`.
    Replaced { previous: String },
    /// The root project keeps the script unchanged.
    KeptRoot,
    /// `owner` keeps the script unchanged.
    KeptExisting { owner: String },
}

impl Resolution {
    /// Whether the candidate's commands made it into the final table.
    pub fn applied(&self) -> bool {
        !matches!(self, Self::KeptRoot | Self::KeptExisting { .. })
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inserted => f.write_str("inserted"),
            Self::ChainedOntoRoot => f.write_str("chained onto root script"),
            Self::ChainedOntoPackage { owner } => write!(f, "chained onto {owner}"),
            Self::Replaced { previous } => write!(f, "replaced {previous}"),
            Self::KeptRoot => f.write_str("kept root script"),
            Self::KeptExisting { owner } => write!(f, "kept {owner}"),
        }
    }
}

/// Record of one processed candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub script: String,
    pub package: String,
    pub priority: i64,
    pub policy: CollisionPolicy,
    pub resolution: Resolution,
}

/// Result of a merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOutcome {
    /// Final script table: root entries first, in their original order,
    /// followed by newly inserted names in processing order.
    pub scripts: ScriptTable,
    /// Current owner of every script in `scripts`, plus the reserved root
    /// names, which are root-owned but absent from `scripts`.
    pub provenance: IndexMap<String, Provenance>,
    /// One entry per candidate, in processing order.
    pub decisions: Vec<Decision>,
}

impl MergeOutcome {
    /// Provenance and decisions for a single script name.
    ///
    /// Returns `None` if the name is neither in the final table nor reserved
    /// by the root.
    pub fn explain(&self, script: &str) -> Option<(&Provenance, Vec<&Decision>)> {
        let provenance = self.provenance.get(script)?;
        let decisions = self
            .decisions
            .iter()
            .filter(|d| d.script == script)
            .collect();
        Some((provenance, decisions))
    }

    /// Number of candidates whose commands ended up in the table.
    pub fn applied_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.resolution.applied())
            .count()
    }
}

/// Merges candidates into a copy of the root script table.
///
/// Root scripts are seeded as root-owned with the lowest possible priority.
/// Candidates are then sorted ascending by `(priority, package, name)` and
/// folded in:
///
/// - a free name is inserted;
/// - a root-owned name only changes under [`CollisionPolicy::Chain`];
/// - a package-owned name is appended to under `Chain`, replaced under
///   [`CollisionPolicy::ReplaceNonRoot`] when the candidate's priority is
///   strictly lower, and otherwise left with its first owner.
///
/// Chaining is not idempotent: merging an already chained table with the
/// same candidates appends the commands again.
pub fn merge(root_scripts: &ScriptTable, candidates: Vec<Candidate>) -> MergeOutcome {
    merge_with_reserved(root_scripts, &[], candidates)
}

/// Like [`merge`], but also honours root names whose values are outside the
/// script table.
///
/// A reserved name is root-owned and always wins: every candidate for it
/// resolves to [`Resolution::KeptRoot`], whatever its policy, and it never
/// appears in [`MergeOutcome::scripts`].
///
/// # Examples
///
/// ```
/// use script_merge_core::*;
///
/// let candidates = vec![Candidate {
///     name: "weird".into(),
///     value: ScriptValue::Single("pkg-cmd".into()),
///     package: "acme/qa".into(),
///     priority: 100,
///     policy: CollisionPolicy::Chain,
/// }];
///
/// let outcome = merge_with_reserved(&ScriptTable::new(), &["weird".to_string()], candidates);
/// assert!(outcome.scripts.is_empty());
/// assert!(outcome.provenance["weird"].is_root);
/// assert_eq!(outcome.decisions[0].resolution, Resolution::KeptRoot);
/// ```
pub fn merge_with_reserved(
    root_scripts: &ScriptTable,
    reserved: &[String],
    mut candidates: Vec<Candidate>,
) -> MergeOutcome {
    let mut scripts = root_scripts.clone();
    let mut provenance: IndexMap<String, Provenance> = root_scripts
        .keys()
        .chain(reserved)
        .map(|name| (name.clone(), Provenance::root()))
        .collect();

    candidates.sort_by(|a, b| {
        (a.priority, &a.package, &a.name).cmp(&(b.priority, &b.package, &b.name))
    });

    let mut decisions = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let resolution = fold(&mut scripts, &mut provenance, &candidate);
        debug!(
            script = %candidate.name,
            package = %candidate.package,
            priority = candidate.priority,
            policy = %candidate.policy,
            resolution = %resolution,
            "Merged candidate"
        );
        decisions.push(Decision {
            script: candidate.name,
            package: candidate.package,
            priority: candidate.priority,
            policy: candidate.policy,
            resolution,
        });
    }

    MergeOutcome {
        scripts,
        provenance,
        decisions,
    }
}

fn fold(
    scripts: &mut ScriptTable,
    provenance: &mut IndexMap<String, Provenance>,
    candidate: &Candidate,
) -> Resolution {
    if let (Some(existing), Some(owner)) = (
        scripts.get_mut(&candidate.name),
        provenance.get_mut(&candidate.name),
    ) {
        return resolve_collision(existing, owner, candidate);
    }
    if provenance.contains_key(&candidate.name) {
        // Reserved root name: nothing to chain onto or replace.
        return Resolution::KeptRoot;
    }

    scripts.insert(candidate.name.clone(), candidate.value.clone());
    provenance.insert(
        candidate.name.clone(),
        Provenance::package(&candidate.package, candidate.priority),
    );
    Resolution::Inserted
}

fn resolve_collision(
    existing: &mut ScriptValue,
    owner: &mut Provenance,
    candidate: &Candidate,
) -> Resolution {
    if owner.is_root {
        return match candidate.policy {
            CollisionPolicy::Chain => {
                *existing = chain(existing, &candidate.value);
                Resolution::ChainedOntoRoot
            }
            CollisionPolicy::KeepRoot | CollisionPolicy::ReplaceNonRoot => Resolution::KeptRoot,
        };
    }

    match candidate.policy {
        CollisionPolicy::Chain => {
            *existing = chain(existing, &candidate.value);
            Resolution::ChainedOntoPackage {
                owner: owner.owner.clone(),
            }
        }
        CollisionPolicy::ReplaceNonRoot if candidate.priority < owner.priority => {
            let previous = std::mem::replace(
                owner,
                Provenance::package(&candidate.package, candidate.priority),
            );
            *existing = candidate.value.clone();
            Resolution::Replaced {
                previous: previous.owner,
            }
        }
        // Ties keep the first-sorted owner.
        CollisionPolicy::ReplaceNonRoot | CollisionPolicy::KeepRoot => Resolution::KeptExisting {
            owner: owner.owner.clone(),
        },
    }
}

/// Appends `incoming` after `existing`, always yielding a sequence.
///
/// # Examples
///
/// ```
/// use script_merge_core::{ScriptValue, chain};
///
/// let merged = chain(
///     &ScriptValue::Single("a".into()),
///     &ScriptValue::Steps(vec!["b".into(), "c".into()]),
/// );
/// assert_eq!(merged, ScriptValue::Steps(vec!["a".into(), "b".into(), "c".into()]));
/// ```
pub fn chain(existing: &ScriptValue, incoming: &ScriptValue) -> ScriptValue {
    let steps = existing
        .to_steps()
        .into_iter()
        .chain(incoming.to_steps())
        .filter(|step| !step.is_empty())
        .collect();
    ScriptValue::Steps(steps)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ROOT_OWNER;

    fn single(cmd: &str) -> ScriptValue {
        ScriptValue::Single(cmd.to_string())
    }

    fn steps(cmds: &[&str]) -> ScriptValue {
        ScriptValue::Steps(cmds.iter().map(|c| c.to_string()).collect())
    }

    fn candidate(
        name: &str,
        package: &str,
        priority: i64,
        policy: CollisionPolicy,
        value: ScriptValue,
    ) -> Candidate {
        Candidate {
            name: name.to_string(),
            value,
            package: package.to_string(),
            priority,
            policy,
        }
    }

    fn root(entries: &[(&str, ScriptValue)]) -> ScriptTable {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_lower_priority_processed_first_and_kept() {
        let outcome = merge(
            &ScriptTable::new(),
            vec![
                candidate("lint", "p1", 50, CollisionPolicy::KeepRoot, single("p1-lint")),
                candidate("lint", "p2", 10, CollisionPolicy::KeepRoot, single("p2-lint")),
            ],
        );
        assert_eq!(outcome.scripts["lint"], single("p2-lint"));
        assert_eq!(outcome.provenance["lint"], Provenance::package("p2", 10));
        assert_eq!(
            outcome.decisions[1].resolution,
            Resolution::KeptExisting {
                owner: "p2".to_string()
            }
        );
    }

    #[test]
    fn test_chain_onto_root_keeps_root_ownership() {
        let outcome = merge(
            &root(&[("test", single("phpunit"))]),
            vec![candidate(
                "test",
                "p1",
                100,
                CollisionPolicy::Chain,
                single("extra-check"),
            )],
        );
        assert_eq!(outcome.scripts["test"], steps(&["phpunit", "extra-check"]));
        assert_eq!(outcome.provenance["test"], Provenance::root());
        assert_eq!(outcome.decisions[0].resolution, Resolution::ChainedOntoRoot);
    }

    #[test]
    fn test_root_entries_never_replaced() {
        let base = root(&[("build", single("make"))]);
        for policy in [CollisionPolicy::KeepRoot, CollisionPolicy::ReplaceNonRoot] {
            let outcome = merge(
                &base,
                vec![candidate("build", "p", -1000, policy, single("other"))],
            );
            assert_eq!(outcome.scripts["build"], single("make"));
            assert_eq!(outcome.provenance["build"].owner, ROOT_OWNER);
            assert_eq!(outcome.decisions[0].resolution, Resolution::KeptRoot);
        }
    }

    #[test]
    fn test_replace_nonroot_tie_keeps_first_sorted() {
        let tie = merge(
            &ScriptTable::new(),
            vec![
                candidate("build", "pkg-b", 100, CollisionPolicy::ReplaceNonRoot, single("b")),
                candidate("build", "pkg-a", 100, CollisionPolicy::ReplaceNonRoot, single("a")),
            ],
        );
        assert_eq!(tie.scripts["build"], single("a"));
        assert_eq!(tie.provenance["build"].owner, "pkg-a");
        assert_eq!(
            tie.decisions[1].resolution,
            Resolution::KeptExisting {
                owner: "pkg-a".to_string()
            }
        );
    }

    #[test]
    fn test_replace_nonroot_swaps_owner() {
        let mut scripts = ScriptTable::new();
        let mut provenance = IndexMap::new();
        scripts.insert("build".to_string(), single("old"));
        provenance.insert("build".to_string(), Provenance::package("slow/pkg", 50));

        let resolution = fold(
            &mut scripts,
            &mut provenance,
            &candidate("build", "fast/pkg", 10, CollisionPolicy::ReplaceNonRoot, single("new")),
        );
        assert_eq!(
            resolution,
            Resolution::Replaced {
                previous: "slow/pkg".to_string()
            }
        );
        assert_eq!(scripts["build"], single("new"));
        assert_eq!(provenance["build"], Provenance::package("fast/pkg", 10));

        let resolution = fold(
            &mut scripts,
            &mut provenance,
            &candidate("build", "same/pkg", 10, CollisionPolicy::ReplaceNonRoot, single("tie")),
        );
        assert_eq!(
            resolution,
            Resolution::KeptExisting {
                owner: "fast/pkg".to_string()
            }
        );
        assert_eq!(scripts["build"], single("new"));
    }

    #[test]
    fn test_chain_onto_package_keeps_owner() {
        let outcome = merge(
            &ScriptTable::new(),
            vec![
                candidate("qa", "a/first", 1, CollisionPolicy::KeepRoot, steps(&["x", "y"])),
                candidate("qa", "b/second", 2, CollisionPolicy::Chain, single("z")),
            ],
        );
        assert_eq!(outcome.scripts["qa"], steps(&["x", "y", "z"]));
        assert_eq!(outcome.provenance["qa"], Provenance::package("a/first", 1));
        assert_eq!(
            outcome.decisions[1].resolution,
            Resolution::ChainedOntoPackage {
                owner: "a/first".to_string()
            }
        );
    }

    #[test]
    fn test_tie_broken_by_package_name() {
        let outcome = merge(
            &ScriptTable::new(),
            vec![
                candidate("build", "pkg-b", 100, CollisionPolicy::KeepRoot, single("b")),
                candidate("build", "pkg-a", 100, CollisionPolicy::KeepRoot, single("a")),
            ],
        );
        assert_eq!(outcome.scripts["build"], single("a"));
        assert_eq!(outcome.provenance["build"].owner, "pkg-a");
    }

    #[test]
    fn test_merge_is_independent_of_candidate_order() {
        let candidates = vec![
            candidate("lint", "z/pkg", 5, CollisionPolicy::Chain, single("z")),
            candidate("lint", "a/pkg", 5, CollisionPolicy::KeepRoot, single("a")),
            candidate("test", "m/pkg", 1, CollisionPolicy::ReplaceNonRoot, single("m")),
            candidate("test", "b/pkg", 0, CollisionPolicy::KeepRoot, single("b")),
            candidate("fmt", "c/pkg", 100, CollisionPolicy::KeepRoot, single("c")),
        ];
        let base = root(&[("fmt", single("root-fmt"))]);
        let forward = merge(&base, candidates.clone());
        let mut reversed = candidates;
        reversed.reverse();
        let backward = merge(&base, reversed);

        assert_eq!(forward, backward);
        assert_eq!(
            serde_json::to_string(&forward).unwrap(),
            serde_json::to_string(&backward).unwrap()
        );
        let order: Vec<&str> = forward.scripts.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["fmt", "test", "lint"]);
    }

    #[test]
    fn test_reserved_root_names_always_kept() {
        let reserved = vec!["weird".to_string()];
        let outcome = merge_with_reserved(
            &root(&[("test", single("phpunit"))]),
            &reserved,
            vec![
                candidate("weird", "a/one", 1, CollisionPolicy::Chain, single("x")),
                candidate("weird", "b/two", 2, CollisionPolicy::ReplaceNonRoot, single("y")),
                candidate("weird", "c/three", 3, CollisionPolicy::KeepRoot, single("z")),
            ],
        );

        assert_eq!(outcome.scripts, root(&[("test", single("phpunit"))]));
        assert_eq!(outcome.provenance["weird"], Provenance::root());
        assert!(
            outcome
                .decisions
                .iter()
                .all(|d| d.resolution == Resolution::KeptRoot)
        );
        assert_eq!(outcome.applied_count(), 0);

        let (owner, decisions) = outcome.explain("weird").unwrap();
        assert_eq!(owner.owner, ROOT_OWNER);
        assert_eq!(decisions.len(), 3);
    }

    #[test]
    fn test_root_order_preserved() {
        let base = root(&[("zz", single("1")), ("aa", single("2"))]);
        let outcome = merge(
            &base,
            vec![candidate("mm", "p", 1, CollisionPolicy::KeepRoot, single("3"))],
        );
        let order: Vec<&str> = outcome.scripts.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["zz", "aa", "mm"]);
        assert_eq!(outcome.provenance.len(), outcome.scripts.len());
    }

    #[test]
    fn test_chain_flattens_and_drops_empty_steps() {
        let merged = chain(&steps(&["a", "", "b"]), &steps(&["", "c"]));
        assert_eq!(merged, steps(&["a", "b", "c"]));
        assert_eq!(chain(&single("a"), &single("b")), steps(&["a", "b"]));
    }

    #[test]
    fn test_chaining_twice_grows() {
        let base = root(&[("test", single("phpunit"))]);
        let candidates = vec![candidate("test", "p", 1, CollisionPolicy::Chain, single("x"))];
        let once = merge(&base, candidates.clone());
        let twice = merge(&once.scripts, candidates);
        assert_eq!(twice.scripts["test"], steps(&["phpunit", "x", "x"]));
    }

    #[test]
    fn test_explain() {
        let outcome = merge(
            &root(&[("test", single("phpunit"))]),
            vec![
                candidate("test", "p1", 1, CollisionPolicy::KeepRoot, single("a")),
                candidate("lint", "p2", 1, CollisionPolicy::KeepRoot, single("b")),
            ],
        );
        let (provenance, decisions) = outcome.explain("test").unwrap();
        assert!(provenance.is_root);
        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].resolution, Resolution::KeptRoot);
        assert!(outcome.explain("missing").is_none());
        assert_eq!(outcome.applied_count(), 1);
    }

    #[test]
    fn test_resolution_serializes_tagged() {
        let json = serde_json::to_value(Resolution::Replaced {
            previous: "a/b".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "replaced", "previous": "a/b" }));
        let json = serde_json::to_value(Resolution::Inserted).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "inserted" }));
    }
}
