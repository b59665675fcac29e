//! One-shot merge orchestration.
//!
//! The [`Orchestrator`] reads the manager configuration from the root
//! project, collects candidates from the installed packages, merges them, and
//! writes the result back with a single [`RootProject::set_scripts`] call.
//! It runs at most once per instance, and only for install and update
//! events.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use tracing::{debug, info};

use crate::{
    Collection, ManagerConfig, MergeOutcome, Package, Rejection, ScriptTable, collect,
    merge_with_reserved,
};

/// The root project whose script table receives the merged scripts.
pub trait RootProject {
    /// Package name of the root project.
    fn name(&self) -> &str;
    /// The root's `extra` metadata block.
    fn extra(&self) -> &Value;
    /// Current script table.
    fn scripts(&self) -> ScriptTable;
    /// Root script names whose values are kept outside [`scripts`](Self::scripts)
    /// and written back untouched. Packages can never take these names.
    fn reserved_names(&self) -> Vec<String> {
        Vec::new()
    }
    /// Replaces the script table.
    fn set_scripts(&mut self, scripts: ScriptTable);
}

/// Enumerates installed packages.
pub trait PackageRepository {
    fn packages(&self) -> Vec<Package>;
}

impl PackageRepository for Vec<Package> {
    fn packages(&self) -> Vec<Package> {
        self.clone()
    }
}

/// Line-oriented output for verbose diagnostics.
pub trait LineSink {
    fn write_line(&mut self, line: &str);
}

impl LineSink for Vec<String> {
    fn write_line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Forwards diagnostic lines to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LineSink for TracingSink {
    fn write_line(&mut self, line: &str) {
        info!(target: "script_merge", "{line}");
    }
}

/// Lifecycle event reported by the dependency manager.
///
/// Only [`PostInstall`](TriggerEvent::PostInstall) and
/// [`PostUpdate`](TriggerEvent::PostUpdate) trigger a merge.
///
/// # Examples
///
/// ```
/// use script_merge_core::TriggerEvent;
///
/// let event: TriggerEvent = "post-update-cmd".parse().unwrap();
/// assert!(event.triggers_merge());
/// assert!(!TriggerEvent::PreInstall.triggers_merge());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
    PreInstall,
    PostInstall,
    PreUpdate,
    PostUpdate,
    PostAutoloadDump,
}

impl TriggerEvent {
    /// Whether this event runs the merge.
    pub fn triggers_merge(self) -> bool {
        matches!(self, Self::PostInstall | Self::PostUpdate)
    }

    /// Event name as the dependency manager spells it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PreInstall => "pre-install-cmd",
            Self::PostInstall => "post-install-cmd",
            Self::PreUpdate => "pre-update-cmd",
            Self::PostUpdate => "post-update-cmd",
            Self::PostAutoloadDump => "post-autoload-dump",
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-install-cmd" => Ok(Self::PreInstall),
            "post-install-cmd" => Ok(Self::PostInstall),
            "pre-update-cmd" => Ok(Self::PreUpdate),
            "post-update-cmd" => Ok(Self::PostUpdate),
            "post-autoload-dump" => Ok(Self::PostAutoloadDump),
            other => Err(format!("unknown event: {other}")),
        }
    }
}

/// Everything one merge pass produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    /// Manager configuration the pass ran with.
    pub config: ManagerConfig,
    /// Final table, provenance and per-candidate decisions.
    pub outcome: MergeOutcome,
    /// Packages and entries left out.
    pub rejections: Vec<Rejection>,
}

/// Runs collection and merging without touching the root project.
pub fn plan<R, P>(root: &R, repository: &P) -> MergeReport
where
    R: RootProject + ?Sized,
    P: PackageRepository + ?Sized,
{
    let config = ManagerConfig::from_extra(root.extra());
    let packages = repository.packages();
    let Collection {
        candidates,
        rejections,
    } = collect(root.name(), &packages, &config);
    debug!(
        packages = packages.len(),
        candidates = candidates.len(),
        rejections = rejections.len(),
        "Collected script candidates"
    );
    let outcome = merge_with_reserved(&root.scripts(), &root.reserved_names(), candidates);

    MergeReport {
        config,
        outcome,
        rejections,
    }
}

/// Runs the merge at most once per instance.
///
/// # Examples
///
/// ```
/// use serde_json::{Value, json};
/// use script_merge_core::*;
///
/// struct App { extra: Value, scripts: ScriptTable }
///
/// impl RootProject for App {
///     fn name(&self) -> &str { "my/app" }
///     fn extra(&self) -> &Value { &self.extra }
///     fn scripts(&self) -> ScriptTable { self.scripts.clone() }
///     fn set_scripts(&mut self, scripts: ScriptTable) { self.scripts = scripts; }
/// }
///
/// let mut app = App { extra: json!({}), scripts: ScriptTable::new() };
/// let packages = vec![Package::new(
///     "shared-scripts/qa",
///     json!({ "script-merge": { "scripts": { "lint": "phpcs" } } }),
/// )];
///
/// let mut orchestrator = Orchestrator::new();
/// let mut log: Vec<String> = Vec::new();
/// assert!(orchestrator.handle(TriggerEvent::PostInstall, &mut app, &packages, &mut log).is_some());
/// assert!(orchestrator.handle(TriggerEvent::PostUpdate, &mut app, &packages, &mut log).is_none());
/// assert_eq!(app.scripts["lint"], ScriptValue::Single("phpcs".into()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    has_run: bool,
    verbose: bool,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit diagnostics even when the root configuration does not ask for
    /// them.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Whether a merge pass has completed on this instance.
    pub fn has_run(&self) -> bool {
        self.has_run
    }

    /// Handles a lifecycle event.
    ///
    /// Returns the report of the pass, or `None` if the event does not
    /// trigger a merge or a pass already ran.
    pub fn handle<R, P, S>(
        &mut self,
        event: TriggerEvent,
        root: &mut R,
        repository: &P,
        sink: &mut S,
    ) -> Option<MergeReport>
    where
        R: RootProject + ?Sized,
        P: PackageRepository + ?Sized,
        S: LineSink + ?Sized,
    {
        if !event.triggers_merge() {
            debug!(%event, "Event does not trigger a script merge");
            return None;
        }
        if self.has_run {
            debug!(%event, "Script merge already ran in this process");
            return None;
        }

        let report = plan(&*root, repository);
        let verbose = self.verbose || report.config.verbose;

        if verbose {
            sink.write_line(&format!("script-merge: merging scripts ({event})"));
            for rejection in &report.rejections {
                sink.write_line(&format!("script-merge: {rejection}"));
            }
        }

        root.set_scripts(report.outcome.scripts.clone());
        self.has_run = true;

        info!(
            %event,
            scripts = report.outcome.scripts.len(),
            applied = report.outcome.applied_count(),
            rejected = report.rejections.len(),
            "Script merge complete"
        );
        if verbose {
            sink.write_line(&format!(
                "script-merge: done, {} contribution(s) applied, {} skipped",
                report.outcome.applied_count(),
                report.rejections.len()
            ));
        }

        Some(report)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ScriptValue;

    struct FakeRoot {
        name: String,
        extra: Value,
        scripts: ScriptTable,
        writes: usize,
    }

    impl FakeRoot {
        fn new(extra: Value) -> Self {
            Self {
                name: "my/app".to_string(),
                extra,
                scripts: ScriptTable::new(),
                writes: 0,
            }
        }
    }

    impl RootProject for FakeRoot {
        fn name(&self) -> &str {
            &self.name
        }

        fn extra(&self) -> &Value {
            &self.extra
        }

        fn scripts(&self) -> ScriptTable {
            self.scripts.clone()
        }

        fn set_scripts(&mut self, scripts: ScriptTable) {
            self.scripts = scripts;
            self.writes += 1;
        }
    }

    fn packages() -> Vec<Package> {
        vec![
            Package::new(
                "shared-scripts/qa",
                json!({ "script-merge": { "scripts": { "lint": "phpcs", "bad name": "x" } } }),
            ),
            Package::new("other/pkg", json!({ "script-merge": { "scripts": { "x": "y" } } })),
        ]
    }

    #[test]
    fn test_runs_only_once() {
        let mut root = FakeRoot::new(json!({}));
        let mut orchestrator = Orchestrator::new();
        let mut sink: Vec<String> = Vec::new();

        let report = orchestrator
            .handle(TriggerEvent::PostInstall, &mut root, &packages(), &mut sink)
            .unwrap();
        assert_eq!(report.outcome.scripts.len(), 1);
        assert!(orchestrator.has_run());

        assert!(
            orchestrator
                .handle(TriggerEvent::PostUpdate, &mut root, &packages(), &mut sink)
                .is_none()
        );
        assert_eq!(root.writes, 1);
    }

    #[test]
    fn test_second_trigger_does_not_chain_again() {
        let mut root = FakeRoot::new(json!({ "script-merge": { "default-collision": "chain" } }));
        root.scripts
            .insert("lint".to_string(), ScriptValue::Single("root".into()));
        let mut orchestrator = Orchestrator::new();
        let mut sink: Vec<String> = Vec::new();

        orchestrator.handle(TriggerEvent::PostInstall, &mut root, &packages(), &mut sink);
        orchestrator.handle(TriggerEvent::PostInstall, &mut root, &packages(), &mut sink);
        assert_eq!(
            root.scripts["lint"],
            ScriptValue::Steps(vec!["root".into(), "phpcs".into()])
        );
    }

    #[test]
    fn test_unrelated_events_ignored() {
        let mut root = FakeRoot::new(json!({}));
        let mut orchestrator = Orchestrator::new();
        let mut sink: Vec<String> = Vec::new();

        for event in [
            TriggerEvent::PreInstall,
            TriggerEvent::PreUpdate,
            TriggerEvent::PostAutoloadDump,
        ] {
            assert!(orchestrator.handle(event, &mut root, &packages(), &mut sink).is_none());
        }
        assert!(!orchestrator.has_run());
        assert_eq!(root.writes, 0);
        assert!(
            orchestrator
                .handle(TriggerEvent::PostUpdate, &mut root, &packages(), &mut sink)
                .is_some()
        );
    }

    #[test]
    fn test_quiet_by_default() {
        let mut root = FakeRoot::new(json!({}));
        let mut sink: Vec<String> = Vec::new();
        Orchestrator::new().handle(TriggerEvent::PostInstall, &mut root, &packages(), &mut sink);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_verbose_diagnostics() {
        let mut root = FakeRoot::new(json!({ "script-merge": { "verbose": true } }));
        let mut sink: Vec<String> = Vec::new();
        Orchestrator::new().handle(TriggerEvent::PostInstall, &mut root, &packages(), &mut sink);

        assert_eq!(
            sink,
            vec![
                "script-merge: merging scripts (post-install-cmd)".to_string(),
                "script-merge: package shared-scripts/qa: invalid script name \"bad name\""
                    .to_string(),
                "script-merge: package other/pkg is not allowed".to_string(),
                "script-merge: done, 1 contribution(s) applied, 2 skipped".to_string(),
            ]
        );
    }

    #[test]
    fn test_forced_verbose() {
        let mut root = FakeRoot::new(json!({}));
        let mut sink: Vec<String> = Vec::new();
        Orchestrator::new().with_verbose(true).handle(
            TriggerEvent::PostInstall,
            &mut root,
            &packages(),
            &mut sink,
        );
        assert_eq!(sink.len(), 4);
    }

    #[test]
    fn test_plan_leaves_root_untouched() {
        let root = FakeRoot::new(json!({}));
        let report = plan(&root, &packages());
        assert_eq!(report.outcome.scripts.len(), 1);
        assert!(root.scripts.is_empty());
        assert_eq!(root.writes, 0);
    }

    #[test]
    fn test_event_names_roundtrip() {
        for event in [
            TriggerEvent::PreInstall,
            TriggerEvent::PostInstall,
            TriggerEvent::PreUpdate,
            TriggerEvent::PostUpdate,
            TriggerEvent::PostAutoloadDump,
        ] {
            assert_eq!(event.as_str().parse::<TriggerEvent>(), Ok(event));
        }
        assert!("post-create-project-cmd".parse::<TriggerEvent>().is_err());
    }
}
