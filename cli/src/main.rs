mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use script_merge_core::{LineSink, MergeReport, Orchestrator, TriggerEvent, plan};
use script_merge_project::{INSTALLED_FILE, MANIFEST_FILE, Project};
use tracing::debug;

use output::{Explanation, OutputFormat};

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
    Table,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(fmt: CliOutputFormat) -> Self {
        match fmt {
            CliOutputFormat::Json => Self::Json,
            CliOutputFormat::Yaml => Self::Yaml,
            CliOutputFormat::Table => Self::Table,
        }
    }
}

/// Lifecycle events, spelled the way the dependency manager names them.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliEvent {
    PreInstallCmd,
    #[value(alias = "post-install")]
    PostInstallCmd,
    PreUpdateCmd,
    #[value(alias = "post-update")]
    PostUpdateCmd,
    PostAutoloadDump,
}

impl From<CliEvent> for TriggerEvent {
    fn from(event: CliEvent) -> Self {
        match event {
            CliEvent::PreInstallCmd => Self::PreInstall,
            CliEvent::PostInstallCmd => Self::PostInstall,
            CliEvent::PreUpdateCmd => Self::PreUpdate,
            CliEvent::PostUpdateCmd => Self::PostUpdate,
            CliEvent::PostAutoloadDump => Self::PostAutoloadDump,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "script-merge")]
#[command(about = "Merge package-contributed scripts into a root project manifest")]
#[command(version)]
struct Cli {
    /// Print merge diagnostics even if the project does not enable them.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Handle a lifecycle event and save the merged scripts.
    Run(RunArgs),
    /// Print the merged script table without saving it.
    Preview(PreviewArgs),
    /// Print which package owns each script and why.
    Explain(ExplainArgs),
}

#[derive(Debug, Args)]
struct ProjectArgs {
    /// Project directory.
    #[arg(long, default_value = ".")]
    dir: PathBuf,
    /// Manifest path (default: <dir>/composer.json).
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Installed package list (default: <dir>/vendor/composer/installed.json).
    #[arg(long)]
    installed: Option<PathBuf>,
}

impl ProjectArgs {
    fn open(&self) -> Result<Project, String> {
        let manifest = self
            .manifest
            .clone()
            .unwrap_or_else(|| self.dir.join(MANIFEST_FILE));
        let installed = self
            .installed
            .clone()
            .unwrap_or_else(|| self.dir.join(INSTALLED_FILE));
        debug!(
            manifest = %manifest.display(),
            installed = %installed.display(),
            "Opening project"
        );
        Project::open_with(&manifest, &installed)
            .map_err(|err| format!("Failed to open project '{}': {err}", manifest.display()))
    }
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Lifecycle event being handled.
    #[arg(long)]
    event: CliEvent,
    #[command(flatten)]
    project: ProjectArgs,
}

#[derive(Debug, Args)]
struct PreviewArgs {
    #[command(flatten)]
    project: ProjectArgs,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct ExplainArgs {
    /// Only explain this script.
    #[arg(long)]
    script: Option<String>,
    #[command(flatten)]
    project: ProjectArgs,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

/// Writes diagnostic lines to stderr, keeping stdout for command output.
struct StderrSink;

impl LineSink for StderrSink {
    fn write_line(&mut self, line: &str) {
        eprintln!("{line}");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run_event(args, cli.verbose),
        Command::Preview(args) => run_preview(args, cli.verbose),
        Command::Explain(args) => run_explain(args, cli.verbose),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_event(args: RunArgs, verbose: bool) -> Result<(), String> {
    let event = TriggerEvent::from(args.event);
    let mut project = args.project.open()?;

    let mut orchestrator = Orchestrator::new().with_verbose(verbose);
    debug!(%event, verbose, "Handling lifecycle event");
    let Some(report) = orchestrator.handle(
        event,
        &mut project.manifest,
        &project.packages,
        &mut StderrSink,
    ) else {
        println!("Event {event} does not trigger a script merge.");
        return Ok(());
    };

    project.save().map_err(|err| {
        format!(
            "Failed to write '{}': {err}",
            project.manifest_path.display()
        )
    })?;

    println!(
        "Merged {} contribution(s) into '{}' ({} script(s), {} skipped).",
        report.outcome.applied_count(),
        project.manifest_path.display(),
        report.outcome.scripts.len(),
        report.rejections.len()
    );
    Ok(())
}

fn run_preview(args: PreviewArgs, verbose: bool) -> Result<(), String> {
    let report = plan_project(&args.project, verbose)?;
    let rows = output::script_rows(&report.outcome);
    let raw = output::format_scripts(&rows, args.format.into())?;
    print_output(&raw);
    Ok(())
}

fn run_explain(args: ExplainArgs, verbose: bool) -> Result<(), String> {
    let report = plan_project(&args.project, verbose)?;
    let scripts = output::explain(&report.outcome, args.script.as_deref()).ok_or_else(|| {
        format!(
            "Script '{}' is not in the merged table",
            args.script.as_deref().unwrap_or_default()
        )
    })?;

    // Rejections are package-level context; a single-script view leaves them out.
    let rejections = if args.script.is_some() {
        Vec::new()
    } else {
        report.rejections.iter().map(ToString::to_string).collect()
    };

    let explanation = Explanation {
        scripts,
        rejections,
    };
    let raw = output::format_explanation(&explanation, args.format.into())?;
    print_output(&raw);
    Ok(())
}

fn plan_project(args: &ProjectArgs, verbose: bool) -> Result<MergeReport, String> {
    let project = args.open()?;
    let report = plan(&project.manifest, &project.packages);
    debug!(
        scripts = report.outcome.scripts.len(),
        decisions = report.outcome.decisions.len(),
        rejections = report.rejections.len(),
        "Planned script merge"
    );
    if verbose || report.config.verbose {
        let mut sink = StderrSink;
        for rejection in &report.rejections {
            sink.write_line(&format!("script-merge: {rejection}"));
        }
    }
    Ok(report)
}

fn print_output(raw: &str) {
    if raw.ends_with('\n') {
        print!("{raw}");
    } else {
        println!("{raw}");
    }
}
