//! Output formatting for merged script tables and provenance reports.

use serde::Serialize;

use script_merge_core::{Decision, MergeOutcome, Provenance, ScriptValue};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

/// One row of a previewed script table.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptRow<'a> {
    pub script: &'a str,
    pub owner: &'a str,
    pub value: &'a ScriptValue,
}

/// Provenance and decision history for one script.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptExplanation<'a> {
    pub script: &'a str,
    /// `None` for root entries kept verbatim in the manifest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<&'a ScriptValue>,
    pub provenance: &'a Provenance,
    pub decisions: Vec<&'a Decision>,
}

/// Everything `explain` prints.
#[derive(Debug, Clone, Serialize)]
pub struct Explanation<'a> {
    pub scripts: Vec<ScriptExplanation<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejections: Vec<String>,
}

/// Rows of the final table, in table order.
pub fn script_rows(outcome: &MergeOutcome) -> Vec<ScriptRow<'_>> {
    outcome
        .scripts
        .iter()
        .map(|(name, value)| ScriptRow {
            script: name,
            owner: outcome
                .provenance
                .get(name)
                .map(|p| p.owner.as_str())
                .unwrap_or("?"),
            value,
        })
        .collect()
}

/// Explanation for `script`, or for every script when `None`.
///
/// Returns `None` if a named script has no owner in the outcome.
pub fn explain<'a>(
    outcome: &'a MergeOutcome,
    script: Option<&str>,
) -> Option<Vec<ScriptExplanation<'a>>> {
    let names: Vec<&String> = match script {
        Some(name) => vec![outcome.provenance.get_key_value(name)?.0],
        None => outcome.provenance.keys().collect(),
    };

    names
        .into_iter()
        .map(|name| {
            let (provenance, decisions) = outcome.explain(name)?;
            Some(ScriptExplanation {
                script: name,
                value: outcome.scripts.get(name.as_str()),
                provenance,
                decisions,
            })
        })
        .collect()
}

/// Formats the previewed script table.
pub fn format_scripts(rows: &[ScriptRow<'_>], format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(rows).map_err(|e| format!("JSON serialization failed: {e}"))
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(rows).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(scripts_to_table(rows)),
    }
}

/// Formats a provenance report.
pub fn format_explanation(
    explanation: &Explanation<'_>,
    format: OutputFormat,
) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(explanation)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(explanation).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(explanation_to_table(explanation)),
    }
}

fn scripts_to_table(rows: &[ScriptRow<'_>]) -> String {
    if rows.is_empty() {
        return "No scripts.\n".to_string();
    }

    let name_width = rows.iter().map(|r| r.script.len()).max().unwrap_or(0).max(6);
    let owner_width = rows.iter().map(|r| r.owner.len()).max().unwrap_or(0).max(5);

    let mut out = String::new();
    out.push_str(&format!(
        "{:<name_width$}  {:<owner_width$}  COMMANDS\n",
        "SCRIPT", "OWNER"
    ));
    for row in rows {
        let steps = row.value.to_steps();
        for (i, step) in steps.iter().enumerate() {
            if i == 0 {
                out.push_str(&format!(
                    "{:<name_width$}  {:<owner_width$}  {step}\n",
                    row.script, row.owner
                ));
            } else {
                out.push_str(&format!("{:<name_width$}  {:<owner_width$}  {step}\n", "", ""));
            }
        }
    }
    out
}

fn explanation_to_table(explanation: &Explanation<'_>) -> String {
    let mut out = String::new();

    for entry in &explanation.scripts {
        let owner = if entry.provenance.is_root {
            "root project".to_string()
        } else {
            format!("{} (priority {})", entry.provenance.owner, entry.provenance.priority)
        };
        out.push_str(&format!("{}  owner: {owner}\n", entry.script));
        match entry.value {
            Some(value) => {
                for step in value.to_steps() {
                    out.push_str(&format!("  $ {step}\n"));
                }
            }
            None => out.push_str("  (kept verbatim)\n"),
        }
        for decision in &entry.decisions {
            out.push_str(&format!(
                "  - {} [{}, priority {}]: {}\n",
                decision.package, decision.policy, decision.priority, decision.resolution
            ));
        }
    }

    if !explanation.rejections.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("Skipped:\n");
        for rejection in &explanation.rejections {
            out.push_str(&format!("  {rejection}\n"));
        }
    }

    if out.is_empty() {
        out.push_str("No scripts.\n");
    }
    out
}
