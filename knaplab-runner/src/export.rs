//! Export: JSON, plain text, CSV, and on-disk artifact bundles.
//!
//! - **JSON**: the [`InstanceReport`] record
//! - **Text**: `#` metadata comments, then a `weight,value` table
//! - **CSV**: `id,weight,value` item table for external tools

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use knaplab_core::domain::{number, Item};

use crate::report::InstanceReport;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &InstanceReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize InstanceReport to JSON")
}

pub fn export_batch_json(reports: &[InstanceReport]) -> Result<String> {
    serde_json::to_string_pretty(reports).context("failed to serialize batch to JSON")
}

// ─── Text export ────────────────────────────────────────────────────

/// Plain-text block for one instance.
pub fn export_text(report: &InstanceReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_text(&mut out, report);
    out
}

/// Text blocks for a batch, separated by a blank line.
pub fn export_batch_text(reports: &[InstanceReport]) -> String {
    reports
        .iter()
        .map(export_text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn write_text(out: &mut String, report: &InstanceReport) -> std::fmt::Result {
    writeln!(out, "# problem: {}", report.problem)?;
    writeln!(out, "# seed: {}", report.seed)?;
    if report.seed != report.seed_requested {
        writeln!(out, "# seed requested: {}", report.seed_requested)?;
    }
    for ((key, budget), opt) in report
        .budget_keys()
        .iter()
        .zip(&report.budgets)
        .zip(&report.optimals)
    {
        writeln!(
            out,
            "# budget{key}: {budget} | optimal count {}, value {} | sahni_k {} | greedy {:.1}%",
            opt.count,
            number::format(opt.value),
            opt.sahni_k,
            opt.greedy_ratio * 100.0
        )?;
    }
    if let (Some(feasible), Some(n90)) = (report.feasible_count, report.n90) {
        writeln!(out, "# feasible: {feasible}, n90: {n90}")?;
    }
    if let Some(warning) = &report.warning {
        writeln!(out, "# warning: {warning}")?;
    }
    writeln!(out, "weight,value")?;
    for item in &report.items {
        writeln!(out, "{},{}", number::format(item.weight), number::format(item.value))?;
    }
    Ok(())
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Items as CSV with `id,weight,value` columns.
pub fn export_items_csv(items: &[Item]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["id", "weight", "value"])?;
    for item in items {
        wtr.write_record([
            &item.id.to_string(),
            &number::format(item.weight),
            &number::format(item.value),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one instance.
///
/// Creates `{label}_{timestamp}/` under `output_dir` containing
/// `instance.json`, `instance.txt` and `items.csv`. Returns the directory.
pub fn save_artifacts(report: &InstanceReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        sanitize(&report.problem),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    write_file(&run_dir.join("instance.json"), &json)?;
    write_file(&run_dir.join("instance.txt"), &export_text(report))?;
    write_file(&run_dir.join("items.csv"), &export_items_csv(&report.items)?)?;

    Ok(run_dir)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

/// Keep labels usable as directory names.
fn sanitize(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "instance".to_string()
    } else {
        cleaned
    }
}
