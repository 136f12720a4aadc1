//! Reporting and export — JSON, CSV, and Markdown artifacts.
//!
//! - **JSON**: full round-trip serialization of training and sweep reports
//! - **CSV**: one row per ticker of a sweep
//! - **Markdown**: human-readable single-ticker and sweep summaries
//!
//! All persisted JSON carries a `schema_version` field. Newer versions than
//! this build understands are rejected on load.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::pipeline::{SweepReport, TrainingReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `TrainingReport` to pretty JSON.
pub fn export_training_json(report: &TrainingReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize TrainingReport to JSON")
}

/// Deserialize a `TrainingReport`, rejecting unknown schema versions.
pub fn import_training_json(json: &str) -> Result<TrainingReport> {
    let report: TrainingReport =
        serde_json::from_str(json).context("failed to deserialize TrainingReport from JSON")?;
    check_version(report.schema_version)?;
    Ok(report)
}

/// Serialize a `SweepReport` to pretty JSON.
pub fn export_sweep_json(report: &SweepReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SweepReport to JSON")
}

/// Deserialize a `SweepReport`, rejecting unknown schema versions.
pub fn import_sweep_json(json: &str) -> Result<SweepReport> {
    let report: SweepReport =
        serde_json::from_str(json).context("failed to deserialize SweepReport from JSON")?;
    check_version(report.schema_version)?;
    for entry in &report.reports {
        check_version(entry.schema_version)?;
    }
    Ok(report)
}

fn check_version(version: u32) -> Result<()> {
    if version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            version,
            SCHEMA_VERSION
        );
    }
    Ok(())
}

/// Write JSON text to `path`, creating parent directories.
pub fn write_json(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

// ─── CSV export ─────────────────────────────────────────────────────

/// One row per ticker: ticker, status, accuracy, row counts and spreads.
/// Failed tickers have empty numeric columns and the error text.
pub fn export_sweep_csv(report: &SweepReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "ticker",
        "status",
        "accuracy",
        "train_rows",
        "test_rows",
        "dropped_rows",
        "label_distribution",
        "predicted_distribution",
        "error",
    ])?;

    for r in &report.reports {
        let accuracy = format!("{:.6}", r.accuracy);
        let train_rows = r.train_rows.to_string();
        let test_rows = r.test_rows.to_string();
        let dropped_rows = r.dropped_rows.to_string();
        let labels = r.label_distribution.to_string();
        let predicted = r.predicted_distribution.to_string();
        let row: [&str; 9] = [
            &r.ticker,
            "trained",
            &accuracy,
            &train_rows,
            &test_rows,
            &dropped_rows,
            &labels,
            &predicted,
            "",
        ];
        wtr.write_record(row)?;
    }
    for f in &report.failures {
        let row: [&str; 9] = [&f.ticker, "failed", "", "", "", "", "", "", &f.error];
        wtr.write_record(row)?;
    }

    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output was not UTF-8")
}

// ─── Markdown reports ───────────────────────────────────────────────

/// Markdown summary of one training run.
pub fn generate_report(report: &TrainingReport) -> String {
    let mut md = String::with_capacity(1024);

    md.push_str(&format!("# Committee Report: {}\n\n", report.ticker));

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Run | {} |\n", short(&report.run_id)));
    md.push_str(&format!("| Dataset Hash | {} |\n", short(&report.dataset_hash)));
    md.push_str(&format!("| Config Hash | {} |\n", short(&report.config_hash)));
    md.push_str(&format!("| Seed | {} |\n", report.seed));
    md.push_str(&format!(
        "| Split | {} ({:.0}% test) |\n",
        report.split.name(),
        report.split.test_fraction() * 100.0
    ));
    if report.split.is_leaky() {
        md.push_str("| Warning | random split: test rows may precede training rows |\n");
    }
    md.push('\n');

    md.push_str("## Data\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Matrix Rows | {} |\n", report.matrix_rows));
    md.push_str(&format!("| Dropped Rows | {} |\n", report.dropped_rows));
    md.push_str(&format!(
        "| Train / Test | {} / {} |\n",
        report.train_rows, report.test_rows
    ));
    md.push_str(&format!("| Features | {} |\n", report.n_features));
    md.push_str(&format!("| Data Spread | {} |\n", report.label_distribution));
    md.push('\n');

    md.push_str("## Accuracy\n\n");
    md.push_str("| Model | Accuracy |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| committee | {:.4} |\n", report.accuracy));
    for m in &report.member_scores {
        md.push_str(&format!("| {} | {:.4} |\n", m.name, m.accuracy));
    }
    md.push('\n');
    md.push_str(&format!(
        "Predicted spread: {}\n",
        report.predicted_distribution
    ));

    md
}

/// Markdown summary of a sweep, tickers sorted by accuracy (best first).
pub fn generate_sweep_report(report: &SweepReport) -> String {
    let mut md = String::with_capacity(1024);

    md.push_str("# Sweep Report\n\n");
    md.push_str(&format!(
        "Trained {} of {} tickers (seed {}, dataset {}).\n\n",
        report.reports.len(),
        report.attempted(),
        report.seed,
        short(&report.dataset_hash)
    ));
    if let Some(mean) = report.mean_accuracy {
        md.push_str(&format!("Mean accuracy: **{mean:.4}**\n\n"));
    }

    let mut ranked: Vec<&TrainingReport> = report.reports.iter().collect();
    ranked.sort_by(|a, b| {
        b.accuracy
            .partial_cmp(&a.accuracy)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });

    if !ranked.is_empty() {
        md.push_str("| Ticker | Accuracy | Test Rows | Data Spread |\n");
        md.push_str("| --- | --- | --- | --- |\n");
        for r in ranked {
            md.push_str(&format!(
                "| {} | {:.4} | {} | {} |\n",
                r.ticker, r.accuracy, r.test_rows, r.label_distribution
            ));
        }
        md.push('\n');
    }

    if !report.failures.is_empty() {
        md.push_str("## Failures\n\n");
        for f in &report.failures {
            md.push_str(&format!("- `{}`: {}\n", f.ticker, f.error));
        }
    }

    md
}

// ─── Helpers ────────────────────────────────────────────────────────

fn short(hash: &str) -> &str {
    &hash[..hash.len().min(12)]
}
