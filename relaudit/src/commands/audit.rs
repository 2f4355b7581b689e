// relaudit/src/commands/audit.rs
//
// USE CASE: Run the audit and render the report.

use comfy_table::{Table, presets::UTF8_FULL};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

use relaudit_core::RelauditError;
use relaudit_core::application::{AuditOptions, run_audit};
use relaudit_core::domain::report::{AuditEntry, AuditReport};
use relaudit_core::infrastructure::fs::write_json_artifact;

use super::project;
use crate::cli::OutputFormat;

#[derive(Serialize)]
struct AuditArtifact<'a> {
    generated_at: String,
    project: &'a str,
    engine: &'a str,
    schema: &'a str,
    report: &'a AuditReport,
}

pub async fn execute(
    project_dir: PathBuf,
    format: OutputFormat,
    out: Option<PathBuf>,
    concurrency: Option<usize>,
    timeout_secs: Option<u64>,
) -> anyhow::Result<()> {
    let start = std::time::Instant::now();
    let banner = format == OutputFormat::Table;

    // A. Config + connection
    if banner {
        println!("⚙️  Loading configuration...");
    }
    let opened = project::open(&project_dir).await?;
    let engine = opened.connector.engine_name().to_string();
    if banner {
        println!("   Project: {} ({} / schema {})", opened.config.name, engine, opened.schema);
    }

    let request = match opened.config.to_request(&opened.schema) {
        Ok(request) => request,
        Err(e) => fail(RelauditError::Config(e)),
    };
    let options = AuditOptions {
        concurrency: concurrency.unwrap_or(opened.config.execution.concurrency),
        timeout: timeout_secs
            .or(opened.config.execution.timeout_secs)
            .map(Duration::from_secs),
    };

    // B. Audit
    let report = match run_audit(opened.connector.as_ref(), &request, &options).await {
        Ok(report) => report,
        Err(e) => fail(e),
    };

    // C. Output
    match format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Table => render(&report),
    }

    if let Some(out) = out {
        let artifact = AuditArtifact {
            generated_at: chrono::Utc::now().to_rfc3339(),
            project: &opened.config.name,
            engine: &engine,
            schema: &opened.schema,
            report: &report,
        };
        write_json_artifact(&out, &artifact)?;
        if banner {
            println!("📄 Report saved to {}", out.display());
        }
    }

    if report.pass {
        if banner {
            println!("\n✨ AUDIT PASSED in {:.2?}", start.elapsed());
        }
    } else {
        eprintln!(
            "\n❌ AUDIT FAILED: {} check(s) failed ({} could not run).",
            report.failed_count(),
            report.error_count()
        );
        std::process::exit(1);
    }
    Ok(())
}

fn fail(err: RelauditError) -> ! {
    eprintln!("{:?}", miette::Report::new(err));
    std::process::exit(1);
}

fn render(report: &AuditReport) {
    let mut checks = Table::new();
    checks.load_preset(UTF8_FULL);
    checks.set_header(vec!["Kind", "Check", "Result", "Detail"]);
    for entry in &report.entries {
        checks.add_row(entry_row(entry));
    }
    println!("\n🔎 Checks");
    println!("{checks}");

    let mut tables = Table::new();
    tables.load_preset(UTF8_FULL);
    tables.set_header(vec!["Table", "RI", "Normalized"]);
    for summary in &report.tables {
        tables.add_row(vec![
            summary.table.to_string(),
            summary.referential_integrity.to_string(),
            summary.normalized.to_string(),
        ]);
    }
    println!("\n📊 Tables");
    println!("{tables}");

    let findings: Vec<&String> = report.tables.iter().flat_map(|t| &t.findings).collect();
    if !findings.is_empty() {
        println!("\n⚠️  Findings:");
        for finding in findings {
            println!("   ❌ {}", finding);
        }
    }
}

fn entry_row(entry: &AuditEntry) -> Vec<String> {
    match entry {
        AuditEntry::Integrity(r) => {
            let (status, detail) = match &r.error {
                Some(err) => ("ERROR", err.to_string()),
                None if r.violation_count == 0 => (
                    "PASS",
                    format!("{} of {} reference(s) matched", r.matched_rows, r.non_null_child_rows),
                ),
                None => (
                    "FAIL",
                    format!(
                        "{} orphan(s) among {} reference(s)",
                        r.violation_count, r.non_null_child_rows
                    ),
                ),
            };
            vec![
                format!("integrity ({:?})", r.edge.origin).to_lowercase(),
                r.edge.to_string(),
                status.to_string(),
                detail,
            ]
        }
        AuditEntry::Dependency(r) => {
            let status = match (&r.error, r.holds) {
                (Some(_), _) => "ERROR",
                (None, true) => "HOLDS",
                (None, false) => "BREAKS",
            };
            let detail = match &r.error {
                Some(err) => err.to_string(),
                None => {
                    let mut detail = format!(
                        "{} determinant value(s), {} pair(s)",
                        r.distinct_determinant_count, r.distinct_pair_count
                    );
                    if r.trivial {
                        detail.push_str(", empty table");
                    }
                    if r.candidate_key {
                        detail.push_str(", candidate key");
                    }
                    detail
                }
            };
            vec![
                "dependency".to_string(),
                r.candidate.to_string(),
                status.to_string(),
                detail,
            ]
        }
    }
}
