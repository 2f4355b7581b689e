// relaudit-core/src/application/audit.rs

use futures::StreamExt;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{info, instrument, warn};

use crate::application::catalog_reader::CatalogReader;
use crate::application::integrity::IntegrityChecker;
use crate::application::normalization::NormalizationChecker;
use crate::domain::dependency::DependencyResult;
use crate::domain::error::QueryError;
use crate::domain::integrity::IntegrityResult;
use crate::domain::plan::{AuditPlan, AuditRequest, CheckTask};
use crate::domain::report::{AuditReport, CheckOutcome, ReportAggregator};
use crate::error::RelauditError;
use crate::ports::connector::Connector;

#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Upper bound on checks in flight, each on its own session.
    pub concurrency: usize,
    /// Run-level budget; checks still running when it expires report "timeout".
    pub timeout: Option<Duration>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout: None,
        }
    }
}

/// Reads the catalog, resolves the request into a plan and runs every check.
///
/// Only a failed catalog read (`CatalogUnavailable`) or an invalid request
/// (`Config`) fail the call. Everything else is recorded per check, and the
/// report lists results in request order whatever order they complete in.
#[instrument(skip_all, fields(engine = connector.engine_name(), schema = %request.schema))]
pub async fn run_audit(
    connector: &dyn Connector,
    request: &AuditRequest,
    options: &AuditOptions,
) -> Result<AuditReport, RelauditError> {
    let start = std::time::Instant::now();

    // 1. Catalog, with configured keys layered over the reported ones
    let catalog = CatalogReader::read(connector, &request.schema, &request.catalog)
        .await?
        .with_primary_keys(&request.primary_keys)
        .map_err(RelauditError::Config)?;

    // 2. Plan (fails before any check query runs)
    let plan = AuditPlan::resolve(&catalog, request).map_err(RelauditError::Config)?;
    let tasks = plan.tasks();
    info!(
        "📝 Audit plan: {} edge(s), {} dependency candidate(s), {} sweep check(s)",
        plan.edges.len(),
        plan.dependencies.len(),
        tasks.len() - plan.edges.len() - plan.dependencies.len()
    );

    // 3. Bounded worker pool
    let deadline = options.timeout.map(|t| Instant::now() + t);
    let outcomes: Vec<(usize, CheckOutcome)> = futures::stream::iter(tasks.iter().enumerate())
        .map(|(idx, task)| async move { (idx, run_task(connector, task, deadline).await) })
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    // 4. Aggregate in request order
    let report = ReportAggregator::aggregate(&plan, outcomes);
    info!(
        "🏁 Audit finished in {:.2?}: {} check(s), {} failed, {} error(s)",
        start.elapsed(),
        report.entries.len(),
        report.failed_count(),
        report.error_count()
    );
    Ok(report)
}

async fn run_task(connector: &dyn Connector, task: &CheckTask, deadline: Option<Instant>) -> CheckOutcome {
    let work = async {
        match connector.open_session().await {
            Ok(session) => execute_task(session.as_ref(), task).await,
            Err(e) => {
                warn!(error = %e, "Cannot open session");
                failed_outcome(task, QueryError::new(format!("cannot open session: {}", e)))
            }
        }
    };

    let Some(deadline) = deadline else {
        return work.await;
    };
    match timeout_at(deadline, work).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(task = ?task, "⏱️  Check timed out");
            failed_outcome(task, QueryError::timeout())
        }
    }
}

async fn execute_task(session: &dyn Connector, task: &CheckTask) -> CheckOutcome {
    match task {
        CheckTask::Integrity(edge) => CheckOutcome::Integrity(IntegrityChecker::check(session, edge).await),
        CheckTask::Dependency(candidate) => {
            CheckOutcome::Dependency(NormalizationChecker::check(session, candidate).await)
        }
        CheckTask::Sweep { sweep, candidate } => CheckOutcome::Sweep {
            sweep: *sweep,
            result: NormalizationChecker::check(session, candidate).await,
        },
    }
}

fn failed_outcome(task: &CheckTask, error: QueryError) -> CheckOutcome {
    match task {
        CheckTask::Integrity(edge) => {
            CheckOutcome::Integrity(IntegrityResult::failed(edge.clone(), error, Vec::new()))
        }
        CheckTask::Dependency(candidate) => {
            CheckOutcome::Dependency(DependencyResult::failed(candidate.clone(), error, Vec::new()))
        }
        CheckTask::Sweep { sweep, candidate } => CheckOutcome::Sweep {
            sweep: *sweep,
            result: DependencyResult::failed(candidate.clone(), error, Vec::new()),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::test_support::{FlakyConnector, campus, edge, fd};
    use crate::domain::catalog::TableRef;
    use crate::domain::dependency::NullPolicy;
    use crate::domain::plan::{CatalogOptions, COMPOSITE_KEY_SKIP};
    use crate::domain::report::{AuditEntry, Verdict};
    use crate::infrastructure::adapters::DataFusionConnector;
    use anyhow::Result;

    fn request() -> AuditRequest {
        AuditRequest {
            schema: "main".into(),
            catalog: CatalogOptions::default(),
            edges: vec![
                edge("enrollments", &["sid"], "students", &["sid"]),
                edge("enrollments", &["cid", "term"], "courses", &["cid", "term"]),
            ],
            dependencies: vec![
                fd("payments", &["customer_id"], &["customer_name"]),
                fd("payments", &["customer_name"], &["discount"]),
                fd("empty_log", &["id"], &["msg"]),
                fd("payments", &["coupon"], &["discount"]).with_null_policy(NullPolicy::Include),
            ],
            normalization: vec![
                TableRef::new("main", "students"),
                TableRef::new("main", "courses"),
            ],
            primary_keys: Vec::new(),
        }
    }

    fn summary<'a>(report: &'a AuditReport, table: &str) -> &'a crate::domain::report::TableSummary {
        report
            .tables
            .iter()
            .find(|t| t.table.name == table)
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_audit() -> Result<()> {
        let db = campus().await?;
        let report = run_audit(&db, &request(), &AuditOptions::default()).await?;

        assert_eq!(report.entries.len(), 6);
        let violations: Vec<u64> = report.integrity_results().map(|r| r.violation_count).collect();
        assert_eq!(violations, vec![1, 1]);

        let holds: Vec<bool> = report.dependency_results().map(|r| r.holds).collect();
        assert_eq!(holds, vec![true, false, true, false]);
        assert!(report.dependency_results().nth(2).unwrap().trivial);

        assert!(!report.pass);
        assert_eq!(summary(&report, "enrollments").referential_integrity, Verdict::No);
        assert_eq!(summary(&report, "students").referential_integrity, Verdict::Yes);
        assert_eq!(summary(&report, "students").normalized, Verdict::No);
        assert_eq!(
            summary(&report, "courses").normalized,
            Verdict::Skipped(COMPOSITE_KEY_SKIP.to_string())
        );
        assert_eq!(summary(&report, "payments").normalized, Verdict::NotChecked);
        Ok(())
    }

    #[tokio::test]
    async fn test_clean_audit_passes() -> Result<()> {
        let db = campus().await?;
        let request = AuditRequest {
            schema: "main".into(),
            dependencies: vec![fd("payments", &["customer_id"], &["customer_name"])],
            ..Default::default()
        };
        let report = run_audit(&db, &request, &AuditOptions::default()).await?;
        assert!(report.pass);
        assert!(report.tables.iter().all(|t| t.referential_integrity == Verdict::Yes));
        Ok(())
    }

    #[tokio::test]
    async fn test_report_order_and_content_do_not_depend_on_concurrency() -> Result<()> {
        let db = campus().await?;
        let serial = AuditOptions {
            concurrency: 1,
            timeout: None,
        };
        let parallel = AuditOptions {
            concurrency: 16,
            timeout: None,
        };
        let first = run_audit(&db, &request(), &serial).await?;
        let second = run_audit(&db, &request(), &parallel).await?;
        let third = run_audit(&db, &request(), &parallel).await?;
        assert_eq!(first, second);
        assert_eq!(second, third);
        Ok(())
    }

    #[tokio::test]
    async fn test_one_failing_check_does_not_stop_the_others() -> Result<()> {
        let db = FlakyConnector::new(campus().await?).fail_on("courses");
        let report = run_audit(&db, &request(), &AuditOptions::default()).await?;

        let results: Vec<_> = report.integrity_results().collect();
        assert_eq!(results[0].violation_count, 1);
        assert_eq!(results[0].error, None);
        assert!(results[1].error.is_some());
        assert!(!results[1].passed());
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.entries.len(), 6);
        Ok(())
    }

    #[tokio::test]
    async fn test_timeout_marks_pending_checks() -> Result<()> {
        let db = FlakyConnector::new(campus().await?).stall_on("payments", Duration::from_secs(30));
        let options = AuditOptions {
            concurrency: 8,
            timeout: Some(Duration::from_secs(2)),
        };
        let report = run_audit(&db, &request(), &options).await?;

        for r in report.dependency_results() {
            if r.candidate.table.name == "payments" {
                assert!(r.error.as_ref().unwrap().is_timeout(), "{:?}", r);
            } else {
                assert_eq!(r.error, None);
            }
        }
        assert!(report.integrity_results().all(|r| r.error.is_none()));
        assert_eq!(report.entries.len(), 6);
        Ok(())
    }

    #[tokio::test]
    async fn test_timeout_interrupts_running_duckdb_statements() -> Result<()> {
        // Without an interrupt the abandoned statements would keep their worker
        // threads busy and block runtime shutdown at the end of this test.
        let db = FlakyConnector::new(campus().await?).heavy_on("payments");
        let options = AuditOptions {
            concurrency: 8,
            timeout: Some(Duration::from_millis(500)),
        };

        let started = std::time::Instant::now();
        let report = run_audit(&db, &request(), &options).await?;
        assert!(started.elapsed() < Duration::from_secs(5), "{:?}", started.elapsed());

        let timed_out = report
            .dependency_results()
            .filter(|r| r.error.as_ref().is_some_and(|e| e.is_timeout()))
            .count();
        assert_eq!(timed_out, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_unavailable_catalog_is_fatal() -> Result<()> {
        let db = FlakyConnector::new(campus().await?).broken_catalog();
        let result = run_audit(&db, &request(), &AuditOptions::default()).await;
        assert!(matches!(result, Err(RelauditError::CatalogUnavailable(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_any_query() -> Result<()> {
        let db = FlakyConnector::new(campus().await?);
        let queries = std::sync::Arc::clone(&db.queries);
        let mut bad = request();
        bad.dependencies.push(fd("payments", &["no_such_column"], &["discount"]));

        let result = run_audit(&db, &bad, &AuditOptions::default()).await;
        assert!(matches!(result, Err(RelauditError::Config(_))));
        assert!(queries.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_inferred_edges_are_checked() -> Result<()> {
        let db = campus().await?;
        let request = AuditRequest {
            schema: "main".into(),
            catalog: CatalogOptions {
                include_declared: true,
                infer_edges: true,
            },
            ..Default::default()
        };
        let report = run_audit(&db, &request, &AuditOptions::default()).await?;

        let inferred: Vec<String> = report.integrity_results().map(|r| r.edge.to_string()).collect();
        assert_eq!(inferred, vec!["main.enrollments(sid) -> main.students(sid)"]);
        assert!(matches!(&report.entries[0], AuditEntry::Integrity(r) if r.violation_count == 1));
        Ok(())
    }

    #[tokio::test]
    async fn test_configured_keys_enable_inference_and_sweep_on_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(
            dir.path().join("students.csv"),
            "sid,name,advisor,office\n1,Ada,Turing,B12\n2,Alan,Turing,B12\n3,Grace,Hopper,C7\n",
        )?;
        std::fs::write(dir.path().join("enrollments.csv"), "sid,cid\n1,10\n2,11\n4,10\n")?;
        let db = DataFusionConnector::from_data_dir(dir.path()).await?;

        let students = TableRef::new("public", "students");
        let request = AuditRequest {
            schema: "public".into(),
            catalog: CatalogOptions {
                include_declared: true,
                infer_edges: true,
            },
            normalization: vec![students.clone()],
            primary_keys: vec![(students, vec!["sid".into()])],
            ..Default::default()
        };
        let report = run_audit(&db, &request, &AuditOptions::default()).await?;

        let edges: Vec<String> = report.integrity_results().map(|r| r.edge.to_string()).collect();
        assert_eq!(edges, vec!["public.enrollments(sid) -> public.students(sid)"]);
        assert_eq!(report.integrity_results().next().unwrap().violation_count, 1);

        let students = summary(&report, "students");
        assert_eq!(students.normalized, Verdict::No);
        assert!(
            students
                .findings
                .iter()
                .any(|f| f.contains("{advisor} -> {office}")),
            "{:?}",
            students.findings
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_configured_key_on_unknown_column_is_a_config_error() -> Result<()> {
        let db = FlakyConnector::new(campus().await?);
        let queries = std::sync::Arc::clone(&db.queries);
        let mut bad = request();
        bad.primary_keys = vec![(TableRef::new("main", "payments"), vec!["nope".into()])];

        let result = run_audit(&db, &bad, &AuditOptions::default()).await;
        assert!(matches!(result, Err(RelauditError::Config(_))));
        assert!(queries.lock().unwrap().is_empty());
        Ok(())
    }
}
