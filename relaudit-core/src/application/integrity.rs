// relaudit-core/src/application/integrity.rs

use tracing::{debug, warn};

use crate::application::engine::run_count;
use crate::domain::catalog::ForeignKeyEdge;
use crate::domain::error::QueryError;
use crate::domain::integrity::IntegrityResult;
use crate::domain::sql::queries;
use crate::error::RelauditError;
use crate::ports::connector::Connector;

pub struct IntegrityChecker;

impl IntegrityChecker {
    /// Counts child rows, child rows with a complete (non-NULL) reference,
    /// and those references that find a parent. Never fails: a query error
    /// ends up inside the result.
    pub async fn check(session: &dyn Connector, edge: &ForeignKeyEdge) -> IntegrityResult {
        let total_sql = queries::count_rows(&edge.child);
        let non_null_sql = queries::count_non_null(&edge.child, &edge.child_columns);
        let matched_sql = queries::count_matched(edge);

        let counts = async {
            let total = run_count(session, &total_sql).await?;
            let non_null = run_count(session, &non_null_sql).await?;
            let matched = run_count(session, &matched_sql).await?;
            Ok::<_, RelauditError>((total, non_null, matched))
        }
        .await;

        let sql = vec![total_sql, non_null_sql, matched_sql];
        match counts {
            Ok((total, non_null, matched)) => {
                let result = IntegrityResult::measured(edge.clone(), total, non_null, matched, sql);
                debug!(edge = %edge, violations = result.violation_count, "Integrity checked");
                result
            }
            Err(e) => {
                warn!(edge = %edge, error = %e, "Integrity check failed");
                IntegrityResult::failed(edge.clone(), QueryError::new(e.to_string()), sql)
            }
        }
    }
}
