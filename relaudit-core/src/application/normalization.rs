// relaudit-core/src/application/normalization.rs

use tracing::{debug, warn};

use crate::application::engine::run_count;
use crate::domain::dependency::{DependencyCandidate, DependencyResult};
use crate::domain::error::QueryError;
use crate::domain::sql::queries;
use crate::error::RelauditError;
use crate::ports::connector::Connector;

pub struct NormalizationChecker;

impl NormalizationChecker {
    /// `D -> A` holds iff each distinct `D` value pairs with exactly one `A`
    /// value: the distinct counts of `D` and of `(D, A)` are equal.
    pub async fn check(session: &dyn Connector, candidate: &DependencyCandidate) -> DependencyResult {
        let q = queries::dependency_queries(candidate);
        let mut sql = vec![q.total_rows.clone()];
        sql.extend(q.determinant_rows.clone());
        sql.push(q.distinct_determinants.clone());
        sql.push(q.distinct_pairs.clone());

        let counts = async {
            let total = run_count(session, &q.total_rows).await?;
            let determinant_rows = match &q.determinant_rows {
                Some(query) => run_count(session, query).await?,
                None => total,
            };
            let determinants = run_count(session, &q.distinct_determinants).await?;
            let pairs = run_count(session, &q.distinct_pairs).await?;
            Ok::<_, RelauditError>((total, determinant_rows, determinants, pairs))
        }
        .await;

        match counts {
            Ok((total, determinant_rows, determinants, pairs)) => {
                let result = DependencyResult::measured(
                    candidate.clone(),
                    total,
                    determinant_rows,
                    determinants,
                    pairs,
                    sql,
                );
                debug!(candidate = %candidate, holds = result.holds, "Dependency checked");
                result
            }
            Err(e) => {
                warn!(candidate = %candidate, error = %e, "Dependency check failed");
                DependencyResult::failed(candidate.clone(), QueryError::new(e.to_string()), sql)
            }
        }
    }
}
