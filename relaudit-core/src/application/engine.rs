// relaudit-core/src/application/engine.rs

use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::error::RelauditError;
use crate::ports::connector::Connector;

/// Runs one count query with timing logs. Every check query goes through here.
#[instrument(skip_all, fields(engine = session.engine_name(), query.len = query.len()))]
pub async fn run_count(session: &dyn Connector, query: &str) -> Result<u64, RelauditError> {
    let start = Instant::now();
    debug!("⚡ Executing Query: {}", query);

    let result = session.query_scalar(query).await;
    let duration = start.elapsed();

    match result {
        Ok(count) => {
            debug!("✅ Query finished in {:.2?} -> {}", duration, count);
            Ok(count)
        }
        Err(e) => {
            warn!("❌ Query failed after {:.2?}: {}", duration, e);
            Err(e)
        }
    }
}
