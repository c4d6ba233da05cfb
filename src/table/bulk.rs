use std::collections::HashSet;
use std::future::Future;

use serde::Serialize;

use crate::error::AppError;

/// The row on which a bulk action stopped.
#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
    pub id: i64,
    pub error: String,
}

/// Result of running an action over selected rows.
#[derive(Debug, Clone, Serialize)]
pub struct BulkOutcome {
    /// Distinct ids asked for.
    pub requested: usize,
    /// Ids processed before any failure, in order. These stay done.
    pub completed: Vec<i64>,
    pub failed: Option<BulkFailure>,
    /// The table's selection once the action is over: always empty.
    pub selected: Vec<i64>,
}

impl BulkOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed.is_none()
    }
}

/// `ids` without repeats, first occurrence kept.
fn unique_in_order(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Runs `action` over `ids` one at a time, stopping at the first failure.
///
/// A repeated id is acted on once. Earlier successes are not undone. A
/// forced sign-out is not a per-row failure and is returned as an error
/// instead.
pub async fn run_sequential<F, Fut>(ids: &[i64], mut action: F) -> Result<BulkOutcome, AppError>
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<(), AppError>>,
{
    let ids = unique_in_order(ids);
    let mut completed = Vec::with_capacity(ids.len());

    for &id in &ids {
        match action(id).await {
            Ok(()) => completed.push(id),
            Err(AppError::SessionExpired) => return Err(AppError::SessionExpired),
            Err(e) => {
                tracing::warn!("❌ Bulk action stopped at row {}: {}", id, e);
                return Ok(BulkOutcome {
                    requested: ids.len(),
                    completed,
                    failed: Some(BulkFailure {
                        id,
                        error: e.user_message().unwrap_or("Action failed").to_string(),
                    }),
                    selected: Vec::new(),
                });
            }
        }
    }

    Ok(BulkOutcome {
        requested: ids.len(),
        completed,
        failed: None,
        selected: Vec::new(),
    })
}
