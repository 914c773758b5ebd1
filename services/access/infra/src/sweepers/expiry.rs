use std::sync::Arc;
use std::time::Duration;

use access_core::domains::visits::repository::VisitRepository;
use access_core::domains::visits::service::VisitEngineService;
use chrono::Utc;

/// Periodically sweeps non-terminal visits past `expected_end + grace` into
/// `expired`. Runs `VisitEngine::expire` per candidate, which is idempotent,
/// so an overlapping tick or a concurrent scan racing the sweeper is safe.
pub async fn run_expiry_sweeper<VR, VE>(
    visit_repo: Arc<VR>,
    visit_engine: Arc<VE>,
    grace_seconds: i64,
    interval: Duration,
) where
    VR: VisitRepository,
    VE: VisitEngineService,
{
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;

        let cutoff = Utc::now() - chrono::Duration::seconds(grace_seconds);
        let candidates = match visit_repo.find_expired_candidates(cutoff).await {
            Ok(candidates) => candidates,
            Err(err) => {
                tracing::warn!(error = %err, "expiry sweeper failed to load candidates");
                continue;
            },
        };

        if candidates.is_empty() {
            continue;
        }

        tracing::info!(count = candidates.len(), "expiry sweeper processing overdue visits");
        for visit in candidates {
            if let Err(err) = visit_engine.expire(visit.visit_id).await {
                tracing::warn!(visit_id = %visit.visit_id, error = %err, "failed to expire visit");
            }
        }
    }
}
