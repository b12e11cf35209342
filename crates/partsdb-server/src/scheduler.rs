//! Background refresh job.
//!
//! With a cron expression configured, a job reads through the serving cache on
//! that schedule so expired data is refreshed off the request path.

use std::sync::Arc;

use partsdb_store::ServingCache;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Builds and starts the scheduler, or returns `None` when no schedule is
/// configured.
///
/// The returned [`JobScheduler`] must be kept alive for the lifetime of the
/// process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised, the
/// cron expression is rejected, or the scheduler fails to start.
pub async fn build_scheduler(
    cron: Option<&str>,
    cache: Arc<ServingCache>,
) -> Result<Option<JobScheduler>, JobSchedulerError> {
    let Some(cron) = cron else {
        tracing::info!("no refresh schedule configured; refreshing on demand only");
        return Ok(None);
    };

    let scheduler = JobScheduler::new().await?;
    register_refresh_job(&scheduler, cron, cache).await?;
    scheduler.start().await?;
    tracing::info!(cron, "scheduled cache refresh enabled");
    Ok(Some(scheduler))
}

async fn register_refresh_job(
    scheduler: &JobScheduler,
    cron: &str,
    cache: Arc<ServingCache>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let cache = Arc::clone(&cache);

        Box::pin(async move {
            tracing::info!(state = cache.state().as_str(), "scheduler: cache refresh tick");
            match cache.get().await {
                Ok(read) => tracing::info!(
                    parts = read.snapshot.len(),
                    stale = read.stale,
                    captured_at = %read.captured_at,
                    "scheduler: cache refresh complete"
                ),
                Err(e) => tracing::error!(error = %e, "scheduler: cache refresh failed"),
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
