//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! fixed-interval ingestion, health, and maintenance jobs.

mod guard;

use std::sync::Arc;
use std::time::Duration;

use newsdigest_core::AppConfig;
use newsdigest_pipeline::{PipelineContext, RetryPolicy};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use guard::JobGuard;

const SECS_PER_HOUR: u64 = 3600;

/// Delay before the startup ingestion run, so the listener is up first.
const STARTUP_INGEST_DELAY: Duration = Duration::from_secs(5);

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pipeline: PipelineContext,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    let backoff = Duration::from_secs(config.job_error_backoff_secs);

    let ingest_guard = JobGuard::new("ingest", backoff);
    register_ingest_job(&scheduler, &pipeline, &config, &ingest_guard).await?;
    if config.ingest_on_startup {
        register_startup_ingest(&scheduler, &pipeline, &config, &ingest_guard).await?;
    }
    register_health_job(&scheduler, &pipeline, &config, JobGuard::new("health", backoff)).await?;
    register_maintenance_job(
        &scheduler,
        &pipeline,
        &config,
        JobGuard::new("maintenance", backoff),
    )
    .await?;

    scheduler.start().await?;
    Ok(scheduler)
}

fn hours(n: u64) -> Duration {
    Duration::from_secs(n.saturating_mul(SECS_PER_HOUR))
}

/// Ingest every section with the configured retry policy.
async fn run_ingest_job(pipeline: PipelineContext, config: Arc<AppConfig>) {
    tracing::info!("scheduler: starting ingestion run");
    let summary = newsdigest_pipeline::ingest_all_sections(
        &pipeline,
        config.articles_per_section,
        RetryPolicy::from_app_config(&config),
    )
    .await;
    for outcome in summary.outcomes.iter().filter(|o| o.error.is_some()) {
        tracing::warn!(
            section = %outcome.section,
            error = outcome.error.as_deref().unwrap_or_default(),
            "scheduler: section ingestion failed"
        );
    }
    tracing::info!(
        stored = summary.stored,
        success_rate_pct = summary.success_rate(),
        "scheduler: ingestion run complete"
    );
}

/// Register the recurring all-sections ingestion job.
async fn register_ingest_job(
    scheduler: &JobScheduler,
    pipeline: &PipelineContext,
    config: &Arc<AppConfig>,
    guard: &JobGuard,
) -> Result<(), JobSchedulerError> {
    let every_hours = config.ingest_interval_hours;
    let pipeline = pipeline.clone();
    let job_config = Arc::clone(config);
    let guard = guard.clone();

    let job = Job::new_repeated_async(hours(every_hours), move |_uuid, _lock| {
        let pipeline = pipeline.clone();
        let config = Arc::clone(&job_config);
        let guard = guard.clone();

        Box::pin(async move {
            guard.run(|| run_ingest_job(pipeline, config)).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(every_hours, "scheduler: registered ingest job");
    Ok(())
}

/// Register a one-shot ingestion shortly after startup. Shares the recurring
/// job's guard so the two never overlap.
async fn register_startup_ingest(
    scheduler: &JobScheduler,
    pipeline: &PipelineContext,
    config: &Arc<AppConfig>,
    guard: &JobGuard,
) -> Result<(), JobSchedulerError> {
    let pipeline = pipeline.clone();
    let job_config = Arc::clone(config);
    let guard = guard.clone();

    let job = Job::new_one_shot_async(STARTUP_INGEST_DELAY, move |_uuid, _lock| {
        let pipeline = pipeline.clone();
        let config = Arc::clone(&job_config);
        let guard = guard.clone();

        Box::pin(async move {
            guard.run(|| run_ingest_job(pipeline, config)).await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!("scheduler: registered startup ingest run");
    Ok(())
}

/// Register the recurring health probe.
async fn register_health_job(
    scheduler: &JobScheduler,
    pipeline: &PipelineContext,
    config: &AppConfig,
    guard: JobGuard,
) -> Result<(), JobSchedulerError> {
    let every_hours = config.health_interval_hours;
    let pool = pipeline.pool.clone();

    let job = Job::new_repeated_async(hours(every_hours), move |_uuid, _lock| {
        let pool = pool.clone();
        let guard = guard.clone();

        Box::pin(async move {
            guard
                .run(|| async move {
                    let report = newsdigest_pipeline::check_health(&pool).await;
                    if !report.is_healthy() {
                        tracing::error!(
                            error = report.database_error.as_deref().unwrap_or_default(),
                            "scheduler: health probe found the database unavailable"
                        );
                    }
                })
                .await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(every_hours, "scheduler: registered health job");
    Ok(())
}

/// Register the recurring maintenance sweep.
async fn register_maintenance_job(
    scheduler: &JobScheduler,
    pipeline: &PipelineContext,
    config: &AppConfig,
    guard: JobGuard,
) -> Result<(), JobSchedulerError> {
    let every_hours = config.maintenance_interval_hours;
    let pipeline = pipeline.clone();

    let job = Job::new_repeated_async(hours(every_hours), move |_uuid, _lock| {
        let pipeline = pipeline.clone();
        let guard = guard.clone();

        Box::pin(async move {
            guard
                .run(|| async move {
                    tracing::info!("scheduler: starting maintenance sweep");
                    if let Err(e) =
                        newsdigest_pipeline::run_maintenance(&pipeline.pool, &pipeline.nlp).await
                    {
                        tracing::error!(error = %e, "scheduler: maintenance sweep failed");
                    }
                })
                .await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(every_hours, "scheduler: registered maintenance job");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_converts_and_saturates() {
        assert_eq!(hours(6), Duration::from_secs(21_600));
        assert_eq!(hours(u64::MAX), Duration::from_secs(u64::MAX));
    }

    #[tokio::test]
    async fn build_scheduler_registers_every_job() {
        let state = crate::api::test_support::test_state("http://127.0.0.1:9", false).await;
        let mut scheduler = build_scheduler(state.pipeline.clone(), Arc::clone(&state.config))
            .await
            .expect("scheduler builds");
        scheduler.shutdown().await.expect("scheduler shuts down");
    }
}
