//! Command handlers for the CLI.
//!
//! Called from `main` once config and the database pool are established.
//! Results are printed to stdout; diagnostics go through `tracing`.

use std::sync::Arc;

use chrono::Utc;
use newsdigest_core::{AppConfig, Section};
use newsdigest_pipeline::{IngestReport, PipelineContext, RetryPolicy};
use newsdigest_scraper::PortalClient;
use sqlx::SqlitePool;

const STATS_DAYS: i64 = 30;

pub(crate) fn pipeline_context(
    pool: SqlitePool,
    config: &AppConfig,
) -> anyhow::Result<PipelineContext> {
    let portal = PortalClient::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build portal client: {e}"))?;
    let nlp = newsdigest_nlp::build_backends(config)
        .map_err(|e| anyhow::anyhow!("failed to build nlp backends: {e}"))?;
    Ok(PipelineContext {
        pool,
        portal: Arc::new(portal),
        nlp,
    })
}

pub(crate) async fn run_migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    let applied = newsdigest_db::run_migrations(pool).await?;
    println!("migrations applied: {applied}");
    Ok(())
}

/// Ingest one section once, without retries.
///
/// # Errors
///
/// Returns an error for an unknown section or a failed ingestion.
pub(crate) async fn run_ingest_section(
    ctx: &PipelineContext,
    section: &str,
    count: usize,
) -> anyhow::Result<()> {
    let section: Section = section.parse()?;
    let report = newsdigest_pipeline::ingest_section(ctx, section, count).await?;
    print_report(&report);
    Ok(())
}

/// Ingest every section concurrently with the configured retry policy.
///
/// # Errors
///
/// Returns an error only when every section failed.
pub(crate) async fn run_ingest_all(
    ctx: &PipelineContext,
    config: &AppConfig,
    count: usize,
) -> anyhow::Result<()> {
    let summary =
        newsdigest_pipeline::ingest_all_sections(ctx, count, RetryPolicy::from_app_config(config))
            .await;

    for outcome in &summary.outcomes {
        match (&outcome.report, &outcome.error) {
            (Some(report), _) => print_report(report),
            (None, Some(error)) => println!("{}: failed: {error}", outcome.section.slug()),
            (None, None) => {}
        }
    }
    println!(
        "ingestion complete: {} sections succeeded, {} failed, {} articles stored ({:.1}% success)",
        summary.succeeded,
        summary.failed,
        summary.stored,
        summary.success_rate()
    );

    if summary.succeeded == 0 {
        anyhow::bail!("every section failed to ingest");
    }
    Ok(())
}

fn print_report(report: &IngestReport) {
    println!(
        "{}: {} fetched, {} stored, {} duplicates, {} skipped",
        report.section.slug(),
        report.fetched,
        report.stored.len(),
        report.duplicates,
        report.skipped
    );
    for article in &report.stored {
        let sentiment = article
            .sentiment
            .map_or_else(|| "-".to_string(), |label| label.to_string());
        println!("  [{}] #{} {}", sentiment, article.id, article.title);
    }
}

pub(crate) async fn run_maintain(ctx: &PipelineContext) -> anyhow::Result<()> {
    let report = newsdigest_pipeline::run_maintenance(&ctx.pool, &ctx.nlp).await?;
    println!(
        "maintenance: {} duplicates removed, {} summaries and {} sentiments backfilled, {} backfill failures",
        report.duplicates_removed,
        report.summaries_backfilled,
        report.sentiments_backfilled,
        report.backfill_failures
    );
    let integrity = &report.integrity;
    if integrity.total() > 0 {
        println!(
            "integrity: {} empty titles, {} empty contents, {} empty urls, {} non-http urls",
            integrity.empty_title,
            integrity.empty_content,
            integrity.empty_url,
            integrity.invalid_url
        );
    } else {
        println!("integrity: no problems found");
    }
    Ok(())
}

pub(crate) async fn run_stats(pool: &SqlitePool, json: bool) -> anyhow::Result<()> {
    let stats = newsdigest_db::article_statistics(pool, Utc::now().date_naive(), STATS_DAYS).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "articles: {} total, {} today",
        stats.total_articles, stats.today_articles
    );
    for count in &stats.section_counts {
        println!("  {:<16} {}", count.section.slug(), count.count);
    }
    for count in &stats.sentiment_counts {
        println!("  {:<16} {}", count.label, count.count);
    }
    match stats.average_sentiment_score {
        Some(avg) => println!("average sentiment score: {avg:.3}"),
        None => println!("average sentiment score: -"),
    }
    Ok(())
}

pub(crate) async fn run_health(pool: &SqlitePool) -> anyhow::Result<()> {
    let report = newsdigest_pipeline::check_health(pool).await;
    match &report.database_error {
        None => println!("database: ok"),
        Some(e) => println!("database: unavailable ({e})"),
    }
    match report.memory {
        Some(mem) => println!(
            "memory: {} MiB resident, {} MiB virtual",
            mem.resident_bytes / (1024 * 1024),
            mem.virtual_bytes / (1024 * 1024)
        ),
        None => println!("memory: not available on this platform"),
    }
    if !report.is_healthy() {
        anyhow::bail!("health check failed");
    }
    Ok(())
}
