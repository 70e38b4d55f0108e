//! Health probe: database reachability and process memory.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

/// Page size assumed when converting `/proc/self/statm` pages to bytes.
const PAGE_SIZE_BYTES: u64 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemorySnapshot {
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub database_ok: bool,
    pub database_error: Option<String>,
    /// `None` on platforms without `/proc`.
    pub memory: Option<MemorySnapshot>,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.database_ok
    }
}

/// Probe the database and sample process memory. Never fails; problems are
/// reported in the result and logged.
pub async fn check_health(pool: &SqlitePool) -> HealthReport {
    let database_error = match newsdigest_db::health_check(pool).await {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            Some(e.to_string())
        }
    };
    let memory = memory_snapshot();
    if let Some(mem) = memory {
        tracing::info!(
            resident_mb = mem.resident_bytes / (1024 * 1024),
            database_ok = database_error.is_none(),
            "health check"
        );
    }

    HealthReport {
        database_ok: database_error.is_none(),
        database_error,
        memory,
        checked_at: Utc::now(),
    }
}

/// Current resident and virtual memory of this process, where available.
#[must_use]
pub fn memory_snapshot() -> Option<MemorySnapshot> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    parse_statm(&statm)
}

/// Parse the first two fields (total and resident pages) of `statm`.
fn parse_statm(contents: &str) -> Option<MemorySnapshot> {
    let mut fields = contents.split_whitespace();
    let virtual_pages: u64 = fields.next()?.parse().ok()?;
    let resident_pages: u64 = fields.next()?.parse().ok()?;
    Some(MemorySnapshot {
        resident_bytes: resident_pages.saturating_mul(PAGE_SIZE_BYTES),
        virtual_bytes: virtual_pages.saturating_mul(PAGE_SIZE_BYTES),
    })
}
