// =============================================================================
// Fetch Wait Policy
// =============================================================================
//
// After the formula is written the backend recomputes on its own schedule.
// There is no completion signal, so the reader waits:
//
//   Fixed — sleep `settle_delay_ms` once, then read once.
//   Poll  — read every `interval_ms` until the table carries Date/Close
//           columns with data rows, or `timeout_ms` elapses; the last read is
//           returned either way.
//
// Stale or empty tables are not errors here; the parser reports them. Read
// errors abort immediately, there is no retry.
// =============================================================================

use std::time::Duration;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::error::SheetError;
use crate::sheets::{SheetBackend, Table};

fn default_settle_delay_ms() -> u64 {
    5000
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_poll_timeout_ms() -> u64 {
    15_000
}

/// How to wait for the backend between writing the formula and reading rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FetchPolicy {
    Fixed {
        #[serde(default = "default_settle_delay_ms")]
        settle_delay_ms: u64,
    },
    Poll {
        #[serde(default = "default_poll_interval_ms")]
        interval_ms: u64,
        #[serde(default = "default_poll_timeout_ms")]
        timeout_ms: u64,
    },
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::Fixed { settle_delay_ms: default_settle_delay_ms() }
    }
}

impl FetchPolicy {
    pub fn validate(&self) -> Result<()> {
        if let Self::Poll { interval_ms, timeout_ms } = self {
            ensure!(*interval_ms > 0, "fetch.interval_ms must be at least 1");
            ensure!(timeout_ms >= interval_ms, "fetch.timeout_ms must be >= fetch.interval_ms");
        }
        Ok(())
    }
}

/// Wait according to `policy`, then return the table read from `backend`.
pub async fn wait_and_read<B: SheetBackend>(
    backend: &B,
    policy: &FetchPolicy,
) -> Result<Table, SheetError> {
    match *policy {
        FetchPolicy::Fixed { settle_delay_ms } => {
            debug!(settle_delay_ms, "waiting for sheet to recompute");
            sleep(Duration::from_millis(settle_delay_ms)).await;
            backend.read_table().await
        }
        FetchPolicy::Poll { interval_ms, timeout_ms } => {
            let deadline = Instant::now() + Duration::from_millis(timeout_ms);
            let mut attempts = 0u32;
            loop {
                sleep(Duration::from_millis(interval_ms)).await;
                attempts += 1;
                let table = backend.read_table().await?;
                if table.has_price_data() {
                    debug!(attempts, "sheet table ready");
                    return Ok(table);
                }
                if Instant::now() >= deadline {
                    warn!(attempts, timeout_ms, "sheet table not ready before timeout");
                    return Ok(table);
                }
            }
        }
    }
}
