//! Drives an ordered batch of app ids through one source's basket throttle
//! and remote call, turning per-call verdicts into flow control.

use std::future::Future;

use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::error::{HarvestError, Result};
use crate::progress::ProgressSink;
use crate::throttle::Basket;
use crate::types::{AppId, RequestOutcome};

/// Everything one batch produced. `rows` keeps input order; absent apps are
/// present with `None`; skipped apps leave no row at all. `halted` means the
/// source reported quota exhaustion (or the run was aborted) and the
/// remaining ids were never attempted; the partial result is still valid.
#[derive(Debug)]
pub struct BatchOutcome<T> {
    pub rows: Vec<(AppId, Option<T>)>,
    pub processed: usize,
    pub total: usize,
    pub skipped: usize,
    pub halted: bool,
}

impl<T> BatchOutcome<T> {
    /// Successful payloads only, input order preserved.
    pub fn payloads(self) -> Vec<(AppId, T)> {
        self.rows
            .into_iter()
            .filter_map(|(appid, payload)| payload.map(|p| (appid, p)))
            .collect()
    }
}

/// Runs `call` once per app id, in order, gated by `basket`. Skip and Absent
/// verdicts are absorbed here; Halted ends the batch with whatever has been
/// accumulated; any error from `call` aborts the run.
pub async fn collect_batch<T, F, Fut>(
    source_label: &'static str,
    appids: &[AppId],
    basket: &mut Basket,
    cancel: &CancelToken,
    progress: &dyn ProgressSink,
    mut call: F,
) -> Result<BatchOutcome<T>>
where
    F: FnMut(AppId) -> Fut,
    Fut: Future<Output = Result<RequestOutcome<T>>>,
{
    let total = appids.len();
    let mut outcome =
        BatchOutcome { rows: Vec::new(), processed: 0, total, skipped: 0, halted: false };

    for &appid in appids {
        match basket.acquire(cancel).await {
            Ok(()) => {}
            Err(HarvestError::Cancelled) => {
                warn!(
                    source = source_label,
                    processed = outcome.processed,
                    total,
                    "run aborted, returning the partial batch"
                );
                outcome.halted = true;
                break;
            }
            Err(e) => return Err(e),
        }

        match call(appid).await? {
            RequestOutcome::Success(payload) => outcome.rows.push((appid, Some(payload))),
            RequestOutcome::Absent => outcome.rows.push((appid, None)),
            RequestOutcome::Skip => {
                warn!(source = source_label, appid, "transient failure, app skipped");
                outcome.skipped += 1;
            }
            RequestOutcome::Halted => {
                info!(
                    source = source_label,
                    processed = outcome.processed,
                    total,
                    "quota exhausted, stopping the batch"
                );
                outcome.halted = true;
                break;
            }
        }

        outcome.processed += 1;
        progress.update(outcome.processed, total, source_label);
    }

    info!(
        source = source_label,
        processed = outcome.processed,
        total,
        skipped = outcome.skipped,
        halted = outcome.halted,
        "batch finished"
    );
    Ok(outcome)
}
