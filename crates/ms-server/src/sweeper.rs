//! Periodic retention sweep.

use std::time::Duration;

use ms_pipeline::RetentionSweeper;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Run `sweeper` every `interval` until `cancel` fires.
///
/// With `sweep_on_startup` the first sweep runs immediately, otherwise one
/// interval after start. A zero interval, or one too large to schedule,
/// disables the task. Sweeps run on the blocking pool; a sweep already in
/// progress is allowed to finish before the task returns.
pub async fn run_sweeper(
    sweeper: RetentionSweeper,
    interval: Duration,
    sweep_on_startup: bool,
    cancel: CancellationToken,
) {
    if interval.is_zero() {
        tracing::info!("Retention sweep disabled");
        return;
    }

    tracing::info!(
        dir = %sweeper.dir().display(),
        max_age_secs = sweeper.max_age().as_secs(),
        interval_secs = interval.as_secs(),
        "Retention sweeper started"
    );

    let now = Instant::now();
    let Some(after_one_interval) = now.checked_add(interval) else {
        tracing::warn!(?interval, "Retention sweep interval is out of range; sweeping disabled");
        return;
    };
    let start = if sweep_on_startup {
        now
    } else {
        after_one_interval
    };
    let mut ticker = tokio::time::interval_at(start, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancel.cancelled() => break,
        }

        let sweeper = sweeper.clone();
        match tokio::task::spawn_blocking(move || sweeper.sweep_now()).await {
            Ok(swept) => tracing::debug!(swept, "Scheduled sweep done"),
            Err(e) => tracing::error!("Retention sweep task failed: {e}"),
        }
    }

    tracing::info!("Retention sweeper stopped");
}
