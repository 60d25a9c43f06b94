//! services/app/src/timers.rs
//!
//! Periodic background work for the presentation layer: the view refresh that also
//! catches the midnight rollover, and per-task deadline countdowns.
//!
//! Every worker is tied to an `IntervalGuard`. Dropping the guard cancels the worker,
//! so a view that goes away takes its timers with it.

use crate::app::App;
use chrono::{DateTime, Utc};
use questlog_core::{Clock, Dashboard};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Owns a running interval. Cancels it on drop.
pub struct IntervalGuard {
    cancellation_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl IntervalGuard {
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    /// True once the worker has returned, either cancelled or by its own choice.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for IntervalGuard {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

/// Runs `tick` every `period` until it breaks or the guard is dropped.
/// The first tick fires immediately.
pub fn spawn_interval<F>(period: Duration, mut tick: F) -> IntervalGuard
where
    F: FnMut() -> ControlFlow<()> + Send + 'static,
{
    let cancellation_token = CancellationToken::new();
    let token = cancellation_token.clone();
    // tokio's interval rejects a zero period.
    let period = period.max(Duration::from_millis(1));

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Interval cancelled.");
                    break;
                }
                _ = interval.tick() => {
                    if tick().is_break() {
                        debug!("Interval finished.");
                        break;
                    }
                }
            }
        }
    });

    IntervalGuard {
        cancellation_token,
        handle,
    }
}

/// Re-runs the daily rollover and recomputes the dashboard on every tick.
///
/// The receiver holds `None` while nobody is logged in. The worker stops when the app
/// lock is poisoned or every receiver is gone.
pub fn spawn_view_refresh(
    app: Arc<Mutex<App>>,
    period: Duration,
) -> (IntervalGuard, watch::Receiver<Option<Dashboard>>) {
    let (tx, rx) = watch::channel(None);

    let guard = spawn_interval(period, move || {
        let dashboard = {
            let Ok(mut app) = app.lock() else {
                error!("App state lock is poisoned. Stopping the view refresh.");
                return ControlFlow::Break(());
            };
            if let Err(e) = app.refresh_daily_quests() {
                error!("Periodic daily quest refresh failed: {}", e);
            }
            app.dashboard()
        };

        match tx.send(dashboard) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    });

    (guard, rx)
}

/// Publishes the time left until `deadline` once per second. Stops after it has
/// published `00:00:00`.
pub fn spawn_countdown(
    deadline: DateTime<Utc>,
    clock: Arc<dyn Clock>,
) -> (IntervalGuard, watch::Receiver<String>) {
    let (tx, rx) = watch::channel(format_countdown(deadline, clock.now()));

    let guard = spawn_interval(Duration::from_secs(1), move || {
        let now = clock.now();
        if tx.send(format_countdown(deadline, now)).is_err() || now >= deadline {
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });

    (guard, rx)
}

/// `HH:MM:SS` until `deadline`. Hours are not wrapped at 24; a past deadline reads
/// `00:00:00`.
pub fn format_countdown(deadline: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = (deadline - now).num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        remaining / 3600,
        (remaining % 3600) / 60,
        remaining % 60
    )
}
