pub mod source;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::clients::JobBackend;
use crate::models::booking::BookingId;
use crate::models::job::JobStatus;
use crate::models::route::GeoPoint;
use crate::observability::metrics::Metrics;
use crate::reporter::source::PositionSource;

/// Periodic driver-position reporting for one active job.
///
/// Fixed-delay timer: each tick samples the position source and pushes the
/// result to the backend, then sleeps again. Pushes are serialized, so a slow
/// push stretches the period instead of overlapping the next one. Per-tick
/// failures are logged and skipped; the next tick resumes reporting. The task
/// ends on `stop()`, or on its own once the watched status reaches
/// GoodDelivered.
pub struct LocationReporter;

impl LocationReporter {
    pub fn start(
        booking: BookingId,
        source: Arc<dyn PositionSource>,
        backend: Arc<dyn JobBackend>,
        status_rx: watch::Receiver<Option<JobStatus>>,
        interval: Duration,
        metrics: Arc<Metrics>,
    ) -> ReporterHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (position_tx, position_rx) = watch::channel(None);

        let task = tokio::spawn(run_reporter(
            booking,
            source,
            backend,
            status_rx,
            stop_rx,
            position_tx,
            interval,
            metrics,
        ));

        ReporterHandle {
            stop_tx,
            task: Some(task),
            position_rx,
        }
    }
}

/// Owns the reporting task. `stop()` is idempotent and awaits in-flight work:
/// after it returns, no further push can start. Dropping a live handle aborts
/// the task instead, so the reporter never outlives its owner.
pub struct ReporterHandle {
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
    position_rx: watch::Receiver<Option<GeoPoint>>,
}

impl ReporterHandle {
    pub async fn stop(&mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "location reporter task ended abnormally");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Last successfully pushed position, if any.
    pub fn last_position(&self) -> Option<GeoPoint> {
        *self.position_rx.borrow()
    }
}

impl Drop for ReporterHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_reporter(
    booking: BookingId,
    source: Arc<dyn PositionSource>,
    backend: Arc<dyn JobBackend>,
    status_rx: watch::Receiver<Option<JobStatus>>,
    mut stop_rx: watch::Receiver<bool>,
    position_tx: watch::Sender<Option<GeoPoint>>,
    interval: Duration,
    metrics: Arc<Metrics>,
) {
    info!(booking_id = %booking, interval_ms = interval.as_millis() as u64, "location reporter started");

    loop {
        tokio::select! {
            _ = stop_rx.changed() => break,
            _ = sleep(interval) => {}
        }

        if status_rx
            .borrow()
            .is_some_and(|status| status.is_delivered())
        {
            info!(booking_id = %booking, "job delivered; location reporter stopping");
            break;
        }

        let Some(position) = source.sample().await else {
            debug!(booking_id = %booking, "no position fix; skipping tick");
            metrics
                .location_pushes_total
                .with_label_values(&["skipped"])
                .inc();
            continue;
        };

        let start = Instant::now();
        let outcome = match backend.push_location(booking, position).await {
            Ok(()) => {
                let _ = position_tx.send(Some(position));
                debug!(booking_id = %booking, lat = position.lat, lng = position.lng, "position pushed");
                "success"
            }
            Err(err) => {
                // non-fatal: the next tick resumes reporting
                warn!(booking_id = %booking, error = %err, "position push failed");
                "error"
            }
        };

        metrics
            .location_pushes_total
            .with_label_values(&[outcome])
            .inc();
        metrics
            .location_push_latency_seconds
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());
    }

    info!(booking_id = %booking, "location reporter stopped");
}
