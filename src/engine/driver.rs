use tokio::sync::watch;
use tracing::{info, warn};

use crate::clients::JobBackend;
use crate::error::AppError;
use crate::models::booking::DriverId;
use crate::models::job::{DriverJob, JobStatus, OpenJob};
use crate::models::route::GeoPoint;

/// Driver-side workflow: claim one job off the open board, then walk it
/// through the delivery statuses. At most one active job per driver session;
/// accepting a new one replaces the previous.
pub struct DriverWorkflow {
    driver: DriverId,
    active: Option<DriverJob>,
    status_tx: watch::Sender<Option<JobStatus>>,
}

impl DriverWorkflow {
    pub fn new(driver: DriverId) -> Self {
        let (status_tx, _) = watch::channel(None);
        Self {
            driver,
            active: None,
            status_tx,
        }
    }

    pub fn driver(&self) -> DriverId {
        self.driver
    }

    pub fn active_job(&self) -> Option<&DriverJob> {
        self.active.as_ref()
    }

    /// Watch the active job's status; the location reporter uses this to shut
    /// itself down once the job reaches GoodDelivered.
    pub fn status_watch(&self) -> watch::Receiver<Option<JobStatus>> {
        self.status_tx.subscribe()
    }

    /// Claims `job` for this driver. On `Conflict` (another driver got there
    /// first) nothing is installed; the caller reports it and re-fetches the
    /// open-jobs list; there is no automatic retry. On success the backend's
    /// view of the job is fetched and becomes the active job.
    pub async fn accept(
        &mut self,
        job: &OpenJob,
        backend: &dyn JobBackend,
    ) -> Result<&DriverJob, AppError> {
        if let Err(err) = backend.accept(job.id, self.driver).await {
            if matches!(err, AppError::Conflict(_)) {
                warn!(booking_id = %job.id, driver_id = %self.driver, "job already claimed");
            }
            return Err(err);
        }

        let accepted = backend.selected_job(self.driver).await?;
        info!(booking_id = %accepted.booking_id, driver_id = %self.driver, "job accepted");
        Ok(self.install(accepted))
    }

    /// Adopts a job fetched out-of-band (e.g. the agent's backend poll),
    /// replacing whatever was active.
    pub fn install(&mut self, job: DriverJob) -> &DriverJob {
        let _ = self.status_tx.send(Some(job.status));
        self.active.insert(job)
    }

    /// Submits the next delivery status. The client enforces forward-only
    /// progression (skipping ahead is allowed, going back is not); the backend
    /// stays authoritative on sequencing. A backend failure leaves the local
    /// status unchanged for an explicit retry.
    pub async fn update_status(
        &mut self,
        next: JobStatus,
        backend: &dyn JobBackend,
    ) -> Result<(), AppError> {
        let job = self
            .active
            .as_mut()
            .ok_or_else(|| AppError::NotFound("driver has no active job".to_string()))?;

        if next <= job.status {
            return Err(AppError::InvalidTransition {
                from: job.status,
                to: next,
            });
        }

        backend.update_status(job.booking_id, next).await?;
        job.status = next;
        let _ = self.status_tx.send(Some(next));

        if next.is_delivered() {
            info!(booking_id = %job.booking_id, "job delivered");
        }
        Ok(())
    }

    /// Most-recent-wins mirror of the driver position; no history is kept.
    pub fn record_position(&mut self, position: GeoPoint) {
        if let Some(job) = self.active.as_mut() {
            job.current_position = Some(position);
        }
    }
}
