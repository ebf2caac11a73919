use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use freight_booking::api::{self, AgentState, JobSnapshot};
use freight_booking::clients::http::{HttpJobBackend, HttpRouteLookup};
use freight_booking::clients::{JobBackend, RouteLookup};
use freight_booking::config::Config;
use freight_booking::engine::driver::DriverWorkflow;
use freight_booking::error::AppError;
use freight_booking::models::booking::DriverId;
use freight_booking::models::job::DriverJob;
use freight_booking::models::route::GeoPoint;
use freight_booking::observability::metrics::Metrics;
use freight_booking::reporter::source::RouteFollower;
use freight_booking::reporter::{LocationReporter, ReporterHandle};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let metrics = Arc::new(Metrics::new());
    let job_backend = Arc::new(HttpJobBackend::new(&config.backend_base_url)?);
    let route_lookup = Arc::new(HttpRouteLookup::new(
        &config.routing_base_url,
        &config.routing_api_key,
    )?);

    let (job_tx, job_rx) = watch::channel(None);
    let state = Arc::new(AgentState {
        driver: DriverId(config.driver_id),
        metrics: metrics.clone(),
        job_rx,
    });

    let app = api::router(state);

    let agent = tokio::spawn(run_agent(
        config.clone(),
        job_backend,
        route_lookup,
        job_tx,
        metrics,
    ));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    info!(http_port = config.http_port, driver_id = config.driver_id, "freight agent started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    agent.abort();
    info!("freight agent stopped");
    Ok(())
}

/// Mirrors the driver's assigned job and keeps a location reporter running
/// against it until the job is delivered, then waits for the next one.
async fn run_agent(
    config: Config,
    backend: Arc<HttpJobBackend>,
    route_lookup: Arc<HttpRouteLookup>,
    job_tx: watch::Sender<Option<JobSnapshot>>,
    metrics: Arc<Metrics>,
) {
    let driver = DriverId(config.driver_id);
    let poll = Duration::from_millis(config.job_poll_interval_ms);

    loop {
        let job = match backend.selected_job(driver).await {
            Ok(job) if !job.status.is_delivered() => job,
            Ok(_) => {
                debug!(driver_id = %driver, "assigned job already delivered");
                sleep(poll).await;
                continue;
            }
            Err(AppError::NotFound(_)) => {
                debug!(driver_id = %driver, "no assigned job yet");
                sleep(poll).await;
                continue;
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch assigned job");
                sleep(poll).await;
                continue;
            }
        };

        report_until_delivered(&config, &backend, &route_lookup, &job_tx, &metrics, job).await;
        let _ = job_tx.send(None);
        metrics.active_job.set(0);
    }
}

async fn report_until_delivered(
    config: &Config,
    backend: &Arc<HttpJobBackend>,
    route_lookup: &Arc<HttpRouteLookup>,
    job_tx: &watch::Sender<Option<JobSnapshot>>,
    metrics: &Arc<Metrics>,
    job: DriverJob,
) {
    let driver = job.driver_id;
    let booking = job.booking_id;
    let path = follower_path(route_lookup, &job).await;

    let mut workflow = DriverWorkflow::new(driver);
    let status_rx = workflow.status_watch();
    workflow.install(job);

    let mut reporter = LocationReporter::start(
        booking,
        Arc::new(RouteFollower::new(path, config.follower_speed_kmh)),
        backend.clone(),
        status_rx,
        Duration::from_millis(config.report_interval_ms),
        metrics.clone(),
    );
    metrics.active_job.set(1);

    let poll = Duration::from_millis(config.job_poll_interval_ms);
    loop {
        publish_snapshot(job_tx, &workflow, &reporter);
        sleep(poll).await;

        match backend.selected_job(driver).await {
            Ok(fresh) if fresh.booking_id != booking => {
                info!(booking_id = %fresh.booking_id, "driver reassigned; restarting reporter");
                break;
            }
            Ok(fresh) => {
                let delivered = fresh.status.is_delivered();
                workflow.install(fresh);
                if delivered {
                    info!(booking_id = %booking, "job delivered; agent going idle");
                    break;
                }
            }
            Err(AppError::NotFound(_)) => {
                info!(booking_id = %booking, "assigned job disappeared; stopping reporter");
                break;
            }
            Err(err) => {
                warn!(error = %err, "job status poll failed");
            }
        }
    }

    reporter.stop().await;
}

/// Path for the simulated position source. Falls back to the straight
/// pickup->dropoff segment when the routing provider is unavailable.
async fn follower_path(route_lookup: &Arc<HttpRouteLookup>, job: &DriverJob) -> Vec<GeoPoint> {
    match route_lookup
        .distance_and_path(&job.pickup.position, &job.dropoff.position)
        .await
    {
        Ok(plan) => plan.path,
        Err(err) => {
            warn!(error = %err, "route fetch failed; following straight-line path");
            vec![job.pickup.position, job.dropoff.position]
        }
    }
}

fn publish_snapshot(
    job_tx: &watch::Sender<Option<JobSnapshot>>,
    workflow: &DriverWorkflow,
    reporter: &ReporterHandle,
) {
    if let Some(job) = workflow.active_job() {
        let _ = job_tx.send(Some(JobSnapshot {
            booking_id: job.booking_id,
            status: job.status,
            last_position: reporter.last_position(),
        }));
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
