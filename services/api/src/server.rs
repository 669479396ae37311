use crate::cli::ServeArgs;
use crate::infra::{AppState, OutboxDispatcher, Services};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Days;
use rentroll::billing::BillingService;
use rentroll::config::{AppConfig, BillingConfig};
use rentroll::dates;
use rentroll::error::AppError;
use rentroll::store::{InMemoryStore, JsonFileStore, Store};
use rentroll::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(path) = args.data_path.take() {
        config.storage.data_path = Some(path);
    }

    telemetry::init(&config.telemetry)?;

    match config.storage.data_path.clone() {
        Some(path) => {
            let store = Arc::new(JsonFileStore::open(&path)?);
            info!(path = %path.display(), "using json file store");
            serve(store, config).await
        }
        None => {
            warn!("no data path configured; data lives in memory only");
            serve(Arc::new(InMemoryStore::new()), config).await
        }
    }
}

async fn serve<S>(store: Arc<S>, config: AppConfig) -> Result<(), AppError>
where
    S: Store + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let outbox = Arc::new(OutboxDispatcher::default());
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        outbox: outbox.clone(),
    };

    let services = Services::new(store, outbox);
    let seeded = services.mail.ensure_default_templates()?;
    if seeded > 0 {
        info!(templates = seeded, "default email templates installed");
    }
    spawn_billing_job(Arc::clone(&services.billing), config.billing);

    let app = with_operational_routes(services.router())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "rentroll service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically bills every lease up to `today + lookahead_days`. Each run
/// holds the store lock, so it goes to the blocking pool.
fn spawn_billing_job<S>(billing: Arc<BillingService<S>>, config: BillingConfig)
where
    S: Store + 'static,
{
    let Some(period) = config.interval() else {
        return;
    };
    let lookahead = Days::new(config.lookahead_days);
    info!(
        interval_secs = config.interval_secs,
        lookahead_days = config.lookahead_days,
        "billing job scheduled"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let today = dates::today();
            let through = today.checked_add_days(lookahead).unwrap_or(today);
            let billing = Arc::clone(&billing);
            let run = tokio::task::spawn_blocking(move || billing.generate_all(through, today));
            match run.await {
                Ok(Ok(reports)) => {
                    let created: usize = reports.iter().map(|report| report.created.len()).sum();
                    info!(%through, leases = reports.len(), created, "scheduled billing run done");
                }
                Ok(Err(err)) => warn!(error = %err, "scheduled billing run failed"),
                Err(err) => warn!(error = %err, "scheduled billing task panicked"),
            }
        }
    });
}
