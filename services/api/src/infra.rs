use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use rentroll::billing::{billing_router, BillingService};
use rentroll::documents::{document_router, DocumentService};
use rentroll::leases::{lease_router, LeaseService};
use rentroll::mail::{mail_router, MailDispatcher, MailError, MailService, OutgoingMail};
use rentroll::portfolio::{portfolio_router, PortfolioService};
use rentroll::reports::{report_router, ReportService};
use rentroll::store::Store;
use rentroll::tenants::{tenant_router, TenantService};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) outbox: Arc<OutboxDispatcher>,
}

/// Keeps composed mail in memory and logs each message. Stands in for an
/// SMTP transport.
#[derive(Default)]
pub(crate) struct OutboxDispatcher {
    messages: Mutex<Vec<OutgoingMail>>,
}

impl MailDispatcher for OutboxDispatcher {
    fn dispatch(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        let mut guard = self
            .messages
            .lock()
            .map_err(|_| MailError::Transport("outbox mutex poisoned".to_string()))?;
        info!(
            to = %mail.to,
            template = %mail.template_key,
            subject = %mail.subject,
            "mail queued in outbox"
        );
        guard.push(mail.clone());
        Ok(())
    }
}

impl OutboxDispatcher {
    pub(crate) fn messages(&self) -> Vec<OutgoingMail> {
        self.messages
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Every domain service, sharing one store.
pub(crate) struct Services<S> {
    pub(crate) portfolio: Arc<PortfolioService<S>>,
    pub(crate) tenants: Arc<TenantService<S>>,
    pub(crate) leases: Arc<LeaseService<S>>,
    pub(crate) billing: Arc<BillingService<S>>,
    pub(crate) documents: Arc<DocumentService<S>>,
    pub(crate) mail: Arc<MailService<S>>,
    pub(crate) reports: Arc<ReportService<S>>,
}

impl<S> Services<S>
where
    S: Store + 'static,
{
    pub(crate) fn new(store: Arc<S>, dispatcher: Arc<dyn MailDispatcher>) -> Self {
        Self {
            portfolio: Arc::new(PortfolioService::new(Arc::clone(&store))),
            tenants: Arc::new(TenantService::new(Arc::clone(&store))),
            leases: Arc::new(LeaseService::new(Arc::clone(&store))),
            billing: Arc::new(BillingService::new(Arc::clone(&store))),
            documents: Arc::new(DocumentService::new(Arc::clone(&store))),
            mail: Arc::new(MailService::new(Arc::clone(&store), dispatcher)),
            reports: Arc::new(ReportService::new(store)),
        }
    }

    /// All `/api/v1` routes.
    pub(crate) fn router(&self) -> Router {
        Router::new()
            .merge(portfolio_router(Arc::clone(&self.portfolio)))
            .merge(tenant_router(Arc::clone(&self.tenants)))
            .merge(lease_router(Arc::clone(&self.leases)))
            .merge(billing_router(Arc::clone(&self.billing)))
            .merge(document_router(Arc::clone(&self.documents)))
            .merge(mail_router(Arc::clone(&self.mail)))
            .merge(report_router(Arc::clone(&self.reports)))
    }
}
