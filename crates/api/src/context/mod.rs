//! Application context - dependency injection container

use std::sync::Arc;

use mirador_core::reports::{CrmReports, FinancialReports, HrReports, SubscriptionReports};
use mirador_core::{AssistantTools, CompanyResolver, ErpClient};
use mirador_domain::{Config, Result};
use mirador_infra::OdooClient;

/// Shared state behind every route handler.
///
/// One ERP client instance feeds the resolver and every report service,
/// so the session, the result cache and the in-flight registry are
/// shared across the whole process. Cloning the context is cheap; axum
/// clones it per request.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub erp: Arc<dyn ErpClient>,
    pub resolver: Arc<CompanyResolver>,
    pub financial: Arc<FinancialReports>,
    pub crm: Arc<CrmReports>,
    pub hr: Arc<HrReports>,
    pub subscriptions: Arc<SubscriptionReports>,
    pub assistant: Arc<AssistantTools>,
}

impl AppContext {
    /// Wires the real Odoo client from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let erp: Arc<dyn ErpClient> = Arc::new(OdooClient::new(&config.odoo)?);
        Ok(Self::with_erp(config, erp))
    }

    /// Builds the context over an externally supplied ERP client.
    ///
    /// Tests inject scripted doubles here; production goes through
    /// [`AppContext::new`].
    pub fn with_erp(config: Config, erp: Arc<dyn ErpClient>) -> Self {
        let resolver = Arc::new(CompanyResolver::new(Arc::clone(&erp)));
        Self {
            financial: Arc::new(FinancialReports::new(Arc::clone(&erp), Arc::clone(&resolver))),
            crm: Arc::new(CrmReports::new(Arc::clone(&erp), Arc::clone(&resolver))),
            hr: Arc::new(HrReports::new(Arc::clone(&erp), Arc::clone(&resolver))),
            subscriptions: Arc::new(SubscriptionReports::new(
                Arc::clone(&erp),
                Arc::clone(&resolver),
            )),
            assistant: Arc::new(AssistantTools::new(Arc::clone(&erp), Arc::clone(&resolver))),
            config,
            erp,
            resolver,
        }
    }
}
