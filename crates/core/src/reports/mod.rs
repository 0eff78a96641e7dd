//! Report routines served to the dashboard.
//!
//! Each service holds the ERP port plus the company resolver and maps
//! one method to one dashboard endpoint. Routines resolve the company
//! scope first, run their ERP queries, and shape the payload types
//! defined in `mirador-domain`.

pub mod crm;
pub mod financial;
pub mod hr;
pub mod months;
pub mod pnl;
pub mod subscriptions;

pub use crm::CrmReports;
pub use financial::FinancialReports;
pub use hr::HrReports;
pub use pnl::PnlTotals;
pub use subscriptions::SubscriptionReports;
