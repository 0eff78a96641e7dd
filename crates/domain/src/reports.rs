//! Report payloads served to the dashboard.
//!
//! Field names are the wire contract of the existing frontend, so they
//! stay in Spanish and must not be renamed.

use serde::{Deserialize, Serialize};

/// One side of the P&L (operating or financial).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlBreakdown {
    pub ingresos: f64,
    pub gastos: f64,
    pub resultado: f64,
}

/// Profit-and-loss summary for a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PnlSummary {
    pub empresa: String,
    pub periodo: String,
    pub explotacion: PnlBreakdown,
    pub financiero: PnlBreakdown,
    pub resultado_antes_impuestos: f64,
}

/// Current treasury position with pending receivables and payables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashflowSummary {
    pub empresa: String,
    pub tesoreria: f64,
    pub cobros_pendientes: f64,
    pub cobros_count: usize,
    pub pagos_pendientes: f64,
    pub pagos_count: usize,
    pub posicion_neta: f64,
}

/// Days-sales-outstanding for a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DsoSummary {
    pub empresa: String,
    pub dso: f64,
    pub ventas_periodo: f64,
    pub cuentas_cobrar: f64,
}

/// One month of a time series (`fecha` is a short label like `Ene 25`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub fecha: String,
    pub valor: f64,
}

/// Month-by-month series payload (treasury balance, MRR history).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub data: Vec<SeriesPoint>,
}

/// An overdue customer invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueInvoice {
    pub partner: String,
    pub amount: f64,
    pub due_date: String,
    pub days_overdue: i64,
    pub invoice: String,
}

/// Overdue receivables, oldest first, capped at 50 rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverdueSummary {
    pub total: f64,
    pub count: usize,
    pub facturas: Vec<OverdueInvoice>,
}

/// Pie-chart slice with a monetary value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueSlice {
    pub name: String,
    pub value: f64,
    pub color: String,
}

/// Income by company, top ten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRevenueChart {
    pub data: Vec<RevenueSlice>,
}

/// One invoice row in the invoice listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceRow {
    pub id: i64,
    pub numero: String,
    pub cliente: String,
    pub fecha: String,
    pub vencimiento: Option<String>,
    pub total: f64,
    pub pendiente: f64,
    pub estado: String,
    pub moneda: String,
}

/// Invoice listing for a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceList {
    pub empresa: String,
    pub periodo: String,
    /// `Ventas` for customer invoices, `Compras` for vendor bills.
    pub tipo: String,
    pub count: usize,
    pub total_facturado: f64,
    pub total_pendiente: f64,
    pub facturas: Vec<InvoiceRow>,
}

/// Overdue-invoice alert counters shown in the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertCount {
    pub count: u64,
    /// Subset overdue by more than 60 days.
    pub critical: u64,
}

/// One CRM stage with its open-opportunity revenue and count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStage {
    pub name: String,
    pub value: f64,
    pub count: u64,
    pub color: String,
}

/// Pipeline grouped by stage, every configured stage present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmPipeline {
    pub stages: Vec<PipelineStage>,
}

/// CRM activity summary for a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmSummary {
    pub empresa: String,
    pub oportunidades_activas: u64,
    pub pipeline_value: f64,
    pub ganadas: u64,
    pub perdidas: u64,
    pub tasa_conversion: f64,
    pub altas: u64,
    pub bajas: u64,
    pub impagos: u64,
    pub posibles_bajas: u64,
    pub clubs_activos: u64,
}

/// One club/deal row ranked by invoiced revenue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopDeal {
    pub name: String,
    pub partner: String,
    pub stage: String,
    pub stage_id: i64,
    pub fecha_alta: Option<String>,
    pub ingreso: f64,
}

/// Deals listing, highest invoiced revenue first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopDealList {
    pub clubs: Vec<TopDeal>,
}

/// Hours worked by one employee over a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRow {
    pub nombre: String,
    pub horas_trabajadas: f64,
    pub horas_extra: f64,
    pub departamento: String,
}

/// Attendance report, most hours first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub empleados: Vec<AttendanceRow>,
}

/// Headcount and payroll summary for a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HrSummary {
    pub empresa: String,
    pub empleados_activos: u64,
    pub nuevas_altas: u64,
    pub horas_mes: f64,
    pub coste_nomina: f64,
}

/// Pie-chart slice with a headcount value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadcountSlice {
    pub name: String,
    pub value: u64,
    pub color: String,
}

/// Active employees grouped by department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentChart {
    pub data: Vec<HeadcountSlice>,
}

/// Subscription KPIs for a period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    pub empresa: String,
    pub mrr: f64,
    pub activas: u64,
    pub nuevas: u64,
    pub bajas: u64,
    pub churn_rate: f64,
}

/// One subscription row in the listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionRow {
    pub name: String,
    pub partner: String,
    pub mrr: f64,
    pub start_date: String,
    pub next_invoice: String,
    pub status: String,
    pub status_label: String,
}

/// Subscription listing, highest MRR first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionList {
    pub subscriptions: Vec<SubscriptionRow>,
}

/// One company of the group as exposed to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyEntry {
    pub id: i64,
    pub nombre: String,
}

/// Company directory payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyDirectory {
    pub empresas: Vec<CompanyEntry>,
}

/// Service health, `degraded` when the ERP probe fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub erp_reachable: bool,
}
