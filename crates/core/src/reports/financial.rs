//! Financial report routines: P&L, treasury, receivables, invoices.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use mirador_domain::{
    round2, AlertCount, CashflowSummary, CompanyRevenueChart, DateRange, DsoSummary, InvoiceList,
    InvoiceRow, MonthlySeries, OverdueInvoice, OverdueSummary, PnlBreakdown, PnlSummary, Result,
    RevenueSlice, SeriesPoint,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::months::month_points;
use super::pnl::PnlTotals;
use crate::erp::{
    false_as_none, read_group, search_count, search_read, zero_when_false, ErpClient, Many2one,
    SearchReadOptions,
};
use crate::resolver::{CompanyFilter, CompanyResolver};

/// Chart palette for the income-by-company pie.
const COMPANY_COLORS: [&str; 10] = [
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#06b6d4", "#ec4899", "#f97316",
    "#14b8a6", "#6366f1",
];

/// Account buckets that make up the P&L.
const PNL_ACCOUNT_TYPES: [&str; 5] =
    ["income", "income_other", "expense", "expense_depreciation", "expense_direct_cost"];

/// Days past due after which an overdue invoice counts as critical.
const CRITICAL_OVERDUE_DAYS: i64 = 60;

/// Financial reporting over posted journal entries.
pub struct FinancialReports {
    erp: Arc<dyn ErpClient>,
    resolver: Arc<CompanyResolver>,
}

impl FinancialReports {
    pub fn new(erp: Arc<dyn ErpClient>, resolver: Arc<CompanyResolver>) -> Self {
        Self { erp, resolver }
    }

    /// P&L summary split into operating and financial sections.
    ///
    /// Expenses are reported as negative amounts; results are income
    /// minus expense per section.
    pub async fn pnl_summary(&self, range: DateRange, company: Option<&str>) -> Result<PnlSummary> {
        let filter = self.resolver.resolve_many(company).await?;
        let totals = pnl_totals(self.erp.as_ref(), range, filter.clause().as_ref()).await?;
        debug!(empresa = filter.label(), "computed p&l summary");
        Ok(PnlSummary {
            empresa: filter.label().to_string(),
            periodo: range.label(),
            explotacion: PnlBreakdown {
                ingresos: round2(totals.operating_income),
                gastos: round2(-totals.operating_expense),
                resultado: round2(totals.operating_result()),
            },
            financiero: PnlBreakdown {
                ingresos: round2(totals.financial_income),
                gastos: round2(-totals.financial_expense),
                resultado: round2(totals.financial_result()),
            },
            resultado_antes_impuestos: round2(totals.pretax_result()),
        })
    }

    /// Current treasury position with pending receivables and payables.
    pub async fn cashflow(&self, company: Option<&str>) -> Result<CashflowSummary> {
        let filter = self.resolver.resolve_many(company).await?;

        let cash_ids = cash_account_ids(self.erp.as_ref()).await?;
        let mut treasury_domain = vec![
            json!(["account_id", "in", cash_ids]),
            json!(["parent_state", "=", "posted"]),
        ];
        filter.push_clause(&mut treasury_domain);
        let tesoreria = balance_sum(self.erp.as_ref(), treasury_domain).await?;

        let (cobros_pendientes, cobros_count) =
            self.pending_residuals(["out_invoice", "out_refund"], &filter).await?;
        let (pagos_pendientes, pagos_count) =
            self.pending_residuals(["in_invoice", "in_refund"], &filter).await?;

        Ok(CashflowSummary {
            empresa: filter.label().to_string(),
            tesoreria: round2(tesoreria),
            cobros_pendientes: round2(cobros_pendientes),
            cobros_count,
            pagos_pendientes: round2(pagos_pendientes),
            pagos_count,
            posicion_neta: round2(tesoreria + cobros_pendientes - pagos_pendientes),
        })
    }

    /// Days sales outstanding: receivables over period sales, scaled
    /// by the period length in days.
    pub async fn dso(&self, range: DateRange, company: Option<&str>) -> Result<DsoSummary> {
        let filter = self.resolver.resolve_many(company).await?;

        let mut sales_domain = vec![
            json!(["move_type", "=", "out_invoice"]),
            json!(["state", "=", "posted"]),
            json!(["invoice_date", ">=", range.from.to_string()]),
            json!(["invoice_date", "<=", range.to.to_string()]),
        ];
        filter.push_clause(&mut sales_domain);
        let sales_groups = read_group(
            self.erp.as_ref(),
            "account.move",
            Value::Array(sales_domain),
            &["amount_total_signed"],
            &[],
        )
        .await?;
        let ventas_periodo =
            sales_groups.first().map_or(0.0, |row| row.sum("amount_total_signed"));

        let (cuentas_cobrar, _) =
            self.pending_residuals(["out_invoice", "out_refund"], &filter).await?;

        let dias = range.day_count();
        let dso = if ventas_periodo > 0.0 {
            round2((cuentas_cobrar / ventas_periodo) * dias as f64)
        } else {
            0.0
        };

        Ok(DsoSummary {
            empresa: filter.label().to_string(),
            dso,
            ventas_periodo: round2(ventas_periodo),
            cuentas_cobrar: round2(cuentas_cobrar),
        })
    }

    /// Treasury balance at the end of each month touched by the range.
    ///
    /// Months are queried sequentially; each point is the cumulative
    /// balance of the liquidity accounts up to that month's end.
    pub async fn treasury_series(
        &self,
        range: DateRange,
        company: Option<&str>,
    ) -> Result<MonthlySeries> {
        let filter = self.resolver.resolve_many(company).await?;
        let cash_ids = cash_account_ids(self.erp.as_ref()).await?;

        let mut data = Vec::new();
        for point in month_points(range.from, range.to) {
            let mut domain = vec![
                json!(["account_id", "in", cash_ids]),
                json!(["parent_state", "=", "posted"]),
                json!(["date", "<=", point.month_end.to_string()]),
            ];
            filter.push_clause(&mut domain);
            let total = balance_sum(self.erp.as_ref(), domain).await?;
            data.push(SeriesPoint { fecha: point.label, valor: round2(total) });
        }
        debug!(points = data.len(), "built treasury series");
        Ok(MonthlySeries { data })
    }

    /// Overdue customer invoices, oldest due date first, capped at 50.
    pub async fn overdue(&self, company: Option<&str>) -> Result<OverdueSummary> {
        let filter = self.resolver.resolve_many(company).await?;
        let now = Utc::now();

        let domain = overdue_domain(&filter, now.date_naive());
        let invoices: Vec<OverdueRow> = search_read(
            self.erp.as_ref(),
            "account.move",
            Value::Array(domain),
            SearchReadOptions {
                fields: &["partner_id", "amount_residual", "invoice_date_due", "name"],
                order: Some("invoice_date_due asc"),
                limit: Some(50),
            },
        )
        .await?;

        let facturas: Vec<OverdueInvoice> = invoices
            .into_iter()
            .map(|row| OverdueInvoice {
                partner: row.partner_id.name_or("Sin cliente"),
                amount: round2(row.amount_residual),
                days_overdue: days_overdue(&row.invoice_date_due, now),
                due_date: row.invoice_date_due,
                invoice: row.name,
            })
            .collect();
        let total = facturas.iter().map(|f| f.amount).sum();

        Ok(OverdueSummary { total: round2(total), count: facturas.len(), facturas })
    }

    /// Income by company over the period, top ten slices.
    pub async fn top_companies(
        &self,
        range: DateRange,
        company: Option<&str>,
    ) -> Result<CompanyRevenueChart> {
        let filter = self.resolver.resolve_many(company).await?;

        let income_accounts: Vec<IdRow> = search_read(
            self.erp.as_ref(),
            "account.account",
            json!([["account_type", "in", ["income", "income_other"]]]),
            SearchReadOptions { fields: &["id"], ..SearchReadOptions::default() },
        )
        .await?;
        let income_ids: Vec<i64> = income_accounts.into_iter().map(|row| row.id).collect();

        let mut domain = vec![
            json!(["account_id", "in", income_ids]),
            json!(["parent_state", "=", "posted"]),
            json!(["date", ">=", range.from.to_string()]),
            json!(["date", "<=", range.to.to_string()]),
        ];
        filter.push_clause(&mut domain);
        let groups = read_group(
            self.erp.as_ref(),
            "account.move.line",
            Value::Array(domain),
            &["balance"],
            &["company_id"],
        )
        .await?;

        // Palette position follows the raw group order, so dropped or
        // reordered slices keep the color they were first dealt.
        let mut data: Vec<RevenueSlice> = groups
            .iter()
            .enumerate()
            .map(|(i, row)| RevenueSlice {
                name: row
                    .many2one("company_id")
                    .map_or_else(|| "Desconocida".to_string(), |(_, name)| name),
                value: round2(row.sum("balance").abs()),
                color: COMPANY_COLORS[i % COMPANY_COLORS.len()].to_string(),
            })
            .filter(|slice| slice.value > 0.0)
            .collect();
        data.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
        data.truncate(10);

        Ok(CompanyRevenueChart { data })
    }

    /// Posted invoices in the period, newest first.
    ///
    /// `kind` is the move type (`out_invoice` for sales, `in_invoice`
    /// for purchases); unknown types simply match nothing.
    pub async fn invoices(
        &self,
        range: DateRange,
        company: Option<&str>,
        kind: &str,
        limit: u32,
    ) -> Result<InvoiceList> {
        let scope = self.resolver.resolve_one(company).await?;

        let mut domain = vec![
            json!(["move_type", "=", kind]),
            json!(["state", "=", "posted"]),
            json!(["invoice_date", ">=", range.from.to_string()]),
            json!(["invoice_date", "<=", range.to.to_string()]),
        ];
        scope.push_clause(&mut domain);

        let invoices: Vec<InvoiceRecord> = search_read(
            self.erp.as_ref(),
            "account.move",
            Value::Array(domain),
            SearchReadOptions {
                fields: &[
                    "name",
                    "partner_id",
                    "invoice_date",
                    "invoice_date_due",
                    "amount_total_signed",
                    "amount_residual",
                    "payment_state",
                    "currency_id",
                ],
                order: Some("invoice_date desc"),
                limit: Some(limit),
            },
        )
        .await?;

        let facturas: Vec<InvoiceRow> = invoices
            .into_iter()
            .map(|inv| InvoiceRow {
                id: inv.id,
                numero: inv.name,
                cliente: inv.partner_id.name_or("Sin cliente"),
                fecha: inv.invoice_date,
                vencimiento: inv.invoice_date_due,
                total: round2(inv.amount_total_signed.abs()),
                pendiente: round2(inv.amount_residual),
                estado: inv.payment_state.unwrap_or_default(),
                moneda: inv.currency_id.name_or("EUR"),
            })
            .collect();

        let total_facturado = facturas.iter().map(|f| f.total).sum();
        let total_pendiente = facturas.iter().map(|f| f.pendiente).sum();

        Ok(InvoiceList {
            empresa: scope.label,
            periodo: range.label(),
            tipo: if kind == "out_invoice" { "Ventas" } else { "Compras" }.to_string(),
            count: facturas.len(),
            total_facturado: round2(total_facturado),
            total_pendiente: round2(total_pendiente),
            facturas,
        })
    }

    /// Overdue-invoice counters for the navigation badge.
    pub async fn alerts_count(&self, company: Option<&str>) -> Result<AlertCount> {
        let filter = self.resolver.resolve_many(company).await?;
        let now = Utc::now();

        let overdue = overdue_domain(&filter, now.date_naive());
        let count =
            search_count(self.erp.as_ref(), "account.move", Value::Array(overdue.clone())).await?;

        let stale_cutoff = (now - Duration::days(CRITICAL_OVERDUE_DAYS)).date_naive();
        let mut critical_domain = overdue;
        critical_domain.push(json!(["invoice_date_due", "<", stale_cutoff.to_string()]));
        let critical =
            search_count(self.erp.as_ref(), "account.move", Value::Array(critical_domain)).await?;

        Ok(AlertCount { count, critical })
    }

    /// Sum and count of unpaid posted invoices of the given move types.
    async fn pending_residuals(
        &self,
        move_types: [&str; 2],
        filter: &CompanyFilter,
    ) -> Result<(f64, usize)> {
        let mut domain = vec![
            json!(["move_type", "in", move_types]),
            json!(["state", "=", "posted"]),
            json!(["payment_state", "in", ["not_paid", "partial"]]),
        ];
        filter.push_clause(&mut domain);
        let rows: Vec<ResidualRow> = search_read(
            self.erp.as_ref(),
            "account.move",
            Value::Array(domain),
            SearchReadOptions { fields: &["amount_residual"], ..SearchReadOptions::default() },
        )
        .await?;
        let total = rows.iter().map(|row| row.amount_residual).sum();
        Ok((total, rows.len()))
    }
}

/// Ids of the liquidity accounts.
pub(crate) async fn cash_account_ids(erp: &dyn ErpClient) -> Result<Vec<i64>> {
    let accounts: Vec<IdRow> = search_read(
        erp,
        "account.account",
        json!([["account_type", "=", "asset_cash"]]),
        SearchReadOptions { fields: &["id"], ..SearchReadOptions::default() },
    )
    .await?;
    Ok(accounts.into_iter().map(|row| row.id).collect())
}

/// Sums posted journal-line balances grouped by account.
pub(crate) async fn balance_sum(erp: &dyn ErpClient, domain: Vec<Value>) -> Result<f64> {
    let groups =
        read_group(erp, "account.move.line", Value::Array(domain), &["balance"], &["account_id"])
            .await?;
    Ok(groups.iter().map(|row| row.sum("balance")).sum())
}

/// P&L totals for a period, classified by account code.
///
/// Shared with the assistant tools, which report the same numbers in a
/// flat shape.
pub(crate) async fn pnl_totals(
    erp: &dyn ErpClient,
    range: DateRange,
    company_clause: Option<&Value>,
) -> Result<PnlTotals> {
    let accounts: Vec<AccountRow> = search_read(
        erp,
        "account.account",
        json!([["account_type", "in", PNL_ACCOUNT_TYPES]]),
        SearchReadOptions {
            fields: &["id", "code", "name", "account_type"],
            ..SearchReadOptions::default()
        },
    )
    .await?;
    let codes: HashMap<i64, &str> =
        accounts.iter().map(|acc| (acc.id, acc.code.as_str())).collect();
    let account_ids: Vec<i64> = accounts.iter().map(|acc| acc.id).collect();

    let mut domain = vec![
        json!(["account_id", "in", account_ids]),
        json!(["parent_state", "=", "posted"]),
        json!(["date", ">=", range.from.to_string()]),
        json!(["date", "<=", range.to.to_string()]),
    ];
    if let Some(clause) = company_clause {
        domain.push(clause.clone());
    }
    let groups =
        read_group(erp, "account.move.line", Value::Array(domain), &["balance"], &["account_id"])
            .await?;

    let mut totals = PnlTotals::default();
    for row in &groups {
        // Groups whose account vanished between the two queries are skipped.
        let Some((account_id, _)) = row.many2one("account_id") else { continue };
        let Some(code) = codes.get(&account_id) else { continue };
        totals.add(code, row.sum("balance"));
    }
    Ok(totals)
}

/// Search domain for overdue customer invoices as of `today`.
fn overdue_domain(filter: &CompanyFilter, today: NaiveDate) -> Vec<Value> {
    let mut domain = vec![
        json!(["move_type", "=", "out_invoice"]),
        json!(["state", "=", "posted"]),
        json!(["payment_state", "in", ["not_paid", "partial"]]),
        json!(["invoice_date_due", "<", today.to_string()]),
    ];
    filter.push_clause(&mut domain);
    domain
}

/// Days elapsed since the due date's midnight, rounded up.
fn days_overdue(due_date: &str, now: DateTime<Utc>) -> i64 {
    let Ok(due) = NaiveDate::parse_from_str(due_date, "%Y-%m-%d") else {
        return 0;
    };
    let due_start = due.and_time(NaiveTime::MIN).and_utc();
    let elapsed_ms = (now - due_start).num_milliseconds();
    (elapsed_ms as f64 / 86_400_000.0).ceil() as i64
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct AccountRow {
    id: i64,
    code: String,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ResidualRow {
    #[serde(deserialize_with = "zero_when_false")]
    amount_residual: f64,
}

#[derive(Debug, Deserialize)]
struct OverdueRow {
    name: String,
    partner_id: Many2one,
    #[serde(deserialize_with = "zero_when_false")]
    amount_residual: f64,
    invoice_date_due: String,
}

#[derive(Debug, Deserialize)]
struct InvoiceRecord {
    id: i64,
    name: String,
    partner_id: Many2one,
    invoice_date: String,
    #[serde(default, deserialize_with = "false_as_none")]
    invoice_date_due: Option<String>,
    #[serde(deserialize_with = "zero_when_false")]
    amount_total_signed: f64,
    #[serde(deserialize_with = "zero_when_false")]
    amount_residual: f64,
    #[serde(default, deserialize_with = "false_as_none")]
    payment_state: Option<String>,
    currency_id: Many2one,
}
