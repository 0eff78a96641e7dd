//! HR report routines: attendance, headcount and payroll cost.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use mirador_domain::{
    round2, AttendanceReport, AttendanceRow, DateRange, DepartmentChart, HeadcountSlice,
    HrSummary, Result,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::erp::{read_group, search_count, search_read, ErpClient, Many2one, SearchReadOptions};
use crate::resolver::{CompanyFilter, CompanyResolver};

/// Chart palette for the department pie.
const DEPARTMENT_COLORS: [&str; 8] = [
    "#8b5cf6", "#06b6d4", "#10b981", "#f59e0b", "#ef4444", "#ec4899", "#3b82f6", "#f97316",
];

/// Payroll expense accounts carry a 640-prefixed code.
const PAYROLL_ACCOUNT_PATTERN: &str = "640%";

/// HR reporting over employees, attendances and timesheets.
pub struct HrReports {
    erp: Arc<dyn ErpClient>,
    resolver: Arc<CompanyResolver>,
}

impl HrReports {
    pub fn new(erp: Arc<dyn ErpClient>, resolver: Arc<CompanyResolver>) -> Self {
        Self { erp, resolver }
    }

    /// Hours worked per employee in the period, busiest first.
    pub async fn attendance(
        &self,
        range: DateRange,
        company: Option<&str>,
    ) -> Result<AttendanceReport> {
        let filter = self.resolver.resolve_many(company).await?;

        // Attendances carry the company through the employee record.
        let mut domain = vec![
            json!(["check_in", ">=", format!("{} 00:00:00", range.from)]),
            json!(["check_in", "<=", format!("{} 23:59:59", range.to)]),
        ];
        if let Some(clause) = filter.clause_for("employee_id.company_id") {
            domain.push(clause);
        }
        let groups = read_group(
            self.erp.as_ref(),
            "hr.attendance",
            Value::Array(domain),
            &["worked_hours", "overtime_hours"],
            &["employee_id"],
        )
        .await?;

        let employee_ids: Vec<i64> =
            groups.iter().filter_map(|row| row.many2one("employee_id").map(|(id, _)| id)).collect();
        let departments: HashMap<i64, Many2one> = if employee_ids.is_empty() {
            HashMap::new()
        } else {
            let employees: Vec<EmployeeRow> = search_read(
                self.erp.as_ref(),
                "hr.employee",
                json!([["id", "in", employee_ids]]),
                SearchReadOptions {
                    fields: &["id", "name", "department_id"],
                    ..SearchReadOptions::default()
                },
            )
            .await?;
            employees.into_iter().map(|employee| (employee.id, employee.department_id)).collect()
        };

        let mut empleados: Vec<AttendanceRow> = groups
            .iter()
            .map(|row| {
                let employee = row.many2one("employee_id");
                let departamento = employee
                    .as_ref()
                    .and_then(|(id, _)| departments.get(id))
                    .and_then(Many2one::name)
                    .map_or_else(|| "Sin departamento".to_string(), ToString::to_string);
                AttendanceRow {
                    nombre: employee.map_or_else(|| "Desconocido".to_string(), |(_, name)| name),
                    horas_trabajadas: round2(row.sum("worked_hours")),
                    horas_extra: round2(row.sum("overtime_hours")),
                    departamento,
                }
            })
            .collect();
        empleados.sort_by(|a, b| {
            b.horas_trabajadas.partial_cmp(&a.horas_trabajadas).unwrap_or(Ordering::Equal)
        });
        Ok(AttendanceReport { empleados })
    }

    /// Headcount, hires in the period, project hours and payroll cost.
    pub async fn summary(&self, range: DateRange, company: Option<&str>) -> Result<HrSummary> {
        let filter = self.resolver.resolve_many(company).await?;
        let from = range.from.to_string();
        let to = range.to.to_string();

        let mut active_domain = vec![json!(["active", "=", true])];
        filter.push_clause(&mut active_domain);
        let empleados_activos =
            search_count(self.erp.as_ref(), "hr.employee", Value::Array(active_domain)).await?;

        // A hire either has a first contract in the period, or no
        // contract at all and a record created in the period.
        let mut altas_domain = vec![
            json!(["active", "in", [true, false]]),
            json!("|"),
            json!("&"),
            json!(["first_contract_date", ">=", from.as_str()]),
            json!(["first_contract_date", "<=", to.as_str()]),
            json!("&"),
            json!(["first_contract_date", "=", false]),
            json!("&"),
            json!(["create_date", ">=", format!("{from} 00:00:00")]),
            json!(["create_date", "<=", format!("{to} 23:59:59")]),
        ];
        filter.push_clause(&mut altas_domain);
        let nuevas_altas =
            search_count(self.erp.as_ref(), "hr.employee", Value::Array(altas_domain)).await?;

        let mut horas_domain = vec![
            json!(["date", ">=", from.as_str()]),
            json!(["date", "<=", to.as_str()]),
            json!(["project_id", "!=", false]),
        ];
        filter.push_clause(&mut horas_domain);
        let horas_groups = read_group(
            self.erp.as_ref(),
            "account.analytic.line",
            Value::Array(horas_domain),
            &["unit_amount"],
            &[],
        )
        .await?;
        let horas_mes = horas_groups.first().map_or(0.0, |row| row.sum("unit_amount"));

        let coste_nomina = self.payroll_cost(&from, &to, &filter).await?;

        Ok(HrSummary {
            empresa: filter.label().to_string(),
            empleados_activos,
            nuevas_altas,
            horas_mes: round2(horas_mes),
            coste_nomina: round2(coste_nomina),
        })
    }

    /// Active employees grouped by department, largest first.
    pub async fn departments(&self, company: Option<&str>) -> Result<DepartmentChart> {
        let filter = self.resolver.resolve_many(company).await?;
        let mut domain = vec![json!(["active", "=", true])];
        filter.push_clause(&mut domain);
        let groups = read_group(
            self.erp.as_ref(),
            "hr.employee",
            Value::Array(domain),
            &["id"],
            &["department_id"],
        )
        .await?;

        let mut data: Vec<HeadcountSlice> = groups
            .iter()
            .enumerate()
            .map(|(i, row)| HeadcountSlice {
                name: row
                    .many2one("department_id")
                    .map_or_else(|| "Sin departamento".to_string(), |(_, name)| name),
                value: row.count("department_id"),
                color: DEPARTMENT_COLORS[i % DEPARTMENT_COLORS.len()].to_string(),
            })
            .filter(|slice| slice.value > 0)
            .collect();
        data.sort_by(|a, b| b.value.cmp(&a.value));
        Ok(DepartmentChart { data })
    }

    /// Sum of posted debits on 640% accounts over the period.
    async fn payroll_cost(&self, from: &str, to: &str, filter: &CompanyFilter) -> Result<f64> {
        let accounts: Vec<IdRow> = search_read(
            self.erp.as_ref(),
            "account.account",
            json!([["code", "=like", PAYROLL_ACCOUNT_PATTERN]]),
            SearchReadOptions { fields: &["id"], ..SearchReadOptions::default() },
        )
        .await?;
        let account_ids: Vec<i64> = accounts.into_iter().map(|row| row.id).collect();

        let mut domain = vec![
            json!(["account_id", "in", account_ids]),
            json!(["parent_state", "=", "posted"]),
            json!(["date", ">=", from]),
            json!(["date", "<=", to]),
        ];
        filter.push_clause(&mut domain);
        let groups = read_group(
            self.erp.as_ref(),
            "account.move.line",
            Value::Array(domain),
            &["debit"],
            &["account_id"],
        )
        .await?;
        Ok(groups.iter().map(|row| row.sum("debit")).sum())
    }
}

#[derive(Debug, Deserialize)]
struct EmployeeRow {
    id: i64,
    department_id: Many2one,
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{directory_fixture, ScriptedErp};

    fn service(erp: Arc<ScriptedErp>) -> HrReports {
        let resolver = Arc::new(CompanyResolver::new(erp.clone()));
        HrReports::new(erp, resolver)
    }

    fn range(from: &str, to: &str) -> DateRange {
        DateRange::parse(from, to).unwrap()
    }

    #[tokio::test]
    async fn attendance_joins_departments_and_sorts_by_hours() {
        let erp = Arc::new(
            ScriptedErp::new()
                .expect(
                    "hr.attendance",
                    "read_group",
                    json!([
                        {"employee_id": [7, "Marta Ruiz"], "worked_hours": 120.336, "overtime_hours": 4.5, "__count": 20},
                        {"employee_id": [9, "Luis Vega"], "worked_hours": 151.0, "overtime_hours": false, "__count": 21},
                        {"employee_id": false, "worked_hours": 8.0, "overtime_hours": false, "__count": 1},
                    ]),
                )
                .expect(
                    "hr.employee",
                    "search_read",
                    json!([
                        {"id": 7, "name": "Marta Ruiz", "department_id": [3, "Operaciones"]},
                        {"id": 9, "name": "Luis Vega", "department_id": false},
                    ]),
                ),
        );

        let report = service(erp.clone())
            .attendance(range("2025-02-01", "2025-02-28"), None)
            .await
            .unwrap();

        assert_eq!(report.empleados.len(), 3);
        assert_eq!(report.empleados[0].nombre, "Luis Vega");
        assert_eq!(report.empleados[0].horas_trabajadas, 151.0);
        assert_eq!(report.empleados[0].horas_extra, 0.0);
        assert_eq!(report.empleados[0].departamento, "Sin departamento");
        assert_eq!(report.empleados[1].nombre, "Marta Ruiz");
        assert_eq!(report.empleados[1].horas_trabajadas, 120.34);
        assert_eq!(report.empleados[1].departamento, "Operaciones");
        assert_eq!(report.empleados[2].nombre, "Desconocido");

        // Check-in bounds expand to full days.
        let calls = erp.recorded_calls();
        assert_eq!(calls[0].args[0][0], json!(["check_in", ">=", "2025-02-01 00:00:00"]));
        assert_eq!(calls[0].args[0][1], json!(["check_in", "<=", "2025-02-28 23:59:59"]));
        assert_eq!(calls[1].args[0][0], json!(["id", "in", [7, 9]]));
    }

    #[tokio::test]
    async fn attendance_scopes_by_company_through_the_employee() {
        let erp = Arc::new(
            ScriptedErp::new()
                .expect("res.company", "search_read", directory_fixture())
                .expect("hr.attendance", "read_group", json!([])),
        );

        let report = service(erp.clone())
            .attendance(range("2025-02-01", "2025-02-28"), Some("samarluan"))
            .await
            .unwrap();

        assert!(report.empleados.is_empty());
        let calls = erp.recorded_calls();
        assert_eq!(calls[1].args[0][2], json!(["employee_id.company_id", "=", 3]));
    }

    #[tokio::test]
    async fn summary_combines_headcount_hours_and_payroll() {
        let erp = Arc::new(
            ScriptedErp::new()
                .expect("hr.employee", "search_count", json!(42))
                .expect("hr.employee", "search_count", json!(3))
                .expect(
                    "account.analytic.line",
                    "read_group",
                    json!([{"unit_amount": 612.257, "__count": 80}]),
                )
                .expect("account.account", "search_read", json!([{"id": 640}, {"id": 641}]))
                .expect(
                    "account.move.line",
                    "read_group",
                    json!([
                        {"account_id": [640, "640000 Sueldos"], "debit": 52000.0, "__count": 10},
                        {"account_id": [641, "640100 Pluses"], "debit": 1999.999, "__count": 2},
                    ]),
                ),
        );

        let summary =
            service(erp.clone()).summary(range("2025-03-01", "2025-03-31"), None).await.unwrap();

        assert_eq!(summary.empresa, "Todas");
        assert_eq!(summary.empleados_activos, 42);
        assert_eq!(summary.nuevas_altas, 3);
        assert_eq!(summary.horas_mes, 612.26);
        assert_eq!(summary.coste_nomina, 54000.0);

        let calls = erp.recorded_calls();
        // Hires: first contract in range, or never contracted and
        // created in range. Archived employees count too.
        assert_eq!(calls[1].args[0][0], json!(["active", "in", [true, false]]));
        assert_eq!(calls[1].args[0][1], json!("|"));
        assert_eq!(calls[1].args[0][6], json!(["first_contract_date", "=", false]));
        assert_eq!(calls[3].args[0], json!([["code", "=like", "640%"]]));
        erp.assert_exhausted();
    }

    #[tokio::test]
    async fn departments_drops_empty_groups_and_sorts_by_headcount() {
        let erp = Arc::new(ScriptedErp::new().expect(
            "hr.employee",
            "read_group",
            json!([
                {"department_id": [3, "Operaciones"], "__count": 5},
                {"department_id": false, "department_id_count": 12},
                {"department_id": [4, "Ventas"], "__count": 0},
            ]),
        ));

        let chart = service(erp).departments(None).await.unwrap();

        assert_eq!(chart.data.len(), 2);
        assert_eq!(chart.data[0].name, "Sin departamento");
        assert_eq!(chart.data[0].value, 12);
        // Palette position follows the raw group order, so the second
        // group keeps the second color after empty groups are dropped.
        assert_eq!(chart.data[0].color, "#06b6d4");
        assert_eq!(chart.data[1].name, "Operaciones");
        assert_eq!(chart.data[1].color, "#8b5cf6");
    }
}
