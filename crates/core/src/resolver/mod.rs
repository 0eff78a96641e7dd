//! Company resolution.
//!
//! Report routines take free-text company names ("SMD", "Viper"). The
//! resolver maps them to ERP company ids through an alias table plus a
//! case-insensitive substring match over the memoized company
//! directory, and builds the filter clause routines splice into their
//! search domains.

mod aliases;

use std::sync::Arc;

use mirador_domain::{CompanyEntry, MiradorError, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::erp::{search_read, ErpClient, SearchReadOptions};
use aliases::alias_target;

/// One row of the ERP company directory.
#[derive(Debug, Clone, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
}

/// A resolved single-company scope.
#[derive(Debug, Clone)]
pub struct CompanyMatch {
    /// `None` means the whole group.
    pub id: Option<i64>,
    /// Directory name of the match, or `Todas` when unscoped.
    pub label: String,
}

impl CompanyMatch {
    /// Domain clause over `company_id`, `None` when unscoped.
    pub fn clause(&self) -> Option<Value> {
        self.id.map(|id| json!(["company_id", "=", id]))
    }

    /// Appends the clause to a search domain under construction.
    pub fn push_clause(&self, domain: &mut Vec<Value>) {
        if let Some(clause) = self.clause() {
            domain.push(clause);
        }
    }
}

/// A resolved multi-company scope.
#[derive(Debug, Clone)]
pub struct CompanyFilter {
    ids: Vec<i64>,
    label: String,
}

impl CompanyFilter {
    pub(crate) fn unrestricted() -> Self {
        Self { ids: Vec::new(), label: "Todas".to_string() }
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Domain clause over `company_id`, `None` when unscoped.
    pub fn clause(&self) -> Option<Value> {
        self.clause_for("company_id")
    }

    /// Domain clause over an arbitrary field path, e.g.
    /// `employee_id.company_id` for attendance records.
    pub fn clause_for(&self, field: &str) -> Option<Value> {
        match self.ids.as_slice() {
            [] => None,
            [id] => Some(json!([field, "=", id])),
            ids => Some(json!([field, "in", ids])),
        }
    }

    /// Appends the clause to a search domain under construction.
    pub fn push_clause(&self, domain: &mut Vec<Value>) {
        if let Some(clause) = self.clause() {
            domain.push(clause);
        }
    }
}

/// Resolves company names against the ERP directory.
pub struct CompanyResolver {
    erp: Arc<dyn ErpClient>,
    directory: OnceCell<Vec<Company>>,
}

impl CompanyResolver {
    pub fn new(erp: Arc<dyn ErpClient>) -> Self {
        Self { erp, directory: OnceCell::new() }
    }

    /// The company directory, fetched once per process and reused.
    pub async fn directory(&self) -> Result<&[Company]> {
        let companies = self
            .directory
            .get_or_try_init(|| async {
                let companies: Vec<Company> = search_read(
                    self.erp.as_ref(),
                    "res.company",
                    json!([]),
                    SearchReadOptions {
                        fields: &["id", "name"],
                        order: Some("id asc"),
                        limit: None,
                    },
                )
                .await?;
                debug!(count = companies.len(), "loaded company directory");
                Ok::<_, MiradorError>(companies)
            })
            .await?;
        Ok(companies)
    }

    /// Directory rows in the dashboard payload shape.
    pub async fn entries(&self) -> Result<Vec<CompanyEntry>> {
        Ok(self
            .directory()
            .await?
            .iter()
            .map(|company| CompanyEntry { id: company.id, nombre: company.name.clone() })
            .collect())
    }

    /// Resolves a single optional company name.
    ///
    /// Empty input means the whole group. An unknown name is a
    /// not-found error carrying the name as the caller wrote it.
    pub async fn resolve_one(&self, name: Option<&str>) -> Result<CompanyMatch> {
        let Some(raw) = non_empty(name) else {
            return Ok(CompanyMatch { id: None, label: "Todas".to_string() });
        };
        match self.find(raw).await? {
            Some(company) => Ok(CompanyMatch { id: Some(company.id), label: company.name.clone() }),
            None => Err(MiradorError::NotFound(format!("No se encontró la empresa \"{raw}\"."))),
        }
    }

    /// Resolves a comma-separated list of company names.
    ///
    /// Names that do not resolve are dropped with a warning as long as
    /// at least one does; a fully unresolvable list is an error.
    pub async fn resolve_many(&self, names: Option<&str>) -> Result<CompanyFilter> {
        let Some(raw) = non_empty(names) else {
            return Ok(CompanyFilter::unrestricted());
        };
        let requested: Vec<&str> =
            raw.split(',').map(str::trim).filter(|part| !part.is_empty()).collect();
        if requested.is_empty() {
            return Ok(CompanyFilter::unrestricted());
        }

        let mut ids = Vec::new();
        let mut labels = Vec::new();
        let mut missing = Vec::new();
        for name in &requested {
            match self.find(name).await? {
                Some(company) => {
                    ids.push(company.id);
                    labels.push(company.name.clone());
                }
                None => missing.push(*name),
            }
        }

        if ids.is_empty() {
            return Err(MiradorError::NotFound(format!(
                "No se encontraron las empresas: {}",
                requested.join(", ")
            )));
        }
        if !missing.is_empty() {
            warn!(missing = missing.join(", "), "dropping unresolved company names");
        }
        Ok(CompanyFilter { ids, label: labels.join(", ") })
    }

    async fn find(&self, name: &str) -> Result<Option<&Company>> {
        let term = name.trim().to_lowercase();
        let term = alias_target(&term).map_or(term, str::to_string);
        let directory = self.directory().await?;
        Ok(directory.iter().find(|company| company.name.to_lowercase().contains(&term)))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
