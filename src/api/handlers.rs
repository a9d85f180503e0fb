use super::AppState;
use crate::error::{ReportError, Result};
use crate::models::{DiscrepancyReport, ReportingPeriod, UnlinkedExpenses};
use crate::package::{Artifact, FileFormat};
use crate::service::audit::unlinked_expenses_csv;
use crate::service::{PeriodDocuments, ReportSummary};
use axum::{
    extract::{Json, Query, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

/// Header carrying the number of documents left out of a merged file
pub const SKIPPED_HEADER: &str = "x-skipped-documents";

/// Query string: optional `YYYY-MM-DD` date (default today) and output format
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub date: Option<String>,
    pub format: Option<String>,
}

impl ReportQuery {
    fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    fn file_format(&self) -> Result<FileFormat> {
        self.format.as_deref().unwrap_or_default().parse()
    }
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn period(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportingPeriod>> {
    Ok(Json(state.service.period(query.date())?))
}

/// Period, expense audit and unlinked expenses in one answer
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportSummary>> {
    Ok(Json(state.service.summary(query.date()).await?))
}

/// Reconciled income documents in merge order
pub async fn income_documents(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<PeriodDocuments>> {
    Ok(Json(state.service.income_documents(query.date()).await?))
}

pub async fn expense_audit(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<DiscrepancyReport>> {
    Ok(Json(state.service.audit_expenses(query.date()).await?))
}

/// Expenses without a document, summed per supplier; `format=csv` for a CSV download
pub async fn unlinked_expenses(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response> {
    let wants_csv = match query.format.as_deref().map(str::to_ascii_lowercase) {
        None => false,
        Some(f) if f.is_empty() || f == "json" => false,
        Some(f) if f == "csv" => true,
        Some(other) => {
            return Err(ReportError::InvalidInput(format!("unsupported format '{}'", other)))
        }
    };

    let totals: UnlinkedExpenses = state.service.unlinked_expenses(query.date()).await?;
    if !wants_csv {
        return Ok(Json(totals).into_response());
    }
    let csv = unlinked_expenses_csv(&totals)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"unlinked-expenses.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}

/// Merged income documents as `income.pdf` or `income.zip`
pub async fn income_file(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response> {
    let format = query.file_format()?;
    let artifact = state.service.income_file(query.date(), format).await?;
    Ok(file_response(artifact))
}

/// Merged expense documents as `expense.pdf` or `expense.zip`
pub async fn expense_file(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Response> {
    let format = query.file_format()?;
    let artifact = state.service.expense_file(query.date(), format).await?;
    Ok(file_response(artifact))
}

fn file_response(artifact: Artifact) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (
                HeaderName::from_static(SKIPPED_HEADER),
                artifact.skipped.len().to_string(),
            ),
        ],
        artifact.bytes,
    )
        .into_response()
}
