use crate::error::Result;
use crate::models::{DiscrepancyReport, Document, ExpectationTable, ReportingPeriod, UnlinkedExpenses};
use crate::package::{merge_pdfs, Artifact, FileFormat};
use crate::service::{audit, period, reconcile};
use crate::source::{DocumentSource, Ledger, ListScope, Session};
use serde::Serialize;
use std::sync::Arc;

/// Period overview: expense audit plus unlinked expense totals
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub period: ReportingPeriod,
    pub discrepancies: DiscrepancyReport,
    pub unlinked_expenses: UnlinkedExpenses,
}

/// One period's documents in merge order
#[derive(Debug, Clone, Serialize)]
pub struct PeriodDocuments {
    pub period: ReportingPeriod,
    pub documents: Vec<Document>,
}

/// Report service: resolves the period, pulls records and runs reconciliation or audit.
///
/// Each call authenticates once and runs its upstream calls one after another.
pub struct ReportService {
    source: Arc<dyn DocumentSource>,
    expectations: ExpectationTable,
}

impl ReportService {
    pub fn new(source: Arc<dyn DocumentSource>, expectations: ExpectationTable) -> Self {
        Self {
            source,
            expectations,
        }
    }

    /// Reporting window for an optional `YYYY-MM-DD` date (default today)
    pub fn period(&self, date: Option<&str>) -> Result<ReportingPeriod> {
        let period = period::report_period_str(date)?;
        tracing::info!("Report for period {}", period);
        Ok(period)
    }

    /// Reconciled income documents: receipts next to their invoices
    pub async fn income_documents(&self, date: Option<&str>) -> Result<PeriodDocuments> {
        let period = self.period(date)?;
        let session = Session::open(self.source.as_ref()).await?;
        let raw = session.list(Ledger::Income, ListScope::Period(period)).await?;
        let documents = reconcile::reconcile(raw, &session).await?;
        Ok(PeriodDocuments { period, documents })
    }

    /// Expense documents as listed by the bookkeeping service
    pub async fn expense_documents(&self, date: Option<&str>) -> Result<PeriodDocuments> {
        let period = self.period(date)?;
        let session = Session::open(self.source.as_ref()).await?;
        let documents = session.list(Ledger::Expense, ListScope::Period(period)).await?;
        Ok(PeriodDocuments { period, documents })
    }

    pub async fn audit_expenses(&self, date: Option<&str>) -> Result<DiscrepancyReport> {
        let expenses = self.expense_documents(date).await?;
        Ok(audit::audit(&expenses.documents, &self.expectations))
    }

    pub async fn unlinked_expenses(&self, date: Option<&str>) -> Result<UnlinkedExpenses> {
        let expenses = self.expense_documents(date).await?;
        Ok(audit::unlinked_expenses(&expenses.documents))
    }

    /// Audit and unlinked totals from a single expense listing
    pub async fn summary(&self, date: Option<&str>) -> Result<ReportSummary> {
        let PeriodDocuments { period, documents } = self.expense_documents(date).await?;
        Ok(ReportSummary {
            period,
            discrepancies: audit::audit(&documents, &self.expectations),
            unlinked_expenses: audit::unlinked_expenses(&documents),
        })
    }

    /// Merged income file (`income.pdf` / `income.zip`)
    pub async fn income_file(&self, date: Option<&str>, format: FileFormat) -> Result<Artifact> {
        let income = self.income_documents(date).await?;
        let merged = merge_pdfs(self.source.as_ref(), &income.documents).await?;
        Artifact::build(Ledger::Income, format, merged)
    }

    /// Merged expense file (`expense.pdf` / `expense.zip`)
    pub async fn expense_file(&self, date: Option<&str>, format: FileFormat) -> Result<Artifact> {
        let expenses = self.expense_documents(date).await?;
        let merged = merge_pdfs(self.source.as_ref(), &expenses.documents).await?;
        Artifact::build(Ledger::Expense, format, merged)
    }
}
