//! The bookkeeping service: authentication, record listing, lookup and file download.

pub mod client;

pub use client::HttpDocumentSource;

use crate::error::Result;
use crate::models::{Document, ReportingPeriod};
use async_trait::async_trait;

/// Which ledger of the bookkeeping service to query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ledger {
    Income,
    Expense,
}

impl Ledger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ledger::Income => "income",
            Ledger::Expense => "expense",
        }
    }
}

/// Date range of a listing call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    Period(ReportingPeriod),
    /// Every record, ignoring dates
    All,
}

/// Bearer token returned by [`DocumentSource::authenticate`]
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn authenticate(&self) -> Result<AccessToken>;

    async fn list_documents(
        &self,
        token: &AccessToken,
        ledger: Ledger,
        scope: ListScope,
    ) -> Result<Vec<Document>>;

    /// Looks one document up by number; `NotFound` when the service has none
    async fn get_document(&self, token: &AccessToken, ledger: Ledger, number: &str)
        -> Result<Document>;

    /// Fetches file bytes; `Ok(None)` when the server answers with a non-success status
    async fn download(&self, url: &str) -> Result<Option<Vec<u8>>>;

    /// Language used to pick income document links
    fn download_language(&self) -> &str {
        "he"
    }
}

/// Single-document lookup used by reconciliation to pull invoices from earlier periods
#[async_trait]
pub trait DocumentLookup: Send + Sync {
    async fn fetch_by_number(&self, number: &str) -> Result<Document>;
}

/// A source paired with the token of the current request
pub struct Session<'a> {
    source: &'a dyn DocumentSource,
    token: AccessToken,
}

impl<'a> Session<'a> {
    /// Authenticates once; every call of this session reuses the token
    pub async fn open(source: &'a dyn DocumentSource) -> Result<Session<'a>> {
        let token = source.authenticate().await?;
        Ok(Self { source, token })
    }

    pub async fn list(&self, ledger: Ledger, scope: ListScope) -> Result<Vec<Document>> {
        self.source.list_documents(&self.token, ledger, scope).await
    }
}

#[async_trait]
impl DocumentLookup for Session<'_> {
    async fn fetch_by_number(&self, number: &str) -> Result<Document> {
        self.source.get_document(&self.token, Ledger::Income, number).await
    }
}
