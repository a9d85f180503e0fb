use super::{AccessToken, DocumentSource, Ledger, ListScope};
use crate::config::SourceConfig;
use crate::error::{ReportError, Result};
use crate::models::{Document, DocumentPage};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Serialize)]
struct TokenRequest<'a> {
    id: &'a str,
    secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

/// JSON-over-HTTP client of the bookkeeping service
#[derive(Clone)]
pub struct HttpDocumentSource {
    client: Client,
    config: SourceConfig,
}

impl HttpDocumentSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn ledger_url(&self, ledger: Ledger) -> &str {
        match ledger {
            Ledger::Income => &self.config.income_url,
            Ledger::Expense => &self.config.expense_url,
        }
    }

    /// Posts to a ledger endpoint and decodes the `items` envelope
    async fn post_ledger(
        &self,
        token: &AccessToken,
        ledger: Ledger,
        body: Option<serde_json::Value>,
    ) -> Result<Vec<Document>> {
        let mut request = self
            .client
            .post(self.ledger_url(ledger))
            .bearer_auth(token.as_str());
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReportError::Source(format!("{} request failed: {}", ledger.as_str(), e)))?;
        let response = ensure_success(response, ledger).await?;
        let page: DocumentPage = response
            .json()
            .await
            .map_err(|e| ReportError::Decode(format!("{} listing: {}", ledger.as_str(), e)))?;
        Ok(page.items)
    }
}

async fn ensure_success(response: Response, ledger: Ledger) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ReportError::Source(format!(
        "{} endpoint answered {}: {}",
        ledger.as_str(),
        status,
        body
    )))
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn authenticate(&self) -> Result<AccessToken> {
        let response = self
            .client
            .post(&self.config.token_url)
            .json(&TokenRequest {
                id: &self.config.api_key,
                secret: &self.config.secret,
            })
            .send()
            .await
            .map_err(|e| ReportError::Authentication(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReportError::Authentication(format!("token endpoint answered {}", status)));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ReportError::Authentication(format!("no token in response: {}", e)))?;
        tracing::debug!("Obtained bookkeeping service token");
        Ok(AccessToken(body.token))
    }

    async fn list_documents(
        &self,
        token: &AccessToken,
        ledger: Ledger,
        scope: ListScope,
    ) -> Result<Vec<Document>> {
        let body = match scope {
            ListScope::Period(period) => Some(json!({
                "fromDate": period.start(),
                "toDate": period.end(),
            })),
            ListScope::All => None,
        };
        let items = self.post_ledger(token, ledger, body).await?;
        tracing::info!("Fetched {} {} records ({:?})", items.len(), ledger.as_str(), scope);
        Ok(items)
    }

    async fn get_document(
        &self,
        token: &AccessToken,
        ledger: Ledger,
        number: &str,
    ) -> Result<Document> {
        let items = self
            .post_ledger(token, ledger, Some(json!({ "number": number })))
            .await?;
        items
            .into_iter()
            .next()
            .ok_or_else(|| ReportError::NotFound(number.to_string()))
    }

    async fn download(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ReportError::Source(format!("download failed: {}", e)))?;

        if !response.status().is_success() {
            tracing::warn!("Download of {} answered {}", url, response.status());
            return Ok(None);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ReportError::Source(format!("download interrupted: {}", e)))?;
        Ok(Some(bytes.to_vec()))
    }

    fn download_language(&self) -> &str {
        &self.config.download_language
    }
}
