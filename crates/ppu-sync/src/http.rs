//! HTTP client for the registro PPU backend.

use async_trait::async_trait;
use ppu_core::UpdateRecord;
use reqwest::multipart::{Form, Part};
use tracing::{info, warn};

use crate::search::{CancelHandle, SearchPage, SearchQuery};
use crate::transport::{BulkUpdateBody, BulkUpdateReply, HistoryRequest, PdfAttachment, Transport};
use crate::{SyncError, server_message};

/// Header carrying the per-attempt idempotency token.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// HTTP client for the backend's `/api` endpoints.
#[derive(Debug, Clone)]
pub struct SyncClient {
    client: reqwest::Client,
    base_url: String,
}

impl SyncClient {
    /// Create a new client for the given backend base URL.
    ///
    /// `base_url` should be like `http://localhost:5001` (no trailing slash).
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Search cases. Resolves to [`SyncError::Cancelled`] as soon as `cancel`
    /// fires, without waiting for the response.
    pub async fn search_cases(
        &self,
        query: &SearchQuery,
        cancel: &CancelHandle,
    ) -> Result<SearchPage, SyncError> {
        cancel
            .run(async {
                let url = self.url("/api/buscar");
                info!(url = %url, query = %query.query, page = query.page, "searching cases");
                let resp = self.client.get(&url).query(&query.params()).send().await?;
                let body = checked_body(resp).await?;
                let page: SearchPage = serde_json::from_str(&body)?;
                info!(
                    results = page.data.len(),
                    total = page.total_records,
                    "search complete"
                );
                Ok(page)
            })
            .await
    }
}

/// Read the body, turning a non-2xx status into [`SyncError::Server`].
async fn checked_body(resp: reqwest::Response) -> Result<String, SyncError> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        let message = server_message(status.as_u16(), &body);
        warn!(status = status.as_u16(), message = %message, "backend rejected request");
        return Err(SyncError::Server {
            status: status.as_u16(),
            message,
        });
    }
    Ok(body)
}

#[async_trait]
impl Transport for SyncClient {
    async fn bulk_update(
        &self,
        records: &[UpdateRecord],
        attachment: Option<&PdfAttachment>,
        idempotency_key: &str,
    ) -> Result<BulkUpdateReply, SyncError> {
        let url = self.url("/api/bulk_update");
        let request = self
            .client
            .post(&url)
            .header(IDEMPOTENCY_HEADER, idempotency_key);

        let request = match attachment {
            Some(pdf) => {
                info!(
                    url = %url,
                    count = records.len(),
                    file = %pdf.file_name,
                    "pushing bulk update with attachment"
                );
                let part = Part::bytes(pdf.bytes.clone())
                    .file_name(pdf.file_name.clone())
                    .mime_str("application/pdf")?;
                let form = Form::new()
                    .part("pdfs", part)
                    .text("registros", serde_json::to_string(records)?);
                request.multipart(form)
            }
            None => {
                info!(url = %url, count = records.len(), "pushing bulk update");
                request.json(&BulkUpdateBody { registros: records })
            }
        };

        let body = checked_body(request.send().await?).await?;
        let reply = BulkUpdateReply::from_body(&body);
        info!(message = ?reply.message, "bulk update accepted");
        Ok(reply)
    }

    async fn refresh_history(&self, case_id: &str) -> Result<(), SyncError> {
        let url = self.url("/api/historiales");
        let resp = self
            .client
            .post(&url)
            .json(&HistoryRequest {
                registro_ppu: [case_id],
            })
            .send()
            .await?;
        checked_body(resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_client_trims_trailing_slash() {
        let client = SyncClient::new("http://localhost:5001/".into());
        assert_eq!(client.base_url(), "http://localhost:5001");
        assert_eq!(client.url("/api/buscar"), "http://localhost:5001/api/buscar");
    }

    #[tokio::test]
    async fn cancelled_search_never_sends() {
        // Port 9 is discard; nothing is contacted because the handle is already cancelled.
        let client = SyncClient::new("http://127.0.0.1:9".into());
        let cancel = CancelHandle::new();
        cancel.cancel();
        let result = client.search_cases(&SearchQuery::default(), &cancel).await;
        assert!(matches!(result, Err(SyncError::Cancelled)));
    }
}
