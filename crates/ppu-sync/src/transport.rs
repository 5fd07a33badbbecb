//! The seam between submit logic and the wire.

use std::path::Path;

use async_trait::async_trait;
use ppu_core::UpdateRecord;
use serde::{Deserialize, Serialize};

use crate::SyncError;

/// A PDF sent along with a bulk update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfAttachment {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl PdfAttachment {
    pub async fn from_path(path: &Path) -> Result<Self, SyncError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| SyncError::Attachment {
                path: path.to_path_buf(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "documento.pdf".to_string());
        Ok(Self { file_name, bytes })
    }
}

/// Body of `POST /api/bulk_update` when no file accompanies the records.
#[derive(Debug, Serialize)]
pub struct BulkUpdateBody<'a> {
    pub registros: &'a [UpdateRecord],
}

/// Body of `POST /api/historiales`.
#[derive(Debug, Serialize)]
pub struct HistoryRequest<'a> {
    pub registro_ppu: [&'a str; 1],
}

/// Success reply of `/api/bulk_update`. The backend may send an empty body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BulkUpdateReply {
    #[serde(default)]
    pub message: Option<String>,
}

impl BulkUpdateReply {
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

/// Outbound calls a submit needs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one submit's records, with the idempotency key of this attempt.
    async fn bulk_update(
        &self,
        records: &[UpdateRecord],
        attachment: Option<&PdfAttachment>,
        idempotency_key: &str,
    ) -> Result<BulkUpdateReply, SyncError>;

    /// Ask the backend for the case's version history.
    async fn refresh_history(&self, case_id: &str) -> Result<(), SyncError>;
}
