//! Case search with caller-owned cancellation.
//!
//! Each search box owns a [`SearchSession`]. Starting a new search cancels
//! the one before it, so a slow stale response can never overwrite a newer
//! one. Nothing here is shared between sessions.

use std::sync::Arc;
use std::time::Duration;

use ppu_core::CaseSnapshot;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::SyncError;

/// Delay between the last keystroke and the request.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Cancellation handle passed into a network call by its owner.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Run `fut` unless the handle is cancelled first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, SyncError>>,
    {
        if self.is_cancelled() {
            return Err(SyncError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(SyncError::Cancelled),
            result = fut => result,
        }
    }
}

/// Parameters of `GET /api/buscar`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub page: u32,
    pub query: String,
    /// Lawyer selection as shown in the filter, e.g. `"12; PÉREZ"`.
    pub lawyer: Option<String>,
    pub show_archived: bool,
}

impl SearchQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("page", self.page.max(1).to_string()),
            ("query", self.query.clone()),
            ("abogado", lawyer_filter_value(self.lawyer.as_deref())),
            ("mostrar_archivados", self.show_archived.to_string()),
        ]
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub data: Vec<CaseSnapshot>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_records: u64,
}

/// The backend filters on the lawyer name only: `"CODE; NAME"` becomes `NAME`.
pub fn lawyer_filter_value(selection: Option<&str>) -> String {
    let Some(value) = selection else {
        return String::new();
    };
    match value.split_once(';') {
        Some((_, name)) => name.split(';').next().unwrap_or("").trim().to_string(),
        None => value.trim().to_string(),
    }
}

/// Search state of a single search box.
#[derive(Debug)]
pub struct SearchSession {
    debounce: Duration,
    current: Option<CancelHandle>,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl SearchSession {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            current: None,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Cancel the previous search and hand out the handle for the next one.
    pub fn begin(&mut self) -> CancelHandle {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
        let handle = CancelHandle::new();
        self.current = Some(handle.clone());
        handle
    }

    /// Cancel whatever is in flight without starting anything.
    pub fn cancel(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.cancel();
        }
    }
}

/// Wait out the debounce window, then run `fetch`, both under `handle`.
pub async fn debounced<F, T>(
    handle: &CancelHandle,
    debounce: Duration,
    fetch: F,
) -> Result<T, SyncError>
where
    F: Future<Output = Result<T, SyncError>>,
{
    handle
        .run(async {
            tokio::time::sleep(debounce).await;
            Ok(())
        })
        .await?;
    handle.run(fetch).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lawyer_filter_takes_name_part() {
        assert_eq!(lawyer_filter_value(Some("12; PÉREZ")), "PÉREZ");
        assert_eq!(lawyer_filter_value(Some("  GARCÍA ")), "GARCÍA");
        assert_eq!(lawyer_filter_value(Some("1;LUNA;X")), "LUNA");
        assert_eq!(lawyer_filter_value(None), "");
    }

    #[test]
    fn query_params() {
        let q = SearchQuery {
            page: 0,
            query: "robo".into(),
            lawyer: Some("3; ROJAS".into()),
            show_archived: true,
        };
        assert_eq!(
            q.params(),
            vec![
                ("page", "1".to_string()),
                ("query", "robo".to_string()),
                ("abogado", "ROJAS".to_string()),
                ("mostrar_archivados", "true".to_string()),
            ]
        );
    }

    #[test]
    fn search_page_json() {
        let json = r#"{
            "data": [{"registro_ppu": "D-1-2025", "denunciado": "ANA", "origen": "x"}],
            "page": 1, "total_pages": 4, "total_records": 37
        }"#;
        let page: SearchPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].case_id(), Some("D-1-2025"));
        assert_eq!(page.total_records, 37);
    }

    #[test]
    fn new_search_cancels_previous() {
        let mut session = SearchSession::new(Duration::ZERO);
        let first = session.begin();
        assert!(!first.is_cancelled());
        let second = session.begin();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        session.cancel();
        assert!(second.is_cancelled());
    }

    #[test]
    fn sessions_do_not_share_handles() {
        let mut a = SearchSession::new(Duration::ZERO);
        let mut b = SearchSession::new(Duration::ZERO);
        let ha = a.begin();
        let _hb = b.begin();
        b.begin();
        assert!(!ha.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_handle_short_circuits() {
        let handle = CancelHandle::new();
        handle.cancel();
        let result: Result<u32, _> = handle.run(async { Ok(1) }).await;
        assert!(matches!(result, Err(SyncError::Cancelled)));
    }

    #[tokio::test]
    async fn cancel_interrupts_pending_work() {
        let handle = CancelHandle::new();
        let clone = handle.clone();
        let task = tokio::spawn(async move {
            clone
                .run(async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(())
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("cancel should stop the task")
            .unwrap();
        assert!(matches!(result, Err(SyncError::Cancelled)));
    }

    #[tokio::test]
    async fn superseded_search_never_fetches() {
        let mut session = SearchSession::new(Duration::from_millis(200));
        let stale = session.begin();
        let debounce = session.debounce();
        let task = tokio::spawn(async move {
            debounced(&stale, debounce, async { Ok::<_, SyncError>("stale") }).await
        });
        let fresh = session.begin();

        let stale_result = task.await.unwrap();
        assert!(matches!(stale_result, Err(SyncError::Cancelled)));

        let fresh_result = debounced(&fresh, Duration::ZERO, async { Ok("fresh") }).await;
        assert_eq!(fresh_result.unwrap(), "fresh");
    }
}
