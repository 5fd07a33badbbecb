//! Submit flow for one edit form.
//!
//! A submit assembles the records, delivers them in one call and, on
//! success, fires a history refresh whose outcome nobody waits for.
//! While a submit is outstanding, further submits are refused.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ppu_core::{EditSession, UpdateRecord};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::SyncError;
use crate::transport::{BulkUpdateReply, PdfAttachment, Transport};

/// Message shown after a successful save.
pub const SAVED_MESSAGE: &str = "¡Registro guardado correctamente!";

/// Result of a delivered submit.
#[derive(Debug)]
pub struct SubmitOutcome {
    pub records: Vec<UpdateRecord>,
    pub idempotency_key: Uuid,
    pub reply: BulkUpdateReply,
    /// The background history refresh. Dropping it detaches the task;
    /// a short-lived process may await it before exiting.
    pub history_refresh: Option<JoinHandle<()>>,
}

/// Submits for one form, serialized by an in-flight flag.
pub struct SubmitSession<T: Transport + 'static> {
    transport: Arc<T>,
    in_flight: Arc<AtomicBool>,
}

impl<T: Transport + 'static> Clone for SubmitSession<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

/// Clears the in-flight flag when the submit finishes, however it finishes.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, SyncError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::SubmitInFlight)?;
        Ok(Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T: Transport + 'static> SubmitSession<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Assemble and deliver the form's records.
    ///
    /// Guard failures return before any network call. The form is only
    /// borrowed, so a failed submit can be retried as-is; each retry gets a
    /// fresh idempotency key.
    pub async fn submit(
        &self,
        form: &EditSession,
        attachment: Option<&PdfAttachment>,
    ) -> Result<SubmitOutcome, SyncError> {
        let _guard = InFlight::acquire(&self.in_flight)?;

        let records = form.records_now()?;
        let idempotency_key = Uuid::new_v4();
        info!(
            case_id = ?form.case_id,
            count = records.len(),
            key = %idempotency_key,
            "submitting update"
        );

        let reply = self
            .transport
            .bulk_update(&records, attachment, &idempotency_key.to_string())
            .await?;

        let history_refresh = form
            .case_id
            .clone()
            .map(|case_id| self.spawn_history_refresh(case_id));

        Ok(SubmitOutcome {
            records,
            idempotency_key,
            reply,
            history_refresh,
        })
    }

    fn spawn_history_refresh(&self, case_id: String) -> JoinHandle<()> {
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            if let Err(e) = transport.refresh_history(&case_id).await {
                debug!(case_id = %case_id, error = %e, "history refresh failed");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use ppu_core::{AssembleError, CaseSnapshot, DeadlineKind, FormField};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct FakeTransport {
        sent: Mutex<Vec<(Vec<UpdateRecord>, Option<String>, String)>>,
        refreshed: Mutex<Vec<String>>,
        refresh_done: Notify,
        fail_with: Option<(u16, String)>,
        fail_refresh: bool,
        entered: Notify,
        gate: Option<Notify>,
    }

    impl FakeTransport {
        fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn bulk_update(
            &self,
            records: &[UpdateRecord],
            attachment: Option<&PdfAttachment>,
            idempotency_key: &str,
        ) -> Result<BulkUpdateReply, SyncError> {
            self.entered.notify_one();
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.sent.lock().unwrap().push((
                records.to_vec(),
                attachment.map(|a| a.file_name.clone()),
                idempotency_key.to_string(),
            ));
            match &self.fail_with {
                Some((status, message)) => Err(SyncError::Server {
                    status: *status,
                    message: message.clone(),
                }),
                None => Ok(BulkUpdateReply::default()),
            }
        }

        async fn refresh_history(&self, case_id: &str) -> Result<(), SyncError> {
            self.refreshed.lock().unwrap().push(case_id.to_string());
            self.refresh_done.notify_one();
            if self.fail_refresh {
                Err(SyncError::Server {
                    status: 500,
                    message: "Error al conectar con la base de datos".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn open_case() -> EditSession {
        EditSession::open(&CaseSnapshot {
            registro_ppu: Some("D-55-2025".into()),
            e_situacional: Some("EN TRÁMITE".into()),
            denunciado: Some("LUIS TORRES".into()),
            ..Default::default()
        })
    }

    fn ambos_case() -> EditSession {
        let mut form = open_case();
        form.toggle_kind(DeadlineKind::Ambos);
        form.edit(FormField::HearingDate, "10102025");
        form.edit(FormField::HearingTime, "1000");
        form.edit(FormField::TermDays, "7");
        form
    }

    #[tokio::test]
    async fn ambos_sends_two_records_in_one_call() {
        let transport = Arc::new(FakeTransport::default());
        let submitter = SubmitSession::new(Arc::clone(&transport));

        let outcome = submitter.submit(&ambos_case(), None).await.unwrap();
        assert_eq!(outcome.records.len(), 2);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (records, attachment, key) = &sent[0];
        assert_eq!(records[0].kind, Some(DeadlineKind::Audiencia));
        assert_eq!(records[1].kind, Some(DeadlineKind::Requerimiento));
        assert_eq!(records[0].case_id, records[1].case_id);
        assert_eq!(records[0].label, records[1].label);
        assert!(attachment.is_none());
        assert_eq!(key, &outcome.idempotency_key.to_string());
    }

    #[tokio::test]
    async fn guard_failure_never_reaches_transport() {
        let transport = Arc::new(FakeTransport::default());
        let submitter = SubmitSession::new(Arc::clone(&transport));

        let mut form = open_case();
        form.toggle_kind(DeadlineKind::Requerimiento);
        form.edit(FormField::TermDays, "5");
        form.edit(FormField::TermDays, "");

        let err = submitter.submit(&form, None).await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Assemble(AssembleError::InvalidTermDays)
        ));
        assert_eq!(transport.sent_count(), 0);
        assert!(!submitter.is_in_flight());
    }

    #[tokio::test]
    async fn missing_case_id_never_reaches_transport() {
        let transport = Arc::new(FakeTransport::default());
        let submitter = SubmitSession::new(Arc::clone(&transport));

        let err = submitter
            .submit(&EditSession::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Assemble(AssembleError::MissingCaseId)));
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn second_submit_refused_while_first_outstanding() {
        let transport = Arc::new(FakeTransport {
            gate: Some(Notify::new()),
            ..Default::default()
        });
        let submitter = SubmitSession::new(Arc::clone(&transport));
        let form = ambos_case();

        let first = {
            let submitter = submitter.clone();
            let form = form.clone();
            tokio::spawn(async move { submitter.submit(&form, None).await })
        };
        transport.entered.notified().await;
        assert!(submitter.is_in_flight());

        let second = submitter.submit(&form, None).await;
        assert!(matches!(second, Err(SyncError::SubmitInFlight)));

        transport.gate.as_ref().unwrap().notify_one();
        let first = first.await.unwrap().unwrap();
        assert_eq!(transport.sent_count(), 1);
        assert!(!submitter.is_in_flight());

        // Released: a new attempt goes through with a different key.
        transport.gate.as_ref().unwrap().notify_one();
        let third = submitter.submit(&form, None).await.unwrap();
        assert_ne!(first.idempotency_key, third.idempotency_key);
        assert_eq!(transport.sent_count(), 2);
    }

    #[tokio::test]
    async fn backend_error_keeps_form_and_frees_lock() {
        let transport = Arc::new(FakeTransport {
            fail_with: Some((403, "No autorizado".into())),
            ..Default::default()
        });
        let submitter = SubmitSession::new(Arc::clone(&transport));
        let form = ambos_case();
        let before = form.clone();

        let err = submitter.submit(&form, None).await.unwrap_err();
        assert_eq!(err.user_message(), "No autorizado");
        assert_eq!(form, before);
        assert!(!submitter.is_in_flight());
        assert!(transport.refreshed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_refresh_runs_after_success_and_failure_is_swallowed() {
        let transport = Arc::new(FakeTransport {
            fail_refresh: true,
            ..Default::default()
        });
        let submitter = SubmitSession::new(Arc::clone(&transport));

        let outcome = submitter.submit(&open_case(), None).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), transport.refresh_done.notified())
            .await
            .expect("history refresh should run");
        outcome.history_refresh.unwrap().await.unwrap();
        assert_eq!(*transport.refreshed.lock().unwrap(), vec!["D-55-2025".to_string()]);
    }

    #[tokio::test]
    async fn attachment_is_forwarded() {
        let transport = Arc::new(FakeTransport::default());
        let submitter = SubmitSession::new(Arc::clone(&transport));
        let pdf = PdfAttachment {
            file_name: "resolucion.pdf".into(),
            bytes: b"%PDF-1.4".to_vec(),
        };

        submitter.submit(&open_case(), Some(&pdf)).await.unwrap();
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].1.as_deref(), Some("resolucion.pdf"));
    }
}
