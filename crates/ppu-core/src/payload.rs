//! Submit-time assembly of `/api/bulk_update` records.
//!
//! Guards run in a fixed order and the first failure aborts the whole submit:
//!
//! 1. the case must already have a `registro_ppu`
//! 2. a touched requirement term must still contain digits
//! 3. no tracked field may carry an error
//!
//! A term emptied through the form is also flagged by the live check; it is
//! reported as a term error only when no other field is pending.
//!
//! Only then are records built: one per deadline half, or a single
//! metadata-only record when no deadline is selected.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::case::SiNo;
use crate::deadline::{Deadline, DeadlineForm, DeadlineKind, Hearing, Requirement};
use crate::fields::{self, TrackedField, ValidationErrors};

/// Marker appended to a hearing action when the hearing was rescheduled.
pub const RESCHEDULED_SUFFIX: &str = " -REPROGRAMADA";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssembleError {
    #[error("Primero guarda el caso para obtener el Registro PPU.")]
    MissingCaseId,
    #[error("Corrige los campos marcados antes de guardar: {}", field_list(.0))]
    ValidationPending(Vec<TrackedField>),
    #[error("El plazo del requerimiento debe contener solo números.")]
    InvalidTermDays,
}

fn field_list(fields: &[TrackedField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fields shared by every record of one submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommonCaseFields {
    /// `registro_ppu`; `None` until the case has been saved.
    pub case_id: Option<String>,
    /// The composed e_situacional label.
    pub label: String,
}

/// One record in the `registros` array of `/api/bulk_update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecord {
    #[serde(rename = "registro_ppu")]
    pub case_id: String,
    #[serde(rename = "e_situacional")]
    pub label: String,
    #[serde(rename = "denunciado")]
    pub defendant: String,
    /// ISO `YYYY-MM-DD`, taken at submit time.
    #[serde(rename = "fecha_ingreso")]
    pub ingestion_date: String,
    #[serde(rename = "reprogramacion")]
    pub rescheduled: SiNo,
    /// The notification date travels in the backend's `fecha_atencion` column.
    #[serde(rename = "fecha_atencion", skip_serializing_if = "Option::is_none", default)]
    pub notification_date: Option<String>,
    #[serde(rename = "tipoPlazo", skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<DeadlineKind>,
    #[serde(rename = "audiencia", skip_serializing_if = "Option::is_none", default)]
    pub hearing: Option<bool>,
    #[serde(rename = "accion", skip_serializing_if = "Option::is_none", default)]
    pub action: Option<String>,
    /// Hearing: `"{date} {time} {meridiem}"`. Requirement: the day count.
    #[serde(rename = "plazo_atencion", skip_serializing_if = "Option::is_none", default)]
    pub attention: Option<String>,
}

impl UpdateRecord {
    fn hearing(base: &UpdateRecord, hearing: &Hearing) -> Self {
        let mut action = hearing.action.clone();
        if base.rescheduled.is_si() {
            action.push_str(RESCHEDULED_SUFFIX);
        }
        Self {
            kind: Some(DeadlineKind::Audiencia),
            hearing: Some(true),
            action: Some(action),
            attention: Some(hearing.attention()),
            ..base.clone()
        }
    }

    fn requirement(base: &UpdateRecord, requirement: &Requirement) -> Self {
        Self {
            kind: Some(DeadlineKind::Requerimiento),
            hearing: Some(false),
            action: Some(requirement.action.clone()),
            attention: Some(requirement.term_days.clone()),
            ..base.clone()
        }
    }
}

/// Validate the form and build the records for one submit.
///
/// `today` becomes every record's ingestion date. Nothing is returned unless
/// every guard passes.
pub fn assemble(
    common: &CommonCaseFields,
    form: &DeadlineForm,
    errors: &ValidationErrors,
    today: NaiveDate,
) -> Result<Vec<UpdateRecord>, AssembleError> {
    let case_id = common
        .case_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(AssembleError::MissingCaseId)?;

    // An emptied term is also flagged live; report it as the term error
    // unless other fields are pending too.
    let pending = errors.pending();
    let term_days_emptied = form.kind.is_some_and(DeadlineKind::has_requirement)
        && form
            .term_days
            .as_deref()
            .is_some_and(|raw| fields::digits_only(raw).is_empty());
    if term_days_emptied && pending.iter().all(|f| *f == TrackedField::TermDays) {
        return Err(AssembleError::InvalidTermDays);
    }
    if !pending.is_empty() {
        return Err(AssembleError::ValidationPending(pending));
    }

    let base = UpdateRecord {
        case_id: case_id.to_string(),
        label: common.label.clone(),
        defendant: form.defendant.clone(),
        ingestion_date: today.format("%Y-%m-%d").to_string(),
        rescheduled: form.rescheduled,
        notification_date: Some(form.notification_date.clone()).filter(|d| !d.is_empty()),
        kind: None,
        hearing: None,
        action: None,
        attention: None,
    };

    let records = match form.deadline() {
        Deadline::NoDeadline => vec![base],
        Deadline::Audiencia(hearing) => {
            let mut record = UpdateRecord::hearing(&base, &hearing);
            // A lone hearing always restates the notification date, even when blank.
            record.notification_date = Some(form.notification_date.clone());
            vec![record]
        }
        Deadline::Requerimiento(requirement) => {
            vec![UpdateRecord::requirement(&base, &requirement)]
        }
        Deadline::Ambos(hearing, requirement) => vec![
            UpdateRecord::hearing(&base, &hearing),
            UpdateRecord::requirement(&base, &requirement),
        ],
    };

    debug!(
        case_id,
        kind = form.kind.map(DeadlineKind::as_str).unwrap_or("NONE"),
        count = records.len(),
        "assembled update records"
    );
    Ok(records)
}

/// [`assemble`] with today's UTC date.
pub fn assemble_now(
    common: &CommonCaseFields,
    form: &DeadlineForm,
    errors: &ValidationErrors,
) -> Result<Vec<UpdateRecord>, AssembleError> {
    assemble(common, form, errors, chrono::Utc::now().date_naive())
}
