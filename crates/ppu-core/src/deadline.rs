//! Deadline ("plazo") form state and its live edit rules.
//!
//! The form keeps every field for the whole session so switching kinds does
//! not lose input. [`DeadlineForm::deadline`] projects it into a [`Deadline`]
//! that carries only what the selected kind uses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::case::{CaseSnapshot, Meridiem, SiNo};
use crate::fields::{self, TrackedField, ValidationErrors};

/// Deadline kind offered by the form. No selection means no deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeadlineKind {
    Audiencia,
    Requerimiento,
    Ambos,
}

impl DeadlineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Audiencia => "AUDIENCIA",
            Self::Requerimiento => "REQUERIMIENTO",
            Self::Ambos => "AMBOS",
        }
    }

    /// Kinds that carry a requirement term.
    pub fn has_requirement(self) -> bool {
        matches!(self, Self::Requerimiento | Self::Ambos)
    }

    pub fn has_hearing(self) -> bool {
        matches!(self, Self::Audiencia | Self::Ambos)
    }
}

impl fmt::Display for DeadlineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown deadline kind {0:?} (expected AUDIENCIA, REQUERIMIENTO or AMBOS)")]
pub struct ParseDeadlineKindError(String);

impl FromStr for DeadlineKind {
    type Err = ParseDeadlineKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AUDIENCIA" => Ok(Self::Audiencia),
            "REQUERIMIENTO" => Ok(Self::Requerimiento),
            "AMBOS" => Ok(Self::Ambos),
            _ => Err(ParseDeadlineKindError(s.to_string())),
        }
    }
}

/// Free-text and masked fields editable through [`DeadlineForm::edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    Defendant,
    NotificationDate,
    HearingAction,
    HearingTime,
    HearingDate,
    RequirementAction,
    TermDays,
    RequirementDate,
}

/// Hearing half of a deadline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hearing {
    pub action: String,
    pub time: String,
    pub date: String,
    pub meridiem: Option<Meridiem>,
}

impl Hearing {
    /// `"{date} {time} {meridiem}"`, the backend's attention field for hearings.
    pub fn attention(&self) -> String {
        format!(
            "{} {} {}",
            self.date,
            self.time,
            self.meridiem.map(Meridiem::as_str).unwrap_or("")
        )
    }
}

/// Requirement half of a deadline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    pub action: String,
    /// Day count, digits only.
    pub term_days: String,
    /// Ignored by the backend for requirements; kept in step with the hearing date.
    pub date: String,
}

/// The deadline a submit will record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deadline {
    /// Metadata-only update.
    NoDeadline,
    Audiencia(Hearing),
    Requerimiento(Requirement),
    Ambos(Hearing, Requirement),
}

/// Deadline and common case fields for one edit session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadlineForm {
    pub defendant: String,
    pub notification_date: String,
    pub kind: Option<DeadlineKind>,
    pub rescheduled: SiNo,
    pub meridiem: Option<Meridiem>,
    pub hearing_action: String,
    pub hearing_time: String,
    pub hearing_date: String,
    pub requirement_action: String,
    /// `None` until the user touches the field.
    pub term_days: Option<String>,
    pub requirement_date: String,
}

impl DeadlineForm {
    /// Prefill from a stored case.
    ///
    /// The kind is only preselected when the case already records one, so an
    /// untouched form never triggers deadline validation. Hearing fields start
    /// empty. A stored hearing's `plazo_atencion` is a date and time, so it
    /// never becomes the term.
    pub fn from_case(case: &CaseSnapshot) -> Self {
        let stored_term = case
            .plazo_atencion
            .as_deref()
            .filter(|s| !s.trim().is_empty());
        let kind = if case.audiencia {
            Some(DeadlineKind::Audiencia)
        } else if stored_term.is_some() {
            Some(DeadlineKind::Requerimiento)
        } else {
            None
        };

        Self {
            defendant: case.denunciado.clone().unwrap_or_default(),
            notification_date: case.fecha_notificacion.clone().unwrap_or_default(),
            kind,
            rescheduled: case.reprogramacion,
            meridiem: case.am_pm.as_deref().and_then(|s| s.parse().ok()),
            hearing_action: String::new(),
            hearing_time: String::new(),
            hearing_date: String::new(),
            requirement_action: case.accion.clone().unwrap_or_default(),
            term_days: stored_term
                .filter(|_| !case.audiencia)
                .map(fields::digits_only),
            requirement_date: case.fecha_atencion.clone().unwrap_or_default(),
        }
    }

    /// Radio-button selection: picking the selected kind again clears it.
    pub fn toggle_kind(&mut self, kind: DeadlineKind) {
        self.kind = if self.kind == Some(kind) {
            None
        } else {
            Some(kind)
        };
    }

    /// Apply one keystroke-level edit: mask the raw input, store it and
    /// update the field's error flag.
    ///
    /// With [`DeadlineKind::Ambos`], a hearing date edit also overwrites the
    /// requirement date and re-validates it.
    pub fn edit(&mut self, field: FormField, raw: &str, errors: &mut ValidationErrors) {
        match field {
            FormField::Defendant => self.defendant = raw.to_string(),
            FormField::HearingAction => self.hearing_action = raw.to_string(),
            FormField::RequirementAction => self.requirement_action = raw.to_string(),
            FormField::NotificationDate => {
                let (value, error) = fields::check_date(raw);
                errors.set(TrackedField::NotificationDate, error);
                self.notification_date = value;
            }
            FormField::RequirementDate => {
                let (value, error) = fields::check_date(raw);
                errors.set(TrackedField::RequirementDate, error);
                self.requirement_date = value;
            }
            FormField::HearingDate => {
                let (value, error) = fields::check_date(raw);
                errors.set(TrackedField::HearingDate, error);
                if self.kind == Some(DeadlineKind::Ambos) {
                    errors.set(TrackedField::RequirementDate, error);
                    self.requirement_date = value.clone();
                }
                self.hearing_date = value;
            }
            FormField::HearingTime => {
                let (value, error) = fields::check_time(raw);
                errors.set(TrackedField::HearingTime, error);
                self.hearing_time = value;
            }
            FormField::TermDays => {
                let (value, error) = fields::check_digits(raw);
                errors.set(TrackedField::TermDays, error);
                self.term_days = Some(value);
            }
        }
    }

    /// Term days exactly as they would be sent.
    pub fn term_days(&self) -> &str {
        self.term_days.as_deref().unwrap_or("")
    }

    /// Project into the selected kind's deadline.
    ///
    /// For [`DeadlineKind::Ambos`] the requirement date is always taken from
    /// the hearing date, whatever the live edits left behind.
    pub fn deadline(&self) -> Deadline {
        let hearing = || Hearing {
            action: self.hearing_action.clone(),
            time: self.hearing_time.clone(),
            date: self.hearing_date.clone(),
            meridiem: self.meridiem,
        };
        let requirement = |date: &str| Requirement {
            action: self.requirement_action.clone(),
            term_days: self.term_days().to_string(),
            date: date.to_string(),
        };

        match self.kind {
            None => Deadline::NoDeadline,
            Some(DeadlineKind::Audiencia) => Deadline::Audiencia(hearing()),
            Some(DeadlineKind::Requerimiento) => {
                Deadline::Requerimiento(requirement(&self.requirement_date))
            }
            Some(DeadlineKind::Ambos) => {
                Deadline::Ambos(hearing(), requirement(&self.hearing_date))
            }
        }
    }
}
