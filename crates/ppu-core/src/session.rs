//! One open edit form: notification draft, deadline form and error flags.

use chrono::NaiveDate;

use crate::case::CaseSnapshot;
use crate::deadline::{DeadlineForm, DeadlineKind, FormField};
use crate::fields::ValidationErrors;
use crate::notification::{Label, NotificationDraft};
use crate::payload::{self, AssembleError, CommonCaseFields, UpdateRecord};

/// State owned by a single edit form, discarded when the form closes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    pub case_id: Option<String>,
    pub notification: NotificationDraft,
    pub deadline: DeadlineForm,
    pub errors: ValidationErrors,
}

impl EditSession {
    /// Open the form on a stored case. The current e_situacional becomes the
    /// free text; the notification type starts unselected.
    pub fn open(case: &CaseSnapshot) -> Self {
        Self {
            case_id: case.case_id().map(str::to_string),
            notification: NotificationDraft {
                free_text: case.e_situacional.clone().unwrap_or_default(),
                ..Default::default()
            },
            deadline: DeadlineForm::from_case(case),
            errors: ValidationErrors::new(),
        }
    }

    pub fn edit(&mut self, field: FormField, raw: &str) {
        self.deadline.edit(field, raw, &mut self.errors);
    }

    pub fn toggle_kind(&mut self, kind: DeadlineKind) {
        self.deadline.toggle_kind(kind);
    }

    /// Label shown in the preview; identical to what [`Self::records`] sends.
    pub fn preview_label(&self) -> Label {
        self.notification.label()
    }

    pub fn common(&self) -> CommonCaseFields {
        CommonCaseFields {
            case_id: self.case_id.clone(),
            label: self.preview_label().to_string(),
        }
    }

    /// Records for a submit made on `today`.
    pub fn records(&self, today: NaiveDate) -> Result<Vec<UpdateRecord>, AssembleError> {
        payload::assemble(&self.common(), &self.deadline, &self.errors, today)
    }

    /// Records for a submit made now.
    pub fn records_now(&self) -> Result<Vec<UpdateRecord>, AssembleError> {
        payload::assemble_now(&self.common(), &self.deadline, &self.errors)
    }
}
