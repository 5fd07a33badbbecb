//! Core form logic for registro PPU: e_situacional labels, field masks and
//! deadline payload assembly. No I/O.

pub mod case;
pub mod deadline;
pub mod fields;
pub mod notification;
pub mod payload;
pub mod session;

pub use case::{CaseSnapshot, Meridiem, SiNo};
pub use deadline::{Deadline, DeadlineForm, DeadlineKind, FormField, Hearing, Requirement};
pub use fields::{FieldError, TrackedField, ValidationErrors};
pub use notification::{
    Label, NotificationDraft, NotificationSelection, NotificationType, Numbering,
    build_immutable_prefix, compose_label,
};
pub use payload::{AssembleError, CommonCaseFields, UpdateRecord, assemble, assemble_now};
pub use session::EditSession;
