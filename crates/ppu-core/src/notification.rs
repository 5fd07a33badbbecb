//! e_situacional label construction.
//!
//! A label is an immutable prefix derived from the notification type and its
//! type-specific fields, optionally followed by free text:
//!
//! ```text
//! RESOLUCIÓN N° 4-2024 DEL CUADERNO 2 : SE PROGRAMA AUDIENCIA
//! └──────────── prefix ─────────────┘   └──── free text ───┘
//! ```
//!
//! Preview and submitted value both go through [`Label`], so they cannot drift.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::case::SiNo;

/// Literal used in place of a document number when the document has none.
pub const WITHOUT_NUMBER: &str = "S/N";

/// Notification type selector, as offered by the edit form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    Resolucion,
    Disposicion,
    Providencia,
    Oficio,
    CitacionPolicial,
    Cedula,
    Acta,
    Otros,
    /// Any name outside the known set, kept verbatim.
    Other(String),
}

impl NotificationType {
    pub const KNOWN: [NotificationType; 8] = [
        Self::Resolucion,
        Self::Disposicion,
        Self::Providencia,
        Self::Oficio,
        Self::CitacionPolicial,
        Self::Cedula,
        Self::Acta,
        Self::Otros,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Resolucion => "RESOLUCIÓN",
            Self::Disposicion => "DISPOSICIÓN",
            Self::Providencia => "PROVIDENCIA",
            Self::Oficio => "OFICIO",
            Self::CitacionPolicial => "CITACIÓN POLICIAL",
            Self::Cedula => "CEDULA",
            Self::Acta => "ACTA",
            Self::Otros => "OTROS",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = std::convert::Infallible;

    /// Accepts the canonical names and their unaccented spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Ok(match upper.as_str() {
            "RESOLUCIÓN" | "RESOLUCION" => Self::Resolucion,
            "DISPOSICIÓN" | "DISPOSICION" => Self::Disposicion,
            "PROVIDENCIA" => Self::Providencia,
            "OFICIO" => Self::Oficio,
            "CITACIÓN POLICIAL" | "CITACION POLICIAL" => Self::CitacionPolicial,
            "CEDULA" | "CÉDULA" => Self::Cedula,
            "ACTA" => Self::Acta,
            "OTROS" => Self::Otros,
            _ => Self::Other(s.trim().to_string()),
        })
    }
}

/// Document number and year shared by most notification types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Numbering {
    pub number: Option<String>,
    pub year: Option<String>,
}

impl Numbering {
    pub fn new(number: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            number: present(Some(number.into())),
            year: present(Some(year.into())),
        }
    }

    /// `N° 12` for a real number, `S/N` verbatim, empty when absent.
    pub fn display_number(&self) -> String {
        display_number(self.number.as_deref())
    }

    /// `{display}-{year}`; a missing year leaves the trailing dash.
    fn with_year(&self) -> String {
        format!(
            "{}-{}",
            self.display_number(),
            self.year.as_deref().unwrap_or("")
        )
    }
}

/// A notification selection, carrying only the fields its type uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationSelection {
    Disposicion {
        numbering: Numbering,
        superior: bool,
    },
    Providencia(Numbering),
    Resolucion {
        numbering: Numbering,
        notebook: Option<String>,
    },
    Acta {
        subtype: Option<String>,
        has_notebook: SiNo,
        notebook: Option<String>,
    },
    Oficio {
        numbering: Numbering,
        place: Option<String>,
    },
    CitacionPolicial {
        numbering: Numbering,
        place: Option<String>,
    },
    Cedula {
        number: Option<String>,
    },
    /// Free-form title typed into the number field.
    Otros {
        title: Option<String>,
    },
    Other {
        name: String,
        number: Option<String>,
    },
}

/// Build the immutable label prefix for a selection. Never fails.
pub fn build_immutable_prefix(selection: &NotificationSelection) -> String {
    let prefix = match selection {
        NotificationSelection::Disposicion {
            numbering,
            superior,
        } => {
            let base = if *superior {
                "DISPOSICIÓN SUPERIOR"
            } else {
                "DISPOSICIÓN"
            };
            format!("{base} {}", numbering.with_year())
        }
        NotificationSelection::Providencia(numbering) => {
            format!("PROVIDENCIA {}", numbering.with_year())
        }
        NotificationSelection::Resolucion {
            numbering,
            notebook,
        } => {
            let mut s = format!("RESOLUCIÓN {}", numbering.with_year());
            if let Some(n) = notebook.as_deref().and_then(non_empty) {
                s.push_str(&format!(" DEL CUADERNO {n}"));
            }
            s
        }
        NotificationSelection::Acta {
            subtype,
            has_notebook,
            notebook,
        } => {
            let mut s = String::from("ACTA");
            if let Some(t) = subtype.as_deref().and_then(non_empty) {
                s.push_str(&format!(" ({t})"));
            }
            if has_notebook.is_si()
                && let Some(n) = notebook.as_deref().and_then(non_empty)
            {
                s.push_str(&format!(" DEL CUADERNO {n}"));
            }
            s
        }
        NotificationSelection::Oficio { numbering, place } => {
            with_place(format!("OFICIO {}", numbering.with_year()), place)
        }
        NotificationSelection::CitacionPolicial { numbering, place } => with_place(
            format!("CITACIÓN POLICIAL {}", numbering.with_year()),
            place,
        ),
        NotificationSelection::Otros { title } => {
            format!("OTROS {}", title.as_deref().unwrap_or(""))
        }
        NotificationSelection::Cedula { number } => {
            generic_prefix("CEDULA", &display_number(number.as_deref()))
        }
        NotificationSelection::Other { name, number } => {
            generic_prefix(name, &display_number(number.as_deref()))
        }
    };

    prefix.trim().to_string()
}

/// `prefix : free_text`, or just the prefix when there is no free text.
pub fn compose_label(prefix: &str, free_text: &str) -> String {
    if free_text.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix} : {free_text}")
    }
}

/// A computed e_situacional label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    prefix: String,
    free_text: String,
}

impl Label {
    pub fn new(selection: &NotificationSelection, free_text: impl Into<String>) -> Self {
        Self {
            prefix: build_immutable_prefix(selection),
            free_text: free_text.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn free_text(&self) -> &str {
        &self.free_text
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&compose_label(&self.prefix, &self.free_text))
    }
}

/// Flat notification form state as the edit form holds it.
///
/// Every field is always present; [`NotificationDraft::selection`] keeps only
/// the ones the chosen type uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDraft {
    pub notification_type: String,
    pub number: String,
    pub without_number: bool,
    pub year: String,
    pub notebook: String,
    pub place: String,
    pub acta_subtype: String,
    pub has_notebook: SiNo,
    pub superior: bool,
    pub free_text: String,
}

impl NotificationDraft {
    /// Flip the "no number" checkbox. Checking it fills in `S/N`,
    /// unchecking it clears the number.
    pub fn toggle_without_number(&mut self) {
        self.without_number = !self.without_number;
        self.number = if self.without_number {
            WITHOUT_NUMBER.to_string()
        } else {
            String::new()
        };
    }

    pub fn selection(&self) -> NotificationSelection {
        let numbering = Numbering {
            number: present(Some(self.number.clone())),
            year: present(Some(self.year.clone())),
        };
        let place = present(Some(self.place.clone()));
        let notebook = present(Some(self.notebook.clone()));

        // Parsing is infallible.
        let kind = self
            .notification_type
            .parse::<NotificationType>()
            .unwrap_or(NotificationType::Otros);
        match kind {
            NotificationType::Disposicion => NotificationSelection::Disposicion {
                numbering,
                superior: self.superior,
            },
            NotificationType::Providencia => NotificationSelection::Providencia(numbering),
            NotificationType::Resolucion => NotificationSelection::Resolucion {
                numbering,
                notebook,
            },
            NotificationType::Acta => NotificationSelection::Acta {
                subtype: present(Some(self.acta_subtype.clone())),
                has_notebook: self.has_notebook,
                notebook,
            },
            NotificationType::Oficio => NotificationSelection::Oficio { numbering, place },
            NotificationType::CitacionPolicial => {
                NotificationSelection::CitacionPolicial { numbering, place }
            }
            NotificationType::Cedula => NotificationSelection::Cedula {
                number: numbering.number,
            },
            NotificationType::Otros => NotificationSelection::Otros {
                title: numbering.number,
            },
            NotificationType::Other(name) => NotificationSelection::Other {
                name,
                number: numbering.number,
            },
        }
    }

    /// The label for the current draft; used for both preview and submit.
    pub fn label(&self) -> Label {
        Label::new(&self.selection(), self.free_text.clone())
    }
}

fn display_number(number: Option<&str>) -> String {
    match number.and_then(non_empty) {
        Some(WITHOUT_NUMBER) => WITHOUT_NUMBER.to_string(),
        Some(n) => format!("N° {n}"),
        None => String::new(),
    }
}

fn generic_prefix(name: &str, display: &str) -> String {
    if display.is_empty() {
        name.to_string()
    } else {
        format!("{name} {display}")
    }
}

fn with_place(mut s: String, place: &Option<String>) -> String {
    if let Some(p) = place.as_deref().and_then(non_empty) {
        s.push_str(&format!(" LUGAR {p}"));
    }
    s
}

/// Whitespace-only values count as absent.
fn non_empty(s: &str) -> Option<&str> {
    let t = s.trim();
    (!t.is_empty()).then_some(t)
}

fn present(value: Option<String>) -> Option<String> {
    value
        .as_deref()
        .and_then(non_empty)
        .map(|s| s.to_string())
}
