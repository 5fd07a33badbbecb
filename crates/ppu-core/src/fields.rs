//! Input masks and validators for the date, time and term-day fields.
//!
//! Every normalizer always returns *some* display value; the matching
//! validator decides whether the field carries an inline error.
//!
//! # Masks
//!
//! - Date: `DD-MM-YYYY`, dashes inserted as digits accumulate
//! - Time: `HH:MM`, colon inserted after the hour
//! - Term days: digits only

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Fields whose live validation can block a submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    NotificationDate,
    TermDays,
    RequirementDate,
    HearingTime,
    HearingDate,
}

impl TrackedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotificationDate => "fechaNotificacion",
            Self::TermDays => "plazoRequerimiento",
            Self::RequirementDate => "fechaRequerimiento",
            Self::HearingTime => "horaAudiencia",
            Self::HearingDate => "fechaAudiencia",
        }
    }
}

impl fmt::Display for TrackedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline helper text shown under a malformed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("dd-mm-aaaa")]
    Date,
    #[error("hh:mm")]
    Time,
    #[error("números")]
    Digits,
}

/// Per-field error flags for one edit session.
///
/// A field with no entry has no error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<TrackedField, FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or clear the error for `field`.
    pub fn set(&mut self, field: TrackedField, error: Option<FieldError>) {
        match error {
            Some(e) => {
                self.errors.insert(field, e);
            }
            None => {
                self.errors.remove(&field);
            }
        }
    }

    pub fn get(&self, field: TrackedField) -> Option<FieldError> {
        self.errors.get(&field).copied()
    }

    /// Helper text for `field`, empty when the field is valid.
    pub fn message(&self, field: TrackedField) -> String {
        self.get(field).map(|e| e.to_string()).unwrap_or_default()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fields currently flagged, in a stable order.
    pub fn pending(&self) -> Vec<TrackedField> {
        self.errors.keys().copied().collect()
    }
}

/// Strip everything but ASCII digits.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Progressive `DD-MM-YYYY` mask.
///
/// 1–2 digits stay bare, 3–4 become `DD-MM`, 5–8 become `DD-MM-YYYY`.
/// Digits beyond the eighth are dropped.
pub fn normalize_date(raw: &str) -> String {
    let clean = digits_only(raw);
    let len = clean.len();
    if len <= 2 {
        clean
    } else if len <= 4 {
        format!("{}-{}", &clean[..2], &clean[2..])
    } else {
        format!("{}-{}-{}", &clean[..2], &clean[2..4], &clean[4..len.min(8)])
    }
}

/// Day 1–31 (one or two digits), month 1–12 (one or two digits), four-digit year.
pub fn is_valid_date(value: &str) -> bool {
    let mut parts = value.split('-');
    let (Some(day), Some(month), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    in_range(day, 1, 31) && in_range(month, 1, 12) && year.len() == 4 && all_digits(year)
}

/// Progressive `HH:MM` mask. Digits beyond the fourth are dropped.
pub fn normalize_time(raw: &str) -> String {
    let clean = digits_only(raw);
    let len = clean.len();
    if len <= 2 {
        clean
    } else {
        format!("{}:{}", &clean[..2], &clean[2..len.min(4)])
    }
}

/// Hour 1–12 (one or two digits), minute 00–59 (exactly two digits).
pub fn is_valid_time(value: &str) -> bool {
    let Some((hour, minute)) = value.split_once(':') else {
        return false;
    };

    in_range(hour, 1, 12) && minute.len() == 2 && in_range(minute, 0, 59)
}

/// Date field: mask, then flag.
pub fn check_date(raw: &str) -> (String, Option<FieldError>) {
    let value = normalize_date(raw);
    let error = (!is_valid_date(&value)).then_some(FieldError::Date);
    (value, error)
}

/// Time field: mask, then flag.
pub fn check_time(raw: &str) -> (String, Option<FieldError>) {
    let value = normalize_time(raw);
    let error = (!is_valid_time(&value)).then_some(FieldError::Time);
    (value, error)
}

/// Term-day field: strip, then flag when nothing is left.
pub fn check_digits(raw: &str) -> (String, Option<FieldError>) {
    let value = digits_only(raw);
    let error = value.is_empty().then_some(FieldError::Digits);
    (value, error)
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// One or two ASCII digits whose value lies in `min..=max`.
fn in_range(s: &str, min: u32, max: u32) -> bool {
    if s.is_empty() || s.len() > 2 || !all_digits(s) {
        return false;
    }
    s.parse::<u32>().is_ok_and(|n| (min..=max).contains(&n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_mask_progressive() {
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("0"), "0");
        assert_eq!(normalize_date("05"), "05");
        assert_eq!(normalize_date("050"), "05-0");
        assert_eq!(normalize_date("0506"), "05-06");
        assert_eq!(normalize_date("05062"), "05-06-2");
        assert_eq!(normalize_date("0506202"), "05-06-202");
        assert_eq!(normalize_date("05062024"), "05-06-2024");
    }

    #[test]
    fn date_mask_idempotent_on_valid_input() {
        assert_eq!(normalize_date("05-06-2024"), "05-06-2024");
    }

    #[test]
    fn date_mask_strips_noise_and_extra_digits() {
        assert_eq!(normalize_date("05/06/2024"), "05-06-2024");
        assert_eq!(normalize_date("a0b5c"), "05");
        assert_eq!(normalize_date("0506202499"), "05-06-2024");
    }

    #[test]
    fn date_validator() {
        assert!(is_valid_date("05-06-2024"));
        assert!(is_valid_date("31-12-1999"));
        assert!(is_valid_date("5-6-2024"));
        assert!(!is_valid_date("00-06-2024"));
        assert!(!is_valid_date("32-06-2024"));
        assert!(!is_valid_date("05-13-2024"));
        assert!(!is_valid_date("05-00-2024"));
        assert!(!is_valid_date("05-06-202"));
        assert!(!is_valid_date("05-06"));
        assert!(!is_valid_date("05-06-2024-1"));
        assert!(!is_valid_date(""));
    }

    #[test]
    fn accepted_masked_dates_are_stable() {
        // Every masked value the validator accepts survives another pass unchanged.
        for day in 1..=31u32 {
            for month in 1..=12u32 {
                let raw = format!("{day:02}{month:02}2025");
                let masked = normalize_date(&raw);
                assert!(is_valid_date(&masked), "{masked} should be valid");
                assert_eq!(normalize_date(&masked), masked);
            }
        }
    }

    #[test]
    fn time_mask_progressive() {
        assert_eq!(normalize_time("1"), "1");
        assert_eq!(normalize_time("10"), "10");
        assert_eq!(normalize_time("103"), "10:3");
        assert_eq!(normalize_time("1030"), "10:30");
        assert_eq!(normalize_time("10:30"), "10:30");
        assert_eq!(normalize_time("103099"), "10:30");
    }

    #[test]
    fn time_validator() {
        assert!(is_valid_time("10:30"));
        assert!(is_valid_time("01:00"));
        assert!(is_valid_time("9:59"));
        assert!(is_valid_time("12:00"));
        assert!(!is_valid_time("00:30"));
        assert!(!is_valid_time("13:00"));
        assert!(!is_valid_time("10:60"));
        assert!(!is_valid_time("10:3"));
        assert!(!is_valid_time("1030"));
    }

    #[test]
    fn digits_only_strips_everything_else() {
        assert_eq!(digits_only("1a2 b3"), "123");
        assert_eq!(digits_only("días"), "");
    }

    #[test]
    fn check_helpers_set_sentinels() {
        assert_eq!(check_date("0506"), ("05-06".to_string(), Some(FieldError::Date)));
        assert_eq!(check_date("05062024"), ("05-06-2024".to_string(), None));
        assert_eq!(check_time("1"), ("1".to_string(), Some(FieldError::Time)));
        assert_eq!(check_digits("x"), (String::new(), Some(FieldError::Digits)));
        assert_eq!(check_digits("5 días"), ("5".to_string(), None));
    }

    #[test]
    fn error_sentinel_text() {
        assert_eq!(FieldError::Date.to_string(), "dd-mm-aaaa");
        assert_eq!(FieldError::Time.to_string(), "hh:mm");
        assert_eq!(FieldError::Digits.to_string(), "números");
    }

    #[test]
    fn validation_errors_set_and_clear() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_clean());

        errors.set(TrackedField::HearingDate, Some(FieldError::Date));
        errors.set(TrackedField::TermDays, Some(FieldError::Digits));
        assert_eq!(errors.message(TrackedField::HearingDate), "dd-mm-aaaa");
        assert_eq!(
            errors.pending(),
            vec![TrackedField::TermDays, TrackedField::HearingDate]
        );

        errors.set(TrackedField::HearingDate, None);
        errors.set(TrackedField::TermDays, None);
        assert!(errors.is_clean());
        assert_eq!(errors.message(TrackedField::HearingDate), "");
    }
}
