//! Shared case types exchanged with the registro PPU backend.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A yes/no flag stored by the backend as `"SI"` / `"NO"`.
///
/// Deserialization is lenient: anything other than a `SI` spelling reads as `NO`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SiNo {
    Si,
    #[default]
    No,
}

impl SiNo {
    pub fn is_si(self) -> bool {
        self == Self::Si
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Si => "SI",
            Self::No => "NO",
        }
    }
}

impl From<bool> for SiNo {
    fn from(value: bool) -> Self {
        if value { Self::Si } else { Self::No }
    }
}

impl fmt::Display for SiNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected SI or NO, got {0:?}")]
pub struct ParseSiNoError(String);

impl FromStr for SiNo {
    type Err = ParseSiNoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SI" | "SÍ" => Ok(Self::Si),
            "NO" => Ok(Self::No),
            _ => Err(ParseSiNoError(s.to_string())),
        }
    }
}

impl Serialize for SiNo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SiNo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.and_then(|s| s.parse().ok()).unwrap_or_default())
    }
}

/// AM/PM marker attached to a hearing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Meridiem {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
}

impl Meridiem {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Am => "AM",
            Self::Pm => "PM",
        }
    }
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected AM or PM, got {0:?}")]
pub struct ParseMeridiemError(String);

impl FromStr for Meridiem {
    type Err = ParseMeridiemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AM" => Ok(Self::Am),
            "PM" => Ok(Self::Pm),
            _ => Err(ParseMeridiemError(s.to_string())),
        }
    }
}

/// The stored case fields the edit form reads when it opens.
///
/// Mirrors a row of the backend's case listing; unknown columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSnapshot {
    #[serde(default)]
    pub registro_ppu: Option<String>,
    #[serde(default)]
    pub e_situacional: Option<String>,
    #[serde(default)]
    pub denunciado: Option<String>,
    #[serde(default)]
    pub fecha_notificacion: Option<String>,
    /// Hearing flag; the backend sends booleans, 0/1 or strings.
    #[serde(default, deserialize_with = "truthy")]
    pub audiencia: bool,
    #[serde(default)]
    pub plazo_atencion: Option<String>,
    #[serde(default)]
    pub fecha_atencion: Option<String>,
    #[serde(default)]
    pub accion: Option<String>,
    #[serde(default)]
    pub reprogramacion: SiNo,
    #[serde(default, rename = "AmPm")]
    pub am_pm: Option<String>,
}

impl CaseSnapshot {
    /// The persisted identifier, if the case has been saved.
    pub fn case_id(&self) -> Option<&str> {
        self.registro_ppu
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => {
            let s = s.trim();
            !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
        }
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    })
}
