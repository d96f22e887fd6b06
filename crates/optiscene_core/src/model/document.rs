//! Document identity and the JSON wire codec.
//!
//! # Responsibility
//! - Name every document kind the store accepts.
//! - Convert typed documents to and from their `serde_json::Value` tree.
//!
//! # Invariants
//! - `DocumentKey` values are opaque; only the store mints them.
//! - Encoding uses the sorted `serde_json::Map`, so projections render
//!   deterministically.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Every document kind persisted by a `DocumentStore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Scene,
    Part,
    Body,
    Face,
    SopTemplate,
    VopTemplate,
    SensorTemplate,
    SourceTemplate,
    SimulationTemplate,
    Spectrum,
    IntensityTemplate,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 11] = [
        Self::Scene,
        Self::Part,
        Self::Body,
        Self::Face,
        Self::SopTemplate,
        Self::VopTemplate,
        Self::SensorTemplate,
        Self::SourceTemplate,
        Self::SimulationTemplate,
        Self::Spectrum,
        Self::IntensityTemplate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scene => "scene",
            Self::Part => "part",
            Self::Body => "body",
            Self::Face => "face",
            Self::SopTemplate => "sop_template",
            Self::VopTemplate => "vop_template",
            Self::SensorTemplate => "sensor_template",
            Self::SourceTemplate => "source_template",
            Self::SimulationTemplate => "simulation_template",
            Self::Spectrum => "spectrum",
            Self::IntensityTemplate => "intensity_template",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl Display for DocumentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque key addressing one stored document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Mints a fresh key. Called by store implementations on create.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps a key read back from a document reference field.
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Failure to move between a typed document and its JSON tree.
#[derive(Debug)]
pub struct CodecError {
    context: &'static str,
    source: serde_json::Error,
}

impl CodecError {
    pub fn context(&self) -> &'static str {
        self.context
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.context, self.source)
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Encodes a typed document into its JSON tree.
pub fn encode<T: Serialize>(value: &T) -> CodecResult<Value> {
    serde_json::to_value(value).map_err(|source| CodecError {
        context: "encode",
        source,
    })
}

/// Decodes a JSON tree into a typed document.
pub fn decode<T: DeserializeOwned>(value: Value) -> CodecResult<T> {
    serde_json::from_value(value).map_err(|source| CodecError {
        context: "decode",
        source,
    })
}

/// Pretty JSON with four-space indentation, used by every `Display` impl.
pub fn to_pretty_string(value: &Value) -> String {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8_lossy(&buffer).into_owned(),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{to_pretty_string, DocumentKey, DocumentKind};
    use serde_json::json;

    #[test]
    fn kind_round_trips_through_storage_name() {
        for kind in DocumentKind::ALL {
            assert_eq!(DocumentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(DocumentKind::parse("note"), None);
    }

    #[test]
    fn generated_keys_are_distinct() {
        assert_ne!(DocumentKey::generate(), DocumentKey::generate());
    }

    #[test]
    fn pretty_output_uses_four_spaces() {
        let rendered = to_pretty_string(&json!({"name": "Mirror"}));
        assert_eq!(rendered, "{\n    \"name\": \"Mirror\"\n}");
    }
}
