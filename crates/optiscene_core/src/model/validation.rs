//! Store-side document validation.
//!
//! # Responsibility
//! - Reject malformed or out-of-range documents before they are persisted.
//!
//! # Invariants
//! - Every write path of a `DocumentStore` calls `validate_document`.

use super::document::{decode, DocumentKind};
use super::intensity::IntensityTemplate;
use super::material::{SopTemplate, VopTemplate};
use super::part::{BodyDocument, FaceDocument, PartDocument};
use super::scene::SceneDocument;
use super::sensor::SensorTemplate;
use super::simulation::SimulationTemplate;
use super::source::SourceTemplate;
use super::spectrum::SpectrumTemplate;
use super::Document;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

const AXIS_SYSTEM_LEN: usize = 12;
const AXIS_PLANE_LEN: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    NotPositive {
        field: &'static str,
        value: f64,
    },
    Negative {
        field: &'static str,
        value: f64,
    },
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    EmptyField(&'static str),
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    NotIncreasing(&'static str),
    Malformed(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPositive { field, value } => {
                write!(f, "`{field}` must be positive, got {value}")
            }
            Self::Negative { field, value } => {
                write!(f, "`{field}` must not be negative, got {value}")
            }
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "`{field}` must be within [{min}, {max}], got {value}"),
            Self::EmptyField(field) => write!(f, "`{field}` must not be empty"),
            Self::LengthMismatch {
                field,
                expected,
                actual,
            } => write!(f, "`{field}` must have {expected} values, got {actual}"),
            Self::NotIncreasing(field) => write!(f, "`{field}` must be strictly increasing"),
            Self::Malformed(message) => write!(f, "malformed document: {message}"),
        }
    }
}

impl Error for ValidationError {}

/// Decodes `body` as the typed document of `kind` and checks its values.
pub fn validate_document(kind: DocumentKind, body: &Value) -> Result<(), ValidationError> {
    match kind {
        DocumentKind::Scene => validate_as::<SceneDocument>(body),
        DocumentKind::Part => validate_as::<PartDocument>(body),
        DocumentKind::Body => validate_as::<BodyDocument>(body),
        DocumentKind::Face => validate_as::<FaceDocument>(body),
        DocumentKind::SopTemplate => validate_as::<SopTemplate>(body),
        DocumentKind::VopTemplate => validate_as::<VopTemplate>(body),
        DocumentKind::SensorTemplate => validate_as::<SensorTemplate>(body),
        DocumentKind::SourceTemplate => validate_as::<SourceTemplate>(body),
        DocumentKind::SimulationTemplate => validate_as::<SimulationTemplate>(body),
        DocumentKind::Spectrum => validate_as::<SpectrumTemplate>(body),
        DocumentKind::IntensityTemplate => validate_as::<IntensityTemplate>(body),
    }
}

fn validate_as<T: Document>(body: &Value) -> Result<(), ValidationError> {
    let document: T =
        decode(body.clone()).map_err(|err| ValidationError::Malformed(err.to_string()))?;
    document.validate()
}

pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NotPositive { field, value })
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::Negative { field, value })
    }
}

pub(crate) fn ensure_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

pub(crate) fn ensure_not_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}

pub(crate) fn ensure_len(
    field: &'static str,
    values: &[f64],
    expected: usize,
) -> Result<(), ValidationError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(ValidationError::LengthMismatch {
            field,
            expected,
            actual: values.len(),
        })
    }
}

pub(crate) fn ensure_axis_system(field: &'static str, values: &[f64]) -> Result<(), ValidationError> {
    ensure_len(field, values, AXIS_SYSTEM_LEN)
}

pub(crate) fn ensure_axis_plane(field: &'static str, values: &[f64]) -> Result<(), ValidationError> {
    ensure_len(field, values, AXIS_PLANE_LEN)
}

#[cfg(test)]
mod tests {
    use super::{validate_document, ValidationError};
    use crate::model::DocumentKind;
    use serde_json::json;

    #[test]
    fn mirror_reflectance_above_hundred_is_rejected() {
        let body = json!({"name": "Mirror", "mirror": {"reflectance": 120.0}});
        let err = validate_document(DocumentKind::SopTemplate, &body).expect_err("out of range");
        assert!(matches!(
            err,
            ValidationError::OutOfRange {
                field: "reflectance",
                ..
            }
        ));
    }

    #[test]
    fn document_of_wrong_shape_is_malformed() {
        let body = json!({"name": "Spectrum", "no_such_mode": {}});
        let err = validate_document(DocumentKind::Spectrum, &body).expect_err("unknown mode");
        assert!(matches!(err, ValidationError::Malformed(_)));
    }

    #[test]
    fn empty_scene_is_valid() {
        validate_document(DocumentKind::Scene, &json!({"name": "Scene"})).expect("valid scene");
    }
}
