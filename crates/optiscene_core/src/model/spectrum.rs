//! Spectrum documents.

use super::document::DocumentKind;
use super::validation::{ensure_not_empty, ensure_positive, ValidationError};
use super::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumTemplate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(flatten)]
    pub kind: SpectrumKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpectrumKind {
    Monochromatic { wavelength: f64 },
    Blackbody { temperature: f64 },
    Sampled {
        wavelengths: Vec<f64>,
        values: Vec<f64>,
    },
    Library { file_uri: String },
    Predefined(PredefinedSpectrum),
}

impl SpectrumKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Monochromatic { .. } => "monochromatic",
            Self::Blackbody { .. } => "blackbody",
            Self::Sampled { .. } => "sampled",
            Self::Library { .. } => "library",
            Self::Predefined(_) => "predefined",
        }
    }
}

impl Default for SpectrumKind {
    fn default() -> Self {
        Self::Monochromatic { wavelength: 555.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredefinedSpectrum {
    Incandescent,
    WarmWhiteFluorescent,
    DaylightFluorescent,
    WhiteLed,
    Halogen,
    MetalHalide,
    HighPressureSodium,
}

impl SpectrumTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            metadata: BTreeMap::new(),
            kind: SpectrumKind::default(),
        }
    }
}

impl Document for SpectrumTemplate {
    const KIND: DocumentKind = DocumentKind::Spectrum;

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), ValidationError> {
        match &self.kind {
            SpectrumKind::Monochromatic { wavelength } => ensure_positive("wavelength", *wavelength),
            SpectrumKind::Blackbody { temperature } => ensure_positive("temperature", *temperature),
            SpectrumKind::Sampled {
                wavelengths,
                values,
            } => {
                if wavelengths.is_empty() {
                    return Err(ValidationError::EmptyField("wavelengths"));
                }
                if values.len() != wavelengths.len() {
                    return Err(ValidationError::LengthMismatch {
                        field: "values",
                        expected: wavelengths.len(),
                        actual: values.len(),
                    });
                }
                if wavelengths.windows(2).any(|pair| pair[0] >= pair[1]) {
                    return Err(ValidationError::NotIncreasing("wavelengths"));
                }
                Ok(())
            }
            SpectrumKind::Library { file_uri } => ensure_not_empty("file_uri", file_uri),
            SpectrumKind::Predefined(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PredefinedSpectrum, SpectrumKind, SpectrumTemplate};
    use crate::model::{Document, ValidationError};
    use serde_json::json;

    #[test]
    fn sub_mode_is_a_nested_field() {
        let mut spectrum = SpectrumTemplate::new("Spectrum.1");
        spectrum.kind = SpectrumKind::Predefined(PredefinedSpectrum::Halogen);
        let wire = serde_json::to_value(&spectrum).expect("encode spectrum");
        assert_eq!(wire["predefined"], json!("halogen"));
        assert!(wire.get("monochromatic").is_none());
    }

    #[test]
    fn sampled_spectrum_requires_matching_lengths() {
        let mut spectrum = SpectrumTemplate::new("Sampled");
        spectrum.kind = SpectrumKind::Sampled {
            wavelengths: vec![400.0, 500.0],
            values: vec![10.0],
        };
        assert!(matches!(
            spectrum.validate(),
            Err(ValidationError::LengthMismatch { .. })
        ));
    }
}
