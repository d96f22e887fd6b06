//! Spectra: standalone documents, also owned by sources.

use super::{Descriptor, FeatureResult, UsageError};
use crate::model::spectrum::{PredefinedSpectrum, SpectrumKind, SpectrumTemplate};

pub type Spectrum = Descriptor<SpectrumTemplate>;

impl Descriptor<SpectrumTemplate> {
    pub fn kind(&self) -> &SpectrumKind {
        &self.value().kind
    }

    pub fn set_monochromatic(&mut self, wavelength: f64) -> &mut Self {
        self.value_mut().kind = SpectrumKind::Monochromatic { wavelength };
        self
    }

    pub fn set_blackbody(&mut self, temperature: f64) -> &mut Self {
        self.value_mut().kind = SpectrumKind::Blackbody { temperature };
        self
    }

    /// `wavelengths` must be strictly increasing and as long as `values`.
    pub fn set_sampled(&mut self, wavelengths: Vec<f64>, values: Vec<f64>) -> &mut Self {
        self.value_mut().kind = SpectrumKind::Sampled {
            wavelengths,
            values,
        };
        self
    }

    pub fn set_library(&mut self, file_uri: impl Into<String>) -> &mut Self {
        self.value_mut().kind = SpectrumKind::Library {
            file_uri: file_uri.into(),
        };
        self
    }

    pub fn set_predefined(&mut self, predefined: PredefinedSpectrum) -> &mut Self {
        self.value_mut().kind = SpectrumKind::Predefined(predefined);
        self
    }

    pub fn wavelength(&self) -> FeatureResult<f64> {
        match &self.value().kind {
            SpectrumKind::Monochromatic { wavelength } => Ok(*wavelength),
            other => Err(UsageError::wrong_mode("wavelength", "monochromatic", other.label()).into()),
        }
    }

    pub fn set_wavelength(&mut self, value: f64) -> FeatureResult<&mut Self> {
        match &mut self.value_mut().kind {
            SpectrumKind::Monochromatic { wavelength } => *wavelength = value,
            other => {
                return Err(
                    UsageError::wrong_mode("set_wavelength", "monochromatic", other.label()).into(),
                )
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::Spectrum;
    use crate::feature::test_support::store;
    use crate::feature::TemplateWrite;
    use crate::model::spectrum::{PredefinedSpectrum, SpectrumTemplate};
    use crate::repo::StoreError;

    #[test]
    fn commit_writes_only_on_change() {
        let mut spectrum = Spectrum::new(store(), SpectrumTemplate::new("Green"));
        assert_eq!(spectrum.commit().expect("create"), TemplateWrite::Created);
        assert_eq!(spectrum.commit().expect("noop"), TemplateWrite::Unchanged);

        spectrum.set_monochromatic(530.0);
        assert_eq!(spectrum.commit().expect("update"), TemplateWrite::Updated);
        let revision = spectrum.link().expect("linked").revision().expect("revision");
        assert_eq!(revision, 2);
    }

    #[test]
    fn rejected_sampled_spectrum_keeps_draft() {
        let mut spectrum = Spectrum::new(store(), SpectrumTemplate::new("Bad"));
        spectrum.set_sampled(vec![500.0, 400.0], vec![1.0, 1.0]);
        let err = spectrum.commit().expect_err("not increasing");
        assert!(matches!(err, StoreError::Rejected { .. }));
        assert!(!spectrum.is_committed());
        assert!(spectrum.to_string().starts_with("local: "));
    }

    #[test]
    fn wavelength_of_predefined_is_usage_error() {
        let mut spectrum = Spectrum::new(store(), SpectrumTemplate::new("Lamp"));
        spectrum.set_predefined(PredefinedSpectrum::Halogen);
        assert!(spectrum.wavelength().is_err());
        assert!(spectrum.set_wavelength(600.0).is_err());
    }

    #[test]
    fn delete_then_reset_keeps_local_value() {
        let mut spectrum = Spectrum::new(store(), SpectrumTemplate::new("Heat"));
        spectrum.set_blackbody(3200.0);
        spectrum.commit().expect("create");
        spectrum.delete().expect("delete");
        spectrum.delete().expect("second delete is a no-op");
        spectrum.reset().expect("reset without link");

        assert!(spectrum.key().is_none());
        assert_eq!(spectrum.name(), "Heat");
        assert!(spectrum.get("blackbody").expect("lookup").is_found());
    }
}
