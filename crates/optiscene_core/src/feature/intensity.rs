//! Intensity distributions: standalone documents, also owned by surface sources.

use super::{Descriptor, FeatureResult, UsageError};
use crate::model::intensity::{IntensityKind, IntensityTemplate};

pub type Intensity = Descriptor<IntensityTemplate>;

impl Descriptor<IntensityTemplate> {
    pub fn kind(&self) -> &IntensityKind {
        &self.value().kind
    }

    pub fn set_library(&mut self, intensity_file_uri: impl Into<String>) -> &mut Self {
        self.value_mut().kind = IntensityKind::Library {
            intensity_file_uri: intensity_file_uri.into(),
        };
        self
    }

    pub fn set_lambertian(&mut self, total_angle: f64) -> &mut Self {
        self.value_mut().kind = IntensityKind::Lambertian { total_angle };
        self
    }

    pub fn set_cos(&mut self, n: f64, total_angle: f64) -> &mut Self {
        self.value_mut().kind = IntensityKind::Cos { n, total_angle };
        self
    }

    pub fn set_gaussian(&mut self, fwhm_angle_x: f64, fwhm_angle_y: f64, total_angle: f64) -> &mut Self {
        self.value_mut().kind = IntensityKind::Gaussian {
            fwhm_angle_x,
            fwhm_angle_y,
            total_angle,
        };
        self
    }

    /// Not defined for library distributions.
    pub fn total_angle(&self) -> FeatureResult<f64> {
        match &self.value().kind {
            IntensityKind::Lambertian { total_angle }
            | IntensityKind::Cos { total_angle, .. }
            | IntensityKind::Gaussian { total_angle, .. } => Ok(*total_angle),
            IntensityKind::Library { .. } => Err(UsageError::wrong_mode(
                "total_angle",
                "lambertian, cos or gaussian",
                "library",
            )
            .into()),
        }
    }
}
