//! Use-case services over the feature layer.
//!
//! # Responsibility
//! - Group features sharing one scene into a `Project`.
//! - Keep discovery (`find`) and scene-level display out of the features.

pub mod project;

pub use project::{
    lock, FeatureRef, FeatureType, Project, ProjectError, ProjectResult, Shared,
};
