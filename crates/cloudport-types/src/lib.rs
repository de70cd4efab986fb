//! Core types and traits for the Cloudport translation engine
//!
//! This crate provides the foundational abstractions for translating cloud
//! provider resources (AWS, GCP, Azure) into self-hosted container services.
//!
//! # Architecture
//!
//! - **Resource**: typed view over a provider resource with lenient config accessors
//! - **Translator**: the contract every per-resource-type translator implements
//! - **MappingResult**: the output aggregate a translator fills in
//! - **Errors**: unified error handling across all translators
//!
//! # Usage
//!
//! Provider crates (e.g., `cloudport-aws`) depend on this crate and implement
//! the `Translator` trait by composing a `BaseTranslator`.

pub mod blueprints;
pub mod error;
pub mod mapping;
pub mod naming;
pub mod resource;
pub mod service;
pub mod settings;
pub mod translator;

pub use error::{TranslateError, TranslateResult};
pub use mapping::{MappingResult, VolumeDefinition};
pub use resource::{Provider, Resource, ResourceType};
pub use service::{
    DeployConfig, HealthCheck, ResourceSpec, ServiceDescription, ServiceResources, Ulimit,
};
pub use settings::{SettingsError, TranslationSettings};
pub use translator::{BaseTranslator, TranslationContext, Translator};
