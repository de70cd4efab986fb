//! Translator trait
//!
//! Defines the interface every per-resource-type translator provides. Shared
//! validation and dependency bookkeeping live in `BaseTranslator`; a concrete
//! translator owns one and exposes it through `Translator::base`, so the
//! provided methods delegate to it.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{TranslateError, TranslateResult},
    mapping::MappingResult,
    resource::{Resource, ResourceType},
    settings::TranslationSettings,
};

/// Execution context for a translation call
#[derive(Debug, Clone)]
pub struct TranslationContext {
    /// Conventions applied to generated services
    pub settings: Arc<TranslationSettings>,
    /// Cancellation signal from the caller
    pub cancellation: CancellationToken,
}

impl TranslationContext {
    pub fn new(settings: TranslationSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl Default for TranslationContext {
    fn default() -> Self {
        Self::new(TranslationSettings::default())
    }
}

/// Shared part of every translator: the accepted type and its dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseTranslator {
    resource_type: ResourceType,
    dependencies: Vec<ResourceType>,
}

impl BaseTranslator {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(resource_type: ResourceType, dependencies: &[ResourceType]) -> Self {
        Self {
            resource_type,
            dependencies: dependencies.to_vec(),
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type.clone()
    }

    pub fn dependencies(&self) -> &[ResourceType] {
        &self.dependencies
    }

    /// Structural checks every translator runs before extraction
    pub fn validate(&self, resource: Option<&Resource>) -> TranslateResult<()> {
        let resource = resource.ok_or(TranslateError::MissingResource)?;

        if resource.resource_type != self.resource_type {
            return Err(TranslateError::TypeMismatch {
                expected: self.resource_type.clone(),
                actual: resource.resource_type.clone(),
            });
        }

        if resource.id.is_empty() {
            return Err(TranslateError::MissingId);
        }

        Ok(())
    }
}

/// Resource translator trait
///
/// All translators (ECS, RDS, Cloud Run, etc.) implement this trait. A translator
/// is stateless: `map` is a pure function of one resource to one result.
pub trait Translator: Send + Sync {
    /// Shared validation and dependency state
    fn base(&self) -> &BaseTranslator;

    /// The single resource type this translator accepts
    fn resource_type(&self) -> ResourceType {
        self.base().resource_type()
    }

    /// Resource types that should be translated first
    fn dependencies(&self) -> &[ResourceType] {
        self.base().dependencies()
    }

    /// Reject absent resources, type mismatches and empty ids
    fn validate(&self, resource: Option<&Resource>) -> TranslateResult<()> {
        self.base().validate(resource)
    }

    /// Translate one resource
    ///
    /// Implementations call `validate` first and return its error unchanged.
    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult>;
}
