//! Translator registry
//!
//! Maps each resource type to the translator that handles it. The table sits
//! behind one reader/writer lock; the lock is never held while a translator
//! runs, so translations proceed concurrently with each other and with
//! registration changes.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cloudport_types::{
    MappingResult, Resource, ResourceType, TranslateError, TranslateResult, TranslationContext,
    Translator,
};
use tracing::{debug, info, warn};

/// Type-keyed translator table
#[derive(Default)]
pub struct Registry {
    translators: RwLock<HashMap<ResourceType, Arc<dyn Translator>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // The table holds no invariants a panicking writer could break, so a
    // poisoned lock is recovered rather than propagated.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ResourceType, Arc<dyn Translator>>> {
        self.translators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ResourceType, Arc<dyn Translator>>> {
        self.translators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a translator for its resource type; replaces any previous one
    pub fn register(&self, translator: Arc<dyn Translator>) {
        let resource_type = translator.resource_type();
        if self
            .write()
            .insert(resource_type.clone(), translator)
            .is_some()
        {
            debug!("Replaced translator for resource type: {}", resource_type);
        } else {
            info!("Registered translator for resource type: {}", resource_type);
        }
    }

    /// Remove the translator for a type, returning it if one was registered
    pub fn unregister(&self, resource_type: ResourceType) -> Option<Arc<dyn Translator>> {
        let removed = self.write().remove(&resource_type);
        if removed.is_some() {
            debug!("Unregistered translator for resource type: {}", resource_type);
        }
        removed
    }

    /// Remove every translator
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Get the translator for a type
    pub fn get(&self, resource_type: ResourceType) -> TranslateResult<Arc<dyn Translator>> {
        self.read()
            .get(&resource_type)
            .cloned()
            .ok_or(TranslateError::TranslatorNotFound(resource_type))
    }

    pub fn has_mapper(&self, resource_type: ResourceType) -> bool {
        self.read().contains_key(&resource_type)
    }

    /// Registered types, sorted for stable output
    pub fn supported_types(&self) -> Vec<ResourceType> {
        let mut types: Vec<ResourceType> = self.read().keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Translate one resource with the translator registered for its type
    pub fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        // `get` releases the read lock before the translator runs
        let translator = self.get(resource.resource_type.clone())?;
        debug!(
            "Mapping resource {} ({})",
            resource.id, resource.resource_type
        );
        translator.map(ctx, resource)
    }

    /// Translate every resource in order, substituting a placeholder for failures
    ///
    /// The returned list always has one entry per input resource. The call only
    /// fails when the context is already cancelled before the first resource.
    pub fn map_batch(
        &self,
        ctx: &TranslationContext,
        resources: &[Resource],
    ) -> TranslateResult<Vec<MappingResult>> {
        if ctx.is_cancelled() {
            return Err(TranslateError::Cancelled);
        }

        let mut results = Vec::with_capacity(resources.len());
        let mut failed = 0usize;

        for resource in resources {
            match self.map(ctx, resource) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Failed to map resource {}: {}", resource.id, e);
                    failed += 1;
                    results.push(MappingResult::failed(&resource.id, &e));
                }
            }
        }

        info!(
            "Mapped {} resources ({} failed)",
            resources.len(),
            failed
        );
        Ok(results)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("supported_types", &self.supported_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudport_types::BaseTranslator;

    struct NamedTranslator {
        base: BaseTranslator,
        image: &'static str,
    }

    impl NamedTranslator {
        fn new(resource_type: ResourceType, image: &'static str) -> Arc<Self> {
            Arc::new(Self {
                base: BaseTranslator::new(resource_type),
                image,
            })
        }
    }

    impl Translator for NamedTranslator {
        fn base(&self) -> &BaseTranslator {
            &self.base
        }

        fn map(
            &self,
            _ctx: &TranslationContext,
            resource: &Resource,
        ) -> TranslateResult<MappingResult> {
            self.validate(Some(resource))?;
            let mut result = MappingResult::new(resource.display_name());
            result.docker_service.image = self.image.to_string();
            Ok(result)
        }
    }

    #[test]
    fn test_register_last_write_wins() {
        let registry = Registry::new();
        registry.register(NamedTranslator::new(ResourceType::S3Bucket, "first"));
        registry.register(NamedTranslator::new(ResourceType::S3Bucket, "second"));

        assert_eq!(registry.len(), 1);
        let resource = Resource::new("bucket-1", ResourceType::S3Bucket, "assets");
        let result = registry
            .map(&TranslationContext::default(), &resource)
            .unwrap();
        assert_eq!(result.docker_service.image, "second");
    }

    #[test]
    fn test_get_unknown_type_names_the_type() {
        let registry = Registry::new();
        let err = registry.get(ResourceType::SqsQueue).err().unwrap();
        assert_eq!(err, TranslateError::TranslatorNotFound(ResourceType::SqsQueue));
        assert!(err.to_string().contains("aws_sqs_queue"));
    }

    #[test]
    fn test_introspection_and_management() {
        let registry = Registry::new();
        assert!(registry.is_empty());

        registry.register(NamedTranslator::new(ResourceType::SqsQueue, "rabbitmq"));
        registry.register(NamedTranslator::new(ResourceType::EcsService, "app"));

        assert!(registry.has_mapper(ResourceType::SqsQueue));
        assert_eq!(
            registry.supported_types(),
            vec![ResourceType::EcsService, ResourceType::SqsQueue]
        );

        assert!(registry.unregister(ResourceType::SqsQueue).is_some());
        assert!(registry.unregister(ResourceType::SqsQueue).is_none());
        assert!(!registry.has_mapper(ResourceType::SqsQueue));

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_map_batch_substitutes_placeholder_and_continues() {
        let registry = Registry::new();
        registry.register(NamedTranslator::new(ResourceType::EcsService, "app"));

        let resources = vec![
            Resource::new("svc-1", ResourceType::EcsService, "web"),
            Resource::new("db-1", ResourceType::RdsInstance, "db"),
            Resource::new("", ResourceType::EcsService, "broken"),
            Resource::new("svc-2", ResourceType::EcsService, "worker"),
        ];

        let results = registry
            .map_batch(&TranslationContext::default(), &resources)
            .unwrap();

        assert_eq!(results.len(), resources.len());
        assert_eq!(results[0].docker_service.name, "web");
        assert!(results[1].is_error_placeholder());
        assert!(results[1].warnings[0].contains("db-1"));
        assert!(results[1].warnings[0].contains("aws_rds_instance"));
        assert!(results[2].is_error_placeholder());
        assert!(results[2].warnings[0].contains("resource ID is required"));
        assert_eq!(results[3].docker_service.name, "worker");
    }

    #[test]
    fn test_map_batch_reports_unknown_wire_type() {
        let registry = Registry::new();
        registry.register(NamedTranslator::new(ResourceType::EcsService, "app"));

        let resources = vec![
            Resource::new("svc-1", ResourceType::EcsService, "web"),
            Resource::new("table-1", ResourceType::from_wire("aws_dynamodb_table"), "sessions"),
        ];

        let results = registry
            .map_batch(&TranslationContext::default(), &resources)
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[1].is_error_placeholder());
        assert!(results[1].warnings[0].contains("table-1"));
        assert!(results[1].warnings[0].contains("aws_dynamodb_table"));
    }

    #[test]
    fn test_map_batch_on_cancelled_context_does_not_start() {
        let registry = Registry::new();
        let ctx = TranslationContext::default();
        ctx.cancellation.cancel();

        let resources = vec![Resource::new("svc-1", ResourceType::EcsService, "web")];
        assert_eq!(
            registry.map_batch(&ctx, &resources),
            Err(TranslateError::Cancelled)
        );
    }

    #[test]
    fn test_map_batch_empty_input() {
        let registry = Registry::new();
        let results = registry
            .map_batch(&TranslationContext::default(), &[])
            .unwrap();
        assert!(results.is_empty());
    }
}
