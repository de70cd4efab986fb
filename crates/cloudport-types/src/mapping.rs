//! Mapping result
//!
//! The aggregate output of one translation. Translators only ever append to it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::service::ServiceDescription;

/// Named volume declared by a translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl VolumeDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: None,
            labels: BTreeMap::new(),
        }
    }
}

/// Output of translating one resource
#[derive(Debug, Clone, PartialEq)]
pub struct MappingResult {
    /// Primary deployable service
    pub docker_service: ServiceDescription,
    /// Extra services (sidecars, init jobs, admin consoles)
    pub additional_services: Vec<ServiceDescription>,
    /// Generated config files keyed by relative output path
    pub configs: BTreeMap<String, String>,
    /// Generated scripts keyed by file name
    pub scripts: BTreeMap<String, String>,
    /// Semantic gaps introduced by the translation, in generation order
    pub warnings: Vec<String>,
    /// Actions the operator must perform by hand, in generation order
    pub manual_steps: Vec<String>,
    /// Named volumes the services mount
    pub volumes: Vec<VolumeDefinition>,
}

impl MappingResult {
    /// Primary service name used for failed batch items
    pub const ERROR_SERVICE_NAME: &'static str = "error";

    /// Create a result whose primary service is named `service_name`
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            docker_service: ServiceDescription::new(service_name),
            additional_services: Vec::new(),
            configs: BTreeMap::new(),
            scripts: BTreeMap::new(),
            warnings: Vec::new(),
            manual_steps: Vec::new(),
            volumes: Vec::new(),
        }
    }

    /// Placeholder substituted for a resource that failed to translate
    pub fn failed(resource_id: &str, error: impl std::fmt::Display) -> Self {
        let mut result = Self::new(Self::ERROR_SERVICE_NAME);
        result.add_warning(format!(
            "Failed to map resource {}: {}",
            resource_id, error
        ));
        result
    }

    /// Whether this is a failed-item placeholder
    pub fn is_error_placeholder(&self) -> bool {
        self.docker_service.name == Self::ERROR_SERVICE_NAME && self.docker_service.image.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn add_manual_step(&mut self, step: impl Into<String>) {
        self.manual_steps.push(step.into());
    }

    /// Add a config file; a later write to the same path replaces the content
    pub fn add_config(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.configs.insert(path.into(), content.into());
    }

    pub fn add_script(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.scripts.insert(name.into(), content.into());
    }

    pub fn add_service(&mut self, service: ServiceDescription) {
        self.additional_services.push(service);
    }

    /// Declare a named volume once
    pub fn add_volume(&mut self, volume: VolumeDefinition) {
        if !self.volumes.iter().any(|v| v.name == volume.name) {
            self.volumes.push(volume);
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Primary service followed by the additional ones
    pub fn services(&self) -> impl Iterator<Item = &ServiceDescription> {
        std::iter::once(&self.docker_service).chain(self.additional_services.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_initializes_every_container() {
        let result = MappingResult::new("web");
        assert_eq!(result.docker_service.name, "web");
        assert!(result.additional_services.is_empty());
        assert!(result.configs.is_empty());
        assert!(result.scripts.is_empty());
        assert!(result.warnings.is_empty());
        assert!(result.manual_steps.is_empty());
        assert!(result.volumes.is_empty());
        assert!(!result.is_error_placeholder());
    }

    #[test]
    fn test_warnings_and_steps_keep_insertion_order() {
        let mut result = MappingResult::new("web");
        result.add_warning("first");
        result.add_manual_step("step one");
        result.add_warning("second");
        result.add_manual_step("step two");

        assert_eq!(result.warnings, vec!["first", "second"]);
        assert_eq!(result.manual_steps, vec!["step one", "step two"]);
    }

    #[test]
    fn test_failed_placeholder_embeds_id_and_error() {
        let result = MappingResult::failed("db-1", "boom");
        assert!(result.is_error_placeholder());
        assert_eq!(result.docker_service.name, "error");
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("db-1"));
        assert!(result.warnings[0].contains("boom"));
    }

    #[test]
    fn test_add_volume_deduplicates_by_name() {
        let mut result = MappingResult::new("db");
        result.add_volume(VolumeDefinition::new("db-data"));
        result.add_volume(VolumeDefinition::new("db-data"));
        assert_eq!(result.volumes.len(), 1);
    }

    #[test]
    fn test_services_iterates_primary_first() {
        let mut result = MappingResult::new("minio");
        result.add_service(ServiceDescription::new("minio-init"));
        let names: Vec<&str> = result.services().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["minio", "minio-init"]);
    }
}
