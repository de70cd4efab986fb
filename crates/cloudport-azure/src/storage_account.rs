//! Azure storage account translator

use cloudport_types::{
    blueprints::apply_minio,
    naming::service_name,
    resource::field_string,
    BaseTranslator, MappingResult, Resource, ResourceType, TranslateResult, TranslationContext,
    Translator,
};
use tracing::debug;

/// Translates a storage account into MinIO with one bucket per blob container
pub struct StorageAccountTranslator {
    base: BaseTranslator,
}

impl StorageAccountTranslator {
    pub fn new() -> Self {
        Self {
            base: BaseTranslator::new(ResourceType::StorageAccount),
        }
    }
}

impl Default for StorageAccountTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for StorageAccountTranslator {
    fn base(&self) -> &BaseTranslator {
        &self.base
    }

    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        self.validate(Some(resource))?;
        debug!("Translating storage account: {}", resource.id);

        let name = service_name(&resource.display_name());
        let mut result = MappingResult::new(&name);

        // Containers are listed by name or as `{name, public_access}` objects
        let mut buckets = Vec::new();
        let mut public = Vec::new();
        for container in resource.get_config_list("containers") {
            let bucket = match container.as_str() {
                Some(s) => s.to_string(),
                None => field_string(container, "name"),
            };
            if bucket.is_empty() {
                continue;
            }
            let access = field_string(container, "public_access").to_lowercase();
            if access == "blob" || access == "container" {
                public.push(bucket.clone());
            }
            buckets.push(bucket);
        }
        if buckets.is_empty() {
            result.add_warning(format!(
                "Storage account {} lists no blob containers; MinIO starts without buckets",
                name
            ));
        }

        apply_minio(&mut result, &buckets, &ctx.settings);

        if !public.is_empty() {
            if let Some(script) = result.scripts.get_mut(&format!("init-{}.sh", name)) {
                for bucket in &public {
                    script.push_str(&format!("mc anonymous set download {}/{}\n", name, bucket));
                }
            }
            result.add_warning(format!(
                "Containers {} allowed anonymous reads; MinIO serves them anonymously on port 9000",
                public.join(", ")
            ));
        }

        let replication = resource.get_config_string("replication_type");
        if !replication.is_empty() && !replication.eq_ignore_ascii_case("lrs") {
            result.add_warning(format!(
                "{} used {} replication; MinIO stores a single copy on the Docker host",
                name, replication
            ));
        }

        for kind in ["file_shares", "queues", "tables"] {
            if !resource.get_config_list(kind).is_empty() {
                result.add_warning(format!(
                    "{} of {} are not translated; only blob storage maps to MinIO",
                    kind.replace('_', " "),
                    name
                ));
            }
        }

        result.add_manual_step(format!(
            "Applications using the access keys of {} must switch to the S3 API with the MinIO root credentials",
            name
        ));
        result.add_manual_step(format!(
            "Copy blobs with `azcopy copy` to local disk, then `mc mirror` them into {}",
            name
        ));
        result
            .docker_service
            .set_label("cloudport.source", resource.resource_type.as_str());

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bucket_per_container() {
        let translator = StorageAccountTranslator::new();
        let resource = Resource::new("sa-1", ResourceType::StorageAccount, "acmestore")
            .with_config(
                "containers",
                json!(["uploads", {"name": "public-assets", "public_access": "blob"}]),
            )
            .with_config("replication_type", json!("LRS"));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        let init = result.scripts.get("init-acmestore.sh").unwrap();
        assert!(init.contains("mc mb --ignore-existing acmestore/uploads"));
        assert!(init.contains("mc mb --ignore-existing acmestore/public-assets"));
        assert!(init.contains("mc anonymous set download acmestore/public-assets"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result
            .manual_steps
            .iter()
            .any(|s| s.contains("access keys")));
    }

    #[test]
    fn test_geo_replication_warns() {
        let translator = StorageAccountTranslator::new();
        let resource = Resource::new("sa-2", ResourceType::StorageAccount, "backups")
            .with_config("containers", json!(["daily"]))
            .with_config("replication_type", json!("GRS"));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("GRS replication"));
    }
}
