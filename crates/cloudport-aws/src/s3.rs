//! S3 bucket translator

use cloudport_types::{
    blueprints::apply_minio,
    naming::service_name,
    BaseTranslator, MappingResult, Resource, ResourceType, TranslateResult, TranslationContext,
    Translator,
};
use tracing::debug;

/// Translates an S3 bucket into a MinIO server holding a bucket of the same name
pub struct S3BucketTranslator {
    base: BaseTranslator,
}

impl S3BucketTranslator {
    pub fn new() -> Self {
        Self {
            base: BaseTranslator::new(ResourceType::S3Bucket),
        }
    }
}

impl Default for S3BucketTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for S3BucketTranslator {
    fn base(&self) -> &BaseTranslator {
        &self.base
    }

    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        self.validate(Some(resource))?;
        debug!("Translating S3 bucket: {}", resource.id);

        let name = service_name(&resource.display_name());
        let bucket = match resource.get_config_string("bucket") {
            b if b.is_empty() => name.clone(),
            b => b,
        };

        let mut result = MappingResult::new(&name);
        apply_minio(&mut result, std::slice::from_ref(&bucket), &ctx.settings);

        let mut extra_init = String::new();
        if resource.get_config_bool("versioning") {
            extra_init.push_str(&format!("mc version enable {}/{}\n", name, bucket));
        }

        let public = resource.get_config_bool("public_access")
            || matches!(
                resource.get_config_string("acl").as_str(),
                "public-read" | "public-read-write"
            );
        if public {
            extra_init.push_str(&format!("mc anonymous set download {}/{}\n", name, bucket));
            result.add_warning(format!(
                "Bucket {} allowed public access; MinIO serves it anonymously on port 9000",
                bucket
            ));
        }

        if !extra_init.is_empty() {
            if let Some(script) = result.scripts.get_mut(&format!("init-{}.sh", name)) {
                script.push_str(&extra_init);
            }
        }

        result.add_script(
            format!("sync-{}.sh", name),
            format!(
                "#!/usr/bin/env bash\nset -euo pipefail\n\n# Copy objects from S3 into the local MinIO bucket\nmc alias set s3 https://s3.amazonaws.com \"$AWS_ACCESS_KEY_ID\" \"$AWS_SECRET_ACCESS_KEY\"\nmc alias set {name} \"${{MINIO_URL:-http://localhost:9000}}\" \"$MINIO_ROOT_USER\" \"$MINIO_ROOT_PASSWORD\"\nmc mirror --preserve s3/{bucket} {name}/{bucket}\n",
                name = name,
                bucket = bucket
            ),
        );
        result.add_manual_step(format!(
            "Run scripts/sync-{}.sh with AWS credentials to copy existing objects",
            name
        ));

        if !resource.get_config_list("lifecycle_rules").is_empty() {
            result.add_manual_step(format!(
                "Recreate the lifecycle rules of {} with `mc ilm rule add`",
                bucket
            ));
        }

        if resource.get_config("replication").is_some() {
            result.add_manual_step(format!(
                "Configure replication for {} with `mc replicate add` if still required",
                bucket
            ));
        }

        if resource.get_config("website").is_some() {
            result.add_warning(format!(
                "Static website hosting on {} is not translated; serve the files from a web server container",
                bucket
            ));
        }

        result
            .docker_service
            .set_label("cloudport.source", resource.resource_type.as_str());

        Ok(result)
    }
}
