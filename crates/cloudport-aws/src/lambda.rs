//! Lambda function translator
//!
//! Functions run on the AWS Lambda base images, which ship the Runtime Interface
//! Emulator. Invocations become HTTP calls to
//! `http://<host>:9000/2015-03-31/functions/function/invocations`.

use cloudport_types::{
    blueprints::apply_defaults,
    naming::{env_reference, is_secret_key, service_name},
    resource::field_string,
    service::format_memory_mb,
    BaseTranslator, MappingResult, Resource, ResourceType, TranslateResult, TranslationContext,
    Translator,
};
use tracing::debug;

const RUNTIME_REGISTRY: &str = "public.ecr.aws/lambda";

/// Translates a Lambda function into a container on the matching runtime image
pub struct LambdaFunctionTranslator {
    base: BaseTranslator,
}

impl LambdaFunctionTranslator {
    pub fn new() -> Self {
        Self {
            base: BaseTranslator::with_dependencies(
                ResourceType::LambdaFunction,
                &[ResourceType::SqsQueue, ResourceType::S3Bucket],
            ),
        }
    }
}

impl Default for LambdaFunctionTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// Base image for a Lambda runtime identifier (`python3.12` → `.../python:3.12`)
fn runtime_image(runtime: &str) -> Option<String> {
    let runtime = runtime.trim().to_lowercase();
    let (family, version) = if let Some(v) = runtime.strip_prefix("python") {
        ("python", v.to_string())
    } else if let Some(v) = runtime.strip_prefix("nodejs") {
        ("nodejs", v.trim_end_matches(".x").to_string())
    } else if let Some(v) = runtime.strip_prefix("java") {
        ("java", v.to_string())
    } else if let Some(v) = runtime.strip_prefix("dotnet") {
        ("dotnet", v.to_string())
    } else if let Some(v) = runtime.strip_prefix("ruby") {
        ("ruby", v.to_string())
    } else if let Some(v) = runtime.strip_prefix("provided.") {
        ("provided", v.to_string())
    } else if runtime == "provided" {
        ("provided", "al2".to_string())
    } else {
        return None;
    };

    if version.is_empty() {
        return Some(format!("{}/{}:latest", RUNTIME_REGISTRY, family));
    }
    Some(format!("{}/{}:{}", RUNTIME_REGISTRY, family, version))
}

impl Translator for LambdaFunctionTranslator {
    fn base(&self) -> &BaseTranslator {
        &self.base
    }

    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        self.validate(Some(resource))?;
        debug!("Translating Lambda function: {}", resource.id);

        let name = service_name(&resource.display_name());
        let mut result = MappingResult::new(&name);
        let runtime = resource.get_config_string("runtime");
        let image_uri = resource.get_config_string("image_uri");

        // Container-image functions keep their image; zip functions use the runtime base image
        let image = if !image_uri.is_empty() {
            image_uri
        } else {
            match runtime_image(&runtime) {
                Some(image) => image,
                None => {
                    result.add_warning(format!(
                        "Unsupported Lambda runtime '{}' for {}; using the provided.al2023 base image",
                        runtime, name
                    ));
                    format!("{}/provided:al2023", RUNTIME_REGISTRY)
                }
            }
        };
        result.docker_service.image = image;

        let handler = resource.get_config_string("handler");
        if !handler.is_empty() {
            result.docker_service.command = vec![handler];
        }

        result.docker_service.add_port(9000, 8080);

        let memory = resource.get_config_int("memory_size");
        if memory > 0 {
            result.docker_service.set_limits("", format_memory_mb(memory));
        }

        let timeout = resource.get_config_int("timeout");
        if timeout > 0 {
            result
                .docker_service
                .set_env("AWS_LAMBDA_FUNCTION_TIMEOUT", timeout.to_string());
        }
        result
            .docker_service
            .set_env("AWS_LAMBDA_FUNCTION_NAME", &name);

        // `environment` is either the plain map or the API shape `{variables: {...}}`
        let mut variables = resource.get_config_string_map("environment");
        if let Some(nested) = resource
            .get_config_map("environment")
            .and_then(|env| env.get("variables"))
            .and_then(|v| v.as_object())
        {
            variables.remove("variables");
            for (key, value) in nested {
                if let Some(s) = value.as_str() {
                    variables.insert(key.clone(), s.to_string());
                } else if !value.is_null() {
                    variables.insert(key.clone(), value.to_string());
                }
            }
        }
        for (key, value) in variables {
            if is_secret_key(&key) {
                result
                    .docker_service
                    .set_env(&key, env_reference(&key));
                result.add_manual_step(format!(
                    "Set {} for function {} in the .env file",
                    key, name
                ));
            } else {
                result.docker_service.set_env(key, value);
            }
        }

        if resource.get_config_string("image_uri").is_empty() {
            let code_dir = format!("./functions/{}", name);
            result
                .docker_service
                .add_volume(&code_dir, "/var/task", true);
            result.add_manual_step(format!(
                "Extract the deployment package of {} into {} (the function code is not exported)",
                name, code_dir
            ));
        }

        let event_sources = resource.get_config_list("event_sources");
        if !event_sources.is_empty() {
            let arns: Vec<String> = event_sources
                .iter()
                .map(|source| match source.as_str() {
                    Some(arn) => arn.to_string(),
                    None => field_string(source, "event_source_arn"),
                })
                .filter(|arn| !arn.is_empty())
                .collect();
            result.add_warning(format!(
                "Event source mappings of {} ({}) are not migrated; invoke the function from a consumer or scheduler",
                name,
                if arns.is_empty() {
                    event_sources.len().to_string()
                } else {
                    arns.join(", ")
                }
            ));
        }

        if !resource.get_config_string("role").is_empty() {
            result.add_manual_step(format!(
                "Grant {} credentials for the services its IAM execution role allowed",
                name
            ));
        }

        apply_defaults(&mut result.docker_service, &ctx.settings);
        result
            .docker_service
            .set_label("cloudport.source", resource.resource_type.as_str());

        Ok(result)
    }
}
