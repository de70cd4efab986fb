//! Cloud Run service translator

use cloudport_types::{
    blueprints::{apply_defaults, apply_http_routing},
    naming::{env_reference, env_var_name, service_name},
    resource::{field_int, field_list, field_string},
    service::{format_cpus, format_memory_mb},
    BaseTranslator, MappingResult, Resource, ResourceType, TranslateResult, TranslationContext,
    Translator,
};
use serde_json::Value;
use tracing::debug;

const DEFAULT_PORT: u16 = 8080;

/// Translates a Cloud Run service into an HTTP-routed compose service
pub struct CloudRunTranslator {
    base: BaseTranslator,
}

impl CloudRunTranslator {
    pub fn new() -> Self {
        Self {
            base: BaseTranslator::with_dependencies(
                ResourceType::CloudRunService,
                &[ResourceType::CloudSqlInstance, ResourceType::PubSubTopic],
            ),
        }
    }
}

impl Default for CloudRunTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// Kubernetes-style CPU quantity (`1000m`, `2`) as fractional CPUs
pub(crate) fn parse_cpu(quantity: &str) -> Option<String> {
    let quantity = quantity.trim();
    let cpus = match quantity.strip_suffix('m') {
        Some(milli) => milli.parse::<f64>().ok()? / 1000.0,
        None => quantity.parse::<f64>().ok()?,
    };
    if cpus <= 0.0 {
        return None;
    }
    Some(format_cpus(cpus))
}

/// Kubernetes-style memory quantity (`512Mi`, `1Gi`) as a compose memory value
pub(crate) fn parse_memory(quantity: &str) -> Option<String> {
    let quantity = quantity.trim();
    let (digits, unit) = quantity
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| quantity.split_at(i))
        .unwrap_or((quantity, ""));
    let amount: i64 = digits.parse().ok()?;
    let mb = match unit {
        "Gi" | "G" => amount.checked_mul(1024)?,
        "Mi" | "M" => amount,
        "Ki" | "K" => amount / 1024,
        "" => amount / (1024 * 1024),
        _ => return None,
    };
    if mb <= 0 {
        return None;
    }
    Some(format_memory_mb(mb))
}

impl Translator for CloudRunTranslator {
    fn base(&self) -> &BaseTranslator {
        &self.base
    }

    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        self.validate(Some(resource))?;
        debug!("Translating Cloud Run service: {}", resource.id);

        let name = service_name(&resource.display_name());
        let mut result = MappingResult::new(&name);
        let container = resource
            .get_config_list("containers")
            .first()
            .cloned()
            .unwrap_or(Value::Null);

        let image = match resource.get_config_string("image") {
            i if i.is_empty() => field_string(&container, "image"),
            i => i,
        };
        if image.is_empty() {
            result.add_warning(format!("Could not extract container image for {}", name));
        } else if image.contains("-docker.pkg.dev/") || image.starts_with("gcr.io/") {
            result.add_manual_step(format!(
                "Image {} lives in Google Artifact Registry; authenticate with `gcloud auth configure-docker` or push it to a self-hosted registry",
                image
            ));
        }
        result.docker_service.image = image;

        // Port: explicit config, else the first declared container port
        let declared = match resource.get_config_int("port") {
            0 => field_list(&container, "ports")
                .first()
                .map(|p| field_int(p, "container_port"))
                .unwrap_or(0),
            p => p,
        };
        let port = u16::try_from(declared)
            .ok()
            .filter(|p| *p > 0)
            .unwrap_or(DEFAULT_PORT);
        result.docker_service.set_env("PORT", port.to_string());

        let min_instances = resource.get_config_int("min_instances");
        result.docker_service.deploy_mut().replicas =
            u32::try_from(min_instances.max(1)).unwrap_or(1);

        let max_instances = resource.get_config_int("max_instances");
        if max_instances > 1 {
            result.add_warning(format!(
                "{} autoscaled up to {} instances; compose runs a fixed replica count",
                name, max_instances
            ));
        }

        let cpu = parse_cpu(&resource.get_config_string("cpu"));
        let memory = parse_memory(&resource.get_config_string("memory"));
        if cpu.is_some() || memory.is_some() {
            result
                .docker_service
                .set_limits(cpu.unwrap_or_default(), memory.unwrap_or_default());
        }

        for (key, value) in resource.get_config_string_map("env") {
            result.docker_service.set_env(key, value);
        }
        for entry in field_list(&container, "env") {
            let key = field_string(entry, "name");
            if key.is_empty() {
                continue;
            }
            if entry.get("value_source").is_some() {
                let var = env_var_name(&key);
                result.docker_service.set_env(&key, env_reference(&var));
                result.add_manual_step(format!(
                    "Copy the Secret Manager value for {} into the .env file as {}",
                    key, var
                ));
            } else {
                result.docker_service.set_env(key, field_string(entry, "value"));
            }
        }

        let ingress = resource.get_config_string("ingress").to_lowercase();
        if ingress.contains("internal") {
            debug!("{} has internal ingress; no public route", name);
        } else {
            apply_http_routing(&mut result.docker_service, &ctx.settings, port);
        }

        let sql_instances = resource.get_config_string_list("cloud_sql_instances");
        if !sql_instances.is_empty() {
            result.add_manual_step(format!(
                "Point {} at the database containers instead of the Cloud SQL connector ({})",
                name,
                sql_instances.join(", ")
            ));
        }

        let service_account = resource.get_config_string("service_account");
        if !service_account.is_empty() {
            result.add_manual_step(format!(
                "Replace service account {} with explicit credentials for {}",
                service_account, name
            ));
        }

        apply_defaults(&mut result.docker_service, &ctx.settings);
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
    fn test_quantity_parsing() {
        assert_eq!(parse_cpu("1000m").as_deref(), Some("1"));
        assert_eq!(parse_cpu("500m").as_deref(), Some("0.5"));
        assert_eq!(parse_cpu("2").as_deref(), Some("2"));
        assert_eq!(parse_cpu("lots"), None);
        assert_eq!(parse_memory("512Mi").as_deref(), Some("512M"));
        assert_eq!(parse_memory("2Gi").as_deref(), Some("2G"));
        assert_eq!(parse_memory("bad"), None);
        assert_eq!(parse_memory("9223372036854775807Gi"), None);
    }

    #[test]
    fn test_service_defaults() {
        let translator = CloudRunTranslator::new();
        let resource = Resource::new("run-1", ResourceType::CloudRunService, "api")
            .with_config("image", json!("europe-docker.pkg.dev/acme/api:3"));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();
        let service = &result.docker_service;

        assert_eq!(service.environment.get("PORT").map(String::as_str), Some("8080"));
        assert_eq!(service.replicas(), 1);
        assert_eq!(
            service
                .labels
                .get("traefik.http.services.api.loadbalancer.server.port")
                .map(String::as_str),
            Some("8080")
        );
        assert_eq!(result.manual_steps.len(), 1);
    }

    #[test]
    fn test_scaling_and_limits() {
        let translator = CloudRunTranslator::new();
        let resource = Resource::new("run-2", ResourceType::CloudRunService, "worker")
            .with_config("image", json!("ghcr.io/acme/worker:1"))
            .with_config("port", json!(3000))
            .with_config("min_instances", json!(2))
            .with_config("max_instances", json!(10))
            .with_config("cpu", json!("1000m"))
            .with_config("memory", json!("512Mi"))
            .with_config("env", json!({"QUEUE": "jobs"}));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();
        let service = &result.docker_service;

        assert_eq!(service.replicas(), 2);
        assert_eq!(service.environment.get("PORT").map(String::as_str), Some("3000"));
        assert_eq!(service.environment.get("QUEUE").map(String::as_str), Some("jobs"));
        let limits = service
            .deploy
            .as_ref()
            .and_then(|d| d.resources.as_ref())
            .and_then(|r| r.limits.as_ref())
            .unwrap();
        assert_eq!(limits.cpus.as_deref(), Some("1"));
        assert_eq!(limits.memory.as_deref(), Some("512M"));
        assert!(result.warnings[0].contains("up to 10 instances"));
    }

    #[test]
    fn test_internal_ingress_has_no_route() {
        let translator = CloudRunTranslator::new();
        let resource = Resource::new("run-3", ResourceType::CloudRunService, "internal-api")
            .with_config("image", json!("ghcr.io/acme/internal:1"))
            .with_config("ingress", json!("INGRESS_TRAFFIC_INTERNAL_ONLY"));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert!(!result.docker_service.labels.contains_key("traefik.enable"));
    }
}
