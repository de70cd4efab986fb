//! ElastiCache cluster translator

use cloudport_types::{
    blueprints::{apply_defaults, apply_redis},
    naming::{env_var_name, service_name},
    BaseTranslator, HealthCheck, MappingResult, Resource, ResourceType, TranslateResult,
    TranslationContext, Translator,
};
use tracing::debug;

/// Translates an ElastiCache cluster into a Redis or Memcached container
pub struct ElastiCacheTranslator {
    base: BaseTranslator,
}

impl ElastiCacheTranslator {
    pub fn new() -> Self {
        Self {
            base: BaseTranslator::new(ResourceType::ElastiCacheCluster),
        }
    }
}

impl Default for ElastiCacheTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for ElastiCacheTranslator {
    fn base(&self) -> &BaseTranslator {
        &self.base
    }

    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        self.validate(Some(resource))?;
        debug!("Translating ElastiCache cluster: {}", resource.id);

        let name = service_name(&resource.display_name());
        let mut result = MappingResult::new(&name);
        let engine = resource.get_config_string("engine").to_lowercase();
        let version = resource.get_config_string("engine_version");

        if engine == "memcached" {
            let major_minor: Vec<&str> = version.split('.').take(2).collect();
            let tag = if version.is_empty() {
                "1.6".to_string()
            } else {
                major_minor.join(".")
            };
            let service = &mut result.docker_service;
            service.image = format!("memcached:{}-alpine", tag);
            service.command = vec!["memcached".to_string(), "-m".to_string(), "64".to_string()];
            service.health_check = Some(HealthCheck::shell(
                "echo stats | nc -w 1 127.0.0.1 11211 | grep -q uptime",
            ));
            apply_defaults(service, &ctx.settings);
        } else {
            if !engine.is_empty() && engine != "redis" && engine != "valkey" {
                result.add_warning(format!(
                    "Unknown cache engine '{}' for {}; using Redis",
                    engine, name
                ));
            }

            let password_var = if resource.get_config_bool("auth_token_enabled")
                || !resource.get_config_string("auth_token").is_empty()
            {
                Some(format!("{}_AUTH_TOKEN", env_var_name(&name)))
            } else {
                None
            };
            apply_redis(&mut result, &version, password_var.as_deref(), &ctx.settings);

            if let Some(var) = password_var {
                result.add_manual_step(format!(
                    "Set {} in the .env file to the ElastiCache AUTH token (or a new password)",
                    var
                ));
            }

            if resource.get_config_bool("transit_encryption_enabled") {
                result.add_warning(format!(
                    "{} used in-transit encryption; the Redis container listens without TLS",
                    name
                ));
            }
        }

        let nodes = resource.get_config_int("num_cache_nodes");
        if nodes > 1 {
            result.add_warning(format!(
                "{} had {} cache nodes; the container runs a single node",
                name, nodes
            ));
        }

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
    fn test_redis_cluster() {
        let translator = ElastiCacheTranslator::new();
        let resource = Resource::new("cache-1", ResourceType::ElastiCacheCluster, "sessions")
            .with_config("engine", json!("redis"))
            .with_config("engine_version", json!("7.1"));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert_eq!(result.docker_service.image, "redis:7-alpine");
        assert!(result.configs.contains_key("redis/sessions/redis.conf"));
        assert!(!result.docker_service.environment.contains_key("REDIS_PASSWORD"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_auth_token_becomes_password() {
        let translator = ElastiCacheTranslator::new();
        let resource = Resource::new("cache-1", ResourceType::ElastiCacheCluster, "sessions")
            .with_config("engine", json!("redis"))
            .with_config("auth_token_enabled", json!(true));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert_eq!(
            result.docker_service.environment.get("REDIS_PASSWORD").map(String::as_str),
            Some("${SESSIONS_AUTH_TOKEN}")
        );
        assert!(result.docker_service.command.join(" ").contains("--requirepass"));
        assert_eq!(result.manual_steps.len(), 1);
    }

    #[test]
    fn test_memcached_cluster() {
        let translator = ElastiCacheTranslator::new();
        let resource = Resource::new("cache-2", ResourceType::ElastiCacheCluster, "fragments")
            .with_config("engine", json!("memcached"))
            .with_config("engine_version", json!("1.6.22"))
            .with_config("num_cache_nodes", json!(3));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert_eq!(result.docker_service.image, "memcached:1.6-alpine");
        assert!(result.configs.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("3 cache nodes"));
    }
}
