//! Azure Cache for Redis translator

use cloudport_types::{
    blueprints::apply_redis,
    naming::{env_var_name, service_name},
    service::format_memory_mb,
    BaseTranslator, MappingResult, Resource, ResourceType, TranslateResult, TranslationContext,
    Translator,
};
use tracing::debug;

/// Cache size in MiB for a SKU family and capacity (`C1` = 1 GB, `P2` = 13 GB)
fn cache_memory_mb(family: &str, capacity: i64) -> Option<i64> {
    let basic = [250, 1024, 2560, 6144, 13312, 26624, 54272];
    let premium = [6144, 13312, 26624, 54272, 122880];
    let index = usize::try_from(capacity).ok()?;
    match family.to_uppercase().as_str() {
        "C" => basic.get(index).copied(),
        "P" => index.checked_sub(1).and_then(|i| premium.get(i)).copied(),
        _ => None,
    }
}

/// Translates an Azure Cache for Redis instance into a Redis container
pub struct RedisCacheTranslator {
    base: BaseTranslator,
}

impl RedisCacheTranslator {
    pub fn new() -> Self {
        Self {
            base: BaseTranslator::new(ResourceType::RedisCache),
        }
    }
}

impl Default for RedisCacheTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for RedisCacheTranslator {
    fn base(&self) -> &BaseTranslator {
        &self.base
    }

    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        self.validate(Some(resource))?;
        debug!("Translating Azure Redis cache: {}", resource.id);

        let name = service_name(&resource.display_name());
        let mut result = MappingResult::new(&name);

        let version = match resource.get_config_string("redis_version") {
            v if v.is_empty() => "6".to_string(),
            v => v,
        };
        // Azure caches always require an access key
        let password_var = format!("{}_ACCESS_KEY", env_var_name(&name));
        apply_redis(&mut result, &version, Some(password_var.as_str()), &ctx.settings);
        result.add_manual_step(format!(
            "Set {} in the .env file; clients authenticate with it instead of the Azure access key",
            password_var
        ));

        let family = resource.get_config_string("family");
        let capacity = resource.get_config_int("capacity");
        match cache_memory_mb(&family, capacity) {
            Some(mb) => result.docker_service.set_limits("", format_memory_mb(mb)),
            None if family.is_empty() => {}
            None => result.add_warning(format!(
                "Unknown cache size {}{} for {}; no memory limit applied",
                family, capacity, name
            )),
        }

        if resource.get_config_string("sku").eq_ignore_ascii_case("premium") {
            let shards = resource.get_config_int("shard_count");
            if shards > 1 {
                result.add_warning(format!(
                    "{} was clustered with {} shards; the container runs a single node",
                    name, shards
                ));
            }
        }

        // Non-SSL port disabled means clients were connecting over TLS on 6380
        let non_ssl = resource
            .get_config("enable_non_ssl_port")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !non_ssl {
            result.add_warning(format!(
                "Clients of {} connected over TLS on port 6380; the container serves plain Redis on 6379",
                name
            ));
        }

        result
            .docker_service
            .set_label("cloudport.source", resource.resource_type.as_str());

        Ok(result)
    }
}
