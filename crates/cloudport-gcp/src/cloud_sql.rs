//! Cloud SQL instance translator

use cloudport_types::{
    blueprints::{apply_database, DatabaseEngine, DatabaseSpec},
    naming::{env_var_name, service_name},
    resource::field_bool,
    service::format_memory_mb,
    BaseTranslator, MappingResult, Resource, ResourceType, TranslateResult, TranslationContext,
    Translator,
};
use serde_json::Value;
use tracing::debug;

/// Translates a Cloud SQL instance into a PostgreSQL or MySQL container
pub struct CloudSqlTranslator {
    base: BaseTranslator,
}

impl CloudSqlTranslator {
    pub fn new() -> Self {
        Self {
            base: BaseTranslator::new(ResourceType::CloudSqlInstance),
        }
    }
}

impl Default for CloudSqlTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine and dotted version from a Cloud SQL `database_version` (`MYSQL_8_0` → MySQL `8.0`)
fn parse_database_version(database_version: &str) -> Option<(DatabaseEngine, String)> {
    let engine = DatabaseEngine::from_engine_name(database_version)?;
    let version = database_version
        .split('_')
        .skip(1)
        .collect::<Vec<_>>()
        .join(".");
    Some((engine, version))
}

/// vCPUs and MiB from a custom machine tier (`db-custom-2-7680`)
fn parse_custom_tier(tier: &str) -> Option<(String, i64)> {
    let rest = tier.strip_prefix("db-custom-")?;
    let (cpus, memory) = rest.split_once('-')?;
    let cpus: u32 = cpus.parse().ok()?;
    let memory: i64 = memory.parse().ok()?;
    Some((cpus.to_string(), memory))
}

impl Translator for CloudSqlTranslator {
    fn base(&self) -> &BaseTranslator {
        &self.base
    }

    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        self.validate(Some(resource))?;
        debug!("Translating Cloud SQL instance: {}", resource.id);

        let name = service_name(&resource.display_name());
        let mut result = MappingResult::new(&name);

        let database_version = resource.get_config_string("database_version");
        let (engine, version) = match parse_database_version(&database_version) {
            Some(parsed) => parsed,
            None => {
                result.add_warning(format!(
                    "Unsupported Cloud SQL version '{}' for {}; defaulting to PostgreSQL",
                    database_version, name
                ));
                (DatabaseEngine::Postgres, String::new())
            }
        };

        let database = resource
            .get_config_string_list("databases")
            .into_iter()
            .next()
            .unwrap_or_else(|| name.replace('-', "_"));
        let username = match resource.get_config_string("root_user") {
            user if user.is_empty() => "app".to_string(),
            user => user,
        };

        let spec = DatabaseSpec {
            engine,
            version,
            database,
            username,
            password_var: format!("{}_PASSWORD", env_var_name(&name)),
        };
        apply_database(&mut result, &spec, &ctx.settings);

        let tier = resource.get_config_string("tier");
        if let Some((cpus, memory_mb)) = parse_custom_tier(&tier) {
            result
                .docker_service
                .set_limits(cpus, format_memory_mb(memory_mb));
        } else if !tier.is_empty() {
            result.add_warning(format!(
                "Machine tier {} of {} has no direct equivalent; size the container manually",
                tier, name
            ));
        }

        if resource
            .get_config_string("availability_type")
            .eq_ignore_ascii_case("regional")
        {
            result.add_warning(format!(
                "{} was highly available (REGIONAL); the container runs a single instance",
                name
            ));
        }

        let backups = resource
            .get_config("backup_configuration")
            .cloned()
            .unwrap_or(Value::Null);
        if field_bool(&backups, "enabled") {
            result.add_manual_step(format!(
                "Schedule scripts/backup-{}.sh to replace automated Cloud SQL backups",
                name
            ));
        }

        result.add_manual_step(format!(
            "Export {} with `gcloud sql export` and import the dump into the {} container",
            resource.id, name
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
    fn test_database_version_parsing() {
        assert_eq!(
            parse_database_version("POSTGRES_15"),
            Some((DatabaseEngine::Postgres, "15".to_string()))
        );
        assert_eq!(
            parse_database_version("MYSQL_8_0"),
            Some((DatabaseEngine::MySql, "8.0".to_string()))
        );
        assert_eq!(parse_database_version("SQLSERVER_2019_STANDARD"), None);
    }

    #[test]
    fn test_postgres_instance_with_backups() {
        let translator = CloudSqlTranslator::new();
        let resource = Resource::new("sql-1", ResourceType::CloudSqlInstance, "main-db")
            .with_config("database_version", json!("POSTGRES_15"))
            .with_config("tier", json!("db-custom-2-7680"))
            .with_config("databases", json!(["shop"]))
            .with_config("backup_configuration", json!({"enabled": true}));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();
        let service = &result.docker_service;

        assert_eq!(service.image, "postgres:15-alpine");
        assert_eq!(service.environment.get("POSTGRES_DB").map(String::as_str), Some("shop"));
        let limits = service
            .deploy
            .as_ref()
            .and_then(|d| d.resources.as_ref())
            .and_then(|r| r.limits.as_ref())
            .unwrap();
        assert_eq!(limits.cpus.as_deref(), Some("2"));
        assert_eq!(limits.memory.as_deref(), Some("7680M"));
        assert!(result.scripts.contains_key("backup-main-db.sh"));
        assert!(result
            .manual_steps
            .iter()
            .any(|s| s.contains("Schedule scripts/backup-main-db.sh")));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_shared_tier_warns() {
        let translator = CloudSqlTranslator::new();
        let resource = Resource::new("sql-2", ResourceType::CloudSqlInstance, "small-db")
            .with_config("database_version", json!("MYSQL_8_0"))
            .with_config("tier", json!("db-f1-micro"));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert_eq!(result.docker_service.image, "mysql:8.0");
        assert!(result.warnings[0].contains("db-f1-micro"));
    }
}
