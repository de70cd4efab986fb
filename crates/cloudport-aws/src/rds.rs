//! RDS instance translator

use cloudport_types::{
    blueprints::{apply_database, DatabaseEngine, DatabaseSpec},
    naming::{env_var_name, service_name},
    BaseTranslator, MappingResult, Resource, ResourceType, TranslateResult, TranslationContext,
    Translator,
};
use tracing::debug;

/// Translates an RDS (or Aurora) instance into a PostgreSQL, MySQL or MariaDB container
pub struct RdsInstanceTranslator {
    base: BaseTranslator,
}

impl RdsInstanceTranslator {
    pub fn new() -> Self {
        Self {
            base: BaseTranslator::new(ResourceType::RdsInstance),
        }
    }
}

impl Default for RdsInstanceTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for RdsInstanceTranslator {
    fn base(&self) -> &BaseTranslator {
        &self.base
    }

    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        self.validate(Some(resource))?;
        debug!("Translating RDS instance: {}", resource.id);

        let name = service_name(&resource.display_name());
        let mut result = MappingResult::new(&name);

        let engine_name = resource.get_config_string("engine");
        let mut version = resource.get_config_string("engine_version");
        let engine = match DatabaseEngine::from_engine_name(&engine_name) {
            Some(engine) => engine,
            None => {
                result.add_warning(format!(
                    "Unsupported database engine '{}' for {}; defaulting to PostgreSQL",
                    engine_name, name
                ));
                version.clear();
                DatabaseEngine::Postgres
            }
        };

        let database = match resource.get_config_string("db_name") {
            db if db.is_empty() => name.replace('-', "_"),
            db => db,
        };
        let username = match resource.get_config_string("master_username") {
            user if user.is_empty() => "admin".to_string(),
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

        if resource.get_config_bool("publicly_accessible") {
            result
                .docker_service
                .add_port(engine.port(), engine.port());
        }

        let allocated = resource.get_config_int("allocated_storage");
        if allocated > 0 {
            result.add_manual_step(format!(
                "Ensure the Docker host has at least {} GB free for the {}-data volume",
                allocated, name
            ));
        }

        if resource.get_config_bool("multi_az") {
            result.add_warning(format!(
                "{} was Multi-AZ; the container runs a single instance without failover",
                name
            ));
        }

        let replicas = resource.get_config_string_list("read_replicas");
        if !replicas.is_empty() {
            result.add_warning(format!(
                "{} had {} read replica(s) that were not migrated",
                name,
                replicas.len()
            ));
        }

        if resource.get_config_bool("storage_encrypted") {
            result.add_warning(format!(
                "{} used encrypted storage; enable disk encryption on the Docker host",
                name
            ));
        }

        let retention = resource.get_config_int("backup_retention_period");
        if retention > 0 {
            result.add_manual_step(format!(
                "Schedule scripts/backup-{}.sh (RDS kept backups for {} days)",
                name, retention
            ));
        }

        result.add_manual_step(format!(
            "Migrate data from {} with a {} dump and restore it into the {} container",
            resource.id,
            engine.as_str(),
            name
        ));

        result
            .docker_service
            .set_label("cloudport.source", resource.resource_type.as_str());

        Ok(result)
    }
}
