//! Self-hosted service blueprints
//!
//! Several cloud services map onto the same self-hosted software (RDS and Cloud SQL
//! both become PostgreSQL or MySQL, S3 and Azure Blob both become MinIO). The
//! builders here fill in a `MappingResult` so provider translators only deal with
//! provider-specific fields.

use crate::{
    mapping::{MappingResult, VolumeDefinition},
    naming::env_reference,
    service::{HealthCheck, ServiceDescription},
    settings::TranslationSettings,
};

/// Directory (relative to the output root) holding generated config files
pub const CONFIG_DIR: &str = "configs";

/// Directory (relative to the output root) holding generated scripts
pub const SCRIPTS_DIR: &str = "scripts";

/// Host path of a generated config file, as seen from the compose file
pub fn config_mount_source(config_path: &str) -> String {
    format!("./{}/{}", CONFIG_DIR, config_path)
}

/// Network, restart policy and provenance labels shared by all generated services
pub fn apply_defaults(service: &mut ServiceDescription, settings: &TranslationSettings) {
    if !service.networks.contains(&settings.network) {
        service.networks.push(settings.network.clone());
    }
    if service.restart.is_empty() {
        service.restart = settings.default_restart_policy.clone();
    }
    service.set_label("cloudport.managed", "true");
}

/// Traefik routing labels exposing `port` on `<service>.<domain>`
pub fn apply_http_routing(service: &mut ServiceDescription, settings: &TranslationSettings, port: u16) {
    if !settings.traefik_labels {
        return;
    }
    let router = service.name.clone();
    service.set_label("traefik.enable", "true");
    service.set_label(
        format!("traefik.http.routers.{}.rule", router),
        format!("Host(`{}`)", settings.host_for(&router)),
    );
    service.set_label(
        format!("traefik.http.services.{}.loadbalancer.server.port", router),
        port.to_string(),
    );
}

/// The port to route HTTP traffic to: the first common HTTP port, else the first port
pub fn primary_port(ports: &[u16]) -> Option<u16> {
    ports
        .iter()
        .copied()
        .find(|p| matches!(p, 80 | 443 | 8080 | 8000 | 3000 | 5000))
        .or_else(|| ports.first().copied())
}

/// Relational database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseEngine {
    Postgres,
    MySql,
    MariaDb,
}

impl DatabaseEngine {
    /// Recognize provider engine names (`postgres`, `aurora-postgresql`, `POSTGRES_15`, ...)
    pub fn from_engine_name(engine: &str) -> Option<Self> {
        let engine = engine.to_lowercase();
        if engine.contains("postgres") {
            Some(DatabaseEngine::Postgres)
        } else if engine.contains("mariadb") {
            Some(DatabaseEngine::MariaDb)
        } else if engine.contains("mysql") {
            Some(DatabaseEngine::MySql)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgres => "postgres",
            DatabaseEngine::MySql => "mysql",
            DatabaseEngine::MariaDb => "mariadb",
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            DatabaseEngine::Postgres => 5432,
            DatabaseEngine::MySql | DatabaseEngine::MariaDb => 3306,
        }
    }

    fn default_version(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgres => "16",
            DatabaseEngine::MySql => "8.0",
            DatabaseEngine::MariaDb => "11",
        }
    }

    /// Image for a provider engine version (`15.4` → `postgres:15-alpine`)
    pub fn image(&self, version: &str) -> String {
        let mut parts = version.split('.').filter(|p| !p.is_empty());
        let major = parts.next();
        let minor = parts.next();

        match self {
            DatabaseEngine::Postgres => {
                let major = major.unwrap_or(self.default_version());
                format!("postgres:{}-alpine", major)
            }
            DatabaseEngine::MySql | DatabaseEngine::MariaDb => {
                let tag = match (major, minor) {
                    (Some(major), Some(minor)) => format!("{}.{}", major, minor),
                    (Some(major), None) => major.to_string(),
                    _ => self.default_version().to_string(),
                };
                format!("{}:{}", self.as_str(), tag)
            }
        }
    }

    fn data_dir(&self) -> &'static str {
        match self {
            DatabaseEngine::Postgres => "/var/lib/postgresql/data",
            DatabaseEngine::MySql | DatabaseEngine::MariaDb => "/var/lib/mysql",
        }
    }
}

/// Parameters for a database blueprint
#[derive(Debug, Clone)]
pub struct DatabaseSpec {
    pub engine: DatabaseEngine,
    pub version: String,
    pub database: String,
    pub username: String,
    /// Name of the `.env` variable carrying the password
    pub password_var: String,
}

/// Fill `result` with a database server, its volume and a backup script
pub fn apply_database(result: &mut MappingResult, spec: &DatabaseSpec, settings: &TranslationSettings) {
    let name = result.docker_service.name.clone();
    let volume = format!("{}-data", name);
    let password = env_reference(&spec.password_var);

    let service = &mut result.docker_service;
    service.image = spec.engine.image(&spec.version);
    service.add_volume(&volume, spec.engine.data_dir(), false);

    let (health, dump) = match spec.engine {
        DatabaseEngine::Postgres => {
            service.set_env("POSTGRES_DB", &spec.database);
            service.set_env("POSTGRES_USER", &spec.username);
            service.set_env("POSTGRES_PASSWORD", &password);
            (
                format!("pg_isready -U {} -d {}", spec.username, spec.database),
                format!(
                    "docker compose exec -T {name} pg_dump -U {user} -d {db} --format=custom > \"$BACKUP_DIR/{name}-$(date +%Y%m%d%H%M%S).dump\"",
                    name = name,
                    user = spec.username,
                    db = spec.database
                ),
            )
        }
        DatabaseEngine::MySql | DatabaseEngine::MariaDb => {
            service.set_env("MYSQL_DATABASE", &spec.database);
            service.set_env("MYSQL_USER", &spec.username);
            service.set_env("MYSQL_PASSWORD", &password);
            service.set_env("MYSQL_ROOT_PASSWORD", &password);
            (
                "mysqladmin ping -h 127.0.0.1 --silent".to_string(),
                format!(
                    "docker compose exec -T {name} sh -c 'exec mysqldump -u{user} -p\"$MYSQL_PASSWORD\" {db}' > \"$BACKUP_DIR/{name}-$(date +%Y%m%d%H%M%S).sql\"",
                    name = name,
                    user = spec.username,
                    db = spec.database
                ),
            )
        }
    };

    service.health_check = Some(HealthCheck::shell(health).with_start_period("30s"));
    apply_defaults(service, settings);

    result.add_volume(VolumeDefinition::new(volume));
    result.add_script(
        format!("backup-{}.sh", name),
        format!(
            "#!/usr/bin/env bash\nset -euo pipefail\n\nBACKUP_DIR=\"${{BACKUP_DIR:-{}}}\"\nmkdir -p \"$BACKUP_DIR\"\n{}\n",
            settings.data_path("backups"),
            dump
        ),
    );
    result.add_manual_step(format!(
        "Set {} in the .env file next to docker-compose.yml before starting {}",
        spec.password_var, name
    ));
}

/// Fill `result` with a Redis server and its `redis.conf`
pub fn apply_redis(
    result: &mut MappingResult,
    version: &str,
    password_var: Option<&str>,
    settings: &TranslationSettings,
) {
    let name = result.docker_service.name.clone();
    let volume = format!("{}-data", name);
    let config_path = format!("redis/{}/redis.conf", name);

    let major = version.split('.').next().filter(|m| !m.is_empty()).unwrap_or("7");
    let mut conf = String::from("bind 0.0.0.0\nappendonly yes\nappendfsync everysec\n");
    if let Some(var) = password_var {
        conf.push_str("# requirepass is supplied on the command line from the environment\n");
        result
            .docker_service
            .set_env("REDIS_PASSWORD", env_reference(var));
    }

    let service = &mut result.docker_service;
    service.image = format!("redis:{}-alpine", major);
    service.command = if password_var.is_some() {
        vec![
            "sh".to_string(),
            "-c".to_string(),
            "exec redis-server /usr/local/etc/redis/redis.conf --requirepass \"$REDIS_PASSWORD\""
                .to_string(),
        ]
    } else {
        vec![
            "redis-server".to_string(),
            "/usr/local/etc/redis/redis.conf".to_string(),
        ]
    };
    service.add_volume(&volume, "/data", false);
    service.add_volume(
        &config_mount_source(&config_path),
        "/usr/local/etc/redis/redis.conf",
        true,
    );
    service.health_check = Some(HealthCheck::shell("redis-cli ping | grep PONG"));
    apply_defaults(service, settings);

    result.add_config(config_path, conf);
    result.add_volume(VolumeDefinition::new(volume));
}

/// Fill `result` with a MinIO server; `buckets` are created by an init script
pub fn apply_minio(result: &mut MappingResult, buckets: &[String], settings: &TranslationSettings) {
    let name = result.docker_service.name.clone();
    let volume = format!("{}-data", name);

    let service = &mut result.docker_service;
    service.image = "quay.io/minio/minio:latest".to_string();
    service.command = vec![
        "server".to_string(),
        "/data".to_string(),
        "--console-address".to_string(),
        ":9001".to_string(),
    ];
    service.set_env("MINIO_ROOT_USER", env_reference("MINIO_ROOT_USER"));
    service.set_env("MINIO_ROOT_PASSWORD", env_reference("MINIO_ROOT_PASSWORD"));
    service.add_port(9000, 9000);
    service.add_port(9001, 9001);
    service.add_volume(&volume, "/data", false);
    service.health_check = Some(HealthCheck::shell("mc ready local"));
    apply_defaults(service, settings);

    let mut script = format!(
        "#!/usr/bin/env bash\nset -euo pipefail\n\nMINIO_URL=\"${{MINIO_URL:-http://localhost:9000}}\"\nmc alias set {name} \"$MINIO_URL\" \"$MINIO_ROOT_USER\" \"$MINIO_ROOT_PASSWORD\"\n",
        name = name
    );
    for bucket in buckets {
        script.push_str(&format!("mc mb --ignore-existing {}/{}\n", name, bucket));
    }
    result.add_script(format!("init-{}.sh", name), script);
    result.add_volume(VolumeDefinition::new(volume));
    result.add_manual_step(
        "Set MINIO_ROOT_USER and MINIO_ROOT_PASSWORD in the .env file next to docker-compose.yml",
    );
}

/// Fill `result` with a RabbitMQ broker loading `definitions` at boot
pub fn apply_rabbitmq(
    result: &mut MappingResult,
    definitions: &serde_json::Value,
    settings: &TranslationSettings,
) {
    let name = result.docker_service.name.clone();
    let volume = format!("{}-data", name);
    let definitions_path = format!("rabbitmq/{}/definitions.json", name);
    let conf_path = format!("rabbitmq/{}/rabbitmq.conf", name);

    let service = &mut result.docker_service;
    service.image = "rabbitmq:3.13-management-alpine".to_string();
    service.add_port(5672, 5672);
    service.add_port(15672, 15672);
    service.add_volume(&volume, "/var/lib/rabbitmq", false);
    service.add_volume(
        &config_mount_source(&definitions_path),
        "/etc/rabbitmq/definitions.json",
        true,
    );
    service.add_volume(
        &config_mount_source(&conf_path),
        "/etc/rabbitmq/rabbitmq.conf",
        true,
    );
    service.health_check =
        Some(HealthCheck::shell("rabbitmq-diagnostics -q ping").with_start_period("20s"));
    apply_defaults(service, settings);

    let rendered =
        serde_json::to_string_pretty(definitions).unwrap_or_else(|_| definitions.to_string());
    result.add_config(definitions_path, rendered);
    result.add_config(
        conf_path,
        "management.load_definitions = /etc/rabbitmq/definitions.json\n",
    );
    result.add_volume(VolumeDefinition::new(volume));
}

/// Fill `result` with a NATS server running JetStream
pub fn apply_nats(result: &mut MappingResult, settings: &TranslationSettings) {
    let name = result.docker_service.name.clone();
    let volume = format!("{}-data", name);

    let service = &mut result.docker_service;
    service.image = "nats:2.10-alpine".to_string();
    service.command = vec![
        "-js".to_string(),
        "-sd".to_string(),
        "/data".to_string(),
        "-m".to_string(),
        "8222".to_string(),
    ];
    service.add_port(4222, 4222);
    service.add_port(8222, 8222);
    service.add_volume(&volume, "/data", false);
    service.health_check = Some(HealthCheck::shell(
        "wget -q --spider http://localhost:8222/healthz",
    ));
    apply_defaults(service, settings);

    result.add_volume(VolumeDefinition::new(volume));
}
