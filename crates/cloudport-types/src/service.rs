//! Service description types
//!
//! A `ServiceDescription` is a declarative container service in the shape of a
//! compose file service entry. Map fields are always initialized so translators
//! can insert without presence checks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declarative container service
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceDescription {
    /// Service name (the key in the compose `services` map)
    #[serde(skip)]
    pub name: String,
    /// Image reference
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    /// Container name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    /// Command override
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    /// Entrypoint override
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entrypoint: Vec<String>,
    /// Environment variables
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
    /// Port mappings (`host:container[/proto]`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// Volume mounts (`source:target[:ro]`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    /// Networks the service joins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
    /// Services that must start first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Restart policy (`no`, `always`, `on-failure`, `unless-stopped`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub restart: String,
    /// Linux capabilities to add
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cap_add: Vec<String>,
    /// Working directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// User to run as
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Container hostname
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Replica count and resource limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deploy: Option<DeployConfig>,
    /// Health check
    #[serde(
        default,
        rename = "healthcheck",
        skip_serializing_if = "Option::is_none"
    )]
    pub health_check: Option<HealthCheck>,
    /// Labels (reverse proxy routing, provenance)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Kernel parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sysctls: BTreeMap<String, String>,
    /// Resource ulimits
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ulimits: BTreeMap<String, Ulimit>,
}

impl ServiceDescription {
    /// Create an empty service with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Publish `container` on `host` over TCP
    pub fn add_port(&mut self, host: u16, container: u16) {
        self.ports.push(format!("{}:{}", host, container));
    }

    /// Mount `source` at `target`
    pub fn add_volume(&mut self, source: &str, target: &str, read_only: bool) {
        if read_only {
            self.volumes.push(format!("{}:{}:ro", source, target));
        } else {
            self.volumes.push(format!("{}:{}", source, target));
        }
    }

    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.environment.insert(key.into(), value.into());
    }

    pub fn set_label(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.labels.insert(key.into(), value.into());
    }

    /// Replica count from the deploy block (1 when unset)
    pub fn replicas(&self) -> u32 {
        self.deploy.as_ref().map(|d| d.replicas).unwrap_or(1)
    }

    /// Mutable deploy block, created on first use
    pub fn deploy_mut(&mut self) -> &mut DeployConfig {
        self.deploy.get_or_insert_with(DeployConfig::default)
    }

    /// Set CPU and memory limits, e.g. `("0.5", "512M")`
    pub fn set_limits(&mut self, cpus: impl Into<String>, memory: impl Into<String>) {
        let resources = self
            .deploy_mut()
            .resources
            .get_or_insert_with(ServiceResources::default);
        resources.limits = Some(ResourceSpec {
            cpus: Some(cpus.into()).filter(|c: &String| !c.is_empty()),
            memory: Some(memory.into()).filter(|m: &String| !m.is_empty()),
        });
    }
}

/// Deploy block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Number of replicas
    pub replicas: u32,
    /// Resource limits and reservations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ServiceResources>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            replicas: 1,
            resources: None,
        }
    }
}

/// Limits and reservations
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceResources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<ResourceSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservations: Option<ResourceSpec>,
}

/// CPU/memory quantity pair
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Fractional CPUs (e.g. "0.5")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpus: Option<String>,
    /// Memory (e.g. "512M")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
}

/// Container health check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Test command (`["CMD-SHELL", "..."]`)
    pub test: Vec<String>,
    pub interval: String,
    pub timeout: String,
    pub retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_period: Option<String>,
}

impl HealthCheck {
    /// Shell health check with the usual 30s/10s/3 cadence
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            test: vec!["CMD-SHELL".to_string(), command.into()],
            interval: "30s".to_string(),
            timeout: "10s".to_string(),
            retries: 3,
            start_period: None,
        }
    }

    pub fn with_start_period(mut self, period: impl Into<String>) -> Self {
        self.start_period = Some(period.into());
        self
    }
}

/// Soft/hard ulimit pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ulimit {
    pub soft: u64,
    pub hard: u64,
}

/// Render a MiB count as a compose memory quantity
pub fn format_memory_mb(mb: i64) -> String {
    if mb > 0 && mb % 1024 == 0 {
        format!("{}G", mb / 1024)
    } else {
        format!("{}M", mb.max(0))
    }
}

/// Render a fractional CPU count without trailing zeros
pub fn format_cpus(cpus: f64) -> String {
    let rendered = format!("{:.2}", cpus);
    rendered
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
