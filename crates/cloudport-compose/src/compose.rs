//! Compose manifest emitter
//!
//! Collects the services and volumes of a batch of mapping results into one
//! compose file. Error placeholders are skipped, colliding service names get a
//! numeric suffix and a host port published twice moves to the next free one.

use std::collections::{BTreeMap, HashSet};

use cloudport_types::{MappingResult, ServiceDescription, TranslationSettings};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ComposeResult;

/// Top-level named volume entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VolumeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Top-level network entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEntry {
    pub driver: String,
}

/// A compose file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComposeFile {
    pub services: BTreeMap<String, ServiceDescription>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub volumes: BTreeMap<String, VolumeEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, NetworkEntry>,
    /// Renames and port moves made while assembling the file
    #[serde(skip)]
    pub adjustments: Vec<String>,
}

/// Split a `host:container[/protocol]` mapping; `None` when no host port is published
fn published_port(mapping: &str) -> Option<(u16, &str, Option<&str>)> {
    let (ports, protocol) = match mapping.split_once('/') {
        Some((ports, protocol)) => (ports, Some(protocol)),
        None => (mapping, None),
    };
    let (host, container) = ports.split_once(':')?;
    Some((host.parse().ok()?, container, protocol))
}

impl ComposeFile {
    /// Build a compose file from mapping results, in result order
    pub fn from_results(results: &[MappingResult], settings: &TranslationSettings) -> Self {
        let mut compose = ComposeFile::default();

        for result in results {
            if result.is_error_placeholder() {
                debug!("Skipping error placeholder in compose output");
                continue;
            }

            for service in result.services() {
                compose.add_service(service.clone());
            }

            for volume in &result.volumes {
                compose
                    .volumes
                    .entry(volume.name.clone())
                    .or_insert_with(|| VolumeEntry {
                        driver: volume.driver.clone(),
                        labels: volume.labels.clone(),
                    });
            }
        }

        compose.networks.insert(
            settings.network.clone(),
            NetworkEntry {
                driver: "bridge".to_string(),
            },
        );

        compose
    }

    /// Insert a service, suffixing its name (`-2`, `-3`, ...) on collision and
    /// moving host ports another service already publishes
    pub fn add_service(&mut self, mut service: ServiceDescription) -> String {
        let base = service.name.clone();
        let mut name = base.clone();
        let mut suffix = 2;
        while self.services.contains_key(&name) {
            name = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        if name != base {
            warn!("Service name {} already used; renamed to {}", base, name);
            self.adjustments.push(format!(
                "Service name `{}` was already used; renamed to `{}`",
                base, name
            ));
        }
        service.name = name.clone();

        self.reassign_host_ports(&mut service);
        self.services.insert(name.clone(), service);
        name
    }

    /// Host ports (with protocol) published by services already in the file
    fn published_ports(&self) -> HashSet<(u16, String)> {
        self.services
            .values()
            .flat_map(|s| s.ports.iter())
            .filter_map(|m| published_port(m))
            .map(|(host, _, protocol)| (host, protocol.unwrap_or("tcp").to_string()))
            .collect()
    }

    fn reassign_host_ports(&mut self, service: &mut ServiceDescription) {
        let mut used = self.published_ports();

        for mapping in service.ports.iter_mut() {
            let Some((host, container, protocol)) = published_port(mapping) else {
                continue;
            };
            let container = container.to_string();
            let protocol_key = protocol.unwrap_or("tcp").to_string();
            let suffix = protocol.map(|p| format!("/{}", p)).unwrap_or_default();

            if used.insert((host, protocol_key.clone())) {
                continue;
            }

            let free = (host.saturating_add(1)..=u16::MAX)
                .find(|p| !used.contains(&(*p, protocol_key.clone())));
            match free {
                Some(port) => {
                    used.insert((port, protocol_key));
                    *mapping = format!("{}:{}{}", port, container, suffix);
                    warn!(
                        "Host port {} of {} already published; using {}",
                        host, service.name, port
                    );
                    self.adjustments.push(format!(
                        "Host port {} of `{}` was already published by another service; published on {} instead",
                        host, service.name, port
                    ));
                }
                None => self.adjustments.push(format!(
                    "Host port {} of `{}` is already published and no free port was found",
                    host, service.name
                )),
            }
        }
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> ComposeResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudport_types::VolumeDefinition;

    fn result(name: &str, image: &str) -> MappingResult {
        let mut result = MappingResult::new(name);
        result.docker_service.image = image.to_string();
        result
    }

    #[test]
    fn test_placeholders_are_skipped() {
        let results = vec![
            result("web", "nginx:alpine"),
            MappingResult::failed("db-1", "boom"),
        ];

        let compose = ComposeFile::from_results(&results, &TranslationSettings::default());

        assert_eq!(compose.services.len(), 1);
        assert!(compose.services.contains_key("web"));
    }

    #[test]
    fn test_colliding_names_get_suffixes() {
        let results = vec![
            result("api", "a:1"),
            result("api", "b:1"),
            result("api", "c:1"),
        ];

        let compose = ComposeFile::from_results(&results, &TranslationSettings::default());

        assert_eq!(compose.services["api"].image, "a:1");
        assert_eq!(compose.services["api-2"].image, "b:1");
        assert_eq!(compose.services["api-3"].image, "c:1");
        assert_eq!(compose.adjustments.len(), 2);
    }

    fn rabbitmq(name: &str) -> MappingResult {
        let mut queue = result(name, "rabbitmq:3.13-management-alpine");
        queue.docker_service.add_port(5672, 5672);
        queue.docker_service.add_port(15672, 15672);
        queue
    }

    #[test]
    fn test_shared_host_ports_are_moved() {
        let results = vec![rabbitmq("orders"), rabbitmq("emails")];

        let compose = ComposeFile::from_results(&results, &TranslationSettings::default());

        assert_eq!(compose.services["orders"].ports, vec!["5672:5672", "15672:15672"]);
        assert_eq!(compose.services["emails"].ports, vec!["5673:5672", "15673:15672"]);
        assert_eq!(compose.adjustments.len(), 2);
        assert!(compose.adjustments[0].contains("`emails`"));
    }

    #[test]
    fn test_protocols_do_not_collide() {
        let mut tcp = result("dns-tcp", "coredns:1.11");
        tcp.docker_service.add_port(53, 53);
        let mut udp = result("dns-udp", "coredns:1.11");
        udp.docker_service.ports.push("53:53/udp".to_string());
        let mut second_udp = result("dns-udp-2nd", "coredns:1.11");
        second_udp.docker_service.ports.push("53:53/udp".to_string());

        let compose =
            ComposeFile::from_results(&[tcp, udp, second_udp], &TranslationSettings::default());

        assert_eq!(compose.services["dns-tcp"].ports, vec!["53:53"]);
        assert_eq!(compose.services["dns-udp"].ports, vec!["53:53/udp"]);
        assert_eq!(compose.services["dns-udp-2nd"].ports, vec!["54:53/udp"]);
    }

    #[test]
    fn test_volumes_and_network_are_declared() {
        let mut db = result("db", "postgres:16-alpine");
        db.add_volume(VolumeDefinition::new("db-data"));
        let mut extra = ServiceDescription::new("db-admin");
        extra.image = "adminer:latest".to_string();
        db.add_service(extra);

        let compose = ComposeFile::from_results(&[db], &TranslationSettings::default());

        assert!(compose.volumes.contains_key("db-data"));
        assert!(compose.services.contains_key("db-admin"));
        assert_eq!(compose.networks["cloudport"].driver, "bridge");
    }

    #[test]
    fn test_yaml_shape() {
        let mut web = result("web", "nginx:alpine");
        web.docker_service.add_port(8080, 80);

        let yaml = ComposeFile::from_results(&[web], &TranslationSettings::default())
            .to_yaml()
            .unwrap();

        assert!(yaml.contains("services:"));
        assert!(yaml.contains("  web:"));
        assert!(yaml.contains("image: nginx:alpine"));
        assert!(yaml.contains("8080:80"));
        assert!(yaml.contains("networks:"));
    }
}
