//! ECS service translator

use cloudport_types::{
    blueprints::{apply_defaults, apply_http_routing, primary_port},
    naming::{env_reference, env_var_name, service_name},
    resource::{field_int, field_list, field_string},
    service::{format_cpus, format_memory_mb},
    BaseTranslator, HealthCheck, MappingResult, Resource, ResourceType, TranslateResult,
    TranslationContext, Translator,
};
use serde_json::Value;
use tracing::debug;

const PLACEHOLDER_IMAGE: &str = "nginx:latest";

/// Translates an ECS service (and its first container definition) into a compose service
pub struct EcsServiceTranslator {
    base: BaseTranslator,
}

impl EcsServiceTranslator {
    pub fn new() -> Self {
        Self {
            base: BaseTranslator::with_dependencies(
                ResourceType::EcsService,
                &[
                    ResourceType::RdsInstance,
                    ResourceType::ElastiCacheCluster,
                    ResourceType::SqsQueue,
                ],
            ),
        }
    }
}

impl Default for EcsServiceTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for EcsServiceTranslator {
    fn base(&self) -> &BaseTranslator {
        &self.base
    }

    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        self.validate(Some(resource))?;
        debug!("Translating ECS service: {}", resource.id);

        let name = service_name(&resource.display_name());
        let mut result = MappingResult::new(&name);
        let container = resource
            .get_config_list("container_definitions")
            .first()
            .cloned()
            .unwrap_or(Value::Null);

        if resource.get_config_list("container_definitions").len() > 1 {
            result.add_warning(format!(
                "Task for {} defines {} containers; only the first was translated",
                name,
                resource.get_config_list("container_definitions").len()
            ));
        }

        // Image
        let mut image = resource.get_config_string("image");
        if image.is_empty() {
            image = field_string(&container, "image");
        }
        if image.is_empty() {
            result.add_warning(format!(
                "Could not extract container image for {}; using placeholder {}",
                name, PLACEHOLDER_IMAGE
            ));
            image = PLACEHOLDER_IMAGE.to_string();
        } else if image.contains(".dkr.ecr.") {
            result.add_manual_step(format!(
                "Image {} lives in ECR: log in with `aws ecr get-login-password | docker login` or push it to a self-hosted registry",
                image
            ));
        }
        result.docker_service.image = image;

        // Replicas
        let desired = resource.get_config_int("desired_count");
        let replicas = if desired > 0 {
            u32::try_from(desired).unwrap_or(u32::MAX)
        } else {
            1
        };
        if desired <= 0 && resource.get_config("desired_count").is_some() {
            result.add_warning(format!(
                "desired_count for {} is {}; deploying 1 replica",
                name, desired
            ));
        }
        result.docker_service.deploy_mut().replicas = replicas;

        // CPU units (1024 = 1 vCPU) and memory in MiB; task level wins over container level
        let cpu_units = match resource.get_config_int("cpu") {
            0 => field_int(&container, "cpu"),
            units => units,
        };
        let memory_mb = match resource.get_config_int("memory") {
            0 => field_int(&container, "memory"),
            mb => mb,
        };
        if cpu_units > 0 || memory_mb > 0 {
            let cpus = if cpu_units > 0 {
                format_cpus(cpu_units as f64 / 1024.0)
            } else {
                String::new()
            };
            let memory = if memory_mb > 0 {
                format_memory_mb(memory_mb)
            } else {
                String::new()
            };
            result.docker_service.set_limits(cpus, memory);
        }

        // Command and entrypoint
        result.docker_service.command = string_items(field_list(&container, "command"));
        result.docker_service.entrypoint = string_items(field_list(&container, "entry_point"));
        let working_dir = field_string(&container, "working_directory");
        if !working_dir.is_empty() {
            result.docker_service.working_dir = Some(working_dir);
        }

        // Ports
        let mut container_ports = Vec::new();
        let mut port_list = field_list(&container, "port_mappings").to_vec();
        port_list.extend(resource.get_config_list("port_mappings").iter().cloned());
        for mapping in &port_list {
            let container_port = field_int(mapping, "container_port");
            let Ok(container_port) = u16::try_from(container_port) else {
                result.add_warning(format!(
                    "Ignoring invalid container port {} on {}",
                    container_port, name
                ));
                continue;
            };
            if container_port == 0 {
                continue;
            }
            let host_port = u16::try_from(field_int(mapping, "host_port"))
                .ok()
                .filter(|p| *p > 0)
                .unwrap_or(container_port);
            let protocol = field_string(mapping, "protocol").to_lowercase();
            if protocol == "udp" {
                result
                    .docker_service
                    .ports
                    .push(format!("{}:{}/udp", host_port, container_port));
            } else {
                result.docker_service.add_port(host_port, container_port);
            }
            container_ports.push(container_port);
        }
        if replicas > 1 && !result.docker_service.ports.is_empty() {
            result.add_warning(format!(
                "{} runs {} replicas with published host ports; route traffic through the reverse proxy instead of fixed host ports",
                name, replicas
            ));
        }

        // Environment
        for pair in field_list(&container, "environment") {
            let key = field_string(pair, "name");
            if !key.is_empty() {
                result.docker_service.set_env(key, field_string(pair, "value"));
            }
        }
        for (key, value) in resource.get_config_string_map("environment") {
            result.docker_service.set_env(key, value);
        }

        // Secrets become .env references
        for secret in field_list(&container, "secrets") {
            let key = field_string(secret, "name");
            if key.is_empty() {
                continue;
            }
            let var = env_var_name(&key);
            result.docker_service.set_env(&key, env_reference(&var));
            result.add_manual_step(format!(
                "Copy secret {} (from {}) into the .env file as {}",
                key,
                field_string(secret, "value_from"),
                var
            ));
        }

        // Health check (ECS intervals are in seconds)
        if let Some(check) = container.get("health_check") {
            let command = string_items(field_list(check, "command"));
            let explicit = matches!(
                command.first().map(String::as_str),
                Some("CMD-SHELL") | Some("CMD")
            );
            let test = if command.is_empty() || explicit {
                command
            } else {
                let mut test = vec!["CMD".to_string()];
                test.extend(command);
                test
            };
            if !test.is_empty() {
                let seconds = |key: &str, default: i64| match field_int(check, key) {
                    0 => format!("{}s", default),
                    s => format!("{}s", s),
                };
                result.docker_service.health_check = Some(HealthCheck {
                    test,
                    interval: seconds("interval", 30),
                    timeout: seconds("timeout", 5),
                    retries: match field_int(check, "retries") {
                        r if r > 0 => u32::try_from(r).unwrap_or(u32::MAX),
                        _ => 3,
                    },
                    start_period: match field_int(check, "start_period") {
                        0 => None,
                        s => Some(format!("{}s", s)),
                    },
                });
            }
        }

        // Load balancer attachment becomes reverse-proxy routing
        if !resource.get_config_list("load_balancers").is_empty() {
            match primary_port(&container_ports) {
                Some(port) => apply_http_routing(&mut result.docker_service, &ctx.settings, port),
                None => result.add_warning(format!(
                    "{} is attached to a load balancer but exposes no container port",
                    name
                )),
            }
        }

        if resource.get_config_string("launch_type").eq_ignore_ascii_case("fargate") {
            result.add_warning(format!(
                "{} ran on Fargate; capacity is now bounded by the Docker host",
                name
            ));
        }

        if !field_list(&container, "depends_on").is_empty() {
            result.add_warning(format!(
                "Container-level dependencies of {} were not translated",
                name
            ));
        }

        if container.get("log_configuration").is_some() {
            result.add_warning(format!(
                "CloudWatch log configuration of {} was not migrated; logs go to the Docker logging driver",
                name
            ));
        }

        let task_role = resource.get_config_string("task_role_arn");
        if !task_role.is_empty() {
            result.add_manual_step(format!(
                "Replace IAM task role {} with credentials or service accounts for the services {} calls",
                task_role, name
            ));
        }

        apply_defaults(&mut result.docker_service, &ctx.settings);
        result
            .docker_service
            .set_label("cloudport.source", resource.resource_type.as_str());

        Ok(result)
    }
}

fn string_items(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ecs_resource() -> Resource {
        Resource::new("arn:aws:ecs:us-east-1:123:service/web", ResourceType::EcsService, "web")
            .with_config(
                "container_definitions",
                json!([{
                    "name": "web",
                    "image": "ghcr.io/acme/web:1.4.2",
                    "port_mappings": [{"container_port": 8080.0, "host_port": 0.0, "protocol": "tcp"}],
                    "environment": [{"name": "RUST_LOG", "value": "info"}],
                    "secrets": [{"name": "DATABASE_URL", "value_from": "arn:aws:secretsmanager:us-east-1:123:secret:db"}],
                    "health_check": {"command": ["CMD-SHELL", "curl -f http://localhost:8080/health"], "interval": 15.0, "retries": 2.0}
                }]),
            )
    }

    #[test]
    fn test_desired_count_maps_to_replicas() {
        let translator = EcsServiceTranslator::new();
        let resource = ecs_resource().with_config("desired_count", json!(2.0));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert_eq!(result.docker_service.deploy.as_ref().unwrap().replicas, 2);
    }

    #[test]
    fn test_huge_desired_count_saturates() {
        let translator = EcsServiceTranslator::new();
        let resource = ecs_resource().with_config("desired_count", json!(8_589_934_593_i64));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert_eq!(
            result.docker_service.deploy.as_ref().unwrap().replicas,
            u32::MAX
        );
    }

    #[test]
    fn test_missing_desired_count_defaults_to_one_replica() {
        let translator = EcsServiceTranslator::new();
        let result = translator
            .map(&TranslationContext::default(), &ecs_resource())
            .unwrap();

        assert_eq!(result.docker_service.deploy.as_ref().unwrap().replicas, 1);
        assert!(
            !result.warnings.iter().any(|w| w.contains("desired_count")),
            "absent desired_count is not worth a warning"
        );
    }

    #[test]
    fn test_container_definition_is_translated() {
        let translator = EcsServiceTranslator::new();
        let resource = ecs_resource()
            .with_config("cpu", json!(512.0))
            .with_config("memory", json!(1024.0));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();
        let service = &result.docker_service;

        assert_eq!(service.name, "web");
        assert_eq!(service.image, "ghcr.io/acme/web:1.4.2");
        assert_eq!(service.ports, vec!["8080:8080"]);
        assert_eq!(service.environment.get("RUST_LOG").map(String::as_str), Some("info"));
        assert_eq!(
            service.environment.get("DATABASE_URL").map(String::as_str),
            Some("${DATABASE_URL}")
        );
        assert_eq!(result.manual_steps.len(), 1);

        let limits = service
            .deploy
            .as_ref()
            .and_then(|d| d.resources.as_ref())
            .and_then(|r| r.limits.as_ref())
            .unwrap();
        assert_eq!(limits.cpus.as_deref(), Some("0.5"));
        assert_eq!(limits.memory.as_deref(), Some("1G"));

        let health = service.health_check.as_ref().unwrap();
        assert_eq!(health.test[0], "CMD-SHELL");
        assert_eq!(health.interval, "15s");
        assert_eq!(health.timeout, "5s");
        assert_eq!(health.retries, 2);
        assert_eq!(service.networks, vec!["cloudport"]);
    }

    #[test]
    fn test_missing_image_uses_placeholder_with_warning() {
        let translator = EcsServiceTranslator::new();
        let resource = Resource::new("svc-1", ResourceType::EcsService, "api");

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert_eq!(result.docker_service.image, PLACEHOLDER_IMAGE);
        assert!(result.warnings[0].contains("Could not extract container image"));
    }

    #[test]
    fn test_load_balancer_adds_routing_labels() {
        let translator = EcsServiceTranslator::new();
        let resource = ecs_resource().with_config(
            "load_balancers",
            json!([{"target_group_arn": "arn:aws:elasticloadbalancing:tg/web"}]),
        );

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert_eq!(
            result
                .docker_service
                .labels
                .get("traefik.http.services.web.loadbalancer.server.port")
                .map(String::as_str),
            Some("8080")
        );
    }

    #[test]
    fn test_replicas_with_host_ports_warns() {
        let translator = EcsServiceTranslator::new();
        let resource = ecs_resource().with_config("desired_count", json!(3));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert!(result.warnings.iter().any(|w| w.contains("3 replicas")));
    }

    #[test]
    fn test_mapping_is_idempotent() {
        let translator = EcsServiceTranslator::new();
        let resource = ecs_resource().with_config("desired_count", json!(2));
        let ctx = TranslationContext::default();

        let first = translator.map(&ctx, &resource).unwrap();
        let second = translator.map(&ctx, &resource).unwrap();

        assert_eq!(first, second);
    }
}
