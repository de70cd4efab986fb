//! EC2 instance translator
//!
//! A virtual machine has no direct container equivalent. The instance becomes a
//! long-running Ubuntu container sized like the instance type, with its user data
//! preserved as a script for the operator to port into a proper image.

use cloudport_types::{
    blueprints::{apply_defaults, SCRIPTS_DIR},
    naming::service_name,
    service::format_memory_mb,
    BaseTranslator, MappingResult, Resource, ResourceType, TranslateResult, TranslationContext,
    Translator, VolumeDefinition,
};
use tracing::debug;

const BASE_IMAGE: &str = "ubuntu:22.04";

/// vCPUs and memory (MiB) for common instance types
const INSTANCE_SIZES: &[(&str, &str, i64)] = &[
    ("t2.micro", "1", 1024),
    ("t2.small", "1", 2048),
    ("t2.medium", "2", 4096),
    ("t3.nano", "2", 512),
    ("t3.micro", "2", 1024),
    ("t3.small", "2", 2048),
    ("t3.medium", "2", 4096),
    ("t3.large", "2", 8192),
    ("t3.xlarge", "4", 16384),
    ("m5.large", "2", 8192),
    ("m5.xlarge", "4", 16384),
    ("m5.2xlarge", "8", 32768),
    ("c5.large", "2", 4096),
    ("c5.xlarge", "4", 8192),
    ("r5.large", "2", 16384),
    ("r5.xlarge", "4", 32768),
];

/// Translates an EC2 instance into a general-purpose container
pub struct Ec2InstanceTranslator {
    base: BaseTranslator,
}

impl Ec2InstanceTranslator {
    pub fn new() -> Self {
        Self {
            base: BaseTranslator::new(ResourceType::Ec2Instance),
        }
    }
}

impl Default for Ec2InstanceTranslator {
    fn default() -> Self {
        Self::new()
    }
}

fn instance_size(instance_type: &str) -> Option<(&'static str, i64)> {
    INSTANCE_SIZES
        .iter()
        .find(|(name, _, _)| *name == instance_type)
        .map(|(_, cpus, memory)| (*cpus, *memory))
}

impl Translator for Ec2InstanceTranslator {
    fn base(&self) -> &BaseTranslator {
        &self.base
    }

    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        self.validate(Some(resource))?;
        debug!("Translating EC2 instance: {}", resource.id);

        let name = service_name(&resource.display_name());
        let mut result = MappingResult::new(&name);
        let service = &mut result.docker_service;

        service.image = BASE_IMAGE.to_string();
        service.hostname = Some(name.clone());
        service.command = vec!["sleep".to_string(), "infinity".to_string()];

        let instance_type = resource.get_config_string("instance_type");
        match instance_size(&instance_type) {
            Some((cpus, memory_mb)) => service.set_limits(cpus, format_memory_mb(memory_mb)),
            None if instance_type.is_empty() => {}
            None => result.warnings.push(format!(
                "Unknown instance type {} for {}; no resource limits applied",
                instance_type, name
            )),
        }

        let user_data = resource.get_config_string("user_data");
        if !user_data.is_empty() {
            let script_name = format!("{}-user-data.sh", name);
            let mut script = user_data;
            if !script.starts_with("#!") {
                script.insert_str(0, "#!/usr/bin/env bash\nset -euo pipefail\n\n");
            }
            if !script.ends_with('\n') {
                script.push('\n');
            }

            result.docker_service.add_volume(
                &format!("./{}/{}", SCRIPTS_DIR, script_name),
                "/opt/cloudport/user-data.sh",
                true,
            );
            result.add_script(script_name, script);
            result.add_manual_step(format!(
                "Review the user data of {} in {}/{}-user-data.sh and bake it into a Dockerfile",
                name, SCRIPTS_DIR, name
            ));
        }

        let ami = resource.get_config_string("ami");
        if !ami.is_empty() {
            result.add_manual_step(format!(
                "AMI {} of {} cannot be converted; install the software it carries into a custom image based on {}",
                ami, name, BASE_IMAGE
            ));
        }

        if resource.get_config_bool("associate_public_ip_address")
            || !resource.get_config_string("public_ip").is_empty()
        {
            result.add_warning(format!(
                "{} had a public IP address; expose only the ports it needs through the reverse proxy",
                name
            ));
        }

        let security_groups = resource.get_config_string_list("security_groups");
        if !security_groups.is_empty() {
            result.add_warning(format!(
                "Security groups of {} ({}) were not translated; use host firewall rules instead",
                name,
                security_groups.join(", ")
            ));
        }

        if !resource.get_config_list("ebs_block_devices").is_empty() {
            let volume = format!("{}-data", name);
            result.docker_service.add_volume(&volume, "/data", false);
            result.add_volume(VolumeDefinition::new(volume));
            result.add_manual_step(format!(
                "Copy the contents of the EBS volumes attached to {} into the {}-data volume",
                name, name
            ));
        }

        apply_defaults(&mut result.docker_service, &ctx.settings);
        result
            .docker_service
            .set_label("cloudport.source", resource.resource_type.as_str());

        Ok(result)
    }
}
