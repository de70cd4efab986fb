//! Resource inventory loading
//!
//! An inventory is either a bare list of resources or an object with a
//! `resources` list, in JSON or YAML.

use anyhow::{bail, Context};
use cloudport_types::Resource;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, warn};

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref(),
        Some("yaml") | Some("yml")
    )
}

/// Parse an inventory document
///
/// Resources are decoded one at a time so an error names the offending item.
/// Types without a translator are kept; the registry reports them per item.
pub fn parse_resources(content: &str, yaml: bool) -> anyhow::Result<Vec<Resource>> {
    let document: Value = if yaml {
        serde_yaml::from_str(content).context("Invalid YAML resource inventory")?
    } else {
        serde_json::from_str(content).context("Invalid JSON resource inventory")?
    };

    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("resources") {
            Some(Value::Array(items)) => items,
            _ => bail!("Inventory object must contain a `resources` list"),
        },
        _ => bail!("Inventory must be a list of resources or an object with `resources`"),
    };

    let mut resources = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let resource: Resource = serde_json::from_value(item)
            .with_context(|| format!("Invalid resource at position {}", index))?;
        if !resource.resource_type.is_known() {
            warn!(
                "Resource {} has unsupported type {}",
                resource.id, resource.resource_type
            );
        }
        resources.push(resource);
    }
    Ok(resources)
}

/// Load an inventory file; `.yaml`/`.yml` is read as YAML, anything else as JSON
pub fn load_resources(path: &Path) -> anyhow::Result<Vec<Resource>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file {}", path.display()))?;
    let resources = parse_resources(&content, is_yaml(path))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!("Loaded {} resources from {}", resources.len(), path.display());
    Ok(resources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::build_registry;
    use cloudport_types::{ResourceType, TranslationContext};
    use std::io::Write;

    #[test]
    fn test_parse_json_list() {
        let json = r#"[
            {"id": "db-1", "type": "aws_rds_instance", "name": "orders",
             "config": {"engine": "postgres"}},
            {"id": "q-1", "type": "sqs_queue"}
        ]"#;

        let resources = parse_resources(json, false).unwrap();

        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].resource_type, ResourceType::RdsInstance);
        assert_eq!(resources[0].get_config_string("engine"), "postgres");
        assert_eq!(resources[1].resource_type, ResourceType::SqsQueue);
        assert!(resources[1].name.is_empty());
    }

    #[test]
    fn test_parse_wrapped_yaml() {
        let yaml = "resources:\n  - id: run-1\n    type: gcp_cloud_run_service\n    name: api\n    config:\n      image: gcr.io/acme/api:1\n";

        let resources = parse_resources(yaml, true).unwrap();

        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].resource_type, ResourceType::CloudRunService);
        assert_eq!(resources[0].get_config_string("image"), "gcr.io/acme/api:1");
    }

    #[test]
    fn test_unknown_type_reaches_the_batch() {
        let json = r#"[
            {"id": "db-1", "type": "aws_rds_instance", "name": "orders"},
            {"id": "table-1", "type": "aws_dynamodb_table", "name": "sessions"},
            {"id": "q-1", "type": "aws_sqs_queue", "name": "jobs"}
        ]"#;

        let resources = parse_resources(json, false).unwrap();
        assert_eq!(resources.len(), 3);
        assert_eq!(
            resources[1].resource_type,
            ResourceType::Other("aws_dynamodb_table".to_string())
        );

        let results = build_registry()
            .map_batch(&TranslationContext::default(), &resources)
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(!results[0].is_error_placeholder());
        assert!(results[1].is_error_placeholder());
        assert!(results[1].warnings[0].contains("table-1"));
        assert!(results[1].warnings[0].contains("aws_dynamodb_table"));
        assert!(!results[2].is_error_placeholder());
    }

    #[test]
    fn test_malformed_item_names_its_position() {
        let json = r#"[{"id": "db-1", "type": "aws_rds_instance"}, {"type": "aws_sqs_queue"}]"#;

        let err = parse_resources(json, false).unwrap_err();

        assert!(err.to_string().contains("position 1"));
        assert!(parse_resources(r#"{"items": []}"#, false).is_err());
    }

    #[test]
    fn test_load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inventory.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "- id: cache-1\n  type: azure_redis_cache").unwrap();

        let resources = load_resources(&path).unwrap();

        assert_eq!(resources[0].resource_type, ResourceType::RedisCache);
        assert!(load_resources(&dir.path().join("missing.json")).is_err());
    }
}
