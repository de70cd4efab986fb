//! Pub/Sub topic translator
//!
//! A topic becomes a NATS JetStream stream. The stream definition is written as
//! a config file and created by an init script with the `nats` CLI, since the
//! server has no declarative stream bootstrap.

use cloudport_types::{
    blueprints::{apply_nats, CONFIG_DIR},
    naming::{env_var_name, service_name},
    resource::field_string,
    BaseTranslator, MappingResult, Resource, ResourceType, TranslateResult, TranslationContext,
    Translator,
};
use serde_json::json;
use tracing::debug;

/// Translates a Pub/Sub topic into a NATS server with a JetStream stream
pub struct PubSubTranslator {
    base: BaseTranslator,
}

impl PubSubTranslator {
    pub fn new() -> Self {
        Self {
            base: BaseTranslator::new(ResourceType::PubSubTopic),
        }
    }
}

impl Default for PubSubTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// Seconds from a protobuf duration string (`"604800s"`, `"86400.5s"`)
fn parse_duration_seconds(duration: &str) -> Option<u64> {
    let seconds: f64 = duration.trim().strip_suffix('s')?.parse().ok()?;
    (seconds > 0.0).then_some(seconds as u64)
}

impl Translator for PubSubTranslator {
    fn base(&self) -> &BaseTranslator {
        &self.base
    }

    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        self.validate(Some(resource))?;
        debug!("Translating Pub/Sub topic: {}", resource.id);

        let name = service_name(&resource.display_name());
        let mut result = MappingResult::new(&name);
        apply_nats(&mut result, &ctx.settings);

        let topic = resource.display_name();
        let stream = env_var_name(&topic);
        let mut stream_config = json!({
            "name": stream,
            "subjects": [topic, format!("{}.>", topic)],
            "retention": "limits",
            "storage": "file",
            "discard": "old",
            "num_replicas": 1
        });

        let retention = resource.get_config_string("message_retention_duration");
        if !retention.is_empty() {
            match parse_duration_seconds(&retention) {
                // JetStream durations are nanoseconds
                Some(seconds) => {
                    stream_config["max_age"] = json!(seconds.saturating_mul(1_000_000_000))
                }
                None => result.add_warning(format!(
                    "Could not parse message retention '{}' of {}; the stream keeps messages indefinitely",
                    retention, topic
                )),
            }
        }

        let config_path = format!("nats/{}/stream.json", name);
        let rendered = serde_json::to_string_pretty(&stream_config)
            .unwrap_or_else(|_| stream_config.to_string());
        result.add_config(&config_path, rendered);
        result.add_script(
            format!("init-{}.sh", name),
            format!(
                "#!/usr/bin/env bash\nset -euo pipefail\n\nNATS_URL=\"${{NATS_URL:-nats://localhost:4222}}\"\nnats --server \"$NATS_URL\" stream add --config ./{}/{}\n",
                CONFIG_DIR, config_path
            ),
        );

        for subscription in resource.get_config_list("subscriptions") {
            let sub_name = match subscription.as_str() {
                Some(s) => s.to_string(),
                None => field_string(subscription, "name"),
            };
            if sub_name.is_empty() {
                continue;
            }
            let push_endpoint = field_string(subscription, "push_endpoint");
            if push_endpoint.is_empty() {
                result.add_manual_step(format!(
                    "Create a durable consumer for subscription {}: nats consumer add {} {} --pull",
                    sub_name,
                    stream,
                    service_name(&sub_name)
                ));
            } else {
                result.add_manual_step(format!(
                    "Subscription {} pushed to {}; run a small forwarder that consumes from stream {} and posts to that endpoint",
                    sub_name, push_endpoint, stream
                ));
            }
        }

        if !resource.get_config_string("schema").is_empty() {
            result.add_warning(format!(
                "Schema validation on {} is not enforced by NATS",
                topic
            ));
        }

        result.add_manual_step(format!(
            "Port Pub/Sub publishers and subscribers of {} to the NATS client library",
            topic
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
    use serde_json::Value;

    #[test]
    fn test_duration_parsing() {
        assert_eq!(parse_duration_seconds("604800s"), Some(604800));
        assert_eq!(parse_duration_seconds("600"), None);
        assert_eq!(parse_duration_seconds("0s"), None);
    }

    #[test]
    fn test_topic_becomes_stream() {
        let translator = PubSubTranslator::new();
        let resource = Resource::new("projects/acme/topics/orders", ResourceType::PubSubTopic, "orders")
            .with_config("message_retention_duration", json!("86400s"))
            .with_config(
                "subscriptions",
                json!([
                    {"name": "billing"},
                    {"name": "webhook", "push_endpoint": "https://hooks.acme.dev/orders"}
                ]),
            );

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert_eq!(result.docker_service.image, "nats:2.10-alpine");
        let stream: Value =
            serde_json::from_str(result.configs.get("nats/orders/stream.json").unwrap()).unwrap();
        assert_eq!(stream["name"], "ORDERS");
        assert_eq!(stream["subjects"][1], "orders.>");
        assert_eq!(stream["max_age"], 86_400_000_000_000u64);

        let init = result.scripts.get("init-orders.sh").unwrap();
        assert!(init.contains("stream add --config ./configs/nats/orders/stream.json"));

        assert_eq!(result.manual_steps.len(), 3);
        assert!(result.manual_steps[0].contains("nats consumer add ORDERS billing --pull"));
        assert!(result.manual_steps[1].contains("https://hooks.acme.dev/orders"));
    }

    #[test]
    fn test_bad_retention_warns() {
        let translator = PubSubTranslator::new();
        let resource = Resource::new("t-1", ResourceType::PubSubTopic, "events")
            .with_config("message_retention_duration", json!("forever"));

        let result = translator
            .map(&TranslationContext::default(), &resource)
            .unwrap();

        assert!(result.warnings[0].contains("forever"));
    }
}
