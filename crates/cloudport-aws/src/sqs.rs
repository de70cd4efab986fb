//! SQS queue translator
//!
//! Each queue becomes a RabbitMQ broker preloaded with a durable queue of the
//! same name. Queue attributes map onto RabbitMQ queue arguments where an
//! equivalent exists.

use cloudport_types::{
    blueprints::apply_rabbitmq,
    naming::service_name,
    resource::{field_int, field_string},
    BaseTranslator, MappingResult, Resource, ResourceType, TranslateResult, TranslationContext,
    Translator,
};
use serde_json::{json, Map, Value};
use tracing::debug;

/// Translates an SQS queue into a RabbitMQ broker with a matching queue
pub struct SqsQueueTranslator {
    base: BaseTranslator,
}

impl SqsQueueTranslator {
    pub fn new() -> Self {
        Self {
            base: BaseTranslator::new(ResourceType::SqsQueue),
        }
    }
}

impl Default for SqsQueueTranslator {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue name from an SQS ARN (`arn:aws:sqs:region:account:name`) or plain name
fn queue_name_from_arn(arn: &str) -> &str {
    arn.rsplit(':').next().unwrap_or(arn)
}

impl Translator for SqsQueueTranslator {
    fn base(&self) -> &BaseTranslator {
        &self.base
    }

    fn map(&self, ctx: &TranslationContext, resource: &Resource) -> TranslateResult<MappingResult> {
        self.validate(Some(resource))?;
        debug!("Translating SQS queue: {}", resource.id);

        let name = service_name(&resource.display_name());
        let mut result = MappingResult::new(&name);
        let queue = match resource.get_config_string("queue_name") {
            q if q.is_empty() => resource.display_name(),
            q => q,
        };
        let fifo = resource.get_config_bool("fifo_queue") || queue.ends_with(".fifo");

        let mut arguments = Map::new();
        arguments.insert("x-queue-type".to_string(), json!("classic"));

        let retention = resource.get_config_int("message_retention_seconds");
        if retention > 0 {
            match retention.checked_mul(1000) {
                Some(ttl_ms) => {
                    arguments.insert("x-message-ttl".to_string(), json!(ttl_ms));
                }
                None => result.add_warning(format!(
                    "Message retention of {}s is out of range; queue has no TTL",
                    retention
                )),
            }
        }

        let mut queues = Vec::new();

        // Redrive policy: either flat keys or the SQS `redrive_policy` object
        let redrive = resource.get_config("redrive_policy").cloned().unwrap_or(Value::Null);
        let dead_letter_target = match resource.get_config_string("dead_letter_target") {
            t if t.is_empty() => field_string(&redrive, "dead_letter_target_arn"),
            t => t,
        };
        if !dead_letter_target.is_empty() {
            let dlq = queue_name_from_arn(&dead_letter_target).to_string();
            arguments.insert("x-dead-letter-exchange".to_string(), json!(""));
            arguments.insert("x-dead-letter-routing-key".to_string(), json!(dlq));
            queues.push(json!({
                "name": dlq,
                "vhost": "/",
                "durable": true,
                "auto_delete": false,
                "arguments": {}
            }));

            let max_receive = match resource.get_config_int("max_receive_count") {
                0 => field_int(&redrive, "max_receive_count"),
                n => n,
            };
            if max_receive > 0 {
                result.add_warning(format!(
                    "maxReceiveCount {} of {} has no classic-queue equivalent; consumers must reject after {} deliveries",
                    max_receive, queue, max_receive
                ));
            }
        }

        if fifo {
            arguments.insert("x-single-active-consumer".to_string(), json!(true));
            result.add_warning(format!(
                "{} is a FIFO queue; ordering is kept with a single active consumer and deduplication is not enforced",
                queue
            ));
        }

        let visibility = resource.get_config_int("visibility_timeout_seconds");
        if visibility > 0 {
            result.add_warning(format!(
                "Visibility timeout ({}s) of {} has no RabbitMQ equivalent; unacknowledged messages are redelivered when the consumer disconnects",
                visibility, queue
            ));
        }

        let delay = resource.get_config_int("delay_seconds");
        if delay > 0 {
            result.add_warning(format!(
                "Delivery delay ({}s) of {} requires the rabbitmq_delayed_message_exchange plugin",
                delay, queue
            ));
        }

        queues.insert(
            0,
            json!({
                "name": queue,
                "vhost": "/",
                "durable": true,
                "auto_delete": false,
                "arguments": Value::Object(arguments)
            }),
        );

        let definitions = json!({
            "rabbit_version": "3.13.0",
            "vhosts": [{"name": "/"}],
            "users": [],
            "permissions": [],
            "queues": queues,
            "exchanges": [],
            "bindings": []
        });
        apply_rabbitmq(&mut result, &definitions, &ctx.settings);

        result.add_manual_step(format!(
            "Port SQS clients of {} to AMQP (RabbitMQ listens on {}:5672)",
            queue, name
        ));
        result
            .docker_service
            .set_label("cloudport.source", resource.resource_type.as_str());

        Ok(result)
    }
}
