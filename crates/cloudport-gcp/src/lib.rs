//! GCP resource translators
//!
//! - `gcp_cloud_run_service` → the service image behind the reverse proxy
//! - `gcp_cloud_sql_instance` → PostgreSQL / MySQL
//! - `gcp_pubsub_topic` → NATS JetStream

use std::sync::Arc;

use cloudport_types::Translator;

pub mod cloud_run;
pub mod cloud_sql;
pub mod pubsub;

pub use cloud_run::CloudRunTranslator;
pub use cloud_sql::CloudSqlTranslator;
pub use pubsub::PubSubTranslator;

/// Every GCP translator, ready to register
pub fn translators() -> Vec<Arc<dyn Translator>> {
    vec![
        Arc::new(CloudRunTranslator::new()),
        Arc::new(CloudSqlTranslator::new()),
        Arc::new(PubSubTranslator::new()),
    ]
}
