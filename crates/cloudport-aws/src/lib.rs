//! AWS resource translators
//!
//! One translator per supported AWS resource type. Each turns the extracted
//! resource configuration into a compose service plus the configs, scripts,
//! warnings and manual steps the migration needs.
//!
//! | Resource type            | Self-hosted target              |
//! |--------------------------|---------------------------------|
//! | `aws_ecs_service`        | the task's container image      |
//! | `aws_ec2_instance`       | Ubuntu container                |
//! | `aws_lambda_function`    | Lambda runtime base image       |
//! | `aws_rds_instance`       | PostgreSQL / MySQL / MariaDB    |
//! | `aws_elasticache_cluster`| Redis / Memcached               |
//! | `aws_s3_bucket`          | MinIO                           |
//! | `aws_sqs_queue`          | RabbitMQ                        |

use std::sync::Arc;

use cloudport_types::Translator;

pub mod ec2;
pub mod ecs;
pub mod elasticache;
pub mod lambda;
pub mod rds;
pub mod s3;
pub mod sqs;

pub use ec2::Ec2InstanceTranslator;
pub use ecs::EcsServiceTranslator;
pub use elasticache::ElastiCacheTranslator;
pub use lambda::LambdaFunctionTranslator;
pub use rds::RdsInstanceTranslator;
pub use s3::S3BucketTranslator;
pub use sqs::SqsQueueTranslator;

/// Every AWS translator, ready to register
pub fn translators() -> Vec<Arc<dyn Translator>> {
    vec![
        Arc::new(EcsServiceTranslator::new()),
        Arc::new(Ec2InstanceTranslator::new()),
        Arc::new(LambdaFunctionTranslator::new()),
        Arc::new(RdsInstanceTranslator::new()),
        Arc::new(ElastiCacheTranslator::new()),
        Arc::new(S3BucketTranslator::new()),
        Arc::new(SqsQueueTranslator::new()),
    ]
}
