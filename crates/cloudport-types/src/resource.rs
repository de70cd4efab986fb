//! Cloud resource model
//!
//! A `Resource` is the generic description of one cloud-provider object awaiting
//! translation. Its `config` is a loosely-typed tree mirroring provider JSON, read
//! through lenient accessors: a missing or wrong-typed key yields the zero value,
//! never an error.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use crate::error::TranslateError;

/// Cloud provider a resource type belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Aws,
    Gcp,
    Azure,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Aws => "aws",
            Provider::Gcp => "gcp",
            Provider::Azure => "azure",
        }
    }

    /// Provider named by the prefix of a wire identifier (`aws_...`)
    pub fn from_type_prefix(wire: &str) -> Option<Provider> {
        let prefix = wire.split_once('_').map(|(p, _)| p)?;
        [Provider::Aws, Provider::Gcp, Provider::Azure]
            .into_iter()
            .find(|p| p.as_str() == prefix)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resource kind identifier
///
/// Serialized as its wire identifier. Identifiers no translator knows are kept
/// verbatim in `Other` so they can still flow through a batch and be reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    /// AWS ECS service (Fargate or EC2 launch type)
    EcsService,
    /// AWS EC2 virtual machine
    Ec2Instance,
    /// AWS Lambda function
    LambdaFunction,
    /// AWS RDS database instance
    RdsInstance,
    /// AWS ElastiCache cluster (Redis or Memcached)
    ElastiCacheCluster,
    /// AWS S3 bucket
    S3Bucket,
    /// AWS SQS queue
    SqsQueue,
    /// GCP Cloud Run service
    CloudRunService,
    /// GCP Cloud SQL instance
    CloudSqlInstance,
    /// GCP Pub/Sub topic
    PubSubTopic,
    /// Azure storage account (blob containers)
    StorageAccount,
    /// Azure Cache for Redis
    RedisCache,
    /// Unrecognised identifier, as it appeared in the input
    Other(String),
}

impl ResourceType {
    /// Every known resource type, grouped by provider
    pub const ALL: [ResourceType; 12] = [
        ResourceType::EcsService,
        ResourceType::Ec2Instance,
        ResourceType::LambdaFunction,
        ResourceType::RdsInstance,
        ResourceType::ElastiCacheCluster,
        ResourceType::S3Bucket,
        ResourceType::SqsQueue,
        ResourceType::CloudRunService,
        ResourceType::CloudSqlInstance,
        ResourceType::PubSubTopic,
        ResourceType::StorageAccount,
        ResourceType::RedisCache,
    ];

    /// Get the wire identifier for this type
    pub fn as_str(&self) -> &str {
        match self {
            ResourceType::EcsService => "aws_ecs_service",
            ResourceType::Ec2Instance => "aws_ec2_instance",
            ResourceType::LambdaFunction => "aws_lambda_function",
            ResourceType::RdsInstance => "aws_rds_instance",
            ResourceType::ElastiCacheCluster => "aws_elasticache_cluster",
            ResourceType::S3Bucket => "aws_s3_bucket",
            ResourceType::SqsQueue => "aws_sqs_queue",
            ResourceType::CloudRunService => "gcp_cloud_run_service",
            ResourceType::CloudSqlInstance => "gcp_cloud_sql_instance",
            ResourceType::PubSubTopic => "gcp_pubsub_topic",
            ResourceType::StorageAccount => "azure_storage_account",
            ResourceType::RedisCache => "azure_redis_cache",
            ResourceType::Other(raw) => raw,
        }
    }

    /// Provider this resource type belongs to
    ///
    /// For `Other` the provider is guessed from the identifier prefix.
    pub fn provider(&self) -> Option<Provider> {
        match self {
            ResourceType::EcsService
            | ResourceType::Ec2Instance
            | ResourceType::LambdaFunction
            | ResourceType::RdsInstance
            | ResourceType::ElastiCacheCluster
            | ResourceType::S3Bucket
            | ResourceType::SqsQueue => Some(Provider::Aws),
            ResourceType::CloudRunService
            | ResourceType::CloudSqlInstance
            | ResourceType::PubSubTopic => Some(Provider::Gcp),
            ResourceType::StorageAccount | ResourceType::RedisCache => Some(Provider::Azure),
            ResourceType::Other(raw) => Provider::from_type_prefix(raw),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ResourceType::Other(_))
    }

    /// Parse a wire identifier, keeping unknown ones as `Other`
    pub fn from_wire(s: &str) -> ResourceType {
        s.parse()
            .unwrap_or_else(|_| ResourceType::Other(s.trim().to_string()))
    }
}

impl FromStr for ResourceType {
    type Err = TranslateError;

    /// Parse a known wire identifier; the provider prefix is optional
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ResourceType::ALL
            .into_iter()
            .find(|t| {
                let full = t.as_str();
                let short = full.split_once('_').map(|(_, rest)| rest).unwrap_or(full);
                normalized == full || normalized == short
            })
            .ok_or_else(|| TranslateError::Translation(format!("Unknown resource type: {}", s)))
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for ResourceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = String::deserialize(deserializer)?;
        Ok(ResourceType::from_wire(&wire))
    }
}

/// One cloud-provider object to migrate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Provider-unique identifier
    pub id: String,
    /// Resource kind
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Human label (may be empty)
    #[serde(default)]
    pub name: String,
    /// Provider region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Provider resource name (ARN, self link, resource id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// Provider tags/labels
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub tags: HashMap<String, String>,
    /// Ids of resources this one refers to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Extracted provider configuration
    #[serde(default)]
    pub config: HashMap<String, Value>,
}

impl Resource {
    pub fn new(id: impl Into<String>, resource_type: ResourceType, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource_type,
            name: name.into(),
            region: None,
            arn: None,
            tags: HashMap::new(),
            dependencies: Vec::new(),
            config: HashMap::new(),
        }
    }

    /// Builder-style config insertion
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Name to use for generated artifacts: the label, else config `name`, else the id
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        let from_config = self.get_config_string("name");
        if !from_config.is_empty() {
            return from_config;
        }
        self.id.clone()
    }

    pub fn get_config(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// String value at `key`, or `""` when missing or not a string
    pub fn get_config_string(&self, key: &str) -> String {
        coerce_string(self.config.get(key))
    }

    /// Integer value at `key` truncated toward zero, or `0` when missing or not a number
    pub fn get_config_int(&self, key: &str) -> i64 {
        coerce_int(self.config.get(key))
    }

    /// Bool value at `key`, or `false` when missing or not a bool
    pub fn get_config_bool(&self, key: &str) -> bool {
        coerce_bool(self.config.get(key))
    }

    /// Float value at `key`, or `0.0` when missing or not a number
    pub fn get_config_float(&self, key: &str) -> f64 {
        coerce_float(self.config.get(key))
    }

    /// Nested object at `key`
    pub fn get_config_map(&self, key: &str) -> Option<&Map<String, Value>> {
        self.config.get(key).and_then(Value::as_object)
    }

    /// List at `key`, empty when missing or not a list
    pub fn get_config_list(&self, key: &str) -> &[Value] {
        coerce_list(self.config.get(key))
    }

    /// String items of the list at `key`; other items are skipped
    pub fn get_config_string_list(&self, key: &str) -> Vec<String> {
        self.get_config_list(key)
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Scalar entries of the object at `key`, rendered as strings
    pub fn get_config_string_map(&self, key: &str) -> BTreeMap<String, String> {
        coerce_string_map(self.config.get(key))
    }
}

/// String field of a nested object, same contract as `Resource::get_config_string`
pub fn field_string(value: &Value, key: &str) -> String {
    coerce_string(value.get(key))
}

/// Integer field of a nested object, same contract as `Resource::get_config_int`
pub fn field_int(value: &Value, key: &str) -> i64 {
    coerce_int(value.get(key))
}

/// Bool field of a nested object, same contract as `Resource::get_config_bool`
pub fn field_bool(value: &Value, key: &str) -> bool {
    coerce_bool(value.get(key))
}

/// List field of a nested object, empty when missing
pub fn field_list<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    coerce_list(value.get(key))
}

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    }
}

fn coerce_int(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                i
            } else if let Some(u) = n.as_u64() {
                i64::try_from(u).unwrap_or(i64::MAX)
            } else {
                // `as` truncates toward zero
                n.as_f64().map(|f| f as i64).unwrap_or(0)
            }
        }
        _ => 0,
    }
}

fn coerce_bool(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Bool(true)))
}

fn coerce_float(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn coerce_list(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn coerce_string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(obj) = value.and_then(Value::as_object) else {
        return BTreeMap::new();
    };
    obj.iter()
        .filter_map(|(k, v)| {
            let rendered = match v {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((k.clone(), rendered))
        })
        .collect()
}
