//! Azure resource translators
//!
//! - `azure_storage_account` → MinIO, one bucket per blob container
//! - `azure_redis_cache` → Redis

use std::sync::Arc;

use cloudport_types::Translator;

pub mod redis_cache;
pub mod storage_account;

pub use redis_cache::RedisCacheTranslator;
pub use storage_account::StorageAccountTranslator;

/// Every Azure translator, ready to register
pub fn translators() -> Vec<Arc<dyn Translator>> {
    vec![
        Arc::new(StorageAccountTranslator::new()),
        Arc::new(RedisCacheTranslator::new()),
    ]
}
