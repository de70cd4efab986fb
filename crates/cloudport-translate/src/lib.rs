//! Cloudport translation dispatch
//!
//! This crate owns the type-keyed translator table and the batch loop that
//! isolates per-resource failures.
//!
//! # Architecture
//!
//! - **Registry**: type → translator lookup with reader/writer locking
//! - **Ordering**: dependency-aware ordering of a resource list
//! - **Names**: distinct service names across a batch
//!
//! # Usage
//!
//! The composing application builds a `Registry`, registers the provider
//! translators it wants, and passes the registry to whatever drives translation.

pub mod names;
pub mod ordering;
pub mod registry;

pub use names::{disambiguate_names, Rename};
pub use ordering::dependency_order;
pub use registry::Registry;
