//! Service-name disambiguation
//!
//! Translators derive every generated artifact (service, volumes, configs,
//! scripts, env vars) from the resource's display name. Two resources whose
//! names reduce to the same service name would overwrite each other's files,
//! so later duplicates are renamed before translation.

use std::collections::HashSet;

use cloudport_types::{naming::service_name, Resource};
use tracing::info;

/// A resource renamed by `disambiguate_names`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub resource_id: String,
    pub from: String,
    pub to: String,
}

/// Give every resource a distinct service name, in input order
///
/// The first resource keeps its name; later duplicates get `-2`, `-3`, ...
/// skipping names another resource in the batch already uses.
pub fn disambiguate_names(resources: &mut [Resource]) -> Vec<Rename> {
    let original: HashSet<String> = resources
        .iter()
        .map(|r| service_name(&r.display_name()))
        .collect();
    // At most 2n names are unavailable, so 2n + 1 candidates always include a free one
    let max_suffix = 2 * resources.len() + 2;
    let mut taken = HashSet::new();
    let mut renames = Vec::new();

    for resource in resources.iter_mut() {
        let name = service_name(&resource.display_name());
        if taken.insert(name.clone()) {
            continue;
        }

        let unique = (2..=max_suffix)
            .map(|n| format!("{}-{}", name, n))
            .find(|candidate| !taken.contains(candidate) && !original.contains(candidate))
            .unwrap_or_else(|| format!("{}-{}", name, resource.id));
        taken.insert(unique.clone());

        info!(
            "Resource {} shares service name {}; translating it as {}",
            resource.id, name, unique
        );
        resource.name = unique.clone();
        renames.push(Rename {
            resource_id: resource.id.clone(),
            from: name,
            to: unique,
        });
    }

    renames
}
