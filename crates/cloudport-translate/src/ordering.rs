//! Dependency-aware ordering
//!
//! Translators declare the resource types they conceptually depend on (an ECS
//! service depends on its RDS database). Translation itself never enforces this;
//! callers that want backing services first (so generated `depends_on` targets
//! exist in output order) reorder with `dependency_order` before batching.

use std::collections::{HashMap, HashSet};

use cloudport_types::{Resource, ResourceType};
use tracing::{debug, warn};

use crate::registry::Registry;

/// Order `resources` so dependency types come before their dependents
///
/// The sort is stable: resources at the same depth keep their input order. A
/// dependency cycle among registered translators leaves the input order intact.
pub fn dependency_order(registry: &Registry, resources: &[Resource]) -> Vec<Resource> {
    let present: HashSet<ResourceType> = resources
        .iter()
        .map(|r| r.resource_type.clone())
        .collect();

    let mut graph: HashMap<ResourceType, Vec<ResourceType>> = HashMap::new();
    for resource_type in &present {
        let deps = registry
            .get(resource_type.clone())
            .map(|t| {
                t.dependencies()
                    .iter()
                    .filter(|d| present.contains(*d) && *d != resource_type)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        graph.insert(resource_type.clone(), deps);
    }

    let mut depths: HashMap<ResourceType, usize> = HashMap::new();
    for resource_type in &present {
        let mut visiting = HashSet::new();
        if depth_of(resource_type, &graph, &mut depths, &mut visiting).is_none() {
            warn!(
                "Dependency cycle involving {}; keeping input order",
                resource_type
            );
            return resources.to_vec();
        }
    }

    let mut ordered = resources.to_vec();
    ordered.sort_by_key(|r| depths.get(&r.resource_type).copied().unwrap_or(0));
    debug!("Ordered {} resources by dependency depth", ordered.len());
    ordered
}

/// Longest dependency chain below `node`; `None` on a cycle
fn depth_of(
    node: &ResourceType,
    graph: &HashMap<ResourceType, Vec<ResourceType>>,
    depths: &mut HashMap<ResourceType, usize>,
    visiting: &mut HashSet<ResourceType>,
) -> Option<usize> {
    if let Some(depth) = depths.get(node) {
        return Some(*depth);
    }
    if !visiting.insert(node.clone()) {
        return None;
    }

    let mut depth = 0;
    for dep in graph.get(node).map(Vec::as_slice).unwrap_or(&[]) {
        depth = depth.max(depth_of(dep, graph, depths, visiting)? + 1);
    }

    visiting.remove(node);
    depths.insert(node.clone(), depth);
    Some(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudport_types::{
        BaseTranslator, MappingResult, TranslateResult, TranslationContext, Translator,
    };
    use std::sync::Arc;

    struct Stub {
        base: BaseTranslator,
    }

    impl Translator for Stub {
        fn base(&self) -> &BaseTranslator {
            &self.base
        }

        fn map(
            &self,
            _ctx: &TranslationContext,
            resource: &Resource,
        ) -> TranslateResult<MappingResult> {
            self.validate(Some(resource))?;
            Ok(MappingResult::new(resource.display_name()))
        }
    }

    fn register(registry: &Registry, resource_type: ResourceType, deps: &[ResourceType]) {
        registry.register(Arc::new(Stub {
            base: BaseTranslator::with_dependencies(resource_type, deps),
        }));
    }

    fn ids(resources: &[Resource]) -> Vec<&str> {
        resources.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_backing_services_come_first() {
        let registry = Registry::new();
        register(
            &registry,
            ResourceType::EcsService,
            &[ResourceType::RdsInstance, ResourceType::SqsQueue],
        );
        register(&registry, ResourceType::RdsInstance, &[]);
        register(&registry, ResourceType::SqsQueue, &[]);

        let resources = vec![
            Resource::new("web", ResourceType::EcsService, "web"),
            Resource::new("db", ResourceType::RdsInstance, "db"),
            Resource::new("worker", ResourceType::EcsService, "worker"),
            Resource::new("queue", ResourceType::SqsQueue, "queue"),
        ];

        let ordered = dependency_order(&registry, &resources);
        assert_eq!(ids(&ordered), vec!["db", "queue", "web", "worker"]);
    }

    #[test]
    fn test_cycle_keeps_input_order() {
        let registry = Registry::new();
        register(&registry, ResourceType::EcsService, &[ResourceType::LambdaFunction]);
        register(&registry, ResourceType::LambdaFunction, &[ResourceType::EcsService]);

        let resources = vec![
            Resource::new("fn", ResourceType::LambdaFunction, "fn"),
            Resource::new("svc", ResourceType::EcsService, "svc"),
        ];

        let ordered = dependency_order(&registry, &resources);
        assert_eq!(ids(&ordered), vec!["fn", "svc"]);
    }

    #[test]
    fn test_unregistered_types_sort_as_leaves() {
        let registry = Registry::new();
        register(&registry, ResourceType::CloudRunService, &[ResourceType::CloudSqlInstance]);

        let resources = vec![
            Resource::new("run", ResourceType::CloudRunService, "run"),
            Resource::new("sql", ResourceType::CloudSqlInstance, "sql"),
        ];

        let ordered = dependency_order(&registry, &resources);
        assert_eq!(ids(&ordered), vec!["sql", "run"]);
    }
}
