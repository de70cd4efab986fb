use cloudport_translate::Registry;
use tracing::debug;

/// Registry with every provider's translators
pub fn build_registry() -> Registry {
    let registry = Registry::new();
    for translator in cloudport_aws::translators()
        .into_iter()
        .chain(cloudport_gcp::translators())
        .chain(cloudport_azure::translators())
    {
        registry.register(translator);
    }
    debug!("Registry ready with {} translators", registry.len());
    registry
}
