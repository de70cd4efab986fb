use clap::Args;
use cloudport_types::ResourceType;
use colored::Colorize;

use crate::registry::build_registry;

#[derive(Args)]
pub struct TypesCommand {
    /// Only list types of this provider (aws, gcp, azure)
    #[arg(long)]
    pub provider: Option<String>,
}

impl TypesCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let registry = build_registry();
        let filter = self.provider.as_deref().map(str::to_lowercase);

        println!(
            "{:<28} {:<8} {}",
            "TYPE".bold(),
            "PROVIDER".bold(),
            "TRANSLATOR".bold()
        );
        for resource_type in ResourceType::ALL {
            let provider = resource_type.provider().map(|p| p.as_str()).unwrap_or("-");
            if filter.as_deref().is_some_and(|p| p != provider) {
                continue;
            }
            let status = if registry.has_mapper(resource_type.clone()) {
                "registered".bright_green()
            } else {
                "missing".bright_red()
            };
            println!(
                "{:<28} {:<8} {}",
                resource_type.as_str(),
                provider,
                status
            );
        }
        Ok(())
    }
}
