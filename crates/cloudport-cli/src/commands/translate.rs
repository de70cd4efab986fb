use anyhow::Context;
use clap::Args;
use cloudport_compose::{OutputBundle, OutputWriter};
use cloudport_translate::{dependency_order, disambiguate_names};
use cloudport_types::{MappingResult, Resource, TranslationContext, TranslationSettings};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::input::load_resources;
use crate::registry::build_registry;

#[derive(Args)]
pub struct TranslateCommand {
    /// Resource inventory (JSON, or YAML with a .yaml/.yml extension)
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Directory the compose bundle is written to
    #[arg(long, short = 'o', default_value = "./cloudport-out")]
    pub output: PathBuf,

    /// Translation settings file (YAML)
    #[arg(long, env = "CLOUDPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Network every generated service joins
    #[arg(long, env = "CLOUDPORT_NETWORK")]
    pub network: Option<String>,

    /// Base domain for reverse-proxy host rules
    #[arg(long, env = "CLOUDPORT_DOMAIN")]
    pub domain: Option<String>,

    /// Translate and print the summary without writing files
    #[arg(long)]
    pub dry_run: bool,
}

impl TranslateCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(self.execute_async())
    }

    fn settings(&self) -> anyhow::Result<TranslationSettings> {
        let mut settings = match &self.config {
            Some(path) => TranslationSettings::from_file(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => TranslationSettings::default(),
        };
        if let Some(network) = &self.network {
            settings.network = network.clone();
        }
        if let Some(domain) = &self.domain {
            settings.domain = domain.clone();
        }
        settings.validate().context("Invalid translation settings")?;
        Ok(settings)
    }

    async fn execute_async(self) -> anyhow::Result<()> {
        let settings = self.settings()?;
        let mut resources = load_resources(&self.input)?;
        let renames = disambiguate_names(&mut resources);
        info!(
            "Translating {} resources from {}",
            resources.len(),
            self.input.display()
        );

        let registry = Arc::new(build_registry());
        let ordered = dependency_order(&registry, &resources);

        let token = CancellationToken::new();
        let ctx = TranslationContext::new(settings.clone()).with_cancellation(token.clone());

        let signal_token = token.clone();
        let signal_task = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling translation");
                signal_token.cancel();
            }
        });

        let batch = {
            let registry = registry.clone();
            let ordered = ordered.clone();
            tokio::task::spawn_blocking(move || registry.map_batch(&ctx, &ordered)).await?
        };
        signal_task.abort();
        let results = batch?;

        let mut bundle = OutputBundle::from_results(&ordered, &results, &settings);
        let mut notes: Vec<String> = renames
            .iter()
            .map(|rename| {
                format!(
                    "Resource `{}` shares the service name `{}`; translated as `{}`",
                    rename.resource_id, rename.from, rename.to
                )
            })
            .collect();
        notes.append(&mut bundle.report.notes);
        bundle.report.notes = notes;
        print_summary(&ordered, &results, &bundle);

        if self.dry_run {
            println!(
                "{}",
                "Dry run: nothing was written.".bright_yellow().bold()
            );
            return Ok(());
        }

        let writer = OutputWriter::new(&self.output);
        let written = writer
            .write(&bundle)
            .await
            .with_context(|| format!("Failed to write bundle to {}", self.output.display()))?;
        debug!("Bundle files: {:?}", written);

        println!(
            "{} {} files written to {}",
            "✓".bright_green().bold(),
            written.len(),
            writer.root().display().to_string().bright_cyan()
        );
        println!(
            "  Next: review {} then run {}",
            "MIGRATION.md".bright_white().bold(),
            "docker compose up -d".bright_white().bold()
        );
        Ok(())
    }
}

fn print_summary(resources: &[Resource], results: &[MappingResult], bundle: &OutputBundle) {
    println!();
    println!("{}", "Translation summary".bright_white().bold());
    println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_green());

    for (resource, result) in resources.iter().zip(results) {
        if result.is_error_placeholder() {
            let reason = result.warnings.first().map(String::as_str).unwrap_or("");
            println!(
                "  {} {} ({}) {}",
                "✗".bright_red().bold(),
                resource.id,
                resource.resource_type,
                reason.red()
            );
            continue;
        }

        println!(
            "  {} {} ({}) → {} [{}]",
            "✓".bright_green().bold(),
            resource.id,
            resource.resource_type,
            result.docker_service.name.bright_cyan(),
            result.docker_service.image
        );
        for warning in &result.warnings {
            println!("      {} {}", "warning:".yellow(), warning);
        }
    }

    let report = &bundle.report;
    println!();
    println!(
        "  {} services, {} failed, {} warnings, {} manual steps",
        bundle.compose.services.len().to_string().bright_white().bold(),
        report.failed_count().to_string().bright_red().bold(),
        report.warning_count().to_string().bright_yellow().bold(),
        report.manual_step_count().to_string().bright_white().bold()
    );
    println!();
}
