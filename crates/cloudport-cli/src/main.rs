//! Cloudport CLI
//!
//! Loads a cloud resource inventory, translates it with the provider
//! translators and writes a Docker Compose deployment bundle.

mod commands;
mod input;
mod registry;

use clap::{Parser, Subcommand};
use commands::{TranslateCommand, TypesCommand};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "CLOUDPORT_LOG_LEVEL",
        global = true
    )]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "CLOUDPORT_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a resource inventory into a compose bundle
    Translate(TranslateCommand),
    /// List supported resource types
    Types(TypesCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let log_level = cli.log_level.clone();

    // RUST_LOG takes full control when set; otherwise only our crates log at
    // the requested level
    let default_filter = || {
        tracing_subscriber::EnvFilter::new(format!(
            "cloudport_cli={level},\
             cloudport_types={level},\
             cloudport_translate={level},\
             cloudport_aws={level},\
             cloudport_gcp={level},\
             cloudport_azure={level},\
             cloudport_compose={level}",
            level = log_level
        ))
    };
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|e| {
            eprintln!("Ignoring invalid RUST_LOG: {}", e);
            default_filter()
        })
    } else {
        default_filter()
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default subscriber");

    match cli.command {
        Commands::Translate(translate_cmd) => translate_cmd.execute(),
        Commands::Types(types_cmd) => types_cmd.execute(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_translate_flags() {
        let cli = Cli::try_parse_from([
            "cloudport",
            "--log-level",
            "debug",
            "translate",
            "--input",
            "inventory.yaml",
            "--output",
            "out",
            "--network",
            "apps",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Translate(cmd) => {
                assert_eq!(cmd.input, std::path::PathBuf::from("inventory.yaml"));
                assert_eq!(cmd.network.as_deref(), Some("apps"));
                assert!(cmd.dry_run);
            }
            Commands::Types(_) => panic!("expected translate"),
        }
    }
}
