//! ironbot CLI entrypoint.

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod handlers;

use commands::{Commands, SchemaKind};
use config::OutputFormat;

#[derive(Parser)]
#[command(name = "ironbot")]
#[command(author, version, about = "Package build automation for the worker", long_about = None)]
struct Cli {
    /// Worker configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;

    match cli.command {
        Commands::Plan { builder, branch } => {
            let config = config::load(cli.config.as_deref())?;
            handlers::plan(&config, &builder, branch, format)?
        }
        Commands::Run {
            builder,
            repository,
            branch,
            codebase,
        } => {
            let config = config::load(cli.config.as_deref())?;
            handlers::run(config, &builder, repository, branch, codebase, format).await?
        }
        Commands::Expand { manifest, workdir } => handlers::expand(&manifest, &workdir, format)?,
        Commands::Triggers { any_of, contains } => {
            let config = config::load(cli.config.as_deref())?;
            handlers::triggers(&config, any_of, contains, format)?
        }
        Commands::Validate => {
            let path = config::resolve_path(cli.config.as_deref())?;
            handlers::validate(&path)?
        }
        Commands::Schema { kind } => match kind {
            SchemaKind::Manifest => handlers::schema::<ironbot_core::Manifest>()?,
            SchemaKind::Config => handlers::schema::<ironbot_agent::CiConfig>()?,
        },
    }

    Ok(())
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
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "ironbot",
            "--config",
            "/etc/ironbot.yaml",
            "run",
            "archlinux-packages",
            "--branch",
            "master",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/ironbot.yaml")));
        let Commands::Run {
            builder, branch, ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(builder, "archlinux-packages");
        assert_eq!(branch.as_deref(), Some("master"));
    }

    #[test]
    fn test_triggers_needs_a_filter() {
        assert!(Cli::try_parse_from(["ironbot", "triggers"]).is_err());
        assert!(
            Cli::try_parse_from(["ironbot", "triggers", "--any-of", "a,b", "--contains", "c"])
                .is_err()
        );

        let cli = Cli::try_parse_from(["ironbot", "triggers", "--any-of", "fedora,packages"])
            .unwrap();
        let Commands::Triggers { any_of, contains } = cli.command else {
            panic!("expected triggers");
        };
        assert_eq!(any_of, vec!["fedora", "packages"]);
        assert_eq!(contains, None);
    }
}
