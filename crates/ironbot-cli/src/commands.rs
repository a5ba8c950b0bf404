//! CLI command definitions.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Show the steps a builder starts with
    Plan {
        /// Builder name
        builder: String,

        /// Branch to plan for
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Run a builder on this worker
    Run {
        /// Builder name
        builder: String,

        /// Repository to check out
        #[arg(long)]
        repository: Option<String>,

        /// Branch to build
        #[arg(short, long)]
        branch: Option<String>,

        #[arg(long)]
        codebase: Option<String>,
    },

    /// Show the package builds a selection manifest produces
    Expand {
        /// Path to the manifest
        #[arg(default_value = ironbot_core::manifest::MANIFEST_FILENAME)]
        manifest: PathBuf,

        /// Directory holding one subdirectory per package
        #[arg(short, long, default_value = "build")]
        workdir: PathBuf,
    },

    /// Show the rebuild triggers matching some tags
    #[command(group = clap::ArgGroup::new("filter").required(true))]
    Triggers {
        /// Match targets carrying any of these tags
        #[arg(long, value_delimiter = ',', group = "filter")]
        any_of: Vec<String>,

        /// Match targets carrying this tag
        #[arg(long, group = "filter")]
        contains: Option<String>,
    },

    /// Validate the worker configuration
    Validate,

    /// Print a JSON Schema
    Schema {
        #[arg(value_enum)]
        kind: SchemaKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SchemaKind {
    /// The selection manifest (channels.json)
    Manifest,
    /// The worker configuration file
    Config,
}
