//! CLI argument definitions using clap
//!
//! Commands:
//! - schemamap import --catalog <dir> --document <file> [--config <file>] [--disallow-major-upgrade]
//! - schemamap diff --old <file> --new <file>
//! - schemamap inspect --catalog <dir> --schema <name> [--class <c> --property <p> | --table <t>]

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// schemamap - schema evolution validator and column allocator
#[derive(Parser, Debug)]
#[command(name = "schemamap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a schema document and commit it with its layout
    Import {
        /// Catalog root directory (overrides config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Schema document (JSON)
        #[arg(long)]
        document: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reject Major-gated changes even under a read version bump
        #[arg(long)]
        disallow_major_upgrade: bool,
    },

    /// Print the change tree between two schema documents
    Diff {
        #[arg(long)]
        old: PathBuf,

        #[arg(long)]
        new: PathBuf,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show the persisted layout of a schema
    Inspect {
        /// Catalog root directory (overrides config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[arg(long)]
        schema: String,

        /// Class whose property map to show
        #[arg(long, requires = "property")]
        class: Option<String>,

        #[arg(long, requires = "class")]
        property: Option<String>,

        /// Table to describe
        #[arg(long, conflicts_with = "class")]
        table: Option<String>,

        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Command {
    pub fn config_path(&self) -> Option<&Path> {
        match self {
            Command::Import { config, .. }
            | Command::Diff { config, .. }
            | Command::Inspect { config, .. } => config.as_deref(),
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_import() {
        let cli = Cli::try_parse_from([
            "schemamap",
            "import",
            "--catalog",
            "/tmp/cat",
            "--document",
            "plant.json",
            "--disallow-major-upgrade",
        ])
        .unwrap();
        match cli.command {
            Command::Import {
                catalog,
                document,
                disallow_major_upgrade,
                ..
            } => {
                assert_eq!(catalog, Some(PathBuf::from("/tmp/cat")));
                assert_eq!(document, PathBuf::from("plant.json"));
                assert!(disallow_major_upgrade);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_inspect_property_requires_class() {
        let result = Cli::try_parse_from([
            "schemamap",
            "inspect",
            "--schema",
            "Plant",
            "--property",
            "Flow",
        ]);
        assert!(result.is_err());
    }
}
