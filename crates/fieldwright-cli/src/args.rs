//! CLI argument definitions using clap
//!
//! Commands:
//! - fieldwright types
//! - fieldwright classify <schema.json>
//! - fieldwright format --fields <fields.json> <input.json>
//! - fieldwright validate --fields <fields.json> <input.json>

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;

/// Fieldwright - classify tracker field schemas and format values for them
#[derive(Parser, Debug)]
#[command(name = "fieldwright")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log level (error, warn, info, debug, trace); overrides -v
    #[arg(long, env = "FIELDWRIGHT_LOG", global = true)]
    pub log_level: Option<Level>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the field type taxonomy
    Types,

    /// Classify a schema object or an array of field descriptors
    Classify {
        /// JSON file holding a schema or field descriptors
        schema: PathBuf,
    },

    /// Format input values for the given fields
    Format {
        /// Field descriptors (array, or create-metadata object with "fields")
        #[arg(long, env = "FIELDWRIGHT_FIELDS")]
        fields: PathBuf,

        /// JSON object of field name or id to raw value
        input: PathBuf,
    },

    /// Validate input values against the given fields
    Validate {
        /// Field descriptors (array, or create-metadata object with "fields")
        #[arg(long, env = "FIELDWRIGHT_FIELDS")]
        fields: PathBuf,

        /// JSON object of field name or id to raw value
        input: PathBuf,
    },
}

impl Cli {
    pub fn max_level(&self) -> Level {
        if let Some(level) = self.log_level {
            return level;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }
}
