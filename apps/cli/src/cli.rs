//! Command-line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(
    name = "conceptpubsub",
    version,
    about = "Manage local concept identities and subscribed concept sources"
)]
pub struct Cli {
    /// Configuration file (defaults to ./conceptpubsub.toml if present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply database migrations
    Migrate,

    /// Create the local concept source from the implementation id
    Bootstrap {
        /// Create a new local source even if one is already configured
        #[arg(long)]
        force: bool,
    },

    /// Show the configured local concept source
    LocalSource,

    /// Add a local mapping to every concept
    Sync {
        /// Concepts fetched per page (overrides sync.batch_size)
        #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
        batch_size: Option<u32>,
    },

    /// Add a local mapping to a single concept
    Map {
        #[arg(value_name = "CONCEPT_ID")]
        concept_id: i32,
    },

    /// Resolve an `id` or `source:code` identifier to a concept
    Resolve {
        #[arg(value_name = "IDENTIFIER")]
        identifier: String,
    },

    /// Report whether a concept is local or comes from a subscribed source
    IsLocal {
        #[arg(value_name = "CONCEPT_ID")]
        concept_id: i32,
    },

    /// List subscribed concept sources
    Subscribed,

    /// Replace the list of subscribed concept sources
    Subscribe {
        #[arg(value_name = "UUID", num_args = 0..)]
        sources: Vec<Uuid>,
    },
}
