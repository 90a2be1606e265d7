use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sample-library-manager")]
#[command(version = "1.0")]
#[command(about = "Personal audio sample library with sidecar metadata and content deduplication", long_about = None)]
pub struct Cli {
    /// Library root directory (defaults to <Documents>/SampleSync)
    #[arg(short = 'l', long = "library", env = "SAMPLESYNC_LIBRARY", global = true)]
    pub library: Option<PathBuf>,

    /// Show dot-files and dot-directories in listings
    #[arg(long, global = true)]
    pub include_hidden: bool,

    /// Don't write lazily computed content hashes back to sidecars
    #[arg(long, global = true)]
    pub no_persist_hashes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the samples and subdirectories of a library directory
    List {
        /// Directory relative to the library root
        #[arg(default_value = "/")]
        path: String,
    },

    /// Copy files or whole folders into the library
    Import {
        /// Files or directories to import
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Destination directory relative to the library root
        #[arg(short = 't', long, default_value = "/")]
        target: String,

        /// Import identical files from the same batch instead of rejecting repeats
        #[arg(long)]
        allow_batch_duplicates: bool,

        /// Write a CSV report of every item
        #[arg(short = 'r', long)]
        report: Option<PathBuf>,
    },

    /// Edit the title, description or tags of a sample
    Edit {
        /// Audio file path relative to the library root
        path: String,

        #[arg(long)]
        title: Option<String>,

        /// Empty string clears the description
        #[arg(long)]
        description: Option<String>,

        /// Replace tags (repeatable, order kept)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Remove all tags
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,
    },

    /// Export the catalog of samples to CSV
    Export {
        /// Output CSV file path
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Only samples at or below this directory
        #[arg(short = 's', long, default_value = "/")]
        scope: String,
    },
}
