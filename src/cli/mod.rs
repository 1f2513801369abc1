//! Command-line interface for the daybook terminal front-end.

use crate::constants::{APP_DESCRIPTION, APP_NAME, LOG_FORMAT_JSON, LOG_FORMAT_TEXT};
use clap::{Parser, Subcommand};

/// A personal diary backed by plain text files
#[derive(Parser, Debug)]
#[clap(name = APP_NAME, about = APP_DESCRIPTION)]
#[clap(author, version, long_about = None)]
pub struct CliArgs {
    /// Print verbose output
    #[clap(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[clap(long, global = true, default_value = LOG_FORMAT_TEXT, value_parser = [LOG_FORMAT_TEXT, LOG_FORMAT_JSON])]
    pub log_format: String,

    /// Entries directory, overriding DAYBOOK_DIR
    #[clap(long, global = true)]
    pub dir: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

/// What to do with the diary.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// List all entries, most recent first
    List,

    /// List entries whose title or content contains QUERY (case-insensitive)
    Search {
        /// Text to look for
        query: String,
    },

    /// Print the entry at position N of the list
    Show {
        /// 1-based position in the list
        index: usize,
    },

    /// Create an entry; content is read from stdin unless --content is given
    Add {
        /// Entry title
        title: String,
        /// Entry text
        #[clap(short, long)]
        content: Option<String>,
    },

    /// Change the title and/or content of the entry at position N
    Edit {
        /// 1-based position in the list
        index: usize,
        /// New title
        #[clap(short, long)]
        title: Option<String>,
        /// New content
        #[clap(short, long)]
        content: Option<String>,
    },

    /// Delete the entry at position N
    Delete {
        /// 1-based position in the list
        index: usize,
    },

    /// Compose a new entry line by line from stdin, autosaving as you go
    Write {
        /// Entry title
        title: String,
    },
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        CliArgs::parse_from(std::env::args())
    }
}
