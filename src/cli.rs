use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "moon-catalog")]
#[command(about = "Search a book catalog and publish it as letter-indexed pages")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Keywords to search for; `moon-catalog tempest` is `moon-catalog search tempest`.
    #[arg(value_name = "KEYWORDS")]
    pub keywords: Vec<String>,

    #[arg(long, value_name = "FILE", global = true)]
    pub catalog: Option<PathBuf>,

    #[arg(long, value_name = "SECS", global = true)]
    pub delay_secs: Option<u64>,

    #[arg(long, value_name = "URL", global = true)]
    pub telegraph_api: Option<String>,
}

impl Cli {
    /// The subcommand to run, with bare keywords standing for `search`.
    pub fn effective_command(&self) -> Commands {
        self.command.clone().unwrap_or_else(|| Commands::Search {
            keywords: self.keywords.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Serve the chat bot while publishing the catalog in the background.
    Run {
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,

        #[arg(long, value_name = "URL")]
        telegram_api: Option<String>,
    },
    Search {
        #[arg(required = true, num_args = 1..)]
        keywords: Vec<String>,
    },
    Random,
    /// Publish every letter page now and print the resulting index.
    Publish {
        /// Print the rendered pages instead of publishing them.
        #[arg(long)]
        dry_run: bool,
    },
    Stats,
}
