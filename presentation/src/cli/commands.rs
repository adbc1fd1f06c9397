//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use council_domain::ConsensusThreshold;
use std::path::PathBuf;

/// Output format for deliberation results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every response, the clusters and the evidence trail
    Full,
    /// Disposition, final answer and confidence only
    #[default]
    Summary,
    /// JSON output
    Json,
}

/// CLI arguments for council-engine
#[derive(Parser, Debug)]
#[command(name = "council")]
#[command(author, version, about = "Council deliberation engine - independent agents vote on one answer")]
#[command(long_about = r#"
The council poses one query to several independent agent responders and
reduces their answers into a single adjudicated result.

Responses are clustered by claim agreement. The heaviest cluster wins when
its weighted share reaches the consensus threshold; otherwise the result is
returned as no_consensus for human review. Every final claim is traced back
to the responses and sources that support it.

Configuration files are loaded from (in priority order):
1. COUNCIL_* environment variables
2. --config <path>     Explicit config file
3. ./council.toml       Project-level config
4. ~/.config/council-engine/config.toml   Global config

Example:
  council ask "How many ICU beds are free in ward 3?"
  council ask --threshold 75% -o full "Total revenue for Q3?"
  council serve --bind 0.0.0.0:8080
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one deliberation and print the result
    Ask {
        /// The query to put to the council
        query: String,

        /// Consensus threshold override, as a fraction (0.75) or percentage (75%)
        #[arg(short, long, value_name = "THRESHOLD")]
        threshold: Option<ConsensusThreshold>,

        /// Locale passed to every responder
        #[arg(long, value_name = "LOCALE")]
        locale: Option<String>,

        /// Extra context lines passed to every responder (repeatable)
        #[arg(long, value_name = "TEXT")]
        context: Vec<String>,

        /// Requester recorded on the deliberation
        #[arg(long, env = "COUNCIL_REQUESTER", default_value = "cli")]
        requester: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "summary")]
        output: OutputFormat,

        /// Suppress progress indicators
        #[arg(short, long)]
        quiet: bool,
    },

    /// Serve the HTTP API
    Serve {
        /// Listen address, overriding [server] bind
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Show configuration file locations and the effective configuration
    ShowConfig,
}
