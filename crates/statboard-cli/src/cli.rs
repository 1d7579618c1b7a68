use std::path::PathBuf;

use clap::{Parser, Subcommand};
use statboard_core::{EntityLevel, Frequency, Profile};

#[derive(Parser, Debug)]
#[command(name = "statboard", version, about = "Usage statistics dashboard")]
pub struct Cli {
    /// Entity id to query (defaults to the configured entity)
    #[arg(short, long, global = true)]
    pub entity: Option<String>,

    /// Entity level: structure, project or platform
    #[arg(short, long, global = true)]
    pub level: Option<EntityLevel>,

    /// Stats API base URL
    #[arg(long, global = true, env = "STATBOARD_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List available indicators
    Indicators,

    /// Fetch month data for every indicator and print headline totals
    Summary,

    /// Print chart-ready JSON for one indicator
    Chart {
        /// Indicator name, e.g. stats.connections
        indicator: String,

        /// Bucket size: day, week or month
        #[arg(short, long)]
        frequency: Option<Frequency>,

        /// Connector to chart (stats.connectorDetails)
        #[arg(short, long)]
        app: Option<String>,

        /// Profile to chart, for indicators with a profile selector
        #[arg(short, long)]
        profile: Option<Profile>,

        /// Ignore cached data and query the API
        #[arg(long)]
        refresh: bool,
    },

    /// Export an indicator's records as CSV
    Export {
        indicator: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect or clear cached entity data
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum CacheCommands {
    /// List cached entities and their age
    Status,
    /// Delete all cached entity data
    Clear,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Set a configuration key (api_base_url, token, cache_ttl_minutes,
    /// since_months, log_dir, default_entity as <level>:<id>)
    Set { key: String, value: String },
}
