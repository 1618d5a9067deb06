//! CLI definition using clap

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use binroute_domain::model::{BinStatus, RouteStatus, WasteCategory};
use binroute_types::OutputFormat;

#[derive(Parser)]
#[command(name = "binroute")]
#[command(author = "yuuji")]
#[command(version)]
#[command(about = "Waste collection routes, bin tracking and daily resets")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Data directory override
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Treat the remote store as unreachable (writes are queued)
    #[arg(long, global = true)]
    pub offline: bool,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage bins
    Bins {
        #[command(subcommand)]
        action: BinCommands,
    },

    /// Manage and drive routes
    Routes {
        #[command(subcommand)]
        action: RouteCommands,
    },

    /// Saved route reports
    Report {
        #[command(subcommand)]
        action: ReportCommands,
    },

    /// Show collection progress, impact and pending bins
    Dashboard,

    /// Run the daily reset check once
    Reset {
        /// Pretend today is this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Keep checking for the daily reset until Enter is pressed
    Watch {
        /// Seconds between checks. Uses config value if not specified.
        #[arg(long, short = 'i')]
        interval: Option<u64>,
    },

    /// Replay writes queued while offline
    Sync,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set default collector
        #[arg(long)]
        set_collector: Option<String>,

        /// Set share directory for exported reports
        #[arg(long)]
        set_share_dir: Option<PathBuf>,

        /// Set data directory
        #[arg(long)]
        set_data_dir: Option<PathBuf>,

        /// Set seconds between reset checks
        #[arg(long)]
        set_reset_poll: Option<u64>,

        /// Set log level (error, warn, info, debug, trace)
        #[arg(long)]
        set_log_level: Option<String>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Args, Clone)]
pub struct BinFilterArgs {
    #[arg(long)]
    pub status: Option<BinStatus>,

    #[arg(long, short = 'c')]
    pub category: Option<WasteCategory>,

    #[arg(long, short = 'z')]
    pub zone: Option<String>,
}

#[derive(Subcommand)]
pub enum BinCommands {
    /// List bins
    List {
        #[command(flatten)]
        filter: BinFilterArgs,
    },

    /// Register a bin
    Add {
        bin_id: String,

        #[arg(long, short = 'l')]
        location: String,

        #[arg(long, short = 'z')]
        zone: String,

        #[arg(long, short = 'c')]
        category: WasteCategory,

        /// Capacity in kg
        #[arg(long)]
        capacity: f64,

        /// Current fill level (0-100)
        #[arg(long, default_value = "0")]
        fill: f64,
    },

    /// Update bin fields
    Update {
        bin_id: String,

        #[arg(long, short = 'l')]
        location: Option<String>,

        #[arg(long, short = 'z')]
        zone: Option<String>,

        #[arg(long, short = 'c')]
        category: Option<WasteCategory>,

        #[arg(long)]
        capacity: Option<f64>,

        #[arg(long)]
        fill: Option<f64>,

        #[arg(long)]
        weight: Option<f64>,

        #[arg(long)]
        status: Option<BinStatus>,

        /// Mark as needing collection (85% full)
        #[arg(long, conflicts_with_all = ["fill", "weight", "status"])]
        needs_collection: bool,
    },

    /// Remove a bin
    Remove { bin_id: String },

    /// Import bins from CSV (bin_id,location,zone,category,capacity[,fill_level,status])
    Import { csv: PathBuf },
}

#[derive(Subcommand)]
pub enum RouteCommands {
    /// List routes
    List {
        /// Only routes assigned to the configured collector
        #[arg(long)]
        mine: bool,

        #[arg(long)]
        status: Option<RouteStatus>,
    },

    /// Create a scheduled route
    Create {
        #[arg(long, short = 'n')]
        name: String,

        /// Scheduled date (YYYY-MM-DD)
        #[arg(long, short = 'd')]
        date: NaiveDate,

        /// Scheduled time (HH:MM)
        #[arg(long, short = 't')]
        time: String,

        /// Collector name. Uses config value if not specified.
        #[arg(long)]
        collector: Option<String>,

        /// Bin ids in visiting order
        #[arg(required = true)]
        bins: Vec<String>,
    },

    /// Create routes from a TOML plan
    Import { plan: PathBuf },

    /// Show a route with its stops
    Show { route_id: String },

    /// Start a route after the pre-route checklist
    Start {
        route_id: String,

        /// Checklist item to tick (repeatable)
        #[arg(long = "check")]
        checks: Vec<String>,

        /// Tick every checklist item
        #[arg(long)]
        all_checked: bool,
    },

    /// Record a collected bin
    Collect {
        route_id: String,
        bin_id: String,
        /// Actual weight in kg
        weight: String,
    },

    /// Skip a bin with a reason
    Skip {
        route_id: String,
        bin_id: String,

        #[arg(long, short = 'r')]
        reason: String,
    },

    /// Complete a route once every bin is processed
    Complete { route_id: String },

    /// Cancel a scheduled route
    Cancel { route_id: String },

    /// Export the report of a completed route
    Report {
        route_id: String,

        /// Also write an Excel workbook
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Show the saved report of a route
    Show { route_id: String },

    /// List saved reports
    List,
}
