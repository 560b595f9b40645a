use clap::{Parser, Subcommand};

mod cli;
mod config;
mod counter;
mod dedupe;
mod error;
mod report;
mod storage;
mod store;
mod timestamp;
mod types;

#[derive(Parser)]
#[command(name = "prompt-counter")]
#[command(version)]
#[command(about = "Count prompts sent to AI chat tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and event database
    Init {
        /// Directory to use instead of the default data directory
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Handle one JSON message (argument or stdin) and print the reply
    Ingest {
        /// Message, e.g. {"type":"PROMPT_SENT","tool":"claude","timestamp":1700000000000}
        message: Option<String>,

        /// Identifier of the sending tab or window
        #[arg(short, long)]
        origin: Option<i64>,
    },

    /// Read newline-delimited JSON messages from stdin until it closes
    Listen {
        /// Identifier of the sending tab or window
        #[arg(short, long)]
        origin: Option<i64>,
    },

    /// Record a manual count
    Count {
        /// Tool to count
        #[arg(short, long, default_value = "cursor")]
        tool: String,
    },

    /// Show today's count
    Today,

    /// Show counts per day and per tool
    Stats {
        /// Trailing window in days
        #[arg(
            short,
            long,
            default_value_t = report::DASHBOARD_DAYS,
            value_parser = clap::value_parser!(i64).range(1..=report::MAX_REPORT_DAYS)
        )]
        days: i64,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List recent events
    List {
        /// Maximum results
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Export all events as CSV
    Export {
        /// Output file (defaults to prompt-counter-<time>.csv)
        #[arg(short, long)]
        output: Option<String>,

        /// Write to stdout instead of a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },

    /// Delete all events
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// View or set configuration
    Config {
        /// Config key
        key: Option<String>,

        /// Config value
        value: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { path } => cli::events::run_init(path.as_deref()),
        Commands::Ingest { message, origin } => cli::events::run_ingest(message.as_deref(), origin),
        Commands::Listen { origin } => cli::events::run_listen(origin),
        Commands::Count { tool } => cli::events::run_count(&tool),
        Commands::Today => cli::report::run_today(),
        Commands::Stats { days, json } => cli::report::run_stats(days, json),
        Commands::List { limit } => cli::events::run_list(limit),
        Commands::Export { output, stdout } => cli::report::run_export(output.as_deref(), stdout),
        Commands::Reset { force } => cli::events::run_reset(force),
        Commands::Config { key, value } => cli::config::run_config(key.as_deref(), value.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
