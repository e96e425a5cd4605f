use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "clockblock", version, about = "ClockBlock screen-time budget CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print budget state, curfew status and today's log projection
    Status,
    /// Run the budget clock in the foreground until Ctrl-C
    Play {
        /// Stop automatically after this many ticks
        #[arg(long)]
        minutes: Option<u32>,
    },
    /// Debit minutes manually
    Tick {
        #[arg(long, default_value = "1")]
        count: u32,
    },
    /// Grant (positive) or take away (negative) minutes
    Adjust {
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Close out the current day and record it in the history
    Settle,
    /// Ingest one heartbeat payload from the play detector
    Heartbeat {
        /// Heartbeat JSON
        json: String,
    },
    /// Check the play window
    Curfew {
        /// Time to evaluate (HH:MM), defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// Daily history
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Weekly schedule management
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Start over from today's allowance
    Reset,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Status => commands::economy::status(),
        Commands::Play { minutes } => commands::play::run(minutes),
        Commands::Tick { count } => commands::economy::tick(count),
        Commands::Adjust { amount } => commands::economy::adjust(amount),
        Commands::Settle => commands::economy::settle(),
        Commands::Heartbeat { json } => commands::heartbeat::run(&json),
        Commands::Curfew { at } => commands::curfew::run(at.as_deref()),
        Commands::Log { action } => commands::log::run(action),
        Commands::Schedule { action } => commands::schedule::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Reset => commands::economy::reset(),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
