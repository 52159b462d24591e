// clubfund CLI - club-foundation contribution reconciliation

mod exit_codes;
mod review;
mod run;
mod store_sqlite;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "clubfund")]
#[command(about = "Reconcile foundation ledger exports into per-club fund sheets")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full reconciliation and write the updated workbook
    #[command(after_help = "\
Examples:
  clubfund run --ledger activity.xlsx --donor acknowledgement.xlsx --summary summary.xlsx
  clubfund run --ledger activity.xlsx --donor ack.xlsx --summary summary.xlsx \\
      --store entries.db -o FY26_club_fund_summary.xlsx --json")]
    Run(run::RunArgs),

    /// Inspect and resolve the manual-review queue
    Review {
        #[command(subcommand)]
        command: review::ReviewCommands,
    },

    /// Hand-keyed transactions outside a reconciliation run
    Entry {
        #[command(subcommand)]
        command: review::EntryCommands,
    },

    /// Purge the entry store and drop the retained artifact
    #[command(after_help = "\
Examples:
  clubfund clear
  clubfund clear --store entries.db --artifact FY26_club_fund_summary.xlsx")]
    Clear {
        /// SQLite entry store
        #[arg(long, default_value = "clubfund.db")]
        store: PathBuf,

        /// Retained workbook artifact to delete
        #[arg(long)]
        artifact: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run::cmd_run(args),
        Commands::Review { command } => review::cmd_review(command),
        Commands::Entry { command } => review::cmd_entry(command),
        Commands::Clear { store, artifact } => review::cmd_clear(store, artifact),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: exit_codes::EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    #[allow(dead_code)]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
