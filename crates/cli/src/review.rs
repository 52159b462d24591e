//! `clubfund review` / `entry` / `clear` — the manual-review queue, the
//! scoped merger replays behind it, and artifact lifecycle.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

use clubfund_recon::model::EntryStatus;
use clubfund_recon::money;
use clubfund_recon::refs::normalize_ref;
use clubfund_recon::review::{apply_manual_entry, apply_review, ManualEntry, ManualEntryKind};
use clubfund_recon::store::{EntryStore, StoreError, StoredEntry};
use clubfund_recon::{ReconError, Workbook};

use crate::exit_codes::{
    EXIT_REVIEW_CLUB, EXIT_REVIEW_DIVERGED, EXIT_REVIEW_DUPLICATE, EXIT_REVIEW_NOT_FOUND,
    EXIT_REVIEW_STATE, EXIT_RUN_INPUT, EXIT_STORE, EXIT_USAGE,
};
use crate::run::load_config;
use crate::store_sqlite::SqliteStore;
use crate::CliError;

#[derive(Subcommand)]
pub enum ReviewCommands {
    /// List entries awaiting manual review
    #[command(after_help = "\
Examples:
  clubfund review list
  clubfund review list --store entries.db --json
  clubfund review list --csv > queue.csv")]
    List {
        /// SQLite entry store
        #[arg(long, default_value = "clubfund.db")]
        store: PathBuf,

        /// Print the queue as JSON
        #[arg(long)]
        json: bool,

        /// Print the queue as CSV
        #[arg(long)]
        csv: bool,
    },

    /// Assign a needs-review entry to a club and replay it into the workbook
    #[command(after_help = "\
Examples:
  clubfund review assign 7 --club 'Archery Club' --artifact FY26_club_fund_summary.xlsx")]
    Assign {
        /// Entry id (see `review list`)
        id: i64,

        /// Club name as listed on the Summary sheet
        #[arg(long)]
        club: String,

        /// The retained workbook artifact to update
        #[arg(long)]
        artifact: PathBuf,

        /// SQLite entry store
        #[arg(long, default_value = "clubfund.db")]
        store: PathBuf,

        /// Engine configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum EntryCommands {
    /// Record a hand-keyed transaction against a club
    #[command(after_help = "\
Examples:
  clubfund entry add --kind contribution --date 2025-07-20 --reference MAN-77 \\
      --description 'Bake sale proceeds' --amount 25.00 --club 'Archery Club' \\
      --artifact FY26_club_fund_summary.xlsx")]
    Add {
        /// contribution, expense, or refund
        #[arg(long)]
        kind: String,

        /// Transaction date (yyyy-mm-dd)
        #[arg(long)]
        date: String,

        /// Journal reference; must be new
        #[arg(long)]
        reference: String,

        #[arg(long)]
        description: String,

        /// Dollar amount, e.g. 25.00
        #[arg(long)]
        amount: String,

        /// Club name as listed on the Summary sheet
        #[arg(long)]
        club: String,

        /// The retained workbook artifact to update
        #[arg(long)]
        artifact: PathBuf,

        /// SQLite entry store
        #[arg(long, default_value = "clubfund.db")]
        store: PathBuf,

        /// Engine configuration (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn store_err(e: StoreError) -> CliError {
    let code = match &e {
        StoreError::NotFound(_) => EXIT_REVIEW_NOT_FOUND,
        StoreError::DuplicateRef(_) => EXIT_REVIEW_DUPLICATE,
        StoreError::Backend(_) => EXIT_STORE,
    };
    CliError { code, message: e.to_string(), hint: None }
}

fn recon_err(e: ReconError) -> CliError {
    let code = match &e {
        ReconError::ClubNotFound { .. } => EXIT_REVIEW_CLUB,
        ReconError::DuplicateRef { .. } => EXIT_REVIEW_DUPLICATE,
        _ => EXIT_RUN_INPUT,
    };
    CliError { code, message: e.to_string(), hint: None }
}

fn load_artifact(path: &Path) -> Result<Workbook, CliError> {
    let (workbook, _) = clubfund_io::xlsx::import(path)
        .map_err(|e| CliError { code: EXIT_RUN_INPUT, message: e, hint: None })?;
    Ok(workbook)
}

fn export_after_store_update(workbook: &Workbook, path: &Path) -> Result<(), CliError> {
    clubfund_io::xlsx::export(workbook, path).map_err(|e| CliError {
        code: EXIT_REVIEW_DIVERGED,
        message: format!("store updated but artifact not written: {e}"),
        hint: Some("re-run the command to rewrite the artifact".into()),
    })?;
    Ok(())
}

pub fn cmd_review(cmd: ReviewCommands) -> Result<(), CliError> {
    match cmd {
        ReviewCommands::List { store, json, csv } => cmd_review_list(store, json, csv),
        ReviewCommands::Assign { id, club, artifact, store, config } => {
            cmd_review_assign(id, club, artifact, store, config)
        }
    }
}

#[derive(Serialize)]
struct QueueRow {
    id: i64,
    date: String,
    journal_ref: String,
    description: String,
    designation: String,
    gross: String,
    fees: String,
    net: String,
}

impl QueueRow {
    fn from_stored(stored: &StoredEntry) -> Self {
        let e = &stored.entry;
        Self {
            id: stored.id,
            date: e.date.format("%Y-%m-%d").to_string(),
            journal_ref: e.journal_ref.clone(),
            description: e.description.clone(),
            designation: e.designation.clone().unwrap_or_default(),
            gross: money::format_cents(e.gross_cents),
            fees: money::format_cents(e.fees_cents),
            net: money::format_cents(e.net_cents),
        }
    }
}

fn cmd_review_list(store_path: PathBuf, json: bool, csv_out: bool) -> Result<(), CliError> {
    let store = SqliteStore::open(&store_path).map_err(store_err)?;
    let queue = store.needs_review().map_err(store_err)?;
    let rows: Vec<QueueRow> = queue.iter().map(QueueRow::from_stored).collect();

    if json {
        let json_str = serde_json::to_string_pretty(&rows)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
        return Ok(());
    }

    if csv_out {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        for row in &rows {
            writer.serialize(row).map_err(|e| CliError::io(e.to_string()))?;
        }
        writer.flush().map_err(|e| CliError::io(e.to_string()))?;
        return Ok(());
    }

    if rows.is_empty() {
        eprintln!("review queue is empty");
        return Ok(());
    }
    for row in &rows {
        println!(
            "{:>5}  {}  {:<12} {:<32} {:<24} net {}",
            row.id, row.date, row.journal_ref, row.description, row.designation, row.net,
        );
    }
    eprintln!("{} entr{} awaiting review", rows.len(), if rows.len() == 1 { "y" } else { "ies" });
    Ok(())
}

fn cmd_review_assign(
    id: i64,
    club: String,
    artifact: PathBuf,
    store_path: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = load_config(config_path.as_deref())?;
    let today = chrono::Local::now().date_naive();

    let mut store = SqliteStore::open(&store_path).map_err(store_err)?;
    let stored = store.get(id).map_err(store_err)?;
    if stored.entry.status != EntryStatus::NeedsReview {
        return Err(CliError {
            code: EXIT_REVIEW_STATE,
            message: format!("entry {id} is not awaiting review ({})", stored.entry.status),
            hint: None,
        });
    }

    // Replay into a fresh workbook first; the store and artifact are only
    // touched once the replay has succeeded.
    let workbook = load_artifact(&artifact)?;
    let updated = apply_review(&workbook, &stored.entry, &club, &config, today).map_err(recon_err)?;

    store.assign_club(id, &club).map_err(store_err)?;
    export_after_store_update(&updated, &artifact)?;

    eprintln!("entry {id} ({}) assigned to {club}", stored.entry.journal_ref);
    Ok(())
}

pub fn cmd_entry(cmd: EntryCommands) -> Result<(), CliError> {
    match cmd {
        EntryCommands::Add {
            kind,
            date,
            reference,
            description,
            amount,
            club,
            artifact,
            store,
            config,
        } => cmd_entry_add(kind, date, reference, description, amount, club, artifact, store, config),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_entry_add(
    kind: String,
    date: String,
    reference: String,
    description: String,
    amount: String,
    club: String,
    artifact: PathBuf,
    store_path: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<(), CliError> {
    let kind = ManualEntryKind::parse(&kind).ok_or_else(|| CliError {
        code: EXIT_USAGE,
        message: format!("unknown entry kind '{kind}'"),
        hint: Some("expected contribution, expense, or refund".into()),
    })?;
    let date = chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| CliError::args(format!("invalid date '{date}' (expected yyyy-mm-dd)")))?;
    let amount_cents = money::parse_cents(&amount)
        .filter(|cents| *cents > 0)
        .ok_or_else(|| CliError::args(format!("invalid amount '{amount}'")))?;

    let config = load_config(config_path.as_deref())?;
    let today = chrono::Local::now().date_naive();

    let mut store = SqliteStore::open(&store_path).map_err(store_err)?;
    if store.contains_ref(&normalize_ref(&reference)).map_err(store_err)? {
        return Err(CliError {
            code: EXIT_REVIEW_DUPLICATE,
            message: format!("journal reference '{reference}' is already recorded"),
            hint: None,
        });
    }

    let manual = ManualEntry {
        kind,
        date,
        journal_ref: reference,
        description,
        amount_cents,
        club,
    };
    let workbook = load_artifact(&artifact)?;
    let (updated, entry) = apply_manual_entry(&workbook, &manual, &config, today).map_err(recon_err)?;

    store.commit(std::slice::from_ref(&entry)).map_err(store_err)?;
    export_after_store_update(&updated, &artifact)?;

    eprintln!(
        "recorded {} {} for {}",
        entry.kind_label().to_lowercase(),
        money::format_cents(entry.net_cents),
        entry.assigned_club.as_deref().unwrap_or("?"),
    );
    Ok(())
}

/// `clubfund clear` — drop the retained artifact and purge the store.
pub fn cmd_clear(store_path: PathBuf, artifact: Option<PathBuf>) -> Result<(), CliError> {
    let mut store = SqliteStore::open(&store_path).map_err(store_err)?;
    store.clear().map_err(store_err)?;
    eprintln!("store cleared");

    if let Some(path) = artifact {
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| CliError::io(format!("cannot remove {}: {e}", path.display())))?;
            eprintln!("removed {}", path.display());
        }
    }
    Ok(())
}
