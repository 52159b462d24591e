//! `clubfund run` — full reconciliation: ledger + donor + summary in,
//! merged artifact + persisted entries out.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use clap::Args;

use clubfund_recon::fiscal::fiscal_year_label;
use clubfund_recon::store::EntryStore;
use clubfund_recon::workbook::Sheet;
use clubfund_recon::{ReconConfig, ReconError, RunInput};

use crate::exit_codes::{EXIT_RUN_EXPORT, EXIT_RUN_INPUT, EXIT_RUN_PERSISTENCE, EXIT_STORE, EXIT_USAGE};
use crate::store_sqlite::SqliteStore;
use crate::CliError;

#[derive(Args)]
pub struct RunArgs {
    /// Ledger activity export (xlsx)
    #[arg(long)]
    pub ledger: PathBuf,

    /// Donor acknowledgement export (xlsx)
    #[arg(long)]
    pub donor: PathBuf,

    /// Existing summary workbook (xlsx)
    #[arg(long)]
    pub summary: PathBuf,

    /// Output artifact path; defaults to FY{yy}_club_fund_summary.xlsx
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// SQLite entry store; omit to skip persistence
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Engine configuration (TOML); defaults cover the standard exports
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

pub fn load_config(path: Option<&Path>) -> Result<ReconConfig, CliError> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::io(format!("cannot read config {}: {e}", path.display()))
            })?;
            ReconConfig::from_toml(&text)
                .map_err(|e| CliError { code: EXIT_USAGE, message: e.to_string(), hint: None })
        }
        None => Ok(ReconConfig::default()),
    }
}

fn input_err(e: impl std::fmt::Display) -> CliError {
    CliError { code: EXIT_RUN_INPUT, message: e.to_string(), hint: None }
}

/// Load one named sheet out of an input workbook.
pub fn load_sheet(path: &Path, role: &str, sheet_name: &str) -> Result<Sheet, CliError> {
    let (workbook, _) = clubfund_io::xlsx::import(path).map_err(input_err)?;
    workbook
        .sheet(sheet_name)
        .cloned()
        .ok_or_else(|| input_err(ReconError::MissingSheet {
            role: role.into(),
            sheet: sheet_name.into(),
        }))
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;
    let today = chrono::Local::now().date_naive();

    let (ledger_workbook, _) = clubfund_io::xlsx::import(&args.ledger).map_err(input_err)?;
    let ledger = clubfund_io::xlsx::find_ledger_sheet(&ledger_workbook, &config.ledger)
        .cloned()
        .ok_or_else(|| input_err(format!("{}: workbook contains no sheets", args.ledger.display())))?;

    let donor = load_sheet(&args.donor, "donor", &config.donor.sheet)?;
    let (workbook, _) = clubfund_io::xlsx::import(&args.summary).map_err(input_err)?;

    let mut store = match &args.store {
        Some(path) => Some(SqliteStore::open(path).map_err(|e| CliError {
            code: EXIT_STORE,
            message: e.to_string(),
            hint: None,
        })?),
        None => None,
    };
    let known_refs: HashSet<String> = match &store {
        Some(store) => store.known_refs().map_err(|e| CliError {
            code: EXIT_STORE,
            message: e.to_string(),
            hint: None,
        })?,
        None => HashSet::new(),
    };

    let output = clubfund_recon::run(
        &config,
        RunInput { ledger, donor, workbook },
        &known_refs,
        today,
    )
    .map_err(input_err)?;

    let artifact = args.output.clone().unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}_club_fund_summary.xlsx",
            fiscal_year_label(today, config.fiscal.start_month)
        ))
    });
    clubfund_io::xlsx::export(&output.workbook, &artifact)
        .map_err(|e| CliError { code: EXIT_RUN_EXPORT, message: e, hint: None })?;
    eprintln!("wrote {}", artifact.display());

    let s = &output.summary;
    eprintln!(
        "run: {} processed, {} needs review, {} duplicate in sheet, {} duplicate in store, {} out of range",
        s.processed, s.needs_review, s.duplicate_in_sheet, s.duplicate_in_store, s.skipped_out_of_range,
    );
    for warning in &s.warnings {
        eprintln!("warning: {warning}");
    }
    for error in &s.errors {
        eprintln!("error: {error}");
    }

    if args.json {
        let json_str = serde_json::to_string_pretty(s)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    }

    // The artifact is already on disk; a failed commit is reported on its
    // own exit code so the caller knows store and workbook may have
    // diverged.
    if let Some(store) = store.as_mut() {
        if !output.new_entries.is_empty() {
            store.commit(&output.new_entries).map_err(|e| CliError {
                code: EXIT_RUN_PERSISTENCE,
                message: format!(
                    "artifact written but {} new entr{} not persisted: {e}",
                    output.new_entries.len(),
                    if output.new_entries.len() == 1 { "y" } else { "ies" },
                ),
                hint: Some("the workbook is valid; re-run against the same store to retry".into()),
            })?;
            eprintln!("persisted {} new entr{}", output.new_entries.len(),
                if output.new_entries.len() == 1 { "y" } else { "ies" });
        }
    } else if !output.new_entries.is_empty() {
        eprintln!(
            "note: {} new entr{} discovered but no --store given; nothing persisted",
            output.new_entries.len(),
            if output.new_entries.len() == 1 { "y" } else { "ies" },
        );
    }

    Ok(())
}
