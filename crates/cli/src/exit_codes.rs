//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | run              | Reconciliation run codes                 |
//! | 10-19   | review           | Review queue / manual entry codes        |
//! | 20-29   | store            | Persistence gateway codes                |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (3-9)
// =============================================================================

/// Structural failure in an input workbook (missing sheet, missing
/// header columns). No artifact is produced.
pub const EXIT_RUN_INPUT: u8 = 3;

/// The merged artifact could not be written.
pub const EXIT_RUN_EXPORT: u8 = 4;

/// The artifact was written but the store commit failed: persisted state
/// and workbook state may have diverged.
pub const EXIT_RUN_PERSISTENCE: u8 = 5;

// =============================================================================
// Review / manual entry (10-19)
// =============================================================================

/// Entry id not present in the store.
pub const EXIT_REVIEW_NOT_FOUND: u8 = 10;

/// Entry exists but is not awaiting review.
pub const EXIT_REVIEW_STATE: u8 = 11;

/// The named club is not listed on the Summary sheet.
pub const EXIT_REVIEW_CLUB: u8 = 12;

/// Manual entry reused a journal reference that already exists.
pub const EXIT_REVIEW_DUPLICATE: u8 = 13;

/// The store was updated but the artifact write failed afterwards:
/// workbook and store may have diverged.
pub const EXIT_REVIEW_DIVERGED: u8 = 14;

// =============================================================================
// Store (20-29)
// =============================================================================

/// Persistence gateway failure (cannot open, read, or write the store).
pub const EXIT_STORE: u8 = 20;
