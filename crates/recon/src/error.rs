use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad fiscal month, empty section list, etc.).
    ConfigValidation(String),
    /// A required sheet is absent from one of the three inputs.
    MissingSheet { role: String, sheet: String },
    /// The header row (or required columns within it) could not be located.
    MissingHeader { sheet: String, columns: Vec<String> },
    /// The Summary sheet lists no clubs below its header.
    NoClubs { sheet: String },
    /// A review operation referenced an entry the store does not have.
    EntryNotFound { id: i64 },
    /// A review operation targeted an entry that is not awaiting review.
    NotNeedsReview { id: i64 },
    /// A review or manual-entry operation named a club the Summary sheet
    /// does not list.
    ClubNotFound { club: String },
    /// A manual entry reused a journal reference that is already recorded.
    DuplicateRef { reference: String },
    /// Persistence gateway failure.
    Store(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingSheet { role, sheet } => {
                write!(f, "{role} input: sheet '{sheet}' not found")
            }
            Self::MissingHeader { sheet, columns } => {
                write!(
                    f,
                    "sheet '{sheet}': header row with required column(s) {} not found",
                    columns
                        .iter()
                        .map(|c| format!("'{c}'"))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            Self::NoClubs { sheet } => {
                write!(f, "sheet '{sheet}': no club rows found below the header")
            }
            Self::EntryNotFound { id } => write!(f, "entry {id} not found"),
            Self::NotNeedsReview { id } => {
                write!(f, "entry {id} is not awaiting review")
            }
            Self::ClubNotFound { club } => {
                write!(f, "club '{club}' is not listed on the Summary sheet")
            }
            Self::DuplicateRef { reference } => {
                write!(f, "journal reference '{reference}' is already recorded")
            }
            Self::Store(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
