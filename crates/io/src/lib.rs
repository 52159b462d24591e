// Spreadsheet serialization for the reconciliation engine

pub mod xlsx;
