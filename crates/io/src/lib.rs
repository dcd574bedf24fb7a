//! Source loading: API envelopes and master spreadsheets into [`Table`]s.

pub mod csv;
pub mod json;
pub mod xlsx;

use std::path::Path;

use mailrec_pipeline::{PipelineError, Table};

/// Spreadsheet formats read through calamine.
const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Load the master data-file list, dispatching on the file extension.
pub fn load_master(path: &Path) -> Result<Table, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::SourceUnavailable(format!(
            "master data file not found at {}",
            path.display()
        )));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let table = match ext.as_str() {
        e if SPREADSHEET_EXTENSIONS.contains(&e) => xlsx::import(path)?,
        "csv" | "txt" => csv::import(path)?,
        "tsv" => csv::import_tsv(path)?,
        other => {
            return Err(PipelineError::Parse(format!(
                "unsupported master file format '.{other}' (expected xlsx, xls, xlsb, ods, csv or tsv)"
            )))
        }
    };

    log::info!("loaded {} master rows from {}", table.len(), path.display());
    Ok(table)
}
