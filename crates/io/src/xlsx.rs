// Master spreadsheets (xlsx, xlsm, xls, xlsb, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use mailrec_pipeline::{Cell, PipelineError, Table};

/// Read the first worksheet. Its first row is the header.
pub fn import(path: &Path) -> Result<Table, PipelineError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| PipelineError::Parse(format!("failed to open {}: {e}", path.display())))?;

    let Some(sheet_name) = workbook.sheet_names().first().cloned() else {
        return Err(PipelineError::Parse(format!("{} contains no sheets", path.display())));
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| PipelineError::Parse(format!("failed to read sheet '{sheet_name}': {e}")))?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        log::warn!("sheet '{sheet_name}' in {} is empty", path.display());
        return Ok(Table::default());
    };
    let columns: Vec<String> = header
        .iter()
        .map(|c| to_cell(c).as_text().unwrap_or_default())
        .collect();

    let body: Vec<Vec<Cell>> = rows
        .map(|r| r.iter().map(to_cell).collect::<Vec<_>>())
        .filter(|r| r.iter().any(|c| *c != Cell::Empty))
        .collect();

    log::info!("read {} rows from sheet '{sheet_name}' of {}", body.len(), path.display());
    Ok(Table::new(columns, body))
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::Bool(*b),
        // Serial day number, 1900 date system.
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}
