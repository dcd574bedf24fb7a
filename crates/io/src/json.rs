// JSON `{"data": [...]}` envelopes returned by the report and campaign APIs

use std::path::Path;

use serde_json::{Map, Value};

use mailrec_pipeline::{Cell, PipelineError, Table};

/// Parse an API body of the form `{"data": [{...}, {...}]}`.
///
/// Columns are the union of every object's keys, in first-seen order. A key
/// missing from a row reads as [`Cell::Empty`].
pub fn parse_envelope(body: &str) -> Result<Table, PipelineError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| PipelineError::Parse(format!("invalid JSON: {e}")))?;

    let records = match value.get("data") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(PipelineError::Parse("'data' is not an array".into())),
        None => return Err(PipelineError::Parse("response has no 'data' field".into())),
    };

    let mut columns: Vec<String> = Vec::new();
    let mut objects: Vec<&Map<String, Value>> = Vec::with_capacity(records.len());
    for (i, item) in records.iter().enumerate() {
        let Value::Object(obj) = item else {
            return Err(PipelineError::Parse(format!("data[{i}] is not an object")));
        };
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .iter()
        .map(|obj| columns.iter().map(|c| obj.get(c).map_or(Cell::Empty, to_cell)).collect())
        .collect();

    Ok(Table::new(columns, rows))
}

pub fn read_envelope(path: &Path) -> Result<Table, PipelineError> {
    let body = std::fs::read_to_string(path)
        .map_err(|e| PipelineError::Io(format!("{}: {e}", path.display())))?;
    parse_envelope(&body)
}

fn to_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Empty,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => n.as_f64().map_or(Cell::Empty, Cell::Number),
        Value::String(s) => Cell::Text(s.clone()),
        // Nested values are kept as their JSON text.
        other => Cell::Text(other.to_string()),
    }
}
