// Delimited text master files (.csv, .tsv)

use std::io::Read;
use std::path::Path;

use mailrec_pipeline::{Cell, PipelineError, Table};

/// Read a delimited file, guessing the delimiter from its first lines.
pub fn import(path: &Path) -> Result<Table, PipelineError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = guess_delimiter(&content);
    parse(&content, delimiter)
}

pub fn import_tsv(path: &Path) -> Result<Table, PipelineError> {
    let content = read_file_as_utf8(path)?;
    parse(&content, b'\t')
}

/// Pick the delimiter that splits the header into the most fields while
/// keeping the same field count on the sample lines that follow.
fn guess_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    let field_count = |line: &str, delim: u8| -> usize {
        csv::ReaderBuilder::new()
            .delimiter(delim)
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes())
            .records()
            .next()
            .and_then(|r| r.ok())
            .map_or(1, |r| r.len())
    };

    let mut best = (b',', 0usize);
    for delim in [b',', b';', b'\t', b'|'] {
        let Some(header) = sample.first() else { break };
        let width = field_count(*header, delim);
        if width <= 1 {
            continue;
        }
        let agreeing = sample.iter().filter(|&&l| field_count(l, delim) == width).count();
        let score = agreeing * width;
        if score > best.1 {
            best = (delim, score);
        }
    }
    best.0
}

/// File contents as UTF-8, decoding as Windows-1252 when the bytes are not
/// valid UTF-8 (spreadsheet exports often are not).
pub fn read_file_as_utf8(path: &Path) -> Result<String, PipelineError> {
    let mut bytes = Vec::new();
    std::fs::File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|e| PipelineError::Io(format!("{}: {e}", path.display())))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(e.as_bytes());
            Ok(decoded.into_owned())
        }
    }
}

/// First record is the header; every field becomes a text cell.
pub fn parse(content: &str, delimiter: u8) -> Result<Table, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.trim_start_matches('\u{feff}').as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::Parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PipelineError::Parse(e.to_string()))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(
            record
                .iter()
                .map(|f| if f.is_empty() { Cell::Empty } else { Cell::Text(f.to_string()) })
                .collect(),
        );
    }

    Ok(Table::new(columns, rows))
}
