//! Loosely-typed tabular input, as handed over by the I/O layer.
//!
//! Sources disagree on types (a `campaign_id` may arrive as `42` or `"42"`,
//! `revenue` as `"1,204.50"`), so cells stay untyped until schema mapping
//! coerces them with the helpers below.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Numeric coercion. Anything that is not a finite number becomes 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            Cell::Number(n) if n.is_finite() => *n,
            Cell::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0)
            }
            _ => 0.0,
        }
    }

    /// Numeric value when the cell actually holds one, `None` otherwise.
    pub fn as_opt_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        }
    }

    /// Text coercion. Integral numbers print without a decimal part.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(format!("{n}"))
                }
            }
            Cell::Bool(b) => Some(if *b { "true" } else { "false" }.to_string()),
        }
    }
}

/// Column names plus rows of cells. Rows shorter than the header are
/// padded with [`Cell::Empty`] on read.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, trimming whitespace around every column name.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let columns = columns.into_iter().map(|c| c.trim().to_string()).collect();
        Self { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at (`row`, `col`), `Empty` when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows.get(row).and_then(|r| r.get(col)).unwrap_or(EMPTY)
    }
}

/// Parse an `offer_date` in strict `DD-MM-YYYY` form.
pub fn parse_offer_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%d-%m-%Y").ok()
}

const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"];
const ZONED_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];
const DAY_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%d-%m-%Y %H:%M:%S%.f",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Lenient day-first date parsing. The time of day, if any, is dropped.
///
/// Zoned timestamps keep the calendar date of their own offset, whichever
/// side of UTC it is on.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DAY_FIRST_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ZONED_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.date_naive());
        }
    }
    let naive = s.strip_suffix(['Z', 'z']).unwrap_or(s);
    for fmt in DAY_FIRST_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(dt.date());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_coercion() {
        assert_eq!(Cell::Number(12.5).as_f64(), 12.5);
        assert_eq!(Cell::Text(" 1,204.50 ".into()).as_f64(), 1204.5);
        assert_eq!(Cell::Text("n/a".into()).as_f64(), 0.0);
        assert_eq!(Cell::Empty.as_f64(), 0.0);
        assert_eq!(Cell::Number(f64::NAN).as_f64(), 0.0);
        assert_eq!(Cell::Text("".into()).as_opt_f64(), None);
    }

    #[test]
    fn text_coercion() {
        assert_eq!(Cell::Number(42.0).as_text().as_deref(), Some("42"));
        assert_eq!(Cell::Number(4.5).as_text().as_deref(), Some("4.5"));
        assert_eq!(Cell::Bool(true).as_text().as_deref(), Some("true"));
        assert_eq!(Cell::Empty.as_text(), None);
    }

    #[test]
    fn header_whitespace_is_trimmed() {
        let t = Table::new(vec![" Data File ".into(), "ISP Name".into()], vec![]);
        assert_eq!(t.column_index("Data File"), Some(0));
        assert!(t.has_column("ISP Name"));
    }

    #[test]
    fn short_rows_read_as_empty() {
        let t = Table::new(vec!["a".into(), "b".into()], vec![vec![Cell::Number(1.0)]]);
        assert_eq!(t.cell(0, 1), &Cell::Empty);
        assert_eq!(t.cell(5, 0), &Cell::Empty);
    }

    #[test]
    fn offer_date_is_strict() {
        assert_eq!(parse_offer_date("05-03-2024"), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(parse_offer_date("2024-03-05"), None);
        assert_eq!(parse_offer_date(""), None);
    }

    #[test]
    fn day_first_accepts_common_shapes() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5);
        assert_eq!(parse_day_first("05-03-2024"), d);
        assert_eq!(parse_day_first("05/03/2024"), d);
        assert_eq!(parse_day_first("2024-03-05"), d);
        assert_eq!(parse_day_first("2024-03-05T10:11:12.123Z"), d);
        assert_eq!(parse_day_first("2024-03-05 10:11:12"), d);
        assert_eq!(parse_day_first("yesterday"), None);
    }

    #[test]
    fn day_first_drops_offsets_on_either_side_of_utc() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5);
        assert_eq!(parse_day_first("2024-03-05T10:11:12+05:30"), d);
        assert_eq!(parse_day_first("2024-03-05T10:11:12-05:00"), d);
        assert_eq!(parse_day_first("2024-03-05T10:11:12.500-08:00"), d);
        assert_eq!(parse_day_first("2024-03-05 10:11:12-0500"), d);
        assert_eq!(parse_day_first("2024-03-05T10:11:12Z"), d);
        // The offset's own calendar day, not the UTC one.
        assert_eq!(parse_day_first("2024-03-05T22:00:00-05:00"), d);
    }

    #[test]
    fn day_first_accepts_minutes_without_seconds() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 5);
        assert_eq!(parse_day_first("2024-03-05 10:11"), d);
        assert_eq!(parse_day_first("05-03-2024 10:11"), d);
        assert_eq!(parse_day_first("05/03/2024 10:11"), d);
        assert_eq!(parse_day_first("2024-03-05T10:11"), d);
    }
}
