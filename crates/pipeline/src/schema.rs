//! Mapping of loosely-typed source tables onto the fixed record types.
//!
//! Required columns missing from a table are a [`PipelineError::Schema`];
//! optional columns default per column (numbers to 0, text and dates to
//! `None`).

use chrono::NaiveDate;

use crate::error::PipelineError;
use crate::model::{CampaignRecord, MasterFileRecord, ReportRecord};
use crate::normalize::Normalizer;
use crate::table::{parse_day_first, parse_offer_date, Table};

pub const REPORT: &str = "report";
pub const CAMPAIGN: &str = "campaign";
pub const MASTER: &str = "master";

/// Column names accepted, in order, as the send date of the unused-files view.
pub const DATE_COLUMNS: &[&str] = &["date", "offer_date", "Offer Date", "after_suppression_date", "created_at"];

fn required(table: &Table, table_name: &str, column: &str) -> Result<usize, PipelineError> {
    table
        .column_index(column)
        .ok_or_else(|| PipelineError::schema(table_name, column))
}

fn text_at(table: &Table, row: usize, col: Option<usize>) -> Option<String> {
    col.and_then(|c| table.cell(row, c).as_text())
}

fn number_at(table: &Table, row: usize, col: Option<usize>) -> f64 {
    col.map_or(0.0, |c| table.cell(row, c).as_f64())
}

/// Join-key form of a campaign name.
pub fn campaign_key(raw: &str) -> String {
    raw.to_lowercase().trim().to_string()
}

pub fn report_records(table: &Table) -> Result<Vec<ReportRecord>, PipelineError> {
    let name_idx = required(table, REPORT, "campaign_name")?;
    let file_idx = required(table, REPORT, "original_datafile")?;
    let date_idx = table.column_index("offer_date");
    let clicks_idx = table.column_index("clicks");
    let sent_idx = table.column_index("sent");
    let revenue_idx = table.column_index("revenue");
    let cpm_idx = table.column_index("cpm");

    let records = (0..table.len())
        .map(|row| ReportRecord {
            campaign_name: campaign_key(&text_at(table, row, Some(name_idx)).unwrap_or_default()),
            original_datafile: text_at(table, row, Some(file_idx)).unwrap_or_default(),
            offer_date: text_at(table, row, date_idx).and_then(|s| parse_offer_date(&s)),
            clicks: number_at(table, row, clicks_idx),
            sent: number_at(table, row, sent_idx),
            revenue: number_at(table, row, revenue_idx),
            cpm: number_at(table, row, cpm_idx),
        })
        .collect();
    Ok(records)
}

pub fn campaign_records(table: &Table) -> Result<Vec<CampaignRecord>, PipelineError> {
    let name_idx = required(table, CAMPAIGN, "campaign_name")?;
    let id_idx = table.column_index("campaign_id");
    let sponsor_idx = table.column_index("sponsor");
    let category_idx = table.column_index("category");

    let records = (0..table.len())
        .map(|row| CampaignRecord {
            campaign_id: text_at(table, row, id_idx),
            campaign_name: campaign_key(&text_at(table, row, Some(name_idx)).unwrap_or_default()),
            sponsor: text_at(table, row, sponsor_idx),
            category: text_at(table, row, category_idx),
        })
        .collect();
    Ok(records)
}

/// Master rows, with `Data File Clean` computed without tag stripping.
pub fn master_records(table: &Table) -> Result<Vec<MasterFileRecord>, PipelineError> {
    let file_idx = required(table, MASTER, "Data File")?;
    let isp_idx = table.column_index("ISP Name");
    let series_idx = table.column_index("File Series");
    let count_idx = table.column_index("DF Count");
    let plain = Normalizer::plain();

    let records = (0..table.len())
        .map(|row| {
            let data_file = text_at(table, row, Some(file_idx)).unwrap_or_default();
            MasterFileRecord {
                data_file_clean: plain.normalize(&data_file),
                data_file,
                isp_name: text_at(table, row, isp_idx),
                file_series: text_at(table, row, series_idx),
                df_count: count_idx.and_then(|c| table.cell(row, c).as_opt_f64()),
            }
        })
        .collect();
    Ok(records)
}

/// Per-row send dates for the unused-files view.
///
/// Uses the first column of [`DATE_COLUMNS`] present in the table, parsed
/// day-first. Unparseable dates come back as `None`.
pub fn send_dates(table: &Table) -> Result<Vec<Option<NaiveDate>>, PipelineError> {
    let Some(col) = DATE_COLUMNS.iter().find_map(|c| table.column_index(c)) else {
        return Err(PipelineError::schema(REPORT, "date"));
    };
    Ok((0..table.len())
        .map(|row| text_at(table, row, Some(col)).and_then(|s| parse_day_first(&s)))
        .collect())
}
