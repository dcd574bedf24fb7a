//! Caller-supplied row predicates, applied before aggregation.
//!
//! Every predicate is independent; a row is kept only if all active
//! predicates accept it, so application order never matters.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::model::MergedRow;

/// Selection sentinel meaning "no filter".
pub const ALL: &str = "All";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RowFilter {
    /// Keep rows with `engagement >= min_engagement` (percent). Off when 0.
    #[serde(default)]
    pub min_engagement: f64,
    /// Case-insensitive substring of the campaign name. Off when empty.
    #[serde(default)]
    pub campaign_contains: String,
    #[serde(default)]
    pub sponsor: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub isp: Option<String>,
    /// Drop rows last sent within this many days. Off when 0.
    #[serde(default)]
    pub exclude_recent_days: u32,
}

/// The active value of a selection, or `None` for empty / `All`.
pub fn selection(value: &Option<String>) -> Option<&str> {
    match value.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(v) if v.eq_ignore_ascii_case(ALL) => None,
        Some(v) => Some(v),
    }
}

fn selected(filter: &Option<String>, actual: &Option<String>) -> bool {
    match selection(filter) {
        None => true,
        Some(want) => actual.as_deref() == Some(want),
    }
}

impl RowFilter {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether `row` passes every active predicate as of `now`.
    pub fn matches(&self, row: &MergedRow, now: NaiveDateTime) -> bool {
        if self.min_engagement > 0.0 && row.engagement < self.min_engagement {
            return false;
        }

        let needle = self.campaign_contains.trim().to_lowercase();
        if !needle.is_empty() && !row.campaign_name.to_lowercase().contains(&needle) {
            return false;
        }

        if !selected(&self.sponsor, &row.sponsor)
            || !selected(&self.category, &row.category)
            || !selected(&self.isp, &row.isp_name)
        {
            return false;
        }

        if self.exclude_recent_days > 0 {
            if let Some(last) = row.last_send_date {
                let cutoff = now - Duration::days(i64::from(self.exclude_recent_days));
                // Never-sent rows stay eligible.
                if last.and_time(NaiveTime::MIN) >= cutoff {
                    return false;
                }
            }
        }

        true
    }

    pub fn apply(&self, rows: Vec<MergedRow>, now: NaiveDateTime) -> Vec<MergedRow> {
        if self.is_empty() {
            return rows;
        }
        let before = rows.len();
        let kept: Vec<MergedRow> = rows.into_iter().filter(|r| self.matches(r, now)).collect();
        log::info!("filters kept {}/{} rows", kept.len(), before);
        kept
    }
}
