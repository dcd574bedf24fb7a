//! Grouping and ranking of merged rows.
//!
//! Groups are collected in a `BTreeMap`, so before the descending sort they
//! are in key order; the sort is stable, which makes equal scores rank by
//! name.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::config::SortBy;
use crate::model::{CampaignFiles, FileSummary, MergedRow, RankedCampaign, RankedFile};

/// Running sum and count, for columns that are either summed or averaged.
#[derive(Debug, Clone, Copy, Default)]
struct Acc {
    sum: f64,
    count: usize,
}

impl Acc {
    fn push(&mut self, v: f64) {
        self.sum += v;
        self.count += 1;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    fn finish(&self, sort_by: SortBy) -> f64 {
        if sort_by.is_sum() {
            self.sum
        } else {
            self.mean()
        }
    }
}

/// The per-row value a sort criterion aggregates.
pub fn metric(row: &MergedRow, sort_by: SortBy) -> f64 {
    match sort_by {
        SortBy::Revenue => row.revenue,
        SortBy::Epc => row.epc,
        SortBy::Cpm => row.cpm,
        SortBy::Performance => row.perf,
    }
}

/// Rank campaigns by `sort_by`, then rank each selected campaign's files.
///
/// `files` is returned in the same order as the ranked campaigns.
pub fn top_campaigns(
    rows: &[MergedRow],
    sort_by: SortBy,
    limit: usize,
    files_per_campaign: usize,
) -> (Vec<RankedCampaign>, Vec<CampaignFiles>) {
    let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.campaign_name.as_str())
            .or_default()
            .push(metric(row, sort_by));
    }

    let mut campaigns: Vec<RankedCampaign> = groups
        .into_iter()
        .map(|(name, acc)| RankedCampaign {
            campaign_name: name.to_string(),
            score: acc.finish(sort_by),
            row_count: acc.count,
        })
        .collect();
    campaigns.sort_by(|a, b| b.score.total_cmp(&a.score));
    campaigns.truncate(limit);

    let files = campaigns
        .iter()
        .map(|c| CampaignFiles {
            campaign_name: c.campaign_name.clone(),
            files: top_files(rows, &c.campaign_name, sort_by, files_per_campaign),
        })
        .collect();

    (campaigns, files)
}

#[derive(Default)]
struct FileAcc {
    metric: Acc,
    cpm: Acc,
    df_count: Option<f64>,
    last_send_date: Option<NaiveDate>,
}

/// Linked files of one campaign; each file counts once (first row wins).
fn top_files(rows: &[MergedRow], campaign: &str, sort_by: SortBy, n: usize) -> Vec<RankedFile> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut groups: BTreeMap<&str, FileAcc> = BTreeMap::new();

    for row in rows {
        if row.campaign_name != campaign || row.matched_datafile.is_empty() {
            continue;
        }
        if !seen.insert(row.matched_datafile.as_str()) {
            continue;
        }
        let acc = groups.entry(row.matched_datafile.as_str()).or_default();
        acc.metric.push(metric(row, sort_by));
        acc.cpm.push(row.cpm);
        acc.df_count = row.df_count;
        acc.last_send_date = row.last_send_date;
    }

    let mut files: Vec<RankedFile> = groups
        .into_iter()
        .map(|(name, acc)| RankedFile {
            matched_datafile: name.to_string(),
            score: acc.metric.finish(sort_by),
            cpm: acc.cpm.mean(),
            df_count: acc.df_count,
            last_send_date: acc.last_send_date,
        })
        .collect();
    files.sort_by(|a, b| b.score.total_cmp(&a.score));
    files.truncate(n);
    files
}

/// Files ranked by summed revenue across every campaign.
///
/// Returns the top `top` summaries and the number of distinct linked files
/// before truncation.
pub fn best_files(rows: &[MergedRow], top: usize) -> (Vec<FileSummary>, usize) {
    #[derive(Default)]
    struct Totals {
        revenue: f64,
        cpm: Acc,
        epc: Acc,
        clicks: f64,
        sent: f64,
    }

    let mut groups: BTreeMap<&str, Totals> = BTreeMap::new();
    for row in rows.iter().filter(|r| !r.matched_datafile.is_empty()) {
        let t = groups.entry(row.matched_datafile.as_str()).or_default();
        t.revenue += row.revenue;
        t.cpm.push(row.cpm);
        t.epc.push(row.epc);
        t.clicks += row.clicks;
        t.sent += row.sent;
    }
    let unique = groups.len();

    let mut summaries: Vec<FileSummary> = groups
        .into_iter()
        .map(|(name, t)| FileSummary {
            matched_datafile: name.to_string(),
            revenue: t.revenue,
            cpm: t.cpm.mean(),
            epc: t.epc.mean(),
            clicks: t.clicks,
            sent: t.sent,
        })
        .collect();
    summaries.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    summaries.truncate(top);

    (summaries, unique)
}

/// Master files with no send inside the trailing window, sorted.
///
/// A send counts as recent when its date (at midnight) is at or after
/// `now - window_days`. Empty names are ignored on both sides.
pub fn unused_files<'a, M, S>(master_files: M, sends: S, window_days: u32, now: NaiveDateTime) -> Vec<String>
where
    M: IntoIterator<Item = &'a str>,
    S: IntoIterator<Item = (&'a str, NaiveDate)>,
{
    let cutoff = now - Duration::days(i64::from(window_days));
    let used: BTreeSet<&str> = sends
        .into_iter()
        .filter(|(file, date)| !file.is_empty() && date.and_time(NaiveTime::MIN) >= cutoff)
        .map(|(file, _)| file)
        .collect();

    let all: BTreeSet<&str> = master_files.into_iter().filter(|f| !f.is_empty()).collect();
    all.difference(&used).map(|f| f.to_string()).collect()
}
