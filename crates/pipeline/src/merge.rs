//! Three-way join of report, campaign registry and master file list.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::config::{JoinKind, PipelineConfig, RecencyKey};
use crate::linker::{link, Candidates};
use crate::model::{CampaignRecord, LinkedReport, MasterFileRecord, MergedRow, ReportRecord};
use crate::normalize::Normalizer;

/// Pre-loaded, typed source tables for one request.
#[derive(Debug, Clone, Default)]
pub struct PipelineInput {
    pub report: Vec<ReportRecord>,
    pub campaigns: Vec<CampaignRecord>,
    pub master: Vec<MasterFileRecord>,
}

/// Attach `matched_datafile` / `match_score` to every report record.
///
/// Report names are normalized with the configured sponsor tags; candidates
/// are the distinct non-empty `Data File Clean` values.
pub fn link_report(
    report: &[ReportRecord],
    master: &[MasterFileRecord],
    config: &PipelineConfig,
) -> Vec<LinkedReport> {
    let normalizer = Normalizer::new(&config.sponsors);
    let candidates = Candidates::new(master.iter().map(|m| m.data_file_clean.as_str()));

    let cleaned: Vec<String> = report
        .iter()
        .map(|r| normalizer.normalize(&r.original_datafile))
        .collect();
    let matches = link(&cleaned, &candidates, config.threshold);

    report
        .iter()
        .zip(cleaned)
        .zip(matches)
        .map(|((record, clean), m)| LinkedReport {
            record: record.clone(),
            original_datafile_clean: clean,
            matched_datafile: m.matched,
            match_score: m.score,
        })
        .collect()
}

/// Join linked report rows to campaigns (by name) and master files (by
/// matched name), then fill `last_send_date` and the rate metrics.
///
/// Duplicate keys on the right-hand side fan out, one output row per
/// matching pair. Unlinked rows never join a master record.
pub fn merge(
    linked: &[LinkedReport],
    campaigns: &[CampaignRecord],
    master: &[MasterFileRecord],
    join: JoinKind,
    recency: RecencyKey,
) -> Vec<MergedRow> {
    let mut campaigns_by_name: HashMap<&str, Vec<&CampaignRecord>> = HashMap::new();
    for c in campaigns {
        campaigns_by_name.entry(c.campaign_name.as_str()).or_default().push(c);
    }
    let mut master_by_clean: HashMap<&str, Vec<&MasterFileRecord>> = HashMap::new();
    for m in master {
        if !m.data_file_clean.is_empty() {
            master_by_clean.entry(m.data_file_clean.as_str()).or_default().push(m);
        }
    }

    let mut rows = Vec::with_capacity(linked.len());
    for l in linked {
        let campaign_matches: Vec<Option<&CampaignRecord>> =
            match campaigns_by_name.get(l.record.campaign_name.as_str()) {
                Some(found) => found.iter().map(|c| Some(*c)).collect(),
                None => match join {
                    JoinKind::Inner => continue,
                    JoinKind::Left => vec![None],
                },
            };

        let master_matches: Vec<Option<&MasterFileRecord>> = if l.is_linked() {
            match master_by_clean.get(l.matched_datafile.as_str()) {
                Some(found) => found.iter().map(|m| Some(*m)).collect(),
                None => vec![None],
            }
        } else {
            vec![None]
        };

        for campaign in &campaign_matches {
            for master_row in &master_matches {
                rows.push(merged_row(l, *campaign, *master_row));
            }
        }
    }

    fill_last_send_date(&mut rows, recency);

    log::info!(
        "merged {} report rows into {} rows ({} campaigns, {} master files)",
        linked.len(),
        rows.len(),
        campaigns.len(),
        master.len(),
    );

    rows
}

fn merged_row(
    l: &LinkedReport,
    campaign: Option<&CampaignRecord>,
    master: Option<&MasterFileRecord>,
) -> MergedRow {
    let r = &l.record;
    MergedRow {
        campaign_name: r.campaign_name.clone(),
        original_datafile: r.original_datafile.clone(),
        original_datafile_clean: l.original_datafile_clean.clone(),
        matched_datafile: l.matched_datafile.clone(),
        match_score: l.match_score,
        offer_date: r.offer_date,
        clicks: r.clicks,
        sent: r.sent,
        revenue: r.revenue,
        cpm: r.cpm,
        campaign_id: campaign.and_then(|c| c.campaign_id.clone()),
        sponsor: campaign.and_then(|c| c.sponsor.clone()),
        category: campaign.and_then(|c| c.category.clone()),
        data_file: master.map(|m| m.data_file.clone()),
        isp_name: master.and_then(|m| m.isp_name.clone()),
        file_series: master.and_then(|m| m.file_series.clone()),
        df_count: master.and_then(|m| m.df_count),
        last_send_date: None,
        epc: r.revenue / r.clicks.max(1.0),
        engagement: r.clicks / r.sent.max(1.0) * 100.0,
        perf: r.revenue / r.sent.max(1.0),
    }
}

/// Max `offer_date` per recency key, broadcast back onto every row that
/// shares the key. Rows with an empty campaign, an unlinked file or no
/// date do not contribute.
fn fill_last_send_date(rows: &mut [MergedRow], recency: RecencyKey) {
    let key = |row: &MergedRow| -> Option<(String, String)> {
        if row.matched_datafile.is_empty() {
            return None;
        }
        match recency {
            RecencyKey::CampaignAndFile if row.campaign_name.is_empty() => None,
            RecencyKey::CampaignAndFile => {
                Some((row.campaign_name.clone(), row.matched_datafile.clone()))
            }
            RecencyKey::File => Some((String::new(), row.matched_datafile.clone())),
        }
    };

    let mut latest: HashMap<(String, String), NaiveDate> = HashMap::new();
    for row in rows.iter() {
        let (Some(k), Some(date)) = (key(row), row.offer_date) else {
            continue;
        };
        latest
            .entry(k)
            .and_modify(|d| {
                if date > *d {
                    *d = date;
                }
            })
            .or_insert(date);
    }

    for row in rows.iter_mut() {
        row.last_send_date = key(row).and_then(|k| latest.get(&k).copied());
    }
}
