//! Use-case entry points. Each one maps raw tables to records, runs the
//! pipeline and converts any failure into an [`Outcome`] at the boundary.

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::aggregate::{best_files, top_campaigns, unused_files};
use crate::config::{JoinKind, PipelineConfig, RecencyKey, SortBy};
use crate::error::PipelineError;
use crate::filter::{selection, RowFilter, ALL};
use crate::merge::{link_report, merge, PipelineInput};
use crate::model::{
    BestFiles, FilterOptions, MasterFileRecord, Outcome, Recommendations, UnusedFiles, UnusedSummary,
};
use crate::schema;
use crate::table::Table;

pub const NO_DATA_MESSAGE: &str = "No data found for the selected filters.";

/// The three source tables as fetched, before schema mapping.
#[derive(Debug, Clone, Default)]
pub struct SourceTables {
    pub report: Table,
    pub campaigns: Table,
    pub master: Table,
}

impl PipelineInput {
    pub fn from_tables(tables: &SourceTables) -> Result<Self, PipelineError> {
        Ok(Self {
            report: schema::report_records(&tables.report)?,
            campaigns: schema::campaign_records(&tables.campaigns)?,
            master: schema::master_records(&tables.master)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub campaign_contains: String,
    /// Percent.
    #[serde(default)]
    pub min_engagement: f64,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_files_per_campaign")]
    pub files_per_campaign: usize,
}

fn default_limit() -> usize {
    10
}

fn default_files_per_campaign() -> usize {
    5
}

impl Default for RecommendRequest {
    fn default() -> Self {
        Self {
            campaign_contains: String::new(),
            min_engagement: 0.0,
            sort_by: SortBy::default(),
            limit: default_limit(),
            files_per_campaign: default_files_per_campaign(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BestFilesRequest {
    #[serde(default)]
    pub sponsor: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub isp: Option<String>,
    /// 0 disables recency exclusion.
    #[serde(default)]
    pub exclude_days: u32,
    #[serde(default = "default_top")]
    pub top: usize,
}

fn default_top() -> usize {
    15
}

impl Default for BestFilesRequest {
    fn default() -> Self {
        Self { sponsor: None, category: None, isp: None, exclude_days: 0, top: default_top() }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct UnusedRequest {
    /// Empty means "options only": no campaign is evaluated.
    #[serde(default)]
    pub campaign_id: String,
    #[serde(default)]
    pub isp: Option<String>,
    #[serde(default)]
    pub file_series: Option<String>,
    #[serde(default = "default_window_days")]
    pub window_days: u32,
}

fn default_window_days() -> u32 {
    15
}

impl Default for UnusedRequest {
    fn default() -> Self {
        Self { campaign_id: String::new(), isp: None, file_series: None, window_days: default_window_days() }
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// Ranked campaigns and their best linked files.
pub fn recommend(
    tables: &SourceTables,
    request: &RecommendRequest,
    config: &PipelineConfig,
    now: NaiveDateTime,
) -> Outcome<Recommendations> {
    Outcome::from_result(try_recommend(tables, request, config, now))
}

fn try_recommend(
    tables: &SourceTables,
    request: &RecommendRequest,
    config: &PipelineConfig,
    now: NaiveDateTime,
) -> Result<Recommendations, PipelineError> {
    config.validate()?;
    let input = PipelineInput::from_tables(tables)?;

    let linked = link_report(&input.report, &input.master, config);
    let rows = merge(&linked, &input.campaigns, &input.master, JoinKind::Inner, RecencyKey::CampaignAndFile);

    let filter = RowFilter {
        min_engagement: request.min_engagement,
        campaign_contains: request.campaign_contains.clone(),
        ..Default::default()
    };
    let rows = filter.apply(rows, now);

    let (campaigns, files) = top_campaigns(&rows, request.sort_by, request.limit, request.files_per_campaign);
    let campaign_options = rows
        .iter()
        .map(|r| r.campaign_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    Ok(Recommendations {
        sort_by: request.sort_by.to_string(),
        campaigns,
        files,
        campaign_options,
    })
}

// ---------------------------------------------------------------------------
// Best files
// ---------------------------------------------------------------------------

/// Files ranked by revenue across all campaigns, under the selected filters.
///
/// An empty ranking is not an error; it carries [`NO_DATA_MESSAGE`].
pub fn best_files_view(
    tables: &SourceTables,
    request: &BestFilesRequest,
    config: &PipelineConfig,
    now: NaiveDateTime,
) -> Outcome<BestFiles> {
    let outcome = Outcome::from_result(try_best_files(tables, request, config, now));
    if !outcome.is_error() && outcome.result.results.is_empty() {
        return outcome.with_message(NO_DATA_MESSAGE);
    }
    outcome
}

fn try_best_files(
    tables: &SourceTables,
    request: &BestFilesRequest,
    config: &PipelineConfig,
    now: NaiveDateTime,
) -> Result<BestFiles, PipelineError> {
    config.validate()?;
    let input = PipelineInput::from_tables(tables)?;

    let linked = link_report(&input.report, &input.master, config);
    // Only the ISP is needed from master here, one row per (file, ISP).
    let isp_master = distinct_file_isp(&input.master);
    let rows = merge(&linked, &input.campaigns, &isp_master, JoinKind::Left, RecencyKey::File);

    let filter = RowFilter {
        sponsor: request.sponsor.clone(),
        category: request.category.clone(),
        isp: request.isp.clone(),
        exclude_recent_days: request.exclude_days,
        ..Default::default()
    };
    let rows = filter.apply(rows, now);

    let (results, unique_files) = best_files(&rows, request.top);
    let best_file = results.first().map(|f| f.matched_datafile.clone());

    Ok(BestFiles {
        results,
        best_file,
        record_count: rows.len(),
        unique_files,
        filters: FilterOptions {
            sponsors: with_all(input.campaigns.iter().filter_map(|c| c.sponsor.clone())),
            categories: with_all(input.campaigns.iter().filter_map(|c| c.category.clone())),
            isps: with_all(input.master.iter().filter_map(|m| m.isp_name.clone())),
        },
    })
}

fn distinct_file_isp(master: &[MasterFileRecord]) -> Vec<MasterFileRecord> {
    let mut seen: HashSet<(String, Option<String>)> = HashSet::new();
    master
        .iter()
        .filter(|m| seen.insert((m.data_file_clean.clone(), m.isp_name.clone())))
        .map(|m| MasterFileRecord {
            data_file: m.data_file.clone(),
            data_file_clean: m.data_file_clean.clone(),
            isp_name: m.isp_name.clone(),
            file_series: None,
            df_count: None,
        })
        .collect()
}

fn sorted_distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    values
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn with_all(values: impl Iterator<Item = String>) -> Vec<String> {
    std::iter::once(ALL.to_string()).chain(sorted_distinct(values)).collect()
}

// ---------------------------------------------------------------------------
// Unused files
// ---------------------------------------------------------------------------

/// Master files a campaign has not used within the trailing window.
///
/// With an empty `campaign_id` only the option lists are filled.
pub fn unused_view(
    tables: &SourceTables,
    request: &UnusedRequest,
    config: &PipelineConfig,
    now: NaiveDateTime,
) -> Outcome<UnusedFiles> {
    Outcome::from_result(try_unused(tables, request, config, now))
}

fn try_unused(
    tables: &SourceTables,
    request: &UnusedRequest,
    config: &PipelineConfig,
    now: NaiveDateTime,
) -> Result<UnusedFiles, PipelineError> {
    config.validate()?;
    let input = PipelineInput::from_tables(tables)?;
    let dates = schema::send_dates(&tables.report)?;

    let mut out = UnusedFiles {
        isp_options: sorted_distinct(input.master.iter().filter_map(|m| m.isp_name.clone())),
        file_series_options: sorted_distinct(input.master.iter().filter_map(|m| m.file_series.clone())),
        ..Default::default()
    };

    let campaign_id = request.campaign_id.trim();
    if campaign_id.is_empty() {
        return Ok(out);
    }
    let campaign = input
        .campaigns
        .iter()
        .find(|c| c.campaign_id.as_deref() == Some(campaign_id))
        .ok_or_else(|| PipelineError::InvalidRequest(format!("no campaign found with id {campaign_id}")))?;

    // Rows without a usable date take no part in this view.
    let (dated, dropped): (Vec<_>, Vec<_>) = input
        .report
        .into_iter()
        .zip(dates)
        .partition(|(_, date)| date.is_some());
    if !dropped.is_empty() {
        log::warn!("dropped {} report rows with no parseable send date", dropped.len());
    }
    let (records, dates): (Vec<_>, Vec<_>) = dated.into_iter().unzip();

    let linked = link_report(&records, &input.master, config);
    let sends: Vec<(&str, chrono::NaiveDate)> = linked
        .iter()
        .zip(dates.iter())
        .filter(|(l, _)| l.record.campaign_name == campaign.campaign_name)
        .filter_map(|(l, d)| d.map(|d| (l.matched_datafile.as_str(), d)))
        .collect();

    let candidates = input.master.iter().filter(|m| {
        selection(&request.isp).map_or(true, |isp| m.isp_name.as_deref() == Some(isp))
            && selection(&request.file_series).map_or(true, |s| m.file_series.as_deref() == Some(s))
    });
    let unused = unused_files(
        candidates.map(|m| m.data_file_clean.as_str()),
        sends,
        request.window_days,
        now,
    );

    log::info!(
        "campaign '{}': {} unused files in the last {} days",
        campaign.campaign_name,
        unused.len(),
        request.window_days,
    );

    out.summary = Some(UnusedSummary {
        campaign_id: campaign_id.to_string(),
        campaign_name: campaign.campaign_name.clone(),
        days: request.window_days,
        count: unused.len(),
    });
    out.unused_datafiles = unused;
    Ok(out)
}
