use chrono::NaiveDate;
use serde::Serialize;

use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Input records
// ---------------------------------------------------------------------------

/// One observed send event from the performance report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRecord {
    /// Lower-cased, trimmed.
    pub campaign_name: String,
    pub original_datafile: String,
    pub offer_date: Option<NaiveDate>,
    pub clicks: f64,
    pub sent: f64,
    pub revenue: f64,
    pub cpm: f64,
}

/// One campaign definition from the campaign registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignRecord {
    pub campaign_id: Option<String>,
    /// Lower-cased, trimmed (join key).
    pub campaign_name: String,
    pub sponsor: Option<String>,
    pub category: Option<String>,
}

/// One canonical data-file definition from the master spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterFileRecord {
    pub data_file: String,
    /// `data_file` normalized with no tag stripping.
    pub data_file_clean: String,
    pub isp_name: Option<String>,
    pub file_series: Option<String>,
    pub df_count: Option<f64>,
}

/// A report record after fuzzy linkage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedReport {
    pub record: ReportRecord,
    /// `original_datafile` normalized with tag stripping.
    pub original_datafile_clean: String,
    /// `""` when nothing scored at or above the threshold.
    pub matched_datafile: String,
    pub match_score: f64,
}

impl LinkedReport {
    pub fn is_linked(&self) -> bool {
        !self.matched_datafile.is_empty()
    }
}

/// Result of the three-way join plus derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub campaign_name: String,
    pub original_datafile: String,
    pub original_datafile_clean: String,
    pub matched_datafile: String,
    pub match_score: f64,
    pub offer_date: Option<NaiveDate>,
    pub clicks: f64,
    pub sent: f64,
    pub revenue: f64,
    pub cpm: f64,

    // Campaign side (absent on a left join miss)
    pub campaign_id: Option<String>,
    pub sponsor: Option<String>,
    pub category: Option<String>,

    // Master side (absent when unlinked or on a join miss)
    pub data_file: Option<String>,
    pub isp_name: Option<String>,
    pub file_series: Option<String>,
    pub df_count: Option<f64>,

    pub last_send_date: Option<NaiveDate>,

    // Derived
    pub epc: f64,
    pub engagement: f64,
    pub perf: f64,
}

// ---------------------------------------------------------------------------
// Output: recommendations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCampaign {
    pub campaign_name: String,
    /// Aggregated sort metric (sum of revenue, or a mean).
    pub score: f64,
    pub row_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFile {
    pub matched_datafile: String,
    /// Aggregated sort metric.
    pub score: f64,
    pub cpm: f64,
    pub df_count: Option<f64>,
    pub last_send_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignFiles {
    pub campaign_name: String,
    pub files: Vec<RankedFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recommendations {
    pub sort_by: String,
    pub campaigns: Vec<RankedCampaign>,
    /// Same order as `campaigns`.
    pub files: Vec<CampaignFiles>,
    pub campaign_options: Vec<String>,
}

// ---------------------------------------------------------------------------
// Output: best files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileSummary {
    pub matched_datafile: String,
    pub revenue: f64,
    pub cpm: f64,
    pub epc: f64,
    pub clicks: f64,
    pub sent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub sponsors: Vec<String>,
    pub categories: Vec<String>,
    pub isps: Vec<String>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            sponsors: vec![crate::filter::ALL.to_string()],
            categories: vec![crate::filter::ALL.to_string()],
            isps: vec![crate::filter::ALL.to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BestFiles {
    pub results: Vec<FileSummary>,
    pub best_file: Option<String>,
    /// Rows left after filtering.
    pub record_count: usize,
    /// Distinct linked files among those rows.
    pub unique_files: usize,
    pub filters: FilterOptions,
}

// ---------------------------------------------------------------------------
// Output: unused files
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnusedSummary {
    pub campaign_id: String,
    pub campaign_name: String,
    pub days: u32,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnusedFiles {
    pub unused_datafiles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<UnusedSummary>,
    pub isp_options: Vec<String>,
    pub file_series_options: Vec<String>,
}

// ---------------------------------------------------------------------------
// Boundary
// ---------------------------------------------------------------------------

/// What every public operation hands back to the presentation layer.
///
/// Failures never propagate past this point: the error message is kept
/// and the result is left empty so callers can still render.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Outcome<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub result: T,
    /// The typed failure behind `error`, for callers that branch on it.
    #[serde(skip)]
    pub failure: Option<PipelineError>,
}

impl<T: Default> Outcome<T> {
    pub fn ok(result: T) -> Self {
        Self { error: None, message: None, result, failure: None }
    }

    pub fn failed(err: PipelineError) -> Self {
        Self {
            error: Some(err.to_string()),
            message: None,
            result: T::default(),
            failure: Some(err),
        }
    }

    pub fn from_result(r: Result<T, PipelineError>) -> Self {
        match r {
            Ok(result) => Self::ok(result),
            Err(e) => Self::failed(e),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
