use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Sponsor/vendor codes that show up embedded in report file names.
pub const DEFAULT_SPONSORS: &[&str] = &[
    "BSK", "CFW", "DAG", "DFO", "EFL", "GWM", "LLS", "Madrivo", "NIW", "PDS", "W4", "W4E",
];

pub const DEFAULT_THRESHOLD: f64 = 80.0;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Linkage settings shared by every view.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Minimum similarity (0–100) for a report name to link to a master file.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// Tags stripped from report names before linking.
    #[serde(default = "default_sponsors")]
    pub sponsors: Vec<String>,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_sponsors() -> Vec<String> {
    DEFAULT_SPONSORS.iter().map(|s| s.to_string()).collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            sponsors: default_sponsors(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ranking + join policy
// ---------------------------------------------------------------------------

/// Ranking metric for the recommendation view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Summed revenue.
    #[default]
    Revenue,
    /// Mean revenue per click.
    Epc,
    /// Mean CPM.
    Cpm,
    /// Mean revenue per send.
    Performance,
}

impl SortBy {
    pub fn parse(s: &str) -> Result<Self, PipelineError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revenue" => Ok(Self::Revenue),
            "epc" => Ok(Self::Epc),
            "cpm" => Ok(Self::Cpm),
            "performance" | "perf" => Ok(Self::Performance),
            other => Err(PipelineError::InvalidRequest(format!(
                "unknown sort_by '{other}' (expected revenue, epc, cpm or performance)"
            ))),
        }
    }

    /// Revenue is summed; the rate metrics are averaged.
    pub fn is_sum(&self) -> bool {
        matches!(self, Self::Revenue)
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Revenue => write!(f, "revenue"),
            Self::Epc => write!(f, "epc"),
            Self::Cpm => write!(f, "cpm"),
            Self::Performance => write!(f, "performance"),
        }
    }
}

/// How report rows join the campaign registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Drop report rows with no campaign definition.
    Inner,
    /// Keep them with empty campaign fields.
    Left,
}

/// Grouping key for the `last_send_date` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecencyKey {
    /// Per `(campaign_name, matched_datafile)`.
    CampaignAndFile,
    /// Per `matched_datafile`, across campaigns.
    File,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl PipelineConfig {
    pub fn from_toml(input: &str) -> Result<Self, PipelineError> {
        let config: PipelineConfig =
            toml::from_str(input).map_err(|e| PipelineError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(PipelineError::Configuration(format!(
                "threshold must be between 0 and 100, got {}",
                self.threshold
            )));
        }
        if let Some(bad) = self.sponsors.iter().find(|s| s.trim().is_empty() || s.contains('_')) {
            return Err(PipelineError::Configuration(format!(
                "sponsor tag '{bad}' must be non-empty and contain no '_'"
            )));
        }
        Ok(())
    }
}
