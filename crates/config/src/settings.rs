// Application settings
// Loaded from ~/.config/mailrec/settings.toml (or --settings / MAILREC_SETTINGS)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use mailrec_pipeline::{PipelineConfig, PipelineError, SortBy};

/// Where the three inputs come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// http(s) URL, or a local path to a saved JSON envelope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_path: Option<PathBuf>,

    /// HTTP timeout per request
    pub timeout_secs: u64,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            report_url: None,
            campaign_url: None,
            master_path: None,
            timeout_secs: 30,
        }
    }
}

fn configured(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl SourceSettings {
    pub fn report_url(&self) -> Result<&str, PipelineError> {
        configured(self.report_url.as_deref())
            .ok_or_else(|| PipelineError::Configuration("report URL not configured".into()))
    }

    pub fn campaign_url(&self) -> Result<&str, PipelineError> {
        configured(self.campaign_url.as_deref())
            .ok_or_else(|| PipelineError::Configuration("campaign URL not configured".into()))
    }

    pub fn master_path(&self) -> Result<&Path, PipelineError> {
        self.master_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| PipelineError::Configuration("master data file path not configured".into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendSettings {
    pub sort_by: SortBy,
    pub limit: usize,
    pub files_per_campaign: usize,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            sort_by: SortBy::Revenue,
            limit: 10,
            files_per_campaign: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnusedSettings {
    pub window_days: u32,
}

impl Default for UnusedSettings {
    fn default() -> Self {
        Self { window_days: 15 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestFilesSettings {
    pub top: usize,
}

impl Default for BestFilesSettings {
    fn default() -> Self {
        Self { top: 15 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sources: SourceSettings,
    pub linkage: PipelineConfig,
    pub recommend: RecommendSettings,
    pub unused: UnusedSettings,
    pub best_files: BestFilesSettings,
}

impl Settings {
    /// Default settings file location
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mailrec")
            .join("settings.toml")
    }

    pub fn from_toml(input: &str) -> Result<Self, PipelineError> {
        let settings: Settings =
            toml::from_str(input).map_err(|e| PipelineError::Configuration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        self.linkage.validate()?;
        if self.sources.timeout_secs == 0 {
            return Err(PipelineError::Configuration("sources.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// Load settings.
    ///
    /// An explicit path must exist. The default path may be absent, in which
    /// case defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self, PipelineError> {
        let path = match explicit {
            Some(p) if !p.exists() => {
                return Err(PipelineError::Configuration(format!(
                    "settings file not found at {}",
                    p.display()
                )))
            }
            Some(p) => p.to_path_buf(),
            None => Self::config_path(),
        };

        if !path.exists() {
            log::warn!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .map_err(|e| PipelineError::Io(format!("{}: {e}", path.display())))?;
        let settings = Self::from_toml(&contents).map_err(|e| match e {
            PipelineError::Configuration(msg) => {
                PipelineError::Configuration(format!("{}: {msg}", path.display()))
            }
            other => other,
        })?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_toml(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self).map_err(|e| PipelineError::Configuration(e.to_string()))
    }
}
