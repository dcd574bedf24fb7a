//! Fetching the three inputs.
//!
//! Report and campaign sources are either http(s) URLs returning a
//! `{"data": [...]}` envelope or local paths to a saved envelope. The master
//! list is always a local spreadsheet. Fetches are blocking and never
//! retried: a failing upstream fails the command.

use std::path::Path;
use std::time::Duration;

use mailrec_config::settings::SourceSettings;
use mailrec_pipeline::{PipelineError, SourceTables, Table};

pub(crate) const USER_AGENT: &str = concat!("mailrec/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP client for the JSON sources.
pub(crate) struct FetchClient {
    http: reqwest::blocking::Client,
}

impl FetchClient {
    pub(crate) fn new(timeout: Duration) -> Result<Self, PipelineError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PipelineError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// GET `url` and decode its envelope. Non-success status is
    /// [`PipelineError::SourceUnavailable`].
    pub(crate) fn get_table(&self, source: &str, url: &str) -> Result<Table, PipelineError> {
        log::info!("fetching {source} from {url}");
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|e| PipelineError::SourceUnavailable(format!("{source} request to {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::SourceUnavailable(format!(
                "{source} request to {url} returned HTTP {}",
                status.as_u16()
            )));
        }

        let body = resp
            .text()
            .map_err(|e| PipelineError::SourceUnavailable(format!("failed to read {source} response body: {e}")))?;
        let table = mailrec_io::json::parse_envelope(body.trim_start_matches('\u{feff}'))
            .map_err(|e| match e {
                PipelineError::Parse(msg) => PipelineError::Parse(format!("{source} response: {msg}")),
                other => other,
            })?;
        log::info!("{source}: {} rows", table.len());
        Ok(table)
    }

    /// URL or local path.
    pub(crate) fn load(&self, source: &str, location: &str) -> Result<Table, PipelineError> {
        if is_http(location) {
            return self.get_table(source, location);
        }
        let path = Path::new(location);
        if !path.exists() {
            return Err(PipelineError::SourceUnavailable(format!(
                "{source} file not found at {location}"
            )));
        }
        mailrec_io::json::read_envelope(path)
    }
}

fn is_http(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// All three tables. Every location is checked before anything is fetched.
pub(crate) fn load_all(sources: &SourceSettings) -> Result<SourceTables, PipelineError> {
    let report_url = sources.report_url()?;
    let campaign_url = sources.campaign_url()?;
    let master_path = sources.master_path()?;

    let master = mailrec_io::load_master(master_path)?;
    let client = FetchClient::new(Duration::from_secs(sources.timeout_secs))?;
    let report = client.load("report", report_url)?;
    let campaigns = client.load("campaign", campaign_url)?;

    Ok(SourceTables { report, campaigns, master })
}

/// Report and master only, for `mailrec link`.
pub(crate) fn load_report_and_master(sources: &SourceSettings) -> Result<(Table, Table), PipelineError> {
    let report_url = sources.report_url()?;
    let master_path = sources.master_path()?;

    let master = mailrec_io::load_master(master_path)?;
    let client = FetchClient::new(Duration::from_secs(sources.timeout_secs))?;
    let report = client.load("report", report_url)?;
    Ok((report, master))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::fs;
    use tempfile::tempdir;

    fn client() -> FetchClient {
        FetchClient::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn fetches_envelope() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/report");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"data": [{"campaign_name": "Spring", "original_datafile": "list_a"}]}"#);
        });

        let table = client().get_table("report", &server.url("/report")).unwrap();
        mock.assert();
        assert_eq!(table.len(), 1);
        assert!(table.has_column("original_datafile"));
    }

    #[test]
    fn non_success_is_source_unavailable_without_retry() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/campaigns");
            then.status(503);
        });

        let err = client().get_table("campaign", &server.url("/campaigns")).unwrap_err();
        mock.assert_hits(1);
        assert!(matches!(err, PipelineError::SourceUnavailable(_)));
        assert!(err.to_string().contains("HTTP 503"));
    }

    #[test]
    fn malformed_body_is_parse_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/report");
            then.status(200).body(r#"{"rows": []}"#);
        });

        let err = client().get_table("report", &server.url("/report")).unwrap_err();
        assert_eq!(err, PipelineError::Parse("report response: response has no 'data' field".into()));
    }

    #[test]
    fn local_envelope_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("campaigns.json");
        fs::write(&path, r#"{"data": [{"campaign_name": "x"}]}"#).unwrap();
        let table = client().load("campaign", path.to_str().unwrap()).unwrap();
        assert_eq!(table.len(), 1);

        let missing = dir.path().join("absent.json");
        let err = client().load("campaign", missing.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable(_)));
    }

    #[test]
    fn unconfigured_source_fails_before_fetching() {
        let sources = SourceSettings {
            report_url: Some("https://example.invalid/report".into()),
            campaign_url: None,
            master_path: Some("/nonexistent/master.xlsx".into()),
            timeout_secs: 1,
        };
        let err = load_all(&sources).unwrap_err();
        assert_eq!(err, PipelineError::Configuration("campaign URL not configured".into()));
    }

    #[test]
    fn url_detection() {
        assert!(is_http("https://api.example.com/x"));
        assert!(is_http("HTTP://host/x"));
        assert!(!is_http("/tmp/report.json"));
    }
}
