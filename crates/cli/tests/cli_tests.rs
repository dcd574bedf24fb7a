// Integration tests for the mailrec binary against fixture sources on disk.
//
// Every test points --settings at its own settings file and clears the
// MAILREC_* variables so the developer's environment never leaks in.
//
// Run with: cargo test -p mailrec-cli --test cli_tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const REPORT: &str = r#"{"data": [
  {"campaign_name": "summer_sale", "original_datafile": "summer_sale_BSK_2024_1703",
   "offer_date": "20-06-2020", "clicks": "12", "sent": "1,000", "revenue": "40.5", "cpm": "3"},
  {"campaign_name": "Summer_Sale ", "original_datafile": "summer_sale_bsk_2024",
   "offer_date": "28-06-2020", "clicks": 8, "sent": 500, "revenue": 19.5, "cpm": 5}
]}"#;

const CAMPAIGNS: &str = r#"{"data": [
  {"campaign_id": 7, "campaign_name": "summer_sale", "sponsor": "BSK", "category": "retail"}
]}"#;

const MASTER: &str = "\
Data File,ISP Name,File Series,DF Count
summer_sale_2024_master,gmail,S,2500
winter_clearance,yahoo,W,900
";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("report.json"), REPORT).unwrap();
        fs::write(dir.path().join("campaigns.json"), CAMPAIGNS).unwrap();
        fs::write(dir.path().join("master.csv"), MASTER).unwrap();
        let fixture = Self { dir };
        fixture.write_settings("");
        fixture
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write_settings(&self, body: &str) {
        fs::write(self.path("settings.toml"), body).unwrap();
    }

    fn write_configured_settings(&self) {
        self.write_settings(&format!(
            "[sources]\nreport_url = {:?}\ncampaign_url = {:?}\nmaster_path = {:?}\n",
            self.path("report.json").display().to_string(),
            self.path("campaigns.json").display().to_string(),
            self.path("master.csv").display().to_string(),
        ));
    }

    /// A `mailrec` invocation with isolated settings and no source env vars.
    fn cmd(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_mailrec"));
        cmd.env_remove("MAILREC_REPORT_URL")
            .env_remove("MAILREC_CAMPAIGN_URL")
            .env_remove("MAILREC_MASTER_PATH")
            .env_remove("RUST_LOG")
            .env("MAILREC_SETTINGS", self.path("settings.toml"));
        cmd
    }

    /// Run with all three sources passed as flags.
    fn run(&self, args: &[&str]) -> Output {
        let report = self.path("report.json");
        let campaigns = self.path("campaigns.json");
        let master = self.path("master.csv");
        self.cmd()
            .args(args)
            .args(["--report-url", s(&report), "--campaign-url", s(&campaigns), "--master-path", s(&master)])
            .output()
            .expect("run mailrec")
    }
}

fn s(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {e}\nstdout:\n{stdout}"))
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ===========================================================================
// views
// ===========================================================================

#[test]
fn recommend_json() {
    let fx = Fixture::new();
    let output = fx.run(&["recommend", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let val = json(&output);
    assert!(val.get("error").is_none());
    let result = &val["result"];
    assert_eq!(result["sort_by"], "revenue");
    assert_eq!(result["campaigns"][0]["campaign_name"], "summer_sale");
    assert_eq!(result["campaigns"][0]["score"].as_f64(), Some(60.0));
    assert_eq!(result["files"][0]["files"][0]["matched_datafile"], "summer_sale_2024_master");
    assert_eq!(result["campaign_options"], serde_json::json!(["summer_sale"]));
}

#[test]
fn recommend_human_output() {
    let fx = Fixture::new();
    let output = fx.run(&["recommend"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Top campaigns by revenue"));
    assert!(stdout.contains("summer_sale_2024_master"));
}

#[test]
fn recommend_rejects_unknown_sort() {
    let fx = Fixture::new();
    let output = fx.run(&["recommend", "--sort-by", "clicks", "--json"]);
    assert_eq!(output.status.code(), Some(2));
    let val = json(&output);
    assert!(val["error"].as_str().unwrap().contains("unknown sort_by 'clicks'"));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn best_files_json_with_filter_options() {
    let fx = Fixture::new();
    let output = fx.run(&["best-files", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let result = &json(&output)["result"];
    assert_eq!(result["best_file"], "summer_sale_2024_master");
    assert_eq!(result["results"][0]["revenue"].as_f64(), Some(60.0));
    assert_eq!(result["record_count"], 2);
    assert_eq!(result["unique_files"], 1);
    assert_eq!(result["filters"]["sponsors"], serde_json::json!(["All", "BSK"]));
    assert_eq!(result["filters"]["isps"], serde_json::json!(["All", "gmail", "yahoo"]));
}

#[test]
fn best_files_empty_is_message_not_error() {
    let fx = Fixture::new();
    let output = fx.run(&["best-files", "--sponsor", "Nobody", "--json"]);
    assert!(output.status.success());
    let val = json(&output);
    assert!(val.get("error").is_none());
    assert_eq!(val["message"], "No data found for the selected filters.");
}

#[test]
fn fail_on_empty_exit_code() {
    let fx = Fixture::new();
    let output = fx.run(&["best-files", "--sponsor", "Nobody", "--fail-on-empty"]);
    assert_eq!(output.status.code(), Some(6));
    assert!(String::from_utf8_lossy(&output.stdout).contains("No data found"));
}

#[test]
fn unused_lists_files_outside_window() {
    let fx = Fixture::new();
    // The fixture's sends are years old, so every master file is unused.
    let output = fx.run(&["unused", "--campaign-id", "7", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let result = &json(&output)["result"];
    assert_eq!(
        result["unused_datafiles"],
        serde_json::json!(["summer_sale_2024_master", "winter_clearance"])
    );
    assert_eq!(result["summary"]["campaign_name"], "summer_sale");
    assert_eq!(result["summary"]["days"], 15);
    assert_eq!(result["summary"]["count"], 2);
}

#[test]
fn unused_isp_filter() {
    let fx = Fixture::new();
    let output = fx.run(&["unused", "--campaign-id", "7", "--isp", "yahoo", "--json"]);
    assert!(output.status.success());
    assert_eq!(json(&output)["result"]["unused_datafiles"], serde_json::json!(["winter_clearance"]));
}

#[test]
fn unused_without_campaign_lists_options() {
    let fx = Fixture::new();
    let output = fx.run(&["unused", "--json"]);
    assert!(output.status.success());
    let result = &json(&output)["result"];
    assert!(result.get("summary").is_none());
    assert_eq!(result["isp_options"], serde_json::json!(["gmail", "yahoo"]));
    assert_eq!(result["file_series_options"], serde_json::json!(["S", "W"]));
}

#[test]
fn unused_unknown_campaign() {
    let fx = Fixture::new();
    let output = fx.run(&["unused", "--campaign-id", "99", "--json"]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(json(&output)["error"], "invalid request: no campaign found with id 99");
}

// ===========================================================================
// configuration and source failures
// ===========================================================================

#[test]
fn sources_from_settings_file() {
    let fx = Fixture::new();
    fx.write_configured_settings();
    let output = fx.cmd().args(["recommend", "--json"]).output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(json(&output)["result"]["campaigns"][0]["campaign_name"], "summer_sale");
}

#[test]
fn unconfigured_campaign_url() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .args(["recommend", "--report-url", s(&fx.path("report.json")), "--master-path", s(&fx.path("master.csv"))])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("error: configuration error: campaign URL not configured"), "{err}");
    assert!(err.contains("hint:"));
}

#[test]
fn missing_master_file() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .args([
            "best-files",
            "--json",
            "--report-url",
            s(&fx.path("report.json")),
            "--campaign-url",
            s(&fx.path("campaigns.json")),
            "--master-path",
            s(&fx.path("absent.xlsx")),
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    let val = json(&output);
    assert!(val["error"].as_str().unwrap().contains("master data file not found at"));
    // The empty result is still rendered.
    assert_eq!(val["result"]["results"], serde_json::json!([]));
}

#[test]
fn report_missing_required_column() {
    let fx = Fixture::new();
    fs::write(fx.path("report.json"), r#"{"data": [{"campaign_name": "x"}]}"#).unwrap();
    let output = fx.run(&["recommend", "--json"]);
    assert_eq!(output.status.code(), Some(5));
    assert_eq!(
        json(&output)["error"],
        "report table: missing required column 'original_datafile'"
    );
}

#[test]
fn explicit_missing_settings_file() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .args(["--settings", s(&fx.path("nope.toml")), "config"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("settings file not found"));
}

// ===========================================================================
// diagnostics
// ===========================================================================

#[test]
fn normalize_with_explicit_sponsor() {
    let fx = Fixture::new();
    let output = fx.cmd().args(["normalize", "summer_sale_BSK_2024_1703", "--sponsor", "BSK"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "summer_sale_2024");
}

#[test]
fn normalize_plain_keeps_tags() {
    let fx = Fixture::new();
    let output = fx.cmd().args(["normalize", "Gmail_Openers_BSK", "--plain", "--json"]).output().unwrap();
    assert!(output.status.success());
    let val = json(&output);
    assert_eq!(val["normalized"], "gmail_openers_bsk");
}

#[test]
fn link_reports_every_row() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .args(["link", "--json", "--report-url", s(&fx.path("report.json")), "--master-path", s(&fx.path("master.csv"))])
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let rows = json(&output)["result"].as_array().cloned().unwrap();
    assert_eq!(rows.len(), 2);
    for row in &rows {
        assert_eq!(row["original_datafile_clean"], "summer_sale_2024");
        assert_eq!(row["matched_datafile"], "summer_sale_2024_master");
        assert!(row["match_score"].as_f64().unwrap() > 80.0);
    }
}

#[test]
fn link_threshold_override() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .args([
            "link",
            "--json",
            "--unmatched",
            "--threshold",
            "99",
            "--report-url",
            s(&fx.path("report.json")),
            "--master-path",
            s(&fx.path("master.csv")),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(json(&output)["result"].as_array().map(Vec::len), Some(2));
}

#[test]
fn config_path_and_dump() {
    let fx = Fixture::new();
    let output = fx.cmd().args(["config", "--path"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).trim().ends_with("settings.toml"));

    fx.write_settings("[unused]\nwindow_days = 30\n");
    let output = fx.cmd().args(["config", "--json"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(json(&output)["unused"]["window_days"], 30);
}
