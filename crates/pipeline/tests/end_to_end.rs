use chrono::{NaiveDate, NaiveDateTime};

use mailrec_pipeline::config::{JoinKind, RecencyKey};
use mailrec_pipeline::merge::{link_report, merge, PipelineInput};
use mailrec_pipeline::{
    best_files_view, normalize, recommend, unused_view, BestFilesRequest, Cell, PipelineConfig, RecommendRequest,
    SourceTables, Table, UnusedRequest,
};

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap().and_hms_opt(10, 0, 0).unwrap()
}

fn text(s: &str) -> Cell {
    Cell::Text(s.into())
}

fn table(columns: &[&str], rows: Vec<Vec<Cell>>) -> Table {
    Table::new(columns.iter().map(|c| c.to_string()).collect(), rows)
}

fn summer_sale(master_name: &str) -> SourceTables {
    SourceTables {
        report: table(
            &["campaign_name", "original_datafile", "offer_date", "clicks", "sent", "revenue", "cpm"],
            vec![
                vec![
                    text("summer_sale"),
                    text("summer_sale_BSK_2024_1703"),
                    text("20-06-2024"),
                    text("12"),
                    text("1,000"),
                    text("40.5"),
                    text("3"),
                ],
                vec![
                    text("Summer_Sale "),
                    text("summer_sale_bsk_2024"),
                    text("28-06-2024"),
                    Cell::Number(8.0),
                    Cell::Number(500.0),
                    Cell::Number(19.5),
                    Cell::Number(5.0),
                ],
            ],
        ),
        campaigns: table(
            &["campaign_id", "campaign_name", "sponsor", "category"],
            vec![vec![Cell::Number(7.0), text("summer_sale"), text("BSK"), text("retail")]],
        ),
        master: table(
            &["Data File", "ISP Name", "File Series", "DF Count"],
            vec![
                vec![text(master_name), text("gmail"), text("S"), Cell::Number(2500.0)],
                vec![text("winter_clearance"), text("yahoo"), text("W"), Cell::Number(900.0)],
            ],
        ),
    }
}

#[test]
fn both_report_spellings_normalize_to_the_same_key() {
    let tags = ["BSK"];
    assert_eq!(normalize("summer_sale_BSK_2024_1703", &tags), "summer_sale_2024");
    assert_eq!(normalize("summer_sale_bsk_2024", &tags), "summer_sale_2024");
    let no_tags: &[&str] = &[];
    assert_eq!(normalize("summer_sale_2024_master", no_tags), "summer_sale_2024_master");
}

#[test]
fn summer_sale_links_above_threshold() {
    let tables = summer_sale("summer_sale_2024_master");
    let input = PipelineInput::from_tables(&tables).unwrap();
    let linked = link_report(&input.report, &input.master, &PipelineConfig::default());

    for l in &linked {
        assert_eq!(l.original_datafile_clean, "summer_sale_2024");
        assert_eq!(l.matched_datafile, "summer_sale_2024_master");
        assert!(l.match_score > 80.0);
    }

    let rows = merge(&linked, &input.campaigns, &input.master, JoinKind::Inner, RecencyKey::CampaignAndFile);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.last_send_date == NaiveDate::from_ymd_opt(2024, 6, 28)));
    assert!(rows.iter().all(|r| r.df_count == Some(2500.0)));
}

#[test]
fn recommendation_for_summer_sale() {
    let out = recommend(&summer_sale("summer_sale_2024_master"), &RecommendRequest::default(), &PipelineConfig::default(), now());
    assert!(!out.is_error(), "{:?}", out.error);

    let campaigns = &out.result.campaigns;
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0].campaign_name, "summer_sale");
    assert_eq!(campaigns[0].score, 60.0);

    let files = &out.result.files[0].files;
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].matched_datafile, "summer_sale_2024_master");
    // First occurrence wins for the per-file row.
    assert_eq!(files[0].score, 40.5);
}

#[test]
fn unlinked_rows_still_count_toward_campaign_revenue() {
    let tables = summer_sale("completely_unrelated_list");
    let input = PipelineInput::from_tables(&tables).unwrap();
    let linked = link_report(&input.report, &input.master, &PipelineConfig::default());
    assert!(linked.iter().all(|l| l.matched_datafile.is_empty()));

    let out = recommend(&tables, &RecommendRequest::default(), &PipelineConfig::default(), now());
    assert_eq!(out.result.campaigns[0].score, 60.0);
    assert!(out.result.files[0].files.is_empty());

    let best = best_files_view(&tables, &BestFilesRequest::default(), &PipelineConfig::default(), now());
    assert!(best.result.results.is_empty());
    assert_eq!(best.result.record_count, 2);
    assert!(best.message.is_some());
}

#[test]
fn unused_window_covers_every_send() {
    let tables = summer_sale("summer_sale_2024_master");

    let recent = UnusedRequest { campaign_id: "7".into(), window_days: 5, ..Default::default() };
    let out = unused_view(&tables, &recent, &PipelineConfig::default(), now());
    assert_eq!(out.result.unused_datafiles, vec!["winter_clearance"]);

    let wide = UnusedRequest { campaign_id: "7".into(), window_days: 365, ..Default::default() };
    let out = unused_view(&tables, &wide, &PipelineConfig::default(), now());
    assert_eq!(out.result.unused_datafiles, vec!["winter_clearance"]);

    // Nothing sent in the last day: every master file is unused.
    let narrow = UnusedRequest { campaign_id: "7".into(), window_days: 1, ..Default::default() };
    let out = unused_view(&tables, &narrow, &PipelineConfig::default(), now());
    assert_eq!(out.result.unused_datafiles, vec!["summer_sale_2024_master", "winter_clearance"]);
    assert_eq!(out.result.summary.unwrap().count, 2);
}
