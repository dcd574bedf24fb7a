// Plain-text rendering of view results (the non --json output)

use std::fmt::Write as _;

use mailrec_pipeline::model::{BestFiles, Recommendations, UnusedFiles};

use crate::LinkRow;

fn money(v: f64) -> String {
    format!("{v:.2}")
}

fn date(d: Option<chrono::NaiveDate>) -> String {
    d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".into())
}

fn count(v: Option<f64>) -> String {
    v.map(|c| format!("{c:.0}")).unwrap_or_else(|| "-".into())
}

pub(crate) fn recommendations(rec: &Recommendations) -> String {
    let mut out = String::new();
    if rec.campaigns.is_empty() {
        return out;
    }
    let _ = writeln!(out, "Top campaigns by {}", rec.sort_by);
    for (rank, (campaign, group)) in rec.campaigns.iter().zip(&rec.files).enumerate() {
        let _ = writeln!(
            out,
            "{:>3}. {}  score {}  ({} rows)",
            rank + 1,
            campaign.campaign_name,
            money(campaign.score),
            campaign.row_count
        );
        for file in &group.files {
            let _ = writeln!(
                out,
                "       {:<40} score {:>10}  cpm {:>8}  count {:>8}  last sent {}",
                file.matched_datafile,
                money(file.score),
                money(file.cpm),
                count(file.df_count),
                date(file.last_send_date)
            );
        }
    }
    out
}

pub(crate) fn best_files(best: &BestFiles) -> String {
    let mut out = String::new();
    if best.results.is_empty() {
        return out;
    }
    let _ = writeln!(
        out,
        "{:<40} {:>12} {:>8} {:>8} {:>10} {:>12}",
        "file", "revenue", "cpm", "epc", "clicks", "sent"
    );
    for f in &best.results {
        let _ = writeln!(
            out,
            "{:<40} {:>12} {:>8} {:>8} {:>10.0} {:>12.0}",
            f.matched_datafile,
            money(f.revenue),
            money(f.cpm),
            money(f.epc),
            f.clicks,
            f.sent
        );
    }
    if let Some(file) = &best.best_file {
        let _ = writeln!(out, "\nbest file: {file}");
    }
    let _ = writeln!(out, "{} records, {} unique files", best.record_count, best.unique_files);
    out
}

pub(crate) fn unused(unused: &UnusedFiles) -> String {
    let mut out = String::new();
    match &unused.summary {
        Some(s) => {
            let _ = writeln!(
                out,
                "{} unused files for campaign {} ({}) in the last {} days",
                s.count, s.campaign_id, s.campaign_name, s.days
            );
            for file in &unused.unused_datafiles {
                let _ = writeln!(out, "  {file}");
            }
        }
        None => {
            let _ = writeln!(out, "ISPs: {}", unused.isp_options.join(", "));
            let _ = writeln!(out, "File series: {}", unused.file_series_options.join(", "));
        }
    }
    out
}

pub(crate) fn links(rows: &[LinkRow]) -> String {
    let mut out = String::new();
    for row in rows {
        if !row.matched_datafile.is_empty() {
            let _ = writeln!(
                out,
                "{:<40} -> {:<40} {:>6.2}",
                row.original_datafile_clean, row.matched_datafile, row.match_score
            );
            continue;
        }
        let _ = write!(out, "{:<40} -> {:<40}", row.original_datafile_clean, "(no match)");
        match (&row.closest, row.closest_score) {
            (Some(name), Some(score)) => {
                let _ = writeln!(out, "  closest: {name} ({score:.2})");
            }
            _ => {
                let _ = writeln!(out);
            }
        }
    }
    out
}
