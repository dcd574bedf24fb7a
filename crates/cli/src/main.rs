// mailrec - data file recommendations for email campaigns

mod exit_codes;
mod render;
mod sources;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use mailrec_config::settings::SourceSettings;
use mailrec_config::Settings;
use mailrec_pipeline::engine::{BestFilesRequest, RecommendRequest, UnusedRequest};
use mailrec_pipeline::linker::Candidates;
use mailrec_pipeline::merge::link_report;
use mailrec_pipeline::normalize::Normalizer;
use mailrec_pipeline::{schema, Outcome, PipelineError, SortBy};

use exit_codes::{EXIT_EMPTY, EXIT_ERROR, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "mailrec")]
#[command(about = "Recommend data files for email campaigns from past send performance")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log more (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (default: <config dir>/mailrec/settings.toml)
    #[arg(long, env = "MAILREC_SETTINGS", global = true)]
    settings: Option<PathBuf>,

    /// Print the full result as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Per-invocation overrides for the three input locations.
#[derive(Args, Debug, Clone, Default)]
struct SourceArgs {
    /// Report endpoint (http(s) URL or saved JSON envelope)
    #[arg(long, env = "MAILREC_REPORT_URL")]
    report_url: Option<String>,

    /// Campaign registry endpoint (http(s) URL or saved JSON envelope)
    #[arg(long, env = "MAILREC_CAMPAIGN_URL")]
    campaign_url: Option<String>,

    /// Master data file spreadsheet (.xlsx, .xls, .ods, .csv, .tsv)
    #[arg(long, env = "MAILREC_MASTER_PATH")]
    master_path: Option<PathBuf>,
}

impl SourceArgs {
    fn apply(self, sources: &mut SourceSettings) {
        if let Some(url) = self.report_url {
            sources.report_url = Some(url);
        }
        if let Some(url) = self.campaign_url {
            sources.campaign_url = Some(url);
        }
        if let Some(path) = self.master_path {
            sources.master_path = Some(path);
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Rank campaigns and list the best data files for each
    #[command(after_help = "\
Examples:
  mailrec recommend
  mailrec recommend --campaign summer --sort-by epc --limit 5
  mailrec recommend --min-engagement 2.5 --json")]
    Recommend {
        #[command(flatten)]
        sources: SourceArgs,

        /// Only campaigns whose name contains this text (case-insensitive)
        #[arg(long)]
        campaign: Option<String>,

        /// Minimum engagement, in percent (clicks / sent * 100)
        #[arg(long, default_value_t = 0.0)]
        min_engagement: f64,

        /// Ranking metric: revenue, epc, cpm or performance
        #[arg(long)]
        sort_by: Option<String>,

        /// Number of campaigns to show
        #[arg(long)]
        limit: Option<usize>,

        /// Number of files per campaign
        #[arg(long)]
        files_per_campaign: Option<usize>,

        /// Exit with code 6 when nothing is ranked
        #[arg(long)]
        fail_on_empty: bool,
    },

    /// Best performing data files across all campaigns
    #[command(after_help = "\
Examples:
  mailrec best-files
  mailrec best-files --sponsor Acme --isp Gmail --exclude-days 7")]
    BestFiles {
        #[command(flatten)]
        sources: SourceArgs,

        /// Sponsor filter ("All" for none)
        #[arg(long)]
        sponsor: Option<String>,

        /// Category filter ("All" for none)
        #[arg(long)]
        category: Option<String>,

        /// ISP filter ("All" for none)
        #[arg(long)]
        isp: Option<String>,

        /// Skip files sent within this many days (0 = off)
        #[arg(long, default_value_t = 0)]
        exclude_days: u32,

        /// Number of files to show
        #[arg(long)]
        top: Option<usize>,

        /// Exit with code 6 when nothing is ranked
        #[arg(long)]
        fail_on_empty: bool,
    },

    /// Master data files a campaign has not used recently
    #[command(after_help = "\
Examples:
  mailrec unused                       # list ISP and file series options
  mailrec unused --campaign-id 42 --days 30 --isp Yahoo")]
    Unused {
        #[command(flatten)]
        sources: SourceArgs,

        /// Campaign id; omit to list filter options only
        #[arg(long)]
        campaign_id: Option<String>,

        /// ISP filter ("All" for none)
        #[arg(long)]
        isp: Option<String>,

        /// File series filter ("All" for none)
        #[arg(long)]
        file_series: Option<String>,

        /// Look-back window in days
        #[arg(long)]
        days: Option<u32>,

        /// Exit with code 6 when no file is unused
        #[arg(long)]
        fail_on_empty: bool,
    },

    /// Print the normalized key for a data file name
    Normalize {
        /// Raw data file name
        name: String,

        /// Tag to strip (repeatable); defaults to the configured sponsors
        #[arg(long = "sponsor")]
        sponsors: Vec<String>,

        /// Strip no tags (how master names are normalized)
        #[arg(long, conflicts_with = "sponsors")]
        plain: bool,
    },

    /// Show how each report row links to a master file
    Link {
        #[command(flatten)]
        sources: SourceArgs,

        /// Override the configured similarity threshold (0-100)
        #[arg(long)]
        threshold: Option<f64>,

        /// Only rows that did not reach the threshold
        #[arg(long)]
        unmatched: bool,
    },

    /// Show the effective settings
    Config {
        /// Print the settings file path instead
        #[arg(long)]
        path: bool,
    },
}

/// One report row after linkage, as printed by `mailrec link`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct LinkRow {
    pub original_datafile: String,
    pub original_datafile_clean: String,
    pub matched_datafile: String,
    pub match_score: f64,
    /// Nearest master file when the row did not link.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closest_score: Option<f64>,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("MAILREC_COMMIT"), ")",
        "\ntarget:  ", env!("MAILREC_TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = Context { settings: cli.settings, json: cli.json };
    let result = match cli.command {
        Commands::Recommend {
            sources,
            campaign,
            min_engagement,
            sort_by,
            limit,
            files_per_campaign,
            fail_on_empty,
        } => cmd_recommend(&ctx, sources, campaign, min_engagement, sort_by, limit, files_per_campaign, fail_on_empty),
        Commands::BestFiles {
            sources,
            sponsor,
            category,
            isp,
            exclude_days,
            top,
            fail_on_empty,
        } => cmd_best_files(&ctx, sources, sponsor, category, isp, exclude_days, top, fail_on_empty),
        Commands::Unused {
            sources,
            campaign_id,
            isp,
            file_series,
            days,
            fail_on_empty,
        } => cmd_unused(&ctx, sources, campaign_id, isp, file_series, days, fail_on_empty),
        Commands::Normalize { name, sponsors, plain } => cmd_normalize(&ctx, name, sponsors, plain),
        Commands::Link { sources, threshold, unmatched } => cmd_link(&ctx, sources, threshold, unmatched),
        Commands::Config { path } => cmd_config(&ctx, path),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if std::env::var_os("RUST_LOG").is_none() {
        match verbose {
            0 => {}
            1 => {
                builder.filter_level(log::LevelFilter::Info);
            }
            _ => {
                builder.filter_level(log::LevelFilter::Debug);
            }
        }
    }
    builder.target(env_logger::Target::Stderr).init();
}

struct Context {
    settings: Option<PathBuf>,
    json: bool,
}

impl Context {
    fn load_settings(&self) -> Result<Settings, CliError> {
        Settings::load(self.settings.as_deref()).map_err(CliError::pipeline)
    }
}

fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn pipeline(err: PipelineError) -> Self {
        let hint = match &err {
            PipelineError::Configuration(msg) if msg.contains("not configured") => Some(
                "set it under [sources] in settings.toml, or pass --report-url / --campaign-url / --master-path"
                    .to_string(),
            ),
            PipelineError::Schema { table, .. } => Some(format!("check the column headers of the {table} source")),
            PipelineError::InvalidRequest(msg) if msg.starts_with("unknown sort_by") => {
                Some("use one of: revenue, epc, cpm, performance".to_string())
            }
            _ => None,
        };
        Self { code: exit_codes::for_error(&err), message: err.to_string(), hint }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn empty(msg: impl Into<String>) -> Self {
        Self { code: EXIT_EMPTY, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// Output
// ============================================================================

/// Print an outcome and turn it into the process result.
///
/// With `--json` the whole outcome goes to stdout, errors included.
/// Otherwise the rendered result (or the outcome message) is printed and
/// the error is left to `main`.
fn emit<T: Serialize + Default>(
    ctx: &Context,
    outcome: Outcome<T>,
    render: impl Fn(&T) -> String,
    is_empty: impl Fn(&T) -> bool,
    fail_on_empty: bool,
) -> Result<(), CliError> {
    if ctx.json {
        let text = serde_json::to_string_pretty(&outcome)
            .map_err(|e| CliError::io(format!("failed to serialize result: {e}")))?;
        println!("{text}");
    } else if !outcome.is_error() {
        print!("{}", render(&outcome.result));
        if let Some(msg) = &outcome.message {
            println!("{msg}");
        }
    }

    if let Some(err) = outcome.failure {
        return Err(CliError::pipeline(err));
    }
    if fail_on_empty && is_empty(&outcome.result) {
        return Err(CliError::empty("empty result").with_hint("relax the filters or drop --fail-on-empty"));
    }
    Ok(())
}

// ============================================================================
// recommend / best-files / unused
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn cmd_recommend(
    ctx: &Context,
    source_args: SourceArgs,
    campaign: Option<String>,
    min_engagement: f64,
    sort_by: Option<String>,
    limit: Option<usize>,
    files_per_campaign: Option<usize>,
    fail_on_empty: bool,
) -> Result<(), CliError> {
    let mut settings = ctx.load_settings()?;
    source_args.apply(&mut settings.sources);

    let outcome = sort_by
        .as_deref()
        .map(SortBy::parse)
        .transpose()
        .map(|sort_by| RecommendRequest {
            campaign_contains: campaign.unwrap_or_default(),
            min_engagement,
            sort_by: sort_by.unwrap_or(settings.recommend.sort_by),
            limit: limit.unwrap_or(settings.recommend.limit),
            files_per_campaign: files_per_campaign.unwrap_or(settings.recommend.files_per_campaign),
        })
        .and_then(|request| sources::load_all(&settings.sources).map(|tables| (request, tables)));
    let outcome = match outcome {
        Ok((request, tables)) => mailrec_pipeline::recommend(&tables, &request, &settings.linkage, now()),
        Err(e) => Outcome::failed(e),
    };

    emit(ctx, outcome, render::recommendations, |r| r.campaigns.is_empty(), fail_on_empty)
}

#[allow(clippy::too_many_arguments)]
fn cmd_best_files(
    ctx: &Context,
    source_args: SourceArgs,
    sponsor: Option<String>,
    category: Option<String>,
    isp: Option<String>,
    exclude_days: u32,
    top: Option<usize>,
    fail_on_empty: bool,
) -> Result<(), CliError> {
    let mut settings = ctx.load_settings()?;
    source_args.apply(&mut settings.sources);

    let request = BestFilesRequest {
        sponsor,
        category,
        isp,
        exclude_days,
        top: top.unwrap_or(settings.best_files.top),
    };
    let outcome = match sources::load_all(&settings.sources) {
        Ok(tables) => mailrec_pipeline::best_files_view(&tables, &request, &settings.linkage, now()),
        Err(e) => Outcome::failed(e),
    };

    emit(ctx, outcome, render::best_files, |r| r.results.is_empty(), fail_on_empty)
}

fn cmd_unused(
    ctx: &Context,
    source_args: SourceArgs,
    campaign_id: Option<String>,
    isp: Option<String>,
    file_series: Option<String>,
    days: Option<u32>,
    fail_on_empty: bool,
) -> Result<(), CliError> {
    let mut settings = ctx.load_settings()?;
    source_args.apply(&mut settings.sources);

    let request = UnusedRequest {
        campaign_id: campaign_id.unwrap_or_default(),
        isp,
        file_series,
        window_days: days.unwrap_or(settings.unused.window_days),
    };
    let outcome = match sources::load_all(&settings.sources) {
        Ok(tables) => mailrec_pipeline::unused_view(&tables, &request, &settings.linkage, now()),
        Err(e) => Outcome::failed(e),
    };

    // Options-only listings are never "empty".
    let evaluated = !request.campaign_id.trim().is_empty();
    emit(
        ctx,
        outcome,
        render::unused,
        |r| evaluated && r.unused_datafiles.is_empty(),
        fail_on_empty,
    )
}

// ============================================================================
// normalize / link
// ============================================================================

fn cmd_normalize(ctx: &Context, name: String, sponsors: Vec<String>, plain: bool) -> Result<(), CliError> {
    let normalizer = if plain {
        Normalizer::plain()
    } else if sponsors.is_empty() {
        Normalizer::new(&ctx.load_settings()?.linkage.sponsors)
    } else {
        Normalizer::new(&sponsors)
    };
    let clean = normalizer.normalize(&name);

    if ctx.json {
        let value = serde_json::json!({ "input": name, "normalized": clean });
        println!("{}", serde_json::to_string_pretty(&value).map_err(|e| CliError::io(e.to_string()))?);
    } else {
        println!("{clean}");
    }
    Ok(())
}

fn cmd_link(ctx: &Context, source_args: SourceArgs, threshold: Option<f64>, unmatched: bool) -> Result<(), CliError> {
    let mut settings = ctx.load_settings()?;
    source_args.apply(&mut settings.sources);
    if let Some(t) = threshold {
        settings.linkage.threshold = t;
    }

    let outcome = Outcome::from_result(link_rows(&settings).map(|rows| {
        if unmatched {
            rows.into_iter().filter(|r| r.matched_datafile.is_empty()).collect()
        } else {
            rows
        }
    }));

    emit(ctx, outcome, |rows: &Vec<LinkRow>| render::links(rows), |_| false, false)
}

fn link_rows(settings: &Settings) -> Result<Vec<LinkRow>, PipelineError> {
    settings.linkage.validate()?;
    let (report, master) = sources::load_report_and_master(&settings.sources)?;
    let report = schema::report_records(&report)?;
    let master = schema::master_records(&master)?;

    let linked = link_report(&report, &master, &settings.linkage);
    let matched = linked.iter().filter(|l| l.is_linked()).count();
    log::info!("linked {matched} of {} report rows", linked.len());

    let candidates = Candidates::new(master.iter().map(|m| m.data_file_clean.as_str()));
    Ok(linked
        .into_iter()
        .map(|l| {
            let nearest = if l.is_linked() { None } else { candidates.best(&l.original_datafile_clean) };
            LinkRow {
                closest: nearest.map(|(name, _)| name.to_string()),
                closest_score: nearest.map(|(_, score)| score),
                original_datafile: l.record.original_datafile,
                original_datafile_clean: l.original_datafile_clean,
                matched_datafile: l.matched_datafile,
                match_score: l.match_score,
            }
        })
        .collect())
}

// ============================================================================
// config
// ============================================================================

fn cmd_config(ctx: &Context, path: bool) -> Result<(), CliError> {
    let file = ctx.settings.clone().unwrap_or_else(Settings::config_path);
    if path {
        println!("{}", file.display());
        return Ok(());
    }

    let settings = ctx.load_settings()?;
    if ctx.json {
        let text = serde_json::to_string_pretty(&settings)
            .map_err(|e| CliError::io(format!("failed to serialize settings: {e}")))?;
        println!("{text}");
    } else {
        print!("{}", settings.to_toml().map_err(CliError::pipeline)?);
    }
    Ok(())
}
