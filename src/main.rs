// Entry point and high-level CLI flow.
//
// With `--daily` and/or `--campaigns` the report runs once and exits.
// Without them an interactive menu runs:
// - Option [1] loads the CSV exports, printing diagnostics.
// - Option [2] analyses them, previews the tables and writes the exports.
// - Option [3] sends the narration prompt to the text-generation service.
use anyhow::{Context, Result};
use campaign_report::insights::{derive_insights, RecommendationKind};
use campaign_report::narration::{narrate_summary, OpenAiNarrator};
use campaign_report::output::{self, campaign_row, period_row};
use campaign_report::prompt::build_prompt;
use campaign_report::util::{format_int, format_number, format_percent, format_yen};
use campaign_report::{
    analyze, loader, AnalysisConfig, AnalysisSummary, ParsePolicy, RawCampaignRow, RawDailyRow,
};
use clap::Parser;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "campaign_report")]
#[command(about = "Summarise campaign and daily marketing exports into monthly, weekly and per-campaign reports")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Day-level export (CSV)
    #[arg(long, value_name = "CSV")]
    daily: Option<PathBuf>,

    /// Per-campaign export (CSV)
    #[arg(long, value_name = "CSV")]
    campaigns: Option<PathBuf>,

    /// Directory for summary.json and the CSV tables
    #[arg(short, long, default_value = "report")]
    out: PathBuf,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reject malformed numeric cells instead of reading them as 0
    #[arg(long)]
    strict: bool,

    /// Send the summary to the text-generation service
    #[arg(long)]
    narrate: bool,

    /// Write the narration prompt without calling the service
    #[arg(long, conflicts_with = "narrate")]
    prompt_only: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

// Loaded rows survive between menu choices so a file is parsed once but
// can be reported on several times in one session.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    daily: Vec<RawDailyRow>,
    campaigns: Vec<RawCampaignRow>,
    loaded: bool,
    summary: Option<AnalysisSummary>,
}

fn app_state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Read a single line of input after printing `prompt`.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask for an optional file path; blank input means "skip".
fn read_optional_path(prompt: &str) -> Option<PathBuf> {
    let input = read_line(prompt);
    if input.is_empty() {
        None
    } else {
        Some(PathBuf::from(input))
    }
}

/// Load whichever exports were given and keep them in `APP_STATE`.
fn handle_load(daily: Option<&Path>, campaigns: Option<&Path>, config: &AnalysisConfig) -> Result<()> {
    if daily.is_none() && campaigns.is_none() {
        anyhow::bail!("少なくとも1つのファイルを選択してください");
    }
    let mut daily_rows = Vec::new();
    let mut campaign_rows = Vec::new();

    if let Some(path) = daily {
        let (rows, report) = loader::load_daily(path, &config.labels)
            .with_context(|| format!("Failed to load daily export {}", path.display()))?;
        println!(
            "Daily data: {} rows loaded ({} blank, {} unreadable)",
            format_int(report.loaded_rows),
            format_int(report.blank_rows),
            format_int(report.parse_errors)
        );
        daily_rows = rows;
    }
    if let Some(path) = campaigns {
        let (rows, report) = loader::load_campaigns(path, &config.labels)
            .with_context(|| format!("Failed to load campaign export {}", path.display()))?;
        println!(
            "Campaign data: {} rows loaded ({} blank, {} unreadable)",
            format_int(report.loaded_rows),
            format_int(report.blank_rows),
            format_int(report.parse_errors)
        );
        campaign_rows = rows;
    }
    println!();

    let mut state = app_state();
    state.daily = daily_rows;
    state.campaigns = campaign_rows;
    state.loaded = true;
    state.summary = None;
    Ok(())
}

fn print_summary(summary: &AnalysisSummary) {
    let t = &summary.totals;
    let title = &summary.period_info.analysis_title;
    println!("全体効果 ({})\n", if title.is_empty() { "-" } else { title.as_str() });
    println!("総表示回数: {}", format_int(t.metrics.impressions));
    println!("総クリック数: {} (CTR: {})", format_int(t.metrics.clicks), format_percent(t.avg_ctr));
    println!("総応募数: {}", format_int(t.metrics.applications));
    println!("総費用: ¥{} (CPA: {})\n", format_int(t.metrics.cost), format_yen(t.avg_cpa));

    println!("月次");
    let monthly: Vec<_> = summary.monthly_data.iter().map(period_row).collect();
    output::preview_table_rows(&monthly, 12);

    if let Some(cmp) = &summary.comparison {
        println!(
            "前月比 ({}: {}) 表示回数 {:+}, クリック率 {}pt, 応募率 {}pt\n",
            cmp.baseline.label,
            cmp.main.label,
            cmp.diff.impressions,
            format_number(cmp.diff.ctr, 2),
            format_number(cmp.diff.ar, 2)
        );
    }

    println!("週次");
    let weekly: Vec<_> = summary.weekly_data.iter().map(period_row).collect();
    output::preview_table_rows(&weekly, 5);

    println!("キャンペーンごと");
    let campaigns: Vec<_> = summary.campaign_breakdown.iter().map(campaign_row).collect();
    output::preview_table_rows(&campaigns, 10);

    let insights = derive_insights(summary);
    for rec in &insights.recommendations {
        let tag = match rec.kind {
            RecommendationKind::Warning => "要注意",
            RecommendationKind::Info => "提案",
        };
        println!("[{}] {}: {}", tag, rec.title, rec.description);
    }
    if !insights.recommendations.is_empty() {
        println!();
    }
}

/// Analyse the loaded rows, preview them and write the export files.
fn handle_generate(config: &AnalysisConfig, out_dir: &Path) -> Result<()> {
    let (daily, campaigns) = {
        let state = app_state();
        if !state.loaded {
            anyhow::bail!("No data loaded. Please load the CSV files first (option 1).");
        }
        (state.daily.clone(), state.campaigns.clone())
    };

    let summary = analyze(&daily, &campaigns, config).context("Analysis failed")?;
    print_summary(&summary);

    let files = output::write_summary_files(out_dir, &summary)
        .with_context(|| format!("Failed to write reports to {}", out_dir.display()))?;
    println!("(Summary exported to {})", files.summary_json.display());
    println!(
        "(Tables exported to {}, {}, {})\n",
        files.monthly_csv.display(),
        files.weekly_csv.display(),
        files.campaigns_csv.display()
    );

    app_state().summary = Some(summary);
    Ok(())
}

/// Write the narration prompt and, unless `prompt_only`, narrate it.
///
/// A narration failure is reported but does not fail the run; the summary
/// files are already on disk.
fn handle_narrate(config: &AnalysisConfig, out_dir: &Path, prompt_only: bool) -> Result<()> {
    let Some(summary) = app_state().summary.clone() else {
        anyhow::bail!("No report generated yet. Please generate reports first (option 2).");
    };

    let prompt_path = out_dir.join("prompt.txt");
    if prompt_only {
        output::write_text(&prompt_path, &build_prompt(&summary))?;
        println!("(Prompt written to {})\n", prompt_path.display());
        return Ok(());
    }

    let narrator = match OpenAiNarrator::from_env(&config.narration) {
        Ok(n) => n,
        Err(e) => {
            warn!("{}", e);
            println!("{}\n", e.user_message());
            return Ok(());
        }
    };
    println!("AIがデータを解析しています...");
    let narrated = narrate_summary(summary, &narrator);
    output::write_text(&prompt_path, &narrated.prompt)?;
    match narrated.narration {
        Ok(text) => {
            let path = out_dir.join("narration.md");
            output::write_text(&path, &text)?;
            println!("{}\n", text);
            println!("(Narration exported to {})\n", path.display());
        }
        Err(e) => {
            debug!("Narration error detail: {:?}", e);
            println!("{} ({})\n", e.user_message(), e);
        }
    }
    Ok(())
}

fn run_once(args: &Args, config: &AnalysisConfig) -> Result<()> {
    handle_load(args.daily.as_deref(), args.campaigns.as_deref(), config)?;
    handle_generate(config, &args.out)?;
    if args.narrate || args.prompt_only {
        handle_narrate(config, &args.out, args.prompt_only)?;
    }
    Ok(())
}

fn run_menu(args: &Args, config: &AnalysisConfig) {
    loop {
        println!("Select an option:");
        println!("[1] Load the files");
        println!("[2] Generate Reports");
        println!("[3] Generate Narration");
        println!("[4] Exit\n");
        let result = match read_line("Enter choice: ").as_str() {
            "1" => {
                let daily = read_optional_path("Daily CSV path (blank to skip): ");
                let campaigns = read_optional_path("Campaign CSV path (blank to skip): ");
                handle_load(daily.as_deref(), campaigns.as_deref(), config)
            }
            "2" => {
                println!();
                handle_generate(config, &args.out)
            }
            "3" => handle_narrate(config, &args.out, args.prompt_only),
            "4" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 1-4.\n");
                Ok(())
            }
        };
        if let Err(e) = result {
            eprintln!("Error: {:#}\n", e);
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match AnalysisConfig::load_or_default(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    if args.strict {
        config.parse_policy = ParsePolicy::Strict;
    }

    if args.daily.is_none() && args.campaigns.is_none() {
        run_menu(&args, &config);
        return;
    }
    if let Err(e) = run_once(&args, &config) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
