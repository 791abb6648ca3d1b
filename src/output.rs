use crate::error::Result;
use crate::types::{AnalysisSummary, CampaignSummary, CampaignTableRow, PeriodBucket, PeriodTableRow};
use crate::util::{format_int, format_percent, format_yen};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};
use tracing::info;

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn period_row(b: &PeriodBucket) -> PeriodTableRow {
    PeriodTableRow {
        period: b.label.clone(),
        impressions: format_int(b.metrics.impressions),
        ctr: format_percent(b.derived.ctr),
        clicks: format_int(b.metrics.clicks),
        asr: format_percent(b.derived.asr),
        application_starts: format_int(b.metrics.application_starts),
        completion_rate: format_percent(b.derived.completion_rate),
        applications: format_int(b.metrics.applications),
        ar: format_percent(b.derived.ar),
        cost: format!("¥{}", format_int(b.metrics.cost)),
        cpc: format_yen(b.derived.cpc),
        cpas: format_yen(b.derived.cpas),
        cpa: format_yen(b.derived.cpa),
    }
}

pub fn campaign_row(c: &CampaignSummary) -> CampaignTableRow {
    CampaignTableRow {
        name: c.name.clone(),
        job_count: format_int(c.job_count),
        impressions: format_int(c.metrics.impressions),
        ctr: format_percent(c.derived.ctr),
        clicks: format_int(c.metrics.clicks),
        asr: format_percent(c.derived.asr),
        application_starts: format_int(c.metrics.application_starts),
        completion_rate: format_percent(c.derived.completion_rate),
        applications: format_int(c.metrics.applications),
        ar: format_percent(c.derived.ar),
        cost: format!("¥{}", format_int(c.metrics.cost)),
        cpc: format_yen(c.derived.cpc),
        cpas: format_yen(c.derived.cpas),
        cpa: format_yen(c.derived.cpa),
    }
}

pub fn markdown_table<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("{}\n", markdown_table(rows, max_rows));
}

/// Paths written by [`write_summary_files`].
#[derive(Debug, Clone)]
pub struct WrittenFiles {
    pub summary_json: PathBuf,
    pub monthly_csv: PathBuf,
    pub weekly_csv: PathBuf,
    pub campaigns_csv: PathBuf,
}

/// Write the summary JSON plus one CSV table per breakdown into `dir`.
pub fn write_summary_files(dir: &Path, summary: &AnalysisSummary) -> Result<WrittenFiles> {
    std::fs::create_dir_all(dir)?;
    let files = WrittenFiles {
        summary_json: dir.join("summary.json"),
        monthly_csv: dir.join("monthly.csv"),
        weekly_csv: dir.join("weekly.csv"),
        campaigns_csv: dir.join("campaigns.csv"),
    };
    write_json(&files.summary_json, summary)?;
    let monthly: Vec<_> = summary.monthly_data.iter().map(period_row).collect();
    write_csv(&files.monthly_csv, &monthly)?;
    let weekly: Vec<_> = summary.weekly_data.iter().map(period_row).collect();
    write_csv(&files.weekly_csv, &weekly)?;
    let campaigns: Vec<_> = summary.campaign_breakdown.iter().map(campaign_row).collect();
    write_csv(&files.campaigns_csv, &campaigns)?;
    info!("Wrote summary and tables to {}", dir.display());
    Ok(files)
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text)?;
    Ok(())
}
