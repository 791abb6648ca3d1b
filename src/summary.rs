//! Assembles the aggregation, selection and metric steps into one
//! [`AnalysisSummary`].

use crate::aggregator::{aggregate_campaigns, aggregate_daily};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::metrics::derive_totals;
use crate::normalize::Normalizer;
use crate::period::span_title;
use crate::selector::{base_month, compare_months, select_main_month};
use crate::types::{AnalysisSummary, PeriodInfo, RawCampaignRow, RawDailyRow};
use tracing::info;

/// Run the whole analysis over one upload.
///
/// Either input may be empty. Under the default lenient policy this never
/// fails; a strict policy surfaces the first malformed cell.
pub fn analyze(
    daily: &[RawDailyRow],
    campaigns: &[RawCampaignRow],
    config: &AnalysisConfig,
) -> Result<AnalysisSummary> {
    let normalizer = Normalizer::new(config.parse_policy);
    let agg = aggregate_daily(daily, &normalizer)?;
    let campaign_breakdown = aggregate_campaigns(campaigns, &normalizer)?;

    let monthly_data: Vec<_> = agg.monthly.values().cloned().collect();
    let weekly_data: Vec<_> = agg.weekly.values().cloned().collect();

    let start_date = agg.dates.iter().min().copied();
    let end_date = agg.dates.iter().max().copied();
    let main_month = select_main_month(&agg.dates);
    let base = main_month.map(base_month);

    let comparison = match (main_month, base) {
        (Some(main), Some(base)) => compare_months(&agg.monthly, &monthly_data, main, base),
        _ => None,
    };

    let analysis_title = match (start_date, end_date) {
        (Some(start), Some(end)) => span_title(start, end),
        _ => String::new(),
    };

    info!(
        "Analysed {} daily rows ({} skipped), {} months, {} weeks, {} campaign rows",
        agg.dates.len(),
        agg.skipped_rows,
        monthly_data.len(),
        weekly_data.len(),
        campaign_breakdown.len()
    );

    Ok(AnalysisSummary {
        totals: derive_totals(agg.totals),
        monthly_data,
        weekly_data,
        campaign_breakdown,
        period_info: PeriodInfo {
            start_date,
            end_date,
            main_month,
            base_month: base,
            analysis_title,
        },
        comparison,
    })
}
