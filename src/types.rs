use crate::period::MonthKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tabled::Tabled;

/// One CSV row as emitted by the upstream parser: header label -> cell text.
pub type RawRecord = HashMap<String, String>;

/// A day-level export row after label lookup, still untyped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDailyRow {
    pub date: Option<String>,
    pub impressions: Option<String>,
    pub clicks: Option<String>,
    pub application_starts: Option<String>,
    pub applications: Option<String>,
    pub cost: Option<String>,
}

/// A per-campaign export row. Ratio and price columns come pre-computed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCampaignRow {
    pub name: Option<String>,
    pub job_count: Option<String>,
    pub impressions: Option<String>,
    pub clicks: Option<String>,
    pub application_starts: Option<String>,
    pub applications: Option<String>,
    pub cost: Option<String>,
    pub ctr: Option<String>,
    pub asr: Option<String>,
    pub completion_rate: Option<String>,
    pub ar: Option<String>,
    pub cpc: Option<String>,
    pub cpas: Option<String>,
    pub cpa: Option<String>,
}

/// The five additive base counters. Cost is in whole currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMetric {
    pub impressions: u64,
    pub clicks: u64,
    pub application_starts: u64,
    pub applications: u64,
    pub cost: u64,
}

impl NormalizedMetric {
    /// Field-wise sum, saturating at `u64::MAX`.
    pub fn add(&mut self, other: &NormalizedMetric) {
        self.impressions = self.impressions.saturating_add(other.impressions);
        self.clicks = self.clicks.saturating_add(other.clicks);
        self.application_starts = self.application_starts.saturating_add(other.application_starts);
        self.applications = self.applications.saturating_add(other.applications);
        self.cost = self.cost.saturating_add(other.cost);
    }
}

/// Rates are percentages (0-100), prices are currency per unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub ctr: f64,
    pub asr: f64,
    pub completion_rate: f64,
    pub ar: f64,
    pub cpc: f64,
    pub cpas: f64,
    pub cpa: f64,
}

/// A month or week bucket.
///
/// Month buckets use `YYYY-MM` as `key` and `"6月"` style labels; week
/// buckets use the `"M/D〜M/D"` span as both key and label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodBucket {
    pub key: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    pub record_count: usize,
    #[serde(flatten)]
    pub metrics: NormalizedMetric,
    #[serde(flatten)]
    pub derived: DerivedMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignSummary {
    pub name: String,
    pub job_count: u64,
    #[serde(flatten)]
    pub metrics: NormalizedMetric,
    #[serde(flatten)]
    pub derived: DerivedMetrics,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodInfo {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub main_month: Option<MonthKey>,
    pub base_month: Option<MonthKey>,
    pub analysis_title: String,
}

/// Grand totals over every dated daily row. Only three averages are
/// derived at this level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    #[serde(flatten)]
    pub metrics: NormalizedMetric,
    #[serde(rename = "avgCTR")]
    pub avg_ctr: f64,
    #[serde(rename = "avgCPC")]
    pub avg_cpc: f64,
    #[serde(rename = "avgCPA")]
    pub avg_cpa: f64,
}

/// Which fallback tier produced the comparison baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaselineSource {
    /// A bucket exists for the arithmetic previous month.
    Exact,
    /// The bucket sorted immediately before the main month.
    Predecessor,
    /// Zero-valued stand-in; no earlier data exists.
    Placeholder,
}

/// Main minus baseline, field by field. Rate diffs are percentage points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricDiff {
    pub impressions: i64,
    pub clicks: i64,
    pub application_starts: i64,
    pub applications: i64,
    pub cost: i64,
    pub ctr: f64,
    pub asr: f64,
    pub completion_rate: f64,
    pub ar: f64,
    pub cpc: f64,
    pub cpas: f64,
    pub cpa: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthComparison {
    pub main: PeriodBucket,
    pub baseline: PeriodBucket,
    pub baseline_source: BaselineSource,
    pub diff: MetricDiff,
}

/// Everything the narration and rendering layers are allowed to see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub totals: Totals,
    pub monthly_data: Vec<PeriodBucket>,
    pub weekly_data: Vec<PeriodBucket>,
    pub campaign_breakdown: Vec<CampaignSummary>,
    pub period_info: PeriodInfo,
    pub comparison: Option<MonthComparison>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct PeriodTableRow {
    #[serde(rename = "期間")]
    #[tabled(rename = "期間")]
    pub period: String,
    #[serde(rename = "表示回数")]
    #[tabled(rename = "表示回数")]
    pub impressions: String,
    #[serde(rename = "クリック率")]
    #[tabled(rename = "クリック率")]
    pub ctr: String,
    #[serde(rename = "クリック数")]
    #[tabled(rename = "クリック数")]
    pub clicks: String,
    #[serde(rename = "応募開始率")]
    #[tabled(rename = "応募開始率")]
    pub asr: String,
    #[serde(rename = "応募開始数")]
    #[tabled(rename = "応募開始数")]
    pub application_starts: String,
    #[serde(rename = "応募完了率")]
    #[tabled(rename = "応募完了率")]
    pub completion_rate: String,
    #[serde(rename = "応募数")]
    #[tabled(rename = "応募数")]
    pub applications: String,
    #[serde(rename = "応募率")]
    #[tabled(rename = "応募率")]
    pub ar: String,
    #[serde(rename = "費用")]
    #[tabled(rename = "費用")]
    pub cost: String,
    #[serde(rename = "クリック単価")]
    #[tabled(rename = "クリック単価")]
    pub cpc: String,
    #[serde(rename = "応募開始単価")]
    #[tabled(rename = "応募開始単価")]
    pub cpas: String,
    #[serde(rename = "応募単価")]
    #[tabled(rename = "応募単価")]
    pub cpa: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CampaignTableRow {
    #[serde(rename = "キャンペーン")]
    #[tabled(rename = "キャンペーン")]
    pub name: String,
    #[serde(rename = "Job Count")]
    #[tabled(rename = "Job Count")]
    pub job_count: String,
    #[serde(rename = "表示回数")]
    #[tabled(rename = "表示回数")]
    pub impressions: String,
    #[serde(rename = "クリック率")]
    #[tabled(rename = "クリック率")]
    pub ctr: String,
    #[serde(rename = "クリック数")]
    #[tabled(rename = "クリック数")]
    pub clicks: String,
    #[serde(rename = "応募開始率")]
    #[tabled(rename = "応募開始率")]
    pub asr: String,
    #[serde(rename = "応募開始数")]
    #[tabled(rename = "応募開始数")]
    pub application_starts: String,
    #[serde(rename = "応募完了率")]
    #[tabled(rename = "応募完了率")]
    pub completion_rate: String,
    #[serde(rename = "応募数")]
    #[tabled(rename = "応募数")]
    pub applications: String,
    #[serde(rename = "応募率")]
    #[tabled(rename = "応募率")]
    pub ar: String,
    #[serde(rename = "費用")]
    #[tabled(rename = "費用")]
    pub cost: String,
    #[serde(rename = "クリック単価")]
    #[tabled(rename = "クリック単価")]
    pub cpc: String,
    #[serde(rename = "応募開始単価")]
    #[tabled(rename = "応募開始単価")]
    pub cpas: String,
    #[serde(rename = "応募単価")]
    #[tabled(rename = "応募単価")]
    pub cpa: String,
}
