//! Campaign performance reporting.
//!
//! Reads per-day and per-campaign marketing exports, buckets the day rows by
//! month and Sunday-based week, derives rate and unit-price metrics, picks a
//! main month with a comparison baseline, and assembles an
//! [`AnalysisSummary`] for narration and rendering.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod insights;
pub mod loader;
pub mod metrics;
pub mod narration;
pub mod normalize;
pub mod output;
pub mod period;
pub mod prompt;
pub mod selector;
pub mod summary;
pub mod types;
pub mod util;

pub use config::{AnalysisConfig, FieldLabels, NarrationConfig, ParsePolicy};
pub use error::{NarrationError, ReportError, Result};
pub use period::MonthKey;
pub use summary::analyze;
pub use types::{
    AnalysisSummary, BaselineSource, CampaignSummary, DerivedMetrics, MonthComparison,
    NormalizedMetric, PeriodBucket, PeriodInfo, RawCampaignRow, RawDailyRow, RawRecord, Totals,
};
