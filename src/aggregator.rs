//! Folds normalized rows into month/week buckets, grand totals and
//! per-campaign summaries.
//!
//! Every fold builds fresh maps from an immutable input slice; nothing is
//! shared between runs.

use crate::error::Result;
use crate::metrics::derive_metrics;
use crate::normalize::Normalizer;
use crate::period::{MonthKey, WeekSpan};
use crate::types::{CampaignSummary, NormalizedMetric, PeriodBucket, RawCampaignRow, RawDailyRow};
use crate::util::parse_date_safe;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
struct BucketAccumulator {
    metrics: NormalizedMetric,
    records: usize,
}

impl BucketAccumulator {
    fn add(&mut self, m: &NormalizedMetric) {
        self.metrics.add(m);
        self.records += 1;
    }

    fn into_bucket(self, key: String, label: String, start_date: Option<NaiveDate>) -> PeriodBucket {
        PeriodBucket {
            key,
            label,
            start_date,
            record_count: self.records,
            derived: derive_metrics(&self.metrics),
            metrics: self.metrics,
        }
    }
}

/// Result of folding the day-level rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyAggregation {
    pub monthly: BTreeMap<MonthKey, PeriodBucket>,
    /// Keyed by the `M/D〜M/D` label, so iteration is label order.
    pub weekly: BTreeMap<String, PeriodBucket>,
    /// Dates of every counted row, in input order.
    pub dates: Vec<NaiveDate>,
    pub totals: NormalizedMetric,
    /// Rows dropped because their date did not parse.
    pub skipped_rows: usize,
}

#[derive(Default)]
struct DailyFold {
    monthly: BTreeMap<MonthKey, BucketAccumulator>,
    weekly: BTreeMap<String, (WeekSpan, BucketAccumulator)>,
    dates: Vec<NaiveDate>,
    totals: NormalizedMetric,
    skipped_rows: usize,
}

impl DailyFold {
    fn push(mut self, date: NaiveDate, m: NormalizedMetric) -> Self {
        self.monthly.entry(MonthKey::from_date(date)).or_default().add(&m);
        let span = WeekSpan::containing(date);
        self.weekly
            .entry(span.label())
            .or_insert_with(|| (span, BucketAccumulator::default()))
            .1
            .add(&m);
        self.totals.add(&m);
        self.dates.push(date);
        self
    }

    fn finish(self) -> DailyAggregation {
        let monthly = self
            .monthly
            .into_iter()
            .map(|(key, acc)| (key, acc.into_bucket(key.to_string(), key.label(), None)))
            .collect();
        let weekly = self
            .weekly
            .into_iter()
            .map(|(label, (span, acc))| {
                let bucket = acc.into_bucket(label.clone(), label.clone(), Some(span.start));
                (label, bucket)
            })
            .collect();
        DailyAggregation {
            monthly,
            weekly,
            dates: self.dates,
            totals: self.totals,
            skipped_rows: self.skipped_rows,
        }
    }
}

/// Fold day-level rows. Rows whose date does not parse are skipped
/// entirely. Only a strict [`Normalizer`] can make this fail.
pub fn aggregate_daily(rows: &[RawDailyRow], normalizer: &Normalizer) -> Result<DailyAggregation> {
    let fold = rows.iter().enumerate().try_fold(
        DailyFold::default(),
        |mut fold, (idx, row)| -> Result<DailyFold> {
            let Some(date) = parse_date_safe(row.date.as_deref()) else {
                debug!("Skipping daily row {}: unparseable date {:?}", idx + 1, row.date);
                fold.skipped_rows += 1;
                return Ok(fold);
            };
            let metric = normalizer.daily_metric(row)?;
            Ok(fold.push(date, metric))
        },
    )?;
    Ok(fold.finish())
}

/// One summary per campaign row, in input order. Rows sharing a name are
/// kept as separate entries.
pub fn aggregate_campaigns(rows: &[RawCampaignRow], normalizer: &Normalizer) -> Result<Vec<CampaignSummary>> {
    rows.iter().map(|row| normalizer.campaign(row)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParsePolicy;

    fn day(date: &str, impressions: &str, clicks: &str, starts: &str, apps: &str, cost: &str) -> RawDailyRow {
        RawDailyRow {
            date: Some(date.to_string()),
            impressions: Some(impressions.to_string()),
            clicks: Some(clicks.to_string()),
            application_starts: Some(starts.to_string()),
            applications: Some(apps.to_string()),
            cost: Some(cost.to_string()),
        }
    }

    fn month(agg: &DailyAggregation, key: &str) -> PeriodBucket {
        agg.monthly[&key.parse::<MonthKey>().unwrap()].clone()
    }

    #[test]
    fn same_month_rows_sum_into_one_bucket() {
        let rows = vec![
            day("2024-06-01", "1,000", "100", "20", "10", "¥5,000"),
            day("2024-06-15", "500", "25", "5", "1", "¥1,000"),
        ];
        let agg = aggregate_daily(&rows, &Normalizer::default()).unwrap();
        assert_eq!(agg.monthly.len(), 1);
        let june = month(&agg, "2024-06");
        assert_eq!(june.key, "2024-06");
        assert_eq!(june.label, "6月");
        assert_eq!(june.record_count, 2);
        assert_eq!(june.metrics.impressions, 1500);
        assert_eq!(june.metrics.clicks, 125);
        assert_eq!(june.metrics.application_starts, 25);
        assert_eq!(june.metrics.applications, 11);
        assert_eq!(june.metrics.cost, 6000);
        assert_eq!(agg.totals, june.metrics);
    }

    #[test]
    fn aggregation_is_additive_across_splits() {
        let a = day("2024-06-03", "300", "30", "6", "2", "900");
        let b = day("2024-06-20", "700", "14", "7", "3", "2,100");
        let n = Normalizer::default();
        let together = aggregate_daily(&[a.clone(), b.clone()], &n).unwrap();
        let left = aggregate_daily(&[a], &n).unwrap();
        let right = aggregate_daily(&[b], &n).unwrap();

        let mut summed = month(&left, "2024-06").metrics;
        summed.add(&month(&right, "2024-06").metrics);
        assert_eq!(month(&together, "2024-06").metrics, summed);
    }

    #[test]
    fn derived_metrics_use_bucket_sums() {
        let rows = vec![
            day("2024-06-01", "1,000", "100", "20", "10", "¥5,000"),
        ];
        let agg = aggregate_daily(&rows, &Normalizer::default()).unwrap();
        let june = month(&agg, "2024-06");
        assert_eq!(june.derived.ctr, 10.0);
        assert_eq!(june.derived.ar, 1.0);
        assert_eq!(june.derived.asr, 2.0);
        assert_eq!(june.derived.cpc, 50.0);
        assert_eq!(june.derived.cpa, 500.0);
        assert_eq!(june.derived.cpas, 250.0);
        assert_eq!(june.derived.completion_rate, 50.0);
    }

    #[test]
    fn rows_bucket_into_sunday_weeks() {
        let rows = vec![
            // Sun, Sat of the same week, then the next Sunday.
            day("2024-06-02", "10", "1", "0", "0", "0"),
            day("2024-06-08", "20", "2", "0", "0", "0"),
            day("2024-06-09", "40", "4", "0", "0", "0"),
        ];
        let agg = aggregate_daily(&rows, &Normalizer::default()).unwrap();
        assert_eq!(agg.weekly.len(), 2);
        let first = &agg.weekly["6/2〜6/8"];
        assert_eq!(first.metrics.impressions, 30);
        assert_eq!(first.record_count, 2);
        assert_eq!(first.start_date, NaiveDate::from_ymd_opt(2024, 6, 2));
        assert_eq!(agg.weekly["6/9〜6/15"].metrics.impressions, 40);
    }

    #[test]
    fn undated_rows_are_skipped_not_counted() {
        let rows = vec![
            day("合計", "9,999", "999", "99", "9", "¥99,999"),
            day("2024-06-01", "100", "10", "0", "0", "0"),
            RawDailyRow::default(),
        ];
        let agg = aggregate_daily(&rows, &Normalizer::default()).unwrap();
        assert_eq!(agg.skipped_rows, 2);
        assert_eq!(agg.dates.len(), 1);
        assert_eq!(agg.totals.impressions, 100);
    }

    #[test]
    fn empty_input_gives_empty_aggregation() {
        let agg = aggregate_daily(&[], &Normalizer::default()).unwrap();
        assert!(agg.monthly.is_empty());
        assert!(agg.weekly.is_empty());
        assert!(agg.dates.is_empty());
        assert_eq!(agg.totals, NormalizedMetric::default());
    }

    #[test]
    fn strict_mode_surfaces_bad_cells() {
        let rows = vec![day("2024-06-01", "oops", "0", "0", "0", "0")];
        assert!(aggregate_daily(&rows, &Normalizer::new(ParsePolicy::Strict)).is_err());
        assert!(aggregate_daily(&rows, &Normalizer::default()).is_ok());
    }

    #[test]
    fn duplicate_campaign_names_stay_separate() {
        let row = RawCampaignRow {
            name: Some("Campaign A".to_string()),
            impressions: Some("100".to_string()),
            ..RawCampaignRow::default()
        };
        let out = aggregate_campaigns(&[row.clone(), row], &Normalizer::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.name == "Campaign A" && c.metrics.impressions == 100));
    }
}
