//! Main-month selection and the comparison baseline.
//!
//! The baseline resolves in three tiers:
//! 1. the bucket for the arithmetic previous month,
//! 2. else the bucket sorted just before the main month,
//! 3. else a zero-valued placeholder named after the previous month.

use crate::period::MonthKey;
use crate::types::{
    BaselineSource, DerivedMetrics, MetricDiff, MonthComparison, NormalizedMetric, PeriodBucket,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// The month with the most dated rows. Ties go to the earliest month key.
pub fn select_main_month(dates: &[NaiveDate]) -> Option<MonthKey> {
    let mut counts: BTreeMap<MonthKey, usize> = BTreeMap::new();
    for date in dates {
        *counts.entry(MonthKey::from_date(*date)).or_default() += 1;
    }
    let mut best: Option<(MonthKey, usize)> = None;
    for (key, count) in counts {
        match best {
            Some((_, top)) if count <= top => {}
            _ => best = Some((key, count)),
        }
    }
    best.map(|(key, _)| key)
}

/// One calendar month before `main`, by arithmetic only.
pub fn base_month(main: MonthKey) -> MonthKey {
    main.previous()
}

/// Zero-valued stand-in used when no earlier month has data. Its label
/// keeps the key's zero-padded month (`05月`), unlike real month buckets.
pub fn placeholder_bucket(month: MonthKey) -> PeriodBucket {
    PeriodBucket {
        key: month.to_string(),
        label: format!("{:02}月", month.month()),
        start_date: None,
        record_count: 0,
        metrics: NormalizedMetric::default(),
        derived: DerivedMetrics::default(),
    }
}

/// Resolve the comparison baseline for `main`.
///
/// `by_key` is the month map from aggregation, `sorted` the ascending
/// monthly sequence of the summary.
pub fn resolve_baseline(
    by_key: &BTreeMap<MonthKey, PeriodBucket>,
    sorted: &[PeriodBucket],
    main: MonthKey,
    base: MonthKey,
) -> (PeriodBucket, BaselineSource) {
    if let Some(bucket) = by_key.get(&base) {
        return (bucket.clone(), BaselineSource::Exact);
    }
    let main_key = main.to_string();
    match sorted.iter().position(|b| b.key == main_key) {
        Some(idx) if idx > 0 => {
            debug!(
                "No data for {}; comparing {} against {}",
                base, main, sorted[idx - 1].key
            );
            (sorted[idx - 1].clone(), BaselineSource::Predecessor)
        }
        _ => {
            debug!("No month before {}; using zero placeholder for {}", main, base);
            (placeholder_bucket(base), BaselineSource::Placeholder)
        }
    }
}

/// The bucket for `main`, falling back to the first month when absent.
pub fn main_bucket(sorted: &[PeriodBucket], main: MonthKey) -> Option<PeriodBucket> {
    let key = main.to_string();
    sorted
        .iter()
        .find(|b| b.key == key)
        .or_else(|| sorted.first())
        .cloned()
}

fn signed_diff(a: u64, b: u64) -> i64 {
    if a >= b {
        i64::try_from(a - b).unwrap_or(i64::MAX)
    } else {
        -i64::try_from(b - a).unwrap_or(i64::MAX)
    }
}

/// Main minus baseline for every base and derived field, unrounded.
pub fn diff(main: &PeriodBucket, baseline: &PeriodBucket) -> MetricDiff {
    let (m, b) = (&main.metrics, &baseline.metrics);
    let (md, bd) = (&main.derived, &baseline.derived);
    MetricDiff {
        impressions: signed_diff(m.impressions, b.impressions),
        clicks: signed_diff(m.clicks, b.clicks),
        application_starts: signed_diff(m.application_starts, b.application_starts),
        applications: signed_diff(m.applications, b.applications),
        cost: signed_diff(m.cost, b.cost),
        ctr: md.ctr - bd.ctr,
        asr: md.asr - bd.asr,
        completion_rate: md.completion_rate - bd.completion_rate,
        ar: md.ar - bd.ar,
        cpc: md.cpc - bd.cpc,
        cpas: md.cpas - bd.cpas,
        cpa: md.cpa - bd.cpa,
    }
}

/// Build the month-over-month comparison, or `None` without monthly data.
pub fn compare_months(
    by_key: &BTreeMap<MonthKey, PeriodBucket>,
    sorted: &[PeriodBucket],
    main: MonthKey,
    base: MonthKey,
) -> Option<MonthComparison> {
    let main_data = main_bucket(sorted, main)?;
    let (baseline, baseline_source) = resolve_baseline(by_key, sorted, main, base);
    Some(MonthComparison {
        diff: diff(&main_data, &baseline),
        main: main_data,
        baseline,
        baseline_source,
    })
}
