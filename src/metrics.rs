//! Rate and unit-price derivation with zero-denominator guards.

use crate::types::{DerivedMetrics, NormalizedMetric, Totals};

/// `numerator / denominator * scale`, or 0 when the denominator is 0.
///
/// Never yields NaN or infinity for counter inputs.
pub fn ratio(numerator: u64, denominator: u64, scale: f64) -> f64 {
    if denominator > 0 {
        numerator as f64 / denominator as f64 * scale
    } else {
        0.0
    }
}

pub fn derive_metrics(m: &NormalizedMetric) -> DerivedMetrics {
    DerivedMetrics {
        ctr: ratio(m.clicks, m.impressions, 100.0),
        asr: ratio(m.application_starts, m.impressions, 100.0),
        completion_rate: ratio(m.applications, m.application_starts, 100.0),
        ar: ratio(m.applications, m.impressions, 100.0),
        cpc: ratio(m.cost, m.clicks, 1.0),
        cpas: ratio(m.cost, m.application_starts, 1.0),
        cpa: ratio(m.cost, m.applications, 1.0),
    }
}

/// Grand totals carry only CTR, CPC and CPA averages.
pub fn derive_totals(m: NormalizedMetric) -> Totals {
    Totals {
        metrics: m,
        avg_ctr: ratio(m.clicks, m.impressions, 100.0),
        avg_cpc: ratio(m.cost, m.clicks, 1.0),
        avg_cpa: ratio(m.cost, m.applications, 1.0),
    }
}
