//! Record normalization: header-keyed strings -> typed counters.
//!
//! The lenient/strict decision lives here and nowhere else. Lenient mode is
//! total: every cell that cannot be read becomes 0.

use crate::config::{FieldLabels, ParsePolicy};
use crate::error::{ReportError, Result};
use crate::types::{
    CampaignSummary, DerivedMetrics, NormalizedMetric, RawCampaignRow, RawDailyRow, RawRecord,
};
use crate::util::{clean_numeric, parse_f64_prefix, parse_u64_exact, parse_u64_lenient};

fn field(record: &RawRecord, label: &str) -> Option<String> {
    record.get(label).cloned()
}

impl RawDailyRow {
    pub fn from_record(record: &RawRecord, labels: &FieldLabels) -> Self {
        RawDailyRow {
            date: field(record, &labels.date),
            impressions: field(record, &labels.impressions),
            clicks: field(record, &labels.clicks),
            application_starts: field(record, &labels.application_starts),
            applications: field(record, &labels.applications),
            cost: field(record, &labels.cost),
        }
    }
}

impl RawCampaignRow {
    pub fn from_record(record: &RawRecord, labels: &FieldLabels) -> Self {
        RawCampaignRow {
            name: field(record, &labels.campaign),
            job_count: field(record, &labels.job_count),
            impressions: field(record, &labels.impressions),
            clicks: field(record, &labels.clicks),
            application_starts: field(record, &labels.application_starts),
            applications: field(record, &labels.applications),
            cost: field(record, &labels.cost),
            ctr: field(record, &labels.ctr),
            asr: field(record, &labels.asr),
            completion_rate: field(record, &labels.completion_rate),
            ar: field(record, &labels.ar),
            cpc: field(record, &labels.cpc),
            cpas: field(record, &labels.cpas),
            cpa: field(record, &labels.cpa),
        }
    }
}

/// Reads count cells under a given [`ParsePolicy`].
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    policy: ParsePolicy,
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(ParsePolicy::Lenient)
    }
}

impl Normalizer {
    pub fn new(policy: ParsePolicy) -> Self {
        Normalizer { policy }
    }

    /// A count cell. Missing or blank is 0 under either policy.
    pub fn count(&self, name: &str, value: Option<&str>) -> Result<u64> {
        match self.policy {
            ParsePolicy::Lenient => Ok(parse_u64_lenient(value)),
            ParsePolicy::Strict => match clean_numeric(value) {
                None => Ok(0),
                Some(cleaned) => parse_u64_exact(&cleaned).ok_or_else(|| invalid(name, value)),
            },
        }
    }

    /// A pre-computed rate cell stored as a fraction (`0.1` = 10%).
    /// Every cell is scaled by 100, including one with a stray `%` suffix.
    pub fn rate(&self, name: &str, value: Option<&str>) -> Result<f64> {
        let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(0.0);
        };
        Ok(self.float(name, raw, raw)? * 100.0)
    }

    /// A pre-computed unit price cell such as `¥1,234`.
    pub fn price(&self, name: &str, value: Option<&str>) -> Result<f64> {
        let Some(cleaned) = clean_numeric(value) else {
            return Ok(0.0);
        };
        self.float(name, value.unwrap_or_default(), &cleaned)
    }

    fn float(&self, name: &str, cell: &str, body: &str) -> Result<f64> {
        match self.policy {
            ParsePolicy::Lenient => Ok(parse_f64_prefix(body).unwrap_or(0.0)),
            ParsePolicy::Strict => body
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| invalid(name, Some(cell))),
        }
    }

    pub fn daily_metric(&self, row: &RawDailyRow) -> Result<NormalizedMetric> {
        Ok(NormalizedMetric {
            impressions: self.count("impressions", row.impressions.as_deref())?,
            clicks: self.count("clicks", row.clicks.as_deref())?,
            application_starts: self.count("applicationStarts", row.application_starts.as_deref())?,
            applications: self.count("applications", row.applications.as_deref())?,
            cost: self.count("cost", row.cost.as_deref())?,
        })
    }

    /// One campaign row -> one summary. Ratios come from the row's own
    /// columns, not from [`crate::metrics::derive_metrics`].
    pub fn campaign(&self, row: &RawCampaignRow) -> Result<CampaignSummary> {
        let name = row
            .name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Unknown")
            .to_string();
        let metrics = NormalizedMetric {
            impressions: self.count("impressions", row.impressions.as_deref())?,
            clicks: self.count("clicks", row.clicks.as_deref())?,
            application_starts: self.count("applicationStarts", row.application_starts.as_deref())?,
            applications: self.count("applications", row.applications.as_deref())?,
            cost: self.count("cost", row.cost.as_deref())?,
        };
        let derived = DerivedMetrics {
            ctr: self.rate("ctr", row.ctr.as_deref())?,
            asr: self.rate("asr", row.asr.as_deref())?,
            completion_rate: self.rate("completionRate", row.completion_rate.as_deref())?,
            ar: self.rate("ar", row.ar.as_deref())?,
            cpc: self.price("cpc", row.cpc.as_deref())?,
            cpas: self.price("cpas", row.cpas.as_deref())?,
            cpa: self.price("cpa", row.cpa.as_deref())?,
        };
        Ok(CampaignSummary {
            name,
            job_count: self.count("jobCount", row.job_count.as_deref())?,
            metrics,
            derived,
        })
    }
}

fn invalid(name: &str, value: Option<&str>) -> ReportError {
    ReportError::InvalidField {
        field: name.to_string(),
        value: value.unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize_daily(row: &RawDailyRow) -> NormalizedMetric {
        Normalizer::default().daily_metric(row).unwrap()
    }

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn daily_row_reads_default_labels() {
        let rec = record(&[
            ("期間：日単位", "2024-06-01"),
            ("表示回数", "1,000"),
            ("クリック数", "100"),
            ("応募開始数", "20"),
            ("応募数", "10"),
            ("費用", "¥5,000"),
        ]);
        let row = RawDailyRow::from_record(&rec, &FieldLabels::default());
        assert_eq!(row.date.as_deref(), Some("2024-06-01"));
        let m = normalize_daily(&row);
        assert_eq!(
            m,
            NormalizedMetric {
                impressions: 1000,
                clicks: 100,
                application_starts: 20,
                applications: 10,
                cost: 5000,
            }
        );
    }

    #[test]
    fn custom_labels_are_honoured() {
        let labels = FieldLabels {
            impressions: "Impr.".to_string(),
            ..FieldLabels::default()
        };
        let rec = record(&[("Impr.", "77"), ("表示回数", "1")]);
        let row = RawDailyRow::from_record(&rec, &labels);
        assert_eq!(normalize_daily(&row).impressions, 77);
    }

    #[test]
    fn lenient_daily_degrades_bad_cells_to_zero() {
        let row = RawDailyRow {
            date: s("2024-06-01"),
            impressions: s("lots"),
            clicks: None,
            application_starts: s(""),
            applications: s("-3"),
            cost: s("¥"),
        };
        assert_eq!(normalize_daily(&row), NormalizedMetric::default());
        let n = Normalizer::default();
        assert_eq!(n.daily_metric(&row).unwrap(), NormalizedMetric::default());
    }

    #[test]
    fn strict_daily_rejects_malformed_cells() {
        let n = Normalizer::new(ParsePolicy::Strict);
        let row = RawDailyRow {
            impressions: s("12x"),
            ..RawDailyRow::default()
        };
        match n.daily_metric(&row) {
            Err(ReportError::InvalidField { field, value }) => {
                assert_eq!(field, "impressions");
                assert_eq!(value, "12x");
            }
            other => panic!("expected InvalidField, got {:?}", other),
        }
    }

    #[test]
    fn strict_daily_still_accepts_separators_and_blanks() {
        let n = Normalizer::new(ParsePolicy::Strict);
        let row = RawDailyRow {
            impressions: s("1,234"),
            cost: s("¥9,000"),
            clicks: s(""),
            ..RawDailyRow::default()
        };
        let m = n.daily_metric(&row).unwrap();
        assert_eq!(m.impressions, 1234);
        assert_eq!(m.cost, 9000);
        assert_eq!(m.clicks, 0);
    }

    #[test]
    fn campaign_ratios_are_read_not_recomputed() {
        let row = RawCampaignRow {
            name: s("Campaign A"),
            job_count: s("12"),
            impressions: s("1,000"),
            clicks: s("50"),
            application_starts: s("10"),
            applications: s("5"),
            cost: s("¥10,000"),
            // Deliberately inconsistent with the counts above.
            ctr: s("0.1"),
            asr: s("0.02"),
            completion_rate: s("0.5"),
            ar: s("0.01"),
            cpc: s("¥1,234"),
            cpas: s("300"),
            cpa: s("¥2,000.5"),
        };
        let c = Normalizer::default().campaign(&row).unwrap();
        assert_eq!(c.name, "Campaign A");
        assert_eq!(c.job_count, 12);
        assert_eq!(c.metrics.cost, 10000);
        assert!((c.derived.ctr - 10.0).abs() < 1e-9);
        assert!((c.derived.asr - 2.0).abs() < 1e-9);
        assert!((c.derived.completion_rate - 50.0).abs() < 1e-9);
        assert!((c.derived.ar - 1.0).abs() < 1e-9);
        assert_eq!(c.derived.cpc, 1234.0);
        assert_eq!(c.derived.cpas, 300.0);
        assert_eq!(c.derived.cpa, 2000.5);
    }

    #[test]
    fn campaign_percent_suffix_is_still_scaled() {
        let row = RawCampaignRow {
            ctr: s("2.5%"),
            ..RawCampaignRow::default()
        };
        let c = Normalizer::default().campaign(&row).unwrap();
        assert_eq!(c.derived.ctr, 250.0);
        let err = Normalizer::new(ParsePolicy::Strict).campaign(&row).unwrap_err();
        assert!(matches!(err, ReportError::InvalidField { ref field, .. } if field == "ctr"));
    }

    #[test]
    fn campaign_without_name_is_unknown() {
        let c = Normalizer::default().campaign(&RawCampaignRow::default()).unwrap();
        assert_eq!(c.name, "Unknown");
        assert_eq!(c.metrics, NormalizedMetric::default());
        assert_eq!(c.derived, DerivedMetrics::default());
    }

    #[test]
    fn strict_campaign_rejects_bad_rate() {
        let row = RawCampaignRow {
            ar: s("n/a"),
            ..RawCampaignRow::default()
        };
        let err = Normalizer::new(ParsePolicy::Strict).campaign(&row).unwrap_err();
        assert!(matches!(err, ReportError::InvalidField { ref field, .. } if field == "ar"));
    }
}
