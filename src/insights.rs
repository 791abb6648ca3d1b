//! Simple rule-based findings over a finished summary.

use crate::types::{AnalysisSummary, CampaignSummary};
use serde::{Deserialize, Serialize};

/// Campaigns below this share of the average CTR are flagged.
const LOW_CTR_FACTOR: f64 = 0.8;
/// Campaigns above this multiple of the average CPA are flagged.
const HIGH_CPA_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostEfficiency {
    Excellent,
    Good,
    NeedsImprovement,
}

impl CostEfficiency {
    pub fn from_avg_cpa(avg_cpa: f64) -> Self {
        if avg_cpa < 1000.0 {
            CostEfficiency::Excellent
        } else if avg_cpa < 2000.0 {
            CostEfficiency::Good
        } else {
            CostEfficiency::NeedsImprovement
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub top_performing_campaign: Option<CampaignSummary>,
    pub worst_performing_campaign: Option<CampaignSummary>,
    pub cost_efficiency: CostEfficiency,
    pub recommendations: Vec<Recommendation>,
}

/// First campaign holding the highest CTR.
pub fn top_by_ctr(campaigns: &[CampaignSummary]) -> Option<&CampaignSummary> {
    campaigns.iter().reduce(|best, c| if c.derived.ctr > best.derived.ctr { c } else { best })
}

/// First campaign holding the lowest CTR.
pub fn worst_by_ctr(campaigns: &[CampaignSummary]) -> Option<&CampaignSummary> {
    campaigns.iter().reduce(|worst, c| if c.derived.ctr < worst.derived.ctr { c } else { worst })
}

pub fn recommendations(summary: &AnalysisSummary) -> Vec<Recommendation> {
    let campaigns = &summary.campaign_breakdown;
    let totals = &summary.totals;
    let mut out = Vec::new();

    let low_ctr = campaigns
        .iter()
        .filter(|c| c.derived.ctr < totals.avg_ctr * LOW_CTR_FACTOR)
        .count();
    if low_ctr > 0 {
        out.push(Recommendation {
            kind: RecommendationKind::Warning,
            title: "CTR改善が必要".to_string(),
            description: format!("{}個のキャンペーンでCTRが平均を下回っています", low_ctr),
        });
    }

    let high_cpa = campaigns
        .iter()
        .filter(|c| c.derived.cpa > totals.avg_cpa * HIGH_CPA_FACTOR)
        .count();
    if high_cpa > 0 {
        out.push(Recommendation {
            kind: RecommendationKind::Info,
            title: "コスト最適化の機会".to_string(),
            description: format!("{}個のキャンペーンでCPAが高くなっています", high_cpa),
        });
    }
    out
}

pub fn derive_insights(summary: &AnalysisSummary) -> Insights {
    Insights {
        top_performing_campaign: top_by_ctr(&summary.campaign_breakdown).cloned(),
        worst_performing_campaign: worst_by_ctr(&summary.campaign_breakdown).cloned(),
        cost_efficiency: CostEfficiency::from_avg_cpa(summary.totals.avg_cpa),
        recommendations: recommendations(summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DerivedMetrics, NormalizedMetric, PeriodInfo, Totals};

    fn campaign(name: &str, ctr: f64, cpa: f64) -> CampaignSummary {
        CampaignSummary {
            name: name.to_string(),
            job_count: 0,
            metrics: NormalizedMetric::default(),
            derived: DerivedMetrics {
                ctr,
                cpa,
                ..DerivedMetrics::default()
            },
        }
    }

    fn summary(avg_ctr: f64, avg_cpa: f64, campaigns: Vec<CampaignSummary>) -> AnalysisSummary {
        AnalysisSummary {
            totals: Totals {
                avg_ctr,
                avg_cpa,
                ..Totals::default()
            },
            monthly_data: vec![],
            weekly_data: vec![],
            campaign_breakdown: campaigns,
            period_info: PeriodInfo::default(),
            comparison: None,
        }
    }

    #[test]
    fn cost_efficiency_thresholds() {
        assert_eq!(CostEfficiency::from_avg_cpa(0.0), CostEfficiency::Excellent);
        assert_eq!(CostEfficiency::from_avg_cpa(999.9), CostEfficiency::Excellent);
        assert_eq!(CostEfficiency::from_avg_cpa(1000.0), CostEfficiency::Good);
        assert_eq!(CostEfficiency::from_avg_cpa(2000.0), CostEfficiency::NeedsImprovement);
    }

    #[test]
    fn top_and_worst_keep_first_on_ties() {
        let cs = vec![campaign("a", 2.0, 0.0), campaign("b", 5.0, 0.0), campaign("c", 5.0, 0.0), campaign("d", 2.0, 0.0)];
        assert_eq!(top_by_ctr(&cs).unwrap().name, "b");
        assert_eq!(worst_by_ctr(&cs).unwrap().name, "a");
        assert!(top_by_ctr(&[]).is_none());
    }

    #[test]
    fn recommendations_flag_low_ctr_and_high_cpa() {
        let s = summary(
            5.0,
            1000.0,
            vec![campaign("low", 3.9, 900.0), campaign("ok", 4.0, 1200.0), campaign("pricey", 6.0, 1200.1)],
        );
        let recs = recommendations(&s);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].kind, RecommendationKind::Warning);
        assert!(recs[0].description.starts_with("1個"));
        assert_eq!(recs[1].kind, RecommendationKind::Info);
        assert!(recs[1].description.starts_with("1個"));
    }

    #[test]
    fn no_campaigns_no_findings() {
        let insights = derive_insights(&summary(0.0, 0.0, vec![]));
        assert!(insights.top_performing_campaign.is_none());
        assert!(insights.recommendations.is_empty());
        assert_eq!(insights.cost_efficiency, CostEfficiency::Excellent);
    }
}
