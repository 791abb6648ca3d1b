//! Narration prompt built from a finished summary.
//!
//! Output depends only on the summary, so identical uploads give identical
//! prompts.

use crate::types::AnalysisSummary;
use crate::util::{format_int, format_number, format_percent, format_yen};
use std::fmt::Write;

const VIEWPOINTS: [&str; 5] = [
    "全体的なパフォーマンス評価",
    "最も効果的なキャンペーンの特定",
    "改善が必要な領域",
    "コスト効率性の評価",
    "具体的な改善提案",
];

pub fn build_prompt(summary: &AnalysisSummary) -> String {
    let t = &summary.totals;
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "以下のマーケティングキャンペーンデータを分析してください：");
    if !summary.period_info.analysis_title.is_empty() {
        let _ = writeln!(out, "対象期間: {}", summary.period_info.analysis_title);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "基本統計:");
    let _ = writeln!(out, "- 総表示回数: {}", format_int(t.metrics.impressions));
    let _ = writeln!(out, "- 総クリック数: {}", format_int(t.metrics.clicks));
    let _ = writeln!(out, "- 総応募数: {}", format_int(t.metrics.applications));
    let _ = writeln!(out, "- 総費用: ¥{}", format_int(t.metrics.cost));
    let _ = writeln!(out, "- 平均CTR: {}", format_percent(t.avg_ctr));
    let _ = writeln!(out, "- 平均CPC: {}", format_yen(t.avg_cpc));
    let _ = writeln!(out, "- 平均CPA: {}", format_yen(t.avg_cpa));

    if let Some(cmp) = &summary.comparison {
        let _ = writeln!(out);
        let _ = writeln!(out, "前月比 ({}: {}):", cmp.baseline.label, cmp.main.label);
        let _ = writeln!(out, "- 表示回数: {:+}", cmp.diff.impressions);
        let _ = writeln!(out, "- クリック率: {}pt", signed(cmp.diff.ctr, 2));
        let _ = writeln!(out, "- 応募率: {}pt", signed(cmp.diff.ar, 2));
        let _ = writeln!(out, "- 応募単価: ¥{}", signed(cmp.diff.cpa, 0));
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "キャンペーン別データ:");
    for c in &summary.campaign_breakdown {
        let _ = writeln!(
            out,
            "- {}: 表示回数{}, CTR{}, CPA{}",
            c.name,
            format_int(c.metrics.impressions),
            format_percent(c.derived.ctr),
            format_yen(c.derived.cpa)
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "以下の観点で分析してください：");
    for (i, v) in VIEWPOINTS.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, v);
    }
    let _ = writeln!(out);
    let _ = write!(out, "日本語で詳細な分析結果を提供してください。");
    out
}

fn signed(n: f64, decimals: usize) -> String {
    let body = format_number(n, decimals);
    if body.starts_with('-') {
        body
    } else {
        format!("+{}", body)
    }
}
