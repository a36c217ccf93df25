//! Risk scoring.
//!
//! A pure function over an [`ImpactReport`], evaluated in strict order:
//! the comment-only override, the critical-and-deep override, then a
//! weighted multiplier score mapped onto a categorical level. Missing
//! input defaults to the risk-reducing side; scoring never fails.

use crate::impact::ImpactReport;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Categorical merge-risk verdict, ordered by severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Scores an impact report into a risk level.
pub fn score(report: &ImpactReport) -> RiskLevel {
    if report.comment_only_override {
        info!("comment-only change, forcing LOW");
        return RiskLevel::Low;
    }

    if report.critical_method_override && report.depth >= 3 {
        info!(depth = report.depth, "critical entity with deep impact, forcing CRITICAL");
        return RiskLevel::Critical;
    }

    let depth = depth_multiplier(report.depth);
    let affected = affected_multiplier(report.affected_count());
    let complexity = complexity_multiplier(report.avg_changed_complexity() as usize);
    let critical = if report.has_critical_changed_entity() {
        3.0
    } else {
        1.0
    };

    let final_score = 1.0 * depth * affected * complexity * critical;
    debug!(
        depth, affected, complexity, critical, final_score,
        "risk multipliers"
    );

    let level = map_score(final_score);
    info!(score = final_score, level = %level, "risk verdict");
    level
}

fn depth_multiplier(depth: usize) -> f64 {
    match depth {
        0 | 1 => 1.0,
        2 => 1.5,
        _ => 2.5,
    }
}

fn affected_multiplier(affected: usize) -> f64 {
    match affected {
        0..=2 => 1.0,
        3..=5 => 1.5,
        6..=10 => 2.0,
        _ => 2.5,
    }
}

fn complexity_multiplier(avg: usize) -> f64 {
    match avg {
        0..=5 => 1.0,
        6..=15 => 1.5,
        _ => 2.0,
    }
}

fn map_score(score: f64) -> RiskLevel {
    if score <= 1.0 {
        RiskLevel::Low
    } else if score <= 2.0 {
        RiskLevel::Medium
    } else if score <= 3.5 {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}
