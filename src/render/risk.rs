//! Risk classification shared by every per-region colored view

use serde::Serialize;

/// 14-day case total above which a growing epidemic is high risk
pub const RISK_CASE_THRESHOLD: f64 = 400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Watch,
    High,
}

impl RiskLevel {
    /// Levels in tier order
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Watch, RiskLevel::High];

    /// Classify from the latest Rt and the 14-day case total.
    ///
    /// Undefined Rt is low risk.
    pub fn classify(rt: Option<f64>, total_14d: f64) -> Self {
        match rt {
            Some(rt) if rt > 1.0 && total_14d > RISK_CASE_THRESHOLD => RiskLevel::High,
            Some(rt) if rt > 1.0 => RiskLevel::Watch,
            _ => RiskLevel::Low,
        }
    }

    /// Ordinal value used to place a level on a discrete colorscale
    pub fn tier(self) -> f64 {
        match self {
            RiskLevel::Low => 0.0,
            RiskLevel::Watch => 1.0,
            RiskLevel::High => 2.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Watch => "Watch",
            RiskLevel::High => "High",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RiskLevel::Low => "blue",
            RiskLevel::Watch => "orange",
            RiskLevel::High => "red",
        }
    }
}
