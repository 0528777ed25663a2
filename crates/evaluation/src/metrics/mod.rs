//! Metric implementations for offline evaluation.
//!
//! Each metric is a unit struct implementing [`Metric`]; [`MetricKind`]
//! maps the string tags used in reports and configs onto them.

pub mod hit_rate;
pub mod ndcg;
pub mod precision;
pub mod recall;

// Re-export for convenience
pub use hit_rate::HitRateAtK;
pub use ndcg::NdcgAtK;
pub use precision::PrecisionAtK;
pub use recall::RecallAtK;

use crate::traits::Metric;
use interactions::RecError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Precision,
    Recall,
    HitRate,
    Ndcg,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Precision,
        MetricKind::Recall,
        MetricKind::HitRate,
        MetricKind::Ndcg,
    ];

    pub fn build(self) -> Box<dyn Metric> {
        match self {
            MetricKind::Precision => Box::new(PrecisionAtK),
            MetricKind::Recall => Box::new(RecallAtK),
            MetricKind::HitRate => Box::new(HitRateAtK),
            MetricKind::Ndcg => Box::new(NdcgAtK),
        }
    }
}

impl FromStr for MetricKind {
    type Err = RecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "precision" => Ok(MetricKind::Precision),
            "recall" => Ok(MetricKind::Recall),
            "hit_rate" => Ok(MetricKind::HitRate),
            "ndcg" => Ok(MetricKind::Ndcg),
            _ => Err(RecError::UnrecognizedMetric(s.to_string())),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.build().name())
    }
}
