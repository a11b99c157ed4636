//! Shared types used across GreenGrid crates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of compute workload being placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadType {
    LlmTraining,
    LlmInference,
    ModelTraining,
    BatchInference,
    FineTuning,
}

/// Scheduling priority. Accepted and persisted, not weighted in scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Lifecycle status of a workload record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadStatus {
    Pending,
    Scheduled,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// A string did not name a known enum variant.
#[derive(Debug, Error, PartialEq)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl WorkloadType {
    pub const ALL: [WorkloadType; 5] = [
        WorkloadType::LlmTraining,
        WorkloadType::LlmInference,
        WorkloadType::ModelTraining,
        WorkloadType::BatchInference,
        WorkloadType::FineTuning,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WorkloadType::LlmTraining => "llm_training",
            WorkloadType::LlmInference => "llm_inference",
            WorkloadType::ModelTraining => "model_training",
            WorkloadType::BatchInference => "batch_inference",
            WorkloadType::FineTuning => "fine_tuning",
        }
    }
}

impl WorkloadPriority {
    pub const ALL: [WorkloadPriority; 4] = [
        WorkloadPriority::Low,
        WorkloadPriority::Medium,
        WorkloadPriority::High,
        WorkloadPriority::Critical,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WorkloadPriority::Low => "low",
            WorkloadPriority::Medium => "medium",
            WorkloadPriority::High => "high",
            WorkloadPriority::Critical => "critical",
        }
    }
}

impl WorkloadStatus {
    pub const ALL: [WorkloadStatus; 6] = [
        WorkloadStatus::Pending,
        WorkloadStatus::Scheduled,
        WorkloadStatus::Running,
        WorkloadStatus::Completed,
        WorkloadStatus::Failed,
        WorkloadStatus::Cancelled,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            WorkloadStatus::Pending => "pending",
            WorkloadStatus::Scheduled => "scheduled",
            WorkloadStatus::Running => "running",
            WorkloadStatus::Completed => "completed",
            WorkloadStatus::Failed => "failed",
            WorkloadStatus::Cancelled => "cancelled",
        }
    }
}

macro_rules! label_enum {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.label() == s)
                    .ok_or_else(|| ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

label_enum!(WorkloadType, "workload type");
label_enum!(WorkloadPriority, "priority");
label_enum!(WorkloadStatus, "status");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_serde_names() {
        for t in WorkloadType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.label()));
        }
        for s in WorkloadStatus::ALL {
            let json = serde_json::to_string(&s).unwrap();
            assert_eq!(json, format!("\"{}\"", s.label()));
        }
    }

    #[test]
    fn parse_status_from_query_string() {
        assert_eq!("scheduled".parse::<WorkloadStatus>(), Ok(WorkloadStatus::Scheduled));
        let err = "sleeping".parse::<WorkloadStatus>().unwrap_err();
        assert_eq!(err.to_string(), "unknown status: sleeping");
    }

    #[test]
    fn priority_defaults_to_medium() {
        assert_eq!(WorkloadPriority::default(), WorkloadPriority::Medium);
        assert_eq!("critical".parse::<WorkloadPriority>(), Ok(WorkloadPriority::Critical));
    }
}
