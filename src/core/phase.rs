//! DMAIC phase sequence

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of working phases (COMPLETED is not counted)
pub const PHASE_COUNT: usize = 5;

/// Project phase. The only legal order is the declaration order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    #[default]
    Define,
    Measure,
    Analyze,
    Improve,
    Control,
    Completed,
}

impl Phase {
    /// The five working phases in order
    pub fn working() -> &'static [Phase] {
        &[
            Phase::Define,
            Phase::Measure,
            Phase::Analyze,
            Phase::Improve,
            Phase::Control,
        ]
    }

    /// Zero-based position in the sequence (COMPLETED is 5)
    pub fn index(self) -> usize {
        match self {
            Phase::Define => 0,
            Phase::Measure => 1,
            Phase::Analyze => 2,
            Phase::Improve => 3,
            Phase::Control => 4,
            Phase::Completed => 5,
        }
    }

    /// The immediate successor, or `None` for COMPLETED
    pub fn successor(self) -> Option<Phase> {
        match self {
            Phase::Define => Some(Phase::Measure),
            Phase::Measure => Some(Phase::Analyze),
            Phase::Analyze => Some(Phase::Improve),
            Phase::Improve => Some(Phase::Control),
            Phase::Control => Some(Phase::Completed),
            Phase::Completed => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Phase::Completed
    }

    /// Completion percentage once every phase before `self` is done
    pub fn completion(self) -> u8 {
        (self.index() * 100 / PHASE_COUNT) as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Define => "DEFINE",
            Phase::Measure => "MEASURE",
            Phase::Analyze => "ANALYZE",
            Phase::Improve => "IMPROVE",
            Phase::Control => "CONTROL",
            Phase::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DEFINE" => Ok(Phase::Define),
            "MEASURE" => Ok(Phase::Measure),
            "ANALYZE" | "ANALYSE" => Ok(Phase::Analyze),
            "IMPROVE" => Ok(Phase::Improve),
            "CONTROL" => Ok(Phase::Control),
            "COMPLETED" => Ok(Phase::Completed),
            _ => Err(format!(
                "Unknown phase: {}. Use define, measure, analyze, improve, control or completed",
                s
            )),
        }
    }
}
