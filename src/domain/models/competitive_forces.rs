//! Five-forces competitive assessment types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Intensity of one competitive force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceLevel {
    Low,
    Medium,
    High,
}

impl ForceLevel {
    /// Pressure score: Low = 2, Medium = 3, High = 4.
    pub fn score(self) -> u8 {
        match self {
            Self::Low => 2,
            Self::Medium => 3,
            Self::High => 4,
        }
    }
}

impl fmt::Display for ForceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(s)
    }
}

/// One assessed force with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceAssessment {
    pub level: ForceLevel,
    pub rationale: String,
}

/// Attractiveness of the industry given the forces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attractiveness {
    High,
    Medium,
    Low,
}

impl fmt::Display for Attractiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        };
        f.write_str(s)
    }
}

/// Five-dimension competitive assessment derived from the metrics map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitiveForces {
    pub competitive_rivalry: ForceAssessment,
    pub supplier_power: ForceAssessment,
    pub buyer_power: ForceAssessment,
    pub threat_of_substitutes: ForceAssessment,
    pub threat_of_new_entrants: ForceAssessment,
    pub average_score: f64,
    pub attractiveness: Attractiveness,
}

impl CompetitiveForces {
    /// Forces with display names, in canonical order.
    pub fn named(&self) -> [(&'static str, &ForceAssessment); 5] {
        [
            ("Competitive rivalry", &self.competitive_rivalry),
            ("Supplier power", &self.supplier_power),
            ("Buyer power", &self.buyer_power),
            ("Threat of substitutes", &self.threat_of_substitutes),
            ("Threat of new entrants", &self.threat_of_new_entrants),
        ]
    }
}
