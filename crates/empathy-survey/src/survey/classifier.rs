use serde::{Deserialize, Serialize};

/// Scores below this value classify as [`EmpathyTier::Low`].
pub const MODERATE_THRESHOLD: i64 = 6;
/// Scores above this value classify as [`EmpathyTier::High`].
pub const HIGH_THRESHOLD: i64 = 10;

/// Empathy band derived from a respondent's total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmpathyTier {
    Low,
    Moderate,
    High,
}

impl EmpathyTier {
    pub fn classify(score: i64) -> Self {
        if score < MODERATE_THRESHOLD {
            Self::Low
        } else if score <= HIGH_THRESHOLD {
            Self::Moderate
        } else {
            Self::High
        }
    }

    pub fn ordered() -> [Self; 3] {
        [Self::Low, Self::Moderate, Self::High]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low Empathy",
            Self::Moderate => "Moderate Empathy",
            Self::High => "High Empathy",
        }
    }

    /// Value written to `responses.empathy_level`, matching rows written by
    /// earlier releases of the questionnaire.
    pub fn stored_label(self) -> &'static str {
        match self {
            Self::Low => "Low Empathy 😐",
            Self::Moderate => "Moderate Empathy 🙂",
            Self::High => "High Empathy 💖",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ordered().into_iter().find(|tier| {
            trimmed == tier.stored_label()
                || trimmed.eq_ignore_ascii_case(tier.label())
                || trimmed.eq_ignore_ascii_case(tier.key())
        })
    }

    fn key(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}
