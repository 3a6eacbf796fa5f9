use std::io::Write;

use serde::Serialize;

use super::classifier::EmpathyTier;
use super::domain::{PassageId, ResponseRecord};

/// Count of responses falling into each empathy tier.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierDistribution {
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
}

impl TierDistribution {
    fn record(&mut self, tier: EmpathyTier) {
        match tier {
            EmpathyTier::Low => self.low += 1,
            EmpathyTier::Moderate => self.moderate += 1,
            EmpathyTier::High => self.high += 1,
        }
    }

    pub fn count(&self, tier: EmpathyTier) -> usize {
        match tier {
            EmpathyTier::Low => self.low,
            EmpathyTier::Moderate => self.moderate,
            EmpathyTier::High => self.high,
        }
    }
}

/// Aggregate view over every stored response to one passage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSummary {
    pub passage_id: PassageId,
    pub responses: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_score: Option<i64>,
    pub tiers: TierDistribution,
}

impl ResponseSummary {
    pub fn from_responses(passage_id: PassageId, responses: &[ResponseRecord]) -> Self {
        let mut tiers = TierDistribution::default();
        let mut total: i128 = 0;
        for response in responses {
            tiers.record(response.tier);
            total += i128::from(response.score);
        }

        let average_score = if responses.is_empty() {
            None
        } else {
            Some(total as f64 / responses.len() as f64)
        };

        Self {
            passage_id,
            responses: responses.len(),
            average_score,
            min_score: responses.iter().map(|r| r.score).min(),
            max_score: responses.iter().map(|r| r.score).max(),
            tiers,
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseCsvRow<'a> {
    id: i64,
    passage_id: i64,
    user_name: &'a str,
    score: i64,
    empathy_level: &'a str,
    answers_json: String,
}

/// Write responses using the column layout of the `responses` table.
pub fn write_responses_csv<W: Write>(
    writer: W,
    responses: &[ResponseRecord],
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for response in responses {
        csv.serialize(ResponseCsvRow {
            id: response.id.0,
            passage_id: response.passage_id.0,
            user_name: &response.user_name,
            score: response.score,
            empathy_level: response.tier.stored_label(),
            answers_json: serde_json::to_string(&response.answers)?,
        })?;
    }
    csv.flush()?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to encode answers: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to flush export: {0}")]
    Io(#[from] std::io::Error),
}
