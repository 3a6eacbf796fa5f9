use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::classifier::EmpathyTier;
use super::domain::{Answers, OptionId, QuestionId, Questionnaire, Selection};

/// Sums the weights of the selected options of one questionnaire attempt.
///
/// Every answerable question must carry exactly one selection; options are
/// resolved by identity inside the question's own option set. Answers are
/// keyed by question text, so two answerable questions sharing a text cannot
/// be scored.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn score(
        &self,
        questionnaire: &Questionnaire,
        selections: &[Selection],
    ) -> Result<ScoreCard, ScoringError> {
        let mut prompts = HashSet::new();
        for entry in &questionnaire.questions {
            if !prompts.insert(entry.question.text.trim()) {
                return Err(ScoringError::AmbiguousQuestion(entry.question.id));
            }
        }

        let mut chosen: BTreeMap<QuestionId, OptionId> = BTreeMap::new();
        for selection in selections {
            if questionnaire.question(selection.question_id).is_none() {
                return Err(ScoringError::UnknownQuestion(selection.question_id));
            }
            if chosen
                .insert(selection.question_id, selection.option_id)
                .is_some()
            {
                return Err(ScoringError::Duplicate(selection.question_id));
            }
        }

        let mut total: i64 = 0;
        let mut answers = Answers::new();
        let mut components = Vec::with_capacity(questionnaire.questions.len());

        for entry in &questionnaire.questions {
            let question_id = entry.question.id;
            let option_id = chosen
                .get(&question_id)
                .copied()
                .ok_or(ScoringError::Unanswered(question_id))?;
            let option = entry
                .option(option_id)
                .ok_or(ScoringError::UnknownOption {
                    question_id,
                    option_id,
                })?;

            total = total
                .checked_add(option.weight)
                .ok_or(ScoringError::Overflow)?;
            answers.insert(entry.question.text.clone(), option.label.clone());
            components.push(ScoreComponent {
                question_id,
                option_id,
                weight: option.weight,
            });
        }

        Ok(ScoreCard {
            total,
            tier: EmpathyTier::classify(total),
            answers,
            components,
        })
    }
}

/// Weight contributed by one answered question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreComponent {
    pub question_id: QuestionId,
    pub option_id: OptionId,
    pub weight: i64,
}

/// Scoring output: the total, its tier, and the answers that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreCard {
    pub total: i64,
    pub tier: EmpathyTier,
    pub answers: Answers,
    pub components: Vec<ScoreComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("question {0} has no selected option")]
    Unanswered(QuestionId),
    #[error("question {0} was answered more than once")]
    Duplicate(QuestionId),
    #[error("question {0} is not part of this questionnaire")]
    UnknownQuestion(QuestionId),
    #[error("option {option_id} does not belong to question {question_id}")]
    UnknownOption {
        question_id: QuestionId,
        option_id: OptionId,
    },
    #[error("question {0} repeats the text of another question in this passage")]
    AmbiguousQuestion(QuestionId),
    #[error("score exceeds the supported range")]
    Overflow,
}
