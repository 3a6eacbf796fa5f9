use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::domain::NewOption;
use super::generator::generate_questions;

/// Admin authoring limits applied before a draft is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPolicy {
    pub min_weight: i64,
    pub max_weight: i64,
    pub max_options: usize,
}

impl Default for DraftPolicy {
    fn default() -> Self {
        Self {
            min_weight: 1,
            max_weight: 5,
            max_options: 5,
        }
    }
}

/// Passage, questions and options collected by an admin session before save.
///
/// The draft is owned by whoever requested it; nothing is persisted until it
/// is handed back to the service, which commits it as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireDraft {
    pub title: String,
    pub text: String,
    #[serde(default)]
    pub questions: Vec<DraftQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftQuestion {
    pub text: String,
    #[serde(default)]
    pub options: Vec<NewOption>,
}

impl QuestionnaireDraft {
    /// Start a draft whose questions come from the fixed templates.
    pub fn generate(title: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let questions = generate_questions(&text)
            .into_iter()
            .map(|prompt| DraftQuestion {
                text: prompt,
                options: Vec::new(),
            })
            .collect();

        Self {
            title: title.into(),
            text,
            questions,
        }
    }

    /// Trim every field and drop option rows that were left blank.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.text = self.text.trim().to_string();
        for question in &mut self.questions {
            question.text = question.text.trim().to_string();
            question.options = question
                .options
                .drain(..)
                .filter_map(|option| {
                    let label = option.label.trim();
                    (!label.is_empty()).then(|| NewOption::new(label, option.weight))
                })
                .collect();
        }
        self
    }

    pub fn validate(&self, policy: &DraftPolicy) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.text.trim().is_empty() {
            return Err(ValidationError::MissingText);
        }

        let mut prompts = HashSet::new();
        for (index, question) in self.questions.iter().enumerate() {
            let position = index + 1;
            if question.text.trim().is_empty() {
                return Err(ValidationError::MissingQuestionText { position });
            }
            if !prompts.insert(question.text.trim()) {
                return Err(ValidationError::DuplicateQuestion { position });
            }
            if question.options.is_empty() {
                return Err(ValidationError::MissingOptions { position });
            }
            if question.options.len() > policy.max_options {
                return Err(ValidationError::TooManyOptions {
                    position,
                    count: question.options.len(),
                    max: policy.max_options,
                });
            }

            let mut labels = HashSet::new();
            for option in &question.options {
                if !labels.insert(option.label.trim()) {
                    return Err(ValidationError::DuplicateLabel {
                        position,
                        label: option.label.clone(),
                    });
                }
                if option.weight < policy.min_weight || option.weight > policy.max_weight {
                    return Err(ValidationError::WeightOutOfRange {
                        position,
                        weight: option.weight,
                        min: policy.min_weight,
                        max: policy.max_weight,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Missing or malformed input caught before any storage call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("passage title is required")]
    MissingTitle,
    #[error("passage text is required")]
    MissingText,
    #[error("respondent name is required")]
    MissingRespondent,
    #[error("question {position} has no text")]
    MissingQuestionText { position: usize },
    #[error("question {position} repeats the text of an earlier question")]
    DuplicateQuestion { position: usize },
    #[error("question {position} needs at least one option")]
    MissingOptions { position: usize },
    #[error("question {position} has {count} options, at most {max} allowed")]
    TooManyOptions {
        position: usize,
        count: usize,
        max: usize,
    },
    #[error("question {position} repeats option label '{label}'")]
    DuplicateLabel { position: usize, label: String },
    #[error("question {position} uses weight {weight}, expected {min}..={max}")]
    WeightOutOfRange {
        position: usize,
        weight: i64,
        min: i64,
        max: i64,
    },
}
