use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::analysis::ResponseSummary;
use super::domain::{
    NewResponse, Passage, PassageId, QuestionId, QuestionWithOptions, Questionnaire,
    ResponseId, ResponseRecord, SavedQuestionnaire, Submission,
};
use super::draft::{DraftPolicy, QuestionnaireDraft, ValidationError};
use super::repository::{RepositoryError, SurveyRepository};
use super::scoring::{ScoringEngine, ScoringError};

/// Service composing the repository, scoring engine and admin draft policy.
pub struct SurveyService<R> {
    repository: Arc<R>,
    engine: ScoringEngine,
    policy: DraftPolicy,
}

impl<R> SurveyService<R>
where
    R: SurveyRepository + 'static,
{
    pub fn new(repository: Arc<R>, policy: DraftPolicy) -> Self {
        Self {
            repository,
            engine: ScoringEngine::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &DraftPolicy {
        &self.policy
    }

    /// All passages in creation order; an empty store is reported as a warning.
    pub fn passages(&self) -> Result<Vec<Passage>, SurveyServiceError> {
        let passages = self.repository.list_passages()?;
        if passages.is_empty() {
            return Err(SurveyWarning::NoPassages.into());
        }
        Ok(passages)
    }

    /// Load a passage with its answerable questions.
    pub fn questionnaire(
        &self,
        passage_id: PassageId,
    ) -> Result<QuestionnaireState, SurveyServiceError> {
        let Some(passage) = self.repository.fetch_passage(passage_id)? else {
            return Ok(QuestionnaireState::Unavailable(
                SurveyWarning::UnknownPassage(passage_id),
            ));
        };

        let questions = self.repository.list_questions(passage_id)?;
        if questions.is_empty() {
            return Ok(QuestionnaireState::Unavailable(SurveyWarning::NoQuestions(
                passage_id,
            )));
        }

        let mut answerable = Vec::with_capacity(questions.len());
        let mut skipped = Vec::new();
        for question in questions {
            let options = self.repository.list_options(question.id)?;
            if options.is_empty() {
                warn!(question_id = %question.id, "question has no options, skipping");
                skipped.push(question.id);
            } else {
                answerable.push(QuestionWithOptions { question, options });
            }
        }

        if answerable.is_empty() {
            return Ok(QuestionnaireState::Unavailable(SurveyWarning::NoOptions(
                passage_id,
            )));
        }

        Ok(QuestionnaireState::Ready(Questionnaire {
            passage,
            questions: answerable,
            skipped,
        }))
    }

    /// Score a respondent's selections, classify the total and record it.
    pub fn submit(&self, submission: Submission) -> Result<ResponseRecord, SurveyServiceError> {
        let user_name = submission.user_name.trim().to_string();
        if user_name.is_empty() {
            return Err(ValidationError::MissingRespondent.into());
        }

        let questionnaire = match self.questionnaire(submission.passage_id)? {
            QuestionnaireState::Ready(questionnaire) => questionnaire,
            QuestionnaireState::Unavailable(warning) => {
                warn!(passage_id = %submission.passage_id, %warning, "submission refused");
                return Err(warning.into());
            }
        };

        let card = self.engine.score(&questionnaire, &submission.selections)?;
        let response = NewResponse {
            passage_id: submission.passage_id,
            user_name,
            score: card.total,
            tier: card.tier,
            answers: card.answers,
        };

        let id = self.repository.create_response(response.clone())?;
        info!(
            response_id = %id,
            passage_id = %response.passage_id,
            score = response.score,
            tier = response.tier.label(),
            "response recorded"
        );

        Ok(ResponseRecord::from_new(id, response))
    }

    /// Start an admin draft from passage text.
    pub fn generate_draft(
        &self,
        title: &str,
        text: &str,
    ) -> Result<QuestionnaireDraft, SurveyServiceError> {
        if text.trim().is_empty() {
            return Err(ValidationError::MissingText.into());
        }
        Ok(QuestionnaireDraft::generate(title.trim(), text.trim()))
    }

    /// Validate an edited draft and commit it in one transaction.
    pub fn save_draft(
        &self,
        draft: QuestionnaireDraft,
    ) -> Result<SavedQuestionnaire, SurveyServiceError> {
        let draft = draft.normalized();
        draft.validate(&self.policy)?;

        let saved = self.repository.save_questionnaire(&draft)?;
        info!(
            passage_id = %saved.passage_id,
            title = %draft.title,
            questions = saved.questions.len(),
            "passage and questionnaire saved"
        );
        Ok(saved)
    }

    pub fn response(&self, response_id: ResponseId) -> Result<ResponseRecord, SurveyServiceError> {
        self.repository
            .fetch_response(response_id)?
            .ok_or(SurveyServiceError::ResponseNotFound(response_id))
    }

    pub fn responses(
        &self,
        passage_id: PassageId,
    ) -> Result<Vec<ResponseRecord>, SurveyServiceError> {
        if self.repository.fetch_passage(passage_id)?.is_none() {
            return Err(RepositoryError::missing_passage(passage_id).into());
        }
        Ok(self.repository.list_responses(passage_id)?)
    }

    pub fn summary(&self, passage_id: PassageId) -> Result<ResponseSummary, SurveyServiceError> {
        let responses = self.responses(passage_id)?;
        Ok(ResponseSummary::from_responses(passage_id, &responses))
    }
}

/// Outcome of loading a passage for answering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum QuestionnaireState {
    Ready(Questionnaire),
    Unavailable(SurveyWarning),
}

impl QuestionnaireState {
    pub fn is_ready(&self) -> bool {
        matches!(self, QuestionnaireState::Ready(_))
    }
}

/// Non-fatal conditions that stop a flow without being a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "warning", content = "id", rename_all = "snake_case")]
pub enum SurveyWarning {
    #[error("no passages found")]
    NoPassages,
    #[error("passage {0} not found")]
    UnknownPassage(PassageId),
    #[error("no questions found for passage {0}")]
    NoQuestions(PassageId),
    #[error("no options found for any question of passage {0}")]
    NoOptions(PassageId),
}

/// Error raised by the survey service.
#[derive(Debug, thiserror::Error)]
pub enum SurveyServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Warning(#[from] SurveyWarning),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("response {0} not found")]
    ResponseNotFound(ResponseId),
}

impl SurveyServiceError {
    /// Question an invalid selection refers to, when there is one.
    pub fn question(&self) -> Option<QuestionId> {
        match self {
            SurveyServiceError::Scoring(
                ScoringError::Unanswered(id)
                | ScoringError::Duplicate(id)
                | ScoringError::UnknownQuestion(id)
                | ScoringError::AmbiguousQuestion(id),
            ) => Some(*id),
            SurveyServiceError::Scoring(ScoringError::UnknownOption { question_id, .. }) => {
                Some(*question_id)
            }
            _ => None,
        }
    }
}
