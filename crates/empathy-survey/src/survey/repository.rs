use super::domain::{
    AnswerOption, NewOption, NewResponse, Passage, PassageId, Question, QuestionId,
    ResponseId, ResponseRecord, SavedQuestionnaire,
};
use super::draft::QuestionnaireDraft;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait SurveyRepository: Send + Sync {
    /// Passages in creation order.
    fn list_passages(&self) -> Result<Vec<Passage>, RepositoryError>;
    fn fetch_passage(&self, id: PassageId) -> Result<Option<Passage>, RepositoryError>;
    fn list_questions(&self, passage_id: PassageId) -> Result<Vec<Question>, RepositoryError>;
    fn list_options(&self, question_id: QuestionId)
        -> Result<Vec<AnswerOption>, RepositoryError>;

    fn create_passage(&self, title: &str, text: &str) -> Result<PassageId, RepositoryError>;
    fn create_question(
        &self,
        passage_id: PassageId,
        text: &str,
    ) -> Result<QuestionId, RepositoryError>;
    /// Inserts every option or none of them.
    fn create_options(
        &self,
        question_id: QuestionId,
        options: &[NewOption],
    ) -> Result<(), RepositoryError>;
    fn create_response(&self, response: NewResponse) -> Result<ResponseId, RepositoryError>;

    fn fetch_response(&self, id: ResponseId) -> Result<Option<ResponseRecord>, RepositoryError>;
    fn list_responses(&self, passage_id: PassageId)
        -> Result<Vec<ResponseRecord>, RepositoryError>;

    /// Persist a passage with all of its questions and options as one unit.
    fn save_questionnaire(
        &self,
        draft: &QuestionnaireDraft,
    ) -> Result<SavedQuestionnaire, RepositoryError>;
}

/// Parent entity named by a rejected write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentEntity {
    Passage,
    Question,
}

impl std::fmt::Display for ParentEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParentEntity::Passage => f.write_str("passage"),
            ParentEntity::Question => f.write_str("question"),
        }
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{entity} {id} does not exist")]
    Referential { entity: ParentEntity, id: i64 },
    #[error("stored answers could not be encoded: {0}")]
    Encoding(String),
    #[error("storage unavailable: {0}")]
    Storage(String),
}

impl RepositoryError {
    pub fn missing_passage(id: PassageId) -> Self {
        Self::Referential {
            entity: ParentEntity::Passage,
            id: id.0,
        }
    }

    pub fn missing_question(id: QuestionId) -> Self {
        Self::Referential {
            entity: ParentEntity::Question,
            id: id.0,
        }
    }
}
