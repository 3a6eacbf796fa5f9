//! Passage questionnaires, empathy scoring, and response storage.
//!
//! Admins author a passage with weighted single-choice questions; respondents
//! answer them and receive a total score classified into an [`EmpathyTier`].

pub mod analysis;
pub mod classifier;
pub mod domain;
pub mod draft;
pub mod generator;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod storage;

#[cfg(test)]
mod tests;

pub use analysis::{write_responses_csv, ExportError, ResponseSummary, TierDistribution};
pub use classifier::EmpathyTier;
pub use domain::{
    AnswerOption, Answers, NewOption, NewResponse, OptionId, Passage, PassageId, Question,
    QuestionId, QuestionWithOptions, Questionnaire, ResponseId, ResponseRecord, ResponseView,
    SavedQuestion, SavedQuestionnaire, Selection, Submission,
};
pub use draft::{DraftPolicy, DraftQuestion, QuestionnaireDraft, ValidationError};
pub use generator::generate_questions;
pub use repository::{ParentEntity, RepositoryError, SurveyRepository};
pub use router::survey_router;
pub use scoring::{ScoreCard, ScoringEngine, ScoringError};
pub use service::{QuestionnaireState, SurveyService, SurveyServiceError, SurveyWarning};
pub use storage::SqliteSurveyRepository;
