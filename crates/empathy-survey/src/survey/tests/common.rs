use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::survey::domain::{
    AnswerOption, NewOption, NewResponse, OptionId, Passage, PassageId, Question, QuestionId,
    QuestionWithOptions, Questionnaire, ResponseId, ResponseRecord, SavedQuestion,
    SavedQuestionnaire, Selection,
};
use crate::survey::draft::{DraftPolicy, QuestionnaireDraft};
use crate::survey::repository::{RepositoryError, SurveyRepository};
use crate::survey::{survey_router, SqliteSurveyRepository, SurveyService};

pub(super) const PASSAGE_TEXT: &str =
    "Your colleague Priya has missed three deadlines and seems withdrawn in meetings.";

/// Draft with five questions, each offering a kind answer (5), a neutral one
/// (3) and a dismissive one (1).
pub(super) fn filled_draft() -> QuestionnaireDraft {
    let mut draft = QuestionnaireDraft::generate("Withdrawn colleague", PASSAGE_TEXT);
    for question in &mut draft.questions {
        question.options = vec![
            NewOption::new("Check in privately", 5),
            NewOption::new("Wait and see", 3),
            NewOption::new("Report to the manager", 1),
        ];
    }
    draft
}

pub(super) fn sqlite_service() -> (
    SurveyService<SqliteSurveyRepository>,
    Arc<SqliteSurveyRepository>,
) {
    let repository =
        Arc::new(SqliteSurveyRepository::open_in_memory().expect("in-memory database opens"));
    let service = SurveyService::new(repository.clone(), DraftPolicy::default());
    (service, repository)
}

pub(super) fn memory_service() -> (SurveyService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = SurveyService::new(repository.clone(), DraftPolicy::default());
    (service, repository)
}

/// Pick the option at `index` for every question of the questionnaire.
pub(super) fn select_all(questionnaire: &Questionnaire, index: usize) -> Vec<Selection> {
    questionnaire
        .questions
        .iter()
        .map(|entry| Selection {
            question_id: entry.question.id,
            option_id: entry.options[index].id,
        })
        .collect()
}

/// Hand-built questionnaire whose question `n` offers options with the given weights.
pub(super) fn questionnaire_with_weights(weights: &[&[i64]]) -> Questionnaire {
    let passage = Passage {
        id: PassageId(1),
        title: "Fixture".to_string(),
        text: PASSAGE_TEXT.to_string(),
    };
    let mut next_option = 100;
    let questions = weights
        .iter()
        .enumerate()
        .map(|(index, option_weights)| {
            let question_id = QuestionId(index as i64 + 1);
            let options = option_weights
                .iter()
                .map(|weight| {
                    next_option += 1;
                    AnswerOption {
                        id: OptionId(next_option),
                        question_id,
                        label: format!("weight {weight}"),
                        weight: *weight,
                    }
                })
                .collect();
            QuestionWithOptions {
                question: Question {
                    id: question_id,
                    passage_id: passage.id,
                    text: format!("Question {}", index + 1),
                },
                options,
            }
        })
        .collect();

    Questionnaire {
        passage,
        questions,
        skipped: Vec::new(),
    }
}

pub(super) fn router_with_service<R>(service: SurveyService<R>) -> axum::Router
where
    R: SurveyRepository + 'static,
{
    survey_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    passages: Vec<Passage>,
    questions: Vec<Question>,
    options: Vec<AnswerOption>,
    responses: Vec<ResponseRecord>,
}

impl MemoryState {
    fn next(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Vec-backed repository used to exercise the service without SQLite.
#[derive(Default)]
pub(super) struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub(super) fn response_count(&self) -> usize {
        self.state.lock().expect("memory mutex poisoned").responses.len()
    }
}

impl SurveyRepository for MemoryRepository {
    fn list_passages(&self) -> Result<Vec<Passage>, RepositoryError> {
        Ok(self.state.lock().expect("memory mutex poisoned").passages.clone())
    }

    fn fetch_passage(&self, id: PassageId) -> Result<Option<Passage>, RepositoryError> {
        let state = self.state.lock().expect("memory mutex poisoned");
        Ok(state.passages.iter().find(|p| p.id == id).cloned())
    }

    fn list_questions(&self, passage_id: PassageId) -> Result<Vec<Question>, RepositoryError> {
        let state = self.state.lock().expect("memory mutex poisoned");
        Ok(state
            .questions
            .iter()
            .filter(|q| q.passage_id == passage_id)
            .cloned()
            .collect())
    }

    fn list_options(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<AnswerOption>, RepositoryError> {
        let state = self.state.lock().expect("memory mutex poisoned");
        Ok(state
            .options
            .iter()
            .filter(|o| o.question_id == question_id)
            .cloned()
            .collect())
    }

    fn create_passage(&self, title: &str, text: &str) -> Result<PassageId, RepositoryError> {
        let mut state = self.state.lock().expect("memory mutex poisoned");
        let id = PassageId(state.next());
        state.passages.push(Passage {
            id,
            title: title.to_string(),
            text: text.to_string(),
        });
        Ok(id)
    }

    fn create_question(
        &self,
        passage_id: PassageId,
        text: &str,
    ) -> Result<QuestionId, RepositoryError> {
        let mut state = self.state.lock().expect("memory mutex poisoned");
        if !state.passages.iter().any(|p| p.id == passage_id) {
            return Err(RepositoryError::missing_passage(passage_id));
        }
        let id = QuestionId(state.next());
        state.questions.push(Question {
            id,
            passage_id,
            text: text.to_string(),
        });
        Ok(id)
    }

    fn create_options(
        &self,
        question_id: QuestionId,
        options: &[NewOption],
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().expect("memory mutex poisoned");
        if !state.questions.iter().any(|q| q.id == question_id) {
            return Err(RepositoryError::missing_question(question_id));
        }
        for option in options {
            let id = OptionId(state.next());
            state.options.push(AnswerOption {
                id,
                question_id,
                label: option.label.clone(),
                weight: option.weight,
            });
        }
        Ok(())
    }

    fn create_response(&self, response: NewResponse) -> Result<ResponseId, RepositoryError> {
        let mut state = self.state.lock().expect("memory mutex poisoned");
        if !state.passages.iter().any(|p| p.id == response.passage_id) {
            return Err(RepositoryError::missing_passage(response.passage_id));
        }
        let id = ResponseId(state.next());
        state.responses.push(ResponseRecord::from_new(id, response));
        Ok(id)
    }

    fn fetch_response(&self, id: ResponseId) -> Result<Option<ResponseRecord>, RepositoryError> {
        let state = self.state.lock().expect("memory mutex poisoned");
        Ok(state.responses.iter().find(|r| r.id == id).cloned())
    }

    fn list_responses(
        &self,
        passage_id: PassageId,
    ) -> Result<Vec<ResponseRecord>, RepositoryError> {
        let state = self.state.lock().expect("memory mutex poisoned");
        Ok(state
            .responses
            .iter()
            .filter(|r| r.passage_id == passage_id)
            .cloned()
            .collect())
    }

    fn save_questionnaire(
        &self,
        draft: &QuestionnaireDraft,
    ) -> Result<SavedQuestionnaire, RepositoryError> {
        let passage_id = self.create_passage(&draft.title, &draft.text)?;
        let mut questions = Vec::new();
        for question in &draft.questions {
            let question_id = self.create_question(passage_id, &question.text)?;
            self.create_options(question_id, &question.options)?;
            let option_ids = self
                .list_options(question_id)?
                .into_iter()
                .map(|option| option.id)
                .collect();
            questions.push(SavedQuestion {
                question_id,
                option_ids,
            });
        }
        Ok(SavedQuestionnaire {
            passage_id,
            questions,
        })
    }
}

/// Repository whose every call fails as if the database were unreachable.
pub(super) struct UnavailableRepository;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Storage("database offline".to_string()))
}

impl SurveyRepository for UnavailableRepository {
    fn list_passages(&self) -> Result<Vec<Passage>, RepositoryError> {
        offline()
    }

    fn fetch_passage(&self, _id: PassageId) -> Result<Option<Passage>, RepositoryError> {
        offline()
    }

    fn list_questions(&self, _passage_id: PassageId) -> Result<Vec<Question>, RepositoryError> {
        offline()
    }

    fn list_options(
        &self,
        _question_id: QuestionId,
    ) -> Result<Vec<AnswerOption>, RepositoryError> {
        offline()
    }

    fn create_passage(&self, _title: &str, _text: &str) -> Result<PassageId, RepositoryError> {
        offline()
    }

    fn create_question(
        &self,
        _passage_id: PassageId,
        _text: &str,
    ) -> Result<QuestionId, RepositoryError> {
        offline()
    }

    fn create_options(
        &self,
        _question_id: QuestionId,
        _options: &[NewOption],
    ) -> Result<(), RepositoryError> {
        offline()
    }

    fn create_response(&self, _response: NewResponse) -> Result<ResponseId, RepositoryError> {
        offline()
    }

    fn fetch_response(
        &self,
        _id: ResponseId,
    ) -> Result<Option<ResponseRecord>, RepositoryError> {
        offline()
    }

    fn list_responses(
        &self,
        _passage_id: PassageId,
    ) -> Result<Vec<ResponseRecord>, RepositoryError> {
        offline()
    }

    fn save_questionnaire(
        &self,
        _draft: &QuestionnaireDraft,
    ) -> Result<SavedQuestionnaire, RepositoryError> {
        offline()
    }
}
