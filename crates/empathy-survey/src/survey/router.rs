use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{PassageId, ResponseId, Selection, Submission};
use super::draft::{DraftPolicy, QuestionnaireDraft};
use super::repository::{RepositoryError, SurveyRepository};
use super::service::{QuestionnaireState, SurveyService, SurveyServiceError, SurveyWarning};

/// Router builder exposing the respondent and admin endpoints.
pub fn survey_router<R>(service: Arc<SurveyService<R>>) -> Router
where
    R: SurveyRepository + 'static,
{
    Router::new()
        .route("/api/v1/passages", get(passages_handler::<R>))
        .route(
            "/api/v1/passages/:passage_id/questionnaire",
            get(questionnaire_handler::<R>),
        )
        .route(
            "/api/v1/passages/:passage_id/responses",
            post(submit_handler::<R>).get(responses_handler::<R>),
        )
        .route(
            "/api/v1/passages/:passage_id/summary",
            get(summary_handler::<R>),
        )
        .route(
            "/api/v1/responses/:response_id",
            get(response_handler::<R>),
        )
        .route("/api/v1/admin/drafts", post(draft_handler::<R>))
        .route("/api/v1/admin/questionnaires", post(save_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
struct DraftResponse<'a> {
    draft: QuestionnaireDraft,
    policy: &'a DraftPolicy,
}

pub(crate) async fn passages_handler<R>(State(service): State<Arc<SurveyService<R>>>) -> Response
where
    R: SurveyRepository + 'static,
{
    match service.passages() {
        Ok(passages) => (StatusCode::OK, Json(json!({ "passages": passages }))).into_response(),
        Err(SurveyServiceError::Warning(warning)) => (
            StatusCode::OK,
            Json(json!({ "passages": [], "warning": warning.to_string() })),
        )
            .into_response(),
        Err(other) => error_response(other),
    }
}

pub(crate) async fn questionnaire_handler<R>(
    State(service): State<Arc<SurveyService<R>>>,
    Path(passage_id): Path<i64>,
) -> Response
where
    R: SurveyRepository + 'static,
{
    match service.questionnaire(PassageId(passage_id)) {
        Ok(QuestionnaireState::Unavailable(SurveyWarning::UnknownPassage(id))) => {
            not_found(format!("passage {id} not found"))
        }
        Ok(state) => (StatusCode::OK, Json(state)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<SurveyService<R>>>,
    Path(passage_id): Path<i64>,
    Json(request): Json<SubmitRequest>,
) -> Response
where
    R: SurveyRepository + 'static,
{
    let submission = Submission {
        passage_id: PassageId(passage_id),
        user_name: request.user_name,
        selections: request.selections,
    };

    match service.submit(submission) {
        Ok(record) => (StatusCode::CREATED, Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn responses_handler<R>(
    State(service): State<Arc<SurveyService<R>>>,
    Path(passage_id): Path<i64>,
) -> Response
where
    R: SurveyRepository + 'static,
{
    match service.responses(PassageId(passage_id)) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.view()).collect();
            (StatusCode::OK, Json(json!({ "responses": views }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn summary_handler<R>(
    State(service): State<Arc<SurveyService<R>>>,
    Path(passage_id): Path<i64>,
) -> Response
where
    R: SurveyRepository + 'static,
{
    match service.summary(PassageId(passage_id)) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn response_handler<R>(
    State(service): State<Arc<SurveyService<R>>>,
    Path(response_id): Path<i64>,
) -> Response
where
    R: SurveyRepository + 'static,
{
    match service.response(ResponseId(response_id)) {
        Ok(record) => (StatusCode::OK, Json(record.view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn draft_handler<R>(
    State(service): State<Arc<SurveyService<R>>>,
    Json(request): Json<DraftRequest>,
) -> Response
where
    R: SurveyRepository + 'static,
{
    match service.generate_draft(&request.title, &request.text) {
        Ok(draft) => {
            let body = DraftResponse {
                draft,
                policy: service.policy(),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn save_handler<R>(
    State(service): State<Arc<SurveyService<R>>>,
    Json(draft): Json<QuestionnaireDraft>,
) -> Response
where
    R: SurveyRepository + 'static,
{
    match service.save_draft(draft) {
        Ok(saved) => (StatusCode::CREATED, Json(saved)).into_response(),
        Err(err) => error_response(err),
    }
}

fn not_found(message: String) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
}

fn error_response(err: SurveyServiceError) -> Response {
    let status = match &err {
        SurveyServiceError::Validation(_) | SurveyServiceError::Scoring(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        SurveyServiceError::Warning(SurveyWarning::UnknownPassage(_))
        | SurveyServiceError::Repository(RepositoryError::Referential { .. })
        | SurveyServiceError::ResponseNotFound(_) => StatusCode::NOT_FOUND,
        SurveyServiceError::Warning(_) => StatusCode::CONFLICT,
        SurveyServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = match err.question() {
        Some(question_id) => json!({ "error": err.to_string(), "question_id": question_id }),
        None => json!({ "error": err.to_string() }),
    };
    (status, Json(payload)).into_response()
}
