use crate::infra::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use axum::Json;
use empathy_survey::error::AppError;
use empathy_survey::survey::{
    survey_router, write_responses_csv, PassageId, SurveyRepository, SurveyService,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_survey_routes<R>(service: Arc<SurveyService<R>>) -> axum::Router
where
    R: SurveyRepository + 'static,
{
    survey_router(service.clone())
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/passages/:passage_id/export",
            axum::routing::get(export_endpoint::<R>).with_state(service),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Stored responses for one passage as a CSV attachment.
pub(crate) async fn export_endpoint<R>(
    State(service): State<Arc<SurveyService<R>>>,
    Path(passage_id): Path<i64>,
) -> Result<Response, AppError>
where
    R: SurveyRepository + 'static,
{
    let passage_id = PassageId(passage_id);
    let responses = service.responses(passage_id)?;

    let mut buffer = Vec::new();
    write_responses_csv(&mut buffer, &responses)?;

    let disposition = format!("attachment; filename=\"passage-{passage_id}-responses.csv\"");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use empathy_survey::survey::{
        DraftPolicy, NewOption, QuestionnaireDraft, QuestionnaireState, Selection,
        SqliteSurveyRepository, Submission,
    };
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn service() -> Arc<SurveyService<SqliteSurveyRepository>> {
        let repository =
            Arc::new(SqliteSurveyRepository::open_in_memory().expect("in-memory database opens"));
        Arc::new(SurveyService::new(repository, DraftPolicy::default()))
    }

    fn app_state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn answered_passage(service: &SurveyService<SqliteSurveyRepository>) -> PassageId {
        let mut draft = QuestionnaireDraft::generate(
            "Late again",
            "A colleague arrives late every Monday looking exhausted.",
        );
        draft.questions.truncate(2);
        for question in &mut draft.questions {
            question.options = vec![
                NewOption::new("Ask if everything is alright", 5),
                NewOption::new("Log it for the review", 1),
            ];
        }
        let saved = service.save_draft(draft).expect("draft saves");

        let questionnaire = match service.questionnaire(saved.passage_id).expect("loads") {
            QuestionnaireState::Ready(questionnaire) => questionnaire,
            other => panic!("expected ready, got {other:?}"),
        };
        let selections = questionnaire
            .questions
            .iter()
            .map(|entry| Selection {
                question_id: entry.question.id,
                option_id: entry.options[0].id,
            })
            .collect();
        service
            .submit(Submission {
                passage_id: saved.passage_id,
                user_name: "Grace, \"G\"".to_string(),
                selections,
            })
            .expect("submission recorded");
        saved.passage_id
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let response = readiness_endpoint(Extension(app_state(false)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = readiness_endpoint(Extension(app_state(true)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn export_route_streams_csv_rows() {
        let service = service();
        let passage_id = answered_passage(&service);
        let router = with_survey_routes(service).layer(Extension(app_state(true)));

        let response = router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/passages/{passage_id}/export"))
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/csv; charset=utf-8"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let text = String::from_utf8(bytes.to_vec()).expect("utf-8 csv");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,passage_id,user_name,score,empathy_level,answers_json")
        );
        let row = lines.next().expect("one response row");
        assert!(row.contains("Moderate Empathy"));
        assert!(row.contains(",10,"));
        assert!(lines.next().is_none());
    }

    #[tokio::test]
    async fn export_of_unknown_passage_is_not_found() {
        let router = with_survey_routes(service()).layer(Extension(app_state(true)));

        let response = router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/passages/77/export")
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("router responds");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
