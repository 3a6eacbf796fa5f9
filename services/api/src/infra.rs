use empathy_survey::config::AppConfig;
use empathy_survey::error::AppError;
use empathy_survey::survey::{SqliteSurveyRepository, SurveyService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type SqliteSurveyService = SurveyService<SqliteSurveyRepository>;

/// Resolve the database path, preferring an explicit CLI override.
pub(crate) fn database_path(config: &AppConfig, database: Option<PathBuf>) -> PathBuf {
    database.unwrap_or_else(|| config.storage.database_path.clone())
}

pub(crate) fn open_service(
    config: &AppConfig,
    database: &Path,
) -> Result<SqliteSurveyService, AppError> {
    let repository = Arc::new(SqliteSurveyRepository::open(database)?);
    Ok(SurveyService::new(repository, config.authoring.clone()))
}

pub(crate) fn in_memory_service(config: &AppConfig) -> Result<SqliteSurveyService, AppError> {
    let repository = Arc::new(SqliteSurveyRepository::open_in_memory()?);
    Ok(SurveyService::new(repository, config.authoring.clone()))
}
