//! Table layout for the questionnaire database.
//!
//! Column names match databases written by earlier releases, so an existing
//! `empathy2.db` opens without migration.

use rusqlite::Connection;
use tracing::debug;

use super::storage_error;
use crate::survey::repository::RepositoryError;

const SURVEY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS passages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    text TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS questions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    passage_id INTEGER NOT NULL REFERENCES passages(id),
    text TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS options (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question_id INTEGER NOT NULL REFERENCES questions(id),
    label TEXT NOT NULL,
    weight INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS responses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    passage_id INTEGER NOT NULL REFERENCES passages(id),
    user_name TEXT NOT NULL,
    score INTEGER NOT NULL,
    empathy_level TEXT NOT NULL,
    answers_json TEXT NOT NULL
);
"#;

const INDEXES_SCHEMA: &str = r#"
CREATE INDEX IF NOT EXISTS idx_questions_passage ON questions(passage_id);
CREATE INDEX IF NOT EXISTS idx_options_question ON options(question_id);
CREATE INDEX IF NOT EXISTS idx_responses_passage ON responses(passage_id);
"#;

pub(crate) fn init_schema(conn: &Connection) -> Result<(), RepositoryError> {
    conn.execute_batch(SURVEY_SCHEMA)
        .map_err(|err| storage_error("create survey tables", err))?;
    conn.execute_batch(INDEXES_SCHEMA)
        .map_err(|err| storage_error("create survey indexes", err))?;
    debug!("survey schema ready");
    Ok(())
}
