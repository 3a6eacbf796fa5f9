//! SQLite-backed [`SurveyRepository`].
//!
//! A single connection sits behind a mutex. Writes that touch more than one
//! row run inside a transaction, and every write checks that its parent row
//! exists before inserting, since older databases were created without
//! foreign-key constraints.

mod schema;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use super::classifier::EmpathyTier;
use super::domain::{
    AnswerOption, Answers, NewOption, NewResponse, OptionId, Passage, PassageId, Question,
    QuestionId, ResponseId, ResponseRecord, SavedQuestion, SavedQuestionnaire,
};
use super::draft::QuestionnaireDraft;
use super::repository::{RepositoryError, SurveyRepository};

pub(crate) fn storage_error(context: &str, err: rusqlite::Error) -> RepositoryError {
    RepositoryError::Storage(format!("{context}: {err}"))
}

pub struct SqliteSurveyRepository {
    conn: Mutex<Connection>,
}

impl SqliteSurveyRepository {
    /// Open or create the questionnaire database at `path`.
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                RepositoryError::Storage(format!(
                    "create database directory {}: {err}",
                    parent.display()
                ))
            })?;
        }

        info!(path = %path.display(), "opening survey database");
        let conn = Connection::open(path).map_err(|err| storage_error("open database", err))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|err| storage_error("configure journal", err))?;

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        debug!("opening in-memory survey database");
        let conn = Connection::open_in_memory()
            .map_err(|err| storage_error("open in-memory database", err))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, RepositoryError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|err| storage_error("enable foreign keys", err))?;
        schema::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&Connection) -> Result<T, RepositoryError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|err| RepositoryError::Storage(format!("connection lock poisoned: {err}")))?;
        f(&conn)
    }

    fn with_conn_mut<F, T>(&self, f: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut Connection) -> Result<T, RepositoryError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|err| RepositoryError::Storage(format!("connection lock poisoned: {err}")))?;
        f(&mut conn)
    }
}

impl SurveyRepository for SqliteSurveyRepository {
    fn list_passages(&self) -> Result<Vec<Passage>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare_cached("SELECT id, title, text FROM passages ORDER BY id")
                .map_err(|err| storage_error("prepare passage listing", err))?;
            let rows = stmt
                .query_map([], passage_from_row)
                .map_err(|err| storage_error("list passages", err))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|err| storage_error("read passage row", err))
        })
    }

    fn fetch_passage(&self, id: PassageId) -> Result<Option<Passage>, RepositoryError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, title, text FROM passages WHERE id = ?1",
                params![id.0],
                passage_from_row,
            )
            .optional()
            .map_err(|err| storage_error("fetch passage", err))
        })
    }

    fn list_questions(&self, passage_id: PassageId) -> Result<Vec<Question>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT id, passage_id, text FROM questions WHERE passage_id = ?1 ORDER BY id",
                )
                .map_err(|err| storage_error("prepare question listing", err))?;
            let rows = stmt
                .query_map(params![passage_id.0], |row| {
                    Ok(Question {
                        id: QuestionId(row.get("id")?),
                        passage_id: PassageId(row.get("passage_id")?),
                        text: row.get("text")?,
                    })
                })
                .map_err(|err| storage_error("list questions", err))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|err| storage_error("read question row", err))
        })
    }

    fn list_options(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<AnswerOption>, RepositoryError> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT id, question_id, label, weight FROM options \
                     WHERE question_id = ?1 ORDER BY id",
                )
                .map_err(|err| storage_error("prepare option listing", err))?;
            let rows = stmt
                .query_map(params![question_id.0], |row| {
                    Ok(AnswerOption {
                        id: OptionId(row.get("id")?),
                        question_id: QuestionId(row.get("question_id")?),
                        label: row.get("label")?,
                        weight: row.get("weight")?,
                    })
                })
                .map_err(|err| storage_error("list options", err))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|err| storage_error("read option row", err))
        })
    }

    fn create_passage(&self, title: &str, text: &str) -> Result<PassageId, RepositoryError> {
        self.with_conn(|conn| insert_passage(conn, title, text))
    }

    fn create_question(
        &self,
        passage_id: PassageId,
        text: &str,
    ) -> Result<QuestionId, RepositoryError> {
        self.with_conn_mut(|conn| {
            let tx = conn
                .transaction()
                .map_err(|err| storage_error("begin transaction", err))?;
            if !passage_exists(&tx, passage_id)? {
                return Err(RepositoryError::missing_passage(passage_id));
            }
            let question_id = insert_question(&tx, passage_id, text)?;
            tx.commit().map_err(|err| storage_error("commit question", err))?;
            Ok(question_id)
        })
    }

    fn create_options(
        &self,
        question_id: QuestionId,
        options: &[NewOption],
    ) -> Result<(), RepositoryError> {
        self.with_conn_mut(|conn| {
            let tx = conn
                .transaction()
                .map_err(|err| storage_error("begin transaction", err))?;
            if !question_exists(&tx, question_id)? {
                return Err(RepositoryError::missing_question(question_id));
            }
            insert_options(&tx, question_id, options)?;
            tx.commit().map_err(|err| storage_error("commit options", err))?;
            Ok(())
        })
    }

    fn create_response(&self, response: NewResponse) -> Result<ResponseId, RepositoryError> {
        let answers_json = serde_json::to_string(&response.answers)
            .map_err(|err| RepositoryError::Encoding(err.to_string()))?;

        self.with_conn_mut(|conn| {
            let tx = conn
                .transaction()
                .map_err(|err| storage_error("begin transaction", err))?;
            if !passage_exists(&tx, response.passage_id)? {
                return Err(RepositoryError::missing_passage(response.passage_id));
            }
            tx.execute(
                "INSERT INTO responses (passage_id, user_name, score, empathy_level, answers_json) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    response.passage_id.0,
                    response.user_name,
                    response.score,
                    response.tier.stored_label(),
                    answers_json,
                ],
            )
            .map_err(|err| storage_error("insert response", err))?;
            let id = ResponseId(tx.last_insert_rowid());
            tx.commit().map_err(|err| storage_error("commit response", err))?;
            Ok(id)
        })
    }

    fn fetch_response(&self, id: ResponseId) -> Result<Option<ResponseRecord>, RepositoryError> {
        let row = self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, passage_id, user_name, score, empathy_level, answers_json \
                 FROM responses WHERE id = ?1",
                params![id.0],
                StoredResponse::from_row,
            )
            .optional()
            .map_err(|err| storage_error("fetch response", err))
        })?;

        row.map(StoredResponse::into_record).transpose()
    }

    fn list_responses(
        &self,
        passage_id: PassageId,
    ) -> Result<Vec<ResponseRecord>, RepositoryError> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT id, passage_id, user_name, score, empathy_level, answers_json \
                     FROM responses WHERE passage_id = ?1 ORDER BY id",
                )
                .map_err(|err| storage_error("prepare response listing", err))?;
            let rows = stmt
                .query_map(params![passage_id.0], StoredResponse::from_row)
                .map_err(|err| storage_error("list responses", err))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|err| storage_error("read response row", err))
        })?;

        rows.into_iter().map(StoredResponse::into_record).collect()
    }

    fn save_questionnaire(
        &self,
        draft: &QuestionnaireDraft,
    ) -> Result<SavedQuestionnaire, RepositoryError> {
        self.with_conn_mut(|conn| {
            let tx = conn
                .transaction()
                .map_err(|err| storage_error("begin transaction", err))?;

            let passage_id = insert_passage(&tx, &draft.title, &draft.text)?;
            let mut questions = Vec::with_capacity(draft.questions.len());
            for question in &draft.questions {
                let question_id = insert_question(&tx, passage_id, &question.text)?;
                let option_ids = insert_options(&tx, question_id, &question.options)?;
                questions.push(SavedQuestion {
                    question_id,
                    option_ids,
                });
            }

            tx.commit()
                .map_err(|err| storage_error("commit questionnaire", err))?;
            debug!(%passage_id, questions = questions.len(), "questionnaire committed");

            Ok(SavedQuestionnaire {
                passage_id,
                questions,
            })
        })
    }
}

fn passage_from_row(row: &Row) -> Result<Passage, rusqlite::Error> {
    Ok(Passage {
        id: PassageId(row.get("id")?),
        title: row.get("title")?,
        text: row.get("text")?,
    })
}

fn passage_exists(conn: &Connection, id: PassageId) -> Result<bool, RepositoryError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM passages WHERE id = ?1)",
        params![id.0],
        |row| row.get(0),
    )
    .map_err(|err| storage_error("check passage", err))
}

fn question_exists(conn: &Connection, id: QuestionId) -> Result<bool, RepositoryError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM questions WHERE id = ?1)",
        params![id.0],
        |row| row.get(0),
    )
    .map_err(|err| storage_error("check question", err))
}

fn insert_passage(conn: &Connection, title: &str, text: &str) -> Result<PassageId, RepositoryError> {
    conn.execute(
        "INSERT INTO passages (title, text) VALUES (?1, ?2)",
        params![title, text],
    )
    .map_err(|err| storage_error("insert passage", err))?;
    Ok(PassageId(conn.last_insert_rowid()))
}

fn insert_question(
    conn: &Connection,
    passage_id: PassageId,
    text: &str,
) -> Result<QuestionId, RepositoryError> {
    conn.execute(
        "INSERT INTO questions (passage_id, text) VALUES (?1, ?2)",
        params![passage_id.0, text],
    )
    .map_err(|err| storage_error("insert question", err))?;
    Ok(QuestionId(conn.last_insert_rowid()))
}

fn insert_options(
    conn: &Connection,
    question_id: QuestionId,
    options: &[NewOption],
) -> Result<Vec<OptionId>, RepositoryError> {
    let mut stmt = conn
        .prepare_cached("INSERT INTO options (question_id, label, weight) VALUES (?1, ?2, ?3)")
        .map_err(|err| storage_error("prepare option insert", err))?;

    let mut ids = Vec::with_capacity(options.len());
    for option in options {
        stmt.execute(params![question_id.0, option.label, option.weight])
            .map_err(|err| storage_error("insert option", err))?;
        ids.push(OptionId(conn.last_insert_rowid()));
    }
    Ok(ids)
}

/// Raw `responses` row before the answers column is decoded.
struct StoredResponse {
    id: i64,
    passage_id: i64,
    user_name: String,
    score: i64,
    empathy_level: String,
    answers_json: String,
}

impl StoredResponse {
    fn from_row(row: &Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            passage_id: row.get("passage_id")?,
            user_name: row.get("user_name")?,
            score: row.get("score")?,
            empathy_level: row.get("empathy_level")?,
            answers_json: row.get("answers_json")?,
        })
    }

    fn into_record(self) -> Result<ResponseRecord, RepositoryError> {
        let answers: Answers = serde_json::from_str(&self.answers_json)
            .map_err(|err| RepositoryError::Encoding(format!("response {}: {err}", self.id)))?;
        let tier = EmpathyTier::classify(self.score);
        if let Some(labelled) = EmpathyTier::parse(&self.empathy_level) {
            if labelled != tier {
                warn!(
                    response_id = self.id,
                    score = self.score,
                    stored = %self.empathy_level,
                    "stored empathy level disagrees with score, using score"
                );
            }
        }

        Ok(ResponseRecord {
            id: ResponseId(self.id),
            passage_id: PassageId(self.passage_id),
            user_name: self.user_name,
            score: self.score,
            tier,
            answers,
        })
    }
}
