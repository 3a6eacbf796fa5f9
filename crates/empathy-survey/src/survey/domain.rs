use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::classifier::EmpathyTier;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Surrogate key of a stored passage.
    PassageId
);
row_id!(
    /// Surrogate key of a question attached to a passage.
    QuestionId
);
row_id!(
    /// Surrogate key of a selectable answer option.
    OptionId
);
row_id!(
    /// Surrogate key of a recorded respondent submission.
    ResponseId
);

/// Situational text shown to respondents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: PassageId,
    pub title: String,
    pub text: String,
}

/// Single-choice prompt attached to a passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub passage_id: PassageId,
    pub text: String,
}

/// One selectable answer for a question, carrying its score weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: OptionId,
    pub question_id: QuestionId,
    pub label: String,
    pub weight: i64,
}

/// Option payload before it has been assigned an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOption {
    pub label: String,
    pub weight: i64,
}

impl NewOption {
    pub fn new(label: impl Into<String>, weight: i64) -> Self {
        Self {
            label: label.into(),
            weight,
        }
    }
}

/// Question text mapped to the label of the option chosen for it.
///
/// Entries keep the order they were answered in and are encoded as a JSON
/// object in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answers(Vec<(String, String)>);

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `label` for `question`, replacing an earlier answer in place.
    pub fn insert(&mut self, question: String, label: String) -> Option<String> {
        match self.0.iter_mut().find(|(existing, _)| *existing == question) {
            Some((_, previous)) => Some(std::mem::replace(previous, label)),
            None => {
                self.0.push((question, label));
                None
            }
        }
    }

    pub fn get(&self, question: &str) -> Option<&String> {
        self.0
            .iter()
            .find(|(existing, _)| existing == question)
            .map(|(_, label)| label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(question, label)| (question.as_str(), label.as_str()))
    }

    pub fn values(&self) -> impl Iterator<Item = &String> {
        self.0.iter().map(|(_, label)| label)
    }
}

impl Serialize for Answers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(question, label)| (question, label)))
    }
}

impl<'de> Deserialize<'de> for Answers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AnswersVisitor;

        impl<'de> Visitor<'de> for AnswersVisitor {
            type Value = Answers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping question text to option label")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Answers, A::Error> {
                let mut answers = Answers::new();
                while let Some((question, label)) = map.next_entry::<String, String>()? {
                    answers.insert(question, label);
                }
                Ok(answers)
            }
        }

        deserializer.deserialize_map(AnswersVisitor)
    }
}

/// Response payload handed to the repository once scoring has completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewResponse {
    pub passage_id: PassageId,
    pub user_name: String,
    pub score: i64,
    pub tier: EmpathyTier,
    pub answers: Answers,
}

/// Stored respondent submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub id: ResponseId,
    pub passage_id: PassageId,
    pub user_name: String,
    pub score: i64,
    pub tier: EmpathyTier,
    pub answers: Answers,
}

impl ResponseRecord {
    pub fn from_new(id: ResponseId, response: NewResponse) -> Self {
        Self {
            id,
            passage_id: response.passage_id,
            user_name: response.user_name,
            score: response.score,
            tier: response.tier,
            answers: response.answers,
        }
    }

    pub fn view(&self) -> ResponseView {
        ResponseView {
            response_id: self.id,
            passage_id: self.passage_id,
            user_name: self.user_name.clone(),
            score: self.score,
            tier: self.tier,
            tier_label: self.tier.label(),
            answers: self.answers.clone(),
        }
    }
}

/// Public representation of a recorded response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseView {
    pub response_id: ResponseId,
    pub passage_id: PassageId,
    pub user_name: String,
    pub score: i64,
    pub tier: EmpathyTier,
    pub tier_label: &'static str,
    pub answers: Answers,
}

/// A question together with the options a respondent can pick from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionWithOptions {
    pub question: Question,
    pub options: Vec<AnswerOption>,
}

impl QuestionWithOptions {
    pub fn option(&self, option_id: OptionId) -> Option<&AnswerOption> {
        self.options.iter().find(|option| option.id == option_id)
    }
}

/// Everything a respondent needs to answer one passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Questionnaire {
    pub passage: Passage,
    pub questions: Vec<QuestionWithOptions>,
    /// Questions left out because they have no options to choose from.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<QuestionId>,
}

impl Questionnaire {
    pub fn question(&self, question_id: QuestionId) -> Option<&QuestionWithOptions> {
        self.questions
            .iter()
            .find(|entry| entry.question.id == question_id)
    }
}

/// One respondent choice, carried by identity rather than display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub question_id: QuestionId,
    pub option_id: OptionId,
}

/// Respondent submission as collected by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub passage_id: PassageId,
    pub user_name: String,
    pub selections: Vec<Selection>,
}

/// Identities assigned by an atomic questionnaire save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedQuestionnaire {
    pub passage_id: PassageId,
    pub questions: Vec<SavedQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedQuestion {
    pub question_id: QuestionId,
    pub option_ids: Vec<OptionId>,
}
