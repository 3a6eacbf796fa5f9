use std::sync::OnceLock;

use regex::Regex;

/// Focus substituted when the passage has no word of four or more letters.
pub const FALLBACK_FOCUS: &str = "the person";

pub const GENERATED_QUESTION_COUNT: usize = 5;

fn focus_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[A-Za-z]{4,}\b").expect("focus pattern compiles"))
}

/// First standalone alphabetic word of at least four letters, if any.
pub fn focus_word(text: &str) -> Option<&str> {
    focus_pattern().find(text).map(|found| found.as_str())
}

/// Fill the five fixed prompt templates for a passage.
pub fn generate_questions(text: &str) -> [String; GENERATED_QUESTION_COUNT] {
    let focus = focus_word(text).unwrap_or(FALLBACK_FOCUS);

    [
        format!("How would you emotionally respond to {focus} in this situation?"),
        "What would be your immediate action after understanding the situation?".to_string(),
        "How would you communicate with the person involved empathetically?".to_string(),
        "What kind of support would you offer considering the circumstances?".to_string(),
        "How would you handle similar situations in the future?".to_string(),
    ]
}
