use crate::infra::{database_path, in_memory_service, open_service, SqliteSurveyService};
use clap::Args;
use empathy_survey::config::AppConfig;
use empathy_survey::error::AppError;
use empathy_survey::survey::{
    generate_questions, write_responses_csv, EmpathyTier, NewOption, PassageId,
    QuestionnaireDraft, QuestionnaireState, ResponseSummary, Selection, Submission,
    SurveyServiceError,
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

const DEMO_TITLE: &str = "The quiet colleague";
const DEMO_PASSAGE: &str = "Maria used to chat with everyone at lunch. For two weeks she has \
eaten alone at her desk, answers in single words, and left early on Friday without saying goodbye.";

#[derive(Args, Debug, Default)]
pub(crate) struct StoreArgs {
    /// Override the configured SQLite database path
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct GenerateArgs {
    /// Passage text to derive the questions from
    #[arg(long)]
    pub(crate) text: String,
    /// Print the editable draft as JSON instead of a numbered list
    #[arg(long)]
    pub(crate) json: bool,
    /// Title carried into the JSON draft
    #[arg(long, default_value = "")]
    pub(crate) title: String,
}

#[derive(Args, Debug)]
pub(crate) struct SummaryArgs {
    /// Passage whose responses are summarised
    #[arg(long)]
    pub(crate) passage_id: i64,
    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Passage whose responses are exported
    #[arg(long)]
    pub(crate) passage_id: i64,
    /// Destination file; stdout when omitted
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
    #[command(flatten)]
    pub(crate) store: StoreArgs,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Persist the demo into this database instead of an in-memory one
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Respondent name recorded with the demo response
    #[arg(long)]
    pub(crate) user_name: Option<String>,
    /// Index of the option picked for every question (clamped to the last option)
    #[arg(long, default_value_t = 0)]
    pub(crate) choice: usize,
}

fn stored_service(store: StoreArgs) -> Result<SqliteSurveyService, AppError> {
    let config = AppConfig::load()?;
    let path = database_path(&config, store.database);
    open_service(&config, &path)
}

pub(crate) fn run_passages(args: StoreArgs) -> Result<(), AppError> {
    let service = stored_service(args)?;

    let passages = match service.passages() {
        Ok(passages) => passages,
        Err(SurveyServiceError::Warning(warning)) => {
            println!("{}", capitalise(&warning.to_string()));
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    println!("Stored passages");
    for passage in passages {
        let status = match service.questionnaire(passage.id)? {
            QuestionnaireState::Ready(questionnaire) => {
                let mut status = format!("{} questions", questionnaire.questions.len());
                if !questionnaire.skipped.is_empty() {
                    status.push_str(&format!(", {} skipped", questionnaire.skipped.len()));
                }
                status
            }
            QuestionnaireState::Unavailable(warning) => warning.to_string(),
        };
        println!("- [{}] {} ({})", passage.id, passage.title, status);
    }
    Ok(())
}

pub(crate) fn run_generate(args: GenerateArgs) -> Result<(), AppError> {
    if args.json {
        let draft = QuestionnaireDraft::generate(args.title.trim(), args.text.trim());
        match serde_json::to_string_pretty(&draft) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Draft unavailable: {err}"),
        }
        return Ok(());
    }

    for (index, question) in generate_questions(&args.text).iter().enumerate() {
        println!("{}. {}", index + 1, question);
    }
    Ok(())
}

pub(crate) fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let service = stored_service(args.store)?;
    let summary = service.summary(PassageId(args.passage_id))?;
    render_summary(&summary);
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let service = stored_service(args.store)?;
    let responses = service.responses(PassageId(args.passage_id))?;

    match args.out {
        Some(path) => {
            let file = BufWriter::new(File::create(&path)?);
            write_responses_csv(file, &responses)?;
            println!(
                "Exported {} responses to {}",
                responses.len(),
                path.display()
            );
        }
        None => {
            let stdout = io::stdout();
            write_responses_csv(stdout.lock(), &responses)?;
        }
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        database,
        user_name,
        choice,
    } = args;

    let config = AppConfig::load()?;
    let service = match database {
        Some(path) => open_service(&config, &path)?,
        None => in_memory_service(&config)?,
    };

    println!("Empathy survey demo");
    println!("\nPassage: {DEMO_TITLE}");
    println!("{DEMO_PASSAGE}");

    let mut draft = service.generate_draft(DEMO_TITLE, DEMO_PASSAGE)?;
    for question in &mut draft.questions {
        question.options = demo_options();
    }

    let saved = match service.save_draft(draft) {
        Ok(saved) => saved,
        Err(err) => {
            println!("  Questionnaire rejected: {err}");
            return Ok(());
        }
    };
    println!(
        "\nSaved passage {} with {} questions",
        saved.passage_id,
        saved.questions.len()
    );

    let questionnaire = match service.questionnaire(saved.passage_id)? {
        QuestionnaireState::Ready(questionnaire) => questionnaire,
        QuestionnaireState::Unavailable(warning) => {
            println!("  Questionnaire unavailable: {warning}");
            return Ok(());
        }
    };

    let mut selections = Vec::with_capacity(questionnaire.questions.len());
    for entry in &questionnaire.questions {
        let Some(option) = entry
            .options
            .get(choice)
            .or_else(|| entry.options.last())
        else {
            continue;
        };
        println!(
            "- {}\n    -> {} (weight {})",
            entry.question.text, option.label, option.weight
        );
        selections.push(Selection {
            question_id: entry.question.id,
            option_id: option.id,
        });
    }

    let user_name = user_name.unwrap_or_else(|| "Demo respondent".to_string());
    let record = match service.submit(Submission {
        passage_id: saved.passage_id,
        user_name,
        selections,
    }) {
        Ok(record) => record,
        Err(err) => {
            println!("  Submission rejected: {err}");
            return Ok(());
        }
    };

    println!(
        "\nResponse {} from {}: score {} -> {}",
        record.id,
        record.user_name,
        record.score,
        record.tier.label()
    );
    match serde_json::to_string_pretty(&record.view()) {
        Ok(json) => println!("Stored response payload:\n{json}"),
        Err(err) => println!("Stored response payload unavailable: {err}"),
    }

    let summary = service.summary(saved.passage_id)?;
    render_summary(&summary);
    Ok(())
}

fn demo_options() -> Vec<NewOption> {
    vec![
        NewOption::new("Ask privately how she is doing", 4),
        NewOption::new("Invite her to lunch with the team", 3),
        NewOption::new("Give her space and wait", 2),
        NewOption::new("Mention it to the manager", 1),
    ]
}

fn render_summary(summary: &ResponseSummary) {
    println!("\nPassage {} summary", summary.passage_id);
    println!("- {} responses", summary.responses);
    if let (Some(average), Some(min), Some(max)) =
        (summary.average_score, summary.min_score, summary.max_score)
    {
        println!("- average score {average:.1} (min {min}, max {max})");
    }
    for tier in EmpathyTier::ordered() {
        println!("  - {}: {}", tier.label(), summary.tiers.count(tier));
    }
}

fn capitalise(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_against_a_temporary_database() {
        let dir = tempfile::tempdir().expect("temporary directory");
        let database = dir.path().join("demo.db");

        run_demo(DemoArgs {
            database: Some(database.clone()),
            user_name: Some("Tester".to_string()),
            choice: 0,
        })
        .expect("demo completes");

        let config = AppConfig::load().expect("config loads");
        let service = open_service(&config, &database).expect("database reopens");
        let passages = service.passages().expect("demo passage stored");
        assert_eq!(passages.len(), 1);
        let summary = service.summary(passages[0].id).expect("summary builds");
        assert_eq!(summary.responses, 1);
        assert_eq!(summary.max_score, Some(20));
        assert_eq!(summary.tiers.high, 1);
    }

    #[test]
    fn capitalise_uppercases_the_first_letter() {
        assert_eq!(capitalise("no passages found"), "No passages found");
        assert_eq!(capitalise(""), "");
    }
}
