use crate::demo::{
    run_demo, run_export, run_generate, run_passages, run_summary, DemoArgs, ExportArgs,
    GenerateArgs, StoreArgs, SummaryArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use empathy_survey::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Empathy Survey",
    about = "Author passage questionnaires and score empathy responses",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List stored passages with their question counts
    Passages(StoreArgs),
    /// Print the five template questions generated for a passage text
    Generate(GenerateArgs),
    /// Summarise stored responses for one passage
    Summary(SummaryArgs),
    /// Export stored responses for one passage as CSV
    Export(ExportArgs),
    /// Run an end-to-end demo: author a passage, answer it, and score it
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured SQLite database path
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Passages(args) => run_passages(args),
        Command::Generate(args) => run_generate(args),
        Command::Summary(args) => run_summary(args),
        Command::Export(args) => run_export(args),
        Command::Demo(args) => run_demo(args),
    }
}
