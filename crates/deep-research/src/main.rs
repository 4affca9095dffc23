//! The `deep-research` command line tool.

#[macro_use]
extern crate tracing;

use std::io::{IsTerminal as _, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use deep_research::config::{ConfigSources, Settings};
use deep_research::core::export::{MarkdownExport, MarkdownPdfExport};
use deep_research::core::present::Presenter;
use deep_research::core::prompt::Mode;
use deep_research::core::report::{Audience, Focus, ReportConfig};
use deep_research::core::{ActionOutcome, Session, SessionBuilder, deliver};
use deep_research::terminal::{TerminalPresenter, markdown};
use deep_research_gemini_model::GeminiProvider;
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt, BufReader, Stdin};

const BAR_CHAR: &str = "▎";

/// Researches a topic with Gemini and Google Search grounding.
#[derive(Debug, Parser)]
#[command(name = "deep-research", version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Env file to load instead of `./.env`.
    #[arg(long, global = true, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// TOML secrets file holding `GEMINI_API_KEY`.
    #[arg(long, global = true, value_name = "FILE")]
    secrets: Option<PathBuf>,

    /// Gemini model to use.
    #[arg(long, global = true)]
    model: Option<String>,

    /// Root of the Gemini API.
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Directory to save the exports into. They are only listed otherwise.
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Also export a PDF briefing.
    #[arg(long)]
    pdf: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Writes a structured research report.
    Report {
        /// Topic to research. Read from stdin when omitted.
        topic: Option<String>,

        /// Who the report is written for: executive, technical or general.
        #[arg(long, default_value = "executive")]
        audience: Audience,

        /// What the report concentrates on: market, technology or
        /// competitors.
        #[arg(long, default_value = "market")]
        focus: Focus,

        #[command(flatten)]
        export: ExportArgs,
    },
    /// Writes a mini-briefing in the voice of a tech analyst.
    Brief {
        /// Topic to research. Read from stdin when omitted.
        topic: Option<String>,

        #[command(flatten)]
        export: ExportArgs,
    },
    /// Starts a conversation that remembers the previous turns.
    Chat {
        #[command(flatten)]
        export: ExportArgs,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let sources = ConfigSources {
        env_file: cli.config.env_file,
        secrets_file: cli.config.secrets,
    };
    let settings = match Settings::load(&sources) {
        Ok(settings) => settings
            .with_model(cli.config.model)
            .with_base_url(cli.config.base_url),
        Err(err) => {
            eprintln!("{}", format!("❌ {err}").bright_red());
            return ExitCode::FAILURE;
        }
    };
    debug!("settings: {settings:?}");
    let provider = GeminiProvider::new(settings.provider_config());

    let (mode, topic, export) = match cli.command {
        Command::Report {
            topic,
            audience,
            focus,
            export,
        } => (Mode::Report(ReportConfig { audience, focus }), topic, export),
        Command::Brief { topic, export } => (Mode::Analyst, topic, export),
        Command::Chat { export } => (Mode::Chat, None, export),
    };

    let builder = SessionBuilder::with_model_provider(provider).with_mode(mode);
    let builder = if export.pdf {
        builder.with_exporter(MarkdownPdfExport::default())
    } else {
        builder.with_exporter(MarkdownExport::new(mode.markdown_file_name()))
    };
    let mut session = builder.build();
    let mut presenter = TerminalPresenter::new(export.out);
    let mut stdin = BufReader::new(io::stdin());

    if mode.keeps_history() {
        run_chat(&mut session, &mut presenter, &mut stdin).await;
        return ExitCode::SUCCESS;
    }

    let colored = std::io::stdout().is_terminal();
    match &mode {
        Mode::Report(config) => {
            print!("{}", markdown::render(&config.banner(), colored));
        }
        _ => println!("Enter a topic, get a sourced briefing."),
    }

    let topic = match topic {
        Some(topic) => topic,
        None => {
            prompt("Enter Research Topic: ");
            read_line(&mut stdin).await.unwrap_or_default()
        }
    };

    match session.handle_query(&topic, &mut presenter).await {
        ActionOutcome::Rendered(_) => ExitCode::SUCCESS,
        ActionOutcome::Rejected | ActionOutcome::Failed => ExitCode::FAILURE,
    }
}

async fn run_chat(
    session: &mut Session,
    presenter: &mut TerminalPresenter,
    stdin: &mut BufReader<Stdin>,
) {
    println!(
        "{}Ask anything. /history shows the conversation, /save exports \
         the latest answer, /exit quits.",
        BAR_CHAR.bright_cyan()
    );

    loop {
        prompt("> ");
        let Some(line) = read_line(stdin).await else {
            break;
        };

        match line.trim() {
            "/exit" | "/quit" => break,
            "/history" => print_history(session),
            "/save" => match session.export_latest() {
                None => presenter.warn("Nothing to save yet."),
                Some(exports) => deliver(exports, presenter),
            },
            query => {
                let outcome = session.handle_query(query, presenter).await;
                debug!("chat turn finished: {outcome:?}");
            }
        }
        println!();
    }
}

fn print_history(session: &Session) {
    let history = session.history();
    if history.is_empty() {
        println!("(no messages yet)");
        return;
    }
    for turn in history.iter() {
        println!("{}{turn}", BAR_CHAR.bright_white());
    }
}

fn prompt(text: &str) {
    print!("{text}");
    if let Err(err) = std::io::stdout().flush() {
        warn!("failed to flush stdout: {err}");
    }
}

async fn read_line(stdin: &mut BufReader<Stdin>) -> Option<String> {
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
