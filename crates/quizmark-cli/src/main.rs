//! quizmark CLI: rubric-graded self-study quizzes in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

use commands::mistakes::Action;
use commands::original::TranslationMode;
use commands::quiz::QuizOptions;

#[derive(Parser)]
#[command(name = "quizmark", version, about = "Rubric-graded self-study quizzes")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config and a demo catalog
    Init,

    /// Check question JSON files for problems
    Validate {
        /// Question file or directory
        #[arg(long)]
        questions: PathBuf,
    },

    /// List configured topics
    Topics,

    /// Start an interactive quiz session
    Quiz {
        /// Topic name or slug
        #[arg(long)]
        topic: Option<String>,

        /// Shuffle the question order
        #[arg(long)]
        random: bool,

        /// Only practice open mistakes
        #[arg(long)]
        mistakes: bool,

        /// 1-based question number to start at
        #[arg(long)]
        start: Option<usize>,
    },

    /// Grade a single answer
    Grade {
        #[arg(long)]
        topic: String,

        #[arg(long)]
        qid: String,

        /// Answer text (option labels for multiple choice)
        #[arg(long)]
        answer: Option<String>,

        /// Vocabulary blank as N=TEXT (repeatable)
        #[arg(long = "blank")]
        blanks: Vec<String>,
    },

    /// Ask for a hint on a question
    Hint {
        #[arg(long)]
        topic: String,

        #[arg(long)]
        qid: String,
    },

    /// Show progress statistics
    Stats {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the mistake list
    Mistakes {
        #[command(subcommand)]
        action: Option<MistakesAction>,
    },

    /// Analyze weaknesses across every question ever marked wrong
    Analyze,

    /// List a topic's questions, or show one with its history
    Browse {
        #[arg(long)]
        topic: String,

        #[arg(long)]
        qid: Option<String>,
    },

    /// Print rubric key points for recitation
    Memorize {
        #[arg(long)]
        topic: String,
    },

    /// Show a set text with its translation
    Original {
        #[arg(long)]
        topic: String,

        #[arg(long, value_enum, default_value = "sentence")]
        mode: TranslationMode,
    },

    /// Delete all progress and mistakes
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum MistakesAction {
    /// List open mistakes
    List,
    /// Mark a question as a mistake
    Add { qid: String },
    /// Remove a question from the mistake list
    Clear { qid: String },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "quizmark=info".parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { questions } => commands::validate::execute(questions),
        Commands::Topics => commands::topics::execute(config).await,
        Commands::Quiz {
            topic,
            random,
            mistakes,
            start,
        } => {
            let options = QuizOptions {
                topic,
                random,
                mistakes,
                start,
            };
            commands::quiz::execute(options, config).await
        }
        Commands::Grade {
            topic,
            qid,
            answer,
            blanks,
        } => commands::grade::execute(topic, qid, answer, blanks, config).await,
        Commands::Hint { topic, qid } => commands::hint::execute(topic, qid, config).await,
        Commands::Stats { json } => commands::stats::execute(config, json).await,
        Commands::Mistakes { action } => {
            let action = match action {
                None | Some(MistakesAction::List) => Action::List,
                Some(MistakesAction::Add { qid }) => Action::Add(qid),
                Some(MistakesAction::Clear { qid }) => Action::Clear(qid),
            };
            commands::mistakes::execute(action, config).await
        }
        Commands::Analyze => commands::analyze::execute(config).await,
        Commands::Browse { topic, qid } => commands::browse::execute(topic, qid, config).await,
        Commands::Memorize { topic } => commands::memorize::execute(topic, config).await,
        Commands::Original { topic, mode } => {
            commands::original::execute(topic, mode, config).await
        }
        Commands::Reset { yes } => commands::reset::execute(yes, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
