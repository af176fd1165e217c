use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueHint};
use tracing::error;

use lexed::commands::{check, practice};
use lexed::llm::{self, KeyStore};
use lexed::logging::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "lexed",
    version,
    about = "Grammar tutoring in your terminal.",
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the grammatical errors in a writing sample
    Check {
        /// Text to check. Read from --file or stdin when omitted.
        #[arg(value_name = "TEXT", conflicts_with = "file")]
        text: Option<String>,
        /// File containing the writing sample
        #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Explain every correction
        #[arg(long, default_value_t = false)]
        explain: bool,
        /// Start a practice session on the errors without asking
        #[arg(long, default_value_t = false)]
        practice: bool,
    },
    /// Practice on sentences you got wrong before
    Practice {
        /// Ungrammatical sentences to practice on
        #[arg(value_name = "SENTENCE", num_args = 0..)]
        sentences: Vec<String>,
        /// File with one sentence per line
        #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },
    /// Manage language model settings
    Llm {
        /// Store a new API key in the local auth file
        #[arg(long, value_name = "KEY", conflicts_with = "clear")]
        set: Option<String>,
        /// Remove the stored API key from the local auth file
        #[arg(long, conflicts_with = "test")]
        clear: bool,
        /// Verify the configured API key by calling the OpenAI API
        #[arg(long, conflicts_with = "clear")]
        test: bool,
    },
}

#[tokio::main]
async fn main() {
    let _log_guard = match init_logging() {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Logging disabled: {err:#}");
            None
        }
    };

    if let Err(err) = run_cli().await {
        error!(error = %format!("{err:#}"), "command failed");
        eprintln!("{:?}", err);
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Check {
            text,
            file,
            explain,
            practice,
        } => check::run(text, file, explain, practice).await?,
        Command::Practice { sentences, file } => practice::run(sentences, file).await?,
        Command::Llm { set, clear, test } => handle_llm_command(set, clear, test).await?,
    }

    Ok(())
}

async fn handle_llm_command(set: Option<String>, clear: bool, test: bool) -> Result<()> {
    let store = KeyStore::open_default()?;
    let mut action_taken = false;

    if let Some(key) = set {
        store.store(&key)?;
        println!("Stored OpenAI API key in the local auth file.");
        action_taken = true;
    }

    if clear {
        if store.clear()? {
            println!("Removed the stored OpenAI API key.");
        } else {
            println!("No OpenAI API key found in the auth file.");
        }
        action_taken = true;
    }

    if test {
        let source = llm::test_configured_api_key(&store).await?;
        println!("OpenAI API key from the {} is valid.", source.description());
        action_taken = true;
    }

    if !action_taken {
        bail!("No action provided. Use --set, --clear, or --test.");
    }
    Ok(())
}
