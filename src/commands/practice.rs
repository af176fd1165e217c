use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::llm::{self, KeyStore, LanguageService};
use crate::palette::Palette;
use crate::session::{Counts, PracticeSession};
use crate::tui;
use crate::utils::{pluralize, trim_line};

pub const NO_ERRORS_MESSAGE: &str = "No errors! Good job :)";

const KEY_REASON: &str = "Practice sessions are generated by the language model.";

pub async fn run(sentences: Vec<String>, file: Option<PathBuf>) -> Result<()> {
    let mut flagged = sentences;
    if let Some(path) = file {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read sentences from {}", path.display()))?;
        flagged.extend(sentences_from_lines(&contents));
    }

    if flagged.iter().all(|sentence| trim_line(sentence).is_none()) {
        println!("{NO_ERRORS_MESSAGE}");
        return Ok(());
    }

    let store = KeyStore::open_default()?;
    let service = llm::ensure_service(&store, KEY_REASON).await?;
    start(service, flagged).await
}

/// Opens the practice screen over `flagged` and prints the final counters.
pub async fn start<S: LanguageService>(service: S, flagged: Vec<String>) -> Result<()> {
    let session = PracticeSession::new(service, flagged);
    if session.is_complete() {
        println!("{NO_ERRORS_MESSAGE}");
        return Ok(());
    }

    let total = session.total_items();
    let counts = tui::practice::run(session).await?;
    println!("{}", summary_line(total, counts));
    Ok(())
}

fn sentences_from_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(trim_line)
        .map(str::to_string)
        .collect()
}

fn summary_line(total: usize, counts: Counts) -> String {
    let mut line = format!(
        "{} {} {} {}",
        Palette::dim(format!("Practiced {}:", pluralize("exercise", total))),
        Palette::paint(Palette::CORRECT, format!("{} correct", counts.correct)),
        Palette::paint(Palette::INCORRECT, format!("{} incorrect", counts.incorrect)),
        Palette::paint(Palette::REMAINING, format!("{} remaining", counts.remaining)),
    );
    if counts.remaining == 0 && counts.incorrect == 0 {
        line.push_str(" Well done!");
    }
    line
}
