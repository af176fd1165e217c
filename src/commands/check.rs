use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};

use super::practice::{self, NO_ERRORS_MESSAGE};
use super::with_cli_loading;
use crate::llm::{self, KeyStore};
use crate::palette::Palette;
use crate::review::{self, ReviewError, SampleReview};
use crate::tui::describe_service_error;
use crate::utils::{ask_yn, pluralize};

const KEY_REASON: &str = "Checking your writing needs the language model.";

pub async fn run(
    text: Option<String>,
    file: Option<PathBuf>,
    explain: bool,
    practice_now: bool,
) -> Result<()> {
    let sample = read_sample(text, file)?;

    let store = KeyStore::open_default()?;
    let service = llm::ensure_service(&store, KEY_REASON).await?;

    let mut review = with_cli_loading(review::review_sample(&service, &sample))
        .await
        .map_err(friendly_error)?;
    if review.is_clean() {
        println!("{NO_ERRORS_MESSAGE}");
        return Ok(());
    }
    if explain {
        with_cli_loading(review::explain_all(&service, &mut review))
            .await
            .map_err(friendly_error)?;
    }

    print_review(&sample, &review);

    let start_practice =
        practice_now || (io::stdin().is_terminal() && ask_yn("Practice these sentences now?")?);
    if start_practice {
        practice::start(service, review.flagged_sentences()).await?;
    }
    Ok(())
}

fn read_sample(text: Option<String>, file: Option<PathBuf>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }
    if let Some(path) = file {
        return fs::read_to_string(&path)
            .with_context(|| format!("Failed to read writing sample from {}", path.display()));
    }
    if io::stdin().is_terminal() {
        bail!("No text to check. Pass it as an argument, with --file, or on stdin.");
    }
    let mut sample = String::new();
    io::stdin()
        .read_to_string(&mut sample)
        .context("Failed to read writing sample from stdin")?;
    Ok(sample)
}

fn friendly_error(err: ReviewError) -> anyhow::Error {
    match err {
        ReviewError::Service(service) => anyhow!(describe_service_error(&service)),
        other => other.into(),
    }
}

fn print_review(sample: &str, review: &SampleReview) {
    for line in review_lines(sample, review) {
        println!("{line}");
    }
}

fn review_lines(sample: &str, review: &SampleReview) -> Vec<String> {
    let mut lines = vec![
        review.highlight(sample.trim(), None),
        String::new(),
        Palette::paint(
            Palette::ACCENT,
            format!("Found {}", pluralize("error", review.findings.len())),
        ),
    ];

    for (idx, finding) in review.findings.iter().enumerate() {
        lines.push(format!(
            "{} {}",
            Palette::dim(format!("{}.", idx + 1)),
            Palette::paint(Palette::DANGER, &finding.original)
        ));
        let corrected = Palette::paint(Palette::SUCCESS, &finding.corrected);
        lines.push(format!("   {corrected}"));
        if let Some(explanation) = &finding.explanation {
            lines.push(format!("   {}", Palette::dim(explanation)));
        }
    }
    lines
}
