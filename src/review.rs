use futures::stream::{self, StreamExt};
use thiserror::Error;
use tracing::{info, warn};

use crate::llm::{LanguageService, ServiceError};
use crate::palette::Palette;
use crate::utils::trim_line;

const MAX_CONCURRENT_LLM_REQUESTS: usize = 4;

/// Sentences are exchanged with the model as a `|`-separated list.
pub const RESERVED_DELIMITER: char = '|';

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReviewError {
    #[error("input cannot contain '|'")]
    ReservedDelimiter,
    #[error("there is no text to check")]
    EmptyInput,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub original: String,
    pub corrected: String,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleReview {
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Flagged { index: usize, text: &'a str },
}

impl SampleReview {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// The sentences a practice session should be built from.
    pub fn flagged_sentences(&self) -> Vec<String> {
        self.findings
            .iter()
            .map(|finding| finding.original.clone())
            .collect()
    }

    /// Splits `text` into plain and flagged stretches, in order. Findings the
    /// sample does not literally contain are skipped.
    pub fn segments<'a>(&self, text: &'a str) -> Vec<Segment<'a>> {
        let mut segments = Vec::new();
        let mut rest = text;

        for (index, finding) in self.findings.iter().enumerate() {
            let Some(start) = rest.find(finding.original.as_str()) else {
                continue;
            };
            let end = start + finding.original.len();
            if start > 0 {
                segments.push(Segment::Plain(&rest[..start]));
            }
            segments.push(Segment::Flagged {
                index,
                text: &rest[start..end],
            });
            rest = &rest[end..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Plain(rest));
        }
        segments
    }

    /// Renders the sample with flagged sentences in red, `focus` in yellow.
    pub fn highlight(&self, text: &str, focus: Option<usize>) -> String {
        self.segments(text)
            .into_iter()
            .map(|segment| match segment {
                Segment::Plain(plain) => plain.to_string(),
                Segment::Flagged { index, text } if Some(index) == focus => {
                    Palette::paint(Palette::WARNING, text)
                }
                Segment::Flagged { text, .. } => Palette::paint(Palette::DANGER, text),
            })
            .collect()
    }
}

/// Finds the ungrammatical sentences of a writing sample and their corrections.
pub async fn review_sample<S: LanguageService>(
    service: &S,
    text: &str,
) -> Result<SampleReview, ReviewError> {
    if text.contains(RESERVED_DELIMITER) {
        return Err(ReviewError::ReservedDelimiter);
    }
    let text = trim_line(text).ok_or(ReviewError::EmptyInput)?;

    if service.judge_correctness(text).await? {
        info!("sample has no grammatical errors");
        return Ok(SampleReview::default());
    }

    let listed = service.list_incorrect_sentences(text).await?;
    let corrected = service.correct_sentences(&listed).await?;
    if listed.len() != corrected.len() {
        warn!(
            listed = listed.len(),
            corrected = corrected.len(),
            "correction count differs from listed sentences"
        );
    }

    let findings: Vec<Finding> = listed
        .into_iter()
        .zip(corrected)
        .filter(|(original, corrected)| original != corrected)
        .map(|(original, corrected)| Finding {
            original,
            corrected,
            explanation: None,
        })
        .collect();

    info!(findings = findings.len(), "reviewed writing sample");
    Ok(SampleReview { findings })
}

/// Fills in the explanation of every finding that lacks one.
pub async fn explain_all<S: LanguageService>(
    service: &S,
    review: &mut SampleReview,
) -> Result<(), ReviewError> {
    let pending: Vec<(usize, String, String)> = review
        .findings
        .iter()
        .enumerate()
        .filter(|(_, finding)| finding.explanation.is_none())
        .map(|(idx, finding)| (idx, finding.original.clone(), finding.corrected.clone()))
        .collect();

    if pending.is_empty() {
        return Ok(());
    }

    let requests = pending.into_iter().map(|job| explain_finding(service, job));
    let mut tasks = stream::iter(requests)
        .buffer_unordered(MAX_CONCURRENT_LLM_REQUESTS);

    while let Some(result) = tasks.next().await {
        let (idx, explanation) = result?;
        if let Some(finding) = review.findings.get_mut(idx) {
            finding.explanation = Some(explanation);
        }
    }

    Ok(())
}

async fn explain_finding<S: LanguageService>(
    service: &S,
    (idx, original, corrected): (usize, String, String),
) -> Result<(usize, String), ServiceError> {
    let explanation = service.explain_difference(&original, &corrected).await?;
    Ok((idx, explanation))
}
