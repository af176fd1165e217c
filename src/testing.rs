use std::collections::VecDeque;
use std::sync::Mutex;

use crate::llm::{LanguageService, ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Judge,
    Correct,
    Explain,
    GenerateIncorrect,
    GenerateCorrect,
    ListIncorrect,
    CorrectList,
}

#[derive(Default)]
struct Script {
    judgements: VecDeque<bool>,
    failure: Option<(Vec<Op>, ServiceError)>,
    listed: Vec<String>,
    corrections: Vec<String>,
    calls: Vec<(Op, String)>,
    generated: usize,
}

/// Deterministic stand-in for the language service.
#[derive(Default)]
pub(crate) struct ScriptedService {
    script: Mutex<Script>,
}

impl ScriptedService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues answers for `judge_correctness`; unqueued calls answer `false`.
    pub(crate) fn judge_next(&self, grammatical: bool) {
        let mut script = self.script.lock().unwrap();
        script.judgements.push_back(grammatical);
    }

    /// Makes the next call of `op` fail with `err`.
    pub(crate) fn fail_next(&self, op: Op, err: ServiceError) {
        self.fail_next_of(&[op], err);
    }

    /// Makes the next call of any of `ops` fail with `err`.
    pub(crate) fn fail_next_of(&self, ops: &[Op], err: ServiceError) {
        self.script.lock().unwrap().failure = Some((ops.to_vec(), err));
    }

    pub(crate) fn set_review(&self, listed: &[&str], corrections: &[&str]) {
        let mut script = self.script.lock().unwrap();
        script.listed = listed.iter().map(|s| s.to_string()).collect();
        script.corrections = corrections.iter().map(|s| s.to_string()).collect();
    }

    pub(crate) fn calls(&self) -> Vec<(Op, String)> {
        self.script.lock().unwrap().calls.clone()
    }

    pub(crate) fn calls_of(&self, op: Op) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|(call, _)| *call == op)
            .map(|(_, arg)| arg)
            .collect()
    }

    fn record(&self, op: Op, arg: &str) -> Result<usize, ServiceError> {
        let mut script = self.script.lock().unwrap();
        script.calls.push((op, arg.to_string()));
        if script
            .failure
            .as_ref()
            .is_some_and(|(failing, _)| failing.contains(&op))
        {
            let (_, err) = script.failure.take().unwrap();
            return Err(err);
        }
        script.generated += 1;
        Ok(script.generated)
    }
}

impl LanguageService for ScriptedService {
    async fn judge_correctness(&self, sentence: &str) -> Result<bool, ServiceError> {
        self.record(Op::Judge, sentence)?;
        Ok(self
            .script
            .lock()
            .unwrap()
            .judgements
            .pop_front()
            .unwrap_or(false))
    }

    async fn correct(&self, sentence: &str) -> Result<String, ServiceError> {
        self.record(Op::Correct, sentence)?;
        Ok(format!("fixed: {sentence}"))
    }

    async fn explain_difference(
        &self,
        original: &str,
        corrected: &str,
    ) -> Result<String, ServiceError> {
        self.record(Op::Explain, original)?;
        Ok(format!("{original} -> {corrected}"))
    }

    async fn generate_incorrect_variant(&self, seed: &str) -> Result<String, ServiceError> {
        let n = self.record(Op::GenerateIncorrect, seed)?;
        Ok(format!("wrong like '{seed}' #{n}"))
    }

    async fn generate_correct_variant(&self, seed: &str) -> Result<String, ServiceError> {
        let n = self.record(Op::GenerateCorrect, seed)?;
        Ok(format!("right like '{seed}' #{n}"))
    }

    async fn list_incorrect_sentences(&self, text: &str) -> Result<Vec<String>, ServiceError> {
        self.record(Op::ListIncorrect, text)?;
        Ok(self.script.lock().unwrap().listed.clone())
    }

    async fn correct_sentences(&self, sentences: &[String]) -> Result<Vec<String>, ServiceError> {
        self.record(Op::CorrectList, &sentences.join("|"))?;
        Ok(self.script.lock().unwrap().corrections.clone())
    }
}
