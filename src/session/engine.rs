use rand::Rng;
use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use super::error::SessionError;
use super::item::{ExerciseItem, ItemKind, ItemState};
use crate::llm::LanguageService;
use crate::utils::trim_line;

/// Progress counters shown next to the exercise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counts {
    pub remaining: usize,
    pub correct: usize,
    pub incorrect: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Claim {
    ClaimsCorrect,
    ClaimsIncorrect,
}

/// What the user gets to see after answering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reveal {
    /// The exercise was grammatical all along.
    AlreadyCorrect,
    /// The submitted correction was judged grammatical.
    Accepted,
    Corrected {
        corrected: String,
        explanation: String,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The user claimed an error and must now type the fixed sentence.
    CorrectionRequired,
    Right(Reveal),
    Wrong(Reveal),
}

impl Outcome {
    pub fn is_right(&self) -> bool {
        matches!(self, Outcome::Right(_))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentItem {
    pub text: String,
    pub kind: ItemKind,
    pub state: ItemState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Advance {
    Next(CurrentItem),
    Complete,
}

struct Materialized {
    text: String,
    /// Seed drawn from the unused flagged sentences, with its index.
    drawn: Option<(usize, String)>,
}

/// Number of correct-sentence fillers mixed into a pool of `flagged` errors.
pub fn filler_count(flagged: usize) -> usize {
    flagged / 3 + 1
}

/// A practice run over a set of flagged sentences.
///
/// Items are answered in pool order. Misses are copied into a recirculation
/// list that becomes the next round's pool, until a round ends with no
/// misses. Every operation either completes fully or leaves the session as it
/// was, so a failed call can simply be repeated.
pub struct PracticeSession<S, R = ThreadRng> {
    service: S,
    rng: R,
    pool: Vec<ExerciseItem>,
    recirculation: Vec<ExerciseItem>,
    cursor: usize,
    /// Flagged sentences not yet used to seed a correct exercise.
    seeds: Vec<String>,
    counts: Counts,
    round_is_recirculation: bool,
    total_items: usize,
}

impl<S: LanguageService> PracticeSession<S, ThreadRng> {
    pub fn new<I, T>(service: S, flagged: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::initialize(service, flagged, rand::rng())
    }
}

impl<S: LanguageService, R: Rng> PracticeSession<S, R> {
    /// Builds and shuffles the pool: one incorrect prompt per flagged sentence
    /// plus [`filler_count`] correct prompts. Blank sentences are ignored and
    /// an empty list yields a session that is already complete.
    pub fn initialize<I, T>(service: S, flagged: I, mut rng: R) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let seeds: Vec<String> = flagged
            .into_iter()
            .map(Into::into)
            .filter_map(|sentence| trim_line(&sentence).map(str::to_string))
            .collect();

        let mut pool: Vec<ExerciseItem> = seeds.iter().map(ExerciseItem::incorrect).collect();
        if !seeds.is_empty() {
            let fillers = filler_count(seeds.len());
            pool.extend((0..fillers).map(|_| ExerciseItem::correct_filler()));
        }
        pool.shuffle(&mut rng);

        let total_items = pool.len();
        info!(
            flagged = seeds.len(),
            items = total_items,
            "initialized practice session"
        );

        Self {
            service,
            rng,
            pool,
            recirculation: Vec::new(),
            cursor: 0,
            seeds,
            counts: Counts {
                remaining: total_items,
                ..Counts::default()
            },
            round_is_recirculation: false,
            total_items,
        }
    }

    pub fn counts(&self) -> Counts {
        self.counts
    }

    pub fn is_complete(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn round_is_recirculation(&self) -> bool {
        self.round_is_recirculation
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn recirculation_len(&self) -> usize {
        self.recirculation.len()
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// The exercise on screen, generating its text on first request.
    pub async fn current_item(&mut self) -> Result<CurrentItem, SessionError> {
        if self.current()?.state == ItemState::Pending {
            let item = self.pool[self.cursor].clone();
            let materialized = self.materialize(&item).await?;
            self.commit_materialized(materialized);
        }
        Ok(self.view())
    }

    pub async fn submit_verdict(
        &mut self,
        claim: Claim,
        correction: Option<&str>,
    ) -> Result<Outcome, SessionError> {
        let item = self.current()?;
        let exercise = match (item.state, &item.materialized) {
            (ItemState::Resolved, _) => return Err(SessionError::AlreadyAnswered),
            (ItemState::Pending, _) | (_, None) => return Err(SessionError::NotPresented),
            (_, Some(text)) => text.clone(),
        };
        let awaiting_correction = item.state == ItemState::AwaitingCorrection;

        let outcome = match (item.kind, claim) {
            (ItemKind::CorrectPrompt, Claim::ClaimsCorrect) => {
                Outcome::Right(Reveal::AlreadyCorrect)
            }
            (ItemKind::CorrectPrompt, Claim::ClaimsIncorrect) => {
                Outcome::Wrong(Reveal::AlreadyCorrect)
            }
            (ItemKind::IncorrectPrompt, Claim::ClaimsCorrect) => {
                if awaiting_correction {
                    return Err(SessionError::CorrectionPending);
                }
                Outcome::Wrong(self.reveal_correction(&exercise, &exercise).await?)
            }
            (ItemKind::IncorrectPrompt, Claim::ClaimsIncorrect) => {
                let Some(attempt) = correction.and_then(trim_line) else {
                    self.pool[self.cursor].state = ItemState::AwaitingCorrection;
                    return Ok(Outcome::CorrectionRequired);
                };
                if self.service.judge_correctness(attempt).await? {
                    Outcome::Right(Reveal::Accepted)
                } else {
                    Outcome::Wrong(self.reveal_correction(&exercise, attempt).await?)
                }
            }
        };

        self.record(outcome.is_right());
        Ok(outcome)
    }

    /// Moves past an answered exercise. At the end of a round the missed
    /// items, reshuffled, become the new pool; with no misses the session is
    /// complete.
    pub async fn advance(&mut self) -> Result<Advance, SessionError> {
        if !self.current()?.is_resolved() {
            return Err(SessionError::Unanswered);
        }

        let next = self.cursor + 1;
        if next < self.pool.len() {
            let item = self.pool[next].clone();
            let materialized = self.materialize(&item).await?;
            self.cursor = next;
            self.commit_materialized(materialized);
            return Ok(Advance::Next(self.view()));
        }

        if self.recirculation.is_empty() {
            self.pool.clear();
            self.cursor = 0;
            info!(
                correct = self.counts.correct,
                incorrect = self.counts.incorrect,
                "practice session complete"
            );
            return Ok(Advance::Complete);
        }

        let mut next_pool = self.recirculation.clone();
        next_pool.shuffle(&mut self.rng);
        let materialized = self.materialize(&next_pool[0]).await?;

        self.pool = next_pool;
        self.recirculation.clear();
        self.cursor = 0;
        self.round_is_recirculation = true;
        self.commit_materialized(materialized);
        info!(items = self.pool.len(), "starting recirculation round");
        Ok(Advance::Next(self.view()))
    }

    fn current(&self) -> Result<&ExerciseItem, SessionError> {
        self.pool.get(self.cursor).ok_or(SessionError::Complete)
    }

    fn view(&self) -> CurrentItem {
        let item = &self.pool[self.cursor];
        CurrentItem {
            text: item.materialized.clone().unwrap_or_default(),
            kind: item.kind,
            state: item.state,
        }
    }

    /// Generates the text for `item` without touching the session state.
    async fn materialize(&mut self, item: &ExerciseItem) -> Result<Materialized, SessionError> {
        let service = &self.service;
        let seed = item.source_text.as_str();
        match item.kind {
            ItemKind::IncorrectPrompt => {
                let text = service.generate_incorrect_variant(seed).await?;
                Ok(Materialized { text, drawn: None })
            }
            ItemKind::CorrectPrompt if item.has_seed() => {
                let text = service.generate_correct_variant(seed).await?;
                Ok(Materialized { text, drawn: None })
            }
            ItemKind::CorrectPrompt => {
                if self.seeds.is_empty() {
                    return Err(SessionError::SeedsExhausted);
                }
                let idx = self.rng.random_range(0..self.seeds.len());
                let seed = self.seeds[idx].clone();
                let text = service.generate_correct_variant(&seed).await?;
                Ok(Materialized {
                    text,
                    drawn: Some((idx, seed)),
                })
            }
        }
    }

    /// Corrects the exercise and explains what changed relative to `attempt`.
    async fn reveal_correction(
        &self,
        exercise: &str,
        attempt: &str,
    ) -> Result<Reveal, SessionError> {
        let service = &self.service;
        let corrected = service.correct(exercise).await?;
        let explanation = service.explain_difference(attempt, &corrected).await?;
        Ok(Reveal::Corrected {
            corrected,
            explanation,
        })
    }

    fn commit_materialized(&mut self, materialized: Materialized) {
        let item = &mut self.pool[self.cursor];
        if let Some((idx, seed)) = materialized.drawn {
            self.seeds.swap_remove(idx);
            item.source_text = seed;
        }
        item.present(materialized.text);
        debug!(cursor = self.cursor, kind = ?item.kind, "presented exercise");
    }

    fn record(&mut self, right: bool) {
        let item = &mut self.pool[self.cursor];
        item.state = ItemState::Resolved;

        if right {
            self.counts.correct += 1;
            if self.round_is_recirculation {
                self.counts.incorrect = self.counts.incorrect.saturating_sub(1);
            } else {
                self.counts.remaining = self.counts.remaining.saturating_sub(1);
            }
        } else {
            if !self.round_is_recirculation {
                self.counts.incorrect += 1;
                self.counts.remaining = self.counts.remaining.saturating_sub(1);
            }
            let again = item.recirculated();
            self.recirculation.push(again);
        }
        debug!(right, counts = ?self.counts, "recorded answer");
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::llm::ServiceError;
    use crate::testing::{Op, ScriptedService};

    type TestSession = PracticeSession<ScriptedService, StdRng>;

    fn session_with_seed(flagged: &[&str], seed: u64) -> TestSession {
        PracticeSession::initialize(
            ScriptedService::new(),
            flagged.iter().copied(),
            StdRng::seed_from_u64(seed),
        )
    }

    fn session(flagged: &[&str]) -> TestSession {
        session_with_seed(flagged, 7)
    }

    /// Moves the cursor onto the first item of `kind` by answering everything
    /// before it correctly.
    async fn skip_to(s: &mut TestSession, kind: ItemKind) -> CurrentItem {
        loop {
            let current = s.current_item().await.unwrap();
            if current.kind == kind {
                return current;
            }
            answer(s, true).await;
            s.advance().await.unwrap();
        }
    }

    async fn answer(s: &mut TestSession, right: bool) -> Outcome {
        let current = s.current_item().await.unwrap();
        match (current.kind, right) {
            (ItemKind::CorrectPrompt, true) => s.submit_verdict(Claim::ClaimsCorrect, None).await,
            (ItemKind::CorrectPrompt, false) => {
                s.submit_verdict(Claim::ClaimsIncorrect, None).await
            }
            (ItemKind::IncorrectPrompt, true) => {
                s.service.judge_next(true);
                s.submit_verdict(Claim::ClaimsIncorrect, Some("A fixed sentence."))
                    .await
            }
            (ItemKind::IncorrectPrompt, false) => {
                s.submit_verdict(Claim::ClaimsCorrect, None).await
            }
        }
        .unwrap()
    }

    fn membership(items: &[ExerciseItem]) -> Vec<(bool, String)> {
        let mut members: Vec<_> = items
            .iter()
            .map(|item| {
                let incorrect = item.kind == ItemKind::IncorrectPrompt;
                (incorrect, item.source_text.clone())
            })
            .collect();
        members.sort();
        members
    }

    #[test]
    fn pool_holds_one_incorrect_prompt_per_flagged_sentence() {
        let s = session(&["He are happy", "They was late", "I has a cat"]);

        assert_eq!(s.pool_len(), 3 + 1 + 1);
        let mut sources: Vec<_> = s
            .pool
            .iter()
            .filter(|item| item.kind == ItemKind::IncorrectPrompt)
            .map(|item| item.source_text.as_str())
            .collect();
        sources.sort();
        assert_eq!(
            sources,
            vec!["He are happy", "I has a cat", "They was late"]
        );
        assert_eq!(s.counts().remaining, 5);
        assert!(!s.round_is_recirculation());
    }

    #[tokio::test]
    async fn empty_flagged_list_is_complete_from_the_start() {
        for flagged in [&[][..], &["   ", ""][..]] {
            let mut s = session(flagged);
            assert_eq!(s.pool_len(), 0);
            assert!(s.is_complete());
            assert_eq!(s.current_item().await, Err(SessionError::Complete));
            assert_eq!(s.advance().await, Err(SessionError::Complete));
            assert_eq!(
                s.submit_verdict(Claim::ClaimsCorrect, None).await,
                Err(SessionError::Complete)
            );
        }
    }

    #[tokio::test]
    async fn correct_prompt_claimed_correct_counts_right() {
        let mut s = session(&["He are happy", "They was late"]);
        skip_to(&mut s, ItemKind::CorrectPrompt).await;
        let before = s.counts();

        let outcome = s.submit_verdict(Claim::ClaimsCorrect, None).await.unwrap();

        assert_eq!(outcome, Outcome::Right(Reveal::AlreadyCorrect));
        assert_eq!(s.counts().correct, before.correct + 1);
        assert_eq!(s.counts().remaining, before.remaining - 1);
        assert_eq!(s.counts().incorrect, before.incorrect);
        assert_eq!(s.recirculation_len(), 0);
    }

    #[tokio::test]
    async fn correct_prompt_claimed_incorrect_is_recirculated() {
        let mut s = session(&["He are happy"]);
        skip_to(&mut s, ItemKind::CorrectPrompt).await;
        let before = s.counts();

        let outcome = s.submit_verdict(Claim::ClaimsIncorrect, None).await;

        assert_eq!(outcome, Ok(Outcome::Wrong(Reveal::AlreadyCorrect)));
        assert_eq!(s.counts().incorrect, before.incorrect + 1);
        assert_eq!(s.counts().remaining, before.remaining - 1);
        assert_eq!(s.recirculation_len(), 1);
        assert_eq!(s.recirculation[0].kind, ItemKind::CorrectPrompt);
        assert_eq!(s.recirculation[0].source_text, "He are happy");
    }

    #[tokio::test]
    async fn accepted_correction_counts_right() {
        let mut s = session(&["He are happy"]);
        skip_to(&mut s, ItemKind::IncorrectPrompt).await;
        let before = s.counts();

        let outcome = s.submit_verdict(Claim::ClaimsIncorrect, None).await;
        assert_eq!(outcome, Ok(Outcome::CorrectionRequired));
        assert_eq!(s.counts(), before);
        assert_eq!(
            s.current_item().await.unwrap().state,
            ItemState::AwaitingCorrection
        );
        assert_eq!(
            s.submit_verdict(Claim::ClaimsCorrect, None).await,
            Err(SessionError::CorrectionPending)
        );
        assert_eq!(s.advance().await, Err(SessionError::Unanswered));

        s.service.judge_next(true);
        let outcome = s
            .submit_verdict(Claim::ClaimsIncorrect, Some(" He is happy. "))
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Right(Reveal::Accepted));
        assert_eq!(s.counts().correct, before.correct + 1);
        assert_eq!(s.counts().incorrect, before.incorrect);
        assert_eq!(s.recirculation_len(), 0);
        assert_eq!(s.service.calls_of(Op::Judge), vec!["He is happy."]);
    }

    #[tokio::test]
    async fn rejected_correction_explains_the_attempt() {
        let mut s = session(&["He are happy"]);
        let current = skip_to(&mut s, ItemKind::IncorrectPrompt).await;
        let before = s.counts();

        s.service.judge_next(false);
        let outcome = s
            .submit_verdict(Claim::ClaimsIncorrect, Some("He be happy"))
            .await
            .unwrap();

        let expected_fix = format!("fixed: {}", current.text);
        assert_eq!(
            outcome,
            Outcome::Wrong(Reveal::Corrected {
                corrected: expected_fix.clone(),
                explanation: format!("He be happy -> {expected_fix}"),
            })
        );
        assert_eq!(s.counts().incorrect, before.incorrect + 1);
        assert_eq!(s.recirculation_len(), 1);
    }

    #[tokio::test]
    async fn incorrect_prompt_claimed_correct_explains_the_exercise() {
        let mut s = session(&["He are happy"]);
        let current = skip_to(&mut s, ItemKind::IncorrectPrompt).await;
        let before = s.counts();

        let outcome = s.submit_verdict(Claim::ClaimsCorrect, None).await.unwrap();

        let Outcome::Wrong(Reveal::Corrected { explanation, .. }) = outcome else {
            panic!("expected a correction, got {outcome:?}");
        };
        assert!(explanation.starts_with(&current.text));
        assert_eq!(s.counts().incorrect, before.incorrect + 1);
        assert_eq!(s.counts().remaining, before.remaining - 1);
        assert_eq!(s.recirculation[0].source_text, "He are happy");
        assert!(s.service.calls_of(Op::Judge).is_empty());
    }

    #[tokio::test]
    async fn failed_verdict_commits_nothing() {
        let mut s = session(&["He are happy"]);
        skip_to(&mut s, ItemKind::IncorrectPrompt).await;
        let before = s.counts();

        s.service.fail_next(Op::Explain, ServiceError::Timeout);
        let result = s.submit_verdict(Claim::ClaimsCorrect, None).await;

        assert_eq!(result, Err(SessionError::Service(ServiceError::Timeout)));
        assert_eq!(s.counts(), before);
        assert_eq!(s.recirculation_len(), 0);
        assert_eq!(s.current_item().await.unwrap().state, ItemState::Presented);

        let retried = s.submit_verdict(Claim::ClaimsCorrect, None).await.unwrap();
        assert!(!retried.is_right());
        assert_eq!(s.counts().incorrect, before.incorrect + 1);
    }

    #[tokio::test]
    async fn failed_materialization_keeps_the_seed_available() {
        let mut s = session(&["He are happy", "They was late"]);
        while s.pool[s.cursor].kind != ItemKind::CorrectPrompt {
            s.cursor += 1;
        }

        let failure = ServiceError::Cancelled;
        s.service.fail_next(Op::GenerateCorrect, failure);
        assert_eq!(
            s.current_item().await,
            Err(SessionError::Service(ServiceError::Cancelled))
        );
        assert_eq!(s.seeds.len(), 2);
        assert_eq!(s.pool[s.cursor].state, ItemState::Pending);
        assert!(!s.pool[s.cursor].has_seed());

        let current = s.current_item().await.unwrap();
        assert_eq!(current.kind, ItemKind::CorrectPrompt);
        assert_eq!(s.seeds.len(), 1);
        assert!(s.pool[s.cursor].has_seed());
        assert!(!s.seeds.contains(&s.pool[s.cursor].source_text));
    }

    #[tokio::test]
    async fn current_item_is_generated_once_per_occurrence() {
        let mut s = session(&["He are happy"]);
        let first = s.current_item().await.unwrap();
        let again = s.current_item().await.unwrap();

        assert_eq!(first, again);
        let generations = s.service.calls_of(Op::GenerateCorrect).len()
            + s.service.calls_of(Op::GenerateIncorrect).len();
        assert_eq!(generations, 1);
    }

    #[tokio::test]
    async fn verdict_before_presentation_is_rejected() {
        let mut s = session(&["He are happy"]);
        assert_eq!(
            s.submit_verdict(Claim::ClaimsCorrect, None).await,
            Err(SessionError::NotPresented)
        );
    }

    #[tokio::test]
    async fn answering_twice_is_rejected() {
        let mut s = session(&["He are happy"]);
        answer(&mut s, false).await;
        assert_eq!(
            s.submit_verdict(Claim::ClaimsCorrect, None).await,
            Err(SessionError::AlreadyAnswered)
        );
    }

    #[tokio::test]
    async fn single_sentence_walkthrough() {
        let mut s = session(&["He are happy"]);
        assert_eq!(s.pool_len(), 2);

        for _ in 0..2 {
            let current = s.current_item().await.unwrap();
            answer(&mut s, current.kind == ItemKind::CorrectPrompt).await;
            if s.cursor + 1 < s.pool_len() {
                s.advance().await.unwrap();
            }
        }

        assert_eq!(
            s.counts(),
            Counts {
                remaining: 0,
                correct: 1,
                incorrect: 1,
            }
        );
        assert_eq!(s.recirculation_len(), 1);
        assert_eq!(s.recirculation[0].kind, ItemKind::IncorrectPrompt);

        let Advance::Next(next) = s.advance().await.unwrap() else {
            panic!("expected a recirculation round");
        };
        assert_eq!(next.kind, ItemKind::IncorrectPrompt);
        assert!(s.round_is_recirculation());
        assert_eq!(s.pool_len(), 1);
        assert_eq!(s.recirculation_len(), 0);
        assert_eq!(
            s.service.calls_of(Op::GenerateIncorrect),
            vec!["He are happy", "He are happy"]
        );

        answer(&mut s, true).await;
        assert_eq!(
            s.counts(),
            Counts {
                remaining: 0,
                correct: 2,
                incorrect: 0,
            }
        );
        assert_eq!(s.advance().await, Ok(Advance::Complete));
        assert!(s.is_complete());
    }

    #[tokio::test]
    async fn misses_in_recirculation_round_leave_counters_alone() {
        let mut s = session(&["He are happy"]);
        loop {
            answer(&mut s, false).await;
            if s.cursor + 1 == s.pool_len() {
                break;
            }
            s.advance().await.unwrap();
        }
        let after_first_round = s.counts();
        assert_eq!(after_first_round.incorrect, 2);

        s.advance().await.unwrap();
        answer(&mut s, false).await;

        assert_eq!(s.counts(), after_first_round);
        assert_eq!(s.recirculation_len(), 1);
    }

    #[tokio::test]
    async fn next_round_pool_matches_recirculation_membership() {
        let flagged = ["a b", "c d", "e f", "g h", "i j", "k l"];
        let mut s = session(&flagged);
        let mut right = false;
        loop {
            answer(&mut s, right).await;
            right = !right;
            if s.cursor + 1 == s.pool_len() {
                break;
            }
            s.advance().await.unwrap();
        }
        let expected = membership(&s.recirculation);
        assert!(!expected.is_empty());

        s.advance().await.unwrap();

        assert_eq!(membership(&s.pool), expected);
        assert_eq!(s.recirculation_len(), 0);
        assert_eq!(s.cursor, 0);
    }

    #[tokio::test]
    async fn recirculated_filler_reuses_its_seed() {
        let mut s = session(&["He are happy", "They was late"]);
        skip_to(&mut s, ItemKind::CorrectPrompt).await;
        let seed = s.pool[s.cursor].source_text.clone();
        answer(&mut s, false).await;
        while s.cursor + 1 < s.pool_len() {
            s.advance().await.unwrap();
            answer(&mut s, true).await;
        }
        let seeds_left = s.seeds.len();

        let Advance::Next(next) = s.advance().await.unwrap() else {
            panic!("expected the missed filler again");
        };

        assert_eq!(next.kind, ItemKind::CorrectPrompt);
        assert_eq!(s.seeds.len(), seeds_left);
        assert_eq!(s.service.calls_of(Op::GenerateCorrect).last(), Some(&seed));
    }

    #[tokio::test]
    async fn failed_round_promotion_leaves_round_untouched() {
        let mut s = session(&["He are happy"]);
        loop {
            answer(&mut s, false).await;
            if s.cursor + 1 == s.pool_len() {
                break;
            }
            s.advance().await.unwrap();
        }
        let pool_before = s.pool.clone();
        let recirculation_before = membership(&s.recirculation);

        s.service.fail_next_of(
            &[Op::GenerateIncorrect, Op::GenerateCorrect],
            ServiceError::Connection,
        );
        assert_eq!(
            s.advance().await,
            Err(SessionError::Service(ServiceError::Connection))
        );
        assert_eq!(s.pool, pool_before);
        assert_eq!(membership(&s.recirculation), recirculation_before);
        assert!(!s.round_is_recirculation());

        let Advance::Next(_) = s.advance().await.unwrap() else {
            panic!("expected the recirculation round to start");
        };
        assert!(s.round_is_recirculation());
        assert_eq!(membership(&s.pool), recirculation_before);
    }

    #[tokio::test]
    async fn advance_requires_an_answer() {
        let mut s = session(&["He are happy"]);
        s.current_item().await.unwrap();
        assert_eq!(s.advance().await, Err(SessionError::Unanswered));
    }

    proptest! {
        #[test]
        fn pool_size_follows_filler_rule(n in 1usize..60, seed in any::<u64>()) {
            let flagged: Vec<String> = (0..n).map(|i| format!("sentence {i}")).collect();
            let s = PracticeSession::initialize(
                ScriptedService::new(),
                flagged,
                StdRng::seed_from_u64(seed),
            );

            prop_assert_eq!(s.pool_len(), n + n / 3 + 1);
            let incorrect = s
                .pool
                .iter()
                .filter(|item| item.kind == ItemKind::IncorrectPrompt)
                .count();
            prop_assert_eq!(incorrect, n);
            prop_assert_eq!(s.counts().remaining, s.pool_len());
        }

        #[test]
        fn answered_total_never_exceeds_pool(
            n in 1usize..8,
            answers in proptest::collection::vec(any::<bool>(), 0..40),
            seed in any::<u64>(),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            runtime.block_on(async {
                let flagged: Vec<String> = (0..n).map(|i| format!("sentence {i}")).collect();
                let mut s = PracticeSession::initialize(
                    ScriptedService::new(),
                    flagged,
                    StdRng::seed_from_u64(seed),
                );
                let total = s.total_items();
                let mut answers = answers.into_iter();

                loop {
                    let right = answers.next().unwrap_or(true);
                    answer(&mut s, right).await;
                    let counts = s.counts();
                    assert!(counts.correct + counts.incorrect <= total);
                    if s.round_is_recirculation() {
                        assert_eq!(counts.correct + counts.incorrect, total);
                    }
                    if s.advance().await.unwrap() == Advance::Complete {
                        break;
                    }
                }

                assert_eq!(
                    s.counts(),
                    Counts {
                        remaining: 0,
                        correct: total,
                        incorrect: 0,
                    }
                );
            });
        }
    }
}
