use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use rand::Rng;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};
use tracing::{info, warn};

use super::messages::describe;
use super::theme::Theme;
use crate::llm::LanguageService;
use crate::loading::with_loading;
use crate::palette::Palette;
use crate::session::{
    Advance, Claim, Counts, CurrentItem, Outcome, PracticeSession, Reveal, SessionError,
};
use crate::utils::{pluralize, trim_line};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Phase {
    Loading,
    Judging,
    Correcting,
    Revealed(Outcome),
    Complete,
}

/// A session call triggered from the screen. Kept around on failure so the
/// user can repeat it.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Request {
    Present,
    Verdict {
        claim: Claim,
        correction: Option<String>,
    },
    Advance,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Action {
    Run(Request),
    Quit,
    Ignore,
}

#[derive(Debug)]
enum Step {
    Presented(CurrentItem),
    Answered(Outcome),
    Advanced(Advance),
}

struct Failure {
    message: String,
    request: Request,
    retryable: bool,
}

/// What the screen shows. Only ever updated from session results.
struct PracticeView {
    exercise: Option<CurrentItem>,
    phase: Phase,
    input: String,
    counts: Counts,
    review_round: bool,
    loading: Option<&'static str>,
    failure: Option<Failure>,
}

impl PracticeView {
    fn new(counts: Counts) -> Self {
        Self {
            exercise: None,
            phase: Phase::Loading,
            input: String::new(),
            counts,
            review_round: false,
            loading: None,
            failure: None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Esc
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            return Action::Quit;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Ignore;
        }

        if self.phase == Phase::Correcting {
            return self.handle_typing(key.code);
        }

        if let Some(request) = self.retry_request()
            && matches!(key.code, KeyCode::Char('r' | 'R'))
        {
            return Action::Run(request.clone());
        }

        match (&self.phase, key.code) {
            (Phase::Judging, KeyCode::Char('c' | 'C')) => Action::Run(Request::Verdict {
                claim: Claim::ClaimsCorrect,
                correction: None,
            }),
            (Phase::Judging, KeyCode::Char('i' | 'I')) => Action::Run(Request::Verdict {
                claim: Claim::ClaimsIncorrect,
                correction: None,
            }),
            (Phase::Revealed(_), KeyCode::Enter | KeyCode::Char('n' | 'N')) => {
                Action::Run(Request::Advance)
            }
            (Phase::Complete, KeyCode::Enter) => Action::Quit,
            _ => Action::Ignore,
        }
    }

    fn handle_typing(&mut self, code: KeyCode) -> Action {
        match code {
            KeyCode::Char(ch) => self.input.push(ch),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Enter => {
                if let Some(correction) = trim_line(&self.input) {
                    return Action::Run(Request::Verdict {
                        claim: Claim::ClaimsIncorrect,
                        correction: Some(correction.to_string()),
                    });
                }
            }
            _ => {}
        }
        Action::Ignore
    }

    fn apply(&mut self, request: Request, result: Result<Step, SessionError>) {
        let step = match result {
            Ok(step) => step,
            Err(err) => {
                warn!(?request, error = %err, "practice request failed");
                self.failure = Some(Failure {
                    message: describe(&err),
                    request,
                    retryable: err.is_transient(),
                });
                return;
            }
        };

        self.failure = None;
        match step {
            Step::Presented(item) | Step::Advanced(Advance::Next(item)) => {
                self.exercise = Some(item);
                self.phase = Phase::Judging;
                self.input.clear();
            }
            Step::Advanced(Advance::Complete) => {
                self.exercise = None;
                self.phase = Phase::Complete;
            }
            Step::Answered(Outcome::CorrectionRequired) => {
                self.input.clear();
                self.phase = Phase::Correcting;
            }
            Step::Answered(outcome) => self.phase = Phase::Revealed(outcome),
        }
    }

    /// The failed request, when repeating it may help.
    fn retry_request(&self) -> Option<&Request> {
        self.failure
            .as_ref()
            .filter(|failure| failure.retryable)
            .map(|failure| &failure.request)
    }

    fn sync<S: LanguageService, R: Rng>(&mut self, session: &PracticeSession<S, R>) {
        self.counts = session.counts();
        self.review_round = session.round_is_recirculation();
    }
}

async fn perform<S: LanguageService, R: Rng>(
    session: &mut PracticeSession<S, R>,
    request: &Request,
) -> Result<Step, SessionError> {
    match request {
        Request::Present => session.current_item().await.map(Step::Presented),
        Request::Verdict { claim, correction } => session
            .submit_verdict(*claim, correction.as_deref())
            .await
            .map(Step::Answered),
        Request::Advance => session.advance().await.map(Step::Advanced),
    }
}

/// Runs the practice screen until the session completes or the user leaves.
/// Returns the counters as they stood at exit.
pub async fn run<S, R>(mut session: PracticeSession<S, R>) -> Result<Counts>
where
    S: LanguageService,
    R: Rng,
{
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
    )
    .context("failed to configure terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to start terminal")?;
    terminal.hide_cursor().context("failed to hide cursor")?;

    let loop_result = practice_loop(&mut terminal, &mut session).await;

    teardown_terminal(&mut terminal)?;

    let counts = session.counts();
    info!(
        correct = counts.correct,
        incorrect = counts.incorrect,
        remaining = counts.remaining,
        complete = session.is_complete(),
        "left practice screen"
    );
    loop_result.map(|()| counts)
}

async fn practice_loop<S: LanguageService, R: Rng>(
    terminal: &mut Term,
    session: &mut PracticeSession<S, R>,
) -> Result<()> {
    let mut view = PracticeView::new(session.counts());
    let mut pending = Some(Request::Present);

    loop {
        if let Some(request) = pending.take() {
            let result = with_loading(perform(session, &request), |frame| {
                view.loading = frame;
                if let Err(err) = terminal.draw(|f| render(f, &view)) {
                    warn!(error = %err, "failed to draw loading frame");
                }
            })
            .await;
            view.apply(request, result);
            view.sync(session);

            // Keys pressed while the call was outstanding are dropped.
            while event::poll(Duration::ZERO)? {
                let _ = event::read()?;
            }
        }

        terminal
            .draw(|frame| render(frame, &view))
            .context("failed to render frame")?;

        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match view.handle_key(key) {
                Action::Quit => return Ok(()),
                Action::Run(request) => pending = Some(request),
                Action::Ignore => {}
            }
        }
    }
}

fn teardown_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        PopKeyboardEnhancementFlags,
        LeaveAlternateScreen
    )
    .context("failed to restore terminal")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

fn render(frame: &mut Frame, view: &PracticeView) {
    let area = frame.area();
    frame.render_widget(Theme::backdrop(), area);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(7), Constraint::Length(4)])
        .split(area);

    let exercise = Paragraph::new(exercise_lines(view))
        .block(Theme::panel_with_line(header_line(view)))
        .wrap(Wrap { trim: false });
    frame.render_widget(exercise, chunks[0]);

    let footer = Paragraph::new(instructions_text(view))
        .block(Theme::panel_with_line(Theme::section_header("Controls")));
    frame.render_widget(footer, chunks[1]);
}

fn header_line(view: &PracticeView) -> Line<'static> {
    let title = if view.review_round {
        " Review round "
    } else {
        " Practice "
    };
    let mut spans = vec![
        Theme::label_span(title),
        Theme::counter(view.counts.remaining, "remaining", Palette::REMAINING),
        Theme::bullet(),
        Theme::counter(view.counts.correct, "correct", Palette::CORRECT),
        Theme::bullet(),
        Theme::counter(view.counts.incorrect, "incorrect", Palette::INCORRECT),
    ];
    spans.push(Theme::span(" "));
    Line::from(spans)
}

fn exercise_lines(view: &PracticeView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(label) = view.loading {
        lines.push(Line::from(Span::styled(label, Theme::muted())));
        return lines;
    }

    if view.phase == Phase::Complete {
        lines.push(Theme::section_header("Session complete!"));
        lines.push(Line::from(vec![
            Theme::span("You answered "),
            Span::styled(pluralize("exercise", view.counts.correct), Theme::success()),
            Theme::span(" correctly."),
        ]));
        return lines;
    }

    if let Some(item) = &view.exercise {
        lines.push(Line::from(Theme::span("Is this sentence correct?")));
        lines.push(Line::default());
        let sentence = Span::styled(item.text.clone(), Theme::emphasis());
        lines.push(Line::from(sentence));
        lines.push(Line::default());
    }

    match &view.phase {
        Phase::Correcting => {
            lines.push(Line::from(Theme::label_span("Your correction:")));
            lines.push(Line::from(Theme::span(format!("{}▏", view.input))));
        }
        Phase::Revealed(outcome) => lines.extend(outcome_lines(outcome)),
        _ => {}
    }

    if let Some(failure) = &view.failure {
        lines.push(Line::default());
        let message = Span::styled(failure.message.clone(), Theme::danger());
        lines.push(Line::from(message));
    }

    lines
}

fn outcome_lines(outcome: &Outcome) -> Vec<Line<'static>> {
    let (verdict, reveal) = match outcome {
        Outcome::Right(reveal) => (Span::styled("Correct!", Theme::success()), reveal),
        Outcome::Wrong(reveal) => (Span::styled("Incorrect.", Theme::danger()), reveal),
        Outcome::CorrectionRequired => return Vec::new(),
    };

    let mut lines = vec![Line::from(verdict)];
    match reveal {
        Reveal::AlreadyCorrect => {
            lines.push(Line::raw("This sentence was already correct."));
        }
        Reveal::Accepted => {
            lines.push(Line::raw("Your correction is grammatical."));
        }
        Reveal::Corrected {
            corrected,
            explanation,
        } => {
            lines.push(Line::from(vec![
                Theme::label_span("Answer: "),
                Theme::span(corrected.clone()),
            ]));
            lines.push(Line::from(vec![
                Theme::label_span("Explanation: "),
                Theme::span(explanation.clone()),
            ]));
        }
    }
    lines
}

fn instructions_text(view: &PracticeView) -> Vec<Line<'static>> {
    let exit = [
        Theme::key_chip("Esc"),
        Theme::span(" / "),
        Theme::key_chip("Ctrl+C"),
        Theme::span(" exit"),
    ];

    let mut line = Vec::new();
    if view.loading.is_some() {
        line.push(Theme::span("Waiting for the tutor"));
        return vec![Line::from(line)];
    }
    match &view.phase {
        Phase::Judging => {
            line.extend([
                Theme::key_chip("C"),
                Span::styled(" correct", Theme::success()),
                Theme::bullet(),
                Theme::key_chip("I"),
                Span::styled(" incorrect", Theme::danger()),
                Theme::bullet(),
            ]);
        }
        Phase::Correcting => {
            line.extend([
                Theme::span("Type the fixed sentence"),
                Theme::bullet(),
                Theme::key_chip("Enter"),
                Theme::span(" submit"),
                Theme::bullet(),
            ]);
        }
        Phase::Revealed(_) => {
            line.extend([
                Theme::key_chip("Enter"),
                Theme::span(" or "),
                Theme::key_chip("N"),
                Theme::span(" next"),
                Theme::bullet(),
            ]);
        }
        Phase::Complete => {
            line.extend([
                Theme::key_chip("Enter"),
                Theme::span(" finish"),
                Theme::bullet(),
            ]);
        }
        Phase::Loading => {}
    }
    if view.retry_request().is_some() && view.phase != Phase::Correcting {
        line.extend([
            Theme::key_chip("R"),
            Span::styled(" retry", Theme::warning()),
            Theme::bullet(),
        ]);
    }
    line.extend(exit);
    vec![Line::from(line)]
}
