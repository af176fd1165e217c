use std::future::Future;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

pub const LOADING_TICK: Duration = Duration::from_millis(300);

const FRAMES: [&str; 3] = ["Loading.", "Loading..", "Loading..."];

/// Awaits `future` while handing a fresh loading label to `on_frame` every
/// tick. `on_frame(None)` is called once the future resolves, whatever its
/// output, and no frame is produced after that.
pub async fn with_loading<F, C>(future: F, mut on_frame: C) -> F::Output
where
    F: Future,
    C: FnMut(Option<&'static str>),
{
    let mut ticker = time::interval(LOADING_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut frame = 0;
    tokio::pin!(future);

    let output = loop {
        tokio::select! {
            biased;
            output = &mut future => break output,
            _ = ticker.tick() => {
                on_frame(Some(FRAMES[frame % FRAMES.len()]));
                frame += 1;
            }
        }
    };

    on_frame(None);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn frames_cycle_until_the_call_resolves() {
        let mut seen = Vec::new();
        let value = with_loading(
            async {
                time::sleep(Duration::from_millis(1000)).await;
                42
            },
            |frame| seen.push(frame),
        )
        .await;

        assert_eq!(value, 42);
        assert!(seen.len() >= 4);
        assert_eq!(
            &seen[..3],
            &[Some("Loading."), Some("Loading.."), Some("Loading...")]
        );
        assert_eq!(seen.last(), Some(&None));
        assert_eq!(seen.iter().filter(|frame| frame.is_none()).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_failure_clears_without_animating() {
        let mut seen = Vec::new();
        let failing = async { Err::<(), _>("boom") };
        let result = with_loading(failing, |frame| seen.push(frame)).await;

        assert_eq!(result, Err("boom"));
        assert_eq!(seen, vec![None]);
    }
}
