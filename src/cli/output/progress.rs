//! Spinner progress driven by tournament events.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::models::{BatchStatus, TournamentEvent};

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a spinner for indeterminate operations.
pub fn create_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(SPINNER_CHARS),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// A spinner that draws nothing.
pub fn hidden_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_draw_target(ProgressDrawTarget::hidden());
    spinner
}

/// One-line description of an event, if it is worth showing.
pub fn describe(event: &TournamentEvent) -> Option<String> {
    match event {
        TournamentEvent::Started {
            entrants,
            batch_size,
            ..
        } => Some(format!(
            "{entrants} candidates, up to {batch_size} per grid"
        )),
        TournamentEvent::RoundStarted {
            round,
            entrants,
            batches,
            escalation,
        } => {
            let mut line = format!("Round {round}: judging {entrants} candidates in {batches} grid(s)");
            if escalation.final_round {
                line.push_str(" [final]");
            }
            if escalation.force_choice {
                line.push_str(" [forcing a choice]");
            }
            Some(line)
        }
        TournamentEvent::BatchCompleted { round, report } => match &report.status {
            BatchStatus::Judged => None,
            status => Some(format!(
                "Round {round}: grid {} {}",
                report.index + 1,
                super::table::batch_status_label(status)
            )),
        },
        TournamentEvent::RoundCompleted { round, survivors } => {
            Some(format!("Round {round}: {survivors} survivor(s)"))
        }
        TournamentEvent::StalemateDetected { round, counter } => Some(format!(
            "Round {round}: no candidate eliminated ({counter} in a row)"
        )),
        TournamentEvent::ForcedResolution { round, .. } => {
            Some(format!("Round {round}: still tied, picking at random"))
        }
        TournamentEvent::Finished { .. } => None,
    }
}

/// Drain `events` into `spinner` until the sender side closes.
pub fn spawn_event_spinner(
    spinner: ProgressBar,
    mut events: mpsc::Receiver<TournamentEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Some(line) = describe(&event) {
                spinner.set_message(line);
            }
        }
        spinner.finish_and_clear();
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BatchReport, Escalation};

    #[test]
    fn test_describe_round_started() {
        let event = TournamentEvent::RoundStarted {
            round: 3,
            entrants: 5,
            batches: 1,
            escalation: Escalation {
                final_round: true,
                force_choice: true,
            },
        };
        assert_eq!(
            describe(&event).unwrap(),
            "Round 3: judging 5 candidates in 1 grid(s) [final] [forcing a choice]"
        );
    }

    #[test]
    fn test_describe_skips_judged_batches() {
        let report = BatchReport::empty(0, 4, BatchStatus::Judged);
        let event = TournamentEvent::BatchCompleted { round: 1, report };
        assert!(describe(&event).is_none());

        let report = BatchReport::empty(1, 4, BatchStatus::TimedOut);
        let event = TournamentEvent::BatchCompleted { round: 1, report };
        assert_eq!(describe(&event).unwrap(), "Round 1: grid 2 timed out");
    }

    #[tokio::test]
    async fn test_spinner_task_ends_when_sender_drops() {
        let (tx, rx) = mpsc::channel(4);
        let handle = spawn_event_spinner(hidden_spinner(), rx);
        tx.send(TournamentEvent::RoundCompleted {
            round: 1,
            survivors: 2,
        })
        .await
        .unwrap();
        drop(tx);
        handle.await.unwrap();
    }
}
