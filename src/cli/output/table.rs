//! Round history tables using comfy-table.

use comfy_table::{presets, Attribute, Cell, CellAlignment, ContentArrangement, Table};

use crate::domain::models::{BatchStatus, RoundSummary};

/// Short human label for a batch outcome.
pub fn batch_status_label(status: &BatchStatus) -> String {
    match status {
        BatchStatus::Judged => "judged".to_string(),
        BatchStatus::NothingRendered => "had nothing to render".to_string(),
        BatchStatus::RenderFailed(reason) => format!("failed to render ({reason})"),
        BatchStatus::JudgeFailed(reason) => format!("was not judged ({reason})"),
        BatchStatus::TimedOut => "timed out".to_string(),
        BatchStatus::Aborted(reason) => format!("aborted ({reason})"),
    }
}

fn directives(summary: &RoundSummary) -> String {
    let mut parts = Vec::new();
    if summary.escalation.final_round {
        parts.push("final");
    }
    if summary.escalation.force_choice {
        parts.push("force choice");
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

/// One row per round played.
pub fn round_table(history: &[RoundSummary]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["Round", "Entrants", "Grids", "Failed", "Survivors", "Directives"]
                .into_iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );

    for summary in history {
        let failed = summary
            .batches
            .iter()
            .filter(|b| b.status != BatchStatus::Judged)
            .count();
        table.add_row(vec![
            Cell::new(summary.round).set_alignment(CellAlignment::Right),
            Cell::new(summary.entrants).set_alignment(CellAlignment::Right),
            Cell::new(summary.batches.len()).set_alignment(CellAlignment::Right),
            Cell::new(failed).set_alignment(CellAlignment::Right),
            Cell::new(summary.survivors).set_alignment(CellAlignment::Right),
            Cell::new(directives(summary)),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{BatchReport, Escalation};

    fn summary(round: u32, escalation: Escalation) -> RoundSummary {
        RoundSummary {
            round,
            entrants: 20,
            survivors: 6,
            escalation,
            stalemate_counter: 0,
            batches: vec![
                BatchReport::empty(0, 8, BatchStatus::Judged),
                BatchReport::empty(1, 8, BatchStatus::TimedOut),
            ],
        }
    }

    #[test]
    fn test_round_table_rows() {
        let history = vec![
            summary(1, Escalation::default()),
            summary(
                2,
                Escalation {
                    final_round: true,
                    force_choice: false,
                },
            ),
        ];
        let rendered = round_table(&history).to_string();
        assert!(rendered.contains("Survivors"));
        assert!(rendered.contains("final"));
        assert_eq!(round_table(&history).row_count(), 2);
    }

    #[test]
    fn test_batch_status_label() {
        assert_eq!(batch_status_label(&BatchStatus::TimedOut), "timed out");
        assert_eq!(
            batch_status_label(&BatchStatus::JudgeFailed("429".into())),
            "was not judged (429)"
        );
    }
}
