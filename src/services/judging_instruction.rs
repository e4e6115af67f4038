//! Builds the per-round judging instruction from the user's description.

use crate::domain::models::Escalation;

/// Decide which directives apply to a round.
pub const fn escalation_for(pool_len: usize, batch_size: usize, stalemate_counter: u32) -> Escalation {
    Escalation {
        final_round: pool_len <= batch_size,
        force_choice: stalemate_counter > 0,
    }
}

/// Layer the round's directives onto `base`, final-round first.
///
/// `presented` is the number of tiles in the grid the judge is shown, which
/// can be fewer than the batch when some images failed to render.
pub fn effective_instruction(base: &str, escalation: Escalation, presented: usize) -> String {
    let mut instruction = base.trim().to_string();

    if escalation.final_round {
        let keep = presented.div_ceil(2);
        instruction.push_str(&format!(
            "\n\nFINAL ROUND: this grid decides the winner. Select exactly {keep} of the \
             {presented} images (about half, rounded up), the ones that best match the \
             description. You must leave the rest out even if every image seems equally good."
        ));
    }

    if escalation.force_choice {
        instruction.push_str(
            "\n\nIMPORTANT: you must narrow the field. Pick only the one image, or the very \
             few images, that best match the description. If all of them match, choose only \
             the single best one.",
        );
    }

    instruction
}
