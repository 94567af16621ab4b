//! Context-window trimming.
//!
//! [`trim`] reduces a turn list to what should be sent to the model next: first the
//! last `max_rounds` human-initiated rounds, then the longest trailing run of whole
//! turns that fits the token budget. System turns are always kept, and the trailing
//! run always starts at a human turn.

use super::types::{Role, Turn};

/// Round window followed by token-budget window. Order-preserving.
pub fn trim(turns: &[Turn], max_rounds: usize, max_tokens: usize) -> Vec<Turn> {
    let windowed = round_window(turns, max_rounds);
    token_window(windowed, max_tokens)
}

/// Keep the last `max_rounds` rounds, where a round starts at a human turn.
///
/// If there are at most `max_rounds` human turns the whole list is kept, including
/// anything before the first human turn. `max_rounds == 0` keeps nothing.
pub fn round_window(turns: &[Turn], max_rounds: usize) -> &[Turn] {
    let human_indices: Vec<usize> = turns
        .iter()
        .enumerate()
        .filter(|(_, t)| t.role == Role::Human)
        .map(|(i, _)| i)
        .collect();

    if human_indices.len() <= max_rounds {
        return turns;
    }

    match human_indices.get(human_indices.len() - max_rounds) {
        Some(&start) => &turns[start..],
        None => &[],
    }
}

/// Keep every system turn plus the longest trailing run of non-system turns whose
/// token total fits in what the system turns leave of `max_tokens`.
///
/// Turns are never split. If the run would begin mid-round, the partial round is
/// dropped so the result starts at a human turn.
pub fn token_window(turns: &[Turn], max_tokens: usize) -> Vec<Turn> {
    let system_tokens = count_tokens(turns.iter().filter(|t| t.role == Role::System));
    let mut budget = max_tokens.saturating_sub(system_tokens);

    let mut cut = turns.len();
    for (i, turn) in turns.iter().enumerate().rev() {
        if turn.role == Role::System {
            continue;
        }
        let cost = turn.token_count();
        if cost > budget {
            break;
        }
        budget -= cost;
        cut = i;
    }

    let start = turns[cut..]
        .iter()
        .position(|t| t.role == Role::Human)
        .map_or(turns.len(), |offset| cut + offset);

    turns
        .iter()
        .enumerate()
        .filter(|(i, t)| t.role == Role::System || *i >= start)
        .map(|(_, t)| t.clone())
        .collect()
}

/// Sum of the character-length token proxy over `turns`.
pub fn count_tokens<'a>(turns: impl IntoIterator<Item = &'a Turn>) -> usize {
    turns.into_iter().map(Turn::token_count).sum()
}
