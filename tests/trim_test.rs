mod helpers;

use helpers::{keyword_manager, travel_conversation};
use recall::config::LimitsConfig;
use recall::memory::trim::{count_tokens, trim};
use recall::{Role, Turn};
use tempfile::TempDir;

/// `sub` appears in `full` in the same relative order.
fn is_subsequence(sub: &[Turn], full: &[Turn]) -> bool {
    let mut rest = full.iter();
    sub.iter().all(|t| rest.any(|f| f == t))
}

fn long_conversation(rounds: usize) -> Vec<Turn> {
    let mut turns = vec![Turn::system("be brief")];
    for i in 0..rounds {
        turns.push(Turn::human(format!("question {i} {}", "x".repeat(i * 3))));
        turns.push(Turn::assistant(format!("answer {i}")));
        if i % 3 == 0 {
            turns.push(Turn::assistant(format!("follow-up {i}")));
        }
    }
    turns
}

#[test]
fn trimmed_output_keeps_its_guarantees() {
    let turns = long_conversation(12);

    for max_rounds in [1, 2, 5, 20] {
        for max_tokens in [0, 10, 40, 120, 100_000] {
            let out = trim(&turns, max_rounds, max_tokens);

            assert!(is_subsequence(&out, &turns), "order preserved");
            let system_tokens = count_tokens(out.iter().filter(|t| t.role == Role::System));
            let non_system: Vec<&Turn> =
                out.iter().filter(|t| t.role != Role::System).collect();
            if let Some(first) = non_system.first() {
                assert_eq!(first.role, Role::Human, "starts at a human turn");
            }
            let used = count_tokens(non_system.iter().copied());
            assert!(
                used <= max_tokens.saturating_sub(system_tokens),
                "fits budget: rounds={max_rounds} tokens={max_tokens}"
            );
            let humans = non_system.iter().filter(|t| t.role == Role::Human).count();
            assert!(humans <= max_rounds);
        }
    }
}

#[test]
fn system_turns_survive_token_trimming() {
    let turns = vec![
        Turn::system("rules"),
        Turn::human("one"),
        Turn::assistant("two"),
        Turn::system("more rules"),
        Turn::human("three"),
        Turn::assistant("four"),
    ];

    let out = trim(&turns, 10, count_tokens(&turns) - 1);
    assert_eq!(
        out,
        vec![
            Turn::system("rules"),
            Turn::system("more rules"),
            Turn::human("three"),
            Turn::assistant("four"),
        ]
    );
}

#[test]
fn generous_limits_return_the_input() {
    let turns = travel_conversation();
    assert_eq!(trim(&turns, 10, 100_000), turns);
}

#[tokio::test]
async fn manager_trims_with_configured_limits() {
    let tmp = TempDir::new().unwrap();
    let limits = LimitsConfig {
        max_rounds_per_session: 2,
        max_tokens_per_session: 100_000,
        ..LimitsConfig::default()
    };
    let (mgr, _) = keyword_manager(tmp.path(), limits);
    let turns = travel_conversation();

    let trimmed = mgr.trim_for_model(&turns);
    assert_eq!(trimmed, turns[3..].to_vec());

    mgr.store("trip", &turns).await;
    assert_eq!(mgr.trim_cached("trip").await, trimmed);
    assert!(mgr.trim_cached("unknown").await.is_empty());
}
