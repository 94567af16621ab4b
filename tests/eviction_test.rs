mod helpers;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use helpers::{keyword_manager, travel_conversation};
use recall::config::LimitsConfig;
use recall::Turn;
use tempfile::TempDir;

fn limits(max_age_days: i64, max_sessions: usize) -> LimitsConfig {
    LimitsConfig {
        max_age_days,
        max_sessions,
        ..LimitsConfig::default()
    }
}

#[tokio::test]
async fn idle_sessions_expire_after_max_age() {
    let tmp = TempDir::new().unwrap();
    let (mgr, _) = keyword_manager(tmp.path(), limits(7, 100));
    mgr.store("trip", &travel_conversation()).await;

    let report = mgr.sweep_at(Utc::now() + chrono::Duration::days(7)).await;
    assert!(report.removed.is_empty(), "exactly max_age days idle is kept");

    let report = mgr.sweep_at(Utc::now() + chrono::Duration::days(8)).await;
    assert_eq!(report.expired, 1);
    assert_eq!(report.removed, vec!["trip"]);
    assert!(mgr.get_session_info("trip").await.is_none());
    assert!(!tmp.path().join("trip").exists());
}

#[tokio::test]
async fn oldest_sessions_go_first_when_over_capacity() {
    let tmp = TempDir::new().unwrap();
    let (mgr, _) = keyword_manager(tmp.path(), limits(7, 3));
    for i in 0..5 {
        mgr.store(&format!("s{i}"), &[Turn::human(format!("weather day {i}"))])
            .await;
    }

    let report = mgr.sweep().await;
    assert_eq!(report.over_capacity, 2);
    assert_eq!(report.expired, 0);
    assert_eq!(report.removed, vec!["s0", "s1"]);
    assert_eq!(mgr.list_sessions().await, vec!["s2", "s3", "s4"]);
    assert!(!tmp.path().join("s0").exists());
    assert!(tmp.path().join("s4").exists());
}

#[tokio::test]
async fn retrieval_protects_a_session_from_capacity_eviction() {
    let tmp = TempDir::new().unwrap();
    let (mgr, _) = keyword_manager(tmp.path(), limits(7, 3));
    for i in 0..5 {
        mgr.store(&format!("s{i}"), &[Turn::human(format!("hotel {i}"))])
            .await;
    }
    tokio::time::sleep(Duration::from_millis(5)).await;
    mgr.retrieve("s0", "hotel", 1).await;

    let report = mgr.sweep().await;
    assert_eq!(report.removed, vec!["s1", "s2"]);
    assert!(mgr.get_session_info("s0").await.is_some());
}

#[tokio::test]
async fn session_matching_both_rules_is_removed_once() {
    let tmp = TempDir::new().unwrap();
    let (mgr, _) = keyword_manager(tmp.path(), limits(7, 3));
    for i in 0..5 {
        mgr.store(&format!("s{i}"), &[Turn::human("food")]).await;
    }

    let report = mgr.sweep_at(Utc::now() + chrono::Duration::days(30)).await;
    assert_eq!(report.expired, 5);
    assert_eq!(report.over_capacity, 2);
    assert_eq!(report.removed.len(), 5);
    assert!(mgr.list_sessions().await.is_empty());
}

#[tokio::test]
async fn sweep_under_limits_removes_nothing() {
    let tmp = TempDir::new().unwrap();
    let (mgr, _) = keyword_manager(tmp.path(), limits(7, 3));
    mgr.store("a", &travel_conversation()).await;

    let report = mgr.sweep().await;
    assert!(report.removed.is_empty());
    assert_eq!(mgr.list_sessions().await, vec!["a"]);
}

#[tokio::test]
async fn sweeper_runs_immediately_and_only_once() {
    let tmp = TempDir::new().unwrap();
    let (mgr, _) = keyword_manager(tmp.path(), limits(7, 1));
    let mgr = Arc::new(mgr);
    mgr.store("old", &[Turn::human("weather")]).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    mgr.store("new", &[Turn::human("train")]).await;

    assert!(mgr.start_sweeper());
    assert!(!mgr.start_sweeper(), "second start is a no-op");
    assert!(mgr.sweeper_running());

    let mut remaining = mgr.list_sessions().await;
    for _ in 0..100 {
        if remaining.len() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        remaining = mgr.list_sessions().await;
    }
    assert_eq!(remaining, vec!["new"]);

    mgr.stop_sweeper();
    assert!(!mgr.sweeper_running());
}
