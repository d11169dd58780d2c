use super::*;
use tempfile::TempDir;

async fn test_history() -> (ChatHistory, TempDir) {
    let dir = TempDir::new().expect("should create temp dir");
    let history = ChatHistory::new(dir.path().join("chat_history.db"))
        .await
        .expect("should open history database");
    (history, dir)
}

#[tokio::test]
async fn fresh_session_has_no_history() {
    let (history, _dir) = test_history().await;

    assert!(history.is_fresh("session-a").await.expect("should count"));

    history
        .append("session-a", None, "Hello there!")
        .await
        .expect("should append greeting");

    assert!(!history.is_fresh("session-a").await.expect("should count"));
    // Other sessions stay fresh.
    assert!(history.is_fresh("session-b").await.expect("should count"));
}

#[tokio::test]
async fn turns_come_back_in_insertion_order() {
    let (history, _dir) = test_history().await;

    history
        .append("s1", None, "greeting")
        .await
        .expect("should append");
    history
        .append("s1", Some("first question"), "first answer")
        .await
        .expect("should append");
    history
        .append("s1", Some("second question"), "second answer")
        .await
        .expect("should append");

    let turns = history.for_session("s1").await.expect("should read");

    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0].user_message, None);
    assert_eq!(turns[0].bot_response, "greeting");
    assert_eq!(turns[1].user_message.as_deref(), Some("first question"));
    assert_eq!(turns[2].bot_response, "second answer");
    assert!(turns.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn sessions_are_isolated() {
    let (history, _dir) = test_history().await;

    history
        .append("s1", Some("q1"), "a1")
        .await
        .expect("should append");
    history
        .append("s2", Some("q2"), "a2")
        .await
        .expect("should append");

    let s1 = history.for_session("s1").await.expect("should read");
    assert_eq!(s1.len(), 1);
    assert_eq!(s1[0].session_id, "s1");

    assert_eq!(history.total_turns().await.expect("should count"), 2);
}

#[tokio::test]
async fn reopening_the_database_keeps_rows() {
    let dir = TempDir::new().expect("should create temp dir");
    let path = dir.path().join("chat_history.db");

    {
        let history = ChatHistory::new(&path).await.expect("should open");
        history
            .append("persist", Some("q"), "a")
            .await
            .expect("should append");
    }

    let reopened = ChatHistory::new(&path).await.expect("should reopen");
    let turns = reopened.for_session("persist").await.expect("should read");

    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].bot_response, "a");
}
