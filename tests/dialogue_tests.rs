use anyhow::Result;
use chrono::Duration;
use support_relay_bot::config::{SupportConfig, MAX_REQUEST_TTL_SECS};
use support_relay_bot::dialogue::{ConversationTracker, SupportDialogueState};
use teloxide::types::UserId;

/// Unseen users are idle
#[tokio::test]
async fn test_unseen_user_is_idle() -> Result<()> {
    let tracker = ConversationTracker::default();

    assert_eq!(tracker.state(UserId(1)).await?, SupportDialogueState::Idle);
    assert!(!tracker.is_awaiting(UserId(1)).await?);

    // Finishing without a pending request is harmless
    tracker.finish(UserId(1)).await?;
    assert!(!tracker.is_awaiting(UserId(1)).await?);

    Ok(())
}

/// Test dialogue state transitions
#[tokio::test]
async fn test_support_request_transitions() -> Result<()> {
    let tracker = ConversationTracker::default();
    let user = UserId(10);

    tracker.begin_support_request(user).await?;
    assert!(tracker.is_awaiting(user).await?);
    assert!(matches!(
        tracker.state(user).await?,
        SupportDialogueState::AwaitingSupportMessage { .. }
    ));

    // Other users are unaffected
    assert!(!tracker.is_awaiting(UserId(11)).await?);

    tracker.finish(user).await?;
    assert!(!tracker.is_awaiting(user).await?);

    Ok(())
}

/// Requests without a TTL never expire
#[tokio::test]
async fn test_request_without_ttl_stays_pending() -> Result<()> {
    let tracker = ConversationTracker::new(None);
    tracker.begin_support_request(UserId(3)).await?;

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(tracker.is_awaiting(UserId(3)).await?);

    Ok(())
}

/// Expired requests read as idle
#[tokio::test]
async fn test_expired_request_resets_to_idle() -> Result<()> {
    let tracker = ConversationTracker::new(Some(Duration::milliseconds(200)));
    tracker.begin_support_request(UserId(4)).await?;

    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert!(!tracker.is_awaiting(UserId(4)).await?);
    assert_eq!(tracker.state(UserId(4)).await?, SupportDialogueState::Idle);

    // Re-arming works after expiry
    tracker.begin_support_request(UserId(4)).await?;
    assert!(tracker.is_awaiting(UserId(4)).await?);

    Ok(())
}

/// The longest accepted TTL still keeps a fresh request pending
#[tokio::test]
async fn test_longest_configured_ttl_keeps_request_pending() -> Result<()> {
    let config = SupportConfig {
        request_ttl_secs: MAX_REQUEST_TTL_SECS,
        ..SupportConfig::default()
    };
    let tracker = ConversationTracker::new(config.request_ttl());
    tracker.begin_support_request(UserId(5)).await?;

    assert!(tracker.is_awaiting(UserId(5)).await?);

    Ok(())
}
