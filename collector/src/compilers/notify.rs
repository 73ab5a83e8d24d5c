use crate::process::{
    run_with_timeout,
    ActionResult,
};
use sync_status_config::NotifyConfig;

pub const DEFAULT_TEST_MESSAGE: &str = "Test notification from Anki Sync Server dashboard";
pub const NOTIFICATION_SENT: &str = "Notification sent";

/// Hands `message` to the notifier executable as its only argument.
pub async fn send_notification(config: &NotifyConfig, message: &str) -> ActionResult {
    debug!(script = %config.script.display(), "sending notification");
    let result = ActionResult::from_run(
        run_with_timeout(&config.script, &[message], config.timeout).await,
        NOTIFICATION_SENT,
    );
    if !result.success {
        warn!(message = %result.message, "notification failed");
    }
    result
}
