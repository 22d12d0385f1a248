//! Moderation notifier. Both triggers are direct synchronous writes as part
//! of the triggering request: no queue, no retries. The triggering row
//! (user or report) stays committed even when the notification write fails;
//! the failure surfaces as a generic 500.

use uuid::Uuid;

use crate::auth::AppState;
use crate::error::ApiResult;

const WELCOME_MESSAGE: &str = "Welcome to Vent! This is a safe space to share your \
     feelings anonymously. Jump into the community feed to view stories.";

/// One welcome notification per successful registration.
pub(crate) async fn welcome(state: &AppState, user_id: Uuid) -> ApiResult<()> {
    write(state, user_id.to_string(), WELCOME_MESSAGE.to_string()).await
}

/// Notifies the reported post's author — never the reporter, whose identity
/// does not appear in the message.
pub(crate) async fn post_flagged(
    state: &AppState,
    author_id: String,
    category: &str,
) -> ApiResult<()> {
    let message = format!(
        "Your post in {} was flagged by the community for review.",
        category
    );
    write(state, author_id, message).await
}

async fn write(state: &AppState, user_id: String, message: String) -> ApiResult<()> {
    let db = state.clone();
    let id = Uuid::new_v4().to_string();
    let created_at = chrono::Utc::now().to_rfc3339();

    tokio::task::spawn_blocking(move || {
        db.db.insert_notification(&id, &user_id, &message, &created_at)
    })
    .await??;

    Ok(())
}
