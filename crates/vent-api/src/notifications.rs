use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};

use vent_db::models::NotificationRow;
use vent_types::api::{
    AckNotificationRequest, NotificationListResponse, NotificationResponse, NotificationView,
};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::project::parse_timestamp;

/// Most recent 20 for the caller.
const LIST_LIMIT: u32 = 20;

pub async fn list_notifications(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Response> {
    let db = state.clone();
    let user_id = user.id.to_string();
    let rows =
        tokio::task::spawn_blocking(move || db.db.list_notifications(&user_id, LIST_LIMIT))
            .await??;

    let notifications = rows
        .iter()
        .map(view)
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Json(NotificationListResponse { notifications }).into_response())
}

/// Acknowledge a notification: `is_read` goes false → true, once. A repeat
/// acknowledgment is a no-op returning the read state. Another user's
/// notification is reported as missing, never as forbidden — existence is
/// not confirmed across owners.
pub async fn ack_notification(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<AckNotificationRequest>,
) -> ApiResult<Response> {
    let db = state.clone();
    let id = req.id.to_string();
    let row = tokio::task::spawn_blocking(move || db.db.get_notification(&id)).await??;

    let row = match row {
        Some(row) if row.user_id == user.id.to_string() => row,
        _ => return Err(ApiError::NotFound("Notification")),
    };

    let row = if row.is_read {
        row
    } else {
        let db = state.clone();
        let id = req.id.to_string();
        tokio::task::spawn_blocking(move || db.db.mark_notification_read(&id)).await??;
        NotificationRow {
            is_read: true,
            ..row
        }
    };

    Ok(Json(NotificationResponse {
        notification: view(&row)?,
        message: "Notification marked as read".into(),
    })
    .into_response())
}

fn view(row: &NotificationRow) -> anyhow::Result<NotificationView> {
    Ok(NotificationView {
        id: row.id.parse()?,
        message: row.message.clone(),
        is_read: row.is_read,
        created_at: parse_timestamp(&row.created_at)?,
    })
}
