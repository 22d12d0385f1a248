use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use vent_types::api::{CreateReportRequest, MessageResponse};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::guard;
use crate::notify;

pub async fn create_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateReportRequest>,
) -> ApiResult<Response> {
    let reason = req.reason.trim().to_string();
    if reason.is_empty() {
        return Err(ApiError::Validation("A report reason is required.".into()));
    }

    let db = state.clone();
    let post_id = req.post_id.to_string();
    let post = tokio::task::spawn_blocking(move || db.db.get_post(&post_id))
        .await??
        .ok_or(ApiError::NotFound("Post"))?;

    if !guard::can_report(user.id, &post) {
        return Err(ApiError::Conflict("Cannot report your own post.".into()));
    }

    // Fast-path dedup check; the UNIQUE(post_id, reporter_id) constraint
    // below is what actually prevents the concurrent double report
    let db = state.clone();
    let post_id = req.post_id.to_string();
    let reporter_id = user.id.to_string();
    let existing =
        tokio::task::spawn_blocking(move || db.db.find_report(&post_id, &reporter_id)).await??;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "You have already reported this post.".into(),
        ));
    }

    let db = state.clone();
    let report_id = Uuid::new_v4().to_string();
    let post_id = req.post_id.to_string();
    let reporter_id = user.id.to_string();
    let created_at = chrono::Utc::now().to_rfc3339();
    let result = tokio::task::spawn_blocking(move || {
        db.db
            .insert_report(&report_id, &post_id, &reporter_id, &reason, &created_at)
    })
    .await?;

    if let Err(err) = result {
        if vent_db::is_unique_violation(&err) {
            return Err(ApiError::Conflict(
                "You have already reported this post.".into(),
            ));
        }
        return Err(err.into());
    }

    // Notify the true author; the message names the category, never the
    // reporter. Best-effort: the report above stays committed on failure.
    notify::post_flagged(&state, post.author_id, &post.category).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Report submitted successfully".into(),
        }),
    )
        .into_response())
}
