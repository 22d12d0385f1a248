use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use vent_types::api::{CommentResponse, CreateCommentRequest, MessageResponse};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::CurrentUser;
use crate::guard;
use crate::project;

pub async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<Response> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::Validation("Comment content is required.".into()));
    }

    // The parent post must exist before anything is written
    let db = state.clone();
    let post_id = req.post_id.to_string();
    tokio::task::spawn_blocking(move || db.db.get_post(&post_id))
        .await??
        .ok_or(ApiError::NotFound("Post"))?;

    let comment_id = Uuid::new_v4();
    let created_at = chrono::Utc::now().to_rfc3339();

    let row = vent_db::models::CommentRow {
        id: comment_id.to_string(),
        post_id: req.post_id.to_string(),
        author_id: user.id.to_string(),
        author_email: user.email.clone(),
        content,
        created_at,
    };

    let db = state.clone();
    let insert = row.clone();
    tokio::task::spawn_blocking(move || {
        db.db.insert_comment(
            &insert.id,
            &insert.post_id,
            &insert.author_id,
            &insert.content,
            &insert.created_at,
        )
    })
    .await??;

    let comment = project::project_comment(&row, Some(user.id))?;

    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            comment,
            message: "Comment posted successfully.".into(),
        }),
    )
        .into_response())
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> ApiResult<Response> {
    let db = state.clone();
    let comment_id = id.to_string();
    let (comment, parent) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let comment = db.db.get_comment(&comment_id)?;
        let parent = match &comment {
            Some(c) => db.db.get_post(&c.post_id)?,
            None => None,
        };
        Ok((comment, parent))
    })
    .await??;

    let comment = comment.ok_or(ApiError::NotFound("Comment"))?;
    let parent = parent.ok_or(ApiError::NotFound("Comment"))?;

    if !guard::can_delete_comment(user.id, &comment, &parent) {
        return Err(ApiError::Forbidden);
    }

    let db = state.clone();
    let comment_id = id.to_string();
    tokio::task::spawn_blocking(move || db.db.delete_comment(&comment_id)).await??;

    Ok(Json(MessageResponse {
        message: "Comment deleted successfully".into(),
    })
    .into_response())
}
