use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use uuid::Uuid;

use vent_db::models::CommentRow;
use vent_types::api::{
    CreatePostRequest, DashboardResponse, FeedResponse, MessageResponse, PostResponse,
    UpdatePostRequest,
};
use vent_types::models::{Category, Emotion};

use crate::auth::AppState;
use crate::error::{ApiError, ApiResult};
use crate::extract::{CurrentUser, MaybeUser};
use crate::guard;
use crate::project;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub emotion: Option<Emotion>,
    pub category: Option<Category>,
    #[serde(default)]
    pub dashboard: bool,
}

/// The feed is readable anonymously; `dashboard=true` switches to the
/// caller's own posts in the privileged dashboard shape and requires a
/// session.
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
    MaybeUser(viewer): MaybeUser,
) -> ApiResult<Response> {
    let emotion = query.emotion.map(|e| e.as_str().to_string());
    let category = query.category.map(|c| c.as_str().to_string());

    if query.dashboard {
        let user = viewer.ok_or(ApiError::Unauthorized)?;

        let db = state.clone();
        let author_id = user.id.to_string();
        let (posts, comments) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let posts = db
                .db
                .list_posts(emotion.as_deref(), category.as_deref(), Some(&author_id))?;
            let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
            let comments = db.db.get_comments_for_posts(&ids)?;
            Ok((posts, comments))
        })
        .await??;

        let by_post = group_by_post(comments);
        let empty = Vec::new();
        let posts = posts
            .iter()
            .map(|p| {
                let post_comments = by_post.get(&p.id).unwrap_or(&empty);
                project::project_dashboard_post(p, post_comments, &user.email)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        return Ok(Json(DashboardResponse { posts }).into_response());
    }

    let db = state.clone();
    let (posts, comments) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        let posts = db
            .db
            .list_posts(emotion.as_deref(), category.as_deref(), None)?;
        let ids: Vec<String> = posts.iter().map(|p| p.id.clone()).collect();
        let comments = db.db.get_comments_for_posts(&ids)?;
        Ok((posts, comments))
    })
    .await??;

    let viewer_id = viewer.map(|u| u.id);
    let by_post = group_by_post(comments);
    let empty = Vec::new();
    let posts = posts
        .iter()
        .map(|p| {
            let post_comments = by_post.get(&p.id).unwrap_or(&empty);
            project::project_post(p, post_comments, viewer_id)
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(Json(FeedResponse { posts }).into_response())
}

pub async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<Response> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::Validation("Post content is required.".into()));
    }

    let post_id = Uuid::new_v4();
    let created_at = chrono::Utc::now().to_rfc3339();

    let db = state.clone();
    let row = vent_db::models::PostRow {
        id: post_id.to_string(),
        author_id: user.id.to_string(),
        content,
        emotion: req.emotion.as_str().to_string(),
        category: req.category.as_str().to_string(),
        created_at,
    };
    let insert = row.clone();
    tokio::task::spawn_blocking(move || {
        db.db.insert_post(
            &insert.id,
            &insert.author_id,
            &insert.content,
            &insert.emotion,
            &insert.category,
            &insert.created_at,
        )
    })
    .await??;

    let post = project::project_post(&row, &[], Some(user.id))?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            post,
            message: "Post created successfully".into(),
        }),
    )
        .into_response())
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<Response> {
    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::Validation("Post content is required.".into()));
    }

    // Existence before ownership: a missing post is 404 for everyone
    let db = state.clone();
    let post_id = id.to_string();
    let post = tokio::task::spawn_blocking(move || db.db.get_post(&post_id))
        .await??
        .ok_or(ApiError::NotFound("Post"))?;

    if !guard::can_modify_post(user.id, &post) {
        return Err(ApiError::Forbidden);
    }

    let db = state.clone();
    let post_id = id.to_string();
    let new_content = content.clone();
    let emotion = req.emotion.as_str();
    let category = req.category.as_str();
    tokio::task::spawn_blocking(move || {
        db.db.update_post(&post_id, &new_content, emotion, category)
    })
    .await??;

    let updated = vent_db::models::PostRow {
        content,
        emotion: emotion.to_string(),
        category: category.to_string(),
        ..post
    };
    let post = project::project_post(&updated, &[], Some(user.id))?;

    Ok(Json(PostResponse {
        post,
        message: "Post updated successfully".into(),
    })
    .into_response())
}

pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> ApiResult<Response> {
    let db = state.clone();
    let post_id = id.to_string();
    let post = tokio::task::spawn_blocking(move || db.db.get_post(&post_id))
        .await??
        .ok_or(ApiError::NotFound("Post"))?;

    if !guard::can_modify_post(user.id, &post) {
        return Err(ApiError::Forbidden);
    }

    let db = state.clone();
    let post_id = id.to_string();
    tokio::task::spawn_blocking(move || db.db.delete_post(&post_id)).await??;

    Ok(Json(MessageResponse {
        message: "Post deleted successfully".into(),
    })
    .into_response())
}

fn group_by_post(comments: Vec<CommentRow>) -> HashMap<String, Vec<CommentRow>> {
    let mut by_post: HashMap<String, Vec<CommentRow>> = HashMap::new();
    for comment in comments {
        by_post.entry(comment.post_id.clone()).or_default().push(comment);
    }
    by_post
}
