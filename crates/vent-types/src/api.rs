use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Category, Emotion};

// -- JWT Claims --

/// Claims carried in the session token. Canonical definition lives here so
/// the codec and the extractors share one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserSummary,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeUser {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<MeUser>,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub content: String,
    pub emotion: Emotion,
    pub category: Category,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub content: String,
    pub emotion: Emotion,
    pub category: Category,
}

/// The public shape of a post. There is no author field — anonymity is
/// structural, not a stripped-out property.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub content: String,
    pub emotion: Emotion,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub is_mine: bool,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_mine: bool,
}

/// Dashboard shape: only ever built for an owner listing their own posts,
/// so it may carry author emails.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPostView {
    pub id: Uuid,
    pub content: String,
    pub emotion: Emotion,
    pub category: Category,
    pub created_at: DateTime<Utc>,
    pub author_email: String,
    pub comments: Vec<DashboardCommentView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author_email: String,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub posts: Vec<PostView>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub posts: Vec<DashboardPostView>,
}

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub post: PostView,
    pub message: String,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub comment: CommentView,
    pub message: String,
}

// -- Reports --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateReportRequest {
    pub post_id: Uuid,
    pub reason: String,
}

// -- Notifications --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: Uuid,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationView>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AckNotificationRequest {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub notification: NotificationView,
    pub message: String,
}

// -- Generic --

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
