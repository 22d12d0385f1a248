pub mod auth;
pub mod comments;
pub mod error;
pub mod extract;
pub mod guard;
pub mod notifications;
mod notify;
pub mod posts;
pub mod project;
pub mod reports;
pub mod token;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::auth::AppState;

/// The full route table over one shared state. The server binary and the
/// integration tests drive the identical app through this.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route(
            "/posts/{id}",
            put(posts::update_post).delete(posts::delete_post),
        )
        .route("/comments", post(comments::create_comment))
        .route("/comments/{id}", delete(comments::delete_comment))
        .route("/reports", post(reports::create_report))
        .route(
            "/notifications",
            get(notifications::list_notifications).patch(notifications::ack_notification),
        )
        .with_state(state)
}
