//! Anonymity projection. Public shapes structurally lack any author field:
//! the true author id is consulted once to derive `is_mine`, then dropped.
//! Each nested comment is projected individually for the same viewer —
//! there is no blanket strip to forget on a new field.

use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use vent_db::models::{CommentRow, PostRow};
use vent_types::api::{CommentView, DashboardCommentView, DashboardPostView, PostView};
use vent_types::models::{Category, Emotion};

pub(crate) fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let ts = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("bad stored timestamp: {s}"))?;
    Ok(ts.with_timezone(&Utc))
}

fn is_author(viewer: Option<Uuid>, author_id: &str) -> bool {
    viewer.is_some_and(|v| v.to_string() == author_id)
}

pub fn project_comment(row: &CommentRow, viewer: Option<Uuid>) -> anyhow::Result<CommentView> {
    Ok(CommentView {
        id: row.id.parse().context("bad stored comment id")?,
        post_id: row.post_id.parse().context("bad stored post id")?,
        content: row.content.clone(),
        created_at: parse_timestamp(&row.created_at)?,
        is_mine: is_author(viewer, &row.author_id),
    })
}

/// Public (feed) shape of a post for a given viewer, with its comments.
pub fn project_post(
    post: &PostRow,
    comments: &[CommentRow],
    viewer: Option<Uuid>,
) -> anyhow::Result<PostView> {
    let comments = comments
        .iter()
        .map(|c| project_comment(c, viewer))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(PostView {
        id: post.id.parse().context("bad stored post id")?,
        content: post.content.clone(),
        emotion: post.emotion.parse::<Emotion>().map_err(anyhow::Error::msg)?,
        category: post
            .category
            .parse::<Category>()
            .map_err(anyhow::Error::msg)?,
        created_at: parse_timestamp(&post.created_at)?,
        is_mine: is_author(viewer, &post.author_id),
        comments,
    })
}

pub fn project_dashboard_comment(row: &CommentRow) -> anyhow::Result<DashboardCommentView> {
    Ok(DashboardCommentView {
        id: row.id.parse().context("bad stored comment id")?,
        post_id: row.post_id.parse().context("bad stored post id")?,
        content: row.content.clone(),
        created_at: parse_timestamp(&row.created_at)?,
        author_email: row.author_email.clone(),
    })
}

/// Dashboard shape. Only ever built for the owner's own posts, so the
/// owner's email (and commenter emails, per the dashboard contract) are
/// allowed to appear.
pub fn project_dashboard_post(
    post: &PostRow,
    comments: &[CommentRow],
    owner_email: &str,
) -> anyhow::Result<DashboardPostView> {
    let comments = comments
        .iter()
        .map(project_dashboard_comment)
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(DashboardPostView {
        id: post.id.parse().context("bad stored post id")?,
        content: post.content.clone(),
        emotion: post.emotion.parse::<Emotion>().map_err(anyhow::Error::msg)?,
        category: post
            .category
            .parse::<Category>()
            .map_err(anyhow::Error::msg)?,
        created_at: parse_timestamp(&post.created_at)?,
        author_email: owner_email.to_string(),
        comments,
    })
}
