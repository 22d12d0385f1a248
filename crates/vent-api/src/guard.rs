//! Ownership predicates. Handlers apply these only after the target row has
//! been loaded, so a missing resource always reports 404 before any 403.

use uuid::Uuid;

use vent_db::models::{CommentRow, PostRow};

/// Post edit and delete: author only.
pub fn can_modify_post(caller: Uuid, post: &PostRow) -> bool {
    post.author_id == caller.to_string()
}

/// Comment deletion is dual-owned: the comment's author may delete it, and
/// so may the author of the post it sits under. Nobody else.
pub fn can_delete_comment(caller: Uuid, comment: &CommentRow, parent: &PostRow) -> bool {
    let caller = caller.to_string();
    comment.author_id == caller || parent.author_id == caller
}

/// Reporting your own post is forbidden regardless of prior state.
pub fn can_report(caller: Uuid, post: &PostRow) -> bool {
    post.author_id != caller.to_string()
}
