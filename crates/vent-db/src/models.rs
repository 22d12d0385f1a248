/// Database row types — these map directly to SQLite rows.
/// Distinct from vent-types API models so the DB layer stays independent
/// and no row type ever doubles as a response shape.

#[derive(Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct PostRow {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub emotion: String,
    pub category: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct CommentRow {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub author_email: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct ReportRow {
    pub id: String,
    pub post_id: String,
    pub reporter_id: String,
    pub reason: String,
    pub created_at: String,
}

#[derive(Clone)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}
