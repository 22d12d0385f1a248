use crate::Database;
use crate::models::{CommentRow, NotificationRow, PostRow, ReportRow, UserRow};
use anyhow::Result;
use rusqlite::Connection;
use rusqlite::types::ToSql;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, email, password_hash, created_at),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Posts --

    pub fn insert_post(
        &self,
        id: &str,
        author_id: &str,
        content: &str,
        emotion: &str,
        category: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (id, author_id, content, emotion, category, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                (id, author_id, content, emotion, category, created_at),
            )?;
            Ok(())
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, author_id, content, emotion, category, created_at
                 FROM posts WHERE id = ?1",
            )?;
            stmt.query_row([id], post_from_row).optional()
        })
    }

    /// Newest-first post listing. `emotion`/`category` narrow the feed;
    /// `author_id` narrows to one user's posts (dashboard).
    pub fn list_posts(
        &self,
        emotion: Option<&str>,
        category: Option<&str>,
        author_id: Option<&str>,
    ) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut sql = String::from(
                "SELECT id, author_id, content, emotion, category, created_at FROM posts",
            );
            let mut clauses: Vec<String> = Vec::new();
            let mut params: Vec<&dyn ToSql> = Vec::new();

            let filters = [
                ("emotion", emotion),
                ("category", category),
                ("author_id", author_id),
            ];
            for (column, value) in &filters {
                if let Some(value) = value {
                    params.push(value as &dyn ToSql);
                    clauses.push(format!("{} = ?{}", column, params.len()));
                }
            }

            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            sql.push_str(" ORDER BY created_at DESC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params.as_slice(), post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn update_post(
        &self,
        id: &str,
        content: &str,
        emotion: &str,
        category: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE posts SET content = ?2, emotion = ?3, category = ?4 WHERE id = ?1",
                (id, content, emotion, category),
            )?;
            Ok(())
        })
    }

    pub fn delete_post(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM posts WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        id: &str,
        post_id: &str,
        author_id: &str,
        content: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, post_id, author_id, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, post_id, author_id, content, created_at),
            )?;
            Ok(())
        })
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.post_id, c.author_id, u.email, c.content, c.created_at
                 FROM comments c
                 JOIN users u ON c.author_id = u.id
                 WHERE c.id = ?1",
            )?;
            stmt.query_row([id], comment_from_row).optional()
        })
    }

    /// Batch-fetch comments for a set of post IDs, oldest first. Author
    /// email rides along via a JOIN so the dashboard never needs an N+1.
    pub fn get_comments_for_posts(&self, post_ids: &[String]) -> Result<Vec<CommentRow>> {
        if post_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=post_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT c.id, c.post_id, c.author_id, u.email, c.content, c.created_at
                 FROM comments c
                 JOIN users u ON c.author_id = u.id
                 WHERE c.post_id IN ({})
                 ORDER BY c.created_at ASC",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn ToSql> =
                post_ids.iter().map(|id| id as &dyn ToSql).collect();

            let rows = stmt
                .query_map(params.as_slice(), comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn delete_comment(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
            Ok(())
        })
    }

    // -- Reports --

    pub fn find_report(&self, post_id: &str, reporter_id: &str) -> Result<Option<ReportRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, post_id, reporter_id, reason, created_at
                 FROM reports WHERE post_id = ?1 AND reporter_id = ?2",
            )?;
            stmt.query_row([post_id, reporter_id], |row| {
                Ok(ReportRow {
                    id: row.get(0)?,
                    post_id: row.get(1)?,
                    reporter_id: row.get(2)?,
                    reason: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })
            .optional()
        })
    }

    /// The UNIQUE(post_id, reporter_id) constraint is the authoritative
    /// dedup check; concurrent duplicate submissions fail here.
    pub fn insert_report(
        &self,
        id: &str,
        post_id: &str,
        reporter_id: &str,
        reason: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO reports (id, post_id, reporter_id, reason, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, post_id, reporter_id, reason, created_at),
            )?;
            Ok(())
        })
    }

    // -- Notifications --

    pub fn insert_notification(
        &self,
        id: &str,
        user_id: &str,
        message: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, user_id, message, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                (id, user_id, message, created_at),
            )?;
            Ok(())
        })
    }

    pub fn list_notifications(&self, user_id: &str, limit: u32) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, message, is_read, created_at
                 FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], notification_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_notification(&self, id: &str) -> Result<Option<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, message, is_read, created_at
                 FROM notifications WHERE id = ?1",
            )?;
            stmt.query_row([id], notification_from_row).optional()
        })
    }

    pub fn mark_notification_read(&self, id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE notifications SET is_read = 1 WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is always a literal from this crate, never caller input
    let sql = format!(
        "SELECT id, email, password, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    stmt.query_row([value], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            email: row.get(1)?,
            password: row.get(2)?,
            created_at: row.get(3)?,
        })
    })
    .optional()
}

fn post_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        content: row.get(2)?,
        emotion: row.get(3)?,
        category: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn comment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        author_email: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn notification_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        message: row.get(2)?,
        is_read: row.get::<_, i64>(3)? != 0,
        created_at: row.get(4)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
