//! PostgreSQL implementations of the store contracts.
//!
//! Queries use the runtime sqlx API rather than the compile-time macros so the
//! crate builds without a reachable database; the schema lives in
//! `migrations/`.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::modules::chat::model::{
    Assignment, Attachment, ContactStats, Message, NewMessage, Role, StudentProfile,
    TeacherProfile, UserRecord,
};
use crate::store::{DirectoryStore, MessageStore};

#[derive(Clone)]
pub struct PgDirectoryStore {
    pool: PgPool,
}

impl PgDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    display_name: String,
    role: String,
    active: bool,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord {
            id: row.id,
            username: row.username,
            display_name: row.display_name,
            role: Role::from_db(&row.role),
            active: row.active,
        }
    }
}

const USER_COLUMNS: &str = "id, username, display_name, role, active";

#[async_trait]
impl DirectoryStore for PgDirectoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn find_active_users(&self, roles: Option<&[Role]>) -> anyhow::Result<Vec<UserRecord>> {
        let rows: Vec<UserRow> = match roles {
            Some(roles) => {
                let role_names: Vec<String> =
                    roles.iter().map(|r| r.as_db().to_string()).collect();
                sqlx::query_as(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE active AND role = ANY($1) ORDER BY username"
                ))
                .bind(role_names)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE active ORDER BY username"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_teacher_profile(&self, user_id: Uuid) -> anyhow::Result<Option<TeacherProfile>> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM teachers WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id,)| TeacherProfile { id }))
    }

    async fn find_student_profile(&self, user_id: Uuid) -> anyhow::Result<Option<StudentProfile>> {
        let row: Option<(Uuid, Option<Uuid>, Option<i32>)> =
            sqlx::query_as("SELECT id, class_id, grade FROM students WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id, class_id, grade)| StudentProfile {
            id,
            class_id,
            grade,
        }))
    }

    async fn find_assignments_by_teacher(
        &self,
        teacher_profile_id: Uuid,
    ) -> anyhow::Result<Vec<Assignment>> {
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT DISTINCT class_id, subject_id FROM class_subjects WHERE teacher_id = $1",
        )
        .bind(teacher_profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(class_id, subject_id)| Assignment {
                class_id,
                subject_id,
            })
            .collect())
    }

    async fn assignment_exists(
        &self,
        teacher_profile_id: Uuid,
        class_id: Uuid,
    ) -> anyhow::Result<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM class_subjects WHERE teacher_id = $1 AND class_id = $2)",
        )
        .bind(teacher_profile_id)
        .bind(class_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn find_students_taught_by(
        &self,
        teacher_profile_id: Uuid,
    ) -> anyhow::Result<Vec<UserRecord>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT DISTINCT u.id, u.username, u.display_name, u.role, u.active
            FROM users u
            JOIN students s ON s.user_id = u.id
            JOIN class_subjects cs ON cs.class_id = s.class_id
            WHERE cs.teacher_id = $1 AND u.active
            "#,
        )
        .bind(teacher_profile_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_teachers_of_class(&self, class_id: Uuid) -> anyhow::Result<Vec<UserRecord>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            r#"
            SELECT DISTINCT u.id, u.username, u.display_name, u.role, u.active
            FROM users u
            JOIN teachers t ON t.user_id = u.id
            JOIN class_subjects cs ON cs.teacher_id = t.id
            WHERE cs.class_id = $1 AND u.active
            "#,
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    sender_id: Uuid,
    recipient_id: Uuid,
    content: String,
    attachments: Json<Vec<Attachment>>,
    read: bool,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            content: row.content,
            attachments: row.attachments.0,
            read: row.read,
            created_at: row.created_at,
        }
    }
}

const MESSAGE_COLUMNS: &str =
    "id, sender_id, recipient_id, content, attachments, read, created_at";

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn create(&self, new: NewMessage) -> anyhow::Result<Message> {
        let row: MessageRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO messages (sender_id, recipient_id, content, attachments)
            VALUES ($1, $2, $3, $4)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(new.sender_id)
        .bind(new.recipient_id)
        .bind(new.content)
        .bind(Json(new.attachments))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn find_between(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        page: i64,
        page_size: i64,
    ) -> anyhow::Result<Vec<Message>> {
        let offset = (page.max(1) - 1) * page_size;
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE (sender_id = $1 AND recipient_id = $2)
               OR (sender_id = $2 AND recipient_id = $1)
            ORDER BY created_at ASC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(user_a)
        .bind(user_b)
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn aggregate_stats_for_candidates(
        &self,
        self_id: Uuid,
        candidate_ids: &[Uuid],
    ) -> anyhow::Result<Vec<ContactStats>> {
        let rows: Vec<PgRow> = sqlx::query(
            r#"
            WITH pair AS (
                SELECT m.*,
                       CASE WHEN m.sender_id = $1 THEN m.recipient_id ELSE m.sender_id END
                           AS counterpart_id
                FROM messages m
                WHERE (m.sender_id = $1 AND m.recipient_id = ANY($2))
                   OR (m.recipient_id = $1 AND m.sender_id = ANY($2))
            )
            SELECT DISTINCT ON (counterpart_id)
                   counterpart_id,
                   id, sender_id, recipient_id, content, attachments, read, created_at,
                   COUNT(*) FILTER (WHERE recipient_id = $1 AND NOT read)
                       OVER (PARTITION BY counterpart_id) AS unread_count
            FROM pair
            ORDER BY counterpart_id, created_at DESC
            "#,
        )
        .bind(self_id)
        .bind(candidate_ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let attachments: Json<Vec<Attachment>> = row.try_get("attachments")?;
                Ok(ContactStats {
                    counterpart_id: row.try_get("counterpart_id")?,
                    last_message: Message {
                        id: row.try_get("id")?,
                        sender_id: row.try_get("sender_id")?,
                        recipient_id: row.try_get("recipient_id")?,
                        content: row.try_get("content")?,
                        attachments: attachments.0,
                        read: row.try_get("read")?,
                        created_at: row.try_get("created_at")?,
                    },
                    unread_count: row.try_get("unread_count")?,
                })
            })
            .collect()
    }

    async fn mark_one_read(
        &self,
        message_id: Uuid,
        recipient_id: Uuid,
    ) -> anyhow::Result<Option<Message>> {
        let row: Option<MessageRow> = sqlx::query_as(&format!(
            "UPDATE messages SET read = TRUE
             WHERE id = $1 AND recipient_id = $2
             RETURNING {MESSAGE_COLUMNS}"
        ))
        .bind(message_id)
        .bind(recipient_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn mark_all_read_from(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "UPDATE messages SET read = TRUE
             WHERE sender_id = $1 AND recipient_id = $2 AND NOT read",
        )
        .bind(sender_id)
        .bind(recipient_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
