//! Store contracts consumed by the chat core.
//!
//! The user directory, profiles, and assignment links belong to collaborator
//! subsystems and are read-only here; messages are the one thing this core
//! writes. Both contracts are traits so handlers can run against PostgreSQL
//! in production and in-memory fakes in tests.

pub mod postgres;

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::modules::chat::model::{
    Assignment, ContactStats, Message, NewMessage, Role, StudentProfile, TeacherProfile,
    UserRecord,
};

/// Read-only view of the user directory and the teacher/class/subject links.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>>;

    /// Active users, optionally restricted to the given roles.
    async fn find_active_users(&self, roles: Option<&[Role]>) -> anyhow::Result<Vec<UserRecord>>;

    async fn find_teacher_profile(&self, user_id: Uuid) -> anyhow::Result<Option<TeacherProfile>>;

    async fn find_student_profile(&self, user_id: Uuid) -> anyhow::Result<Option<StudentProfile>>;

    async fn find_assignments_by_teacher(
        &self,
        teacher_profile_id: Uuid,
    ) -> anyhow::Result<Vec<Assignment>>;

    /// Does the teacher hold at least one assignment row in this class?
    async fn assignment_exists(
        &self,
        teacher_profile_id: Uuid,
        class_id: Uuid,
    ) -> anyhow::Result<bool>;

    /// Active students whose class membership matches any class the teacher's
    /// assignment rows cover.
    async fn find_students_taught_by(
        &self,
        teacher_profile_id: Uuid,
    ) -> anyhow::Result<Vec<UserRecord>>;

    /// Active teachers whose assignment rows cover the given class.
    async fn find_teachers_of_class(&self, class_id: Uuid) -> anyhow::Result<Vec<UserRecord>>;
}

/// Persisted messages between pairs of users.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create(&self, new: NewMessage) -> anyhow::Result<Message>;

    /// Chronologically ascending page of the conversation between two users.
    /// `page` is 1-based.
    async fn find_between(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        page: i64,
        page_size: i64,
    ) -> anyhow::Result<Vec<Message>>;

    /// One-pass stats over every message between `self_id` and the candidate
    /// set: most recent message per counterpart plus the count of unread
    /// messages addressed to `self_id`. Counterparts with no messages are
    /// simply absent from the result.
    async fn aggregate_stats_for_candidates(
        &self,
        self_id: Uuid,
        candidate_ids: &[Uuid],
    ) -> anyhow::Result<Vec<ContactStats>>;

    /// Flip one message to read, scoped to its recipient. Idempotent; returns
    /// the updated message so callers can notify the original sender, or
    /// `None` when the id is unknown or addressed to someone else.
    async fn mark_one_read(
        &self,
        message_id: Uuid,
        recipient_id: Uuid,
    ) -> anyhow::Result<Option<Message>>;

    /// Flip every unread message from `sender_id` to `recipient_id`; returns
    /// how many rows changed.
    async fn mark_all_read_from(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
    ) -> anyhow::Result<u64>;
}
