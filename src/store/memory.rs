//! In-memory store fakes for tests.
//!
//! Same contracts as the PostgreSQL stores, backed by vectors behind locks,
//! so permission and contact logic can be exercised without a database.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::modules::chat::model::{
    Assignment, ContactStats, Message, NewMessage, Role, StudentProfile, TeacherProfile,
    UserRecord,
};
use crate::store::{DirectoryStore, MessageStore};

#[derive(Default)]
pub struct MemoryDirectoryStore {
    users: RwLock<Vec<UserRecord>>,
    teachers: RwLock<HashMap<Uuid, TeacherProfile>>,
    students: RwLock<HashMap<Uuid, StudentProfile>>,
    // (teacher_profile_id, class_id, subject_id)
    assignments: RwLock<Vec<(Uuid, Uuid, Uuid)>>,
}

impl MemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, username: &str, role: Role, active: bool) -> UserRecord {
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: username.to_string(),
            display_name: username.to_string(),
            role,
            active,
        };
        self.users.write().unwrap().push(user.clone());
        user
    }

    /// Registers a teacher profile for the user and returns the profile id.
    pub fn add_teacher_profile(&self, user_id: Uuid) -> Uuid {
        let profile = TeacherProfile { id: Uuid::new_v4() };
        let id = profile.id;
        self.teachers.write().unwrap().insert(user_id, profile);
        id
    }

    pub fn add_student_profile(
        &self,
        user_id: Uuid,
        class_id: Option<Uuid>,
        grade: Option<i32>,
    ) -> Uuid {
        let profile = StudentProfile {
            id: Uuid::new_v4(),
            class_id,
            grade,
        };
        let id = profile.id;
        self.students.write().unwrap().insert(user_id, profile);
        id
    }

    pub fn assign(&self, teacher_profile_id: Uuid, class_id: Uuid, subject_id: Uuid) {
        self.assignments
            .write()
            .unwrap()
            .push((teacher_profile_id, class_id, subject_id));
    }

    pub fn deactivate(&self, user_id: Uuid) {
        if let Some(user) = self
            .users
            .write()
            .unwrap()
            .iter_mut()
            .find(|u| u.id == user_id)
        {
            user.active = false;
        }
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<UserRecord>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_active_users(&self, roles: Option<&[Role]>) -> anyhow::Result<Vec<UserRecord>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .iter()
            .filter(|u| u.active)
            .filter(|u| roles.is_none_or(|roles| roles.contains(&u.role)))
            .cloned()
            .collect())
    }

    async fn find_teacher_profile(&self, user_id: Uuid) -> anyhow::Result<Option<TeacherProfile>> {
        Ok(self.teachers.read().unwrap().get(&user_id).cloned())
    }

    async fn find_student_profile(&self, user_id: Uuid) -> anyhow::Result<Option<StudentProfile>> {
        Ok(self.students.read().unwrap().get(&user_id).cloned())
    }

    async fn find_assignments_by_teacher(
        &self,
        teacher_profile_id: Uuid,
    ) -> anyhow::Result<Vec<Assignment>> {
        Ok(self
            .assignments
            .read()
            .unwrap()
            .iter()
            .filter(|(teacher, _, _)| *teacher == teacher_profile_id)
            .map(|&(_, class_id, subject_id)| Assignment {
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
        Ok(self
            .assignments
            .read()
            .unwrap()
            .iter()
            .any(|&(teacher, class, _)| teacher == teacher_profile_id && class == class_id))
    }

    async fn find_students_taught_by(
        &self,
        teacher_profile_id: Uuid,
    ) -> anyhow::Result<Vec<UserRecord>> {
        let classes: Vec<Uuid> = self
            .assignments
            .read()
            .unwrap()
            .iter()
            .filter(|(teacher, _, _)| *teacher == teacher_profile_id)
            .map(|&(_, class_id, _)| class_id)
            .collect();
        let students = self.students.read().unwrap();
        Ok(self
            .users
            .read()
            .unwrap()
            .iter()
            .filter(|u| u.active)
            .filter(|u| {
                students
                    .get(&u.id)
                    .and_then(|s| s.class_id)
                    .is_some_and(|class| classes.contains(&class))
            })
            .cloned()
            .collect())
    }

    async fn find_teachers_of_class(&self, class_id: Uuid) -> anyhow::Result<Vec<UserRecord>> {
        let teacher_profiles: Vec<Uuid> = self
            .assignments
            .read()
            .unwrap()
            .iter()
            .filter(|(_, class, _)| *class == class_id)
            .map(|&(teacher, _, _)| teacher)
            .collect();
        let teachers = self.teachers.read().unwrap();
        Ok(self
            .users
            .read()
            .unwrap()
            .iter()
            .filter(|u| u.active)
            .filter(|u| {
                teachers
                    .get(&u.id)
                    .is_some_and(|t| teacher_profiles.contains(&t.id))
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryMessageStore {
    messages: RwLock<Vec<Message>>,
    clock: RwLock<i64>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Message> {
        self.messages.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.messages.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Monotonic timestamps so ordering assertions are deterministic even when
    // two creates land within the same instant.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut clock = self.clock.write().unwrap();
        *clock += 1;
        Utc::now() + Duration::milliseconds(*clock)
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn create(&self, new: NewMessage) -> anyhow::Result<Message> {
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: new.sender_id,
            recipient_id: new.recipient_id,
            content: new.content,
            attachments: new.attachments,
            read: false,
            created_at: self.next_timestamp(),
        };
        self.messages.write().unwrap().push(message.clone());
        Ok(message)
    }

    async fn find_between(
        &self,
        user_a: Uuid,
        user_b: Uuid,
        page: i64,
        page_size: i64,
    ) -> anyhow::Result<Vec<Message>> {
        let mut between: Vec<Message> = self
            .messages
            .read()
            .unwrap()
            .iter()
            .filter(|m| {
                (m.sender_id == user_a && m.recipient_id == user_b)
                    || (m.sender_id == user_b && m.recipient_id == user_a)
            })
            .cloned()
            .collect();
        between.sort_by_key(|m| m.created_at);
        let offset = ((page.max(1) - 1) * page_size) as usize;
        Ok(between
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect())
    }

    async fn aggregate_stats_for_candidates(
        &self,
        self_id: Uuid,
        candidate_ids: &[Uuid],
    ) -> anyhow::Result<Vec<ContactStats>> {
        let mut stats: HashMap<Uuid, ContactStats> = HashMap::new();
        for message in self.messages.read().unwrap().iter() {
            let counterpart = if message.sender_id == self_id {
                message.recipient_id
            } else if message.recipient_id == self_id {
                message.sender_id
            } else {
                continue;
            };
            if !candidate_ids.contains(&counterpart) {
                continue;
            }
            let unread = (message.recipient_id == self_id && !message.read) as i64;
            stats
                .entry(counterpart)
                .and_modify(|entry| {
                    entry.unread_count += unread;
                    if message.created_at > entry.last_message.created_at {
                        entry.last_message = message.clone();
                    }
                })
                .or_insert_with(|| ContactStats {
                    counterpart_id: counterpart,
                    last_message: message.clone(),
                    unread_count: unread,
                });
        }
        Ok(stats.into_values().collect())
    }

    async fn mark_one_read(
        &self,
        message_id: Uuid,
        recipient_id: Uuid,
    ) -> anyhow::Result<Option<Message>> {
        let mut messages = self.messages.write().unwrap();
        if let Some(message) = messages
            .iter_mut()
            .find(|m| m.id == message_id && m.recipient_id == recipient_id)
        {
            message.read = true;
            return Ok(Some(message.clone()));
        }
        Ok(None)
    }

    async fn mark_all_read_from(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
    ) -> anyhow::Result<u64> {
        let mut updated = 0;
        for message in self.messages.write().unwrap().iter_mut() {
            if message.sender_id == sender_id && message.recipient_id == recipient_id && !message.read
            {
                message.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }
}
