#![allow(dead_code)]

use std::sync::Arc;

use classline::live::{ServerEvent, SessionRegistry};
use classline::modules::chat::model::{Role, SendMessageDto, UserRecord};
use classline::modules::chat::service::ChatService;
use classline::store::memory::{MemoryDirectoryStore, MemoryMessageStore};
use classline::store::{DirectoryStore, MessageStore};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use uuid::Uuid;

/// Everything a chat test needs: in-memory stores, a registry, and the
/// service wired on top of them.
pub struct TestWorld {
    pub directory: Arc<MemoryDirectoryStore>,
    pub messages: Arc<MemoryMessageStore>,
    pub sessions: Arc<SessionRegistry>,
    pub chat: ChatService,
}

pub fn world() -> TestWorld {
    let directory = Arc::new(MemoryDirectoryStore::new());
    let messages = Arc::new(MemoryMessageStore::new());
    let sessions = Arc::new(SessionRegistry::new());
    let chat = ChatService::new(
        directory.clone() as Arc<dyn DirectoryStore>,
        messages.clone() as Arc<dyn MessageStore>,
        sessions.clone(),
    );
    TestWorld {
        directory,
        messages,
        sessions,
        chat,
    }
}

/// The canonical scenario: teacher T assigned to a subject in class C,
/// student U a member of C, student V a member of a different class D,
/// plus one admin.
pub struct Classroom {
    pub admin: UserRecord,
    pub teacher: UserRecord,
    pub student_in_class: UserRecord,
    pub student_elsewhere: UserRecord,
    pub class_c: Uuid,
    pub class_d: Uuid,
}

pub fn classroom(world: &TestWorld) -> Classroom {
    let class_c = Uuid::new_v4();
    let class_d = Uuid::new_v4();
    let subject = Uuid::new_v4();

    let admin = world.directory.add_user("admin", Role::Admin, true);
    let teacher = world.directory.add_user("teacher", Role::Teacher, true);
    let student_in_class = world.directory.add_user("student-u", Role::Student, true);
    let student_elsewhere = world.directory.add_user("student-v", Role::Student, true);

    let teacher_profile = world.directory.add_teacher_profile(teacher.id);
    world.directory.assign(teacher_profile, class_c, subject);
    world
        .directory
        .add_student_profile(student_in_class.id, Some(class_c), Some(7));
    world
        .directory
        .add_student_profile(student_elsewhere.id, Some(class_d), Some(7));

    Classroom {
        admin,
        teacher,
        student_in_class,
        student_elsewhere,
        class_c,
        class_d,
    }
}

pub fn text_message(recipient: Uuid, content: &str) -> SendMessageDto {
    SendMessageDto {
        recipient_id: recipient,
        content: Some(content.to_string()),
        attachments: Vec::new(),
    }
}

/// Connects a live session for the user and returns its event receiver.
pub async fn connect(world: &TestWorld, user: &UserRecord) -> UnboundedReceiver<ServerEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    world.sessions.connect(user.id, tx).await;
    rx
}
