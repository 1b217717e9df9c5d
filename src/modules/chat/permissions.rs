//! Who may exchange messages with whom.
//!
//! Read-only and recomputed fresh on every send; a decision is never trusted
//! across a suspension point. A missing or inactive recipient is a denial,
//! not an error, so callers cannot distinguish "no such user" from "not
//! allowed" (avoids user enumeration).

use uuid::Uuid;

use crate::modules::chat::model::{Role, UserRecord};
use crate::modules::chat::service::ChatError;
use crate::store::DirectoryStore;

/// The permission table:
///
/// - admins (and super admins) reach everyone,
/// - everyone reaches admins,
/// - teacher and student reach each other iff the teacher holds an assignment
///   row in the student's class,
/// - everything else is denied.
pub async fn can_exchange(
    directory: &dyn DirectoryStore,
    sender: &UserRecord,
    recipient_id: Uuid,
) -> Result<bool, ChatError> {
    let Some(recipient) = directory.find_user_by_id(recipient_id).await? else {
        return Ok(false);
    };
    if !recipient.active {
        return Ok(false);
    }

    if sender.role.is_admin() || recipient.role.is_admin() {
        return Ok(true);
    }

    match (sender.role, recipient.role) {
        (Role::Teacher, Role::Student) => {
            teacher_student_share_class(directory, sender.id, recipient.id).await
        }
        (Role::Student, Role::Teacher) => {
            teacher_student_share_class(directory, recipient.id, sender.id).await
        }
        _ => Ok(false),
    }
}

/// Both profile lookups are independent and run concurrently; the relation
/// check needs both results.
async fn teacher_student_share_class(
    directory: &dyn DirectoryStore,
    teacher_user_id: Uuid,
    student_user_id: Uuid,
) -> Result<bool, ChatError> {
    let (teacher, student) = tokio::join!(
        directory.find_teacher_profile(teacher_user_id),
        directory.find_student_profile(student_user_id),
    );
    let (Some(teacher), Some(student)) = (teacher?, student?) else {
        return Ok(false);
    };
    let Some(class_id) = student.class_id else {
        return Ok(false);
    };
    Ok(directory.assignment_exists(teacher.id, class_id).await?)
}
