mod common;

use chrono::{DateTime, Utc};
use classline::modules::chat::model::Role;
use classline::store::DirectoryStore;
use common::{classroom, text_message, world};
use uuid::Uuid;

#[tokio::test]
async fn admin_sees_all_active_users_except_self() {
    let world = world();
    let scenario = classroom(&world);
    let inactive = world.directory.add_user("ghost", Role::Student, false);

    let contacts = world.chat.list_contacts(&scenario.admin).await.unwrap();
    let ids: Vec<Uuid> = contacts.iter().map(|c| c.user.id).collect();

    assert_eq!(ids.len(), 3);
    assert!(!ids.contains(&scenario.admin.id));
    assert!(!ids.contains(&inactive.id));
    assert!(ids.contains(&scenario.teacher.id));
    assert!(ids.contains(&scenario.student_in_class.id));
    assert!(ids.contains(&scenario.student_elsewhere.id));
}

#[tokio::test]
async fn teacher_sees_admins_and_their_students_only() {
    let world = world();
    let scenario = classroom(&world);

    let contacts = world.chat.list_contacts(&scenario.teacher).await.unwrap();
    let ids: Vec<Uuid> = contacts.iter().map(|c| c.user.id).collect();

    assert!(ids.contains(&scenario.admin.id));
    assert!(ids.contains(&scenario.student_in_class.id));
    assert!(!ids.contains(&scenario.student_elsewhere.id));
    assert!(!ids.contains(&scenario.teacher.id));
}

#[tokio::test]
async fn student_sees_admins_and_class_teachers_only() {
    let world = world();
    let scenario = classroom(&world);
    let unrelated_teacher = world.directory.add_user("teacher-2", Role::Teacher, true);
    let profile = world.directory.add_teacher_profile(unrelated_teacher.id);
    world
        .directory
        .assign(profile, scenario.class_d, Uuid::new_v4());

    let contacts = world
        .chat
        .list_contacts(&scenario.student_in_class)
        .await
        .unwrap();
    let ids: Vec<Uuid> = contacts.iter().map(|c| c.user.id).collect();

    assert!(ids.contains(&scenario.admin.id));
    assert!(ids.contains(&scenario.teacher.id));
    assert!(!ids.contains(&unrelated_teacher.id));
    assert!(!ids.contains(&scenario.student_elsewhere.id));
}

#[tokio::test]
async fn teacher_without_profile_gets_admins_only() {
    let world = world();
    let admin = world.directory.add_user("admin", Role::Admin, true);
    let teacher = world.directory.add_user("teacher", Role::Teacher, true);

    let contacts = world.chat.list_contacts(&teacher).await.unwrap();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].user.id, admin.id);
}

#[tokio::test]
async fn unknown_role_gets_admins_only() {
    let world = world();
    let scenario = classroom(&world);
    let clerk = world.directory.add_user("clerk", Role::Other, true);

    let contacts = world.chat.list_contacts(&clerk).await.unwrap();
    let ids: Vec<Uuid> = contacts.iter().map(|c| c.user.id).collect();
    assert_eq!(ids, vec![scenario.admin.id]);
}

#[tokio::test]
async fn empty_candidate_set_yields_empty_list() {
    let world = world();
    let student = world.directory.add_user("alone", Role::Student, true);

    let contacts = world.chat.list_contacts(&student).await.unwrap();
    assert!(contacts.is_empty());
}

#[tokio::test]
async fn multiple_subjects_in_one_class_do_not_duplicate_students() {
    let world = world();
    let scenario = classroom(&world);
    // The same teacher picks up a second subject in class C.
    let profile = world
        .directory
        .find_teacher_profile(scenario.teacher.id)
        .await
        .unwrap()
        .unwrap();
    world
        .directory
        .assign(profile.id, scenario.class_c, Uuid::new_v4());

    let contacts = world.chat.list_contacts(&scenario.teacher).await.unwrap();
    let matching: Vec<_> = contacts
        .iter()
        .filter(|c| c.user.id == scenario.student_in_class.id)
        .collect();
    assert_eq!(matching.len(), 1);
}

#[tokio::test]
async fn contacts_sort_by_recency_with_unmessaged_last() {
    let world = world();
    let scenario = classroom(&world);

    // Message the teacher first, then student U; student V stays silent.
    world
        .chat
        .send_message(
            &scenario.admin,
            text_message(scenario.teacher.id, "first"),
            None,
        )
        .await
        .unwrap();
    world
        .chat
        .send_message(
            &scenario.admin,
            text_message(scenario.student_in_class.id, "second"),
            None,
        )
        .await
        .unwrap();

    let contacts = world.chat.list_contacts(&scenario.admin).await.unwrap();
    assert_eq!(contacts[0].user.id, scenario.student_in_class.id);
    assert_eq!(contacts[1].user.id, scenario.teacher.id);
    assert_eq!(contacts[2].user.id, scenario.student_elsewhere.id);
    assert_eq!(contacts[2].last_message_time, DateTime::<Utc>::UNIX_EPOCH);
    assert!(contacts[2].last_message.is_none());
}

#[tokio::test]
async fn unread_counts_only_count_incoming_unread() {
    let world = world();
    let scenario = classroom(&world);

    // Two from the student, one from the admin.
    for content in ["hi", "are you there?"] {
        world
            .chat
            .send_message(
                &scenario.student_in_class,
                text_message(scenario.admin.id, content),
                None,
            )
            .await
            .unwrap();
    }
    world
        .chat
        .send_message(
            &scenario.admin,
            text_message(scenario.student_in_class.id, "yes"),
            None,
        )
        .await
        .unwrap();

    let contacts = world.chat.list_contacts(&scenario.admin).await.unwrap();
    let entry = contacts
        .iter()
        .find(|c| c.user.id == scenario.student_in_class.id)
        .unwrap();
    assert_eq!(entry.unread_count, 2);
    // Last message is the admin's own reply.
    assert_eq!(entry.last_message.as_ref().unwrap().content, "yes");

    let contacts = world
        .chat
        .list_contacts(&scenario.student_in_class)
        .await
        .unwrap();
    let entry = contacts
        .iter()
        .find(|c| c.user.id == scenario.admin.id)
        .unwrap();
    assert_eq!(entry.unread_count, 1);
}

#[tokio::test]
async fn equal_times_break_ties_on_user_id() {
    let world = world();
    let scenario = classroom(&world);

    // Nobody has messaged: all three share the epoch timestamp.
    let contacts = world.chat.list_contacts(&scenario.admin).await.unwrap();
    let ids: Vec<Uuid> = contacts.iter().map(|c| c.user.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}
