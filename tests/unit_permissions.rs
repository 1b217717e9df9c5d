mod common;

use classline::modules::chat::model::Role;
use common::{classroom, world};
use uuid::Uuid;

#[tokio::test]
async fn admins_reach_everyone() {
    let world = world();
    let scenario = classroom(&world);
    let super_admin = world.directory.add_user("root", Role::SuperAdmin, true);

    for recipient in [
        &scenario.teacher,
        &scenario.student_in_class,
        &scenario.student_elsewhere,
    ] {
        assert!(
            world
                .chat
                .can_exchange(&scenario.admin, recipient.id)
                .await
                .unwrap()
        );
        assert!(
            world
                .chat
                .can_exchange(&super_admin, recipient.id)
                .await
                .unwrap()
        );
    }
}

#[tokio::test]
async fn everyone_reaches_admins() {
    let world = world();
    let scenario = classroom(&world);

    assert!(
        world
            .chat
            .can_exchange(&scenario.teacher, scenario.admin.id)
            .await
            .unwrap()
    );
    assert!(
        world
            .chat
            .can_exchange(&scenario.student_elsewhere, scenario.admin.id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn teacher_and_student_need_a_shared_class() {
    let world = world();
    let scenario = classroom(&world);

    // T teaches in U's class but not in V's.
    assert!(
        world
            .chat
            .can_exchange(&scenario.teacher, scenario.student_in_class.id)
            .await
            .unwrap()
    );
    assert!(
        !world
            .chat
            .can_exchange(&scenario.teacher, scenario.student_elsewhere.id)
            .await
            .unwrap()
    );

    // Symmetric from the student's side.
    assert!(
        world
            .chat
            .can_exchange(&scenario.student_in_class, scenario.teacher.id)
            .await
            .unwrap()
    );
    assert!(
        !world
            .chat
            .can_exchange(&scenario.student_elsewhere, scenario.teacher.id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn peers_of_the_same_role_are_denied() {
    let world = world();
    let scenario = classroom(&world);
    let other_teacher = world.directory.add_user("teacher-2", Role::Teacher, true);

    assert!(
        !world
            .chat
            .can_exchange(&scenario.student_in_class, scenario.student_elsewhere.id)
            .await
            .unwrap()
    );
    assert!(
        !world
            .chat
            .can_exchange(&scenario.teacher, other_teacher.id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn missing_or_inactive_recipient_is_denied_not_an_error() {
    let world = world();
    let scenario = classroom(&world);

    assert!(
        !world
            .chat
            .can_exchange(&scenario.admin, Uuid::new_v4())
            .await
            .unwrap()
    );

    world.directory.deactivate(scenario.student_in_class.id);
    assert!(
        !world
            .chat
            .can_exchange(&scenario.teacher, scenario.student_in_class.id)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn missing_profiles_deny_the_teacher_student_pair() {
    let world = world();
    let teacher = world.directory.add_user("teacher", Role::Teacher, true);
    let student = world.directory.add_user("student", Role::Student, true);
    // Neither has a profile row.
    assert!(!world.chat.can_exchange(&teacher, student.id).await.unwrap());

    // Student with a profile but no class is still unreachable.
    world.directory.add_student_profile(student.id, None, None);
    let profile = world.directory.add_teacher_profile(teacher.id);
    world.directory.assign(profile, Uuid::new_v4(), Uuid::new_v4());
    assert!(!world.chat.can_exchange(&teacher, student.id).await.unwrap());
}

#[tokio::test]
async fn unknown_roles_only_reach_admins() {
    let world = world();
    let scenario = classroom(&world);
    let clerk = world.directory.add_user("clerk", Role::Other, true);

    assert!(
        world
            .chat
            .can_exchange(&clerk, scenario.admin.id)
            .await
            .unwrap()
    );
    assert!(
        !world
            .chat
            .can_exchange(&clerk, scenario.student_in_class.id)
            .await
            .unwrap()
    );
}
