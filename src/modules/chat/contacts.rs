//! Contact list resolution: role-scoped candidate set, one-pass message
//! stats, recency ordering.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::modules::chat::model::{ContactEntry, Role, UserRecord, UserSummary};
use crate::modules::chat::service::ChatError;
use crate::store::{DirectoryStore, MessageStore};

/// Computes the full contact list for a user: every permitted counterpart,
/// enriched with last message and unread count, ordered by last-message time
/// descending. Contacts with no messages yet sort behind those with messages
/// (their time is the epoch); ties break on ascending user id so the order is
/// stable across calls.
pub async fn list_contacts(
    directory: &dyn DirectoryStore,
    messages: &dyn MessageStore,
    user: &UserRecord,
) -> Result<Vec<ContactEntry>, ChatError> {
    let candidates = candidate_set(directory, user).await?;
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let candidate_ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
    let stats = messages
        .aggregate_stats_for_candidates(user.id, &candidate_ids)
        .await?;
    let mut stats: HashMap<Uuid, _> = stats
        .into_iter()
        .map(|s| (s.counterpart_id, s))
        .collect();

    let mut entries: Vec<ContactEntry> = candidates
        .iter()
        .map(|candidate| match stats.remove(&candidate.id) {
            Some(stat) => ContactEntry {
                user: UserSummary::from(candidate),
                last_message_time: stat.last_message.created_at,
                last_message: Some(stat.last_message),
                unread_count: stat.unread_count,
            },
            None => ContactEntry {
                user: UserSummary::from(candidate),
                last_message: None,
                last_message_time: DateTime::<Utc>::UNIX_EPOCH,
                unread_count: 0,
            },
        })
        .collect();

    entries.sort_by(|a, b| {
        b.last_message_time
            .cmp(&a.last_message_time)
            .then_with(|| a.user.id.cmp(&b.user.id))
    });
    Ok(entries)
}

/// The role-permitted counterparts, before message-stats enrichment:
///
/// - admins see all active users,
/// - teachers see active admins plus the students of every class they are
///   assigned to,
/// - students see active admins plus the teachers assigned to their class,
/// - anything else sees active admins only.
///
/// A missing profile yields no augmentation (admins only). Deduplicated and
/// never including the user themselves.
async fn candidate_set(
    directory: &dyn DirectoryStore,
    user: &UserRecord,
) -> Result<Vec<UserRecord>, ChatError> {
    const ADMIN_ROLES: &[Role] = &[Role::SuperAdmin, Role::Admin];

    let mut candidates = match user.role {
        Role::SuperAdmin | Role::Admin => directory.find_active_users(None).await?,
        Role::Teacher => {
            let (admins, profile) = tokio::join!(
                directory.find_active_users(Some(ADMIN_ROLES)),
                directory.find_teacher_profile(user.id),
            );
            let mut candidates = admins?;
            if let Some(profile) = profile? {
                candidates.extend(directory.find_students_taught_by(profile.id).await?);
            }
            candidates
        }
        Role::Student => {
            let (admins, profile) = tokio::join!(
                directory.find_active_users(Some(ADMIN_ROLES)),
                directory.find_student_profile(user.id),
            );
            let mut candidates = admins?;
            if let Some(class_id) = profile?.and_then(|p| p.class_id) {
                candidates.extend(directory.find_teachers_of_class(class_id).await?);
            }
            candidates
        }
        Role::Other => directory.find_active_users(Some(ADMIN_ROLES)).await?,
    };

    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| c.id != user.id && seen.insert(c.id));
    Ok(candidates)
}
