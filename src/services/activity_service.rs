use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::directory::{EntityDirectory, UserRef};
use crate::error::Result;
use crate::models::audit_event::AuditEvent;
use crate::store::AuditStore;

pub const DEFAULT_FETCH_LIMIT: i64 = 40;
pub const DEFAULT_FEED_SIZE: usize = 10;

const TRUNCATED_DETAILS_LEN: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// Renders recent audit events into a deduplicated human-readable feed.
///
/// Entity names are resolved through the directory when the referenced
/// record still exists; otherwise the label is reconstructed from the
/// free-text `details` the recorder stored at write time. Extraction is
/// a heuristic fallback, an ordered list of patterns that degrade to a
/// truncated raw rendering, so a feed entry is always produced.
#[derive(Clone)]
pub struct ActivityService {
    store: Arc<dyn AuditStore>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub async fn build_feed(
        &self,
        limit: i64,
        feed_size: usize,
        directory: &dyn EntityDirectory,
    ) -> Result<Vec<ActivityEntry>> {
        let events = self.store.recent(limit).await?;
        let survivors = dedupe_latest(events, feed_size);

        let user_ids = distinct_entity_ids(&survivors, "User");
        let sitio_ids = distinct_entity_ids(&survivors, "Sitio");

        let users = match directory.lookup_users(&user_ids).await {
            Ok(map) => map,
            Err(e) => {
                warn!(error = ?e, "user directory lookup failed, falling back to details text");
                HashMap::new()
            }
        };
        let sitios = match directory.lookup_sitios(&sitio_ids).await {
            Ok(map) => map,
            Err(e) => {
                warn!(error = ?e, "sitio directory lookup failed, falling back to details text");
                HashMap::new()
            }
        };

        Ok(survivors
            .into_iter()
            .map(|event| ActivityEntry {
                timestamp: event.event_time,
                description: describe(&event, &users, &sitios),
            })
            .collect())
    }
}

/// Collapse repeated identical `(action, details)` lines to the most
/// recent occurrence, newest first, capped at `feed_size`.
fn dedupe_latest(events: Vec<AuditEvent>, feed_size: usize) -> Vec<AuditEvent> {
    let mut latest: HashMap<(String, String), AuditEvent> = HashMap::new();
    for event in events {
        let key = (event.action.clone(), event.details.clone());
        let keep = match latest.get(&key) {
            Some(kept) => kept.event_time < event.event_time,
            None => true,
        };
        if keep {
            latest.insert(key, event);
        }
    }

    let mut survivors: Vec<AuditEvent> = latest.into_values().collect();
    survivors.sort_by(|a, b| {
        b.event_time
            .cmp(&a.event_time)
            .then_with(|| b.id.cmp(&a.id))
    });
    survivors.truncate(feed_size);
    survivors
}

fn distinct_entity_ids(events: &[AuditEvent], entity_type: &str) -> Vec<String> {
    events
        .iter()
        .filter(|e| e.entity_type.as_deref() == Some(entity_type))
        .filter_map(|e| e.entity_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn describe(
    event: &AuditEvent,
    users: &HashMap<String, UserRef>,
    sitios: &HashMap<String, String>,
) -> String {
    match event.entity_type.as_deref() {
        Some("User") => {
            let label = event
                .entity_id
                .as_ref()
                .and_then(|id| users.get(id))
                .map(user_label)
                .or_else(|| extract_user_label(&event.details))
                .unwrap_or_else(|| truncated_details(&event.details));
            user_line(&event.action, &label, &event.details)
        }
        Some("Sitio") => {
            let name = event
                .entity_id
                .as_ref()
                .and_then(|id| sitios.get(id))
                .cloned()
                .or_else(|| extract_sitio_name(&event.details))
                .or_else(|| {
                    event
                        .entity_id
                        .as_deref()
                        .and_then(|id| id.parse::<i64>().ok())
                        .map(|n| format!("#{}", n))
                })
                .or_else(|| event.entity_id.as_deref().map(short_id))
                .unwrap_or_else(|| truncated_details(&event.details));
            sitio_line(&event.action, &name)
        }
        _ => generic_line(&event.action, &event.details),
    }
}

fn user_label(user: &UserRef) -> String {
    let name = user.display_name.trim();
    if !name.is_empty() {
        name.to_string()
    } else if let Some(n) = user.user_number {
        format!("User #{}", n)
    } else {
        user.display_name.clone()
    }
}

fn user_line(action: &str, label: &str, details: &str) -> String {
    let action_lc = action.to_ascii_lowercase();
    if action_lc.contains("create") {
        format!("➕ New User Added: {}", label)
    } else if action_lc.contains("delete") {
        format!("🗑️ Deleted user: {}", label)
    } else if action_lc.contains("edit") {
        format!("✏️ Edited user: {}", label)
    } else if action_lc.contains("deactivate") {
        // "deactivate" must match before "activate", which it contains.
        format!("🔒 Deactivated user: {}", label)
    } else if action_lc.contains("activate") {
        format!("🔓 Activated user: {}", label)
    } else if details.trim().is_empty() {
        format!("{}: {}", action, label)
    } else {
        format!("{}: {} - {}", action, label, details)
    }
}

fn sitio_line(action: &str, name: &str) -> String {
    let action_lc = action.to_ascii_lowercase();
    if action_lc.contains("create") {
        format!("➕ Created sitio '{}'", name)
    } else if action_lc.contains("delete") {
        format!("🗑️ Deleted sitio '{}'", name)
    } else if action_lc.contains("edit") {
        format!("✏️ Edited sitio '{}'", name)
    } else {
        format!("{}: {}", action, name)
    }
}

fn generic_line(action: &str, details: &str) -> String {
    if details.trim().is_empty() {
        return action.to_string();
    }
    let action_lc = action.to_ascii_lowercase();
    if action_lc.contains("create") {
        format!("➕ {}", details)
    } else if action_lc.contains("delete") {
        format!("🗑️ {}", details)
    } else if action_lc.contains("edit") {
        format!("✏️ {}", details)
    } else if action_lc.contains("deactivate") {
        format!("🔒 {}", details)
    } else if action_lc.contains("activate") {
        format!("🔓 {}", details)
    } else {
        format!("{}: {}", action, details)
    }
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email regex is valid")
});
static QUOTED_USER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)user\s+'([^']+)'").expect("quoted user regex is valid"));
static NAMED_USER_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Name runs from after "user" to the next bookkeeping marker.
    Regex::new(r"(?i)user:?\s+(.+?)\s*(?:\(Id:|Successfully|Deleted|$)")
        .expect("named user regex is valid")
});
static SITIO_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:created|deleted|edited)\s+sitio\s+'([^']+)'")
        .expect("sitio name regex is valid")
});
static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'([^']+)'").expect("quoted regex is valid"));
static ID_DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bId:\s*(\d+)").expect("id digits regex is valid"));
static HEX_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9a-fA-F]{8,}\b").expect("hex token regex is valid"));

/// Best-effort reconstruction of a user label from `details`, used when
/// the referenced user no longer exists. First pattern wins.
fn extract_user_label(details: &str) -> Option<String> {
    if let Some(m) = EMAIL_RE.find(details) {
        return Some(m.as_str().to_string());
    }
    if let Some(c) = QUOTED_USER_RE.captures(details) {
        return Some(c[1].trim().to_string());
    }
    if let Some(c) = NAMED_USER_RE.captures(details) {
        let name = c[1].trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
    if let Some(c) = SITIO_NAME_RE.captures(details) {
        return Some(c[1].to_string());
    }
    if let Some(c) = ID_DIGITS_RE.captures(details) {
        return Some(format!("#{}", &c[1]));
    }
    if let Some(m) = HEX_TOKEN_RE.find(details) {
        return Some(m.as_str().chars().take(8).collect());
    }
    None
}

fn extract_sitio_name(details: &str) -> Option<String> {
    if let Some(c) = SITIO_NAME_RE.captures(details) {
        return Some(c[1].to_string());
    }
    if let Some(c) = QUOTED_RE.captures(details) {
        return Some(c[1].to_string());
    }
    None
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

fn truncated_details(details: &str) -> String {
    let trimmed = details.trim();
    if trimmed.chars().count() > TRUNCATED_DETAILS_LEN {
        format!(
            "{}...",
            trimmed
                .chars()
                .take(TRUNCATED_DETAILS_LEN)
                .collect::<String>()
        )
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::MockEntityDirectory;
    use crate::models::audit_event::NewAuditEvent;
    use crate::store::memory::MemoryAuditStore;
    use crate::store::AuditStore;
    use chrono::Duration;

    fn empty_directory() -> MockEntityDirectory {
        let mut directory = MockEntityDirectory::new();
        directory
            .expect_lookup_users()
            .returning(|_| Ok(HashMap::new()));
        directory
            .expect_lookup_sitios()
            .returning(|_| Ok(HashMap::new()));
        directory
    }

    async fn seed(
        store: &MemoryAuditStore,
        action: &str,
        details: &str,
        entity: Option<(&str, &str)>,
        age_minutes: i64,
    ) {
        store
            .insert(NewAuditEvent {
                event_time: Utc::now() - Duration::minutes(age_minutes),
                performed_by_user_id: None,
                action: action.to_string(),
                details: details.to_string(),
                entity_type: entity.map(|(t, _)| t.to_string()),
                entity_id: entity.map(|(_, id)| id.to_string()),
                metadata: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn feed_dedups_identical_lines_keeping_the_latest() {
        let store = Arc::new(MemoryAuditStore::new());
        seed(&store, "CreateSitio", "Created sitio 'Riverside'", None, 30).await;
        seed(&store, "CreateSitio", "Created sitio 'Riverside'", None, 5).await;
        seed(&store, "DeleteSitio", "Deleted sitio 'Hilltop'", None, 10).await;

        let service = ActivityService::new(store);
        let feed = service
            .build_feed(40, 10, &empty_directory())
            .await
            .unwrap();

        assert_eq!(feed.len(), 2);
        // The surviving duplicate is the 5-minute-old one, so it sorts first.
        assert_eq!(feed[0].description, "➕ Created sitio 'Riverside'");
        assert_eq!(feed[1].description, "🗑️ Deleted sitio 'Hilltop'");
        assert!(feed[0].timestamp > feed[1].timestamp);
    }

    #[tokio::test]
    async fn feed_is_capped_at_feed_size() {
        let store = Arc::new(MemoryAuditStore::new());
        for i in 0..6 {
            seed(
                &store,
                "CreateSitio",
                &format!("Created sitio 'S{}'", i),
                None,
                i,
            )
            .await;
        }

        let service = ActivityService::new(store);
        let feed = service.build_feed(40, 3, &empty_directory()).await.unwrap();
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].description, "➕ Created sitio 'S0'");
    }

    #[tokio::test]
    async fn feed_only_considers_the_fetch_window() {
        let store = Arc::new(MemoryAuditStore::new());
        seed(&store, "A", "first", None, 3).await;
        seed(&store, "B", "second", None, 2).await;
        seed(&store, "C", "third", None, 1).await;

        let service = ActivityService::new(store);
        let feed = service.build_feed(2, 10, &empty_directory()).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].description, "C: third");
        assert_eq!(feed[1].description, "B: second");
    }

    #[tokio::test]
    async fn deactivate_is_never_rendered_as_activated() {
        let store = Arc::new(MemoryAuditStore::new());
        seed(
            &store,
            "DeactivateUser",
            "Deactivated user Maria (Id: 3)",
            Some(("User", "u-3")),
            1,
        )
        .await;

        let service = ActivityService::new(store);
        let feed = service
            .build_feed(40, 10, &empty_directory())
            .await
            .unwrap();

        assert_eq!(feed[0].description, "🔒 Deactivated user: Maria");
        assert!(!feed[0].description.contains("🔓"));
    }

    #[tokio::test]
    async fn directory_hit_uses_the_display_name() {
        let store = Arc::new(MemoryAuditStore::new());
        seed(
            &store,
            "CreateUser",
            "Created user Juan Dela Cruz (Id: 42)",
            Some(("User", "42")),
            1,
        )
        .await;

        let mut directory = MockEntityDirectory::new();
        directory.expect_lookup_users().returning(|ids| {
            assert_eq!(ids, ["42".to_string()]);
            Ok(HashMap::from([(
                "42".to_string(),
                UserRef {
                    display_name: "Juan Dela Cruz".to_string(),
                    user_number: Some(42),
                },
            )]))
        });
        directory
            .expect_lookup_sitios()
            .returning(|_| Ok(HashMap::new()));

        let service = ActivityService::new(store);
        let feed = service.build_feed(40, 10, &directory).await.unwrap();
        assert_eq!(feed[0].description, "➕ New User Added: Juan Dela Cruz");
    }

    #[tokio::test]
    async fn directory_miss_recovers_the_name_from_details() {
        let store = Arc::new(MemoryAuditStore::new());
        seed(
            &store,
            "CreateUser",
            "Created user Juan Dela Cruz (Id: 42)",
            Some(("User", "42")),
            1,
        )
        .await;

        let service = ActivityService::new(store);
        let feed = service
            .build_feed(40, 10, &empty_directory())
            .await
            .unwrap();
        assert_eq!(feed[0].description, "➕ New User Added: Juan Dela Cruz");
    }

    #[tokio::test]
    async fn email_in_details_wins_over_other_patterns() {
        let store = Arc::new(MemoryAuditStore::new());
        seed(
            &store,
            "DeleteUser",
            "Deleted user juan@example.com (Id: 42)",
            Some(("User", "42")),
            1,
        )
        .await;

        let service = ActivityService::new(store);
        let feed = service
            .build_feed(40, 10, &empty_directory())
            .await
            .unwrap();
        assert_eq!(feed[0].description, "🗑️ Deleted user: juan@example.com");
    }

    #[tokio::test]
    async fn hex_token_is_shortened_to_eight_chars() {
        let store = Arc::new(MemoryAuditStore::new());
        seed(
            &store,
            "DeleteUser",
            "Removed account 3f9a2b7c41d2e8aa",
            Some(("User", "3f9a2b7c41d2e8aa")),
            1,
        )
        .await;

        let service = ActivityService::new(store);
        let feed = service
            .build_feed(40, 10, &empty_directory())
            .await
            .unwrap();
        assert_eq!(feed[0].description, "🗑️ Deleted user: 3f9a2b7c");
    }

    #[tokio::test]
    async fn unmatched_details_fall_back_to_truncation() {
        let store = Arc::new(MemoryAuditStore::new());
        let long = "x".repeat(60);
        seed(&store, "DeleteUser", &long, Some(("User", "gone")), 1).await;

        let service = ActivityService::new(store);
        let feed = service
            .build_feed(40, 10, &empty_directory())
            .await
            .unwrap();
        assert_eq!(
            feed[0].description,
            format!("🗑️ Deleted user: {}...", "x".repeat(50))
        );
    }

    #[tokio::test]
    async fn sitio_directory_hit_and_quoted_fallback() {
        let store = Arc::new(MemoryAuditStore::new());
        seed(
            &store,
            "DeleteSitio",
            "Deleted sitio 'Riverside'",
            Some(("Sitio", "7")),
            1,
        )
        .await;
        seed(
            &store,
            "EditSitio",
            "Edited sitio 'Hilltop'",
            Some(("Sitio", "8")),
            2,
        )
        .await;

        let mut directory = MockEntityDirectory::new();
        directory
            .expect_lookup_users()
            .returning(|_| Ok(HashMap::new()));
        directory.expect_lookup_sitios().returning(|ids| {
            assert_eq!(ids, ["7".to_string(), "8".to_string()]);
            // Only sitio 7 still exists, renamed since the event.
            Ok(HashMap::from([("7".to_string(), "Riverbank".to_string())]))
        });

        let service = ActivityService::new(store);
        let feed = service.build_feed(40, 10, &directory).await.unwrap();
        assert_eq!(feed[0].description, "🗑️ Deleted sitio 'Riverbank'");
        assert_eq!(feed[1].description, "✏️ Edited sitio 'Hilltop'");
    }

    #[tokio::test]
    async fn sitio_numeric_id_fallback() {
        let store = Arc::new(MemoryAuditStore::new());
        seed(
            &store,
            "DeleteSitio",
            "Removed subdivision record",
            Some(("Sitio", "99")),
            1,
        )
        .await;

        let service = ActivityService::new(store);
        let feed = service
            .build_feed(40, 10, &empty_directory())
            .await
            .unwrap();
        assert_eq!(feed[0].description, "🗑️ Deleted sitio '#99'");
    }

    #[tokio::test]
    async fn events_without_entity_use_the_generic_line() {
        let store = Arc::new(MemoryAuditStore::new());
        seed(&store, "SystemMaintenance", "xyz occurred", None, 1).await;
        seed(&store, "EditSettings", "Changed retention window", None, 2).await;

        let service = ActivityService::new(store);
        let feed = service
            .build_feed(40, 10, &empty_directory())
            .await
            .unwrap();
        assert_eq!(feed[0].description, "SystemMaintenance: xyz occurred");
        assert_eq!(feed[1].description, "✏️ Changed retention window");
    }

    #[tokio::test]
    async fn unknown_user_action_falls_back_to_action_and_details() {
        let store = Arc::new(MemoryAuditStore::new());
        seed(
            &store,
            "ResetPassword",
            "Reset password for user Maria",
            Some(("User", "u-3")),
            1,
        )
        .await;

        let mut directory = MockEntityDirectory::new();
        directory.expect_lookup_users().returning(|_| {
            Ok(HashMap::from([(
                "u-3".to_string(),
                UserRef {
                    display_name: "Maria".to_string(),
                    user_number: Some(3),
                },
            )]))
        });
        directory
            .expect_lookup_sitios()
            .returning(|_| Ok(HashMap::new()));

        let service = ActivityService::new(store);
        let feed = service.build_feed(40, 10, &directory).await.unwrap();
        assert_eq!(
            feed[0].description,
            "ResetPassword: Maria - Reset password for user Maria"
        );
    }

    #[tokio::test]
    async fn directory_failure_degrades_to_extraction() {
        let store = Arc::new(MemoryAuditStore::new());
        seed(
            &store,
            "EditUser",
            "Edited user Maria (Id: 3)",
            Some(("User", "u-3")),
            1,
        )
        .await;

        let mut directory = MockEntityDirectory::new();
        directory
            .expect_lookup_users()
            .returning(|_| Err(crate::error::Error::Internal("directory down".to_string())));
        directory
            .expect_lookup_sitios()
            .returning(|_| Ok(HashMap::new()));

        let service = ActivityService::new(store);
        let feed = service.build_feed(40, 10, &directory).await.unwrap();
        assert_eq!(feed[0].description, "✏️ Edited user: Maria");
    }

    #[tokio::test]
    async fn empty_store_yields_empty_feed() {
        let service = ActivityService::new(Arc::new(MemoryAuditStore::new()));
        let feed = service
            .build_feed(40, 10, &empty_directory())
            .await
            .unwrap();
        assert!(feed.is_empty());
    }

    #[test]
    fn named_user_extraction_respects_boundaries() {
        assert_eq!(
            extract_user_label("Deleted user Maria Clara Successfully"),
            Some("Maria Clara".to_string())
        );
        assert_eq!(
            extract_user_label("user: pedro"),
            Some("pedro".to_string())
        );
        assert_eq!(
            extract_user_label("Created user 'Ana S.' (Id: 9)"),
            Some("Ana S.".to_string())
        );
        assert_eq!(extract_user_label("no recognizable token"), None);
    }

    #[test]
    fn id_digits_extraction() {
        assert_eq!(
            extract_user_label("Purged record Id: 512"),
            Some("#512".to_string())
        );
    }
}
