//! Session memory store
//!
//! Email → UserRecord map with non-destructive merge. Nothing is persisted;
//! the map lives as long as the process.

use crate::models::UserRecord;
use crate::Result;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Trait for the per-process user memory
#[async_trait::async_trait]
pub trait SessionMemory: Send + Sync {
    /// Create or merge the record for `email` and return the stored result.
    ///
    /// A field is only overwritten by a non-blank value; it is never cleared.
    async fn upsert(&self, email: &str, name: Option<&str>, notes: Option<&str>) -> Result<UserRecord>;

    /// All known records, ordered by email.
    async fn lookup_all(&self) -> Result<Vec<(String, UserRecord)>>;

    /// Text block injected into the system instruction (empty when nothing is known)
    async fn formatted_details(&self) -> Result<String> {
        let records = self.lookup_all().await?;
        Ok(format_user_details(&records))
    }
}

/// In-memory store shared by every conversation in the process
pub struct InMemorySessionStore {
    users: Arc<RwLock<BTreeMap<String, UserRecord>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn supplied(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait::async_trait]
impl SessionMemory for InMemorySessionStore {

    async fn upsert(&self, email: &str, name: Option<&str>, notes: Option<&str>) -> Result<UserRecord> {
        // Held across the whole read-merge-write.
        let mut users = self.users.write().await;

        let created = !users.contains_key(email);
        let record = users.entry(email.to_string()).or_default();

        if let Some(name) = supplied(name) {
            record.name = name.to_string();
        }
        if let Some(notes) = supplied(notes) {
            record.notes = notes.to_string();
        }

        debug!(email = %email, created, "Session memory updated");

        Ok(record.clone())
    }

    async fn lookup_all(&self) -> Result<Vec<(String, UserRecord)>> {
        let users = self.users.read().await;

        Ok(users
            .iter()
            .map(|(email, record)| (email.clone(), record.clone()))
            .collect())
    }
}

/// Render records as one `Email: .., Name: .., Notes: ..` line each
pub fn format_user_details(records: &[(String, UserRecord)]) -> String {
    let mut details = String::new();

    for (email, record) in records {
        details.push_str(&format!(
            "Email: {}, Name: {}, Notes: {}\n",
            email, record.name, record.notes
        ));
    }

    details
}
