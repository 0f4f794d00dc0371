//! Contracts of the external collaborators the core reads from. The
//! editorial workbench owns the data; this layer only looks things up.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::item::NewsItem;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub filename: String,
    pub mimetype: String,
    /// Blob store id of the file body.
    pub media: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentProfile {
    pub id: String,
    pub label: String,
}

/// Stored blob plus its side metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaBlob {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl MediaBlob {
    /// The stored length, wherever the store put it.
    pub fn size(&self) -> Option<u64> {
        self.length.or_else(|| {
            self.metadata
                .get("length")
                .and_then(|v| v.as_u64().or_else(|| v.as_str()?.parse().ok()))
        })
    }
}

#[async_trait]
pub trait ArchiveRepository: Send + Sync {
    async fn find_one(&self, id: &str) -> Result<Option<NewsItem>>;

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<NewsItem>>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user(&self, id: &str) -> Result<Option<User>>;

    async fn role(&self, id: &str) -> Result<Option<Role>>;
}

#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Attachment>>;
}

#[async_trait]
pub trait ContentProfiles: Send + Sync {
    async fn find_one(&self, id: &str) -> Result<Option<ContentProfile>>;
}

#[async_trait]
pub trait SequenceAllocator: Send + Sync {
    /// Next outbound sequence number for a subscriber.
    async fn next_sequence(&self, subscriber: &str) -> Result<u64>;
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store a blob and return its id. Idempotent on content.
    async fn put(
        &self,
        content: Vec<u8>,
        filename: &str,
        content_type: &str,
    ) -> Result<String>;

    async fn get(&self, media_id: &str) -> Result<Option<MediaBlob>>;

    fn url_for_media(&self, media_id: &str, content_type: &str) -> String;
}

#[cfg(any(test, feature = "test-support"))]
pub mod testing {
    //! In-memory doubles for the collaborator traits.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryArchive {
        items: Mutex<HashMap<String, NewsItem>>,
    }

    impl InMemoryArchive {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, item: NewsItem) {
            if let Ok(mut items) = self.items.lock() {
                items.insert(item.id.clone(), item);
            }
        }

        pub fn with_items(items: impl IntoIterator<Item = NewsItem>) -> Self {
            let archive = Self::new();
            for item in items {
                archive.insert(item);
            }
            archive
        }
    }

    #[async_trait]
    impl ArchiveRepository for InMemoryArchive {
        async fn find_one(&self, id: &str) -> Result<Option<NewsItem>> {
            Ok(self
                .items
                .lock()
                .ok()
                .and_then(|items| items.get(id).cloned()))
        }

        async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<NewsItem>> {
            let items = match self.items.lock() {
                Ok(items) => items,
                Err(_) => return Ok(Vec::new()),
            };
            Ok(ids.iter().filter_map(|id| items.get(id).cloned()).collect())
        }
    }

    #[derive(Default)]
    pub struct InMemoryUsers {
        users: HashMap<String, User>,
        roles: HashMap<String, Role>,
    }

    impl InMemoryUsers {
        pub fn with(users: Vec<User>, roles: Vec<Role>) -> Self {
            Self {
                users: users.into_iter().map(|u| (u.id.clone(), u)).collect(),
                roles: roles.into_iter().map(|r| (r.id.clone(), r)).collect(),
            }
        }
    }

    #[async_trait]
    impl UserDirectory for InMemoryUsers {
        async fn user(&self, id: &str) -> Result<Option<User>> {
            Ok(self.users.get(id).cloned())
        }

        async fn role(&self, id: &str) -> Result<Option<Role>> {
            Ok(self.roles.get(id).cloned())
        }
    }

    #[derive(Default)]
    pub struct InMemoryAttachments {
        attachments: HashMap<String, Attachment>,
    }

    impl InMemoryAttachments {
        pub fn with(attachments: Vec<Attachment>) -> Self {
            Self {
                attachments: attachments
                    .into_iter()
                    .map(|a| (a.id.clone(), a))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl AttachmentStore for InMemoryAttachments {
        async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Attachment>> {
            Ok(ids
                .iter()
                .filter_map(|id| self.attachments.get(id).cloned())
                .collect())
        }
    }

    #[derive(Default)]
    pub struct InMemoryProfiles {
        profiles: HashMap<String, ContentProfile>,
    }

    impl InMemoryProfiles {
        pub fn with(profiles: Vec<ContentProfile>) -> Self {
            Self {
                profiles: profiles.into_iter().map(|p| (p.id.clone(), p)).collect(),
            }
        }
    }

    #[async_trait]
    impl ContentProfiles for InMemoryProfiles {
        async fn find_one(&self, id: &str) -> Result<Option<ContentProfile>> {
            Ok(self.profiles.get(id).cloned())
        }
    }

    /// Hands out 1, 2, 3, ... per subscriber.
    #[derive(Default)]
    pub struct CountingSequences {
        counters: Mutex<HashMap<String, u64>>,
    }

    #[async_trait]
    impl SequenceAllocator for CountingSequences {
        async fn next_sequence(&self, subscriber: &str) -> Result<u64> {
            let mut counters = match self.counters.lock() {
                Ok(counters) => counters,
                Err(poisoned) => poisoned.into_inner(),
            };
            let next = counters.entry(subscriber.to_string()).or_insert(0);
            *next += 1;
            Ok(*next)
        }
    }

    pub struct InMemoryMedia {
        blobs: Mutex<HashMap<String, MediaBlob>>,
        next_id: AtomicU64,
        prefix: String,
    }

    impl Default for InMemoryMedia {
        fn default() -> Self {
            Self {
                blobs: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                prefix: "http://localhost/media".to_string(),
            }
        }
    }

    impl InMemoryMedia {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&self, media_id: &str, blob: MediaBlob) {
            if let Ok(mut blobs) = self.blobs.lock() {
                blobs.insert(media_id.to_string(), blob);
            }
        }
    }

    #[async_trait]
    impl MediaStore for InMemoryMedia {
        async fn put(
            &self,
            content: Vec<u8>,
            _filename: &str,
            content_type: &str,
        ) -> Result<String> {
            let id = format!("media-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            self.insert(
                &id,
                MediaBlob {
                    length: Some(content.len() as u64),
                    metadata: HashMap::new(),
                    content_type: Some(content_type.to_string()),
                },
            );
            Ok(id)
        }

        async fn get(&self, media_id: &str) -> Result<Option<MediaBlob>> {
            Ok(self
                .blobs
                .lock()
                .ok()
                .and_then(|blobs| blobs.get(media_id).cloned()))
        }

        fn url_for_media(&self, media_id: &str, _content_type: &str) -> String {
            format!("{}/{}", self.prefix, media_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::item::ItemType;

    #[tokio::test]
    async fn archive_double_finds_by_ids_in_request_order() {
        let archive = InMemoryArchive::with_items(vec![
            NewsItem::with_guid(ItemType::Text, "a"),
            NewsItem::with_guid(ItemType::Text, "b"),
        ]);
        let found = archive
            .find_by_ids(&["b".to_string(), "missing".to_string(), "a".to_string()])
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn sequences_are_per_subscriber() {
        let sequences = CountingSequences::default();
        assert_eq!(sequences.next_sequence("alpha").await.unwrap(), 1);
        assert_eq!(sequences.next_sequence("alpha").await.unwrap(), 2);
        assert_eq!(sequences.next_sequence("beta").await.unwrap(), 1);
    }

    #[test]
    fn blob_size_falls_back_to_metadata() {
        let mut blob = MediaBlob::default();
        assert_eq!(blob.size(), None);
        blob.metadata
            .insert("length".to_string(), serde_json::json!(42));
        assert_eq!(blob.size(), Some(42));
        blob.length = Some(7);
        assert_eq!(blob.size(), Some(7));
    }
}
