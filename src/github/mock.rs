//! Mock tag store for exercising the release flow without network calls.

use super::{TagRef, TagStore};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::sync::Mutex;

/// A tag store backed by a preset tag list, recording every creation.
pub struct MockTagStore {
    tags: Vec<TagRef>,
    created: Mutex<Vec<(String, String)>>,
    create_error: Option<String>,
}

impl MockTagStore {
    pub fn new() -> Self {
        Self {
            tags: Vec::new(),
            created: Mutex::new(Vec::new()),
            create_error: None,
        }
    }

    /// Add an existing tag pointing at the given commit.
    pub fn with_tag(mut self, name: &str, commit: &str) -> Self {
        self.tags.push(TagRef {
            name: name.to_string(),
            commit: commit.to_string(),
        });
        self
    }

    /// Make every creation attempt fail with the given message.
    pub fn with_create_error(mut self, message: &str) -> Self {
        self.create_error = Some(message.to_string());
        self
    }

    /// Tags created so far, as (name, commit) pairs.
    pub fn created(&self) -> Vec<(String, String)> {
        self.created.lock().unwrap().clone()
    }
}

impl Default for MockTagStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TagStore for MockTagStore {
    async fn list_tags(&self) -> Result<Vec<TagRef>> {
        Ok(self.tags.clone())
    }

    async fn create_tag(&self, tag_name: &str, commit_sha: &str) -> Result<()> {
        if let Some(message) = &self.create_error {
            return Err(anyhow!("{}", message));
        }

        self.created
            .lock()
            .unwrap()
            .push((tag_name.to_string(), commit_sha.to_string()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_store_lists_preset_tags() {
        let store = MockTagStore::new()
            .with_tag("v1.0.0", "aaa")
            .with_tag("v1.1.0", "bbb");

        let tags = store.list_tags().await.unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "v1.0.0");
        assert_eq!(tags[1].commit, "bbb");
    }

    #[tokio::test]
    async fn test_mock_store_records_creations() {
        let store = MockTagStore::new();
        store.create_tag("v0.1.0", "ccc").await.unwrap();

        assert_eq!(
            store.created(),
            vec![("v0.1.0".to_string(), "ccc".to_string())]
        );
    }

    #[tokio::test]
    async fn test_mock_store_injected_failure() {
        let store = MockTagStore::new().with_create_error("Reference already exists");

        let err = store.create_tag("v0.1.0", "ccc").await.unwrap_err();
        assert_eq!(err.to_string(), "Reference already exists");
        assert!(store.created().is_empty());
    }
}
