use tokio::sync::Mutex;

use crate::foundation::error::ComposerResult;

/// A previously produced image kept for reuse.
#[derive(Clone, Debug, PartialEq)]
pub struct GalleryItem {
    pub id: String,
    /// PNG as a `data:` URI, usable directly as an image layer source.
    pub data_uri: String,
    pub metadata: Option<serde_json::Value>,
}

impl GalleryItem {
    pub fn new(data_uri: String, metadata: Option<serde_json::Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            data_uri,
            metadata,
        }
    }
}

/// Store of exported and generated images, newest first.
#[async_trait::async_trait]
pub trait Gallery: Send + Sync {
    async fn add(&self, item: GalleryItem) -> ComposerResult<()>;
    async fn list(&self) -> ComposerResult<Vec<GalleryItem>>;
    async fn get(&self, id: &str) -> ComposerResult<Option<GalleryItem>>;
}

#[derive(Debug, Default)]
pub struct InMemoryGallery {
    items: Mutex<Vec<GalleryItem>>,
}

impl InMemoryGallery {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Gallery for InMemoryGallery {
    async fn add(&self, item: GalleryItem) -> ComposerResult<()> {
        self.items.lock().await.insert(0, item);
        Ok(())
    }

    async fn list(&self) -> ComposerResult<Vec<GalleryItem>> {
        Ok(self.items.lock().await.clone())
    }

    async fn get(&self, id: &str) -> ComposerResult<Option<GalleryItem>> {
        Ok(self.items.lock().await.iter().find(|i| i.id == id).cloned())
    }
}
