//! In-process object store
//!
//! A `BTreeMap`-backed [`IObjectStore`] used as a test double by the
//! backend and engine tests. Keys come back in sorted order and the page
//! size is configurable so pagination paths get exercised with small
//! fixtures.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;

use mirrorsync_core::error::{StoreError, StoreResult};
use mirrorsync_core::ports::object_store::{IObjectStore, ObjectMeta};

const DEFAULT_PAGE_SIZE: usize = 1000;

/// Object store held entirely in memory.
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    page_size: usize,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Overrides the listing page size (tests use small values to force
    /// multiple pagination rounds).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Seeds an object directly, bypassing the trait surface.
    pub fn insert_object(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.objects.lock().unwrap().insert(key.into(), data.into());
    }

    /// Reads an object directly for assertions.
    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    /// All keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IObjectStore for InMemoryObjectStore {
    async fn get(&self, key: &str) -> StoreResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key))
    }

    async fn download(&self, key: &str, dest: &Path) -> StoreResult<()> {
        let data = self.get(key).await?;
        tokio::fs::write(dest, data)
            .await
            .map_err(|err| StoreError::transient(format!("write {}: {err}", dest.display())))
    }

    async fn upload(&self, key: &str, src: &Path) -> StoreResult<()> {
        let data = tokio::fs::read(src)
            .await
            .map_err(|err| StoreError::transient(format!("read {}: {err}", src.display())))?;
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn upload_bytes(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        match self.objects.lock().unwrap().remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(key)),
        }
    }

    async fn list_page(
        &self,
        prefix: Option<&str>,
        marker: Option<&str>,
    ) -> StoreResult<Vec<String>> {
        let objects = self.objects.lock().unwrap();
        let page = objects
            .keys()
            .filter(|key| marker.map_or(true, |m| key.as_str() > m))
            .filter(|key| prefix.map_or(true, |p| key.starts_with(p)))
            .take(self.page_size)
            .cloned()
            .collect();
        Ok(page)
    }

    async fn head(&self, key: &str) -> StoreResult<ObjectMeta> {
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .map(|data| ObjectMeta {
                size: data.len() as u64,
            })
            .ok_or_else(|| StoreError::not_found(key))
    }
}
