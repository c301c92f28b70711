use crate::types::OutputFormat;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub document_number: String,
    pub language: String,
    pub output_kind: OutputFormat,
}

impl CacheKey {
    pub fn new(document_number: &str, language: &str, output_kind: OutputFormat) -> Self {
        Self {
            document_number: document_number.to_string(),
            language: language.to_string(),
            output_kind,
        }
    }
}

/// Payload cache wrapped around register access. A miss is always
/// equivalent to a direct call.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Option<Vec<u8>>;
    async fn put(&self, key: CacheKey, payload: Vec<u8>);
}

pub struct NoCache;

#[async_trait]
impl ResponseCache for NoCache {
    async fn get(&self, _key: &CacheKey) -> Option<Vec<u8>> {
        None
    }

    async fn put(&self, _key: CacheKey, _payload: Vec<u8>) {}
}

#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Option<Vec<u8>> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    async fn put(&self, key: CacheKey, payload: Vec<u8>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, payload);
        }
    }
}
