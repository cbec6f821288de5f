//! Extracted-component storage seam.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use stylepress_shared::{ExtractedComponent, Result};

/// Read access to the extracted-component sets captured per brand.
///
/// Snapshots are immutable once captured; `get_all` returns a copy the
/// composer can hold without coordinating with writers.
#[async_trait]
pub trait ComponentStore: Send + Sync {
    async fn get_all(&self, brand_id: &str) -> Result<Vec<ExtractedComponent>>;
}

/// In-memory store, used by tests and single-run invocations where the
/// component set is supplied directly.
#[derive(Debug, Default)]
pub struct InMemoryComponentStore {
    brands: RwLock<HashMap<String, Vec<ExtractedComponent>>>,
}

impl InMemoryComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, brand_id: impl Into<String>, component: ExtractedComponent) {
        self.brands
            .write()
            .expect("store lock")
            .entry(brand_id.into())
            .or_default()
            .push(component);
    }
}

#[async_trait]
impl ComponentStore for InMemoryComponentStore {
    async fn get_all(&self, brand_id: &str) -> Result<Vec<ExtractedComponent>> {
        Ok(self
            .brands
            .read()
            .expect("store lock")
            .get(brand_id)
            .cloned()
            .unwrap_or_default())
    }
}
