// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::model::{CapturedEntry, CatalogSource, CollectionRow, NewCapture, nicknames_equal};

/// Keyed access to the captured collection. Nicknames are the key and are
/// unique ignoring case.
pub trait CollectionStore {
    fn list_all(&self) -> Result<Vec<CapturedEntry>>;

    /// Inserts the capture unless its nickname collides with an existing
    /// one, in which case the store is left unchanged and `false` returned.
    fn add(&mut self, capture: &NewCapture) -> Result<bool>;

    /// Removes the entry with exactly this nickname. Absent nicknames are a
    /// no-op.
    fn remove(&mut self, nickname: &str) -> Result<()>;

    fn get(&self, nickname: &str) -> Result<Option<CapturedEntry>> {
        Ok(self
            .list_all()?
            .into_iter()
            .find(|entry| nicknames_equal(&entry.nickname, nickname)))
    }

    fn nicknames(&self) -> Result<Vec<String>> {
        Ok(self
            .list_all()?
            .into_iter()
            .map(|entry| entry.nickname)
            .collect())
    }

    fn contains_name(&self, name: &str) -> Result<bool> {
        Ok(self.list_all()?.iter().any(|entry| entry.name == name))
    }
}

/// Applies an insert-if-unique to an in-memory list. Shared by every store
/// that keeps the collection as one array.
pub fn insert_unique(entries: &mut Vec<CapturedEntry>, capture: &NewCapture) -> bool {
    if entries
        .iter()
        .any(|entry| nicknames_equal(&entry.nickname, &capture.nickname))
    {
        return false;
    }
    entries.push(capture.clone().into_entry());
    true
}

/// Removes by exact nickname; returns whether anything was removed.
pub fn remove_exact(entries: &mut Vec<CapturedEntry>, nickname: &str) -> bool {
    let before = entries.len();
    entries.retain(|entry| entry.nickname != nickname);
    entries.len() != before
}

/// Joins captured entries back to the catalog by name. Lookups that fail or
/// miss leave the row without types.
pub fn hydrate(entries: Vec<CapturedEntry>, catalog: &dyn CatalogSource) -> Vec<CollectionRow> {
    entries
        .into_iter()
        .map(|entry| {
            let types = match catalog.get_detail(&entry.name) {
                Ok(Some(detail)) => detail.types,
                Ok(None) => {
                    tracing::warn!(name = %entry.name, "captured entry not found in catalog");
                    Vec::new()
                }
                Err(error) => {
                    tracing::warn!(name = %entry.name, error = %format!("{error:#}"), "hydrate captured entry failed");
                    Vec::new()
                }
            };
            CollectionRow { entry, types }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryCollection {
    entries: Vec<CapturedEntry>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<CapturedEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[CapturedEntry] {
        &self.entries
    }
}

impl CollectionStore for MemoryCollection {
    fn list_all(&self) -> Result<Vec<CapturedEntry>> {
        Ok(self.entries.clone())
    }

    fn add(&mut self, capture: &NewCapture) -> Result<bool> {
        Ok(insert_unique(&mut self.entries, capture))
    }

    fn remove(&mut self, nickname: &str) -> Result<()> {
        remove_exact(&mut self.entries, nickname);
        Ok(())
    }
}
