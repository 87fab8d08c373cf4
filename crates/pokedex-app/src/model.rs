// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::ids::*;

pub const DEFAULT_CATALOG_SIZE: usize = 1300;
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntrySummary {
    pub id: CatalogId,
    pub name: String,
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseStat {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntryDetail {
    pub id: CatalogId,
    pub name: String,
    pub height: i64,
    pub weight: i64,
    pub abilities: Vec<String>,
    pub moves: Vec<String>,
    pub stats: Vec<BaseStat>,
    pub types: Vec<String>,
}

impl CatalogEntryDetail {
    pub fn summary(&self) -> CatalogEntrySummary {
        CatalogEntrySummary {
            id: self.id,
            name: self.name.clone(),
            types: self.types.clone(),
        }
    }

    pub fn stat(&self, name: &str) -> Option<i64> {
        self.stats
            .iter()
            .find(|stat| stat.name == name)
            .map(|stat| stat.value)
    }
}

/// A persisted capture. The serialized field order and names are the slot
/// layout on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedEntry {
    pub id: CatalogId,
    pub name: String,
    pub nickname: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCapture {
    pub id: CatalogId,
    pub name: String,
    pub nickname: String,
}

impl NewCapture {
    pub fn into_entry(self) -> CapturedEntry {
        CapturedEntry {
            id: self.id,
            name: self.name,
            nickname: self.nickname,
        }
    }
}

/// A captured entry joined back to the catalog by name. `types` is empty when
/// the catalog lookup failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRow {
    pub entry: CapturedEntry,
    pub types: Vec<String>,
}

/// Read-only access to the remote catalog.
pub trait CatalogSource {
    /// Entries in ascending id order, windowed by `offset`/`limit`.
    fn list_page(&self, offset: usize, limit: usize) -> Result<Vec<CatalogEntrySummary>>;

    /// Case-insensitive lookup. `Ok(None)` when the name is unknown.
    fn get_detail(&self, name: &str) -> Result<Option<CatalogEntryDetail>>;
}

pub fn nicknames_equal(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}
