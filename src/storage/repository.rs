//! Generic entity repository for JSON storage
//!
//! One repository per entity table. Rows are kept in memory keyed by id and
//! written to `data/<entity>.json` on save, together with the id sequence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::TrailError;
use crate::models::Entity;

use super::file_io::{load_table, store_table};

/// Serializable table layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableData<T> {
    next_id: i64,
    rows: Vec<T>,
}

impl<T> Default for TableData<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: Vec::new(),
        }
    }
}

struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

/// Repository for one entity table
pub struct EntityRepository<T: Entity> {
    path: PathBuf,
    data: RwLock<Table<T>>,
}

impl<T: Entity> EntityRepository<T> {
    /// Create a new, empty repository backed by `path`
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(Table {
                rows: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load rows from disk
    pub fn load(&self) -> Result<(), TrailError> {
        let file_data: TableData<T> = load_table(T::ENTITY_TYPE, &self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.rows.clear();
        let mut max_id = 0;
        for row in file_data.rows {
            let id = row.id().ok_or_else(|| {
                TrailError::Storage(format!(
                    "{} row without id in {}",
                    T::ENTITY_TYPE,
                    self.path.display()
                ))
            })?;
            max_id = max_id.max(id);
            data.rows.insert(id, row);
        }
        data.next_id = file_data.next_id.max(max_id + 1);

        Ok(())
    }

    /// Save rows to disk
    pub fn save(&self) -> Result<(), TrailError> {
        let data = self
            .data
            .read()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let file_data = TableData {
            next_id: data.next_id,
            rows: data.rows.values().cloned().collect(),
        };

        store_table(T::ENTITY_TYPE, &self.path, &file_data)
    }

    /// Get a row by id
    pub fn get(&self, id: i64) -> Result<Option<T>, TrailError> {
        let data = self
            .data
            .read()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.rows.get(&id).cloned())
    }

    /// Get all rows, ordered by id
    pub fn get_all(&self) -> Result<Vec<T>, TrailError> {
        let data = self
            .data
            .read()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.rows.values().cloned().collect())
    }

    /// First row matching `predicate`, in id order
    pub fn find<P>(&self, predicate: P) -> Result<Option<T>, TrailError>
    where
        P: Fn(&T) -> bool,
    {
        let data = self
            .data
            .read()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.rows.values().find(|row| predicate(row)).cloned())
    }

    /// All rows matching `predicate`, in id order
    pub fn filter<P>(&self, predicate: P) -> Result<Vec<T>, TrailError>
    where
        P: Fn(&T) -> bool,
    {
        let data = self
            .data
            .read()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data
            .rows
            .values()
            .filter(|row| predicate(row))
            .cloned()
            .collect())
    }

    pub fn exists(&self, id: i64) -> Result<bool, TrailError> {
        let data = self
            .data
            .read()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.rows.contains_key(&id))
    }

    pub fn count(&self) -> Result<usize, TrailError> {
        let data = self
            .data
            .read()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.rows.len())
    }

    /// Reserve the next id from the table's sequence
    ///
    /// Ids are never handed out twice, even if the insert is rolled back.
    pub(crate) fn allocate_id(&self) -> Result<i64, TrailError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let id = data.next_id;
        data.next_id += 1;
        Ok(id)
    }

    /// Insert or replace a row, returning the row it replaced
    pub(crate) fn put(&self, row: T) -> Result<Option<T>, TrailError> {
        let id = row.id().ok_or_else(|| {
            TrailError::Storage(format!("Cannot store {} without an id", T::ENTITY_TYPE))
        })?;

        let mut data = self
            .data
            .write()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(data.rows.insert(id, row))
    }

    /// Remove a row, returning it if it existed
    pub(crate) fn remove(&self, id: i64) -> Result<Option<T>, TrailError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| TrailError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(data.rows.remove(&id))
    }
}
