//! StateStore — redb-backed persistence for the region catalog and
//! workload records.
//!
//! All values are JSON-serialized into redb's `&[u8]` value columns. The
//! store supports both on-disk and in-memory backends (the latter for
//! testing).

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
    WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(REGIONS).map_err(map_err!(Table))?;
        txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Generic helpers ────────────────────────────────────────────

    fn put<T: Serialize>(
        &self,
        table_def: TableDefinition<&str, &[u8]>,
        key: &str,
        value: &T,
    ) -> StateResult<()> {
        let value = serde_json::to_vec(value).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(table_def).map_err(map_err!(Table))?;
            table
                .insert(key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(
        &self,
        table_def: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> StateResult<Option<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_def).map_err(map_err!(Table))?;
        match table.get(key).map_err(map_err!(Read))? {
            Some(guard) => {
                let value: T =
                    serde_json::from_slice(guard.value()).map_err(map_err!(Deserialize))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Read every record in one read transaction, so callers see a
    /// single consistent snapshot of the table.
    fn list<T: DeserializeOwned>(
        &self,
        table_def: TableDefinition<&str, &[u8]>,
    ) -> StateResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_def).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (_, value) = entry.map_err(map_err!(Read))?;
            let item: T = serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
            results.push(item);
        }
        Ok(results)
    }

    fn remove(&self, table_def: TableDefinition<&str, &[u8]>, key: &str) -> StateResult<bool> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(table_def).map_err(map_err!(Table))?;
            existed = table.remove(key).map_err(map_err!(Write))?.is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(existed)
    }

    fn count(&self, table_def: TableDefinition<&str, &[u8]>) -> StateResult<u64> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(table_def).map_err(map_err!(Table))?;
        table.len().map_err(map_err!(Read))
    }

    /// Drop and recreate both tables inside `txn`.
    fn reset_tables(txn: &WriteTransaction) -> StateResult<()> {
        txn.delete_table(REGIONS).map_err(map_err!(Table))?;
        txn.delete_table(WORKLOADS).map_err(map_err!(Table))?;
        txn.open_table(REGIONS).map_err(map_err!(Table))?;
        txn.open_table(WORKLOADS).map_err(map_err!(Table))?;
        Ok(())
    }

    fn write_regions(txn: &WriteTransaction, encoded: &[(&str, Vec<u8>)]) -> StateResult<()> {
        let mut table = txn.open_table(REGIONS).map_err(map_err!(Table))?;
        for (key, value) in encoded {
            table
                .insert(*key, value.as_slice())
                .map_err(map_err!(Write))?;
        }
        Ok(())
    }

    // ── Regions ────────────────────────────────────────────────────

    /// Insert or update a region. Rejects records that break catalog invariants.
    pub fn put_region(&self, region: &Region) -> StateResult<()> {
        region.validate()?;
        self.put(REGIONS, &region.region_id, region)?;
        debug!(region = %region.region_id, active = region.is_active, "region stored");
        Ok(())
    }

    /// Insert or update a batch of regions in a single write transaction.
    ///
    /// Nothing is written unless every region is valid and every id in the
    /// batch is distinct.
    pub fn put_regions(&self, regions: &[Region]) -> StateResult<()> {
        let encoded = encode_regions(regions)?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        Self::write_regions(&txn, &encoded)?;
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(count = encoded.len(), "region batch stored");
        Ok(())
    }

    /// Drop every record and store `regions` as the new catalog, atomically.
    /// A rejected batch leaves the store untouched.
    pub fn replace_regions(&self, regions: &[Region]) -> StateResult<()> {
        let encoded = encode_regions(regions)?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        Self::reset_tables(&txn)?;
        Self::write_regions(&txn, &encoded)?;
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(count = encoded.len(), "region catalog replaced");
        Ok(())
    }

    /// Get a region by identifier.
    pub fn get_region(&self, region_id: &str) -> StateResult<Option<Region>> {
        self.get(REGIONS, region_id)
    }

    /// List all regions, ordered by identifier.
    pub fn list_regions(&self) -> StateResult<Vec<Region>> {
        self.list(REGIONS)
    }

    /// List regions whose active flag is set, ordered by identifier.
    pub fn list_active_regions(&self) -> StateResult<Vec<Region>> {
        let mut regions = self.list_regions()?;
        regions.retain(|r| r.is_active);
        Ok(regions)
    }

    /// Delete a region by identifier. Returns true if it existed.
    pub fn delete_region(&self, region_id: &str) -> StateResult<bool> {
        let existed = self.remove(REGIONS, region_id)?;
        debug!(region = %region_id, existed, "region deleted");
        Ok(existed)
    }

    pub fn count_regions(&self) -> StateResult<u64> {
        self.count(REGIONS)
    }

    // ── Workloads ──────────────────────────────────────────────────

    /// Insert or update a workload record.
    pub fn put_workload(&self, record: &WorkloadRecord) -> StateResult<()> {
        self.put(WORKLOADS, &record.workload_id, record)?;
        debug!(workload = %record.workload_id, status = %record.status, "workload stored");
        Ok(())
    }

    /// Get a workload by identifier.
    pub fn get_workload(&self, workload_id: &str) -> StateResult<Option<WorkloadRecord>> {
        self.get(WORKLOADS, workload_id)
    }

    /// List workloads matching the filter, newest first.
    pub fn list_workloads(&self, filter: &WorkloadFilter) -> StateResult<Vec<WorkloadRecord>> {
        let mut records: Vec<WorkloadRecord> = self.list(WORKLOADS)?;
        records.retain(|r| filter.matches(r));
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    pub fn count_workloads(&self) -> StateResult<u64> {
        self.count(WORKLOADS)
    }
}

/// Validate and serialize a region batch, rejecting duplicate ids.
fn encode_regions(regions: &[Region]) -> StateResult<Vec<(&str, Vec<u8>)>> {
    let mut seen = BTreeSet::new();
    let mut encoded = Vec::with_capacity(regions.len());
    for region in regions {
        region.validate().map_err(|e| match e {
            StateError::Invalid(msg) => {
                StateError::Invalid(format!("region {}: {msg}", region.region_id))
            }
            other => other,
        })?;
        if !seen.insert(region.region_id.as_str()) {
            return Err(StateError::Invalid(format!(
                "duplicate region_id {} in batch",
                region.region_id
            )));
        }
        let value = serde_json::to_vec(region).map_err(map_err!(Serialize))?;
        encoded.push((region.region_id.as_str(), value));
    }
    Ok(encoded)
}
