//! redb table definitions for the GreenGrid state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain types).

use redb::TableDefinition;

/// Region records keyed by `{region_id}`.
pub const REGIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("regions");

/// Workload records keyed by `{workload_id}`.
pub const WORKLOADS: TableDefinition<&str, &[u8]> = TableDefinition::new("workloads");
