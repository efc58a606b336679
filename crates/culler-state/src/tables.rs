//! redb table definitions for the Culler state store.
//!
//! Each table uses `&str` keys and `&[u8]` values (JSON-serialized domain types).

use redb::TableDefinition;

/// Gate records keyed by `{service}/{account}/{region}/{stack}/{cluster}`,
/// with `*` for absent fields.
pub const GATES: TableDefinition<&str, &[u8]> = TableDefinition::new("gates");

/// Published schedules keyed by local date, `YYYY-MM-DD`.
pub const SCHEDULES: TableDefinition<&str, &[u8]> = TableDefinition::new("schedules");
