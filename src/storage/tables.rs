use redb::TableDefinition;

/// File records: id -> FileRecord (msgpack). Key order is insertion order.
pub const FILES: TableDefinition<u64, &[u8]> = TableDefinition::new("files");

/// Category index: category -> msgpack Vec of file ids, in insertion order
pub const CATEGORY_FILES: TableDefinition<&str, &[u8]> = TableDefinition::new("category_files");

/// Monotonic counters (last assigned file id)
pub const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

pub const FILE_ID_COUNTER: &str = "file_id";
