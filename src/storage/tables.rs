use redb::TableDefinition;

/// Upload records: uuid -> UploadRecord (msgpack)
pub const UPLOADS: TableDefinition<&str, &[u8]> = TableDefinition::new("uploads");

/// Category index: category name -> msgpack Vec of upload UUIDs
pub const CATEGORY_UPLOADS: TableDefinition<&str, &[u8]> = TableDefinition::new("category_uploads");
