mod versioned_schema;

pub use versioned_schema::{
    initialize_schema, read_db_version, Column, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
};
