mod versioned_schema;

pub use versioned_schema::{
    initialize, Column, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
};
