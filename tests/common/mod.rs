//! Common test infrastructure
//!
//! Tests should only import from this module, not from internal submodules.

#![allow(dead_code)]

mod constants;
mod fixtures;

pub use constants::*;
pub use fixtures::{
    add_field_migration, memory_store_with_posts, pb_migrations_dir, posts_collection,
    rename_migration, sqlite_store_with_posts, users_collection,
};
