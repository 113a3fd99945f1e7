//! Collection schema model: collections, field descriptors and the field
//! mutator used by migration transforms.

mod collection;
mod field;
pub mod mutator;

pub use collection::{CollectionSchema, CollectionType};
pub use field::{FieldDescriptor, FieldType, RESERVED_FIELD_KEYS};
pub use mutator::{remove_field, upsert_at, MutatorError, MutatorOptions, PositionPolicy};
