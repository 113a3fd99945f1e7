use super::field::{FieldDescriptor, RESERVED_FIELD_KEYS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionType {
    #[default]
    Base,
    Auth,
    View,
}

impl CollectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionType::Base => "base",
            CollectionType::Auth => "auth",
            CollectionType::View => "view",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "base" => Some(CollectionType::Base),
            "auth" => Some(CollectionType::Auth),
            "view" => Some(CollectionType::View),
            _ => None,
        }
    }
}

/// A named grouping of fields in the schema store, analogous to a table.
///
/// `revision` is the store's concurrency token: it is handed out by `find`
/// and checked by `save`. It never takes part in structural comparisons and
/// is not part of the exported JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: CollectionType,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing)]
    pub revision: u64,
}

impl CollectionSchema {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: CollectionType::Base,
            fields: Vec::new(),
            revision: 0,
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldDescriptor>) -> Self {
        self.fields = fields;
        self
    }

    /// Whether this collection answers to `name_or_id`.
    ///
    /// Ids match exactly, names case-insensitively.
    pub fn matches(&self, name_or_id: &str) -> bool {
        self.id == name_or_id || self.name.eq_ignore_ascii_case(name_or_id)
    }

    pub fn field(&self, id: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn position_of(&self, field_id: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.id == field_id)
    }

    /// Structural equality: identity, type and the full field sequence,
    /// ignoring `revision`.
    pub fn same_structure(&self, other: &CollectionSchema) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.kind == other.kind
            && self.fields == other.fields
    }

    /// Checks the invariants a store enforces before persisting.
    ///
    /// Field ids must be unique and non-empty, field names must be
    /// non-empty and unique ignoring ASCII case. Options may not reuse a
    /// key of the field object itself.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.is_empty() {
            return Err("collection id is empty".to_string());
        }
        if self.name.is_empty() {
            return Err("collection name is empty".to_string());
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for (position, field) in self.fields.iter().enumerate() {
            if field.id.is_empty() {
                return Err(format!("field at position {} has an empty id", position));
            }
            if field.name.is_empty() {
                return Err(format!("field {} has an empty name", field.id));
            }
            if let Some(key) = field
                .options
                .keys()
                .find(|key| RESERVED_FIELD_KEYS.contains(&key.as_str()))
            {
                return Err(format!("field {} has reserved option {}", field.id, key));
            }
            if !ids.insert(field.id.as_str()) {
                return Err(format!("duplicate field id {}", field.id));
            }
            if !names.insert(field.name.to_ascii_lowercase()) {
                return Err(format!("duplicate field name {}", field.name));
            }
        }
        Ok(())
    }
}
