use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of value a collection field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    Text,
    Number,
    Bool,
    Email,
    Url,
    Editor,
    Date,
    Autodate,
    Select,
    File,
    Relation,
    Json,
    Password,
    GeoPoint,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Editor => "editor",
            FieldType::Date => "date",
            FieldType::Autodate => "autodate",
            FieldType::Select => "select",
            FieldType::File => "file",
            FieldType::Relation => "relation",
            FieldType::Json => "json",
            FieldType::Password => "password",
            FieldType::GeoPoint => "geoPoint",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys of the flat JSON field object owned by `FieldDescriptor` itself.
/// None of them may appear in `options`.
pub const RESERVED_FIELD_KEYS: &[&str] = &[
    "id",
    "name",
    "type",
    "hidden",
    "presentable",
    "required",
    "system",
];

/// Metadata describing one typed attribute of a collection.
///
/// The `id` is the field identity: a rename only touches `name`, which is what
/// lets a rename be undone without losing the data stored under the field.
/// Type-specific options (`cascadeDelete`, `maxSelect`, `collectionId`, ...)
/// live in `options` and are inlined in the JSON form, matching the flat
/// objects the host store exchanges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub presentable: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub system: bool,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: FieldType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            hidden: false,
            presentable: false,
            required: false,
            system: false,
            options: Map::new(),
        }
    }

    /// Relation field pointing at `collection_id`, with the host's defaults
    /// for a multi-select relation.
    pub fn relation(
        id: impl Into<String>,
        name: impl Into<String>,
        collection_id: impl Into<String>,
    ) -> Self {
        Self::new(id, name, FieldType::Relation)
            .with_option("collectionId", Value::String(collection_id.into()))
            .with_option("cascadeDelete", Value::Bool(false))
            .with_option("minSelect", Value::from(0))
            .with_option("maxSelect", Value::from(999))
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}
