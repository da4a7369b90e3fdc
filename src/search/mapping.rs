//! Declarative field mappings for search indexes.
//!
//! A [`DocumentMapping`] lists the fields a document carries and what each one
//! is indexed for. Meilisearch settings and an Elasticsearch-style mapping are
//! both derived from the same declaration, so the capabilities of a field are
//! written down exactly once.
//!
//! Sub-fields (`raw`, `suggest`) are materialized in the document as sibling
//! keys with a dotted name, e.g. `"title.raw"` next to `"title"`.

use serde::Serialize;
use serde_json::{json, Map, Value};

/// How a field is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// Tokenized full-text field. Partial matches, not sortable.
    Text,
    /// Single unanalyzed token. Exact filtering and alphabetical sorting.
    Keyword,
    /// Exact-match numeric field.
    Integer,
    /// Prefix-completion field for autocomplete.
    Completion,
    /// Embedded object with its own properties.
    Object,
}

/// Name of the exact-match sub-field.
pub const RAW: &str = "raw";
/// Name of the completion sub-field.
pub const SUGGEST: &str = "suggest";

/// A single field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    /// Extra representations of the same source value.
    pub sub_fields: Vec<Field>,
    /// Properties of an [`FieldType::Object`] field.
    pub properties: Vec<Field>,
}

impl Field {
    fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            sub_fields: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn keyword(name: &str) -> Self {
        Self::new(name, FieldType::Keyword)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn completion(name: &str) -> Self {
        Self::new(name, FieldType::Completion)
    }

    /// An embedded object carrying exactly `properties`.
    pub fn object(name: &str, properties: Vec<Field>) -> Self {
        Self {
            properties,
            ..Self::new(name, FieldType::Object)
        }
    }

    /// Add an exact-match `raw` copy, enabling filtering and sorting.
    pub fn with_raw(mut self) -> Self {
        self.sub_fields.push(Field::keyword(RAW));
        self
    }

    /// Add a `suggest` copy for autocomplete.
    pub fn with_suggest(mut self) -> Self {
        self.sub_fields.push(Field::completion(SUGGEST));
        self
    }

    fn to_mapping(&self) -> Value {
        let mut entry = Map::new();
        entry.insert("type".into(), json!(self.field_type));

        if !self.sub_fields.is_empty() {
            let fields: Map<String, Value> = self
                .sub_fields
                .iter()
                .map(|f| (f.name.clone(), f.to_mapping()))
                .collect();
            entry.insert("fields".into(), Value::Object(fields));
        }

        if !self.properties.is_empty() {
            entry.insert("properties".into(), properties_mapping(&self.properties));
        }

        Value::Object(entry)
    }
}

fn properties_mapping(fields: &[Field]) -> Value {
    let props: Map<String, Value> = fields
        .iter()
        .map(|f| (f.name.clone(), f.to_mapping()))
        .collect();
    Value::Object(props)
}

/// Index settings derived from a mapping, in the shape Meilisearch expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexSettings {
    pub searchable_attributes: Vec<String>,
    pub filterable_attributes: Vec<String>,
    pub sortable_attributes: Vec<String>,
}

/// The full declaration of one index: its name, primary key and fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMapping {
    pub index_name: String,
    pub primary_key: String,
    pub fields: Vec<Field>,
}

impl DocumentMapping {
    /// Every leaf attribute path with its type, in declaration order.
    ///
    /// Object fields contribute their properties, not themselves.
    pub fn attributes(&self) -> Vec<(String, FieldType)> {
        let mut out = Vec::new();
        collect_attributes(&self.fields, "", &mut out);
        out
    }

    fn paths_of(&self, pred: impl Fn(FieldType) -> bool) -> Vec<String> {
        self.attributes()
            .into_iter()
            .filter(|(_, t)| pred(*t))
            .map(|(p, _)| p)
            .collect()
    }

    /// Paths used for full-text relevance search.
    pub fn searchable_attributes(&self) -> Vec<String> {
        self.paths_of(|t| t == FieldType::Text)
    }

    /// Paths usable in equality filters.
    pub fn filterable_attributes(&self) -> Vec<String> {
        self.paths_of(|t| matches!(t, FieldType::Keyword | FieldType::Integer))
    }

    /// Paths usable for alphabetical sorting.
    pub fn sortable_attributes(&self) -> Vec<String> {
        self.paths_of(|t| t == FieldType::Keyword)
    }

    /// Paths backing autocomplete.
    pub fn completion_attributes(&self) -> Vec<String> {
        self.paths_of(|t| t == FieldType::Completion)
    }

    /// Completion paths are searchable too, so queries can target them alone.
    pub fn index_settings(&self) -> IndexSettings {
        IndexSettings {
            searchable_attributes: self
                .paths_of(|t| matches!(t, FieldType::Text | FieldType::Completion)),
            filterable_attributes: self.filterable_attributes(),
            sortable_attributes: self.sortable_attributes(),
        }
    }

    /// Elasticsearch-style `{"mappings": {"properties": ...}}` body.
    pub fn to_index_mapping(&self) -> Value {
        json!({
            "mappings": {
                "properties": properties_mapping(&self.fields)
            }
        })
    }

    /// Declared paths absent from `document`, plus the primary key if missing.
    ///
    /// An empty result means the document carries every declared attribute.
    pub fn missing_paths(&self, document: &Value) -> Vec<String> {
        let mut missing = Vec::new();
        if document.get(&self.primary_key).is_none() {
            missing.push(self.primary_key.clone());
        }
        find_missing(&self.fields, document, "", &mut missing);
        missing
    }
}

fn collect_attributes(fields: &[Field], prefix: &str, out: &mut Vec<(String, FieldType)>) {
    for field in fields {
        let path = format!("{prefix}{}", field.name);
        if field.field_type == FieldType::Object {
            collect_attributes(&field.properties, &format!("{path}."), out);
            continue;
        }
        out.push((path.clone(), field.field_type));
        for sub in &field.sub_fields {
            out.push((format!("{path}.{}", sub.name), sub.field_type));
        }
    }
}

fn find_missing(fields: &[Field], object: &Value, prefix: &str, missing: &mut Vec<String>) {
    for field in fields {
        let path = format!("{prefix}{}", field.name);
        match object.get(&field.name) {
            None => missing.push(path.clone()),
            Some(nested) if field.field_type == FieldType::Object => {
                find_missing(&field.properties, nested, &format!("{path}."), missing);
            }
            Some(_) => {}
        }
        for sub in &field.sub_fields {
            if object.get(format!("{}.{}", field.name, sub.name)).is_none() {
                missing.push(format!("{path}.{}", sub.name));
            }
        }
    }
}
