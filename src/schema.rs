//! Swagger `definitions` → typed schema document
//!
//! Parses the `definitions` object of a Swagger 2.0 document into
//! read-only `SchemaDefinition`s that the example generator walks.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::DocumentError;

/// All model definitions of a Swagger document, in source order.
#[derive(Debug, Clone, Default)]
pub struct SchemaDocument {
    definitions: Vec<SchemaDefinition>,
    index: HashMap<String, usize>,
}

impl SchemaDocument {
    /// Build from a full Swagger document (reads its `definitions` key).
    pub fn from_swagger(swagger: &Value) -> Result<Self, DocumentError> {
        let definitions = swagger
            .get("definitions")
            .and_then(|d| d.as_object())
            .ok_or(DocumentError::MissingDefinitions)?;
        Self::from_definitions(definitions)
    }

    /// Build from a bare `definitions` map.
    pub fn from_definitions(definitions: &Map<String, Value>) -> Result<Self, DocumentError> {
        let mut doc = Self::default();
        for (name, raw) in definitions {
            let def = SchemaDefinition::parse(name, raw)?;
            doc.index.insert(name.clone(), doc.definitions.len());
            doc.definitions.push(def);
        }
        Ok(doc)
    }

    pub fn get(&self, name: &str) -> Option<&SchemaDefinition> {
        self.index.get(name).map(|&i| &self.definitions[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaDefinition> {
        self.definitions.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|d| d.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// A named model definition.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct SchemaDefinition {
    pub name: String,
    pub description: String,
    /// Names listed under `required`
    pub required: Vec<String>,
    /// Precomputed example; a JSON `null` counts as absent
    pub example: Option<Value>,
    /// Properties in source order (empty when the definition has none)
    pub properties: Vec<Property>,
    /// The definition exactly as it appears in the document
    pub raw: Value,
}

impl SchemaDefinition {
    fn parse(name: &str, raw: &Value) -> Result<Self, DocumentError> {
        let obj = raw.as_object().ok_or_else(|| DocumentError::InvalidDefinition {
            model: name.to_string(),
        })?;

        let description = obj
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let required = obj
            .get("required")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let properties = obj
            .get("properties")
            .and_then(|v| v.as_object())
            .map(|props| {
                props
                    .iter()
                    .map(|(prop_name, prop)| Property {
                        name: prop_name.clone(),
                        definition: PropertyDefinition::parse(prop),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            name: name.to_string(),
            description,
            required,
            example: non_null(obj.get("example")),
            properties,
            raw: raw.clone(),
        })
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}

/// A single named property of a model.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub definition: PropertyDefinition,
}

/// What a property says about its value, by precedence:
/// `example`, then `type`, then `$ref`.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDefinition {
    Example(Value),
    Typed(PropertyType),
    /// Raw `$ref` string, e.g. `#/definitions/Address`
    Reference(String),
    /// None of `example`, `type` or `$ref`; left out of generated output
    Unspecified,
}

impl PropertyDefinition {
    pub fn parse(prop: &Value) -> Self {
        if let Some(example) = non_null(prop.get("example")) {
            return Self::Example(example);
        }
        if let Some(type_name) = prop.get("type").and_then(|v| v.as_str()) {
            return Self::Typed(PropertyType::parse(type_name, prop));
        }
        match prop.get("$ref").and_then(|v| v.as_str()) {
            Some(reference) => Self::Reference(reference.to_string()),
            None => Self::Unspecified,
        }
    }
}

/// Value types the generator knows how to synthesize.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyType {
    String { enum_values: Vec<Value> },
    Number,
    Array { items: ItemsSchema },
    Boolean,
    Null,
    Object,
    /// Anything else (`integer` included); generated like `Object`
    Other(String),
}

impl PropertyType {
    fn parse(type_name: &str, schema: &Value) -> Self {
        match type_name {
            "string" => Self::String {
                enum_values: schema
                    .get("enum")
                    .and_then(|v| v.as_array())
                    .cloned()
                    .unwrap_or_default(),
            },
            "number" => Self::Number,
            "array" => Self::Array {
                items: ItemsSchema::parse(schema.get("items")),
            },
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            "object" => Self::Object,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Element schema of an array property.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemsSchema {
    Reference(String),
    Typed(Box<PropertyType>),
    Missing,
}

impl ItemsSchema {
    fn parse(items: Option<&Value>) -> Self {
        let Some(items) = items else {
            return Self::Missing;
        };
        if let Some(reference) = items.get("$ref").and_then(|v| v.as_str()) {
            return Self::Reference(reference.to_string());
        }
        match items.get("type").and_then(|v| v.as_str()) {
            Some(type_name) => Self::Typed(Box::new(PropertyType::parse(type_name, items))),
            None => Self::Missing,
        }
    }
}

/// Model name a `$ref` points at: its final `/`-delimited segment.
///
/// Returns `None` when that segment is empty.
pub fn model_name_from_ref(reference: &str) -> Option<&str> {
    reference.rsplit('/').next().filter(|name| !name.is_empty())
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}
