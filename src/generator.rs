//! Schema → example JSON generator
//!
//! Walks a model definition depth-first and synthesizes a representative
//! value for it, following `$ref`s and array item references into other
//! models of the same `SchemaDocument`.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::GenerateError;
use crate::random::{random_in_range, random_index, random_string, RandomSource, ThreadRandom};
use crate::schema::{
    model_name_from_ref, ItemsSchema, Property, PropertyDefinition, PropertyType, SchemaDefinition,
    SchemaDocument,
};

/// Length of synthesized strings.
pub const STRING_LENGTH: usize = 15;
/// Synthesized numbers fall in `[NUMBER_MIN, NUMBER_MAX)`.
pub const NUMBER_MIN: i64 = 1;
pub const NUMBER_MAX: i64 = 10;

/// What to do when a model is reached again while it is still being resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CyclePolicy {
    /// Fail with `GenerateError::CircularReference`.
    #[default]
    Error,
    /// Emit `{}` for the back-reference (`[]` for an array of it) and go on.
    Ignore,
}

impl CyclePolicy {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "error" => Some(Self::Error),
            "ignore" => Some(Self::Ignore),
            _ => None,
        }
    }
}

/// Generates example values for models of one `SchemaDocument`.
#[derive(Debug)]
pub struct ExampleGenerator<'a, R = ThreadRandom> {
    document: &'a SchemaDocument,
    rng: R,
    cycle_policy: CyclePolicy,
}

impl<'a> ExampleGenerator<'a, ThreadRandom> {
    pub fn new(document: &'a SchemaDocument) -> Self {
        Self::with_rng(document, ThreadRandom)
    }
}

impl<'a, R: RandomSource> ExampleGenerator<'a, R> {
    pub fn with_rng(document: &'a SchemaDocument, rng: R) -> Self {
        Self {
            document,
            rng,
            cycle_policy: CyclePolicy::default(),
        }
    }

    /// Set the cycle policy.
    pub fn cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    /// Produce an example value for `model`.
    ///
    /// - `only_definition`: return the raw definition instead of an example.
    /// - `force_full_example`: ignore precomputed `example`s on models and
    ///   synthesize field by field. Property-level examples are always used.
    pub fn generate_example(
        &mut self,
        model: &str,
        force_full_example: bool,
        only_definition: bool,
    ) -> Result<Value, GenerateError> {
        let definition = self
            .document
            .get(model)
            .ok_or_else(|| GenerateError::ModelNotFound {
                model: model.to_string(),
            })?;

        if only_definition {
            return Ok(definition.raw.clone());
        }

        let mut stack = Vec::new();
        self.model_example(definition, force_full_example, &mut stack)
    }

    fn model_example(
        &mut self,
        definition: &'a SchemaDefinition,
        force_full: bool,
        stack: &mut Vec<&'a str>,
    ) -> Result<Value, GenerateError> {
        if !force_full {
            if let Some(example) = &definition.example {
                return Ok(example.clone());
            }
        }

        stack.push(&definition.name);
        let mut object = Map::new();
        for property in &definition.properties {
            if let Some(value) = self.property_example(definition, property, force_full, stack)? {
                object.insert(property.name.clone(), value);
            }
        }
        stack.pop();

        Ok(Value::Object(object))
    }

    fn property_example(
        &mut self,
        owner: &'a SchemaDefinition,
        property: &'a Property,
        force_full: bool,
        stack: &mut Vec<&'a str>,
    ) -> Result<Option<Value>, GenerateError> {
        let value = match &property.definition {
            PropertyDefinition::Example(example) => example.clone(),
            PropertyDefinition::Typed(ty) => {
                self.typed_value(owner, property, ty, force_full, stack)?
            }
            PropertyDefinition::Reference(reference) => self
                .follow_reference(owner, reference, force_full, stack)?
                .unwrap_or_else(|| Value::Object(Map::new())),
            PropertyDefinition::Unspecified => return Ok(None),
        };
        Ok(Some(value))
    }

    fn typed_value(
        &mut self,
        owner: &'a SchemaDefinition,
        property: &'a Property,
        ty: &'a PropertyType,
        force_full: bool,
        stack: &mut Vec<&'a str>,
    ) -> Result<Value, GenerateError> {
        let value = match ty {
            PropertyType::String { enum_values } if !enum_values.is_empty() => {
                enum_values[random_index(&mut self.rng, enum_values.len())].clone()
            }
            PropertyType::String { .. } => Value::String(random_string(&mut self.rng, STRING_LENGTH)),
            PropertyType::Number => Value::from(random_in_range(&mut self.rng, NUMBER_MIN, NUMBER_MAX)),
            PropertyType::Array { items } => {
                let element = match items {
                    ItemsSchema::Reference(reference) => {
                        self.follow_reference(owner, reference, force_full, stack)?
                    }
                    ItemsSchema::Typed(inner) => {
                        Some(self.typed_value(owner, property, inner, force_full, stack)?)
                    }
                    ItemsSchema::Missing => {
                        return Err(GenerateError::MissingArrayItems {
                            model: owner.name.clone(),
                            property: property.name.clone(),
                        })
                    }
                };
                Value::Array(element.into_iter().collect())
            }
            PropertyType::Boolean => Value::Bool(false),
            PropertyType::Null => Value::Null,
            PropertyType::Object | PropertyType::Other(_) => Value::Object(Map::new()),
        };
        Ok(value)
    }

    /// Resolve `reference` and generate its model.
    ///
    /// `Ok(None)` means the reference closes a cycle and the policy is `Ignore`.
    fn follow_reference(
        &mut self,
        owner: &'a SchemaDefinition,
        reference: &'a str,
        force_full: bool,
        stack: &mut Vec<&'a str>,
    ) -> Result<Option<Value>, GenerateError> {
        let name =
            model_name_from_ref(reference).ok_or_else(|| GenerateError::MalformedReference {
                reference: reference.to_string(),
                from: owner.name.clone(),
            })?;

        let target = self
            .document
            .get(name)
            .ok_or_else(|| GenerateError::UnresolvedReference {
                reference: reference.to_string(),
                from: owner.name.clone(),
            })?;

        // A model answered by its example is never descended into.
        let descends = force_full || target.example.is_none();
        if descends && stack.contains(&target.name.as_str()) {
            match self.cycle_policy {
                CyclePolicy::Error => {
                    let mut chain: Vec<String> = stack.iter().map(|s| s.to_string()).collect();
                    chain.push(target.name.clone());
                    return Err(GenerateError::CircularReference { chain });
                }
                CyclePolicy::Ignore => {
                    debug!(model = %target.name, from = %owner.name, "ignoring circular reference");
                    return Ok(None);
                }
            }
        }

        debug!(model = %target.name, depth = stack.len(), "resolving reference");
        self.model_example(target, force_full, stack).map(Some)
    }
}

/// One-shot generation with thread-local randomness and the default cycle policy.
pub fn generate_example(
    document: &SchemaDocument,
    model: &str,
    force_full_example: bool,
    only_definition: bool,
) -> Result<Value, GenerateError> {
    ExampleGenerator::new(document).generate_example(model, force_full_example, only_definition)
}
