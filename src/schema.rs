//! Schema validation capability consumed by the form provider.
//!
//! The provider only ever calls [`Schema::validate`]; any engine can sit
//! behind it. [`JsonSchema`] is the bundled engine, backed by the
//! `jsonschema` crate, with `errorMessage` support for user-facing text.

use std::fmt;
use std::marker::PhantomData;

use jsonschema::error::ValidationErrorKind;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{LoadError, ValidationFailure};
use crate::types::{pointer_segments, Issue, PathSegment, Values};

/// Keyword holding custom user-facing messages inside a schema object.
pub const ERROR_MESSAGE_KEYWORD: &str = "errorMessage";

/// A synchronous, side-effect-free validator over a full values mapping.
pub trait Schema {
    /// Parsed shape produced by a successful run.
    type Output;

    fn validate(&self, values: &Values) -> Result<Self::Output, ValidationFailure>;
}

impl<S: Schema + ?Sized> Schema for Box<S> {
    type Output = S::Output;

    fn validate(&self, values: &Values) -> Result<Self::Output, ValidationFailure> {
        (**self).validate(values)
    }
}

/// Options for compiling a [`JsonSchema`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaOptions {
    /// When true, an object root without `additionalProperties` gets
    /// `additionalProperties: false`, rejecting unknown fields.
    pub strict: bool,
}

impl SchemaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict mode.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

/// JSON Schema backed validator.
pub struct JsonSchema {
    source: Value,
    validator: jsonschema::Validator,
}

impl fmt::Debug for JsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchema")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl JsonSchema {
    /// Compile a schema with default options.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::InvalidSchema` if the document isn't a valid schema.
    pub fn new(schema: &Value) -> Result<Self, LoadError> {
        Self::with_options(schema, SchemaOptions::default())
    }

    pub fn with_options(schema: &Value, options: SchemaOptions) -> Result<Self, LoadError> {
        let mut source = schema.clone();
        if options.strict {
            apply_strict(&mut source);
        }

        let validator =
            jsonschema::validator_for(&source).map_err(|e| LoadError::InvalidSchema {
                message: e.to_string(),
            })?;

        Ok(Self { source, validator })
    }

    /// The schema document as compiled (after option rewrites).
    pub fn source(&self) -> &Value {
        &self.source
    }

    /// Run the validator and collect every issue.
    pub fn issues(&self, values: &Values) -> Vec<Issue> {
        let instance = Value::Object(values.clone());
        self.validator
            .iter_errors(&instance)
            .map(|e| {
                let missing = match &e.kind {
                    ValidationErrorKind::Required { property } => {
                        property.as_str().map(str::to_string)
                    }
                    _ => None,
                };

                let mut path = pointer_segments(&e.instance_path.to_string());
                if let Some(property) = &missing {
                    path.push(PathSegment::Key(property.clone()));
                }

                let message = self
                    .custom_message(&e.schema_path.to_string(), missing.as_deref())
                    .unwrap_or_else(|| e.to_string());

                Issue::new(path, message)
            })
            .collect()
    }

    /// Look up an `errorMessage` for the keyword at `schema_path`.
    ///
    /// The message lives on the schema object that holds the keyword. For
    /// `required`, the missing property's own schema is consulted first.
    fn custom_message(&self, schema_path: &str, missing: Option<&str>) -> Option<String> {
        let mut tokens: Vec<String> = pointer_segments(schema_path)
            .iter()
            .map(ToString::to_string)
            .collect();
        let keyword = tokens.pop()?;
        let holder = navigate(&self.source, &tokens)?;

        if let Some(property) = missing {
            let from_property = holder
                .get("properties")
                .and_then(|props| props.get(property))
                .and_then(|schema| follow_ref(&self.source, schema))
                .and_then(|schema| schema.get(ERROR_MESSAGE_KEYWORD))
                .and_then(|message| message_for(message, &keyword, None));
            if from_property.is_some() {
                return from_property;
            }
        }

        message_for(holder.get(ERROR_MESSAGE_KEYWORD)?, &keyword, missing)
    }
}

impl Schema for JsonSchema {
    type Output = Values;

    fn validate(&self, values: &Values) -> Result<Values, ValidationFailure> {
        let issues = self.issues(values);
        if issues.is_empty() {
            Ok(values.clone())
        } else {
            Err(ValidationFailure::new(issues))
        }
    }
}

/// [`JsonSchema`] whose successful output is deserialized into `T`.
pub struct Typed<T> {
    inner: JsonSchema,
    _output: PhantomData<fn() -> T>,
}

impl<T> Typed<T> {
    pub fn new(inner: JsonSchema) -> Self {
        Self {
            inner,
            _output: PhantomData,
        }
    }

    pub fn inner(&self) -> &JsonSchema {
        &self.inner
    }
}

impl<T> fmt::Debug for Typed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Typed").field(&self.inner).finish()
    }
}

impl<T: DeserializeOwned> Schema for Typed<T> {
    type Output = T;

    fn validate(&self, values: &Values) -> Result<T, ValidationFailure> {
        let checked = self.inner.validate(values)?;
        serde_json::from_value(Value::Object(checked))
            .map_err(|e| ValidationFailure::single(Issue::new(Vec::new(), e.to_string())))
    }
}

/// Adapts a closure into a [`Schema`].
pub struct FnSchema<F, T> {
    validate: F,
    _output: PhantomData<fn() -> T>,
}

impl<F, T> FnSchema<F, T>
where
    F: Fn(&Values) -> Result<T, ValidationFailure>,
{
    pub fn new(validate: F) -> Self {
        Self {
            validate,
            _output: PhantomData,
        }
    }
}

impl<F, T> Schema for FnSchema<F, T>
where
    F: Fn(&Values) -> Result<T, ValidationFailure>,
{
    type Output = T;

    fn validate(&self, values: &Values) -> Result<T, ValidationFailure> {
        (self.validate)(values)
    }
}

fn apply_strict(schema: &mut Value) {
    let Some(root) = schema.as_object_mut() else {
        return;
    };
    let is_object = root.get("type").and_then(Value::as_str) == Some("object")
        || root.contains_key("properties");
    if is_object && !root.contains_key("additionalProperties") {
        root.insert("additionalProperties".to_string(), Value::Bool(false));
    }
}

/// Walk `tokens` from `root`. A `$ref` token jumps to the local target of
/// the current node's `$ref`, matching how the engine reports schema paths.
fn navigate<'a>(root: &'a Value, tokens: &[String]) -> Option<&'a Value> {
    tokens.iter().try_fold(root, |node, token| {
        if token == "$ref" {
            if let Some(reference) = node.get("$ref").and_then(Value::as_str) {
                return resolve_local_ref(root, reference);
            }
        }
        match node {
            Value::Object(map) => map.get(token),
            Value::Array(items) => items.get(token.parse::<usize>().ok()?),
            _ => None,
        }
    })
}

/// Resolve a same-document reference such as `#/$defs/name`.
fn resolve_local_ref<'a>(root: &'a Value, reference: &str) -> Option<&'a Value> {
    let fragment = reference.strip_prefix('#')?;
    let tokens: Vec<String> = pointer_segments(fragment)
        .iter()
        .map(ToString::to_string)
        .collect();
    navigate(root, &tokens)
}

/// The schema behind `node`'s local `$ref`, or `node` itself.
fn follow_ref<'a>(root: &'a Value, node: &'a Value) -> Option<&'a Value> {
    match node.get("$ref").and_then(Value::as_str) {
        Some(reference) => resolve_local_ref(root, reference),
        None => Some(node),
    }
}

/// Resolve a message from an `errorMessage` value.
///
/// A string applies to every keyword; an object is keyed by keyword, and for
/// `required` may be keyed further by property.
fn message_for(message: &Value, keyword: &str, property: Option<&str>) -> Option<String> {
    match message {
        Value::String(text) => Some(text.clone()),
        Value::Object(by_keyword) => match by_keyword.get(keyword)? {
            Value::String(text) => Some(text.clone()),
            Value::Object(by_property) => by_property
                .get(property?)
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        },
        _ => None,
    }
}
