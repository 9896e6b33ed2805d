//! Declared component inputs and their validation.
//!
//! A component declares its parameters under `spec:inputs` in the header
//! document:
//!
//! ```yaml
//! spec:
//!   inputs:
//!     stage:
//!       default: test
//!     environment:
//!       options: [staging, production]
//!     retries:
//!       type: number
//!       default: 2
//!     version:
//!       regex: ^v\d+$
//! ---
//! ```
//!
//! Inputs without a `default` are required. Caller arguments arrive as
//! strings and are converted according to the declared `type`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Value type of an input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Free-form text (the default)
    #[default]
    String,
    /// Integer or floating point number
    Number,
    /// `true` or `false`
    Boolean,
    /// A YAML/JSON list
    Array,
}

impl InputType {
    fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
        }
    }

    fn coerce(self, raw: &str) -> Option<Value> {
        match self {
            Self::String => Some(Value::String(raw.to_string())),
            Self::Number => raw
                .parse::<i64>()
                .map(Value::from)
                .ok()
                .or_else(|| {
                    raw.parse::<f64>()
                        .ok()
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                }),
            Self::Boolean => match raw {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            Self::Array => serde_yaml::from_str::<Value>(raw).ok().filter(Value::is_array),
        }
    }
}

/// Declaration of a single input.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct InputSpec {
    /// Value used when the caller does not supply one
    #[serde(default)]
    pub default: Option<Value>,
    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,
    /// Allowed values
    #[serde(default)]
    pub options: Option<Vec<Value>>,
    /// Pattern a string value must match
    #[serde(default)]
    pub regex: Option<String>,
    /// Value type
    #[serde(default, rename = "type")]
    pub input_type: InputType,
}

impl InputSpec {
    /// Whether the caller must supply a value.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// All inputs declared by a component, ordered by name.
pub type InputSchema = BTreeMap<String, InputSpec>;

/// Read a `spec:inputs` mapping.
///
/// An input declared with no keys at all (`stage:`) is a required string.
///
/// # Errors
///
/// Fails if the value is not a mapping of input names to declarations.
pub fn parse_schema(value: serde_yaml::Value) -> Result<InputSchema, serde_yaml::Error> {
    let declared: BTreeMap<String, Option<InputSpec>> = serde_yaml::from_value(value)?;
    Ok(declared.into_iter().map(|(name, spec)| (name, spec.unwrap_or_default())).collect())
}

/// Inputs accepted by the schema, with defaults applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidatedInputs(BTreeMap<String, Value>);

impl ValidatedInputs {
    /// Value of input `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether no inputs were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.iter().map(|(name, value)| (name.clone(), value.clone())).collect())
    }
}

/// The schema rejected the caller's arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", errors.join(", "))]
pub struct InputValidationError {
    /// One message per problem, in input name order
    pub errors: Vec<String>,
}

/// Checks caller arguments against a declared schema.
pub trait InputValidator: Send + Sync {
    /// Validate `args` against `schema`.
    ///
    /// # Errors
    ///
    /// Returns every problem found, not only the first one.
    fn validate(
        &self,
        schema: &InputSchema,
        args: &BTreeMap<String, String>,
    ) -> Result<ValidatedInputs, InputValidationError>;
}

/// The bundled [`InputValidator`] implementing `type`, `default`, `options`
/// and `regex`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    fn check(name: &str, spec: &InputSpec, value: &Value) -> Result<(), String> {
        if !spec.input_type.accepts(value) {
            return Err(format!(
                "`{name}` input: provided value is not a {}",
                spec.input_type.name()
            ));
        }

        if let Some(options) = &spec.options {
            if !options.contains(value) {
                return Err(format!(
                    "`{name}` input: `{}` cannot be used because it is not in the list of allowed options",
                    display_value(value)
                ));
            }
        }

        if let (Some(pattern), Some(text)) = (&spec.regex, value.as_str()) {
            let regex = regex::Regex::new(pattern)
                .map_err(|_| format!("`{name}` input: invalid regular expression"))?;
            if !regex.is_match(text) {
                return Err(format!(
                    "`{name}` input: provided value does not match required RegEx pattern"
                ));
            }
        }

        Ok(())
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl InputValidator for SchemaValidator {
    fn validate(
        &self,
        schema: &InputSchema,
        args: &BTreeMap<String, String>,
    ) -> Result<ValidatedInputs, InputValidationError> {
        let mut errors = Vec::new();

        let unknown: Vec<&str> =
            args.keys().filter(|name| !schema.contains_key(*name)).map(String::as_str).collect();
        if !unknown.is_empty() {
            errors.push(format!("unknown input arguments: {}", unknown.join(", ")));
        }

        let mut accepted = BTreeMap::new();
        for (name, spec) in schema {
            let value = match (args.get(name), &spec.default) {
                (Some(raw), _) => match spec.input_type.coerce(raw) {
                    Some(value) => value,
                    None => {
                        errors.push(format!(
                            "`{name}` input: provided value is not a {}",
                            spec.input_type.name()
                        ));
                        continue;
                    }
                },
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    errors.push(format!("`{name}` input: required value has not been provided"));
                    continue;
                }
            };

            match Self::check(name, spec, &value) {
                Ok(()) => {
                    accepted.insert(name.clone(), value);
                }
                Err(message) => errors.push(message),
            }
        }

        if errors.is_empty() {
            Ok(ValidatedInputs(accepted))
        } else {
            Err(InputValidationError {
                errors,
            })
        }
    }
}
