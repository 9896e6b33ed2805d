//! Component file headers and input contexts.
//!
//! A component file may start with a header document that declares its
//! inputs, separated from the configuration body by a `---` line:
//!
//! ```yaml
//! spec:
//!   inputs:
//!     stage:
//!       default: test
//! ---
//! lint:
//!   stage: $[[ inputs.stage ]]
//! ```
//!
//! [`ComponentFile`] splits a file into header and body. [`ComponentSpecHeader`]
//! reads `spec:inputs` from the header, validates caller arguments against it
//! and builds the [`InterpolationContext`] handed to the template engine.
//! Interpolating the body is the engine's job and happens outside this crate.

pub mod inputs;

use serde::Serialize;
use serde_yaml::Value as YamlValue;
use std::collections::BTreeMap;
use tracing::debug;

use crate::core::ComponentError;
pub use inputs::{
    InputSchema, InputSpec, InputType, InputValidationError, InputValidator, SchemaValidator,
    ValidatedInputs,
};

/// A component file split into its optional header and its body.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentFile {
    header: Option<YamlValue>,
    body: String,
}

impl ComponentFile {
    /// Split `content` at the first document separator.
    ///
    /// Files with a single document have no header.
    ///
    /// # Errors
    ///
    /// [`ComponentError::InvalidHeader`] if the header is not valid YAML.
    pub fn parse(content: &str) -> Result<Self, ComponentError> {
        let Some((header, body)) = split_header(content) else {
            return Ok(Self {
                header: None,
                body: content.to_string(),
            });
        };

        let header = serde_yaml::from_str(header).map_err(|e| ComponentError::InvalidHeader {
            reason: e.to_string(),
        })?;

        Ok(Self {
            header: Some(header),
            body: body.to_string(),
        })
    }

    /// The configuration after the header, or the whole file without one.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether the file had a header document.
    #[must_use]
    pub fn has_header(&self) -> bool {
        self.header.is_some()
    }

    /// Read the `spec` header. A file without a header has an empty one.
    ///
    /// # Errors
    ///
    /// [`ComponentError::InvalidHeader`] if `spec:inputs` is malformed.
    pub fn spec_header(&self) -> Result<ComponentSpecHeader, ComponentError> {
        match &self.header {
            Some(document) => ComponentSpecHeader::from_document(document),
            None => Ok(ComponentSpecHeader::default()),
        }
    }
}

/// Returns `(header, body)` split at the first document marker that follows
/// content.
///
/// A marker is `---` at column 0, alone or followed by whitespace. Indented
/// dashes belong to a scalar and never split the file.
fn split_header(content: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    let mut seen_content = false;

    for line in content.split_inclusive('\n') {
        if is_document_marker(line) {
            if seen_content {
                return Some((&content[..offset], &content[offset + line.len()..]));
            }
        } else {
            let trimmed = line.trim();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                seen_content = true;
            }
        }
        offset += line.len();
    }

    None
}

fn is_document_marker(line: &str) -> bool {
    line.strip_prefix("---")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// The `spec:inputs` declaration of a component.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentSpecHeader {
    inputs: Option<InputSchema>,
}

impl ComponentSpecHeader {
    /// Read the header from an already parsed first document.
    ///
    /// Keys other than `spec:inputs` are ignored.
    ///
    /// # Errors
    ///
    /// [`ComponentError::InvalidHeader`] if `spec` is not a mapping or
    /// `spec:inputs` is not a mapping of input declarations.
    pub fn from_document(document: &YamlValue) -> Result<Self, ComponentError> {
        let Some(spec) = document.get("spec") else {
            return Ok(Self::default());
        };
        if !spec.is_mapping() {
            return Err(ComponentError::InvalidHeader {
                reason: "`spec` must be a mapping".to_string(),
            });
        }

        let inputs = match spec.get("inputs") {
            None => None,
            Some(YamlValue::Null) => Some(InputSchema::new()),
            Some(declared) => Some(inputs::parse_schema(declared.clone()).map_err(|e| {
                ComponentError::InvalidHeader {
                    reason: format!("`spec:inputs`: {e}"),
                }
            })?),
        };

        Ok(Self {
            inputs,
        })
    }

    /// Whether the component declares no inputs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.as_ref().is_none_or(InputSchema::is_empty)
    }

    /// The declared inputs, empty when there is no `spec:inputs`.
    #[must_use]
    pub fn schema(&self) -> InputSchema {
        self.inputs.clone().unwrap_or_default()
    }

    /// Validate `args` with the bundled [`SchemaValidator`].
    ///
    /// # Errors
    ///
    /// Every problem the validator found.
    pub fn build_inputs(
        &self,
        args: &BTreeMap<String, String>,
    ) -> Result<ValidatedInputs, InputValidationError> {
        self.build_inputs_with(args, &SchemaValidator)
    }

    /// Validate `args` with a caller-supplied validator.
    ///
    /// # Errors
    ///
    /// Every problem the validator found.
    pub fn build_inputs_with(
        &self,
        args: &BTreeMap<String, String>,
        validator: &dyn InputValidator,
    ) -> Result<ValidatedInputs, InputValidationError> {
        validator.validate(&self.schema(), args)
    }

    /// Build the interpolation context for `args`.
    ///
    /// # Errors
    ///
    /// [`ComponentError::InvalidInputs`] when validation fails. This is a hard
    /// error: a template must never be interpolated with an invalid input set.
    pub fn build_context(
        &self,
        args: &BTreeMap<String, String>,
    ) -> Result<InterpolationContext, ComponentError> {
        self.build_context_with(args, &SchemaValidator)
    }

    /// [`build_context`](Self::build_context) with a caller-supplied validator.
    ///
    /// # Errors
    ///
    /// [`ComponentError::InvalidInputs`] when validation fails.
    pub fn build_context_with(
        &self,
        args: &BTreeMap<String, String>,
        validator: &dyn InputValidator,
    ) -> Result<InterpolationContext, ComponentError> {
        let inputs = self.build_inputs_with(args, validator).map_err(|e| {
            debug!(errors = ?e.errors, "Component inputs rejected");
            ComponentError::InvalidInputs {
                errors: e.errors,
            }
        })?;

        Ok(InterpolationContext {
            inputs,
        })
    }
}

/// Variables available to the template engine, under the `inputs` namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InterpolationContext {
    inputs: ValidatedInputs,
}

impl InterpolationContext {
    /// The validated inputs.
    #[must_use]
    pub fn inputs(&self) -> &ValidatedInputs {
        &self.inputs
    }

    /// `{"inputs": {...}}` as JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "inputs": self.inputs.to_json() })
    }
}
