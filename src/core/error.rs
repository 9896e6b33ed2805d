//! Error handling for cicomp
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can tell "route elsewhere",
//!    "permission denied" and "not found" apart
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`ComponentError`] - every failure the resolution pipeline can report
//! - [`ErrorContext`] - wraps an error with details and a suggestion
//! - [`user_friendly_error`] - turns any [`anyhow::Error`] into an [`ErrorContext`]
//!
//! # Error Categories
//!
//! - **Addressing**: [`ComponentError::NotInstanceAddress`], [`ComponentError::MalformedAddress`]
//! - **Access**: [`ComponentError::ProjectNotFound`], [`ComponentError::AccessDenied`]
//! - **Usage**: [`ComponentError::InvalidLatestUsage`], [`ComponentError::InvalidPartialSemverUsage`]
//! - **Resolution**: [`ComponentError::Unresolved`]
//! - **Inputs**: [`ComponentError::InvalidHeader`], [`ComponentError::InvalidInputs`]
//! - **Content**: [`ComponentError::Loader`], propagated unchanged from the loader
//!
//! # Examples
//!
//! ```rust,no_run
//! use cicomp::core::{ComponentError, user_friendly_error};
//!
//! let error = ComponentError::AccessDenied {
//!     project: "acme/ci".to_string(),
//! };
//! user_friendly_error(anyhow::Error::from(error)).display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Every failure the component resolution pipeline can report.
///
/// No variant is retried internally. [`Loader`](Self::Loader) carries the
/// content loader's own error untouched so its retry policy stays outside
/// this crate.
#[derive(Error, Debug)]
pub enum ComponentError {
    /// The address is not rooted at this instance
    ///
    /// Not a failure of the address itself: the caller should hand it to a
    /// different resolver.
    #[error("'{address}' is not a component address of this instance")]
    NotInstanceAddress {
        /// The address as given
        address: String,
    },

    /// No project path can be derived from the address
    #[error("cannot resolve '{address}': the component path has no project part")]
    MalformedAddress {
        /// The address as given
        address: String,
    },

    /// No project exists at the path, even after following redirects
    #[error("project '{path}' not found")]
    ProjectNotFound {
        /// Project path derived from the address
        path: String,
    },

    /// The user may not read code from the project
    #[error("you do not have permission to read components from project '{project}'")]
    AccessDenied {
        /// Project full path
        project: String,
    },

    /// `~latest` was used on a project that does not publish catalog versions
    #[error("'~latest' can only be used with components of a catalog resource ('{project}' is not one)")]
    InvalidLatestUsage {
        /// Project full path
        project: String,
    },

    /// A shorthand version was used on a project that does not publish catalog versions
    #[error("version '{version}' is a shorthand version, which requires a catalog resource ('{project}' is not one)")]
    InvalidPartialSemverUsage {
        /// Project full path
        project: String,
        /// The shorthand token
        version: String,
    },

    /// Every precedence step was exhausted without a match
    #[error("component '{component}' version '{version}' not found in project '{project}'")]
    Unresolved {
        /// Project full path
        project: String,
        /// Component name
        component: String,
        /// Version token as given
        version: String,
        /// Published version names close to the token
        suggestions: Vec<String>,
    },

    /// The declared input schema rejected the supplied arguments
    #[error("invalid component inputs: {}", errors.join(", "))]
    InvalidInputs {
        /// One message per rejected input
        errors: Vec<String>,
    },

    /// The `spec` header of a component file could not be read
    #[error("invalid component header: {reason}")]
    InvalidHeader {
        /// Why the header was rejected
        reason: String,
    },

    /// A catalog version name was published twice for the same project
    #[error("version '{name}' is already published for project '{project}'")]
    DuplicateVersion {
        /// Project full path
        project: String,
        /// Version name
        name: String,
    },

    /// Configuration file problem
    #[error("configuration error: {message}")]
    ConfigError {
        /// What went wrong
        message: String,
    },

    /// The content loader failed
    #[error(transparent)]
    Loader(anyhow::Error),
}

/// An error with optional details and a suggestion for the user.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ComponentError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no details or suggestion.
    #[must_use]
    pub const fn new(error: ComponentError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

/// Convert any error into an [`ErrorContext`] with a suggestion where one helps.
///
/// Errors that are not a [`ComponentError`] are reported as configuration
/// errors carrying the full `anyhow` context chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    match error.downcast::<ComponentError>() {
        Ok(error) => create_error_context(error),
        Err(other) => ErrorContext::new(ComponentError::ConfigError {
            message: format!("{other:#}"),
        }),
    }
}

fn create_error_context(error: ComponentError) -> ErrorContext {
    match &error {
        ComponentError::NotInstanceAddress { .. } => ErrorContext::new(error)
            .with_suggestion("Check that the address starts with the configured instance_prefix")
            .with_details("Addresses of other hosts are handled by a different resolver"),
        ComponentError::MalformedAddress { .. } => ErrorContext::new(error)
            .with_suggestion("Use the form <host>/<group>/<project>/<component>@<version>"),
        ComponentError::ProjectNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Check the project path for typos and that the project still exists"),
        ComponentError::AccessDenied { .. } => ErrorContext::new(error)
            .with_suggestion("Ask a maintainer of the project for at least read access to its code"),
        ComponentError::InvalidLatestUsage { .. } => ErrorContext::new(error)
            .with_suggestion("Reference a branch, tag or commit instead, or publish the project to the catalog"),
        ComponentError::InvalidPartialSemverUsage { .. } => ErrorContext::new(error)
            .with_suggestion("Use the full version (for example 1.2.3) or a released tag name"),
        ComponentError::Unresolved { suggestions, .. } if !suggestions.is_empty() => {
            let hint = format!("Did you mean: {}?", suggestions.join(", "));
            ErrorContext::new(error).with_suggestion(hint)
        }
        ComponentError::Unresolved { .. } => ErrorContext::new(error).with_suggestion(
            "Check that the version, tag or branch exists and that the component is published",
        ),
        ComponentError::InvalidInputs { .. } => ErrorContext::new(error)
            .with_details("The component cannot be interpolated with an invalid input set")
            .with_suggestion("Pass the inputs declared in the component's spec:inputs section"),
        _ => ErrorContext::new(error),
    }
}
