//! Component address parsing.
//!
//! A component address has the shape
//! `<instance_prefix><project_full_path>/<component_name>@<version_token>`,
//! for example `gitlab.example.com/acme/ci/templates/lint@1.2`.
//!
//! The parser only accepts addresses rooted at this instance. Anything else is
//! declined with `None` so the caller can route it to another resolver.
//!
//! # Known limitation
//!
//! The project path and the component name are split on the **last** `/` of
//! the path. A component name that itself contains `/` cannot be expressed:
//! `group/project/nested/lint` always means project `group/project/nested`
//! and component `lint`.

use std::fmt;

/// A parsed, instance-local component address.
///
/// Created per resolution request and never mutated. The project path and
/// component name are derived on demand from [`full_path`](Self::full_path).
///
/// # Examples
///
/// ```rust
/// use cicomp::reference::ComponentReference;
///
/// let reference =
///     ComponentReference::parse("gitlab.example.com/acme/ci/lint@1.0", "gitlab.example.com/")
///         .unwrap();
///
/// assert_eq!(reference.project_full_path(), Some("acme/ci"));
/// assert_eq!(reference.component_name(), Some("lint"));
/// assert_eq!(reference.version_token(), "1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentReference {
    instance_prefix: String,
    full_path: String,
    version_token: String,
}

impl ComponentReference {
    /// Parse `address` if it belongs to this instance.
    ///
    /// Returns `None` when `address` does not start with `instance_prefix`
    /// (a foreign address, not a failure). The version token is everything
    /// after the last `@`; an address without `@` has an empty token.
    #[must_use]
    pub fn parse(address: &str, instance_prefix: &str) -> Option<Self> {
        let rest = address.strip_prefix(instance_prefix)?;

        let (full_path, version_token) = match rest.rsplit_once('@') {
            Some((path, version)) => (path, version),
            None => (rest, ""),
        };

        Some(Self {
            instance_prefix: instance_prefix.to_string(),
            full_path: full_path.to_string(),
            version_token: version_token.to_string(),
        })
    }

    /// The host prefix this reference was parsed against.
    #[must_use]
    pub fn instance_prefix(&self) -> &str {
        &self.instance_prefix
    }

    /// Everything between the instance prefix and the last `@`.
    #[must_use]
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Everything after the last `@`.
    #[must_use]
    pub fn version_token(&self) -> &str {
        &self.version_token
    }

    /// Project path: the part of [`full_path`](Self::full_path) before its last `/`.
    ///
    /// `None` when the path starts with `/` or contains no `/` at all, in which
    /// case no project can be addressed and resolution must fail closed.
    #[must_use]
    pub fn project_full_path(&self) -> Option<&str> {
        if self.full_path.starts_with('/') {
            return None;
        }
        match self.full_path.rsplit_once('/') {
            Some((project, _)) if !project.is_empty() => Some(project),
            _ => None,
        }
    }

    /// Component name: the part of [`full_path`](Self::full_path) after its last `/`.
    #[must_use]
    pub fn component_name(&self) -> Option<&str> {
        self.project_full_path()?;
        self.full_path.rsplit_once('/').map(|(_, name)| name).filter(|name| !name.is_empty())
    }
}

impl fmt::Display for ComponentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}@{}", self.instance_prefix, self.full_path, self.version_token)
    }
}
