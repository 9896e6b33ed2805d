//! Precedence tables for the two resolution modes.
//!
//! Each mode is an ordered list of [`Step`]s. A step applies to a
//! `(project, token)` pair or not; when it applies, its lookup runs. A hit
//! ends resolution. A miss either falls through to the next step or, for
//! [`OnMiss::Stop`] steps, ends resolution with no result.

use crate::project::Project;
use crate::version::{ShorthandVersion, is_latest, is_shorthand};

use super::{ResolvedReference, VersionResolver};

/// What happens when a step applies but finds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OnMiss {
    /// Try the next step
    Continue,
    /// Give up: the token is owned by this step
    Stop,
}

type Applies = fn(&Project, &str) -> bool;
type Lookup = fn(&VersionResolver<'_>, &Project, &str) -> Option<ResolvedReference>;

/// One row of a precedence table.
pub(crate) struct Step {
    pub(crate) name: &'static str,
    pub(crate) applies: Applies,
    pub(crate) lookup: Lookup,
    pub(crate) on_miss: OnMiss,
}

pub(crate) const OPTIMIZED: &[Step] = &[
    Step {
        name: "catalog-latest",
        applies: |project, token| project.catalog_resource && is_latest(token),
        lookup: catalog_latest,
        on_miss: OnMiss::Continue,
    },
    Step {
        name: "catalog-shorthand",
        applies: |project, token| project.catalog_resource && is_shorthand(token),
        lookup: catalog_shorthand,
        on_miss: OnMiss::Continue,
    },
    Step {
        name: "catalog-name",
        applies: |project, _| project.catalog_resource,
        lookup: catalog_name,
        on_miss: OnMiss::Continue,
    },
    Step {
        name: "released-tag",
        applies: |_, _| true,
        lookup: released_tag,
        on_miss: OnMiss::Continue,
    },
    Step {
        name: "raw-ref",
        applies: |_, _| true,
        lookup: raw_ref,
        on_miss: OnMiss::Continue,
    },
];

pub(crate) const LEGACY: &[Step] = &[
    Step {
        name: "catalog-latest",
        applies: |_, token| is_latest(token),
        lookup: catalog_latest,
        on_miss: OnMiss::Stop,
    },
    Step {
        name: "catalog-shorthand",
        applies: |_, token| is_shorthand(token),
        lookup: catalog_shorthand,
        on_miss: OnMiss::Stop,
    },
    Step {
        name: "released-tag",
        applies: |_, _| true,
        lookup: released_tag,
        on_miss: OnMiss::Continue,
    },
    Step {
        name: "raw-ref",
        applies: |_, _| true,
        lookup: raw_ref,
        on_miss: OnMiss::Continue,
    },
];

fn catalog_latest(
    resolver: &VersionResolver<'_>,
    project: &Project,
    _token: &str,
) -> Option<ResolvedReference> {
    resolver.catalog.latest(project).map(ResolvedReference::from_catalog)
}

fn catalog_shorthand(
    resolver: &VersionResolver<'_>,
    project: &Project,
    token: &str,
) -> Option<ResolvedReference> {
    let prefix = ShorthandVersion::parse(token)?;
    resolver
        .catalog
        .latest_matching(project, prefix.major, prefix.minor)
        .map(ResolvedReference::from_catalog)
}

fn catalog_name(
    resolver: &VersionResolver<'_>,
    project: &Project,
    token: &str,
) -> Option<ResolvedReference> {
    resolver.catalog.by_name(project, token).map(ResolvedReference::from_catalog)
}

fn released_tag(
    resolver: &VersionResolver<'_>,
    project: &Project,
    token: &str,
) -> Option<ResolvedReference> {
    resolver
        .releases
        .find_release_by_tag(project, token)
        .map(|release| ResolvedReference::from_sha(release.sha))
}

fn raw_ref(
    resolver: &VersionResolver<'_>,
    project: &Project,
    token: &str,
) -> Option<ResolvedReference> {
    resolver.refs.resolve_ref(project, token).map(ResolvedReference::from_sha)
}
