//! Version token grammar and semantic version ordering.
//!
//! The trailing token of a component address is overloaded. This module knows
//! the two tokens that carry catalog semantics on their own:
//!
//! - **`~latest`** - the latest published version of the catalog resource
//! - **Shorthand semver** - `1` or `1.2`, matching `^\d+(\.\d+)?$`, meaning the
//!   highest published version with that major (and minor) prefix
//!
//! Every other token is either an exact catalog version name, a released tag
//! or a raw repository ref, which the [`crate::resolver`] tells apart.
//!
//! # Ordering
//!
//! Versions are ordered by `(major, minor, patch)` numerically. For the same
//! numeric triple a pre-release is lower than the release. Two pre-releases of
//! the same triple fall back to semver identifier ordering. Build metadata is
//! ignored.

use semver::Version;
use std::cmp::Ordering;
use std::sync::OnceLock;

use crate::constants::LATEST_VERSION_TOKEN;

fn shorthand_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"^(?P<major>\d+)(\.(?P<minor>\d+))?$")
            .expect("shorthand version pattern is valid")
    })
}

/// A `major` or `major.minor` version prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShorthandVersion {
    /// Requested major version
    pub major: u64,
    /// Requested minor version, if the token had one
    pub minor: Option<u64>,
}

impl ShorthandVersion {
    /// Parse a shorthand token such as `1` or `1.2`.
    ///
    /// Full triples (`1.2.3`), prefixed tags (`v1`) and anything with
    /// pre-release or build suffixes are not shorthand and return `None`.
    /// So are tokens that match the grammar but whose numbers overflow `u64`;
    /// use [`is_shorthand`] to classify a token.
    ///
    /// ```rust
    /// use cicomp::version::ShorthandVersion;
    ///
    /// let short = ShorthandVersion::parse("1.2").unwrap();
    /// assert_eq!((short.major, short.minor), (1, Some(2)));
    /// assert!(ShorthandVersion::parse("1.2.3").is_none());
    /// ```
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let captures = shorthand_pattern().captures(token)?;
        let major = captures.name("major")?.as_str().parse().ok()?;
        let minor = match captures.name("minor") {
            Some(minor) => Some(minor.as_str().parse().ok()?),
            None => None,
        };
        Some(Self {
            major,
            minor,
        })
    }

    /// Whether `version` falls under this prefix.
    #[must_use]
    pub fn matches(&self, version: &Version) -> bool {
        version.major == self.major && self.minor.is_none_or(|minor| version.minor == minor)
    }
}

/// Whether `token` is the `~latest` sentinel.
#[must_use]
pub fn is_latest(token: &str) -> bool {
    token == LATEST_VERSION_TOKEN
}

/// Whether `token` matches the shorthand grammar `^\d+(\.\d+)?$`.
#[must_use]
pub fn is_shorthand(token: &str) -> bool {
    shorthand_pattern().is_match(token)
}

/// Parse a published version name as semver.
///
/// A leading `v`/`V` is accepted, matching how release tags are commonly
/// named. Names that do not parse are still valid catalog versions, they are
/// just invisible to `latest` and shorthand matching.
#[must_use]
pub fn parse_version_name(name: &str) -> Option<Version> {
    let trimmed = name.strip_prefix(['v', 'V']).unwrap_or(name);
    Version::parse(trimmed).ok()
}

/// Compare two versions by precedence, ignoring build metadata.
#[must_use]
pub fn compare_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| match (a.pre.is_empty(), b.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.pre.cmp(&b.pre),
        })
}
