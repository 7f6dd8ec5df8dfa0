//! Semantic-version tag values and increment kinds.

use semver::Version;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid semver: {0}")]
    InvalidFormat(String),
}

/// The MAJOR.MINOR.PATCH triple a release tag carries.
///
/// Ordering is lexicographic on (major, minor, patch), which the field
/// order of the derived `Ord` provides. Values are immutable; bumping
/// produces a new value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagVersion {
    major: u64,
    minor: u64,
    patch: u64,
}

impl TagVersion {
    pub const ZERO: Self = Self {
        major: 0,
        minor: 0,
        patch: 0,
    };

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a tag name like `v1.2.3` or `1.2.3`.
    ///
    /// The full semver grammar is enforced (no leading zeros, components
    /// must fit `u64`). A pre-release or build suffix is accepted but
    /// discarded: `v1.0.1-rc.1+build.5` parses as `v1.0.1`.
    pub fn parse(text: &str) -> Result<Self, VersionError> {
        let stripped = text.strip_prefix('v').unwrap_or(text);
        let version = Version::parse(stripped)
            .map_err(|_| VersionError::InvalidFormat(text.to_string()))?;

        Ok(Self {
            major: version.major,
            minor: version.minor,
            patch: version.patch,
        })
    }

    /// The next version for the given bump kind.
    ///
    /// Returns `None` for [`Bump::Unknown`] and on arithmetic overflow;
    /// callers surface that as an error rather than panicking.
    pub fn bump(self, kind: Bump) -> Option<Self> {
        let next = match kind {
            Bump::Major => Self::new(self.major.checked_add(1)?, 0, 0),
            Bump::Minor => Self::new(self.major, self.minor.checked_add(1)?, 0),
            Bump::Patch => Self::new(self.major, self.minor, self.patch.checked_add(1)?),
            Bump::Unknown => return None,
        };

        Some(next)
    }
}

impl fmt::Display for TagVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for TagVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// How far a release tag should move, as signalled by pull request labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bump {
    Major,
    Minor,
    Patch,
    Unknown,
}

impl Bump {
    /// Map a label name to its bump kind. Case-sensitive: `"Major"` is
    /// not a sizing label.
    pub fn from_label(label: &str) -> Self {
        match label {
            "major" => Self::Major,
            "minor" => Self::Minor,
            "patch" => Self::Patch,
            _ => Self::Unknown,
        }
    }

    /// Explicit priority table: lower ranks are more significant.
    /// Independent of declaration order.
    const fn priority(self) -> u8 {
        match self {
            Self::Major => 0,
            Self::Minor => 1,
            Self::Patch => 2,
            Self::Unknown => 3,
        }
    }

    /// Pick the most significant bump out of a label set.
    ///
    /// A pull request may carry several sizing labels; `major` beats
    /// `minor` beats `patch`. Unrecognized labels are ignored. Returns
    /// `None` when no sizing label is present.
    pub fn most_significant<'a, I>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        labels
            .into_iter()
            .map(Self::from_label)
            .filter(|bump| *bump != Self::Unknown)
            .min_by_key(|bump| bump.priority())
    }
}

impl PartialOrd for Bump {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bump {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority().cmp(&other.priority())
    }
}
