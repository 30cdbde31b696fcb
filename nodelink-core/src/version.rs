use core::cmp::Ordering;

use log::debug;
use serde::Deserialize;

/// A dotted numeric version, e.g. `v24.02.2` or `23.11-modded`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Version {
    parts: Vec<u64>,
    build_tag: bool,
}

impl Version {
    /// Parse a reported version string.
    ///
    /// An optional leading `v` is skipped. The numeric prefix must be one or
    /// more dot-separated integers; anything after it is a build tag.
    /// Returns `None` for anything else.
    pub fn parse(s: &str) -> Option<Version> {
        let s = s.trim();
        let s = s.strip_prefix('v').or_else(|| s.strip_prefix('V')).unwrap_or(s);
        let end = s.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(s.len());
        let (numeric, tag) = s.split_at(end);
        if numeric.is_empty() {
            return None;
        }
        let parts = numeric
            .split('.')
            .map(|p| if p.is_empty() { None } else { p.parse::<u64>().ok() })
            .collect::<Option<Vec<_>>>()?;
        Some(Version { parts, build_tag: !tag.is_empty() })
    }

    /// Numeric components
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    /// Whether the string carried text after the numeric part
    pub fn has_build_tag(&self) -> bool {
        self.build_tag
    }

    /// Compare numeric components, treating missing trailing ones as zero
    pub fn cmp_numeric(&self, other: &Version) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

/// Whether `reported` is at least `min`.
///
/// No minimum means no constraint. A missing or unparseable reported version,
/// or an unparseable minimum, is unsupported. When the reported version
/// carries a build tag and `special_build_min` is given, that minimum applies
/// instead of `min`.
pub fn is_supported_version(
    reported: Option<&str>,
    min: Option<&str>,
    special_build_min: Option<&str>,
) -> bool {
    let min = match min {
        None => return true,
        Some(min) => min,
    };
    let reported = match reported.and_then(Version::parse) {
        None => return false,
        Some(v) => v,
    };
    let threshold = match special_build_min {
        Some(special) if reported.has_build_tag() => special,
        _ => min,
    };
    match Version::parse(threshold) {
        Some(threshold) => reported.cmp_numeric(&threshold) != Ordering::Less,
        None => {
            debug!("unparseable minimum version {:?}", threshold);
            false
        }
    }
}

/// Versions reported by the connected node
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct NodeVersions {
    /// Software release version
    pub version: Option<String>,
    /// Independently versioned RPC schema version
    pub api_version: Option<String>,
}

impl NodeVersions {
    /// Create from the two reported strings
    pub fn new(version: Option<String>, api_version: Option<String>) -> Self {
        Self { version, api_version }
    }

    /// Software version gate, ANDed with an API version gate when `min_api` is given
    pub fn supports(
        &self,
        min_version: Option<&str>,
        special_build_min: Option<&str>,
        min_api: Option<&str>,
    ) -> bool {
        let software =
            is_supported_version(self.version.as_deref(), min_version, special_build_min);
        match min_api {
            Some(min_api) =>
                software && is_supported_version(self.api_version.as_deref(), Some(min_api), None),
            None => software,
        }
    }
}
