//! Version discovery — find existing versions of a descriptor/extension pair
//! among directory entries.
//!
//! Entries that do not match, do not split, or carry a non-numeric version
//! are skipped; they never make the scan fail.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SmartSaveError};
use crate::naming::{parse_version, split_stem, strip_extension};

/// How an entry name is matched against the descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// The stem must be exactly `<descriptor>_<digits>`.
    /// `car` never matches `carpet_004.ma`.
    #[default]
    Exact,
    /// The name only has to start with the descriptor; the second `_`
    /// segment is taken as the version. `car` matches `carpet_004.ma`, and
    /// `ship_002_final.ma` counts as version 2.
    Prefix,
}

/// One entry that matched and parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    pub name: String,
    pub version: u32,
}

/// Result of scanning a set of entry names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionScan {
    /// Matched entries, sorted by version then name.
    pub entries: Vec<VersionEntry>,
}

impl VersionScan {
    /// Highest version found, 0 when nothing matched.
    pub fn highest(&self) -> u32 {
        self.entries.iter().map(|e| e.version).max().unwrap_or(0)
    }

    /// Version one above the highest, or `None` when there is no prior
    /// version to increment from (nothing matched, or only `_000` files).
    pub fn next_version(&self) -> Result<Option<u32>> {
        match self.highest() {
            0 => Ok(None),
            n => n.checked_add(1).map(Some).ok_or(SmartSaveError::VersionOverflow(n)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scan entry names for versions of `descriptor` with `extension`.
pub fn scan<I, S>(entries: I, descriptor: &str, extension: &str, policy: MatchPolicy) -> VersionScan
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut found: Vec<VersionEntry> = entries
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref();
            let version = match_entry(name, descriptor, extension, policy)?;
            Some(VersionEntry {
                name: name.to_string(),
                version,
            })
        })
        .collect();

    found.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.name.cmp(&b.name)));

    debug!(
        descriptor,
        extension,
        matched = found.len(),
        highest = found.last().map(|e| e.version).unwrap_or(0),
        "version scan complete"
    );

    VersionScan { entries: found }
}

/// Match a single entry name, returning its version.
pub fn match_entry(name: &str, descriptor: &str, extension: &str, policy: MatchPolicy) -> Option<u32> {
    if policy == MatchPolicy::Prefix && !name.starts_with(descriptor) {
        return None;
    }

    let stem = strip_extension(name, extension)?;

    let Some(parts) = split_stem(stem) else {
        debug!(entry = name, "skipping entry without separator");
        return None;
    };

    if policy == MatchPolicy::Exact && (parts.descriptor != descriptor || parts.extra_segments > 0) {
        return None;
    }

    let version = parse_version(parts.version);
    if version.is_none() {
        debug!(entry = name, segment = parts.version, "skipping entry with non-numeric version");
    }
    version
}
