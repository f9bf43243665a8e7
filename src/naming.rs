//! The on-disk naming contract: `<descriptor>_<version:03>.<extension>`.
//!
//! Composition and parsing live side by side so that the directory scan and
//! `SceneFile::from_path` split names with the exact same rule.

/// Separator between descriptor and version in a file stem.
pub const SEPARATOR: char = '_';

/// Minimum number of digits a version is rendered with.
pub const VERSION_WIDTH: usize = 3;

/// Compose a file name. Versions wider than three digits are not truncated.
pub fn compose_name(descriptor: &str, version: u32, extension: &str) -> String {
    format!(
        "{descriptor}{SEPARATOR}{version:0width$}.{extension}",
        width = VERSION_WIDTH
    )
}

/// Strip `.{extension}` from the end of `name`.
///
/// Returns `None` when the name does not carry that exact extension.
pub fn strip_extension<'a>(name: &'a str, extension: &str) -> Option<&'a str> {
    name.strip_suffix(extension)?.strip_suffix('.')
}

/// Split a stem into its segments on [`SEPARATOR`].
///
/// Returns the first two segments, or `None` if the stem has no separator.
/// Further segments (`ship_002_final`) are counted in `extra_segments`.
pub fn split_stem(stem: &str) -> Option<StemParts<'_>> {
    let mut segments = stem.split(SEPARATOR);
    let descriptor = segments.next()?;
    let version = segments.next()?;
    Some(StemParts {
        descriptor,
        version,
        extra_segments: segments.count(),
    })
}

/// The pieces of a stem split by [`split_stem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StemParts<'a> {
    pub descriptor: &'a str,
    pub version: &'a str,
    /// Segments after the version part.
    pub extra_segments: usize,
}

/// Parse a version segment.
///
/// Leading zeros are stripped first, and an all-zero segment parses to 0.
/// Only ASCII digits are accepted, so `+5`, `-1` or `v2` are rejected.
pub fn parse_version(segment: &str) -> Option<u32> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = segment.trim_start_matches('0');
    if trimmed.is_empty() {
        return Some(0);
    }
    trimmed.parse().ok()
}
