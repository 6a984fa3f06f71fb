//! Core types for bulk-dl

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::FetchError;

/// One input pair: a reference URL (used only to name the output file) and
/// the URL actually fetched.
///
/// Either URL may be empty. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    identifier: String,
    reference_url: String,
    source_url: String,
}

impl WorkItem {
    /// Build a work item, deriving its identifier from `reference_url`
    ///
    /// See [`derive_identifier`] for the naming rules.
    pub fn new(reference_url: impl Into<String>, source_url: impl Into<String>) -> Self {
        let reference_url = reference_url.into();
        let identifier = derive_identifier(&reference_url);
        Self {
            identifier,
            reference_url,
            source_url: source_url.into(),
        }
    }

    /// File stem used for the downloaded file
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// URL the identifier was derived from
    pub fn reference_url(&self) -> &str {
        &self.reference_url
    }

    /// URL to fetch (empty when the item has no downloadable source)
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Key two items are considered duplicates under.
    ///
    /// Items with a source URL collapse on that URL. Items without one are
    /// keyed on their reference URL, so they only collapse with an item that
    /// has the same (possibly empty) reference URL.
    pub fn identity_key(&self) -> String {
        if self.source_url.is_empty() {
            format!("none:{}", self.reference_url)
        } else {
            self.source_url.clone()
        }
    }
}

impl<R: Into<String>, S: Into<String>> From<(R, S)> for WorkItem {
    fn from((reference_url, source_url): (R, S)) -> Self {
        Self::new(reference_url, source_url)
    }
}

/// Derive an output file stem from a reference URL.
///
/// Rules, in order:
/// 1. the last non-empty path segment (trailing `/` ignored); opaque URLs
///    such as `id:abc` use their whole path (`abc`)
/// 2. the host, when the URL has no path segment (`https://example.com/`)
/// 3. for strings that do not parse as URLs, the text after the final `/`
///    once trailing slashes are stripped
/// 4. `unknown_<unix millis>` when nothing usable remains
pub fn derive_identifier(reference_url: &str) -> String {
    let trimmed = reference_url.trim();
    let derived = match url::Url::parse(trimmed) {
        Ok(parsed) => identifier_from_url(&parsed),
        Err(_) => trimmed
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string),
    };

    derived.unwrap_or_else(|| format!("unknown_{}", chrono::Utc::now().timestamp_millis()))
}

fn identifier_from_url(parsed: &url::Url) -> Option<String> {
    if parsed.cannot_be_a_base() {
        let path = parsed.path().trim_end_matches('/');
        return path
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(str::to_string);
    }

    if let Some(segments) = parsed.path_segments()
        && let Some(last) = segments.filter(|s| !s.is_empty()).next_back()
    {
        return Some(last.to_string());
    }

    parsed
        .host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}

/// A [`WorkItem`] bound to its filesystem paths, ready to execute.
///
/// Stateless after construction: bytes written and file handles live only in
/// the execution of a download, never in the task value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    identifier: String,
    source_url: String,
    target_path: PathBuf,
    temp_path: PathBuf,
}

impl Task {
    /// Bind `item` to `<output_dir>/<identifier>.<extension>` and its `.part` sibling
    pub fn new(item: &WorkItem, output_dir: &Path, extension: &str) -> Self {
        let target_path = output_dir.join(format!("{}.{}", item.identifier(), extension));
        let mut temp_name = OsString::from(target_path.as_os_str());
        temp_name.push(".part");
        Self {
            identifier: item.identifier().to_string(),
            source_url: item.source_url().to_string(),
            target_path,
            temp_path: PathBuf::from(temp_name),
        }
    }

    /// File stem of the output file
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// URL to fetch (may be empty)
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Final location of the downloaded file
    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Location the body is streamed to before promotion
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }
}

/// Why a task finished without fetching anything
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The work item had an empty source URL
    NoSourceUrl,
    /// A non-empty file already exists at the target path
    AlreadyDownloaded,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoSourceUrl => write!(f, "no source URL"),
            SkipReason::AlreadyDownloaded => write!(f, "already downloaded"),
        }
    }
}

/// Terminal result of one task
#[derive(Debug)]
pub enum OutcomeKind {
    /// File was downloaded and promoted to this path
    Success {
        /// Final path of the downloaded file
        path: PathBuf,
    },
    /// Download failed; nothing was left at the target or temp path
    Failed {
        /// Why the download failed
        error: FetchError,
    },
    /// Nothing to do
    Skipped {
        /// Why the task was skipped
        reason: SkipReason,
    },
}

/// Terminal result of one task, tagged with the task's identifier
#[derive(Debug)]
pub struct Outcome {
    /// Identifier of the task that produced this outcome
    pub identifier: String,
    /// What happened
    pub kind: OutcomeKind,
}

impl Outcome {
    /// Successful download promoted to `path`
    pub fn success(identifier: impl Into<String>, path: PathBuf) -> Self {
        Self {
            identifier: identifier.into(),
            kind: OutcomeKind::Success { path },
        }
    }

    /// Failed download
    pub fn failed(identifier: impl Into<String>, error: FetchError) -> Self {
        Self {
            identifier: identifier.into(),
            kind: OutcomeKind::Failed { error },
        }
    }

    /// Skipped task
    pub fn skipped(identifier: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            identifier: identifier.into(),
            kind: OutcomeKind::Skipped { reason },
        }
    }

    /// True for [`OutcomeKind::Success`]
    pub fn is_success(&self) -> bool {
        matches!(self.kind, OutcomeKind::Success { .. })
    }

    /// True for [`OutcomeKind::Failed`]
    pub fn is_failed(&self) -> bool {
        matches!(self.kind, OutcomeKind::Failed { .. })
    }

    /// True for [`OutcomeKind::Skipped`]
    pub fn is_skipped(&self) -> bool {
        matches!(self.kind, OutcomeKind::Skipped { .. })
    }

    /// Console tag: `OK`, `FAIL` or `SKIP`
    pub fn tag(&self) -> &'static str {
        match self.kind {
            OutcomeKind::Success { .. } => "OK",
            OutcomeKind::Failed { .. } => "FAIL",
            OutcomeKind::Skipped { .. } => "SKIP",
        }
    }

    /// Human-readable detail: the output path, failure reason or skip reason
    pub fn detail(&self) -> String {
        match &self.kind {
            OutcomeKind::Success { path } => path.display().to_string(),
            OutcomeKind::Failed { error } => error.to_string(),
            OutcomeKind::Skipped { reason } => reason.to_string(),
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.tag(), self.identifier, self.detail())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_is_last_path_segment() {
        assert_eq!(
            derive_identifier("https://sora.example.com/d/gen_01abc"),
            "gen_01abc"
        );
    }

    #[test]
    fn identifier_ignores_trailing_slash() {
        assert_eq!(derive_identifier("https://example.com/d/gen_xyz/"), "gen_xyz");
        assert_eq!(derive_identifier("https://example.com/d/gen_xyz//"), "gen_xyz");
    }

    #[test]
    fn identifier_ignores_query_string() {
        assert_eq!(
            derive_identifier("https://example.com/v/clip42?sig=abc&exp=1"),
            "clip42"
        );
    }

    #[test]
    fn identifier_from_opaque_url_uses_path() {
        assert_eq!(derive_identifier("id:abc"), "abc");
    }

    #[test]
    fn identifier_falls_back_to_host_without_path() {
        assert_eq!(derive_identifier("https://example.com/"), "example.com");
    }

    #[test]
    fn identifier_from_non_url_uses_text_after_last_slash() {
        assert_eq!(derive_identifier("videos/batch/item7"), "item7");
        assert_eq!(derive_identifier("plain-name"), "plain-name");
    }

    #[test]
    fn empty_reference_gets_generated_identifier() {
        let id = derive_identifier("");
        assert!(id.starts_with("unknown_"), "got {id}");
        assert!(id["unknown_".len()..].parse::<i64>().is_ok());
    }

    #[test]
    fn identity_key_prefers_source_url() {
        let item = WorkItem::new("https://ref/a", "https://cdn/a.mp4");
        assert_eq!(item.identity_key(), "https://cdn/a.mp4");
    }

    #[test]
    fn identity_key_without_source_uses_reference() {
        let item = WorkItem::new("https://ref/a", "");
        assert_eq!(item.identity_key(), "none:https://ref/a");
    }

    #[test]
    fn task_paths_are_derived_from_identifier() {
        let item = WorkItem::new("https://ref/d/gen_1", "https://cdn/x");
        let task = Task::new(&item, Path::new("/out"), "mp4");

        assert_eq!(task.identifier(), "gen_1");
        assert_eq!(task.target_path(), Path::new("/out/gen_1.mp4"));
        assert_eq!(task.temp_path(), Path::new("/out/gen_1.mp4.part"));
        assert_eq!(task.source_url(), "https://cdn/x");
    }

    #[test]
    fn outcome_display_matches_console_contract() {
        let ok = Outcome::success("abc", PathBuf::from("out/abc.mp4"));
        assert_eq!(ok.to_string(), "[OK] abc: out/abc.mp4");

        let failed = Outcome::failed("def", FetchError::Status(403));
        assert_eq!(
            failed.to_string(),
            "[FAIL] def: 403 Forbidden (signed URL may be expired)"
        );

        let skipped = Outcome::skipped("ghi", SkipReason::NoSourceUrl);
        assert_eq!(skipped.to_string(), "[SKIP] ghi: no source URL");
    }

    #[test]
    fn outcome_predicates() {
        let skipped = Outcome::skipped("x", SkipReason::AlreadyDownloaded);
        assert!(skipped.is_skipped());
        assert!(!skipped.is_success());
        assert!(!skipped.is_failed());
        assert_eq!(skipped.detail(), "already downloaded");
    }

    #[test]
    fn work_item_from_tuple() {
        let item: WorkItem = ("https://ref/a", "").into();
        assert_eq!(item.identifier(), "a");
        assert!(item.source_url().is_empty());
    }
}
