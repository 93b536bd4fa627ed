//! Keyword tag editing.
//!
//! A comma-joined string is the single source of truth for execution and
//! preset keywords. The tag list is always derived from it: split on `,`,
//! trim each segment, drop empties. Tag edits rewrite the string with `", "`.

pub const KEYWORD_SEPARATOR: &str = ", ";

/// Split a keyword string into tags.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_keywords<S: AsRef<str>>(tags: &[S]) -> String {
    tags.iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(KEYWORD_SEPARATOR)
}

/// Canonical form of a keyword string. Idempotent.
pub fn normalize_keywords(raw: &str) -> String {
    join_keywords(&parse_keywords(raw))
}

/// Editor state behind a keyword field: the raw string plus tag operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordTags {
    raw: String,
}

impl KeywordTags {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Current string, exactly as last written (free-text edits are kept
    /// verbatim until a tag operation rewrites it).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn tags(&self) -> Vec<String> {
        parse_keywords(&self.raw)
    }

    pub fn is_empty(&self) -> bool {
        self.tags().is_empty()
    }

    /// Free-text edit of the underlying field.
    pub fn set_raw(&mut self, raw: impl Into<String>) {
        self.raw = raw.into();
    }

    /// Append one tag. Blank input is ignored; returns whether a tag was added.
    pub fn add(&mut self, input: &str) -> bool {
        let tag = input.trim();
        if tag.is_empty() {
            return false;
        }
        let mut tags = self.tags();
        tags.push(tag.to_string());
        self.raw = join_keywords(&tags);
        true
    }

    /// Remove the tag at `index` in the derived list; out of range is a no-op.
    pub fn remove(&mut self, index: usize) -> Option<String> {
        let mut tags = self.tags();
        if index >= tags.len() {
            return None;
        }
        let removed = tags.remove(index);
        self.raw = join_keywords(&tags);
        Some(removed)
    }

    pub fn into_string(self) -> String {
        self.raw
    }
}

impl From<&str> for KeywordTags {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
