//! Uploaded file payloads and the combined bind-path input.

use std::collections::HashMap;

use crate::querydict::QueryDict;

/// An uploaded file extracted from a form submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// The original filename as provided by the client.
    pub name: String,
    /// The MIME content type of the file.
    pub content_type: String,
    /// The raw file content.
    pub content: Vec<u8>,
}

impl UploadedFile {
    /// Creates an uploaded file payload.
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            content,
        }
    }

    /// Returns the content size in bytes.
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// A complete form submission: scalar/sequence variables plus any file
/// payloads, keyed by field name.
///
/// This is the input of the bind path. How the mapping was produced
/// (urlencoded body, multipart body, test fixture) is the caller's concern.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    /// Posted key/value variables.
    pub vars: QueryDict,
    /// Uploaded files keyed by field name.
    pub files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// Creates an empty submission.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already-parsed variable mapping.
    pub fn from_vars(vars: QueryDict) -> Self {
        Self {
            vars,
            files: HashMap::new(),
        }
    }

    /// Parses a form-urlencoded string into a submission with no files.
    pub fn parse(query_string: &str) -> Self {
        Self::from_vars(QueryDict::parse(query_string))
    }

    /// Builder-style file attachment.
    #[must_use]
    pub fn with_file(mut self, field: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(field.into(), file);
        self
    }

    /// Returns the last posted value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key)
    }

    /// Returns all posted values for `key`.
    pub fn get_list(&self, key: &str) -> Option<&Vec<String>> {
        self.vars.get_list(key)
    }

    /// Returns `true` if `key` was posted as a variable.
    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }
}
