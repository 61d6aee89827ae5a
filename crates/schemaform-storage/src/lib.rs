//! File persistence for schemaform uploads.
//!
//! The form layer never touches the filesystem directly: upload handling is
//! delegated to a [`FileStore`], which turns a raw upload into an opaque
//! stored-reference token and can later produce the original filename and
//! bytes back from that token. [`FolderStore`] is the built-in
//! implementation, writing into a configured folder with collision-free
//! generated names.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use schemaform_core::error::{FormError, FormResult};
use schemaform_core::Settings;
use schemaform_http::UploadedFile;

/// Names the schema slot an upload belongs to.
///
/// Stored-reference tokens embed the owning table and field so a token is
/// traceable back to its origin and sharded stores can compute subfolders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageSlot<'a> {
    /// The owning table name.
    pub table: &'a str,
    /// The owning field name.
    pub field: &'a str,
}

impl<'a> StorageSlot<'a> {
    /// Creates a slot for `table.field`.
    pub const fn new(table: &'a str, field: &'a str) -> Self {
        Self { table, field }
    }
}

/// A synchronous file-persistence collaborator.
///
/// `store` either returns a stored-reference token or fails; no partial
/// writes are retried or recovered here.
pub trait FileStore: Send + Sync + fmt::Debug {
    /// Persists an upload, returning the stored-reference token.
    ///
    /// `filename_hint` overrides the payload's own filename when the
    /// submission carried the original name out of band.
    fn store(
        &self,
        file: &UploadedFile,
        filename_hint: Option<&str>,
        slot: &StorageSlot<'_>,
    ) -> FormResult<String>;

    /// Resolves a stored-reference token back into the original filename
    /// and the raw bytes.
    fn retrieve(&self, token: &str, slot: &StorageSlot<'_>) -> FormResult<(String, Vec<u8>)>;
}

/// A [`FileStore`] writing uploads into a folder on disk.
///
/// Tokens have the shape `{table}.{field}.{key16}.{hexname}.{ext}` where
/// `key16` is a random collision key and `hexname` is the hex-encoded
/// original filename, so `retrieve` can reconstruct the client's name
/// without a side table. With `separate` enabled, files shard into
/// `{table}.{field}/{key16[..2]}/` subfolders.
#[derive(Debug, Clone)]
pub struct FolderStore {
    folder: PathBuf,
    separate: bool,
}

impl FolderStore {
    /// Creates a store rooted at `folder`.
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            separate: false,
        }
    }

    /// Enables sharding into per-field subfolders.
    #[must_use]
    pub const fn separate(mut self, separate: bool) -> Self {
        self.separate = separate;
        self
    }

    /// Builds a store from workspace settings.
    ///
    /// Fails if `upload_folder` is not configured.
    pub fn from_settings(settings: &Settings) -> FormResult<Self> {
        let folder = settings.upload_folder.clone().ok_or_else(|| {
            FormError::Configuration("upload_folder is not configured".to_string())
        })?;
        Ok(Self::new(folder).separate(settings.upload_separate))
    }

    fn dir_for(&self, slot: &StorageSlot<'_>, key: &str) -> PathBuf {
        if self.separate {
            self.folder
                .join(format!("{}.{}", slot.table, slot.field))
                .join(&key[..2])
        } else {
            self.folder.clone()
        }
    }
}

impl FileStore for FolderStore {
    fn store(
        &self,
        file: &UploadedFile,
        filename_hint: Option<&str>,
        slot: &StorageSlot<'_>,
    ) -> FormResult<String> {
        let client_name = match filename_hint {
            Some(hint) if !hint.is_empty() => hint,
            _ => file.name.as_str(),
        };
        let client_name = basename(client_name);
        let ext = extension(client_name);
        let key = collision_key();
        let token = format!(
            "{}.{}.{}.{}.{}",
            slot.table,
            slot.field,
            key,
            hex::encode(client_name.as_bytes()),
            ext
        );

        let dir = self.dir_for(slot, &key);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(&token);
        std::fs::write(&path, &file.content)?;
        debug!(token = %token, bytes = file.size(), "stored upload");
        Ok(token)
    }

    fn retrieve(&self, token: &str, slot: &StorageSlot<'_>) -> FormResult<(String, Vec<u8>)> {
        let parsed = parse_token(token)
            .ok_or_else(|| FormError::BadStoredReference(token.to_string()))?;
        let dir = self.dir_for(slot, &parsed.key);
        let bytes = std::fs::read(dir.join(token))?;
        Ok((parsed.filename, bytes))
    }
}

struct ParsedToken {
    key: String,
    filename: String,
}

/// Splits a token into its collision key and the decoded original filename.
fn parse_token(token: &str) -> Option<ParsedToken> {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    let re = TOKEN.get_or_init(|| {
        Regex::new(r"^(?P<table>\w+)\.(?P<field>\w+)\.(?P<key>[0-9a-f]{16})\.(?P<name>[0-9a-f]+)\.(?P<ext>\w{1,5})$").unwrap()
    });
    let caps = re.captures(token)?;
    let filename = hex::decode(&caps["name"])
        .ok()
        .and_then(|b| String::from_utf8(b).ok())?;
    Some(ParsedToken {
        key: caps["key"].to_string(),
        filename,
    })
}

/// Strips any path components from a client-supplied filename.
fn basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Extracts a short alphanumeric extension, defaulting to `txt`.
fn extension(name: &str) -> String {
    static EXT: OnceLock<Regex> = OnceLock::new();
    let re = EXT.get_or_init(|| Regex::new(r"\.(?P<e>\w{1,5})$").unwrap());
    re.captures(name)
        .map_or_else(|| "txt".to_string(), |c| c["e"].to_lowercase())
}

/// Returns a 16-hex-character random collision key.
fn collision_key() -> String {
    let full = uuid::Uuid::new_v4().simple().to_string();
    full[full.len() - 16..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FolderStore {
        let dir = std::env::temp_dir().join(format!(
            "schemaform-storage-test-{}",
            uuid::Uuid::new_v4().simple()
        ));
        FolderStore::new(dir)
    }

    fn sample_file(name: &str) -> UploadedFile {
        UploadedFile::new(name, "application/octet-stream", b"payload".to_vec())
    }

    #[test]
    fn test_store_and_retrieve_roundtrip() {
        let store = temp_store();
        let slot = StorageSlot::new("person", "photo");
        let token = store
            .store(&sample_file("me.jpg"), None, &slot)
            .expect("store");
        assert!(token.starts_with("person.photo."));
        assert!(token.ends_with(".jpg"));

        let (filename, bytes) = store.retrieve(&token, &slot).expect("retrieve");
        assert_eq!(filename, "me.jpg");
        assert_eq!(bytes, b"payload");
    }

    #[test]
    fn test_store_separate_shards_subfolder() {
        let store = temp_store().separate(true);
        let slot = StorageSlot::new("person", "photo");
        let token = store
            .store(&sample_file("pic.png"), None, &slot)
            .expect("store");
        let (filename, _) = store.retrieve(&token, &slot).expect("retrieve");
        assert_eq!(filename, "pic.png");
    }

    #[test]
    fn test_filename_hint_wins() {
        let store = temp_store();
        let slot = StorageSlot::new("t", "f");
        let token = store
            .store(&sample_file("ignored.bin"), Some("real.gif"), &slot)
            .expect("store");
        assert!(token.ends_with(".gif"));
        let (filename, _) = store.retrieve(&token, &slot).expect("retrieve");
        assert_eq!(filename, "real.gif");
    }

    #[test]
    fn test_path_components_stripped() {
        let store = temp_store();
        let slot = StorageSlot::new("t", "f");
        let token = store
            .store(&sample_file("../../etc/passwd"), None, &slot)
            .expect("store");
        let (filename, _) = store.retrieve(&token, &slot).expect("retrieve");
        assert_eq!(filename, "passwd");
        assert!(token.ends_with(".txt"));
    }

    #[test]
    fn test_retrieve_rejects_garbage_token() {
        let store = temp_store();
        let slot = StorageSlot::new("t", "f");
        let err = store.retrieve("not-a-token", &slot).unwrap_err();
        assert!(matches!(err, FormError::BadStoredReference(_)));
    }

    #[test]
    fn test_from_settings_requires_folder() {
        let settings = Settings::default();
        assert!(FolderStore::from_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.upload_folder = Some(std::env::temp_dir());
        assert!(FolderStore::from_settings(&settings).is_ok());
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(extension("noext"), "txt");
        assert_eq!(extension("a.JPEG"), "jpeg");
        assert_eq!(extension("weird.verylongext"), "txt");
    }
}
