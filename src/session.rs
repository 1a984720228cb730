//! Saved form state for the CLI.
//!
//! A [`SessionSnapshot`] holds the last-used form fields and uploaded files
//! (base64) as JSON in `$XDG_STATE_HOME/quill/session.json`. Files are
//! addressed by position.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::detect::{default_media_type, detect_from_filename};
use crate::ingest::{MediaKind, UploadedResource};

/// Errors from session persistence.
#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error("failed to read {path}")]
    #[diagnostic(
        code(quill::session::read),
        help("Check that the file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write session: {path}")]
    #[diagnostic(
        code(quill::session::write),
        help("Ensure you have write permissions to the state directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt session file {path}: {message}")]
    #[diagnostic(
        code(quill::session::parse),
        help("Run `quill session reset` to discard the saved session.")
    )]
    Parse { path: String, message: String },

    #[error("stored file \"{name}\" has invalid base64 data")]
    #[diagnostic(
        code(quill::session::decode),
        help("Remove the file with `quill session remove <index>` and add it again.")
    )]
    Decode { name: String, message: String },

    #[error("no stored file at index {index} (session has {len})")]
    #[diagnostic(
        code(quill::session::index),
        help("List stored files with `quill session show`. Indices start at 0.")
    )]
    NoSuchFile { index: usize, len: usize },
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// One uploaded file as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    /// Base64 of the file bytes.
    pub data: String,
    #[serde(default)]
    pub source_url: String,
}

impl StoredFile {
    pub fn from_bytes(name: impl Into<String>, content_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: BASE64.encode(bytes),
            source_url: String::new(),
        }
    }

    /// Read a file from disk, guessing its content type from the extension.
    pub fn read(path: &Path) -> SessionResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| SessionError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let kind = detect_from_filename(&name).unwrap_or(MediaKind::Unsupported);
        Ok(Self::from_bytes(name, default_media_type(kind), &bytes))
    }

    /// Decode back into an upload, carrying the source URL along.
    pub fn to_resource(&self) -> SessionResult<UploadedResource> {
        let bytes = BASE64
            .decode(self.data.as_bytes())
            .map_err(|e| SessionError::Decode {
                name: self.name.clone(),
                message: e.to_string(),
            })?;
        Ok(UploadedResource::new(&self.name, &self.content_type, bytes)
            .with_source_url(&self.source_url))
    }
}

/// The persisted form state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSnapshot {
    pub context: String,
    pub additional_instructions: String,
    pub page_count: String,
    pub discussion_post: String,
    pub generated_content: String,
    pub active_tab: String,
    pub stored_files: Vec<StoredFile>,
    pub ai_model: String,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            context: String::new(),
            additional_instructions: String::new(),
            page_count: "2".into(),
            discussion_post: String::new(),
            generated_content: String::new(),
            active_tab: "discussion".into(),
            stored_files: Vec::new(),
            ai_model: String::new(),
        }
    }
}

impl SessionSnapshot {
    /// Load a snapshot, or the defaults when none was saved.
    pub fn load(path: &Path) -> SessionResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(SessionError::Read {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };
        serde_json::from_str(&content).map_err(|e| SessionError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> SessionResult<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| SessionError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| SessionError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Delete the saved snapshot. Returns whether one existed.
    pub fn reset(path: &Path) -> SessionResult<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SessionError::Write {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    pub fn add_file(&mut self, file: StoredFile) {
        self.stored_files.push(file);
    }

    pub fn remove_file(&mut self, index: usize) -> SessionResult<StoredFile> {
        self.check_index(index)?;
        Ok(self.stored_files.remove(index))
    }

    pub fn set_source(&mut self, index: usize, url: impl Into<String>) -> SessionResult<()> {
        self.check_index(index)?;
        self.stored_files[index].source_url = url.into();
        Ok(())
    }

    /// Decode every stored file, in order.
    pub fn resources(&self) -> SessionResult<Vec<UploadedResource>> {
        self.stored_files.iter().map(StoredFile::to_resource).collect()
    }

    fn check_index(&self, index: usize) -> SessionResult<()> {
        if index < self.stored_files.len() {
            Ok(())
        } else {
            Err(SessionError::NoSuchFile {
                index,
                len: self.stored_files.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SessionSnapshot::load(&dir.path().join("session.json")).unwrap();
        assert_eq!(snapshot.page_count, "2");
        assert_eq!(snapshot.active_tab, "discussion");
        assert!(snapshot.stored_files.is_empty());
    }

    #[test]
    fn older_snapshots_without_source_url_still_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(
            &path,
            r#"{"context":"week 2","storedFiles":[{"name":"a.txt","type":"text/plain","data":"aGk="}]}"#,
        )
        .unwrap();

        let snapshot = SessionSnapshot::load(&path).unwrap();
        assert_eq!(snapshot.context, "week 2");
        assert_eq!(snapshot.page_count, "2");
        assert_eq!(snapshot.stored_files[0].source_url, "");

        let resources = snapshot.resources().unwrap();
        assert_eq!(resources[0].bytes, b"hi");
        assert!(!resources[0].is_citable());
    }

    #[test]
    fn save_uses_camel_case_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state/session.json");
        let mut snapshot = SessionSnapshot::default();
        snapshot.add_file(StoredFile::from_bytes("r.pdf", "application/pdf", b"%PDF"));
        snapshot.set_source(0, "https://example.org/r").unwrap();
        snapshot.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"storedFiles\""));
        assert!(raw.contains("\"sourceUrl\": \"https://example.org/r\""));
        assert!(raw.contains("\"type\": \"application/pdf\""));
        assert_eq!(SessionSnapshot::load(&path).unwrap(), snapshot);
    }

    #[test]
    fn positional_edits() {
        let mut snapshot = SessionSnapshot::default();
        snapshot.add_file(StoredFile::from_bytes("a.txt", "text/plain", b"a"));
        snapshot.add_file(StoredFile::from_bytes("b.txt", "text/plain", b"b"));

        assert!(matches!(
            snapshot.set_source(2, "x"),
            Err(SessionError::NoSuchFile { index: 2, len: 2 })
        ));
        let removed = snapshot.remove_file(0).unwrap();
        assert_eq!(removed.name, "a.txt");
        assert_eq!(snapshot.stored_files[0].name, "b.txt");
    }

    #[test]
    fn read_guesses_type_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Notes.HTML");
        std::fs::write(&path, "<p>x</p>").unwrap();
        let file = StoredFile::read(&path).unwrap();
        assert_eq!(file.name, "Notes.HTML");
        assert_eq!(file.content_type, "text/html");
        assert_eq!(file.to_resource().unwrap().media_kind, MediaKind::Markup);
    }

    #[test]
    fn bad_base64_is_reported() {
        let file = StoredFile {
            name: "x.txt".into(),
            content_type: "text/plain".into(),
            data: "***".into(),
            source_url: String::new(),
        };
        assert!(matches!(file.to_resource(), Err(SessionError::Decode { .. })));
    }

    #[test]
    fn reset_deletes_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        SessionSnapshot::default().save(&path).unwrap();
        assert!(SessionSnapshot::reset(&path).unwrap());
        assert!(!path.exists());
        assert!(!SessionSnapshot::reset(&path).unwrap());
    }
}
