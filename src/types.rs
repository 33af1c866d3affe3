use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// One uploaded or known project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Base file name, e.g. `style.css`.
    pub name: String,
    /// Full relative path as uploaded. This is the lookup key in a [`ProjectFileMap`].
    pub path: String,
    /// Raw text, or a `data:` URI when the file is binary.
    pub content: String,
    /// MIME type as reported by the source. Best effort only.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Byte length, for display only.
    pub size: u64,
}

impl ProjectFile {
    /// Creates a text file entry. The MIME type is guessed from the extension.
    pub fn text(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();
        let mime_type = mime_guess::from_path(&path)
            .first_raw()
            .unwrap_or("text/plain")
            .to_string();
        Self {
            name: base_name(&path).to_string(),
            size: content.len() as u64,
            path,
            content,
            mime_type,
        }
    }

    /// Creates a binary file entry whose content is a base64 `data:` URI.
    pub fn binary(path: impl Into<String>, bytes: &[u8], mime_type: impl Into<String>) -> Self {
        let path = path.into();
        let mime_type = mime_type.into();
        Self {
            name: base_name(&path).to_string(),
            content: format!("data:{};base64,{}", mime_type, BASE64.encode(bytes)),
            size: bytes.len() as u64,
            path,
            mime_type,
        }
    }

    pub fn is_data_uri(&self) -> bool {
        self.content.starts_with("data:")
    }
}

/// Last `/`-separated segment of a path.
pub(crate) fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Mapping from relative path to [`ProjectFile`].
///
/// Iteration is in lexicographic path order, which is what "first file" means wherever
/// the processor falls back to scanning the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectFileMap {
    files: BTreeMap<String, ProjectFile>,
}

impl ProjectFileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a file under its own `path`, replacing any previous entry.
    pub fn insert(&mut self, file: ProjectFile) -> Option<ProjectFile> {
        self.files.insert(file.path.clone(), file)
    }

    pub fn get(&self, path: &str) -> Option<&ProjectFile> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ProjectFile> {
        self.files.iter()
    }

    pub fn files(&self) -> impl Iterator<Item = &ProjectFile> {
        self.files.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Sum of all file sizes in bytes.
    pub fn total_size(&self) -> u64 {
        self.files.values().map(|f| f.size).sum()
    }
}

impl FromIterator<ProjectFile> for ProjectFileMap {
    fn from_iter<I: IntoIterator<Item = ProjectFile>>(iter: I) -> Self {
        let mut map = ProjectFileMap::new();
        for file in iter {
            map.insert(file);
        }
        map
    }
}

impl<'a> IntoIterator for &'a ProjectFileMap {
    type Item = (&'a String, &'a ProjectFile);
    type IntoIter = btree_map::Iter<'a, String, ProjectFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// A complete generated HTML document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewDocument(String);

impl PreviewDocument {
    pub fn new(html: impl Into<String>) -> Self {
        Self(html.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for PreviewDocument {
    fn from(html: String) -> Self {
        Self(html)
    }
}

impl fmt::Display for PreviewDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Summary of one project processing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub files_count: usize,
    pub total_size: u64,
    pub processing_time_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Log,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Log => "log",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A console event as posted from the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsoleMessage {
    pub level: LogLevel,
    pub message: String,
}

impl ConsoleMessage {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// A console event as recorded by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsoleLogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: String,
}
