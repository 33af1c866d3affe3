use std::path::PathBuf;
use thiserror::Error;
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("No HTML file found in project. Please include an index.html or any .html file.")]
    NoEntryPoint,
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Walk error: {0}")]
    Walk(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}
impl PreviewError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PreviewError::Io {
            path: path.into(),
            source,
        }
    }
}
