//! Exporting generated documents and formatting run statistics.

use crate::types::{PreviewDocument, ProjectStats};
use crate::PreviewError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::fs;
use std::path::Path;

/// File name used when a preview is saved without an explicit target.
pub const DEFAULT_FILENAME: &str = "preview.html";
pub const HTML_MIME: &str = "text/html";

/// Supported stats formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Writes the document to disk, the CLI's "download as file".
pub fn write_document(document: &PreviewDocument, path: impl AsRef<Path>) -> Result<(), PreviewError> {
    fs::write(&path, document.as_str()).map_err(|e| PreviewError::io(path.as_ref(), e))?;
    #[cfg(feature = "logging")]
    tracing::info!("Wrote {} bytes to {}", document.len(), path.as_ref().display());
    Ok(())
}

/// Encodes the document as a self-contained `data:text/html` URL.
pub fn to_data_url(document: &PreviewDocument) -> String {
    format!(
        "data:{};charset=utf-8;base64,{}",
        HTML_MIME,
        BASE64.encode(document.as_str())
    )
}

/// Human readable byte count, e.g. `1.5 KB`.
pub fn format_bytes(bytes: u64, decimals: usize) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{:.*}", decimals, value);
    // 1.50 -> 1.5, 2.00 -> 2
    let trimmed = if rounded.contains('.') {
        rounded.trim_end_matches('0').trim_end_matches('.')
    } else {
        rounded.as_str()
    };
    format!("{} {}", trimmed, UNITS[unit])
}

pub fn format_stats(stats: &ProjectStats, format: OutputFormat, pretty: bool) -> String {
    match format {
        OutputFormat::Text => format!(
            "Files: {}\nTotal size: {}\nProcessed in {}ms\n",
            stats.files_count,
            format_bytes(stats.total_size, 2),
            stats.processing_time_ms
        ),
        OutputFormat::Json => format_json(stats, pretty),
    }
}

fn format_json(stats: &ProjectStats, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(stats).expect("JSON serialization failed")
    } else {
        serde_json::to_string(stats).expect("JSON serialization failed")
    }
}
