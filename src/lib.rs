//! # WebPreview
//!
//! `webpreview` turns web code into a single self-contained HTML document that can be rendered
//! in a sandboxed frame.
//!
//! There are two independent entry points:
//!
//! - [`generate_preview`] takes raw HTML, CSS and JS buffers and assembles one document with the
//!   CSS inlined and the JS wrapped in a console interception harness.
//! - [`process_project`] takes a [`ProjectFileMap`] of uploaded files, picks the entry HTML file,
//!   inlines stylesheets, scripts, images and CSS `url()` assets it can resolve, and injects a
//!   Content-Security-Policy. Only a project without any HTML file is an error; every other
//!   unresolved reference degrades in place.
//!
//! The [`console`] module models the channel the harness uses to report console output, and
//! [`load_project`] reads a directory from disk into a file map.
//!
//! # Features
//!
//! - `parallel`: Reads project files in parallel using Rayon.
//! - `logging`: Enables debug logging via the `tracing` crate.
//!
//! # Example
//!
//! ```no_run
//! use webpreview::{LoaderBuilder, load_project, process_project};
//!
//! let options = LoaderBuilder::new("./site")
//!     .include_hidden(false)
//!     .file_size_limit(Some(10 * 1024 * 1024)) // 10 MB
//!     .build();
//!
//! let files = load_project(&options).expect("Failed to read project");
//! let html = process_project(&files).expect("No entry HTML file");
//! println!("{}", html);
//! ```

pub mod console;
mod error;
mod loader;
mod options;
pub mod output;
mod preview;
mod processor;
mod resolve;
pub mod rewrite;
mod types;

pub use console::{ConsoleHarness, ConsoleLog, ConsolePublisher, console_bridge};
pub use error::PreviewError;
pub use loader::{file_extension, is_binary_asset, is_web_file, load_project};
pub use options::{BinaryDetection, LoaderBuilder, LoaderOptions};
pub use preview::{
    BodySource, ExtractedBody, PreviewOptions, extract_body, generate_preview,
    generate_preview_with,
};
pub use processor::{ProcessOutcome, ProjectProcessor, process_project};
pub use resolve::clean_reference;
pub use rewrite::{AssetKind, Diagnostics, MissingAsset};
pub use types::{
    ConsoleLogEntry, ConsoleMessage, LogLevel, PreviewDocument, ProjectFile, ProjectFileMap,
    ProjectStats,
};
