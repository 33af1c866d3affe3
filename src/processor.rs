use crate::error::PreviewError;
use crate::rewrite::{
    Diagnostics, inject_csp, inline_icon_links, inline_images, inline_scripts,
    inline_stylesheets, rewrite_style_blocks,
};
use crate::types::{PreviewDocument, ProjectFile, ProjectFileMap, ProjectStats};
use serde::Serialize;
use std::time::Instant;

/// Everything a processing run produced besides the document itself.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub document: PreviewDocument,
    /// Path of the entry HTML file.
    pub entry: String,
    pub diagnostics: Diagnostics,
    pub stats: ProjectStats,
}

/// Resolves a multi-file project into one self-contained HTML document.
///
/// The processor only borrows the file map for the duration of the call.
#[derive(Debug, Clone, Copy)]
pub struct ProjectProcessor<'a> {
    files: &'a ProjectFileMap,
}

impl<'a> ProjectProcessor<'a> {
    pub fn new(files: &'a ProjectFileMap) -> Self {
        Self { files }
    }

    /// Picks the entry document: a file named exactly `index.html`, else the first `.html` file.
    pub fn entry_file(&self) -> Option<&'a ProjectFile> {
        self.files
            .files()
            .find(|file| file.name == "index.html")
            .or_else(|| self.files.files().find(|file| file.name.ends_with(".html")))
    }

    pub fn process(&self) -> Result<String, PreviewError> {
        self.process_with_report()
            .map(|outcome| outcome.document.into_string())
    }

    pub fn process_with_report(&self) -> Result<ProcessOutcome, PreviewError> {
        let started = Instant::now();
        let entry = self.entry_file().ok_or(PreviewError::NoEntryPoint)?;
        #[cfg(feature = "logging")]
        tracing::debug!(entry = %entry.path, files = self.files.len(), "processing project");

        let mut diagnostics = Diagnostics::default();
        let html = inline_stylesheets(&entry.content, self.files, &mut diagnostics);
        let html = inline_scripts(&html, self.files, &mut diagnostics);
        let html = inline_images(&html, self.files);
        let html = inline_icon_links(&html, self.files);
        let html = rewrite_style_blocks(&html, self.files);
        let html = inject_csp(&html);

        let stats = ProjectStats {
            files_count: self.files.len(),
            total_size: self.files.total_size(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };
        #[cfg(feature = "logging")]
        tracing::debug!(
            missing = diagnostics.missing.len(),
            bundled = diagnostics.bundled_modules.len(),
            elapsed_ms = stats.processing_time_ms,
            "project processed"
        );

        Ok(ProcessOutcome {
            document: PreviewDocument::new(html),
            entry: entry.path.clone(),
            diagnostics,
            stats,
        })
    }
}

/// Processes `files` into a preview document. See [`ProjectProcessor`].
pub fn process_project(files: &ProjectFileMap) -> Result<String, PreviewError> {
    ProjectProcessor::new(files).process()
}
