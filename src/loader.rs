//! Reads a project directory into a [`ProjectFileMap`].

use crate::error::PreviewError;
use crate::options::{BinaryDetection, LoaderOptions};
use crate::types::{ProjectFile, ProjectFileMap, base_name};
use ignore::WalkBuilder;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

const WEB_EXTENSIONS: &[&str] = &[
    "html", "htm", "css", "js", "json", "xml", "jpg", "jpeg", "png", "gif", "svg", "webp", "woff",
    "woff2", "ttf", "otf", "eot", "mp3", "mp4", "webm", "ogg", "wav", "md", "txt", "ico",
];
const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "otf", "eot"];
const SNIFF_LEN: usize = 4096;

struct Walker {
    inner: ignore::Walk,
}
impl Walker {
    fn new(options: &LoaderOptions) -> Result<Self, PreviewError> {
        let mut builder = WalkBuilder::new(&options.root);
        builder
            .git_ignore(options.respect_gitignore)
            .hidden(!options.include_hidden)
            .max_depth(options.max_depth)
            .follow_links(options.follow_links)
            .ignore(false);
        if !options.ignore_patterns.is_empty() {
            let mut glob_builder = globset::GlobSetBuilder::new();
            for pattern in &options.ignore_patterns {
                let glob = globset::Glob::new(pattern).map_err(|e| {
                    PreviewError::Walk(format!("Invalid glob pattern '{}': {}", pattern, e))
                })?;
                glob_builder.add(glob);
            }
            let matcher = glob_builder
                .build()
                .map_err(|e| PreviewError::Walk(format!("Failed to build glob set: {}", e)))?;
            builder.filter_entry(move |entry| !matcher.is_match(entry.path()));
        }
        Ok(Self {
            inner: builder.build(),
        })
    }
    fn collect_files(self) -> Result<Vec<PathBuf>, PreviewError> {
        let mut files = Vec::new();
        for result in self.inner {
            let entry = result.map_err(|e| PreviewError::Walk(e.to_string()))?;
            if entry.file_type().is_some_and(|t| t.is_file()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// Lower-cased extension of a file name, or `""`.
pub fn file_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Whether a file name carries one of the extensions a web project is made of.
pub fn is_web_file(name: &str) -> bool {
    WEB_EXTENSIONS.contains(&file_extension(name).as_str())
}

/// Whether a file must be carried as a data URI rather than text, judged by type alone.
pub fn is_binary_asset(mime_type: &str, name: &str) -> bool {
    mime_type.starts_with("image/")
        || mime_type.starts_with("audio/")
        || mime_type.starts_with("video/")
        || FONT_EXTENSIONS.contains(&file_extension(name).as_str())
}

/// Walks `options.root` and reads every matching file.
///
/// Paths in the returned map are relative to the root and use `/` separators.
pub fn load_project(options: &LoaderOptions) -> Result<ProjectFileMap, PreviewError> {
    #[cfg(feature = "logging")]
    tracing::debug!("Loading project from {}", options.root.display());
    if !options.root.is_dir() {
        return Err(PreviewError::InvalidPath(format!(
            "{} is not a directory",
            options.root.display()
        )));
    }
    let paths = Walker::new(options)?.collect_files()?;

    #[cfg(not(feature = "parallel"))]
    let files: Vec<Option<ProjectFile>> = paths
        .iter()
        .map(|path| read_project_file(path, options))
        .collect::<Result<_, _>>()?;
    #[cfg(feature = "parallel")]
    let files: Vec<Option<ProjectFile>> = paths
        .par_iter()
        .map(|path| read_project_file(path, options))
        .collect::<Result<_, _>>()?;

    let map: ProjectFileMap = files.into_iter().flatten().collect();
    #[cfg(feature = "logging")]
    tracing::debug!(files = map.len(), bytes = map.total_size(), "project loaded");
    Ok(map)
}

fn relative_path(root: &Path, path: &Path) -> Result<String, PreviewError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| PreviewError::InvalidPath(path.display().to_string()))?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

fn read_project_file(
    path: &Path,
    options: &LoaderOptions,
) -> Result<Option<ProjectFile>, PreviewError> {
    let relative = relative_path(&options.root, path)?;
    let name = base_name(&relative).to_string();
    if options.web_files_only && !is_web_file(&name) {
        #[cfg(feature = "logging")]
        tracing::trace!("Skipping non-web file: {}", relative);
        return Ok(None);
    }
    if let Some(limit) = options.file_size_limit {
        let metadata = fs::metadata(path).map_err(|e| PreviewError::io(path, e))?;
        if metadata.len() > limit {
            #[cfg(feature = "logging")]
            tracing::debug!(
                "File too large ({} > {}), skipping {}",
                metadata.len(),
                limit,
                relative
            );
            return Ok(None);
        }
    }

    let bytes = fs::read(path).map_err(|e| PreviewError::io(path, e))?;
    let mime_type = mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream");
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    let is_binary = is_binary_asset(mime_type, &name)
        || match options.binary_detection {
            BinaryDetection::Simple => head.contains(&0),
            BinaryDetection::Accurate => content_inspector::inspect(head).is_binary(),
            BinaryDetection::None => false,
        };

    if is_binary {
        #[cfg(feature = "logging")]
        tracing::trace!("Encoding binary file as data URI: {}", relative);
        return Ok(Some(ProjectFile::binary(relative, &bytes, mime_type)));
    }

    let mut file = ProjectFile::text(relative, String::from_utf8_lossy(&bytes).into_owned());
    file.size = bytes.len() as u64;
    Ok(Some(file))
}
