//! Tag and reference rewrite rules used by the project processor.
//!
//! Every rule is a plain function over a string so it can be exercised on its own. Matching is
//! pattern based rather than a full HTML parse; inputs are developer-authored pages, not
//! adversarial markup.
//!
//! Rules that can fail to find an asset record the miss in [`Diagnostics`] and leave a visible
//! HTML or JS comment in place of the reference. Image and icon rules never leave a trace.

use crate::types::ProjectFileMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Fixed Content-Security-Policy injected into every processed project.
pub const CSP_POLICY: &str = "default-src 'self' data: blob:; \
script-src 'self' 'unsafe-inline' 'unsafe-eval' data: blob:; \
style-src 'self' 'unsafe-inline' data: blob: https:; \
img-src 'self' data: blob: https:; \
font-src 'self' data: blob: https:; \
connect-src 'self' data: blob:;";

static CSS_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<link[^>]+href=["']([^"']+\.css)["'][^>]*>"#)
        .expect("stylesheet link pattern")
});
static SCRIPT_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<script[^>]+src=["']([^"']+\.js)["'][^>]*>\s*</script>"#)
        .expect("script src pattern")
});
static IMG_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img([^>]*)\ssrc=["']([^"']+)["']([^>]*)>"#).expect("img src pattern")
});
static ICON_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<link([^>]*)\shref=["']([^"']+\.(?:ico|png|jpg|jpeg|svg))["']([^>]*)>"#)
        .expect("icon link pattern")
});
static CSS_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)url\(['"]?([^'")\s]+)['"]?\)"#).expect("css url pattern"));
static STYLE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(<style[^>]*>)([\s\S]*?)(</style>)").expect("style block pattern")
});
static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^([ \t]*)import\s+(?:([^'";]*?)\s+from\s+)?['"]([^'"\n]+)['"][ \t]*;?[ \t]*"#,
    )
    .expect("import pattern")
});
static RAW_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("raw text element pattern")
});
static SCRIPT_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</(script)").expect("script close pattern"));
static EXISTING_CSP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv=["']?content-security-policy["']?[^>]*>"#)
        .expect("csp meta pattern")
});
static HEAD_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("head pattern"));
static DOCTYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!doctype html[^>]*>").expect("doctype pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Stylesheet,
    Script,
    Module,
}

/// A reference that could not be resolved against the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingAsset {
    pub kind: AssetKind,
    pub reference: String,
}

/// Non-fatal findings collected while rewriting a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub missing: Vec<MissingAsset>,
    /// Module specifiers whose bodies were prepended to a script, in bundling order.
    pub bundled_modules: Vec<String>,
    /// Import clauses (`{ a, b } from ./m.js`) whose bindings are not reconnected.
    pub discarded_bindings: Vec<String>,
}

impl Diagnostics {
    fn record_missing(&mut self, kind: AssetKind, reference: &str) {
        #[cfg(feature = "logging")]
        tracing::debug!(?kind, reference, "unresolved project reference");
        self.missing.push(MissingAsset {
            kind,
            reference: reference.to_string(),
        });
    }

    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
    }
}

fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://")
        || reference.starts_with("https://")
        || reference.starts_with("//")
}

/// Replaces `<link href="*.css">` tags with `<style>` blocks holding the resolved stylesheet.
///
/// The stylesheet's own `url()` references are rewritten first. Unresolved links become
/// `<!-- Missing CSS file: ... -->`. Remote stylesheets are left alone.
pub fn inline_stylesheets(
    html: &str,
    files: &ProjectFileMap,
    diagnostics: &mut Diagnostics,
) -> String {
    CSS_LINK
        .replace_all(html, |caps: &Captures<'_>| {
            let href = &caps[1];
            if is_remote(href) {
                return caps[0].to_string();
            }
            match files.resolve(href) {
                Some(file) => {
                    format!("<style>\n{}\n</style>", rewrite_css_urls(&file.content, files))
                }
                None => {
                    diagnostics.record_missing(AssetKind::Stylesheet, href);
                    format!("<!-- Missing CSS file: {} -->", href)
                }
            }
        })
        .into_owned()
}

/// Replaces external `<script src="*.js"></script>` tags with inline scripts.
///
/// Inline `<script>` blocks are not touched. The resolved source goes through
/// [`bundle_imports`] before it is embedded.
pub fn inline_scripts(html: &str, files: &ProjectFileMap, diagnostics: &mut Diagnostics) -> String {
    SCRIPT_SRC
        .replace_all(html, |caps: &Captures<'_>| {
            let src = &caps[1];
            if is_remote(src) {
                return caps[0].to_string();
            }
            match files.resolve(src) {
                Some(file) => {
                    let js = bundle_imports(&file.content, files, diagnostics);
                    format!("<script>\n{}\n</script>", escape_script_close(&js))
                }
                None => {
                    diagnostics.record_missing(AssetKind::Script, src);
                    format!("<!-- Missing JS file: {} -->", src)
                }
            }
        })
        .into_owned()
}

/// Substitutes `<img src>` values with the resolved file's data URI.
///
/// A tag is left as is when nothing resolves or the resolved content is plain text.
pub fn inline_images(html: &str, files: &ProjectFileMap) -> String {
    IMG_SRC
        .replace_all(html, |caps: &Captures<'_>| {
            match resolve_data_uri(&caps[2], files) {
                Some(uri) => format!("<img{} src=\"{}\"{}>", &caps[1], uri, &caps[3]),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Substitutes icon and image `<link href>` values (`ico`, `png`, `jpg`, `jpeg`, `svg`).
pub fn inline_icon_links(html: &str, files: &ProjectFileMap) -> String {
    ICON_LINK
        .replace_all(html, |caps: &Captures<'_>| {
            match resolve_data_uri(&caps[2], files) {
                Some(uri) => format!("<link{} href=\"{}\"{}>", &caps[1], uri, &caps[3]),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn resolve_data_uri<'a>(reference: &str, files: &'a ProjectFileMap) -> Option<&'a str> {
    if reference.starts_with("data:") {
        return None;
    }
    files
        .resolve(reference)
        .filter(|file| file.is_data_uri())
        .map(|file| file.content.as_str())
}

/// Rewrites `url(...)` references in a stylesheet to data URIs where the project has them.
///
/// `data:` and `http*` references are skipped.
pub fn rewrite_css_urls(css: &str, files: &ProjectFileMap) -> String {
    CSS_URL
        .replace_all(css, |caps: &Captures<'_>| {
            let url = &caps[1];
            if url.starts_with("data:") || url.starts_with("http") {
                return caps[0].to_string();
            }
            match files.resolve(url).filter(|file| file.is_data_uri()) {
                Some(file) => format!("url('{}')", file.content),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Applies [`rewrite_css_urls`] to the body of every `<style>` block in a document.
pub fn rewrite_style_blocks(html: &str, files: &ProjectFileMap) -> String {
    STYLE_BLOCK
        .replace_all(html, |caps: &Captures<'_>| {
            format!(
                "{}{}{}",
                &caps[1],
                rewrite_css_urls(&caps[2], files),
                &caps[3]
            )
        })
        .into_owned()
}

/// Flattens `import` statements into a single script.
///
/// Each resolvable import is replaced with `// Bundled: <path>` and the imported file's raw
/// text is prepended, in import order, separated by blank lines. Repeated imports are repeated.
/// Bindings are dropped, so only modules that work through side effects (globals, DOM) behave
/// the same after bundling. Unresolvable imports become `// Missing module: <path>`.
///
/// Only statements that start a line are recognised. Code following an import on the same line
/// is moved to the next line so the comment does not swallow it.
pub fn bundle_imports(js: &str, files: &ProjectFileMap, diagnostics: &mut Diagnostics) -> String {
    let mut bodies: Vec<&str> = Vec::new();
    let rewritten = IMPORT.replace_all(js, |caps: &Captures<'_>| {
        let indent = &caps[1];
        let specifier = &caps[3];
        let comment = match files.resolve(specifier) {
            Some(module) => {
                bodies.push(module.content.as_str());
                diagnostics.bundled_modules.push(specifier.to_string());
                if let Some(bindings) = caps.get(2) {
                    diagnostics
                        .discarded_bindings
                        .push(format!("{} from {}", bindings.as_str().trim(), specifier));
                }
                format!("{}// Bundled: {}", indent, specifier)
            }
            None => {
                diagnostics.record_missing(AssetKind::Module, specifier);
                format!("{}// Missing module: {}", indent, specifier)
            }
        };
        let end = caps.get(0).map_or(js.len(), |m| m.end());
        let rest_of_line = js[end..].lines().next().unwrap_or("");
        if rest_of_line.trim().is_empty() {
            comment
        } else {
            format!("{}\n", comment)
        }
    });
    if bodies.is_empty() {
        return rewritten.into_owned();
    }
    format!("{}\n\n{}", bodies.join("\n\n"), rewritten)
}

/// Escapes `</script` so an inlined body cannot close its own tag early.
pub fn escape_script_close(js: &str) -> String {
    SCRIPT_CLOSE
        .replace_all(js, |caps: &Captures<'_>| format!("<\\/{}", &caps[1]))
        .into_owned()
}

fn raw_text_spans(html: &str) -> Vec<Range<usize>> {
    RAW_TEXT.find_iter(html).map(|m| m.range()).collect()
}

fn in_raw_text(spans: &[Range<usize>], pos: usize) -> bool {
    spans.iter().any(|span| span.contains(&pos))
}

pub fn csp_meta() -> String {
    format!(
        "<meta http-equiv=\"Content-Security-Policy\" content=\"{}\">",
        CSP_POLICY
    )
}

/// Injects the CSP `<meta>` tag, replacing any policy the page already declares.
///
/// Goes right after `<head>` when there is one. Otherwise a doctype is followed by a synthesized
/// `<html><head>` wrapper around the rest, and anything else is wrapped in a minimal document.
/// Text inside `<script>` and `<style>` elements is never matched or edited.
pub fn inject_csp(html: &str) -> String {
    let meta = csp_meta();
    let spans = raw_text_spans(html);
    let html = EXISTING_CSP.replace_all(html, |caps: &Captures<'_>| {
        match caps.get(0) {
            Some(m) if in_raw_text(&spans, m.start()) => m.as_str().to_string(),
            _ => String::new(),
        }
    });

    let spans = raw_text_spans(&html);
    let outside = |m: &regex::Match<'_>| !in_raw_text(&spans, m.start());

    if let Some(head) = HEAD_OPEN.find_iter(&html).find(outside) {
        return format!(
            "{}\n    {}{}",
            &html[..head.end()],
            meta,
            &html[head.end()..]
        );
    }

    if let Some(doctype) = DOCTYPE.find_iter(&html).find(outside) {
        return format!(
            "{}{}\n<html><head>\n    {}\n</head><body>{}</body></html>",
            &html[..doctype.start()],
            doctype.as_str(),
            meta,
            &html[doctype.end()..]
        );
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n    {}\n</head>\n<body>\n{}\n</body>\n</html>",
        meta, html
    )
}
