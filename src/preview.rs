//! Inline preview generation from three raw editor buffers.
//!
//! The generated document inlines the CSS into `<style>`, splices in the body content of the
//! HTML buffer, and runs the JS inside a console interception harness that reports to the
//! parent window with `{ type: 'console-log', level, message }` messages.

use crate::rewrite::escape_script_close;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

static BODY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<body[^>]*>([\s\S]*?)</body>").expect("body pattern"));
static HEAD_CLOSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</head>").expect("head close pattern"));
static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?html[^>]*>").expect("html tag pattern"));
static BODY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</?body[^>]*>").expect("body tag pattern"));

const BASE_STYLES: &str = r#"      /* Reset and base styles */
      * {
        margin: 0;
        padding: 0;
        box-sizing: border-box;
      }

      body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
        line-height: 1.6;
        color: #333;
      }

      /* User CSS */
"#;

// Everything up to the user's code. `post` always sends, `report` drops repeats of the same
// level and message seen earlier in this document.
const HARNESS_PRELUDE: &str = r#"    <script>
      (function() {
        var originalLog = console.log;
        var originalWarn = console.warn;
        var originalError = console.error;
        var seen = new Set();

        function post(level, message) {
          try {
            if (window.parent && window.parent !== window) {
              window.parent.postMessage({
                type: 'console-log',
                level: level,
                message: String(message)
              }, '*');
            }
          } catch (e) {
            // cross-origin parent
          }
        }

        function report(level, message) {
          var key = level + ':' + message;
          if (seen.has(key)) {
            return;
          }
          seen.add(key);
          post(level, message);
        }

        function format(args) {
          return Array.prototype.map.call(args, function(arg) {
            if (typeof arg === 'object') {
              try {
                return JSON.stringify(arg, null, 2);
              } catch (e) {
                return String(arg);
              }
            }
            return String(arg);
          }).join(' ');
        }

        console.log = function() {
          report('log', format(arguments));
          originalLog.apply(console, arguments);
        };

        console.warn = function() {
          report('warn', format(arguments));
          originalWarn.apply(console, arguments);
        };

        console.error = function() {
          report('error', format(arguments));
          originalError.apply(console, arguments);
        };

        window.onerror = function(msg, url, lineNo) {
          post('error', 'Script Error: ' + msg + ' at line ' + lineNo);
          return false;
        };

        window.addEventListener('unhandledrejection', function(event) {
          post('error', 'Unhandled Promise Rejection: ' + event.reason);
        });

        try {
"#;

const HARNESS_EPILOGUE: &str = r#"
        } catch (error) {
          post('error', 'JavaScript execution error: ' + (error && error.message ? error.message : error));
        }
      })();
    </script>
"#;

/// Which extraction rule produced the body content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodySource {
    /// Inner content of the first `<body>...</body>` pair.
    BodyTag,
    /// Everything after `</head>` of a full document without a body pair.
    AfterHead,
    /// The input taken as a fragment.
    Verbatim,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBody<'a> {
    pub source: BodySource,
    pub content: Cow<'a, str>,
}

/// Extracts the part of a user HTML buffer that belongs in the preview body.
///
/// Exactly one rule applies to any input, and none of them can fail.
pub fn extract_body(html: &str) -> ExtractedBody<'_> {
    if let Some(caps) = BODY.captures(html) {
        if let Some(inner) = caps.get(1) {
            return ExtractedBody {
                source: BodySource::BodyTag,
                content: Cow::Borrowed(inner.as_str()),
            };
        }
    }

    if looks_like_document(html) {
        if let Some(head_end) = HEAD_CLOSE.find(html) {
            let rest = &html[head_end.end()..];
            let rest = HTML_TAG.replace_all(rest, "");
            let rest = BODY_TAG.replace_all(&rest, "");
            return ExtractedBody {
                source: BodySource::AfterHead,
                content: Cow::Owned(rest.trim().to_string()),
            };
        }
    }

    ExtractedBody {
        source: BodySource::Verbatim,
        content: Cow::Borrowed(html),
    }
}

fn looks_like_document(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    lower.contains("<html") || lower.contains("<!doctype")
}

/// Fixed parts of the generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewOptions {
    pub title: String,
    pub lang: String,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            title: "WebPreview Pro - Live Preview".to_string(),
            lang: "en".to_string(),
        }
    }
}

fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Builds a standalone document from HTML, CSS and JS buffers with default options.
pub fn generate_preview(html: &str, css: &str, js: &str) -> String {
    generate_preview_with(&PreviewOptions::default(), html, css, js)
}

/// Builds a standalone document from HTML, CSS and JS buffers.
///
/// Every call emits its own harness closure, so console deduplication never spans two
/// documents. The user's script runs inside a `try` block, so a synchronous throw is reported
/// as `JavaScript execution error: ...` instead of escaping.
pub fn generate_preview_with(options: &PreviewOptions, html: &str, css: &str, js: &str) -> String {
    let body = extract_body(html);
    #[cfg(feature = "logging")]
    tracing::trace!(source = ?body.source, "extracted preview body");

    let mut out = String::with_capacity(
        BASE_STYLES.len() + HARNESS_PRELUDE.len() + html.len() + css.len() + js.len() + 512,
    );
    out.push_str("<!DOCTYPE html>\n");
    out.push_str(&format!("<html lang=\"{}\">\n", escape_markup(&options.lang)));
    out.push_str("<head>\n");
    out.push_str("    <meta charset=\"UTF-8\">\n");
    out.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    out.push_str(&format!("    <title>{}</title>\n", escape_markup(&options.title)));
    out.push_str("    <style>\n");
    out.push_str(BASE_STYLES);
    out.push_str(css);
    out.push_str("\n    </style>\n");
    out.push_str("</head>\n");
    out.push_str("<body>\n");
    out.push_str(&body.content);
    out.push('\n');
    out.push_str(HARNESS_PRELUDE);
    out.push_str(&escape_script_close(js));
    out.push_str(HARNESS_EPILOGUE);
    out.push_str("</body>\n");
    out.push_str("</html>\n");
    out
}
