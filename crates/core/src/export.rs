//! Downloadable renditions of a response.

mod pdf;

use crate::error::ExportError;
use crate::model_client::GenerationResult;

pub use pdf::{HEADER_TITLE, encode_latin1, render_pdf, sanitize};

/// Mime type of markdown exports.
pub const MARKDOWN_MIME: &str = "text/markdown";
/// Mime type of PDF exports.
pub const PDF_MIME: &str = "application/pdf";
/// Mime type of the widget page.
pub const HTML_MIME: &str = "text/html";
/// File name of the widget page.
pub const WIDGET_PAGE_FILE_NAME: &str = "sources.html";
/// Height of the scrollable region the widget is embedded in, in pixels.
pub const WIDGET_HEIGHT: u32 = 200;

/// One downloadable file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Suggested file name.
    pub file_name: String,
    /// Mime type of `bytes`.
    pub mime: &'static str,
    /// File content.
    pub bytes: Vec<u8>,
}

/// What an [`ExportStrategy`] produced for one result.
///
/// A failed rendition never takes the others down with it.
#[derive(Debug, Default)]
pub struct Exports {
    /// The renditions that were produced.
    pub artifacts: Vec<Artifact>,
    /// The renditions that could not be produced.
    pub failures: Vec<ExportError>,
}

impl Exports {
    /// Records the outcome of one rendition.
    pub fn push(&mut self, artifact: Result<Artifact, ExportError>) {
        match artifact {
            Ok(artifact) => self.artifacts.push(artifact),
            Err(err) => {
                warn!("failed to export a rendition: {err}");
                self.failures.push(err);
            }
        }
    }
}

/// Decides which artifacts are offered for a result.
pub trait ExportStrategy: Send + Sync {
    /// Produces the artifacts for `result`.
    fn artifacts(&self, result: &GenerationResult) -> Exports;
}

/// The response text, byte for byte.
#[inline]
pub fn markdown_bytes(result: &GenerationResult) -> Vec<u8> {
    result.text.as_bytes().to_vec()
}

/// The markdown export of `result`.
pub fn export_markdown(result: &GenerationResult, file_name: &str) -> Artifact {
    Artifact {
        file_name: file_name.to_owned(),
        mime: MARKDOWN_MIME,
        bytes: markdown_bytes(result),
    }
}

/// The PDF export of `result`.
pub fn export_pdf(
    result: &GenerationResult,
    file_name: &str,
) -> Result<Artifact, ExportError> {
    Ok(Artifact {
        file_name: file_name.to_owned(),
        mime: PDF_MIME,
        bytes: render_pdf(&result.text)?,
    })
}

/// A standalone page embedding the citation widget, if there is one.
pub fn export_widget_page(result: &GenerationResult) -> Option<Artifact> {
    let html = result.widget_html()?;
    let page = format!(
        "<!DOCTYPE html>
<html>
<head>
<meta charset=\"utf-8\">
<title>Verified Sources</title>
</head>
<body>
<h3>📚 Verified Sources</h3>
<div style=\"height: {WIDGET_HEIGHT}px; overflow-y: auto;\">
{html}
</div>
</body>
</html>
"
    );
    Some(Artifact {
        file_name: WIDGET_PAGE_FILE_NAME.to_owned(),
        mime: HTML_MIME,
        bytes: page.into_bytes(),
    })
}

/// Offers the markdown text only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkdownExport {
    file_name: String,
}

impl MarkdownExport {
    /// Creates a strategy saving the text under `file_name`.
    #[inline]
    pub fn new<S: Into<String>>(file_name: S) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }
}

impl ExportStrategy for MarkdownExport {
    fn artifacts(&self, result: &GenerationResult) -> Exports {
        let mut artifacts = vec![export_markdown(result, &self.file_name)];
        artifacts.extend(export_widget_page(result));
        Exports {
            artifacts,
            failures: Vec::new(),
        }
    }
}

/// Offers the markdown text and a PDF briefing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkdownPdfExport {
    stem: String,
}

impl MarkdownPdfExport {
    /// Creates a strategy saving `{stem}.md` and `{stem}.pdf`.
    #[inline]
    pub fn new<S: Into<String>>(stem: S) -> Self {
        Self { stem: stem.into() }
    }
}

impl Default for MarkdownPdfExport {
    fn default() -> Self {
        Self::new("briefing")
    }
}

impl ExportStrategy for MarkdownPdfExport {
    fn artifacts(&self, result: &GenerationResult) -> Exports {
        let mut exports = Exports::default();
        let markdown = export_markdown(result, &format!("{}.md", self.stem));
        exports.push(Ok(markdown));
        exports.push(export_pdf(result, &format!("{}.pdf", self.stem)));
        exports.artifacts.extend(export_widget_page(result));
        exports
    }
}
