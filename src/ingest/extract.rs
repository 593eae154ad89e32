//! Plain-text extraction from document sources
//!
//! Every source kind funnels into one capability, [`TextExtractor`]. The
//! default implementation handles plain text, Markdown, HTML, CSV and URLs.
//! Binary office formats, PDFs and images are recognized but rejected with
//! [`ChecklistError::UnsupportedContent`] so callers can plug in a richer
//! extractor behind the same trait.

use crate::error::{ChecklistError, Result};
use pulldown_cmark::{Event, Parser, TagEnd};
use reqwest::StatusCode;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Kind of document behind a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Docx,
    Csv,
    Xlsx,
    Image,
    PlainText,
    Markdown,
    Html,
}

impl SourceKind {
    /// Resolve a MIME content type
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "application/pdf" => Some(SourceKind::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(SourceKind::Docx)
            }
            "text/csv" => Some(SourceKind::Csv),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.ms-excel" => Some(SourceKind::Xlsx),
            "text/plain" => Some(SourceKind::PlainText),
            "text/markdown" => Some(SourceKind::Markdown),
            "text/html" => Some(SourceKind::Html),
            m if m.starts_with("image/") => Some(SourceKind::Image),
            _ => None,
        }
    }

    /// Resolve a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())?;

        match ext.as_str() {
            "pdf" => Some(SourceKind::Pdf),
            "docx" => Some(SourceKind::Docx),
            "csv" => Some(SourceKind::Csv),
            "xlsx" | "xls" => Some(SourceKind::Xlsx),
            "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tif" | "tiff" | "webp" => {
                Some(SourceKind::Image)
            }
            "txt" | "text" | "log" => Some(SourceKind::PlainText),
            "md" | "mdx" | "markdown" => Some(SourceKind::Markdown),
            "html" | "htm" => Some(SourceKind::Html),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Pdf => write!(f, "pdf"),
            SourceKind::Docx => write!(f, "docx"),
            SourceKind::Csv => write!(f, "csv"),
            SourceKind::Xlsx => write!(f, "xlsx"),
            SourceKind::Image => write!(f, "image"),
            SourceKind::PlainText => write!(f, "text"),
            SourceKind::Markdown => write!(f, "markdown"),
            SourceKind::Html => write!(f, "html"),
        }
    }
}

/// Something text can be extracted from
#[derive(Debug, Clone)]
pub enum Source {
    /// In-memory document bytes of a known kind
    Bytes { bytes: Vec<u8>, kind: SourceKind },
    /// A file on disk; the kind comes from the extension
    File(PathBuf),
    /// A web page
    Url(String),
    /// Text supplied directly
    Text(String),
}

/// Capability: turn any supported source into plain text
#[async_trait::async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, source: &Source) -> Result<String>;
}

/// Extractor for text-like formats and URLs
pub struct DefaultExtractor {
    client: reqwest::Client,
    max_retries: usize,
    base_backoff: Duration,
}

impl DefaultExtractor {
    /// Create an extractor whose HTTP requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            max_retries: 3,
            base_backoff: Duration::from_millis(500),
        })
    }

    /// Override the 429 retry policy
    pub fn with_retry_policy(mut self, max_retries: usize, base_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_backoff = base_backoff;
        self
    }

    /// Extract text from raw bytes of a known kind
    pub fn extract_bytes(&self, bytes: &[u8], kind: SourceKind) -> Result<String> {
        match kind {
            SourceKind::PlainText => decode_utf8(bytes).map(|s| s.to_string()),
            SourceKind::Markdown => decode_utf8(bytes).map(markdown_to_text),
            SourceKind::Html => decode_utf8(bytes).map(html_to_text),
            SourceKind::Csv => csv_to_text(bytes),
            SourceKind::Pdf | SourceKind::Docx | SourceKind::Xlsx | SourceKind::Image => {
                Err(ChecklistError::UnsupportedContent(format!(
                    "{} extraction is not available in this build",
                    kind
                )))
            }
        }
    }

    /// Fetch a URL, retrying HTTP 429 with exponential backoff
    async fn fetch_url(&self, url: &str) -> Result<String> {
        let mut attempt = 0usize;

        loop {
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS && attempt < self.max_retries {
                let delay = self.backoff(attempt);
                attempt += 1;
                tracing::warn!(
                    "Rate limited fetching {} (attempt {}), retrying in {:?}",
                    url,
                    attempt,
                    delay
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            if !status.is_success() {
                return Err(ChecklistError::UnsupportedContent(format!(
                    "failed to retrieve {}: HTTP {}",
                    url, status
                )));
            }

            let is_html = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .and_then(SourceKind::from_content_type)
                .map(|k| k == SourceKind::Html)
                .unwrap_or(true);

            let body = response.text().await?;
            return Ok(if is_html { html_to_text(&body) } else { body });
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt as u32)
    }
}

#[async_trait::async_trait]
impl TextExtractor for DefaultExtractor {
    async fn extract(&self, source: &Source) -> Result<String> {
        let text = match source {
            Source::Text(text) => text.clone(),
            Source::Bytes { bytes, kind } => self.extract_bytes(bytes, *kind)?,
            Source::File(path) => {
                let kind = SourceKind::from_path(path).ok_or_else(|| {
                    ChecklistError::UnsupportedContent(format!(
                        "unrecognized file type: {}",
                        path.display()
                    ))
                })?;
                let bytes = tokio::fs::read(path).await?;
                self.extract_bytes(&bytes, kind)?
            }
            Source::Url(url) => self.fetch_url(url).await?,
        };

        if text.trim().is_empty() {
            return Err(ChecklistError::InputValidation(
                "no content found in the source".to_string(),
            ));
        }

        Ok(text)
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| {
        ChecklistError::UnsupportedContent(format!("document is not valid UTF-8 text: {}", e))
    })
}

/// Flatten Markdown to its visible text, one block per line
pub fn markdown_to_text(markdown: &str) -> String {
    let mut out = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push(' '),
            Event::End(TagEnd::Paragraph)
            | Event::End(TagEnd::Heading(_))
            | Event::End(TagEnd::Item)
            | Event::End(TagEnd::CodeBlock) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }

    out.trim().to_string()
}

/// Reduce an HTML page to its visible text
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element());

    let mut pieces = Vec::new();
    for node in root.descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .map(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
                    .unwrap_or(false)
            });
            let trimmed = text.trim();
            if !hidden && !trimmed.is_empty() {
                pieces.push(trimmed.to_string());
            }
        }
    }

    pieces.join(" ")
}

/// Render CSV rows as comma-joined lines, header first
fn csv_to_text(bytes: &[u8]) -> Result<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut lines = Vec::new();
    for record in reader.records() {
        let record = record
            .map_err(|e| ChecklistError::UnsupportedContent(format!("malformed CSV: {}", e)))?;
        let line = record
            .iter()
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if !line.is_empty() {
            lines.push(line);
        }
    }

    Ok(lines.join("\n"))
}
