//! Document readers: path in, plain text out.
//!
//! One [`DocumentFormat`] variant per supported format, chosen by file
//! extension through a lookup table. Adding a format means adding a variant
//! and a table row; nothing downstream changes.

mod docx;
mod latex;
mod markdown;
mod markup;
mod pdf;
mod plain;
mod structured;

use std::path::{Path, PathBuf};

pub use plain::decode_text;
use plain::read_text;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("unsupported file format {extension:?}, supporting {supported:?}")]
    UnsupportedFormat {
        extension: String,
        supported: Vec<&'static str>,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no supported character encoding fits {path}")]
    Decode { path: PathBuf },
    #[error("failed to parse {path} as {format}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

impl ReadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Path, format: DocumentFormat, message: impl ToString) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            format: format.name(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Json,
    Yaml,
    Html,
    Xml,
    Markdown,
    Latex,
    Docx,
    Pdf,
}

const EXTENSIONS: &[(&str, DocumentFormat)] = &[
    (".txt", DocumentFormat::PlainText),
    (".csv", DocumentFormat::PlainText),
    (".json", DocumentFormat::Json),
    (".yaml", DocumentFormat::Yaml),
    (".yml", DocumentFormat::Yaml),
    (".html", DocumentFormat::Html),
    (".htm", DocumentFormat::Html),
    (".xml", DocumentFormat::Xml),
    (".md", DocumentFormat::Markdown),
    (".tex", DocumentFormat::Latex),
    (".docx", DocumentFormat::Docx),
    (".pdf", DocumentFormat::Pdf),
];

/// Extensions with a reader, dot-prefixed, in table order.
#[must_use]
pub fn supported_extensions() -> Vec<&'static str> {
    EXTENSIONS.iter().map(|(ext, _)| *ext).collect()
}

impl DocumentFormat {
    /// Case-insensitive lookup; `None` for formats without a reader.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(ext, _)| ext[1..] == extension)
            .map(|(_, format)| *format)
    }

    pub fn from_path(path: &Path) -> Result<Self, ReadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension).ok_or_else(|| ReadError::UnsupportedFormat {
            extension: if extension.is_empty() {
                String::new()
            } else {
                format!(".{}", extension.to_ascii_lowercase())
            },
            supported: supported_extensions(),
        })
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PlainText => "plain text",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Html => "HTML",
            Self::Xml => "XML",
            Self::Markdown => "Markdown",
            Self::Latex => "LaTeX",
            Self::Docx => "DOCX",
            Self::Pdf => "PDF",
        }
    }

    pub fn read(self, path: &Path) -> Result<String, ReadError> {
        match self {
            Self::PlainText => read_text(path),
            Self::Json => structured::json_to_text(&read_text(path)?)
                .map_err(|e| ReadError::parse(path, self, e)),
            Self::Yaml => structured::yaml_to_text(&read_text(path)?)
                .map_err(|e| ReadError::parse(path, self, e)),
            Self::Html => Ok(markup::html_to_text(&read_text(path)?)),
            Self::Xml => {
                markup::xml_to_text(&read_text(path)?).map_err(|e| ReadError::parse(path, self, e))
            }
            Self::Markdown => Ok(markdown::markdown_to_text(&read_text(path)?)),
            Self::Latex => Ok(latex::latex_to_text(&read_text(path)?)),
            Self::Docx => docx::read(path),
            Self::Pdf => pdf::read(path),
        }
    }
}

/// Read `path` with the reader its extension selects.
pub fn read_document(path: &Path) -> Result<String, ReadError> {
    let format = DocumentFormat::from_path(path)?;
    let text = format.read(path)?;
    tracing::debug!(
        path = %path.display(),
        format = format.name(),
        chars = text.chars().count(),
        "Read document"
    );
    Ok(text)
}

/// Trim trailing whitespace per line and collapse runs of blank lines.
pub(crate) fn tidy_lines(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut blank_run = 0usize;
    for line in raw.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out
}
