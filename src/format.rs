//! Document formats the relay accepts and produces.
//!
//! The provider identifies formats by lowercase code strings ("pdf",
//! "docx", "doc") in the convert task. This enum keeps those codes in one
//! place together with the extension and MIME mappings that front ends
//! (CLI, chat bots) need to classify incoming files.

use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A document format known to the conversion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    /// Legacy Word binary format. Accepted as input only; conversions
    /// targeting Word always produce docx.
    Doc,
}

impl DocumentFormat {
    /// The provider's format code, as sent in the convert task.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Doc => "doc",
        }
    }

    /// File extension (without the dot) for artifacts of this format.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// Classify by file extension.
    pub fn from_extension(ext: &str) -> Result<Self, RelayError> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            "doc" => Ok(DocumentFormat::Doc),
            other => Err(RelayError::InvalidInput {
                reason: format!("unsupported file extension '.{other}' (expected pdf, docx, or doc)"),
            }),
        }
    }

    /// Classify by the path's extension.
    pub fn from_path(path: &Path) -> Result<Self, RelayError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| RelayError::InvalidInput {
                reason: format!("'{}' has no file extension to infer a format from", path.display()),
            })?;
        Self::from_extension(ext)
    }

    /// Classify by MIME type, as reported by chat platforms for uploads.
    pub fn from_mime(mime: &str) -> Result<Self, RelayError> {
        match mime {
            "application/pdf" => Ok(DocumentFormat::Pdf),
            "application/msword" => Ok(DocumentFormat::Doc),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Ok(DocumentFormat::Docx)
            }
            other => Err(RelayError::InvalidInput {
                reason: format!("unsupported MIME type '{other}' (expected a PDF or Word document)"),
            }),
        }
    }

    /// The natural conversion target for this format: PDF becomes docx,
    /// either Word flavour becomes PDF. Used by front ends that offer a
    /// single "convert this" action in both directions.
    pub fn counterpart(&self) -> DocumentFormat {
        match self {
            DocumentFormat::Pdf => DocumentFormat::Docx,
            DocumentFormat::Docx | DocumentFormat::Doc => DocumentFormat::Pdf,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extension_round_trip() {
        for fmt in [DocumentFormat::Pdf, DocumentFormat::Docx, DocumentFormat::Doc] {
            assert_eq!(DocumentFormat::from_extension(fmt.extension()).unwrap(), fmt);
        }
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(
            DocumentFormat::from_extension("PDF").unwrap(),
            DocumentFormat::Pdf
        );
    }

    #[test]
    fn from_path_requires_extension() {
        assert!(DocumentFormat::from_path(&PathBuf::from("report.pdf")).is_ok());
        assert!(DocumentFormat::from_path(&PathBuf::from("report")).is_err());
        assert!(DocumentFormat::from_path(&PathBuf::from("notes.txt")).is_err());
    }

    #[test]
    fn mime_classification() {
        assert_eq!(
            DocumentFormat::from_mime("application/pdf").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_mime("application/msword").unwrap(),
            DocumentFormat::Doc
        );
        assert!(DocumentFormat::from_mime("image/png").is_err());
    }

    #[test]
    fn counterpart_swaps_direction() {
        assert_eq!(DocumentFormat::Pdf.counterpart(), DocumentFormat::Docx);
        assert_eq!(DocumentFormat::Docx.counterpart(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::Doc.counterpart(), DocumentFormat::Pdf);
    }
}
