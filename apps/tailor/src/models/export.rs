use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::application::ApplicationId;

/// Document formats the export endpoint can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "pdf")]
    Pdf,
    #[serde(rename = "docx")]
    Docx,
    #[serde(rename = "odt")]
    Odt,
    #[serde(rename = "rtf")]
    Rtf,
    #[serde(rename = "txt")]
    Txt,
    #[serde(rename = "html-zip")]
    HtmlZip,
    #[serde(rename = "epub")]
    Epub,
    #[serde(rename = "md")]
    Markdown,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 8] = [
        ExportFormat::Pdf,
        ExportFormat::Docx,
        ExportFormat::Odt,
        ExportFormat::Rtf,
        ExportFormat::Txt,
        ExportFormat::HtmlZip,
        ExportFormat::Epub,
        ExportFormat::Markdown,
    ];

    /// Value of the `format` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Odt => "odt",
            ExportFormat::Rtf => "rtf",
            ExportFormat::Txt => "txt",
            ExportFormat::HtmlZip => "html-zip",
            ExportFormat::Epub => "epub",
            ExportFormat::Markdown => "md",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::HtmlZip => "zip",
            other => other.as_str(),
        }
    }

    pub fn default_filename(self, application_id: ApplicationId) -> String {
        format!("tailored-resume-{application_id}.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown export format '{0}' (expected one of pdf, docx, odt, rtf, txt, html-zip, epub, md)")]
pub struct ParseFormatError(String);

impl FromStr for ExportFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| ParseFormatError(s.to_string()))
    }
}

/// Outcome of the HEAD readiness probe on the export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportReadiness {
    Ready,
    NotReady { status: u16 },
}

/// A downloaded document plus the filename the backend suggested.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}
