//! Turns ordered document lists into downloadable files.

pub mod archive;
pub mod merge;

pub use archive::archive;
pub use merge::{merge_pdfs, MergedDocument, SkippedDownload};

use crate::error::{ReportError, Result};
use crate::source::Ledger;
use std::str::FromStr;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Container of a downloadable report file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileFormat {
    #[default]
    Pdf,
    /// The merged PDF inside a single-entry zip
    Zip,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "pdf",
            FileFormat::Zip => "zip",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            FileFormat::Pdf => PDF_CONTENT_TYPE,
            FileFormat::Zip => ZIP_CONTENT_TYPE,
        }
    }
}

impl FromStr for FileFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "pdf" => Ok(FileFormat::Pdf),
            "zip" => Ok(FileFormat::Zip),
            other => Err(ReportError::InvalidInput(format!("unsupported file format '{}'", other))),
        }
    }
}

/// A finished download: `{income|expense}.{pdf|zip}`
#[derive(Debug, Clone)]
pub struct Artifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
    pub skipped: Vec<SkippedDownload>,
}

impl Artifact {
    /// Packages a merged PDF for `ledger` in the requested format
    pub fn build(ledger: Ledger, format: FileFormat, merged: MergedDocument) -> Result<Self> {
        let pdf_name = format!("{}.{}", ledger.as_str(), FileFormat::Pdf.extension());
        let bytes = match format {
            FileFormat::Pdf => merged.bytes,
            FileFormat::Zip => archive(&pdf_name, &merged.bytes)?,
        };
        Ok(Self {
            file_name: format!("{}.{}", ledger.as_str(), format.extension()),
            content_type: format.content_type(),
            bytes,
            skipped: merged.skipped,
        })
    }
}
