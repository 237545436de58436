//! File type classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of file categories, derived from the filename extension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum FileType {
    Pdf,
    Docx,
    Csv,
    Xlsx,
    Image,
    Video,
    #[default]
    Other,
}

impl FileType {
    /// All variants, in declaration order.
    pub const ALL: [FileType; 7] = [
        FileType::Pdf,
        FileType::Docx,
        FileType::Csv,
        FileType::Xlsx,
        FileType::Image,
        FileType::Video,
        FileType::Other,
    ];

    /// Classify a filename by the lowercase substring after its last `.`.
    ///
    /// # Examples
    ///
    /// ```
    /// use filevault::file::FileType;
    ///
    /// assert_eq!(FileType::classify("report.PDF"), FileType::Pdf);
    /// assert_eq!(FileType::classify("archive.tar.gz"), FileType::Other);
    /// assert_eq!(FileType::classify("noext"), FileType::Other);
    /// ```
    pub fn classify(filename: &str) -> FileType {
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return FileType::Other;
        };

        match ext.to_lowercase().as_str() {
            "pdf" => FileType::Pdf,
            "docx" => FileType::Docx,
            "csv" => FileType::Csv,
            "xlsx" => FileType::Xlsx,
            "jpg" | "jpeg" | "png" | "gif" => FileType::Image,
            "mp4" => FileType::Video,
            _ => FileType::Other,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Pdf => "PDF",
            FileType::Docx => "DOCX",
            FileType::Csv => "CSV",
            FileType::Xlsx => "XLSX",
            FileType::Image => "IMAGE",
            FileType::Video => "VIDEO",
            FileType::Other => "OTHER",
        }
    }

    /// Display label, as used in serialized output.
    pub fn label(&self) -> &'static str {
        match self {
            FileType::Pdf => "Pdf",
            FileType::Docx => "Docx",
            FileType::Csv => "Csv",
            FileType::Xlsx => "Xlsx",
            FileType::Image => "Image",
            FileType::Video => "Video",
            FileType::Other => "Other",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PDF" => Ok(FileType::Pdf),
            "DOCX" => Ok(FileType::Docx),
            "CSV" => Ok(FileType::Csv),
            "XLSX" => Ok(FileType::Xlsx),
            "IMAGE" => Ok(FileType::Image),
            "VIDEO" => Ok(FileType::Video),
            "OTHER" => Ok(FileType::Other),
            _ => Err(format!("unknown file type: {s}")),
        }
    }
}

impl TryFrom<String> for FileType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
