use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Upload cap enforced before anything is sent (20 MiB).
pub const MAX_ATTACHMENT_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Docx,
    Txt,
}

impl FileKind {
    pub const ALL: &[FileKind] = &[FileKind::Pdf, FileKind::Docx, FileKind::Txt];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Txt => "txt",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileKind::Txt => "text/plain",
        }
    }

    /// Classify a file name by the text after its last `.`, ignoring case.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "docx" => Some(FileKind::Docx),
            "txt" => Some(FileKind::Txt),
            _ => None,
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file the user picked, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
}

impl FileCandidate {
    /// Stat a local file. The name is the final path component.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let unreadable = |reason: String| InputError::Unreadable {
            path: path.display().to_string(),
            reason,
        };
        let meta = std::fs::metadata(path).map_err(|e| unreadable(e.to_string()))?;
        if !meta.is_file() {
            return Err(unreadable("not a regular file".into()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| unreadable("missing file name".into()))?;
        Ok(Self {
            path: path.to_path_buf(),
            name,
            size_bytes: meta.len(),
        })
    }
}

/// The single file staged for the next submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
    pub kind: FileKind,
}

impl Attachment {
    /// Accept a candidate if its extension is allowed and it fits under the cap.
    /// The extension is checked first.
    pub fn validate(candidate: FileCandidate) -> Result<Self, InputError> {
        let kind = FileKind::from_file_name(&candidate.name)
            .ok_or_else(|| InputError::UnsupportedFormat(candidate.name.clone()))?;
        if candidate.size_bytes > MAX_ATTACHMENT_BYTES {
            return Err(InputError::FileTooLarge(candidate.size_bytes));
        }
        Ok(Self {
            path: candidate.path,
            name: candidate.name,
            size_bytes: candidate.size_bytes,
            kind,
        })
    }

    /// Human-readable size, e.g. `1.5 KB`.
    pub fn display_size(&self) -> String {
        format_bytes(self.size_bytes)
    }
}

/// Format a byte count with base-1024 units and at most two decimals.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
