//! States locating the end of a file header.

use std::path::Path;

use either::Either::{self, Left, Right};
use thiserror::Error;

/// Number of marker bytes (`\x1A\x04` and padding) between the `SCANIT_END`
/// line of a scan file and its first sample.
pub const SCAN_MARKER_LEN: u64 = 4;

/// The Nanonis file types, distinguished by extension.
///
/// Only [`FileType::Scan`] can be decoded. The other types are listed so their
/// headers can still be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Grid spectroscopy, `.3ds`.
    Grid,
    /// Scan image, `.sxm`.
    Scan,
    /// Point spectroscopy, `.dat`.
    Spectrum,
}

/// The file extension is not one of `3ds`, `sxm` or `dat`.
#[derive(Debug, Error)]
#[error("{path} is not a supported file type.")]
pub struct FileTypeError {
    pub path: String,
}

impl FileType {
    /// Determine the file type from the extension of a path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FileTypeError> {
        let path = path.as_ref();

        match path.extension().and_then(|e| e.to_str()) {
            Some("3ds") => Ok(Self::Grid),
            Some("sxm") => Ok(Self::Scan),
            Some("dat") => Ok(Self::Spectrum),
            _ => Err(FileTypeError {
                path: path.display().to_string(),
            }),
        }
    }

    /// The substring marking the last line of the header.
    pub fn end_tag(self) -> &'static str {
        match self {
            Self::Grid => ":HEADER_END:",
            Self::Scan => "SCANIT_END",
            Self::Spectrum => "[DATA]",
        }
    }

    /// Bytes to skip after the end-tag line before the payload begins.
    pub fn marker_len(self) -> u64 {
        match self {
            Self::Scan => SCAN_MARKER_LEN,
            Self::Grid | Self::Spectrum => 0,
        }
    }
}

/// The input ended before any line contained the end tag.
#[derive(Debug, Error)]
#[error("Could not find the {tag} end tag.")]
pub struct HeaderNotFound {
    pub tag: &'static str,
}

/// State token to search for the end of a header, one line at a time.
#[derive(Debug)]
pub struct Boundary {
    tag: &'static str,
    consumed: u64,
}

impl Boundary {
    pub fn new(file_type: FileType) -> Self {
        Self {
            tag: file_type.end_tag(),
            consumed: 0,
        }
    }

    /// Transition to another state by inspecting a line, including its
    /// trailing newline.
    ///
    /// Returns a successor token if the line did not contain the end tag, or
    /// the offset of the byte following the line if it did.
    pub fn advance(self, line: &[u8]) -> Either<Self, u64> {
        let consumed = self.consumed + line.len() as u64;

        let tag = self.tag.as_bytes();
        let found = line.trim_ascii().windows(tag.len()).any(|w| w == tag);

        if found {
            Right(consumed)
        } else {
            Left(Self { consumed, ..self })
        }
    }

    /// End the search on exhausted input.
    pub fn finish(self) -> HeaderNotFound {
        HeaderNotFound { tag: self.tag }
    }
}
