//! Convenience interfaces for decoding scan files.
//!
//! [`decode`] reads a file from disk. The [`reader`] and [`slice`] modules
//! decode a document already open as a reader, or already in memory.
//!
//! Every function either returns a fully populated [`Record`] or a single
//! [`Error`]; there is no partial result.
//!
//! # Example
//!
//! ```
//! let record = cantilever::decode("fixtures/two-channel.sxm")?;
//!
//! let (columns, rows) = record.header.pixels();
//! for channel in &record.channels {
//!     assert_eq!(channel.forward.rows(), rows);
//!     assert_eq!(channel.forward.columns(), columns);
//! }
//! ```

pub mod reader;
pub mod slice;

use std::{
    fs::File,
    io::{self, BufReader},
    path::Path,
};

use log::info;
use thiserror::Error;

use crate::{
    record::Record,
    sans::{
        body::BodyShapeError,
        boundary::{FileType, FileTypeError, HeaderNotFound},
        grammar::GrammarError,
        header::{self, Header, HeaderError},
    },
};

pub use reader::decode as decode_reader;
pub use slice::decode as decode_slice;

/// Errors occurring while decoding a scan file.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the underlying file or reader.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The file extension is not recognised, or names a file type other than
    /// a scan.
    #[error(transparent)]
    UnsupportedFileType(#[from] FileTypeError),
    /// The end-of-header sentinel was never found.
    #[error(transparent)]
    HeaderNotFound(#[from] HeaderNotFound),
    /// The header violates the grammar.
    #[error("Malformed header: {0}")]
    HeaderParse(GrammarError),
    /// A numeric header field could not be parsed.
    #[error("Header field {field} has an invalid value {value:?}.")]
    HeaderType { field: String, value: String },
    /// A required header field is absent.
    #[error("Missing required header field {field}.")]
    MissingField { field: String },
    /// The payload does not match the shape declared by the header.
    #[error(transparent)]
    BodyShape(#[from] BodyShapeError),
}

impl From<HeaderError> for Error {
    fn from(err: HeaderError) -> Self {
        match err {
            HeaderError::Parse(err) => Self::HeaderParse(err),
            HeaderError::Type { field, value } => Self::HeaderType { field, value },
            HeaderError::Missing { field } => Self::MissingField { field },
        }
    }
}

/// A `Result` alias using the crate's [`enum@Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Decode a scan file from disk.
///
/// The file type is determined from the extension, and must be `.sxm`. The
/// file is closed before returning, whether or not decoding succeeded.
///
/// This method is also re-exported as `cantilever::decode`.
pub fn decode(path: impl AsRef<Path>) -> Result<Record> {
    let path = path.as_ref();

    let file_type = FileType::from_path(path)?;
    if file_type != FileType::Scan {
        Err(FileTypeError {
            path: path.display().to_string(),
        })?;
    }

    let record = {
        let mut file = BufReader::new(File::open(path)?);
        reader::decode(&mut file)?
    };

    info!(
        "Decoded {} channels from {}",
        record.channels.len(),
        path.display()
    );

    Ok(record)
}

/// Decode header bytes, up to and including the end-tag line.
fn parse_header(bytes: &[u8]) -> Result<Header> {
    let text = String::from_utf8_lossy(bytes);
    Ok(header::parse(&text)?)
}
