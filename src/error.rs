//! Errors raised while decoding PGDF files
use thiserror::Error;

/// A specialized `Result` for PGDF decoding
pub type Result<T> = std::result::Result<T, Error>;

/// The ways in which decoding can fail
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A field extends past the end of the buffer
    #[error("truncated record")]
    TruncatedRecord,
    /// No payload decoder is registered for the module type
    #[error("unsupported module type {0:?}")]
    UnsupportedModuleType(String),
    /// An annotation sub-record carries a tag with no known decoder
    #[error("unknown annotation tag {0:?}")]
    UnknownAnnotationTag(String),
    /// A module footer or data record arrived while no module was open
    #[error("no open module")]
    NoOpenModule,
    /// The record type is reserved and cannot be decoded
    #[error("unsupported record type {0}")]
    UnsupportedRecordType(i32),
    /// A record arrived before the file header
    #[error("missing file header")]
    MissingFileHeader,
    /// A second module header arrived
    #[error("file already contains a module")]
    DuplicateModule,
    /// The declared record length cannot hold a record header
    #[error("invalid record length {0}")]
    InvalidRecordLength(i32),
    /// The bytes were readable but do not form a valid value
    #[error("malformed record: {0}")]
    Malformed(String),
    /// The file could not be read
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A decoding error, located at the record that triggered it
#[derive(Debug, Error)]
#[error("{kind} at offset {offset}{}", describe_record_type(.record_type))]
pub struct Error {
    /// Byte offset of the failing record (or field, before the error
    /// has been attributed to a record)
    pub offset: u64,
    /// The type field of the failing record, if it had been read
    pub record_type: Option<i32>,
    /// What went wrong
    pub kind: ErrorKind,
}

fn describe_record_type(record_type: &Option<i32>) -> String {
    match record_type {
        Some(t) => format!(" (record type {})", t),
        None => String::new(),
    }
}

impl Error {
    /// Create an error at the given offset
    pub fn new(offset: u64, kind: ErrorKind) -> Self {
        Error {
            offset,
            record_type: None,
            kind,
        }
    }

    /// Attribute the error to the record starting at `offset`
    pub fn in_record(mut self, offset: u64, record_type: i32) -> Self {
        self.offset = offset;
        self.record_type = Some(record_type);
        self
    }

    /// Convert a binrw error raised at `offset`
    ///
    /// End-of-file conditions become [`ErrorKind::TruncatedRecord`], all
    /// other failures (bad UTF-8, failed assertions, etc.) become
    /// [`ErrorKind::Malformed`].
    pub fn from_binrw(err: binrw::Error, offset: u64) -> Self {
        if err.is_eof() {
            Error::new(offset, ErrorKind::TruncatedRecord)
        } else {
            Error::new(offset, ErrorKind::Malformed(err.to_string()))
        }
    }

    /// Whether a lenient decoder may skip the record that raised this error
    pub fn is_skippable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::UnsupportedModuleType(_)
                | ErrorKind::UnknownAnnotationTag(_)
                | ErrorKind::Malformed(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(0, ErrorKind::Io(err))
    }
}
