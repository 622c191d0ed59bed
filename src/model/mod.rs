//! The PGDF document model
//!
//! A decoded file owns its records as a tree:
//!
//! ```text
//! File
//! ├── FileHeader
//! ├── Module
//! │   ├── ModuleHeader
//! │   ├── DataObject*  (PamData + Payload)
//! │   ├── PamData*     (background records)
//! │   └── ModuleFooter
//! └── FileFooter
//! ```
use crate::error::Error;
use crate::parser::gemini::{Track, TrackPayload};
use crate::parser::pamdata::PamData;
use crate::parser::pgdf::{FileFooter, FileHeader, ModuleFooter, ModuleHeader};
use time::OffsetDateTime;

/// A decoded PAMGuard binary file
#[derive(Debug)]
pub struct File {
    /// The file header
    pub header: FileHeader,
    /// The file footer, absent if the writer never closed the file
    pub footer: Option<FileFooter>,
    /// The module whose output the file holds
    pub module: Option<Module>,
    /// Data records skipped by a lenient decoder
    pub skipped: Vec<SkippedRecord>,
}

impl File {
    /// The module type named in the file header
    pub fn module_type(&self) -> &str {
        &self.header.module_type
    }

    /// The data objects of the module, in file order
    pub fn objects(&self) -> &[DataObject] {
        match &self.module {
            Some(m) => &m.objects,
            None => &[],
        }
    }

    /// The earliest and latest record time over all data objects
    pub fn time_range(&self) -> Option<(OffsetDateTime, OffsetDateTime)> {
        let mut dates = self.objects().iter().filter_map(|o| o.pam.date());
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

/// The records written by one module
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// The module header
    pub header: ModuleHeader,
    /// The module footer, once the module has been closed
    pub footer: Option<ModuleFooter>,
    /// Decoded data records
    pub objects: Vec<DataObject>,
    /// Background records, which carry common fields only
    pub background: Vec<PamData>,
}

impl Module {
    /// Open a module
    pub fn new(header: ModuleHeader) -> Self {
        Module {
            header,
            footer: None,
            objects: Vec::new(),
            background: Vec::new(),
        }
    }

    /// Whether data records may still be added
    pub fn is_open(&self) -> bool {
        self.footer.is_none()
    }
}

/// One decoded data record
#[derive(Debug, Clone, PartialEq)]
pub struct DataObject {
    /// The fields common to every data record
    pub pam: PamData,
    /// The module-specific payload
    pub payload: Payload,
}

impl DataObject {
    /// The track, if the payload is a Gemini track
    pub fn track(&self) -> Option<&Track> {
        match &self.payload {
            Payload::Track(p) => Some(&p.track),
        }
    }
}

/// A module-specific payload
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Payload {
    /// A Gemini Threshold Detector track
    Track(TrackPayload),
}

/// A data record skipped by a lenient decoder
#[derive(Debug)]
pub struct SkippedRecord {
    /// Offset of the record
    pub offset: u64,
    /// Declared length of the record
    pub length: u32,
    /// Why the record could not be decoded
    pub error: Error,
}
