//! Parsing PAMGuard binary data files
//!
//! A PGDF file is a flat sequence of records, each starting with its
//! length and type as big-endian `i32`s:
//!
//! ```text
//! FileHeader ModuleHeader Data* ModuleFooter FileFooter
//! ```
//!
//! The declared length of a record is trusted over the number of bytes its
//! decoder consumes. After every record the decoder seeks to
//! `record_start + length`, so a record that is only partly understood
//! does not throw off the records after it.
use crate::error::{Error, ErrorKind, Result};
use crate::model::{DataObject, File, Module, SkippedRecord};
use crate::parser::annotations::AnnotationSet;
use crate::parser::pamdata::{PamData, BACKGROUND_IDENTIFIER};
use crate::parser::payload::PayloadRegistry;
use crate::parser::read::{to_len, JavaString, Reader};
use crate::parser::timestamp;
use binrw::binread;
use log::{debug, warn};
use std::fmt;
use time::OffsetDateTime;

/// The size of the length and type fields that start every record
pub const RECORD_HEADER_SIZE: u64 = 8;

/// The type of a record, from the second field of its header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    /// `-1`
    FileHeader,
    /// `-2`
    FileFooter,
    /// `-3`
    ModuleHeader,
    /// `-4`
    ModuleFooter,
    /// `-5`, reserved and not decodable
    Reserved,
    /// `-6`, a background data record
    Background,
    /// Any other value is a data record carrying this identifier
    Data(i32),
}

impl From<i32> for RecordType {
    fn from(code: i32) -> Self {
        match code {
            -1 => RecordType::FileHeader,
            -2 => RecordType::FileFooter,
            -3 => RecordType::ModuleHeader,
            -4 => RecordType::ModuleFooter,
            -5 => RecordType::Reserved,
            BACKGROUND_IDENTIFIER => RecordType::Background,
            other => RecordType::Data(other),
        }
    }
}

impl RecordType {
    /// The value written in the file
    pub fn code(self) -> i32 {
        match self {
            RecordType::FileHeader => -1,
            RecordType::FileFooter => -2,
            RecordType::ModuleHeader => -3,
            RecordType::ModuleFooter => -4,
            RecordType::Reserved => -5,
            RecordType::Background => BACKGROUND_IDENTIFIER,
            RecordType::Data(code) => code,
        }
    }

    /// A short human-readable name
    pub fn name(self) -> &'static str {
        match self {
            RecordType::FileHeader => "FileHeader",
            RecordType::FileFooter => "FileFooter",
            RecordType::ModuleHeader => "ModuleHeader",
            RecordType::ModuleFooter => "ModuleFooter",
            RecordType::Reserved => "Reserved",
            RecordType::Background => "Background",
            RecordType::Data(_) => "Data",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordType::Data(code) => write!(f, "Data({})", code),
            other => f.write_str(other.name()),
        }
    }
}

/// The position and type of one record, from its header alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSpan {
    /// Offset of the first byte of the record
    pub offset: u64,
    /// Declared length of the record
    pub length: u32,
    /// The record type
    pub record_type: RecordType,
}

impl RecordSpan {
    /// Offset of the first byte after the record
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.length)
    }

    /// Read a record header and validate its length
    ///
    /// The reader is left at the start of the record.
    fn read(reader: &mut Reader<'_>) -> Result<RecordSpan> {
        let offset = reader.position();
        let length = reader.read_i32()?;
        let code = reader
            .read_i32()
            .map_err(|e| Error::new(offset, e.kind))?;
        let in_record = |kind| Error::new(offset, kind).in_record(offset, code);

        if u64::try_from(length).map_or(true, |l| l < RECORD_HEADER_SIZE) {
            return Err(in_record(ErrorKind::InvalidRecordLength(length)));
        }
        let length = length as u32;
        if offset + u64::from(length) > reader.len() {
            return Err(in_record(ErrorKind::TruncatedRecord));
        }
        reader.seek(offset)?;

        Ok(RecordSpan {
            offset,
            length,
            record_type: RecordType::from(code),
        })
    }
}

/// An iterator over the record spans of a buffer
///
/// Only record headers are read, so this works for files whose records
/// cannot all be decoded. Iteration stops after the first error.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    reader: Reader<'a>,
    failed: bool,
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<RecordSpan>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_at_end() {
            return None;
        }
        let res = RecordSpan::read(&mut self.reader)
            .and_then(|span| self.reader.seek(span.end()).map(|_| span));
        self.failed = res.is_err();
        Some(res)
    }
}

/// Iterate over the record spans of a buffer
pub fn records(buf: &[u8]) -> Records<'_> {
    Records {
        reader: Reader::new(buf),
        failed: false,
    }
}

/// The leading record of a file
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    /// Declared length of the record
    pub length: i32,
    /// Record type, always `-1`
    pub identifier: i32,
    /// File format version
    pub file_version: i32,
    /// Name of the writing application, `PAMGUARDDATA`
    #[br(try_map = |x: [u8; 12]| String::from_utf8(x.to_vec()))]
    pub application: String,
    /// Version of the writing application
    #[br(map = |s: JavaString| s.into_string())]
    pub application_version: String,
    /// Source branch of the writing application
    #[br(map = |s: JavaString| s.into_string())]
    pub branch: String,
    /// Time of the first data in the file
    #[br(try_map = |ms: i64| timestamp::from_millis(ms))]
    pub data_date: OffsetDateTime,
    /// Time at which the file was written
    #[br(try_map = |ms: i64| timestamp::from_millis(ms))]
    pub analysis_date: OffsetDateTime,
    /// Sample number of the first data
    pub start_sample: i64,
    /// Type of the module that wrote the file
    #[br(map = |s: JavaString| s.into_string())]
    pub module_type: String,
    /// Name of the module instance
    #[br(map = |s: JavaString| s.into_string())]
    pub module_name: String,
    /// Name of the module's output stream
    #[br(map = |s: JavaString| s.into_string())]
    pub stream_name: String,
    #[br(temp)]
    extra_info_length: i32,
    /// Additional header data, not interpreted
    #[br(count = to_len(extra_info_length))]
    pub extra_info: Vec<u8>,
}

/// The trailing record of a file
#[binread]
#[br(big, import(file_version: i32))]
#[derive(Debug, Clone, PartialEq)]
pub struct FileFooter {
    /// Declared length of the record
    pub length: i32,
    /// Record type, always `-2`
    pub identifier: i32,
    /// Number of data records in the file
    pub num_objects: i32,
    /// Time of the last data in the file
    #[br(try_map = |ms: i64| timestamp::from_millis(ms))]
    pub data_date: OffsetDateTime,
    /// Time at which the file was closed
    #[br(try_map = |ms: i64| timestamp::from_millis(ms))]
    pub analysis_date: OffsetDateTime,
    /// Sample number of the last data
    pub end_sample: i64,
    /// Lowest UID in the file, from version 3 on
    #[br(if(file_version >= 3))]
    pub lowest_uid: Option<i64>,
    /// Highest UID in the file, from version 3 on
    #[br(if(file_version >= 3))]
    pub highest_uid: Option<i64>,
    /// Length of the file in bytes
    pub file_length: i64,
    /// Why the file was closed
    pub end_reason: i32,
}

/// The record opening a module's data
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleHeader {
    /// Declared length of the record
    pub length: i32,
    /// Record type, always `-3`
    pub identifier: i32,
    /// Version of the module's data format
    pub module_version: i32,
    #[br(temp)]
    binary_length: i32,
    /// Module-specific header data, not interpreted
    #[br(count = to_len(binary_length))]
    pub data: Vec<u8>,
}

/// The record closing a module's data
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleFooter {
    /// Declared length of the record
    pub length: i32,
    /// Record type, always `-4`
    pub identifier: i32,
    #[br(temp)]
    binary_length: i32,
    /// Module-specific footer data, not interpreted
    #[br(count = to_len(binary_length))]
    pub data: Vec<u8>,
}

/// How the decoder reacts to records it cannot decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryPolicy {
    /// Every error aborts decoding
    #[default]
    Strict,
    /// Data records with an unsupported module type, a malformed payload or
    /// unknown annotation tags are skipped using their declared lengths.
    /// Truncation and container-level errors still abort decoding.
    Lenient,
}

/// Options controlling the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    /// The recovery policy
    pub policy: RecoveryPolicy,
}

impl DecodeOptions {
    /// Options with the lenient recovery policy
    pub fn lenient() -> Self {
        DecodeOptions {
            policy: RecoveryPolicy::Lenient,
        }
    }
}

#[derive(Default)]
struct State {
    header: Option<FileHeader>,
    footer: Option<FileFooter>,
    module: Option<Module>,
    skipped: Vec<SkippedRecord>,
}

/// Decoder for a whole PGDF buffer
///
/// ```
/// # use pgdf::parser::pgdf::{Decoder, DecodeOptions};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let buf: Vec<u8> = Vec::new();
/// let result = Decoder::new(&buf).options(DecodeOptions::lenient()).decode();
/// assert!(result.is_err()); // an empty buffer has no file header
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Decoder<'a> {
    reader: Reader<'a>,
    options: DecodeOptions,
    registry: PayloadRegistry,
}

impl<'a> Decoder<'a> {
    /// Create a decoder with default options and the default payload
    /// registry
    pub fn new(buf: &'a [u8]) -> Self {
        Decoder {
            reader: Reader::new(buf),
            options: DecodeOptions::default(),
            registry: PayloadRegistry::default(),
        }
    }

    /// Set the decoding options
    pub fn options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the payload registry
    pub fn registry(mut self, registry: PayloadRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Decode the whole buffer
    ///
    /// # Errors
    ///
    /// Returns the first error, located at the record that raised it. See
    /// [`RecoveryPolicy`] for the errors a lenient decoder skips instead.
    pub fn decode(mut self) -> Result<File> {
        let mut state = State::default();

        while !self.reader.is_at_end() {
            let span = RecordSpan::read(&mut self.reader)?;
            debug!(
                "{} record at offset {} ({} bytes)",
                span.record_type, span.offset, span.length
            );
            self.decode_record(span, &mut state)
                .map_err(|e| e.in_record(span.offset, span.record_type.code()))?;
            self.reader.seek(span.end())?;
        }

        let header = state
            .header
            .ok_or_else(|| Error::new(0, ErrorKind::MissingFileHeader))?;

        Ok(File {
            header,
            footer: state.footer,
            module: state.module,
            skipped: state.skipped,
        })
    }

    fn decode_record(&mut self, span: RecordSpan, state: &mut State) -> Result<()> {
        let offset = span.offset;
        match span.record_type {
            RecordType::FileHeader => {
                if state.header.is_some() {
                    return Err(Error::new(
                        offset,
                        ErrorKind::Malformed("second file header".to_string()),
                    ));
                }
                state.header = Some(self.reader.read()?);
            }
            RecordType::FileFooter => {
                let version = file_header(state, offset)?.file_version;
                state.footer = Some(self.reader.read_args((version,))?);
            }
            RecordType::ModuleHeader => {
                file_header(state, offset)?;
                if state.module.is_some() {
                    return Err(Error::new(offset, ErrorKind::DuplicateModule));
                }
                state.module = Some(Module::new(self.reader.read()?));
            }
            RecordType::ModuleFooter => {
                let footer = self.reader.read()?;
                open_module(&mut state.module, offset)?.footer = Some(footer);
            }
            RecordType::Reserved => {
                return Err(Error::new(
                    offset,
                    ErrorKind::UnsupportedRecordType(span.record_type.code()),
                ))
            }
            RecordType::Background | RecordType::Data(_) => self.decode_data(span, state)?,
        }
        Ok(())
    }

    fn decode_data(&mut self, span: RecordSpan, state: &mut State) -> Result<()> {
        let State {
            header,
            module,
            skipped,
            ..
        } = state;
        let header = header
            .as_ref()
            .ok_or_else(|| Error::new(span.offset, ErrorKind::MissingFileHeader))?;
        let module = open_module(module, span.offset)?;

        let pam = PamData::decode(&mut self.reader, header.file_version)?;
        if pam.is_background() {
            // background records carry no module payload
            module.background.push(pam);
            return Ok(());
        }

        match self.decode_object(pam, &header.module_type) {
            Ok(object) => module.objects.push(object),
            Err(err) if self.options.policy == RecoveryPolicy::Lenient && err.is_skippable() => {
                let error = err.in_record(span.offset, span.record_type.code());
                warn!("skipping record: {}", error);
                skipped.push(SkippedRecord {
                    offset: span.offset,
                    length: span.length,
                    error,
                });
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }

    fn decode_object(&mut self, mut pam: PamData, module_type: &str) -> Result<DataObject> {
        let payload = self.registry.decode(module_type, &mut self.reader, &pam)?;

        if pam.has_annotations() {
            if !pam.has_annotation_uid() {
                warn!(
                    "record at offset {} has annotations but no valid UID ({:?})",
                    pam.record_offset, pam.uid
                );
            }
            pam.annotations = Some(AnnotationSet::decode(
                &mut self.reader,
                self.options.policy,
            )?);
        }

        let consumed = self.reader.position() - pam.record_offset;
        if consumed != u64::from(pam.length as u32) {
            debug!(
                "record at offset {} declares {} bytes, {} were decoded",
                pam.record_offset, pam.length, consumed
            );
        }

        Ok(DataObject { pam, payload })
    }
}

fn file_header(state: &State, offset: u64) -> Result<&FileHeader> {
    state
        .header
        .as_ref()
        .ok_or_else(|| Error::new(offset, ErrorKind::MissingFileHeader))
}

fn open_module(module: &mut Option<Module>, offset: u64) -> Result<&mut Module> {
    match module {
        Some(m) if m.is_open() => Ok(m),
        _ => Err(Error::new(offset, ErrorKind::NoOpenModule)),
    }
}

/// Decode a whole buffer with default options
pub fn decode(buf: &[u8]) -> Result<File> {
    Decoder::new(buf).decode()
}

/// Read and decode a file with default options
pub fn read_file<P: AsRef<std::path::Path>>(path: P) -> Result<File> {
    read_file_with(path, DecodeOptions::default())
}

/// Read and decode a file with the given options
pub fn read_file_with<P: AsRef<std::path::Path>>(path: P, options: DecodeOptions) -> Result<File> {
    let buf = std::fs::read(path.as_ref())?;
    Decoder::new(&buf).options(options).decode()
}
