//! The data common to every PAMGuard data record
use crate::error::Result;
use crate::parser::annotations::AnnotationSet;
use crate::parser::flags::Flags;
use crate::parser::read::{stream_position, to_len, Reader};
use crate::parser::timestamp;
use binrw::binread;
use time::OffsetDateTime;

/// The identifier marking a background-noise record
pub const BACKGROUND_IDENTIFIER: i32 = -6;

/// The leading part of a data record
///
/// Every optional field is read only if its bit is set in [`PamData::flags`],
/// in the order in which the fields are declared here.
#[binread]
#[br(big, import(file_version: i32))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PamData {
    /// Offset of the record in the buffer
    #[br(parse_with = stream_position)]
    pub record_offset: u64,
    /// Declared length of the whole record in bytes
    pub length: i32,
    /// Record identifier, [`BACKGROUND_IDENTIFIER`] for background records
    pub identifier: i32,
    /// Milliseconds since the Unix epoch
    pub millis: i64,
    #[br(temp, if(file_version >= 3))]
    raw_flags: Option<u16>,
    /// The optional fields present in this record
    #[br(calc = Flags::for_version(file_version, raw_flags))]
    pub flags: Flags,
    /// Nanosecond-resolution time
    #[br(if(flags.test(Flags::TIME_NANOS)))]
    pub time_nanos: Option<i64>,
    /// Bitmap of the channels contributing to this record
    #[br(if(flags.test(Flags::CHANNEL_MAP)))]
    pub channel_map: Option<i32>,
    /// Unique identifier of the record
    #[br(if(flags.test(Flags::UID)))]
    pub uid: Option<i64>,
    /// First sample of the detection
    #[br(if(flags.test(Flags::START_SAMPLE)))]
    pub start_sample: Option<i64>,
    /// Duration in samples
    #[br(if(flags.test(Flags::SAMPLE_DURATION)))]
    pub sample_duration: Option<i32>,
    /// Low and high frequency limits in Hz
    #[br(if(flags.test(Flags::FREQUENCY_LIMITS)))]
    pub frequency_limits: Option<[f32; 2]>,
    /// Duration in milliseconds
    #[br(if(flags.test(Flags::MILLIS_DURATION)))]
    pub duration_millis: Option<f32>,
    #[br(temp, if(flags.test(Flags::TIME_DELAY_SECS)))]
    num_time_delays: Option<i16>,
    /// Time delays between hydrophones in seconds
    #[br(count = num_time_delays.map_or(0, to_len))]
    pub time_delays: Vec<f32>,
    /// Sequence map
    #[br(if(flags.test(Flags::HAS_SEQUENCE_MAP)))]
    pub sequence_map: Option<i32>,
    /// Noise level
    #[br(if(flags.test(Flags::HAS_NOISE)))]
    pub noise: Option<f32>,
    /// Signal level
    #[br(if(flags.test(Flags::HAS_SIGNAL)))]
    pub signal: Option<f32>,
    /// Signal excess
    #[br(if(flags.test(Flags::HAS_SIGNAL_EXCESS)))]
    pub signal_excess: Option<f32>,
    /// Annotations attached to the record, decoded after the module payload
    #[br(ignore)]
    pub annotations: Option<AnnotationSet>,
}

impl PamData {
    /// Decode the common fields of the record at the reader's position
    pub fn decode(reader: &mut Reader<'_>, file_version: i32) -> Result<PamData> {
        reader.read_args((file_version,))
    }

    /// Whether this is a background record rather than a detection
    pub fn is_background(&self) -> bool {
        self.identifier == BACKGROUND_IDENTIFIER
    }

    /// Whether an annotation block follows the module payload
    pub fn has_annotations(&self) -> bool {
        self.flags.test(Flags::HAS_BINARY_ANNOTATIONS)
    }

    /// Whether the record carries the non-negative UID that annotations
    /// are keyed by
    pub fn has_annotation_uid(&self) -> bool {
        self.uid.map_or(false, |uid| uid >= 0)
    }

    /// The offset at which the next record starts
    ///
    /// This is derived from the declared length only, however many bytes
    /// the record's decoders actually consumed.
    pub fn next_record_offset(&self) -> u64 {
        self.record_offset.saturating_add_signed(i64::from(self.length))
    }

    /// The record time, if it is representable
    pub fn date(&self) -> Option<OffsetDateTime> {
        timestamp::from_millis(self.millis).ok()
    }
}
