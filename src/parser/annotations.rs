//! Binary annotations attached to data records
//!
//! An annotation block follows the module payload of a data record whose
//! bitmap has [`Flags::HAS_BINARY_ANNOTATIONS`](crate::parser::flags::Flags)
//! set. The block holds a number of sub-records, each identified by a
//! string tag:
//!
//! ```text
//! i16 block length, i16 count,
//! count * { i16 length (including itself), tag, i16 version, payload }
//! ```
use crate::error::{Error, ErrorKind, Result};
use crate::parser::pgdf::RecoveryPolicy;
use crate::parser::read::{to_len, JavaString, Reader};
use binrw::binread;
use log::{trace, warn};

/// Beam-former angles (`Beer`)
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct BeamAngles {
    /// Bitmap of the hydrophones used
    pub hydrophones: u32,
    /// Array geometry type
    pub array_type: i16,
    /// Bitmap of the localisation content
    pub localisation_content: u32,
    #[br(temp)]
    num_angles: i16,
    /// Angles in radians
    #[br(count = to_len(num_angles))]
    pub angles: Vec<f32>,
}

/// Bearing localisation (`Bearing`)
#[binread]
#[br(big, import(version: i16))]
#[derive(Debug, Clone, PartialEq)]
pub struct Bearing {
    /// The sub-record version
    #[br(calc = version)]
    pub version: i16,
    /// Name of the localisation algorithm
    #[br(map = |s: JavaString| s.into_string())]
    pub algorithm_name: String,
    /// Bitmap of the hydrophones used
    pub hydrophones: u32,
    /// Array geometry type
    pub array_type: i16,
    /// Bitmap of the localisation content
    pub localisation_content: u32,
    #[br(temp)]
    num_angles: i16,
    /// Angles in radians
    #[br(count = to_len(num_angles))]
    pub angles: Vec<f32>,
    #[br(temp)]
    num_errors: i16,
    /// Angle errors in radians
    #[br(count = to_len(num_errors))]
    pub errors: Vec<f32>,
    #[br(temp, if(version >= 2))]
    num_reference_angles: Option<i16>,
    #[br(temp, count = num_reference_angles.map_or(0, to_len))]
    reference_angle_values: Vec<f32>,
    /// Reference angles, only written from version 2 on
    #[br(calc = num_reference_angles.map(|_| reference_angle_values.clone()))]
    pub reference_angles: Option<Vec<f32>>,
}

/// One localisation of a [`TargetMotion`] annotation
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Height in metres
    pub height: f32,
    /// Description of the error
    #[br(map = |s: JavaString| s.into_string())]
    pub error: String,
}

/// Target-motion localisation (`TMAN`)
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct TargetMotion {
    /// Name of the localisation model
    #[br(map = |s: JavaString| s.into_string())]
    pub model_name: String,
    #[br(temp)]
    num_locations: i16,
    /// Bitmap of the hydrophones used
    pub hydrophones: u32,
    /// The localisations
    #[br(count = to_len(num_locations))]
    pub locations: Vec<Location>,
}

/// Time-of-arrival-difference bearings (`TDBL`)
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct ToadAngles {
    #[br(temp)]
    num_angles: i16,
    /// Angles in radians
    #[br(count = to_len(num_angles))]
    pub angles: Vec<f32>,
    #[br(temp)]
    num_errors: i16,
    /// Angle errors in radians
    #[br(count = to_len(num_errors))]
    pub angle_errors: Vec<f32>,
}

/// Click classifier output (`ClickClasssifier_1`)
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct ClickClassification {
    #[br(temp)]
    num_classifications: i16,
    /// Species codes
    #[br(count = to_len(num_classifications))]
    pub classifications: Vec<i16>,
}

/// Result of one matched-filter template
#[binread]
#[br(big)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedTemplate {
    /// Classification threshold
    pub threshold: f64,
    /// Correlation with the match template
    pub match_correlation: f64,
    /// Correlation with the reject template
    pub reject_correlation: f64,
}

/// Matched click classifier output (`Matched_Clk_Clsfr`)
///
/// Version 1 holds a single template result, later versions a counted
/// list.
#[binread]
#[br(big, import(version: i16))]
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedClassification {
    #[br(temp, if(version >= 2))]
    num_templates: Option<i16>,
    /// One result per template
    #[br(count = num_templates.map_or(1, to_len))]
    pub templates: Vec<MatchedTemplate>,
}

/// Generic classification (`BCLS`)
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct BasicClassification {
    /// Class label
    #[br(map = |s: JavaString| s.into_string())]
    pub label: String,
    /// Classification method
    #[br(map = |s: JavaString| s.into_string())]
    pub method: String,
    /// Classification score
    pub score: f32,
}

/// Prediction of a deep-learning model
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Whether the model made a binary decision
    pub is_binary: bool,
    /// Per-species probabilities, scaled back to floating point
    pub predictions: Vec<f32>,
    /// Class identifiers
    pub class_ids: Vec<i16>,
}

impl Prediction {
    fn for_model(
        model_type: u8,
        is_binary: bool,
        scale: f32,
        species: &[i16],
        class_ids: &[i16],
    ) -> Option<Prediction> {
        match model_type {
            0 | 1 => Some(Prediction {
                is_binary,
                predictions: species.iter().map(|&s| f32::from(s) / scale).collect(),
                class_ids: class_ids.to_vec(),
            }),
            _ => None,
        }
    }
}

/// Output of one deep-learning model
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct DlModel {
    /// Model type tag
    pub model_type: u8,
    #[br(temp, map = |b: u8| b != 0)]
    is_binary: bool,
    /// Scale applied to the stored predictions
    pub scale: f32,
    #[br(temp)]
    num_species: i16,
    #[br(temp, count = to_len(num_species))]
    species: Vec<i16>,
    #[br(temp)]
    num_classes: i16,
    #[br(temp, count = to_len(num_classes))]
    class_ids: Vec<i16>,
    /// The prediction, `None` for model types that are not understood
    /// (unclassified)
    #[br(calc = Prediction::for_model(model_type, is_binary, scale, &species, &class_ids))]
    pub prediction: Option<Prediction>,
}

/// Deep-learning classification (`DLRE`, `Delt`)
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct DlClassification {
    #[br(temp)]
    num_models: i16,
    /// One result per model
    #[br(count = to_len(num_models))]
    pub models: Vec<DlModel>,
}

/// Free-form user data (`Uson`, `USON`)
#[binread]
#[br(big, import(length: usize))]
#[derive(Debug, Clone, PartialEq)]
pub struct UserForm {
    #[br(temp, count = length)]
    bytes: Vec<u8>,
    /// The form data as written by the user form module
    #[br(calc = String::from_utf8_lossy(&bytes).into_owned())]
    pub form_data: String,
}

/// An annotation sub-record with an unrecognised tag, kept verbatim when
/// decoding with [`RecoveryPolicy::Lenient`]
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnnotation {
    /// The tag
    pub tag: String,
    /// The sub-record version
    pub version: i16,
    /// The undecoded payload
    pub data: Vec<u8>,
}

/// The known annotation types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    /// `Beer`
    BeamAngles,
    /// `Bearing`
    Bearing,
    /// `TMAN`
    TargetMotion,
    /// `TDBL`
    ToadAngles,
    /// `ClickClasssifier_1`
    ClickClassification,
    /// `Matched_Clk_Clsfr`
    MatchedClassification,
    /// `BCLS`
    BasicClassification,
    /// `DLRE` or `Delt`
    DlClassification,
    /// `Uson` or `USON`
    UserForm,
}

impl AnnotationKind {
    /// Look up the annotation type written with `tag`
    pub fn from_tag(tag: &str) -> Option<AnnotationKind> {
        let kind = match tag {
            "Beer" => AnnotationKind::BeamAngles,
            "Bearing" => AnnotationKind::Bearing,
            "TMAN" => AnnotationKind::TargetMotion,
            "TDBL" => AnnotationKind::ToadAngles,
            // sic, the tag is misspelt by PAMGuard
            "ClickClasssifier_1" => AnnotationKind::ClickClassification,
            "Matched_Clk_Clsfr" => AnnotationKind::MatchedClassification,
            "BCLS" => AnnotationKind::BasicClassification,
            "DLRE" | "Delt" => AnnotationKind::DlClassification,
            "Uson" | "USON" => AnnotationKind::UserForm,
            _ => return None,
        };
        Some(kind)
    }
}

/// The annotations of one data record
///
/// There is one slot per annotation type. If a type occurs more than once
/// in a block the last occurrence wins.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationSet {
    /// Declared length of the annotation block
    pub block_length: i16,
    /// Beam-former angles
    pub beam_angles: Option<BeamAngles>,
    /// Bearing localisation
    pub bearing: Option<Bearing>,
    /// Target-motion localisation
    pub target_motion: Option<TargetMotion>,
    /// Time-of-arrival-difference bearings
    pub toad_angles: Option<ToadAngles>,
    /// Click classifier output
    pub click_classification: Option<ClickClassification>,
    /// Matched click classifier output
    pub matched_classification: Option<MatchedClassification>,
    /// Generic classification
    pub basic_classification: Option<BasicClassification>,
    /// Deep-learning classification
    pub dl_classification: Option<DlClassification>,
    /// User form data
    pub user_form: Option<UserForm>,
    /// Sub-records skipped because their tag is unknown
    pub unknown: Vec<RawAnnotation>,
}

impl AnnotationSet {
    /// Decode an annotation block at the reader's position
    ///
    /// Under [`RecoveryPolicy::Strict`] an unknown tag fails with
    /// [`ErrorKind::UnknownAnnotationTag`]. Under
    /// [`RecoveryPolicy::Lenient`] the sub-record is skipped using its
    /// declared length and kept in [`AnnotationSet::unknown`].
    pub fn decode(reader: &mut Reader<'_>, policy: RecoveryPolicy) -> Result<AnnotationSet> {
        let block_length = reader.read_i16()?;
        let count = reader.read_i16()?;
        let mut set = AnnotationSet {
            block_length,
            ..Default::default()
        };

        for _ in 0..to_len(count) {
            let start = reader.position();
            let length = reader.read_i16()?;
            let (tag, tag_length) = reader.read_java_string()?;
            let version = reader.read_i16()?;
            // length covers the length field, the tag and the version
            let payload_length = i64::from(length) - 4 - tag_length as i64;
            if payload_length < 0 {
                return Err(Error::new(
                    start,
                    ErrorKind::Malformed(format!(
                        "annotation {:?} declares {} bytes",
                        tag, length
                    )),
                ));
            }
            let payload_length = payload_length as usize;
            trace!(
                "annotation {:?} version {} at offset {} ({} bytes)",
                tag,
                version,
                start,
                length
            );

            let end = start + length as u64;
            match AnnotationKind::from_tag(&tag) {
                Some(kind) => {
                    set.decode_kind(kind, reader, version, payload_length)?;
                    let consumed = reader.position() - start;
                    if consumed != length as u64 {
                        warn!(
                            "annotation {:?} at offset {} declares {} bytes but {} were read",
                            tag, start, length, consumed
                        );
                    }
                }
                None => match policy {
                    RecoveryPolicy::Strict => {
                        return Err(Error::new(start, ErrorKind::UnknownAnnotationTag(tag)))
                    }
                    RecoveryPolicy::Lenient => {
                        warn!("skipping unknown annotation {:?} at offset {}", tag, start);
                        let data = reader.read_bytes(payload_length)?;
                        set.unknown.push(RawAnnotation { tag, version, data });
                    }
                },
            }
            // the next sub-record starts at the declared end
            reader.seek(end)?;
        }

        Ok(set)
    }

    fn decode_kind(
        &mut self,
        kind: AnnotationKind,
        reader: &mut Reader<'_>,
        version: i16,
        payload_length: usize,
    ) -> Result<()> {
        match kind {
            AnnotationKind::BeamAngles => self.beam_angles = Some(reader.read()?),
            AnnotationKind::Bearing => self.bearing = Some(reader.read_args((version,))?),
            AnnotationKind::TargetMotion => self.target_motion = Some(reader.read()?),
            AnnotationKind::ToadAngles => self.toad_angles = Some(reader.read()?),
            AnnotationKind::ClickClassification => {
                self.click_classification = Some(reader.read()?)
            }
            AnnotationKind::MatchedClassification => {
                self.matched_classification = Some(reader.read_args((version,))?)
            }
            AnnotationKind::BasicClassification => {
                self.basic_classification = Some(reader.read()?)
            }
            AnnotationKind::DlClassification => self.dl_classification = Some(reader.read()?),
            AnnotationKind::UserForm => {
                self.user_form = Some(reader.read_args((payload_length,))?)
            }
        }
        Ok(())
    }

    /// The number of decoded annotations, unknown ones included
    pub fn len(&self) -> usize {
        [
            self.beam_angles.is_some(),
            self.bearing.is_some(),
            self.target_motion.is_some(),
            self.toad_angles.is_some(),
            self.click_classification.is_some(),
            self.matched_classification.is_some(),
            self.basic_classification.is_some(),
            self.dl_classification.is_some(),
            self.user_form.is_some(),
        ]
        .iter()
        .filter(|&&present| present)
        .count()
            + self.unknown.len()
    }

    /// Whether no annotation was decoded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
