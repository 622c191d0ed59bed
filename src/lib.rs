#![warn(missing_docs)]
//! A toolkit for reading PAMGuard binary data files
//!
//! PAMGuard modules write their detections to `.pgdf` files. This crate
//! decodes a whole file into a [`model::File`]:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = pgdf::read_file("Gemini_Threshold_Detector_20220722_000004.pgdf")?;
//! for object in file.objects() {
//!     if let Some(track) = object.track() {
//!         println!("{:?}: {} points", object.pam.uid, track.len());
//!     }
//! }
//! # Ok(()) }
//! ```
pub mod cli;
pub mod error;
pub mod model;
pub mod parser;

pub use error::{Error, ErrorKind, Result};
pub use model::{DataObject, File, Module, Payload, SkippedRecord};
pub use parser::pgdf::{
    decode, read_file, read_file_with, records, DecodeOptions, Decoder, RecordSpan, RecordType,
    RecoveryPolicy,
};
