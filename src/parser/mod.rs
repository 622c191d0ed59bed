//! Parsers for the PAMGuard binary file format
//!
//! [`pgdf`] decodes the record container. The common fields of each data
//! record are in [`pamdata`], module payloads are dispatched through
//! [`payload`] and the optional annotation block is in [`annotations`].
pub mod annotations;
pub mod flags;
pub mod gemini;
pub mod pamdata;
pub mod payload;
pub mod pgdf;
pub mod read;
pub mod timestamp;
