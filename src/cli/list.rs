//! List the records in a given file
use crate::parser::pgdf;
use std::io::Write;

/// Print one line per record: offset, declared length and type
///
/// Only record headers are read, so files with undecodable payloads can
/// still be listed. Listing stops at the first malformed header.
pub fn list(
    path: std::path::PathBuf,
    output: Option<std::path::PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let buf = std::fs::read(path)?;
    let mut writer = super::output_writer(output)?;
    for span in pgdf::records(&buf) {
        let span = span?;
        writeln!(
            writer,
            "{}\t{}\t{}",
            span.offset, span.length, span.record_type
        )?;
    }
    writer.flush()?;
    Ok(())
}
