//! Print the tracks of a Gemini Threshold Detector file
use crate::model::DataObject;
use crate::parser::gemini::Track;
use crate::parser::pgdf::{self, DecodeOptions};
use std::io::Write;

/// The tracks of `objects` ordered by start time
///
/// Objects without a track payload are left out. If `uids` is not empty
/// only the objects with one of those UIDs are kept. Tracks without
/// points come first and equal start times keep their file order.
pub fn sorted_tracks<'a>(objects: &'a [DataObject], uids: &[i64]) -> Vec<(&'a DataObject, &'a Track)> {
    let mut tracks: Vec<_> = objects
        .iter()
        .filter(|o| uids.is_empty() || o.pam.uid.map_or(false, |uid| uids.contains(&uid)))
        .filter_map(|o| o.track().map(|t| (o, t)))
        .collect();
    tracks.sort_by_key(|(_, t)| t.start());
    tracks
}

/// Print the selected tracks and their points
pub fn tracks(
    path: std::path::PathBuf,
    uids: &[i64],
    output: Option<std::path::PathBuf>,
    options: DecodeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = pgdf::read_file_with(path, options)?;
    let mut writer = super::output_writer(output)?;

    for (object, track) in sorted_tracks(file.objects(), uids) {
        let uid = object
            .pam
            .uid
            .map_or_else(|| "-".to_string(), |uid| uid.to_string());
        writeln!(writer, "{}\t{} points", uid, track.len())?;
        for p in track.points() {
            writeln!(
                writer,
                "\t{}\t{}\t{:.3}\t{:.3}\t{:.3}",
                p.time, p.sonar_id, p.peak_bearing, p.peak_range, p.object_size
            )?;
        }
    }
    writer.flush()?;
    Ok(())
}
