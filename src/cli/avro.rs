//! Converting PAMGuard track files to Avro files
use crate::model::DataObject;
use crate::parser::pgdf::{self, DecodeOptions};
use crate::parser::timestamp;

use apache_avro::{Schema, Writer};
use serde::Serialize;

const TRACK_POINT_SCHEMA: &str = r#"{"type": "record","namespace": "pgdf","name": "track_point","fields": [{"name": "uid", "type": ["null", "long"], "default": null},{"name": "track_millis", "type": "long"},{"name": "time", "type": "long"},{"name": "sonar_id", "type": "int"},{"name": "min_bearing", "type": "float"},{"name": "max_bearing", "type": "float"},{"name": "peak_bearing", "type": "float"},{"name": "min_range", "type": "float"},{"name": "max_range", "type": "float"},{"name": "peak_range", "type": "float"},{"name": "object_size", "type": "float"},{"name": "occupancy", "type": "float"},{"name": "average_value", "type": "int"},{"name": "total_value", "type": "int"},{"name": "max_value", "type": "int"}]}"#;

/// One track point, flattened with the record it belongs to
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPointRow {
    /// UID of the track's record
    pub uid: Option<i64>,
    /// Time of the track's record in milliseconds since the Unix epoch
    pub track_millis: i64,
    /// Time of the point in milliseconds since the Unix epoch
    pub time: i64,
    /// The sonar that made the observation
    pub sonar_id: i32,
    /// Smallest bearing covered by the object
    pub min_bearing: f32,
    /// Largest bearing covered by the object
    pub max_bearing: f32,
    /// Bearing of the strongest return
    pub peak_bearing: f32,
    /// Smallest range covered by the object
    pub min_range: f32,
    /// Largest range covered by the object
    pub max_range: f32,
    /// Range of the strongest return
    pub peak_range: f32,
    /// Size of the object
    pub object_size: f32,
    /// Fraction of the bounding box above threshold
    pub occupancy: f32,
    /// Average pixel value
    pub average_value: i32,
    /// Sum of pixel values
    pub total_value: i32,
    /// Largest pixel value
    pub max_value: i32,
}

/// Flatten the track points of `objects` into rows, in file order
pub fn track_point_rows(objects: &[DataObject]) -> impl Iterator<Item = TrackPointRow> + '_ {
    objects.iter().flat_map(|object| {
        let uid = object.pam.uid;
        let track_millis = object.pam.millis;
        object
            .track()
            .map(|t| t.points())
            .unwrap_or_default()
            .iter()
            .map(move |p| TrackPointRow {
                uid,
                track_millis,
                time: timestamp::to_millis(p.time),
                sonar_id: i32::from(p.sonar_id),
                min_bearing: p.min_bearing,
                max_bearing: p.max_bearing,
                peak_bearing: p.peak_bearing,
                min_range: p.min_range,
                max_range: p.max_range,
                peak_range: p.peak_range,
                object_size: p.object_size,
                occupancy: p.occupancy,
                average_value: i32::from(p.average_value),
                total_value: p.total_value,
                max_value: i32::from(p.max_value),
            })
    })
}

/// Convert a PGDF file to the Avro format
///
/// Every track point becomes one record of a single Avro file.
/// This is meant to be used from the command line interface:
/// ```console
/// $ pgdf avro <input> <output>
/// ```
pub fn avro(
    path: &std::path::PathBuf,
    output: &std::path::PathBuf,
    options: DecodeOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = Schema::parse_str(TRACK_POINT_SCHEMA)?;
    let file = pgdf::read_file_with(path, options)?;

    let g = std::fs::File::create(output)?;
    let mut writer = Writer::new(&schema, g);

    writer.extend_ser(track_point_rows(file.objects()))?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn schema_parses() {
        assert!(Schema::parse_str(TRACK_POINT_SCHEMA).is_ok());
    }

    #[test]
    fn no_objects_no_rows() {
        assert_eq!(track_point_rows(&[]).count(), 0);
    }
}
