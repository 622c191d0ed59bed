//! Tracks from the Gemini Threshold Detector
//!
//! The detector follows objects seen by Tritech Gemini imaging sonars and
//! writes one data record per track.
use crate::parser::read::to_len;
use crate::parser::timestamp;
use binrw::binread;
use time::OffsetDateTime;

/// The module type written by the Gemini Threshold Detector
pub const MODULE_TYPE: &str = "Gemini Threshold Detector";

/// Size of one track point in the file
pub const TRACK_POINT_SIZE: usize = 50;

/// One observation of a tracked object
#[binread]
#[br(big)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    /// Time of the sonar frame
    #[br(try_map = |ms: i64| timestamp::from_millis(ms))]
    pub time: OffsetDateTime,
    /// The sonar that made the observation
    pub sonar_id: i16,
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
    /// Fraction of the object's bounding box above threshold
    pub occupancy: f32,
    /// Average pixel value
    pub average_value: i16,
    /// Sum of pixel values
    pub total_value: i32,
    /// Largest pixel value
    pub max_value: i16,
}

/// The points of a track, ordered by time
///
/// Points are inserted after any earlier or equal-time point, so the order
/// is the same as a stable sort of the insertion order by time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    /// Create an empty track
    pub fn new() -> Self {
        Track::default()
    }

    /// Add a point, keeping the track sorted by time
    pub fn push(&mut self, point: TrackPoint) {
        let idx = self.points.partition_point(|p| p.time <= point.time);
        self.points.insert(idx, point);
    }

    /// The points in time order
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the track has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Time of the earliest point
    pub fn start(&self) -> Option<OffsetDateTime> {
        self.points.first().map(|p| p.time)
    }

    /// Time of the latest point
    pub fn end(&self) -> Option<OffsetDateTime> {
        self.points.last().map(|p| p.time)
    }
}

impl FromIterator<TrackPoint> for Track {
    fn from_iter<I: IntoIterator<Item = TrackPoint>>(iter: I) -> Self {
        let mut track = Track::new();
        for point in iter {
            track.push(point);
        }
        track
    }
}

/// The module payload of a Gemini Threshold Detector record
#[binread]
#[br(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPayload {
    /// Declared length of the payload
    pub data_length: i32,
    /// Number of points written
    pub point_count: i32,
    #[br(temp)]
    num_sonars: i8,
    /// The sonars contributing to the track
    #[br(count = to_len(num_sonars))]
    pub sonar_ids: Vec<i16>,
    /// Distance between the first and last point
    pub straight_length: f32,
    /// Length of the path through every point
    pub path_length: f32,
    /// Mean occupancy over all points
    pub mean_occupancy: f32,
    #[br(temp, count = to_len(point_count))]
    points: Vec<TrackPoint>,
    /// The track
    #[br(calc = points.iter().copied().collect())]
    pub track: Track,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::read::test::Bytes;
    use crate::parser::read::Reader;

    fn point(millis: i64, sonar_id: i16) -> Bytes {
        Bytes::default()
            .i64(millis)
            .i16(sonar_id)
            .f32(-0.3)
            .f32(0.2)
            .f32(0.0)
            .f32(4.5)
            .f32(5.5)
            .f32(5.0)
            .f32(0.8)
            .f32(0.6)
            .i16(40)
            .i32(4000)
            .i16(255)
    }

    #[test]
    fn track_point_is_fifty_bytes() {
        let buf = point(1_658_448_004_000, 2).0;
        assert_eq!(buf.len(), TRACK_POINT_SIZE);
        let mut r = Reader::new(&buf);
        let p: TrackPoint = r.read().unwrap();
        assert!(r.is_at_end());
        assert_eq!(p.sonar_id, 2);
        assert_eq!(p.max_range, 5.5);
        assert_eq!(p.occupancy, 0.6);
        assert_eq!(p.average_value, 40);
        assert_eq!(p.total_value, 4000);
        assert_eq!(p.max_value, 255);
        assert_eq!(timestamp::to_millis(p.time), 1_658_448_004_000);
    }

    #[test]
    fn track_stays_sorted() {
        let times = [50, 10, 30, 10, 70, 0, 30];
        let points: Vec<TrackPoint> = times
            .iter()
            .enumerate()
            .map(|(i, &t)| {
                let buf = point(t, i as i16).0;
                Reader::new(&buf).read().unwrap()
            })
            .collect();

        let mut track = Track::new();
        for p in &points {
            track.push(*p);
            assert!(track.points().windows(2).all(|w| w[0].time <= w[1].time));
        }
        // equal times keep their insertion order
        let ids: Vec<i16> = track.points().iter().map(|p| p.sonar_id).collect();
        assert_eq!(ids, vec![5, 1, 3, 2, 6, 0, 4]);
        assert_eq!(track.start(), Some(points[5].time));
        assert_eq!(track.end(), Some(points[4].time));
    }

    #[test]
    fn decodes_payload() {
        let buf = Bytes::default()
            .i32(0)
            .i32(2)
            .u8(2)
            .i16(851)
            .i16(852)
            .f32(3.0)
            .f32(4.5)
            .f32(0.5)
            .raw(&point(2000, 851).0)
            .raw(&point(1000, 852).0)
            .0;
        let mut r = Reader::new(&buf);
        let payload: TrackPayload = r.read().unwrap();
        assert!(r.is_at_end());
        assert_eq!(payload.sonar_ids, vec![851, 852]);
        assert_eq!(payload.path_length, 4.5);
        assert_eq!(payload.track.len(), 2);
        assert_eq!(payload.track.points()[0].sonar_id, 852);
    }

    #[test]
    fn negative_sonar_count_reads_no_ids() {
        let buf = Bytes::default()
            .i32(0)
            .i32(1)
            .u8(0x80)
            .f32(3.0)
            .f32(4.5)
            .f32(0.5)
            .raw(&point(1000, 851).0)
            .0;
        let mut r = Reader::new(&buf);
        let payload: TrackPayload = r.read().unwrap();
        assert!(r.is_at_end());
        assert!(payload.sonar_ids.is_empty());
        assert_eq!(payload.straight_length, 3.0);
        assert_eq!(payload.track.len(), 1);
    }
}
