//! Builders for synthetic PGDF files
#![allow(dead_code)]

pub const GEMINI: &str = "Gemini Threshold Detector";
pub const START_MILLIS: i64 = 1_658_448_004_000;

/// Big-endian byte builder
#[derive(Default, Clone)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn u8(mut self, v: u8) -> Self {
        self.0.push(v);
        self
    }
    pub fn i16(mut self, v: i16) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }
    pub fn u16(mut self, v: u16) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }
    pub fn i32(mut self, v: i32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }
    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }
    pub fn i64(mut self, v: i64) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }
    pub fn f32(mut self, v: f32) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }
    pub fn raw(mut self, v: &[u8]) -> Self {
        self.0.extend_from_slice(v);
        self
    }
    pub fn string(self, s: &str) -> Self {
        self.i16(s.len() as i16).raw(s.as_bytes())
    }
}

/// Prefix `body` with a record header
pub fn record(code: i32, body: &Bytes) -> Bytes {
    Bytes::default()
        .i32(8 + body.0.len() as i32)
        .i32(code)
        .raw(&body.0)
}

pub fn file_header(version: i32, module_type: &str) -> Bytes {
    record(
        -1,
        &Bytes::default()
            .i32(version)
            .raw(b"PAMGUARDDATA")
            .string("2.02.03")
            .string("core")
            .i64(START_MILLIS)
            .i64(START_MILLIS + 60_000)
            .i64(0)
            .string(module_type)
            .string("Gemini Threshold Detector")
            .string("Sonar Tracks")
            .i32(0),
    )
}

pub fn module_header() -> Bytes {
    record(-3, &Bytes::default().i32(1).i32(0))
}

pub fn module_footer() -> Bytes {
    record(-4, &Bytes::default().i32(0))
}

pub fn file_footer(version: i32, num_objects: i32) -> Bytes {
    let body = Bytes::default()
        .i32(num_objects)
        .i64(START_MILLIS)
        .i64(START_MILLIS + 120_000)
        .i64(48_000);
    let body = if version >= 3 {
        body.i64(1_861_000_198).i64(1_861_000_202)
    } else {
        body
    };
    record(-2, &body.i64(0).i32(0))
}

pub fn track_point(millis: i64, sonar_id: i16) -> Bytes {
    Bytes::default()
        .i64(millis)
        .i16(sonar_id)
        .f32(-0.25)
        .f32(0.25)
        .f32(0.0)
        .f32(10.0)
        .f32(12.0)
        .f32(11.0)
        .f32(0.5)
        .f32(0.75)
        .i16(30)
        .i32(3000)
        .i16(200)
}

pub fn track_payload(points: &[i64]) -> Bytes {
    let mut payload = Bytes::default()
        .i32(0)
        .i32(points.len() as i32)
        .u8(1)
        .i16(851)
        .f32(2.0)
        .f32(3.0)
        .f32(0.75);
    for &t in points {
        payload = payload.raw(&track_point(t, 851).0);
    }
    payload
}

/// The common fields of a version 3 or later data record
///
/// The record length is left as zero and filled in by [`data_record`].
pub fn pam_v3(identifier: i32, flags: u16, uid: Option<i64>) -> Bytes {
    let b = Bytes::default()
        .i32(0)
        .i32(identifier)
        .i64(START_MILLIS)
        .u16(flags);
    match uid {
        Some(uid) => b.i64(uid),
        None => b,
    }
}

/// Set the length field of a record built with [`pam_v3`]
pub fn data_record(parts: &[&Bytes]) -> Bytes {
    let mut buf: Vec<u8> = parts.iter().flat_map(|p| p.0.clone()).collect();
    let len = (buf.len() as i32).to_be_bytes();
    buf[..4].copy_from_slice(&len);
    Bytes(buf)
}

pub const FLAG_UID: u16 = 0x8;
pub const FLAG_ANNOTATIONS: u16 = 0x200;

/// A Gemini track record with a UID
pub fn track_record(uid: i64, points: &[i64]) -> Bytes {
    data_record(&[&pam_v3(1, FLAG_UID, Some(uid)), &track_payload(points)])
}

pub fn concat(parts: &[Bytes]) -> Vec<u8> {
    parts.iter().flat_map(|p| p.0.clone()).collect()
}

/// A complete version 4 file holding the given track records
pub fn gemini_file(records: &[Bytes]) -> Vec<u8> {
    let mut parts = vec![file_header(4, GEMINI), module_header()];
    parts.extend(records.iter().cloned());
    parts.push(module_footer());
    parts.push(file_footer(4, records.len() as i32));
    concat(&parts)
}
