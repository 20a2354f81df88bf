// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! SWATHB record framing and payload layouts.
//!
//! File layout:
//!
//! ```text
//! "SWB1" | version: u16 | reserved: u16
//! record*
//! record = tag: [u8; 4] | len: u32 | payload: [u8; len] | crc32(payload): u32
//! ```
//!
//! All integers are little-endian. Depths and offsets are stored as signed
//! millimetres, headings as unsigned centidegrees.

use std::io::{self, BufRead, Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::core::{CalendarTime, Result, SwathError};

pub const MAGIC: [u8; 4] = *b"SWB1";
pub const VERSION: u16 = 1;
pub const HEADER_LEN: usize = 8;

pub const TAG_DATA: [u8; 4] = *b"DATA";
pub const TAG_COMMENT: [u8; 4] = *b"COMT";
pub const TAG_NAV: [u8; 4] = *b"NAV_";
pub const TAG_ATTITUDE: [u8; 4] = *b"ATT_";
pub const TAG_SVP: [u8; 4] = *b"SVP_";

/// Largest payload accepted.
pub const MAX_PAYLOAD_LEN: u32 = 16 * 1024 * 1024;

const NAME: &str = "SWATHB";

/// Metres to stored millimetres.
pub(crate) fn to_mm(metres: f64) -> i32 {
    (metres * 1000.0).round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

pub(crate) fn from_mm(mm: i32) -> f64 {
    f64::from(mm) / 1000.0
}

pub(crate) fn to_centideg(heading: f64) -> u16 {
    ((heading.rem_euclid(360.0) * 100.0).round() as u32 % 36_000) as u16
}

pub(crate) fn from_centideg(cdeg: u16) -> f64 {
    f64::from(cdeg) / 100.0
}

/// One bathymetry beam as stored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Beam {
    pub flag: u8,
    pub depth_mm: i32,
    pub across_mm: i32,
    pub along_mm: i32,
}

/// One sidescan pixel as stored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Pixel {
    pub intensity: f32,
    pub across_mm: i32,
    pub along_mm: i32,
}

/// `DATA` survey record.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct DataRecord {
    pub time_d: f64,
    /// Whether the record carries its own position.
    pub has_nav: bool,
    pub longitude: f64,
    pub latitude: f64,
    pub heading_cdeg: u16,
    /// km/h
    pub speed: f32,
    pub sonar_depth_mm: i32,
    pub altitude_mm: i32,
    pub beams: Vec<Beam>,
    pub amp: Vec<f32>,
    pub pixels: Vec<Pixel>,
}

/// `NAV_` position and heading fix.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct NavFix {
    pub time_d: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub speed: f32,
    pub heading_cdeg: u16,
    pub sonar_depth_mm: i32,
}

/// `ATT_` attitude fix.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct AttitudeSample {
    pub time_d: f64,
    pub roll: f32,
    pub pitch: f32,
    pub heave: f32,
}

/// `SVP_` sound velocity profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Profile {
    pub time_d: f64,
    pub depth: Vec<f32>,
    pub velocity: Vec<f32>,
}

/// Per-record limits taken from the format descriptor.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Limits {
    pub beams: usize,
    pub amp: usize,
    pub pixels: usize,
}

fn unintelligible(reason: impl Into<String>) -> SwathError {
    SwathError::unintelligible(NAME, reason)
}

/// Read and check the file header.
pub(crate) fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<u16> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(unintelligible(format!("bad magic {magic:02x?}")));
    }
    let version = reader.read_u16::<LittleEndian>()?;
    let _reserved = reader.read_u16::<LittleEndian>()?;
    if version == 0 || version > VERSION {
        return Err(unintelligible(format!("unsupported version {version}")));
    }
    Ok(version)
}

pub(crate) fn write_header<W: Write + ?Sized>(writer: &mut W) -> io::Result<()> {
    writer.write_all(&MAGIC)?;
    writer.write_u16::<LittleEndian>(VERSION)?;
    writer.write_u16::<LittleEndian>(0)
}

/// Read one framed record into `payload`.
///
/// A clean end of stream before the tag is `EndOfFile`. A truncated frame,
/// an oversized length or a checksum mismatch is `Unintelligible`; the
/// frame is consumed either way.
pub(crate) fn read_frame<R: BufRead>(
    reader: &mut R,
    payload: &mut Vec<u8>,
) -> Result<[u8; 4]> {
    if reader.fill_buf()?.is_empty() {
        return Err(SwathError::EndOfFile);
    }
    let truncated = |e: io::Error| match e.kind() {
        io::ErrorKind::UnexpectedEof => unintelligible("truncated record"),
        _ => SwathError::from(e),
    };

    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag).map_err(truncated)?;
    let len = reader.read_u32::<LittleEndian>().map_err(truncated)?;
    if len > MAX_PAYLOAD_LEN {
        io::copy(&mut reader.by_ref().take(u64::from(len) + 4), &mut io::sink())?;
        return Err(unintelligible(format!("payload length {len} exceeds limit")));
    }

    payload.clear();
    payload.try_reserve(len as usize)?;
    let read = reader.by_ref().take(u64::from(len)).read_to_end(payload)?;
    if read != len as usize {
        return Err(unintelligible("truncated record"));
    }
    let crc = reader.read_u32::<LittleEndian>().map_err(truncated)?;
    if crc32fast::hash(payload) != crc {
        return Err(unintelligible(format!(
            "checksum mismatch in {} record",
            String::from_utf8_lossy(&tag)
        )));
    }
    Ok(tag)
}

/// Frame `payload` under `tag` and write it.
pub(crate) fn write_frame<W: Write + ?Sized>(
    writer: &mut W,
    tag: [u8; 4],
    payload: &[u8],
) -> io::Result<()> {
    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_PAYLOAD_LEN)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "record too large"))?;
    writer.write_all(&tag)?;
    writer.write_u32::<LittleEndian>(len)?;
    writer.write_all(payload)?;
    writer.write_u32::<LittleEndian>(crc32fast::hash(payload))
}

/// Run a payload decoder, turning short reads and leftover bytes into
/// `Unintelligible`.
fn decode<T>(
    what: &str,
    payload: &[u8],
    f: impl FnOnce(&mut Cursor<&[u8]>) -> io::Result<T>,
) -> Result<T> {
    let mut cursor = Cursor::new(payload);
    let value = f(&mut cursor).map_err(|e| unintelligible(format!("{what} payload: {e}")))?;
    if cursor.position() as usize != payload.len() {
        return Err(unintelligible(format!(
            "{what} payload has {} trailing bytes",
            payload.len() - cursor.position() as usize
        )));
    }
    Ok(value)
}

/// Read a record time, rejecting values no calendar time can hold.
fn read_time(c: &mut Cursor<&[u8]>) -> io::Result<f64> {
    let time_d = c.read_f64::<LittleEndian>()?;
    if !CalendarTime::is_representable(time_d) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("time {time_d} out of range"),
        ));
    }
    Ok(time_d)
}

fn check_count(what: &str, count: usize, max: usize) -> io::Result<()> {
    if count > max {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{count} {what} exceed maximum {max}"),
        ));
    }
    Ok(())
}

impl DataRecord {
    /// Decode in place, reusing the record's buffers.
    pub(crate) fn decode_into(&mut self, payload: &[u8], limits: Limits) -> Result<()> {
        decode("DATA", payload, |c| {
            self.time_d = read_time(c)?;
            self.has_nav = c.read_u8()? != 0;
            self.longitude = c.read_f64::<LittleEndian>()?;
            self.latitude = c.read_f64::<LittleEndian>()?;
            self.heading_cdeg = c.read_u16::<LittleEndian>()?;
            self.speed = c.read_f32::<LittleEndian>()?;
            self.sonar_depth_mm = c.read_i32::<LittleEndian>()?;
            self.altitude_mm = c.read_i32::<LittleEndian>()?;
            let nbeams = c.read_u16::<LittleEndian>()? as usize;
            let namp = c.read_u16::<LittleEndian>()? as usize;
            let npixels = c.read_u16::<LittleEndian>()? as usize;
            check_count("beams", nbeams, limits.beams)?;
            check_count("amplitudes", namp, limits.amp)?;
            check_count("pixels", npixels, limits.pixels)?;

            self.beams.clear();
            for _ in 0..nbeams {
                self.beams.push(Beam {
                    flag: c.read_u8()?,
                    depth_mm: c.read_i32::<LittleEndian>()?,
                    across_mm: c.read_i32::<LittleEndian>()?,
                    along_mm: c.read_i32::<LittleEndian>()?,
                });
            }
            self.amp.clear();
            for _ in 0..namp {
                self.amp.push(c.read_f32::<LittleEndian>()?);
            }
            self.pixels.clear();
            for _ in 0..npixels {
                self.pixels.push(Pixel {
                    intensity: c.read_f32::<LittleEndian>()?,
                    across_mm: c.read_i32::<LittleEndian>()?,
                    along_mm: c.read_i32::<LittleEndian>()?,
                });
            }
            Ok(())
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) -> io::Result<()> {
        let count = |n: usize| {
            u16::try_from(n)
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "count exceeds u16"))
        };
        out.write_f64::<LittleEndian>(self.time_d)?;
        out.write_u8(u8::from(self.has_nav))?;
        out.write_f64::<LittleEndian>(self.longitude)?;
        out.write_f64::<LittleEndian>(self.latitude)?;
        out.write_u16::<LittleEndian>(self.heading_cdeg)?;
        out.write_f32::<LittleEndian>(self.speed)?;
        out.write_i32::<LittleEndian>(self.sonar_depth_mm)?;
        out.write_i32::<LittleEndian>(self.altitude_mm)?;
        out.write_u16::<LittleEndian>(count(self.beams.len())?)?;
        out.write_u16::<LittleEndian>(count(self.amp.len())?)?;
        out.write_u16::<LittleEndian>(count(self.pixels.len())?)?;
        for beam in &self.beams {
            out.write_u8(beam.flag)?;
            out.write_i32::<LittleEndian>(beam.depth_mm)?;
            out.write_i32::<LittleEndian>(beam.across_mm)?;
            out.write_i32::<LittleEndian>(beam.along_mm)?;
        }
        for amp in &self.amp {
            out.write_f32::<LittleEndian>(*amp)?;
        }
        for pixel in &self.pixels {
            out.write_f32::<LittleEndian>(pixel.intensity)?;
            out.write_i32::<LittleEndian>(pixel.across_mm)?;
            out.write_i32::<LittleEndian>(pixel.along_mm)?;
        }
        Ok(())
    }
}

impl NavFix {
    pub(crate) fn decode(payload: &[u8]) -> Result<Self> {
        decode("NAV_", payload, |c| {
            Ok(NavFix {
                time_d: read_time(c)?,
                longitude: c.read_f64::<LittleEndian>()?,
                latitude: c.read_f64::<LittleEndian>()?,
                speed: c.read_f32::<LittleEndian>()?,
                heading_cdeg: c.read_u16::<LittleEndian>()?,
                sonar_depth_mm: c.read_i32::<LittleEndian>()?,
            })
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) -> io::Result<()> {
        out.write_f64::<LittleEndian>(self.time_d)?;
        out.write_f64::<LittleEndian>(self.longitude)?;
        out.write_f64::<LittleEndian>(self.latitude)?;
        out.write_f32::<LittleEndian>(self.speed)?;
        out.write_u16::<LittleEndian>(self.heading_cdeg)?;
        out.write_i32::<LittleEndian>(self.sonar_depth_mm)
    }
}

impl AttitudeSample {
    pub(crate) fn decode(payload: &[u8]) -> Result<Self> {
        decode("ATT_", payload, |c| {
            Ok(AttitudeSample {
                time_d: read_time(c)?,
                roll: c.read_f32::<LittleEndian>()?,
                pitch: c.read_f32::<LittleEndian>()?,
                heave: c.read_f32::<LittleEndian>()?,
            })
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) -> io::Result<()> {
        out.write_f64::<LittleEndian>(self.time_d)?;
        out.write_f32::<LittleEndian>(self.roll)?;
        out.write_f32::<LittleEndian>(self.pitch)?;
        out.write_f32::<LittleEndian>(self.heave)
    }
}

impl Profile {
    /// Samples accepted in one profile.
    pub(crate) const MAX_SAMPLES: usize = 65_536;

    pub(crate) fn decode_into(&mut self, payload: &[u8]) -> Result<()> {
        decode("SVP_", payload, |c| {
            self.time_d = read_time(c)?;
            let n = c.read_u32::<LittleEndian>()? as usize;
            check_count("profile samples", n, Self::MAX_SAMPLES)?;
            self.depth.clear();
            self.velocity.clear();
            for _ in 0..n {
                self.depth.push(c.read_f32::<LittleEndian>()?);
                self.velocity.push(c.read_f32::<LittleEndian>()?);
            }
            Ok(())
        })
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) -> io::Result<()> {
        out.write_f64::<LittleEndian>(self.time_d)?;
        out.write_u32::<LittleEndian>(self.depth.len() as u32)?;
        for (depth, velocity) in self.depth.iter().zip(&self.velocity) {
            out.write_f32::<LittleEndian>(*depth)?;
            out.write_f32::<LittleEndian>(*velocity)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMITS: Limits = Limits {
        beams: 4,
        amp: 4,
        pixels: 4,
    };

    #[test]
    fn test_unit_conversions() {
        assert_eq!(to_mm(12.3456), 12346);
        assert_eq!(from_mm(-1500), -1.5);
        assert_eq!(to_centideg(359.999), 0);
        assert_eq!(to_centideg(-90.0), 27_000);
        assert_eq!(from_centideg(4550), 45.5);
    }

    #[test]
    fn test_frame_checksum_mismatch_is_consumed() {
        let mut bytes = Vec::new();
        write_frame(&mut bytes, TAG_COMMENT, b"hello").unwrap();
        write_frame(&mut bytes, TAG_COMMENT, b"world").unwrap();
        bytes[9] ^= 0xff;

        let mut reader = Cursor::new(bytes);
        let mut payload = Vec::new();
        let err = read_frame(&mut reader, &mut payload).unwrap_err();
        assert!(matches!(err, SwathError::Unintelligible { .. }));
        assert_eq!(read_frame(&mut reader, &mut payload).unwrap(), TAG_COMMENT);
        assert_eq!(payload, b"world");
        assert!(matches!(
            read_frame(&mut reader, &mut payload),
            Err(SwathError::EndOfFile)
        ));
    }

    #[test]
    fn test_truncated_frame() {
        let mut bytes = Vec::new();
        write_frame(&mut bytes, TAG_COMMENT, b"hello").unwrap();
        bytes.truncate(bytes.len() - 6);
        let mut payload = Vec::new();
        let err = read_frame(&mut Cursor::new(bytes), &mut payload).unwrap_err();
        assert!(matches!(err, SwathError::Unintelligible { .. }));
    }

    #[test]
    fn test_data_time_out_of_range() {
        for time_d in [f64::NAN, f64::INFINITY, 1e300] {
            let record = DataRecord {
                time_d,
                ..DataRecord::default()
            };
            let mut payload = Vec::new();
            record.encode(&mut payload).unwrap();
            let mut decoded = DataRecord::default();
            let err = decoded.decode_into(&payload, LIMITS).unwrap_err();
            assert!(matches!(err, SwathError::Unintelligible { .. }), "{err:?}");
        }
    }

    #[test]
    fn test_data_count_limit() {
        let record = DataRecord {
            beams: vec![Beam::default(); 5],
            ..DataRecord::default()
        };
        let mut payload = Vec::new();
        record.encode(&mut payload).unwrap();
        let mut decoded = DataRecord::default();
        let err = decoded.decode_into(&payload, LIMITS).unwrap_err();
        assert!(err.to_string().contains("5 beams exceed maximum 4"));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut payload = Vec::new();
        NavFix::default().encode(&mut payload).unwrap();
        payload.push(0);
        assert!(NavFix::decode(&payload).is_err());
    }

    #[test]
    fn test_header() {
        let mut bytes = Vec::new();
        write_header(&mut bytes).unwrap();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(read_header(&mut Cursor::new(&bytes)).unwrap(), VERSION);
        bytes[0] = b'X';
        assert!(read_header(&mut Cursor::new(&bytes)).is_err());
    }
}
