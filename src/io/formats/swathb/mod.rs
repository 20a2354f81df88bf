// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! SWATHB: instrument-neutral tagged binary interchange format (id 71).
//!
//! A single stream of framed, checksummed records (see [`records`]).
//! Survey records may carry their own position; those that do not are
//! positioned from the `NAV_` fixes seen so far. Every `NAV_` and `ATT_`
//! record feeds the session's fix stores.

pub mod records;

use tracing::trace;

use crate::core::{
    Altitude, AttitudeRecord, BeamFlag, LonFlip, NavRecord, Ping, RecordKind, Result,
    SoundVelocityProfile, SwathError,
};
use crate::io::descriptor::{FileEncoding, FormatDescriptor, SystemFamily};
use crate::io::traits::{CodecState, ReadContext, SwathFormat, WriteContext};

pub use records::MAGIC;
use records::{
    from_centideg, from_mm, read_frame, read_header, to_centideg, to_mm, write_frame,
    write_header, AttitudeSample, Beam, DataRecord, Limits, NavFix, Pixel, Profile, TAG_ATTITUDE,
    TAG_COMMENT, TAG_DATA, TAG_NAV, TAG_SVP,
};

pub const FORMAT_ID: i32 = 71;

static DESCRIPTOR: FormatDescriptor = FormatDescriptor {
    id: FORMAT_ID,
    name: "SWATHB",
    description: "Tagged binary swath interchange, flagged beams, embedded or asynchronous navigation",
    family: SystemFamily::Interchange,
    beams_bath_max: 512,
    beams_amp_max: 512,
    pixels_ss_max: 2048,
    companion_suffixes: &[],
    encoding: FileEncoding::TaggedBinary,
    variable_beams: true,
    traveltime: false,
    beam_flagging: true,
    nav_source: Some(RecordKind::Data),
    heading_source: Some(RecordKind::Data),
    attitude_source: Some(RecordKind::Attitude),
    svp_source: Some(RecordKind::SoundVelocity),
    beamwidth_along: 1.0,
    beamwidth_across: 1.0,
    extensions: &["swb"],
};

/// Registry entry for SWATHB.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwathBinaryFormat;

impl SwathFormat for SwathBinaryFormat {
    fn descriptor(&self) -> &FormatDescriptor {
        &DESCRIPTOR
    }

    fn allocate(&self) -> Result<Box<dyn CodecState>> {
        Ok(Box::new(SwathBinaryState::try_new(&DESCRIPTOR)?))
    }
}

/// Codec-private state of one SWATHB session.
#[derive(Debug, Default)]
pub struct SwathBinaryState {
    header_done: bool,
    kind: RecordKind,
    data: DataRecord,
    /// Attitude interpolated at the last survey ping.
    data_attitude: (f64, f64, f64),
    nav: NavFix,
    attitude: AttitudeSample,
    profile: Profile,
    comment: String,
    payload: Vec<u8>,
}

impl SwathBinaryState {
    fn try_new(descriptor: &FormatDescriptor) -> Result<Self> {
        let mut state = Self::default();
        state.data.beams.try_reserve_exact(descriptor.beams_bath_max)?;
        state.data.amp.try_reserve_exact(descriptor.beams_amp_max)?;
        state.data.pixels.try_reserve_exact(descriptor.pixels_ss_max)?;
        Ok(state)
    }

    fn limits(descriptor: &FormatDescriptor) -> Limits {
        Limits {
            beams: descriptor.beams_bath_max,
            amp: descriptor.beams_amp_max,
            pixels: descriptor.pixels_ss_max,
        }
    }

    /// Fill in position, heading and attitude of a survey record from the
    /// fix stores.
    fn position_from_fixes(&mut self, ctx: &ReadContext<'_>) {
        let time_d = self.data.time_d;
        if !self.data.has_nav {
            let heading = ctx
                .fixes
                .heading_at(time_d)
                .unwrap_or(from_centideg(self.data.heading_cdeg));
            match ctx.fixes.position_at(time_d, heading, f64::from(self.data.speed)) {
                Ok(estimate) => {
                    self.data.longitude = estimate.longitude;
                    self.data.latitude = estimate.latitude;
                    self.data.speed = estimate.speed as f32;
                }
                Err(e) => {
                    trace!(time_d, error = %e, "survey record left unpositioned");
                    self.data.longitude = 0.0;
                    self.data.latitude = 0.0;
                }
            }
            self.data.heading_cdeg = to_centideg(heading);
        }
        self.data_attitude = ctx
            .fixes
            .attitude_at(time_d)
            .map(|a| (a.roll, a.pitch, a.heave))
            .unwrap_or_default();
    }

    fn wrong_kind(&self, what: &str) -> SwathError {
        SwathError::bad_parameter("record", format!("no {what} in a {} record", self.kind))
    }
}

impl CodecState for SwathBinaryState {
    fn read_ping(&mut self, ctx: &mut ReadContext<'_>) -> Result<RecordKind> {
        let limits = Self::limits(ctx.descriptor);
        let stream = ctx.primary()?;
        if !self.header_done {
            self.header_done = true;
            read_header(stream)?;
        }
        let tag = read_frame(stream, &mut self.payload)?;

        self.kind = match tag {
            TAG_DATA => {
                self.data.decode_into(&self.payload, limits)?;
                if self.data.has_nav {
                    ctx.fixes
                        .add_position(self.data.time_d, self.data.longitude, self.data.latitude);
                    ctx.fixes
                        .add_heading(self.data.time_d, from_centideg(self.data.heading_cdeg));
                }
                self.position_from_fixes(ctx);
                RecordKind::Data
            }
            TAG_COMMENT => {
                self.comment.clear();
                self.comment.push_str(&String::from_utf8_lossy(&self.payload));
                RecordKind::Comment
            }
            TAG_NAV => {
                self.nav = NavFix::decode(&self.payload)?;
                ctx.fixes
                    .add_position(self.nav.time_d, self.nav.longitude, self.nav.latitude);
                ctx.fixes
                    .add_heading(self.nav.time_d, from_centideg(self.nav.heading_cdeg));
                RecordKind::Navigation
            }
            TAG_ATTITUDE => {
                self.attitude = AttitudeSample::decode(&self.payload)?;
                ctx.fixes.add_attitude(
                    self.attitude.time_d,
                    f64::from(self.attitude.roll),
                    f64::from(self.attitude.pitch),
                    f64::from(self.attitude.heave),
                );
                RecordKind::Attitude
            }
            TAG_SVP => {
                self.profile.decode_into(&self.payload)?;
                RecordKind::SoundVelocity
            }
            other => {
                return Err(SwathError::unintelligible(
                    DESCRIPTOR.name,
                    format!("unknown record tag {:02x?}", other),
                ))
            }
        };
        Ok(self.kind)
    }

    fn write_ping(&mut self, ctx: &mut WriteContext<'_>, kind: RecordKind) -> Result<()> {
        self.payload.clear();
        let tag = match kind {
            RecordKind::Data => {
                self.data.encode(&mut self.payload)?;
                TAG_DATA
            }
            RecordKind::Comment => {
                self.payload.extend_from_slice(self.comment.as_bytes());
                TAG_COMMENT
            }
            RecordKind::Navigation => {
                self.nav.encode(&mut self.payload)?;
                TAG_NAV
            }
            RecordKind::Attitude => {
                self.attitude.encode(&mut self.payload)?;
                TAG_ATTITUDE
            }
            RecordKind::SoundVelocity => {
                self.profile.encode(&mut self.payload)?;
                TAG_SVP
            }
            other => {
                return Err(SwathError::unsupported(format!("write {other} records")));
            }
        };

        let stream = ctx.primary()?;
        if !self.header_done {
            write_header(stream).map_err(|e| SwathError::write_failed(e.to_string()))?;
            self.header_done = true;
        }
        write_frame(stream, tag, &self.payload)
            .map_err(|e| SwathError::write_failed(e.to_string()))?;
        self.kind = kind;
        Ok(())
    }

    fn extract(&self, ping: &mut Ping, lonflip: LonFlip) -> Result<()> {
        match self.kind {
            RecordKind::Data => {
                let data = &self.data;
                ping.set_time_d(data.time_d)?;
                ping.longitude = lonflip.apply(data.longitude);
                ping.latitude = data.latitude;
                ping.heading = from_centideg(data.heading_cdeg);
                ping.speed = f64::from(data.speed);
                for beam in &data.beams {
                    ping.push_beam(
                        BeamFlag(beam.flag),
                        from_mm(beam.depth_mm),
                        from_mm(beam.across_mm),
                        from_mm(beam.along_mm),
                    );
                }
                ping.amp.extend(data.amp.iter().map(|a| f64::from(*a)));
                for pixel in &data.pixels {
                    ping.push_pixel(
                        f64::from(pixel.intensity),
                        from_mm(pixel.across_mm),
                        from_mm(pixel.along_mm),
                    );
                }
            }
            RecordKind::Comment => {
                ping.comment.push_str(&self.comment);
            }
            RecordKind::Navigation => {
                ping.set_time_d(self.nav.time_d)?;
                ping.longitude = lonflip.apply(self.nav.longitude);
                ping.latitude = self.nav.latitude;
                ping.heading = from_centideg(self.nav.heading_cdeg);
                ping.speed = f64::from(self.nav.speed);
            }
            RecordKind::Attitude => ping.set_time_d(self.attitude.time_d)?,
            RecordKind::SoundVelocity => ping.set_time_d(self.profile.time_d)?,
            _ => {}
        }
        Ok(())
    }

    fn insert(&mut self, ping: &Ping) -> Result<()> {
        match ping.kind {
            RecordKind::Data => {
                let data = &mut self.data;
                data.time_d = ping.time_d;
                data.has_nav = true;
                data.longitude = ping.longitude;
                data.latitude = ping.latitude;
                data.heading_cdeg = to_centideg(ping.heading);
                data.speed = ping.speed as f32;
                data.sonar_depth_mm = 0;
                data.altitude_mm = 0;
                data.beams.clear();
                for i in 0..ping.beam_count() {
                    data.beams.push(Beam {
                        flag: ping.beam_flags[i].0,
                        depth_mm: to_mm(ping.bath[i]),
                        across_mm: to_mm(ping.bath_acrosstrack[i]),
                        along_mm: to_mm(ping.bath_alongtrack[i]),
                    });
                }
                data.amp.clear();
                data.amp.extend(ping.amp.iter().map(|a| *a as f32));
                data.pixels.clear();
                for i in 0..ping.pixel_count() {
                    data.pixels.push(Pixel {
                        intensity: ping.ss[i] as f32,
                        across_mm: to_mm(ping.ss_acrosstrack[i]),
                        along_mm: to_mm(ping.ss_alongtrack[i]),
                    });
                }
            }
            RecordKind::Comment => {
                self.comment.clear();
                self.comment.push_str(&ping.comment);
            }
            RecordKind::Navigation => {
                self.nav.time_d = ping.time_d;
                self.nav.longitude = ping.longitude;
                self.nav.latitude = ping.latitude;
                self.nav.heading_cdeg = to_centideg(ping.heading);
                self.nav.speed = ping.speed as f32;
                self.nav.sonar_depth_mm = 0;
            }
            _ => {}
        }
        self.kind = ping.kind;
        Ok(())
    }

    fn extract_navigation(&self, lonflip: LonFlip) -> Result<NavRecord> {
        match self.kind {
            RecordKind::Data => {
                let (roll, pitch, heave) = self.data_attitude;
                Ok(NavRecord {
                    kind: RecordKind::Data,
                    time_d: self.data.time_d,
                    longitude: lonflip.apply(self.data.longitude),
                    latitude: self.data.latitude,
                    speed: f64::from(self.data.speed),
                    heading: from_centideg(self.data.heading_cdeg),
                    sonar_depth: from_mm(self.data.sonar_depth_mm),
                    roll,
                    pitch,
                    heave,
                })
            }
            RecordKind::Navigation => Ok(NavRecord {
                kind: RecordKind::Navigation,
                time_d: self.nav.time_d,
                longitude: lonflip.apply(self.nav.longitude),
                latitude: self.nav.latitude,
                speed: f64::from(self.nav.speed),
                heading: from_centideg(self.nav.heading_cdeg),
                sonar_depth: from_mm(self.nav.sonar_depth_mm),
                ..NavRecord::default()
            }),
            _ => Err(self.wrong_kind("navigation")),
        }
    }

    fn insert_navigation(&mut self, nav: &NavRecord) -> Result<()> {
        self.nav = NavFix {
            time_d: nav.time_d,
            longitude: nav.longitude,
            latitude: nav.latitude,
            speed: nav.speed as f32,
            heading_cdeg: to_centideg(nav.heading),
            sonar_depth_mm: to_mm(nav.sonar_depth),
        };
        if self.kind == RecordKind::Data {
            self.data.has_nav = true;
            self.data.longitude = nav.longitude;
            self.data.latitude = nav.latitude;
            self.data.speed = nav.speed as f32;
            self.data.heading_cdeg = to_centideg(nav.heading);
            self.data.sonar_depth_mm = to_mm(nav.sonar_depth);
        }
        Ok(())
    }

    fn extract_attitude(&self) -> Result<AttitudeRecord> {
        let (time_d, roll, pitch, heave) = match self.kind {
            RecordKind::Attitude => (
                self.attitude.time_d,
                f64::from(self.attitude.roll),
                f64::from(self.attitude.pitch),
                f64::from(self.attitude.heave),
            ),
            RecordKind::Data => {
                let (roll, pitch, heave) = self.data_attitude;
                (self.data.time_d, roll, pitch, heave)
            }
            _ => return Err(self.wrong_kind("attitude")),
        };
        Ok(AttitudeRecord {
            time_d: vec![time_d],
            roll: vec![roll],
            pitch: vec![pitch],
            heave: vec![heave],
        })
    }

    fn insert_attitude(&mut self, attitude: &AttitudeRecord) -> Result<()> {
        let first = |values: &[f64]| values.first().copied();
        match (
            first(&attitude.time_d),
            first(&attitude.roll),
            first(&attitude.pitch),
            first(&attitude.heave),
        ) {
            (Some(time_d), Some(roll), Some(pitch), Some(heave)) => {
                self.attitude = AttitudeSample {
                    time_d,
                    roll: roll as f32,
                    pitch: pitch as f32,
                    heave: heave as f32,
                };
                Ok(())
            }
            _ => Err(SwathError::bad_parameter("attitude", "no attitude samples")),
        }
    }

    fn extract_sound_velocity_profile(&self) -> Result<SoundVelocityProfile> {
        if self.kind != RecordKind::SoundVelocity {
            return Err(self.wrong_kind("sound velocity profile"));
        }
        Ok(SoundVelocityProfile {
            time_d: self.profile.time_d,
            depth: self.profile.depth.iter().map(|d| f64::from(*d)).collect(),
            velocity: self.profile.velocity.iter().map(|v| f64::from(*v)).collect(),
        })
    }

    fn insert_sound_velocity_profile(&mut self, svp: &SoundVelocityProfile) -> Result<()> {
        if svp.depth.len() != svp.velocity.len() {
            return Err(SwathError::bad_parameter(
                "svp",
                "depth and velocity arrays differ in length",
            ));
        }
        if svp.depth.len() > Profile::MAX_SAMPLES {
            return Err(SwathError::bad_parameter(
                "svp",
                format!("{} samples exceed {}", svp.depth.len(), Profile::MAX_SAMPLES),
            ));
        }
        self.profile.time_d = svp.time_d;
        self.profile.depth = svp.depth.iter().map(|d| *d as f32).collect();
        self.profile.velocity = svp.velocity.iter().map(|v| *v as f32).collect();
        Ok(())
    }

    fn extract_altitude(&self) -> Result<Altitude> {
        if self.kind != RecordKind::Data {
            return Err(self.wrong_kind("altitude"));
        }
        Ok(Altitude {
            sonar_depth: from_mm(self.data.sonar_depth_mm),
            altitude: from_mm(self.data.altitude_mm),
        })
    }

    fn insert_altitude(&mut self, altitude: &Altitude) -> Result<()> {
        if self.kind != RecordKind::Data {
            return Err(self.wrong_kind("altitude"));
        }
        self.data.sonar_depth_mm = to_mm(altitude.sonar_depth);
        self.data.altitude_mm = to_mm(altitude.altitude);
        Ok(())
    }

    fn free(&mut self) {
        self.data = DataRecord::default();
        self.profile = Profile::default();
        self.payload = Vec::new();
        self.comment = String::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::traits::{InputStream, OutputStream};
    use crate::nav::{FixRecorder, SensorFixes};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn encode(records: &[(RecordKind, Ping)]) -> Vec<u8> {
        let buf = SharedBuf::default();
        let mut outputs: Vec<OutputStream> = vec![Box::new(buf.clone())];
        let mut state = SwathBinaryState::try_new(&DESCRIPTOR).unwrap();
        for (kind, ping) in records {
            state.insert(ping).unwrap();
            let mut ctx = WriteContext::new(&mut outputs, &DESCRIPTOR);
            state.write_ping(&mut ctx, *kind).unwrap();
        }
        let bytes = buf.0.lock().unwrap().clone();
        bytes
    }

    fn nav_ping(time_d: f64, lon: f64, lat: f64) -> Ping {
        Ping {
            kind: RecordKind::Navigation,
            time_d,
            longitude: lon,
            latitude: lat,
            heading: 90.0,
            ..Ping::default()
        }
    }

    #[test]
    fn test_unpositioned_ping_interpolated_from_nav() {
        let mut bytes = encode(&[
            (RecordKind::Navigation, nav_ping(10.0, 1.0, 2.0)),
            (RecordKind::Navigation, nav_ping(20.0, 1.2, 2.2)),
        ]);
        let survey = DataRecord {
            time_d: 15.0,
            beams: vec![Beam {
                flag: BeamFlag::GOOD.0,
                depth_mm: 100_000,
                ..Beam::default()
            }],
            ..DataRecord::default()
        };
        let mut payload = Vec::new();
        survey.encode(&mut payload).unwrap();
        write_frame(&mut bytes, TAG_DATA, &payload).unwrap();

        let mut inputs: Vec<InputStream> = vec![Box::new(Cursor::new(bytes))];
        let mut fixes = SensorFixes::new(16);
        let mut state = SwathBinaryState::try_new(&DESCRIPTOR).unwrap();
        let mut kinds = Vec::new();
        for _ in 0..3 {
            let mut ctx = ReadContext::new(&mut inputs, FixRecorder::new(&mut fixes), &DESCRIPTOR);
            kinds.push(state.read_ping(&mut ctx).unwrap());
        }
        assert_eq!(
            kinds,
            vec![RecordKind::Navigation, RecordKind::Navigation, RecordKind::Data]
        );
        assert_eq!(fixes.position().len(), 2);

        let mut ping = Ping::default();
        state.extract(&mut ping, LonFlip::Centered).unwrap();
        assert!((ping.longitude - 1.1).abs() < 1e-9);
        assert!((ping.latitude - 2.1).abs() < 1e-9);
        assert_eq!(ping.heading, 90.0);
        assert_eq!(ping.bath, vec![100.0]);
    }

    #[test]
    fn test_unknown_tag_is_unintelligible() {
        let mut bytes = Vec::new();
        write_header(&mut bytes).unwrap();
        write_frame(&mut bytes, *b"XXXX", b"").unwrap();
        let mut inputs: Vec<InputStream> = vec![Box::new(Cursor::new(bytes))];
        let mut fixes = SensorFixes::new(4);
        let mut state = SwathBinaryState::default();
        let mut ctx = ReadContext::new(&mut inputs, FixRecorder::new(&mut fixes), &DESCRIPTOR);
        let err = state.read_ping(&mut ctx).unwrap_err();
        assert!(matches!(err, SwathError::Unintelligible { .. }));
        assert!(matches!(
            state.read_ping(&mut ctx),
            Err(SwathError::EndOfFile)
        ));
    }

    #[test]
    fn test_optional_extractions_check_record_kind() {
        let mut state = SwathBinaryState::default();
        state.kind = RecordKind::Comment;
        assert!(state.extract_navigation(LonFlip::Centered).is_err());
        assert!(state.extract_altitude().is_err());

        state.insert_sound_velocity_profile(&SoundVelocityProfile {
            time_d: 1.0,
            depth: vec![0.0, 10.0],
            velocity: vec![1500.0, 1490.5],
        })
        .unwrap();
        state.kind = RecordKind::SoundVelocity;
        let svp = state.extract_sound_velocity_profile().unwrap();
        assert_eq!(svp.velocity, vec![1500.0, 1490.5]);
    }

    #[test]
    fn test_insert_clears_stale_altitude() {
        let mut state = SwathBinaryState::default();
        assert!(state
            .insert_altitude(&Altitude {
                sonar_depth: 1.0,
                altitude: 2.0,
            })
            .is_err());

        let survey = Ping {
            kind: RecordKind::Data,
            time_d: 5.0,
            ..Ping::default()
        };
        state.insert(&survey).unwrap();
        state
            .insert_altitude(&Altitude {
                sonar_depth: 3.5,
                altitude: 42.0,
            })
            .unwrap();
        assert_eq!(state.extract_altitude().unwrap().altitude, 42.0);

        state.insert(&survey).unwrap();
        assert_eq!(state.extract_altitude().unwrap(), Altitude::default());

        state
            .insert_navigation(&NavRecord {
                sonar_depth: 6.0,
                ..NavRecord::default()
            })
            .unwrap();
        state.insert(&nav_ping(6.0, 1.0, 2.0)).unwrap();
        assert_eq!(state.nav.sonar_depth_mm, 0);
    }

    #[test]
    fn test_write_unsupported_kind() {
        let buf = SharedBuf::default();
        let mut outputs: Vec<OutputStream> = vec![Box::new(buf)];
        let mut state = SwathBinaryState::default();
        let mut ctx = WriteContext::new(&mut outputs, &DESCRIPTOR);
        let err = state.write_ping(&mut ctx, RecordKind::Parameter).unwrap_err();
        assert!(matches!(err, SwathError::Unsupported { .. }));
    }
}
