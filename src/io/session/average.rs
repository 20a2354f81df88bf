// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Ping averaging for sessions opened with `ping_average > 1`.

use crate::core::{BeamFlag, LonFlip, Ping, RecordKind, Result, SwathError, DTR};

use super::super::descriptor::FormatDescriptor;
use super::{ReadStatus, Session, SessionState};

/// Record or error that interrupted the previous average.
#[derive(Debug)]
enum Pending {
    /// The interrupting record sits in the stash ping.
    Record(ReadStatus),
    Error(SwathError),
}

#[derive(Debug, Clone, Copy, Default)]
struct Sum {
    value: f64,
    across: f64,
    along: f64,
    count: u32,
}

impl Sum {
    fn add(&mut self, value: f64, across: f64, along: f64) {
        self.value += value;
        self.across += across;
        self.along += along;
        self.count += 1;
    }

    fn mean(&self) -> Option<(f64, f64, f64)> {
        if self.count == 0 {
            return None;
        }
        let n = f64::from(self.count);
        Some((self.value / n, self.across / n, self.along / n))
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    count: usize,
    time_sum: f64,
    lon_ref: f64,
    dlon_sum: f64,
    lat_sum: f64,
    speed_sum: f64,
    heading_x: f64,
    heading_y: f64,
    bath: Vec<Sum>,
    amp: Vec<Sum>,
    ss: Vec<Sum>,
}

impl Accumulator {
    fn try_new(descriptor: &FormatDescriptor) -> Result<Self> {
        let mut acc = Self::default();
        acc.bath.try_reserve_exact(descriptor.beams_bath_max)?;
        acc.amp.try_reserve_exact(descriptor.beams_amp_max)?;
        acc.ss.try_reserve_exact(descriptor.pixels_ss_max)?;
        Ok(acc)
    }

    fn clear(&mut self) {
        self.count = 0;
        self.time_sum = 0.0;
        self.lon_ref = 0.0;
        self.dlon_sum = 0.0;
        self.lat_sum = 0.0;
        self.speed_sum = 0.0;
        self.heading_x = 0.0;
        self.heading_y = 0.0;
        self.bath.clear();
        self.amp.clear();
        self.ss.clear();
    }

    fn add(&mut self, ping: &Ping) {
        if self.count == 0 {
            self.lon_ref = ping.longitude;
        }
        self.count += 1;
        self.time_sum += ping.time_d;
        let mut dlon = ping.longitude - self.lon_ref;
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }
        self.dlon_sum += dlon;
        self.lat_sum += ping.latitude;
        self.speed_sum += ping.speed;
        self.heading_x += (DTR * ping.heading).sin();
        self.heading_y += (DTR * ping.heading).cos();

        let nbath = ping.beam_count();
        grow(&mut self.bath, nbath);
        for i in 0..nbath {
            if ping.beam_flags[i].is_good() {
                self.bath[i].add(ping.bath[i], ping.bath_acrosstrack[i], ping.bath_alongtrack[i]);
            }
        }
        grow(&mut self.amp, ping.amp_count());
        for (i, amp) in ping.amp.iter().enumerate() {
            let good = ping.beam_flags.get(i).map_or(true, |f| f.is_good());
            if good {
                self.amp[i].add(*amp, 0.0, 0.0);
            }
        }
        grow(&mut self.ss, ping.pixel_count());
        for i in 0..ping.pixel_count() {
            self.ss[i].add(ping.ss[i], ping.ss_acrosstrack[i], ping.ss_alongtrack[i]);
        }
    }

    fn finish(&self, ping: &mut Ping, lonflip: LonFlip) -> Result<()> {
        let n = self.count.max(1) as f64;
        ping.reset();
        ping.kind = RecordKind::Data;
        ping.set_time_d(self.time_sum / n)?;
        ping.longitude = lonflip.apply(self.lon_ref + self.dlon_sum / n);
        ping.latitude = self.lat_sum / n;
        ping.speed = self.speed_sum / n;
        ping.heading = (self.heading_x.atan2(self.heading_y) / DTR).rem_euclid(360.0);

        for sum in &self.bath {
            match sum.mean() {
                Some((depth, across, along)) => ping.push_beam(BeamFlag::GOOD, depth, across, along),
                None => ping.push_beam(BeamFlag::NULL, 0.0, 0.0, 0.0),
            }
        }
        ping.amp
            .extend(self.amp.iter().map(|sum| sum.mean().map_or(0.0, |(v, _, _)| v)));
        for sum in &self.ss {
            let (value, across, along) = sum.mean().unwrap_or_default();
            ping.push_pixel(value, across, along);
        }
        Ok(())
    }
}

fn grow(sums: &mut Vec<Sum>, len: usize) {
    if sums.len() < len {
        sums.resize(len, Sum::default());
    }
}

/// Averaging state of a session, allocated at open.
#[derive(Debug)]
pub(crate) struct PingAverager {
    stash: Ping,
    pending: Option<Pending>,
    acc: Accumulator,
}

impl PingAverager {
    pub(crate) fn try_new(descriptor: &FormatDescriptor) -> Result<Self> {
        Ok(Self {
            stash: Ping::with_capacity(
                descriptor.beams_bath_max,
                descriptor.beams_amp_max,
                descriptor.pixels_ss_max,
            )?,
            pending: None,
            acc: Accumulator::try_new(descriptor)?,
        })
    }
}

impl Session {
    /// Read up to `ping_average` consecutive survey pings and deliver their
    /// average in the session ping.
    ///
    /// Time, position and speed are averaged; heading is averaged as a
    /// unit vector. Per-beam values are averaged over good beams only, and
    /// a beam without any good contribution is delivered as null.
    ///
    /// A non-survey record, a ping with an advisory, or a read error ends
    /// the group early; the partial average is returned and the
    /// interrupting record or error is delivered by the next call. A group
    /// never starts with such a record: it is returned on its own.
    ///
    /// With `ping_average` of 1 this is [`Session::read_ping`]. Do not mix
    /// the two read calls on one session.
    pub fn read_averaged(&mut self) -> Result<ReadStatus> {
        self.ensure_open("read_averaged")?;
        let Some(mut averager) = self.averager.take() else {
            return self.read_ping();
        };
        let result = self.average_into(&mut averager);
        if self.state == SessionState::Open {
            self.averager = Some(averager);
        }
        result
    }

    fn average_into(&mut self, averager: &mut PingAverager) -> Result<ReadStatus> {
        let target = self.params.ping_average;
        averager.acc.clear();

        let first = match averager.pending.take() {
            Some(Pending::Error(e)) => return Err(e),
            Some(Pending::Record(status)) => {
                std::mem::swap(&mut self.ping, &mut averager.stash);
                status
            }
            None => self.read_ping()?,
        };
        if !first.kind.is_survey() || first.advisory.is_some() {
            return Ok(first);
        }
        averager.acc.add(&self.ping);

        while averager.acc.count < target {
            match self.read_ping() {
                Ok(status) if status.kind.is_survey() && status.advisory.is_none() => {
                    averager.acc.add(&self.ping);
                }
                Ok(status) => {
                    std::mem::swap(&mut self.ping, &mut averager.stash);
                    averager.pending = Some(Pending::Record(status));
                    break;
                }
                Err(e) => {
                    averager.pending = Some(Pending::Error(e));
                    break;
                }
            }
        }

        averager.acc.finish(&mut self.ping, self.params.lonflip)?;
        Ok(ReadStatus {
            kind: RecordKind::Data,
            advisory: None,
        })
    }
}
