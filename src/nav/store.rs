// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Bounded, strictly time-ordered store of asynchronous sensor fixes.
//!
//! Instruments record navigation, heading and attitude at their own rates,
//! independent of when pings happen. Codecs push those samples here as
//! they stream past, and pings are positioned by interpolating at their
//! own timestamps.
//!
//! # Invariants
//!
//! - Stored times are strictly increasing. A fix whose time is not later
//!   than the newest stored fix is dropped without error; real instruments
//!   emit duplicated and jittered packets.
//! - At most `capacity` fixes are kept; the oldest is evicted first.

use std::collections::VecDeque;

use crate::core::{Result, SwathError};

/// Default number of fixes retained per signal class.
pub const DEFAULT_FIX_CAPACITY: usize = 10_000;

/// A value that can be linearly interpolated between two fixes.
pub trait Interpolate: Copy {
    /// Signal class name, used in `NoFix` errors.
    const SIGNAL: &'static str;

    /// Value at fraction `factor` (0..=1) of the way from `a` to `b`.
    fn lerp(a: &Self, b: &Self, factor: f64) -> Self;
}

/// Where a query time fell relative to the stored fixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Exactly one fix is stored.
    Single,
    /// Inside `[earliest, latest]`.
    Within,
    /// Before the earliest fix.
    Before,
    /// After the latest fix.
    After,
}

/// Bounded FIFO of `(time, value)` pairs with strictly increasing times.
#[derive(Debug, Clone)]
pub struct FixStore<T> {
    fixes: VecDeque<(f64, T)>,
    capacity: usize,
}

impl<T: Interpolate> Default for FixStore<T> {
    fn default() -> Self {
        Self::new(DEFAULT_FIX_CAPACITY)
    }
}

impl<T: Interpolate> FixStore<T> {
    /// Create an empty store holding at most `capacity` fixes.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            fixes: VecDeque::new(),
            capacity,
        }
    }

    /// Create a store and reserve its full capacity up front.
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        let mut store = Self::new(capacity);
        store.fixes.try_reserve_exact(store.capacity)?;
        Ok(store)
    }

    /// Add a fix. Returns `true` if it was stored.
    ///
    /// Fixes not strictly later than the newest stored fix, or with a
    /// non-finite time, are ignored.
    pub fn add(&mut self, time_d: f64, value: T) -> bool {
        if !time_d.is_finite() {
            return false;
        }
        if let Some(&(last, _)) = self.fixes.back() {
            if time_d <= last {
                return false;
            }
        }
        if self.fixes.len() == self.capacity {
            self.fixes.pop_front();
        }
        self.fixes.push_back((time_d, value));
        true
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.fixes.clear();
    }

    pub fn earliest(&self) -> Option<(f64, T)> {
        self.fixes.front().copied()
    }

    pub fn latest(&self) -> Option<(f64, T)> {
        self.fixes.back().copied()
    }

    /// Stored fix times, oldest first.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.fixes.iter().map(|(t, _)| *t)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f64, T)> + '_ {
        self.fixes.iter()
    }

    /// Classify a query time against the stored fixes.
    pub fn placement(&self, time_d: f64) -> Result<Placement> {
        let (first, last) = match (self.fixes.front(), self.fixes.back()) {
            (Some(first), Some(last)) => (first.0, last.0),
            _ => return Err(SwathError::no_fix(T::SIGNAL)),
        };
        Ok(if self.fixes.len() == 1 {
            Placement::Single
        } else if time_d < first {
            Placement::Before
        } else if time_d > last {
            Placement::After
        } else {
            Placement::Within
        })
    }

    /// Indices `(j - 1, j)` of the fixes bracketing `time_d`.
    ///
    /// `j` is the first stored fix with time `>= time_d`, clamped to at
    /// least 1. Only meaningful for [`Placement::Within`].
    pub(crate) fn bracket(&self, time_d: f64) -> (usize, usize) {
        let j = self
            .fixes
            .iter()
            .position(|(t, _)| *t >= time_d)
            .unwrap_or(self.fixes.len() - 1)
            .max(1);
        (j - 1, j)
    }

    pub(crate) fn get(&self, index: usize) -> Option<(f64, T)> {
        self.fixes.get(index).copied()
    }

    /// Interpolate at `time_d`, holding the nearest end value outside the
    /// stored time span.
    ///
    /// Fails with `NoFix` when the store is empty.
    pub fn interpolate(&self, time_d: f64) -> Result<T> {
        match self.placement(time_d)? {
            Placement::Single | Placement::Before => Ok(self.fixes[0].1),
            Placement::After => Ok(self.fixes[self.fixes.len() - 1].1),
            Placement::Within => {
                let (i, j) = self.bracket(time_d);
                let (t0, v0) = self.fixes[i];
                let (t1, v1) = self.fixes[j];
                if time_d == t1 {
                    return Ok(v1);
                }
                let factor = (time_d - t0) / (t1 - t0);
                Ok(T::lerp(&v0, &v1, factor))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Scalar(f64);

    impl Interpolate for Scalar {
        const SIGNAL: &'static str = "scalar";

        fn lerp(a: &Self, b: &Self, factor: f64) -> Self {
            Scalar(a.0 + factor * (b.0 - a.0))
        }
    }

    #[test]
    fn test_rejects_non_increasing_times() {
        let mut store = FixStore::new(8);
        assert!(store.add(10.0, Scalar(1.0)));
        assert!(!store.add(10.0, Scalar(2.0)));
        assert!(!store.add(5.0, Scalar(3.0)));
        assert!(!store.add(f64::NAN, Scalar(3.0)));
        assert!(store.add(11.0, Scalar(4.0)));
        assert_eq!(store.len(), 2);
        assert_eq!(store.times().collect::<Vec<_>>(), vec![10.0, 11.0]);
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let mut store = FixStore::new(3);
        for t in 0..5 {
            store.add(t as f64, Scalar(t as f64));
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.earliest().unwrap().0, 2.0);
        assert_eq!(store.latest().unwrap().0, 4.0);
    }

    #[test]
    fn test_empty_store_has_no_fix() {
        let store: FixStore<Scalar> = FixStore::new(4);
        let err = store.interpolate(1.0).unwrap_err();
        assert!(matches!(err, SwathError::NoFix { .. }));
        assert_eq!(err.to_string(), "No scalar fixes available");
    }

    #[test]
    fn test_single_fix_is_returned_unchanged() {
        let mut store = FixStore::new(4);
        store.add(100.0, Scalar(7.5));
        for t in [0.0, 100.0, 1e9] {
            assert_eq!(store.interpolate(t).unwrap(), Scalar(7.5));
        }
    }

    #[test]
    fn test_linear_between_fixes() {
        let mut store = FixStore::new(4);
        store.add(0.0, Scalar(0.0));
        store.add(10.0, Scalar(100.0));
        store.add(20.0, Scalar(0.0));
        assert_eq!(store.interpolate(5.0).unwrap(), Scalar(50.0));
        assert_eq!(store.interpolate(15.0).unwrap(), Scalar(50.0));
        assert_eq!(store.interpolate(0.0).unwrap(), Scalar(0.0));
        assert_eq!(store.interpolate(10.0).unwrap(), Scalar(100.0));
    }

    #[test]
    fn test_holds_end_values_outside_span() {
        let mut store = FixStore::new(4);
        store.add(0.0, Scalar(1.0));
        store.add(10.0, Scalar(2.0));
        assert_eq!(store.interpolate(-5.0).unwrap(), Scalar(1.0));
        assert_eq!(store.interpolate(50.0).unwrap(), Scalar(2.0));
    }

    #[test]
    fn test_bracket_uses_first_time_not_earlier() {
        let mut store = FixStore::new(8);
        for t in [0.0, 1.0, 2.0, 3.0] {
            store.add(t, Scalar(t));
        }
        assert_eq!(store.bracket(0.0), (0, 1));
        assert_eq!(store.bracket(1.0), (0, 1));
        assert_eq!(store.bracket(1.5), (1, 2));
        assert_eq!(store.bracket(3.0), (2, 3));
    }

    #[test]
    fn test_try_with_capacity() {
        let store: FixStore<Scalar> = FixStore::try_with_capacity(16).unwrap();
        assert_eq!(store.capacity(), 16);
        assert!(store.is_empty());
    }
}
