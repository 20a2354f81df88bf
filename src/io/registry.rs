// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Format registry mapping format ids to codec implementations.
//!
//! The process-wide registry is built once, on first use, from the
//! built-in formats and is read-only afterwards; lookups take no locks.
//! Callers that need extra formats (test doubles, private codecs) build
//! their own [`FormatRegistry`] and hand the codec to the session builder.
//!
//! # Example
//!
//! ```no_run
//! use swathcodec::io::registry::register;
//!
//! let descriptor = register(71)?;
//! assert_eq!(descriptor.name, "SWATHB");
//! # Ok::<(), swathcodec::SwathError>(())
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use crate::core::{Result, SwathError};

use super::descriptor::FormatDescriptor;
use super::formats::{SwathBinaryFormat, SwathTextFormat};
use super::traits::SwathFormat;

/// Table of format id to codec implementation.
#[derive(Clone, Default)]
pub struct FormatRegistry {
    formats: BTreeMap<i32, Arc<dyn SwathFormat>>,
}

impl FormatRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in formats.
    pub fn with_builtin() -> Self {
        Self::new()
            .with_format(Arc::new(SwathBinaryFormat))
            .with_format(Arc::new(SwathTextFormat))
    }

    /// Add a format, replacing any format with the same id.
    pub fn with_format(mut self, format: Arc<dyn SwathFormat>) -> Self {
        self.insert(format);
        self
    }

    /// Add a format, returning the one it replaced.
    pub fn insert(&mut self, format: Arc<dyn SwathFormat>) -> Option<Arc<dyn SwathFormat>> {
        let id = format.descriptor().id;
        self.formats.insert(id, format)
    }

    /// Descriptor for `format_id`.
    ///
    /// # Errors
    ///
    /// `UnknownFormat` when nothing is registered under the id.
    pub fn lookup(&self, format_id: i32) -> Result<&FormatDescriptor> {
        self.formats
            .get(&format_id)
            .map(|format| format.descriptor())
            .ok_or_else(|| SwathError::unknown_format(format_id))
    }

    /// Codec implementation for `format_id`.
    pub fn codec(&self, format_id: i32) -> Result<Arc<dyn SwathFormat>> {
        self.formats
            .get(&format_id)
            .cloned()
            .ok_or_else(|| SwathError::unknown_format(format_id))
    }

    pub fn contains(&self, format_id: i32) -> bool {
        self.formats.contains_key(&format_id)
    }

    /// All descriptors in ascending id order.
    pub fn descriptors(&self) -> impl Iterator<Item = &FormatDescriptor> + '_ {
        self.formats.values().map(|format| format.descriptor())
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<i32> {
        self.formats.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

impl std::fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

static GLOBAL: OnceLock<FormatRegistry> = OnceLock::new();

/// The process-wide registry of built-in formats.
pub fn global_registry() -> &'static FormatRegistry {
    GLOBAL.get_or_init(FormatRegistry::with_builtin)
}

/// Look up a format descriptor in the process-wide registry.
///
/// Pure lookup; `UnknownFormat` is the only error.
pub fn register(format_id: i32) -> Result<&'static FormatDescriptor> {
    global_registry().lookup(format_id)
}
