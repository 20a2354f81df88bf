// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Built-in swath format codecs.
//!
//! - [`swathb`]: SWATHB tagged binary interchange (id 71)
//! - [`swathtxt`]: SWATHTXT plain text with a navigation companion (id 166)

pub mod swathb;
pub mod swathtxt;

pub use swathb::SwathBinaryFormat;
pub use swathtxt::SwathTextFormat;
