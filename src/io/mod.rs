// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer: format registry, codec dispatch and sessions.
//!
//! A [`SessionBuilder`] resolves a format through the [`FormatRegistry`],
//! allocates the codec state and opens the file streams; the resulting
//! [`Session`] reads or writes normalized pings through the codec.

pub mod descriptor;
pub mod detection;
pub mod filter;
pub mod formats;
pub mod params;
pub mod registry;
pub mod session;
pub mod traits;

pub use descriptor::{FileEncoding, FormatDescriptor, SystemFamily};
pub use detection::{detect_format, detect_format_in, sniff};
pub use filter::{Advisory, PingWindow, WindowTracker};
pub use formats::{SwathBinaryFormat, SwathTextFormat};
pub use params::SessionParams;
pub use registry::{global_registry, register, FormatRegistry};
pub use session::{ReadStatus, Session, SessionBuilder, SessionState, SessionStats};
pub use traits::{
    AccessMode, CodecState, InputStream, OutputStream, ReadContext, SwathFormat, WriteContext,
};
