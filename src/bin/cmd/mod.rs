// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! CLI subcommands.

mod copy;
mod formats;
mod info;
mod list;

pub use copy::CopyCmd;
pub use formats::FormatsCmd;
pub use info::InfoCmd;
pub use list::ListCmd;
