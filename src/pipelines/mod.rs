// SPDX-License-Identifier: GPL-3.0-only

//! Image pipelines
//!
//! - [`photo`]: naming and writing snapshots
//! - [`overlay`]: ghosting the previous snapshot over the live preview

pub mod overlay;
pub mod photo;
