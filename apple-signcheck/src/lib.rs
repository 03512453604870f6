// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inspect code signing certificates of Apple application bundles.
//!
//! This crate implements the `rsigncheck` command line tool. Given one or
//! more filesystem paths, it asks the operating system's trust subsystem for
//! static code signing information, walks the returned certificate chain,
//! and prints the signing certificate's SHA-256 fingerprint, the developer
//! identifier, and the developer display name for each path.
//!
//! The trust query is delegated to the macOS Security framework; no
//! certificate parsing or trust evaluation is reimplemented here. On other
//! operating systems the tool builds and runs, but every query reports that
//! inspection is unsupported.

pub mod cli;
pub mod error;
pub mod inspect;
#[cfg(target_os = "macos")]
pub mod macos;
pub mod signing_information;
