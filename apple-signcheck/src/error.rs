// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {std::path::PathBuf, thiserror::Error};

/// Unified error type for signing inspection.
#[derive(Debug, Error)]
pub enum SignCheckError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("path cannot be represented as a file URL: {0}")]
    PathAsUrl(PathBuf),

    #[error("unable to load code object (status {0})")]
    StaticCodeCreate(i32),

    #[error("unable to retrieve signing information (status {0})")]
    SigningInformationCopy(i32),

    #[error("code signing inspection is only supported on macOS")]
    UnsupportedPlatform,
}
