// Copyright 2026 the Proscenium Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::path::PathBuf;

use proscenium_metrics::MetricsError;
use thiserror::Error;

/// Startup failures. None of them are recoverable by the frame loop.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration document is not valid TOML or has the wrong shape.
    #[error("malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The content constraints admit no scale factor for this device.
    #[error("invalid content constraints: {0}")]
    Metrics(#[from] MetricsError),
}
