// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One aggregating error type for process startup. Anything a worker
//! or repository raises after startup is logged in place, never
//! propagated here (§7 propagation policy).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead { path: String, source: std::io::Error },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse { path: String, source: toml::de::Error },

    #[error(transparent)]
    Configuration(#[from] pulseone_worker::ConfigurationError),
}
