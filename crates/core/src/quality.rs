// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-quality vocabulary.

use serde::{Deserialize, Serialize};

/// Metadata describing the trustworthiness of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QualityCode {
    /// The value was read successfully and decoded without error.
    Good,
    /// The value was read but failed decoding or validation.
    Bad,
    /// The value is stale or the source can't vouch for its accuracy.
    Uncertain,
    /// No sample has ever been produced, or the transport is currently down.
    NotConnected,
    /// Quality could not be determined.
    Unknown,
}

impl QualityCode {
    /// True for qualities that are safe to act on without a caller double-checking.
    pub fn is_good(&self) -> bool {
        matches!(self, QualityCode::Good)
    }
}

crate::simple_display! {
    QualityCode {
        Good => "GOOD",
        Bad => "BAD",
        Uncertain => "UNCERTAIN",
        NotConnected => "NOT_CONNECTED",
        Unknown => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_good_is_good() {
        assert!(QualityCode::Good.is_good());
        assert!(!QualityCode::Uncertain.is_good());
        assert!(!QualityCode::NotConnected.is_good());
    }

    #[test]
    fn display_matches_wire_vocabulary() {
        assert_eq!(QualityCode::NotConnected.to_string(), "NOT_CONNECTED");
        assert_eq!(QualityCode::Good.to_string(), "GOOD");
    }
}
