// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entity identifier types.
//!
//! Every identifier in PulseOne is a thin newtype over `String` so that
//! distinct entity kinds can't be mixed up at a call site. [`define_id!`]
//! generates the common trait surface (`Display`, `From<String>`,
//! `Borrow<str>`, equality against `&str`) once per type.

use serde::{Deserialize, Serialize};

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[..n]
    }
}

/// Define a `String`-backed entity identifier with the standard trait set.
#[macro_export]
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create an id from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the string value of this id.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a device record.
    DeviceId
);
define_id!(
    /// Unique identifier for a data point record.
    DataPointId
);
define_id!(
    /// Unique identifier for a current-value record (1:1 with a data point).
    CurrentValueId
);
define_id!(
    /// Unique identifier for a worker instance.
    WorkerId
);
define_id!(
    /// Unique identifier for a tenant.
    TenantId
);
define_id!(
    /// Unique identifier for a site.
    SiteId
);
define_id!(
    /// Unique identifier for an alarm rule.
    AlarmRuleId
);
define_id!(
    /// Unique identifier for an alarm occurrence.
    AlarmOccurrenceId
);
define_id!(
    /// Unique identifier for a virtual point.
    VirtualPointId
);
define_id!(
    /// Unique identifier for a script library entry.
    ScriptLibraryId
);
define_id!(
    /// Unique identifier for a user account.
    UserId
);

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
