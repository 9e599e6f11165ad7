// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA status codes.
//!
//! A status code is a 32-bit value whose two top bits carry the severity
//! (`00` good, `01` uncertain, `10` bad) and whose upper 16 bits identify
//! the condition. Only the codes this layer inspects or produces have
//! symbolic names; every other value is carried through untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An OPC UA status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct StatusCode(pub u32);

macro_rules! status_codes {
    ($($name:ident = $value:literal),* $(,)?) => {
        impl StatusCode {
            $(
                #[allow(missing_docs, non_upper_case_globals)]
                pub const $name: StatusCode = StatusCode($value);
            )*

            /// Returns the symbolic name of this code, if it is known.
            pub fn name(&self) -> Option<&'static str> {
                // Sub-code flag bits (info type, overflow, limits) do not change the name.
                match self.0 & 0xFFFF_0000 {
                    $($value => Some(stringify!($name)),)*
                    _ => None,
                }
            }
        }
    };
}

status_codes! {
    Good = 0x0000_0000,
    GoodSubscriptionTransferred = 0x002D_0000,
    GoodCompletesAsynchronously = 0x002E_0000,
    GoodNoData = 0x00A5_0000,
    Uncertain = 0x4000_0000,
    Bad = 0x8000_0000,
    BadUnexpectedError = 0x8001_0000,
    BadInternalError = 0x8002_0000,
    BadOutOfMemory = 0x8003_0000,
    BadResourceUnavailable = 0x8004_0000,
    BadCommunicationError = 0x8005_0000,
    BadEncodingError = 0x8006_0000,
    BadDecodingError = 0x8007_0000,
    BadTimeout = 0x800A_0000,
    BadServiceUnsupported = 0x800B_0000,
    BadShutdown = 0x800C_0000,
    BadServerNotConnected = 0x800D_0000,
    BadServerHalted = 0x800E_0000,
    BadNothingToDo = 0x800F_0000,
    BadTooManyOperations = 0x8010_0000,
    BadUserAccessDenied = 0x801F_0000,
    BadIdentityTokenInvalid = 0x8020_0000,
    BadIdentityTokenRejected = 0x8021_0000,
    BadSecureChannelIdInvalid = 0x8022_0000,
    BadNonceInvalid = 0x8024_0000,
    BadSessionIdInvalid = 0x8025_0000,
    BadSessionClosed = 0x8026_0000,
    BadSessionNotActivated = 0x8027_0000,
    BadSubscriptionIdInvalid = 0x8028_0000,
    BadNodeIdInvalid = 0x8033_0000,
    BadNodeIdUnknown = 0x8034_0000,
    BadAttributeIdInvalid = 0x8035_0000,
    BadIndexRangeInvalid = 0x8036_0000,
    BadNotReadable = 0x803A_0000,
    BadNotWritable = 0x803B_0000,
    BadNotSupported = 0x803D_0000,
    BadNotFound = 0x803E_0000,
    BadMonitoredItemIdInvalid = 0x8042_0000,
    BadContinuationPointInvalid = 0x804A_0000,
    BadNoContinuationPoints = 0x804B_0000,
    BadNoMatch = 0x806F_0000,
    BadHistoryOperationUnsupported = 0x8072_0000,
    BadTypeMismatch = 0x8074_0000,
    BadMethodInvalid = 0x8075_0000,
    BadArgumentsMissing = 0x8076_0000,
    BadTooManyPublishRequests = 0x8078_0000,
    BadNoSubscription = 0x8079_0000,
    BadSequenceNumberUnknown = 0x807A_0000,
    BadMessageNotAvailable = 0x807B_0000,
    BadSecureChannelClosed = 0x8086_0000,
    BadNoData = 0x809B_0000,
    BadInvalidArgument = 0x80AB_0000,
    BadConnectionClosed = 0x80AE_0000,
    BadInvalidState = 0x80AF_0000,
}

impl StatusCode {
    const SEVERITY_MASK: u32 = 0xC000_0000;

    /// Creates a status code from its raw value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` if the severity is good.
    #[inline]
    pub const fn is_good(&self) -> bool {
        self.0 & Self::SEVERITY_MASK == 0
    }

    /// Returns `true` if the severity is uncertain.
    #[inline]
    pub const fn is_uncertain(&self) -> bool {
        self.0 & Self::SEVERITY_MASK == 0x4000_0000
    }

    /// Returns `true` if the severity is bad.
    #[inline]
    pub const fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Returns `true` if this code tells the client that the server no
    /// longer knows its session.
    pub fn is_session_invalid(&self) -> bool {
        matches!(
            self.0 & 0xFFFF_0000,
            0x8025_0000 | 0x8026_0000 | 0x8027_0000
        )
    }

    /// Returns `true` if this code signals a broken channel rather than a
    /// service-level failure.
    pub fn is_communication_failure(&self) -> bool {
        matches!(
            *self,
            Self::BadCommunicationError
                | Self::BadConnectionClosed
                | Self::BadSecureChannelClosed
                | Self::BadSecureChannelIdInvalid
                | Self::BadServerNotConnected
                | Self::BadTimeout
        )
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (0x{:08X})", name, self.0),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

impl From<u32> for StatusCode {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<StatusCode> for u32 {
    fn from(code: StatusCode) -> Self {
        code.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity() {
        assert!(StatusCode::Good.is_good());
        assert!(StatusCode::GoodSubscriptionTransferred.is_good());
        assert!(StatusCode::Uncertain.is_uncertain());
        assert!(!StatusCode::Uncertain.is_bad());
        assert!(StatusCode::BadNodeIdUnknown.is_bad());
        assert!(!StatusCode::BadNodeIdUnknown.is_good());
    }

    #[test]
    fn test_session_invalid_class() {
        assert!(StatusCode::BadSessionIdInvalid.is_session_invalid());
        assert!(StatusCode::BadSessionClosed.is_session_invalid());
        assert!(StatusCode::BadSessionNotActivated.is_session_invalid());
        assert!(StatusCode(0x8025_0400).is_session_invalid());
        assert!(!StatusCode::BadTimeout.is_session_invalid());
        assert!(!StatusCode::Good.is_session_invalid());
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::Good.to_string(), "Good (0x00000000)");
        assert_eq!(
            StatusCode::BadSessionIdInvalid.to_string(),
            "BadSessionIdInvalid (0x80250000)"
        );
        assert_eq!(StatusCode(0x8123_0000).to_string(), "0x81230000");
    }
}
