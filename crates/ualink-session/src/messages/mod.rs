// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service request and response messages.
//!
//! Every service is a pair of message structs. [`Request`] and [`Response`]
//! are the closed unions the secure channel carries; [`ServiceRequest`]
//! ties each request struct to the response struct that must answer it, so
//! the dispatcher can reject a mistyped response before the service layer
//! looks at it.
//!
//! Encoding these messages on the wire is the secure channel's job.

mod attribute;
mod method;
mod session;
mod subscription;
mod view;

pub use attribute::*;
pub use method::*;
pub use session::*;
pub use subscription::*;
pub use view::*;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{UaError, UaResult};
use crate::status::StatusCode;
use crate::types::{DiagnosticInfo, NodeId};

// =============================================================================
// Headers
// =============================================================================

/// Header carried by every request.
///
/// The dispatcher stamps the authentication token, handle and timestamp
/// immediately before each send, so replayed requests always carry the
/// current session identity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestHeader {
    /// Session authentication token.
    pub authentication_token: NodeId,
    /// Time the request was sent.
    pub timestamp: Option<DateTime<Utc>>,
    /// Client assigned handle.
    pub request_handle: u32,
    /// Requested diagnostics bit mask.
    pub return_diagnostics: u32,
    /// Audit log entry.
    pub audit_entry_id: Option<String>,
    /// Hint for the server, in milliseconds.
    pub timeout_hint: u32,
}

/// Header carried by every response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseHeader {
    /// Time the response was sent.
    pub timestamp: Option<DateTime<Utc>>,
    /// Handle of the answered request.
    pub request_handle: u32,
    /// Overall service result.
    pub service_result: StatusCode,
    /// Diagnostics for the service result.
    pub service_diagnostics: Option<DiagnosticInfo>,
    /// Strings referenced by diagnostics.
    pub string_table: Vec<String>,
}

impl ResponseHeader {
    /// Creates a Good header.
    pub fn good() -> Self {
        Self::default()
    }

    /// Creates a header with the given service result.
    pub fn with_result(service_result: StatusCode) -> Self {
        Self {
            service_result,
            ..Default::default()
        }
    }
}

/// Returned by the server instead of the expected response when a service
/// fails as a whole.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceFault {
    /// Header with the bad service result.
    pub header: ResponseHeader,
}

impl ServiceFault {
    /// Creates a fault with the given service result.
    pub fn new(status: StatusCode) -> Self {
        Self {
            header: ResponseHeader::with_result(status),
        }
    }
}

// =============================================================================
// Pairing traits
// =============================================================================

/// A request struct with a known response struct.
pub trait ServiceRequest: Into<Request> + Send {
    /// The response struct that answers this request.
    type Response: ServiceResponse;

    /// The request kind.
    const KIND: RequestKind;
}

/// A response struct extracted from a [`Response`].
pub trait ServiceResponse: Sized + Send {
    /// Extracts this response, failing if `response` has another type.
    fn from_response(response: Response) -> UaResult<Self>;

    /// Returns the response header.
    fn response_header(&self) -> &ResponseHeader;
}

macro_rules! services {
    ($($kind:ident => $req:ident, $resp:ident;)*) => {
        /// Identifies the service a request belongs to.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum RequestKind {
            $(
                #[allow(missing_docs)]
                $kind,
            )*
        }

        impl RequestKind {
            /// Returns the service name.
            pub const fn name(&self) -> &'static str {
                match self {
                    $(Self::$kind => stringify!($kind),)*
                }
            }
        }

        /// Any request the session can send.
        #[derive(Debug, Clone, PartialEq)]
        #[allow(missing_docs)]
        pub enum Request {
            $($kind($req),)*
        }

        impl Request {
            /// Returns the request kind.
            pub fn kind(&self) -> RequestKind {
                match self {
                    $(Self::$kind(_) => RequestKind::$kind,)*
                }
            }

            /// Returns the request header.
            pub fn header(&self) -> &RequestHeader {
                match self {
                    $(Self::$kind(r) => &r.header,)*
                }
            }

            /// Returns the request header mutably.
            pub fn header_mut(&mut self) -> &mut RequestHeader {
                match self {
                    $(Self::$kind(r) => &mut r.header,)*
                }
            }
        }

        /// Any response the secure channel can deliver.
        #[derive(Debug, Clone, PartialEq)]
        #[allow(missing_docs)]
        pub enum Response {
            $($kind($resp),)*
            ServiceFault(ServiceFault),
        }

        impl Response {
            /// Returns the response type name.
            pub fn type_name(&self) -> &'static str {
                match self {
                    $(Self::$kind(_) => stringify!($resp),)*
                    Self::ServiceFault(_) => "ServiceFault",
                }
            }

            /// Returns the response header.
            pub fn header(&self) -> &ResponseHeader {
                match self {
                    $(Self::$kind(r) => &r.header,)*
                    Self::ServiceFault(f) => &f.header,
                }
            }
        }

        $(
            impl From<$req> for Request {
                fn from(request: $req) -> Self {
                    Self::$kind(request)
                }
            }

            impl From<$resp> for Response {
                fn from(response: $resp) -> Self {
                    Self::$kind(response)
                }
            }

            impl ServiceRequest for $req {
                type Response = $resp;
                const KIND: RequestKind = RequestKind::$kind;
            }

            impl ServiceResponse for $resp {
                fn from_response(response: Response) -> UaResult<Self> {
                    match response {
                        Response::$kind(r) => Ok(r),
                        other => Err(UaError::unexpected_response(
                            stringify!($resp),
                            other.type_name(),
                        )),
                    }
                }

                fn response_header(&self) -> &ResponseHeader {
                    &self.header
                }
            }
        )*
    };
}

services! {
    ActivateSession => ActivateSessionRequest, ActivateSessionResponse;
    CloseSession => CloseSessionRequest, CloseSessionResponse;
    Read => ReadRequest, ReadResponse;
    Write => WriteRequest, WriteResponse;
    HistoryRead => HistoryReadRequest, HistoryReadResponse;
    Browse => BrowseRequest, BrowseResponse;
    BrowseNext => BrowseNextRequest, BrowseNextResponse;
    TranslateBrowsePaths => TranslateBrowsePathsRequest, TranslateBrowsePathsResponse;
    RegisterNodes => RegisterNodesRequest, RegisterNodesResponse;
    UnregisterNodes => UnregisterNodesRequest, UnregisterNodesResponse;
    QueryFirst => QueryFirstRequest, QueryFirstResponse;
    Call => CallRequest, CallResponse;
    CreateSubscription => CreateSubscriptionRequest, CreateSubscriptionResponse;
    ModifySubscription => ModifySubscriptionRequest, ModifySubscriptionResponse;
    DeleteSubscriptions => DeleteSubscriptionsRequest, DeleteSubscriptionsResponse;
    SetPublishingMode => SetPublishingModeRequest, SetPublishingModeResponse;
    TransferSubscriptions => TransferSubscriptionsRequest, TransferSubscriptionsResponse;
    CreateMonitoredItems => CreateMonitoredItemsRequest, CreateMonitoredItemsResponse;
    ModifyMonitoredItems => ModifyMonitoredItemsRequest, ModifyMonitoredItemsResponse;
    DeleteMonitoredItems => DeleteMonitoredItemsRequest, DeleteMonitoredItemsResponse;
    SetMonitoringMode => SetMonitoringModeRequest, SetMonitoringModeResponse;
    SetTriggering => SetTriggeringRequest, SetTriggeringResponse;
    Publish => PublishRequest, PublishResponse;
    Republish => RepublishRequest, RepublishResponse;
}

impl RequestKind {
    /// Returns `true` for requests that bypass queueing and repair:
    /// session activation, session close and publish.
    pub const fn is_privileged(&self) -> bool {
        matches!(
            self,
            Self::ActivateSession | Self::CloseSession | Self::Publish
        )
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<ServiceFault> for Response {
    fn from(fault: ServiceFault) -> Self {
        Self::ServiceFault(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileged_kinds() {
        assert!(RequestKind::ActivateSession.is_privileged());
        assert!(RequestKind::CloseSession.is_privileged());
        assert!(RequestKind::Publish.is_privileged());
        assert!(!RequestKind::Read.is_privileged());
        assert!(!RequestKind::Republish.is_privileged());
    }

    #[test]
    fn test_response_pairing() {
        let response: Response = WriteResponse::default().into();
        assert!(WriteResponse::from_response(response.clone()).is_ok());

        let err = ReadResponse::from_response(response).unwrap_err();
        assert!(err.to_string().contains("ReadResponse"));
        assert!(err.to_string().contains("WriteResponse"));
    }

    #[test]
    fn test_header_access() {
        let mut request: Request = ReadRequest::default().into();
        request.header_mut().request_handle = 7;
        assert_eq!(request.header().request_handle, 7);
        assert_eq!(request.kind(), RequestKind::Read);
        assert_eq!(request.kind().to_string(), "Read");
    }
}
