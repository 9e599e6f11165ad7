// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client-side OPC UA session layer.
//!
//! This crate turns application calls (browse, read, write, call,
//! subscribe, history read, ...) into protocol transactions on an
//! established secure channel, and keeps them flowing across transient
//! session failures.
//!
//! # Features
//!
//! - One dispatcher per session: immediate send, or a FIFO pending queue
//!   while the owning client reconnects
//! - Single-flight session repair with replay of the failed transaction
//! - Bounded waiting for owner-driven session restore
//! - Scalar-or-array service API that answers in the caller's shape
//! - Extension object resolution through a pluggable datatype resolver
//! - Keep-alive probing and session events on a broadcast channel
//!
//! Wire encoding, secure channel establishment and the publish loop are
//! supplied by the embedding client through [`SecureChannel`],
//! [`SessionOwner`] and [`client::PublishEngine`].
//!
//! # Error Handling
//!
//! ```text
//! UaError
//! ├── Session       - Closed session, repair and restore failures
//! ├── Service       - Bad service results with diagnostics
//! ├── Channel       - Secure channel delivery errors
//! ├── Internal      - Wrong response type, length mismatch, malformed data
//! ├── Configuration - Invalid settings and node references
//! └── Resolver      - Extension object decoding errors
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ualink_session::{ClientSession, SessionConfig};
//!
//! let config = SessionConfig::builder()
//!     .endpoint("opc.tcp://localhost:4840")
//!     .build()?;
//!
//! let session = ClientSession::builder(channel, owner, identity)
//!     .config(config)
//!     .build()?;
//!
//! let temperature = session.read("ns=2;s=Temperature").await?;
//! let values = session.read(vec!["ns=2;s=A", "ns=2;s=B"]).await?;
//!
//! session.close(true).await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod messages;
pub mod services;
pub mod status;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use error::{
    ChannelError, ConfigurationError, ErrorCode, ErrorSeverity, InternalError, ResolverError,
    ServiceError, SessionError, UaError, UaResult,
};

pub use client::{
    ClientSession, DatatypeResolver, DictionaryResolver, EventSubscriber, KeepAliveProber,
    OneOrMany, OwnerStatus, Padding, SecureChannel, SessionBuilder, SessionEvent, SessionIdentity,
    SessionOwner, SessionStats, Shape,
};

pub use config::{
    KeepAliveSettings, ReconnectionSettings, RepairFailurePolicy, SessionConfig,
    SessionConfigBuilder, UserIdentity,
};

pub use logging::{init_logging, LogFormat};

pub use services::{
    make_browse_path, BrowseDescriptionOptions, CallMethodOptions, HistoryReadOptions,
    HistoryReadValueOptions, MonitoredItemHandles, QueryFirstOptions, QueryFirstResult,
    ReadValueOptions, SetTriggeringResult, WriteValueOptions,
};

pub use status::StatusCode;

pub use types::{
    AttributeId, BrowseDirection, DataValue, ExtensionObject, MonitoringMode, NodeClass, NodeId,
    NodeRef, QualifiedName, ServerState, TimestampsToReturn, Variant,
};
