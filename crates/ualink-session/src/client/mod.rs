// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Client session layer.
//!
//! # Components
//!
//! - [`ClientSession`]: identity, timers, events and close
//! - Dispatcher: immediate send or pending queue, serialized drain
//! - Repair coordinator: single-flight session recreation and replay
//! - [`SecureChannel`] and [`SessionOwner`]: the collaborators a session
//!   consumes
//! - [`DatatypeResolver`]: extension object decoding
//! - [`KeepAliveProber`] and [`PublishEngine`]: background machinery a
//!   session starts and stops

mod channel;
mod dispatcher;
mod events;
mod keepalive;
mod owner;
mod publish;
mod repair;
mod resolver;
mod session;
mod shape;
mod stats;

pub use channel::SecureChannel;
pub use events::{EventBus, EventSubscriber, SessionEvent};
pub use keepalive::KeepAliveProber;
pub use owner::{OwnerStatus, SessionIdentity, SessionOwner};
pub use publish::{PublishEngine, SubscriptionId, SubscriptionRecord, SubscriptionTracker};
pub use repair::RepairGuard;
pub use resolver::{
    argument_codec, decode_argument, BinaryReader, DatatypeResolver, DictionaryResolver,
    FieldLayoutCodec, FieldLayoutCodecBuilder, FieldType, NoopResolver, StructureCodec,
};
pub use session::{ClientSession, SessionBuilder};
pub use shape::{OneOrMany, Padding, Shape};
pub use stats::{SessionStats, StatsSnapshot};

#[cfg(test)]
pub(crate) use resolver::tests::encode_argument;
