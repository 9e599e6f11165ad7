// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscription and monitored item service sets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ReadValueId, RequestHeader, ResponseHeader};
use crate::status::StatusCode;
use crate::types::{DiagnosticInfo, ExtensionObject, MonitoringMode, TimestampsToReturn};

// =============================================================================
// Subscriptions
// =============================================================================

/// CreateSubscription request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSubscriptionRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Publishing interval in milliseconds.
    pub requested_publishing_interval: f64,
    /// Lifetime in publishing intervals.
    pub requested_lifetime_count: u32,
    /// Keep-alive in publishing intervals.
    pub requested_max_keep_alive_count: u32,
    /// Notifications per publish, 0 for no limit.
    pub max_notifications_per_publish: u32,
    /// Publishing enabled on creation.
    pub publishing_enabled: bool,
    /// Relative priority.
    pub priority: u8,
}

impl Default for CreateSubscriptionRequest {
    fn default() -> Self {
        Self {
            header: RequestHeader::default(),
            requested_publishing_interval: 1000.0,
            requested_lifetime_count: 60,
            requested_max_keep_alive_count: 10,
            max_notifications_per_publish: 0,
            publishing_enabled: true,
            priority: 0,
        }
    }
}

/// CreateSubscription response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreateSubscriptionResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// Server assigned id.
    pub subscription_id: u32,
    /// Revised publishing interval.
    pub revised_publishing_interval: f64,
    /// Revised lifetime count.
    pub revised_lifetime_count: u32,
    /// Revised keep-alive count.
    pub revised_max_keep_alive_count: u32,
}

/// ModifySubscription request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModifySubscriptionRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Subscription to modify.
    pub subscription_id: u32,
    /// Publishing interval in milliseconds.
    pub requested_publishing_interval: f64,
    /// Lifetime in publishing intervals.
    pub requested_lifetime_count: u32,
    /// Keep-alive in publishing intervals.
    pub requested_max_keep_alive_count: u32,
    /// Notifications per publish, 0 for no limit.
    pub max_notifications_per_publish: u32,
    /// Relative priority.
    pub priority: u8,
}

/// ModifySubscription response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModifySubscriptionResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// Revised publishing interval.
    pub revised_publishing_interval: f64,
    /// Revised lifetime count.
    pub revised_lifetime_count: u32,
    /// Revised keep-alive count.
    pub revised_max_keep_alive_count: u32,
}

/// DeleteSubscriptions request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeleteSubscriptionsRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Subscriptions to delete.
    pub subscription_ids: Vec<u32>,
}

/// DeleteSubscriptions response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeleteSubscriptionsResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One status per subscription.
    pub results: Option<Vec<StatusCode>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

/// SetPublishingMode request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetPublishingModeRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Enable or disable publishing.
    pub publishing_enabled: bool,
    /// Subscriptions to change.
    pub subscription_ids: Vec<u32>,
}

/// SetPublishingMode response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetPublishingModeResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One status per subscription.
    pub results: Option<Vec<StatusCode>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

/// TransferSubscriptions request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransferSubscriptionsRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Subscriptions to transfer into this session.
    pub subscription_ids: Vec<u32>,
    /// Resend current values of monitored items.
    pub send_initial_values: bool,
}

/// Result of transferring one subscription.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransferResult {
    /// Operation status.
    pub status_code: StatusCode,
    /// Sequence numbers available for republish.
    pub available_sequence_numbers: Option<Vec<u32>>,
}

/// TransferSubscriptions response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransferSubscriptionsResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One result per subscription.
    pub results: Option<Vec<TransferResult>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

// =============================================================================
// Monitored items
// =============================================================================

/// Sampling and queueing parameters of a monitored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringParameters {
    /// Client assigned handle echoed in notifications.
    pub client_handle: u32,
    /// Sampling interval in milliseconds, -1 for the publishing interval.
    pub sampling_interval: f64,
    /// Data change or event filter.
    pub filter: Option<ExtensionObject>,
    /// Queue size.
    pub queue_size: u32,
    /// Discard the oldest value on overflow.
    pub discard_oldest: bool,
}

impl Default for MonitoringParameters {
    fn default() -> Self {
        Self {
            client_handle: 0,
            sampling_interval: -1.0,
            filter: None,
            queue_size: 1,
            discard_oldest: true,
        }
    }
}

/// One monitored item to create.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitoredItemCreateRequest {
    /// Attribute to monitor.
    pub item_to_monitor: ReadValueId,
    /// Initial monitoring mode.
    pub monitoring_mode: MonitoringMode,
    /// Requested parameters.
    pub requested_parameters: MonitoringParameters,
}

/// Result of creating one monitored item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitoredItemCreateResult {
    /// Operation status.
    pub status_code: StatusCode,
    /// Server assigned id.
    pub monitored_item_id: u32,
    /// Revised sampling interval.
    pub revised_sampling_interval: f64,
    /// Revised queue size.
    pub revised_queue_size: u32,
    /// Filter result.
    pub filter_result: Option<ExtensionObject>,
}

/// CreateMonitoredItems request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreateMonitoredItemsRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Owning subscription.
    pub subscription_id: u32,
    /// Timestamps to return.
    pub timestamps_to_return: TimestampsToReturn,
    /// Items to create.
    pub items_to_create: Vec<MonitoredItemCreateRequest>,
}

/// CreateMonitoredItems response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CreateMonitoredItemsResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One result per item.
    pub results: Option<Vec<MonitoredItemCreateResult>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

/// One monitored item to modify.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitoredItemModifyRequest {
    /// Item to modify.
    pub monitored_item_id: u32,
    /// Requested parameters.
    pub requested_parameters: MonitoringParameters,
}

/// Result of modifying one monitored item.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitoredItemModifyResult {
    /// Operation status.
    pub status_code: StatusCode,
    /// Revised sampling interval.
    pub revised_sampling_interval: f64,
    /// Revised queue size.
    pub revised_queue_size: u32,
    /// Filter result.
    pub filter_result: Option<ExtensionObject>,
}

/// ModifyMonitoredItems request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModifyMonitoredItemsRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Owning subscription.
    pub subscription_id: u32,
    /// Timestamps to return.
    pub timestamps_to_return: TimestampsToReturn,
    /// Items to modify.
    pub items_to_modify: Vec<MonitoredItemModifyRequest>,
}

/// ModifyMonitoredItems response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModifyMonitoredItemsResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One result per item.
    pub results: Option<Vec<MonitoredItemModifyResult>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

/// DeleteMonitoredItems request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeleteMonitoredItemsRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Owning subscription.
    pub subscription_id: u32,
    /// Items to delete.
    pub monitored_item_ids: Vec<u32>,
}

/// DeleteMonitoredItems response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeleteMonitoredItemsResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One status per item.
    pub results: Option<Vec<StatusCode>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

/// SetMonitoringMode request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetMonitoringModeRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Owning subscription.
    pub subscription_id: u32,
    /// New mode.
    pub monitoring_mode: MonitoringMode,
    /// Items to change.
    pub monitored_item_ids: Vec<u32>,
}

/// SetMonitoringMode response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetMonitoringModeResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One status per item.
    pub results: Option<Vec<StatusCode>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

/// SetTriggering request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetTriggeringRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Owning subscription.
    pub subscription_id: u32,
    /// Triggering item.
    pub triggering_item_id: u32,
    /// Items to link.
    pub links_to_add: Vec<u32>,
    /// Items to unlink.
    pub links_to_remove: Vec<u32>,
}

/// SetTriggering response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SetTriggeringResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One status per added link.
    pub add_results: Option<Vec<StatusCode>>,
    /// Diagnostics per added link.
    pub add_diagnostic_infos: Option<Vec<DiagnosticInfo>>,
    /// One status per removed link.
    pub remove_results: Option<Vec<StatusCode>>,
    /// Diagnostics per removed link.
    pub remove_diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

// =============================================================================
// Publish / Republish
// =============================================================================

/// Acknowledges a received notification message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubscriptionAcknowledgement {
    /// Subscription.
    pub subscription_id: u32,
    /// Acknowledged sequence number.
    pub sequence_number: u32,
}

/// A batch of notifications.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// Sequence number.
    pub sequence_number: u32,
    /// Publish time.
    pub publish_time: Option<DateTime<Utc>>,
    /// Data change, event or status change notifications.
    pub notification_data: Vec<ExtensionObject>,
}

/// Publish request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PublishRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Acknowledgements for earlier messages.
    pub subscription_acknowledgements: Vec<SubscriptionAcknowledgement>,
}

/// Publish response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PublishResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// Subscription the message belongs to.
    pub subscription_id: u32,
    /// Sequence numbers available for republish.
    pub available_sequence_numbers: Option<Vec<u32>>,
    /// More notifications are waiting.
    pub more_notifications: bool,
    /// The notifications.
    pub notification_message: NotificationMessage,
    /// One status per acknowledgement.
    pub results: Option<Vec<StatusCode>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

/// Republish request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RepublishRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Subscription.
    pub subscription_id: u32,
    /// Sequence number to resend.
    pub retransmit_sequence_number: u32,
}

/// Republish response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RepublishResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// The resent message.
    pub notification_message: NotificationMessage,
}
