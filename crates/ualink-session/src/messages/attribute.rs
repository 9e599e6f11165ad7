// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Attribute service set: Read, Write, HistoryRead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RequestHeader, ResponseHeader};
use crate::status::StatusCode;
use crate::types::{
    AttributeId, DataValue, DiagnosticInfo, NodeId, QualifiedName, TimestampsToReturn,
};

// =============================================================================
// Read
// =============================================================================

/// Identifies one attribute to read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReadValueId {
    /// Node to read.
    pub node_id: NodeId,
    /// Attribute to read.
    pub attribute_id: AttributeId,
    /// Sub-range of an array value.
    pub index_range: Option<String>,
    /// Requested data encoding.
    pub data_encoding: Option<QualifiedName>,
}

impl ReadValueId {
    /// Reads the Value attribute of `node_id`.
    pub fn value_of(node_id: NodeId) -> Self {
        Self {
            node_id,
            ..Default::default()
        }
    }
}

/// Read request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReadRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Maximum acceptable cache age in milliseconds.
    pub max_age: f64,
    /// Timestamps to return.
    pub timestamps_to_return: TimestampsToReturn,
    /// Attributes to read.
    pub nodes_to_read: Vec<ReadValueId>,
}

/// Read response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReadResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One value per requested attribute.
    pub results: Option<Vec<DataValue>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

// =============================================================================
// Write
// =============================================================================

/// One attribute value to write.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WriteValue {
    /// Node to write.
    pub node_id: NodeId,
    /// Attribute to write.
    pub attribute_id: AttributeId,
    /// Sub-range of an array value.
    pub index_range: Option<String>,
    /// Value to write.
    pub value: DataValue,
}

/// Write request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WriteRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Values to write.
    pub nodes_to_write: Vec<WriteValue>,
}

/// Write response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WriteResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One status per written value.
    pub results: Option<Vec<StatusCode>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

// =============================================================================
// HistoryRead
// =============================================================================

/// Identifies one node whose history is read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryReadValueId {
    /// Node to read.
    pub node_id: NodeId,
    /// Sub-range of an array value.
    pub index_range: Option<String>,
    /// Requested data encoding.
    pub data_encoding: Option<QualifiedName>,
    /// Continuation point from a previous call.
    pub continuation_point: Option<Vec<u8>>,
}

/// Raw or modified history read parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReadRawModifiedDetails {
    /// Read modified values instead of raw values.
    pub is_read_modified: bool,
    /// Start of the interval.
    pub start_time: Option<DateTime<Utc>>,
    /// End of the interval.
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum values per node, 0 for no limit.
    pub num_values_per_node: u32,
    /// Return bounding values.
    pub return_bounds: bool,
}

/// Aggregate calculation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateConfiguration {
    /// Ignore the other fields and use server defaults.
    pub use_server_capabilities_defaults: bool,
    /// Treat uncertain values as bad.
    pub treat_uncertain_as_bad: bool,
    /// Percentage of bad data that makes an interval bad.
    pub percent_data_bad: u8,
    /// Percentage of good data that makes an interval good.
    pub percent_data_good: u8,
    /// Use sloped extrapolation.
    pub use_sloped_extrapolation: bool,
}

impl Default for AggregateConfiguration {
    fn default() -> Self {
        Self {
            use_server_capabilities_defaults: true,
            treat_uncertain_as_bad: true,
            percent_data_bad: 100,
            percent_data_good: 100,
            use_sloped_extrapolation: false,
        }
    }
}

/// Processed (aggregate) history read parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReadProcessedDetails {
    /// Start of the interval.
    pub start_time: Option<DateTime<Utc>>,
    /// End of the interval.
    pub end_time: Option<DateTime<Utc>>,
    /// Processing interval in milliseconds.
    pub processing_interval: f64,
    /// One aggregate function per node to read.
    pub aggregate_type: Vec<NodeId>,
    /// Aggregate settings.
    pub aggregate_configuration: AggregateConfiguration,
}

/// History read parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HistoryReadDetails {
    /// Raw or modified values.
    RawModified(ReadRawModifiedDetails),
    /// Aggregated values.
    Processed(ReadProcessedDetails),
}

impl Default for HistoryReadDetails {
    fn default() -> Self {
        Self::RawModified(ReadRawModifiedDetails::default())
    }
}

/// HistoryRead request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryReadRequest {
    /// Request header.
    pub header: RequestHeader,
    /// What to read.
    pub history_read_details: HistoryReadDetails,
    /// Timestamps to return.
    pub timestamps_to_return: TimestampsToReturn,
    /// Release continuation points instead of reading.
    pub release_continuation_points: bool,
    /// Nodes to read.
    pub nodes_to_read: Vec<HistoryReadValueId>,
}

/// Historical values of one node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryData {
    /// The values.
    pub data_values: Option<Vec<DataValue>>,
}

/// History of one node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryReadResult {
    /// Operation status.
    pub status_code: StatusCode,
    /// Continuation point for the remaining values.
    pub continuation_point: Option<Vec<u8>>,
    /// The data.
    pub history_data: Option<HistoryData>,
}

/// HistoryRead response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoryReadResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One result per node.
    pub results: Option<Vec<HistoryReadResult>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}
