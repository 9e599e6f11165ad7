// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Attribute services: read, write and history read.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{fill, node_ref_options, normalize, one_or_many_nodes};
use crate::client::{ClientSession, OneOrMany, Padding};
use crate::error::{InternalError, ServiceError, UaError, UaResult};
use crate::messages::{
    AggregateConfiguration, HistoryData, HistoryReadDetails, HistoryReadRequest,
    HistoryReadResult, HistoryReadValueId, ReadProcessedDetails, ReadRawModifiedDetails,
    ReadRequest, ReadValueId, WriteRequest, WriteValue,
};
use crate::status::StatusCode;
use crate::types::{
    AttributeId, DataValue, NodeId, NodeRef, QualifiedName, TimestampsToReturn, Variant,
};

// =============================================================================
// Options
// =============================================================================

/// One attribute to read.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadValueOptions {
    /// Node to read.
    pub node: NodeRef,
    /// Attribute to read, Value by default.
    pub attribute_id: AttributeId,
    /// Sub-range of an array value.
    pub index_range: Option<String>,
    /// Requested data encoding.
    pub data_encoding: Option<QualifiedName>,
}

impl ReadValueOptions {
    /// Reads the Value attribute of `node`.
    pub fn new(node: impl Into<NodeRef>) -> Self {
        Self {
            node: node.into(),
            attribute_id: AttributeId::Value,
            index_range: None,
            data_encoding: None,
        }
    }

    /// Reads `attribute_id` instead of Value.
    pub fn attribute(mut self, attribute_id: AttributeId) -> Self {
        self.attribute_id = attribute_id;
        self
    }

    /// Restricts the read to a sub-range such as `"0:4"`.
    pub fn index_range(mut self, range: impl Into<String>) -> Self {
        self.index_range = Some(range.into());
        self
    }

    fn into_read_value_id(self) -> UaResult<ReadValueId> {
        Ok(ReadValueId {
            node_id: self.node.into_node_id()?,
            attribute_id: self.attribute_id,
            index_range: self.index_range,
            data_encoding: self.data_encoding,
        })
    }
}

impl From<NodeRef> for ReadValueOptions {
    fn from(node: NodeRef) -> Self {
        Self::new(node)
    }
}

impl From<ReadValueId> for ReadValueOptions {
    fn from(id: ReadValueId) -> Self {
        Self {
            node: id.node_id.into(),
            attribute_id: id.attribute_id,
            index_range: id.index_range,
            data_encoding: id.data_encoding,
        }
    }
}

/// One attribute value to write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteValueOptions {
    /// Node to write.
    pub node: NodeRef,
    /// Attribute to write, Value by default.
    pub attribute_id: AttributeId,
    /// Sub-range of an array value.
    pub index_range: Option<String>,
    /// The value with optional status and timestamps.
    pub value: DataValue,
}

impl WriteValueOptions {
    /// Writes `value` to the Value attribute of `node`.
    pub fn new(node: impl Into<NodeRef>, value: impl Into<Variant>) -> Self {
        Self::with_data_value(node, DataValue::new(value))
    }

    /// Writes a full data value to the Value attribute of `node`.
    pub fn with_data_value(node: impl Into<NodeRef>, value: DataValue) -> Self {
        Self {
            node: node.into(),
            attribute_id: AttributeId::Value,
            index_range: None,
            value,
        }
    }

    /// Writes `attribute_id` instead of Value.
    pub fn attribute(mut self, attribute_id: AttributeId) -> Self {
        self.attribute_id = attribute_id;
        self
    }

    /// Restricts the write to a sub-range.
    pub fn index_range(mut self, range: impl Into<String>) -> Self {
        self.index_range = Some(range.into());
        self
    }

    fn into_write_value(self) -> UaResult<WriteValue> {
        Ok(WriteValue {
            node_id: self.node.into_node_id()?,
            attribute_id: self.attribute_id,
            index_range: self.index_range,
            value: self.value,
        })
    }
}

impl From<WriteValue> for WriteValueOptions {
    fn from(value: WriteValue) -> Self {
        Self {
            node: value.node_id.into(),
            attribute_id: value.attribute_id,
            index_range: value.index_range,
            value: value.value,
        }
    }
}

/// One node whose history is read.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryReadValueOptions {
    /// Node to read.
    pub node: NodeRef,
    /// Sub-range of an array value.
    pub index_range: Option<String>,
    /// Requested data encoding.
    pub data_encoding: Option<QualifiedName>,
    /// Continuation point from a previous read.
    pub continuation_point: Option<Vec<u8>>,
}

impl HistoryReadValueOptions {
    /// Reads the history of `node` from the start.
    pub fn new(node: impl Into<NodeRef>) -> Self {
        Self {
            node: node.into(),
            index_range: None,
            data_encoding: None,
            continuation_point: None,
        }
    }

    /// Continues a previous read.
    pub fn continue_from(mut self, continuation_point: Vec<u8>) -> Self {
        self.continuation_point = Some(continuation_point);
        self
    }

    fn into_history_read_value_id(self) -> UaResult<HistoryReadValueId> {
        Ok(HistoryReadValueId {
            node_id: self.node.into_node_id()?,
            index_range: self.index_range,
            data_encoding: self.data_encoding,
            continuation_point: self.continuation_point,
        })
    }
}

impl From<NodeRef> for HistoryReadValueOptions {
    fn from(node: NodeRef) -> Self {
        Self::new(node)
    }
}

node_ref_options!(ReadValueOptions, HistoryReadValueOptions);
one_or_many_nodes!(ReadValueOptions, HistoryReadValueOptions);

/// Request-level history read settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryReadOptions {
    /// Timestamps to return.
    pub timestamps_to_return: TimestampsToReturn,
    /// Release the continuation points instead of reading.
    pub release_continuation_points: bool,
}

// =============================================================================
// Read / Write
// =============================================================================

impl ClientSession {
    /// Reads one attribute or a list of attributes.
    ///
    /// ```rust,ignore
    /// let value = session.read("ns=2;s=Temperature").await?;      // One(DataValue)
    /// let values = session.read(vec!["i=2258", "i=2259"]).await?; // Many([..])
    /// ```
    pub async fn read(
        &self,
        nodes: impl Into<OneOrMany<ReadValueOptions>>,
    ) -> UaResult<OneOrMany<DataValue>> {
        self.read_with_max_age(nodes, 0.0).await
    }

    /// Reads with an acceptable cache age in milliseconds.
    pub async fn read_with_max_age(
        &self,
        nodes: impl Into<OneOrMany<ReadValueOptions>>,
        max_age: f64,
    ) -> UaResult<OneOrMany<DataValue>> {
        let (shape, nodes_to_read) = normalize(nodes.into(), ReadValueOptions::into_read_value_id)?;

        let response = self
            .transact(ReadRequest {
                max_age,
                timestamps_to_return: TimestampsToReturn::Both,
                nodes_to_read,
                ..Default::default()
            })
            .await?;

        let mut values = shape.reshape("Read", response.results)?;
        self.resolve_data_values(values.as_mut_slice()).await?;
        Ok(values)
    }

    /// Reads the Value attribute of one node or a list of nodes.
    pub async fn read_variable_value(
        &self,
        nodes: impl Into<OneOrMany<NodeRef>>,
    ) -> UaResult<OneOrMany<DataValue>> {
        let nodes: OneOrMany<NodeRef> = nodes.into();
        self.read(nodes.map(ReadValueOptions::new)).await
    }

    /// Writes one value or a list of values and returns their statuses.
    pub async fn write(
        &self,
        values: impl Into<OneOrMany<WriteValueOptions>>,
    ) -> UaResult<OneOrMany<StatusCode>> {
        let (shape, nodes_to_write) = normalize(values.into(), WriteValueOptions::into_write_value)?;

        let response = self
            .transact(WriteRequest {
                nodes_to_write,
                ..Default::default()
            })
            .await?;

        shape.reshape("Write", response.results)
    }

    /// Writes `value` to the Value attribute of `node`.
    pub async fn write_single_node(
        &self,
        node: impl Into<NodeRef>,
        value: impl Into<Variant>,
    ) -> UaResult<StatusCode> {
        let statuses = self.write(WriteValueOptions::new(node, value)).await?;
        Ok(statuses.into_vec().pop().unwrap_or_else(Padding::padding))
    }

    /// Reads the server's namespace table.
    pub async fn read_namespace_array(&self) -> UaResult<Vec<String>> {
        let value = self
            .read_variable_value(NodeId::SERVER_NAMESPACE_ARRAY)
            .await?
            .into_vec()
            .pop()
            .unwrap_or_else(Padding::padding);

        if !value.is_good() {
            return Err(ServiceError::fault("ReadNamespaceArray", value.status()).into());
        }

        let items = value
            .value
            .as_ref()
            .and_then(Variant::as_array)
            .ok_or_else(|| {
                UaError::internal(InternalError::malformed(
                    "ReadNamespaceArray",
                    "NamespaceArray is not an array",
                ))
            })?;

        Ok(items
            .iter()
            .map(|item| item.as_str().unwrap_or_default().to_string())
            .collect())
    }

    // =========================================================================
    // History
    // =========================================================================

    /// Reads history with explicit details.
    ///
    /// Every result carries a `history_data` with a (possibly empty)
    /// `data_values` array.
    pub async fn history_read(
        &self,
        nodes: impl Into<OneOrMany<HistoryReadValueOptions>>,
        details: HistoryReadDetails,
        options: HistoryReadOptions,
    ) -> UaResult<OneOrMany<HistoryReadResult>> {
        let (shape, nodes_to_read) =
            normalize(nodes.into(), HistoryReadValueOptions::into_history_read_value_id)?;

        let response = self
            .transact(HistoryReadRequest {
                history_read_details: details,
                timestamps_to_return: options.timestamps_to_return,
                release_continuation_points: options.release_continuation_points,
                nodes_to_read,
                ..Default::default()
            })
            .await?;

        let mut results = shape.reshape("HistoryRead", response.results)?;
        for result in results.as_mut_slice() {
            let data = result.history_data.get_or_insert_with(HistoryData::default);
            fill(&mut data.data_values);
            if let Some(values) = data.data_values.as_mut() {
                self.resolve_data_values(values).await?;
            }
        }
        Ok(results)
    }

    /// Reads raw historical values between `start` and `end`.
    pub async fn read_history_raw(
        &self,
        nodes: impl Into<OneOrMany<HistoryReadValueOptions>>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> UaResult<OneOrMany<HistoryReadResult>> {
        let details = HistoryReadDetails::RawModified(ReadRawModifiedDetails {
            is_read_modified: false,
            start_time: Some(start),
            end_time: Some(end),
            num_values_per_node: 0,
            return_bounds: false,
        });
        self.history_read(nodes, details, HistoryReadOptions::default())
            .await
    }

    /// Reads `aggregate` over `processing_interval` buckets between `start`
    /// and `end`, applying the same aggregate to every node.
    pub async fn read_history_processed(
        &self,
        nodes: impl Into<OneOrMany<HistoryReadValueOptions>>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        aggregate: impl Into<NodeRef>,
        processing_interval: Duration,
    ) -> UaResult<OneOrMany<HistoryReadResult>> {
        let nodes: OneOrMany<HistoryReadValueOptions> = nodes.into();
        let aggregate: NodeRef = aggregate.into();
        let aggregate = aggregate.into_node_id()?;

        let details = HistoryReadDetails::Processed(ReadProcessedDetails {
            start_time: Some(start),
            end_time: Some(end),
            processing_interval: processing_interval.as_secs_f64() * 1000.0,
            aggregate_type: vec![aggregate; nodes.len()],
            aggregate_configuration: AggregateConfiguration::default(),
        });
        self.history_read(nodes, details, HistoryReadOptions::default())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{ReadResponse, Request, ResponseHeader, WriteResponse};
    use crate::testing::{session_with, ScriptedChannel};

    #[test]
    fn test_read_options_from_text() {
        let options = ReadValueOptions::from("ns=2;s=Temperature")
            .attribute(AttributeId::DisplayName)
            .index_range("0:1");
        let id = options.into_read_value_id().unwrap();
        assert_eq!(id.node_id, NodeId::string(2, "Temperature"));
        assert_eq!(id.attribute_id, AttributeId::DisplayName);
        assert_eq!(id.index_range.as_deref(), Some("0:1"));
    }

    #[tokio::test]
    async fn test_read_scalar_and_array() {
        let channel = ScriptedChannel::new();
        channel.respond(ReadResponse {
            header: ResponseHeader::good(),
            results: Some(vec![DataValue::new(21.5f64)]),
            diagnostic_infos: None,
        });
        channel.respond(ReadResponse {
            header: ResponseHeader::good(),
            results: Some(vec![DataValue::new(1i32), DataValue::new(2i32)]),
            diagnostic_infos: None,
        });
        let (session, _owner) = session_with(channel.clone());

        let one = session.read("ns=2;s=Temperature").await.unwrap();
        assert_eq!(one, OneOrMany::One(DataValue::new(21.5f64)));

        let many = session.read(vec!["ns=2;s=A", "ns=2;s=B"]).await.unwrap();
        assert_eq!(many.into_vec(), vec![DataValue::new(1i32), DataValue::new(2i32)]);

        match &channel.requests()[1] {
            Request::Read(read) => assert_eq!(read.nodes_to_read.len(), 2),
            other => panic!("unexpected request {:?}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_read_bad_node_sends_nothing() {
        let channel = ScriptedChannel::new();
        let (session, _owner) = session_with(channel.clone());

        assert!(session.read("ns=2;x=nope").await.is_err());
        assert!(channel.requests().is_empty());
    }

    #[tokio::test]
    async fn test_write_pads_omitted_results() {
        let channel = ScriptedChannel::new();
        channel.respond(WriteResponse {
            header: ResponseHeader::good(),
            results: None,
            diagnostic_infos: None,
        });
        let (session, _owner) = session_with(channel);

        let statuses = session
            .write(vec![
                WriteValueOptions::new("ns=2;s=A", 1i32),
                WriteValueOptions::new("ns=2;s=B", 2i32),
            ])
            .await
            .unwrap();
        assert_eq!(
            statuses,
            OneOrMany::Many(vec![StatusCode::BadNoData, StatusCode::BadNoData])
        );
        assert!(statuses.iter().all(|status| !status.is_good()));
    }

    #[tokio::test]
    async fn test_write_single_node() {
        let channel = ScriptedChannel::new();
        channel.respond(WriteResponse {
            header: ResponseHeader::good(),
            results: Some(vec![StatusCode::BadNotWritable]),
            diagnostic_infos: None,
        });
        let (session, _owner) = session_with(channel);

        let status = session
            .write_single_node("ns=2;s=SetPoint", 42.0f64)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::BadNotWritable);
    }

    #[tokio::test]
    async fn test_read_namespace_array() {
        let channel = ScriptedChannel::new();
        channel.respond(ReadResponse {
            header: ResponseHeader::good(),
            results: Some(vec![DataValue::new(Variant::Array(vec![
                Variant::from("http://opcfoundation.org/UA/"),
                Variant::from("urn:plant:line1"),
            ]))]),
            diagnostic_infos: None,
        });
        let (session, _owner) = session_with(channel);

        let namespaces = session.read_namespace_array().await.unwrap();
        assert_eq!(namespaces, vec!["http://opcfoundation.org/UA/", "urn:plant:line1"]);
    }

    #[tokio::test]
    async fn test_history_read_fills_data() {
        use crate::messages::HistoryReadResponse;

        let channel = ScriptedChannel::new();
        channel.respond(HistoryReadResponse {
            header: ResponseHeader::good(),
            results: Some(vec![HistoryReadResult::default()]),
            diagnostic_infos: None,
        });
        let (session, _owner) = session_with(channel.clone());

        let results = session
            .read_history_processed(
                vec!["ns=2;s=Flow"],
                Utc::now(),
                Utc::now(),
                "i=2342",
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        let data = results.into_vec().remove(0).history_data.unwrap();
        assert_eq!(data.data_values, Some(vec![]));

        match &channel.requests()[0] {
            Request::HistoryRead(request) => match &request.history_read_details {
                HistoryReadDetails::Processed(details) => {
                    assert_eq!(details.processing_interval, 60_000.0);
                    assert_eq!(details.aggregate_type, vec![NodeId::numeric(0, 2342)]);
                }
                other => panic!("unexpected details {:?}", other),
            },
            other => panic!("unexpected request {:?}", other.kind()),
        }
    }
}
