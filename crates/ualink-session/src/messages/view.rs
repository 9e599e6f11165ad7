// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! View and query service sets: Browse, BrowseNext,
//! TranslateBrowsePathsToNodeIds, RegisterNodes, UnregisterNodes,
//! QueryFirst.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RequestHeader, ResponseHeader};
use crate::status::StatusCode;
use crate::types::{
    AttributeId, BrowseDirection, DiagnosticInfo, ExtensionObject, LocalizedText, NodeClass,
    NodeId, QualifiedName, Variant,
};

/// Browse result mask requesting every reference field.
pub const BROWSE_RESULT_MASK_ALL: u32 = 0x3F;

// =============================================================================
// Browse
// =============================================================================

/// Restricts browsing to a view.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewDescription {
    /// View node, null for the whole address space.
    pub view_id: NodeId,
    /// View timestamp.
    pub timestamp: Option<DateTime<Utc>>,
    /// View version.
    pub view_version: u32,
}

/// One node to browse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseDescription {
    /// Node to browse.
    pub node_id: NodeId,
    /// Direction.
    pub browse_direction: BrowseDirection,
    /// Reference type to follow.
    pub reference_type_id: NodeId,
    /// Follow subtypes of the reference type.
    pub include_subtypes: bool,
    /// Node class filter, 0 for all.
    pub node_class_mask: u32,
    /// Fields to return.
    pub result_mask: u32,
}

impl Default for BrowseDescription {
    fn default() -> Self {
        Self {
            node_id: NodeId::null(),
            browse_direction: BrowseDirection::Forward,
            reference_type_id: NodeId::HIERARCHICAL_REFERENCES,
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: BROWSE_RESULT_MASK_ALL,
        }
    }
}

/// Browse request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrowseRequest {
    /// Request header.
    pub header: RequestHeader,
    /// View to browse.
    pub view: ViewDescription,
    /// Maximum references per node, 0 for no limit.
    pub requested_max_references_per_node: u32,
    /// Nodes to browse.
    pub nodes_to_browse: Vec<BrowseDescription>,
}

/// A reference returned by Browse.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceDescription {
    /// Reference type.
    pub reference_type_id: NodeId,
    /// Forward reference.
    pub is_forward: bool,
    /// Target node.
    pub node_id: NodeId,
    /// Target browse name.
    pub browse_name: QualifiedName,
    /// Target display name.
    pub display_name: LocalizedText,
    /// Target node class.
    pub node_class: NodeClass,
    /// Target type definition.
    pub type_definition: NodeId,
}

/// References of one browsed node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrowseResult {
    /// Operation status.
    pub status_code: StatusCode,
    /// Continuation point for the remaining references.
    pub continuation_point: Option<Vec<u8>>,
    /// The references.
    pub references: Option<Vec<ReferenceDescription>>,
}

/// Browse response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrowseResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One result per node.
    pub results: Option<Vec<BrowseResult>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

/// BrowseNext request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrowseNextRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Release instead of continuing.
    pub release_continuation_points: bool,
    /// Continuation points from Browse or BrowseNext.
    pub continuation_points: Vec<Vec<u8>>,
}

/// BrowseNext response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrowseNextResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One result per continuation point.
    pub results: Option<Vec<BrowseResult>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

// =============================================================================
// TranslateBrowsePathsToNodeIds
// =============================================================================

/// One hop of a relative path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativePathElement {
    /// Reference type to follow.
    pub reference_type_id: NodeId,
    /// Follow the inverse direction.
    pub is_inverse: bool,
    /// Follow subtypes of the reference type.
    pub include_subtypes: bool,
    /// Browse name of the target.
    pub target_name: QualifiedName,
}

impl RelativePathElement {
    /// A hierarchical hop to `target_name`.
    pub fn child(target_name: QualifiedName) -> Self {
        Self {
            reference_type_id: NodeId::HIERARCHICAL_REFERENCES,
            is_inverse: false,
            include_subtypes: true,
            target_name,
        }
    }
}

/// A path relative to a starting node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelativePath {
    /// Hops in order.
    pub elements: Vec<RelativePathElement>,
}

/// A starting node plus a relative path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrowsePath {
    /// Starting node.
    pub starting_node: NodeId,
    /// Path to follow.
    pub relative_path: RelativePath,
}

/// A node reached by a browse path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrowsePathTarget {
    /// Target node.
    pub target_id: NodeId,
    /// Index of the first unprocessed element, `u32::MAX` if complete.
    pub remaining_path_index: u32,
}

/// Result of translating one browse path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BrowsePathResult {
    /// Operation status.
    pub status_code: StatusCode,
    /// Matching targets.
    pub targets: Option<Vec<BrowsePathTarget>>,
}

/// TranslateBrowsePathsToNodeIds request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TranslateBrowsePathsRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Paths to translate.
    pub browse_paths: Vec<BrowsePath>,
}

/// TranslateBrowsePathsToNodeIds response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TranslateBrowsePathsResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// One result per path.
    pub results: Option<Vec<BrowsePathResult>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
}

// =============================================================================
// RegisterNodes / UnregisterNodes
// =============================================================================

/// RegisterNodes request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegisterNodesRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Nodes to register.
    pub nodes_to_register: Vec<NodeId>,
}

/// RegisterNodes response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RegisterNodesResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// Server assigned aliases, one per node.
    pub registered_node_ids: Option<Vec<NodeId>>,
}

/// UnregisterNodes request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnregisterNodesRequest {
    /// Request header.
    pub header: RequestHeader,
    /// Aliases to release.
    pub nodes_to_unregister: Vec<NodeId>,
}

/// UnregisterNodes response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnregisterNodesResponse {
    /// Response header.
    pub header: ResponseHeader,
}

// =============================================================================
// QueryFirst
// =============================================================================

/// An attribute to return for each matching node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryDataDescription {
    /// Path from the type instance.
    pub relative_path: RelativePath,
    /// Attribute to return.
    pub attribute_id: AttributeId,
    /// Sub-range of an array value.
    pub index_range: Option<String>,
}

/// A type whose instances the query should return.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeTypeDescription {
    /// Type definition node.
    pub type_definition_node: NodeId,
    /// Include instances of subtypes.
    pub include_sub_types: bool,
    /// Data to return.
    pub data_to_return: Vec<QueryDataDescription>,
}

/// One element of a content filter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentFilterElement {
    /// Filter operator.
    pub filter_operator: u32,
    /// Operands as extension objects.
    pub filter_operands: Vec<ExtensionObject>,
}

/// Filter restricting query results.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentFilter {
    /// Elements; the first is the root.
    pub elements: Vec<ContentFilterElement>,
}

/// QueryFirst request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryFirstRequest {
    /// Request header.
    pub header: RequestHeader,
    /// View to query.
    pub view: ViewDescription,
    /// Types to query.
    pub node_types: Vec<NodeTypeDescription>,
    /// Filter.
    pub filter: ContentFilter,
    /// Maximum data sets, 0 for no limit.
    pub max_data_sets_to_return: u32,
    /// Maximum references, 0 for no limit.
    pub max_references_to_return: u32,
}

/// One matching node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryDataSet {
    /// Matching node.
    pub node_id: NodeId,
    /// Its type definition.
    pub type_definition_node: NodeId,
    /// Requested values.
    pub values: Vec<Variant>,
}

/// Parsing status of one node type description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsingResult {
    /// Parsing status.
    pub status_code: StatusCode,
    /// Status per data description.
    pub data_status_codes: Option<Vec<StatusCode>>,
}

/// Result of evaluating one filter element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentFilterElementResult {
    /// Element status.
    pub status_code: StatusCode,
    /// Status per operand.
    pub operand_status_codes: Option<Vec<StatusCode>>,
}

/// Result of evaluating a content filter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentFilterResult {
    /// One result per element.
    pub element_results: Option<Vec<ContentFilterElementResult>>,
}

/// QueryFirst response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryFirstResponse {
    /// Response header.
    pub header: ResponseHeader,
    /// Matching nodes.
    pub query_data_sets: Option<Vec<QueryDataSet>>,
    /// Continuation point for QueryNext.
    pub continuation_point: Option<Vec<u8>>,
    /// One parsing result per node type.
    pub parsing_results: Option<Vec<ParsingResult>>,
    /// Per-operation diagnostics.
    pub diagnostic_infos: Option<Vec<DiagnosticInfo>>,
    /// Filter evaluation result.
    pub filter_result: Option<ContentFilterResult>,
}

