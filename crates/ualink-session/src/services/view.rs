// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! View and query services.

use super::{fill, node_ref_options, normalize, one_or_many_nodes};
use crate::client::{ClientSession, OneOrMany};
use crate::error::{ConfigurationError, UaError, UaResult};
use crate::messages::{
    BrowseDescription, BrowseNextRequest, BrowsePath, BrowsePathResult, BrowseRequest,
    BrowseResult, ContentFilter, ContentFilterResult, NodeTypeDescription, ParsingResult,
    QueryDataSet, QueryFirstRequest, RegisterNodesRequest, RelativePath, RelativePathElement,
    TranslateBrowsePathsRequest, UnregisterNodesRequest, ViewDescription,
    BROWSE_RESULT_MASK_ALL,
};
use crate::types::{BrowseDirection, NodeId, NodeRef, QualifiedName};

// =============================================================================
// Options
// =============================================================================

/// One node to browse.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseDescriptionOptions {
    /// Node to browse.
    pub node: NodeRef,
    /// Direction, forward by default.
    pub browse_direction: BrowseDirection,
    /// Reference type, HierarchicalReferences by default.
    pub reference_type: NodeRef,
    /// Follow subtypes of the reference type.
    pub include_subtypes: bool,
    /// Node class filter, 0 for all.
    pub node_class_mask: u32,
    /// Fields to return.
    pub result_mask: u32,
}

impl BrowseDescriptionOptions {
    /// Browses the hierarchical children of `node`.
    pub fn new(node: impl Into<NodeRef>) -> Self {
        Self {
            node: node.into(),
            browse_direction: BrowseDirection::Forward,
            reference_type: NodeId::HIERARCHICAL_REFERENCES.into(),
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: BROWSE_RESULT_MASK_ALL,
        }
    }

    /// Sets the direction.
    pub fn direction(mut self, direction: BrowseDirection) -> Self {
        self.browse_direction = direction;
        self
    }

    /// Follows `reference_type` instead of HierarchicalReferences.
    pub fn reference_type(mut self, reference_type: impl Into<NodeRef>) -> Self {
        self.reference_type = reference_type.into();
        self
    }

    /// Restricts the targets to the given node classes.
    pub fn node_class_mask(mut self, mask: u32) -> Self {
        self.node_class_mask = mask;
        self
    }

    fn into_browse_description(self) -> UaResult<BrowseDescription> {
        Ok(BrowseDescription {
            node_id: self.node.into_node_id()?,
            browse_direction: self.browse_direction,
            reference_type_id: self.reference_type.into_node_id()?,
            include_subtypes: self.include_subtypes,
            node_class_mask: self.node_class_mask,
            result_mask: self.result_mask,
        })
    }
}

impl From<NodeRef> for BrowseDescriptionOptions {
    fn from(node: NodeRef) -> Self {
        Self::new(node)
    }
}

impl From<BrowseDescription> for BrowseDescriptionOptions {
    fn from(description: BrowseDescription) -> Self {
        Self {
            node: description.node_id.into(),
            browse_direction: description.browse_direction,
            reference_type: description.reference_type_id.into(),
            include_subtypes: description.include_subtypes,
            node_class_mask: description.node_class_mask,
            result_mask: description.result_mask,
        }
    }
}

node_ref_options!(BrowseDescriptionOptions);
one_or_many_nodes!(BrowseDescriptionOptions);

/// QueryFirst parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryFirstOptions {
    /// View to query.
    pub view: ViewDescription,
    /// Types whose instances to return.
    pub node_types: Vec<NodeTypeDescription>,
    /// Filter.
    pub filter: ContentFilter,
    /// Maximum data sets, 0 for no limit.
    pub max_data_sets_to_return: u32,
    /// Maximum references, 0 for no limit.
    pub max_references_to_return: u32,
}

/// QueryFirst results with omitted arrays filled in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryFirstResult {
    /// Matching nodes.
    pub query_data_sets: Vec<QueryDataSet>,
    /// Continuation point for QueryNext.
    pub continuation_point: Option<Vec<u8>>,
    /// One parsing result per node type.
    pub parsing_results: Vec<ParsingResult>,
    /// Filter evaluation result.
    pub filter_result: ContentFilterResult,
}

/// Builds a browse path from text such as `"/2:Boiler/2:Drum/Level"`.
///
/// Segments are separated by `/`; a `ns:` prefix sets the namespace of the
/// browse name, namespace 0 otherwise. Every hop follows hierarchical
/// references.
pub fn make_browse_path(start: impl Into<NodeRef>, path: &str) -> UaResult<BrowsePath> {
    let start: NodeRef = start.into();
    let starting_node = start.into_node_id()?;
    let invalid = |reason: &str| {
        UaError::configuration(ConfigurationError::invalid_value(
            "browse_path",
            format!("{} in '{}'", reason, path),
        ))
    };

    let mut elements = Vec::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let name = match segment.split_once(':') {
            Some((ns, name)) if !ns.is_empty() && ns.bytes().all(|b| b.is_ascii_digit()) => {
                let ns = ns
                    .parse::<u16>()
                    .map_err(|_| invalid("namespace index out of range"))?;
                QualifiedName::new(ns, name)
            }
            _ => QualifiedName::new(0, segment),
        };
        if name.name.is_empty() {
            return Err(invalid("empty browse name"));
        }
        elements.push(RelativePathElement::child(name));
    }

    if elements.is_empty() {
        return Err(invalid("no path elements"));
    }
    Ok(BrowsePath {
        starting_node,
        relative_path: RelativePath { elements },
    })
}

// =============================================================================
// Browse
// =============================================================================

impl ClientSession {
    /// Browses one node or a list of nodes.
    ///
    /// Every result carries a (possibly empty) `references` array.
    pub async fn browse(
        &self,
        nodes: impl Into<OneOrMany<BrowseDescriptionOptions>>,
    ) -> UaResult<OneOrMany<BrowseResult>> {
        let (shape, nodes_to_browse) =
            normalize(nodes.into(), BrowseDescriptionOptions::into_browse_description)?;

        let response = self
            .transact(BrowseRequest {
                view: ViewDescription::default(),
                requested_max_references_per_node: 0,
                nodes_to_browse,
                ..Default::default()
            })
            .await?;

        let mut results = shape.reshape("Browse", response.results)?;
        results
            .as_mut_slice()
            .iter_mut()
            .for_each(|result| fill(&mut result.references));
        Ok(results)
    }

    /// Continues, or releases, browses that returned continuation points.
    pub async fn browse_next(
        &self,
        continuation_points: impl Into<OneOrMany<Vec<u8>>>,
        release_continuation_points: bool,
    ) -> UaResult<OneOrMany<BrowseResult>> {
        let continuation_points: OneOrMany<Vec<u8>> = continuation_points.into();
        let (shape, continuation_points) = continuation_points.into_parts();

        let response = self
            .transact(BrowseNextRequest {
                release_continuation_points,
                continuation_points,
                ..Default::default()
            })
            .await?;

        let mut results = shape.reshape("BrowseNext", response.results)?;
        results
            .as_mut_slice()
            .iter_mut()
            .for_each(|result| fill(&mut result.references));
        Ok(results)
    }

    /// Translates browse paths to node ids.
    ///
    /// ```rust,ignore
    /// let path = make_browse_path("ObjectsFolder", "/2:Boiler/2:Drum/2:Level")?;
    /// let result = session.translate_browse_paths(path).await?;
    /// ```
    pub async fn translate_browse_paths(
        &self,
        paths: impl Into<OneOrMany<BrowsePath>>,
    ) -> UaResult<OneOrMany<BrowsePathResult>> {
        let paths: OneOrMany<BrowsePath> = paths.into();
        let (shape, browse_paths) = paths.into_parts();

        let response = self
            .transact(TranslateBrowsePathsRequest {
                browse_paths,
                ..Default::default()
            })
            .await?;

        let mut results = shape.reshape("TranslateBrowsePaths", response.results)?;
        results
            .as_mut_slice()
            .iter_mut()
            .for_each(|result| fill(&mut result.targets));
        Ok(results)
    }

    // =========================================================================
    // Register / Unregister
    // =========================================================================

    /// Registers nodes for repeated access and returns the server aliases.
    pub async fn register_nodes(
        &self,
        nodes: impl Into<OneOrMany<NodeRef>>,
    ) -> UaResult<OneOrMany<NodeId>> {
        let (shape, nodes_to_register) = normalize(nodes.into(), NodeRef::into_node_id)?;

        let response = self
            .transact(RegisterNodesRequest {
                nodes_to_register,
                ..Default::default()
            })
            .await?;

        shape.reshape("RegisterNodes", response.registered_node_ids)
    }

    /// Releases aliases returned by [`register_nodes`](Self::register_nodes).
    pub async fn unregister_nodes(&self, nodes: impl Into<OneOrMany<NodeRef>>) -> UaResult<()> {
        let (_, nodes_to_unregister) = normalize(nodes.into(), NodeRef::into_node_id)?;

        self.transact(UnregisterNodesRequest {
            nodes_to_unregister,
            ..Default::default()
        })
        .await?;
        Ok(())
    }

    // =========================================================================
    // Query
    // =========================================================================

    /// Runs a QueryFirst.
    pub async fn query_first(&self, options: QueryFirstOptions) -> UaResult<QueryFirstResult> {
        let response = self
            .transact(QueryFirstRequest {
                view: options.view,
                node_types: options.node_types,
                filter: options.filter,
                max_data_sets_to_return: options.max_data_sets_to_return,
                max_references_to_return: options.max_references_to_return,
                ..Default::default()
            })
            .await?;

        let mut result = QueryFirstResult {
            query_data_sets: response.query_data_sets.unwrap_or_default(),
            continuation_point: response.continuation_point,
            parsing_results: response.parsing_results.unwrap_or_default(),
            filter_result: response.filter_result.unwrap_or_default(),
        };
        for data_set in &mut result.query_data_sets {
            self.resolve_values(&mut data_set.values).await?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{BrowseResponse, ReferenceDescription, Request, ResponseHeader};
    use crate::status::StatusCode;
    use crate::testing::{session_with, ScriptedChannel};

    #[test]
    fn test_make_browse_path() {
        let path = make_browse_path("ObjectsFolder", "/2:Boiler/2:Drum/Level").unwrap();
        assert_eq!(path.starting_node, NodeId::OBJECTS_FOLDER);

        let names: Vec<_> = path
            .relative_path
            .elements
            .iter()
            .map(|e| e.target_name.clone())
            .collect();
        assert_eq!(
            names,
            vec![
                QualifiedName::new(2, "Boiler"),
                QualifiedName::new(2, "Drum"),
                QualifiedName::new(0, "Level"),
            ]
        );
    }

    #[test]
    fn test_make_browse_path_rejects_empty() {
        assert!(make_browse_path("i=85", "/").is_err());
        assert!(make_browse_path("i=85", "/2:").is_err());
        assert!(make_browse_path("i=85", "/99999:X").is_err());
    }

    #[test]
    fn test_browse_options() {
        let description = BrowseDescriptionOptions::from("i=85")
            .direction(BrowseDirection::Inverse)
            .reference_type("HasComponent")
            .into_browse_description()
            .unwrap();
        assert_eq!(description.node_id, NodeId::OBJECTS_FOLDER);
        assert_eq!(description.reference_type_id, NodeId::HAS_COMPONENT);
        assert_eq!(description.browse_direction, BrowseDirection::Inverse);
    }

    #[tokio::test]
    async fn test_browse_fills_references() {
        let channel = ScriptedChannel::new();
        channel.respond(BrowseResponse {
            header: ResponseHeader::good(),
            results: Some(vec![
                BrowseResult {
                    status_code: StatusCode::Good,
                    continuation_point: None,
                    references: Some(vec![ReferenceDescription::default()]),
                },
                BrowseResult {
                    status_code: StatusCode::BadNodeIdUnknown,
                    continuation_point: None,
                    references: None,
                },
            ]),
            diagnostic_infos: None,
        });
        let (session, _owner) = session_with(channel.clone());

        let results = session.browse(vec!["i=85", "ns=2;s=Gone"]).await.unwrap().into_vec();
        assert_eq!(results[0].references.as_ref().map(Vec::len), Some(1));
        assert_eq!(results[1].references, Some(vec![]));

        match &channel.requests()[0] {
            Request::Browse(request) => {
                assert_eq!(request.nodes_to_browse[1].node_id, NodeId::string(2, "Gone"));
            }
            other => panic!("unexpected request {:?}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_browse_rejects_extra_results() {
        let channel = ScriptedChannel::new();
        channel.respond(BrowseResponse {
            header: ResponseHeader::good(),
            results: Some(vec![BrowseResult::default(), BrowseResult::default()]),
            diagnostic_infos: None,
        });
        let (session, _owner) = session_with(channel);

        let err = session.browse("i=85").await.unwrap_err();
        assert!(matches!(err, UaError::Internal(_)));
    }

    #[tokio::test]
    async fn test_query_first_defaults() {
        use crate::messages::QueryFirstResponse;

        let channel = ScriptedChannel::new();
        channel.respond(QueryFirstResponse {
            header: ResponseHeader::good(),
            ..Default::default()
        });
        let (session, _owner) = session_with(channel);

        let result = session.query_first(QueryFirstOptions::default()).await.unwrap();
        assert!(result.query_data_sets.is_empty());
        assert!(result.parsing_results.is_empty());
        assert!(result.continuation_point.is_none());
    }
}
