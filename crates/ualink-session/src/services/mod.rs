// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Public service API of [`ClientSession`].
//!
//! Every operation follows the same steps:
//!
//! 1. normalize the input ([`OneOrMany`], node references resolved)
//! 2. build the request in array form
//! 3. dispatch through [`ClientSession::transact`]
//! 4. fill omitted result arrays with empty defaults
//! 5. reshape the results to the caller's shape
//! 6. resolve opaque extension objects
//!
//! The operations are grouped by service set:
//!
//! - [`attribute`]: read, write, history read
//! - [`view`]: browse, translate, register, query
//! - [`method`]: call, argument definitions, monitored item listing
//! - [`subscription`]: subscriptions, monitored items, publish
//!
//! [`ClientSession`]: crate::client::ClientSession
//! [`ClientSession::transact`]: crate::client::ClientSession::transact

pub mod attribute;
pub mod method;
pub mod subscription;
pub mod view;

pub use attribute::{
    HistoryReadOptions, HistoryReadValueOptions, ReadValueOptions, WriteValueOptions,
};
pub use method::{CallMethodOptions, MonitoredItemHandles};
pub use subscription::SetTriggeringResult;
pub use view::{make_browse_path, BrowseDescriptionOptions, QueryFirstOptions, QueryFirstResult};

use crate::client::{OneOrMany, Shape};
use crate::error::UaResult;
use crate::types::NodeRef;

// =============================================================================
// Input conversions
// =============================================================================

/// Lets an option type be built straight from a node reference.
macro_rules! node_ref_options {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<&str> for $ty {
                fn from(text: &str) -> Self {
                    Self::from($crate::types::NodeRef::from(text))
                }
            }

            impl From<String> for $ty {
                fn from(text: String) -> Self {
                    Self::from($crate::types::NodeRef::from(text))
                }
            }

            impl From<$crate::types::NodeId> for $ty {
                fn from(id: $crate::types::NodeId) -> Self {
                    Self::from($crate::types::NodeRef::from(id))
                }
            }

            impl From<&$crate::types::NodeId> for $ty {
                fn from(id: &$crate::types::NodeId) -> Self {
                    Self::from($crate::types::NodeRef::from(id))
                }
            }
        )*
    };
}

/// Lets a service accept one node reference or a list of them wherever it
/// takes `impl Into<OneOrMany<T>>`.
macro_rules! one_or_many_nodes {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<&str> for $crate::client::OneOrMany<$ty> {
                fn from(text: &str) -> Self {
                    $crate::client::OneOrMany::One($ty::from(text))
                }
            }

            impl From<String> for $crate::client::OneOrMany<$ty> {
                fn from(text: String) -> Self {
                    $crate::client::OneOrMany::One($ty::from(text))
                }
            }

            impl From<$crate::types::NodeId> for $crate::client::OneOrMany<$ty> {
                fn from(id: $crate::types::NodeId) -> Self {
                    $crate::client::OneOrMany::One($ty::from(id))
                }
            }

            impl From<&$crate::types::NodeId> for $crate::client::OneOrMany<$ty> {
                fn from(id: &$crate::types::NodeId) -> Self {
                    $crate::client::OneOrMany::One($ty::from(id))
                }
            }

            impl From<Vec<&str>> for $crate::client::OneOrMany<$ty> {
                fn from(items: Vec<&str>) -> Self {
                    $crate::client::OneOrMany::Many(items.into_iter().map($ty::from).collect())
                }
            }

            impl From<Vec<String>> for $crate::client::OneOrMany<$ty> {
                fn from(items: Vec<String>) -> Self {
                    $crate::client::OneOrMany::Many(items.into_iter().map($ty::from).collect())
                }
            }

            impl From<Vec<$crate::types::NodeId>> for $crate::client::OneOrMany<$ty> {
                fn from(items: Vec<$crate::types::NodeId>) -> Self {
                    $crate::client::OneOrMany::Many(items.into_iter().map($ty::from).collect())
                }
            }

            impl<const N: usize> From<[&str; N]> for $crate::client::OneOrMany<$ty> {
                fn from(items: [&str; N]) -> Self {
                    $crate::client::OneOrMany::Many(items.into_iter().map($ty::from).collect())
                }
            }
        )*
    };
}

pub(crate) use node_ref_options;
pub(crate) use one_or_many_nodes;

one_or_many_nodes!(NodeRef);

// =============================================================================
// Helpers
// =============================================================================

/// Splits `input` into its shape and array form, converting each item.
pub(crate) fn normalize<T, U>(
    input: OneOrMany<T>,
    convert: impl FnMut(T) -> UaResult<U>,
) -> UaResult<(Shape, Vec<U>)> {
    let (shape, items) = input.into_parts();
    let items = items.into_iter().map(convert).collect::<UaResult<Vec<_>>>()?;
    Ok((shape, items))
}

/// Replaces an omitted array with an empty one.
pub(crate) fn fill<T>(field: &mut Option<Vec<T>>) {
    if field.is_none() {
        *field = Some(Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    #[test]
    fn test_node_ref_inputs() {
        let one: OneOrMany<NodeRef> = "ns=2;s=Temperature".into();
        assert!(one.is_one());

        let many: OneOrMany<NodeRef> = ["i=85", "ObjectsFolder"].into();
        assert_eq!(many.len(), 2);

        let ids: OneOrMany<NodeRef> = vec![NodeId::SERVER, NodeId::OBJECTS_FOLDER].into();
        let (shape, resolved) = normalize(ids, NodeRef::into_node_id).unwrap();
        assert_eq!(shape, Shape::Array(2));
        assert_eq!(resolved[1], NodeId::OBJECTS_FOLDER);
    }

    #[test]
    fn test_normalize_fails_on_bad_reference() {
        let input: OneOrMany<NodeRef> = vec!["i=85", "ns=x;q=1"].into();
        assert!(normalize(input, NodeRef::into_node_id).is_err());
    }

    #[test]
    fn test_fill() {
        let mut missing: Option<Vec<u32>> = None;
        fill(&mut missing);
        assert_eq!(missing, Some(vec![]));

        let mut present = Some(vec![1u32]);
        fill(&mut present);
        assert_eq!(present, Some(vec![1]));
    }
}
