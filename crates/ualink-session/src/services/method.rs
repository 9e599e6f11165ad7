// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Method services: call, argument definitions and the server's
//! `GetMonitoredItems` method.

use super::{fill, normalize, BrowseDescriptionOptions, ReadValueOptions};
use crate::client::{decode_argument, ClientSession, OneOrMany, Padding};
use crate::error::{InternalError, ServiceError, UaError, UaResult};
use crate::messages::{Argument, ArgumentDefinition, CallMethodRequest, CallMethodResult, CallRequest};
use crate::types::{DataValue, NodeId, NodeRef, Variant};

const INPUT_ARGUMENTS: &str = "InputArguments";
const OUTPUT_ARGUMENTS: &str = "OutputArguments";

// =============================================================================
// Options
// =============================================================================

/// One method invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct CallMethodOptions {
    /// Object or object type owning the method.
    pub object: NodeRef,
    /// Method to call.
    pub method: NodeRef,
    /// Input arguments in declaration order.
    pub input_arguments: Vec<Variant>,
}

impl CallMethodOptions {
    /// Calls `method` on `object` without arguments.
    pub fn new(object: impl Into<NodeRef>, method: impl Into<NodeRef>) -> Self {
        Self {
            object: object.into(),
            method: method.into(),
            input_arguments: Vec::new(),
        }
    }

    /// Appends an input argument.
    pub fn arg(mut self, value: impl Into<Variant>) -> Self {
        self.input_arguments.push(value.into());
        self
    }

    /// Replaces the input arguments.
    pub fn args(mut self, values: Vec<Variant>) -> Self {
        self.input_arguments = values;
        self
    }

    fn into_call_method_request(self) -> UaResult<CallMethodRequest> {
        Ok(CallMethodRequest {
            object_id: self.object.into_node_id()?,
            method_id: self.method.into_node_id()?,
            input_arguments: self.input_arguments,
        })
    }
}

impl From<CallMethodRequest> for CallMethodOptions {
    fn from(request: CallMethodRequest) -> Self {
        Self {
            object: request.object_id.into(),
            method: request.method_id.into(),
            input_arguments: request.input_arguments,
        }
    }
}

/// Output of `Server.GetMonitoredItems`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonitoredItemHandles {
    /// Server assigned monitored item ids.
    pub server_handles: Vec<u32>,
    /// Client handles, in the same order.
    pub client_handles: Vec<u32>,
}

// =============================================================================
// Call
// =============================================================================

impl ClientSession {
    /// Calls one method or a list of methods.
    ///
    /// Every result carries (possibly empty) `input_argument_results` and
    /// `output_arguments` arrays.
    pub async fn call(
        &self,
        methods: impl Into<OneOrMany<CallMethodOptions>>,
    ) -> UaResult<OneOrMany<CallMethodResult>> {
        let (shape, methods_to_call) =
            normalize(methods.into(), CallMethodOptions::into_call_method_request)?;

        let response = self
            .transact(CallRequest {
                methods_to_call,
                ..Default::default()
            })
            .await?;

        let mut results = shape.reshape("Call", response.results)?;
        for result in results.as_mut_slice() {
            fill(&mut result.input_argument_results);
            fill(&mut result.output_arguments);
            if let Some(outputs) = result.output_arguments.as_mut() {
                self.resolve_values(outputs).await?;
            }
        }
        Ok(results)
    }

    /// Lists the monitored items of a subscription through the server's
    /// `GetMonitoredItems` method.
    pub async fn get_monitored_items(&self, subscription_id: u32) -> UaResult<MonitoredItemHandles> {
        let options = CallMethodOptions::new(NodeId::SERVER, NodeId::SERVER_GET_MONITORED_ITEMS)
            .arg(Variant::UInt32(subscription_id));
        let result = self
            .call(options)
            .await?
            .into_vec()
            .pop()
            .unwrap_or_else(Padding::padding);

        if !result.status_code.is_good() {
            return Err(ServiceError::fault("GetMonitoredItems", result.status_code).into());
        }

        let outputs = result.output_arguments.unwrap_or_default();
        let handles = |index: usize| -> UaResult<Vec<u32>> {
            let items = outputs
                .get(index)
                .and_then(Variant::as_array)
                .ok_or_else(|| malformed("GetMonitoredItems", "missing handle array"))?;
            items
                .iter()
                .map(|item| {
                    item.as_u32()
                        .ok_or_else(|| malformed("GetMonitoredItems", "handle is not a UInt32"))
                })
                .collect()
        };

        Ok(MonitoredItemHandles {
            server_handles: handles(0)?,
            client_handles: handles(1)?,
        })
    }

    /// Returns the input and output argument declarations of `method`.
    ///
    /// A method without an `InputArguments` or `OutputArguments` property
    /// gets an empty list for it.
    pub async fn get_argument_definition(
        &self,
        method: impl Into<NodeRef>,
    ) -> UaResult<ArgumentDefinition> {
        let description =
            BrowseDescriptionOptions::new(method).reference_type(NodeId::HAS_PROPERTY);
        let browsed = self
            .browse(description)
            .await?
            .into_vec()
            .pop()
            .unwrap_or_else(Padding::padding);

        if !browsed.status_code.is_good() {
            return Err(ServiceError::fault("GetArgumentDefinition", browsed.status_code).into());
        }

        let references = browsed.references.unwrap_or_default();
        let property = |name: &str| {
            references
                .iter()
                .find(|r| r.browse_name.name == name)
                .map(|r| r.node_id.clone())
        };

        let mut slots = Vec::new();
        let mut nodes = Vec::new();
        for (slot, name) in [INPUT_ARGUMENTS, OUTPUT_ARGUMENTS].into_iter().enumerate() {
            if let Some(node) = property(name) {
                slots.push(slot);
                nodes.push(ReadValueOptions::new(node));
            }
        }

        let mut definition = ArgumentDefinition::default();
        if nodes.is_empty() {
            tracing::debug!("Method has no argument properties");
            return Ok(definition);
        }

        let values = self.read(nodes).await?.into_vec();
        for (slot, value) in slots.into_iter().zip(values) {
            let arguments = arguments_from(&value)?;
            if slot == 0 {
                definition.input_arguments = arguments;
            } else {
                definition.output_arguments = arguments;
            }
        }
        Ok(definition)
    }
}

/// Decodes the `Argument` array held by an argument property value.
fn arguments_from(value: &DataValue) -> UaResult<Vec<Argument>> {
    if !value.is_good() {
        return Err(ServiceError::fault("GetArgumentDefinition", value.status()).into());
    }

    let items = match &value.value {
        None | Some(Variant::Empty) => return Ok(Vec::new()),
        Some(Variant::Array(items)) => items.as_slice(),
        Some(single) => std::slice::from_ref(single),
    };

    items
        .iter()
        .map(|item| match item {
            Variant::ExtensionObject(object) => decode_argument(object),
            other => Err(malformed(
                "GetArgumentDefinition",
                format!("expected an Argument, got {}", other.type_name()),
            )),
        })
        .collect()
}

fn malformed(operation: &'static str, message: impl Into<String>) -> UaError {
    UaError::internal(InternalError::malformed(operation, message))
}
