// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscription and monitored item services.
//!
//! Successful changes are reported to the session's
//! [`PublishEngine`](crate::client::PublishEngine).

use super::fill;
use crate::client::{ClientSession, OneOrMany, Shape, SubscriptionId, SubscriptionRecord};
use crate::error::UaResult;
use crate::messages::{
    CreateMonitoredItemsRequest, CreateSubscriptionRequest, CreateSubscriptionResponse,
    DeleteMonitoredItemsRequest, DeleteSubscriptionsRequest, ModifyMonitoredItemsRequest,
    ModifySubscriptionRequest, ModifySubscriptionResponse, MonitoredItemCreateRequest,
    MonitoredItemCreateResult, MonitoredItemModifyRequest, MonitoredItemModifyResult,
    NotificationMessage, PublishRequest, PublishResponse, RepublishRequest,
    SetMonitoringModeRequest, SetPublishingModeRequest, SetTriggeringRequest,
    SubscriptionAcknowledgement, TransferResult, TransferSubscriptionsRequest,
};
use crate::status::StatusCode;
use crate::types::{MonitoringMode, TimestampsToReturn};

/// Per-link results of SetTriggering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetTriggeringResult {
    /// One status per link to add.
    pub add_results: Vec<StatusCode>,
    /// One status per link to remove.
    pub remove_results: Vec<StatusCode>,
}

/// Ids whose matching status is Good.
fn succeeded<'a>(
    ids: &'a [u32],
    statuses: impl IntoIterator<Item = &'a StatusCode>,
) -> Vec<SubscriptionId> {
    ids.iter()
        .zip(statuses)
        .filter(|(_, status)| status.is_good())
        .map(|(id, _)| SubscriptionId(*id))
        .collect()
}

// =============================================================================
// Subscriptions
// =============================================================================

impl ClientSession {
    /// Creates a subscription and registers it with the publish engine.
    pub async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
    ) -> UaResult<CreateSubscriptionResponse> {
        let publishing_enabled = request.publishing_enabled;
        let response = self.transact(request).await?;

        let record = SubscriptionRecord::from_response(&response, publishing_enabled);
        tracing::debug!(
            subscription = %record.id,
            interval = ?record.publishing_interval,
            "Subscription created"
        );
        self.publish_engine().on_subscription_created(record);
        Ok(response)
    }

    /// Changes the parameters of a subscription.
    pub async fn modify_subscription(
        &self,
        request: ModifySubscriptionRequest,
    ) -> UaResult<ModifySubscriptionResponse> {
        self.transact(request).await
    }

    /// Deletes subscriptions and returns one status per id.
    pub async fn delete_subscriptions(
        &self,
        subscription_ids: impl Into<OneOrMany<u32>>,
    ) -> UaResult<OneOrMany<StatusCode>> {
        let subscription_ids: OneOrMany<u32> = subscription_ids.into();
        let (shape, subscription_ids) = subscription_ids.into_parts();

        let response = self
            .transact(DeleteSubscriptionsRequest {
                subscription_ids: subscription_ids.clone(),
                ..Default::default()
            })
            .await?;

        let statuses = shape.reshape("DeleteSubscriptions", response.results)?;
        let deleted = succeeded(&subscription_ids, statuses.iter());
        if !deleted.is_empty() {
            self.publish_engine().on_subscriptions_deleted(&deleted);
        }
        Ok(statuses)
    }

    /// Enables or disables publishing on subscriptions.
    pub async fn set_publishing_mode(
        &self,
        publishing_enabled: bool,
        subscription_ids: impl Into<OneOrMany<u32>>,
    ) -> UaResult<OneOrMany<StatusCode>> {
        let subscription_ids: OneOrMany<u32> = subscription_ids.into();
        let (shape, subscription_ids) = subscription_ids.into_parts();

        let response = self
            .transact(SetPublishingModeRequest {
                publishing_enabled,
                subscription_ids: subscription_ids.clone(),
                ..Default::default()
            })
            .await?;

        let statuses = shape.reshape("SetPublishingMode", response.results)?;
        let changed = succeeded(&subscription_ids, statuses.iter());
        if !changed.is_empty() {
            self.publish_engine()
                .on_publishing_mode_changed(&changed, publishing_enabled);
        }
        Ok(statuses)
    }

    /// Transfers subscriptions from another session to this one.
    ///
    /// Every result carries a (possibly empty) `available_sequence_numbers`
    /// array.
    pub async fn transfer_subscriptions(
        &self,
        subscription_ids: impl Into<OneOrMany<u32>>,
        send_initial_values: bool,
    ) -> UaResult<OneOrMany<TransferResult>> {
        let subscription_ids: OneOrMany<u32> = subscription_ids.into();
        let (shape, subscription_ids) = subscription_ids.into_parts();

        let response = self
            .transact(TransferSubscriptionsRequest {
                subscription_ids: subscription_ids.clone(),
                send_initial_values,
                ..Default::default()
            })
            .await?;

        let mut results = shape.reshape("TransferSubscriptions", response.results)?;
        results
            .as_mut_slice()
            .iter_mut()
            .for_each(|result| fill(&mut result.available_sequence_numbers));

        let transferred = succeeded(&subscription_ids, results.iter().map(|r| &r.status_code));
        if !transferred.is_empty() {
            self.publish_engine()
                .on_subscriptions_transferred(&transferred);
        }
        Ok(results)
    }

    // =========================================================================
    // Monitored items
    // =========================================================================

    /// Creates monitored items in a subscription.
    pub async fn create_monitored_items(
        &self,
        subscription_id: u32,
        timestamps_to_return: TimestampsToReturn,
        items: impl Into<OneOrMany<MonitoredItemCreateRequest>>,
    ) -> UaResult<OneOrMany<MonitoredItemCreateResult>> {
        let items: OneOrMany<MonitoredItemCreateRequest> = items.into();
        let (shape, items_to_create) = items.into_parts();

        let response = self
            .transact(CreateMonitoredItemsRequest {
                subscription_id,
                timestamps_to_return,
                items_to_create,
                ..Default::default()
            })
            .await?;

        let results = shape.reshape("CreateMonitoredItems", response.results)?;
        let created = results.iter().filter(|r| r.status_code.is_good()).count();
        if created > 0 {
            self.publish_engine()
                .on_monitored_items_changed(SubscriptionId(subscription_id), created as isize);
        }
        Ok(results)
    }

    /// Changes the parameters of monitored items.
    pub async fn modify_monitored_items(
        &self,
        subscription_id: u32,
        timestamps_to_return: TimestampsToReturn,
        items: impl Into<OneOrMany<MonitoredItemModifyRequest>>,
    ) -> UaResult<OneOrMany<MonitoredItemModifyResult>> {
        let items: OneOrMany<MonitoredItemModifyRequest> = items.into();
        let (shape, items_to_modify) = items.into_parts();

        let response = self
            .transact(ModifyMonitoredItemsRequest {
                subscription_id,
                timestamps_to_return,
                items_to_modify,
                ..Default::default()
            })
            .await?;

        shape.reshape("ModifyMonitoredItems", response.results)
    }

    /// Deletes monitored items from a subscription.
    pub async fn delete_monitored_items(
        &self,
        subscription_id: u32,
        monitored_item_ids: impl Into<OneOrMany<u32>>,
    ) -> UaResult<OneOrMany<StatusCode>> {
        let monitored_item_ids: OneOrMany<u32> = monitored_item_ids.into();
        let (shape, monitored_item_ids) = monitored_item_ids.into_parts();

        let response = self
            .transact(DeleteMonitoredItemsRequest {
                subscription_id,
                monitored_item_ids,
                ..Default::default()
            })
            .await?;

        let statuses = shape.reshape("DeleteMonitoredItems", response.results)?;
        let deleted = statuses.iter().filter(|s| s.is_good()).count();
        if deleted > 0 {
            self.publish_engine()
                .on_monitored_items_changed(SubscriptionId(subscription_id), -(deleted as isize));
        }
        Ok(statuses)
    }

    /// Sets the monitoring mode of monitored items.
    pub async fn set_monitoring_mode(
        &self,
        subscription_id: u32,
        monitoring_mode: MonitoringMode,
        monitored_item_ids: impl Into<OneOrMany<u32>>,
    ) -> UaResult<OneOrMany<StatusCode>> {
        let monitored_item_ids: OneOrMany<u32> = monitored_item_ids.into();
        let (shape, monitored_item_ids) = monitored_item_ids.into_parts();

        let response = self
            .transact(SetMonitoringModeRequest {
                subscription_id,
                monitoring_mode,
                monitored_item_ids,
                ..Default::default()
            })
            .await?;

        shape.reshape("SetMonitoringMode", response.results)
    }

    /// Adds and removes triggering links of a monitored item.
    pub async fn set_triggering(
        &self,
        subscription_id: u32,
        triggering_item_id: u32,
        links_to_add: Vec<u32>,
        links_to_remove: Vec<u32>,
    ) -> UaResult<SetTriggeringResult> {
        let add = Shape::Array(links_to_add.len());
        let remove = Shape::Array(links_to_remove.len());

        let response = self
            .transact(SetTriggeringRequest {
                subscription_id,
                triggering_item_id,
                links_to_add,
                links_to_remove,
                ..Default::default()
            })
            .await?;

        Ok(SetTriggeringResult {
            add_results: add.reshape("SetTriggering", response.add_results)?.into_vec(),
            remove_results: remove
                .reshape("SetTriggering", response.remove_results)?
                .into_vec(),
        })
    }

    // =========================================================================
    // Publish
    // =========================================================================

    /// Sends a Publish request.
    ///
    /// Publish bypasses the pending queue and the repair coordinator; a
    /// publish engine is expected to keep its own requests outstanding.
    pub async fn publish(
        &self,
        subscription_acknowledgements: Vec<SubscriptionAcknowledgement>,
    ) -> UaResult<PublishResponse> {
        let mut response = self
            .transact(PublishRequest {
                subscription_acknowledgements,
                ..Default::default()
            })
            .await?;
        fill(&mut response.available_sequence_numbers);
        fill(&mut response.results);
        Ok(response)
    }

    /// Asks the server to resend a notification message.
    pub async fn republish(
        &self,
        subscription_id: u32,
        retransmit_sequence_number: u32,
    ) -> UaResult<NotificationMessage> {
        let response = self
            .transact(RepublishRequest {
                subscription_id,
                retransmit_sequence_number,
                ..Default::default()
            })
            .await?;
        Ok(response.notification_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{
        DeleteMonitoredItemsResponse, DeleteSubscriptionsResponse, Request, ResponseHeader,
        SetTriggeringResponse, CreateMonitoredItemsResponse,
    };
    use crate::testing::{session_with, ScriptedChannel};

    fn created(id: u32) -> CreateSubscriptionResponse {
        CreateSubscriptionResponse {
            header: ResponseHeader::good(),
            subscription_id: id,
            revised_publishing_interval: 500.0,
            revised_lifetime_count: 60,
            revised_max_keep_alive_count: 10,
        }
    }

    #[tokio::test]
    async fn test_subscription_lifecycle_reaches_engine() {
        let channel = ScriptedChannel::new();
        channel.respond(created(7));
        channel.respond(created(8));
        channel.respond(DeleteSubscriptionsResponse {
            header: ResponseHeader::good(),
            results: Some(vec![StatusCode::Good, StatusCode::BadSubscriptionIdInvalid]),
            diagnostic_infos: None,
        });
        let (session, _owner) = session_with(channel);

        session
            .create_subscription(CreateSubscriptionRequest::default())
            .await
            .unwrap();
        session
            .create_subscription(CreateSubscriptionRequest::default())
            .await
            .unwrap();
        assert_eq!(session.publish_engine().subscription_count(), 2);

        let statuses = session.delete_subscriptions(vec![7u32, 99]).await.unwrap();
        assert_eq!(statuses.len(), 2);
        assert_eq!(session.publish_engine().subscription_count(), 1);
    }

    #[tokio::test]
    async fn test_scalar_delete_monitored_item() {
        let channel = ScriptedChannel::new();
        channel.respond(DeleteMonitoredItemsResponse {
            header: ResponseHeader::good(),
            results: Some(vec![StatusCode::Good]),
            diagnostic_infos: None,
        });
        let (session, _owner) = session_with(channel);

        let status = session.delete_monitored_items(7, 3u32).await.unwrap();
        assert_eq!(status, OneOrMany::One(StatusCode::Good));
    }

    #[tokio::test]
    async fn test_create_monitored_items_keeps_order() {
        let channel = ScriptedChannel::new();
        channel.respond(CreateMonitoredItemsResponse {
            header: ResponseHeader::good(),
            results: Some(vec![
                MonitoredItemCreateResult {
                    monitored_item_id: 1,
                    ..Default::default()
                },
                MonitoredItemCreateResult {
                    monitored_item_id: 2,
                    ..Default::default()
                },
            ]),
            diagnostic_infos: None,
        });
        let (session, _owner) = session_with(channel.clone());

        let items = vec![
            MonitoredItemCreateRequest::default(),
            MonitoredItemCreateRequest::default(),
        ];
        let results = session
            .create_monitored_items(7, TimestampsToReturn::Both, items)
            .await
            .unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.monitored_item_id).collect();
        assert_eq!(ids, vec![1, 2]);

        match &channel.requests()[0] {
            Request::CreateMonitoredItems(request) => assert_eq!(request.subscription_id, 7),
            other => panic!("unexpected request {:?}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_set_triggering_pads_each_list() {
        let channel = ScriptedChannel::new();
        channel.respond(SetTriggeringResponse {
            header: ResponseHeader::good(),
            add_results: Some(vec![StatusCode::Good]),
            ..Default::default()
        });
        let (session, _owner) = session_with(channel);

        let result = session
            .set_triggering(7, 1, vec![2, 3], vec![4])
            .await
            .unwrap();
        assert_eq!(result.add_results, vec![StatusCode::Good, StatusCode::BadNoData]);
        assert_eq!(result.remove_results, vec![StatusCode::BadNoData]);
    }

    #[tokio::test]
    async fn test_omitted_delete_results_keep_subscription_tracked() {
        let channel = ScriptedChannel::new();
        channel.respond(created(7));
        channel.respond(DeleteSubscriptionsResponse {
            header: ResponseHeader::good(),
            results: None,
            diagnostic_infos: None,
        });
        let (session, _owner) = session_with(channel);

        session
            .create_subscription(CreateSubscriptionRequest::default())
            .await
            .unwrap();
        let status = session.delete_subscriptions(7u32).await.unwrap();

        assert_eq!(status, OneOrMany::One(StatusCode::BadNoData));
        assert_eq!(session.publish_engine().subscription_count(), 1);
    }
}
