//! Websocket Subscription resources and notification payloads.
//!
//! Subscribing is a three-step exchange:
//! 1. create a `Subscription` with a websocket channel for a criteria string,
//! 2. ask the server for a binding token (`$get-ws-binding-token`), which answers
//!    with a `Parameters` resource carrying the token and websocket URL,
//! 3. bind the websocket with the token and receive notification Bundles.
//!
//! This module renders step 1 and decodes the payloads of steps 2 and 3.

use crate::{decode_wire, expect_resource_type, resource_type_of, FhirError, FhirResult};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Binding token answer from `$get-ws-binding-token`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingToken {
    pub token: String,
    pub websocket_url: String,
    pub expiration: Option<String>,
}

/// Kind of message received on a bound subscription websocket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Handshake,
    Heartbeat,
    EventNotification,
    QueryStatus,
    QueryEvent,
    Other(String),
}

impl NotificationKind {
    fn from_wire(s: &str) -> Self {
        match s {
            "handshake" => NotificationKind::Handshake,
            "heartbeat" => NotificationKind::Heartbeat,
            "event-notification" => NotificationKind::EventNotification,
            "query-status" => NotificationKind::QueryStatus,
            "query-event" => NotificationKind::QueryEvent,
            other => NotificationKind::Other(other.to_owned()),
        }
    }
}

/// A decoded websocket notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotificationData {
    pub kind: NotificationKind,
    /// Subscription reference from the SubscriptionStatus, if present.
    pub subscription: Option<String>,
    /// `resourceType/id` of each changed resource carried in the bundle.
    pub focus: Vec<String>,
}

/// Subscription operations.
pub struct Subscription;

impl Subscription {
    pub const RESOURCE_TYPE: &'static str = "Subscription";

    /// Render a websocket Subscription for `criteria` (for example `Patient?name=Mary`).
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::InvalidInput`] if the criteria does not start with a
    /// resource type.
    pub fn render_websocket(criteria: &str, reason: &str) -> FhirResult<serde_json::Value> {
        let resource_type = criteria.split('?').next().unwrap_or_default();
        if !resource_type
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase())
        {
            return Err(FhirError::InvalidInput(format!(
                "subscription criteria must start with a resource type: {criteria:?}"
            )));
        }

        let wire = SubscriptionWire {
            resource_type: Self::RESOURCE_TYPE.into(),
            status: "active".into(),
            reason: reason.into(),
            criteria: criteria.into(),
            channel: ChannelWire {
                channel_type: "websocket".into(),
            },
        };
        Ok(serde_json::to_value(&wire)?)
    }

    /// Extract the server-assigned id from a created Subscription.
    pub fn created_id(value: &serde_json::Value) -> FhirResult<String> {
        if resource_type_of(value) != Some(Self::RESOURCE_TYPE) {
            return Err(FhirError::InvalidInput(
                "expected a Subscription in the create response".into(),
            ));
        }
        value
            .get("id")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| FhirError::InvalidInput("created Subscription has no id".into()))
    }

    /// Decode the `Parameters` answer of `$get-ws-binding-token`.
    pub fn binding_token(value: serde_json::Value) -> FhirResult<BindingToken> {
        let wire: ParametersWire = decode_wire(value, "Parameters")?;
        expect_resource_type(&wire.resource_type, "Parameters")?;

        let find = |name: &str| {
            wire.parameter
                .iter()
                .find(|p| p.name == name)
                .and_then(|p| p.value_string.clone().or_else(|| p.value_url.clone()))
        };

        let token = find("token")
            .ok_or_else(|| FhirError::InvalidInput("binding response has no token".into()))?;
        let websocket_url = find("websocket-url").ok_or_else(|| {
            FhirError::InvalidInput("binding response has no websocket-url".into())
        })?;
        let expiration = wire
            .parameter
            .iter()
            .find(|p| p.name == "expiration")
            .and_then(|p| p.value_date_time.clone());

        Ok(BindingToken {
            token,
            websocket_url,
            expiration,
        })
    }

    /// The text frame that binds a websocket to a subscription.
    pub fn bind_message(token: &str) -> String {
        json!({"type": "bind-with-token", "payload": {"token": token}}).to_string()
    }

    /// Decode a notification Bundle received on the websocket.
    ///
    /// The first entry is a `SubscriptionStatus` naming the notification kind; the
    /// remaining entries are the changed resources.
    pub fn notification(text: &str) -> FhirResult<NotificationData> {
        let value: serde_json::Value = serde_json::from_str(text)?;
        let wire: NotificationBundleWire = decode_wire(value, "Bundle")?;
        expect_resource_type(&wire.resource_type, "Bundle")?;

        let mut entries = wire.entry.into_iter().filter_map(|e| e.resource);
        let status = entries
            .next()
            .ok_or_else(|| FhirError::InvalidInput("notification bundle is empty".into()))?;
        let status: SubscriptionStatusWire = decode_wire(status, "SubscriptionStatus")?;
        expect_resource_type(&status.resource_type, "SubscriptionStatus")?;

        let focus = entries
            .filter_map(|r| {
                let rt = resource_type_of(&r)?.to_owned();
                let id = r.get("id")?.as_str()?.to_owned();
                Some(format!("{rt}/{id}"))
            })
            .collect();

        Ok(NotificationData {
            kind: NotificationKind::from_wire(&status.status_type),
            subscription: status.subscription.and_then(|s| s.reference),
            focus,
        })
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Serialize)]
struct SubscriptionWire {
    #[serde(rename = "resourceType")]
    resource_type: String,
    status: String,
    reason: String,
    criteria: String,
    channel: ChannelWire,
}

#[derive(Debug, Serialize)]
struct ChannelWire {
    #[serde(rename = "type")]
    channel_type: String,
}

#[derive(Debug, Deserialize)]
struct ParametersWire {
    #[serde(rename = "resourceType")]
    resource_type: String,
    #[serde(default)]
    parameter: Vec<ParameterWire>,
}

#[derive(Debug, Deserialize)]
struct ParameterWire {
    name: String,
    #[serde(rename = "valueString", default)]
    value_string: Option<String>,
    #[serde(rename = "valueUrl", default)]
    value_url: Option<String>,
    #[serde(rename = "valueDateTime", default)]
    value_date_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NotificationBundleWire {
    #[serde(rename = "resourceType")]
    resource_type: String,
    #[serde(default)]
    entry: Vec<NotificationEntryWire>,
}

#[derive(Debug, Deserialize)]
struct NotificationEntryWire {
    #[serde(default)]
    resource: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionStatusWire {
    #[serde(rename = "resourceType")]
    resource_type: String,
    #[serde(rename = "type")]
    status_type: String,
    #[serde(default)]
    subscription: Option<crate::datatypes::ReferenceWire>,
}
