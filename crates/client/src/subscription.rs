//! Websocket subscriptions.
//!
//! [`subscribe`] creates a Subscription resource, then runs a background task that
//! binds a websocket to it and forwards notifications. When the socket closes the
//! task emits [`SubscriptionEvent::Closed`], waits the configured reconnect delay,
//! fetches a fresh binding token and connects again. Dropping the
//! [`SubscriptionHandle`] stops the task.

use crate::http::HttpResourceClient;
use crate::ClientResult;
use fhir::{NotificationData, Subscription};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

const REASON: &str = "medview";
const CHANNEL_CAPACITY: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// The websocket is connected and bound.
    Open,
    Notification(NotificationData),
    /// The websocket closed; a reconnect will follow.
    Closed,
}

/// A running subscription. Events arrive in order; dropping the handle stops it.
#[derive(Debug)]
pub struct SubscriptionHandle {
    subscription_id: String,
    events: mpsc::Receiver<SubscriptionEvent>,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    /// Wait for the next event. Returns `None` once the background task has ended.
    pub async fn next(&mut self) -> Option<SubscriptionEvent> {
        self.events.recv().await
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Subscribe to changes matching `criteria`, e.g. `Patient?name=Mary`.
///
/// # Errors
///
/// Fails if the criteria is malformed or the Subscription cannot be created.
/// Connection failures after that are reported as [`SubscriptionEvent::Closed`].
pub async fn subscribe(
    client: &HttpResourceClient,
    criteria: &str,
) -> ClientResult<SubscriptionHandle> {
    let resource = Subscription::render_websocket(criteria, REASON)?;
    let created = client
        .create_resource(Subscription::RESOURCE_TYPE, &resource)
        .await?;
    let subscription_id = Subscription::created_id(&created)?;
    tracing::info!(%subscription_id, criteria, "subscription created");

    let (tx, events) = mpsc::channel(CHANNEL_CAPACITY);
    let task = tokio::spawn(run(client.clone(), subscription_id.clone(), tx));

    Ok(SubscriptionHandle {
        subscription_id,
        events,
        task,
    })
}

async fn run(
    client: HttpResourceClient,
    subscription_id: String,
    tx: mpsc::Sender<SubscriptionEvent>,
) {
    let delay = client.options().reconnect_delay;
    loop {
        match connect_once(&client, &subscription_id, &tx).await {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                tracing::warn!(%subscription_id, error = %e, "subscription connection failed")
            }
        }
        if tx.send(SubscriptionEvent::Closed).await.is_err() {
            return;
        }
        tracing::debug!(%subscription_id, ?delay, "reconnecting");
        tokio::time::sleep(delay).await;
    }
}

/// One bound websocket session. Returns `Ok(false)` when nobody is listening anymore.
async fn connect_once(
    client: &HttpResourceClient,
    subscription_id: &str,
    tx: &mpsc::Sender<SubscriptionEvent>,
) -> ClientResult<bool> {
    let binding = client
        .get_fhir(&format!(
            "{}/{subscription_id}/$get-ws-binding-token",
            Subscription::RESOURCE_TYPE
        ))
        .await?;
    let binding = Subscription::binding_token(binding)?;

    let (mut socket, _) = tokio_tungstenite::connect_async(binding.websocket_url.as_str()).await?;
    socket
        .send(Message::Text(Subscription::bind_message(&binding.token)))
        .await?;
    if tx.send(SubscriptionEvent::Open).await.is_err() {
        return Ok(false);
    }

    while let Some(message) = socket.next().await {
        match message? {
            Message::Text(text) => match Subscription::notification(&text) {
                Ok(note) => {
                    if tx.send(SubscriptionEvent::Notification(note)).await.is_err() {
                        return Ok(false);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "ignoring undecodable notification"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(true)
}
