/// Progress hub: per-user fan-out of video processing events
///
/// Each user id maps to one broadcast channel. Every open event stream of
/// that user holds a [`Subscription`]; the channel is removed when the last
/// subscription is dropped, and publishing to a user with no open streams
/// drops the event.
use std::convert::Infallible;
use std::sync::{Arc, Weak};

use bytes::Bytes;
use dashmap::DashMap;
use futures::Stream;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use uuid::Uuid;
use video_core::ProgressEvent;

/// Buffered events per user before slow receivers start lagging
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct ProgressHub {
    channels: Arc<Channels>,
    capacity: usize,
}

impl Default for ProgressHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl ProgressHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Open a subscription for `user_id`, creating the channel on first use.
    pub fn subscribe(&self, user_id: Uuid) -> Subscription {
        let receiver = self
            .channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe();

        Subscription {
            user_id,
            receiver: Some(receiver),
            channels: Arc::downgrade(&self.channels),
        }
    }

    /// Deliver `event` to every open stream of `user_id`.
    ///
    /// Returns the number of receivers reached.
    pub fn publish(&self, user_id: Uuid, event: ProgressEvent) -> usize {
        let delivered = match self.channels.get(&user_id) {
            Some(sender) => sender.send(event).unwrap_or(0),
            None => 0,
        };

        if delivered == 0 {
            self.channels
                .remove_if(&user_id, |_, sender| sender.receiver_count() == 0);
        }
        delivered
    }

    pub fn subscriber_count(&self, user_id: Uuid) -> usize {
        self.channels
            .get(&user_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

type Channels = DashMap<Uuid, broadcast::Sender<ProgressEvent>>;

/// One open event stream. Dropping the last subscription of a user removes
/// that user's channel from the hub.
pub struct Subscription {
    user_id: Uuid,
    receiver: Option<broadcast::Receiver<ProgressEvent>>,
    // Weak so open streams do not keep a dropped hub's channels alive
    channels: Weak<Channels>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Result<ProgressEvent, RecvError> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.recv().await,
            None => Err(RecvError::Closed),
        }
    }

    pub fn try_recv(&mut self) -> Result<ProgressEvent, TryRecvError> {
        match self.receiver.as_mut() {
            Some(receiver) => receiver.try_recv(),
            None => Err(TryRecvError::Closed),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        drop(self.receiver.take());
        if let Some(channels) = self.channels.upgrade() {
            channels.remove_if(&self.user_id, |_, sender| sender.receiver_count() == 0);
        }
    }
}

/// Encode one event as a server-sent-events frame.
pub fn sse_frame(event: &ProgressEvent) -> Result<Bytes, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(Bytes::from(format!("data: {json}\n\n")))
}

/// Turn a subscription into an SSE body. Ends when the channel closes; events
/// missed by a lagging receiver are skipped.
pub fn sse_stream(
    subscription: Subscription,
) -> impl Stream<Item = Result<Bytes, Infallible>> {
    futures::stream::unfold(subscription, |mut subscription| async move {
        loop {
            match subscription.recv().await {
                Ok(event) => match sse_frame(&event) {
                    Ok(frame) => return Some((Ok(frame), subscription)),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to encode progress event");
                    }
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "progress stream lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}
