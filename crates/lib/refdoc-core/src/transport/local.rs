//! In-process transport that records outbound traffic.
//!
//! Surfaces that cannot push messages themselves (MCP tools, the HTTP
//! gateway) run the engine against this transport and hand the recorded
//! messages back to their caller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ChannelId, ChatTransport, MessageHandle, MessageId, TransportError};
use crate::render::DisplayDocument;

/// Content of a recorded message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundBody {
    Text { text: String },
    Document { document: DisplayDocument },
}

/// A message the engine sent through the local transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundMessage {
    pub id: MessageId,
    pub channel: ChannelId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
    pub body: OutboundBody,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<String>,
    pub sent_at: DateTime<Utc>,
}

impl OutboundMessage {
    #[must_use]
    pub fn handle(&self) -> MessageHandle {
        MessageHandle {
            id: self.id.clone(),
            channel: self.channel.clone(),
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            OutboundBody::Text { text } => Some(text),
            OutboundBody::Document { .. } => None,
        }
    }

    #[must_use]
    pub fn document(&self) -> Option<&DisplayDocument> {
        match &self.body {
            OutboundBody::Document { document } => Some(document),
            OutboundBody::Text { .. } => None,
        }
    }
}

/// Recording transport.
#[derive(Debug, Default)]
pub struct LocalTransport {
    outbox: Mutex<Vec<OutboundMessage>>,
    fail_sends: Arc<AtomicBool>,
}

impl LocalTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport with its own empty outbox that shares this transport's
    /// failure switch. Each request of a surface records on its own scope.
    #[must_use]
    pub fn request_scope(&self) -> Self {
        Self {
            outbox: Mutex::default(),
            fail_sends: Arc::clone(&self.fail_sends),
        }
    }

    /// Makes every subsequent operation fail with `TransportError::SendFailed`.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Removes and returns the recorded messages of one channel, oldest first.
    pub async fn drain_channel(&self, channel: &ChannelId) -> Vec<OutboundMessage> {
        let mut outbox = self.outbox.lock().await;
        let (drained, kept): (Vec<_>, Vec<_>) = outbox
            .drain(..)
            .partition(|message| &message.channel == channel);
        *outbox = kept;
        drained
    }

    /// Removes and returns every recorded message, oldest first.
    pub async fn take_all(&self) -> Vec<OutboundMessage> {
        std::mem::take(&mut *self.outbox.lock().await)
    }

    /// Copies every recorded message without draining.
    pub async fn snapshot(&self) -> Vec<OutboundMessage> {
        self.outbox.lock().await.clone()
    }

    fn check_available(&self) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::SendFailed(
                "local transport is failing sends".to_string(),
            ));
        }
        Ok(())
    }

    async fn record(
        &self,
        channel: &ChannelId,
        reply_to: Option<MessageId>,
        body: OutboundBody,
    ) -> Result<MessageHandle, TransportError> {
        self.check_available()?;
        let message = OutboundMessage {
            id: MessageId::new(Uuid::new_v4().to_string()),
            channel: channel.clone(),
            reply_to,
            body,
            markers: Vec::new(),
            sent_at: Utc::now(),
        };
        let handle = message.handle();
        self.outbox.lock().await.push(message);
        Ok(handle)
    }
}

impl ChatTransport for LocalTransport {
    async fn send_text(
        &self,
        channel: &ChannelId,
        text: &str,
    ) -> Result<MessageHandle, TransportError> {
        self.record(
            channel,
            None,
            OutboundBody::Text {
                text: text.to_string(),
            },
        )
        .await
    }

    async fn send_document(
        &self,
        channel: &ChannelId,
        document: &DisplayDocument,
    ) -> Result<MessageHandle, TransportError> {
        self.record(
            channel,
            None,
            OutboundBody::Document {
                document: document.clone(),
            },
        )
        .await
    }

    async fn attach_marker(
        &self,
        message: &MessageHandle,
        marker: &str,
    ) -> Result<(), TransportError> {
        self.check_available()?;
        let mut outbox = self.outbox.lock().await;
        let recorded = outbox
            .iter_mut()
            .find(|recorded| recorded.id == message.id)
            .ok_or_else(|| TransportError::MessageNotFound(message.id.clone()))?;
        if !recorded.markers.iter().any(|existing| existing == marker) {
            recorded.markers.push(marker.to_string());
        }
        Ok(())
    }

    async fn reply(
        &self,
        message: &MessageHandle,
        text: &str,
    ) -> Result<MessageHandle, TransportError> {
        self.record(
            &message.channel,
            Some(message.id.clone()),
            OutboundBody::Text {
                text: text.to_string(),
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_and_drains_per_channel() {
        let transport = LocalTransport::new();
        let general = ChannelId::from("general");
        let other = ChannelId::from("other");

        let sent = transport
            .send_text(&general, "hello")
            .await
            .expect("send should succeed");
        let reply = transport
            .reply(&sent, "world")
            .await
            .expect("reply should succeed");
        transport
            .attach_marker(&reply, "1\u{fe0f}\u{20e3}")
            .await
            .expect("marker should attach");
        transport
            .send_document(&other, &DisplayDocument::new("title", "body"))
            .await
            .expect("document should send");

        let drained = transport.drain_channel(&general).await;
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].text(), Some("hello"));
        assert_eq!(drained[1].reply_to.as_ref(), Some(&sent.id));
        assert_eq!(drained[1].markers.len(), 1);

        let remaining = transport.snapshot().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(
            remaining[0].document().map(|doc| doc.title.as_str()),
            Some("title")
        );
    }

    #[tokio::test]
    async fn failing_transport_rejects_sends() {
        let transport = LocalTransport::new();
        transport.set_fail_sends(true);
        let err = transport
            .send_text(&ChannelId::from("general"), "hello")
            .await
            .expect_err("send should fail");
        assert!(matches!(err, TransportError::SendFailed(_)));
        assert!(transport.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn request_scopes_keep_their_own_outbox() {
        let shared = LocalTransport::new();
        let first = shared.request_scope();
        let second = shared.request_scope();
        let general = ChannelId::from("general");

        let prompt = first
            .send_text(&general, "first")
            .await
            .expect("send should succeed");
        second
            .send_text(&general, "second")
            .await
            .expect("send should succeed");
        second
            .attach_marker(&prompt, "1\u{fe0f}\u{20e3}")
            .await
            .expect_err("markers only attach to messages of the same scope");

        let taken = first.take_all().await;
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].text(), Some("first"));
        assert!(first.take_all().await.is_empty());
        assert_eq!(second.snapshot().await.len(), 1);
        assert!(shared.snapshot().await.is_empty());

        shared.set_fail_sends(true);
        assert!(first.send_text(&general, "later").await.is_err());
    }

    #[tokio::test]
    async fn markers_require_a_recorded_message() {
        let transport = LocalTransport::new();
        let err = transport
            .attach_marker(&MessageHandle::new("missing", "general"), "x")
            .await
            .expect_err("unknown message should fail");
        assert_eq!(err, TransportError::MessageNotFound(MessageId::from("missing")));
    }
}
