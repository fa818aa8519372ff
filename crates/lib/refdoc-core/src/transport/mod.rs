//! Chat transport seam.
//!
//! The engine never talks to a chat service directly. It sends through a
//! [`ChatTransport`] and receives [`InboundMessage`] and [`ReactionAdded`]
//! events from whoever drives it.

use std::future::Future;
use std::{error::Error, fmt};

use serde::{Deserialize, Serialize};

use crate::render::DisplayDocument;

pub mod local;

pub use local::{LocalTransport, OutboundBody, OutboundMessage};

/// Keycap markers offered for choices 1 through 9, in order.
pub const NUMBER_MARKERS: [&str; 9] = [
    "1\u{fe0f}\u{20e3}",
    "2\u{fe0f}\u{20e3}",
    "3\u{fe0f}\u{20e3}",
    "4\u{fe0f}\u{20e3}",
    "5\u{fe0f}\u{20e3}",
    "6\u{fe0f}\u{20e3}",
    "7\u{fe0f}\u{20e3}",
    "8\u{fe0f}\u{20e3}",
    "9\u{fe0f}\u{20e3}",
];

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a chat message.
    MessageId
);
string_id!(
    /// Identifier of a channel or conversation.
    ChannelId
);
string_id!(
    /// Identifier of a chat user, including the bot itself.
    UserId
);

/// A message the transport has delivered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHandle {
    pub id: MessageId,
    pub channel: ChannelId,
}

impl MessageHandle {
    #[must_use]
    pub fn new(id: impl Into<MessageId>, channel: impl Into<ChannelId>) -> Self {
        Self {
            id: id.into(),
            channel: channel.into(),
        }
    }
}

/// Inbound chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: MessageId,
    pub channel: ChannelId,
    pub author: UserId,
    pub content: String,
}

impl InboundMessage {
    #[must_use]
    pub fn handle(&self) -> MessageHandle {
        MessageHandle {
            id: self.id.clone(),
            channel: self.channel.clone(),
        }
    }
}

/// A reaction marker was added to a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionAdded {
    pub message_id: MessageId,
    pub user_id: UserId,
    pub marker: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    SendFailed(String),
    MessageNotFound(MessageId),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed(message) => write!(f, "failed to send message: {message}"),
            Self::MessageNotFound(id) => write!(f, "message not found: {id}"),
        }
    }
}

impl Error for TransportError {}

/// Outbound half of a chat service.
pub trait ChatTransport: Send + Sync + 'static {
    /// Sends plain text to a channel.
    fn send_text(
        &self,
        channel: &ChannelId,
        text: &str,
    ) -> impl Future<Output = Result<MessageHandle, TransportError>> + Send;

    /// Sends a rendered document to a channel.
    fn send_document(
        &self,
        channel: &ChannelId,
        document: &DisplayDocument,
    ) -> impl Future<Output = Result<MessageHandle, TransportError>> + Send;

    /// Adds a selectable marker to a delivered message.
    fn attach_marker(
        &self,
        message: &MessageHandle,
        marker: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Replies to a delivered message in its channel.
    fn reply(
        &self,
        message: &MessageHandle,
        text: &str,
    ) -> impl Future<Output = Result<MessageHandle, TransportError>> + Send;
}
