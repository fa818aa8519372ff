use std::{error::Error, fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::index::SymbolIndex;
use crate::services::SessionRegistry;
use crate::session::SessionError;
use crate::transport::{ChannelId, ChatTransport, InboundMessage, MessageId, TransportError, UserId};

pub mod help;
pub mod reaction;
pub mod reflect;

pub use help::{COMMANDS, CommandHelp, REFLECT_HELP, help_document};
pub use reaction::ReactionDispatch;
pub use reflect::{
    NO_RESULTS_TEXT,
    ReflectOutcome,
    TOO_MANY_RESULTS_TEXT,
    UNAVAILABLE_TEXT,
    usage_text,
};

#[derive(Debug)]
pub enum ControlError {
    Transport(TransportError),
    Session(SessionError),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControlError {}

impl From<TransportError> for ControlError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

impl From<SessionError> for ControlError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Transport(err) => Self::Transport(err),
            other => Self::Session(other),
        }
    }
}

/// Who the bot is on the chat service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub user_id: UserId,
    pub username: String,
}

impl BotIdentity {
    #[must_use]
    pub fn new(user_id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
        }
    }

    /// True when `content` starts with a mention of the bot.
    #[must_use]
    pub fn is_mentioned_by(&self, content: &str) -> bool {
        let id = self.user_id.as_str();
        content.starts_with(&format!("<@{id}>")) || content.starts_with(&format!("<@!{id}>"))
    }
}

/// What a chat message turned into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CommandOutcome {
    NotACommand,
    Help { message: MessageId },
    Reflect(ReflectOutcome),
}

/// Command dispatcher for the reflect feature.
pub struct ReflectControlPlane<T: ChatTransport> {
    index: Option<Arc<SymbolIndex>>,
    transport: Arc<T>,
    sessions: SessionRegistry,
    identity: BotIdentity,
    help_title: String,
}

impl<T: ChatTransport> Clone for ReflectControlPlane<T> {
    fn clone(&self) -> Self {
        Self {
            index: self.index.clone(),
            transport: self.transport.clone(),
            sessions: self.sessions.clone(),
            identity: self.identity.clone(),
            help_title: self.help_title.clone(),
        }
    }
}

impl<T: ChatTransport> ReflectControlPlane<T> {
    /// Creates a control plane with no index, which answers every query as
    /// unavailable until one is attached.
    pub fn new(transport: Arc<T>, identity: BotIdentity) -> Self {
        let help_title = identity.username.clone();
        Self {
            index: None,
            transport,
            sessions: SessionRegistry::default(),
            identity,
            help_title,
        }
    }

    #[must_use]
    pub fn with_index(mut self, index: Arc<SymbolIndex>) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn with_sessions(mut self, sessions: SessionRegistry) -> Self {
        self.sessions = sessions;
        self
    }

    #[must_use]
    pub fn with_help_title(mut self, help_title: impl Into<String>) -> Self {
        self.help_title = help_title.into();
        self
    }

    /// Same index, sessions and identity, speaking through another transport.
    #[must_use]
    pub fn with_transport<U: ChatTransport>(&self, transport: Arc<U>) -> ReflectControlPlane<U> {
        ReflectControlPlane {
            index: self.index.clone(),
            transport,
            sessions: self.sessions.clone(),
            identity: self.identity.clone(),
            help_title: self.help_title.clone(),
        }
    }

    pub fn index(&self) -> Option<&Arc<SymbolIndex>> {
        self.index.as_ref()
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub fn help_title(&self) -> &str {
        &self.help_title
    }

    /// Routes a chat message to its command.
    ///
    /// Only messages that start with a mention of the bot are commands. The
    /// words after the mention are split on single spaces.
    ///
    /// # Errors
    /// Returns `ControlError` if a reply cannot be delivered.
    pub async fn handle_message(
        &self,
        message: &InboundMessage,
    ) -> Result<CommandOutcome, ControlError> {
        if !self.identity.is_mentioned_by(&message.content) {
            return Ok(CommandOutcome::NotACommand);
        }

        let mut words = message.content.split(' ').skip(1);
        match words.next() {
            Some("reflect") => {
                let args: Vec<&str> = words.collect();
                debug!(channel = %message.channel, ?args, "reflect command");
                let outcome = self.reflect(&message.handle(), &args).await?;
                Ok(CommandOutcome::Reflect(outcome))
            }
            command => {
                debug!(channel = %message.channel, ?command, "unknown command, sending help");
                let sent = self.send_help(&message.channel).await?;
                Ok(CommandOutcome::Help { message: sent })
            }
        }
    }

    /// Sends the help document to a channel.
    ///
    /// # Errors
    /// Returns `ControlError::Transport` if the document cannot be sent.
    pub async fn send_help(&self, channel: &ChannelId) -> Result<MessageId, ControlError> {
        let document = help_document(&self.help_title, &self.identity);
        let sent = self.transport.send_document(channel, &document).await?;
        Ok(sent.id)
    }
}
