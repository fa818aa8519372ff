use serde::Serialize;
use tracing::debug;

use crate::render::render_match;
use crate::session::{IgnoreReason, ReactionOutcome};
use crate::transport::{ChannelId, ChatTransport, MessageId, ReactionAdded};

use super::{ControlError, ReflectControlPlane};

/// Result of routing one reaction event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReactionDispatch {
    Resolved {
        channel: ChannelId,
        prompt: MessageId,
        message: MessageId,
        choice: usize,
        fqn: String,
    },
    Ignored {
        reason: IgnoreReason,
    },
}

impl<T: ChatTransport> ReflectControlPlane<T> {
    /// Routes a reaction to the session owning the reacted message and sends
    /// the picked candidate as a new document in the prompt's channel.
    ///
    /// # Errors
    /// Returns `ControlError::Transport` if the rendered document cannot be
    /// sent. The session is already resolved at that point.
    pub async fn handle_reaction(
        &self,
        event: &ReactionAdded,
    ) -> Result<ReactionDispatch, ControlError> {
        match self
            .sessions()
            .dispatch(event, &self.identity().user_id)
            .await
        {
            ReactionOutcome::Resolved(selection) => {
                let document = render_match(&selection.result, selection.view);
                let sent = self
                    .transport()
                    .send_document(&selection.prompt.channel, &document)
                    .await?;
                Ok(ReactionDispatch::Resolved {
                    channel: selection.prompt.channel,
                    prompt: selection.prompt.id,
                    message: sent.id,
                    choice: selection.index + 1,
                    fqn: selection.result.fqn().to_string(),
                })
            }
            ReactionOutcome::Ignored(reason) => {
                debug!(message = %event.message_id, ?reason, "reaction ignored");
                Ok(ReactionDispatch::Ignored { reason })
            }
        }
    }
}
