use serde::Serialize;
use tracing::{debug, warn};

use crate::render::render_match;
use crate::resolve::{Resolution, ViewKind, resolve};
use crate::session::DisambiguationSession;
use crate::transport::{ChatTransport, MessageHandle, MessageId};

use super::{BotIdentity, ControlError, ReflectControlPlane};

pub const NO_RESULTS_TEXT: &str = "No results found.";
pub const TOO_MANY_RESULTS_TEXT: &str = "Too many results, please narrow your search.";
pub const UNAVAILABLE_TEXT: &str = "Documentation index is unavailable.";

/// Result of one `reflect` invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReflectOutcome {
    Usage,
    Unavailable,
    NoResults,
    Rendered { message: MessageId },
    TooManyResults { count: usize },
    AwaitingSelection { prompt: MessageId },
}

/// Usage reply for a bare `reflect`.
#[must_use]
pub fn usage_text(identity: &BotIdentity) -> String {
    let name = &identity.username;
    format!(
        "Usage:\n```\n\
         @{name} reflect <methods|properties> <class_name>\n\
         @{name} reflect <method_name>\n\
         ```\n\
         Examples:\n```\n\
         @{name} reflect methods App\\Http\\Client\n\
         @{name} reflect properties App\\Http\\Client\n\
         @{name} reflect Client::send\n\
         ```"
    )
}

impl<T: ChatTransport> ReflectControlPlane<T> {
    /// Runs the reflect command for the words following `reflect`.
    ///
    /// A leading `methods` or `properties` picks the class view, otherwise the
    /// view is `properties` and the first word is the query. Only one query
    /// word is used.
    ///
    /// # Errors
    /// Returns `ControlError` if a reply, document or prompt cannot be sent.
    /// A failed prompt never leaves a session behind.
    pub async fn reflect(
        &self,
        origin: &MessageHandle,
        args: &[&str],
    ) -> Result<ReflectOutcome, ControlError> {
        let mut args = args.iter().copied();
        let Some(first) = args.next() else {
            self.transport
                .reply(origin, &usage_text(self.identity()))
                .await?;
            return Ok(ReflectOutcome::Usage);
        };
        let (view, query) = match first.parse::<ViewKind>() {
            Ok(view) => (view, args.next()),
            Err(()) => (ViewKind::Properties, Some(first)),
        };

        let Some(index) = self.index() else {
            warn!(?query, "reflect requested without a documentation index");
            self.transport.reply(origin, UNAVAILABLE_TEXT).await?;
            return Ok(ReflectOutcome::Unavailable);
        };

        let matches = resolve(index, query);
        debug!(?query, %view, matches = matches.len(), "query resolved");

        match Resolution::classify(matches) {
            Resolution::NoResults => {
                self.transport.reply(origin, NO_RESULTS_TEXT).await?;
                Ok(ReflectOutcome::NoResults)
            }
            Resolution::Single(result) => {
                let document = render_match(&result, view);
                let sent = self
                    .transport
                    .send_document(&origin.channel, &document)
                    .await?;
                Ok(ReflectOutcome::Rendered { message: sent.id })
            }
            Resolution::TooMany(count) => {
                self.transport.reply(origin, TOO_MANY_RESULTS_TEXT).await?;
                Ok(ReflectOutcome::TooManyResults { count })
            }
            Resolution::Ambiguous(candidates) => {
                let mut session = DisambiguationSession::new(candidates, view)?;
                session.present(self.transport.as_ref(), origin).await?;
                let prompt = self.sessions().register(session).await?;
                Ok(ReflectOutcome::AwaitingSelection { prompt })
            }
        }
    }
}
