//! Disambiguation sessions.
//!
//! A session is created when a query has between 2 and 9 matches. It posts a
//! numbered prompt, attaches one marker per candidate and then waits for a
//! reaction that picks one of them. A session resolves at most once.

use std::fmt::Write as _;
use std::{error::Error, fmt};

use serde::Serialize;
use tracing::debug;

use crate::resolve::{MAX_CHOICES, MatchResult, ViewKind};
use crate::transport::{
    ChatTransport,
    MessageHandle,
    MessageId,
    NUMBER_MARKERS,
    ReactionAdded,
    TransportError,
    UserId,
};

const PROMPT_HEADER: &str = "Please choose an option with reactions:\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    AwaitingSelection,
    Resolved,
    Abandoned,
}

#[derive(Debug)]
pub enum SessionError {
    InvalidCandidateCount(usize),
    AlreadyRegistered(MessageId),
    NotAwaiting(SessionState),
    Transport(TransportError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCandidateCount(count) => write!(
                f,
                "a selection needs between 2 and {MAX_CHOICES} candidates, got {count}"
            ),
            Self::AlreadyRegistered(id) => {
                write!(f, "a session is already attached to message {id}")
            }
            Self::NotAwaiting(state) => write!(f, "session is not awaiting selection: {state:?}"),
            Self::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {}

impl From<TransportError> for SessionError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err)
    }
}

/// Why a reaction did not resolve a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    WrongMessage,
    SelfReaction,
    UnknownMarker,
    NotAwaiting,
    NoSession,
}

/// The candidate a reaction picked.
#[derive(Debug, Clone)]
pub struct Selection {
    pub index: usize,
    pub result: MatchResult,
    pub view: ViewKind,
    pub prompt: MessageHandle,
}

#[derive(Debug, Clone)]
pub enum ReactionOutcome {
    Resolved(Selection),
    Ignored(IgnoreReason),
}

/// One interactive selection tied to exactly one prompt message.
#[derive(Debug)]
pub struct DisambiguationSession {
    candidates: Vec<MatchResult>,
    view: ViewKind,
    prompt: Option<MessageHandle>,
    state: SessionState,
}

impl DisambiguationSession {
    /// Creates a session over 2 to 9 candidates.
    ///
    /// # Errors
    /// Returns `SessionError::InvalidCandidateCount` outside that range.
    pub fn new(candidates: Vec<MatchResult>, view: ViewKind) -> Result<Self, SessionError> {
        if !(2..=MAX_CHOICES).contains(&candidates.len()) {
            return Err(SessionError::InvalidCandidateCount(candidates.len()));
        }
        Ok(Self {
            candidates,
            view,
            prompt: None,
            state: SessionState::Created,
        })
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn view(&self) -> ViewKind {
        self.view
    }

    #[must_use]
    pub fn candidates(&self) -> &[MatchResult] {
        &self.candidates
    }

    #[must_use]
    pub const fn prompt(&self) -> Option<&MessageHandle> {
        self.prompt.as_ref()
    }

    /// Markers this session offers, one per candidate.
    #[must_use]
    pub fn markers(&self) -> &'static [&'static str] {
        &NUMBER_MARKERS[..self.candidates.len()]
    }

    /// Numbered, 1-indexed candidate list.
    #[must_use]
    pub fn prompt_text(&self) -> String {
        let mut content = PROMPT_HEADER.to_string();
        for (position, candidate) in self.candidates.iter().enumerate() {
            let _ = write!(content, "{}. {}\r\n", position + 1, candidate.fqn());
        }
        content
    }

    /// Replies to `origin` with the prompt, then attaches the markers.
    ///
    /// Markers are only attached once the prompt has been delivered. The
    /// session waits for a selection only if every step succeeded.
    ///
    /// # Errors
    /// Returns `SessionError::Transport` on any send failure and
    /// `SessionError::NotAwaiting` if the session was already presented.
    pub async fn present<T: ChatTransport>(
        &mut self,
        transport: &T,
        origin: &MessageHandle,
    ) -> Result<&MessageHandle, SessionError> {
        if self.state != SessionState::Created {
            return Err(SessionError::NotAwaiting(self.state));
        }

        let prompt = transport.reply(origin, &self.prompt_text()).await?;
        for marker in self.markers() {
            transport.attach_marker(&prompt, marker).await?;
        }

        debug!(
            prompt = %prompt.id,
            candidates = self.candidates.len(),
            view = %self.view,
            "selection prompt presented"
        );
        self.state = SessionState::AwaitingSelection;
        Ok(self.prompt.insert(prompt))
    }

    /// Applies a reaction event to the session.
    pub fn on_reaction(&mut self, event: &ReactionAdded, bot_user: &UserId) -> ReactionOutcome {
        if self.state != SessionState::AwaitingSelection {
            return ReactionOutcome::Ignored(IgnoreReason::NotAwaiting);
        }
        let Some(prompt) = self.prompt.as_ref() else {
            return ReactionOutcome::Ignored(IgnoreReason::NotAwaiting);
        };
        if event.message_id != prompt.id {
            return ReactionOutcome::Ignored(IgnoreReason::WrongMessage);
        }
        if &event.user_id == bot_user {
            return ReactionOutcome::Ignored(IgnoreReason::SelfReaction);
        }

        let Some(index) = self
            .markers()
            .iter()
            .position(|marker| *marker == event.marker)
        else {
            return ReactionOutcome::Ignored(IgnoreReason::UnknownMarker);
        };

        self.state = SessionState::Resolved;
        ReactionOutcome::Resolved(Selection {
            index,
            result: self.candidates[index].clone(),
            view: self.view,
            prompt: prompt.clone(),
        })
    }

    /// Tears a waiting session down without a selection.
    pub fn abandon(&mut self) {
        if self.state == SessionState::AwaitingSelection {
            self.state = SessionState::Abandoned;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::index::tests::class;
    use crate::transport::{ChannelId, LocalTransport, MessageId};

    fn candidates(count: usize) -> Vec<MatchResult> {
        (0..count)
            .map(|i| MatchResult::Class(Arc::new(class(&format!("Class{i}"), &[]))))
            .collect()
    }

    fn reaction(message: &MessageId, user: &str, marker: &str) -> ReactionAdded {
        ReactionAdded {
            message_id: message.clone(),
            user_id: UserId::from(user),
            marker: marker.to_string(),
        }
    }

    async fn presented(count: usize) -> (LocalTransport, DisambiguationSession, MessageHandle) {
        let transport = LocalTransport::new();
        let origin = transport
            .send_text(&ChannelId::from("general"), "@bot reflect Class")
            .await
            .expect("origin should send");
        let mut session =
            DisambiguationSession::new(candidates(count), ViewKind::Methods).expect("valid session");
        let prompt = session
            .present(&transport, &origin)
            .await
            .expect("prompt should send")
            .clone();
        (transport, session, prompt)
    }

    #[test]
    fn rejects_out_of_range_candidate_counts() {
        for count in [0, 1, 10] {
            let err = DisambiguationSession::new(candidates(count), ViewKind::Methods)
                .expect_err("count should be rejected");
            assert!(matches!(err, SessionError::InvalidCandidateCount(n) if n == count));
        }
    }

    #[test]
    fn prompt_lists_candidates_one_indexed() {
        let session =
            DisambiguationSession::new(candidates(2), ViewKind::Properties).expect("valid session");
        assert_eq!(
            session.prompt_text(),
            "Please choose an option with reactions:\r\n1. Class0\r\n2. Class1\r\n"
        );
    }

    #[tokio::test]
    async fn present_attaches_one_distinct_marker_per_candidate() {
        for count in 2..=MAX_CHOICES {
            let (transport, session, prompt) = presented(count).await;
            assert_eq!(session.state(), SessionState::AwaitingSelection);

            let recorded = transport.snapshot().await;
            let prompt_message = recorded
                .iter()
                .find(|message| message.id == prompt.id)
                .expect("prompt recorded");
            assert_eq!(prompt_message.markers, NUMBER_MARKERS[..count].to_vec());
        }
    }

    #[tokio::test]
    async fn failed_prompt_leaves_session_unpresented() {
        let transport = LocalTransport::new();
        let origin = MessageHandle::new("origin", "general");
        transport.set_fail_sends(true);
        let mut session =
            DisambiguationSession::new(candidates(3), ViewKind::Methods).expect("valid session");

        let err = session
            .present(&transport, &origin)
            .await
            .expect_err("send should fail");

        assert!(matches!(err, SessionError::Transport(_)));
        assert_eq!(session.state(), SessionState::Created);
        assert!(session.prompt().is_none());
    }

    #[tokio::test]
    async fn resolves_to_the_matching_marker_exactly_once() {
        let (_transport, mut session, prompt) = presented(4).await;
        let bot = UserId::from("bot");

        let outcome = session.on_reaction(&reaction(&prompt.id, "alice", NUMBER_MARKERS[2]), &bot);
        let ReactionOutcome::Resolved(selection) = outcome else {
            panic!("expected resolution, got {outcome:?}");
        };
        assert_eq!(selection.index, 2);
        assert_eq!(selection.result.fqn(), "Class2");
        assert_eq!(selection.view, ViewKind::Methods);
        assert_eq!(session.state(), SessionState::Resolved);

        let again = session.on_reaction(&reaction(&prompt.id, "bob", NUMBER_MARKERS[0]), &bot);
        assert!(matches!(again, ReactionOutcome::Ignored(IgnoreReason::NotAwaiting)));
    }

    #[tokio::test]
    async fn ignores_foreign_messages_self_reactions_and_unknown_markers() {
        let (_transport, mut session, prompt) = presented(3).await;
        let bot = UserId::from("bot");

        let other = MessageId::from("someone-else");
        assert!(matches!(
            session.on_reaction(&reaction(&other, "alice", NUMBER_MARKERS[0]), &bot),
            ReactionOutcome::Ignored(IgnoreReason::WrongMessage)
        ));
        assert!(matches!(
            session.on_reaction(&reaction(&prompt.id, "bot", NUMBER_MARKERS[0]), &bot),
            ReactionOutcome::Ignored(IgnoreReason::SelfReaction)
        ));
        assert!(matches!(
            session.on_reaction(&reaction(&prompt.id, "alice", NUMBER_MARKERS[3]), &bot),
            ReactionOutcome::Ignored(IgnoreReason::UnknownMarker)
        ));
        assert!(matches!(
            session.on_reaction(&reaction(&prompt.id, "alice", "\u{1f44d}"), &bot),
            ReactionOutcome::Ignored(IgnoreReason::UnknownMarker)
        ));
        assert_eq!(session.state(), SessionState::AwaitingSelection);
    }

    #[tokio::test]
    async fn abandoned_sessions_ignore_reactions() {
        let (_transport, mut session, prompt) = presented(2).await;
        session.abandon();
        assert_eq!(session.state(), SessionState::Abandoned);
        assert!(matches!(
            session.on_reaction(
                &reaction(&prompt.id, "alice", NUMBER_MARKERS[0]),
                &UserId::from("bot")
            ),
            ReactionOutcome::Ignored(IgnoreReason::NotAwaiting)
        ));
    }
}
