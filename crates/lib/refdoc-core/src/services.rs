use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::resolve::ViewKind;
use crate::session::{
    DisambiguationSession,
    IgnoreReason,
    ReactionOutcome,
    SessionError,
    SessionState,
};
use crate::transport::{MessageHandle, MessageId, ReactionAdded, UserId};

/// Configuration for the session registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRegistryConfig {
    pub ttl: Option<Duration>,
    pub sweep_interval: Duration,
}

impl Default for SessionRegistryConfig {
    fn default() -> Self {
        Self {
            ttl: None,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl SessionRegistryConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub const fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }
}

/// Summary of a session that is still waiting for a selection.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PendingSession {
    pub prompt: MessageHandle,
    pub view: ViewKind,
    pub candidates: Vec<String>,
    pub age_ms: u64,
}

/// Registry of active disambiguation sessions keyed by prompt message.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<SessionRegistryInner>,
}

/// Internal registry state shared across clones.
#[derive(Default)]
struct SessionRegistryInner {
    entries: RwLock<HashMap<MessageId, SessionEntry>>,
    config: SessionRegistryConfig,
}

/// A registered session and the time it started waiting.
struct SessionEntry {
    session: DisambiguationSession,
    created_ms: u64,
}

impl SessionEntry {
    fn age(&self, now_ms: u64) -> Duration {
        Duration::from_millis(now_ms.saturating_sub(self.created_ms))
    }
}

impl SessionRegistry {
    #[must_use]
    pub fn new(config: SessionRegistryConfig) -> Self {
        Self {
            inner: Arc::new(SessionRegistryInner {
                entries: RwLock::new(HashMap::new()),
                config,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionRegistryConfig {
        &self.inner.config
    }

    /// Takes ownership of a presented session.
    ///
    /// # Errors
    /// Returns `SessionError::NotAwaiting` if the session has not been
    /// presented, and `SessionError::AlreadyRegistered` if its prompt already
    /// has a session.
    pub async fn register(&self, session: DisambiguationSession) -> Result<MessageId, SessionError> {
        let prompt_id = match (session.state(), session.prompt()) {
            (SessionState::AwaitingSelection, Some(prompt)) => prompt.id.clone(),
            (state, _) => return Err(SessionError::NotAwaiting(state)),
        };

        let mut map = self.inner.entries.write().await;
        if map.contains_key(&prompt_id) {
            return Err(SessionError::AlreadyRegistered(prompt_id));
        }
        map.insert(
            prompt_id.clone(),
            SessionEntry {
                session,
                created_ms: now_ms(),
            },
        );
        debug!(prompt = %prompt_id, pending = map.len(), "session registered");
        Ok(prompt_id)
    }

    /// Routes a reaction to the session owning its message.
    ///
    /// A resolved session is removed before the lock is released, so at most
    /// one reaction per prompt ever resolves.
    pub async fn dispatch(&self, event: &ReactionAdded, bot_user: &UserId) -> ReactionOutcome {
        let mut map = self.inner.entries.write().await;
        let Some(entry) = map.get_mut(&event.message_id) else {
            return ReactionOutcome::Ignored(IgnoreReason::NoSession);
        };

        let outcome = entry.session.on_reaction(event, bot_user);
        if let ReactionOutcome::Resolved(selection) = &outcome {
            map.remove(&event.message_id);
            debug!(
                prompt = %event.message_id,
                choice = selection.index + 1,
                "session resolved"
            );
        }
        outcome
    }

    /// Lists sessions still waiting for a selection, oldest first.
    pub async fn pending(&self) -> Vec<PendingSession> {
        let now = now_ms();
        let map = self.inner.entries.read().await;
        let mut pending: Vec<(u64, PendingSession)> = map
            .values()
            .filter_map(|entry| {
                let prompt = entry.session.prompt()?.clone();
                Some((
                    entry.created_ms,
                    PendingSession {
                        prompt,
                        view: entry.session.view(),
                        candidates: entry
                            .session
                            .candidates()
                            .iter()
                            .map(|candidate| candidate.fqn().to_string())
                            .collect(),
                        age_ms: u64::try_from(entry.age(now).as_millis()).unwrap_or(u64::MAX),
                    },
                ))
            })
            .collect();
        pending.sort_by(|left, right| {
            left.0
                .cmp(&right.0)
                .then_with(|| left.1.prompt.id.cmp(&right.1.prompt.id))
        });
        pending.into_iter().map(|(_, session)| session).collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.entries.read().await.is_empty()
    }

    /// Abandons and drops sessions older than the configured ttl.
    pub async fn evict_expired(&self) -> usize {
        let Some(ttl) = self.inner.config.ttl else {
            return 0;
        };
        let now = now_ms();
        let mut map = self.inner.entries.write().await;
        let before = map.len();
        map.retain(|_, entry| {
            if entry.age(now) <= ttl {
                return true;
            }
            entry.session.abandon();
            false
        });
        let evicted = before.saturating_sub(map.len());
        if evicted > 0 {
            info!(evicted, "expired selection sessions abandoned");
        }
        evicted
    }

    /// Runs `evict_expired` on the sweep interval. Returns `None` without a ttl.
    #[must_use]
    pub fn spawn_sweeper(self) -> Option<tokio::task::JoinHandle<()>> {
        self.inner.config.ttl?;
        let interval = self.inner.config.sweep_interval;
        let registry = self;
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let _ = registry.evict_expired().await;
            }
        }))
    }
}

fn now_ms() -> u64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    u64::try_from(elapsed).unwrap_or(u64::MAX)
}
