use std::sync::Arc;

use refdoc_core::control::{BotIdentity, ReflectControlPlane};
use refdoc_core::corpus::FsCorpus;
use refdoc_core::index::{IndexBuildOptions, SymbolIndex};
use refdoc_core::parsers::ReflectionJsonParser;
use refdoc_core::services::{SessionRegistry, SessionRegistryConfig};
use refdoc_core::transport::LocalTransport;
use tracing::error;

use crate::config::RefdocConfig;

/// Reflects the configured corpus. A failed build leaves the bot running
/// without an index so that `reflect` answers that documentation is
/// unavailable.
pub async fn build_index(config: &RefdocConfig) -> Option<Arc<SymbolIndex>> {
    let provider = Arc::new(FsCorpus::new(&config.corpus_extensions));
    let options = IndexBuildOptions::default().with_parse_concurrency(config.parse_concurrency);

    match SymbolIndex::build(
        &config.corpus_root,
        provider,
        Arc::new(ReflectionJsonParser),
        options,
    )
    .await
    {
        Ok(index) => Some(Arc::new(index)),
        Err(err) => {
            error!(
                root = %config.corpus_root.display(),
                error = %err,
                "symbol index build failed"
            );
            None
        }
    }
}

pub fn build_sessions(config: &RefdocConfig) -> SessionRegistry {
    let mut sessions = SessionRegistryConfig::new().with_sweep_interval(config.sweep_interval);
    if let Some(ttl) = config.session_ttl {
        sessions = sessions.with_ttl(ttl);
    }
    SessionRegistry::new(sessions)
}

pub fn build_control_plane(
    config: &RefdocConfig,
    index: Option<Arc<SymbolIndex>>,
) -> ReflectControlPlane<LocalTransport> {
    let identity = BotIdentity::new(config.bot_user_id.as_str(), config.bot_username.as_str());
    let control = ReflectControlPlane::new(Arc::new(LocalTransport::new()), identity)
        .with_sessions(build_sessions(config))
        .with_help_title(config.help_title.as_str());
    match index {
        Some(index) => control.with_index(index),
        None => control,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    use refdoc_core::control::ReflectOutcome;
    use refdoc_core::transport::MessageHandle;

    use super::*;

    fn config(root: PathBuf) -> RefdocConfig {
        RefdocConfig {
            corpus_root: root,
            corpus_extensions: vec!["json".to_string()],
            parse_concurrency: 2,
            bot_user_id: "99".to_string(),
            bot_username: "refdoc".to_string(),
            help_title: "Docs".to_string(),
            session_ttl: Some(Duration::from_secs(300)),
            sweep_interval: Duration::from_secs(60),
            enable_stdio: false,
            mcp_serve: false,
            mcp_http_addr: ([127, 0, 0, 1], 0).into(),
            gateway_serve: false,
            gateway_addr: ([127, 0, 0, 1], 0).into(),
            gateway_timeout: Duration::from_secs(5),
            gateway_max_body_bytes: 4096,
            log_level: "info".to_string(),
        }
    }

    fn scratch_corpus(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("refdoc-botd-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        fs::write(
            dir.join("Client.json"),
            r#"{"path": "src/Client.php", "classes": [{"fqn": "\\Acme\\Client", "methods": [{"name": "send"}]}]}"#,
        )
        .expect("write corpus file");
        dir
    }

    #[tokio::test]
    async fn bootstrapped_bot_answers_reflect() {
        let root = scratch_corpus("answers");
        let config = config(root.clone());

        let index = build_index(&config).await.expect("index should build");
        assert_eq!(index.class_count(), 1);

        let control = build_control_plane(&config, Some(index));
        assert_eq!(control.help_title(), "Docs");
        assert_eq!(
            control.sessions().config().ttl,
            Some(Duration::from_secs(300))
        );
        let outcome = control
            .reflect(&MessageHandle::new("m-1", "general"), &["Client"])
            .await
            .expect("reflect");
        assert!(matches!(outcome, ReflectOutcome::Rendered { .. }));

        let _ = fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn missing_corpus_leaves_reflect_unavailable() {
        let config = config(std::env::temp_dir().join("refdoc-botd-missing-corpus"));

        let index = build_index(&config).await;
        assert!(index.is_none());

        let control = build_control_plane(&config, index);
        let outcome = control
            .reflect(&MessageHandle::new("m-1", "general"), &["Client"])
            .await
            .expect("reflect");
        assert_eq!(outcome, ReflectOutcome::Unavailable);
    }
}
