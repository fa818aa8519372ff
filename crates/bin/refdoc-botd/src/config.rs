use clap::{Parser, builder::BoolishValueParser};
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

const DEFAULT_CORPUS_EXTENSIONS: &str = "json";
const DEFAULT_PARSE_CONCURRENCY: usize = 8;
const DEFAULT_BOT_USER_ID: &str = "refdoc";
const DEFAULT_BOT_USERNAME: &str = "refdoc";
const DEFAULT_HELP_TITLE: &str = "refdoc";
const DEFAULT_SESSION_TTL_SECS: u64 = 0;
const DEFAULT_SESSION_SWEEP_SECS: u64 = 60;
const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4030";
const DEFAULT_GATEWAY_ADDR: &str = "127.0.0.1:4031";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_GATEWAY_MAX_BODY_BYTES: usize = 1024 * 1024;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "refdoc-botd", version, about = "Reflection documentation chat bot daemon.")]
#[allow(clippy::struct_excessive_bools)]
struct CliArgs {
    #[arg(long, env = "REFDOC_CORPUS_ROOT")]
    corpus_root: Option<PathBuf>,

    #[arg(long, env = "REFDOC_CORPUS_EXTENSIONS", default_value = DEFAULT_CORPUS_EXTENSIONS)]
    corpus_extensions: String,

    #[arg(
        long,
        env = "REFDOC_PARSE_CONCURRENCY",
        default_value_t = DEFAULT_PARSE_CONCURRENCY
    )]
    parse_concurrency: usize,

    #[arg(long, env = "REFDOC_BOT_USER_ID", default_value = DEFAULT_BOT_USER_ID)]
    bot_user_id: String,

    #[arg(long, env = "REFDOC_BOT_USERNAME", default_value = DEFAULT_BOT_USERNAME)]
    bot_username: String,

    #[arg(long, env = "REFDOC_HELP_TITLE", default_value = DEFAULT_HELP_TITLE)]
    help_title: String,

    #[arg(
        long,
        env = "REFDOC_SESSION_TTL_SECS",
        default_value_t = DEFAULT_SESSION_TTL_SECS
    )]
    session_ttl_secs: u64,

    #[arg(long, env = "REFDOC_SESSION_SWEEP_SECS")]
    session_sweep_secs: Option<u64>,

    #[arg(
        long = "stdio",
        env = "REFDOC_ENABLE_STDIO",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(
        long,
        env = "REFDOC_MCP_SERVE",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    mcp_serve: bool,

    #[arg(long, env = "REFDOC_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    mcp_http_addr: SocketAddr,

    #[arg(
        long,
        env = "REFDOC_GATEWAY_SERVE",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    gateway_serve: bool,

    #[arg(long, env = "REFDOC_GATEWAY_ADDR", default_value = DEFAULT_GATEWAY_ADDR)]
    gateway_addr: SocketAddr,

    #[arg(
        long,
        env = "REFDOC_GATEWAY_TIMEOUT_SECS",
        default_value_t = DEFAULT_GATEWAY_TIMEOUT_SECS
    )]
    gateway_timeout_secs: u64,

    #[arg(
        long,
        env = "REFDOC_GATEWAY_MAX_BODY_BYTES",
        default_value_t = DEFAULT_GATEWAY_MAX_BODY_BYTES
    )]
    gateway_max_body_bytes: usize,

    #[arg(long, env = "REFDOC_LOG", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Clone, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RefdocConfig {
    pub corpus_root: PathBuf,
    pub corpus_extensions: Vec<String>,
    pub parse_concurrency: usize,
    pub bot_user_id: String,
    pub bot_username: String,
    pub help_title: String,
    pub session_ttl: Option<Duration>,
    pub sweep_interval: Duration,
    pub enable_stdio: bool,
    pub mcp_serve: bool,
    pub mcp_http_addr: SocketAddr,
    pub gateway_serve: bool,
    pub gateway_addr: SocketAddr,
    pub gateway_timeout: Duration,
    pub gateway_max_body_bytes: usize,
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl RefdocConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }

    /// True when at least one serving surface is enabled.
    pub const fn serves_anything(&self) -> bool {
        self.enable_stdio || self.mcp_serve || self.gateway_serve
    }
}

fn require_non_empty(name: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidSetting { name, value });
    }
    Ok(value.trim().to_string())
}

fn parse_extensions(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_string())
        .filter(|ext| !ext.is_empty())
        .collect()
}

impl TryFrom<CliArgs> for RefdocConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let corpus_root = args
            .corpus_root
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(ConfigError::MissingSetting("REFDOC_CORPUS_ROOT"))?;

        let corpus_extensions = parse_extensions(&args.corpus_extensions);
        if corpus_extensions.is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "REFDOC_CORPUS_EXTENSIONS",
                value: args.corpus_extensions,
            });
        }

        if args.parse_concurrency == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "REFDOC_PARSE_CONCURRENCY",
                value: args.parse_concurrency.to_string(),
            });
        }

        let session_ttl = if args.session_ttl_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(args.session_ttl_secs))
        };
        let sweep_secs = match (session_ttl, args.session_sweep_secs) {
            (Some(_), Some(0)) => {
                return Err(ConfigError::InvalidSetting {
                    name: "REFDOC_SESSION_SWEEP_SECS",
                    value: "0".to_string(),
                });
            }
            (_, Some(secs)) => secs,
            (Some(_), None) => args.session_ttl_secs,
            (None, None) => DEFAULT_SESSION_SWEEP_SECS,
        };

        if args.gateway_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "REFDOC_GATEWAY_TIMEOUT_SECS",
                value: args.gateway_timeout_secs.to_string(),
            });
        }

        if EnvFilter::try_new(&args.log_level).is_err() {
            return Err(ConfigError::InvalidSetting {
                name: "REFDOC_LOG",
                value: args.log_level,
            });
        }

        Ok(Self {
            corpus_root,
            corpus_extensions,
            parse_concurrency: args.parse_concurrency,
            bot_user_id: require_non_empty("REFDOC_BOT_USER_ID", args.bot_user_id)?,
            bot_username: require_non_empty("REFDOC_BOT_USERNAME", args.bot_username)?,
            help_title: require_non_empty("REFDOC_HELP_TITLE", args.help_title)?,
            session_ttl,
            sweep_interval: Duration::from_secs(sweep_secs),
            enable_stdio: args.enable_stdio,
            mcp_serve: args.mcp_serve,
            mcp_http_addr: args.mcp_http_addr,
            gateway_serve: args.gateway_serve,
            gateway_addr: args.gateway_addr,
            gateway_timeout: Duration::from_secs(args.gateway_timeout_secs),
            gateway_max_body_bytes: args.gateway_max_body_bytes,
            log_level: args.log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            corpus_root: Some(PathBuf::from("/srv/refdoc/corpus")),
            corpus_extensions: DEFAULT_CORPUS_EXTENSIONS.to_string(),
            parse_concurrency: DEFAULT_PARSE_CONCURRENCY,
            bot_user_id: DEFAULT_BOT_USER_ID.to_string(),
            bot_username: DEFAULT_BOT_USERNAME.to_string(),
            help_title: DEFAULT_HELP_TITLE.to_string(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            session_sweep_secs: None,
            enable_stdio: false,
            mcp_serve: true,
            mcp_http_addr: DEFAULT_MCP_HTTP_ADDR.parse().expect("valid MCP addr"),
            gateway_serve: true,
            gateway_addr: DEFAULT_GATEWAY_ADDR.parse().expect("valid gateway addr"),
            gateway_timeout_secs: DEFAULT_GATEWAY_TIMEOUT_SECS,
            gateway_max_body_bytes: DEFAULT_GATEWAY_MAX_BODY_BYTES,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    #[test]
    fn defaults_wait_for_selections_indefinitely() {
        let config = RefdocConfig::try_from(base_args()).expect("config should parse");

        assert!(config.session_ttl.is_none());
        assert_eq!(config.sweep_interval, Duration::from_secs(DEFAULT_SESSION_SWEEP_SECS));
        assert_eq!(config.corpus_extensions, ["json"]);
        assert!(config.serves_anything());
    }

    #[test]
    fn corpus_root_is_required() {
        let mut args = base_args();
        args.corpus_root = None;
        let err = RefdocConfig::try_from(args).expect_err("missing root should fail");
        assert!(matches!(err, ConfigError::MissingSetting("REFDOC_CORPUS_ROOT")));
    }

    #[test]
    fn sweep_defaults_to_ttl() {
        let mut args = base_args();
        args.session_ttl_secs = 120;
        let config = RefdocConfig::try_from(args).expect("config should parse");
        assert_eq!(config.session_ttl, Some(Duration::from_secs(120)));
        assert_eq!(config.sweep_interval, Duration::from_secs(120));
    }

    #[test]
    fn zero_sweep_with_ttl_is_rejected() {
        let mut args = base_args();
        args.session_ttl_secs = 120;
        args.session_sweep_secs = Some(0);
        let err = RefdocConfig::try_from(args).expect_err("zero sweep should fail");
        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                name: "REFDOC_SESSION_SWEEP_SECS",
                ..
            }
        ));
    }

    #[test]
    fn extensions_are_split_and_trimmed() {
        let mut args = base_args();
        args.corpus_extensions = " .json, dump ,,".to_string();
        let config = RefdocConfig::try_from(args).expect("config should parse");
        assert_eq!(config.corpus_extensions, ["json", "dump"]);

        let mut args = base_args();
        args.corpus_extensions = " , ".to_string();
        assert!(RefdocConfig::try_from(args).is_err());
    }

    #[test]
    fn empty_identity_and_zero_concurrency_are_invalid() {
        let mut args = base_args();
        args.bot_user_id = "  ".to_string();
        assert!(matches!(
            RefdocConfig::try_from(args),
            Err(ConfigError::InvalidSetting {
                name: "REFDOC_BOT_USER_ID",
                ..
            })
        ));

        let mut args = base_args();
        args.parse_concurrency = 0;
        assert!(matches!(
            RefdocConfig::try_from(args),
            Err(ConfigError::InvalidSetting {
                name: "REFDOC_PARSE_CONCURRENCY",
                ..
            })
        ));
    }

    #[test]
    fn malformed_log_filters_are_invalid() {
        let mut args = base_args();
        args.log_level = "refdoc=loud".to_string();
        assert!(matches!(
            RefdocConfig::try_from(args),
            Err(ConfigError::InvalidSetting { name: "REFDOC_LOG", .. })
        ));
    }

    #[test]
    fn cli_flags_parse() {
        let args = CliArgs::try_parse_from([
            "refdoc-botd",
            "--corpus-root",
            "/tmp/corpus",
            "--stdio",
            "true",
            "--mcp-serve",
            "no",
            "--gateway-serve",
            "0",
        ])
        .expect("flags should parse");
        let config = RefdocConfig::try_from(args).expect("config should parse");
        assert!(config.enable_stdio);
        assert!(!config.mcp_serve);
        assert!(!config.gateway_serve);
        assert_eq!(config.corpus_root, PathBuf::from("/tmp/corpus"));
    }
}
