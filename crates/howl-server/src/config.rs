use serde::Deserialize;

/// Top-level server configuration, loaded from `howl.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub auth: AuthFileConfig,
    pub limits: LimitsConfig,
    pub rooms: RoomsConfig,
    pub timing: TimingConfig,
    pub rules: RulesFileConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8090".to_string(),
            auth: AuthFileConfig::default(),
            limits: LimitsConfig::default(),
            rooms: RoomsConfig::default(),
            timing: TimingConfig::default(),
            rules: RulesFileConfig::default(),
        }
    }
}

/// Auth section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthFileConfig {
    /// HMAC key for reconnect session tokens. A random per-process key is
    /// generated when unset (tokens then survive reconnects but not server
    /// restarts).
    pub session_secret: Option<String>,
    /// Bearer token for the status API. None = endpoint open.
    pub bearer_token: Option<String>,
}

/// Infrastructure limits (connection caps, buffer sizes, rate limits).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    /// Maximum concurrent WebSocket connections per IP address.
    pub max_ws_per_ip: usize,
    pub ws_rate_limit_per_sec: f64,
    pub player_message_buffer: usize,
    pub max_chat_len: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ws_connections: 200,
            max_ws_per_ip: 10,
            ws_rate_limit_per_sec: 20.0,
            player_message_buffer: 256,
            max_chat_len: 1024,
        }
    }
}

/// Room lifecycle configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoomsConfig {
    pub idle_timeout_secs: u64,
    pub idle_check_interval_secs: u64,
}

impl Default for RoomsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
            idle_check_interval_secs: 60,
        }
    }
}

/// Phase clocks. Timers are the only forcing function: every phase has a
/// skip default, so an unresponsive player can never deadlock a room.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub night_secs: u64,
    pub speech_secs: u64,
    pub vote_secs: u64,
    pub hunter_secs: u64,
    pub badge_secs: u64,
    /// Simulated AI think-time bounds.
    pub ai_min_delay_ms: u64,
    pub ai_max_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            night_secs: 60,
            speech_secs: 60,
            vote_secs: 45,
            hunter_secs: 30,
            badge_secs: 30,
            ai_min_delay_ms: 800,
            ai_max_delay_ms: 2500,
        }
    }
}

/// Optional rule toggles passed through to the game engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesFileConfig {
    pub sheriff_vote_weight: bool,
    pub sheriff_election: bool,
}

impl Default for RulesFileConfig {
    fn default() -> Self {
        Self {
            sheriff_vote_weight: false,
            sheriff_election: true,
        }
    }
}

impl ServerConfig {
    /// Validate configuration, exiting on unusable values.
    pub fn validate(&self) {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            tracing::error!(
                addr = %self.listen_addr,
                "listen_addr is not a valid socket address"
            );
            std::process::exit(1);
        }
        if self.auth.bearer_token.is_some() {
            tracing::warn!(
                "bearer_token is set in config file — use HOWL_API_TOKEN env var in production"
            );
        }
        if self.auth.session_secret.is_none() {
            tracing::warn!(
                "No session_secret configured; reconnect tokens will not survive a restart"
            );
        }
        if self.limits.max_ws_connections == 0 {
            tracing::error!("limits.max_ws_connections must be > 0");
            std::process::exit(1);
        }
        if self.limits.ws_rate_limit_per_sec <= 0.0 {
            tracing::error!("limits.ws_rate_limit_per_sec must be > 0");
            std::process::exit(1);
        }
        if self.limits.player_message_buffer == 0 {
            tracing::error!("limits.player_message_buffer must be > 0");
            std::process::exit(1);
        }
        if self.rooms.idle_timeout_secs == 0 || self.rooms.idle_check_interval_secs == 0 {
            tracing::error!("rooms timeouts must be > 0");
            std::process::exit(1);
        }
        if self.timing.night_secs == 0 || self.timing.vote_secs == 0 {
            tracing::error!("timing.night_secs and timing.vote_secs must be > 0");
            std::process::exit(1);
        }
        if self.timing.ai_min_delay_ms > self.timing.ai_max_delay_ms {
            tracing::error!("timing.ai_min_delay_ms must not exceed ai_max_delay_ms");
            std::process::exit(1);
        }
    }

    /// Load config from `howl.toml` if present, then apply env overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("howl.toml") {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from howl.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse howl.toml: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No howl.toml found, using defaults");
                ServerConfig::default()
            },
        };

        if let Ok(addr) = std::env::var("HOWL_LISTEN_ADDR")
            && !addr.is_empty()
        {
            config.listen_addr = addr;
        }
        if let Ok(secret) = std::env::var("HOWL_SESSION_SECRET")
            && !secret.is_empty()
        {
            config.auth.session_secret = Some(secret);
        }
        if let Ok(token) = std::env::var("HOWL_API_TOKEN")
            && !token.is_empty()
        {
            config.auth.bearer_token = Some(token);
        }
        if let Ok(val) = std::env::var("HOWL_MAX_WS_CONNECTIONS")
            && let Ok(n) = val.parse::<usize>()
        {
            config.limits.max_ws_connections = n;
        }
        if let Ok(val) = std::env::var("HOWL_WS_RATE_LIMIT")
            && let Ok(n) = val.parse::<f64>()
        {
            config.limits.ws_rate_limit_per_sec = n;
        }

        config
    }
}
