//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > .env file > config file > defaults
//!
//! The loaded [`AppConfig`] is an ordinary value. The binary builds it once at
//! start-up and hands the relevant sections to each component's constructor.

use serde::Deserialize;

/// Room versions this server can serve when nothing else is configured.
pub const DEFAULT_SUPPORTED_ROOM_VERSIONS: &[&str] =
    &["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11"];

/// Load configuration.
///
/// `file` names an optional config file (`config.toml`, `config.yaml`, ...);
/// when `None`, a `config.*` file in the working directory is picked up if
/// present.
pub fn load(file: Option<&str>) -> Result<AppConfig, config::ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let default_versions: Vec<String> =
        DEFAULT_SUPPORTED_ROOM_VERSIONS.iter().map(|v| (*v).to_owned()).collect();

    let file_source = match file {
        Some(path) => config::File::with_name(path).required(true),
        None => config::File::with_name("config").required(false),
    };

    let cfg = config::Config::builder()
        // Defaults
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8448)?
        .set_default("server.name", "localhost")?
        .set_default("federation.supported_room_versions", default_versions)?
        .set_default("federation.request_timeout_secs", 30)?
        .set_default("roomserver.peek_renewal_interval_ms", 3_600_000)? // 1 hour
        .add_source(file_source)
        // Environment variables (PEEK__SERVER__NAME, PEEK__FEDERATION__SUPPORTED_ROOM_VERSIONS, ...)
        .add_source(
            config::Environment::with_prefix("PEEK")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("federation.supported_room_versions")
                .try_parsing(true),
        )
        .build()?;

    cfg.try_deserialize()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub federation: FederationConfig,
    pub roomserver: RoomServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Public server name used for federation (e.g. "peek.example.com").
    pub name: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FederationConfig {
    /// Room versions this server understands. Rooms in any other version are
    /// refused at load time.
    pub supported_room_versions: Vec<String>,
    /// Upper bound on a single inbound federation request, collaborator calls
    /// included.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoomServerConfig {
    /// JSON file of rooms to load into the in-memory room server at start-up.
    #[serde(default)]
    pub seed_file: Option<String>,
    /// How long the room server considers a peek grant live after its last
    /// renewal.
    pub peek_renewal_interval_ms: u64,
}
