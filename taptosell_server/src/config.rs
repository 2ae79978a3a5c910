use std::env;

use log::*;
use tts_common::parse_boolean_flag;

const DEFAULT_TTS_HOST: &str = "127.0.0.1";
const DEFAULT_TTS_PORT: u16 = 8360;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Buffer size for the marketplace event channels.
    pub event_buffer_size: usize,
    /// Whether to attach the default logging hooks to the marketplace events.
    pub emit_event_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TTS_HOST.to_string(),
            port: DEFAULT_TTS_PORT,
            database_url: String::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            emit_event_logs: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TTS_HOST").ok().unwrap_or_else(|| DEFAULT_TTS_HOST.into());
        let port = env::var("TTS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TTS_PORT. {e} Using the default, {DEFAULT_TTS_PORT}, instead."
                    );
                    DEFAULT_TTS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TTS_PORT);
        let database_url = env::var("TTS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ TTS_DATABASE_URL is not set. Please set it to the URL for the marketplace database.");
            String::default()
        });
        let event_buffer_size = env::var("TTS_EVENT_BUFFER_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for TTS_EVENT_BUFFER_SIZE. {e}"))
                    .ok()
            })
            .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        let emit_event_logs = parse_boolean_flag(env::var("TTS_EMIT_EVENT_LOGS").ok(), true);
        Self { host, port, database_url, event_buffer_size, emit_event_logs }
    }
}
